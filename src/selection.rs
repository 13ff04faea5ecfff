//! Query adapter over the `scraper` DOM
//!
//! A [`Selection`] is an ordered set of nodes (the document itself, elements or
//! text nodes) that every schema field is evaluated against. It provides the
//! query primitives the extraction engine needs: scoped selector lookup,
//! nth-match, nth-text-child, nearest ancestor and the named content accessors.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// A single node held by a [`Selection`]
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// The whole parsed document
    Document(&'a Html),
    /// An element node
    Element(ElementRef<'a>),
    /// A text node, remembered together with the element that contains it
    Text {
        parent: ElementRef<'a>,
        content: &'a str,
    },
}

impl<'a> Node<'a> {
    fn text(&self) -> String {
        match self {
            Node::Document(document) => document.root_element().text().collect(),
            Node::Element(element) => element.text().collect(),
            Node::Text { content, .. } => (*content).to_string(),
        }
    }

    fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            Node::Element(element) => Some(*element),
            _ => None,
        }
    }
}

/// Ordered set of nodes a field is read from
#[derive(Debug, Clone, Default)]
pub struct Selection<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> Selection<'a> {
    /// Selection spanning a whole document
    pub fn document(document: &'a Html) -> Self {
        Self {
            nodes: vec![Node::Document(document)],
        }
    }

    /// Selection holding exactly one element
    pub fn element(element: ElementRef<'a>) -> Self {
        Self {
            nodes: vec![Node::Element(element)],
        }
    }

    /// Selection matching nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    /// Split into one single-node selection per node, in order
    pub fn items(&self) -> impl Iterator<Item = Selection<'a>> + '_ {
        self.nodes.iter().map(|node| Selection { nodes: vec![*node] })
    }

    /// Elements matching `selector` below any node of this selection
    ///
    /// Results are in document order with duplicates removed. An unparsable
    /// selector matches nothing.
    pub fn find(&self, selector: &str) -> Selection<'a> {
        let Some(selector) = parse_selector(selector) else {
            return Selection::empty();
        };

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for node in &self.nodes {
            let matches: Vec<ElementRef<'a>> = match node {
                Node::Document(document) => document.select(&selector).collect(),
                Node::Element(element) => element.select(&selector).collect(),
                Node::Text { .. } => continue,
            };
            for element in matches {
                if seen.insert(element.id()) {
                    nodes.push(Node::Element(element));
                }
            }
        }

        Selection { nodes }
    }

    /// The node at `index`, or an empty selection when out of range
    pub fn eq(&self, index: usize) -> Selection<'a> {
        Selection {
            nodes: self.nodes.get(index).copied().into_iter().collect(),
        }
    }

    /// The `index`-th text node among the direct children of this selection
    ///
    /// Only text children are counted; element children are skipped. Yields an
    /// empty selection when there are not enough text children.
    pub fn text_child(&self, index: usize) -> Selection<'a> {
        let found = self
            .nodes
            .iter()
            .filter_map(Node::as_element)
            .flat_map(|parent| {
                parent.children().filter_map(move |child| {
                    child.value().as_text().map(|text| Node::Text {
                        parent,
                        content: &**text,
                    })
                })
            })
            .nth(index);

        Selection {
            nodes: found.into_iter().collect(),
        }
    }

    /// Nearest element matching `selector`, starting from each node itself
    ///
    /// Text nodes start the search at their parent element.
    pub fn closest(&self, selector: &str) -> Selection<'a> {
        let Some(selector) = parse_selector(selector) else {
            return Selection::empty();
        };

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for node in &self.nodes {
            let start = match node {
                Node::Element(element) => *element,
                Node::Text { parent, .. } => *parent,
                Node::Document(_) => continue,
            };
            let found = std::iter::successors(Some(start), |element| {
                element.parent().and_then(ElementRef::wrap)
            })
            .find(|element| selector.matches(element));

            if let Some(element) = found {
                if seen.insert(element.id()) {
                    nodes.push(Node::Element(element));
                }
            }
        }

        Selection { nodes }
    }

    /// Combined text content of every node
    pub fn text(&self) -> String {
        self.nodes.iter().map(Node::text).collect()
    }

    /// Inner markup of the first node
    pub fn html(&self) -> Option<String> {
        match self.nodes.first()? {
            Node::Document(document) => Some(document.html()),
            Node::Element(element) => Some(element.inner_html()),
            Node::Text { content, .. } => Some((*content).to_string()),
        }
    }

    /// Markup of the first node including its own tag
    pub fn outer_html(&self) -> Option<String> {
        match self.nodes.first()? {
            Node::Document(document) => Some(document.html()),
            Node::Element(element) => Some(element.html()),
            Node::Text { content, .. } => Some((*content).to_string()),
        }
    }

    /// Value of attribute `name` on the first element
    pub fn attr(&self, name: &str) -> Option<String> {
        let element = self.nodes.first()?.as_element()?;
        element.value().attr(name).map(String::from)
    }

    /// Form value of the first element
    ///
    /// `textarea` yields its text, `select` the value of its selected option,
    /// `option` its value attribute falling back to its text, and any other
    /// element its `value` attribute.
    pub fn val(&self) -> Option<String> {
        let element = self.nodes.first()?.as_element()?;
        form_value(element)
    }
}

fn form_value(element: ElementRef<'_>) -> Option<String> {
    match element.value().name() {
        "textarea" => Some(element.text().collect()),
        "option" => Some(option_value(element)),
        "select" => {
            let selected = Selector::parse("option[selected]").ok()?;
            element.select(&selected).next().map(option_value)
        }
        _ => element.value().attr("value").map(String::from),
    }
}

fn option_value(option: ElementRef<'_>) -> String {
    option
        .value()
        .attr("value")
        .map(String::from)
        .unwrap_or_else(|| option.text().collect())
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(selector, error = %err, "unparsable selector, matching nothing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html>
    <body>
        <ul class="menu">
            <li class="item" data-id="1">Home</li>
            <li class="item" data-id="2">About</li>
            <li class="item" data-id="3">Contact</li>
        </ul>
        <p class="mixed">first<b>bold</b>second<i>italic</i>third</p>
        <form>
            <input name="q" value="rust">
            <textarea>notes</textarea>
            <select><option value="a">A</option><option value="b" selected>B</option></select>
        </form>
    </body>
    </html>
    "#;

    #[test]
    fn test_find_keeps_document_order() {
        let document = Html::parse_document(PAGE);
        let items = Selection::document(&document).find("li.item");

        assert_eq!(items.len(), 3);
        let texts: Vec<String> = items.items().map(|item| item.text()).collect();
        assert_eq!(texts, vec!["Home", "About", "Contact"]);
    }

    #[test]
    fn test_find_is_scoped_and_deduplicated() {
        let document = Html::parse_document(PAGE);
        let root = Selection::document(&document);

        // Nested contexts would otherwise report the same <li> twice
        let scopes = root.find("body, ul");
        assert_eq!(scopes.find("li").len(), 3);

        let menu = root.find("ul.menu");
        assert!(menu.find("p").is_empty());
    }

    #[test]
    fn test_eq_out_of_range_is_empty() {
        let document = Html::parse_document(PAGE);
        let items = Selection::document(&document).find("li");

        assert_eq!(items.eq(1).text(), "About");
        assert!(items.eq(3).is_empty());
        assert_eq!(items.eq(3).text(), "");
    }

    #[test]
    fn test_text_child_skips_elements() {
        let document = Html::parse_document(PAGE);
        let paragraph = Selection::document(&document).find("p.mixed");

        assert_eq!(paragraph.text_child(0).text(), "first");
        assert_eq!(paragraph.text_child(1).text(), "second");
        assert_eq!(paragraph.text_child(2).text(), "third");
        assert!(paragraph.text_child(3).is_empty());
    }

    #[test]
    fn test_closest_includes_self_and_text_parents() {
        let document = Html::parse_document(PAGE);
        let root = Selection::document(&document);

        let item = root.find("li").eq(0);
        assert_eq!(item.closest("li").attr("data-id").as_deref(), Some("1"));
        assert_eq!(item.closest("ul").attr("class").as_deref(), Some("menu"));
        assert!(item.closest("table").is_empty());

        let text = root.find("p.mixed").text_child(1);
        assert_eq!(text.closest("p").attr("class").as_deref(), Some("mixed"));
    }

    #[test]
    fn test_accessors() {
        let document = Html::parse_document(PAGE);
        let root = Selection::document(&document);

        assert_eq!(root.find("input").val().as_deref(), Some("rust"));
        assert_eq!(root.find("textarea").val().as_deref(), Some("notes"));
        assert_eq!(root.find("select").val().as_deref(), Some("b"));
        assert_eq!(root.find("p.mixed b").html().as_deref(), Some("bold"));
        assert_eq!(
            root.find("p.mixed b").outer_html().as_deref(),
            Some("<b>bold</b>")
        );
        assert_eq!(root.find("li").attr("missing"), None);
        assert_eq!(root.find("nothing").html(), None);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let document = Html::parse_document(PAGE);
        let root = Selection::document(&document);

        assert!(root.find("li[").is_empty());
        assert!(root.find("li").closest(">>>").is_empty());
    }
}
