//! FFI interface for C/C++ callers
//!
//! Schemas and results cross the boundary as JSON, so only named accessors and
//! named transforms are available here.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::engine::scrape_html;
use crate::error::ScrapeError;
use crate::schema::Schema;

/// Result struct returned to C/C++
/// Both pointers are owned by Rust and must be freed via free_scrape_result
#[repr(C)]
pub struct ScrapeResultFFI {
    /// JSON-serialized extraction result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Extract data from HTML according to a JSON schema.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `schema_json` - JSON-serialized schema (null-terminated)
///
/// # Returns
/// ScrapeResultFFI with either json_ptr set (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `schema_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_scrape_result`
#[no_mangle]
pub unsafe extern "C" fn scrape_html_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    schema_json: *const c_char,
) -> ScrapeResultFFI {
    let html = if html_ptr.is_null() || html_len == 0 {
        ""
    } else {
        let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in HTML content"),
        }
    };

    if schema_json.is_null() {
        return make_error_result("Schema JSON is null");
    }
    let schema_str = match CStr::from_ptr(schema_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in schema JSON"),
    };

    let result = Schema::from_json(schema_str).and_then(|schema| scrape_html(html, &schema));
    let data = match result {
        Ok(data) => data,
        Err(err) => return make_error_result(&error_message(&err)),
    };

    match serde_json::to_string(&data) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ScrapeResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free a ScrapeResultFFI returned by scrape_html_ffi
///
/// # Safety
/// - `result` must have been returned by `scrape_html_ffi`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_scrape_result(result: ScrapeResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn error_message(err: &ScrapeError) -> String {
    format!("{}: {}", err.code(), err)
}

fn make_error_result(msg: &str) -> ScrapeResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ScrapeResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(html: &str, schema: &str) -> (Option<String>, Option<String>) {
        let schema = CString::new(schema).unwrap();
        unsafe {
            let result = scrape_html_ffi(html.as_ptr() as *const c_char, html.len(), schema.as_ptr());
            let json = (!result.json_ptr.is_null())
                .then(|| CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned());
            let error = (!result.error_ptr.is_null())
                .then(|| CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned());
            free_scrape_result(result);
            (json, error)
        }
    }

    #[test]
    fn test_ffi_round_trip() {
        let (json, error) = call(
            "<ul><li> a </li><li>b</li></ul>",
            r#"{ "items": { "listItem": "li" }, "first": { "selector": "li", "eq": 0 } }"#,
        );

        assert!(error.is_none());
        assert_eq!(json.unwrap(), r#"{"items":["a","b"],"first":"a"}"#);
    }

    #[test]
    fn test_ffi_reports_configuration_error() {
        let (json, error) = call("<p>x</p>", r#"{ "foo": {} }"#);

        assert!(json.is_none());
        assert!(error.unwrap().starts_with("NO_ELEMENT_SELECTED: "));
    }

    #[test]
    fn test_ffi_reports_bad_schema() {
        let (json, error) = call("<p>x</p>", "not json");

        assert!(json.is_none());
        assert!(error.unwrap().starts_with("INVALID_SCHEMA: "));
    }
}
