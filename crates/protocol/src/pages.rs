//! Page list validation for tools that take a `pages` field.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PipelineError, Result};

/// Comma-separated page numbers and `a-b` ranges, e.g. `1,3,5-7`.
const PAGE_LIST_PATTERN: &str = r"^(\d+(-\d+)?)(,\s*\d+(-\d+)?)*$";

fn page_list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PAGE_LIST_PATTERN).expect("page list pattern is valid"))
}

/// Validates a page list and returns it trimmed.
///
/// An empty (or all-whitespace) value means "all pages" and is accepted.
pub fn validate_pages(value: &str) -> Result<&str> {
    let pages = value.trim();
    if pages.is_empty() || page_list_regex().is_match(pages) {
        Ok(pages)
    } else {
        Err(PipelineError::InvalidPages(pages.to_string()))
    }
}
