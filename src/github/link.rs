use crate::error::{AppError, Result};
use regex::Regex;

/// Extract the `rel="next"` URL from a GitHub `Link` header
pub fn next_link(header: &str) -> Option<String> {
    // Format: <https://api.github.com/...&page=2>; rel="next", <...>; rel="last"
    let re = Regex::new(r#"<([^>]+)>\s*;\s*rel="([^"]+)""#).ok()?;

    let next = re
        .captures_iter(header)
        .find(|cap| cap.get(2).map(|m| m.as_str()) == Some("next"))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string());
    next
}

/// Validate an `owner/name` repository identifier before it goes into a URL path
pub fn validate_full_name(full_name: &str) -> Result<()> {
    let re = Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$")?;
    if re.is_match(full_name) && !full_name.split('/').any(|part| part == "." || part == "..") {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "'{}' is not a repository name of the form owner/name",
            full_name
        )))
    }
}
