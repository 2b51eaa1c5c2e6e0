//! Input validation utilities

use url::Url;

/// Validate that a URL is absolute and uses http or https.
pub fn validate_url(url: &str) -> Result<Url, String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let parsed = Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(format!(
            "Invalid URL '{}': unsupported scheme '{}', expected http or https",
            url, other
        )),
    }
}

/// Component ids become key prefixes, so they may not contain the `-`
/// separator or characters that would need escaping.
pub fn validate_component_id(id: &str) -> Result<(), String> {
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(format!(
            "Invalid component id '{}': character '{}' is not allowed (use letters, digits or '_')",
            id, bad
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_valid_urls() {
        assert!(validate_url("http://localhost:8080/pnc-rest/v2").is_ok());
        assert!(validate_url("https://pnc.example.test").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_invalid_urls() {
        assert!(validate_url("").is_err());
        assert!(validate_url("localhost:8080").is_err());
        assert!(validate_url("ftp://example.test").is_err());
        assert!(validate_url("pnc.example.test").is_err());
    }

    #[test]
    fn test_validate_component_id() {
        assert!(validate_component_id("").is_ok());
        assert!(validate_component_id("builds").is_ok());
        assert!(validate_component_id("tab_2").is_ok());

        let err = validate_component_id("left-pane").unwrap_err();
        assert!(err.contains("'-'"));
        assert!(validate_component_id("a b").is_err());
    }
}
