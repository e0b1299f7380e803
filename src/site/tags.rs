//! Ownership tags embedded in a repository description.
//!
//! There is no database: who owns a site and what it was originally called
//! are stored in the repository's free-text description as
//! `[owner:<id>]` and `[display:<name>]`. Listing performs an exact substring
//! match on the owner tag, so the syntax here must never change.

use regex::Regex;
use std::sync::LazyLock;

use crate::errors::SiteError;

static DISPLAY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[display:(.+?)\]").unwrap());

static OWNER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[owner:(.+?)\]").unwrap());

const DESCRIPTION_PREFIX: &str = "SiteForge site";

/// `[owner:<id>]`
pub fn owner_tag(owner_id: &str) -> String {
    format!("[owner:{}]", owner_id)
}

/// `[display:<name>]`
pub fn display_tag(display_name: &str) -> String {
    format!("[display:{}]", display_name)
}

/// Reject owner ids that could close their own tag and open another.
pub fn validate_owner_id(owner_id: &str) -> Result<(), SiteError> {
    if owner_id.trim().is_empty() || owner_id.contains(['[', ']']) {
        return Err(SiteError::InvalidOwner {
            owner: owner_id.to_string(),
        });
    }
    Ok(())
}

/// Description written on repository creation. `owner_id` must already
/// pass [`validate_owner_id`].
pub fn encode_description(owner_id: &str, display_name: &str) -> String {
    format!(
        "{} {} {}",
        DESCRIPTION_PREFIX,
        owner_tag(owner_id),
        display_tag(display_name)
    )
}

/// True when `description` carries exactly this owner's tag.
pub fn is_owned_by(description: Option<&str>, owner_id: &str) -> bool {
    description.is_some_and(|d| d.contains(&owner_tag(owner_id)))
}

/// Extract the display name, if the description has one.
pub fn parse_display_name(description: Option<&str>) -> Option<String> {
    let captures = DISPLAY_REGEX.captures(description?)?;
    captures.get(1).map(|m| m.as_str().to_string())
}

/// Extract the owner id, if the description has one.
pub fn parse_owner(description: Option<&str>) -> Option<String> {
    let captures = OWNER_REGEX.captures(description?)?;
    captures.get(1).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_description_exact_syntax() {
        assert_eq!(
            encode_description("user_2abc", "my-photo-site"),
            "SiteForge site [owner:user_2abc] [display:my-photo-site]"
        );
    }

    #[test]
    fn test_display_name_round_trip() {
        for name in ["my-photo-site", "Sarah's Portfolio", "café du monde", "a b  c", "x"] {
            let description = encode_description("owner-1", name);
            assert_eq!(
                parse_display_name(Some(&description)).as_deref(),
                Some(name),
                "round trip failed for {:?}",
                name
            );
        }
    }

    #[test]
    fn test_owner_round_trip() {
        let description = encode_description("user_2xYz", "shop");
        assert_eq!(parse_owner(Some(&description)).as_deref(), Some("user_2xYz"));
    }

    #[test]
    fn test_parse_display_missing() {
        assert_eq!(parse_display_name(None), None);
        assert_eq!(parse_display_name(Some("")), None);
        assert_eq!(parse_display_name(Some("SiteForge site [owner:a]")), None);
        assert_eq!(parse_display_name(Some("[display:]")), None);
    }

    #[test]
    fn test_is_owned_by_exact_tag() {
        let description = encode_description("abc", "shop");
        assert!(is_owned_by(Some(&description), "abc"));
        assert!(!is_owned_by(Some(&description), "ab"));
        assert!(!is_owned_by(Some(&description), "abcd"));
        assert!(!is_owned_by(Some(&description), "bc"));
    }

    #[test]
    fn test_validate_owner_id() {
        assert!(validate_owner_id("user_2xYz").is_ok());
        assert!(validate_owner_id("auth0|abc-123").is_ok());
        for bad in ["", "  ", "mallory] [owner:alice", "a]b", "[owner:x"] {
            assert!(
                matches!(validate_owner_id(bad), Err(SiteError::InvalidOwner { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_bracketed_owner_would_forge_second_tag() {
        // Unvalidated, the id smuggles in a second owner tag
        let description = encode_description("mallory] [owner:alice", "shop");
        assert!(is_owned_by(Some(&description), "alice"));
        assert!(validate_owner_id("mallory] [owner:alice").is_err());
    }

    #[test]
    fn test_is_owned_by_missing_description() {
        assert!(!is_owned_by(None, "abc"));
        assert!(!is_owned_by(Some("a plain repo"), "abc"));
        assert!(!is_owned_by(Some("owner:abc"), "abc"));
    }
}
