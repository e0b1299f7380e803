//! Site name validation and slug generation.
//!
//! A slug is `<name>-<suffix>`: the user's chosen name plus a short random
//! token so that two users can both pick `bakery` without colliding in the
//! organization's repository namespace.

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::SiteError;

static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Length of the random suffix appended to every slug.
pub const SUFFIX_LEN: usize = 6;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Check a user-typed site name against `^[a-z0-9-]+$`.
pub fn validate_name(name: &str) -> Result<(), SiteError> {
    if NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(SiteError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Random lowercase alphanumeric token of `SUFFIX_LEN` characters.
pub fn random_suffix(rng: &mut impl Rng) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Build the slug for an already-validated name.
pub fn make_slug(name: &str, rng: &mut impl Rng) -> String {
    format!("{}-{}", name, random_suffix(rng))
}

/// Validate `name` and produce a fresh slug for it.
pub fn generate_slug(name: &str) -> Result<String, SiteError> {
    validate_name(name)?;
    Ok(make_slug(name, &mut rand::thread_rng()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_valid_names() {
        for name in ["my-photo-site", "bakery", "a", "123", "-", "site-2024"] {
            assert!(validate_name(name).is_ok(), "expected {:?} to be valid", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in [
            "",
            "My-Site",
            "my site",
            "my_site",
            "site.com",
            "café",
            "site\n",
            "[owner:x]",
        ] {
            let err = validate_name(name).unwrap_err();
            assert!(err.is_validation(), "expected {:?} to be rejected", name);
        }
    }

    #[test]
    fn test_slug_starts_with_name() {
        let slug = generate_slug("my-photo-site").unwrap();
        assert!(slug.starts_with("my-photo-site-"));
        assert_eq!(slug.len(), "my-photo-site-".len() + SUFFIX_LEN);
    }

    #[test]
    fn test_slug_rejects_invalid_name() {
        assert!(matches!(
            generate_slug("Not Valid"),
            Err(SiteError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_suffix_is_lowercase_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let suffix = random_suffix(&mut rng);
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(
                suffix
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn test_generated_slug_is_itself_a_valid_name() {
        let mut rng = StdRng::seed_from_u64(1);
        let slug = make_slug("shop", &mut rng);
        assert!(validate_name(&slug).is_ok());
    }

    #[test]
    fn test_slugs_differ_between_calls() {
        let mut rng = StdRng::seed_from_u64(99);
        let a = make_slug("shop", &mut rng);
        let b = make_slug("shop", &mut rng);
        assert_ne!(a, b);
    }
}
