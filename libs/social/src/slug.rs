//! URL slugs for profiles

use regex::Regex;
use std::{collections::HashSet, sync::OnceLock};

/// Turn a username into a URL slug
///
/// Lower-cases, drops everything but ASCII alphanumerics, `_`, `-` and
/// whitespace, collapses whitespace/hyphen runs into one `-` and trims
/// leading and trailing `-`/`_`.
pub fn slugify(value: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS
        .get_or_init(|| Regex::new(r"[-\s]+").expect("Failed to compile slug separator regex"));

    let kept: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let slug = separators
        .replace_all(&kept, "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string();

    if slug.is_empty() {
        "user".to_string()
    } else {
        slug
    }
}

/// Path segments that share a prefix with profile URLs
///
/// `/feed/profile/update/:slug` would shadow the follower lists of a
/// profile with one of these slugs.
pub const RESERVED_SLUGS: &[&str] = &["update"];

fn is_free(candidate: &str, taken: &HashSet<String>) -> bool {
    !taken.contains(candidate) && !RESERVED_SLUGS.contains(&candidate)
}

/// First of `base`, `base-2`, `base-3`, ... that is neither in `taken` nor
/// reserved
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if is_free(base, taken) {
        return base.to_string();
    }

    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| is_free(candidate, taken))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("alice"), "alice");
        assert_eq!(slugify("Alice_Smith"), "alice_smith");
        assert_eq!(slugify("john.doe@mail"), "johndoemail");
        assert_eq!(slugify("  Mixed -- Case  "), "mixed-case");
        assert_eq!(slugify("_under_"), "under");
        assert_eq!(slugify("+++"), "user");
    }

    #[test]
    fn test_unique_slug() {
        let mut taken = HashSet::new();
        assert_eq!(unique_slug("alice", &taken), "alice");

        taken.insert("alice".to_string());
        assert_eq!(unique_slug("alice", &taken), "alice-2");

        taken.insert("alice-2".to_string());
        assert_eq!(unique_slug("alice", &taken), "alice-3");
    }

    #[test]
    fn test_reserved_slugs_are_never_handed_out() {
        let mut taken = HashSet::new();
        assert_eq!(unique_slug("update", &taken), "update-2");

        taken.insert("update-2".to_string());
        assert_eq!(unique_slug("update", &taken), "update-3");

        assert_eq!(unique_slug("updates", &taken), "updates");
    }
}
