//! Domain ID generation and resolution
//!
//! All generated IDs use the format: `{6-char-hex}-{type}-{slug}`
//! Example: `3f9a1c-task-design-new-homepage`

use std::collections::HashMap;

/// Generate a domain ID from type and title
///
/// The hex part comes from the random tail of a v7 UUID so that two records
/// with the same title created close together still get distinct ids.
pub fn generate_id(domain_type: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    let hex = &uuid[uuid.len() - 6..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", hex, domain_type)
    } else {
        format!("{}-{}-{}", hex, domain_type, slug)
    }
}

/// Slugify a title for use in IDs
fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .take(6)
        .collect::<Vec<_>>()
        .join("-")
}

/// ID resolution for partial matches
pub struct IdResolver<'a> {
    ids: &'a HashMap<String, String>, // id -> display name
}

impl<'a> IdResolver<'a> {
    pub fn new(ids: &'a HashMap<String, String>) -> Self {
        Self { ids }
    }

    /// Resolve a partial reference to a full ID
    ///
    /// Returns:
    /// - Ok(Some(id)) if exactly one match (an exact id always wins)
    /// - Ok(None) if no matches
    /// - Err with candidates if ambiguous
    pub fn resolve(&self, reference: &str) -> Result<Option<String>, Vec<String>> {
        if self.ids.contains_key(reference) {
            return Ok(Some(reference.to_string()));
        }

        let mut matches: Vec<String> = self
            .ids
            .keys()
            .filter(|id| Self::matches(id, reference))
            .cloned()
            .collect();
        matches.sort();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(matches),
        }
    }

    /// Check if an ID matches a reference
    fn matches(id: &str, reference: &str) -> bool {
        if reference.is_empty() {
            return false;
        }

        // Hex prefix match
        if id.starts_with(reference) {
            return true;
        }

        // Slug contains match
        if let Some(slug_start) = id.find('-') {
            let slug_part = &id[slug_start + 1..];
            if slug_part.contains(reference) {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id("task", "Design new homepage mockup");
        assert!(id.len() > 10);
        assert!(id.contains("-task-"));
        assert!(id.ends_with("design-new-homepage-mockup"));
    }

    #[test]
    fn test_generate_id_same_title_differs() {
        let a = generate_id("task", "A");
        let b = generate_id("task", "A");
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_id_empty_slug() {
        let id = generate_id("task", "!!!");
        assert!(id.ends_with("-task"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Read \"Atomic Habits\""), "read-atomic-habits");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("don't stop"), "dont-stop");
        assert_eq!(slugify("one two three four five six seven"), "one-two-three-four-five-six");
    }

    fn sample_ids() -> HashMap<String, String> {
        let mut ids = HashMap::new();
        ids.insert("a1b2c3-project-website-redesign".to_string(), "Website Redesign".to_string());
        ids.insert("d4e5f6-project-q3-marketing".to_string(), "Q3 Marketing".to_string());
        ids.insert("uncategorized".to_string(), "Uncategorized".to_string());
        ids
    }

    #[test]
    fn test_id_resolver_exact() {
        let ids = sample_ids();
        let resolver = IdResolver::new(&ids);
        assert_eq!(
            resolver.resolve("uncategorized").unwrap(),
            Some("uncategorized".to_string())
        );
    }

    #[test]
    fn test_id_resolver_hex_prefix() {
        let ids = sample_ids();
        let resolver = IdResolver::new(&ids);
        assert_eq!(
            resolver.resolve("a1b2").unwrap(),
            Some("a1b2c3-project-website-redesign".to_string())
        );
    }

    #[test]
    fn test_id_resolver_slug_match() {
        let ids = sample_ids();
        let resolver = IdResolver::new(&ids);
        assert_eq!(
            resolver.resolve("marketing").unwrap(),
            Some("d4e5f6-project-q3-marketing".to_string())
        );
    }

    #[test]
    fn test_id_resolver_ambiguous() {
        let ids = sample_ids();
        let resolver = IdResolver::new(&ids);
        let candidates = resolver.resolve("project").unwrap_err();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_id_resolver_no_match() {
        let ids = sample_ids();
        let resolver = IdResolver::new(&ids);
        assert_eq!(resolver.resolve("nonexistent").unwrap(), None);
        assert_eq!(resolver.resolve("").unwrap(), None);
    }
}
