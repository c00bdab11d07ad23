//! Table-name filter.
//!
//! Dump tools often prefix table names with a site or application id
//! (`forum_users`), so a pattern also matches behind one `<prefix>_`.

use regex::Regex;

#[derive(Debug, Clone)]
pub struct TableFilter {
    pattern: Option<Regex>,
}

impl TableFilter {
    /// Filter that accepts every table.
    pub fn all() -> Self {
        Self { pattern: None }
    }

    /// Compile `pattern`, anchored at both ends, case-insensitive, tolerating
    /// an optional leading `<alnum>_` prefix.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = format!(r"(?i)^(?:[a-z0-9]+_)?(?:{})$", pattern);
        Ok(Self {
            pattern: Some(Regex::new(&anchored)?),
        })
    }

    /// `None` or an empty pattern accepts every table.
    pub fn from_option(pattern: Option<&str>) -> Result<Self, regex::Error> {
        match pattern {
            Some(p) if !p.is_empty() => Self::new(p),
            _ => Ok(Self::all()),
        }
    }

    pub fn matches(&self, table_name: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(table_name),
            None => true,
        }
    }
}

impl Default for TableFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_tolerant_match() {
        let filter = TableFilter::new("users?").unwrap();
        assert!(filter.matches("users"));
        assert!(filter.matches("user"));
        assert!(filter.matches("forum_users"));
        assert!(filter.matches("FORUM_Users"));
        assert!(!filter.matches("users_log"));
        assert!(!filter.matches("my_forum_users"));
    }

    #[test]
    fn test_alternation_is_grouped() {
        let filter = TableFilter::new("posts|users").unwrap();
        assert!(filter.matches("wp_posts"));
        assert!(filter.matches("users"));
        assert!(!filter.matches("posts_meta"));
    }

    #[test]
    fn test_no_pattern_matches_all() {
        let filter = TableFilter::from_option(None).unwrap();
        assert!(filter.matches("anything"));
        assert!(TableFilter::from_option(Some("")).unwrap().matches("anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(TableFilter::new("users(").is_err());
    }
}
