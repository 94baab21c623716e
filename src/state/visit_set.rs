use std::collections::HashSet;

/// URLs fetched or scheduled in the current crawl run
///
/// Keys are normalized URL strings. A URL is inserted when it is scheduled,
/// so it can never be scheduled twice.
#[derive(Debug, Default)]
pub struct VisitSet {
    seen: HashSet<String>,
}

impl VisitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL as visited; returns false if it already was
    pub fn insert(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_once() {
        let mut visits = VisitSet::new();
        assert!(visits.insert("https://example.com/"));
        assert!(!visits.insert("https://example.com/"));
        assert!(visits.contains("https://example.com/"));
        assert_eq!(visits.len(), 1);
    }

    #[test]
    fn test_distinct_urls() {
        let mut visits = VisitSet::new();
        assert!(visits.is_empty());
        visits.insert("https://example.com/a");
        visits.insert("https://example.com/b");
        assert_eq!(visits.len(), 2);
        assert!(!visits.contains("https://example.com/c"));
    }
}
