use crate::catalog::{ContentCatalog, Sentence};

/// Ordered, duplicate-free list of the terms a player completed, with a wrapping cursor
/// for post-game review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReviewList {
    terms: Vec<String>,
    cursor: usize,
}

/// What the review screen shows for the term under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry<'a> {
    pub term: &'a str,
    pub description: &'a str,
    pub example: Option<&'a Sentence>,
    /// 1-based position of the term within the list.
    pub position: usize,
    pub total: usize,
}

impl ReviewEntry<'_> {
    pub fn translation(&self) -> Option<&str> {
        self.example.map(Sentence::translation)
    }
}

impl SessionReviewList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for term in terms {
            list.push_term(term.as_ref());
        }
        list
    }

    /// Appends `term` unless it is already listed. Returns whether it was added.
    pub fn push_term(&mut self, term: &str) -> bool {
        if self.terms.iter().any(|t| t == term) {
            return false;
        }
        self.terms.push(term.to_string());
        true
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&str> {
        self.terms.get(self.cursor).map(String::as_str)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if self.terms.len() > 1 {
            self.cursor = (self.cursor + 1) % self.terms.len();
        }
    }

    pub fn previous(&mut self) {
        let len = self.terms.len();
        if len > 1 {
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    pub fn entry<'a>(&'a self, catalog: &'a ContentCatalog) -> Option<ReviewEntry<'a>> {
        let term = self.current()?;
        Some(ReviewEntry {
            term,
            description: catalog.describe_term(term),
            example: catalog.find_example_for(term),
            position: self.cursor + 1,
            total: self.terms.len(),
        })
    }
}
