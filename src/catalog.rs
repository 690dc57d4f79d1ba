use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::CatalogError;

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

const DEFAULT_CORPUS_FILE: &str = "services.json";

/// Returned by [`ContentCatalog::describe_term`] for terms the corpus does not know.
pub const DESCRIPTION_NOT_FOUND: &str = "description not found";
pub const TRANSLATION_NOT_FOUND: &str = "translation not found";

/// A practice sentence with one highlighted term embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    text: String,
    term: String,
    // byte offset of the highlighted occurrence of `term` within `text`
    term_start: usize,
    description: String,
    translation: String,
    category: String,
}

impl Sentence {
    /// Builds a sentence from clean text and the term it embeds.
    ///
    /// Fails when the term is empty or is not a case-sensitive substring of the text.
    pub fn new(text: impl Into<String>, term: impl Into<String>) -> Result<Self, CatalogError> {
        let text = text.into();
        let term = term.into();
        if term.is_empty() {
            return Err(CatalogError::InvalidSentence {
                raw: text,
                reason: "term is empty",
            });
        }
        let Some(term_start) = text.find(&term) else {
            return Err(CatalogError::InvalidSentence {
                raw: text,
                reason: "term does not occur in text",
            });
        };

        Ok(Self {
            text,
            term,
            term_start,
            description: DESCRIPTION_NOT_FOUND.to_string(),
            translation: TRANSLATION_NOT_FOUND.to_string(),
            category: String::new(),
        })
    }

    /// Parses corpus text carrying exactly one `<term>` marker, e.g.
    /// `"I wrote a <Lambda> function to feed my cat"`.
    pub fn from_marked(raw: &str) -> Result<Self, CatalogError> {
        let invalid = |reason| CatalogError::InvalidSentence {
            raw: raw.to_string(),
            reason,
        };

        let open = raw.find('<').ok_or_else(|| invalid("missing <term> marker"))?;
        let close = raw[open..]
            .find('>')
            .map(|offset| open + offset)
            .ok_or_else(|| invalid("unterminated <term> marker"))?;

        let before = &raw[..open];
        let term = &raw[open + 1..close];
        let after = &raw[close + 1..];

        if term.is_empty() {
            return Err(invalid("empty <term> marker"));
        }
        if before.contains('>') || term.contains('<') || after.contains(['<', '>']) {
            return Err(invalid("more than one <term> marker"));
        }

        Ok(Self {
            text: format!("{before}{term}{after}"),
            term: term.to_string(),
            term_start: before.len(),
            description: DESCRIPTION_NOT_FOUND.to_string(),
            translation: TRANSLATION_NOT_FOUND.to_string(),
            category: String::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = translation.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Length of the text in characters, the unit every counter uses.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text split around the highlighted term: `(before, term, after)`.
    pub fn segments(&self) -> (&str, &str, &str) {
        let end = self.term_start + self.term.len();
        (
            &self.text[..self.term_start],
            &self.text[self.term_start..end],
            &self.text[end..],
        )
    }

    /// Character positions covered by the highlighted term.
    pub fn term_char_range(&self) -> Range<usize> {
        let start = self.text[..self.term_start].chars().count();
        start..start + self.term.chars().count()
    }
}

fn fallback_sentence() -> Sentence {
    Sentence {
        text: "My EC2 instance is having an identity crisis".to_string(),
        term: "EC2".to_string(),
        term_start: 3,
        description: "Resizable virtual servers in the cloud".to_string(),
        translation: "私のEC2インスタンスはアイデンティティの危機に陥っています".to_string(),
        category: "compute".to_string(),
    }
}

#[derive(Deserialize, Debug)]
struct CorpusFile {
    categories: Vec<CategoryEntry>,
}

#[derive(Deserialize, Debug)]
struct CategoryEntry {
    name: String,
    #[serde(default)]
    descriptions: HashMap<String, String>,
    #[serde(default)]
    sentences: Vec<SentenceEntry>,
}

#[derive(Deserialize, Debug)]
struct SentenceEntry {
    text: String,
    #[serde(default)]
    translation: Option<String>,
}

/// The set of practice sentences the game samples from.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    sentences: Vec<Sentence>,
    descriptions: HashMap<String, String>,
    categories: Vec<String>,
}

impl ContentCatalog {
    /// The corpus compiled into the binary.
    pub fn embedded() -> Self {
        let loaded = CORPUS_DIR
            .get_file(DEFAULT_CORPUS_FILE)
            .and_then(|file| file.contents_utf8())
            .map(Self::from_json_str);

        match loaded {
            Some(Ok(catalog)) => catalog,
            Some(Err(e)) => {
                warn!(error = %e, "embedded corpus is malformed, using fallback sentence only");
                Self::default()
            }
            None => {
                warn!("embedded corpus missing, using fallback sentence only");
                Self::default()
            }
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), sentences = catalog.len(), "loaded corpus");
        Ok(catalog)
    }

    /// Parses a corpus document. Individual malformed sentences are skipped.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CorpusFile = serde_json::from_str(json)?;

        let mut catalog = Self::default();
        for category in file.categories {
            for entry in &category.sentences {
                match Sentence::from_marked(&entry.text) {
                    Ok(sentence) => {
                        let description = category
                            .descriptions
                            .get(sentence.term())
                            .map(String::as_str)
                            .unwrap_or(DESCRIPTION_NOT_FOUND)
                            .to_string();
                        let translation = entry
                            .translation
                            .clone()
                            .unwrap_or_else(|| TRANSLATION_NOT_FOUND.to_string());
                        catalog.sentences.push(
                            sentence
                                .with_description(description)
                                .with_translation(translation)
                                .with_category(&category.name),
                        );
                    }
                    Err(e) => warn!(category = %category.name, error = %e, "skipping sentence"),
                }
            }

            for (term, description) in category.descriptions {
                catalog.descriptions.entry(term).or_insert(description);
            }
            if !catalog.categories.contains(&category.name) {
                catalog.categories.push(category.name);
            }
        }

        Ok(catalog)
    }

    pub fn from_sentences(sentences: Vec<Sentence>) -> Self {
        let mut descriptions = HashMap::new();
        for sentence in &sentences {
            if sentence.description() != DESCRIPTION_NOT_FOUND {
                descriptions
                    .entry(sentence.term().to_string())
                    .or_insert_with(|| sentence.description().to_string());
            }
        }
        let categories = sentences
            .iter()
            .map(|s| s.category().to_string())
            .filter(|c| !c.is_empty())
            .unique()
            .collect();

        Self {
            sentences,
            descriptions,
            categories,
        }
    }

    /// A catalog holding only the sentences of one category.
    pub fn restrict_to_category(&self, name: &str) -> Result<Self, CatalogError> {
        if !self.categories.iter().any(|c| c == name) {
            return Err(CatalogError::UnknownCategory(name.to_string()));
        }

        Ok(Self {
            sentences: self
                .sentences
                .iter()
                .filter(|s| s.category() == name)
                .cloned()
                .collect(),
            descriptions: self.descriptions.clone(),
            categories: vec![name.to_string()],
        })
    }

    pub fn sample_sentence(&self) -> Sentence {
        self.sample_sentence_with(&mut rand::thread_rng())
    }

    /// Uniform pick from the corpus; the fallback sentence when the corpus is empty.
    pub fn sample_sentence_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Sentence {
        self.sentences
            .choose(rng)
            .cloned()
            .unwrap_or_else(fallback_sentence)
    }

    pub fn describe_term(&self, term: &str) -> &str {
        self.descriptions
            .get(term)
            .map(String::as_str)
            .unwrap_or(DESCRIPTION_NOT_FOUND)
    }

    /// First sentence in corpus order whose term is `term`.
    pub fn find_example_for(&self, term: &str) -> Option<&Sentence> {
        self.sentences.iter().find(|s| s.term() == term)
    }

    pub fn translation_for(&self, text: &str) -> Option<&str> {
        self.sentences
            .iter()
            .find(|s| s.text() == text)
            .map(Sentence::translation)
    }

    /// Distinct terms in corpus order.
    pub fn terms(&self) -> Vec<&str> {
        self.sentences.iter().map(Sentence::term).unique().collect()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}
