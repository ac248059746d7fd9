//! Book/chapter/verse-count index, loaded once at startup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{BookEntry, ChapterEntry, ClockTarget};

/// Reasons a catalog source is rejected. Any of these is fatal to clock startup.
#[derive(Debug, Error)]
pub enum CatalogFormatError {
    /// The source file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The source is not JSON at all.
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// Top-level value is not an array.
    #[error("catalog is not a sequence of book records")]
    NotASequence,
    /// Array parsed but holds no books.
    #[error("catalog contains no books")]
    Empty,
    /// A record lacks its name or chapter list, or has the wrong shape.
    #[error("book record {index} is malformed: {reason}")]
    InvalidBook {
        /// Position in the source sequence.
        index: usize,
        /// Decoder message.
        reason: String,
    },
    /// A chapter's `verses` field is not a non-negative integer.
    #[error("{book} chapter {chapter}: verse count {value} is not a non-negative integer")]
    InvalidVerseCount {
        /// Book name.
        book: String,
        /// 1-based chapter number.
        chapter: usize,
        /// Offending raw value.
        value: String,
    },
    /// Two records share a name.
    #[error("duplicate book name: {0}")]
    DuplicateBook(String),
}

#[derive(Deserialize)]
struct RawBook {
    book: String,
    chapters: Vec<RawChapter>,
}

#[derive(Deserialize)]
struct RawChapter {
    verses: Value,
}

/// Read-only index of books in catalog order.
#[derive(Debug, Clone, Default)]
pub struct VerseCatalog {
    books: Vec<BookEntry>,
}

impl VerseCatalog {
    /// Builds a catalog from already-typed books.
    pub fn from_books(books: Vec<BookEntry>) -> Result<Self, CatalogFormatError> {
        if books.is_empty() {
            return Err(CatalogFormatError::Empty);
        }
        let mut seen = HashSet::new();
        for (index, book) in books.iter().enumerate() {
            if book.name.trim().is_empty() {
                return Err(CatalogFormatError::InvalidBook {
                    index,
                    reason: "empty book name".into(),
                });
            }
            if !seen.insert(book.name.as_str()) {
                return Err(CatalogFormatError::DuplicateBook(book.name.clone()));
            }
        }
        Ok(Self { books })
    }

    /// Parses the catalog document: `[{ "book": .., "chapters": [{ "verses": .. }] }]`.
    pub fn load(source: &str) -> Result<Self, CatalogFormatError> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(value)
    }

    /// Parses an already-decoded JSON document.
    pub fn from_value(value: Value) -> Result<Self, CatalogFormatError> {
        let Value::Array(records) = value else {
            return Err(CatalogFormatError::NotASequence);
        };

        let mut books = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let raw: RawBook =
                serde_json::from_value(record).map_err(|e| CatalogFormatError::InvalidBook {
                    index,
                    reason: e.to_string(),
                })?;
            let mut chapters = Vec::with_capacity(raw.chapters.len());
            for (i, ch) in raw.chapters.iter().enumerate() {
                let verse_count = parse_verse_count(&ch.verses).ok_or_else(|| {
                    CatalogFormatError::InvalidVerseCount {
                        book: raw.book.clone(),
                        chapter: i + 1,
                        value: ch.verses.to_string(),
                    }
                })?;
                chapters.push(ChapterEntry { verse_count });
            }
            books.push(BookEntry {
                name: raw.book,
                chapters,
            });
        }

        let catalog = Self::from_books(books)?;
        tracing::debug!(books = catalog.len(), "catalog parsed");
        Ok(catalog)
    }

    /// Reads and parses a catalog file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogFormatError> {
        let s = std::fs::read_to_string(path).map_err(|source| CatalogFormatError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&s)
    }

    /// Books whose chapter `target.chapter` exists and has at least
    /// `target.verse` verses, in catalog order.
    pub fn eligible_books(&self, target: ClockTarget) -> Vec<&str> {
        self.books
            .iter()
            .filter(|b| {
                b.chapter(target.chapter)
                    .is_some_and(|c| c.verse_count >= target.verse)
            })
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Book by name.
    pub fn book(&self, name: &str) -> Option<&BookEntry> {
        self.books.iter().find(|b| b.name == name)
    }

    /// All books in catalog order.
    pub fn books(&self) -> &[BookEntry] {
        &self.books
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// True for a default-constructed catalog; loaded catalogs are never empty.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn parse_verse_count(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
