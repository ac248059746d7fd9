use std::fmt;

use serde::{Deserialize, Serialize};

/// Wall-clock time of day at minute resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClockTime {
    /// Hour in `[0, 23]`.
    pub hour: u8,
    /// Minute in `[0, 59]`.
    pub minute: u8,
}

impl ClockTime {
    /// Returns `None` when either field is out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// The minute after this one, wrapping 23:59 to 00:00.
    pub fn next_minute(self) -> Self {
        if self.minute < 59 {
            Self {
                hour: self.hour,
                minute: self.minute + 1,
            }
        } else {
            Self {
                hour: (self.hour + 1) % 24,
                minute: 0,
            }
        }
    }

    /// True at the top of the hour, where no verse exists.
    pub fn is_hour_mark(self) -> bool {
        self.minute == 0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Chapter/verse pair derived from a [`ClockTime`].
///
/// `verse == 0` never names a real verse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClockTarget {
    /// Chapter in `[1, 24]`.
    pub chapter: u32,
    /// Verse number; zero is the "no verse" sentinel.
    pub verse: u32,
}

impl ClockTarget {
    /// Formats the lookup reference for `book`, e.g. `Psalms 23:5`.
    pub fn reference(&self, book: &str) -> String {
        format!("{book} {}:{}", self.chapter, self.verse)
    }
}

/// One chapter of a book; only its verse count matters here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterEntry {
    /// Number of verses in the chapter.
    pub verse_count: u32,
}

/// A book and its chapters, stored 0-based (chapter `n` lives at `n - 1`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookEntry {
    /// Book name, unique within a catalog.
    pub name: String,
    /// Chapters in order.
    pub chapters: Vec<ChapterEntry>,
}

impl BookEntry {
    /// Convenience constructor from raw verse counts.
    pub fn new(name: impl Into<String>, verse_counts: impl IntoIterator<Item = u32>) -> Self {
        Self {
            name: name.into(),
            chapters: verse_counts
                .into_iter()
                .map(|verse_count| ChapterEntry { verse_count })
                .collect(),
        }
    }

    /// Chapter by 1-based number. `None` if the book is shorter.
    pub fn chapter(&self, number: u32) -> Option<&ChapterEntry> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.chapters.get(index)
    }
}

/// A verse as returned by the verse service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerseResult {
    /// Canonical reference, e.g. `Psalms 23:5`.
    pub reference_text: String,
    /// Verse body, trimmed.
    pub body_text: String,
    /// Translation label, e.g. `King James Version`.
    pub translation_label: String,
}

/// What the presentation layer should show for one minute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayOutcome {
    /// A verse matching the current time was found.
    VerseFound(VerseResult),
    /// No book could supply the verse for this target.
    NoVerseAvailable(ClockTarget),
    /// Top of the hour; carries the hour in `[0, 23]`.
    HourMark {
        /// Wall-clock hour.
        hour: u8,
    },
}

impl DisplayOutcome {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayOutcome::VerseFound(_) => "verse_found",
            DisplayOutcome::NoVerseAvailable(_) => "no_verse_available",
            DisplayOutcome::HourMark { .. } => "hour_mark",
        }
    }
}
