//! Catalog loading and eligibility.

use std::io::Write;

use serde_json::json;
use verse_clock_core::{to_target, BookEntry, CatalogFormatError, ClockTarget, VerseCatalog};

fn sample() -> VerseCatalog {
    // Psalms is padded so chapter 23 has 6 verses.
    let mut psalms = vec![10; 22];
    psalms.push(6);
    VerseCatalog::from_books(vec![
        BookEntry::new("Genesis", [31, 25, 24, 26, 32, 22, 24]),
        BookEntry::new("Ruth", [22, 23, 18, 22]),
        BookEntry::new("Psalms", psalms),
        BookEntry::new("Jude", [25]),
    ])
    .unwrap()
}

#[test]
fn loads_numbers_and_numeric_strings() {
    let doc = json!([
        { "book": "Genesis", "chapters": [{ "verses": 31 }, { "verses": "25" }] },
        { "book": "Jude", "chapters": [{ "verses": "25" }] }
    ]);
    let catalog = VerseCatalog::load(&doc.to_string()).unwrap();
    assert_eq!(catalog.len(), 2);
    let gen = catalog.book("Genesis").unwrap();
    assert_eq!(gen.chapter(2).unwrap().verse_count, 25);
}

#[test]
fn rejects_non_sequence() {
    let err = VerseCatalog::load(r#"{"book":"Genesis"}"#).unwrap_err();
    assert!(matches!(err, CatalogFormatError::NotASequence));
}

#[test]
fn rejects_record_without_chapters() {
    let doc = json!([{ "book": "Genesis", "chapters": [] }, { "book": "Exodus" }]);
    let err = VerseCatalog::from_value(doc).unwrap_err();
    match err {
        CatalogFormatError::InvalidBook { index, reason } => {
            assert_eq!(index, 1);
            assert!(reason.contains("chapters"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rejects_bad_verse_count() {
    let doc = json!([{ "book": "Genesis", "chapters": [{ "verses": 31 }, { "verses": "many" }] }]);
    let err = VerseCatalog::from_value(doc).unwrap_err();
    assert!(matches!(
        err,
        CatalogFormatError::InvalidVerseCount { chapter: 2, .. }
    ));
}

#[test]
fn rejects_empty_and_duplicates() {
    assert!(matches!(
        VerseCatalog::load("[]").unwrap_err(),
        CatalogFormatError::Empty
    ));
    let doc = json!([
        { "book": "Jude", "chapters": [{ "verses": 25 }] },
        { "book": "Jude", "chapters": [{ "verses": 25 }] }
    ]);
    assert!(matches!(
        VerseCatalog::from_value(doc).unwrap_err(),
        CatalogFormatError::DuplicateBook(name) if name == "Jude"
    ));
}

#[test]
fn rejects_invalid_json() {
    assert!(matches!(
        VerseCatalog::load("not json").unwrap_err(),
        CatalogFormatError::Parse(_)
    ));
}

#[test]
fn loads_from_path() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, r#"[{{"book":"Jude","chapters":[{{"verses":25}}]}}]"#).unwrap();
    let catalog = VerseCatalog::from_path(f.path()).unwrap();
    assert_eq!(catalog.books()[0].name, "Jude");

    let missing = f.path().with_extension("missing");
    assert!(matches!(
        VerseCatalog::from_path(&missing).unwrap_err(),
        CatalogFormatError::Read { .. }
    ));
}

#[test]
fn eligible_books_keep_catalog_order() {
    let catalog = sample();
    let got = catalog.eligible_books(ClockTarget { chapter: 1, verse: 25 });
    assert_eq!(got, vec!["Genesis", "Jude"]);
}

#[test]
fn eligible_books_require_the_chapter() {
    let catalog = sample();
    let got = catalog.eligible_books(to_target(23, 5));
    assert_eq!(got, vec!["Psalms"]);
    let got = catalog.eligible_books(to_target(23, 7));
    assert!(got.is_empty());
    // Midnight maps to chapter 24, which nobody here has.
    assert!(catalog.eligible_books(to_target(0, 1)).is_empty());
}

#[test]
fn eligible_books_only_return_books_with_enough_verses() {
    let catalog = sample();
    for chapter in 1..=24 {
        for verse in 0..=59 {
            let target = ClockTarget { chapter, verse };
            for name in catalog.eligible_books(target) {
                let ch = catalog.book(name).unwrap().chapter(chapter).unwrap();
                assert!(ch.verse_count >= verse);
            }
        }
    }
}

#[test]
fn shrinking_verse_never_shrinks_eligible_set() {
    let catalog = sample();
    for chapter in 1..=24 {
        for verse in 1..=59 {
            let wider = catalog.eligible_books(ClockTarget {
                chapter,
                verse: verse - 1,
            });
            let narrower = catalog.eligible_books(ClockTarget { chapter, verse });
            for name in &narrower {
                assert!(wider.contains(name), "{name} lost at {chapter}:{}", verse - 1);
            }
        }
    }
}
