use std::{
    collections::{
        HashMap,
        HashSet,
    },
    time::Instant,
};

use tracing::{
    debug,
    info,
};

use crate::{
    anki::{
        deck_query,
        CollectionStore,
        Note,
        DEFAULT_DECK,
    },
    core::{
        FieldMapping,
        FieldRef,
        GrabError,
        ResultRow,
    },
};

pub mod dump;
pub mod render;
pub mod text;

pub use dump::parse_rows;
pub use render::{
    render,
    render_tuples,
    OutputFormat,
};
pub use text::NormalizeField;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub deck: String,
    pub fields: FieldMapping,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { deck: DEFAULT_DECK.to_string(), fields: FieldMapping::default() }
    }
}

/// Collects one row per card in the deck, in the order the store found them.
///
/// Any card, note or field that cannot be resolved fails the whole run; no
/// partial result is returned.
pub fn extract_rows<S: CollectionStore + ?Sized>(
    store: &S,
    options: &ExtractOptions,
) -> Result<Vec<ResultRow>, GrabError> {
    let start = Instant::now();
    let query = deck_query(&options.deck);
    let card_ids = store.find_cards(&query)?;
    info!("Found {} cards for {}", card_ids.len(), query);

    if card_ids.is_empty() {
        return Ok(Vec::new());
    }

    let cards = store.get_cards(&card_ids)?;

    let mut seen = HashSet::new();
    let note_ids: Vec<u64> =
        cards.iter().map(|card| card.note).filter(|&note_id| seen.insert(note_id)).collect();
    let notes: HashMap<u64, Note> =
        store.get_notes(&note_ids)?.into_iter().map(|note| (note.note_id, note)).collect();
    debug!("Resolved {} cards to {} notes", cards.len(), notes.len());

    let rows = cards
        .iter()
        .map(|card| {
            let note = notes.get(&card.note).ok_or(GrabError::NoteNotFound(card.note))?;
            row_from_note(card.card_id, note, &options.fields)
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!("Extracted {} rows ({:.1}s)", rows.len(), start.elapsed().as_secs_f32());
    Ok(rows)
}

/// Builds a row from a note, cleaning the sentence and image fields.
pub fn row_from_note(
    card_id: u64,
    note: &Note,
    mapping: &FieldMapping,
) -> Result<ResultRow, GrabError> {
    let field = |field: &FieldRef| {
        note.field(field).ok_or_else(|| GrabError::MissingField {
            note_id: note.note_id,
            field: field.to_string(),
        })
    };

    Ok(ResultRow {
        card_id,
        sentence: field(&mapping.sentence)?.emphasis_markers(),
        field_a: field(&mapping.field_a)?.to_string(),
        field_b: field(&mapping.field_b)?.to_string(),
        field_c: field(&mapping.field_c)?.to_string(),
        image: field(&mapping.image)?.image_source(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::anki::{
        Card,
        MemoryCollection,
    };

    /// Records which note ids each batch lookup asked for.
    struct RecordingStore {
        inner: MemoryCollection,
        note_requests: RefCell<Vec<Vec<u64>>>,
    }

    impl CollectionStore for RecordingStore {
        fn find_cards(&self, query: &str) -> Result<Vec<u64>, GrabError> {
            self.inner.find_cards(query)
        }

        fn get_card(&self, card_id: u64) -> Result<Card, GrabError> {
            self.inner.get_card(card_id)
        }

        fn get_note(&self, note_id: u64) -> Result<Note, GrabError> {
            self.inner.get_note(note_id)
        }

        fn get_notes(&self, note_ids: &[u64]) -> Result<Vec<Note>, GrabError> {
            self.note_requests.borrow_mut().push(note_ids.to_vec());
            self.inner.get_notes(note_ids)
        }
    }

    fn sme_note(note_id: u64, sentence: &str, target: &str, picture: &str) -> Note {
        Note::new(
            note_id,
            "SME",
            &[
                ("Sentence", sentence),
                ("Target", target),
                ("Part", "Noun"),
                ("Definition", "a definition"),
                ("Picture", picture),
            ],
        )
    }

    fn collection() -> MemoryCollection {
        let mut collection = MemoryCollection::new();
        collection.add_note(sme_note(
            1,
            "私は<font color=\"#0000ff\">猫</font>が好き",
            "猫",
            "<img src=\"cat.jpg\">",
        ));
        collection.add_note(sme_note(2, "<font color=\"#0000ff\">X</font>", "X", ""));
        collection.add_note(sme_note(3, "other deck", "other", ""));
        collection.add_card(300, 2, "Sentence Mining");
        collection.add_card(100, 1, "Sentence Mining::Anime");
        collection.add_card(200, 3, "Default");
        collection.add_card(101, 1, "Sentence Mining");
        collection
    }

    #[test]
    fn test_extract_rows() {
        let rows = extract_rows(&collection(), &ExtractOptions::default()).unwrap();

        // Query order, not sorted by id, and nothing from other decks
        let ids: Vec<u64> = rows.iter().map(|row| row.card_id).collect();
        assert_eq!(ids, vec![300, 100, 101]);

        assert_eq!(rows[0].sentence, "**X**");
        assert_eq!(
            rows[1],
            ResultRow {
                card_id: 100,
                sentence: "私は**猫**が好き".to_string(),
                field_a: "猫".to_string(),
                field_b: "Noun".to_string(),
                field_c: "a definition".to_string(),
                image: "cat.jpg".to_string(),
            }
        );
        assert_eq!(rows[2].sentence, rows[1].sentence);
    }

    #[test]
    fn test_extract_fetches_each_note_once() {
        let mut inner = collection();
        for card_id in 1000..1200 {
            inner.add_card(card_id, 1 + card_id % 2, "Sentence Mining");
        }
        let store = RecordingStore { inner, note_requests: RefCell::new(Vec::new()) };

        let rows = extract_rows(&store, &ExtractOptions::default()).unwrap();
        assert_eq!(rows.len(), 203);
        assert_eq!(store.note_requests.into_inner(), vec![vec![2, 1]]);
    }

    #[test]
    fn test_extract_other_deck() {
        let options = ExtractOptions { deck: "Default".to_string(), ..Default::default() };
        let rows = extract_rows(&collection(), &options).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field_a, "other");
    }

    #[test]
    fn test_extract_no_matches() {
        let rows = extract_rows(&MemoryCollection::new(), &ExtractOptions::default()).unwrap();
        assert!(rows.is_empty());
        assert_eq!(render(&rows, OutputFormat::Tuples).unwrap(), "[]");
    }

    #[test]
    fn test_extract_positional_short_note() {
        let mut collection = collection();
        collection.add_note(Note::new(4, "Four", &[("A", "a"), ("B", "b"), ("C", "c"), ("D", "d")]));
        collection.add_card(400, 4, "Sentence Mining");

        let options = ExtractOptions { fields: FieldMapping::positional(), ..Default::default() };
        match extract_rows(&collection, &options) {
            Err(GrabError::MissingField { note_id, field }) => {
                assert_eq!(note_id, 4);
                assert_eq!(field, "#4");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_positional_matches_named() {
        let named = extract_rows(&collection(), &ExtractOptions::default()).unwrap();
        let options = ExtractOptions { fields: FieldMapping::positional(), ..Default::default() };
        let positional = extract_rows(&collection(), &options).unwrap();

        assert_eq!(named, positional);
    }

    #[test]
    fn test_extract_missing_named_field() {
        let mut collection = MemoryCollection::new();
        collection.add_note(Note::new(5, "Basic", &[("Sentence", "s"), ("Target", "t")]));
        collection.add_card(500, 5, "Sentence Mining");

        match extract_rows(&collection, &ExtractOptions::default()) {
            Err(GrabError::MissingField { field, .. }) => assert_eq!(field, "'Part'"),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_missing_note() {
        let mut collection = collection();
        collection.remove_note(2);

        assert!(matches!(
            extract_rows(&collection, &ExtractOptions::default()),
            Err(GrabError::NoteNotFound(2))
        ));
    }
}
