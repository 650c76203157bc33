use crate::core::GrabError;

pub mod api;
pub mod memory;
pub mod search;
pub mod sqlite;
pub mod types;

pub use api::AnkiConnect;
pub use memory::MemoryCollection;
pub use search::{
    deck_query,
    DeckFilter,
    DEFAULT_DECK,
};
pub use sqlite::SqliteCollection;
pub use types::{
    Card,
    Field,
    Note,
};

/// Read-only access to a flashcard collection.
///
/// Stores backed by a remote service override the batch lookups to avoid one
/// round trip per card. Batch results keep the order of the requested ids.
pub trait CollectionStore {
    /// Card ids matching an Anki search string, in the order the store returns them.
    fn find_cards(&self, query: &str) -> Result<Vec<u64>, GrabError>;

    fn get_card(&self, card_id: u64) -> Result<Card, GrabError>;

    fn get_note(&self, note_id: u64) -> Result<Note, GrabError>;

    fn get_cards(&self, card_ids: &[u64]) -> Result<Vec<Card>, GrabError> {
        card_ids.iter().map(|&id| self.get_card(id)).collect()
    }

    fn get_notes(&self, note_ids: &[u64]) -> Result<Vec<Note>, GrabError> {
        note_ids.iter().map(|&id| self.get_note(id)).collect()
    }
}
