use std::collections::HashMap;

use super::{
    search::DeckFilter,
    types::{
        Card,
        Note,
    },
    CollectionStore,
};
use crate::core::GrabError;

/// A collection held entirely in memory. Cards are returned in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryCollection {
    cards: Vec<Card>,
    notes: HashMap<u64, Note>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.insert(note.note_id, note);
    }

    pub fn add_card(&mut self, card_id: u64, note_id: u64, deck_name: &str) {
        self.cards.push(Card { card_id, note: note_id, deck_name: deck_name.to_string() });
    }

    pub fn remove_note(&mut self, note_id: u64) -> Option<Note> {
        self.notes.remove(&note_id)
    }
}

impl CollectionStore for MemoryCollection {
    fn find_cards(&self, query: &str) -> Result<Vec<u64>, GrabError> {
        let filter = DeckFilter::parse(query)?;
        Ok(self
            .cards
            .iter()
            .filter(|card| filter.matches(&card.deck_name))
            .map(|card| card.card_id)
            .collect())
    }

    fn get_card(&self, card_id: u64) -> Result<Card, GrabError> {
        self.cards
            .iter()
            .find(|card| card.card_id == card_id)
            .cloned()
            .ok_or(GrabError::CardNotFound(card_id))
    }

    fn get_note(&self, note_id: u64) -> Result<Note, GrabError> {
        self.notes.get(&note_id).cloned().ok_or(GrabError::NoteNotFound(note_id))
    }
}
