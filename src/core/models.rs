use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// One extracted line: a card and the cleaned-up fields of its note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub card_id: u64,
    pub sentence: String, // Highlight tags turned into `**` markers
    pub field_a: String,
    pub field_b: String,
    pub field_c: String,
    pub image: String, // Bare file name, `<img src="...">` wrapper stripped
}

/// Points at a note field either by its name or by its position in the note type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Position(usize),
    Name(String),
}

impl FieldRef {
    pub fn name(name: &str) -> Self {
        FieldRef::Name(name.to_string())
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Position(index) => write!(f, "#{}", index),
            FieldRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// Which note field feeds each column of a [`ResultRow`].
///
/// The default targets the sentence-mining note type (`Sentence`, `Target`, `Part`,
/// `Definition`, `Picture`). [`FieldMapping::positional`] reads the first five fields
/// in note type order instead, whatever they are called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub sentence: FieldRef,
    pub field_a: FieldRef,
    pub field_b: FieldRef,
    pub field_c: FieldRef,
    pub image: FieldRef,
}

impl FieldMapping {
    pub fn positional() -> Self {
        Self {
            sentence: FieldRef::Position(0),
            field_a: FieldRef::Position(1),
            field_b: FieldRef::Position(2),
            field_c: FieldRef::Position(3),
            image: FieldRef::Position(4),
        }
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            sentence: FieldRef::name("Sentence"),
            field_a: FieldRef::name("Target"),
            field_b: FieldRef::name("Part"),
            field_c: FieldRef::name("Definition"),
            image: FieldRef::name("Picture"),
        }
    }
}
