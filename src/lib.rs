//! Pulls mined sentence cards out of an Anki collection as plain rows.
//!
//! A run finds every card in one deck, resolves its note, cleans the highlight
//! and image markup, and renders the rows as a single line of text.

pub mod anki;
pub mod core;
pub mod extract;
pub mod persistence;

pub use anki::{
    AnkiConnect,
    CollectionStore,
    MemoryCollection,
    SqliteCollection,
};
pub use crate::core::{
    FieldMapping,
    FieldRef,
    GrabError,
    ResultRow,
};
pub use extract::{
    extract_rows,
    parse_rows,
    render,
    ExtractOptions,
    OutputFormat,
};
