use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrabError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("SQLite error: {0}")]
    Sqlite(Box<rusqlite::Error>),

    #[error("AnkiConnect error: {0}")]
    AnkiConnect(String),

    #[error("Card {0} not found")]
    CardNotFound(u64),

    #[error("Note {0} not found")]
    NoteNotFound(u64),

    #[error("Note {note_id} is missing field {field}")]
    MissingField { note_id: u64, field: String },

    #[error("Unsupported search: {0}")]
    UnsupportedQuery(String),

    #[error("Malformed dump at byte {offset}: {message}")]
    Dump { offset: usize, message: String },

    #[error("GrabError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for GrabError {
    fn from(error: std::io::Error) -> Self {
        GrabError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for GrabError {
    fn from(error: reqwest::Error) -> Self {
        GrabError::Reqwest(Box::new(error))
    }
}

impl From<rusqlite::Error> for GrabError {
    fn from(error: rusqlite::Error) -> Self {
        GrabError::Sqlite(Box::new(error))
    }
}
