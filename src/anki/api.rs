use std::{
    thread::sleep,
    time::Duration,
};

use reqwest::blocking::Client;
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
    warn,
};

use super::{
    types::{
        Card,
        Note,
    },
    CollectionStore,
};
use crate::core::GrabError;

pub const DEFAULT_URL: &str = "http://localhost:8765/";
const API_VERSION: u32 = 6;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, GrabError> {
        if let Some(error) = self.error {
            return Err(GrabError::AnkiConnect(error));
        }
        self.result
            .ok_or_else(|| GrabError::AnkiConnect("response carried no result".to_string()))
    }
}

/// `cardsInfo` and `notesInfo` answer an unknown id with an empty object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Lookup<T> {
    Found(T),
    Missing {},
}

impl<T> Lookup<T> {
    fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing {} => None,
        }
    }
}

/// Blocking client for the AnkiConnect add-on.
pub struct AnkiConnect {
    client: Client,
    url: String,
}

impl AnkiConnect {
    pub fn new(url: &str) -> Result<Self, GrabError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| GrabError::Custom(format!("HTTP client build failed: {e}")))?;
        Ok(Self { client, url: url.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T, GrabError> {
        let body = request_body(action, params);

        debug!(action, url = %self.url, "AnkiConnect request");
        let response: ApiResponse<T> =
            self.client.post(&self.url).json(&body).send()?.error_for_status()?.json()?;

        response.into_result()
    }

    pub fn version(&self) -> Result<u32, GrabError> {
        self.request("version", None)
    }

    /// Polls `version` until AnkiConnect answers. Returns false if it never did.
    pub fn wait_awake(&self, wait_time: Duration, max_attempts: u32) -> bool {
        for attempt in 1..=max_attempts {
            match self.version() {
                Ok(version) => {
                    info!(version, "AnkiConnect is online");
                    return true;
                }
                Err(err) => {
                    warn!(
                        "AnkiConnect attempt {} of {} failed. Retrying in {:?}... Error: {}",
                        attempt, max_attempts, wait_time, err
                    );
                    if attempt < max_attempts {
                        sleep(wait_time);
                    }
                }
            }
        }
        false
    }
}

impl CollectionStore for AnkiConnect {
    fn find_cards(&self, query: &str) -> Result<Vec<u64>, GrabError> {
        let params = serde_json::json!({ "query": query });
        self.request("findCards", Some(params))
    }

    fn get_card(&self, card_id: u64) -> Result<Card, GrabError> {
        self.get_cards(&[card_id])?.pop().ok_or(GrabError::CardNotFound(card_id))
    }

    fn get_note(&self, note_id: u64) -> Result<Note, GrabError> {
        self.get_notes(&[note_id])?.pop().ok_or(GrabError::NoteNotFound(note_id))
    }

    fn get_cards(&self, card_ids: &[u64]) -> Result<Vec<Card>, GrabError> {
        let params = serde_json::json!({ "cards": card_ids });
        let cards: Vec<Lookup<Card>> = self.request("cardsInfo", Some(params))?;
        resolve_lookups(card_ids, cards, GrabError::CardNotFound)
    }

    fn get_notes(&self, note_ids: &[u64]) -> Result<Vec<Note>, GrabError> {
        let params = serde_json::json!({ "notes": note_ids });
        let notes: Vec<Lookup<Note>> = self.request("notesInfo", Some(params))?;
        resolve_lookups(note_ids, notes, GrabError::NoteNotFound)
    }
}

fn request_body(action: &str, params: Option<serde_json::Value>) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
    body.insert("version".to_string(), serde_json::Value::Number(API_VERSION.into()));

    if let Some(params) = params {
        body.insert("params".to_string(), params);
    }

    serde_json::Value::Object(body)
}

/// Pairs each requested id with its answer; the first missing entry fails the batch.
fn resolve_lookups<T>(
    ids: &[u64],
    entries: Vec<Lookup<T>>,
    not_found: fn(u64) -> GrabError,
) -> Result<Vec<T>, GrabError> {
    if entries.len() != ids.len() {
        return Err(GrabError::AnkiConnect(format!(
            "asked for {} entries, got {}",
            ids.len(),
            entries.len()
        )));
    }

    ids.iter().zip(entries).map(|(&id, entry)| entry.found().ok_or_else(|| not_found(id))).collect()
}
