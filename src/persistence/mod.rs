use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::info;

use crate::{
    anki::{
        api::DEFAULT_URL,
        DEFAULT_DECK,
    },
    core::{
        FieldMapping,
        GrabError,
    },
    extract::{
        ExtractOptions,
        OutputFormat,
    },
};

const APP_NAME: &str = "ankigrab";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub anki_connect_url: String,
    pub deck: String,
    pub field_mapping: FieldMapping,
    pub format: OutputFormat,
    /// Read this `collection.anki2` directly instead of asking AnkiConnect
    pub collection_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anki_connect_url: DEFAULT_URL.to_string(),
            deck: DEFAULT_DECK.to_string(),
            field_mapping: FieldMapping::default(),
            format: OutputFormat::default(),
            collection_path: None,
        }
    }
}

impl Config {
    /// Defaults when no config file exists; a file that fails to parse is an error.
    pub fn load() -> Result<Self, GrabError> {
        Self::load_from(&get_data_file_path(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, GrabError> {
        load_json_at(path)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions { deck: self.deck.clone(), fields: self.field_mapping.clone() }
    }
}

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join(APP_NAME)
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<PathBuf, GrabError> {
    let file_path = get_data_file_path(filename);
    save_json_at(data, &file_path)?;
    Ok(file_path)
}

pub fn save_json_at<T: Serialize>(data: &T, file_path: &Path) -> Result<(), GrabError> {
    let json = serde_json::to_string_pretty(data)?;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, json)?;
    info!("Data saved to: {}", file_path.display());
    Ok(())
}

/// Missing files load as `T::default()`.
pub fn load_json_at<T: for<'de> Deserialize<'de> + Default>(
    file_path: &Path,
) -> Result<T, GrabError> {
    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(file_path)?;
    let data: T = serde_json::from_str(&json)?;
    info!("Data loaded from: {}", file_path.display());
    Ok(data)
}

pub fn data_file_exists(filename: &str) -> bool {
    get_data_file_path(filename).exists()
}
