use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::FieldRef;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Field {
    pub value: String,
    pub order: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: u64,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub fields: HashMap<String, Field>,
}

impl Note {
    /// Builds a note whose field order follows the order of `fields`.
    pub fn new(note_id: u64, model_name: &str, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .enumerate()
            .map(|(order, (name, value))| {
                (name.to_string(), Field { value: value.to_string(), order: order as u32 })
            })
            .collect();

        Self { note_id, model_name: model_name.to_string(), tags: Vec::new(), fields }
    }

    /// Field values in note type order.
    pub fn values(&self) -> Vec<&str> {
        let mut fields: Vec<&Field> = self.fields.values().collect();
        fields.sort_by_key(|field| field.order);
        fields.into_iter().map(|field| field.value.as_str()).collect()
    }

    pub fn field(&self, field: &FieldRef) -> Option<&str> {
        match field {
            FieldRef::Name(name) => self.fields.get(name).map(|f| f.value.as_str()),
            FieldRef::Position(index) => self.values().get(*index).copied(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: u64,
    pub note: u64,
    #[serde(default)]
    pub deck_name: String,
}
