use std::{
    collections::{
        HashMap,
        HashSet,
    },
    path::Path,
};

use rusqlite::{
    Connection,
    OpenFlags,
    OptionalExtension,
};
use serde::Deserialize;
use tracing::{
    debug,
    info,
};

use super::{
    search::DeckFilter,
    types::{
        Card,
        Field,
        Note,
    },
    CollectionStore,
};
use crate::core::GrabError;

const FIELD_SEPARATOR: char = '\x1f';

#[derive(Debug)]
struct NoteType {
    name: String,
    fields: Vec<String>, // Field names in `ord` order
}

/// Reads an Anki `collection.anki2` file directly.
///
/// The file is opened read-only. Anki keeps its collection locked while the
/// profile is open, so this only works with Anki closed or on a copy.
pub struct SqliteCollection {
    conn: Connection,
    decks: HashMap<i64, String>, // Full names, `::` between levels
    note_types: HashMap<i64, NoteType>,
}

impl SqliteCollection {
    pub fn open(path: &Path) -> Result<Self, GrabError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let collection = Self::from_connection(conn)?;
        info!(
            "Opened collection {} ({} decks, {} note types)",
            path.display(),
            collection.decks.len(),
            collection.note_types.len()
        );
        Ok(collection)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, GrabError> {
        let modern: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'notetypes')",
            [],
            |row| row.get(0),
        )?;

        let (decks, note_types) = if modern {
            (load_decks(&conn)?, load_note_types(&conn)?)
        } else {
            debug!("No notetypes table, reading legacy collection schema");
            load_legacy_schema(&conn)?
        };

        Ok(Self { conn, decks, note_types })
    }

    fn deck_name(&self, deck_id: i64) -> String {
        self.decks.get(&deck_id).cloned().unwrap_or_default()
    }
}

impl CollectionStore for SqliteCollection {
    fn find_cards(&self, query: &str) -> Result<Vec<u64>, GrabError> {
        let filter = DeckFilter::parse(query)?;
        let deck_ids: HashSet<i64> = self
            .decks
            .iter()
            .filter(|(_, name)| filter.matches(name))
            .map(|(&id, _)| id)
            .collect();

        if deck_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Cards moved into a filtered deck still belong to their home deck (`odid`).
        let mut stmt = self.conn.prepare("SELECT id, did, odid FROM cards ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let did: i64 = row.get(1)?;
            let odid: i64 = row.get(2)?;
            Ok((id, did, odid))
        })?;

        let mut card_ids = Vec::new();
        for row in rows {
            let (id, did, odid) = row?;
            if deck_ids.contains(&did) || (odid != 0 && deck_ids.contains(&odid)) {
                card_ids.push(id as u64);
            }
        }
        Ok(card_ids)
    }

    fn get_card(&self, card_id: u64) -> Result<Card, GrabError> {
        let row: Option<(i64, i64)> = self
            .conn
            .query_row("SELECT nid, did FROM cards WHERE id = ?1", [card_id as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let (nid, did) = row.ok_or(GrabError::CardNotFound(card_id))?;
        Ok(Card { card_id, note: nid as u64, deck_name: self.deck_name(did) })
    }

    fn get_note(&self, note_id: u64) -> Result<Note, GrabError> {
        let row: Option<(i64, String, String)> = self
            .conn
            .query_row(
                "SELECT mid, tags, flds FROM notes WHERE id = ?1",
                [note_id as i64],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let (mid, tags, flds) = row.ok_or(GrabError::NoteNotFound(note_id))?;
        let note_type = self.note_types.get(&mid);

        let fields = flds
            .split(FIELD_SEPARATOR)
            .enumerate()
            .map(|(ord, value)| {
                let name = note_type
                    .and_then(|nt| nt.fields.get(ord))
                    .cloned()
                    .unwrap_or_else(|| format!("Field {}", ord + 1));
                (name, Field { value: value.to_string(), order: ord as u32 })
            })
            .collect();

        Ok(Note {
            note_id,
            model_name: note_type.map(|nt| nt.name.clone()).unwrap_or_default(),
            tags: tags.split_whitespace().map(str::to_string).collect(),
            fields,
        })
    }
}

fn load_decks(conn: &Connection) -> Result<HashMap<i64, String>, GrabError> {
    let mut stmt = conn.prepare("SELECT id, name FROM decks")?;
    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        Ok((id, name.replace(FIELD_SEPARATOR, "::")))
    })?;

    let mut decks = HashMap::new();
    for row in rows {
        let (id, name) = row?;
        decks.insert(id, name);
    }
    Ok(decks)
}

fn load_note_types(conn: &Connection) -> Result<HashMap<i64, NoteType>, GrabError> {
    let mut note_types = HashMap::new();

    let mut stmt = conn.prepare("SELECT id, name FROM notetypes")?;
    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        Ok((id, name))
    })?;
    for row in rows {
        let (id, name) = row?;
        note_types.insert(id, NoteType { name, fields: Vec::new() });
    }

    let mut stmt = conn.prepare("SELECT ntid, name FROM fields ORDER BY ntid, ord")?;
    let rows = stmt.query_map([], |row| {
        let ntid: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        Ok((ntid, name))
    })?;
    for row in rows {
        let (ntid, name) = row?;
        if let Some(note_type) = note_types.get_mut(&ntid) {
            note_type.fields.push(name);
        }
    }

    Ok(note_types)
}

#[derive(Deserialize)]
struct LegacyDeck {
    name: String,
}

#[derive(Deserialize)]
struct LegacyModel {
    name: String,
    flds: Vec<LegacyField>,
}

#[derive(Deserialize)]
struct LegacyField {
    name: String,
    ord: u32,
}

/// Collections older than Anki 2.1.28 keep decks and note types as JSON in `col`.
fn load_legacy_schema(
    conn: &Connection,
) -> Result<(HashMap<i64, String>, HashMap<i64, NoteType>), GrabError> {
    let (decks_json, models_json): (String, String) =
        conn.query_row("SELECT decks, models FROM col", [], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let legacy_decks: HashMap<String, LegacyDeck> = serde_json::from_str(&decks_json)?;
    let legacy_models: HashMap<String, LegacyModel> = serde_json::from_str(&models_json)?;

    let decks = legacy_decks
        .into_iter()
        .filter_map(|(id, deck)| id.parse::<i64>().ok().map(|id| (id, deck.name)))
        .collect();

    let note_types = legacy_models
        .into_iter()
        .filter_map(|(id, mut model)| {
            let id = id.parse::<i64>().ok()?;
            model.flds.sort_by_key(|field| field.ord);
            let fields = model.flds.into_iter().map(|field| field.name).collect();
            Some((id, NoteType { name: model.name, fields }))
        })
        .collect();

    Ok((decks, note_types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        anki::search::deck_query,
        core::FieldRef,
    };

    const MODERN_SCHEMA: &str = "
        CREATE TABLE decks (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE notetypes (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE fields (ntid INTEGER NOT NULL, ord INTEGER NOT NULL, name TEXT NOT NULL);
        CREATE TABLE notes (id INTEGER PRIMARY KEY, mid INTEGER NOT NULL, tags TEXT NOT NULL, flds TEXT NOT NULL);
        CREATE TABLE cards (id INTEGER PRIMARY KEY, nid INTEGER NOT NULL, did INTEGER NOT NULL, odid INTEGER NOT NULL);
    ";

    fn modern_collection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MODERN_SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO decks VALUES (1, 'Default');
             INSERT INTO decks VALUES (2, 'Sentence Mining');
             INSERT INTO decks VALUES (3, 'Sentence Mining\x1fAnime');
             INSERT INTO decks VALUES (4, 'Sentence Mining Extra');
             INSERT INTO decks VALUES (5, 'Filtered');
             INSERT INTO notetypes VALUES (100, 'SME');
             INSERT INTO fields VALUES (100, 1, 'Target');
             INSERT INTO fields VALUES (100, 0, 'Sentence');
             INSERT INTO fields VALUES (100, 2, 'Part');
             INSERT INTO notes VALUES (10, 100, ' mined anime ', 'a\x1fb\x1fc');
             INSERT INTO notes VALUES (11, 100, '', 'd\x1fe\x1ff\x1fg');
             INSERT INTO cards VALUES (30, 11, 3, 0);
             INSERT INTO cards VALUES (20, 10, 2, 0);
             INSERT INTO cards VALUES (40, 10, 4, 0);
             INSERT INTO cards VALUES (50, 10, 1, 0);
             INSERT INTO cards VALUES (60, 11, 5, 2);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_modern_find_cards() {
        let collection = SqliteCollection::from_connection(modern_collection()).unwrap();

        let cards = collection.find_cards(&deck_query("Sentence Mining")).unwrap();
        assert_eq!(cards, vec![20, 30, 60]);

        let cards = collection.find_cards(&deck_query("sentence mining::anime")).unwrap();
        assert_eq!(cards, vec![30]);

        assert!(collection.find_cards(&deck_query("Missing")).unwrap().is_empty());
    }

    #[test]
    fn test_modern_lookups() {
        let collection = SqliteCollection::from_connection(modern_collection()).unwrap();

        let card = collection.get_card(30).unwrap();
        assert_eq!(card.note, 11);
        assert_eq!(card.deck_name, "Sentence Mining::Anime");

        let note = collection.get_note(10).unwrap();
        assert_eq!(note.model_name, "SME");
        assert_eq!(note.tags, vec!["mined", "anime"]);
        assert_eq!(note.field(&FieldRef::name("Sentence")), Some("a"));
        assert_eq!(note.field(&FieldRef::name("Part")), Some("c"));

        // More values than the note type declares
        let note = collection.get_note(11).unwrap();
        assert_eq!(note.values(), vec!["d", "e", "f", "g"]);
        assert_eq!(note.field(&FieldRef::name("Field 4")), Some("g"));

        assert!(matches!(collection.get_card(99), Err(GrabError::CardNotFound(99))));
        assert!(matches!(collection.get_note(99), Err(GrabError::NoteNotFound(99))));
    }

    #[test]
    fn test_legacy_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE col (id INTEGER PRIMARY KEY, models TEXT NOT NULL, decks TEXT NOT NULL);
             CREATE TABLE notes (id INTEGER PRIMARY KEY, mid INTEGER NOT NULL, tags TEXT NOT NULL, flds TEXT NOT NULL);
             CREATE TABLE cards (id INTEGER PRIMARY KEY, nid INTEGER NOT NULL, did INTEGER NOT NULL, odid INTEGER NOT NULL);
             INSERT INTO notes VALUES (10, 100, '', 'front\x1fback');
             INSERT INTO cards VALUES (20, 10, 2, 0);
             INSERT INTO cards VALUES (21, 10, 1, 0);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO col VALUES (1, ?1, ?2)",
            [
                r#"{"100": {"name": "Basic", "flds": [{"name": "Back", "ord": 1}, {"name": "Front", "ord": 0}]}}"#,
                r#"{"1": {"name": "Default"}, "2": {"name": "Sentence Mining"}}"#,
            ],
        )
        .unwrap();

        let collection = SqliteCollection::from_connection(conn).unwrap();
        assert_eq!(collection.find_cards(&deck_query("Sentence Mining")).unwrap(), vec![20]);

        let note = collection.get_note(10).unwrap();
        assert_eq!(note.model_name, "Basic");
        assert_eq!(note.field(&FieldRef::name("Front")), Some("front"));
        assert_eq!(note.field(&FieldRef::name("Back")), Some("back"));
    }

    #[test]
    fn test_open_file_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.anki2");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(MODERN_SCHEMA).unwrap();
            conn.execute_batch(
                "INSERT INTO decks VALUES (2, 'Sentence Mining');
                 INSERT INTO notes VALUES (10, 100, '', 'x');
                 INSERT INTO cards VALUES (20, 10, 2, 0);",
            )
            .unwrap();
        }

        let collection = SqliteCollection::open(&path).unwrap();
        assert_eq!(collection.find_cards(&deck_query("Sentence Mining")).unwrap(), vec![20]);
        assert!(collection.conn.execute("DELETE FROM cards", []).is_err());
    }
}
