//! Persisted sheet state and snapshot stores
//!
//! A snapshot is a JSON object `{cells, sheets, activeSheetId}`. Loading is
//! forgiving: cells with unusable keys or shapes are dropped with a warning and
//! every missing field takes its default.

use crate::error::PersistError;
use cellgraph_core::{CellAddress, CellValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Format object of a cell nobody has styled
///
/// Formats are carried through untouched; only the defaults are known here.
pub fn default_format() -> Map<String, Value> {
    let value = serde_json::json!({
        "bold": false,
        "italic": false,
        "underline": false,
        "textColor": "#000000",
        "backgroundColor": "#ffffff",
        "fontSize": 13,
        "fontFamily": "arial",
        "alignment": "left",
        "numberFormat": "general",
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Overlay the keys of `patch` onto `format`
pub fn merge_format(format: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        format.insert(key.clone(), value.clone());
    }
}

/// One persisted cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedCell {
    pub value: CellValue,
    pub formula: Option<String>,
    pub display: String,
    pub format: Map<String, Value>,
}

impl Default for PersistedCell {
    fn default() -> Self {
        Self {
            value: CellValue::Empty,
            formula: None,
            display: String::new(),
            format: default_format(),
        }
    }
}

/// A sheet tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

impl SheetInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, active: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active,
        }
    }
}

/// Sheet1..Sheet3 with the first one active
pub fn default_sheets() -> Vec<SheetInfo> {
    vec![
        SheetInfo::new("1", "Sheet1", true),
        SheetInfo::new("2", "Sheet2", false),
        SheetInfo::new("3", "Sheet3", false),
    ]
}

/// Everything stored for one sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Value")]
pub struct PersistedState {
    pub cells: BTreeMap<CellAddress, PersistedCell>,
    pub sheets: Vec<SheetInfo>,
    pub active_sheet_id: String,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            cells: BTreeMap::new(),
            sheets: default_sheets(),
            active_sheet_id: "1".to_string(),
        }
    }
}

impl PersistedState {
    /// Parse a snapshot leniently
    ///
    /// Only malformed JSON or a non-object top level is an error.
    ///
    /// # Example
    /// ```rust
    /// use cellgraph::PersistedState;
    ///
    /// let state = PersistedState::from_json(
    ///     r#"{"cells": {"A1": {"value": 5, "display": "5"}, "bogus": {}, "B1": 7}}"#,
    /// ).unwrap();
    /// assert_eq!(state.cells.len(), 1);
    /// assert_eq!(state.active_sheet_id, "1");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, PersistError> {
        let Value::Object(mut root) = value else {
            return Err(PersistError::Json(serde::de::Error::custom(
                "sheet state must be a JSON object",
            )));
        };

        let mut state = PersistedState::default();

        match root.remove("cells") {
            Some(Value::Object(cells)) => {
                for (key, cell) in cells {
                    if let Some((address, cell)) = parse_cell(&key, cell) {
                        state.cells.insert(address, cell);
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => log::warn!("Ignoring non-object 'cells' field: {}", other),
        }

        match root.remove("sheets") {
            Some(Value::Null) | None => {}
            Some(sheets) => match serde_json::from_value::<Vec<SheetInfo>>(sheets) {
                Ok(sheets) => state.sheets = sheets,
                Err(e) => log::warn!("Ignoring malformed 'sheets' field: {}", e),
            },
        }

        match root.remove("activeSheetId") {
            Some(Value::String(id)) if !id.is_empty() => state.active_sheet_id = id,
            Some(Value::Null) | None => {}
            Some(other) => log::warn!("Ignoring malformed 'activeSheetId' field: {}", other),
        }

        Ok(state)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl TryFrom<Value> for PersistedState {
    type Error = PersistError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn parse_cell(key: &str, value: Value) -> Option<(CellAddress, PersistedCell)> {
    let address = match CellAddress::parse(key) {
        Ok(address) => address,
        Err(e) => {
            log::warn!("Dropping persisted cell '{}': {}", key, e);
            return None;
        }
    };

    let Value::Object(mut fields) = value else {
        log::warn!("Dropping persisted cell {}: not an object", key);
        return None;
    };

    // Partial formats are merged over the defaults
    let format_patch = match fields.remove("format") {
        Some(Value::Object(format)) => format,
        _ => Map::new(),
    };

    let mut cell: PersistedCell = match serde_json::from_value(Value::Object(fields)) {
        Ok(cell) => cell,
        Err(e) => {
            log::warn!("Dropping persisted cell {}: {}", key, e);
            return None;
        }
    };
    merge_format(&mut cell.format, &format_patch);

    Some((address, cell))
}

/// Somewhere snapshots can be kept
pub trait SnapshotStore: Send + Sync {
    /// Read the payload stored under `key`, if any
    fn load(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Store `payload` under `key`, replacing what was there
    fn save(&self, key: &str, payload: &str) -> Result<(), PersistError>;
}

/// In-process snapshot store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PersistError::storage("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, payload: &str) -> Result<(), PersistError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PersistError::storage("memory store lock poisoned"))?;
        entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the snapshots
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a key is stored in
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, payload: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;

        // Write then rename so readers never see a partial file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
