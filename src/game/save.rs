//! # Save Record
//!
//! The flat, ordered record handed to the persistence collaborator. Field
//! order is stable and shared by every representation: the comma-separated
//! line, the integer array and the JSON object.

use crate::{DraponError, DraponResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field names in record order.
pub const SAVE_FIELDS: [&str; 11] = [
    "status",
    "mode",
    "layer",
    "scroll_row",
    "scroll_col",
    "script_id",
    "script_line",
    "xp",
    "level",
    "gold",
    "max_hp",
];

/// Persisted game state as plain integers.
///
/// # Examples
///
/// ```
/// use drapon::SaveRecord;
///
/// let record = SaveRecord::from_csv("1,0,0,16,16,0,0,3,1,5,40").unwrap();
/// assert_eq!(record.gold, 5);
/// assert_eq!(record.to_csv(), "1,0,0,16,16,0,0,3,1,5,40");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub status: i64,
    pub mode: i64,
    pub layer: i64,
    pub scroll_row: i64,
    pub scroll_col: i64,
    pub script_id: i64,
    pub script_line: i64,
    pub xp: i64,
    pub level: i64,
    pub gold: i64,
    pub max_hp: i64,
}

impl SaveRecord {
    /// The record as an array in field order.
    pub fn to_fields(&self) -> [i64; 11] {
        [
            self.status,
            self.mode,
            self.layer,
            self.scroll_row,
            self.scroll_col,
            self.script_id,
            self.script_line,
            self.xp,
            self.level,
            self.gold,
            self.max_hp,
        ]
    }

    /// Builds a record from exactly eleven values in field order.
    pub fn from_fields(fields: &[i64]) -> DraponResult<Self> {
        let values: [i64; 11] = fields.try_into().map_err(|_| {
            DraponError::InvalidSaveRecord(format!(
                "expected {} fields, found {}",
                SAVE_FIELDS.len(),
                fields.len()
            ))
        })?;
        Ok(Self {
            status: values[0],
            mode: values[1],
            layer: values[2],
            scroll_row: values[3],
            scroll_col: values[4],
            script_id: values[5],
            script_line: values[6],
            xp: values[7],
            level: values[8],
            gold: values[9],
            max_hp: values[10],
        })
    }

    /// Reads one field by name.
    pub fn get(&self, name: &str) -> Option<i64> {
        let index = SAVE_FIELDS.iter().position(|field| *field == name)?;
        Some(self.to_fields()[index])
    }

    /// Writes one field by name. Returns `false` for unknown names.
    pub fn set(&mut self, name: &str, value: i64) -> bool {
        let Some(index) = SAVE_FIELDS.iter().position(|field| *field == name) else {
            return false;
        };
        let mut fields = self.to_fields();
        fields[index] = value;
        match Self::from_fields(&fields) {
            Ok(record) => {
                *self = record;
                true
            }
            Err(_) => false,
        }
    }

    /// Comma-separated line in field order.
    pub fn to_csv(&self) -> String {
        self.to_fields()
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parses a comma-separated line. Surrounding whitespace is ignored.
    pub fn from_csv(line: &str) -> DraponResult<Self> {
        let fields = line
            .trim()
            .split(',')
            .map(|part| {
                part.trim().parse::<i64>().map_err(|err| {
                    DraponError::InvalidSaveRecord(format!("bad field {:?}: {}", part, err))
                })
            })
            .collect::<DraponResult<Vec<i64>>>()?;
        Self::from_fields(&fields)
    }

    pub fn to_json(&self) -> DraponResult<String> {
        serde_json::to_string_pretty(self).map_err(DraponError::from)
    }

    pub fn from_json(json: &str) -> DraponResult<Self> {
        serde_json::from_str(json).map_err(DraponError::from)
    }

    /// Writes the comma-separated form to `path`.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> DraponResult<()> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }

    /// Reads a record previously written by [`SaveRecord::save_to_file`].
    pub fn load_from_file(path: impl AsRef<Path>) -> DraponResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_csv(&contents)
    }
}
