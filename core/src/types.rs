//! Core types for LANDREG
//!
//! Defines the property record, its persisted encoding, and the typed
//! selector used for rich queries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RegistryError;
use crate::traits::RegistryResult;

/// A registered property.
///
/// Persisted as a JSON object whose field names are fixed
/// (`proptype`, `propcity`, `propstate`, `propsqft`, `propowner`). Every
/// field is a string, including the area.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(rename = "proptype")]
    pub prop_type: String,
    #[serde(rename = "propcity")]
    pub city: String,
    #[serde(rename = "propstate")]
    pub state: String,
    #[serde(rename = "propsqft")]
    pub area: String,
    #[serde(rename = "propowner")]
    pub owner: String,
}

impl PropertyRecord {
    pub fn new(
        prop_type: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        area: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            prop_type: prop_type.into(),
            city: city.into(),
            state: state.into(),
            area: area.into(),
            owner: owner.into(),
        }
    }

    /// Same record with the owner replaced
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Encode into the canonical ledger value
    pub fn to_bytes(&self) -> RegistryResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| RegistryError::Internal(e.to_string()))
    }

    /// Decode a ledger value. All five fields must be present and string-typed.
    pub fn from_bytes(bytes: &[u8]) -> RegistryResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

impl fmt::Display for PropertyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}, {} ({} sqft) owned by {}",
            self.prop_type, self.city, self.state, self.area, self.owner
        )
    }
}

/// A record together with the key it is stored under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedRecord {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: PropertyRecord,
}

/// Narrow projection returned by owner queries: the property type only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReport {
    #[serde(rename = "proptype")]
    pub prop_type: String,
}

impl OwnerReport {
    pub fn from_bytes(bytes: &[u8]) -> RegistryResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

/// Raw key/value pair yielded by ledger cursors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl KvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Queryable record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordField {
    Type,
    City,
    State,
    Area,
    Owner,
}

impl RecordField {
    /// Name of the field in the persisted document
    pub fn column(&self) -> &'static str {
        match self {
            RecordField::Type => "proptype",
            RecordField::City => "propcity",
            RecordField::State => "propstate",
            RecordField::Area => "propsqft",
            RecordField::Owner => "propowner",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        match column {
            "proptype" => Some(RecordField::Type),
            "propcity" => Some(RecordField::City),
            "propstate" => Some(RecordField::State),
            "propsqft" => Some(RecordField::Area),
            "propowner" => Some(RecordField::Owner),
            _ => None,
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Comparison applied by a [`Selector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Exact, case-sensitive equality
    Eq,
    /// Exact, case-sensitive inequality
    Ne,
}

/// Typed predicate over a single record field.
///
/// Storage backends translate it into their own query language; the
/// registry never builds query strings itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub field: RecordField,
    pub op: Operator,
    pub value: String,
}

impl Selector {
    pub fn eq(field: RecordField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: Operator::Eq,
            value: value.into(),
        }
    }

    pub fn ne(field: RecordField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: Operator::Ne,
            value: value.into(),
        }
    }

    /// Records whose owner is exactly `owner`
    pub fn owner(owner: impl Into<String>) -> Self {
        Self::eq(RecordField::Owner, owner)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Operator::Eq => "==",
            Operator::Ne => "!=",
        };
        write!(f, "{} {} {:?}", self.field, op, self.value)
    }
}
