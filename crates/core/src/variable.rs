// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process variables shared by every exec path of a case.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Type tag for a process variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Boolean,
    Integer,
    Long,
    Text,
    Object,
    ListOfBoolean,
    ListOfInteger,
    ListOfLong,
    ListOfText,
    ListOfObject,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariableType::Boolean => "boolean",
            VariableType::Integer => "integer",
            VariableType::Long => "long",
            VariableType::Text => "text",
            VariableType::Object => "object",
            VariableType::ListOfBoolean => "list_of_boolean",
            VariableType::ListOfInteger => "list_of_integer",
            VariableType::ListOfLong => "list_of_long",
            VariableType::ListOfText => "list_of_text",
            VariableType::ListOfObject => "list_of_object",
        };
        write!(f, "{}", s)
    }
}

/// A typed variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum VariableValue {
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Text(String),
    Object(serde_json::Value),
    ListOfBoolean(Vec<bool>),
    ListOfInteger(Vec<i32>),
    ListOfLong(Vec<i64>),
    ListOfText(Vec<String>),
    ListOfObject(Vec<serde_json::Value>),
}

impl VariableValue {
    /// The type tag of this value.
    pub fn kind(&self) -> VariableType {
        match self {
            VariableValue::Boolean(_) => VariableType::Boolean,
            VariableValue::Integer(_) => VariableType::Integer,
            VariableValue::Long(_) => VariableType::Long,
            VariableValue::Text(_) => VariableType::Text,
            VariableValue::Object(_) => VariableType::Object,
            VariableValue::ListOfBoolean(_) => VariableType::ListOfBoolean,
            VariableValue::ListOfInteger(_) => VariableType::ListOfInteger,
            VariableValue::ListOfLong(_) => VariableType::ListOfLong,
            VariableValue::ListOfText(_) => VariableType::ListOfText,
            VariableValue::ListOfObject(_) => VariableType::ListOfObject,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            VariableValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            VariableValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            VariableValue::Long(n) => Some(*n),
            VariableValue::Integer(n) => Some(i64::from(*n)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VariableValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&serde_json::Value> {
        match self {
            VariableValue::Object(v) => Some(v),
            _ => None,
        }
    }
}

/// A named variable with its initial or overlaid value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub value: VariableValue,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, value: VariableValue) -> Self {
        Self { name: name.into(), value }
    }
}

/// Live, shared variable map of a case.
///
/// Cloning is cheap (shared handle). Writes are atomic per variable; there
/// is no cross-variable consistency guarantee, so user code must not rely
/// on compound-atomic updates.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    map: Arc<DashMap<String, VariableValue>>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from declarations (first write wins on duplicate names).
    pub fn from_decls(decls: &[VariableDecl]) -> Self {
        let vars = Self::new();
        for decl in decls {
            vars.map.entry(decl.name.clone()).or_insert_with(|| decl.value.clone());
        }
        vars
    }

    /// Build from a persisted snapshot.
    pub fn from_snapshot(snapshot: BTreeMap<String, VariableValue>) -> Self {
        let vars = Self::new();
        for (name, value) in snapshot {
            vars.map.insert(name, value);
        }
        vars
    }

    /// Read a variable by name.
    pub fn get(&self, name: &str) -> Option<VariableValue> {
        self.map.get(name).map(|v| v.clone())
    }

    /// Write a variable. Upserts; variables are never deleted.
    pub fn set(&self, name: impl Into<String>, value: VariableValue) {
        self.map.insert(name.into(), value);
    }

    /// Upsert every declaration in order.
    pub fn overlay(&self, decls: &[VariableDecl]) {
        for decl in decls {
            self.map.insert(decl.name.clone(), decl.value.clone());
        }
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_boolean())
    }

    pub fn get_integer(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(|v| v.as_integer())
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_long())
    }

    pub fn get_text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| match v {
            VariableValue::Text(s) => Some(s),
            _ => None,
        })
    }

    pub fn get_object(&self, name: &str) -> Option<serde_json::Value> {
        self.get(name).and_then(|v| match v {
            VariableValue::Object(o) => Some(o),
            _ => None,
        })
    }

    /// Point-in-time copy, sorted by name for stable persistence.
    pub fn snapshot(&self) -> BTreeMap<String, VariableValue> {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
#[path = "variable_tests.rs"]
mod tests;
