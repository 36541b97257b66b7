//! The host application's generic preference store.
//!
//! Preferences are untyped JSON on the host side. Capturing translates each
//! value by its runtime type into a [`PreferenceValue`]; anything outside
//! the supported kinds is dropped with a warning. Restoring overwrites the
//! captured keys and leaves every other key alone.

use crate::error::{ErrorKind, Result};
use crate::snapshot::{Preference, PreferenceValue};
use async_trait::async_trait;
use exn::ResultExt;
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::instrument;

pub type Entries = Map<String, Value>;

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Every stored entry.
    async fn load(&self) -> Result<Entries>;

    /// Overwrite the given keys.
    async fn save(&self, entries: Entries) -> Result<()>;
}

/// Translate a raw value into a snapshot value, if its kind is supported.
pub fn translate(value: &Value) -> Option<PreferenceValue> {
    match value {
        Value::Bool(b) => Some(PreferenceValue::Bool(*b)),
        Value::String(s) => Some(PreferenceValue::String(s.clone())),
        Value::Number(n) => match (n.as_i64(), n.is_f64()) {
            (Some(i), _) => Some(i32::try_from(i).map_or(PreferenceValue::Long(i), PreferenceValue::Int)),
            (None, true) => n.as_f64().map(|f| PreferenceValue::Float(f as f32)),
            // Unsigned beyond i64::MAX.
            (None, false) => None,
        },
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<BTreeSet<_>>>()
            .map(PreferenceValue::StringSet),
        Value::Null | Value::Object(_) => None,
    }
}

/// Inverse of [`translate`].
pub fn untranslate(value: &PreferenceValue) -> Value {
    match value {
        PreferenceValue::Int(i) => Value::from(*i),
        PreferenceValue::Long(l) => Value::from(*l),
        PreferenceValue::Float(f) => Number::from_f64(f64::from(*f)).map_or(Value::Null, Value::Number),
        PreferenceValue::Bool(b) => Value::Bool(*b),
        PreferenceValue::String(s) => Value::String(s.clone()),
        PreferenceValue::StringSet(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
    }
}

/// Read the whole store as snapshot entries, sorted by key.
#[instrument(skip_all, fields(count))]
pub async fn capture(store: &dyn PreferenceStore) -> Result<Vec<Preference>> {
    let entries = store.load().await?;
    let mut captured = Vec::with_capacity(entries.len());
    for (key, raw) in entries {
        match translate(&raw) {
            Some(value) => captured.push(Preference { key, value }),
            None => tracing::warn!(key = %key, "dropping preference of unsupported type"),
        }
    }
    captured.sort_by(|a, b| a.key.cmp(&b.key));
    tracing::Span::current().record("count", captured.len());
    Ok(captured)
}

/// Write snapshot entries back, key by key.
#[instrument(skip_all, fields(count = preferences.len()))]
pub async fn restore(store: &dyn PreferenceStore, preferences: &[Preference]) -> Result<()> {
    let entries = preferences.iter().map(|pref| (pref.key.clone(), untranslate(&pref.value))).collect();
    store.save(entries).await
}

/// Preferences kept in a single JSON object on disk.
///
/// A missing file reads as an empty store. Saves go through a hidden
/// `.partial` sibling that is renamed into place, so an interrupted save
/// leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct JsonPreferences {
    path: PathBuf,
}
impl JsonPreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(self.path.file_name().unwrap_or_default());
        name.push(".partial");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PreferenceStore for JsonPreferences {
    async fn load(&self) -> Result<Entries> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Preferences),
        };
        serde_json::from_slice(&bytes).or_raise(|| ErrorKind::Preferences)
    }

    async fn save(&self, entries: Entries) -> Result<()> {
        let mut stored = self.load().await?;
        stored.extend(entries);
        let bytes = serde_json::to_vec_pretty(&stored).or_raise(|| ErrorKind::Preferences)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Preferences)?;
        }
        let partial = self.partial_path();
        if let Err(e) = tokio::fs::write(&partial, bytes).await {
            _ = tokio::fs::remove_file(&partial).await;
            return Err(e).or_raise(|| ErrorKind::Preferences);
        }
        if let Err(e) = tokio::fs::rename(&partial, &self.path).await {
            _ = tokio::fs::remove_file(&partial).await;
            return Err(e).or_raise(|| ErrorKind::Preferences);
        }
        Ok(())
    }
}

/// Preferences held in memory, for hosts without persistent settings.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    entries: Mutex<Entries>,
}
impl MemoryPreferences {
    pub fn new(entries: Entries) -> Self {
        Self { entries: Mutex::new(entries) }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn load(&self) -> Result<Entries> {
        Ok(self.entries.lock().await.clone())
    }

    async fn save(&self, entries: Entries) -> Result<()> {
        self.entries.lock().await.extend(entries);
        Ok(())
    }
}
