use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// What the API calls a canonical station, once known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameMapping {
    /// The external name that returned journeys.
    Resolved(String),
    /// Every variant was tried and none returned journeys.
    NotFound,
}

/// Canonical station name → [`NameMapping`], kept for the process lifetime.
///
/// Entries are only ever added. A station that already has an entry keeps
/// it, whatever a later probe finds.
///
/// Seed files are plain JSON objects; `null` marks a known miss:
/// ```json
/// {
///   "Oslo S": "Oslo S",
///   "Nationaltheatret": "Nationaltheatret stasjon",
///   "Dal": null
/// }
/// ```
#[derive(Debug, Default)]
pub struct NameCache {
    entries: Mutex<HashMap<String, NameMapping>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: impl IntoIterator<Item = (String, Option<String>)>) -> Self {
        let entries = seeds
            .into_iter()
            .map(|(station, external)| {
                let mapping = external.map_or(NameMapping::NotFound, NameMapping::Resolved);
                (station, mapping)
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Loads seeds from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading name seed file {}", path.display()))?;
        let seeds: HashMap<String, Option<String>> = serde_json::from_str(&content)
            .with_context(|| format!("parsing name seed file {}", path.display()))?;
        Ok(Self::from_seeds(seeds))
    }

    /// Writes the current entries in seed-file format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)
            .with_context(|| format!("writing name seed file {}", path.display()))
    }

    pub fn get(&self, station: &str) -> Option<NameMapping> {
        self.lock().get(station).cloned()
    }

    /// Stores `mapping` unless `station` already has an entry, and returns
    /// whichever mapping is now cached.
    pub fn insert_if_absent(&self, station: &str, mapping: NameMapping) -> NameMapping {
        self.lock()
            .entry(station.to_string())
            .or_insert(mapping)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the entries, `None` for misses.
    pub fn snapshot(&self) -> BTreeMap<String, Option<String>> {
        self.lock()
            .iter()
            .map(|(station, mapping)| {
                let external = match mapping {
                    NameMapping::Resolved(name) => Some(name.clone()),
                    NameMapping::NotFound => None,
                };
                (station.clone(), external)
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, NameMapping>> {
        // Entries are inserted whole, so a panic elsewhere cannot leave the
        // map half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
