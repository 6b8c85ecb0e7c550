use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical comparison key for a species display name: trimmed, lowercased,
/// punctuation stripped, inner whitespace runs collapsed to one underscore.
/// Empty or whitespace-only input yields an empty key.
pub fn normalize_species_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    WHITESPACE_RUN.replace_all(&stripped, "_").into_owned()
}

/// Species keys that must never be notified, loaded from a line-delimited
/// file. Lines are normalized the same way incoming names are.
pub struct IgnoreList {
    keys: HashSet<String>,
}

impl IgnoreList {
    /// Reads the ignore file if present; a missing file is created empty.
    /// Any I/O failure is logged and yields an empty list, never an error.
    pub fn load(path: &Path) -> Self {
        let mut keys = HashSet::new();

        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => {
                    for line in contents.lines() {
                        let species = line.trim();
                        if species.is_empty() || species.starts_with('#') {
                            continue;
                        }
                        let key = normalize_species_name(species);
                        if !key.is_empty() {
                            keys.insert(key);
                        }
                    }
                    info!("Loaded {} ignored species from {}", keys.len(), path.display());
                }
                Err(e) => {
                    error!("Error reading ignore file {}: {}", path.display(), e);
                }
            }
        } else {
            info!("Ignore file not found, creating {}", path.display());
            if let Err(e) = fs::File::create(path) {
                error!("Error creating ignore file {}: {}", path.display(), e);
            }
        }

        Self { keys }
    }

    #[cfg(test)]
    pub fn from_names(names: &[&str]) -> Self {
        let keys = names
            .iter()
            .map(|name| normalize_species_name(name))
            .filter(|key| !key.is_empty())
            .collect();
        Self { keys }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Per-species notification gate. A name qualifies when it has a usable
/// normalized key, is not ignored, and was last notified at least the
/// cooldown window ago. Timestamps are passed in by the caller so every
/// decision within one polling cycle shares the same clock reading.
pub struct CooldownTracker {
    ignored: IgnoreList,
    window: Duration,
    last_notified: HashMap<String, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new(ignored: IgnoreList, window: Duration) -> Self {
        Self {
            ignored,
            window,
            last_notified: HashMap::new(),
        }
    }

    /// True when `name` should be included in a notification at `now`.
    /// Does not mutate state; call `record` once the name is accepted.
    pub fn should_notify(&self, name: &str, now: DateTime<Utc>) -> bool {
        let key = normalize_species_name(name);
        if key.is_empty() || self.ignored.contains(&key) {
            return false;
        }
        match self.last_notified.get(&key) {
            Some(last) => now.signed_duration_since(*last) >= self.window,
            None => true,
        }
    }

    /// Marks `name` as notified at `now`, superseding any earlier timestamp.
    pub fn record(&mut self, name: &str, now: DateTime<Utc>) {
        let key = normalize_species_name(name);
        if !key.is_empty() {
            self.last_notified.insert(key, now);
        }
    }
}
