use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RosterError {
    #[error("Roster entry {0} has an empty athlete name")]
    EmptyName(usize),
    #[error("Athlete `{0}` appears more than once in the roster")]
    DuplicateName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub image: String,
}

/// Athletes the classification service knows about, in gallery order.
#[derive(Debug, Clone, Default)]
pub struct SupportedRoster {
    entries: Vec<RosterEntry>,
}

impl SupportedRoster {
    pub fn new(entries: Vec<RosterEntry>) -> Result<Self, RosterError> {
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(RosterError::EmptyName(index));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(RosterError::DuplicateName(entry.name.clone()));
            }
        }

        tracing::info!("Loaded roster with {} athletes", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn image_for(&self, athlete: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == athlete)
            .map(|entry| entry.image.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
