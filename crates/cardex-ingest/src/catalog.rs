//! Code-to-set lookup built by the set stage and read by the card stage

use cardex_scryfall::RemoteSet;
use rustc_hash::FxHashMap;

/// What the card stage needs to know about an included set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRef {
    pub id: String,
    pub code: String,
    pub name: String,
}

/// Included sets keyed by lowercase set code.
#[derive(Debug, Default)]
pub struct SetCatalog {
    sets: FxHashMap<String, SetRef>,
}

impl SetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: &RemoteSet) {
        self.sets.insert(
            set.code.to_ascii_lowercase(),
            SetRef {
                id: set.id.clone(),
                code: set.code.clone(),
                name: set.name.clone(),
            },
        );
    }

    pub fn get(&self, code: &str) -> Option<&SetRef> {
        // Codes are lowercase in practice; only allocate when they aren't
        if code.bytes().any(|b| b.is_ascii_uppercase()) {
            self.sets.get(&code.to_ascii_lowercase())
        } else {
            self.sets.get(code)
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
