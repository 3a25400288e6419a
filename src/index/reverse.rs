//! Reverse Index
//!
//! Matching key → model id, derived from a [`ModelIndex`]. Never maintained
//! on its own.

use std::collections::HashMap;

use tracing::warn;

use super::ModelIndex;

/// Two model ids sharing one matching key. The later id won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub replaced: String,
    pub winner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyIndex {
    model_ids: HashMap<String, String>,
    collisions: Vec<KeyCollision>,
}

impl KeyIndex {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.model_ids.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.model_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model_ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.model_ids.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys claimed by more than one model id, in the order they were hit
    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }
}

/// Invert the model index. Collisions resolve last-write-wins in the
/// index's insertion order.
pub fn invert(index: &ModelIndex) -> KeyIndex {
    let mut inverted = KeyIndex::default();

    for (model_id, key) in index.iter() {
        if let Some(replaced) = inverted.model_ids.insert(key.to_string(), model_id.to_string()) {
            warn!(
                "Matching key {:?} is shared by model elements {} and {}; keeping {}",
                key, replaced, model_id, model_id
            );
            inverted.collisions.push(KeyCollision {
                key: key.to_string(),
                replaced,
                winner: model_id.to_string(),
            });
        }
    }

    inverted
}
