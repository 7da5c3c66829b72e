//! Aggro (threat) tables.
//!
//! Entries are kept sorted highest first so the top threat is always the
//! first entry and snapshots can copy the slice as is.

use arbor_types::{AggroEntry, CharacterId};

/// Threat an agent holds against other characters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggroTable {
    entries: Vec<AggroEntry>,
    decay_per_second: f32,
}

impl AggroTable {
    /// Create an empty table whose entries never decay.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            decay_per_second: 0.0,
        }
    }

    /// Create an empty table that loses `per_second` aggro per entry every
    /// second of agent time.
    pub const fn with_decay(per_second: f32) -> Self {
        Self {
            entries: Vec::new(),
            decay_per_second: per_second,
        }
    }

    /// Add `amount` of aggro against `target`, creating the entry if needed.
    ///
    /// Returns the new aggro value for `target`.
    pub fn add(&mut self, target: CharacterId, amount: f32) -> f32 {
        let value = match self.entries.iter_mut().find(|e| e.character_id == target) {
            Some(entry) => {
                entry.aggro += amount;
                entry.aggro
            }
            None => {
                self.entries.push(AggroEntry {
                    character_id: target,
                    aggro: amount,
                });
                amount
            }
        };
        self.sort();
        value
    }

    /// Current aggro against `target`.
    pub fn get(&self, target: CharacterId) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.character_id == target)
            .map(|e| e.aggro)
    }

    /// Remove the entry for `target`. Returns `true` if it existed.
    pub fn remove(&mut self, target: CharacterId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.character_id != target);
        self.entries.len() != before
    }

    /// Apply decay for `delta_millis` of agent time, dropping entries that
    /// reach zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn decay(&mut self, delta_millis: i64) {
        if self.decay_per_second <= 0.0 || delta_millis <= 0 {
            return;
        }
        let amount = self.decay_per_second * (delta_millis as f32) / 1000.0;
        for entry in &mut self.entries {
            entry.aggro -= amount;
        }
        self.entries.retain(|e| e.aggro > 0.0);
    }

    /// The character with the highest aggro.
    pub fn highest(&self) -> Option<&AggroEntry> {
        self.entries.first()
    }

    /// All entries, highest first.
    pub fn entries(&self) -> &[AggroEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            b.aggro
                .total_cmp(&a.aggro)
                .then_with(|| a.character_id.cmp(&b.character_id))
        });
    }
}
