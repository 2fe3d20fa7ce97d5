//! Player inventory, stats and variables.
//!
//! `GameState` is plain data. Effects are the only thing that mutate it during
//! play; the interpreter snapshots it into history and save files through
//! [`StateSnapshot`].

use crate::value::{Comparator, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameState {
    inventory: HashMap<String, u32>,
    stats: HashMap<String, Value>,
    variables: HashMap<String, Value>,
}

/// Serializable copy of a [`GameState`], keyed in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSnapshot {
    pub inventory: BTreeMap<String, u32>,
    pub stats: BTreeMap<String, Value>,
    pub variables: BTreeMap<String, Value>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of an item. Adding zero is a no-op.
    pub fn add_item(&mut self, item: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let held = self.inventory.entry(item.to_string()).or_insert(0);
        *held = held.saturating_add(quantity);
    }

    /// Remove `quantity` of an item.
    ///
    /// Returns `false` and leaves the inventory unchanged if fewer than
    /// `quantity` are held. Entries that reach zero are dropped.
    pub fn remove_item(&mut self, item: &str, quantity: u32) -> bool {
        let Some(held) = self.inventory.get_mut(item) else {
            return quantity == 0;
        };
        if *held < quantity {
            return false;
        }
        *held -= quantity;
        if *held == 0 {
            self.inventory.remove(item);
        }
        true
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn has_item(&self, item: &str, min_quantity: u32) -> bool {
        self.item_count(item) >= min_quantity
    }

    pub fn set_stat(&mut self, name: &str, value: Value) {
        self.stats.insert(name.to_string(), value);
    }

    /// Add `delta` to a stat, creating it at `delta` if absent.
    ///
    /// Returns `false` when the stat or the delta is not numeric.
    pub fn increment_stat(&mut self, name: &str, delta: &Value) -> bool {
        let next = match self.stats.get(name) {
            Some(current) => current.checked_add(delta),
            None if delta.is_text() => None,
            None => Some(delta.clone()),
        };
        match next {
            Some(value) => {
                self.stats.insert(name.to_string(), value);
                true
            },
            None => false,
        }
    }

    pub fn stat(&self, name: &str) -> Option<&Value> {
        self.stats.get(name)
    }

    /// `stat <cmp> value`; an absent stat satisfies nothing.
    pub fn check_stat(&self, name: &str, comparator: Comparator, value: &Value) -> bool {
        self.stat(name).is_some_and(|stat| comparator.evaluate(stat, value))
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Variable value, or `default` when unset.
    pub fn var_or(&self, name: &str, default: Value) -> Value {
        self.var(name).cloned().unwrap_or(default)
    }

    /// `var <cmp> value`; an absent variable satisfies nothing.
    pub fn check_var(&self, name: &str, comparator: Comparator, value: &Value) -> bool {
        self.var(name).is_some_and(|var| comparator.evaluate(var, value))
    }

    pub fn inventory(&self) -> impl Iterator<Item = (&str, u32)> {
        self.inventory.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            inventory: self.inventory.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            stats: self.stats.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            variables: self.variables.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// Rebuild state from a snapshot. Zero-quantity entries are dropped.
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        Self {
            inventory: snapshot
                .inventory
                .iter()
                .filter(|(_, qty)| **qty > 0)
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            stats: snapshot.stats.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            variables: snapshot.variables.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    pub fn restore(&mut self, snapshot: &StateSnapshot) {
        *self = Self::from_snapshot(snapshot);
    }
}

impl From<&StateSnapshot> for GameState {
    fn from(snapshot: &StateSnapshot) -> Self {
        GameState::from_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_add_and_remove() {
        let mut state = GameState::new();
        state.add_item("Potion", 1);
        state.add_item("Potion", 1);
        assert_eq!(state.item_count("Potion"), 2);
        assert!(!state.remove_item("Potion", 3));
        assert_eq!(state.item_count("Potion"), 2);
        assert!(state.remove_item("Potion", 2));
        assert!(state.snapshot().inventory.is_empty());
        assert!(!state.remove_item("Potion", 1));
    }

    #[test]
    fn increment_creates_missing_stat() {
        let mut state = GameState::new();
        assert!(state.increment_stat("gold", &Value::Int(50)));
        assert!(state.increment_stat("gold", &Value::Int(-20)));
        assert_eq!(state.stat("gold"), Some(&Value::Int(30)));
        state.set_stat("mood", Value::from("grim"));
        assert!(!state.increment_stat("mood", &Value::Int(1)));
        assert_eq!(state.stat("mood"), Some(&Value::from("grim")));
    }

    #[test]
    fn missing_stat_meets_no_comparator() {
        let state = GameState::new();
        for cmp in [Comparator::Eq, Comparator::Ne, Comparator::Lt, Comparator::Ge] {
            assert!(!state.check_stat("gold", cmp, &Value::Int(0)));
            assert!(!state.check_var("door", cmp, &Value::Int(0)));
        }
    }

    #[test]
    fn variables_with_default() {
        let mut state = GameState::new();
        assert_eq!(state.var_or("door", Value::from("closed")), Value::from("closed"));
        state.set_var("door", Value::from("open"));
        assert_eq!(state.var_or("door", Value::from("closed")), Value::from("open"));
        assert!(state.check_var("door", Comparator::Eq, &Value::from("open")));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut state = GameState::new();
        state.add_item("Key", 1);
        state.set_stat("health", Value::Int(100));
        state.set_stat("speed", Value::Float(1.5));
        state.set_var("met_guide", Value::from("yes"));
        let snapshot = state.snapshot();
        assert_eq!(GameState::from_snapshot(&snapshot), state);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: StateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(GameState::from(&back), state);
    }

    #[test]
    fn snapshots_are_independent_copies() {
        let mut state = GameState::new();
        state.add_item("Key", 1);
        let before = state.snapshot();
        state.add_item("Key", 1);
        assert_eq!(before.inventory["Key"], 1);
        state.restore(&before);
        assert_eq!(state.item_count("Key"), 1);
    }
}
