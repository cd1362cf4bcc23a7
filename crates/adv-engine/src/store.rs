//! Inventory, stats, and variables for one session.
//!
//! Inventory quantities are always positive; an item whose count reaches
//! zero is removed rather than kept at zero.

use std::collections::BTreeMap;

use adv_core::{AdventureDocument, Condition, Consequence, Value};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Mutable player state that conditions read and consequences change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Item name to quantity. Never holds a quantity below 1.
    pub inventory: BTreeMap<String, i64>,
    /// Stats such as health.
    pub stats: BTreeMap<String, Value>,
    /// Free-form variables.
    pub variables: BTreeMap<String, Value>,
}

impl Store {
    /// The starting store for a document.
    ///
    /// Text inventory values count as one item and fractional ones are
    /// truncated; anything that ends up below 1 is left out.
    pub fn from_document(doc: &AdventureDocument) -> Self {
        let inventory = doc
            .inventory
            .iter()
            .filter_map(|(name, value)| {
                let qty = match value {
                    Value::Integer(n) => *n,
                    Value::Float(f) => f.trunc() as i64,
                    Value::Text(_) => 1,
                };
                (qty > 0).then(|| (name.clone(), qty))
            })
            .collect();

        Self {
            inventory,
            stats: doc.stats.clone(),
            variables: doc.variables.clone(),
        }
    }

    /// Quantity on hand, zero if absent.
    pub fn quantity(&self, name: &str) -> i64 {
        self.inventory.get(name).copied().unwrap_or(0)
    }

    /// Whether at least `qty` of `name` is on hand.
    pub fn has_item(&self, name: &str, qty: i64) -> bool {
        self.quantity(name) >= qty
    }

    /// Whether at least one `name` is on hand.
    pub fn has(&self, name: &str) -> bool {
        self.has_item(name, 1)
    }

    /// Add `qty` of an item. Does nothing for an empty name or `qty <= 0`.
    pub fn add_item(&mut self, name: &str, qty: i64) {
        if name.is_empty() || qty <= 0 {
            return;
        }
        let entry = self.inventory.entry(name.to_string()).or_insert(0);
        *entry = entry.saturating_add(qty);
    }

    /// Remove `qty` of an item. Returns `false`, changing nothing, when
    /// fewer than `qty` are on hand or `qty <= 0`.
    pub fn remove_item(&mut self, name: &str, qty: i64) -> bool {
        if qty <= 0 || !self.has_item(name, qty) {
            return false;
        }
        let left = self.quantity(name) - qty;
        if left == 0 {
            self.inventory.remove(name);
        } else {
            self.inventory.insert(name.to_string(), left);
        }
        true
    }

    /// Look up a stat.
    pub fn stat(&self, name: &str) -> Option<&Value> {
        self.stats.get(name)
    }

    /// Look up a variable.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Evaluate condition text from a choice.
    ///
    /// Text that is neither `item` nor `item:qty` is satisfied unless
    /// `strict` is set.
    pub fn evaluate_condition(&self, text: &str, strict: bool) -> bool {
        self.check(&Condition::parse(text), strict)
    }

    /// Evaluate a parsed condition.
    pub fn check(&self, condition: &Condition, strict: bool) -> bool {
        match condition {
            Condition::Has { item, qty } => self.has_item(item, *qty),
            Condition::Unrecognized(text) if strict => {
                debug!("unrecognized condition {text:?} treated as unmet");
                false
            }
            Condition::Unrecognized(text) => {
                warn!("unrecognized condition {text:?} treated as satisfied");
                true
            }
        }
    }

    /// Apply consequence text from a choice.
    pub fn apply_consequence(&mut self, text: &str) {
        self.apply(&Consequence::parse(text));
    }

    /// Apply a parsed consequence. Unrecognized ones change nothing.
    pub fn apply(&mut self, consequence: &Consequence) {
        match consequence {
            Consequence::Use { item, qty } => {
                if !self.remove_item(item, *qty) {
                    debug!("cannot use {qty} {item}: only {} on hand", self.quantity(item));
                }
            }
            Consequence::AdjustInventory { item, delta } if *delta >= 0 => {
                self.add_item(item, *delta);
            }
            Consequence::AdjustInventory { item, delta } => {
                let qty = delta.saturating_neg();
                if !self.remove_item(item, qty) {
                    debug!("cannot remove {qty} {item}: only {} on hand", self.quantity(item));
                }
            }
            Consequence::AdjustStat { name, delta } => self.adjust_stat(name, delta),
            Consequence::SetVariable { name, value } => {
                self.variables.insert(name.clone(), value.clone());
            }
            Consequence::Unrecognized(text) => debug!("ignoring consequence {text:?}"),
        }
    }

    fn adjust_stat(&mut self, name: &str, delta: &Value) {
        let current = self
            .stats
            .get(name)
            .cloned()
            .unwrap_or(Value::Integer(0));
        let updated = match (&current, delta) {
            (Value::Integer(a), Value::Integer(b)) => Value::Integer(a.saturating_add(*b)),
            (Value::Text(_), _) | (_, Value::Text(_)) => {
                warn!("stat {name} is not numeric; leaving it at {current}");
                return;
            }
            _ => match (current.as_f64(), delta.as_f64()) {
                (Some(a), Some(b)) if (a + b).is_finite() => Value::Float(a + b),
                (Some(_), Some(_)) => {
                    warn!("stat {name} would overflow; leaving it at {current}");
                    return;
                }
                _ => return,
            },
        };
        self.stats.insert(name.to_string(), updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store_with(items: &[(&str, i64)]) -> Store {
        Store {
            inventory: items.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Store::default()
        }
    }

    #[test]
    fn from_document_coerces_inventory() {
        let doc = adv_dsl::parse_document(
            "\
[GAME_NAME] T [/GAME_NAME]
[MAIN_MENU] Start [/MAIN_MENU]
[INVENTORY]
key: 1
gold: 2.7
lamp: brass
rope: 0
[/INVENTORY]
[STATS]
health: 10
[/STATS]
[STEP_1]
[NARRATIVE] x [/NARRATIVE]
",
        )
        .unwrap();
        let store = Store::from_document(&doc);
        assert_eq!(store.quantity("key"), 1);
        assert_eq!(store.quantity("gold"), 2);
        assert_eq!(store.quantity("lamp"), 1);
        assert!(!store.inventory.contains_key("rope"));
        assert_eq!(store.stat("health"), Some(&Value::Integer(10)));
    }

    #[test]
    fn add_and_remove() {
        let mut store = Store::default();
        store.add_item("torch", 2);
        store.add_item("torch", 0);
        store.add_item("", 3);
        assert_eq!(store.quantity("torch"), 2);
        assert_eq!(store.inventory.len(), 1);

        assert!(!store.remove_item("torch", 3));
        assert_eq!(store.quantity("torch"), 2);
        assert!(store.remove_item("torch", 2));
        assert!(!store.inventory.contains_key("torch"));
    }

    #[test]
    fn conditions() {
        let store = store_with(&[("key", 1), ("gold", 3)]);
        assert!(store.evaluate_condition("key", false));
        assert!(store.evaluate_condition("gold:3", false));
        assert!(!store.evaluate_condition("gold:4", false));
        assert!(!store.evaluate_condition("map", false));
    }

    #[test]
    fn unrecognized_condition_is_permissive_by_default() {
        let store = Store::default();
        assert!(store.evaluate_condition("health > 5", false));
    }

    #[test]
    fn unrecognized_condition_fails_when_strict() {
        let store = Store::default();
        assert!(!store.evaluate_condition("health > 5", true));
        // Recognized forms are unaffected by strictness.
        assert!(!store.evaluate_condition("key", true));
    }

    #[test]
    fn use_consumes_items() {
        let mut store = store_with(&[("key", 1), ("gold", 5)]);
        store.apply_consequence("USE key");
        assert!(!store.has("key"));
        store.apply_consequence("USE gold:2");
        assert_eq!(store.quantity("gold"), 3);
        // Not enough: nothing happens.
        store.apply_consequence("USE gold:9");
        assert_eq!(store.quantity("gold"), 3);
    }

    #[test]
    fn set_inventory_adds_and_removes() {
        let mut store = store_with(&[("arrow", 5)]);
        store.apply_consequence("SET inventory:arrow:3");
        assert_eq!(store.quantity("arrow"), 8);
        store.apply_consequence("SET inventory:arrow:-8");
        assert!(!store.has("arrow"));
        store.apply_consequence("SET inventory:arrow:-1");
        assert_eq!(store.quantity("arrow"), 0);
    }

    #[test]
    fn stats_and_variables() {
        let mut store = Store::default();
        store.apply_consequence("SET stats:health:-3");
        assert_eq!(store.stat("health"), Some(&Value::Integer(-3)));
        store.apply_consequence("SET stats:health:0.5");
        assert_eq!(store.stat("health"), Some(&Value::Float(-2.5)));
        store.apply_consequence("SET variables:door:open");
        assert_eq!(store.variable("door"), Some(&Value::from("open")));
    }

    #[test]
    fn float_stat_overflow_leaves_stat_unchanged() {
        let mut store = Store::default();
        store.apply_consequence("SET stats:hp:1e308");
        store.apply_consequence("SET stats:hp:1e308");
        assert_eq!(store.stat("hp"), Some(&Value::Float(1e308)));
        store.apply_consequence("SET stats:hp:-1e308");
        store.apply_consequence("SET stats:hp:-1e308");
        store.apply_consequence("SET stats:hp:-1e308");
        assert_eq!(store.stat("hp"), Some(&Value::Float(-1e308)));
    }

    #[test]
    fn unrecognized_consequence_is_a_no_op() {
        let mut store = store_with(&[("key", 1)]);
        let before = store.clone();
        store.apply_consequence("GIVE key");
        store.apply_consequence("SET mood:happy");
        assert_eq!(store, before);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize, i64),
        Remove(usize, i64),
    }

    const NAMES: [&str; 3] = ["key", "gold", "torch"];

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..NAMES.len(), -3i64..10).prop_map(|(n, q)| Op::Add(n, q)),
            (0..NAMES.len(), -3i64..10).prop_map(|(n, q)| Op::Remove(n, q)),
        ]
    }

    proptest! {
        #[test]
        fn quantities_stay_positive(ops in proptest::collection::vec(op(), 0..40)) {
            let mut store = Store::default();
            for op in ops {
                match op {
                    Op::Add(n, q) => store.add_item(NAMES[n], q),
                    Op::Remove(n, q) => {
                        let before = store.clone();
                        let ok = store.remove_item(NAMES[n], q);
                        if !ok {
                            prop_assert_eq!(&store, &before);
                        } else {
                            prop_assert_eq!(
                                store.quantity(NAMES[n]),
                                before.quantity(NAMES[n]) - q
                            );
                        }
                    }
                }
                prop_assert!(store.inventory.values().all(|&q| q > 0));
            }
        }
    }
}
