//! The condition and consequence vocabulary carried by choices.
//!
//! Choices keep their `IF` and `SET`/`USE` extras as text. This module turns
//! that text into typed directives; evaluating them against a player's
//! inventory is the engine's job.

use std::fmt;

use crate::value::Value;

/// A predicate gating a choice.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `<item>` or `<item>:<qty>`: at least `qty` of `item` on hand.
    Has {
        /// Inventory item name.
        item: String,
        /// Minimum quantity.
        qty: i64,
    },
    /// Text matching neither supported form.
    Unrecognized(String),
}

impl Condition {
    /// Parse condition text (the part after `IF`).
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.split_once(':') {
            None if is_name(text) => Self::Has {
                item: text.to_string(),
                qty: 1,
            },
            Some((item, qty)) => match (is_name(item.trim()), parse_count(qty)) {
                (true, Some(qty)) => Self::Has {
                    item: item.trim().to_string(),
                    qty,
                },
                _ => Self::Unrecognized(text.to_string()),
            },
            None => Self::Unrecognized(text.to_string()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Has { item, qty: 1 } => write!(f, "{item}"),
            Self::Has { item, qty } => write!(f, "{item}:{qty}"),
            Self::Unrecognized(text) => write!(f, "{text}"),
        }
    }
}

/// A mutation applied on a forward transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Consequence {
    /// `USE <item>[:<qty>]`: consume `qty` (default 1).
    Use {
        /// Inventory item name.
        item: String,
        /// Quantity to remove.
        qty: i64,
    },
    /// `SET inventory:<item>:<qty>`: add when positive, remove when negative.
    AdjustInventory {
        /// Inventory item name.
        item: String,
        /// Signed change.
        delta: i64,
    },
    /// `SET stats:<name>:<delta>`: add a numeric delta to a stat.
    AdjustStat {
        /// Stat name.
        name: String,
        /// Signed numeric change.
        delta: Value,
    },
    /// `SET variables:<name>:<value>`: assign a variable.
    SetVariable {
        /// Variable name.
        name: String,
        /// New value.
        value: Value,
    },
    /// Anything else. Applying it does nothing.
    Unrecognized(String),
}

impl Consequence {
    /// Parse a verbatim `SET`/`USE` directive.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let unrecognized = || Self::Unrecognized(text.to_string());

        let Some((keyword, rest)) = text.split_once(char::is_whitespace) else {
            return unrecognized();
        };
        let rest = rest.trim();

        match keyword {
            "USE" => {
                let (item, qty) = match rest.split_once(':') {
                    Some((item, qty)) => (item.trim(), parse_count(qty)),
                    None => (rest, Some(1)),
                };
                match qty {
                    Some(qty) if qty > 0 && is_name(item) => Self::Use {
                        item: item.to_string(),
                        qty,
                    },
                    _ => unrecognized(),
                }
            }
            "SET" => {
                let parts: Vec<&str> = rest.splitn(3, ':').map(str::trim).collect();
                let [scope, name, raw] = parts.as_slice() else {
                    return unrecognized();
                };
                if !is_name(name) || raw.is_empty() {
                    return unrecognized();
                }
                match (*scope, Value::coerce(raw)) {
                    ("inventory", Value::Integer(delta)) => Self::AdjustInventory {
                        item: name.to_string(),
                        delta,
                    },
                    ("stats", delta) if delta.is_number() => Self::AdjustStat {
                        name: name.to_string(),
                        delta,
                    },
                    ("variables", value) => Self::SetVariable {
                        name: name.to_string(),
                        value,
                    },
                    _ => unrecognized(),
                }
            }
            _ => unrecognized(),
        }
    }
}

/// Item and variable names: letters, digits, `_`, `-`, and `.`.
fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn parse_count(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(item: &str, qty: i64) -> Condition {
        Condition::Has {
            item: item.to_string(),
            qty,
        }
    }

    #[test]
    fn condition_forms() {
        assert_eq!(Condition::parse("key"), has("key", 1));
        assert_eq!(Condition::parse(" gold : 5 "), has("gold", 5));
        assert_eq!(Condition::parse("old_map"), has("old_map", 1));
    }

    #[test]
    fn condition_unrecognized() {
        for text in ["health > 5", "gold:lots", "gold:-1", "", "has key"] {
            assert!(
                matches!(Condition::parse(text), Condition::Unrecognized(_)),
                "{text:?} should be unrecognized"
            );
        }
    }

    #[test]
    fn condition_display() {
        assert_eq!(has("key", 1).to_string(), "key");
        assert_eq!(has("gold", 3).to_string(), "gold:3");
    }

    #[test]
    fn use_forms() {
        assert_eq!(
            Consequence::parse("USE key"),
            Consequence::Use {
                item: "key".to_string(),
                qty: 1
            }
        );
        assert_eq!(
            Consequence::parse("USE gold:3"),
            Consequence::Use {
                item: "gold".to_string(),
                qty: 3
            }
        );
        assert!(matches!(
            Consequence::parse("USE gold:0"),
            Consequence::Unrecognized(_)
        ));
    }

    #[test]
    fn set_forms() {
        assert_eq!(
            Consequence::parse("SET inventory:torch:2"),
            Consequence::AdjustInventory {
                item: "torch".to_string(),
                delta: 2
            }
        );
        assert_eq!(
            Consequence::parse("SET inventory:torch:-1"),
            Consequence::AdjustInventory {
                item: "torch".to_string(),
                delta: -1
            }
        );
        assert_eq!(
            Consequence::parse("SET stats:health:-10"),
            Consequence::AdjustStat {
                name: "health".to_string(),
                delta: Value::Integer(-10)
            }
        );
        assert_eq!(
            Consequence::parse("SET variables:door:open"),
            Consequence::SetVariable {
                name: "door".to_string(),
                value: Value::Text("open".to_string())
            }
        );
    }

    #[test]
    fn unrecognized_consequences() {
        for text in [
            "SET inventory:torch:many",
            "SET stats:health:low",
            "SET flags:x:1",
            "ADD torch",
            "USE",
            "SET inventory:torch",
        ] {
            assert!(
                matches!(Consequence::parse(text), Consequence::Unrecognized(_)),
                "{text:?} should be unrecognized"
            );
        }
    }
}
