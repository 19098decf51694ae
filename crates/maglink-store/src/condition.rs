//! Server-evaluated write conditions

use crate::attr::{AttrValue, Item};

/// Predicate over the current state of an item.
///
/// Evaluated by the store atomically with the mutation it guards. An
/// absent item satisfies `NotExists` and fails every attribute test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The named attribute is present
    Exists(String),
    /// The named attribute is absent (also true when the item is absent)
    NotExists(String),
    /// The named attribute equals the value
    Eq(String, AttrValue),
    /// The named attribute is strictly less than the value
    Lt(String, AttrValue),
    /// All sub-conditions hold
    And(Vec<Condition>),
    /// Any sub-condition holds
    Or(Vec<Condition>),
}

impl Condition {
    /// Evaluate against the current item state (`None` when absent)
    pub fn eval(&self, item: Option<&Item>) -> bool {
        match self {
            Self::Exists(name) => item.is_some_and(|i| i.contains_key(name)),
            Self::NotExists(name) => item.map_or(true, |i| !i.contains_key(name)),
            Self::Eq(name, value) => {
                item.and_then(|i| i.get(name)).is_some_and(|v| v == value)
            }
            Self::Lt(name, value) => item
                .and_then(|i| i.get(name))
                .is_some_and(|v| attr_lt(v, value)),
            Self::And(conds) => conds.iter().all(|c| c.eval(item)),
            Self::Or(conds) => conds.iter().any(|c| c.eval(item)),
        }
    }
}

/// Ordering is defined within one type only; a comparison across types
/// evaluates false, the way a remote conditional store treats mismatched
/// operand types.
fn attr_lt(a: &AttrValue, b: &AttrValue) -> bool {
    match (a, b) {
        (AttrValue::S(x), AttrValue::S(y)) => x < y,
        (AttrValue::N(x), AttrValue::N(y)) => x < y,
        (AttrValue::B(x), AttrValue::B(y)) => x < y,
        _ => false,
    }
}
