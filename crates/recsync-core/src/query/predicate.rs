//! Boolean predicates over record fields.

use serde::{Deserialize, Serialize};

use crate::record::{FieldValue, Record};

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
}

impl Comparison {
    /// Apply the operator to a field value and an operand.
    ///
    /// `Equals` against a list field tests membership.
    pub fn evaluate(self, field: &FieldValue, operand: &FieldValue) -> bool {
        use std::cmp::Ordering::*;

        match self {
            Comparison::Equals => equals(field, operand),
            Comparison::NotEquals => !equals(field, operand),
            Comparison::LessThan => field.compare(operand) == Some(Less),
            Comparison::LessThanOrEquals => matches!(field.compare(operand), Some(Less | Equal)),
            Comparison::GreaterThan => field.compare(operand) == Some(Greater),
            Comparison::GreaterThanOrEquals => {
                matches!(field.compare(operand), Some(Greater | Equal))
            }
        }
    }
}

fn equals(field: &FieldValue, operand: &FieldValue) -> bool {
    match (field, operand) {
        (FieldValue::List(items), other) if !matches!(other, FieldValue::List(_)) => {
            items.iter().any(|item| item.equivalent(other))
        }
        _ => field.equivalent(operand),
    }
}

/// A boolean expression selecting records.
///
/// Comparisons against a field the record does not have never match,
/// whatever the operator; wrap in [`Predicate::not`] to select records
/// lacking a value.
///
/// # Example
///
/// ```
/// use recsync_core::Predicate;
///
/// let p = Predicate::eq("status", "open").and(Predicate::gt("votes", 10));
/// assert!(matches!(p, Predicate::And { .. }));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Predicate {
    /// Matches every record.
    #[default]
    True,

    /// Compares one field against a constant.
    Compare {
        field: String,
        op: Comparison,
        value: FieldValue,
    },

    /// Matches when every sub-predicate matches.
    And { predicates: Vec<Predicate> },

    /// Matches when any sub-predicate matches.
    Or { predicates: Vec<Predicate> },

    /// Inverts a predicate.
    Not { predicate: Box<Predicate> },
}

impl Predicate {
    /// The predicate matching every record.
    pub fn all() -> Self {
        Predicate::True
    }

    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<FieldValue>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Equals, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::NotEquals, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::LessThan, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::LessThanOrEquals, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::GreaterThan, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::GreaterThanOrEquals, value)
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::True, p) | (p, Predicate::True) => p,
            (Predicate::And { mut predicates }, Predicate::And { predicates: rest }) => {
                predicates.extend(rest);
                Predicate::And { predicates }
            }
            (Predicate::And { mut predicates }, p) => {
                predicates.push(p);
                Predicate::And { predicates }
            }
            (p, q) => Predicate::And {
                predicates: vec![p, q],
            },
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Or { mut predicates }, Predicate::Or { predicates: rest }) => {
                predicates.extend(rest);
                Predicate::Or { predicates }
            }
            (Predicate::Or { mut predicates }, p) => {
                predicates.push(p);
                Predicate::Or { predicates }
            }
            (p, q) => Predicate::Or {
                predicates: vec![p, q],
            },
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not {
            predicate: Box::new(self),
        }
    }

    /// Evaluate the predicate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Compare { field, op, value } => record
                .lookup(field)
                .is_some_and(|current| op.evaluate(&current, value)),
            Predicate::And { predicates } => predicates.iter().all(|p| p.matches(record)),
            Predicate::Or { predicates } => predicates.iter().any(|p| p.matches(record)),
            Predicate::Not { predicate } => !predicate.matches(record),
        }
    }
}
