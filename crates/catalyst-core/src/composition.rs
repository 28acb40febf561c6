//! Composition: validated element → fraction mapping, and the validator
//! that is the only way to build one.
//!
//! Candidate mappings recovered from model text arrive as [`RawMapping`]
//! (any literal value per key). [`validate`] applies the acceptance checks
//! in a fixed order and either returns a [`Composition`] or a
//! [`Rejection`] naming the first failed check.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Maximum allowed distance between the fraction sum and 1.0
pub const SUM_TOLERANCE: f64 = 0.01;

/// A literal value as it appeared in a candidate mapping
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
    List(Vec<RawValue>),
    Map(RawMapping),
}

impl RawValue {
    fn type_name(&self) -> &'static str {
        match self {
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "string",
            RawValue::Bool(_) => "bool",
            RawValue::Null => "none",
            RawValue::List(_) => "list",
            RawValue::Map(_) => "dict",
        }
    }
}

/// Key/value pairs of a parsed dictionary literal, in source order.
///
/// Re-inserting an existing key replaces its value in place, so the last
/// occurrence wins while the first position is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMapping {
    entries: Vec<(String, RawValue)>,
}

impl RawMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawMapping {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        let mut mapping = RawMapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// Why a candidate mapping is not a valid composition
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("non-numeric fraction for {element}: {found}")]
    NonNumeric { element: String, found: String },

    #[error("invalid fraction for {element}: {fraction}")]
    OutOfRange { element: String, fraction: f64 },

    #[error("fractions do not sum to 1 (total {total})")]
    BadSum { total: f64 },
}

/// A validated composition: every fraction lies in [0, 1] and the
/// fractions sum to 1.0 within [`SUM_TOLERANCE`].
///
/// Two compositions are equal iff they have the same elements with
/// exactly the same fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct Composition {
    fractions: BTreeMap<String, f64>,
}

impl Composition {
    /// Fraction of one element, if present
    pub fn get(&self, element: &str) -> Option<f64> {
        self.fractions.get(element).copied()
    }

    /// Element symbols in sorted order
    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.fractions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fractions.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// Always false for a validated composition; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.fractions.values().sum()
    }

    /// Render as an indexed assignment line, e.g. `composition_1 = {"Ni": 0.6}`
    pub fn to_assignment(&self, index: usize) -> String {
        format!("composition_{} = {}", index, self)
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (element, fraction)) in self.fractions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_key(f, element)?;
            write!(f, ": {:?}", fraction)?;
        }
        write!(f, "}}")
    }
}

/// Double-quoted key with the escapes the literal reader decodes
fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in key.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl TryFrom<BTreeMap<String, f64>> for Composition {
    type Error = Rejection;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let raw: RawMapping = map
            .into_iter()
            .map(|(k, v)| (k, RawValue::Number(v)))
            .collect();
        validate(&raw)
    }
}

impl From<Composition> for BTreeMap<String, f64> {
    fn from(c: Composition) -> Self {
        c.fractions
    }
}

/// Validate a candidate mapping.
///
/// Checks run in order and stop at the first failure:
/// 1. every value is a number
/// 2. every value lies in `[0, 1]`
/// 3. the values sum to 1.0 within [`SUM_TOLERANCE`]
///
/// An empty mapping fails the sum check.
pub fn validate(mapping: &RawMapping) -> Result<Composition, Rejection> {
    let mut fractions = BTreeMap::new();
    for (element, value) in mapping.iter() {
        match value {
            RawValue::Number(n) => {
                fractions.insert(element.to_string(), *n);
            }
            other => {
                return Err(Rejection::NonNumeric {
                    element: element.to_string(),
                    found: other.type_name().to_string(),
                })
            }
        }
    }

    for (element, fraction) in &fractions {
        if !(0.0..=1.0).contains(fraction) {
            return Err(Rejection::OutOfRange {
                element: element.clone(),
                fraction: *fraction,
            });
        }
    }

    let total: f64 = fractions.values().sum();
    if (total - 1.0).abs() > SUM_TOLERANCE {
        return Err(Rejection::BadSum { total });
    }

    Ok(Composition { fractions })
}
