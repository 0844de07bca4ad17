//! Field mapping and falsy-field pruning.
//!
//! The NVP wire format is a flat `key=value` query. Repeated fields are
//! named through numbered templates (`PAYMENTREQUEST_0_AMT`,
//! `L_PAYMENTREQUEST_0_NAME1`, ...). Templates are first-class values here
//! rather than strings with magic placeholder letters, so an index can only
//! ever land in its designated slot.

use std::collections::BTreeMap;

use error_stack::report;
use rust_decimal::Decimal;

use crate::errors::{CustomResult, NvpError};

/// A scalar value or a nested structure awaiting flattening.
///
/// Only scalars may reach the wire; `List` and `Map` exist so the pruner can
/// walk structured input recursively before the mapper flattens it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Decimal(Decimal),
    Bool(bool),
    List(Vec<Value>),
    Map(FieldMap),
}

impl Value {
    /// The falsy predicate inherited from the upstream wire contract:
    /// empty strings, `false`, numeric zero and empty nested structures are
    /// all omitted from requests. Zero being falsy is a documented quirk kept
    /// for wire compatibility.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Int(value) => *value == 0,
            Self::Decimal(value) => *value == Decimal::ZERO,
            Self::Bool(value) => !*value,
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }

    fn prune(&mut self) {
        match self {
            Self::List(items) => {
                for item in items.iter_mut() {
                    item.prune();
                }
                items.retain(|item| !item.is_falsy());
            }
            Self::Map(map) => map.prune(),
            _ => {}
        }
    }

    fn as_wire(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Int(value) => Some(value.to_string()),
            Self::Decimal(value) => Some(value.to_string()),
            Self::Bool(value) => Some(if *value { "1" } else { "0" }.to_owned()),
            Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<std::net::IpAddr> for Value {
    fn from(value: std::net::IpAddr) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<url::Url> for Value {
    fn from(value: url::Url) -> Self {
        Self::Text(value.into())
    }
}

/// A wire field-name template with one numeric slot, e.g.
/// `PAYMENTREQUEST_{n}_AMT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedField {
    prefix: &'static str,
    suffix: &'static str,
}

impl IndexedField {
    pub const fn new(prefix: &'static str, suffix: &'static str) -> Self {
        Self { prefix, suffix }
    }

    /// Concrete wire name for the 0-based index `n`.
    pub fn at(&self, n: usize) -> String {
        format!("{}{}{}", self.prefix, n, self.suffix)
    }
}

/// A wire field-name template with two numeric slots, e.g.
/// `L_PAYMENTREQUEST_{n}_NAME{m}` for line item `m` of payment request `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedField {
    prefix: &'static str,
    mid: &'static str,
    suffix: &'static str,
}

impl NestedField {
    pub const fn new(prefix: &'static str, mid: &'static str, suffix: &'static str) -> Self {
        Self { prefix, mid, suffix }
    }

    /// Concrete wire name for the 0-based index pair `(n, m)`.
    pub fn at(&self, n: usize, m: usize) -> String {
        format!("{}{}{}{}{}", self.prefix, n, self.mid, m, self.suffix)
    }
}

/// Flat parameter map keyed by wire field name. Duplicate inserts follow
/// last-write-wins; entry order carries no wire semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(BTreeMap<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Absent values produce no entry at all.
    pub fn insert_opt<V: Into<Value>>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    /// One entry at the template's `n` slot.
    pub fn insert_at(&mut self, field: IndexedField, n: usize, value: impl Into<Value>) {
        self.insert(field.at(n), value);
    }

    /// One entry per caller-supplied index. Sparse indices are emitted
    /// verbatim; nothing is re-sorted or gap-filled.
    pub fn insert_each<V: Into<Value> + Clone>(
        &mut self,
        field: IndexedField,
        values: &BTreeMap<usize, V>,
    ) {
        for (n, value) in values {
            self.insert(field.at(*n), value.clone());
        }
    }

    /// One entry at the template's `(n, m)` slot pair.
    pub fn insert_nested_at(
        &mut self,
        field: NestedField,
        n: usize,
        m: usize,
        value: impl Into<Value>,
    ) {
        self.insert(field.at(n, m), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recursively removes falsy entries so unset optional fields never
    /// reach the wire. Idempotent.
    pub fn prune(&mut self) {
        for value in self.0.values_mut() {
            value.prune();
        }
        self.0.retain(|_, value| !value.is_falsy());
    }

    /// Flattens the map into wire pairs. Nested values must have been
    /// mapped to indexed scalar entries before this point.
    pub fn to_pairs(&self) -> CustomResult<Vec<(String, String)>, NvpError> {
        self.0
            .iter()
            .map(|(name, value)| {
                value
                    .as_wire()
                    .map(|wire| (name.clone(), wire))
                    .ok_or_else(|| {
                        report!(NvpError::UrlEncodingFailed)
                            .attach_printable(format!("non-scalar value left in field {name}"))
                    })
            })
            .collect()
    }
}

impl FromIterator<(String, Value)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
