//! Cache key definitions.
//!
//! Defines `KeyValue`, the closed set of values a call argument can contribute
//! to a key, and `CacheKey`, the identity a cached result is stored under.
//! Equality and hashing are structural, so two independently built argument
//! tuples with equal contents always land on the same entry.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::domain::dataset::DatasetIdentity;

/// `f64` stored by its bit pattern so keys can be `Eq + Hash`.
///
/// `-0.0` is folded into `0.0` and every NaN into one canonical NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatBits(u64);

impl FloatBits {
    const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(Self::CANONICAL_NAN)
        } else if value == 0.0 {
            Self(0)
        } else {
            Self(value.to_bits())
        }
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// A value contributing to a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(FloatBits),
    Str(String),
    /// Identifier of a domain entity (subject, drug, lab parameter...).
    Id(i64),
    /// Nested dataset identity.
    Datasets(DatasetIdentity),
    /// Array argument.
    List(Vec<KeyValue>),
}

impl KeyValue {
    pub fn float(value: f64) -> Self {
        Self::Float(FloatBits::new(value))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValue::Str(value) => Some(value),
            _ => None,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            KeyValue::Null => out.push(0x00),
            KeyValue::Bool(value) => {
                out.push(0x01);
                out.push(u8::from(*value));
            }
            KeyValue::Int(value) => {
                out.push(0x02);
                out.extend_from_slice(&value.to_le_bytes());
            }
            KeyValue::Float(bits) => {
                out.push(0x03);
                out.extend_from_slice(&bits.0.to_le_bytes());
            }
            KeyValue::Str(value) => {
                out.push(0x04);
                encode_len(out, value.len());
                out.extend_from_slice(value.as_bytes());
            }
            KeyValue::Id(value) => {
                out.push(0x05);
                out.extend_from_slice(&value.to_le_bytes());
            }
            KeyValue::Datasets(identity) => {
                out.push(0x06);
                encode_identity(out, identity);
            }
            KeyValue::List(values) => {
                out.push(0x07);
                encode_values(out, values);
            }
        }
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<DatasetIdentity> for KeyValue {
    fn from(value: DatasetIdentity) -> Self {
        Self::Datasets(value)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyValue::Null, Into::into)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Null => f.write_str("null"),
            KeyValue::Bool(value) => write!(f, "{value}"),
            KeyValue::Int(value) => write!(f, "{value}"),
            KeyValue::Float(bits) => write!(f, "{}", bits.value()),
            KeyValue::Str(value) => write!(f, "{value:?}"),
            KeyValue::Id(value) => write!(f, "#{value}"),
            KeyValue::Datasets(identity) => write!(f, "{identity}"),
            KeyValue::List(values) => {
                f.write_str("[")?;
                write_joined(f, values)?;
                f.write_str("]")
            }
        }
    }
}

/// Key that also carries the dataset identity found among its arguments.
///
/// Only the key generator builds these, which keeps the embedded identity
/// consistent with the arguments it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    params: Vec<KeyValue>,
    datasets: DatasetIdentity,
}

impl DatasetKey {
    pub(crate) fn new(params: Vec<KeyValue>, datasets: DatasetIdentity) -> Self {
        Self { params, datasets }
    }

    pub fn params(&self) -> &[KeyValue] {
        &self.params
    }

    pub fn datasets(&self) -> &DatasetIdentity {
        &self.datasets
    }
}

/// Unified cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Call without arguments.
    Empty,
    /// Call with exactly one scalar, non-null argument.
    Single(KeyValue),
    /// Any other argument tuple.
    Tuple(Vec<KeyValue>),
    /// Argument tuple that referenced datasets.
    Dataset(DatasetKey),
}

impl CacheKey {
    /// Dataset identity embedded in the key, if it is dataset-aware.
    pub fn datasets(&self) -> Option<&DatasetIdentity> {
        match self {
            CacheKey::Dataset(key) => Some(key.datasets()),
            _ => None,
        }
    }

    pub fn is_dataset_aware(&self) -> bool {
        matches!(self, CacheKey::Dataset(_))
    }

    /// Lowercase hex SHA-256 over a canonical encoding of the key.
    pub fn fingerprint(&self) -> String {
        let mut bytes = Vec::with_capacity(64);
        match self {
            CacheKey::Empty => bytes.push(0x10),
            CacheKey::Single(value) => {
                bytes.push(0x11);
                value.encode_into(&mut bytes);
            }
            CacheKey::Tuple(values) => {
                bytes.push(0x12);
                encode_values(&mut bytes, values);
            }
            CacheKey::Dataset(key) => {
                bytes.push(0x13);
                encode_identity(&mut bytes, key.datasets());
                encode_values(&mut bytes, key.params());
            }
        }
        hex::encode(Sha256::digest(&bytes).to_vec())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Empty => f.write_str("()"),
            CacheKey::Single(value) => write!(f, "{value}"),
            CacheKey::Tuple(values) => {
                f.write_str("(")?;
                write_joined(f, values)?;
                f.write_str(")")
            }
            CacheKey::Dataset(key) => {
                write!(f, "{}(", key.datasets())?;
                write_joined(f, key.params())?;
                f.write_str(")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, values: &[KeyValue]) -> fmt::Result {
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

fn encode_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

fn encode_values(out: &mut Vec<u8>, values: &[KeyValue]) {
    encode_len(out, values.len());
    for value in values {
        value.encode_into(out);
    }
}

fn encode_identity(out: &mut Vec<u8>, identity: &DatasetIdentity) {
    out.extend_from_slice(identity.kind().as_str().as_bytes());
    encode_len(out, identity.len());
    for id in identity.ids() {
        out.extend_from_slice(&id.get().to_le_bytes());
    }
}
