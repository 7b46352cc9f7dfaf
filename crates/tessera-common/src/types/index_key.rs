//! The orderable key type accepted by every index.
//!
//! `Value` cannot implement `Ord` or `Hash` because of `f64`. [`IndexKey`]
//! is the comparable subset of `Value` with a total order and a hash that is
//! consistent with its equality, so the same key type can live in a hash
//! bucket map and be range-compared.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::{Timestamp, Value};

/// A wrapper around `f64` that implements `Ord` with total ordering.
///
/// NaN values are treated as greater than all other values (including infinity).
/// Negative zero is considered equal to positive zero.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat64(pub f64);

impl OrderedFloat64 {
    /// Creates a new ordered float.
    #[must_use]
    pub const fn new(f: f64) -> Self {
        Self(f)
    }

    /// Returns the inner f64 value.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }

    /// Bit pattern used for hashing: zeros and NaNs collapse to one pattern each.
    fn canonical_bits(self) -> u64 {
        if self.0.is_nan() {
            f64::NAN.to_bits()
        } else if self.0 == 0.0 {
            0.0f64.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for OrderedFloat64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedFloat64 {}

impl PartialOrd for OrderedFloat64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat64 {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

impl Hash for OrderedFloat64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_bits().hash(state);
    }
}

impl From<f64> for OrderedFloat64 {
    fn from(f: f64) -> Self {
        Self(f)
    }
}

/// A comparable index key.
///
/// # Supported Types
///
/// - `Int64` and `Float64` - numeric ordering, compared across the two types
/// - `String` - lexicographic ordering
/// - `Bool` - false < true
/// - `Timestamp` - chronological ordering
///
/// Other value types (`Null`, `Bytes`, `List`) have no key form and
/// [`IndexKey::from_value`] returns `None` for them.
///
/// # Examples
///
/// ```
/// use tessera_common::types::{IndexKey, Value};
///
/// let ten = IndexKey::from_value(&Value::Int64(10)).unwrap();
/// let ten_f = IndexKey::from_value(&Value::Float64(10.0)).unwrap();
/// assert_eq!(ten, ten_f);
/// assert!(IndexKey::from_value(&Value::Null).is_none());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum IndexKey {
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point with total ordering (NaN > everything)
    Float64(OrderedFloat64),
    /// UTF-8 string
    String(ArcStr),
    /// Boolean value (false < true)
    Bool(bool),
    /// Timestamp
    Timestamp(Timestamp),
}

impl IndexKey {
    /// Attempts to build a key from a `Value`.
    ///
    /// Returns `None` for types without a natural ordering.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int64(i) => Some(Self::Int64(*i)),
            Value::Float64(f) => Some(Self::Float64(OrderedFloat64(*f))),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Timestamp(t) => Some(Self::Timestamp(*t)),
            Value::Null | Value::Bytes(_) | Value::List(_) => None,
        }
    }

    /// Converts this key back to a `Value`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Int64(i) => Value::Int64(i),
            Self::Float64(f) => Value::Float64(f.0),
            Self::String(s) => Value::String(s),
            Self::Bool(b) => Value::Bool(b),
            Self::Timestamp(t) => Value::Timestamp(t),
        }
    }

    /// Returns the key as an i64, if it's an Int64.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the key as a string slice, if it's a String.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Order between kinds: Bool < numbers < String < Timestamp.
    const fn type_ordinal(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int64(_) | Self::Float64(_) => 1,
            Self::String(_) => 2,
            Self::Timestamp(_) => 3,
        }
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Float64(a), Self::Float64(b)) => a.cmp(b),
            (Self::Int64(i), Self::Float64(f)) => cmp_int_float(*i, f.0),
            (Self::Float64(f), Self::Int64(i)) => cmp_int_float(*i, f.0).reverse(),
            _ => self.type_ordinal().cmp(&other.type_ordinal()),
        }
    }
}

impl Hash for IndexKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_ordinal().hash(state);
        match self {
            // An integral float equal to an Int64 must hash like it.
            Self::Int64(i) => i.hash(state),
            Self::Float64(f) => match exact_i64(f.0) {
                Some(i) => i.hash(state),
                None => f.hash(state),
            },
            Self::String(s) => s.hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Timestamp(t) => t.hash(state),
        }
    }
}

/// Lower bound of the `i64` range as a float (exactly `-2^63`).
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
/// One past the upper bound of the `i64` range (exactly `2^63`).
const I64_END_F: f64 = 9_223_372_036_854_775_808.0;

/// The integer a float equals exactly, if it is integral and fits `i64`.
fn exact_i64(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && (I64_MIN_F..I64_END_F).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Compares an integer with a float by exact value, never rounding the
/// integer. NaN sorts above every integer.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_END_F {
        return Ordering::Less;
    }
    if f < I64_MIN_F {
        return Ordering::Greater;
    }
    // `f` is in range here, so its truncation converts exactly.
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        ordering => ordering,
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(i) => write!(f, "{i}"),
            Self::Float64(fl) => write!(f, "{}", fl.0),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Timestamp(t) => write!(f, "{t}"),
        }
    }
}

impl From<i64> for IndexKey {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<&str> for IndexKey {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::{BTreeSet, HashSet};

    fn hash_of(key: &IndexKey) -> u64 {
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_from_value() {
        assert!(IndexKey::from_value(&Value::Int64(42)).is_some());
        assert!(IndexKey::from_value(&Value::Float64(3.5)).is_some());
        assert!(IndexKey::from_value(&Value::String("test".into())).is_some());
        assert!(IndexKey::from_value(&Value::Bool(true)).is_some());
        assert!(IndexKey::from_value(&Value::Timestamp(Timestamp::from_secs(1))).is_some());

        assert!(IndexKey::from_value(&Value::Null).is_none());
        assert!(IndexKey::from_value(&Value::Bytes(vec![1, 2].into())).is_none());
        assert!(IndexKey::from_value(&Value::List(vec![].into())).is_none());
    }

    #[test]
    fn test_ordering() {
        let mut set = BTreeSet::new();
        set.insert(IndexKey::Int64(30));
        set.insert(IndexKey::Int64(10));
        set.insert(IndexKey::Float64(OrderedFloat64(20.5)));

        let values: Vec<_> = set.into_iter().map(IndexKey::into_value).collect();
        assert_eq!(
            values,
            vec![Value::Int64(10), Value::Float64(20.5), Value::Int64(30)]
        );
    }

    #[test]
    fn test_cross_type_numeric_hash_matches_eq() {
        let i = IndexKey::Int64(10);
        let f = IndexKey::Float64(OrderedFloat64(10.0));
        assert_eq!(i, f);
        assert_eq!(hash_of(&i), hash_of(&f));

        let mut set = HashSet::new();
        set.insert(i);
        assert!(set.contains(&f));
    }

    #[test]
    fn test_int_float_exact_beyond_f64_precision() {
        let two_53 = 1i64 << 53;
        let a = IndexKey::Int64(two_53);
        let b = IndexKey::Int64(two_53 + 1);
        let f = IndexKey::Float64(OrderedFloat64(two_53 as f64));

        assert_eq!(a, f);
        assert_eq!(hash_of(&a), hash_of(&f));
        assert_ne!(f, b);
        assert!(f < b);
        assert!(b > f);

        let max = IndexKey::Int64(i64::MAX);
        assert!(max < IndexKey::Float64(OrderedFloat64(9_223_372_036_854_775_808.0)));
        assert!(IndexKey::Int64(i64::MIN) == IndexKey::Float64(OrderedFloat64(-9_223_372_036_854_775_808.0)));
        assert!(IndexKey::Int64(i64::MIN) > IndexKey::Float64(OrderedFloat64(f64::NEG_INFINITY)));
        assert!(max < IndexKey::Float64(OrderedFloat64(f64::NAN)));
    }

    #[test]
    fn test_int_float_fractional_ordering() {
        assert!(IndexKey::Int64(2) < IndexKey::Float64(OrderedFloat64(2.5)));
        assert!(IndexKey::Int64(3) > IndexKey::Float64(OrderedFloat64(2.5)));
        assert!(IndexKey::Int64(-2) > IndexKey::Float64(OrderedFloat64(-2.5)));
        assert!(IndexKey::Int64(-3) < IndexKey::Float64(OrderedFloat64(-2.5)));
        assert_eq!(IndexKey::Int64(0), IndexKey::Float64(OrderedFloat64(-0.0)));
        assert_eq!(
            hash_of(&IndexKey::Int64(0)),
            hash_of(&IndexKey::Float64(OrderedFloat64(-0.0)))
        );
    }

    #[test]
    fn test_zero_and_nan_hashing() {
        let pos = IndexKey::Float64(OrderedFloat64(0.0));
        let neg = IndexKey::Float64(OrderedFloat64(-0.0));
        assert_eq!(pos, neg);
        assert_eq!(hash_of(&pos), hash_of(&neg));

        let nan = IndexKey::Float64(OrderedFloat64(f64::NAN));
        assert_eq!(nan, nan.clone());
        assert!(IndexKey::Float64(OrderedFloat64(f64::INFINITY)) < nan);
    }

    #[test]
    fn test_kind_ordering() {
        assert!(IndexKey::Bool(true) < IndexKey::Int64(-5));
        assert!(IndexKey::Int64(1_000) < IndexKey::from("a"));
        assert!(IndexKey::from("zzz") < IndexKey::Timestamp(Timestamp::EPOCH));
    }
}
