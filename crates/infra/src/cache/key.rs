//! Cache key derivation
//!
//! Turns a query string plus a set of named parameters into a stable,
//! fixed-length identifier that is safe to share with other users of the
//! same cache backend.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Namespace prepended to the key material before hashing
pub const KEY_NAMESPACE: &str = "search-cache:";

/// Value of a single query parameter
///
/// Absent values are part of the key material and always render as the
/// same canonical `null` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Null,
    Text(String),
    Int(i64),
}

impl ParamValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Int(n) => Value::from(*n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Named parameters that take part in a cache key
///
/// Parameters are kept sorted by name, so insertion order never affects the
/// derived key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    /// Creates an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter, builder style
    ///
    /// # Examples
    ///
    /// ```
    /// use clawsearch_infra::cache::QueryParams;
    ///
    /// let params = QueryParams::new()
    ///     .with("page", 1u32)
    ///     .with("engines", None::<&str>);
    /// assert_eq!(params.len(), 2);
    /// ```
    pub fn with<V: Into<ParamValue>>(mut self, name: &str, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a parameter
    pub fn insert<V: Into<ParamValue>>(&mut self, name: &str, value: V) {
        self.params.insert(name.to_string(), value.into());
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the set holds no parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Canonical key material for `query`: the namespace followed by a JSON
    /// array of the query and the name-sorted `[name, value]` pairs
    fn canonical(&self, query: &str) -> String {
        let pairs: Vec<Value> = self
            .params
            .iter()
            .map(|(name, value)| json!([name, value.to_json()]))
            .collect();
        let material = Value::Array(vec![Value::String(query.to_string()), Value::Array(pairs)]);

        format!("{}{}", KEY_NAMESPACE, material)
    }
}

impl<K: AsRef<str>, V: Into<ParamValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

/// Opaque, fixed-length cache identifier (32 lowercase hex characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a query and its parameters
    ///
    /// # Arguments
    ///
    /// * `query` - Search query string
    /// * `params` - Parameters that distinguish otherwise equal queries
    ///
    /// # Returns
    ///
    /// Returns the MD5 digest of the canonical key material in lowercase hex
    ///
    /// # Examples
    ///
    /// ```
    /// use clawsearch_infra::cache::{CacheKey, QueryParams};
    ///
    /// let a = CacheKey::derive("weather", &QueryParams::new().with("page", 1u32).with("lang", "en"));
    /// let b = CacheKey::derive("weather", &QueryParams::new().with("lang", "en").with("page", 1u32));
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str().len(), 32);
    /// ```
    pub fn derive(query: &str, params: &QueryParams) -> Self {
        let material = params.canonical(query);
        Self(format!("{:x}", md5::compute(material.as_bytes())))
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
