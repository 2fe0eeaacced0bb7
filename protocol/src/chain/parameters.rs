//! Network parameters.
//!
//! Parameters arrive as strings (the node stores every value that way). The
//! PoW tunables are floating-point numbers, so [`read_f64`] parses them and
//! distinguishes a missing key from a malformed value.

use dashmap::DashMap;
use thiserror::Error;

use super::ParameterSource;

/// Why a parameter could not be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("network parameter {0} is not set")]
    Absent(String),

    #[error("network parameter {key} has unparsable value '{value}'")]
    Unparsable { key: String, value: String },
}

/// Reads `key` from `source` and parses it as `f64`.
///
/// Non-finite values (`NaN`, `inf`) count as unparsable.
pub fn read_f64(source: &dyn ParameterSource, key: &str) -> Result<f64, ParameterError> {
    let raw = source
        .get(key)
        .ok_or_else(|| ParameterError::Absent(key.to_string()))?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParameterError::Unparsable {
            key: key.to_string(),
            value: raw,
        }),
    }
}

/// Concurrent in-memory parameter store.
#[derive(Debug, Default)]
pub struct NetworkParameters {
    values: DashMap<String, String>,
}

impl NetworkParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a parameter.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes a parameter, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ParameterSource for NetworkParameters {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }
}

impl<K, V> FromIterator<(K, V)> for NetworkParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let params = Self::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let params = NetworkParameters::new();
        assert!(params.is_empty());
        params.set("spam.pow.numberOfTxPerBlock", "2");
        assert_eq!(params.get("spam.pow.numberOfTxPerBlock").as_deref(), Some("2"));
        assert_eq!(params.len(), 1);
        assert_eq!(params.remove("spam.pow.numberOfTxPerBlock").as_deref(), Some("2"));
        assert!(params.get("spam.pow.numberOfTxPerBlock").is_none());
    }

    #[test]
    fn read_f64_parses_integers_and_decimals() {
        let params: NetworkParameters = [("a", "10"), ("b", " 2.5 ")].into_iter().collect();
        assert_eq!(read_f64(&params, "a").unwrap(), 10.0);
        assert_eq!(read_f64(&params, "b").unwrap(), 2.5);
    }

    #[test]
    fn read_f64_distinguishes_absent_from_garbage() {
        let params: NetworkParameters = [("bad", "ten"), ("nan", "NaN")].into_iter().collect();
        assert_eq!(
            read_f64(&params, "missing").unwrap_err(),
            ParameterError::Absent("missing".into())
        );
        assert!(matches!(
            read_f64(&params, "bad").unwrap_err(),
            ParameterError::Unparsable { .. }
        ));
        assert!(matches!(
            read_f64(&params, "nan").unwrap_err(),
            ParameterError::Unparsable { .. }
        ));
    }
}
