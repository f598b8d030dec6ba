//! Environment variable overrides for child processes.

use crate::error::{ExecError, Result};

/// Ordered set of environment variables merged into a child's inherited
/// environment.
///
/// Keys are unique. Setting a key that is already present replaces its value
/// in place, so the last write wins while the original position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    vars: Vec<(String, String)>,
}

impl EnvOverrides {
    /// Create an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any earlier value for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((key, value)),
        }
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if no overrides are set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a `KEY=VALUE` token. The value may be empty; the key may not.
    pub fn parse_assignment(token: &str) -> Result<(String, String)> {
        let Some((key, value)) = token.split_once('=') else {
            return Err(ExecError::InvalidArgument(format!(
                "environment override '{}' is not of the form KEY=VALUE",
                token
            )));
        };
        if key.is_empty() {
            return Err(ExecError::InvalidArgument(format!(
                "environment override '{}' has an empty key",
                token
            )));
        }
        Ok((key.to_string(), value.to_string()))
    }

    /// Build an override set from `KEY=VALUE` tokens.
    pub fn from_assignments<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = Self::new();
        for token in tokens {
            let (key, value) = Self::parse_assignment(token.as_ref())?;
            env.set(key, value);
        }
        Ok(env)
    }
}

impl<K, V> Extend<(K, V)> for EnvOverrides
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EnvOverrides
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut env = Self::new();
        env.extend(iter);
        env
    }
}
