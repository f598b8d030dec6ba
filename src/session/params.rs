//! Command-line parameters for tool modules and scripts.

use serde::Serialize;
use std::fmt;

/// One parameter passed to a module or script.
///
/// Rendered either as a `key=value` token or, for flags, as the bare key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    key: String,
    value: Option<String>,
}

impl Param {
    /// A `key=value` parameter.
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: Some(value.to_string()),
        }
    }

    /// A bare flag such as `-c` or `--overwrite`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            value: None,
        }
    }

    /// Parse a command-line token: `key=value` becomes a parameter, anything
    /// else a flag.
    pub fn parse(token: &str) -> Self {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => Self::new(key, value),
            _ => Self::flag(token),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.key, value),
            None => f.write_str(&self.key),
        }
    }
}

/// Render parameters as argument tokens, in order.
pub fn render(params: &[Param]) -> Vec<String> {
    params.iter().map(Param::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_key_value_and_flags() {
        let params = vec![
            Param::flag("-c"),
            Param::new("elev", "dem@PERMANENT"),
            Param::new("area", 25),
            Param::new("lambda", 0.5),
        ];
        assert_eq!(
            render(&params),
            vec!["-c", "elev=dem@PERMANENT", "area=25", "lambda=0.5"]
        );
    }

    #[test]
    fn parses_tokens() {
        assert_eq!(Param::parse("inmap=landcover"), Param::new("inmap", "landcover"));
        assert_eq!(Param::parse("--overwrite"), Param::flag("--overwrite"));
        assert_eq!(Param::parse("expr=a=b+1"), Param::new("expr", "a=b+1"));
        assert_eq!(Param::parse("=odd"), Param::flag("=odd"));
    }

    #[test]
    fn empty_value_keeps_equals_sign() {
        let param = Param::parse("cats=");
        assert_eq!(param.value(), Some(""));
        assert_eq!(param.to_string(), "cats=");
    }
}
