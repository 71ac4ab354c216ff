// Environment variable loading

use crate::{ConfigError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::env;

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

/// Parse a raw env var string into a typed JSON value: `true`/`false` become
/// `Bool`, integers and floats become `Number`, everything else stays `String`.
/// `DispatchConfig`'s numeric and boolean fields need this — a bare
/// `Value::String` never deserializes into a `u64` or `bool` field.
pub(crate) fn coerce(value: &str) -> Value {
    if let Ok(b) = value.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = value.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(value.to_string())
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all environment variables, typed.
    pub fn load(&self) -> Result<HashMap<String, Value>> {
        let mut config = HashMap::new();

        for (key, value) in env::vars() {
            if let Some(ref prefix) = self.prefix {
                if key.starts_with(prefix) {
                    let trimmed_key = key.trim_start_matches(prefix).trim_start_matches('_');
                    config.insert(trimmed_key.to_lowercase(), coerce(&value));
                }
            } else {
                config.insert(key.to_lowercase(), coerce(&value));
            }
        }

        Ok(config)
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = if let Some(ref prefix) = self.prefix {
            format!("{}_{}", prefix, key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_loader() {
        unsafe {
            env::set_var("TEST_VAR", "test_value");
        }

        let loader = EnvLoader::new(Some("TEST".to_string()));
        let value = loader.load_var("VAR").unwrap();

        assert_eq!(value, "test_value");

        unsafe {
            env::remove_var("TEST_VAR");
        }
    }

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(None);
        let value = loader.load_var_or("NONEXISTENT_VAR", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn coerce_recognizes_numbers_and_bools() {
        assert_eq!(coerce("42"), Value::Number(42.into()));
        assert_eq!(coerce("0.10"), serde_json::json!(0.10));
        assert_eq!(coerce("true"), Value::Bool(true));
        assert_eq!(coerce("postgres://localhost"), Value::String("postgres://localhost".to_string()));
    }

    #[test]
    fn load_produces_typed_values_for_a_prefixed_var() {
        unsafe {
            env::set_var("TYPED_MIN_WORKERS", "5");
        }

        let loader = EnvLoader::new(Some("TYPED".to_string()));
        let loaded = loader.load().unwrap();
        assert_eq!(loaded.get("min_workers"), Some(&Value::Number(5.into())));

        unsafe {
            env::remove_var("TYPED_MIN_WORKERS");
        }
    }
}
