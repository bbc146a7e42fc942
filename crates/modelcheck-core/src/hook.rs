//! Field validator hooks.
//!
//! A hook receives the field name and the already type-checked value. It
//! either returns the value to store (possibly normalized) or a message that
//! is reported as a `custom_validation_failed` failure.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

type HookFn = dyn Fn(&str, FieldValue) -> Result<FieldValue, String> + Send + Sync;

/// A named validation function attached to a field.
#[derive(Clone)]
pub struct ValidatorHook {
    name: String,
    func: Arc<HookFn>,
}

impl ValidatorHook {
    /// Wrap a closure as a hook.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str, FieldValue) -> Result<FieldValue, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the hook on one field occurrence.
    pub fn apply(&self, field: &str, value: FieldValue) -> Result<FieldValue, String> {
        (self.func)(field, value)
    }
}

impl fmt::Debug for ValidatorHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorHook")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Require at least `min` characters (strings) or items (lists).
pub fn min_length(min: usize) -> ValidatorHook {
    ValidatorHook::new(format!("min_length({min})"), move |_, value| {
        match measure(&value) {
            Some((len, unit)) if len < min => Err(format!(
                "{} should have at least {min} {}",
                subject(&value),
                plural(unit, min)
            )),
            Some(_) => Ok(value),
            None => Err(format!("length check needs a string or list, got {}", value.kind())),
        }
    })
}

/// Allow at most `max` characters (strings) or items (lists).
pub fn max_length(max: usize) -> ValidatorHook {
    ValidatorHook::new(format!("max_length({max})"), move |_, value| {
        match measure(&value) {
            Some((len, unit)) if len > max => Err(format!(
                "{} should have at most {max} {}",
                subject(&value),
                plural(unit, max)
            )),
            Some(_) => Ok(value),
            None => Err(format!("length check needs a string or list, got {}", value.kind())),
        }
    })
}

/// Pluggable string format check. `label` names the format in messages.
pub fn format<F>(label: impl Into<String>, checker: F) -> ValidatorHook
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    let label = label.into();
    ValidatorHook::new(format!("format({label})"), move |_, value| {
        let valid = match value.as_str() {
            Some(text) => checker(text),
            None => return Err(format!("{label} check needs a string, got {}", value.kind())),
        };
        if valid {
            Ok(value)
        } else {
            Err(format!("value is not a valid {label}"))
        }
    })
}

/// Shallow `local@domain.tld` check; full address grammar is left to
/// callers that plug their own checker into [`format`].
pub fn email() -> ValidatorHook {
    format("email address", looks_like_email)
}

/// Strip leading and trailing whitespace.
pub fn trim() -> ValidatorHook {
    ValidatorHook::new("trim", |_, value| match value {
        FieldValue::Str(s) => Ok(FieldValue::Str(s.trim().to_string())),
        other => Err(format!("trim needs a string, got {}", other.kind())),
    })
}

pub fn lowercase() -> ValidatorHook {
    ValidatorHook::new("lowercase", |_, value| match value {
        FieldValue::Str(s) => Ok(FieldValue::Str(s.to_lowercase())),
        other => Err(format!("lowercase needs a string, got {}", other.kind())),
    })
}

/// Inclusive numeric bounds.
pub fn range(min: Option<f64>, max: Option<f64>) -> ValidatorHook {
    let name = format!(
        "range({}, {})",
        min.map_or_else(|| "-".to_string(), |v| v.to_string()),
        max.map_or_else(|| "-".to_string(), |v| v.to_string())
    );
    ValidatorHook::new(name, move |_, value| {
        let Some(number) = value.as_f64() else {
            return Err(format!("range check needs a number, got {}", value.kind()));
        };
        if let Some(min) = min {
            if number < min {
                return Err(format!("value should be greater than or equal to {min}"));
            }
        }
        if let Some(max) = max {
            if number > max {
                return Err(format!("value should be less than or equal to {max}"));
            }
        }
        Ok(value)
    })
}

/// Serializable reference to a built-in hook, used by definition files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HookSpec {
    MinLength {
        min: usize,
    },
    MaxLength {
        max: usize,
    },
    Email,
    Trim,
    Lowercase,
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

impl HookSpec {
    pub fn build(&self) -> ValidatorHook {
        match self {
            HookSpec::MinLength { min } => min_length(*min),
            HookSpec::MaxLength { max } => max_length(*max),
            HookSpec::Email => email(),
            HookSpec::Trim => trim(),
            HookSpec::Lowercase => lowercase(),
            HookSpec::Range { min, max } => range(*min, *max),
        }
    }
}

fn measure(value: &FieldValue) -> Option<(usize, &'static str)> {
    match value {
        FieldValue::Str(s) => Some((s.chars().count(), "character")),
        FieldValue::List(items) => Some((items.len(), "item")),
        _ => None,
    }
}

fn subject(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::List(_) => "List",
        _ => "String",
    }
}

fn plural(unit: &str, count: usize) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

fn looks_like_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_length_counts_characters() {
        let hook = min_length(2);
        assert_eq!(
            hook.apply("name", FieldValue::from("Al")),
            Ok(FieldValue::from("Al"))
        );
        assert_eq!(
            hook.apply("name", FieldValue::from("A")),
            Err("String should have at least 2 characters".to_string())
        );
        assert_eq!(
            min_length(1).apply("tags", FieldValue::List(vec![])),
            Err("List should have at least 1 item".to_string())
        );
        assert!(hook.apply("id", FieldValue::Int(5)).is_err());
    }

    #[test]
    fn max_length_allows_boundary() {
        let hook = max_length(3);
        assert!(hook.apply("code", FieldValue::from("abc")).is_ok());
        assert!(hook.apply("code", FieldValue::from("abcd")).is_err());
    }

    #[test]
    fn email_format_checks() {
        let hook = email();
        assert!(hook
            .apply("email", FieldValue::from("alice@example.com"))
            .is_ok());
        for bad in ["alice", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@b..com"] {
            assert_eq!(
                hook.apply("email", FieldValue::from(bad)),
                Err("value is not a valid email address".to_string()),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn custom_format_checker_plugs_in() {
        let hook = format("zip code", |s| s.len() == 5 && s.chars().all(|c| c.is_ascii_digit()));
        assert!(hook.apply("zip_code", FieldValue::from("10001")).is_ok());
        assert_eq!(
            hook.apply("zip_code", FieldValue::from("1000A")),
            Err("value is not a valid zip code".to_string())
        );
    }

    #[test]
    fn normalizers_replace_values() {
        assert_eq!(
            trim().apply("name", FieldValue::from("  Bob ")),
            Ok(FieldValue::from("Bob"))
        );
        assert_eq!(
            lowercase().apply("email", FieldValue::from("Bob@Example.COM")),
            Ok(FieldValue::from("bob@example.com"))
        );
    }

    #[test]
    fn range_is_inclusive() {
        let hook = range(Some(0.0), Some(130.0));
        assert!(hook.apply("age", FieldValue::Int(0)).is_ok());
        assert!(hook.apply("age", FieldValue::Int(130)).is_ok());
        assert!(hook.apply("age", FieldValue::Int(-1)).is_err());
        assert!(hook.apply("age", FieldValue::Float(130.5)).is_err());
    }

    #[test]
    fn hook_spec_deserializes_tagged() {
        let specs: Vec<HookSpec> = serde_json::from_str(
            r#"[{"kind":"min_length","min":2},{"kind":"email"},{"kind":"range","max":10}]"#,
        )
        .unwrap();
        assert_eq!(
            specs,
            vec![
                HookSpec::MinLength { min: 2 },
                HookSpec::Email,
                HookSpec::Range {
                    min: None,
                    max: Some(10.0)
                },
            ]
        );
        assert_eq!(specs[0].build().name(), "min_length(2)");
    }
}
