//! Request body validation.
//!
//! Rules run against the raw JSON body so that missing and mistyped fields
//! are reported together as a per-field message map instead of failing on
//! the first serde error.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Field name to list of human-readable messages.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("Validation failed")]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// Look up a dotted path (`data.nodes`) in a JSON body.
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(body, |value, key| value.get(key))
}

/// Accumulates rule failures for one request body.
pub struct Validator<'a> {
    body: &'a Value,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(body: &'a Value) -> Self {
        Self {
            body,
            errors: ValidationErrors::new(),
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        lookup(self.body, field).filter(|value| !value.is_null())
    }

    fn has_key(&self, field: &str) -> bool {
        lookup(self.body, field).is_some()
    }

    fn fail(&mut self, field: &str, message: String) {
        self.errors.add(field, message);
    }

    /// Present, a string, not blank, at most `max` characters.
    pub fn required_string(&mut self, field: &str, max: usize) -> &mut Self {
        match self.present(field) {
            None => self.fail(field, format!("The {field} field is required.")),
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.fail(field, format!("The {field} field is required."))
            }
            Some(Value::String(s)) => self.check_max(field, s, max),
            Some(_) => self.fail(field, format!("The {field} field must be a string.")),
        }
        self
    }

    /// Like [`required_string`](Self::required_string) but only when the key is sent.
    pub fn sometimes_string(&mut self, field: &str, max: usize) -> &mut Self {
        if self.has_key(field) {
            self.required_string(field, max);
        }
        self
    }

    /// Absent or null is fine; otherwise a string of at most `max` characters.
    pub fn nullable_string(&mut self, field: &str, max: usize) -> &mut Self {
        match self.present(field) {
            None => {}
            Some(Value::String(s)) => self.check_max(field, s, max),
            Some(_) => self.fail(field, format!("The {field} field must be a string.")),
        }
        self
    }

    pub fn min_length(&mut self, field: &str, min: usize) -> &mut Self {
        if let Some(Value::String(s)) = self.present(field) {
            if s.chars().count() < min {
                self.fail(
                    field,
                    format!("The {field} field must be at least {min} characters."),
                );
            }
        }
        self
    }

    pub fn email(&mut self, field: &str) -> &mut Self {
        if let Some(Value::String(s)) = self.present(field) {
            if !EMAIL_RE.is_match(s.trim()) {
                self.fail(
                    field,
                    format!("The {field} field must be a valid email address."),
                );
            }
        }
        self
    }

    /// `field` must equal `field_confirmation`.
    pub fn confirmed(&mut self, field: &str) -> &mut Self {
        let confirmation = format!("{field}_confirmation");
        if let Some(value) = self.present(field) {
            if self.present(&confirmation) != Some(value) {
                self.fail(
                    field,
                    format!("The {field} field confirmation does not match."),
                );
            }
        }
        self
    }

    pub fn required_object(&mut self, field: &str) -> &mut Self {
        match self.present(field) {
            None => self.fail(field, format!("The {field} field is required.")),
            Some(Value::Object(_)) => {}
            Some(_) => self.fail(field, format!("The {field} field must be an object.")),
        }
        self
    }

    pub fn sometimes_object(&mut self, field: &str) -> &mut Self {
        if self.has_key(field) {
            self.required_object(field);
        }
        self
    }

    pub fn nullable_array(&mut self, field: &str) -> &mut Self {
        match self.present(field) {
            None | Some(Value::Array(_)) => {}
            Some(_) => self.fail(field, format!("The {field} field must be an array.")),
        }
        self
    }

    /// Nullable array whose every element is a string of at most `max` characters.
    pub fn nullable_string_array(&mut self, field: &str, max: usize) -> &mut Self {
        self.nullable_array(field);
        if let Some(Value::Array(items)) = self.present(field) {
            for (index, item) in items.iter().enumerate() {
                let item_field = format!("{field}.{index}");
                match item {
                    Value::String(s) => self.check_max(&item_field, s, max),
                    _ => self.fail(
                        &item_field,
                        format!("The {item_field} field must be a string."),
                    ),
                }
            }
        }
        self
    }

    fn check_max(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.fail(
                field,
                format!("The {field} field must not be greater than {max} characters."),
            );
        }
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// String at `field`, if it is one.
pub fn string_at(body: &Value, field: &str) -> Option<String> {
    lookup(body, field).and_then(Value::as_str).map(str::to_string)
}

/// `None` when the key is absent, `Some(None)` when it was sent as null.
pub fn nullable_string_at(body: &Value, field: &str) -> Option<Option<String>> {
    lookup(body, field).map(|value| value.as_str().map(str::to_string))
}

/// String list at `field`; `Some(vec![])` when sent as null.
pub fn string_list_at(body: &Value, field: &str) -> Option<Vec<String>> {
    lookup(body, field).map(|value| {
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    })
}
