//! Request payload validation.
//!
//! Handlers take a [`Payload`] (the raw JSON object, never rejected for a wrong field type) and run
//! it through a [`Validator`], which collects every failing rule as a field-level message instead
//! of stopping at the first one. Rules are plain method calls so a handler reads top to bottom like
//! the rule list it implements:
//!
//! ```ignore
//! let mut v = Validator::new(&payload);
//! let title = v.string("title");
//! let title = v.required("title", title);
//! v.max_chars("title", title.as_deref(), 255);
//! let request = v.finish(|| Some(FilmCreate { title: title? }))?;
//! ```

use crate::errors::Error;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{Serialize, ser::SerializeMap};
use serde_json::{Map, Value};
use validator::ValidateEmail;

/// Field errors in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: String) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: String) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total number of messages across all fields
    pub fn len(&self) -> usize {
        self.fields.iter().map(|(_, messages)| messages.len()).sum()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// First message, followed by a count of the remaining ones.
    pub fn summary(&self) -> String {
        let Some(first) = self.fields.first().and_then(|(_, messages)| messages.first()) else {
            return "The given data was invalid.".to_string();
        };
        match self.len() - 1 {
            0 => first.clone(),
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Human form of a field name used in messages (`first_name` -> `first name`).
pub fn display_name(field: &str) -> String {
    field.replace('_', " ")
}

/// A JSON object body that is accepted whatever its field types are.
///
/// An absent or blank body is an empty object, so a bare POST reports every required field.
#[derive(Debug, Clone, Default)]
pub struct Payload(pub Map<String, Value>);

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| Error::BadRequest { message: e.body_text() })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(Map::new()));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(Payload(map)),
            Ok(Value::Null) => Ok(Payload(Map::new())),
            Ok(_) | Err(_) => Err(Error::Validation {
                errors: ValidationErrors::single("body", "The request body must be a JSON object.".to_string()),
            }),
        }
    }
}

/// Whether a field was sent, sent as null, or sent with a usable value.
///
/// Empty and whitespace-only strings count as null.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Presence<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Presence::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Presence::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `None` leaves a column unchanged, `Some(None)` clears it.
    pub fn into_patch(self) -> Option<Option<T>> {
        match self {
            Presence::Missing => None,
            Presence::Null => Some(None),
            Presence::Value(v) => Some(Some(v)),
        }
    }
}

pub struct Validator<'a> {
    payload: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(payload: &'a Payload) -> Self {
        Self {
            payload: &payload.0,
            errors: ValidationErrors::default(),
        }
    }

    fn lookup(&self, field: &str) -> Presence<&'a Value> {
        match self.payload.get(field) {
            None => Presence::Missing,
            Some(Value::Null) => Presence::Null,
            Some(Value::String(s)) if s.trim().is_empty() => Presence::Null,
            Some(value) => Presence::Value(value),
        }
    }

    pub fn add(&mut self, field: &str, message: String) {
        self.errors.add(field, message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains(field)
    }

    /// A string field. Passwords keep their surrounding whitespace, everything else is trimmed.
    pub fn string(&mut self, field: &str) -> Presence<String> {
        match self.lookup(field) {
            Presence::Missing => Presence::Missing,
            Presence::Null => Presence::Null,
            Presence::Value(Value::String(s)) if field.contains("password") => Presence::Value(s.clone()),
            Presence::Value(Value::String(s)) => Presence::Value(s.trim().to_string()),
            Presence::Value(_) => {
                self.add(field, format!("The {} field must be a string.", display_name(field)));
                Presence::Null
            }
        }
    }

    /// An integer field; numeric strings such as `"2006"` are accepted.
    pub fn integer(&mut self, field: &str) -> Presence<i64> {
        let parsed = match self.lookup(field) {
            Presence::Missing => return Presence::Missing,
            Presence::Null => return Presence::Null,
            Presence::Value(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)),
            Presence::Value(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Presence::Value(_) => None,
        };
        match parsed {
            Some(i) => Presence::Value(i),
            None => {
                self.add(field, format!("The {} field must be an integer.", display_name(field)));
                Presence::Null
            }
        }
    }

    /// A numeric field; numeric strings are accepted.
    pub fn number(&mut self, field: &str) -> Presence<f64> {
        let parsed = match self.lookup(field) {
            Presence::Missing => return Presence::Missing,
            Presence::Null => return Presence::Null,
            Presence::Value(Value::Number(n)) => n.as_f64(),
            Presence::Value(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Presence::Value(_) => None,
        };
        match parsed {
            Some(f) => Presence::Value(f),
            None => {
                self.add(field, format!("The {} field must be a number.", display_name(field)));
                Presence::Null
            }
        }
    }

    /// The field must be sent with a non-null value.
    pub fn required<T>(&mut self, field: &str, value: Presence<T>) -> Option<T> {
        match value {
            Presence::Value(v) => Some(v),
            Presence::Missing if self.has_error(field) => None,
            Presence::Null if self.has_error(field) => None,
            _ => {
                self.add(field, format!("The {} field is required.", display_name(field)));
                None
            }
        }
    }

    /// The field may be omitted, but when sent it must not be null.
    pub fn sometimes_required<T>(&mut self, field: &str, value: Presence<T>) -> Option<T> {
        match value {
            Presence::Missing => None,
            other => self.required(field, other),
        }
    }

    pub fn min_chars(&mut self, field: &str, value: Option<&str>, min: usize) {
        if let Some(value) = value {
            if value.chars().count() < min {
                self.add(field, format!("The {} field must be at least {min} characters.", display_name(field)));
            }
        }
    }

    pub fn max_chars(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.add(
                    field,
                    format!("The {} field must not be greater than {max} characters.", display_name(field)),
                );
            }
        }
    }

    pub fn between(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        if let Some(value) = value {
            if value < min {
                self.add(field, format!("The {} field must be at least {min}.", display_name(field)));
            } else if value > max {
                self.add(field, format!("The {} field must not be greater than {max}.", display_name(field)));
            }
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            if !value.to_string().validate_email() {
                self.add(field, format!("The {} field must be a valid email address.", display_name(field)));
            }
        }
    }

    /// `{field}_confirmation` must be sent and equal to the field.
    pub fn confirmed(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value else { return };
        let confirmation = self.payload.get(&format!("{field}_confirmation")).and_then(Value::as_str);
        if confirmation != Some(value) {
            self.add(field, format!("The {} field confirmation does not match.", display_name(field)));
        }
    }

    /// Record that a uniqueness lookup found a clash.
    pub fn unique_failed(&mut self, field: &str) {
        self.add(field, format!("The {} has already been taken.", display_name(field)));
    }

    /// Record that a referenced row does not exist.
    pub fn exists_failed(&mut self, field: &str) {
        self.add(field, format!("The selected {} is invalid.", display_name(field)));
    }

    /// Fail with every collected message, or assemble the validated request.
    ///
    /// `build` returns `None` only if a value it needs was rejected, which cannot happen once no
    /// errors are recorded; that case is reported as an internal failure rather than a panic.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, Error> {
        if !self.errors.is_empty() {
            tracing::debug!(errors = self.errors.len(), "Request failed validation");
            return Err(Error::Validation { errors: self.errors });
        }
        build().ok_or_else(|| Error::Internal {
            operation: "assemble validated request".to_string(),
        })
    }
}
