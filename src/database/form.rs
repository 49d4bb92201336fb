use std::{collections::HashMap, str::FromStr};

use chrono::NaiveDate;
use serde_json::Value;

use crate::{error::CoreError, schema::Id};

pub type FormData = HashMap<String, Value>;

/// Loosely typed request parameters, as decoded from a query string or JSON
/// body. Missing keys read as `None`; present keys must have a usable value.
#[derive(Debug, Clone, Default)]
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut inner: FormData = HashMap::new();
        for (key, value) in pairs {
            match inner.get_mut(key) {
                Some(Value::Array(values)) => values.push(Value::from(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::from(value)]);
                }
                None => {
                    inner.insert(key.to_owned(), Value::from(value));
                }
            }
        }
        Self { inner }
    }

    pub fn get_value<T>(&self, key: &'static str) -> Result<Option<T>, CoreError>
    where
        T: TryFrom<Value, Error = CoreError>,
    {
        self.inner
            .get(key)
            .map(|value| value.to_owned().try_into())
            .transpose()
    }

    pub fn get_number<T>(&self, key: &'static str) -> Result<Option<T>, CoreError>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => match value {
                Value::String(v) => v
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_e| CoreError::validation(key, "Invalid number")),
                Value::Number(v) => v
                    .to_string()
                    .parse()
                    .map(Some)
                    .map_err(|_e| CoreError::validation(key, "Invalid number")),
                _ => Err(CoreError::validation(key, "Failed to parse value as number")),
            },
            None => Ok(None),
        }
    }

    pub fn get_id(&self, key: &'static str) -> Result<Option<Id>, CoreError> {
        self.get_number(key)
    }

    pub fn get_str(&self, key: &'static str) -> Result<Option<String>, CoreError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(Some(v.to_string())),
                None => Err(CoreError::validation(key, "Failed to parse value as str")),
            },
            None => Ok(None),
        }
    }

    /// Accepts a single string, a repeated key or a JSON array of strings.
    pub fn get_str_list(&self, key: &'static str) -> Result<Vec<String>, CoreError> {
        match self.inner.get(key) {
            Some(Value::String(v)) => Ok(vec![v.to_owned()]),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| CoreError::validation(key, "Expected a list of strings"))
                })
                .collect(),
            Some(_) => Err(CoreError::validation(key, "Expected a list of strings")),
            None => Ok(vec![]),
        }
    }

    /// Calendar date in `YYYY-MM-DD` form.
    pub fn get_date(&self, key: &'static str) -> Result<Option<NaiveDate>, CoreError> {
        match self.get_str(key)? {
            Some(v) => NaiveDate::parse_from_str(v.trim(), "%F")
                .map(Some)
                .map_err(|_e| CoreError::validation(key, "Expected a date as YYYY-MM-DD")),
            None => Ok(None),
        }
    }

    pub fn get_bool(&self, key: &'static str) -> Result<Option<bool>, CoreError> {
        match self.inner.get(key) {
            Some(Value::Bool(v)) => Ok(Some(*v)),
            Some(Value::String(v)) => match v.trim() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(CoreError::validation(key, "Expected a boolean")),
            },
            Some(Value::Number(v)) => match v.as_i64() {
                Some(1) => Ok(Some(true)),
                Some(0) => Ok(Some(false)),
                _ => Err(CoreError::validation(key, "Expected a boolean")),
            },
            Some(_) => Err(CoreError::validation(key, "Expected a boolean")),
            None => Ok(None),
        }
    }
}
