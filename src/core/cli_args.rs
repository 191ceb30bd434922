//! Keyword options to `--flag value` argument strings for the evaluate engine.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Str(String),
    Int(i128),
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => f.write_str(if *value { "true" } else { "false" }),
            Scalar::Str(value) => f.write_str(value),
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => f.write_str(&format_float(*value)),
        }
    }
}

/// Shortest round-trip form with a `.0` on whole numbers and a signed,
/// two-digit exponent (`1e+16`, `1.5e-05`), as the engine's Python front end
/// prints floats.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        return text.into();
    }
    let debug = format!("{value:?}");
    match debug.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => debug,
    }
}

/// List elements keep Python's `str()` spelling of booleans.
fn list_token(item: &Scalar) -> String {
    match item {
        Scalar::Bool(true) => "True".into(),
        Scalar::Bool(false) => "False".into(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Skipped entirely, no flag is emitted.
    None,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

macro_rules! scalar_from {
    ($variant:ident: $($ty:ty),+ => $conv:expr) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant($conv(value))
                }
            }

            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    OptionValue::Scalar(value.into())
                }
            }
        )+
    };
}

scalar_from!(Bool: bool => std::convert::identity);
scalar_from!(Str: String => std::convert::identity);
scalar_from!(Str: &str => str::to_string);
scalar_from!(Float: f32, f64 => f64::from);

macro_rules! int_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::Int(value as i128)
                }
            }

            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    OptionValue::Scalar(value.into())
                }
            }
        )+
    };
}

int_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OptionValue::None, Into::into)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for OptionValue {
    fn from(values: Vec<T>) -> Self {
        OptionValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for OptionValue {
    fn from(values: [T; N]) -> Self {
        OptionValue::List(values.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("option {key}: nested lists and objects cannot be passed on the command line")]
    Nested { key: String },
    #[error("option {key}: null is not allowed inside a list")]
    NullElement { key: String },
    #[error("option {key}: number {value} is not representable")]
    Number { key: String, value: String },
    #[error("expected a json object of options")]
    NotAnObject,
}

fn scalar_from_json(key: &str, value: &Value) -> Result<Scalar, OptionError> {
    match value {
        Value::Bool(value) => Ok(Scalar::Bool(*value)),
        Value::String(value) => Ok(Scalar::Str(value.clone())),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(Scalar::Int(int.into()))
            } else if let Some(int) = number.as_u64() {
                Ok(Scalar::Int(int.into()))
            } else if let Some(float) = number.as_f64() {
                Ok(Scalar::Float(float))
            } else {
                Err(OptionError::Number {
                    key: key.to_string(),
                    value: number.to_string(),
                })
            }
        }
        Value::Null => Err(OptionError::NullElement {
            key: key.to_string(),
        }),
        Value::Array(_) | Value::Object(_) => Err(OptionError::Nested {
            key: key.to_string(),
        }),
    }
}

fn option_from_json(key: &str, value: &Value) -> Result<OptionValue, OptionError> {
    match value {
        Value::Null => Ok(OptionValue::None),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_from_json(key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(OptionValue::List),
        other => scalar_from_json(key, other).map(OptionValue::Scalar),
    }
}

/// Insertion-ordered option set. Setting an existing key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    entries: Vec<(String, OptionValue)>,
}

impl CliOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.entries.iter_mut().find(|(current, _)| *current == key) {
            existing.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(current, _)| current == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds options from a JSON object, keeping the object's key order.
    pub fn from_json(value: &Value) -> Result<Self, OptionError> {
        let object = value.as_object().ok_or(OptionError::NotAnObject)?;
        let mut options = Self::new();
        for (key, value) in object {
            options.set(key.as_str(), option_from_json(key, value)?);
        }
        Ok(options)
    }

    /// Argument tokens, one per flag or value.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in &self.entries {
            push_option(&mut args, key, value);
        }
        args
    }

    /// Space-joined arguments. Values are not quoted, so a value containing
    /// whitespace splits into several words if passed through a shell.
    #[must_use]
    pub fn to_cli(&self) -> String {
        self.to_args().join(" ")
    }
}

impl<K, V> FromIterator<(K, V)> for CliOptions
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.set(key, value);
        }
        options
    }
}

fn push_option(args: &mut Vec<String>, key: &str, value: &OptionValue) {
    if matches!(value, OptionValue::None) {
        return;
    }
    args.push(format!("--{}", key.replace('_', "-")));
    match value {
        OptionValue::None => {}
        OptionValue::Scalar(Scalar::Str(text)) if text.is_empty() => {}
        OptionValue::Scalar(scalar) => args.push(scalar.to_string()),
        OptionValue::List(items) => args.extend(items.iter().map(list_token)),
    }
}

/// Formats `(name, value)` pairs in the order given.
pub fn kwargs_to_cli<I, K, V>(options: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<OptionValue>,
{
    let mut args = Vec::new();
    for (key, value) in options {
        push_option(&mut args, key.as_ref(), &value.into());
    }
    args.join(" ")
}
