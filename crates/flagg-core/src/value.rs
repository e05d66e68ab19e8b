// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Largest integer an `f64` represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Flag name to value mapping, as returned by stores and bulk operations.
pub type FlagMap = BTreeMap<String, FlagValue>;

/// The value of a feature flag.
///
/// Mirrors the JSON data model: flags are stored as JSON text by most stores,
/// so anything that survives a JSON round trip is a valid flag value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
	#[default]
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	List(Vec<FlagValue>),
	Map(BTreeMap<String, FlagValue>),
}

impl FlagValue {
	/// Parses a stored value, passing text that is not valid JSON through as
	/// a plain string.
	pub fn parse_stored(raw: &str) -> FlagValue {
		serde_json::from_str(raw).unwrap_or_else(|_| FlagValue::String(raw.to_owned()))
	}

	/// Recursive structural equality.
	///
	/// Maps compare by key set and per-key value, so key order never matters.
	/// Numbers compare numerically (`NaN` is never equal to itself).
	pub fn structural_eq(&self, other: &FlagValue) -> bool {
		match (self, other) {
			(FlagValue::Null, FlagValue::Null) => true,
			(FlagValue::Bool(a), FlagValue::Bool(b)) => a == b,
			(FlagValue::Number(a), FlagValue::Number(b)) => a == b,
			(FlagValue::String(a), FlagValue::String(b)) => a == b,
			(FlagValue::List(a), FlagValue::List(b)) => {
				a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
			}
			(FlagValue::Map(a), FlagValue::Map(b)) => {
				a.len() == b.len()
					&& a
						.iter()
						.all(|(key, x)| b.get(key).is_some_and(|y| x.structural_eq(y)))
			}
			_ => false,
		}
	}

	/// Boolean coercion with JavaScript semantics.
	///
	/// `null`, `false`, `0`, `NaN` and the empty string are falsy; everything
	/// else, including empty lists and maps, is truthy.
	pub fn is_truthy(&self) -> bool {
		match self {
			FlagValue::Null => false,
			FlagValue::Bool(b) => *b,
			FlagValue::Number(n) => *n != 0.0 && !n.is_nan(),
			FlagValue::String(s) => !s.is_empty(),
			FlagValue::List(_) | FlagValue::Map(_) => true,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, FlagValue::Null)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			FlagValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			FlagValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			FlagValue::Number(n) => Some(*n),
			_ => None,
		}
	}

	/// Serializes the value as compact JSON text.
	pub fn to_json_string(&self) -> String {
		serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
	}
}

impl PartialEq for FlagValue {
	fn eq(&self, other: &Self) -> bool {
		self.structural_eq(other)
	}
}

impl Serialize for FlagValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			FlagValue::Null => serializer.serialize_unit(),
			FlagValue::Bool(b) => serializer.serialize_bool(*b),
			// Integral numbers are written without a fraction, like JSON.stringify.
			FlagValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
				serializer.serialize_i64(*n as i64)
			}
			FlagValue::Number(n) => serializer.serialize_f64(*n),
			FlagValue::String(s) => serializer.serialize_str(s),
			FlagValue::List(items) => serializer.collect_seq(items),
			FlagValue::Map(map) => serializer.collect_map(map),
		}
	}
}

impl fmt::Display for FlagValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_json_string())
	}
}

impl From<bool> for FlagValue {
	fn from(value: bool) -> Self {
		FlagValue::Bool(value)
	}
}

impl From<f64> for FlagValue {
	fn from(value: f64) -> Self {
		FlagValue::Number(value)
	}
}

impl From<i64> for FlagValue {
	fn from(value: i64) -> Self {
		FlagValue::Number(value as f64)
	}
}

impl From<i32> for FlagValue {
	fn from(value: i32) -> Self {
		FlagValue::Number(f64::from(value))
	}
}

impl From<&str> for FlagValue {
	fn from(value: &str) -> Self {
		FlagValue::String(value.to_owned())
	}
}

impl From<String> for FlagValue {
	fn from(value: String) -> Self {
		FlagValue::String(value)
	}
}

impl<T: Into<FlagValue>> From<Vec<T>> for FlagValue {
	fn from(values: Vec<T>) -> Self {
		FlagValue::List(values.into_iter().map(Into::into).collect())
	}
}

impl From<BTreeMap<String, FlagValue>> for FlagValue {
	fn from(map: BTreeMap<String, FlagValue>) -> Self {
		FlagValue::Map(map)
	}
}

impl<T: Into<FlagValue>> From<Option<T>> for FlagValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(FlagValue::Null, Into::into)
	}
}

impl From<serde_json::Value> for FlagValue {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => FlagValue::Null,
			serde_json::Value::Bool(b) => FlagValue::Bool(b),
			serde_json::Value::Number(n) => n.as_f64().map_or(FlagValue::Null, FlagValue::Number),
			serde_json::Value::String(s) => FlagValue::String(s),
			serde_json::Value::Array(items) => {
				FlagValue::List(items.into_iter().map(FlagValue::from).collect())
			}
			serde_json::Value::Object(map) => FlagValue::Map(
				map.into_iter()
					.map(|(key, value)| (key, FlagValue::from(value)))
					.collect(),
			),
		}
	}
}

impl From<FlagValue> for serde_json::Value {
	fn from(value: FlagValue) -> Self {
		serde_json::to_value(&value).unwrap_or(serde_json::Value::Null)
	}
}
