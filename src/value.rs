//! The language-neutral `value` type events carry as arguments and return
//! values (`args: list of values`, `invoke(...) -> value`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A loosely-typed value passed between entity dispatch and the scheduler.
///
/// Entities are ordinary Rust types; `Value` only exists at the dispatch
/// boundary (`Entity::invoke`'s args and return), the same role the
/// original system's untyped `Object[]` arguments play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	Unit,
	Bool(bool),
	Int(i64),
	UInt(u64),
	Float(f64),
	Str(String),
	List(Vec<Value>),
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Unit => write!(f, "()"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::UInt(u) => write!(f, "{u}"),
			Self::Float(x) => write!(f, "{x}"),
			Self::Str(s) => write!(f, "{s:?}"),
			Self::List(items) => {
				write!(f, "[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{item}")?;
				}
				write!(f, "]")
			}
		}
	}
}

impl From<()> for Value {
	fn from((): ()) -> Self {
		Self::Unit
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<u64> for Value {
	fn from(u: u64) -> Self {
		Self::UInt(u)
	}
}

impl From<f64> for Value {
	fn from(x: f64) -> Self {
		Self::Float(x)
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::Str(s)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::Str(s.to_string())
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Self::List(items.into_iter().map(Into::into).collect())
	}
}

impl Value {
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s.as_str()),
			_ => None,
		}
	}

	#[must_use]
	pub const fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	#[must_use]
	pub const fn as_uint(&self) -> Option<u64> {
		match self {
			Self::UInt(u) => Some(*u),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conversions_round_trip() {
		let v: Value = 42i64.into();
		assert_eq!(v.as_int(), Some(42));

		let v: Value = "hello".into();
		assert_eq!(v.as_str(), Some("hello"));

		let v: Value = vec![1i64, 2, 3].into();
		assert_eq!(v, Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
	}

	#[test]
	fn display_matches_kind() {
		assert_eq!(Value::Unit.to_string(), "()");
		assert_eq!(Value::Bool(true).to_string(), "true");
		assert_eq!(Value::from(3i64).to_string(), "3");
	}
}
