//! Stat and variable values.
//!
//! Script text is parsed greedily: a field that reads as an integer becomes
//! [`Value::Int`], then one that reads as a finite float becomes
//! [`Value::Float`], and anything else is kept as [`Value::Text`].

use crate::error::ExpressionError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use variantly::Variantly;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Variantly)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Greedy int -> float -> text parse of a DSL field.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(int) = raw.parse::<i64>() {
            return Value::Int(int);
        }
        match raw.parse::<f64>() {
            Ok(float) if float.is_finite() => Value::Float(float),
            _ => Value::Text(raw.to_string()),
        }
    }

    /// Parse a field that must be numeric.
    pub fn parse_number(raw: &str) -> Result<Self, ExpressionError> {
        match Value::parse(raw) {
            Value::Text(_) => Err(ExpressionError::InvalidNumber { value: raw.trim().to_string() }),
            number => Ok(number),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(int) => Some(*int as f64),
            Value::Float(float) => Some(*float),
            Value::Text(_) => None,
        }
    }

    /// Ordering between two values.
    ///
    /// Numbers compare numerically regardless of int/float, text compares
    /// lexically. A number and a text value have no ordering.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Text(_), _) | (_, Value::Text(_)) => None,
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Numeric sum, or `None` if either side is text.
    pub fn checked_add(&self, delta: &Value) -> Option<Value> {
        match (self, delta) {
            (Value::Int(a), Value::Int(b)) => Some(Value::Int(a.saturating_add(*b))),
            (a, b) => Some(Value::Float(a.as_f64()? + b.as_f64()?)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{int}"),
            Value::Float(float) => write!(f, "{float}"),
            Value::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Comparison operators accepted by `check_stat` / `check_var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
        }
    }

    /// Apply the operator to `lhs <op> rhs`.
    ///
    /// Values with no ordering (number vs text) are unequal and satisfy no
    /// ordering operator.
    pub fn evaluate(self, lhs: &Value, rhs: &Value) -> bool {
        let ordering = lhs.compare(rhs);
        match self {
            Comparator::Eq => ordering == Some(Ordering::Equal),
            Comparator::Ne => ordering != Some(Ordering::Equal),
            Comparator::Gt => ordering == Some(Ordering::Greater),
            Comparator::Lt => ordering == Some(Ordering::Less),
            Comparator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Comparator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

impl FromStr for Comparator {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            ">" => Ok(Comparator::Gt),
            "<" => Ok(Comparator::Lt),
            ">=" => Ok(Comparator::Ge),
            "<=" => Ok(Comparator::Le),
            other => Err(ExpressionError::UnknownComparator { found: other.to_string() }),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_greedy() {
        assert_eq!(Value::parse("42"), Value::Int(42));
        assert_eq!(Value::parse(" -7 "), Value::Int(-7));
        assert_eq!(Value::parse("2.5"), Value::Float(2.5));
        assert_eq!(Value::parse("true"), Value::Text("true".into()));
        assert_eq!(Value::parse("inf"), Value::Text("inf".into()));
        assert!(Value::parse("Steel Sword").is_text());
    }

    #[test]
    fn numbers_compare_across_kinds() {
        assert_eq!(Value::Int(3).compare(&Value::Float(3.0)), Some(Ordering::Equal));
        assert_eq!(Value::Float(2.5).compare(&Value::Int(3)), Some(Ordering::Less));
        assert_eq!(Value::from("abc").compare(&Value::from("abd")), Some(Ordering::Less));
        assert_eq!(Value::Int(1).compare(&Value::from("1")), None);
    }

    #[test]
    fn comparator_semantics() {
        let gold = Value::Int(150);
        assert!(Comparator::Ge.evaluate(&gold, &Value::Int(100)));
        assert!(!Comparator::Lt.evaluate(&gold, &Value::Int(100)));
        assert!(Comparator::Ne.evaluate(&gold, &Value::from("150")));
        assert!(!Comparator::Eq.evaluate(&gold, &Value::from("150")));
        assert!(!Comparator::Ge.evaluate(&gold, &Value::from("150")));
        assert_eq!(">=".parse::<Comparator>().unwrap(), Comparator::Ge);
        assert!(matches!(
            "=>".parse::<Comparator>(),
            Err(ExpressionError::UnknownComparator { .. })
        ));
    }

    #[test]
    fn addition_keeps_ints_integral() {
        assert_eq!(Value::Int(50).checked_add(&Value::Int(-100)), Some(Value::Int(-50)));
        assert_eq!(Value::Int(1).checked_add(&Value::Float(0.5)), Some(Value::Float(1.5)));
        assert_eq!(Value::from("x").checked_add(&Value::Int(1)), None);
    }

    #[test]
    fn numeric_fields_reject_text() {
        assert!(Value::parse_number("ten").is_err());
        assert_eq!(Value::parse_number("10").unwrap(), Value::Int(10));
    }

    #[test]
    fn untagged_serialization_round_trips() {
        let values = vec![Value::Int(3), Value::Float(2.5), Value::from("north")];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[3,2.5,"north"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
