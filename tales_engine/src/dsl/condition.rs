use super::{expect_fields, name_field, quantity_field, split_fields, unwrap_braced};
use crate::error::ExpressionError;
use crate::game_state::GameState;
use crate::value::{Comparator, Value};
use std::fmt;
use std::rc::Rc;

/// Host-side check embedded through [`Condition::custom`].
pub type Predicate = Rc<dyn Fn(&GameState) -> bool>;

/// A resolved condition expression.
#[derive(Clone)]
pub enum Condition {
    Always,
    Never,
    HasItem {
        item: String,
        min: u32,
    },
    CheckStat {
        name: String,
        comparator: Comparator,
        value: Value,
    },
    CheckVar {
        name: String,
        comparator: Comparator,
        value: Value,
    },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Custom {
        name: String,
        check: Predicate,
    },
}

impl Condition {
    /// Resolve condition text. Empty text is always true.
    ///
    /// # Errors
    /// Unknown keywords, missing or surplus fields, bad quantities and bad
    /// comparators are reported as [`ExpressionError`]s.
    pub fn parse(raw: &str) -> Result<Self, ExpressionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Condition::Always);
        }
        let fields = split_fields(raw)?;
        match fields[0] {
            "true" => {
                expect_fields(&fields, 1, 1)?;
                Ok(Condition::Always)
            },
            "false" => {
                expect_fields(&fields, 1, 1)?;
                Ok(Condition::Never)
            },
            "has_item" => {
                expect_fields(&fields, 2, 3)?;
                Ok(Condition::HasItem {
                    item: name_field(&fields, 1)?.to_string(),
                    min: quantity_field(&fields, 2)?,
                })
            },
            "check_stat" => {
                let (name, comparator, value) = comparison(&fields)?;
                Ok(Condition::CheckStat { name, comparator, value })
            },
            "check_var" => {
                let (name, comparator, value) = comparison(&fields)?;
                Ok(Condition::CheckVar { name, comparator, value })
            },
            "and" => Ok(Condition::All(sub_conditions(&fields)?)),
            "or" => Ok(Condition::Any(sub_conditions(&fields)?)),
            "not" => {
                expect_fields(&fields, 2, 2)?;
                let inner = Condition::parse(unwrap_braced(fields[1])?)?;
                Ok(Condition::Not(Box::new(inner)))
            },
            other => Err(ExpressionError::UnknownKind {
                what: "condition",
                kind: other.to_string(),
            }),
        }
    }

    /// Wrap a host predicate. Not reachable from script text.
    pub fn custom(name: impl Into<String>, check: impl Fn(&GameState) -> bool + 'static) -> Self {
        Condition::Custom {
            name: name.into(),
            check: Rc::new(check),
        }
    }

    pub fn is_met(&self, state: &GameState) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::HasItem { item, min } => state.has_item(item, *min),
            Condition::CheckStat {
                name,
                comparator,
                value,
            } => state.check_stat(name, *comparator, value),
            Condition::CheckVar {
                name,
                comparator,
                value,
            } => state.check_var(name, *comparator, value),
            Condition::All(conditions) => conditions.iter().all(|c| c.is_met(state)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.is_met(state)),
            Condition::Not(inner) => !inner.is_met(state),
            Condition::Custom { check, .. } => check(state),
        }
    }
}

/// `name:value` (equality) or `name:cmp:value`.
fn comparison(fields: &[&str]) -> Result<(String, Comparator, Value), ExpressionError> {
    expect_fields(fields, 3, 4)?;
    let name = name_field(fields, 1)?.to_string();
    if fields.len() == 3 {
        return Ok((name, Comparator::Eq, Value::parse(fields[2])));
    }
    let comparator = fields[2].parse()?;
    Ok((name, comparator, Value::parse(fields[3])))
}

fn sub_conditions(fields: &[&str]) -> Result<Vec<Condition>, ExpressionError> {
    expect_fields(fields, 2, usize::MAX)?;
    fields[1..]
        .iter()
        .map(|field| Condition::parse(unwrap_braced(field)?))
        .collect()
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => f.write_str("true"),
            Condition::Never => f.write_str("false"),
            Condition::HasItem { item, min } => write!(f, "has_item:{item}:{min}"),
            Condition::CheckStat {
                name,
                comparator,
                value,
            } => write!(f, "check_stat:{name}:{comparator}:{value}"),
            Condition::CheckVar {
                name,
                comparator,
                value,
            } => write!(f, "check_var:{name}:{comparator}:{value}"),
            Condition::All(parts) => write_joined(f, "and", parts),
            Condition::Any(parts) => write_joined(f, "or", parts),
            Condition::Not(inner) => write!(f, "not:{{{inner}}}"),
            Condition::Custom { name, .. } => write!(f, "custom:{name}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, kind: &str, parts: &[Condition]) -> fmt::Result {
    f.write_str(kind)?;
    for part in parts {
        write!(f, ":{{{part}}}")?;
    }
    Ok(())
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({self})")
    }
}
