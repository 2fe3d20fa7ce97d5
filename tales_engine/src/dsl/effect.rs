use super::{expect_fields, name_field, quantity_field, split_fields, unwrap_braced};
use crate::error::ExpressionError;
use crate::game_state::GameState;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Host-side mutation embedded through [`Effect::custom`].
pub type EffectFn = Rc<dyn Fn(&mut GameState) -> EffectOutcome>;

/// Whether applying an effect changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    Applied,
    NotApplied,
}

impl EffectOutcome {
    pub fn applied(self) -> bool {
        self == EffectOutcome::Applied
    }
}

impl From<bool> for EffectOutcome {
    fn from(applied: bool) -> Self {
        if applied {
            EffectOutcome::Applied
        } else {
            EffectOutcome::NotApplied
        }
    }
}

/// A resolved effect expression.
#[derive(Clone)]
pub enum Effect {
    AddItem { item: String, quantity: u32 },
    RemoveItem { item: String, quantity: u32 },
    SetStat { name: String, value: Value },
    AddStat { name: String, delta: Value },
    SetVar { name: String, value: Value },
    Compound(Vec<Effect>),
    Custom { name: String, apply: EffectFn },
}

impl Effect {
    /// Resolve effect text.
    ///
    /// # Errors
    /// Empty text, unknown keywords, missing fields and non-numeric deltas
    /// are reported as [`ExpressionError`]s.
    pub fn parse(raw: &str) -> Result<Self, ExpressionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ExpressionError::Empty { what: "effect" });
        }
        let fields = split_fields(raw)?;
        match fields[0] {
            "add_item" => {
                expect_fields(&fields, 2, 3)?;
                Ok(Effect::AddItem {
                    item: name_field(&fields, 1)?.to_string(),
                    quantity: quantity_field(&fields, 2)?,
                })
            },
            "remove_item" => {
                expect_fields(&fields, 2, 3)?;
                Ok(Effect::RemoveItem {
                    item: name_field(&fields, 1)?.to_string(),
                    quantity: quantity_field(&fields, 2)?,
                })
            },
            "set_stat" => {
                expect_fields(&fields, 3, 3)?;
                Ok(Effect::SetStat {
                    name: name_field(&fields, 1)?.to_string(),
                    value: Value::parse(fields[2]),
                })
            },
            "add_stat" => {
                expect_fields(&fields, 3, 3)?;
                Ok(Effect::AddStat {
                    name: name_field(&fields, 1)?.to_string(),
                    delta: Value::parse_number(fields[2])?,
                })
            },
            "set_var" => {
                expect_fields(&fields, 3, 3)?;
                Ok(Effect::SetVar {
                    name: name_field(&fields, 1)?.to_string(),
                    value: Value::parse(fields[2]),
                })
            },
            "compound" => {
                expect_fields(&fields, 2, usize::MAX)?;
                let parts = fields[1..]
                    .iter()
                    .map(|field| Effect::parse(unwrap_braced(field)?))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Effect::Compound(parts))
            },
            other => Err(ExpressionError::UnknownKind {
                what: "effect",
                kind: other.to_string(),
            }),
        }
    }

    /// Wrap a host function. Not reachable from script text.
    pub fn custom(name: impl Into<String>, apply: impl Fn(&mut GameState) -> EffectOutcome + 'static) -> Self {
        Effect::Custom {
            name: name.into(),
            apply: Rc::new(apply),
        }
    }

    pub fn apply(&self, state: &mut GameState) -> EffectOutcome {
        match self {
            Effect::AddItem { item, quantity } => {
                state.add_item(item, *quantity);
                EffectOutcome::Applied
            },
            Effect::RemoveItem { item, quantity } => state.remove_item(item, *quantity).into(),
            Effect::SetStat { name, value } => {
                state.set_stat(name, value.clone());
                EffectOutcome::Applied
            },
            Effect::AddStat { name, delta } => state.increment_stat(name, delta).into(),
            Effect::SetVar { name, value } => {
                state.set_var(name, value.clone());
                EffectOutcome::Applied
            },
            Effect::Compound(parts) => {
                let mut outcome = EffectOutcome::Applied;
                for part in parts {
                    if !part.apply(state).applied() {
                        outcome = EffectOutcome::NotApplied;
                    }
                }
                outcome
            },
            Effect::Custom { apply, .. } => apply(state),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::AddItem { item, quantity } => write!(f, "add_item:{item}:{quantity}"),
            Effect::RemoveItem { item, quantity } => write!(f, "remove_item:{item}:{quantity}"),
            Effect::SetStat { name, value } => write!(f, "set_stat:{name}:{value}"),
            Effect::AddStat { name, delta } => write!(f, "add_stat:{name}:{delta}"),
            Effect::SetVar { name, value } => write!(f, "set_var:{name}:{value}"),
            Effect::Compound(parts) => {
                f.write_str("compound")?;
                for part in parts {
                    write!(f, ":{{{part}}}")?;
                }
                Ok(())
            },
            Effect::Custom { name, .. } => write!(f, "custom:{name}"),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Effect({self})")
    }
}
