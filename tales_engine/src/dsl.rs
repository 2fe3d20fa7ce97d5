//! Condition and effect expressions.
//!
//! Both languages are colon-delimited: a leading keyword followed by fields.
//! Combinators take brace-wrapped sub-expressions, e.g.
//! `and:{has_item:Key}:{check_stat:gold:>=:10}`, so colons inside a
//! sub-expression stay with it.

pub mod condition;
pub mod effect;

pub use condition::{Condition, Predicate};
pub use effect::{Effect, EffectFn, EffectOutcome};

use crate::error::ExpressionError;

/// Split on `:` at brace depth zero, trimming each field.
pub(crate) fn split_fields(raw: &str) -> Result<Vec<&str>, ExpressionError> {
    let unbalanced = || ExpressionError::UnbalancedBraces { expr: raw.to_string() };
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.checked_sub(1).ok_or_else(unbalanced)?,
            ':' if depth == 0 => {
                fields.push(raw[start..idx].trim());
                start = idx + 1;
            },
            _ => {},
        }
    }
    if depth != 0 {
        return Err(unbalanced());
    }
    fields.push(raw[start..].trim());
    Ok(fields)
}

/// Strip the braces from a `{...}` field.
pub(crate) fn unwrap_braced(field: &str) -> Result<&str, ExpressionError> {
    field
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .map(str::trim)
        .ok_or_else(|| ExpressionError::ExpectedBraced { found: field.to_string() })
}

/// Check the field count of `kind:<fields>` against `min..=max`.
pub(crate) fn expect_fields(fields: &[&str], min: usize, max: usize) -> Result<(), ExpressionError> {
    let kind = fields.first().copied().unwrap_or_default().to_string();
    if fields.len() < min {
        return Err(ExpressionError::MissingField {
            kind,
            expected: min - 1,
            found: fields.len().saturating_sub(1),
        });
    }
    if fields.len() > max {
        return Err(ExpressionError::TooManyFields {
            kind,
            max: max - 1,
            found: fields.len() - 1,
        });
    }
    Ok(())
}

/// Non-empty name field.
pub(crate) fn name_field<'a>(fields: &[&'a str], idx: usize) -> Result<&'a str, ExpressionError> {
    match fields.get(idx) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ExpressionError::EmptyName {
            kind: fields.first().copied().unwrap_or_default().to_string(),
        }),
    }
}

/// Optional quantity field, defaulting to one.
pub(crate) fn quantity_field(fields: &[&str], idx: usize) -> Result<u32, ExpressionError> {
    match fields.get(idx) {
        None => Ok(1),
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ExpressionError::InvalidQuantity { value: (*raw).to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_split_at_top_level_only() {
        assert_eq!(
            split_fields("and:{has_item:Key}: {check_stat:gold:>:1} ").unwrap(),
            vec!["and", "{has_item:Key}", "{check_stat:gold:>:1}"]
        );
        assert_eq!(split_fields("add_item: Healing Potion ").unwrap(), vec!["add_item", "Healing Potion"]);
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        assert!(matches!(split_fields("not:{x"), Err(ExpressionError::UnbalancedBraces { .. })));
        assert!(matches!(split_fields("not:x}"), Err(ExpressionError::UnbalancedBraces { .. })));
    }

    #[test]
    fn braced_fields() {
        assert_eq!(unwrap_braced("{ has_item:Key }").unwrap(), "has_item:Key");
        assert!(unwrap_braced("has_item").is_err());
    }

    #[test]
    fn quantities_default_to_one() {
        assert_eq!(quantity_field(&["add_item", "Key"], 2).unwrap(), 1);
        assert_eq!(quantity_field(&["add_item", "Key", "3"], 2).unwrap(), 3);
        assert!(quantity_field(&["add_item", "Key", "-3"], 2).is_err());
    }
}
