//! `COL OP VALUE` filter expressions for `-w/--where`

use anyhow::{bail, Result};
use quire::{Cell, Filter, Operator};

const WORD_OPERATORS: [&str; 2] = ["contains", "like"];
const SYMBOL_OPERATORS: [&str; 7] = ["==", "!=", ">=", "<=", "=", ">", "<"];

/// Parses `Age >= 30`, `Name contains li`, `Status="on hold"`.
///
/// Word operators need whitespace on both sides. The value is kept as
/// text; surrounding single or double quotes are stripped.
pub fn parse_filter(expr: &str) -> Result<Filter> {
    let Some((start, op)) = find_operator(expr) else {
        bail!("no operator in `{}` (expected COL OP VALUE)", expr);
    };

    let column = expr[..start].trim();
    let value = expr[start + op.len()..].trim();
    if column.is_empty() {
        bail!("missing column in `{}`", expr);
    }

    Ok(Filter::new(
        column,
        Operator::from(op),
        Cell::text(unquote(value)),
    ))
}

/// Leftmost operator: `(byte offset, operator)`.
fn find_operator(expr: &str) -> Option<(usize, &'static str)> {
    let symbol = expr.char_indices().find_map(|(i, _)| {
        SYMBOL_OPERATORS
            .iter()
            .find(|op| expr[i..].starts_with(**op))
            .map(|op| (i, *op))
    });

    let word = WORD_OPERATORS
        .iter()
        .filter_map(|op| find_word(expr, op).map(|i| (i, *op)))
        .min_by_key(|(i, _)| *i);

    match (symbol, word) {
        (Some(s), Some(w)) => Some(if w.0 < s.0 { w } else { s }),
        (s, w) => s.or(w),
    }
}

/// Offset of `word` where it stands alone between whitespace.
fn find_word(expr: &str, word: &str) -> Option<usize> {
    expr.match_indices(word).map(|(i, _)| i).find(|&i| {
        let before = expr[..i].chars().next_back();
        let after = expr[i + word.len()..].chars().next();
        matches!(before, Some(c) if c.is_whitespace()) && matches!(after, Some(c) if c.is_whitespace())
    })
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
