//! Value Compilation
//!
//! Rules run in order on the substituted string, first match wins:
//! 1. exactly one `var(--x)` lookup: unchanged
//! 2. bare number: append `BASE_UNIT`
//! 3. contains an arithmetic operator: wrap in `calc()`
//! 4. anything else: unchanged
//!
//! Rule 1 must precede rule 3, variable names contain `-`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::TokenError;
use crate::resolver::Resolver;
use crate::tokens::TokenValue;

pub const BASE_UNIT: &str = "px";

lazy_static! {
    static ref SINGLE_LOOKUP_RE: Regex = Regex::new(r"^\s*var\(--[A-Za-z0-9_-]+\)\s*$").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"^\s*[0-9]+(\.[0-9]+)?\s*$").unwrap();
    static ref OPERATOR_RE: Regex = Regex::new(r"[+\-*/]").unwrap();
}

/// Compile a string whose references have already been substituted.
pub fn compile_expression(substituted: &str) -> String {
    if SINGLE_LOOKUP_RE.is_match(substituted) {
        substituted.trim().to_string()
    } else if NUMBER_RE.is_match(substituted) {
        format!("{}{}", substituted.trim(), BASE_UNIT)
    } else if OPERATOR_RE.is_match(substituted) {
        format!("calc({substituted})")
    } else {
        substituted.to_string()
    }
}

/// Compile a leaf value into its stylesheet expression.
pub fn compile_value(
    value: &TokenValue,
    resolver: &Resolver<'_>,
    context: &str,
) -> Result<String, TokenError> {
    match value {
        TokenValue::Scalar(raw) => Ok(raw.clone()),
        TokenValue::Text(text) => Ok(compile_expression(&resolver.substitute(text, context)?)),
    }
}
