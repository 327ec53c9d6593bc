//! Safe column tokens for taxonomy labels.
//!
//! Category and channel labels are free text. Pivot columns need aliases
//! that can sit inside a quoted SQL identifier, so each label is reduced to
//! lowercase alphanumerics joined by `_`. Tokens are only ever mapped back
//! to labels by position; they are not decodable on their own.

use std::collections::HashSet;

/// Base token for labels with nothing encodable left after stripping.
const FALLBACK_TOKEN: &str = "unassigned";

/// Reduces `label` to lowercase alphanumerics, replacing every run of other
/// characters with a single `_` and trimming leading/trailing `_`.
///
/// Returns an empty string if `label` has no alphanumeric characters.
#[must_use]
pub fn encode_value(label: &str) -> String {
    let mut token = String::with_capacity(label.len());
    let mut pending_separator = false;

    for c in label.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !token.is_empty() {
                token.push('_');
            }
            pending_separator = false;
            token.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    token
}

/// Encodes each label, preserving order and length.
///
/// Labels that encode to nothing get the `unassigned` base, and repeated
/// tokens get `_2`, `_3`, ... suffixes, so the result is pairwise distinct
/// for any input.
#[must_use]
pub fn encode_column_names<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(labels.len());

    labels
        .iter()
        .map(|label| {
            let mut base = encode_value(label.as_ref());
            if base.is_empty() {
                base = FALLBACK_TOKEN.to_string();
            }

            let mut token = base.clone();
            let mut suffix = 2;
            while !seen.insert(token.clone()) {
                token = format!("{base}_{suffix}");
                suffix += 1;
            }
            token
        })
        .collect()
}

/// Whether `label` keeps at least one character after encoding.
#[must_use]
pub fn is_encodable(label: &str) -> bool {
    label.chars().any(char::is_alphanumeric)
}
