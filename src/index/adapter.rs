//! Building number normalization

/// Canonical matching key for a raw model-side building number.
///
/// Strips leading zeros: `"0042"` becomes `"42"` and `"000"` becomes `""`.
pub fn canonical_key(raw: &str) -> String {
    raw.trim_start_matches('0').to_string()
}
