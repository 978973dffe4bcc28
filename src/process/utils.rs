use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::types::DecimalSeparator;

static INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));
static FLOAT_DOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:(?:\d+\.\d*|\.\d+)(?:[eE][+-]?\d+)?|\d+[eE][+-]?\d+)$")
        .expect("valid regex")
});
static FLOAT_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+,\d*|,\d+)(?:[eE][+-]?\d+)?$").expect("valid regex")
});

/// Exactly `true` / `false`, any letter case.
pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Plain signed integer without fraction or exponent that fits in `i64`.
pub fn parse_int(s: &str) -> Option<i64> {
    if !INT.is_match(s) {
        return None;
    }
    s.parse().ok()
}

/// Decimal number written with the given separator.
///
/// Requires the separator (or an exponent for dot style) to be present, so
/// plain integers never parse here. Non-finite results are rejected.
pub fn parse_float(s: &str, sep: DecimalSeparator) -> Option<f64> {
    let v: f64 = match sep {
        DecimalSeparator::Dot => {
            if !FLOAT_DOT.is_match(s) {
                return None;
            }
            s.parse().ok()?
        }
        DecimalSeparator::Comma => {
            if !FLOAT_COMMA.is_match(s) {
                return None;
            }
            s.replacen(',', ".", 1).parse().ok()?
        }
    };
    v.is_finite().then_some(v)
}

/// Backslash-escape embedded double quotes for textual bulk loaders.
pub fn escape_quotes(raw: &str) -> String {
    raw.replace('"', "\\\"")
}
