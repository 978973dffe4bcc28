// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Field order of a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOrder {
    Ymd,
    Mdy,
    Dmy,
}

/// 24-hour or 12-hour (AM/PM) clock notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockStyle {
    H24,
    H12,
}

/// Decimal separator of a floating-point cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalSeparator {
    Dot,
    Comma,
}

/// The closed set of inferable cell types.
///
/// Variants are declared in importance order, from the most restrictive
/// (`Empty`) to the universal fallback (`Str`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeTag {
    #[serde(rename = "empty")]
    Empty,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float-dot")]
    FloatDot,
    #[serde(rename = "float-comma")]
    FloatComma,
    #[serde(rename = "date-YMD")]
    DateYmd,
    #[serde(rename = "date-MDY")]
    DateMdy,
    #[serde(rename = "date-DMY")]
    DateDmy,
    #[serde(rename = "time-24")]
    Time24,
    #[serde(rename = "time-12")]
    Time12,
    #[serde(rename = "datetime-24-YMD")]
    DateTime24Ymd,
    #[serde(rename = "datetime-12-MDY")]
    DateTime12Mdy,
    #[serde(rename = "datetime-24-DMY")]
    DateTime24Dmy,
    #[serde(rename = "str")]
    Str,
}

impl TypeTag {
    /// Every tag, lowest importance first.
    pub const ALL: [TypeTag; 14] = [
        TypeTag::Empty,
        TypeTag::Bool,
        TypeTag::Int,
        TypeTag::FloatDot,
        TypeTag::FloatComma,
        TypeTag::DateYmd,
        TypeTag::DateMdy,
        TypeTag::DateDmy,
        TypeTag::Time24,
        TypeTag::Time12,
        TypeTag::DateTime24Ymd,
        TypeTag::DateTime12Mdy,
        TypeTag::DateTime24Dmy,
        TypeTag::Str,
    ];

    /// Position in the importance ranking (0 = `empty`).
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Empty => "empty",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::FloatDot => "float-dot",
            TypeTag::FloatComma => "float-comma",
            TypeTag::DateYmd => "date-YMD",
            TypeTag::DateMdy => "date-MDY",
            TypeTag::DateDmy => "date-DMY",
            TypeTag::Time24 => "time-24",
            TypeTag::Time12 => "time-12",
            TypeTag::DateTime24Ymd => "datetime-24-YMD",
            TypeTag::DateTime12Mdy => "datetime-12-MDY",
            TypeTag::DateTime24Dmy => "datetime-24-DMY",
            TypeTag::Str => "str",
        }
    }

    /// Field order for the date-bearing tags.
    pub fn date_order(self) -> Option<DateOrder> {
        match self {
            TypeTag::DateYmd | TypeTag::DateTime24Ymd => Some(DateOrder::Ymd),
            TypeTag::DateMdy | TypeTag::DateTime12Mdy => Some(DateOrder::Mdy),
            TypeTag::DateDmy | TypeTag::DateTime24Dmy => Some(DateOrder::Dmy),
            _ => None,
        }
    }

    /// Clock notation for the time-bearing tags.
    pub fn clock(self) -> Option<ClockStyle> {
        match self {
            TypeTag::Time24 | TypeTag::DateTime24Ymd | TypeTag::DateTime24Dmy => {
                Some(ClockStyle::H24)
            }
            TypeTag::Time12 | TypeTag::DateTime12Mdy => Some(ClockStyle::H12),
            _ => None,
        }
    }

    pub fn decimal_separator(self) -> Option<DecimalSeparator> {
        match self {
            TypeTag::FloatDot => Some(DecimalSeparator::Dot),
            TypeTag::FloatComma => Some(DecimalSeparator::Comma),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown type tag `{}`", s))
    }
}

/// Inferred shape of one CSV column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct ColumnStructure {
    pub ordinal: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeTag,
    pub nullable: bool,
    /// Longest sampled cell in characters; only reported for `str` columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    pub null_count: usize,
    pub sampled: usize,
}

impl ColumnStructure {
    pub fn new(ordinal: usize, name: impl Into<String>) -> Self {
        Self {
            ordinal,
            name: name.into(),
            ty: TypeTag::Empty,
            nullable: false,
            max_length: None,
            null_count: 0,
            sampled: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_their_names() {
        for tag in TypeTag::ALL {
            assert_eq!(tag.as_str().parse::<TypeTag>().unwrap(), tag);
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag));
        }
        assert!("float".parse::<TypeTag>().is_err());
    }

    #[test]
    fn rank_follows_declaration_order() {
        for (i, tag) in TypeTag::ALL.iter().enumerate() {
            assert_eq!(tag.rank(), i);
        }
        assert_eq!(TypeTag::Str.rank(), TypeTag::ALL.len() - 1);
    }

    #[test]
    fn tag_suffixes_decompose() {
        assert_eq!(TypeTag::DateTime12Mdy.date_order(), Some(DateOrder::Mdy));
        assert_eq!(TypeTag::DateTime12Mdy.clock(), Some(ClockStyle::H12));
        assert_eq!(TypeTag::DateDmy.clock(), None);
        assert_eq!(
            TypeTag::FloatComma.decimal_separator(),
            Some(DecimalSeparator::Comma)
        );
        assert_eq!(TypeTag::Int.decimal_separator(), None);
    }
}
