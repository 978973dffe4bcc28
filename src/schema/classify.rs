// src/schema/classify.rs

use crate::process::date_parser::{parse_date, parse_datetime, parse_time};
use crate::process::utils::{parse_bool, parse_float, parse_int};

use super::types::{ClockStyle, DateOrder, DecimalSeparator, TypeTag};

/// Most specific tag for a single raw cell. First match wins:
/// empty, bool, int, float, date, time, datetime, then `str`.
///
/// Uses the same parsers as coercion, so any cell classified as `T` can be
/// coerced by `T`'s rule.
pub fn classify(cell: &str) -> TypeTag {
    if cell.is_empty() {
        return TypeTag::Empty;
    }
    if parse_bool(cell).is_some() {
        return TypeTag::Bool;
    }
    if parse_int(cell).is_some() {
        return TypeTag::Int;
    }
    if parse_float(cell, DecimalSeparator::Dot).is_some() {
        return TypeTag::FloatDot;
    }
    if parse_float(cell, DecimalSeparator::Comma).is_some() {
        return TypeTag::FloatComma;
    }
    // starts with a digit: everything below is date/time shaped
    if !cell.starts_with(|c: char| c.is_ascii_digit()) {
        return TypeTag::Str;
    }
    for (order, tag) in [
        (DateOrder::Ymd, TypeTag::DateYmd),
        (DateOrder::Mdy, TypeTag::DateMdy),
        (DateOrder::Dmy, TypeTag::DateDmy),
    ] {
        if parse_date(cell, order).is_some() {
            return tag;
        }
    }
    for (clock, tag) in [
        (ClockStyle::H24, TypeTag::Time24),
        (ClockStyle::H12, TypeTag::Time12),
    ] {
        if parse_time(cell, clock).is_some() {
            return tag;
        }
    }
    for (clock, order, tag) in [
        (ClockStyle::H24, DateOrder::Ymd, TypeTag::DateTime24Ymd),
        (ClockStyle::H12, DateOrder::Mdy, TypeTag::DateTime12Mdy),
        (ClockStyle::H24, DateOrder::Dmy, TypeTag::DateTime24Dmy),
    ] {
        if parse_datetime(cell, clock, order).is_some() {
            return tag;
        }
    }
    TypeTag::Str
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::convert::coerce_cell;

    #[test]
    fn classifies_each_shape() {
        let cases = [
            ("", TypeTag::Empty),
            ("true", TypeTag::Bool),
            ("FALSE", TypeTag::Bool),
            ("123", TypeTag::Int),
            ("-0", TypeTag::Int),
            ("123.45", TypeTag::FloatDot),
            ("6.02e23", TypeTag::FloatDot),
            ("123,45", TypeTag::FloatComma),
            ("2021-05-01", TypeTag::DateYmd),
            ("2021/05/01", TypeTag::DateYmd),
            ("05/01/2021", TypeTag::DateMdy),
            ("01.05.2021", TypeTag::DateDmy),
            ("01-05-2021", TypeTag::DateDmy),
            ("18:02", TypeTag::Time24),
            ("18:02:37.5", TypeTag::Time24),
            ("6:02 PM", TypeTag::Time12),
            ("2021-05-01T18:02:37", TypeTag::DateTime24Ymd),
            ("2021-05-01 18:02", TypeTag::DateTime24Ymd),
            ("05/01/2021 6:02:37 AM", TypeTag::DateTime12Mdy),
            ("01.05.2021 18:02:37", TypeTag::DateTime24Dmy),
            ("Ann", TypeTag::Str),
            ("1,234.5", TypeTag::Str),
            ("2021-02-30", TypeTag::Str),
            ("05/01/2021 18:02", TypeTag::Str),
            ("99999999999999999999", TypeTag::Str),
            (" 12", TypeTag::Str),
        ];
        for (cell, expected) in cases {
            assert_eq!(classify(cell), expected, "cell {:?}", cell);
        }
    }

    #[test]
    fn slash_dates_are_month_first_regardless_of_value() {
        // 03/04 could be either; the shape says month-first
        assert_eq!(classify("03/04/2021"), TypeTag::DateMdy);
        // a day above 12 in the first slot is not re-read as day-first
        assert_eq!(classify("13/04/2021"), TypeTag::Str);
    }

    #[test]
    fn classified_cells_coerce_under_their_tag() {
        let cells = [
            "true",
            "42",
            "0.25",
            "0,25",
            "2021-12-31",
            "12/31/2021",
            "31-12-2021",
            "23:59:59",
            "11:59 pm",
            "2021-12-31T23:59:59.999",
            "12/31/2021 11:59:59 PM",
            "31.12.2021 23:59",
            "free text",
        ];
        for cell in cells {
            let tag = classify(cell);
            assert!(
                coerce_cell(cell, tag).is_some(),
                "{:?} classified as {} but does not coerce",
                cell,
                tag
            );
        }
    }

    #[test]
    fn classification_is_deterministic() {
        for cell in ["1", "1.5", "2021-01-01", "x"] {
            assert_eq!(classify(cell), classify(cell));
        }
    }
}
