// src/schema/lattice.rs

use super::types::TypeTag;

/// The tag `tag` widens into without losing information, if any.
///
/// `int` widens into both float styles, so it is handled in [`covers`].
fn parent(tag: TypeTag) -> Option<TypeTag> {
    match tag {
        TypeTag::DateYmd => Some(TypeTag::DateTime24Ymd),
        TypeTag::DateMdy => Some(TypeTag::DateTime12Mdy),
        TypeTag::DateDmy => Some(TypeTag::DateTime24Dmy),
        _ => None,
    }
}

/// Whether every cell of type `lower` is representable as `upper`.
pub fn covers(upper: TypeTag, lower: TypeTag) -> bool {
    upper == lower
        || lower == TypeTag::Empty
        || upper == TypeTag::Str
        || parent(lower) == Some(upper)
        || (lower == TypeTag::Int && upper.decimal_separator().is_some())
}

/// Least tag able to represent both `a` and `b`.
///
/// Comparable tags resolve to the one with the higher importance rank;
/// unrelated families (say `int` and `date-YMD`) fall back to `str`.
pub fn join(a: TypeTag, b: TypeTag) -> TypeTag {
    let (low, high) = if a.rank() <= b.rank() { (a, b) } else { (b, a) };
    if covers(high, low) {
        high
    } else {
        TypeTag::Str
    }
}
