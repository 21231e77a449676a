//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two instances holding the same values are
/// the same value. They are immutable; "changing" one means building a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// struct UnitPrice(i64);
///
/// impl ValueObject for UnitPrice {}
///
/// assert_eq!(UnitPrice(5000), UnitPrice(5000));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
