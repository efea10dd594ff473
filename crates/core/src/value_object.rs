//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Service
/// identifiers and the network configuration bag are value objects: two
/// instances holding the same fields are interchangeable.
///
/// The trait requires:
/// - **Clone**: values are copied, never shared mutably
/// - **PartialEq**: compared by attribute values
/// - **Debug**: printable in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
