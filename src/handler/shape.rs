//! Structural kinds of handler argument and return types.
//!
//! # Responsibilities
//! - Classify a Rust type as aggregate, pointer, sequence, primitive, map or unit
//! - Let registration code read that classification off the type, at the call site
//!
//! # Design Decisions
//! - Kinds are associated constants, so no runtime inspection is needed
//! - Record-like request/response types opt in through [`aggregate!`](crate::aggregate)
//! - `Option<T>`, `Box<T>` and `Arc<T>` are pointers; a pointer remembers
//!   whether it points at an aggregate

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// What a pointer-like type points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointee {
    Aggregate,
    Other,
}

/// Structural kind of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `()`; a handler returning it produces no payload.
    Unit,
    /// Scalars and strings.
    Primitive,
    /// A record with named fields.
    Aggregate,
    /// `Vec<T>` and friends.
    Sequence,
    /// Keyed collections.
    Map,
    /// `Option<T>`, `Box<T>`, `Arc<T>`.
    Pointer(Pointee),
}

impl ValueKind {
    /// Kind of a pointer to a value of kind `inner`.
    ///
    /// Pointers collapse: `Option<Box<T>>` is a pointer to whatever `T` is.
    pub const fn pointer_to(inner: ValueKind) -> ValueKind {
        match inner {
            ValueKind::Aggregate | ValueKind::Pointer(Pointee::Aggregate) => {
                ValueKind::Pointer(Pointee::Aggregate)
            }
            _ => ValueKind::Pointer(Pointee::Other),
        }
    }

    /// True for record-like values.
    pub fn is_aggregate(self) -> bool {
        self == ValueKind::Aggregate
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Unit => f.write_str("unit"),
            ValueKind::Primitive => f.write_str("primitive"),
            ValueKind::Aggregate => f.write_str("struct"),
            ValueKind::Sequence => f.write_str("sequence"),
            ValueKind::Map => f.write_str("map"),
            ValueKind::Pointer(Pointee::Aggregate) => f.write_str("pointer to struct"),
            ValueKind::Pointer(Pointee::Other) => f.write_str("pointer"),
        }
    }
}

/// A type whose structural kind is known at compile time.
pub trait Shape {
    const KIND: ValueKind;
}

/// Marks record-like types as aggregates.
///
/// ```rust,ignore
/// #[derive(Default, Serialize, Deserialize)]
/// struct GetUserRequest { user_name: String }
///
/// server_runner::aggregate!(GetUserRequest);
/// ```
#[macro_export]
macro_rules! aggregate {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::handler::Shape for $ty {
                const KIND: $crate::handler::ValueKind = $crate::handler::ValueKind::Aggregate;
            }
        )+
    };
}

macro_rules! impl_kind {
    ($kind:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl Shape for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }
        )+
    };
}

impl_kind!(Unit => ());
impl_kind!(
    Primitive => bool, char, String, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64,
);

impl<T> Shape for Vec<T> {
    const KIND: ValueKind = ValueKind::Sequence;
}

impl<T> Shape for VecDeque<T> {
    const KIND: ValueKind = ValueKind::Sequence;
}

impl<T> Shape for BTreeSet<T> {
    const KIND: ValueKind = ValueKind::Sequence;
}

impl<T, S> Shape for HashSet<T, S> {
    const KIND: ValueKind = ValueKind::Sequence;
}

impl<K, V> Shape for BTreeMap<K, V> {
    const KIND: ValueKind = ValueKind::Map;
}

impl<K, V, S> Shape for HashMap<K, V, S> {
    const KIND: ValueKind = ValueKind::Map;
}

impl<T: Shape> Shape for Option<T> {
    const KIND: ValueKind = ValueKind::pointer_to(T::KIND);
}

impl<T: Shape> Shape for Box<T> {
    const KIND: ValueKind = ValueKind::pointer_to(T::KIND);
}

impl<T: Shape> Shape for Arc<T> {
    const KIND: ValueKind = ValueKind::pointer_to(T::KIND);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record;
    crate::aggregate!(Record);

    #[test]
    fn test_pointer_kinds() {
        assert_eq!(<Box<Record>>::KIND, ValueKind::Pointer(Pointee::Aggregate));
        assert_eq!(<Option<Box<Record>>>::KIND, ValueKind::Pointer(Pointee::Aggregate));
        assert_eq!(<Option<String>>::KIND, ValueKind::Pointer(Pointee::Other));
        assert_eq!(<Arc<Vec<u8>>>::KIND, ValueKind::Pointer(Pointee::Other));
    }

    #[test]
    fn test_collection_kinds() {
        assert_eq!(<Vec<Record>>::KIND, ValueKind::Sequence);
        assert_eq!(<HashMap<String, u32>>::KIND, ValueKind::Map);
        assert_eq!(<()>::KIND, ValueKind::Unit);
        assert!(Record::KIND.is_aggregate());
    }
}
