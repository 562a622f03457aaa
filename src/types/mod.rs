//! Classify native types and host arrays.
//!
//! Every type that can be converted to or from an [`MxArray`] has a [`TypeCategory`], exposed as
//! the associated constant of [`IntoMx`] and [`FromMx`]. The category decides which shape of host
//! array is allocated when a value is converted, and how its elements are read back:
//!
//! | Native type                                    | Category             |
//! |------------------------------------------------|----------------------|
//! | `i8` .. `u64`, `isize`, `usize`, `f32`, `f64`  | `Numeric`            |
//! | `bool`                                         | `Logical`            |
//! | `char`                                         | `Character`          |
//! | `Complex<f32>`, `Complex<f64>`                 | `Complex`            |
//! | `Vec<T>`, `[T]` with a numeric `T`             | `NumericContainer`   |
//! | `Vec<T>`, `[T]` with a complex `T`             | `ComplexContainer`   |
//! | `Vec<bool>`, `[bool]`                          | `LogicalContainer`   |
//! | `String`, `str`, `Vec<char>`                   | `CharacterContainer` |
//! | `Vec<T>`, `[T]` with any other `T`             | `NestedContainer`    |
//! | everything else                                | `Record`             |
//!
//! The element kinds of the host are described by [`ClassId`]; a single element read from an
//! array is widened to a [`Sample`] before it is cast to the requested type.
//!
//! [`MxArray`]: crate::array::MxArray
//! [`IntoMx`]: crate::convert::into_mx::IntoMx
//! [`FromMx`]: crate::convert::from_mx::FromMx

pub mod class;
pub mod sample;

pub use class::{ClassId, Primitive};
pub use sample::Sample;

/// The array shape a native type is marshalled as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Numeric,
    Logical,
    Character,
    Complex,
    NumericContainer,
    ComplexContainer,
    CharacterContainer,
    LogicalContainer,
    NestedContainer,
    Record,
}

impl TypeCategory {
    /// Returns `true` if values of this category occupy a single element of a host array.
    #[inline]
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            TypeCategory::Numeric
                | TypeCategory::Logical
                | TypeCategory::Character
                | TypeCategory::Complex
        )
    }

    /// Returns `true` if this is one of the container categories.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            TypeCategory::NumericContainer
                | TypeCategory::ComplexContainer
                | TypeCategory::CharacterContainer
                | TypeCategory::LogicalContainer
                | TypeCategory::NestedContainer
        )
    }

    /// The category of a sequence whose elements have category `self`.
    #[inline]
    pub const fn container(self) -> Self {
        match self {
            TypeCategory::Numeric => TypeCategory::NumericContainer,
            TypeCategory::Complex => TypeCategory::ComplexContainer,
            TypeCategory::Character => TypeCategory::CharacterContainer,
            TypeCategory::Logical => TypeCategory::LogicalContainer,
            _ => TypeCategory::NestedContainer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeCategory;

    #[test]
    fn sequences_of_scalars_are_flat() {
        assert_eq!(
            TypeCategory::Numeric.container(),
            TypeCategory::NumericContainer
        );
        assert_eq!(
            TypeCategory::Character.container(),
            TypeCategory::CharacterContainer
        );
        assert_eq!(
            TypeCategory::Logical.container(),
            TypeCategory::LogicalContainer
        );
        assert_eq!(
            TypeCategory::Complex.container(),
            TypeCategory::ComplexContainer
        );
    }

    #[test]
    fn sequences_of_anything_else_are_nested() {
        assert_eq!(
            TypeCategory::NumericContainer.container(),
            TypeCategory::NestedContainer
        );
        assert_eq!(
            TypeCategory::Record.container(),
            TypeCategory::NestedContainer
        );
        assert!(!TypeCategory::Record.is_scalar());
        assert!(TypeCategory::NestedContainer.is_container());
    }
}
