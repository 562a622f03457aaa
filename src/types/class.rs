//! Element kinds of host arrays.

use std::fmt;

use mex_sys::mxClassID;

/// The runtime class of a host array.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassId {
    Unknown,
    Cell,
    Struct,
    Logical,
    Char,
    Void,
    Double,
    Single,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Function,
}

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "64")] {
        const POINTER_SIGNED: ClassId = ClassId::Int64;
        const POINTER_UNSIGNED: ClassId = ClassId::UInt64;
    } else {
        const POINTER_SIGNED: ClassId = ClassId::Int32;
        const POINTER_UNSIGNED: ClassId = ClassId::UInt32;
    }
}

impl ClassId {
    /// The class of `isize`.
    pub const ISIZE: ClassId = POINTER_SIGNED;
    /// The class of `usize`.
    pub const USIZE: ClassId = POINTER_UNSIGNED;

    /// The name the host uses for this class.
    pub const fn name(self) -> &'static str {
        match self {
            ClassId::Unknown => "unknown",
            ClassId::Cell => "cell",
            ClassId::Struct => "struct",
            ClassId::Logical => "logical",
            ClassId::Char => "char",
            ClassId::Void => "void",
            ClassId::Double => "double",
            ClassId::Single => "single",
            ClassId::Int8 => "int8",
            ClassId::UInt8 => "uint8",
            ClassId::Int16 => "int16",
            ClassId::UInt16 => "uint16",
            ClassId::Int32 => "int32",
            ClassId::UInt32 => "uint32",
            ClassId::Int64 => "int64",
            ClassId::UInt64 => "uint64",
            ClassId::Function => "function_handle",
        }
    }

    /// Returns `true` for the floating point and fixed-width integer classes.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            ClassId::Double
                | ClassId::Single
                | ClassId::Int8
                | ClassId::UInt8
                | ClassId::Int16
                | ClassId::UInt16
                | ClassId::Int32
                | ClassId::UInt32
                | ClassId::Int64
                | ClassId::UInt64
        )
    }

    pub(crate) const fn from_raw(id: mxClassID) -> Self {
        match id {
            mxClassID::mxUNKNOWN_CLASS => ClassId::Unknown,
            mxClassID::mxCELL_CLASS => ClassId::Cell,
            mxClassID::mxSTRUCT_CLASS => ClassId::Struct,
            mxClassID::mxLOGICAL_CLASS => ClassId::Logical,
            mxClassID::mxCHAR_CLASS => ClassId::Char,
            mxClassID::mxVOID_CLASS => ClassId::Void,
            mxClassID::mxDOUBLE_CLASS => ClassId::Double,
            mxClassID::mxSINGLE_CLASS => ClassId::Single,
            mxClassID::mxINT8_CLASS => ClassId::Int8,
            mxClassID::mxUINT8_CLASS => ClassId::UInt8,
            mxClassID::mxINT16_CLASS => ClassId::Int16,
            mxClassID::mxUINT16_CLASS => ClassId::UInt16,
            mxClassID::mxINT32_CLASS => ClassId::Int32,
            mxClassID::mxUINT32_CLASS => ClassId::UInt32,
            mxClassID::mxINT64_CLASS => ClassId::Int64,
            mxClassID::mxUINT64_CLASS => ClassId::UInt64,
            mxClassID::mxFUNCTION_CLASS => ClassId::Function,
        }
    }

    pub(crate) const fn into_raw(self) -> mxClassID {
        match self {
            ClassId::Unknown => mxClassID::mxUNKNOWN_CLASS,
            ClassId::Cell => mxClassID::mxCELL_CLASS,
            ClassId::Struct => mxClassID::mxSTRUCT_CLASS,
            ClassId::Logical => mxClassID::mxLOGICAL_CLASS,
            ClassId::Char => mxClassID::mxCHAR_CLASS,
            ClassId::Void => mxClassID::mxVOID_CLASS,
            ClassId::Double => mxClassID::mxDOUBLE_CLASS,
            ClassId::Single => mxClassID::mxSINGLE_CLASS,
            ClassId::Int8 => mxClassID::mxINT8_CLASS,
            ClassId::UInt8 => mxClassID::mxUINT8_CLASS,
            ClassId::Int16 => mxClassID::mxINT16_CLASS,
            ClassId::UInt16 => mxClassID::mxUINT16_CLASS,
            ClassId::Int32 => mxClassID::mxINT32_CLASS,
            ClassId::UInt32 => mxClassID::mxUINT32_CLASS,
            ClassId::Int64 => mxClassID::mxINT64_CLASS,
            ClassId::UInt64 => mxClassID::mxUINT64_CLASS,
            ClassId::Function => mxClassID::mxFUNCTION_CLASS,
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rust types with the same layout as the elements of a numeric class.
///
/// Safety: `CLASS` must be a numeric class whose elements have the size and representation of
/// `Self`.
pub unsafe trait Primitive: Copy + 'static {
    const CLASS: ClassId;
}

macro_rules! impl_primitive {
    ($type:ty, $class:expr) => {
        unsafe impl Primitive for $type {
            const CLASS: ClassId = $class;
        }
    };
}

impl_primitive!(f64, ClassId::Double);
impl_primitive!(f32, ClassId::Single);
impl_primitive!(i8, ClassId::Int8);
impl_primitive!(u8, ClassId::UInt8);
impl_primitive!(i16, ClassId::Int16);
impl_primitive!(u16, ClassId::UInt16);
impl_primitive!(i32, ClassId::Int32);
impl_primitive!(u32, ClassId::UInt32);
impl_primitive!(i64, ClassId::Int64);
impl_primitive!(u64, ClassId::UInt64);
impl_primitive!(isize, ClassId::ISIZE);
impl_primitive!(usize, ClassId::USIZE);

#[cfg(test)]
mod tests {
    use super::ClassId;

    #[test]
    fn raw_ids_round_trip() {
        for class in [
            ClassId::Cell,
            ClassId::Struct,
            ClassId::Logical,
            ClassId::Char,
            ClassId::Double,
            ClassId::UInt64,
        ] {
            assert_eq!(ClassId::from_raw(class.into_raw()), class);
        }
    }

    #[test]
    fn pointer_classes_match_pointer_width() {
        assert_eq!(
            ClassId::ISIZE.name(),
            format!("int{}", std::mem::size_of::<isize>() * 8)
        );
        assert_eq!(
            ClassId::USIZE.name(),
            format!("uint{}", std::mem::size_of::<usize>() * 8)
        );
    }
}
