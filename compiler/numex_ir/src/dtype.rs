//! Element dtypes.

use std::fmt;

/// Element type of a variable, constant, or tree node.
///
/// `Auto` is a placeholder that only exists before the compiler resolves
/// dtypes. It must never reach promotion or evaluation.
///
/// `String` is a fixed-width record of UCS-4 code units. Its width in bytes
/// is carried separately (the variable's `itemsize`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[repr(u8)]
pub enum Dtype {
    #[default]
    Auto,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

impl Dtype {
    /// Every dtype except `Auto`.
    pub const CONCRETE: [Dtype; 14] = [
        Dtype::Bool,
        Dtype::Int8,
        Dtype::Int16,
        Dtype::Int32,
        Dtype::Int64,
        Dtype::UInt8,
        Dtype::UInt16,
        Dtype::UInt32,
        Dtype::UInt64,
        Dtype::Float32,
        Dtype::Float64,
        Dtype::Complex64,
        Dtype::Complex128,
        Dtype::String,
    ];

    /// Size of one element in bytes.
    ///
    /// `Auto` and `String` report 0: strings take their width from the
    /// variable's itemsize.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Dtype::Auto | Dtype::String => 0,
            Dtype::Bool | Dtype::Int8 | Dtype::UInt8 => 1,
            Dtype::Int16 | Dtype::UInt16 => 2,
            Dtype::Int32 | Dtype::UInt32 | Dtype::Float32 => 4,
            Dtype::Int64 | Dtype::UInt64 | Dtype::Float64 | Dtype::Complex64 => 8,
            Dtype::Complex128 => 16,
        }
    }

    #[inline]
    pub const fn is_auto(self) -> bool {
        matches!(self, Dtype::Auto)
    }

    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, Dtype::Bool)
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64)
    }

    #[inline]
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64
        )
    }

    /// Signed or unsigned integer (not bool).
    #[inline]
    pub const fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// Bool or any integer.
    #[inline]
    pub const fn is_integral(self) -> bool {
        self.is_bool() || self.is_integer()
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Dtype::Float32 | Dtype::Float64)
    }

    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, Dtype::Complex64 | Dtype::Complex128)
    }

    #[inline]
    pub const fn is_string(self) -> bool {
        matches!(self, Dtype::String)
    }

    /// Any dtype that takes part in arithmetic.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Dtype::Auto | Dtype::String)
    }

    /// The real component dtype of a complex dtype.
    pub const fn complex_component(self) -> Option<Dtype> {
        match self {
            Dtype::Complex64 => Some(Dtype::Float32),
            Dtype::Complex128 => Some(Dtype::Float64),
            _ => None,
        }
    }

    /// Bit width of an integer dtype, 0 otherwise.
    pub const fn int_bits(self) -> u32 {
        match self {
            Dtype::Int8 | Dtype::UInt8 => 8,
            Dtype::Int16 | Dtype::UInt16 => 16,
            Dtype::Int32 | Dtype::UInt32 => 32,
            Dtype::Int64 | Dtype::UInt64 => 64,
            _ => 0,
        }
    }

    /// Wrap a signed value to this dtype's width (two's complement).
    ///
    /// Non-integer dtypes return the value unchanged.
    #[inline]
    pub const fn wrap_i64(self, v: i64) -> i64 {
        match self {
            Dtype::Int8 => v as i8 as i64,
            Dtype::Int16 => v as i16 as i64,
            Dtype::Int32 => v as i32 as i64,
            _ => v,
        }
    }

    /// Wrap an unsigned value to this dtype's width.
    #[inline]
    pub const fn wrap_u64(self, v: u64) -> u64 {
        match self {
            Dtype::UInt8 => v as u8 as u64,
            Dtype::UInt16 => v as u16 as u64,
            Dtype::UInt32 => v as u32 as u64,
            _ => v,
        }
    }

    /// Canonical name, as NumPy spells it.
    pub const fn name(self) -> &'static str {
        match self {
            Dtype::Auto => "auto",
            Dtype::Bool => "bool",
            Dtype::Int8 => "int8",
            Dtype::Int16 => "int16",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
            Dtype::UInt8 => "uint8",
            Dtype::UInt16 => "uint16",
            Dtype::UInt32 => "uint32",
            Dtype::UInt64 => "uint64",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Complex64 => "complex64",
            Dtype::Complex128 => "complex128",
            Dtype::String => "string",
        }
    }

    /// Parse a dtype name. Accepts canonical names and short forms (`f64`, `i32`, `c128`, `str`).
    pub fn from_name(name: &str) -> Option<Dtype> {
        let dtype = match name {
            "auto" => Dtype::Auto,
            "bool" | "b1" => Dtype::Bool,
            "int8" | "i8" => Dtype::Int8,
            "int16" | "i16" => Dtype::Int16,
            "int32" | "i32" => Dtype::Int32,
            "int64" | "i64" | "int" => Dtype::Int64,
            "uint8" | "u8" => Dtype::UInt8,
            "uint16" | "u16" => Dtype::UInt16,
            "uint32" | "u32" => Dtype::UInt32,
            "uint64" | "u64" => Dtype::UInt64,
            "float32" | "f32" => Dtype::Float32,
            "float64" | "f64" | "float" => Dtype::Float64,
            "complex64" | "c64" => Dtype::Complex64,
            "complex128" | "c128" | "complex" => Dtype::Complex128,
            "string" | "str" => Dtype::String,
            _ => return None,
        };
        Some(dtype)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
