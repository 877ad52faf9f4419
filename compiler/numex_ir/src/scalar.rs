//! Single values and their byte encoding.

use std::fmt;

use crate::{Complex, Dtype};

/// One element value.
///
/// The variant is the computation class, not the exact dtype: every signed
/// integer dtype is carried as `Int`, both floats as `Float`, and so on. A
/// value is *normalized* for a dtype when it has been wrapped or rounded to
/// that dtype's width (see [`Scalar::cast`]).
#[derive(Clone, PartialEq, Debug)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex),
    /// UCS-4 code units, without trailing NULs.
    Str(Vec<u32>),
}

impl Scalar {
    /// The zero value of a dtype.
    pub fn zero(dtype: Dtype) -> Scalar {
        Scalar::Int(0).cast(dtype)
    }

    /// Truthiness: nonzero numbers and non-empty strings are true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Int(v) => *v != 0,
            Scalar::UInt(v) => *v != 0,
            Scalar::Float(v) => *v != 0.0,
            Scalar::Complex(c) => !c.is_zero(),
            Scalar::Str(s) => !s.is_empty(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Scalar::Bool(b) => f64::from(u8::from(*b)),
            Scalar::Int(v) => *v as f64,
            Scalar::UInt(v) => *v as f64,
            Scalar::Float(v) => *v,
            Scalar::Complex(c) => c.re,
            Scalar::Str(_) => 0.0,
        }
    }

    pub fn to_i64(&self) -> i64 {
        match self {
            Scalar::Bool(b) => i64::from(*b),
            Scalar::Int(v) => *v,
            Scalar::UInt(v) => *v as i64,
            Scalar::Float(v) => *v as i64,
            Scalar::Complex(c) => c.re as i64,
            Scalar::Str(_) => 0,
        }
    }

    pub fn to_u64(&self) -> u64 {
        match self {
            Scalar::Bool(b) => u64::from(*b),
            Scalar::Int(v) => *v as u64,
            Scalar::UInt(v) => *v,
            Scalar::Float(v) => float_to_u64(*v),
            Scalar::Complex(c) => float_to_u64(c.re),
            Scalar::Str(_) => 0,
        }
    }

    pub fn to_complex(&self) -> Complex {
        match self {
            Scalar::Complex(c) => *c,
            other => Complex::from_real(other.to_f64()),
        }
    }

    /// Convert to `dtype`, normalizing to its width.
    ///
    /// Integers wrap, `Float32` rounds, complex-to-real drops the imaginary
    /// part. Non-string values cast to `String` become the empty string.
    pub fn cast(&self, dtype: Dtype) -> Scalar {
        match dtype {
            Dtype::Bool => Scalar::Bool(self.is_truthy()),
            Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64 => {
                Scalar::Int(dtype.wrap_i64(self.to_i64()))
            }
            Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64 => {
                Scalar::UInt(dtype.wrap_u64(self.to_u64()))
            }
            Dtype::Float32 => Scalar::Float(f64::from(self.to_f64() as f32)),
            Dtype::Float64 => Scalar::Float(self.to_f64()),
            Dtype::Complex64 => Scalar::Complex(self.to_complex().round_f32()),
            Dtype::Complex128 => Scalar::Complex(self.to_complex()),
            Dtype::String => match self {
                Scalar::Str(s) => Scalar::Str(s.clone()),
                _ => Scalar::Str(Vec::new()),
            },
            Dtype::Auto => panic!("auto dtype reached a value cast"),
        }
    }

    /// Decode one element of `dtype` from native-endian bytes.
    ///
    /// `bytes` must hold exactly one element (`itemsize` bytes for strings).
    pub fn read(dtype: Dtype, bytes: &[u8]) -> Scalar {
        match dtype {
            Dtype::Bool => Scalar::Bool(bytes[0] != 0),
            Dtype::Int8 => Scalar::Int(i64::from(i8::from_ne_bytes([bytes[0]]))),
            Dtype::Int16 => Scalar::Int(i64::from(i16::from_ne_bytes(arr(bytes)))),
            Dtype::Int32 => Scalar::Int(i64::from(i32::from_ne_bytes(arr(bytes)))),
            Dtype::Int64 => Scalar::Int(i64::from_ne_bytes(arr(bytes))),
            Dtype::UInt8 => Scalar::UInt(u64::from(bytes[0])),
            Dtype::UInt16 => Scalar::UInt(u64::from(u16::from_ne_bytes(arr(bytes)))),
            Dtype::UInt32 => Scalar::UInt(u64::from(u32::from_ne_bytes(arr(bytes)))),
            Dtype::UInt64 => Scalar::UInt(u64::from_ne_bytes(arr(bytes))),
            Dtype::Float32 => Scalar::Float(f64::from(f32::from_ne_bytes(arr(bytes)))),
            Dtype::Float64 => Scalar::Float(f64::from_ne_bytes(arr(bytes))),
            Dtype::Complex64 => Scalar::Complex(Complex::new(
                f64::from(f32::from_ne_bytes(arr(&bytes[..4]))),
                f64::from(f32::from_ne_bytes(arr(&bytes[4..8]))),
            )),
            Dtype::Complex128 => Scalar::Complex(Complex::new(
                f64::from_ne_bytes(arr(&bytes[..8])),
                f64::from_ne_bytes(arr(&bytes[8..16])),
            )),
            Dtype::String => Scalar::Str(
                bytes
                    .chunks_exact(4)
                    .map(|unit| u32::from_ne_bytes(arr(unit)))
                    .take_while(|unit| *unit != 0)
                    .collect(),
            ),
            Dtype::Auto => panic!("auto dtype reached a buffer read"),
        }
    }

    /// Encode this value as one element of `dtype` into `out`.
    ///
    /// The value is cast first. Strings are truncated to the record and
    /// NUL-padded.
    pub fn write(&self, dtype: Dtype, out: &mut [u8]) {
        match (dtype, self.cast(dtype)) {
            (Dtype::Bool, Scalar::Bool(b)) => out[0] = u8::from(b),
            (Dtype::Int8, Scalar::Int(v)) => out[..1].copy_from_slice(&(v as i8).to_ne_bytes()),
            (Dtype::Int16, Scalar::Int(v)) => out[..2].copy_from_slice(&(v as i16).to_ne_bytes()),
            (Dtype::Int32, Scalar::Int(v)) => out[..4].copy_from_slice(&(v as i32).to_ne_bytes()),
            (Dtype::Int64, Scalar::Int(v)) => out[..8].copy_from_slice(&v.to_ne_bytes()),
            (Dtype::UInt8, Scalar::UInt(v)) => out[0] = v as u8,
            (Dtype::UInt16, Scalar::UInt(v)) => {
                out[..2].copy_from_slice(&(v as u16).to_ne_bytes());
            }
            (Dtype::UInt32, Scalar::UInt(v)) => {
                out[..4].copy_from_slice(&(v as u32).to_ne_bytes());
            }
            (Dtype::UInt64, Scalar::UInt(v)) => out[..8].copy_from_slice(&v.to_ne_bytes()),
            (Dtype::Float32, Scalar::Float(v)) => {
                out[..4].copy_from_slice(&(v as f32).to_ne_bytes());
            }
            (Dtype::Float64, Scalar::Float(v)) => out[..8].copy_from_slice(&v.to_ne_bytes()),
            (Dtype::Complex64, Scalar::Complex(c)) => {
                out[..4].copy_from_slice(&(c.re as f32).to_ne_bytes());
                out[4..8].copy_from_slice(&(c.im as f32).to_ne_bytes());
            }
            (Dtype::Complex128, Scalar::Complex(c)) => {
                out[..8].copy_from_slice(&c.re.to_ne_bytes());
                out[8..16].copy_from_slice(&c.im.to_ne_bytes());
            }
            (Dtype::String, Scalar::Str(units)) => {
                out.fill(0);
                for (slot, unit) in out.chunks_exact_mut(4).zip(units) {
                    slot.copy_from_slice(&unit.to_ne_bytes());
                }
            }
            (dtype, value) => unreachable!("cast produced {value:?} for {dtype}"),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::UInt(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Complex(c) => write!(f, "{c}"),
            Scalar::Str(units) => {
                let text: String = units
                    .iter()
                    .map(|u| char::from_u32(*u).unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect();
                f.write_str(&text)
            }
        }
    }
}

/// Float to unsigned with C-like wrapping for negative inputs.
#[inline]
fn float_to_u64(v: f64) -> u64 {
    if v < 0.0 {
        (v as i64) as u64
    } else {
        v as u64
    }
}

#[inline]
fn arr<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
