//! Typed value columns.
//!
//! A `Column` holds the values of one tree node for every element of the
//! evaluated range, already normalized to the node's dtype. A column of
//! length one broadcasts against any length.

use numex_ir::{Complex, Dtype, Scalar};

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Float(Vec<f64>),
    Complex(Vec<Complex>),
    /// UCS-4 code units without trailing NULs.
    Str(Vec<Vec<u32>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub dtype: Dtype,
    pub data: ColumnData,
}

/// Index into a column of `len` values, broadcasting a single value.
#[inline]
pub(crate) fn at(len: usize, i: usize) -> usize {
    if len == 1 {
        0
    } else {
        i
    }
}

/// Apply `f` pairwise, broadcasting a length-one side.
pub(crate) fn zip_map<A, B, R>(a: &[A], b: &[B], f: impl Fn(&A, &B) -> R) -> Vec<R> {
    match (a.len(), b.len()) {
        (1, _) => b.iter().map(|y| f(&a[0], y)).collect(),
        (_, 1) => a.iter().map(|x| f(x, &b[0])).collect(),
        _ => a.iter().zip(b).map(|(x, y)| f(x, y)).collect(),
    }
}

#[inline]
pub(crate) fn round_f32(v: f64) -> f64 {
    f64::from(v as f32)
}

/// Float to unsigned, wrapping negative values like a C conversion through `i64`.
#[inline]
fn float_to_u64(v: f64) -> u64 {
    if v < 0.0 {
        (v as i64) as u64
    } else {
        v as u64
    }
}

fn read_ne<const N: usize, T>(bytes: &[u8], f: impl Fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            f(raw)
        })
        .collect()
}

fn write_ne<const N: usize, T>(out: &mut [u8], n: usize, values: &[T], f: impl Fn(&T) -> [u8; N]) {
    if values.is_empty() {
        return;
    }
    for (i, slot) in out.chunks_exact_mut(N).take(n).enumerate() {
        slot.copy_from_slice(&f(&values[at(values.len(), i)]));
    }
}

impl Column {
    pub fn new(dtype: Dtype, data: ColumnData) -> Self {
        Column { dtype, data }
    }

    pub fn bools(values: Vec<bool>) -> Self {
        Column::new(Dtype::Bool, ColumnData::Bool(values))
    }

    /// A length-one column holding `value` cast to `dtype`.
    pub fn from_scalar(value: &Scalar, dtype: Dtype) -> Self {
        let data = match value.cast(dtype) {
            Scalar::Bool(b) => ColumnData::Bool(vec![b]),
            Scalar::Int(v) => ColumnData::Int(vec![v]),
            Scalar::UInt(v) => ColumnData::UInt(vec![v]),
            Scalar::Float(v) => ColumnData::Float(vec![v]),
            Scalar::Complex(c) => ColumnData::Complex(vec![c]),
            Scalar::Str(s) => ColumnData::Str(vec![s]),
        };
        Column::new(dtype, data)
    }

    /// `len` copies of `value` cast to `dtype`.
    pub fn filled(value: &Scalar, dtype: Dtype, len: usize) -> Self {
        fn repeat<T: Clone>(v: Vec<T>, len: usize) -> Vec<T> {
            v.into_iter().next().map(|x| vec![x; len]).unwrap_or_default()
        }
        let data = match Column::from_scalar(value, dtype).data {
            ColumnData::Bool(v) => ColumnData::Bool(repeat(v, len)),
            ColumnData::Int(v) => ColumnData::Int(repeat(v, len)),
            ColumnData::UInt(v) => ColumnData::UInt(repeat(v, len)),
            ColumnData::Float(v) => ColumnData::Float(repeat(v, len)),
            ColumnData::Complex(v) => ColumnData::Complex(repeat(v, len)),
            ColumnData::Str(v) => ColumnData::Str(repeat(v, len)),
        };
        Column::new(dtype, data)
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::UInt(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Complex(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i`, broadcasting a length-one column.
    pub fn get(&self, i: usize) -> Scalar {
        let i = at(self.len(), i);
        match &self.data {
            ColumnData::Bool(v) => Scalar::Bool(v[i]),
            ColumnData::Int(v) => Scalar::Int(v[i]),
            ColumnData::UInt(v) => Scalar::UInt(v[i]),
            ColumnData::Float(v) => Scalar::Float(v[i]),
            ColumnData::Complex(v) => Scalar::Complex(v[i]),
            ColumnData::Str(v) => Scalar::Str(v[i].clone()),
        }
    }

    /// Decode `n` elements of `dtype` from native-endian `bytes`.
    ///
    /// `bytes` must hold at least `n * itemsize` bytes.
    pub fn read(dtype: Dtype, itemsize: usize, bytes: &[u8], n: usize) -> Self {
        let bytes = &bytes[..n * itemsize];
        let data = match dtype {
            Dtype::Bool => ColumnData::Bool(bytes.iter().map(|b| *b != 0).collect()),
            Dtype::Int8 => ColumnData::Int(read_ne(bytes, |b: [u8; 1]| {
                i64::from(i8::from_ne_bytes(b))
            })),
            Dtype::Int16 => ColumnData::Int(read_ne(bytes, |b| i64::from(i16::from_ne_bytes(b)))),
            Dtype::Int32 => ColumnData::Int(read_ne(bytes, |b| i64::from(i32::from_ne_bytes(b)))),
            Dtype::Int64 => ColumnData::Int(read_ne(bytes, i64::from_ne_bytes)),
            Dtype::UInt8 => ColumnData::UInt(bytes.iter().map(|b| u64::from(*b)).collect()),
            Dtype::UInt16 => {
                ColumnData::UInt(read_ne(bytes, |b| u64::from(u16::from_ne_bytes(b))))
            }
            Dtype::UInt32 => {
                ColumnData::UInt(read_ne(bytes, |b| u64::from(u32::from_ne_bytes(b))))
            }
            Dtype::UInt64 => ColumnData::UInt(read_ne(bytes, u64::from_ne_bytes)),
            Dtype::Float32 => {
                ColumnData::Float(read_ne(bytes, |b| f64::from(f32::from_ne_bytes(b))))
            }
            Dtype::Float64 => ColumnData::Float(read_ne(bytes, f64::from_ne_bytes)),
            Dtype::Complex64 => ColumnData::Complex(read_ne(bytes, |b: [u8; 8]| {
                let [r0, r1, r2, r3, i0, i1, i2, i3] = b;
                Complex::new(
                    f64::from(f32::from_ne_bytes([r0, r1, r2, r3])),
                    f64::from(f32::from_ne_bytes([i0, i1, i2, i3])),
                )
            })),
            Dtype::Complex128 => ColumnData::Complex(read_ne(bytes, |b: [u8; 16]| {
                let mut re = [0u8; 8];
                let mut im = [0u8; 8];
                re.copy_from_slice(&b[..8]);
                im.copy_from_slice(&b[8..]);
                Complex::new(f64::from_ne_bytes(re), f64::from_ne_bytes(im))
            })),
            Dtype::String if itemsize == 0 => ColumnData::Str(vec![Vec::new(); n]),
            Dtype::String => ColumnData::Str(
                bytes
                    .chunks_exact(itemsize)
                    .map(|record| match Scalar::read(Dtype::String, record) {
                        Scalar::Str(units) => units,
                        _ => Vec::new(),
                    })
                    .collect(),
            ),
            Dtype::Auto => panic!("auto dtype reached a buffer read"),
        };
        Column::new(dtype, data)
    }

    /// Encode `n` elements into `out`, broadcasting a length-one column.
    ///
    /// The column must already have the destination dtype.
    pub fn write(&self, out: &mut [u8], itemsize: usize, n: usize) {
        match (self.dtype, &self.data) {
            (Dtype::Bool, ColumnData::Bool(v)) => write_ne(out, n, v, |b| [u8::from(*b)]),
            (Dtype::Int8, ColumnData::Int(v)) => write_ne(out, n, v, |x| (*x as i8).to_ne_bytes()),
            (Dtype::Int16, ColumnData::Int(v)) => {
                write_ne(out, n, v, |x| (*x as i16).to_ne_bytes());
            }
            (Dtype::Int32, ColumnData::Int(v)) => {
                write_ne(out, n, v, |x| (*x as i32).to_ne_bytes());
            }
            (Dtype::Int64, ColumnData::Int(v)) => write_ne(out, n, v, |x| x.to_ne_bytes()),
            (Dtype::UInt8, ColumnData::UInt(v)) => write_ne(out, n, v, |x| [*x as u8]),
            (Dtype::UInt16, ColumnData::UInt(v)) => {
                write_ne(out, n, v, |x| (*x as u16).to_ne_bytes());
            }
            (Dtype::UInt32, ColumnData::UInt(v)) => {
                write_ne(out, n, v, |x| (*x as u32).to_ne_bytes());
            }
            (Dtype::UInt64, ColumnData::UInt(v)) => write_ne(out, n, v, |x| x.to_ne_bytes()),
            (Dtype::Float32, ColumnData::Float(v)) => {
                write_ne(out, n, v, |x| (*x as f32).to_ne_bytes());
            }
            (Dtype::Float64, ColumnData::Float(v)) => write_ne(out, n, v, |x| x.to_ne_bytes()),
            (Dtype::Complex128, ColumnData::Complex(v)) => write_ne(out, n, v, |c| {
                let mut raw = [0u8; 16];
                raw[..8].copy_from_slice(&c.re.to_ne_bytes());
                raw[8..].copy_from_slice(&c.im.to_ne_bytes());
                raw
            }),
            _ => {
                if itemsize == 0 || self.is_empty() {
                    return;
                }
                for (i, slot) in out.chunks_exact_mut(itemsize).take(n).enumerate() {
                    self.get(i).write(self.dtype, slot);
                }
            }
        }
    }

    /// Convert to `to`, normalizing every value to its width.
    #[must_use]
    pub fn cast(self, to: Dtype) -> Column {
        if self.dtype == to {
            return self;
        }
        let data = match to {
            Dtype::Bool => ColumnData::Bool(self.truthy()),
            d if d.is_signed() => {
                ColumnData::Int(self.to_i64s().into_iter().map(|v| d.wrap_i64(v)).collect())
            }
            d if d.is_unsigned() => {
                ColumnData::UInt(self.to_u64s().into_iter().map(|v| d.wrap_u64(v)).collect())
            }
            Dtype::Float32 => ColumnData::Float(self.to_f64s().into_iter().map(round_f32).collect()),
            Dtype::Float64 => ColumnData::Float(self.to_f64s()),
            Dtype::Complex64 => ColumnData::Complex(
                self.to_complexes()
                    .into_iter()
                    .map(Complex::round_f32)
                    .collect(),
            ),
            Dtype::Complex128 => ColumnData::Complex(self.to_complexes()),
            Dtype::String => match self.data {
                ColumnData::Str(s) => ColumnData::Str(s),
                other => ColumnData::Str(vec![Vec::new(); Column::new(to, other).len()]),
            },
            _ => panic!("auto dtype reached a column cast"),
        };
        Column::new(to, data)
    }

    pub fn truthy(&self) -> Vec<bool> {
        match &self.data {
            ColumnData::Bool(v) => v.clone(),
            ColumnData::Int(v) => v.iter().map(|x| *x != 0).collect(),
            ColumnData::UInt(v) => v.iter().map(|x| *x != 0).collect(),
            ColumnData::Float(v) => v.iter().map(|x| *x != 0.0).collect(),
            ColumnData::Complex(v) => v.iter().map(|c| !c.is_zero()).collect(),
            ColumnData::Str(v) => v.iter().map(|s| !s.is_empty()).collect(),
        }
    }

    pub fn to_i64s(&self) -> Vec<i64> {
        match &self.data {
            ColumnData::Bool(v) => v.iter().map(|b| i64::from(*b)).collect(),
            ColumnData::Int(v) => v.clone(),
            ColumnData::UInt(v) => v.iter().map(|x| *x as i64).collect(),
            ColumnData::Float(v) => v.iter().map(|x| *x as i64).collect(),
            ColumnData::Complex(v) => v.iter().map(|c| c.re as i64).collect(),
            ColumnData::Str(v) => vec![0; v.len()],
        }
    }

    pub fn to_u64s(&self) -> Vec<u64> {
        match &self.data {
            ColumnData::Bool(v) => v.iter().map(|b| u64::from(*b)).collect(),
            ColumnData::Int(v) => v.iter().map(|x| *x as u64).collect(),
            ColumnData::UInt(v) => v.clone(),
            ColumnData::Float(v) => v.iter().map(|x| float_to_u64(*x)).collect(),
            ColumnData::Complex(v) => v.iter().map(|c| float_to_u64(c.re)).collect(),
            ColumnData::Str(v) => vec![0; v.len()],
        }
    }

    pub fn to_f64s(&self) -> Vec<f64> {
        match &self.data {
            ColumnData::Bool(v) => v.iter().map(|b| f64::from(u8::from(*b))).collect(),
            ColumnData::Int(v) => v.iter().map(|x| *x as f64).collect(),
            ColumnData::UInt(v) => v.iter().map(|x| *x as f64).collect(),
            ColumnData::Float(v) => v.clone(),
            ColumnData::Complex(v) => v.iter().map(|c| c.re).collect(),
            ColumnData::Str(v) => vec![0.0; v.len()],
        }
    }

    pub fn to_complexes(&self) -> Vec<Complex> {
        match &self.data {
            ColumnData::Complex(v) => v.clone(),
            _ => self.to_f64s().into_iter().map(Complex::from_real).collect(),
        }
    }
}
