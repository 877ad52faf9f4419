//! Reduction accumulators.
//!
//! A [`Reducer`] folds any number of columns (or partial reducers over
//! disjoint ranges) into one value. Integer sums and products wrap;
//! `min`/`max` propagate NaN; `mean` of nothing is NaN and `min`/`max` of
//! nothing is the identity (`±inf`, or the integer type's bound).

use numex_ir::{Complex, Dtype, ReduceOp, Scalar};
use numex_types::reduction_output_dtype;

use crate::column::{at, Column};

#[derive(Clone, Debug, PartialEq)]
enum Acc {
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex),
    Truth(bool),
    Extreme(Option<Scalar>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reducer {
    op: ReduceOp,
    input: Dtype,
    acc: Acc,
    count: u64,
}

impl Reducer {
    pub fn new(op: ReduceOp, input: Dtype) -> Self {
        let acc = match op {
            ReduceOp::Any => Acc::Truth(false),
            ReduceOp::All => Acc::Truth(true),
            ReduceOp::Min | ReduceOp::Max => Acc::Extreme(None),
            ReduceOp::Mean if input.is_complex() => Acc::Complex(Complex::ZERO),
            ReduceOp::Mean => Acc::Float(0.0),
            ReduceOp::Sum | ReduceOp::Prod => {
                let identity = op == ReduceOp::Prod;
                if input.is_complex() {
                    Acc::Complex(if identity { Complex::ONE } else { Complex::ZERO })
                } else if input.is_float() {
                    Acc::Float(if identity { 1.0 } else { 0.0 })
                } else if input.is_unsigned() {
                    Acc::UInt(u64::from(identity))
                } else {
                    Acc::Int(i64::from(identity))
                }
            }
        };
        Reducer {
            op,
            input,
            acc,
            count: 0,
        }
    }

    pub fn op(&self) -> ReduceOp {
        self.op
    }

    pub fn output_dtype(&self) -> Dtype {
        reduction_output_dtype(self.op, self.input)
    }

    /// Further input cannot change the result (`any` saw a true value,
    /// `all` saw a false one).
    pub fn is_decided(&self) -> bool {
        matches!(
            (self.op, &self.acc),
            (ReduceOp::Any, Acc::Truth(true)) | (ReduceOp::All, Acc::Truth(false))
        )
    }

    /// Fold the first `n` elements of `column`, broadcasting a length-one column.
    pub fn push_column(&mut self, column: &Column, n: usize) {
        let len = column.len();
        if len == 0 || n == 0 {
            return;
        }
        self.count += n as u64;
        let op = self.op;
        match &mut self.acc {
            Acc::Int(s) => {
                let v = column.to_i64s();
                for i in 0..n {
                    let x = v[at(len, i)];
                    *s = if op == ReduceOp::Prod {
                        s.wrapping_mul(x)
                    } else {
                        s.wrapping_add(x)
                    };
                }
            }
            Acc::UInt(s) => {
                let v = column.to_u64s();
                for i in 0..n {
                    let x = v[at(len, i)];
                    *s = if op == ReduceOp::Prod {
                        s.wrapping_mul(x)
                    } else {
                        s.wrapping_add(x)
                    };
                }
            }
            Acc::Float(s) => {
                let v = column.to_f64s();
                for i in 0..n {
                    let x = v[at(len, i)];
                    *s = if op == ReduceOp::Prod { *s * x } else { *s + x };
                }
            }
            Acc::Complex(s) => {
                let v = column.to_complexes();
                for i in 0..n {
                    let x = v[at(len, i)];
                    *s = if op == ReduceOp::Prod { *s * x } else { *s + x };
                }
            }
            Acc::Truth(t) => {
                let v = column.truthy();
                let any = op == ReduceOp::Any;
                for i in 0..n {
                    if v[at(len, i)] == any {
                        *t = any;
                        break;
                    }
                }
            }
            Acc::Extreme(best) => {
                for i in 0..n {
                    let candidate = column.get(i);
                    let replace = match best {
                        None => true,
                        Some(current) => beats(op, &candidate, current),
                    };
                    if replace {
                        *best = Some(candidate);
                    }
                }
            }
        }
    }

    pub fn push(&mut self, value: &Scalar) {
        self.push_column(&Column::from_scalar(value, self.input), 1);
    }

    /// Combine a partial result over a disjoint range.
    pub fn merge(&mut self, other: Reducer) {
        self.count += other.count;
        let op = self.op;
        match (&mut self.acc, other.acc) {
            (Acc::Int(a), Acc::Int(b)) => {
                *a = if op == ReduceOp::Prod { a.wrapping_mul(b) } else { a.wrapping_add(b) };
            }
            (Acc::UInt(a), Acc::UInt(b)) => {
                *a = if op == ReduceOp::Prod { a.wrapping_mul(b) } else { a.wrapping_add(b) };
            }
            (Acc::Float(a), Acc::Float(b)) => *a = if op == ReduceOp::Prod { *a * b } else { *a + b },
            (Acc::Complex(a), Acc::Complex(b)) => {
                *a = if op == ReduceOp::Prod { *a * b } else { *a + b };
            }
            (Acc::Truth(a), Acc::Truth(b)) => *a = if op == ReduceOp::Any { *a || b } else { *a && b },
            (Acc::Extreme(a), Acc::Extreme(Some(b))) => {
                let replace = a.as_ref().map_or(true, |current| beats(op, &b, current));
                if replace {
                    *a = Some(b);
                }
            }
            _ => {}
        }
    }

    /// The reduced value, in the reduction's output dtype.
    pub fn finish(self) -> Scalar {
        let output = self.output_dtype();
        let value = match self.acc {
            Acc::Int(s) => Scalar::Int(s),
            Acc::UInt(s) => Scalar::UInt(s),
            Acc::Float(s) if self.op == ReduceOp::Mean => Scalar::Float(s / self.count as f64),
            Acc::Float(s) => Scalar::Float(s),
            Acc::Complex(s) if self.op == ReduceOp::Mean => {
                let n = self.count as f64;
                Scalar::Complex(Complex::new(s.re / n, s.im / n))
            }
            Acc::Complex(s) => Scalar::Complex(s),
            Acc::Truth(t) => Scalar::Bool(t),
            Acc::Extreme(best) => best.unwrap_or_else(|| extreme_identity(self.op, self.input)),
        };
        value.cast(output)
    }
}

/// The min/max of no elements: the value every element beats.
fn extreme_identity(op: ReduceOp, dtype: Dtype) -> Scalar {
    let min = op == ReduceOp::Min;
    match dtype {
        Dtype::Float32 | Dtype::Float64 => {
            Scalar::Float(if min { f64::INFINITY } else { f64::NEG_INFINITY })
        }
        Dtype::Int8 => Scalar::Int(if min { i8::MAX.into() } else { i8::MIN.into() }),
        Dtype::Int16 => Scalar::Int(if min { i16::MAX.into() } else { i16::MIN.into() }),
        Dtype::Int32 => Scalar::Int(if min { i32::MAX.into() } else { i32::MIN.into() }),
        Dtype::Int64 => Scalar::Int(if min { i64::MAX } else { i64::MIN }),
        Dtype::UInt8 => Scalar::UInt(if min { u8::MAX.into() } else { 0 }),
        Dtype::UInt16 => Scalar::UInt(if min { u16::MAX.into() } else { 0 }),
        Dtype::UInt32 => Scalar::UInt(if min { u32::MAX.into() } else { 0 }),
        Dtype::UInt64 => Scalar::UInt(if min { u64::MAX } else { 0 }),
        Dtype::Bool => Scalar::Bool(min),
        other => Scalar::zero(other),
    }
}

/// Whether `candidate` replaces `current` as the running min/max.
/// A NaN, once seen, is never replaced.
fn beats(op: ReduceOp, candidate: &Scalar, current: &Scalar) -> bool {
    let ordered = |less: bool, greater: bool| if op == ReduceOp::Min { less } else { greater };
    match (candidate, current) {
        (_, Scalar::Float(c)) if c.is_nan() => false,
        (Scalar::Float(x), _) if x.is_nan() => true,
        (Scalar::Float(x), Scalar::Float(c)) => ordered(x < c, x > c),
        (Scalar::Int(x), Scalar::Int(c)) => ordered(x < c, x > c),
        (Scalar::UInt(x), Scalar::UInt(c)) => ordered(x < c, x > c),
        (Scalar::Bool(x), Scalar::Bool(c)) => ordered(x < c, x > c),
        (Scalar::Str(x), Scalar::Str(c)) => ordered(x < c, x > c),
        _ => false,
    }
}
