//! Operator kernels.
//!
//! Operands arrive already cast to the node's computation dtype. Integer
//! arithmetic wraps to the dtype width; division and remainder by zero
//! produce zero. Bool arithmetic is computed as `int64` and cast back.

use numex_ir::{BinaryOp, Complex, Dtype, UnaryOp};

use crate::column::{round_f32, zip_map, Column, ColumnData};

pub fn unary(op: UnaryOp, operand: Column) -> Column {
    let dtype = operand.dtype;
    if op == UnaryOp::Not {
        return Column::bools(operand.truthy().into_iter().map(|b| !b).collect());
    }
    let data = match (op, operand.data) {
        (UnaryOp::Neg, ColumnData::Int(v)) => {
            ColumnData::Int(v.into_iter().map(|x| dtype.wrap_i64(x.wrapping_neg())).collect())
        }
        (UnaryOp::Neg, ColumnData::UInt(v)) => {
            ColumnData::UInt(v.into_iter().map(|x| dtype.wrap_u64(x.wrapping_neg())).collect())
        }
        (UnaryOp::Neg, ColumnData::Float(v)) => ColumnData::Float(v.into_iter().map(|x| -x).collect()),
        (UnaryOp::Neg, ColumnData::Complex(v)) => {
            ColumnData::Complex(v.into_iter().map(|c| -c).collect())
        }
        (UnaryOp::BitNot, ColumnData::Int(v)) => {
            ColumnData::Int(v.into_iter().map(|x| dtype.wrap_i64(!x)).collect())
        }
        (UnaryOp::BitNot, ColumnData::UInt(v)) => {
            ColumnData::UInt(v.into_iter().map(|x| dtype.wrap_u64(!x)).collect())
        }
        (UnaryOp::BitNot, ColumnData::Bool(v)) => ColumnData::Bool(v.into_iter().map(|b| !b).collect()),
        (UnaryOp::BitNot, ColumnData::Float(v)) => {
            ColumnData::Float(v.into_iter().map(|x| !(x as i64) as f64).collect())
        }
        // Negating a bool through int64 keeps its truth value; strings and
        // complex bit-not are rejected when compiling.
        (_, data) => data,
    };
    Column::new(dtype, data)
}

pub fn binary(op: BinaryOp, left: Column, right: Column) -> Column {
    if op.is_logical() {
        let and = op == BinaryOp::And;
        return Column::bools(zip_map(&left.truthy(), &right.truthy(), |a, b| {
            if and {
                *a && *b
            } else {
                *a || *b
            }
        }));
    }
    if op.is_comparison() {
        return compare(op, &left, &right);
    }

    let dtype = left.dtype;
    let data = match (left.data, right.data) {
        (ColumnData::Int(a), ColumnData::Int(b)) => {
            ColumnData::Int(zip_map(&a, &b, |x, y| dtype.wrap_i64(int_op(op, *x, *y))))
        }
        (ColumnData::UInt(a), ColumnData::UInt(b)) => {
            ColumnData::UInt(zip_map(&a, &b, |x, y| dtype.wrap_u64(uint_op(op, *x, *y))))
        }
        (ColumnData::Float(a), ColumnData::Float(b)) => {
            let single = dtype == Dtype::Float32;
            ColumnData::Float(zip_map(&a, &b, |x, y| {
                let v = float_op(op, *x, *y);
                if single {
                    round_f32(v)
                } else {
                    v
                }
            }))
        }
        (ColumnData::Complex(a), ColumnData::Complex(b)) => {
            let single = dtype == Dtype::Complex64;
            ColumnData::Complex(zip_map(&a, &b, |x, y| {
                let v = complex_op(op, *x, *y);
                if single {
                    v.round_f32()
                } else {
                    v
                }
            }))
        }
        (ColumnData::Bool(a), ColumnData::Bool(b)) => ColumnData::Bool(match op {
            BinaryOp::BitAnd => zip_map(&a, &b, |x, y| *x & *y),
            BinaryOp::BitOr => zip_map(&a, &b, |x, y| *x | *y),
            BinaryOp::BitXor => zip_map(&a, &b, |x, y| *x ^ *y),
            _ => zip_map(&a, &b, |x, y| int_op(op, i64::from(*x), i64::from(*y)) != 0),
        }),
        (a, b) => unreachable!("{op:?} operands disagree: {a:?} vs {b:?}"),
    };
    Column::new(dtype, data)
}

/// [`binary`] computed into `left`'s buffer. Falls back to a fresh buffer
/// when `left` broadcasts or the result changes representation.
pub fn binary_in_place(op: BinaryOp, left: Column, right: Column) -> Column {
    let same_repr = matches!(
        (&left.data, &right.data),
        (ColumnData::Int(_), ColumnData::Int(_))
            | (ColumnData::UInt(_), ColumnData::UInt(_))
            | (ColumnData::Float(_), ColumnData::Float(_))
            | (ColumnData::Complex(_), ColumnData::Complex(_))
    );
    let broadcasts = left.len() == 1 && right.len() != 1;
    if op.is_logical() || op.is_comparison() || !same_repr || broadcasts {
        return binary(op, left, right);
    }

    let dtype = left.dtype;
    let data = match (left.data, right.data) {
        (ColumnData::Int(mut a), ColumnData::Int(b)) => {
            update(&mut a, &b, |x, y| dtype.wrap_i64(int_op(op, x, y)));
            ColumnData::Int(a)
        }
        (ColumnData::UInt(mut a), ColumnData::UInt(b)) => {
            update(&mut a, &b, |x, y| dtype.wrap_u64(uint_op(op, x, y)));
            ColumnData::UInt(a)
        }
        (ColumnData::Float(mut a), ColumnData::Float(b)) => {
            let single = dtype == Dtype::Float32;
            update(&mut a, &b, |x, y| {
                let v = float_op(op, x, y);
                if single {
                    round_f32(v)
                } else {
                    v
                }
            });
            ColumnData::Float(a)
        }
        (ColumnData::Complex(mut a), ColumnData::Complex(b)) => {
            let single = dtype == Dtype::Complex64;
            update(&mut a, &b, |x, y| {
                let v = complex_op(op, x, y);
                if single {
                    v.round_f32()
                } else {
                    v
                }
            });
            ColumnData::Complex(a)
        }
        (a, b) => unreachable!("{op:?} operands disagree: {a:?} vs {b:?}"),
    };
    Column::new(dtype, data)
}

/// `a[i] = f(a[i], b[i])`, broadcasting a length-one `b`.
fn update<T: Copy>(a: &mut [T], b: &[T], f: impl Fn(T, T) -> T) {
    if let [y] = b {
        a.iter_mut().for_each(|x| *x = f(*x, *y));
    } else {
        a.iter_mut().zip(b).for_each(|(x, y)| *x = f(*x, *y));
    }
}

fn int_op(op: BinaryOp, x: i64, y: i64) -> i64 {
    match op {
        BinaryOp::Add => x.wrapping_add(y),
        BinaryOp::Sub => x.wrapping_sub(y),
        BinaryOp::Mul => x.wrapping_mul(y),
        BinaryOp::Div if y == 0 => 0,
        BinaryOp::Div => x.wrapping_div(y),
        BinaryOp::Mod if y == 0 => 0,
        BinaryOp::Mod => x.wrapping_rem(y),
        BinaryOp::Pow => ipow(x, y),
        BinaryOp::BitAnd => x & y,
        BinaryOp::BitOr => x | y,
        BinaryOp::BitXor => x ^ y,
        BinaryOp::Shl if (0..64).contains(&y) => x << y,
        BinaryOp::Shr if (0..64).contains(&y) => x >> y,
        BinaryOp::Shr if x < 0 => -1,
        _ => 0,
    }
}

fn uint_op(op: BinaryOp, x: u64, y: u64) -> u64 {
    match op {
        BinaryOp::Add => x.wrapping_add(y),
        BinaryOp::Sub => x.wrapping_sub(y),
        BinaryOp::Mul => x.wrapping_mul(y),
        BinaryOp::Div | BinaryOp::Mod if y == 0 => 0,
        BinaryOp::Div => x / y,
        BinaryOp::Mod => x % y,
        BinaryOp::Pow => upow(x, y),
        BinaryOp::BitAnd => x & y,
        BinaryOp::BitOr => x | y,
        BinaryOp::BitXor => x ^ y,
        BinaryOp::Shl if y < 64 => x << y,
        BinaryOp::Shr if y < 64 => x >> y,
        _ => 0,
    }
}

fn float_op(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::Mod => x % y,
        BinaryOp::Pow => x.powf(y),
        _ => int_op(op, x as i64, y as i64) as f64,
    }
}

fn complex_op(op: BinaryOp, x: Complex, y: Complex) -> Complex {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::Pow => x.pow(y),
        _ => Complex::new(f64::NAN, f64::NAN),
    }
}

/// Integer power by squaring. Negative exponents give zero except for
/// bases 1 and -1.
fn ipow(base: i64, exp: i64) -> i64 {
    if exp < 0 {
        return match base {
            1 => 1,
            -1 if exp % 2 == 0 => 1,
            -1 => -1,
            _ => 0,
        };
    }
    let mut result: i64 = 1;
    let mut base = base;
    let mut exp = exp as u64;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

fn upow(base: u64, exp: u64) -> u64 {
    let mut result: u64 = 1;
    let mut base = base;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

fn holds<T: PartialOrd>(op: BinaryOp, a: &T, b: &T) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => false,
    }
}

fn compare(op: BinaryOp, left: &Column, right: &Column) -> Column {
    let out = match (&left.data, &right.data) {
        (ColumnData::Bool(a), ColumnData::Bool(b)) => zip_map(a, b, |x, y| holds(op, x, y)),
        (ColumnData::Int(a), ColumnData::Int(b)) => zip_map(a, b, |x, y| holds(op, x, y)),
        (ColumnData::UInt(a), ColumnData::UInt(b)) => zip_map(a, b, |x, y| holds(op, x, y)),
        (ColumnData::Float(a), ColumnData::Float(b)) => zip_map(a, b, |x, y| holds(op, x, y)),
        (ColumnData::Str(a), ColumnData::Str(b)) => zip_map(a, b, |x, y| holds(op, x, y)),
        (ColumnData::Complex(a), ColumnData::Complex(b)) => zip_map(a, b, |x, y| match op {
            BinaryOp::Eq => x == y,
            BinaryOp::Ne => x != y,
            _ => holds(op, &(x.re, x.im), &(y.re, y.im)),
        }),
        (a, b) => unreachable!("{op:?} operands disagree: {a:?} vs {b:?}"),
    };
    Column::bools(out)
}

#[cfg(test)]
mod tests;
