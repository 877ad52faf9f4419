//! Binary dtype promotion.

use numex_ir::Dtype;

/// Common dtype of two operands.
///
/// `bool` is the identity and `string` absorbs everything. Ints of mixed
/// signedness take the signed type twice as wide as the wider operand, or
/// `float64` once either operand is 64 bits wide. Floats and complexes
/// widen enough to hold every int of the other side up to 16 bits.
///
/// # Panics
///
/// Panics if either side is `auto`: unresolved dtypes never reach
/// promotion.
pub fn promote(a: Dtype, b: Dtype) -> Dtype {
    assert!(
        !a.is_auto() && !b.is_auto(),
        "auto dtype reached promotion ({a}, {b})"
    );
    if a == b {
        return a;
    }
    if a.is_bool() {
        return b;
    }
    if b.is_bool() {
        return a;
    }
    if a.is_string() || b.is_string() {
        return Dtype::String;
    }
    if a.is_complex() || b.is_complex() {
        return promote_complex(a, b);
    }
    if a.is_float() || b.is_float() {
        return promote_float(a, b);
    }
    promote_int(a, b)
}

/// Left fold of [`promote`] starting from `bool`.
pub fn promote_all(dtypes: impl IntoIterator<Item = Dtype>) -> Dtype {
    dtypes.into_iter().fold(Dtype::Bool, promote)
}

/// Operand dtype of a float-math function: integral and bool operands
/// compute in `float64`, floats and complexes pass through.
pub fn float_math_dtype(dtype: Dtype) -> Dtype {
    if dtype.is_integral() {
        Dtype::Float64
    } else {
        dtype
    }
}

fn promote_complex(a: Dtype, b: Dtype) -> Dtype {
    let other = if a.is_complex() { b } else { a };
    let wide = a == Dtype::Complex128
        || b == Dtype::Complex128
        || other == Dtype::Float64
        || (other.is_integer() && other.size() >= 4);
    if wide {
        Dtype::Complex128
    } else {
        Dtype::Complex64
    }
}

fn promote_float(a: Dtype, b: Dtype) -> Dtype {
    if a == Dtype::Float64 || b == Dtype::Float64 {
        return Dtype::Float64;
    }
    // One side is float32, the other an integer.
    let other = if a.is_float() { b } else { a };
    if other.size() <= 2 {
        Dtype::Float32
    } else {
        Dtype::Float64
    }
}

fn promote_int(a: Dtype, b: Dtype) -> Dtype {
    let widest = a.size().max(b.size());
    if a.is_signed() == b.is_signed() {
        return if a.size() >= b.size() { a } else { b };
    }
    match widest {
        1 => Dtype::Int16,
        2 => Dtype::Int32,
        4 => Dtype::Int64,
        _ => Dtype::Float64,
    }
}

#[cfg(test)]
mod tests;
