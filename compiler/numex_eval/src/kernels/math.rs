//! Builtin function kernels.
//!
//! Float math runs in `f64` and is rounded back for `float32` nodes unless
//! the relaxed ulp mode asks for native `f32` evaluation.

use statrs::function::erf;
use statrs::function::gamma;

use numex_ir::{Builtin, Complex, Dtype, Scalar};

use crate::column::{at, round_f32, zip_map, Column, ColumnData};
use crate::config::{EvalConfig, MathBackend, UlpMode};

const LANES: usize = 8;

/// Evaluate `builtin` over `args`.
///
/// Operands are already cast to the node's computation dtype, except the
/// condition of `where`, which is only tested for truth.
pub fn call(builtin: Builtin, args: Vec<Column>, output: Dtype, config: &EvalConfig) -> Column {
    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or_else(|| Column::bools(Vec::new()));
    match builtin {
        Builtin::CastInt | Builtin::CastFloat | Builtin::CastBool => next().cast(output),
        Builtin::StartsWith | Builtin::EndsWith | Builtin::Contains => {
            let (a, b) = (next(), next());
            string_test(builtin, &a, &b)
        }
        Builtin::Where => {
            let cond = next().truthy();
            let (x, y) = (next(), next());
            select(&cond, x, y)
        }
        Builtin::Fma => {
            let (a, b, c) = (next(), next(), next());
            fma(a, &b, &c)
        }
        b if b.is_float_math() && b.arity() == 2 => {
            let (a, b2) = (next(), next());
            float_binary(b, a, &b2)
        }
        b if b.is_float_math() => float_unary(b, next(), config),
        b => preserving(b, next(), output),
    }
}

/// Map `f` over `values`, in fixed-width lanes when the backend allows.
fn map_f64(values: &[f64], backend: MathBackend, f: impl Fn(f64) -> f64) -> Vec<f64> {
    if backend == MathBackend::Scalar {
        return values.iter().map(|x| f(*x)).collect();
    }
    let mut out = Vec::with_capacity(values.len());
    let mut chunks = values.chunks_exact(LANES);
    for chunk in &mut chunks {
        let lanes: [f64; LANES] = std::array::from_fn(|i| f(chunk[i]));
        out.extend_from_slice(&lanes);
    }
    out.extend(chunks.remainder().iter().map(|x| f(*x)));
    out
}

fn float_unary(builtin: Builtin, arg: Column, config: &EvalConfig) -> Column {
    let dtype = arg.dtype;
    let data = match arg.data {
        ColumnData::Complex(v) => ColumnData::Complex(
            v.into_iter()
                .map(|c| {
                    let r = c.sqrt();
                    if dtype == Dtype::Complex64 {
                        r.round_f32()
                    } else {
                        r
                    }
                })
                .collect(),
        ),
        ColumnData::Float(v) => {
            let backend = config.backend();
            ColumnData::Float(if dtype == Dtype::Float32 {
                match config.ulp_mode {
                    UlpMode::Relaxed => map_f64(&v, backend, |x| {
                        f64::from(unary_f32(builtin, x as f32))
                    }),
                    UlpMode::Precise => {
                        map_f64(&v, backend, |x| round_f32(unary_f64(builtin, x)))
                    }
                }
            } else {
                map_f64(&v, backend, |x| unary_f64(builtin, x))
            })
        }
        other => other,
    };
    Column::new(dtype, data)
}

fn unary_f64(builtin: Builtin, x: f64) -> f64 {
    match builtin {
        Builtin::Acos => x.acos(),
        Builtin::Acosh => x.acosh(),
        Builtin::Asin => x.asin(),
        Builtin::Asinh => x.asinh(),
        Builtin::Atan => x.atan(),
        Builtin::Atanh => x.atanh(),
        Builtin::Cbrt => x.cbrt(),
        Builtin::Cos => x.cos(),
        Builtin::Cosh => x.cosh(),
        Builtin::Cospi => cospi(x),
        Builtin::Erf => erf::erf(x),
        Builtin::Erfc => erf::erfc(x),
        Builtin::Exp => x.exp(),
        Builtin::Exp10 => 10f64.powf(x),
        Builtin::Exp2 => x.exp2(),
        Builtin::Expm1 => x.exp_m1(),
        Builtin::Lgamma => lgamma(x),
        Builtin::Log => x.ln(),
        Builtin::Log10 => x.log10(),
        Builtin::Log1p => x.ln_1p(),
        Builtin::Log2 => x.log2(),
        Builtin::Sin => x.sin(),
        Builtin::Sinh => x.sinh(),
        Builtin::Sinpi => sinpi(x),
        Builtin::Sqrt => x.sqrt(),
        Builtin::Tan => x.tan(),
        Builtin::Tanh => x.tanh(),
        Builtin::Tgamma => tgamma(x),
        Builtin::Fac => fac(x),
        _ => f64::NAN,
    }
}

/// `float32` evaluation for the relaxed ulp mode. Functions without a
/// native `f32` form go through `f64`.
fn unary_f32(builtin: Builtin, x: f32) -> f32 {
    match builtin {
        Builtin::Acos => x.acos(),
        Builtin::Asin => x.asin(),
        Builtin::Atan => x.atan(),
        Builtin::Cbrt => x.cbrt(),
        Builtin::Cos => x.cos(),
        Builtin::Cosh => x.cosh(),
        Builtin::Exp => x.exp(),
        Builtin::Exp2 => x.exp2(),
        Builtin::Expm1 => x.exp_m1(),
        Builtin::Log => x.ln(),
        Builtin::Log10 => x.log10(),
        Builtin::Log1p => x.ln_1p(),
        Builtin::Log2 => x.log2(),
        Builtin::Sin => x.sin(),
        Builtin::Sinh => x.sinh(),
        Builtin::Sqrt => x.sqrt(),
        Builtin::Tan => x.tan(),
        Builtin::Tanh => x.tanh(),
        _ => unary_f64(builtin, f64::from(x)) as f32,
    }
}

fn cospi(x: f64) -> f64 {
    let r = x % 2.0;
    if r.fract() == 0.0 {
        return if r == 0.0 { 1.0 } else { -1.0 };
    }
    if (r.abs() - 0.5) % 1.0 == 0.0 {
        return 0.0;
    }
    (std::f64::consts::PI * x).cos()
}

fn sinpi(x: f64) -> f64 {
    if x.is_finite() && x.fract() == 0.0 {
        return 0.0f64.copysign(x);
    }
    let r = x % 2.0;
    if r.abs() == 0.5 || r.abs() == 1.5 {
        let s = if r.abs() == 0.5 { 1.0 } else { -1.0 };
        return s * r.signum();
    }
    (std::f64::consts::PI * x).sin()
}

fn tgamma(x: f64) -> f64 {
    if x == 0.0 {
        return f64::INFINITY.copysign(x);
    }
    if x < 0.0 && x.fract() == 0.0 {
        return f64::NAN;
    }
    gamma::gamma(x)
}

/// `log |Γ(x)|`.
fn lgamma(x: f64) -> f64 {
    if x <= 0.0 && x.fract() == 0.0 {
        return f64::INFINITY;
    }
    if x < 0.5 {
        let s = (std::f64::consts::PI * x).sin().abs();
        return (std::f64::consts::PI / s).ln() - gamma::ln_gamma(1.0 - x);
    }
    gamma::ln_gamma(x)
}

/// Factorial of the integer part, infinite once it overflows `u64`.
fn fac(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        return f64::NAN;
    }
    if x > f64::from(u32::MAX) {
        return f64::INFINITY;
    }
    let mut result: u64 = 1;
    for i in 1..=(x as u64) {
        match result.checked_mul(i) {
            Some(r) => result = r,
            None => return f64::INFINITY,
        }
    }
    result as f64
}

fn ncr(n: f64, r: f64) -> f64 {
    if n.is_nan() || r.is_nan() || n < 0.0 || r < 0.0 || n < r {
        return f64::NAN;
    }
    if n > f64::from(u32::MAX) || r > f64::from(u32::MAX) {
        return f64::INFINITY;
    }
    let un = n as u64;
    let mut ur = r as u64;
    if ur > un / 2 {
        ur = un - ur;
    }
    let mut result: u64 = 1;
    for i in 1..=ur {
        match result.checked_mul(un - ur + i) {
            Some(r) => result = r / i,
            None => return f64::INFINITY,
        }
    }
    result as f64
}

fn ldexp(x: f64, e: f64) -> f64 {
    if e.is_nan() {
        return f64::NAN;
    }
    let mut e = e.clamp(-2200.0, 2200.0) as i32;
    let mut x = x;
    // Scale in steps so neither factor over- or underflows on its own.
    while e > 1000 {
        x *= 2f64.powi(1000);
        e -= 1000;
    }
    while e < -1000 {
        x *= 2f64.powi(-1000);
        e += 1000;
    }
    x * 2f64.powi(e)
}

fn logaddexp(a: f64, b: f64) -> f64 {
    if a == b {
        return a + std::f64::consts::LN_2;
    }
    let hi = a.max(b);
    let lo = a.min(b);
    hi + (lo - hi).exp().ln_1p()
}

fn nextafter(x: f64, toward: f64) -> f64 {
    if x.is_nan() || toward.is_nan() {
        return f64::NAN;
    }
    if x == toward {
        return toward;
    }
    if x == 0.0 {
        return f64::from_bits(1).copysign(toward);
    }
    let bits = x.to_bits();
    let up = (toward > x) == (x > 0.0);
    f64::from_bits(if up { bits + 1 } else { bits - 1 })
}

fn nextafter_f32(x: f32, toward: f32) -> f32 {
    if x.is_nan() || toward.is_nan() {
        return f32::NAN;
    }
    if x == toward {
        return toward;
    }
    if x == 0.0 {
        return f32::from_bits(1).copysign(toward);
    }
    let bits = x.to_bits();
    let up = (toward > x) == (x > 0.0);
    f32::from_bits(if up { bits + 1 } else { bits - 1 })
}

/// IEEE remainder: `x - n*y` with `n` the nearest integer to `x/y`, ties even.
fn remainder(x: f64, y: f64) -> f64 {
    if y == 0.0 || x.is_infinite() || y.is_nan() {
        return f64::NAN;
    }
    if y.is_infinite() {
        return x;
    }
    let n = (x / y).round_ties_even();
    let r = x - n * y;
    if r == 0.0 {
        0.0f64.copysign(x)
    } else {
        r
    }
}

fn binary_f64(builtin: Builtin, a: f64, b: f64) -> f64 {
    match builtin {
        Builtin::Atan2 => a.atan2(b),
        Builtin::Copysign => a.copysign(b),
        Builtin::Fdim => {
            if a.is_nan() || b.is_nan() {
                f64::NAN
            } else if a > b {
                a - b
            } else {
                0.0
            }
        }
        Builtin::Fmax => a.max(b),
        Builtin::Fmin => a.min(b),
        Builtin::Fmod => a % b,
        Builtin::Hypot => a.hypot(b),
        Builtin::Ldexp => ldexp(a, b),
        Builtin::Logaddexp => logaddexp(a, b),
        Builtin::Nextafter => nextafter(a, b),
        Builtin::Remainder => remainder(a, b),
        Builtin::Ncr => ncr(a, b),
        Builtin::Npr => ncr(a, b) * fac(b),
        _ => f64::NAN,
    }
}

fn float_binary(builtin: Builtin, a: Column, b: &Column) -> Column {
    let dtype = a.dtype;
    let (x, y) = (a.to_f64s(), b.to_f64s());
    let out = if dtype == Dtype::Float32 {
        zip_map(&x, &y, |x, y| {
            if builtin == Builtin::Nextafter {
                f64::from(nextafter_f32(*x as f32, *y as f32))
            } else {
                round_f32(binary_f64(builtin, *x, *y))
            }
        })
    } else {
        zip_map(&x, &y, |x, y| binary_f64(builtin, *x, *y))
    };
    Column::new(dtype, ColumnData::Float(out))
}

fn fma(a: Column, b: &Column, c: &Column) -> Column {
    let dtype = a.dtype;
    let (x, y, z) = (a.to_f64s(), b.to_f64s(), c.to_f64s());
    let n = x.len().max(y.len()).max(z.len());
    let out = (0..n)
        .map(|i| {
            let v = x[at(x.len(), i)].mul_add(y[at(y.len(), i)], z[at(z.len(), i)]);
            if dtype == Dtype::Float32 {
                round_f32(v)
            } else {
                v
            }
        })
        .collect();
    Column::new(dtype, ColumnData::Float(out))
}

fn pick<T: Clone>(cond: &[bool], x: &[T], y: &[T]) -> Vec<T> {
    let n = cond.len().max(x.len()).max(y.len());
    (0..n)
        .map(|i| {
            if cond[at(cond.len(), i)] {
                x[at(x.len(), i)].clone()
            } else {
                y[at(y.len(), i)].clone()
            }
        })
        .collect()
}

fn select(cond: &[bool], x: Column, y: Column) -> Column {
    let dtype = x.dtype;
    let data = match (x.data, y.data) {
        (ColumnData::Bool(a), ColumnData::Bool(b)) => ColumnData::Bool(pick(cond, &a, &b)),
        (ColumnData::Int(a), ColumnData::Int(b)) => ColumnData::Int(pick(cond, &a, &b)),
        (ColumnData::UInt(a), ColumnData::UInt(b)) => ColumnData::UInt(pick(cond, &a, &b)),
        (ColumnData::Float(a), ColumnData::Float(b)) => ColumnData::Float(pick(cond, &a, &b)),
        (ColumnData::Complex(a), ColumnData::Complex(b)) => {
            ColumnData::Complex(pick(cond, &a, &b))
        }
        (ColumnData::Str(a), ColumnData::Str(b)) => ColumnData::Str(pick(cond, &a, &b)),
        (a, b) => unreachable!("where branches disagree: {a:?} vs {b:?}"),
    };
    Column::new(dtype, data)
}

fn string_test(builtin: Builtin, haystack: &Column, needle: &Column) -> Column {
    let (ColumnData::Str(a), ColumnData::Str(b)) = (&haystack.data, &needle.data) else {
        unreachable!("string function over non-string operands");
    };
    Column::bools(zip_map(a, b, |s, t| match builtin {
        Builtin::StartsWith => s.starts_with(t),
        Builtin::EndsWith => s.ends_with(t),
        _ => t.is_empty() || s.windows(t.len()).any(|w| w == t.as_slice()),
    }))
}

fn float_sign(x: f64) -> f64 {
    if x.is_nan() {
        x
    } else if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Functions whose result keeps the operand dtype (or its real component).
fn preserving(builtin: Builtin, arg: Column, output: Dtype) -> Column {
    let dtype = arg.dtype;
    let data = match (builtin, arg.data) {
        (Builtin::Abs, ColumnData::Int(v)) => {
            ColumnData::Int(v.into_iter().map(|x| dtype.wrap_i64(x.wrapping_abs())).collect())
        }
        (Builtin::Abs, ColumnData::Float(v)) => ColumnData::Float(v.into_iter().map(f64::abs).collect()),
        (Builtin::Abs, ColumnData::Complex(v)) => {
            ColumnData::Float(v.into_iter().map(Complex::abs).collect())
        }
        (Builtin::Real, ColumnData::Complex(v)) => {
            ColumnData::Float(v.into_iter().map(|c| c.re).collect())
        }
        (Builtin::Imag, ColumnData::Complex(v)) => {
            ColumnData::Float(v.into_iter().map(|c| c.im).collect())
        }
        (Builtin::Imag, data) => {
            let len = Column::new(dtype, data).len();
            return Column::filled(&Scalar::zero(output), output, len);
        }
        (Builtin::Conj, ColumnData::Complex(v)) => {
            ColumnData::Complex(v.into_iter().map(Complex::conj).collect())
        }
        (Builtin::Ceil, ColumnData::Float(v)) => ColumnData::Float(v.into_iter().map(f64::ceil).collect()),
        (Builtin::Floor, ColumnData::Float(v)) => {
            ColumnData::Float(v.into_iter().map(f64::floor).collect())
        }
        (Builtin::Round, ColumnData::Float(v)) => {
            ColumnData::Float(v.into_iter().map(f64::round).collect())
        }
        (Builtin::Rint, ColumnData::Float(v)) => {
            ColumnData::Float(v.into_iter().map(f64::round_ties_even).collect())
        }
        (Builtin::Trunc, ColumnData::Float(v)) => {
            ColumnData::Float(v.into_iter().map(f64::trunc).collect())
        }
        (Builtin::Sign, ColumnData::Int(v)) => ColumnData::Int(v.into_iter().map(i64::signum).collect()),
        (Builtin::Sign, ColumnData::UInt(v)) => {
            ColumnData::UInt(v.into_iter().map(|x| u64::from(x > 0)).collect())
        }
        (Builtin::Sign, ColumnData::Float(v)) => ColumnData::Float(v.into_iter().map(float_sign).collect()),
        (Builtin::Square, ColumnData::Int(v)) => {
            ColumnData::Int(v.into_iter().map(|x| dtype.wrap_i64(x.wrapping_mul(x))).collect())
        }
        (Builtin::Square, ColumnData::UInt(v)) => {
            ColumnData::UInt(v.into_iter().map(|x| dtype.wrap_u64(x.wrapping_mul(x))).collect())
        }
        (Builtin::Square, ColumnData::Float(v)) => {
            let single = dtype == Dtype::Float32;
            ColumnData::Float(
                v.into_iter()
                    .map(|x| if single { round_f32(x * x) } else { x * x })
                    .collect(),
            )
        }
        // Integral rounding, unsigned abs and bool operands are identities.
        (_, data) => data,
    };
    Column::new(dtype, data).cast(output)
}
