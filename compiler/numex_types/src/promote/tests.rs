use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use numex_ir::Dtype::{
    Bool, Complex128, Complex64, Float32, Float64, Int16, Int32, Int64, Int8, UInt16, UInt32,
    UInt64, UInt8,
};

#[test]
fn commutative_over_every_pair() {
    for a in Dtype::CONCRETE {
        for b in Dtype::CONCRETE {
            assert_eq!(promote(a, b), promote(b, a), "promote({a}, {b})");
        }
    }
}

#[test]
fn bool_is_the_identity() {
    for a in Dtype::CONCRETE {
        assert_eq!(promote(Bool, a), a);
    }
}

#[test]
fn mixed_signedness_doubles_the_wider_width() {
    assert_eq!(promote(Int8, UInt8), Int16);
    assert_eq!(promote(Int16, UInt8), Int32);
    assert_eq!(promote(Int8, UInt16), Int32);
    assert_eq!(promote(Int16, UInt16), Int32);
    assert_eq!(promote(Int32, UInt8), Int64);
    assert_eq!(promote(Int32, UInt16), Int64);
    assert_eq!(promote(Int32, UInt32), Int64);
    assert_eq!(promote(Int8, UInt32), Int64);
}

#[test]
fn mixed_signedness_at_64_bits_is_float64() {
    assert_eq!(promote(Int64, UInt8), Float64);
    assert_eq!(promote(Int64, UInt16), Float64);
    assert_eq!(promote(Int64, UInt32), Float64);
    assert_eq!(promote(Int64, UInt64), Float64);
    assert_eq!(promote(Int8, UInt64), Float64);
}

#[test]
fn same_signedness_keeps_the_wider() {
    assert_eq!(promote(Int8, Int64), Int64);
    assert_eq!(promote(UInt16, UInt32), UInt32);
    assert_eq!(promote(UInt64, UInt8), UInt64);
}

#[test]
fn float32_only_holds_small_ints() {
    assert_eq!(promote(Float32, Int16), Float32);
    assert_eq!(promote(Float32, UInt8), Float32);
    assert_eq!(promote(Float32, Int32), Float64);
    assert_eq!(promote(Float32, UInt64), Float64);
}

#[test]
fn complex_widening() {
    assert_eq!(promote(Complex64, Float32), Complex64);
    assert_eq!(promote(Complex64, Int16), Complex64);
    assert_eq!(promote(Complex64, Float64), Complex128);
    assert_eq!(promote(Complex64, Int32), Complex128);
    assert_eq!(promote(Complex64, Complex128), Complex128);
}

#[test]
fn string_absorbs() {
    assert_eq!(promote(Dtype::String, Float64), Dtype::String);
    assert_eq!(promote(Dtype::String, Bool), Dtype::String);
}

#[test]
fn fold_starts_from_bool() {
    assert_eq!(promote_all([]), Bool);
    assert_eq!(promote_all([Int8, UInt8, Float32]), Float32);
}

#[test]
fn float_math_operands() {
    assert_eq!(float_math_dtype(Int32), Float64);
    assert_eq!(float_math_dtype(Bool), Float64);
    assert_eq!(float_math_dtype(Float32), Float32);
    assert_eq!(float_math_dtype(Complex64), Complex64);
}

#[test]
#[should_panic(expected = "auto dtype reached promotion")]
fn auto_is_an_internal_error() {
    let _ = promote(Dtype::Auto, Float64);
}

fn concrete() -> impl Strategy<Value = Dtype> {
    prop::sample::select(Dtype::CONCRETE.to_vec())
}

proptest! {
    #[test]
    fn promotion_never_narrows(a in concrete(), b in concrete()) {
        prop_assume!(!a.is_string() && !b.is_string());
        let p = promote(a, b);
        prop_assert!(p.size() >= a.size().max(b.size()), "promote({}, {}) = {}", a, b, p);
    }
}
