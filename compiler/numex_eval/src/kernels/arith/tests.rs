use super::*;
use pretty_assertions::assert_eq;

fn ints(dtype: Dtype, values: &[i64]) -> Column {
    Column::new(dtype, ColumnData::Int(values.to_vec()))
}

fn floats(dtype: Dtype, values: &[f64]) -> Column {
    Column::new(dtype, ColumnData::Float(values.to_vec()))
}

#[test]
fn integer_arithmetic_wraps_to_width() {
    let out = binary(BinaryOp::Add, ints(Dtype::Int8, &[127, -128]), ints(Dtype::Int8, &[1]));
    assert_eq!(out.data, ColumnData::Int(vec![-128, -127]));

    let out = binary(
        BinaryOp::Mul,
        Column::new(Dtype::UInt8, ColumnData::UInt(vec![16])),
        Column::new(Dtype::UInt8, ColumnData::UInt(vec![17])),
    );
    assert_eq!(out.data, ColumnData::UInt(vec![16]));
}

#[test]
fn integer_division_by_zero_is_zero() {
    let out = binary(BinaryOp::Div, ints(Dtype::Int32, &[7, -7, 5]), ints(Dtype::Int32, &[2, 2, 0]));
    assert_eq!(out.data, ColumnData::Int(vec![3, -3, 0]));
    let out = binary(BinaryOp::Mod, ints(Dtype::Int64, &[i64::MIN, 5]), ints(Dtype::Int64, &[-1, 0]));
    assert_eq!(out.data, ColumnData::Int(vec![0, 0]));
}

#[test]
fn integer_powers() {
    let out = binary(
        BinaryOp::Pow,
        ints(Dtype::Int64, &[2, -1, -1, 3, 1]),
        ints(Dtype::Int64, &[10, -3, -2, -1, -5]),
    );
    assert_eq!(out.data, ColumnData::Int(vec![1024, -1, 1, 0, 1]));
}

#[test]
fn shifts_outside_the_width() {
    let out = binary(BinaryOp::Shl, ints(Dtype::Int64, &[1, 1]), ints(Dtype::Int64, &[3, 64]));
    assert_eq!(out.data, ColumnData::Int(vec![8, 0]));
    let out = binary(BinaryOp::Shr, ints(Dtype::Int64, &[-8, -8]), ints(Dtype::Int64, &[1, 70]));
    assert_eq!(out.data, ColumnData::Int(vec![-4, -1]));
}

#[test]
fn float32_results_are_rounded() {
    let out = binary(BinaryOp::Div, floats(Dtype::Float32, &[1.0]), floats(Dtype::Float32, &[3.0]));
    assert_eq!(out.data, ColumnData::Float(vec![f64::from(1.0f32 / 3.0)]));
}

#[test]
fn float_modulo_keeps_dividend_sign() {
    let out = binary(BinaryOp::Mod, floats(Dtype::Float64, &[-7.5]), floats(Dtype::Float64, &[2.0]));
    assert_eq!(out.data, ColumnData::Float(vec![-1.5]));
}

#[test]
fn comparisons_produce_bools() {
    let out = binary(BinaryOp::Lt, floats(Dtype::Float64, &[1.0, f64::NAN, 3.0]), floats(Dtype::Float64, &[2.0]));
    assert_eq!(out.dtype, Dtype::Bool);
    assert_eq!(out.data, ColumnData::Bool(vec![true, false, false]));

    let a = Column::new(Dtype::String, ColumnData::Str(vec![vec![97, 98], vec![98]]));
    let b = Column::new(Dtype::String, ColumnData::Str(vec![vec![97, 98]]));
    assert_eq!(binary(BinaryOp::Eq, a.clone(), b.clone()).data, ColumnData::Bool(vec![true, false]));
    assert_eq!(binary(BinaryOp::Gt, a, b).data, ColumnData::Bool(vec![false, true]));
}

#[test]
fn logical_operators_test_truth() {
    let out = binary(BinaryOp::And, floats(Dtype::Float64, &[0.0, 2.0]), ints(Dtype::Int32, &[5]));
    assert_eq!(out.data, ColumnData::Bool(vec![false, true]));
    let out = unary(UnaryOp::Not, ints(Dtype::Int32, &[0, 3]));
    assert_eq!(out.data, ColumnData::Bool(vec![true, false]));
}

#[test]
fn complex_arithmetic() {
    let a = Column::new(Dtype::Complex128, ColumnData::Complex(vec![Complex::new(1.0, 2.0)]));
    let b = Column::new(Dtype::Complex128, ColumnData::Complex(vec![Complex::new(3.0, -1.0)]));
    let out = binary(BinaryOp::Mul, a.clone(), b);
    assert_eq!(out.data, ColumnData::Complex(vec![Complex::new(5.0, 5.0)]));
    assert_eq!(
        unary(UnaryOp::Neg, a).data,
        ColumnData::Complex(vec![Complex::new(-1.0, -2.0)])
    );
}

#[test]
fn negation_and_bit_not_wrap() {
    assert_eq!(unary(UnaryOp::Neg, ints(Dtype::Int8, &[-128])).data, ColumnData::Int(vec![-128]));
    let u = Column::new(Dtype::UInt8, ColumnData::UInt(vec![1]));
    assert_eq!(unary(UnaryOp::Neg, u.clone()).data, ColumnData::UInt(vec![255]));
    assert_eq!(unary(UnaryOp::BitNot, u).data, ColumnData::UInt(vec![254]));
}

#[test]
fn bool_bitwise_stays_bool() {
    let a = Column::bools(vec![true, true, false]);
    let b = Column::bools(vec![true, false, false]);
    assert_eq!(binary(BinaryOp::BitXor, a, b).data, ColumnData::Bool(vec![false, true, false]));
}

#[test]
fn in_place_reuses_the_left_buffer() {
    let values = vec![7.0, -7.0, 1.5];
    let ptr = values.as_ptr();
    let left = Column::new(Dtype::Float64, ColumnData::Float(values));
    let out = binary_in_place(BinaryOp::Mul, left, floats(Dtype::Float64, &[2.0]));
    match &out.data {
        ColumnData::Float(v) => {
            assert_eq!(v, &vec![14.0, -14.0, 3.0]);
            assert_eq!(v.as_ptr(), ptr);
        }
        other => panic!("expected floats, got {other:?}"),
    }
}

#[test]
fn in_place_matches_the_allocating_kernel() {
    let cases = [
        (BinaryOp::Div, ints(Dtype::Int32, &[7, -7, 5]), ints(Dtype::Int32, &[2, 2, 0])),
        (BinaryOp::Add, ints(Dtype::Int8, &[127, -128]), ints(Dtype::Int8, &[1])),
        (BinaryOp::Sub, ints(Dtype::Int16, &[4]), ints(Dtype::Int16, &[1, 2, 3])),
        (BinaryOp::Lt, ints(Dtype::Int32, &[1, 5]), ints(Dtype::Int32, &[3, 3])),
    ];
    for (op, a, b) in cases {
        assert_eq!(binary_in_place(op, a.clone(), b.clone()), binary(op, a, b), "{op:?}");
    }
    let a = floats(Dtype::Float32, &[0.1, 0.2]);
    let b = floats(Dtype::Float32, &[0.2, 0.3]);
    assert_eq!(binary_in_place(BinaryOp::Add, a.clone(), b.clone()), binary(BinaryOp::Add, a, b));
}
