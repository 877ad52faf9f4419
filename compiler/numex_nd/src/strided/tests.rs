use super::*;
use numex_compile::compile_expr_nd;
use numex_ir::VarDesc;
use pretty_assertions::assert_eq;

fn compiled(text: &str) -> Tree {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    compile_expr_nd(text, &vars, Dtype::Auto, &[5, 5], &[6, 6], &[3, 3]).unwrap()
}

fn corner(tree: &Tree) -> BlockLayout {
    tree.geometry().unwrap().block_layout(0, 3).unwrap()
}

fn reduce(text: &str, block: &[f64]) -> Option<Scalar> {
    let tree = compiled(text);
    let (op, arg) = tree.root_reduction().unwrap();
    let strided = StridedArg::detect(&tree, arg)?;
    let bytes: Vec<u8> = block.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let layout = corner(&tree);
    Some(
        strided
            .reduce(&tree, op, tree.node(arg).dtype, &[&bytes], &layout)
            .unwrap(),
    )
}

#[test]
fn detects_bare_variables_and_constant_comparisons() {
    let tree = compiled("sum(x)");
    let (_, arg) = tree.root_reduction().unwrap();
    assert_eq!(StridedArg::detect(&tree, arg), Some(StridedArg::Var { index: 0 }));

    let tree = compiled("all(3 <= x)");
    let (_, arg) = tree.root_reduction().unwrap();
    let Some(StridedArg::Compare {
        op,
        var_on_left,
        constant,
        input,
        ..
    }) = StridedArg::detect(&tree, arg)
    else {
        panic!("expected a comparison");
    };
    assert_eq!(op, BinaryOp::Le);
    assert!(!var_on_left);
    assert_eq!(constant, Scalar::Float(3.0));
    assert_eq!(input, Dtype::Float64);

    let tree = compiled("sum(x * 2)");
    let (_, arg) = tree.root_reduction().unwrap();
    assert_eq!(StridedArg::detect(&tree, arg), None);
}

#[test]
fn folds_only_the_valid_region() {
    let block: Vec<f64> = (1..=9).map(f64::from).collect();
    // Valid elements are 1, 2, 4 and 5.
    assert_eq!(reduce("sum(x)", &block), Some(Scalar::Float(12.0)));
    assert_eq!(reduce("max(x)", &block), Some(Scalar::Float(5.0)));
    assert_eq!(reduce("sum(x > 1.5)", &block), Some(Scalar::Int(3)));
    assert_eq!(reduce("any(x > 4)", &block), Some(Scalar::Bool(true)));
    assert_eq!(reduce("any(x > 5)", &block), Some(Scalar::Bool(false)));
    assert_eq!(reduce("all(3 <= x)", &block), Some(Scalar::Bool(false)));
}

#[test]
fn nan_poisons_min_wherever_it_appears() {
    for at in [0, 1, 3, 4] {
        let mut block: Vec<f64> = (1..=9).map(f64::from).collect();
        block[at] = f64::NAN;
        let Some(Scalar::Float(value)) = reduce("min(x)", &block) else {
            panic!("expected a float");
        };
        assert!(value.is_nan(), "NaN at {at}");
    }
    // Padding is never read.
    let mut block: Vec<f64> = (1..=9).map(f64::from).collect();
    block[8] = f64::NAN;
    assert_eq!(reduce("min(x)", &block), Some(Scalar::Float(1.0)));
}
