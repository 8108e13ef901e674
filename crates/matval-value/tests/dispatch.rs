//! Operator resolution across the arithmetic kinds.

use matval_value::matval_array::DenseArray;
use matval_value::*;

fn arithmetic_kinds() -> Vec<Kind> {
    let mut kinds = Kind::FLOAT.to_vec();
    for class in IntClass::ALL {
        kinds.push(Kind::IntScalar(class));
        kinds.push(Kind::IntMatrix(class));
    }
    kinds.extend([Kind::Bool, Kind::BoolMatrix]);
    kinds
}

fn mixed_int_arithmetic(op: BinaryOp, a: Kind, b: Kind) -> bool {
    match (a.int_class(), b.int_class()) {
        (Some(x), Some(y)) => x != y && !op.is_comparison() && !op.is_logical(),
        _ => false,
    }
}

#[test]
fn test_real_pairs_resolve() {
    let table = initialize_dispatch();
    let kinds = arithmetic_kinds();
    for &a in &kinds {
        for &b in &kinds {
            if a.is_complex() && b.int_class().is_some() || b.is_complex() && a.int_class().is_some() {
                continue;
            }
            for op in BinaryOp::ALL {
                let expected = !mixed_int_arithmetic(op, a, b);
                assert_eq!(
                    table.resolves(op, a, b),
                    expected,
                    "{} {} {}",
                    a.type_name(),
                    op.symbol(),
                    b.type_name()
                );
            }
        }
    }
}

#[test]
fn test_every_arithmetic_kind_has_unary_ops() {
    let table = initialize_dispatch();
    for kind in arithmetic_kinds() {
        for op in [UnaryOp::UMinus, UnaryOp::Transpose] {
            let direct = table.lookup_unary(op, kind).is_some();
            let converted = table
                .conversion_target(kind)
                .is_some_and(|to| table.lookup_unary(op, to).is_some());
            assert!(direct || converted, "{} {}", op.symbol(), kind.type_name());
        }
    }
}

#[test]
fn test_integers_reject_complex_partners() {
    let a = Value::from(DenseArray::row(vec![1i8, 2]));
    let z = Value::Complex(num_complex::Complex64::new(0.0, 1.0));
    let err = Value::binary_op(BinaryOp::Add, &a, &z).expect_err("int8 + i");
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    assert_eq!(err.identifier(), "MatVal:undefined-operation");
}

#[test]
fn test_results_narrow() {
    let m = Value::matrix(vec![1.0, 2.0, 3.0, 4.0], 2, 2).expect("2x2");
    let row = Value::row(vec![1.0, 1.0]);
    let col = Value::matrix(vec![1.0, 1.0], 2, 1).expect("2x1");
    let v = Value::binary_op(BinaryOp::Mul, &Value::binary_op(BinaryOp::Mul, &row, &m).expect("row*m"), &col)
        .expect("(row*m)*col");
    assert_eq!(v, Value::from(10.0));

    let z = Value::ComplexMatrix(
        DenseArray::row(vec![num_complex::Complex64::new(1.0, 2.0), num_complex::Complex64::new(3.0, -2.0)]),
    );
    let conj = Value::unary_op(UnaryOp::Hermitian, &z).expect("z'");
    let sum = Value::binary_op(BinaryOp::Add, &z, &Value::unary_op(UnaryOp::Transpose, &conj).expect(".'"))
        .expect("z + conj(z)");
    assert_eq!(sum, Value::row(vec![2.0, 6.0]));
}

#[test]
fn test_broadcasting_reports_both_shapes() {
    let a = Value::matrix(vec![1.0; 6], 2, 3).expect("2x3");
    let b = Value::row(vec![1.0, 2.0, 3.0]);
    let sum = Value::binary_op(BinaryOp::Add, &a, &b).expect("[2x3] + [1x3]");
    assert_eq!(sum.dims().as_slice(), &[2, 3]);
    let err = Value::binary_op(BinaryOp::Add, &a, &Value::row(vec![1.0, 2.0])).expect_err("[2x3] + [1x2]");
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    assert_eq!(
        err.to_string(),
        "operator +: nonconformant arguments (op1 is 2x3, op2 is 1x2)"
    );
}

#[test]
fn test_compound_and_increment() {
    let mut v = Value::row(vec![1.0, 2.0]);
    v.assign_op(BinaryOp::Mul, &Value::from(3.0)).expect("*=");
    assert_eq!(v, Value::row(vec![3.0, 6.0]));
    v.assign_indexed_op(&[Value::from(2.0)], BinaryOp::Sub, &Value::from(1.0))
        .expect("v(2) -= 1");
    assert_eq!(v, Value::row(vec![3.0, 5.0]));
    let mut n = Value::from(7u8);
    n.non_const_unary_op(UnaryOp::Incr).expect("++");
    assert_eq!(n, Value::from(8u8));
}

#[test]
fn test_logical_ops_reject_nan() {
    let err = Value::binary_op(BinaryOp::And, &Value::from(f64::NAN), &Value::Bool(true))
        .expect_err("NaN & true");
    assert!(err.to_string().contains("NaN"));
    let v = Value::binary_op(BinaryOp::Or, &Value::from(0.0), &Value::from(2.0)).expect("0 | 2");
    assert_eq!(v, Value::Bool(true));
}
