//! Engine settings that change the shape of results.
//!
//! The configuration is process-global, so everything runs inside one test
//! and the previous settings are put back at the end.

use matval_value::matval_array::{
    engine_config, set_engine_config, DenseArray, EngineConfigBuilder, Range, SparseArray,
};
use matval_value::*;

fn dense_pattern_sparse() -> Value {
    let full = DenseArray::from_vec(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).expect("2x2");
    Value::Sparse(SparseArray::from_dense(&full).expect("sparse"))
}

fn one_to_three() -> Value {
    Value::Range(Range::new(1.0, 1.0, 3.0).expect("1:3"))
}

fn fractional_range() -> Value {
    Value::Range(Range::new(1.5, 1.0, 3.5).expect("1.5:3.5"))
}

#[test]
fn test_engine_settings_shape_results() {
    let saved = engine_config();
    let row = Value::row(vec![10.0, 20.0, 30.0, 40.0]);

    // defaults keep sparse and lazy results as they are
    set_engine_config(EngineConfigBuilder::new().build().expect("defaults")).expect("apply");
    let scaled = Value::binary_op(BinaryOp::Mul, &dense_pattern_sparse(), &Value::from(2.0))
        .expect("s * 2");
    assert_eq!(scaled.kind(), Kind::Sparse);
    let shifted = Value::binary_op(BinaryOp::Add, &one_to_three(), &Value::from(1.0)).expect("(1:3)+1");
    assert_eq!(shifted.kind(), Kind::Range);
    let err = row.index(&[fractional_range()]).expect_err("x(1.5:3.5)");
    assert_eq!(err.kind(), ErrorKind::BadIndex);

    let eager = EngineConfigBuilder::new()
        .sparse_auto_mutate(true)
        .lazy_ranges(false)
        .allow_noninteger_range_index(true)
        .build()
        .expect("eager config");
    set_engine_config(eager).expect("apply");

    let scaled = Value::binary_op(BinaryOp::Mul, &dense_pattern_sparse(), &Value::from(2.0))
        .expect("s * 2");
    assert_eq!(scaled.kind(), Kind::DoubleMatrix);
    assert_eq!(scaled, Value::matrix(vec![2.0, 4.0, 6.0, 8.0], 2, 2).expect("2x2"));

    let shifted = Value::binary_op(BinaryOp::Add, &one_to_three(), &Value::from(1.0)).expect("(1:3)+1");
    assert_eq!(shifted.kind(), Kind::DoubleMatrix);
    assert_eq!(shifted, Value::row(vec![2.0, 3.0, 4.0]));

    let picked = row.index(&[fractional_range()]).expect("x(1.5:3.5)");
    assert_eq!(picked, Value::row(vec![10.0, 20.0, 30.0]));

    set_engine_config(saved).expect("restore");
}
