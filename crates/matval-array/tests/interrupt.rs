//! Cancellation leaves containers untouched.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use matval_array::*;

fn raised() -> InterruptGuard {
    replace_interrupt(Some(Arc::new(AtomicBool::new(true))))
}

#[test]
fn test_dense_assign_is_all_or_nothing() {
    let mut a = DenseArray::filled([3, 3], 1.0);
    let before = a.clone();
    let _guard = raised();
    let err = a
        .assign(&IndexVector::contiguous(0, 9), &DenseArray::scalar(7.0), &0.0)
        .expect_err("interrupted");
    assert_eq!(err, ArrayError::Interrupted);
    assert_eq!(a, before);
    assert!(a.shares_storage_with(&before));
}

#[test]
fn test_sparse_assign_is_all_or_nothing() {
    let mut s = SparseArray::from_dense(&DenseArray::filled([2, 2], 2.0)).expect("2-D");
    let before = s.clone();
    let _guard = raised();
    let err = s
        .assign(&IndexVector::scalar(3), &SparseArray::filled(1, 1, 1.0))
        .expect_err("interrupted");
    assert_eq!(err, ArrayError::Interrupted);
    assert_eq!(s, before);
    assert_eq!(s.dims().as_slice(), &[2, 2]);
}

#[test]
fn test_long_loops_stop() {
    let _guard = raised();
    let a = DenseArray::filled([100, 100], 1.0);
    assert_eq!(a.map(|v| v * 2.0), Err(ArrayError::Interrupted));
    let triplets = SparseArray::from_triplets(&[1.0], &[0], &[0], 4, 4, true, None);
    assert_eq!(triplets.expect_err("interrupted"), ArrayError::Interrupted);
    assert_eq!(
        Range::new(0.0, 1.0, 5.0).expect("finite").index(&IndexVector::from_vec(vec![0, 2, 4])),
        Err(ArrayError::Interrupted)
    );
}

#[test]
fn test_cleared_flag_allows_work() {
    let flag = Arc::new(AtomicBool::new(false));
    let _guard = replace_interrupt(Some(flag));
    let a = DenseArray::filled([10, 10], 1.0);
    assert!(a.map(|v| v + 1.0).is_ok());
}
