//! Index chains, assignment and deletion through the public API.

use matval_value::matval_array::{DenseArray, Range};
use matval_value::*;

fn idx(values: &[f64]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}

#[test]
fn test_out_of_range_names_position_and_dims() {
    let a = Value::matrix((1..=25).map(f64::from).collect(), 5, 5).expect("5x5");
    let err = a.index(&idx(&[7.0, 1.0])).expect_err("a(7, 1)");
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(err.to_string(), "index (7,_): out of bound 5 (dimensions are 5x5)");
    assert_eq!(err.identifier(), "MatVal:index-out-of-bounds");
}

#[test]
fn test_assigned_values_read_back() {
    let mut a = Value::default();
    for k in 1..=4 {
        let v = f64::from(k * k);
        a.assign(&idx(&[1.0, f64::from(k)]), &Value::from(v)).expect("a(1, k) = k^2");
        assert_eq!(a.index(&idx(&[1.0, f64::from(k)])).expect("read"), Value::from(v));
    }
    assert_eq!(a, Value::row(vec![1.0, 4.0, 9.0, 16.0]));
}

#[test]
fn test_logical_mask_selects() {
    let a = Value::row(vec![5.0, 6.0, 7.0]);
    let mask = Value::BoolMatrix(DenseArray::row(vec![true, false, true]));
    assert_eq!(a.index(&[mask]).expect("mask"), Value::row(vec![5.0, 7.0]));
    assert!(a.index(&idx(&[0.0])).is_err());
    assert!(a.index(&idx(&[1.5])).is_err());
}

#[test]
fn test_range_index_stays_exact() {
    let r = Value::Range(Range::new(0.0, 0.1, 1.0).expect("0:0.1:1"));
    let picked = r
        .index(&[Value::Range(Range::new(11.0, -5.0, 1.0).expect("11:-5:1"))])
        .expect("r(11:-5:1)");
    let picked = picked.array_value().expect("real");
    assert_eq!(picked.elem(0).to_bits(), 1.0f64.to_bits());
    assert_eq!(picked.numel(), 3);
}

#[test]
fn test_nested_chain_builds_containers() {
    let mut v = Value::Undefined;
    let chain = [
        Subscript::Dot("data".to_string()),
        Subscript::Brace(idx(&[2.0])),
        Subscript::Paren(idx(&[3.0])),
    ];
    v.subsasgn(&chain, &Value::from(8.0)).expect("v.data{2}(3) = 8");
    assert!(v.is_struct());
    let data = v.subsref(&chain[..1]).expect("v.data");
    assert_eq!(data[0].kind(), Kind::Cell);
    assert_eq!(data[0].numel(), 2);
    let got = v.subsref(&chain).expect("v.data{2}(3)");
    assert_eq!(got, vec![Value::from(8.0)]);
    let inner = v.subsref(&chain[..2]).expect("v.data{2}");
    assert_eq!(inner, vec![Value::row(vec![0.0, 0.0, 8.0])]);
}

#[test]
fn test_brace_lists_cannot_be_indexed_further() {
    let c = Value::cell(vec![Value::from(1.0), Value::from(2.0)], [1, 2]).expect("cell");
    let all = c.subsref(&[Subscript::Brace(vec![Value::MagicColon])]).expect("c{:}");
    assert_eq!(all.len(), 2);
    let err = c
        .subsref(&[Subscript::Brace(vec![Value::MagicColon]), Subscript::Paren(idx(&[1.0]))])
        .expect_err("c{:}(1)");
    assert_eq!(err.kind(), ErrorKind::BadIndex);
}

#[test]
fn test_copies_do_not_see_assignment() {
    let a = Value::row(vec![1.0, 2.0, 3.0]);
    let mut b = a.clone();
    b.assign(&idx(&[2.0]), &Value::from(20.0)).expect("b(2) = 20");
    assert_eq!(a, Value::row(vec![1.0, 2.0, 3.0]));
    assert_eq!(b, Value::row(vec![1.0, 20.0, 3.0]));
}

#[test]
fn test_char_assignment_from_bool_goes_double() {
    let mut s = Value::str("ab");
    s.assign(&idx(&[1.0]), &Value::Bool(true)).expect("s(1) = true");
    assert_eq!(s, Value::row(vec![1.0, 98.0]));
}

#[test]
fn test_deleting_from_a_range() {
    let mut r = Value::Range(Range::new(1.0, 1.0, 5.0).expect("1:5"));
    r.delete_elements(&idx(&[1.0])).expect("r(1) = []");
    assert_eq!(r, Value::row(vec![2.0, 3.0, 4.0, 5.0]));
}
