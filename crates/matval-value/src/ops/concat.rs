//! Concatenation rules.
//!
//! The result kind of `[a, b]` is decided from the two operand kinds alone;
//! the operands are then converted to that element type and joined.

use matval_array::{DenseArray, SparseArray};

use crate::dispatch::CatFn;
use crate::error::Result;
use crate::int::IntArray;
use crate::kind::Kind;
use crate::value::Value;

fn join<T: Clone>(dim: usize, a: &DenseArray<T>, b: &DenseArray<T>) -> Result<DenseArray<T>> {
    Ok(DenseArray::cat(dim, &[a, b])?)
}

fn join_sparse<T: matval_array::Element>(
    dim: usize,
    a: &SparseArray<T>,
    b: &SparseArray<T>,
) -> Result<SparseArray<T>> {
    Ok(SparseArray::cat(dim, &[a, b])?)
}

fn cat_null(a: &Value, b: &Value, _dim: usize) -> Result<Value> {
    Ok(if a.is_null() { b.storable_value() } else { a.storable_value() })
}

fn as_cell(v: &Value) -> DenseArray<Value> {
    match v {
        Value::Cell(c) => c.clone(),
        other => DenseArray::scalar(other.clone()),
    }
}

fn cat_cell(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(Value::Cell(join(dim, &as_cell(a), &as_cell(b))?))
}

fn cat_sparse(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(if a.is_complex() || b.is_complex() {
        Value::SparseComplex(join_sparse(dim, &a.sparse_complex_value()?, &b.sparse_complex_value()?)?)
    } else if a.kind() == Kind::SparseBool && b.kind() == Kind::SparseBool {
        Value::SparseBool(join_sparse(dim, &a.sparse_bool_value()?, &b.sparse_bool_value()?)?)
    } else {
        Value::Sparse(join_sparse(dim, &a.sparse_value()?, &b.sparse_value()?)?)
    })
}

/// The leftmost integer class wins; other operands are rounded into it.
fn cat_int(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    let Some(class) = a.kind().int_class().or(b.kind().int_class()) else {
        return cat_double(a, b, dim);
    };
    let wide = join(
        dim,
        &a.int_array_value(class)?.to_wide()?,
        &b.int_array_value(class)?.to_wide()?,
    )?;
    Ok(Value::IntMatrix(IntArray::from_wide(class, &wide)?))
}

fn cat_char(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(Value::Char(join(dim, &a.char_array_value()?, &b.char_array_value()?)?))
}

fn cat_single(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(Value::SingleMatrix(join(dim, &a.float_array_value()?, &b.float_array_value()?)?))
}

fn cat_float_complex(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(Value::FloatComplexMatrix(join(
        dim,
        &a.float_complex_array_value()?,
        &b.float_complex_array_value()?,
    )?))
}

fn cat_bool(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(Value::BoolMatrix(join(dim, &a.bool_array_value()?, &b.bool_array_value()?)?))
}

fn cat_complex(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(Value::ComplexMatrix(join(dim, &a.complex_array_value()?, &b.complex_array_value()?)?))
}

fn cat_double(a: &Value, b: &Value, dim: usize) -> Result<Value> {
    Ok(Value::DoubleMatrix(join(dim, &a.array_value()?, &b.array_value()?)?))
}

/// Concatenation handler for a pair of kinds, or `None` when the pair
/// cannot be joined.
pub(crate) fn cat_rule(ka: Kind, kb: Kind) -> Option<CatFn> {
    let either = |f: fn(Kind) -> bool| f(ka) || f(kb);
    let both = |f: fn(Kind) -> bool| f(ka) && f(kb);
    if either(|k| matches!(k, Kind::Undefined | Kind::MagicColon)) {
        return None;
    }
    if either(|k| k == Kind::Null) {
        return Some(cat_null);
    }
    if either(|k| k == Kind::Cell) {
        return Some(cat_cell);
    }
    if either(|k| k == Kind::Struct) {
        return None;
    }
    if either(Kind::is_sparse) {
        let joinable = |k: Kind| {
            k.is_sparse()
                || k == Kind::Range
                || matches!(
                    k.matrix_kind(),
                    Kind::DoubleMatrix | Kind::ComplexMatrix | Kind::BoolMatrix
                )
        };
        return both(joinable).then_some(cat_sparse as CatFn);
    }
    if either(|k| k.int_class().is_some()) {
        return Some(cat_int);
    }
    if either(|k| k == Kind::Char) {
        return Some(cat_char);
    }
    if either(Kind::is_single) {
        return Some(if either(Kind::is_complex) {
            cat_float_complex
        } else {
            cat_single
        });
    }
    if both(Kind::is_bool) {
        return Some(cat_bool);
    }
    if either(Kind::is_complex) {
        return Some(cat_complex);
    }
    both(Kind::is_numeric_like).then_some(cat_double as CatFn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::IntClass;

    fn cat(a: &Value, b: &Value, dim: usize) -> Result<Value> {
        let rule = cat_rule(a.kind(), b.kind()).expect("rule");
        rule(a, b, dim)
    }

    #[test]
    fn integer_class_wins() {
        let v = cat(&Value::from(1i8), &Value::from(2.7), 1).expect("cat");
        assert_eq!(v, Value::from(DenseArray::row(vec![1i8, 3])));
        let v = cat(&Value::from(2.0), &Value::from(300u16), 1).expect("cat");
        assert_eq!(v.kind(), Kind::IntMatrix(IntClass::U16));
    }

    #[test]
    fn numbers_join_text_as_char() {
        let v = cat(&Value::from(72.0), &Value::str("i"), 1).expect("cat");
        assert_eq!(v.string_value().expect("row"), "Hi");
    }

    #[test]
    fn cells_absorb_other_values() {
        let c = Value::cell(vec![Value::from(1.0)], [1, 1]).expect("cell");
        let v = cat(&c, &Value::str("x"), 1).expect("cat");
        assert_eq!(v.kind(), Kind::Cell);
        assert_eq!(v.numel(), 2);
    }

    #[test]
    fn structs_and_colon_do_not_join() {
        assert!(cat_rule(Kind::Struct, Kind::Double).is_none());
        assert!(cat_rule(Kind::MagicColon, Kind::Double).is_none());
        assert!(cat_rule(Kind::Sparse, Kind::Char).is_none());
    }

    #[test]
    fn mismatched_rows_fail() {
        let err = cat(&Value::row(vec![1.0, 2.0]), &Value::row(vec![1.0, 2.0, 3.0]), 0)
            .expect_err("vertical");
        assert!(err.to_string().starts_with("vertical dimensions mismatch (1x2 vs 1x3)"));
    }
}
