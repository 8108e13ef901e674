//! Indexed assignment: `a(idx) = rhs`.
//!
//! The container kind after the assignment is looked up from the pair of
//! kinds. When it differs from the current kind the container is widened
//! first, then `rhs` is converted to the container's element type and
//! written through the typed container.

use std::mem;

use matval_array::IndexVector;
use num_complex::{Complex32, Complex64};

use crate::dispatch::dispatch_table;
use crate::error::{assign_undefined, bad_index, Result};
use crate::int::IntArray;
use crate::kind::Kind;
use crate::value::{check_struct_subscripts, index_vectors, Value};

/// Kind a `lhs`-kinded container has after `lhs(idx) = rhs`.
pub(crate) fn assign_rule(lhs: Kind, rhs: Kind) -> Option<Kind> {
    if matches!(rhs, Kind::Undefined | Kind::MagicColon | Kind::Null) {
        return None;
    }
    match (lhs, rhs) {
        (Kind::Undefined, Kind::Cell | Kind::Struct) => Some(rhs),
        (Kind::Undefined, _) => Some(rhs.matrix_kind()),
        (Kind::Null | Kind::MagicColon, _) => None,
        (Kind::Cell, Kind::Cell) => Some(Kind::Cell),
        (Kind::Struct, Kind::Struct) => Some(Kind::Struct),
        (Kind::Cell | Kind::Struct, _) | (_, Kind::Cell | Kind::Struct) => None,
        _ => numeric_rule(lhs.matrix_kind(), rhs.matrix_kind()),
    }
}

fn full_counterpart(k: Kind) -> Kind {
    match k {
        Kind::Sparse => Kind::DoubleMatrix,
        Kind::SparseComplex => Kind::ComplexMatrix,
        Kind::SparseBool => Kind::BoolMatrix,
        other => other,
    }
}

fn numeric_rule(l: Kind, r: Kind) -> Option<Kind> {
    if !l.is_numeric_like() || !r.is_numeric_like() {
        return None;
    }
    match (l.int_class(), r.int_class()) {
        (Some(c), _) => return (!r.is_complex()).then_some(Kind::IntMatrix(c)),
        (None, Some(c)) => {
            return (!l.is_complex() && !l.is_sparse()).then_some(Kind::IntMatrix(c));
        }
        (None, None) => {}
    }
    if l.is_sparse() {
        return Some(match (l, r) {
            (Kind::SparseBool, Kind::SparseBool | Kind::BoolMatrix) => Kind::SparseBool,
            (Kind::SparseComplex, _) => Kind::SparseComplex,
            (_, k) if k.is_complex() => Kind::SparseComplex,
            _ => Kind::Sparse,
        });
    }
    if r.is_sparse() {
        return numeric_rule(l, full_counterpart(r));
    }
    let single = l.is_single() || r.is_single();
    let complex = l.is_complex() || r.is_complex();
    Some(match (l, r) {
        (Kind::BoolMatrix, Kind::BoolMatrix) => Kind::BoolMatrix,
        (Kind::Char, Kind::Char) => Kind::Char,
        (Kind::Char, Kind::BoolMatrix) => Kind::DoubleMatrix,
        (Kind::BoolMatrix, Kind::Char) => Kind::Char,
        _ => match (single, complex) {
            (true, true) => Kind::FloatComplexMatrix,
            (true, false) => Kind::SingleMatrix,
            (false, true) => Kind::ComplexMatrix,
            (false, false) => Kind::DoubleMatrix,
        },
    })
}

/// Re-express a container as the wider kind an assignment needs.
pub(crate) fn widen_container(v: &Value, to: Kind) -> Result<Value> {
    v.convert_to_kind(to)
}

macro_rules! assign_int_pair {
    ($lhs:expr, $rhs:expr, $ivs:expr, $($variant:ident),*) => {
        match ($lhs, $rhs) {
            $((IntArray::$variant(a), IntArray::$variant(b)) => a.assign_nd($ivs, &b, &Default::default())?,)*
            (a, b) => return Err(assign_undefined(
                &Kind::IntMatrix(a.class()).type_name(),
                &Kind::IntMatrix(b.class()).type_name(),
            )),
        }
    };
}

/// Write `rhs` into a container that already has the target kind.
fn assign_into(target: &mut Value, ivs: &[IndexVector], rhs: &Value) -> Result<()> {
    match target {
        Value::DoubleMatrix(a) => a.assign_nd(ivs, &rhs.array_value()?, &0.0)?,
        Value::SingleMatrix(a) => a.assign_nd(ivs, &rhs.float_array_value()?, &0.0)?,
        Value::ComplexMatrix(a) => {
            a.assign_nd(ivs, &rhs.complex_array_value()?, &Complex64::default())?
        }
        Value::FloatComplexMatrix(a) => {
            a.assign_nd(ivs, &rhs.float_complex_array_value()?, &Complex32::default())?
        }
        Value::IntMatrix(a) => {
            let converted = rhs.int_array_value(a.class())?;
            assign_int_pair!(a, converted, ivs, I8, I16, I32, I64, U8, U16, U32, U64)
        }
        Value::BoolMatrix(a) => a.assign_nd(ivs, &rhs.bool_array_value()?, &false)?,
        Value::Char(a) => a.assign_nd(ivs, &rhs.char_array_value()?, &'\0')?,
        Value::Sparse(s) => s.assign_nd(ivs, &rhs.sparse_value()?)?,
        Value::SparseComplex(s) => s.assign_nd(ivs, &rhs.sparse_complex_value()?)?,
        Value::SparseBool(s) => s.assign_nd(ivs, &rhs.sparse_bool_value()?)?,
        Value::Cell(c) => c.assign_nd(ivs, &rhs.cell_value()?, &Value::default())?,
        Value::Struct(_) => {
            check_struct_subscripts(ivs)?;
            *target = rhs.clone();
        }
        other => return Err(assign_undefined(&other.type_name(), &rhs.type_name())),
    }
    Ok(())
}

impl Value {
    /// `a(idx) = rhs`. Assigning `[]` deletes the selected elements. On
    /// failure `self` is left as it was.
    pub fn assign(&mut self, idx: &[Value], rhs: &Value) -> Result<()> {
        if rhs.is_null() {
            return self.delete_elements(idx);
        }
        if idx.is_empty() {
            return Err(bad_index("() assignment requires at least one subscript"));
        }
        let ivs = index_vectors(idx)?;
        let table = dispatch_table();
        let (lk, rk) = (self.kind(), rhs.kind());
        let (target, fresh) = match table.assign_kind(lk, rk) {
            Some(k) => (k, lk == Kind::Undefined),
            None if self.is_defined() && self.is_empty() && !self.is_struct() => {
                match table.assign_kind(Kind::Undefined, rk) {
                    Some(k) => (k, true),
                    None => return Err(assign_undefined(&self.type_name(), &rhs.type_name())),
                }
            }
            None => return Err(assign_undefined(&self.type_name(), &rhs.type_name())),
        };

        let taken = !fresh && lk == target;
        let mut container = if fresh {
            Value::default().convert_to_kind(target)?
        } else if taken {
            mem::take(self)
        } else {
            table.widen(self, target)?
        };
        match assign_into(&mut container, &ivs, rhs) {
            Ok(()) => {
                *self = container.maybe_mutate();
                Ok(())
            }
            Err(e) => {
                if taken {
                    *self = container;
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::kind::IntClass;
    use matval_array::DenseArray;

    #[test]
    fn rule_table_follows_class_precedence() {
        assert_eq!(assign_rule(Kind::DoubleMatrix, Kind::Complex), Some(Kind::ComplexMatrix));
        assert_eq!(assign_rule(Kind::Double, Kind::Single), Some(Kind::SingleMatrix));
        assert_eq!(
            assign_rule(Kind::BoolMatrix, Kind::IntScalar(IntClass::U8)),
            Some(Kind::IntMatrix(IntClass::U8))
        );
        assert_eq!(assign_rule(Kind::IntMatrix(IntClass::I8), Kind::Complex), None);
        assert_eq!(assign_rule(Kind::Char, Kind::Bool), Some(Kind::DoubleMatrix));
        assert_eq!(assign_rule(Kind::Sparse, Kind::ComplexMatrix), Some(Kind::SparseComplex));
        assert_eq!(assign_rule(Kind::DoubleMatrix, Kind::Sparse), Some(Kind::DoubleMatrix));
        assert_eq!(assign_rule(Kind::DoubleMatrix, Kind::Cell), None);
        assert_eq!(assign_rule(Kind::Undefined, Kind::Range), Some(Kind::DoubleMatrix));
    }

    #[test]
    fn assignment_grows_and_widens() {
        let mut v = Value::row(vec![1.0, 2.0]);
        v.assign(&[Value::from(4.0)], &Value::from(9.0)).expect("grow");
        assert_eq!(v, Value::row(vec![1.0, 2.0, 0.0, 9.0]));
        v.assign(&[Value::from(1.0)], &Value::Complex(Complex64::new(0.0, 1.0)))
            .expect("widen");
        assert_eq!(v.kind(), Kind::ComplexMatrix);
    }

    #[test]
    fn undefined_target_takes_rhs_class() {
        let mut v = Value::Undefined;
        v.assign(&[Value::from(3.0)], &Value::from(5u8)).expect("new");
        assert_eq!(v, Value::from(DenseArray::row(vec![0u8, 0, 5])));
        let mut c = Value::default();
        c.assign(&[Value::from(2.0)], &Value::cell(vec![Value::str("x")], [1, 1]).expect("cell"))
            .expect("cell");
        assert_eq!(c.kind(), Kind::Cell);
        assert_eq!(c.numel(), 2);
    }

    #[test]
    fn integer_targets_round_incoming_doubles() {
        let mut v = Value::from(DenseArray::row(vec![1i16, 2, 3]));
        v.assign(&[Value::from(2.0)], &Value::from(7.6)).expect("round");
        assert_eq!(v, Value::from(DenseArray::row(vec![1i16, 8, 3])));
    }

    #[test]
    fn mismatch_keeps_value() {
        let mut v = Value::row(vec![1.0, 2.0, 3.0]);
        let err = v
            .assign(&[Value::row(vec![1.0, 2.0])], &Value::row(vec![1.0, 2.0, 3.0]))
            .expect_err("mismatch");
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        assert_eq!(v, Value::row(vec![1.0, 2.0, 3.0]));
        let err = v.assign(&[Value::from(1.0)], &Value::cell(vec![], [0, 0]).expect("cell"));
        assert!(err.is_err());
    }
}
