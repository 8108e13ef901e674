//! Sparse operators.
//!
//! Operations that keep zeros at zero run over the stored entries only;
//! everything else goes through full storage. A 1x1 sparse operand facing a
//! larger operand is treated as a full scalar.

use matval_array::{DenseArray, SparseArray, SparseMap};

use super::arith::{arith_fn, binary_kernel, predicate, Computed, Num};
use super::{BinaryOp, UnaryOp};
use crate::error::{unary_undefined, Result};
use crate::value::{nan_to_logical, Value};
use num_complex::Complex64;

enum Operand<T> {
    Sparse(SparseArray<T>),
    Full(DenseArray<T>),
}

impl<T: Num> Operand<T> {
    fn of(v: &Value) -> Result<Self> {
        Ok(if v.is_sparse() {
            Operand::Sparse(T::sparse_operand(v)?)
        } else {
            Operand::Full(T::dense_operand(v)?)
        })
    }

    fn numel(&self) -> usize {
        match self {
            Operand::Sparse(s) => s.numel(),
            Operand::Full(d) => d.numel(),
        }
    }

    fn into_full(self) -> DenseArray<T> {
        match self {
            Operand::Sparse(s) => s.to_dense(),
            Operand::Full(d) => d,
        }
    }

    fn is_sparse(&self) -> bool {
        matches!(self, Operand::Sparse(_))
    }
}

fn from_map<T: Num>(m: SparseMap<T>) -> Value {
    match m {
        SparseMap::Sparse(s) => T::wrap_sparse(s),
        SparseMap::Full(d) => T::wrap(d),
    }
}

/// Operators that act element by element when one side is a scalar.
fn scalar_elementwise(op: BinaryOp, scalar_left: bool) -> bool {
    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::ElMul
        | BinaryOp::ElDiv
        | BinaryOp::ElLdiv
        | BinaryOp::ElPow => true,
        BinaryOp::Div => !scalar_left,
        BinaryOp::Ldiv => scalar_left,
        _ => false,
    }
}

pub(crate) fn sparse_binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let out = if a.is_complex() || b.is_complex() {
        binary_as::<Complex64>(op, a, b)?
    } else {
        binary_as::<f64>(op, a, b)?
    };
    Ok(out.maybe_mutate())
}

fn binary_as<T: Num>(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let mut x = Operand::<T>::of(a)?;
    let mut y = Operand::<T>::of(b)?;
    if x.numel() == 1 && y.numel() != 1 && x.is_sparse() {
        x = Operand::Full(x.into_full());
    }
    if y.numel() == 1 && x.numel() != 1 && y.is_sparse() {
        y = Operand::Full(y.into_full());
    }
    let sym = op.symbol();

    if let Some(f) = arith_fn::<T>(op) {
        match (&x, &y) {
            (Operand::Sparse(p), Operand::Sparse(q))
                if matches!(op, BinaryOp::Add | BinaryOp::Sub) =>
            {
                return Ok(T::wrap_sparse(p.union_with(q, sym, |u, v| f(*u, *v))?));
            }
            (Operand::Sparse(p), Operand::Sparse(q))
                if op == BinaryOp::ElMul && p.dims() == q.dims() =>
            {
                return Ok(T::wrap_sparse(p.intersect_with(q, sym, |u, v| *u * *v)?));
            }
            (Operand::Sparse(p), Operand::Sparse(q)) if op == BinaryOp::Mul && p.numel() != 1 => {
                return Ok(T::wrap_sparse(p.matmul(q)?));
            }
            (Operand::Sparse(p), Operand::Full(q)) if q.numel() == 1 && scalar_elementwise(op, false) => {
                let s = *q.elem(0);
                return Ok(from_map(p.map(|u| f(*u, s))?));
            }
            (Operand::Full(p), Operand::Sparse(q)) if p.numel() == 1 && scalar_elementwise(op, true) => {
                let s = *p.elem(0);
                return Ok(from_map(q.map(|v| f(s, *v))?));
            }
            (Operand::Sparse(p), Operand::Full(q)) if op == BinaryOp::ElMul && q.dims() == &p.dims() => {
                return Ok(T::wrap_sparse(p.stored_with_dense(q, sym, |u, v| *u * *v)?));
            }
            (Operand::Full(p), Operand::Sparse(q)) if op == BinaryOp::ElMul && p.dims() == &q.dims() => {
                return Ok(T::wrap_sparse(q.stored_with_dense(p, sym, |v, u| *u * *v)?));
            }
            (Operand::Sparse(p), Operand::Full(q)) if op == BinaryOp::Mul => {
                return Ok(T::wrap(p.mul_dense(q)?));
            }
            (Operand::Full(p), Operand::Sparse(q)) if op == BinaryOp::Mul => {
                return Ok(T::wrap(SparseArray::dense_mul(p, q)?));
            }
            _ => {}
        }
    }

    if let Some(pred) = predicate::<T>(op) {
        if let (Operand::Sparse(p), Operand::Sparse(q)) = (&x, &y) {
            let zero = T::default();
            if p.dims() == q.dims() && !pred(&zero, &zero) {
                if op.is_logical() && (has_nan(p) || has_nan(q)) {
                    return Err(nan_to_logical());
                }
                return Ok(Value::SparseBool(p.union_with(q, sym, |u, v| pred(u, v))?));
            }
        }
    }

    let both_sparse = x.is_sparse() && y.is_sparse();
    let any_sparse = x.is_sparse() || y.is_sparse();
    let computed = binary_kernel(op, &x.into_full(), &y.into_full())?;
    Ok(match computed {
        Computed::Num(d) if both_sparse => T::wrap_sparse(SparseArray::from_dense(&d)?),
        Computed::Bool(m) if any_sparse => Value::SparseBool(SparseArray::from_dense(&m)?),
        other => other.into_value(),
    })
}

fn has_nan<T: Num>(s: &SparseArray<T>) -> bool {
    s.data().iter().any(matval_array::Element::is_nan)
}

fn sparse_not<T: Num>(s: &SparseArray<T>) -> Result<Value> {
    if has_nan(s) {
        return Err(nan_to_logical());
    }
    let mask = s.to_dense().map(|v| !v.nonzero())?;
    Ok(Value::SparseBool(SparseArray::from_dense(&mask)?))
}

pub(crate) fn sparse_unary(op: UnaryOp, a: &Value) -> Result<Value> {
    let out = match (op, a) {
        (UnaryOp::UPlus, v) => v.clone(),
        (UnaryOp::Not, Value::Sparse(s)) => sparse_not(s)?,
        (UnaryOp::Not, Value::SparseComplex(s)) => sparse_not(s)?,
        (UnaryOp::UMinus, Value::Sparse(s)) => Value::Sparse(s.map_nonzeros(|v| -*v)?),
        (UnaryOp::UMinus, Value::SparseComplex(s)) => Value::SparseComplex(s.map_nonzeros(|v| -*v)?),
        (UnaryOp::Transpose | UnaryOp::Hermitian, Value::Sparse(s)) => Value::Sparse(s.transpose()),
        (UnaryOp::Transpose, Value::SparseComplex(s)) => Value::SparseComplex(s.transpose()),
        (UnaryOp::Hermitian, Value::SparseComplex(s)) => {
            Value::SparseComplex(s.map_nonzeros(|z| z.conj())?.transpose())
        }
        (op, v) => return Err(unary_undefined(op.symbol(), &v.type_name())),
    };
    Ok(out.maybe_mutate())
}

pub(crate) fn sparse_bool_unary(op: UnaryOp, a: &Value) -> Result<Value> {
    let Value::SparseBool(s) = a else {
        return Err(unary_undefined(op.symbol(), &a.type_name()));
    };
    let out = match op {
        UnaryOp::Not => {
            let mask = s.to_dense().map(|b| !b)?;
            Value::SparseBool(SparseArray::from_dense(&mask)?)
        }
        UnaryOp::UPlus => Value::Sparse(a.sparse_value()?),
        UnaryOp::UMinus => Value::Sparse(a.sparse_value()?.map_nonzeros(|v| -v)?),
        UnaryOp::Transpose | UnaryOp::Hermitian => Value::SparseBool(s.transpose()),
        other => return Err(unary_undefined(other.symbol(), &a.type_name())),
    };
    Ok(out.maybe_mutate())
}
