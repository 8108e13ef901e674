//! Range operators that keep the result lazy.
//!
//! Only shifts, scaling and negation preserve an arithmetic progression;
//! every other range operation goes through full storage.

use matval_array::{Range, RangeArith};

use super::arith::float_binary;
use super::{BinaryOp, UnaryOp};
use crate::error::{unary_undefined, Result};
use crate::value::Value;

fn settle(result: RangeArith) -> Value {
    match result {
        RangeArith::Lazy(r) => Value::Range(r),
        RangeArith::Materialized(a) => Value::DoubleMatrix(a),
    }
}

fn range_scalar(op: BinaryOp, r: &Range, x: f64, range_on_left: bool) -> Option<matval_array::Result<RangeArith>> {
    Some(match op {
        BinaryOp::Add => r.add_scalar(x),
        BinaryOp::Sub if range_on_left => r.sub_scalar(x),
        BinaryOp::Sub => r.rsub_scalar(x),
        BinaryOp::Mul | BinaryOp::ElMul => r.mul_scalar(x),
        _ => return None,
    })
}

pub(crate) fn range_binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let lazy = match (a, b) {
        (Value::Range(r), Value::Double(x)) => range_scalar(op, r, *x, true),
        (Value::Double(x), Value::Range(r)) => range_scalar(op, r, *x, false),
        _ => None,
    };
    match lazy {
        Some(result) => Ok(settle(result?).maybe_mutate()),
        None => float_binary(
            op,
            &a.convert_to_kind(a.kind().matrix_kind())?,
            &b.convert_to_kind(b.kind().matrix_kind())?,
        ),
    }
}

pub(crate) fn range_unary(op: UnaryOp, a: &Value) -> Result<Value> {
    let Value::Range(r) = a else {
        return Err(unary_undefined(op.symbol(), &a.type_name()));
    };
    match op {
        UnaryOp::UPlus => Ok(a.clone()),
        UnaryOp::UMinus => Ok(settle(r.neg()?).maybe_mutate()),
        other => Err(unary_undefined(other.symbol(), &a.type_name())),
    }
}
