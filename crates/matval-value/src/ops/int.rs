//! Integer operators.
//!
//! Integer with integer of the same class is computed exactly in `i128`
//! and saturated. Integer with a float, bool or char operand is computed in
//! `f64` and rounded back into the integer class. Mixed integer classes
//! only compare.

use matval_array::DenseArray;

use super::{BinaryOp, UnaryOp};
use crate::error::{binary_undefined, unary_undefined, Result};
use crate::int::{int_div, int_pow, IntArray};
use crate::kind::IntClass;
use crate::value::{nan_to_logical, Value};

fn int_payload(v: &Value) -> Option<IntArray> {
    match v {
        Value::Int(s) => Some(s.to_array()),
        Value::IntMatrix(a) => Some(a.clone()),
        _ => None,
    }
}

/// Integer pairs the table installs: same class for everything, mixed
/// classes for comparisons and logicals only.
pub(crate) fn int_pair_supports(op: BinaryOp, a: Option<IntClass>, b: Option<IntClass>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) if x != y => op.is_comparison() || op.is_logical(),
        _ => true,
    }
}

fn compare_wide(op: BinaryOp, x: i128, y: i128) -> bool {
    match op {
        BinaryOp::Lt => x < y,
        BinaryOp::Le => x <= y,
        BinaryOp::Gt => x > y,
        BinaryOp::Ge => x >= y,
        BinaryOp::Eq => x == y,
        BinaryOp::Ne => x != y,
        BinaryOp::And => x != 0 && y != 0,
        _ => x != 0 || y != 0,
    }
}

fn compare_f64(op: BinaryOp, x: f64, y: f64) -> bool {
    match op {
        BinaryOp::Lt => x < y,
        BinaryOp::Le => x <= y,
        BinaryOp::Gt => x > y,
        BinaryOp::Ge => x >= y,
        BinaryOp::Eq => x == y,
        BinaryOp::Ne => x != y,
        BinaryOp::And => x != 0.0 && y != 0.0,
        _ => x != 0.0 || y != 0.0,
    }
}

fn wide_arith(op: BinaryOp, x: i128, y: i128, class: IntClass) -> i128 {
    match op {
        BinaryOp::Add => class.saturate(x.saturating_add(y)),
        BinaryOp::Sub => class.saturate(x.saturating_sub(y)),
        BinaryOp::ElMul => class.saturate(x.saturating_mul(y)),
        BinaryOp::ElDiv => int_div(x, y, class),
        BinaryOp::ElLdiv => int_div(y, x, class),
        _ if y >= 0 => int_pow(x, u32::try_from(y).unwrap_or(u32::MAX), class),
        _ => class.saturate((x as f64).powf(y as f64).round() as i128),
    }
}

fn f64_arith(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::ElMul => x * y,
        BinaryOp::ElDiv => x / y,
        BinaryOp::ElLdiv => y / x,
        _ => x.powf(y),
    }
}

pub(crate) fn int_binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let undefined = || binary_undefined(op.symbol(), &a.type_name(), &b.type_name());
    let (ia, ib) = (int_payload(a), int_payload(b));
    let ca = ia.as_ref().map(IntArray::class);
    let cb = ib.as_ref().map(IntArray::class);
    if !int_pair_supports(op, ca, cb) {
        return Err(undefined());
    }
    let Some(class) = ca.or(cb) else {
        return Err(undefined());
    };
    let sym = op.symbol();

    if op.is_comparison() || op.is_logical() {
        let mask = match (&ia, &ib) {
            (Some(x), Some(y)) => x
                .to_wide()?
                .zip_with(&y.to_wide()?, sym, |&p, &q| compare_wide(op, p, q))?,
            _ => {
                let (x, y) = (a.array_value()?, b.array_value()?);
                if op.is_logical() && (x.any_nan() || y.any_nan()) {
                    return Err(nan_to_logical());
                }
                x.zip_with(&y, sym, |&p, &q| compare_f64(op, p, q))?
            }
        };
        return Ok(Value::BoolMatrix(mask).maybe_mutate());
    }

    let op = if op.is_matrix_op() {
        let scalar_pair = a.numel() == 1 && b.numel() == 1;
        let one_scalar = a.numel() == 1 || b.numel() == 1;
        if (op == BinaryOp::Pow && !scalar_pair) || !one_scalar {
            return Err(undefined());
        }
        op.elementwise()
    } else {
        op
    };

    let out = match (&ia, &ib) {
        (Some(x), Some(y)) => {
            let wide = x
                .to_wide()?
                .zip_with(&y.to_wide()?, sym, |&p, &q| wide_arith(op, p, q, class))?;
            IntArray::from_wide(class, &wide)?
        }
        _ => {
            let (x, y) = (a.array_value()?, b.array_value()?);
            let real = x.zip_with(&y, sym, |&p, &q| f64_arith(op, p, q))?;
            IntArray::from_f64(class, &real)?
        }
    };
    Ok(Value::IntMatrix(out).maybe_mutate())
}

pub(crate) fn int_unary(op: UnaryOp, a: &Value) -> Result<Value> {
    let Some(arr) = int_payload(a) else {
        return Err(unary_undefined(op.symbol(), &a.type_name()));
    };
    let out = match op {
        UnaryOp::UPlus => return Ok(a.clone()),
        UnaryOp::Not => Value::BoolMatrix(arr.to_wide()?.map(|&v| v == 0)?),
        UnaryOp::UMinus => {
            let negated: DenseArray<i128> = arr.to_wide()?.map(|&v| -v)?;
            Value::IntMatrix(IntArray::from_wide(arr.class(), &negated)?)
        }
        UnaryOp::Transpose | UnaryOp::Hermitian => Value::IntMatrix(arr.transpose()?),
        other => return Err(unary_undefined(other.symbol(), &a.type_name())),
    };
    Ok(out.maybe_mutate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_class_arithmetic_saturates() {
        let a = Value::from(DenseArray::row(vec![100i8, -100]));
        let b = Value::from(DenseArray::row(vec![100i8, 100]));
        assert_eq!(
            int_binary(BinaryOp::Add, &a, &b).expect("+"),
            Value::from(DenseArray::row(vec![127i8, 0]))
        );
        assert_eq!(
            int_binary(BinaryOp::Sub, &Value::from(0u8), &Value::from(5u8)).expect("-"),
            Value::from(0u8)
        );
        assert_eq!(
            int_binary(BinaryOp::Div, &Value::from(7i32), &Value::from(2i32)).expect("/"),
            Value::from(4i32)
        );
    }

    #[test]
    fn double_operands_round_back() {
        let v = int_binary(BinaryOp::Mul, &Value::from(5i16), &Value::from(0.5)).expect("*");
        assert_eq!(v, Value::from(3i16));
        let v = int_binary(BinaryOp::ElPow, &Value::from(2u8), &Value::from(-1.0)).expect(".^");
        assert_eq!(v, Value::from(1u8));
    }

    #[test]
    fn mixed_classes_compare_only() {
        let a = Value::from(3i8);
        let b = Value::from(3u16);
        assert_eq!(int_binary(BinaryOp::Eq, &a, &b).expect("=="), Value::Bool(true));
        let err = int_binary(BinaryOp::Add, &a, &b).expect_err("+");
        assert_eq!(
            err.to_string(),
            "binary operator '+' not implemented for 'int8 scalar' by 'uint16 scalar' operations"
        );
    }

    #[test]
    fn matrix_product_needs_a_scalar() {
        let m = Value::from(DenseArray::row(vec![1i32, 2]));
        assert!(int_binary(BinaryOp::Mul, &m, &m).is_err());
        assert_eq!(
            int_binary(BinaryOp::Mul, &m, &Value::from(3.0)).expect("*"),
            Value::from(DenseArray::row(vec![3i32, 6]))
        );
    }

    #[test]
    fn negation_saturates() {
        assert_eq!(int_unary(UnaryOp::UMinus, &Value::from(i8::MIN)).expect("-"), Value::from(i8::MAX));
        assert_eq!(int_unary(UnaryOp::Not, &Value::from(0u32)).expect("!"), Value::Bool(true));
    }
}
