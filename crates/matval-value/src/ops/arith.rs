//! Floating-point operators: double, single and their complex forms.
//!
//! Everything is computed in `f64` or `Complex64` and narrowed to single
//! precision afterwards when either operand was single.

use std::cmp::Ordering;

use matval_array::{DenseArray, SparseArray};
use num_complex::{Complex32, Complex64};

use super::{BinaryOp, UnaryOp};
use crate::error::{runtime_error, unary_undefined, ErrorKind, Result};
use crate::kernels::{self, LinalgScalar, MatrixType};
use crate::value::{nan_to_logical, Value};

/// Element types the generic operator kernels are written over.
pub(crate) trait Num: LinalgScalar + Send + Sync {
    /// Ordering used by `<`, `<=`, `>`, `>=`; `None` when NaN is involved.
    fn order(&self, other: &Self) -> Option<Ordering>;

    fn power(self, exponent: Self) -> Self;

    fn nonzero(&self) -> bool;

    /// The value as an exact integer, if it is one.
    fn exact_integer(&self) -> Option<i64>;

    fn dense_operand(v: &Value) -> Result<DenseArray<Self>>;

    fn sparse_operand(v: &Value) -> Result<SparseArray<Self>>;

    fn wrap(a: DenseArray<Self>) -> Value;

    fn wrap_sparse(s: SparseArray<Self>) -> Value;
}

fn real_integer(x: f64) -> Option<i64> {
    (x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64).then_some(x as i64)
}

impl Num for f64 {
    fn order(&self, other: &Self) -> Option<Ordering> {
        self.partial_cmp(other)
    }

    fn power(self, exponent: Self) -> Self {
        match real_integer(exponent) {
            Some(p) if p.unsigned_abs() <= i32::MAX as u64 => self.powi(p as i32),
            _ => self.powf(exponent),
        }
    }

    fn nonzero(&self) -> bool {
        *self != 0.0
    }

    fn exact_integer(&self) -> Option<i64> {
        real_integer(*self)
    }

    fn dense_operand(v: &Value) -> Result<DenseArray<Self>> {
        v.array_value()
    }

    fn sparse_operand(v: &Value) -> Result<SparseArray<Self>> {
        v.sparse_value()
    }

    fn wrap(a: DenseArray<Self>) -> Value {
        Value::DoubleMatrix(a)
    }

    fn wrap_sparse(s: SparseArray<Self>) -> Value {
        Value::Sparse(s)
    }
}

impl Num for Complex64 {
    /// Complex values order by magnitude, then by phase angle.
    fn order(&self, other: &Self) -> Option<Ordering> {
        match self.norm().partial_cmp(&other.norm())? {
            Ordering::Equal => self.arg().partial_cmp(&other.arg()),
            ord => Some(ord),
        }
    }

    fn power(self, exponent: Self) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        if self == zero && exponent.im == 0.0 {
            if exponent.re == 0.0 {
                return Complex64::new(1.0, 0.0);
            }
            if exponent.re > 0.0 {
                return zero;
            }
        }
        if exponent.im == 0.0 {
            if let Some(p) = real_integer(exponent.re) {
                if p.unsigned_abs() <= i32::MAX as u64 {
                    return self.powi(p as i32);
                }
            }
        }
        self.powc(exponent)
    }

    fn nonzero(&self) -> bool {
        self.re != 0.0 || self.im != 0.0
    }

    fn exact_integer(&self) -> Option<i64> {
        if self.im != 0.0 {
            return None;
        }
        real_integer(self.re)
    }

    fn dense_operand(v: &Value) -> Result<DenseArray<Self>> {
        v.complex_array_value()
    }

    fn sparse_operand(v: &Value) -> Result<SparseArray<Self>> {
        v.sparse_complex_value()
    }

    fn wrap(a: DenseArray<Self>) -> Value {
        Value::ComplexMatrix(a)
    }

    fn wrap_sparse(s: SparseArray<Self>) -> Value {
        Value::SparseComplex(s)
    }
}

/// Element-wise arithmetic for `op`, if `op` is arithmetic.
pub(crate) fn arith_fn<T: Num>(op: BinaryOp) -> Option<fn(T, T) -> T> {
    let f: fn(T, T) -> T = match op {
        BinaryOp::Add => |a, b| a + b,
        BinaryOp::Sub => |a, b| a - b,
        BinaryOp::Mul | BinaryOp::ElMul => |a, b| a * b,
        BinaryOp::Div | BinaryOp::ElDiv => |a, b| a / b,
        BinaryOp::Ldiv | BinaryOp::ElLdiv => |a, b| b / a,
        BinaryOp::Pow | BinaryOp::ElPow => |a, b| a.power(b),
        _ => return None,
    };
    Some(f)
}

/// Element-wise comparison or logical test for `op`.
pub(crate) fn predicate<T: Num>(op: BinaryOp) -> Option<fn(&T, &T) -> bool> {
    let f: fn(&T, &T) -> bool = match op {
        BinaryOp::Lt => |a, b| a.order(b) == Some(Ordering::Less),
        BinaryOp::Le => |a, b| matches!(a.order(b), Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => |a, b| a.order(b) == Some(Ordering::Greater),
        BinaryOp::Ge => |a, b| matches!(a.order(b), Some(Ordering::Greater | Ordering::Equal)),
        BinaryOp::Eq => |a, b| a == b,
        BinaryOp::Ne => |a, b| a != b,
        BinaryOp::And => |a, b| a.nonzero() && b.nonzero(),
        BinaryOp::Or => |a, b| a.nonzero() || b.nonzero(),
        _ => return None,
    };
    Some(f)
}

/// Outcome of a kernel: numbers, or a logical mask for comparisons.
pub(crate) enum Computed<T> {
    Num(DenseArray<T>),
    Bool(DenseArray<bool>),
}

impl<T: Num> Computed<T> {
    pub(crate) fn into_value(self) -> Value {
        match self {
            Computed::Num(a) => T::wrap(a),
            Computed::Bool(m) => Value::BoolMatrix(m),
        }
    }
}

fn pow_error() -> crate::error::RuntimeError {
    runtime_error(
        "for x^y, only square matrix arguments are permitted and one argument must be scalar.  Use .^ for elementwise power.",
    )
    .with_kind(ErrorKind::UnsupportedOperation)
    .with_operation("binary ^")
    .build()
}

/// `x op y` over full arrays of one element type.
pub(crate) fn binary_kernel<T: Num>(
    op: BinaryOp,
    x: &DenseArray<T>,
    y: &DenseArray<T>,
) -> Result<Computed<T>> {
    let sym = op.symbol();
    let (xs, ys) = (x.numel() == 1, y.numel() == 1);
    let elementwise = |f: fn(T, T) -> T| -> Result<Computed<T>> {
        Ok(Computed::Num(x.zip_with(y, sym, |a, b| f(*a, *b))?))
    };
    match op {
        BinaryOp::Mul if !(xs || ys) => Ok(Computed::Num(kernels::matmul(x, y)?)),
        BinaryOp::Div if !ys => Ok(Computed::Num(
            kernels::solve_right(x, y, MatrixType::Unknown)?.0,
        )),
        BinaryOp::Ldiv if !xs => Ok(Computed::Num(
            kernels::solve_left(x, y, MatrixType::Unknown)?.0,
        )),
        BinaryOp::Pow if xs && ys => elementwise(|a, b| a.power(b)),
        BinaryOp::Pow if ys => match y.elem(0).exact_integer() {
            Some(p) => Ok(Computed::Num(kernels::matrix_power(x, p)?)),
            None => Err(runtime_error("matrix power with a non-integer exponent is not supported")
                .with_kind(ErrorKind::UnsupportedOperation)
                .with_operation("binary ^")
                .build()),
        },
        BinaryOp::Pow => Err(pow_error()),
        _ => {
            if let Some(f) = arith_fn::<T>(op) {
                return elementwise(f);
            }
            if op.is_logical() && (x.any_nan() || y.any_nan()) {
                return Err(nan_to_logical());
            }
            match predicate::<T>(op) {
                Some(p) => Ok(Computed::Bool(x.zip_with(y, sym, |a, b| p(a, b))?)),
                None => Err(crate::error::binary_undefined(sym, "matrix", "matrix")),
            }
        }
    }
}

/// Real `.^` with a negative base and a fractional exponent yields complex
/// results, so such operations are computed in complex arithmetic.
fn real_pow_goes_complex(op: BinaryOp, a: &Value, b: &Value) -> Result<bool> {
    if !matches!(op, BinaryOp::Pow | BinaryOp::ElPow) {
        return Ok(false);
    }
    let base = a.array_value()?;
    if !base.iter().any(|&v| v < 0.0) {
        return Ok(false);
    }
    Ok(b.array_value()?.iter().any(|e| e.is_finite() && e.fract() != 0.0))
}

fn to_single(v: Value) -> Result<Value> {
    Ok(match v {
        Value::DoubleMatrix(a) => Value::SingleMatrix(a.map(|&x| x as f32)?),
        Value::ComplexMatrix(a) => {
            Value::FloatComplexMatrix(a.map(|z| Complex32::new(z.re as f32, z.im as f32))?)
        }
        other => other,
    })
}

/// Binary operators between any two floating-point kinds.
pub(crate) fn float_binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    let single = a.is_single() || b.is_single();
    let complex = a.is_complex() || b.is_complex() || real_pow_goes_complex(op, a, b)?;
    let out = if complex {
        binary_kernel(op, &a.complex_array_value()?, &b.complex_array_value()?)?.into_value()
    } else {
        binary_kernel(op, &a.array_value()?, &b.array_value()?)?.into_value()
    };
    let out = if single { to_single(out)? } else { out };
    Ok(out.maybe_mutate())
}

pub(crate) fn float_unary(op: UnaryOp, a: &Value) -> Result<Value> {
    let out = match (op, a) {
        (UnaryOp::UPlus, v) => v.clone(),
        (UnaryOp::Not, v) if v.is_complex() => {
            let z = v.complex_array_value()?;
            if z.any_nan() {
                return Err(nan_to_logical());
            }
            Value::BoolMatrix(z.map(|z| !z.nonzero())?)
        }
        (UnaryOp::Not, v) => Value::BoolMatrix(v.bool_array_value()?.map(|b| !b)?),
        (UnaryOp::UMinus, Value::Double(x)) => Value::Double(-x),
        (UnaryOp::UMinus, Value::Single(x)) => Value::Single(-x),
        (UnaryOp::UMinus, Value::Complex(z)) => Value::Complex(-z),
        (UnaryOp::UMinus, Value::FloatComplex(z)) => Value::FloatComplex(-z),
        (UnaryOp::UMinus, Value::DoubleMatrix(m)) => Value::DoubleMatrix(m.map(|x| -x)?),
        (UnaryOp::UMinus, Value::SingleMatrix(m)) => Value::SingleMatrix(m.map(|x| -x)?),
        (UnaryOp::UMinus, Value::ComplexMatrix(m)) => Value::ComplexMatrix(m.map(|z| -z)?),
        (UnaryOp::UMinus, Value::FloatComplexMatrix(m)) => {
            Value::FloatComplexMatrix(m.map(|z| -z)?)
        }
        (UnaryOp::Hermitian, Value::Complex(z)) => Value::Complex(z.conj()),
        (UnaryOp::Hermitian, Value::FloatComplex(z)) => Value::FloatComplex(z.conj()),
        (UnaryOp::Hermitian, Value::ComplexMatrix(m)) => {
            Value::ComplexMatrix(m.map(|z| z.conj())?.transpose()?)
        }
        (UnaryOp::Hermitian, Value::FloatComplexMatrix(m)) => {
            Value::FloatComplexMatrix(m.map(|z| z.conj())?.transpose()?)
        }
        (UnaryOp::Transpose | UnaryOp::Hermitian, v) => match v {
            Value::DoubleMatrix(m) => Value::DoubleMatrix(m.transpose()?),
            Value::SingleMatrix(m) => Value::SingleMatrix(m.transpose()?),
            Value::ComplexMatrix(m) => Value::ComplexMatrix(m.transpose()?),
            Value::FloatComplexMatrix(m) => Value::FloatComplexMatrix(m.transpose()?),
            scalar => scalar.clone(),
        },
        (op, v) => return Err(unary_undefined(op.symbol(), &v.type_name())),
    };
    Ok(out.maybe_mutate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn elementwise_broadcasts_rows() {
        let a = Value::matrix(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0], 2, 3).expect("2x3");
        let b = Value::row(vec![10.0, 20.0, 30.0]);
        let sum = float_binary(BinaryOp::Add, &a, &b).expect("+");
        assert_eq!(
            sum,
            Value::matrix(vec![11.0, 14.0, 22.0, 25.0, 33.0, 36.0], 2, 3).expect("2x3")
        );
        let err = float_binary(BinaryOp::Add, &a, &Value::row(vec![1.0, 2.0])).expect_err("2x3 + 1x2");
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        assert!(err.to_string().contains("op1 is 2x3, op2 is 1x2"));
    }

    #[test]
    fn negative_base_fractional_power_is_complex() {
        let v = float_binary(BinaryOp::Pow, &Value::from(-8.0), &Value::from(1.0 / 3.0)).expect("^");
        let Value::Complex(z) = v else {
            panic!("expected complex, got {v:?}");
        };
        assert!((z.re - 1.0).abs() < 1e-12);
        assert!((z.im - 3f64.sqrt()).abs() < 1e-12);
        assert_eq!(
            float_binary(BinaryOp::Pow, &Value::from(-2.0), &Value::from(3.0)).expect("^"),
            Value::from(-8.0)
        );
    }

    #[test]
    fn single_operand_makes_single_result() {
        let v = float_binary(BinaryOp::Mul, &Value::Single(1.5), &Value::from(2.0)).expect("*");
        assert_eq!(v, Value::Single(3.0));
    }

    #[test]
    fn complex_results_narrow_when_real() {
        let z = Value::Complex(Complex64::new(1.0, 2.0));
        let w = Value::Complex(Complex64::new(1.0, -2.0));
        assert_eq!(float_binary(BinaryOp::Add, &z, &w).expect("+"), Value::from(2.0));
    }

    #[test]
    fn comparisons_give_logical_masks() {
        let v = float_binary(BinaryOp::Lt, &Value::row(vec![1.0, f64::NAN, 3.0]), &Value::from(2.0))
            .expect("<");
        assert_eq!(v, Value::BoolMatrix(DenseArray::row(vec![true, false, false])));
        let err = float_binary(BinaryOp::And, &Value::from(f64::NAN), &Value::from(1.0)).expect_err("&");
        assert_eq!(err.kind(), ErrorKind::InvalidConversion);
    }

    #[test]
    fn matrix_product_and_division() {
        let a = Value::matrix(vec![4.0, 2.0, 1.0, 3.0], 2, 2).expect("2x2");
        let b = Value::matrix(vec![4.0, 8.0], 2, 1).expect("2x1");
        let x = float_binary(BinaryOp::Ldiv, &a, &b).expect("\\");
        let back = float_binary(BinaryOp::Mul, &a, &x).expect("*");
        let back = back.array_value().expect("real");
        assert!((back.elem(0) - 4.0).abs() < 1e-12 && (back.elem(1) - 8.0).abs() < 1e-12);
        let err = float_binary(BinaryOp::Pow, &Value::row(vec![1.0, 2.0]), &Value::from(2.0))
            .expect_err("row ^ 2");
        assert!(err.to_string().starts_with("for x^y"));
    }

    #[test]
    fn hermitian_conjugates() {
        let m = Value::ComplexMatrix(DenseArray::row(vec![
            Complex64::new(1.0, 1.0),
            Complex64::new(2.0, -1.0),
        ]));
        let h = float_unary(UnaryOp::Hermitian, &m).expect("'");
        assert_eq!(h.dims().as_slice(), &[2, 1]);
        assert_eq!(
            h.complex_array_value().expect("complex").as_slice(),
            &[Complex64::new(1.0, -1.0), Complex64::new(2.0, 1.0)]
        );
        assert_eq!(float_unary(UnaryOp::Not, &Value::from(0.0)).expect("!"), Value::Bool(true));
    }
}
