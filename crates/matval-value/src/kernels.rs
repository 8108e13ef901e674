//! Dense linear algebra over `nalgebra`: products, left/right division and
//! integer matrix powers, generic over real and complex doubles.

use std::ops::{Add, Div, Mul, Neg, Sub};

use log::warn;
use matval_array::{check_interrupt, ArrayError, DenseArray, DimVector, Element};
use nalgebra::{linalg::SVD, ComplexField, DMatrix};

use crate::error::{runtime_error, ErrorKind, Result};

/// Element types the kernels operate on.
pub trait LinalgScalar:
    ComplexField<RealField = f64>
    + Element
    + Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
}

impl<T> LinalgScalar for T where
    T: ComplexField<RealField = f64>
        + Element
        + Copy
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Div<Output = T>
        + Neg<Output = T>
{
}

/// Structure of a square matrix, detected once and handed back so a caller
/// solving repeatedly against the same matrix can skip detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixType {
    #[default]
    Unknown,
    Full,
    Upper,
    Lower,
    Diagonal,
    Hermitian,
}

impl MatrixType {
    pub fn detect<T: LinalgScalar>(a: &DenseArray<T>) -> MatrixType {
        if a.ndims() != 2 || a.rows() != a.cols() {
            return MatrixType::Full;
        }
        let n = a.rows();
        let d = a.as_slice();
        let zero = T::default();
        let (mut upper, mut lower, mut hermitian) = (true, true, true);
        for j in 0..n {
            for i in 0..n {
                let v = d[i + j * n];
                if i > j && v != zero {
                    upper = false;
                }
                if i < j && v != zero {
                    lower = false;
                }
                if hermitian && v != d[j + i * n].conjugate() {
                    hermitian = false;
                }
            }
        }
        match (upper, lower) {
            (true, true) => MatrixType::Diagonal,
            (true, false) => MatrixType::Upper,
            (false, true) => MatrixType::Lower,
            _ if hermitian => MatrixType::Hermitian,
            _ => MatrixType::Full,
        }
    }

    /// The type of the transposed matrix.
    pub fn transposed(self) -> MatrixType {
        match self {
            MatrixType::Upper => MatrixType::Lower,
            MatrixType::Lower => MatrixType::Upper,
            other => other,
        }
    }
}

fn require_2d<T>(op: &str, a: &DenseArray<T>, b: &DenseArray<T>) -> Result<()> {
    if a.ndims() != 2 || b.ndims() != 2 {
        return Err(runtime_error(format!("operator {op}: not defined for N-D objects"))
            .with_kind(ErrorKind::DimensionMismatch)
            .with_identifier("MatVal:nonconformant")
            .build());
    }
    Ok(())
}

fn to_matrix<T: LinalgScalar>(a: &DenseArray<T>) -> DMatrix<T> {
    DMatrix::from_column_slice(a.rows(), a.cols(), a.as_slice())
}

fn from_matrix<T: LinalgScalar>(m: DMatrix<T>) -> Result<DenseArray<T>> {
    let dims = DimVector::matrix(m.nrows(), m.ncols());
    Ok(DenseArray::from_vec(m.as_slice().to_vec(), dims)?)
}

/// Matrix product `a * b`.
pub fn matmul<T: LinalgScalar>(a: &DenseArray<T>, b: &DenseArray<T>) -> Result<DenseArray<T>> {
    require_2d("*", a, b)?;
    if a.cols() != b.rows() {
        return Err(ArrayError::nonconformant("*", a.dims(), b.dims()).into());
    }
    check_interrupt()?;
    from_matrix(to_matrix(a) * to_matrix(b))
}

fn svd_tolerance(singular_values: &[f64], rows: usize, cols: usize) -> f64 {
    let max_sv = singular_values
        .iter()
        .copied()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    f64::EPSILON * rows.max(cols) as f64 * max_sv.max(1.0)
}

fn svd_solve<T: LinalgScalar>(a: DMatrix<T>, b: &DMatrix<T>) -> Result<DMatrix<T>> {
    let (rows, cols) = (a.nrows(), a.ncols());
    let svd = SVD::new(a, true, true);
    let tol = svd_tolerance(svd.singular_values.as_slice(), rows, cols);
    svd.solve(b, tol)
        .map_err(|e| runtime_error(format!("operator \\: {e}")).build())
}

/// Substitution for triangular systems. `None` on a zero pivot.
fn triangular_solve<T: LinalgScalar>(
    a: &DenseArray<T>,
    b: &DenseArray<T>,
    upper: bool,
) -> Option<Vec<T>> {
    let n = a.rows();
    let nrhs = b.cols();
    let ad = a.as_slice();
    let mut x = b.to_vec();
    let zero = T::default();
    for col in 0..nrhs {
        for step in 0..n {
            let i = if upper { n - 1 - step } else { step };
            let diag = ad[i + i * n];
            if diag == zero {
                return None;
            }
            let mut accum = zero;
            let (lo, hi) = if upper { (i + 1, n) } else { (0, i) };
            for j in lo..hi {
                accum = accum + ad[i + j * n] * x[j + col * n];
            }
            x[i + col * n] = (x[i + col * n] - accum) / diag;
        }
    }
    Some(x)
}

/// Solve `a * x = b`. Returns the solution and the structure used, which
/// callers may pass back as `hint` on the next solve with the same `a`.
pub fn solve_left<T: LinalgScalar>(
    a: &DenseArray<T>,
    b: &DenseArray<T>,
    hint: MatrixType,
) -> Result<(DenseArray<T>, MatrixType)> {
    require_2d("\\", a, b)?;
    if a.rows() != b.rows() {
        return Err(ArrayError::nonconformant("\\", a.dims(), b.dims()).into());
    }
    check_interrupt()?;
    let typ = match hint {
        MatrixType::Unknown => MatrixType::detect(a),
        known => known,
    };
    if a.is_empty() || b.is_empty() {
        let dims = DimVector::matrix(a.cols(), b.cols());
        return Ok((DenseArray::new(dims), typ));
    }
    let rhs = to_matrix(b);
    let square = a.rows() == a.cols();

    if square && matches!(typ, MatrixType::Upper | MatrixType::Lower | MatrixType::Diagonal) {
        if let Some(x) = triangular_solve(a, b, typ != MatrixType::Lower) {
            let dims = DimVector::matrix(a.cols(), b.cols());
            return Ok((DenseArray::from_vec(x, dims)?, typ));
        }
        warn!("warning: matrix singular to machine precision");
        return Ok((from_matrix(svd_solve(to_matrix(a), &rhs)?)?, typ));
    }

    let m = to_matrix(a);
    if square {
        if typ == MatrixType::Hermitian {
            if let Some(chol) = m.clone().cholesky() {
                return Ok((from_matrix(chol.solve(&rhs))?, typ));
            }
        }
        if let Some(x) = m.clone().lu().solve(&rhs) {
            if x.iter().all(|v| v.is_finite()) {
                return Ok((from_matrix(x)?, typ));
            }
        }
        warn!("warning: matrix singular to machine precision");
    }
    Ok((from_matrix(svd_solve(m, &rhs)?)?, typ))
}

/// Solve `x * b = a`, i.e. `a / b`, through the transposed system.
pub fn solve_right<T: LinalgScalar>(
    a: &DenseArray<T>,
    b: &DenseArray<T>,
    hint: MatrixType,
) -> Result<(DenseArray<T>, MatrixType)> {
    require_2d("/", a, b)?;
    if a.cols() != b.cols() {
        return Err(ArrayError::nonconformant("/", a.dims(), b.dims()).into());
    }
    let (xt, typ) = solve_left(&b.transpose()?, &a.transpose()?, hint.transposed())?;
    Ok((xt.transpose()?, typ.transposed()))
}

/// `a ^ p` for a square matrix and an integer exponent.
pub fn matrix_power<T: LinalgScalar>(a: &DenseArray<T>, p: i64) -> Result<DenseArray<T>> {
    if a.ndims() != 2 || a.rows() != a.cols() {
        return Err(runtime_error(
            "for x^y, only square matrix arguments are permitted and one argument must be scalar.  Use .^ for elementwise power.",
        )
        .with_kind(ErrorKind::DimensionMismatch)
        .with_identifier("MatVal:nonconformant")
        .build());
    }
    let n = a.rows();
    let mut base = to_matrix(a);
    if p < 0 {
        base = match base.clone().try_inverse() {
            Some(inv) => inv,
            None => {
                warn!("warning: inverse: matrix singular to machine precision");
                let svd = SVD::new(base, true, true);
                let tol = svd_tolerance(svd.singular_values.as_slice(), n, n);
                svd.pseudo_inverse(tol)
                    .map_err(|e| runtime_error(format!("operator ^: {e}")).build())?
            }
        };
    }
    let mut e = p.unsigned_abs();
    let mut result = DMatrix::<T>::identity(n, n);
    while e > 0 {
        check_interrupt()?;
        if e & 1 == 1 {
            result = &result * &base;
        }
        e >>= 1;
        if e > 0 {
            base = &base * &base;
        }
    }
    from_matrix(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(data: Vec<f64>, r: usize, c: usize) -> DenseArray<f64> {
        DenseArray::from_vec(data, DimVector::matrix(r, c)).expect("matrix")
    }

    fn close(a: &DenseArray<f64>, b: &[f64]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-10)
    }

    #[test]
    fn detects_structure() {
        assert_eq!(MatrixType::detect(&m(vec![1.0, 0.0, 2.0, 3.0], 2, 2)), MatrixType::Upper);
        assert_eq!(MatrixType::detect(&m(vec![1.0, 2.0, 0.0, 3.0], 2, 2)), MatrixType::Lower);
        assert_eq!(MatrixType::detect(&m(vec![2.0, 1.0, 1.0, 2.0], 2, 2)), MatrixType::Hermitian);
        assert_eq!(MatrixType::detect(&m(vec![1.0, 0.0, 0.0, 1.0], 2, 2)), MatrixType::Diagonal);
    }

    #[test]
    fn product_checks_inner_dimensions() {
        let a = m(vec![1.0, 3.0, 2.0, 4.0], 2, 2);
        let p = matmul(&a, &a).expect("a*a");
        assert_eq!(p.as_slice(), &[7.0, 15.0, 10.0, 22.0]);
        let err = matmul(&a, &m(vec![1.0, 2.0, 3.0], 3, 1)).expect_err("2x2 * 3x1");
        assert_eq!(err.to_string(), "operator *: nonconformant arguments (op1 is 2x2, op2 is 3x1)");
    }

    #[test]
    fn left_division_reports_structure() {
        let upper = m(vec![2.0, 0.0, 1.0, 4.0], 2, 2);
        let b = m(vec![4.0, 8.0], 2, 1);
        let (x, typ) = solve_left(&upper, &b, MatrixType::Unknown).expect("solve");
        assert_eq!(typ, MatrixType::Upper);
        assert!(close(&x, &[1.0, 2.0]));

        let general = m(vec![4.0, 2.0, 1.0, 3.0], 2, 2);
        let (x, typ) = solve_left(&general, &b, MatrixType::Unknown).expect("lu");
        assert_eq!(typ, MatrixType::Full);
        assert!(close(&x, &[0.4, 2.4]));
    }

    #[test]
    fn least_squares_for_rectangular_systems() {
        let a = m(vec![1.0, 1.0, 1.0, 1.0, 2.0, 3.0], 3, 2);
        let b = m(vec![1.0, 2.0, 3.0], 3, 1);
        let (x, _) = solve_left(&a, &b, MatrixType::Unknown).expect("lsq");
        assert!(close(&x, &[0.0, 1.0]));
    }

    #[test]
    fn integer_powers() {
        let a = m(vec![1.0, 0.0, 1.0, 1.0], 2, 2);
        assert_eq!(matrix_power(&a, 3).expect("a^3").as_slice(), &[1.0, 0.0, 3.0, 1.0]);
        let inv = matrix_power(&a, -1).expect("a^-1");
        assert!(close(&inv, &[1.0, 0.0, -1.0, 1.0]));
        assert!(matrix_power(&m(vec![1.0, 2.0], 1, 2), 2).is_err());
    }
}
