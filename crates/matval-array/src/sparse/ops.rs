//! Element-wise pattern combination and matrix products.

use std::ops::{Add, Mul};

use super::{CscBuilder, SparseArray};
use crate::dense::DenseArray;
use crate::dims::DimVector;
use crate::element::Element;
use crate::error::{ArrayError, Result};
use crate::interrupt::InterruptPoller;

impl<T: Element> SparseArray<T> {
    fn check_same_dims(&self, other: &Self, op: &str) -> Result<()> {
        if self.rows() != other.rows() || self.cols() != other.cols() {
            return Err(ArrayError::nonconformant(op, &self.dims(), &other.dims()));
        }
        Ok(())
    }

    /// Combine over the union of both patterns; an entry missing on one
    /// side is passed as zero. Suits `+` and `-`.
    pub fn union_with<U: Element, F>(&self, other: &Self, op: &str, mut f: F) -> Result<SparseArray<U>>
    where
        F: FnMut(&T, &T) -> U,
    {
        self.check_same_dims(other, op)?;
        let zero = T::default();
        let mut poller = InterruptPoller::new();
        let mut builder = CscBuilder::new(self.cols(), self.nnz() + other.nnz());
        for c in 0..self.cols() {
            let (ra, va) = self.column(c);
            let (rb, vb) = other.column(c);
            poller.advance(ra.len() + rb.len() + 1)?;
            let (mut p, mut q) = (0, 0);
            while p < ra.len() || q < rb.len() {
                let a = ra.get(p).copied().unwrap_or(usize::MAX);
                let b = rb.get(q).copied().unwrap_or(usize::MAX);
                if a < b {
                    builder.push(a, f(&va[p], &zero));
                    p += 1;
                } else if b < a {
                    builder.push(b, f(&zero, &vb[q]));
                    q += 1;
                } else {
                    builder.push(a, f(&va[p], &vb[q]));
                    p += 1;
                    q += 1;
                }
            }
            builder.end_column();
        }
        Ok(builder.finish(self.rows(), self.cols()))
    }

    /// Combine only where both sides store a value. Suits `.*`.
    pub fn intersect_with<U: Element, F>(
        &self,
        other: &Self,
        op: &str,
        mut f: F,
    ) -> Result<SparseArray<U>>
    where
        F: FnMut(&T, &T) -> U,
    {
        self.check_same_dims(other, op)?;
        let mut poller = InterruptPoller::new();
        let mut builder = CscBuilder::new(self.cols(), self.nnz().min(other.nnz()));
        for c in 0..self.cols() {
            let (ra, va) = self.column(c);
            let (rb, vb) = other.column(c);
            poller.advance(ra.len() + rb.len() + 1)?;
            let (mut p, mut q) = (0, 0);
            while p < ra.len() && q < rb.len() {
                match ra[p].cmp(&rb[q]) {
                    std::cmp::Ordering::Less => p += 1,
                    std::cmp::Ordering::Greater => q += 1,
                    std::cmp::Ordering::Equal => {
                        builder.push(ra[p], f(&va[p], &vb[q]));
                        p += 1;
                        q += 1;
                    }
                }
            }
            builder.end_column();
        }
        Ok(builder.finish(self.rows(), self.cols()))
    }

    /// Combine every stored entry with the matching element of a dense
    /// operand of the same shape, or with a dense scalar. Positions not
    /// stored stay zero, so `f(0, x)` must be zero.
    pub fn stored_with_dense<U, V: Element, F>(
        &self,
        dense: &DenseArray<U>,
        op: &str,
        mut f: F,
    ) -> Result<SparseArray<V>>
    where
        F: FnMut(&T, &U) -> V,
    {
        let scalar = dense.numel() == 1;
        if !scalar && dense.dims() != &self.dims() {
            return Err(ArrayError::nonconformant(op, &self.dims(), dense.dims()));
        }
        let nr = self.rows();
        let src = dense.as_slice();
        let mut poller = InterruptPoller::new();
        let mut builder = CscBuilder::new(self.cols(), self.nnz());
        for c in 0..self.cols() {
            let (rows, vals) = self.column(c);
            for (&r, v) in rows.iter().zip(vals) {
                poller.tick()?;
                let other = if scalar { &src[0] } else { &src[r + c * nr] };
                builder.push(r, f(v, other));
            }
            builder.end_column();
        }
        Ok(builder.finish(nr, self.cols()))
    }
}

impl<T> SparseArray<T>
where
    T: Element + Copy + Add<Output = T> + Mul<Output = T>,
{
    /// Sparse product by column accumulation.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        if self.cols() != other.rows() {
            return Err(ArrayError::nonconformant("*", &self.dims(), &other.dims()));
        }
        let (m, n) = (self.rows(), other.cols());
        let mut work = vec![T::default(); m];
        let mut seen = vec![usize::MAX; m];
        let mut touched: Vec<usize> = Vec::new();
        let mut poller = InterruptPoller::new();
        let mut builder = CscBuilder::new(n, self.nnz().max(other.nnz()));
        for j in 0..n {
            touched.clear();
            let (rb, vb) = other.column(j);
            for (&k, &bkj) in rb.iter().zip(vb) {
                let (ra, va) = self.column(k);
                poller.advance(ra.len() + 1)?;
                for (&i, &aik) in ra.iter().zip(va) {
                    if seen[i] != j {
                        seen[i] = j;
                        work[i] = T::default();
                        touched.push(i);
                    }
                    work[i] = work[i] + aik * bkj;
                }
            }
            touched.sort_unstable();
            for &i in &touched {
                builder.push(i, work[i]);
            }
            builder.end_column();
        }
        Ok(builder.finish(m, n))
    }

    /// Sparse times dense, producing a dense result.
    pub fn mul_dense(&self, other: &DenseArray<T>) -> Result<DenseArray<T>> {
        let (m, k) = (self.rows(), self.cols());
        if other.ndims() > 2 || other.rows() != k {
            return Err(ArrayError::nonconformant("*", &self.dims(), other.dims()));
        }
        let n = other.cols();
        let b = other.as_slice();
        let mut out = vec![T::default(); m * n];
        let mut poller = InterruptPoller::new();
        for j in 0..n {
            for kk in 0..k {
                let bkj = b[kk + j * k];
                let (rows, vals) = self.column(kk);
                poller.advance(rows.len() + 1)?;
                for (&i, &a) in rows.iter().zip(vals) {
                    out[i + j * m] = out[i + j * m] + a * bkj;
                }
            }
        }
        DenseArray::from_vec(out, DimVector::matrix(m, n))
    }

    /// Dense times sparse, producing a dense result.
    pub fn dense_mul(lhs: &DenseArray<T>, rhs: &Self) -> Result<DenseArray<T>> {
        let (m, k) = (lhs.rows(), lhs.cols());
        if lhs.ndims() > 2 || k != rhs.rows() {
            return Err(ArrayError::nonconformant("*", lhs.dims(), &rhs.dims()));
        }
        let n = rhs.cols();
        let a = lhs.as_slice();
        let mut out = vec![T::default(); m * n];
        let mut poller = InterruptPoller::new();
        for j in 0..n {
            let (rows, vals) = rhs.column(j);
            for (&kk, &skj) in rows.iter().zip(vals) {
                poller.advance(m)?;
                let col = &a[kk * m..(kk + 1) * m];
                for (i, &aik) in col.iter().enumerate() {
                    out[i + j * m] = out[i + j * m] + aik * skj;
                }
            }
        }
        DenseArray::from_vec(out, DimVector::matrix(m, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(rows: usize, cols: usize, data: &[f64]) -> SparseArray<f64> {
        let dense = DenseArray::from_vec(data.to_vec(), [rows, cols]).expect("shape");
        SparseArray::from_dense(&dense).expect("2-D")
    }

    #[test]
    fn union_keeps_either_side_and_drops_cancellation() {
        let a = sparse(2, 2, &[1.0, 0.0, 2.0, 3.0]);
        let b = sparse(2, 2, &[0.0, 5.0, -2.0, 0.0]);
        let sum = a.union_with(&b, "+", |x, y| x + y).expect("same shape");
        assert_eq!(sum.to_dense().as_slice(), &[1.0, 5.0, 0.0, 3.0]);
        assert_eq!(sum.nnz(), 3);
    }

    #[test]
    fn intersection_only_where_both_store() {
        let a = sparse(2, 2, &[1.0, 0.0, 2.0, 3.0]);
        let b = sparse(2, 2, &[4.0, 5.0, 0.0, 2.0]);
        let prod = a.intersect_with(&b, ".*", |x, y| x * y).expect("same shape");
        assert_eq!(prod.ridx(), &[0, 1]);
        assert_eq!(prod.data(), &[4.0, 6.0]);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let a = sparse(2, 2, &[1.0, 0.0, 2.0, 3.0]);
        let b = SparseArray::<f64>::new(3, 2);
        let err = a.union_with(&b, "+", |x, y| x + y).expect_err("2x2 vs 3x2");
        assert_eq!(
            err.to_string(),
            "operator +: nonconformant arguments (op1 is 2x2, op2 is 3x2)"
        );
    }

    #[test]
    fn stored_entries_against_dense() {
        let a = sparse(2, 2, &[1.0, 0.0, 2.0, 3.0]);
        let d = DenseArray::from_vec(vec![10.0, 20.0, 30.0, 40.0], [2, 2]).expect("shape");
        let out = a.stored_with_dense(&d, ".*", |x, y| x * y).expect("same shape");
        assert_eq!(out.data(), &[10.0, 60.0, 120.0]);
        let scaled = a
            .stored_with_dense(&DenseArray::scalar(0.5), ".*", |x, y| x * y)
            .expect("scalar");
        assert_eq!(scaled.data(), &[0.5, 1.0, 1.5]);
    }

    #[test]
    fn products_agree_with_dense_arithmetic() {
        // [1 2; 0 3] * [4 0; 5 6] = [14 12; 15 18]
        let a = sparse(2, 2, &[1.0, 0.0, 2.0, 3.0]);
        let b = sparse(2, 2, &[4.0, 5.0, 0.0, 6.0]);
        let expected = [14.0, 15.0, 12.0, 18.0];
        assert_eq!(a.matmul(&b).expect("conformant").to_dense().as_slice(), &expected);
        assert_eq!(a.mul_dense(&b.to_dense()).expect("conformant").as_slice(), &expected);
        assert_eq!(
            SparseArray::dense_mul(&a.to_dense(), &b).expect("conformant").as_slice(),
            &expected
        );
        let err = a.matmul(&SparseArray::new(3, 1)).expect_err("inner mismatch");
        assert!(err.to_string().starts_with("operator *: nonconformant arguments"));
    }
}
