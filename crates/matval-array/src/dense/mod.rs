//! Column-major N-d arrays with copy-on-write storage.
//!
//! A `DenseArray` is a view `[offset, offset + numel)` into a
//! [`SharedBuffer`]. Reshape, `A(:)`, contiguous slices and column
//! extraction share the buffer; every mutating entry point goes through
//! [`DenseArray::make_unique`].

mod broadcast;
mod index;
mod sort;

pub use broadcast::BroadcastPlan;
pub(crate) use index::{linear_result_dims, zero_dims_inquire2};
pub use sort::SortMode;

use std::fmt;

use crate::buffer::SharedBuffer;
use crate::dims::{strides_of, DimVector};
use crate::element::Element;
use crate::error::{ArrayError, Result};
use crate::interrupt::InterruptPoller;

#[derive(Clone)]
pub struct DenseArray<T> {
    buf: SharedBuffer<T>,
    offset: usize,
    dims: DimVector,
}

impl<T> DenseArray<T> {
    /// The 0x0 array.
    pub fn empty() -> Self {
        Self {
            buf: SharedBuffer::new(Vec::new()),
            offset: 0,
            dims: DimVector::empty(),
        }
    }

    pub fn from_vec(data: Vec<T>, dims: impl Into<DimVector>) -> Result<Self> {
        let dims = dims.into();
        if dims.numel() != data.len() {
            return Err(ArrayError::DimensionMismatch(format!(
                "cannot shape {} elements as {dims}",
                data.len()
            )));
        }
        Ok(Self {
            buf: SharedBuffer::new(data),
            offset: 0,
            dims,
        })
    }

    pub fn row(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            buf: SharedBuffer::new(data),
            offset: 0,
            dims: DimVector::matrix(1, n),
        }
    }

    pub fn column(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            buf: SharedBuffer::new(data),
            offset: 0,
            dims: DimVector::matrix(n, 1),
        }
    }

    pub fn scalar(value: T) -> Self {
        Self {
            buf: SharedBuffer::new(vec![value]),
            offset: 0,
            dims: DimVector::scalar(),
        }
    }

    /// View `[lo, hi)` of this array's elements with a new shape.
    pub(crate) fn slice(&self, lo: usize, hi: usize, dims: DimVector) -> Self {
        debug_assert_eq!(hi - lo, dims.numel());
        Self {
            buf: self.buf.acquire(),
            offset: self.offset + lo,
            dims,
        }
    }

    /// Same elements, new shape, shared storage. Caller guarantees the
    /// element count matches.
    pub(crate) fn with_dims_shared(&self, dims: DimVector) -> Self {
        Self {
            buf: self.buf.acquire(),
            offset: self.offset,
            dims,
        }
    }

    pub fn dims(&self) -> &DimVector {
        &self.dims
    }

    pub fn ndims(&self) -> usize {
        self.dims.ndims()
    }

    pub fn numel(&self) -> usize {
        self.dims.numel()
    }

    pub fn rows(&self) -> usize {
        self.dims.rows()
    }

    pub fn cols(&self) -> usize {
        self.dims.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_scalar()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buf.as_slice()[self.offset..self.offset + self.numel()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Number of arrays sharing this array's storage.
    pub fn ref_count(&self) -> usize {
        self.buf.ref_count()
    }

    pub fn shares_storage_with(&self, other: &Self) -> bool {
        self.buf.ptr_eq(&other.buf)
    }

    /// Unchecked linear access (panics on a bad index like slice indexing).
    #[inline]
    pub fn elem(&self, i: usize) -> &T {
        &self.as_slice()[i]
    }

    #[inline]
    pub fn elem2(&self, i: usize, j: usize) -> &T {
        &self.as_slice()[i + j * self.dims.rows()]
    }

    #[inline]
    pub fn elem3(&self, i: usize, j: usize, k: usize) -> &T {
        let r = self.dims.get(0);
        let c = self.dims.get(1);
        &self.as_slice()[i + r * (j + c * k)]
    }

    pub fn checkelem(&self, i: usize) -> Result<&T> {
        let n = self.numel();
        if i >= n {
            return Err(ArrayError::out_of_range(i + 1, n, None, &self.dims));
        }
        Ok(&self.as_slice()[i])
    }

    pub fn checkelem2(&self, i: usize, j: usize) -> Result<&T> {
        self.checkelem_nd(&[i, j])
    }

    pub fn checkelem3(&self, i: usize, j: usize, k: usize) -> Result<&T> {
        self.checkelem_nd(&[i, j, k])
    }

    pub fn checkelem_nd(&self, subs: &[usize]) -> Result<&T> {
        let offset = self.checked_offset(subs)?;
        Ok(&self.as_slice()[offset])
    }

    fn checked_offset(&self, subs: &[usize]) -> Result<usize> {
        let n = subs.len();
        let dv = self.dims.redim(n);
        let strides = strides_of(&dv);
        let mut offset = 0;
        for (k, (&s, &d)) in subs.iter().zip(&dv).enumerate() {
            if s >= d {
                return Err(ArrayError::out_of_range(s + 1, d, Some((k + 1, n)), &self.dims));
            }
            offset += s * strides[k];
        }
        Ok(offset)
    }

    /// Same elements under a new shape, sharing storage.
    pub fn reshape(&self, dims: impl Into<DimVector>) -> Result<Self> {
        let dims = dims.into();
        if dims.numel() != self.numel() {
            return Err(ArrayError::DimensionMismatch(format!(
                "reshape: can't reshape {} array to {dims} array",
                self.dims
            )));
        }
        Ok(self.with_dims_shared(dims))
    }
}

impl<T: Clone> DenseArray<T> {
    pub fn filled(dims: impl Into<DimVector>, value: T) -> Self {
        let dims = dims.into();
        let n = dims.numel();
        Self {
            buf: SharedBuffer::new(vec![value; n]),
            offset: 0,
            dims,
        }
    }

    /// Exclusive access to the elements, copying them when the storage is
    /// shared or this array is a view of a larger buffer.
    pub fn make_unique(&mut self) -> &mut [T] {
        let n = self.numel();
        if self.offset != 0 || self.buf.len() != n || !self.buf.is_unique() {
            let data = self.as_slice().to_vec();
            self.buf = SharedBuffer::new(data);
            self.offset = 0;
        }
        self.buf.make_unique().as_mut_slice()
    }

    pub fn elem_mut(&mut self, i: usize) -> &mut T {
        &mut self.make_unique()[i]
    }

    pub fn checkelem_mut(&mut self, subs: &[usize]) -> Result<&mut T> {
        let offset = self.checked_offset(subs)?;
        Ok(&mut self.make_unique()[offset])
    }

    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        let n = self.numel();
        if i >= n {
            return Err(ArrayError::out_of_range(i + 1, n, None, &self.dims));
        }
        self.make_unique()[i] = value;
        Ok(())
    }

    pub fn fill(&mut self, value: T) {
        if self.buf.is_unique() && self.offset == 0 && self.buf.len() == self.numel() {
            self.make_unique().fill(value);
        } else {
            *self = Self::filled(self.dims.clone(), value);
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    pub fn into_vec(self) -> Vec<T> {
        if self.offset == 0 && self.buf.len() == self.numel() {
            return self.buf.into_vec();
        }
        self.as_slice().to_vec()
    }

    /// Grow or shrink a vector-shaped array to `n` elements. Empty and 1xN
    /// arrays become rows, Nx1 arrays stay columns; anything else fails.
    pub fn resize1(&mut self, n: usize, fill: &T) -> Result<()> {
        if self.ndims() != 2 {
            return Err(ArrayError::invalid_resize());
        }
        let dims = if self.rows() == 0 || self.rows() == 1 {
            DimVector::matrix(1, n)
        } else if self.cols() == 1 {
            DimVector::matrix(n, 1)
        } else {
            return Err(ArrayError::invalid_resize());
        };
        let nx = self.numel();
        if n == nx {
            return Ok(());
        }
        let mut data = Vec::with_capacity(n);
        data.extend_from_slice(&self.as_slice()[..n.min(nx)]);
        data.resize(n, fill.clone());
        *self = Self::from_vec(data, dims)?;
        Ok(())
    }

    pub fn resize2(&mut self, r: usize, c: usize, fill: &T) -> Result<()> {
        self.resize(DimVector::matrix(r, c), fill)
    }

    /// Change the shape keeping the overlapping hyper-rectangle and filling
    /// new cells with `fill`.
    pub fn resize(&mut self, dims: impl Into<DimVector>, fill: &T) -> Result<()> {
        let dims = dims.into();
        if dims == self.dims {
            return Ok(());
        }
        if dims.ndims() < self.ndims() {
            return Err(ArrayError::invalid_resize());
        }
        let nd = dims.ndims();
        let old = self.dims.redim(nd);
        let new = dims.redim(nd);
        let old_strides = strides_of(&old);
        let total = dims.numel();
        let src = self.as_slice();
        let mut data = Vec::with_capacity(total);
        if nd == 2 {
            for j in 0..new[1] {
                for i in 0..new[0] {
                    if i < old[0] && j < old[1] {
                        data.push(src[i + j * old[0]].clone());
                    } else {
                        data.push(fill.clone());
                    }
                }
            }
        } else {
            let mut sub = vec![0usize; nd];
            for _ in 0..total {
                let inside = sub.iter().zip(&old).all(|(&s, &o)| s < o);
                if inside {
                    let off: usize = sub.iter().zip(&old_strides).map(|(s, st)| s * st).sum();
                    data.push(src[off].clone());
                } else {
                    data.push(fill.clone());
                }
                for (d, s) in sub.iter_mut().enumerate() {
                    *s += 1;
                    if *s < new[d] {
                        break;
                    }
                    *s = 0;
                }
            }
        }
        *self = Self::from_vec(data, dims)?;
        Ok(())
    }

    /// Reorder dimensions; `perm` is zero-based. With `inverse` the
    /// permutation is undone instead of applied.
    pub fn permute(&self, perm: &[usize], inverse: bool) -> Result<Self> {
        let nd = self.ndims();
        if perm.len() < nd {
            return Err(ArrayError::InvalidArgument(
                "permute: invalid permutation vector".to_string(),
            ));
        }
        let mut seen = vec![false; perm.len()];
        for &p in perm {
            if p >= perm.len() || seen[p] {
                return Err(ArrayError::InvalidArgument(
                    "permute: permutation vector contains an invalid element".to_string(),
                ));
            }
            seen[p] = true;
        }
        let perm: Vec<usize> = if inverse {
            let mut inv = vec![0; perm.len()];
            for (i, &p) in perm.iter().enumerate() {
                inv[p] = i;
            }
            inv
        } else {
            perm.to_vec()
        };

        let src_dims = self.dims.redim(perm.len());
        let src_strides = strides_of(&src_dims);
        let out_dims: Vec<usize> = perm.iter().map(|&p| src_dims[p]).collect();
        let out_dv = DimVector::new(out_dims.clone());
        if perm.iter().enumerate().all(|(i, &p)| i == p) {
            return Ok(self.with_dims_shared(out_dv));
        }

        let total = self.numel();
        let src = self.as_slice();
        let mut data = Vec::with_capacity(total);
        let mut sub = vec![0usize; perm.len()];
        for _ in 0..total {
            let off: usize = sub
                .iter()
                .zip(&perm)
                .map(|(&s, &p)| s * src_strides[p])
                .sum();
            data.push(src[off].clone());
            for (d, s) in sub.iter_mut().enumerate() {
                *s += 1;
                if *s < out_dims[d] {
                    break;
                }
                *s = 0;
            }
        }
        Self::from_vec(data, out_dv)
    }

    pub fn transpose(&self) -> Result<Self> {
        if self.ndims() != 2 {
            return Err(ArrayError::InvalidArgument(
                "transpose not defined for N-D objects".to_string(),
            ));
        }
        let (r, c) = (self.rows(), self.cols());
        if r == 1 || c == 1 {
            return Ok(self.with_dims_shared(DimVector::matrix(c, r)));
        }
        let src = self.as_slice();
        let mut data = Vec::with_capacity(r * c);
        for i in 0..r {
            for j in 0..c {
                data.push(src[i + j * r].clone());
            }
        }
        Self::from_vec(data, DimVector::matrix(c, r))
    }

    pub fn squeeze(&self) -> Self {
        self.with_dims_shared(self.dims.squeeze())
    }

    /// Element-wise transform preserving shape.
    pub fn map<U, F>(&self, mut f: F) -> Result<DenseArray<U>>
    where
        F: FnMut(&T) -> U,
    {
        let mut poller = InterruptPoller::new();
        let mut out = Vec::with_capacity(self.numel());
        for v in self.as_slice() {
            poller.tick()?;
            out.push(f(v));
        }
        DenseArray::from_vec(out, self.dims.clone())
    }

    /// Concatenate along `dim` (zero-based). 0x0 operands are skipped.
    pub fn cat(dim: usize, arrays: &[&DenseArray<T>]) -> Result<Self> {
        let Some(first) = arrays.first() else {
            return Ok(Self::empty());
        };
        if arrays.len() == 1 {
            return Ok((*first).clone());
        }
        let mut dims = first.dims.clone();
        for a in &arrays[1..] {
            if !dims.concat(&a.dims, dim) {
                return Err(concat_mismatch(dim, &dims, &a.dims));
            }
        }
        let nd = dims.ndims().max(dim + 1);
        let rdv = dims.redim(nd);
        let dl: usize = rdv[..dim].iter().product();
        let du: usize = rdv[dim + 1..].iter().product();
        let parts: Vec<&DenseArray<T>> = arrays
            .iter()
            .copied()
            .filter(|a| a.numel() > 0 && !(a.dims.zero_by_zero() && !dims.zero_by_zero()))
            .collect();

        let mut data = Vec::with_capacity(dims.numel());
        for u in 0..du {
            for a in &parts {
                let chunk = dl * a.dims.get(dim);
                let src = a.as_slice();
                data.extend_from_slice(&src[u * chunk..(u + 1) * chunk]);
            }
        }
        Self::from_vec(data, dims)
    }
}

pub(crate) fn concat_mismatch(dim: usize, a: &DimVector, b: &DimVector) -> ArrayError {
    let what = match dim {
        0 => "vertical dimensions mismatch",
        1 => "horizontal dimensions mismatch",
        _ => "concatenation dimensions mismatch",
    };
    ArrayError::DimensionMismatch(format!("{what} ({a} vs {b})"))
}

impl<T: Clone + Default> DenseArray<T> {
    pub fn new(dims: impl Into<DimVector>) -> Self {
        Self::filled(dims, T::default())
    }
}

impl<T: Element> DenseArray<T> {
    /// Zero-based linear positions of nonzero elements, optionally only the
    /// first (or, with `backward`, last) `limit` of them.
    pub fn find(&self, limit: Option<usize>, backward: bool) -> DenseArray<usize> {
        let src = self.as_slice();
        let hits: Vec<usize> = match (limit, backward) {
            (Some(n), false) => src
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_zero())
                .map(|(k, _)| k)
                .take(n)
                .collect(),
            (Some(n), true) => {
                let mut v: Vec<usize> = src
                    .iter()
                    .enumerate()
                    .rev()
                    .filter(|(_, v)| !v.is_zero())
                    .map(|(k, _)| k)
                    .take(n)
                    .collect();
                v.reverse();
                v
            }
            (None, _) => src
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_zero())
                .map(|(k, _)| k)
                .collect(),
        };
        let count = hits.len();
        let dims = if (self.numel() == 1 && count == 0)
            || (self.rows() == 0 && self.dims.as_slice()[1..].iter().product::<usize>() == 0)
        {
            DimVector::empty()
        } else if self.rows() == 1 && self.ndims() == 2 {
            DimVector::matrix(1, count)
        } else {
            DimVector::matrix(count, 1)
        };
        DenseArray {
            buf: SharedBuffer::new(hits),
            offset: 0,
            dims,
        }
    }

    pub fn nnz(&self) -> usize {
        self.iter().filter(|v| !v.is_zero()).count()
    }

    pub fn any_nan(&self) -> bool {
        self.iter().any(|v| v.is_nan())
    }
}

impl<T: PartialEq> PartialEq for DenseArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for DenseArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseArray")
            .field("dims", &self.dims)
            .field("data", &self.as_slice())
            .finish()
    }
}

impl<T> Default for DenseArray<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(dims: &[usize]) -> DenseArray<f64> {
        let n: usize = dims.iter().product();
        DenseArray::from_vec((0..n).map(|v| v as f64).collect(), dims).expect("shape")
    }

    #[test]
    fn clone_shares_until_mutated() {
        let a = seq(&[2, 3]);
        let mut b = a.clone();
        assert!(a.shares_storage_with(&b));
        assert_eq!(a.ref_count(), 2);

        *b.elem_mut(4) = 99.0;
        assert_eq!(a.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(*b.elem(4), 99.0);
        assert!(!a.shares_storage_with(&b));
        assert_eq!(a.ref_count(), 1);
    }

    #[test]
    fn reshape_preserves_linear_order() {
        let a = seq(&[2, 6]);
        let b = a.reshape([3, 2, 2]).expect("reshape");
        assert_eq!(b.numel(), 12);
        assert_eq!(b.as_slice(), a.as_slice());
        assert!(b.shares_storage_with(&a));
        assert_eq!(*b.elem3(1, 1, 1), 10.0);
    }

    #[test]
    fn reshape_with_different_numel_fails() {
        match seq(&[2, 3]).reshape([4, 2]) {
            Err(ArrayError::DimensionMismatch(msg)) => assert!(msg.contains("2x3")),
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn checkelem_reports_position_and_shape() {
        let a = seq(&[2, 3]);
        assert_eq!(*a.checkelem2(1, 2).expect("in range"), 5.0);
        let err = a.checkelem2(0, 3).expect_err("column out of range");
        assert_eq!(err.to_string(), "index (_,4): out of bound 3 (dimensions are 2x3)");
        let err = a.checkelem(6).expect_err("linear out of range");
        assert!(err.to_string().contains("index (7)"));
    }

    #[test]
    fn resize_pads_with_fill() {
        let mut a = seq(&[2, 2]);
        a.resize2(3, 3, &-1.0).expect("resize");
        assert_eq!(
            a.as_slice(),
            &[0.0, 1.0, -1.0, 2.0, 3.0, -1.0, -1.0, -1.0, -1.0]
        );
        let mut v = DenseArray::<f64>::empty();
        v.resize1(3, &0.0).expect("grow empty");
        assert_eq!(v.dims().as_slice(), &[1, 3]);
        let mut m = seq(&[2, 2]);
        assert!(matches!(m.resize1(5, &0.0), Err(ArrayError::InvalidResize(_))));
    }

    #[test]
    fn permute_and_inverse_round_trip() {
        let a = seq(&[2, 3, 4]);
        let p = a.permute(&[2, 0, 1], false).expect("permute");
        assert_eq!(p.dims().as_slice(), &[4, 2, 3]);
        assert_eq!(*p.elem3(3, 1, 2), *a.elem3(1, 2, 3));
        let back = p.permute(&[2, 0, 1], true).expect("inverse");
        assert_eq!(back, a);
        assert!(a.permute(&[0, 0, 1], false).is_err());
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let a = seq(&[2, 3]);
        let t = a.transpose().expect("2-D");
        assert_eq!(t.dims().as_slice(), &[3, 2]);
        assert_eq!(t.as_slice(), &[0.0, 2.0, 4.0, 1.0, 3.0, 5.0]);
        assert!(seq(&[2, 2, 2]).transpose().is_err());
    }

    #[test]
    fn squeeze_drops_singletons() {
        let a = seq(&[1, 1, 3]);
        assert_eq!(a.squeeze().dims().as_slice(), &[3, 1]);
    }

    #[test]
    fn find_respects_limits_and_orientation() {
        let a = DenseArray::row(vec![0.0, 2.0, 0.0, 4.0, 5.0]);
        assert_eq!(a.find(None, false).as_slice(), &[1, 3, 4]);
        assert_eq!(a.find(None, false).dims().as_slice(), &[1, 3]);
        assert_eq!(a.find(Some(2), false).as_slice(), &[1, 3]);
        assert_eq!(a.find(Some(2), true).as_slice(), &[3, 4]);
        let z = DenseArray::scalar(0.0);
        assert_eq!(z.find(None, false).dims(), &DimVector::empty());
    }

    #[test]
    fn cat_skips_empty_operands() {
        let a = seq(&[2, 2]);
        let b = DenseArray::from_vec(vec![10.0, 11.0], [2, 1]).expect("shape");
        let e = DenseArray::<f64>::empty();
        let h = DenseArray::cat(1, &[&e, &a, &b]).expect("horizontal");
        assert_eq!(h.dims().as_slice(), &[2, 3]);
        assert_eq!(h.as_slice(), &[0.0, 1.0, 2.0, 3.0, 10.0, 11.0]);
        let v = DenseArray::cat(0, &[&a, &a]).expect("vertical");
        assert_eq!(v.as_slice(), &[0.0, 1.0, 0.0, 1.0, 2.0, 3.0, 2.0, 3.0]);
        match DenseArray::cat(0, &[&a, &b]) {
            Err(ArrayError::DimensionMismatch(msg)) => assert!(msg.contains("vertical")),
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn map_changes_element_type() {
        let a = seq(&[2, 2]);
        let b = a.map(|v| *v > 1.0).expect("map");
        assert_eq!(b.as_slice(), &[false, false, true, true]);
        assert_eq!(b.dims(), a.dims());
    }
}
