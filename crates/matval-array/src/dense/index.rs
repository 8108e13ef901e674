//! Indexing, indexed assignment and deletion for dense arrays.

use super::DenseArray;
use crate::dims::{strides_of, DimVector};
use crate::error::{ArrayError, Result};
use crate::index::IndexVector;
use crate::interrupt::{check_interrupt, InterruptPoller};

/// Visit the linear offset of every element selected by `idx` over an
/// array of extents `dv`, in column-major order of the selection.
fn for_each_offset<F>(idx: &[IndexVector], dv: &[usize], mut f: F) -> Result<()>
where
    F: FnMut(usize, usize) -> Result<()>,
{
    let nd = idx.len();
    let strides = strides_of(dv);
    let lens: Vec<usize> = idx.iter().zip(dv).map(|(ix, &d)| ix.length(d)).collect();
    let total: usize = lens.iter().product();
    if total == 0 {
        return Ok(());
    }
    let mut sub = vec![0usize; nd];
    for k in 0..total {
        let offset: usize = (0..nd).map(|d| idx[d].get(sub[d]) * strides[d]).sum();
        f(k, offset)?;
        for (d, s) in sub.iter_mut().enumerate() {
            *s += 1;
            if *s < lens[d] {
                break;
            }
            *s = 0;
        }
    }
    Ok(())
}

/// Result shape of `A(idx)`: vector sources keep their own orientation,
/// everything else takes the shape of the subscript.
pub(crate) fn linear_result_dims(dims: &DimVector, idx: &IndexVector, len: usize) -> DimVector {
    let n = dims.numel();
    let rd = idx.orig_dims(n);
    if dims.ndims() == 2 && n != 1 && rd.is_vector() {
        if dims.cols() == 1 {
            return DimVector::matrix(len, 1);
        }
        if dims.rows() == 1 {
            return DimVector::matrix(1, len);
        }
    }
    rd
}

/// Shape an all-zero array grows to when colons ask the right-hand side
/// for their extent (`A = []; A(:, 1) = x`).
pub(crate) fn zero_dims_inquire2(i: &IndexVector, j: &IndexVector, rhdv: &DimVector) -> Vec<usize> {
    if i.is_colon() && j.is_colon() && rhdv.ndims() == 2 {
        return vec![rhdv.rows(), rhdv.cols()];
    }
    if rhdv.ndims() == 2 && !i.is_scalar() && !j.is_scalar() {
        return vec![
            if i.is_colon() { rhdv.rows() } else { i.extent(0) },
            if j.is_colon() { rhdv.cols() } else { j.extent(0) },
        ];
    }
    let rh = rhdv.chop_all_singletons();
    let mut k = 0;
    let mut rdv = vec![i.extent(0), j.extent(0)];
    for (slot, ix) in [i, j].into_iter().enumerate() {
        if ix.is_colon() {
            rdv[slot] = rh.get(k);
            k += 1;
        } else if !ix.is_scalar() {
            k += 1;
        }
    }
    rdv
}

fn zero_dims_inquire(idx: &[IndexVector], rhdv: &DimVector) -> Vec<usize> {
    if idx.len() == 2 {
        return zero_dims_inquire2(&idx[0], &idx[1], rhdv);
    }
    let mut rdv: Vec<usize> = idx.iter().map(|ix| ix.extent(0)).collect();
    let nonscalar = idx.iter().filter(|ix| !ix.is_scalar()).count();
    if idx.iter().all(IndexVector::is_colon) {
        for (d, slot) in rdv.iter_mut().enumerate() {
            *slot = rhdv.get(d);
        }
    } else if nonscalar == rhdv.ndims() {
        let mut j = 0;
        for (ix, slot) in idx.iter().zip(rdv.iter_mut()) {
            if ix.is_scalar() {
                continue;
            }
            if ix.is_colon() {
                *slot = rhdv.get(j);
            }
            j += 1;
        }
    } else {
        let rh = rhdv.chop_all_singletons();
        let mut j = 0;
        for (ix, slot) in idx.iter().zip(rdv.iter_mut()) {
            if ix.is_colon() {
                *slot = if j < rh.ndims() { rh.get(j) } else { 1 };
                j += 1;
            }
        }
    }
    rdv
}

impl<T: Clone> DenseArray<T> {
    /// `A(idx)` with a single (linear) subscript.
    pub fn index(&self, idx: &IndexVector) -> Result<Self> {
        let n = self.numel();
        if idx.is_colon() {
            return Ok(self.with_dims_shared(DimVector::matrix(n, 1)));
        }
        let ext = idx.extent(n);
        if ext != n {
            return Err(ArrayError::out_of_range(ext, n, None, &self.dims));
        }
        let len = idx.length(n);
        let rd = linear_result_dims(&self.dims, idx, len);
        if len == 0 {
            return Self::from_vec(Vec::new(), rd);
        }
        if let Some((lo, hi)) = idx.is_cont_range(n) {
            return Ok(self.slice(lo, hi, rd));
        }
        let src = self.as_slice();
        let mut poller = InterruptPoller::new();
        let mut out = Vec::with_capacity(len);
        for k in idx.iter(n) {
            poller.tick()?;
            out.push(src[k].clone());
        }
        Self::from_vec(out, rd)
    }

    /// `A(i, j)`; trailing dimensions fold into the column subscript.
    pub fn index2(&self, i: &IndexVector, j: &IndexVector) -> Result<Self> {
        let dv = self.dims.redim(2);
        let (r, c) = (dv[0], dv[1]);
        if i.extent(r) != r {
            return Err(ArrayError::out_of_range(i.extent(r), r, Some((1, 2)), &self.dims));
        }
        if j.extent(c) != c {
            return Err(ArrayError::out_of_range(j.extent(c), c, Some((2, 2)), &self.dims));
        }
        let (il, jl) = (i.length(r), j.length(c));
        let rd = DimVector::matrix(il, jl);
        if il == 0 || jl == 0 {
            return Self::from_vec(Vec::new(), rd);
        }
        if i.is_colon_equiv(r) {
            if let Some((lo, hi)) = j.is_cont_range(c) {
                return Ok(self.slice(lo * r, hi * r, rd));
            }
        }
        self.gather(&[i.clone(), j.clone()], &dv, rd)
    }

    /// `A(i1, i2, ..., in)`.
    pub fn index_nd(&self, idx: &[IndexVector]) -> Result<Self> {
        match idx {
            [] => return Ok(self.clone()),
            [i] => return self.index(i),
            [i, j] => return self.index2(i, j),
            _ => {}
        }
        let ial = idx.len();
        let dv = self.dims.redim(ial);
        for (k, (ix, &d)) in idx.iter().zip(&dv).enumerate() {
            if ix.extent(d) != d {
                return Err(ArrayError::out_of_range(
                    ix.extent(d),
                    d,
                    Some((k + 1, ial)),
                    &self.dims,
                ));
            }
        }
        if idx.iter().all(IndexVector::is_colon) {
            return Ok(self.with_dims_shared(DimVector::new(dv)));
        }
        let lens: Vec<usize> = idx.iter().zip(&dv).map(|(ix, &d)| ix.length(d)).collect();
        let rd = DimVector::new(lens.iter().copied());
        if lens.contains(&0) {
            return Self::from_vec(Vec::new(), rd);
        }

        // Leading full dimensions, one contiguous run, then scalars: a view.
        let strides = strides_of(&dv);
        let first = idx
            .iter()
            .zip(&dv)
            .position(|(ix, &d)| !ix.is_colon_equiv(d))
            .unwrap_or(ial);
        if first < ial {
            if let Some((lo, hi)) = idx[first].is_cont_range(dv[first]) {
                if idx[first + 1..].iter().all(IndexVector::is_scalar) {
                    let base: usize = idx[first + 1..]
                        .iter()
                        .enumerate()
                        .map(|(k, ix)| ix.get(0) * strides[first + 1 + k])
                        .sum();
                    let lo = base + lo * strides[first];
                    let hi = base + hi * strides[first];
                    return Ok(self.slice(lo, hi, rd));
                }
            }
        }
        self.gather(idx, &dv, rd)
    }

    fn gather(&self, idx: &[IndexVector], dv: &[usize], rd: DimVector) -> Result<Self> {
        let src = self.as_slice();
        let mut poller = InterruptPoller::new();
        let mut out = Vec::with_capacity(rd.numel());
        for_each_offset(idx, dv, |_, offset| {
            poller.tick()?;
            out.push(src[offset].clone());
            Ok(())
        })?;
        Self::from_vec(out, rd)
    }

    /// Indexing that first grows the array to cover every subscript,
    /// filling new cells with `fill`. A subscript list of scalars that is
    /// entirely out of range yields a 1x1 array holding `fill`.
    pub fn index_resize(&self, idx: &[IndexVector], fill: &T) -> Result<Self> {
        match idx {
            [] => Ok(self.clone()),
            [i] => {
                let n = self.numel();
                let nx = i.extent(n);
                let mut tmp = self.clone();
                if n != nx {
                    if i.is_scalar() {
                        return Ok(Self::filled(DimVector::scalar(), fill.clone()));
                    }
                    tmp.resize1(nx, fill)?;
                }
                if tmp.numel() != nx {
                    return Ok(Self::empty());
                }
                tmp.index(i)
            }
            _ => {
                let ial = idx.len();
                let dv = self.dims.redim(ial);
                let dvx: Vec<usize> = idx.iter().zip(&dv).map(|(ix, &d)| ix.extent(d)).collect();
                let mut tmp = self.clone();
                if dvx != dv {
                    if idx.iter().all(IndexVector::is_scalar) {
                        return Ok(Self::filled(DimVector::scalar(), fill.clone()));
                    }
                    tmp.resize(DimVector::new(dvx.iter().copied()), fill)?;
                    if tmp.dims.redim(ial) != dvx {
                        return Ok(Self::empty());
                    }
                }
                tmp.index_nd(idx)
            }
        }
    }

    /// `A(idx) = rhs` with a linear subscript. `rhs` is either a single
    /// value broadcast to every position or has one element per position.
    pub fn assign(&mut self, idx: &IndexVector, rhs: &Self, fill: &T) -> Result<()> {
        let n = self.numel();
        let rhl = rhs.numel();
        let il = idx.length(n);
        if rhl != 1 && il != rhl {
            return Err(ArrayError::nonconformant_assign(
                &DimVector::matrix(il, 1),
                rhs.dims(),
            ));
        }
        let nx = idx.extent(n);
        let colon = idx.is_colon_equiv(nx);
        check_interrupt()?;

        if nx != n {
            if self.dims.zero_by_zero() && colon {
                *self = if rhl == 1 {
                    Self::filled(DimVector::matrix(1, nx), rhs.elem(0).clone())
                } else {
                    rhs.with_dims_shared(DimVector::matrix(1, nx))
                };
                return Ok(());
            }
            self.resize1(nx, fill)?;
        }

        if colon {
            if rhl == 1 {
                self.fill(rhs.elem(0).clone());
            } else {
                *self = rhs.with_dims_shared(self.dims.clone());
            }
            return Ok(());
        }
        let n = self.numel();
        let dst = self.make_unique();
        if rhl == 1 {
            let value = rhs.elem(0);
            for k in idx.iter(n) {
                dst[k] = value.clone();
            }
        } else {
            for (k, value) in idx.iter(n).zip(rhs.iter()) {
                dst[k] = value.clone();
            }
        }
        Ok(())
    }

    /// `A(i1, ..., in) = rhs`. Singleton dimensions are ignored when
    /// matching the selection against `rhs`, and an all-zero array takes
    /// colon extents from `rhs`.
    pub fn assign_nd(&mut self, idx: &[IndexVector], rhs: &Self, fill: &T) -> Result<()> {
        match idx {
            [] => {
                return Err(ArrayError::InvalidArgument(
                    "assignment requires at least one subscript".to_string(),
                ))
            }
            [i] => return self.assign(i, rhs, fill),
            _ => {}
        }
        let ial = idx.len();
        let dv = self.dims.redim(ial);
        let rdv: Vec<usize> = if self.dims.all_zero() {
            zero_dims_inquire(idx, rhs.dims())
        } else {
            idx.iter().zip(&dv).map(|(ix, &d)| ix.extent(d)).collect()
        };

        let isfill = rhs.numel() == 1;
        let rh = rhs.dims().chop_all_singletons();
        let lens: Vec<usize> = idx.iter().zip(&rdv).map(|(ix, &d)| ix.length(d)).collect();
        let all_colons = idx.iter().zip(&rdv).all(|(ix, &d)| ix.is_colon_equiv(d));
        let mut matched = true;
        let mut j = 0;
        for &l in &lens {
            if l == 1 {
                continue;
            }
            matched = matched && j < rh.ndims() && l == rh.get(j);
            j += 1;
        }
        matched = matched && (j == rh.ndims() || rh.get(j) == 1);
        matched = matched || isfill;

        if !matched {
            if lens.contains(&0) && rhs.is_empty() {
                return Ok(());
            }
            return Err(ArrayError::nonconformant_assign(
                &DimVector::new(lens),
                rhs.dims(),
            ));
        }
        check_interrupt()?;

        if rdv != dv {
            if self.dims.zero_by_zero() && all_colons {
                let rd = DimVector::new(rdv);
                *self = if isfill {
                    Self::filled(rd, rhs.elem(0).clone())
                } else {
                    rhs.with_dims_shared(rd)
                };
                return Ok(());
            }
            self.resize(DimVector::new(rdv.iter().copied()), fill)?;
        }

        if all_colons {
            if isfill {
                self.fill(rhs.elem(0).clone());
            } else {
                *self = rhs.with_dims_shared(self.dims.clone());
            }
            return Ok(());
        }

        let dv = self.dims.redim(ial);
        let src = rhs.as_slice();
        let dst = self.make_unique();
        for_each_offset(idx, &dv, |k, offset| {
            dst[offset] = if isfill { src[0].clone() } else { src[k].clone() };
            Ok(())
        })
    }

    /// `A(idx) = []` with a linear subscript.
    pub fn delete_elements(&mut self, idx: &IndexVector) -> Result<()> {
        let n = self.numel();
        if idx.is_colon() {
            *self = Self::empty();
            return Ok(());
        }
        if idx.length(n) == 0 {
            return Ok(());
        }
        let ext = idx.extent(n);
        if ext != n {
            return Err(ArrayError::out_of_range(ext, n, None, &self.dims));
        }
        check_interrupt()?;

        let col_vec = self.ndims() == 2 && self.cols() == 1 && self.rows() != 1;
        if matches!(idx, IndexVector::Scalar(k) if *k == n - 1) && self.dims.is_vector() {
            let fill = self.elem(0).clone();
            return self.resize1(n - 1, &fill);
        }
        if let Some((lo, hi)) = idx.is_cont_range(n) {
            let m = n - (hi - lo);
            let src = self.as_slice();
            let mut data = Vec::with_capacity(m);
            data.extend_from_slice(&src[..lo]);
            data.extend_from_slice(&src[hi..]);
            let dims = if col_vec {
                DimVector::matrix(m, 1)
            } else {
                DimVector::matrix(1, m)
            };
            *self = Self::from_vec(data, dims)?;
            return Ok(());
        }
        *self = self.index(&idx.complement(n))?;
        Ok(())
    }

    /// Remove the slices selected by `idx` along dimension `dim`.
    pub fn delete_along(&mut self, dim: usize, idx: &IndexVector) -> Result<()> {
        let n = self.dims.get(dim);
        if idx.is_colon() {
            *self = Self::empty();
            return Ok(());
        }
        if idx.length(n) == 0 {
            return Ok(());
        }
        let ext = idx.extent(n);
        if ext != n {
            let nd = self.ndims().max(dim + 1);
            return Err(ArrayError::out_of_range(ext, n, Some((dim + 1, nd)), &self.dims));
        }
        check_interrupt()?;

        if let Some((lo, hi)) = idx.is_cont_range(n) {
            let nd = self.ndims().max(dim + 1);
            let dv = self.dims.redim(nd);
            let dl: usize = dv[..dim].iter().product();
            let du: usize = dv[dim + 1..].iter().product();
            let remaining = n - (hi - lo);
            let (l, u, n) = (lo * dl, hi * dl, n * dl);
            let src = self.as_slice();
            let mut data = Vec::with_capacity(src.len() - (u - l) * du);
            for chunk in src.chunks(n.max(1)).take(du) {
                data.extend_from_slice(&chunk[..l]);
                data.extend_from_slice(&chunk[u..]);
            }
            let dims = self.dims.with_dim(dim, remaining);
            *self = Self::from_vec(data, dims)?;
            return Ok(());
        }
        let nd = self.ndims().max(dim + 1);
        let mut all = vec![IndexVector::Colon; nd];
        all[dim] = idx.complement(n);
        *self = self.index_nd(&all)?;
        Ok(())
    }

    /// `A(i1, ..., in) = []`. Exactly one subscript may select a proper
    /// subset of its dimension; the others must cover their dimension.
    pub fn delete_elements_nd(&mut self, idx: &[IndexVector]) -> Result<()> {
        match idx {
            [] => return Ok(()),
            [i] => return self.delete_elements(i),
            _ => {}
        }
        let ial = idx.len();
        let dv = self.dims.redim(ial);
        let mut partial = Vec::new();
        let mut empty = false;
        for (k, (ix, &d)) in idx.iter().zip(&dv).enumerate() {
            if ix.length(d) == 0 {
                empty = true;
            }
            if !ix.is_colon_equiv(d) {
                partial.push(k);
            }
        }
        match partial.as_slice() {
            [] => {
                check_interrupt()?;
                *self = Self::from_vec(Vec::new(), self.dims.with_dim(0, 0))?;
                Ok(())
            }
            [dim] => {
                let dim = *dim;
                if ial < self.ndims() && dim == ial - 1 {
                    // The last subscript spans the folded trailing dimensions.
                    let folded = DimVector::new(dv);
                    let mut tmp = self.reshape(folded)?;
                    tmp.delete_along(dim, &idx[dim])?;
                    *self = tmp;
                    return Ok(());
                }
                self.delete_along(dim, &idx[dim])
            }
            _ if empty => Ok(()),
            _ => Err(ArrayError::InvalidResize(
                "a null assignment can only have one non-colon index".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magic5() -> DenseArray<f64> {
        DenseArray::from_vec((1..=25).map(f64::from).collect(), [5, 5]).expect("5x5")
    }

    #[test]
    fn contiguous_linear_index_is_a_view() {
        let a = magic5();
        let b = a.index(&IndexVector::contiguous(5, 10)).expect("in range");
        assert!(b.shares_storage_with(&a));
        assert_eq!(b.as_slice(), &[6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(b.dims().as_slice(), &[1, 5]);

        let col = a.index(&IndexVector::colon()).expect("colon");
        assert_eq!(col.dims().as_slice(), &[25, 1]);
    }

    #[test]
    fn vector_sources_keep_orientation() {
        let v = DenseArray::column(vec![1.0, 2.0, 3.0, 4.0]);
        let picked = v.index(&IndexVector::from_vec(vec![3, 0])).expect("in range");
        assert_eq!(picked.dims().as_slice(), &[2, 1]);
        assert_eq!(picked.as_slice(), &[4.0, 1.0]);
    }

    #[test]
    fn two_subscript_indexing_modes() {
        let a = magic5();
        let cols = a
            .index2(&IndexVector::colon(), &IndexVector::contiguous(1, 3))
            .expect("columns");
        assert!(cols.shares_storage_with(&a));
        assert_eq!(cols.dims().as_slice(), &[5, 2]);
        assert_eq!(*cols.elem2(0, 1), 11.0);

        let perm = a
            .index2(&IndexVector::from_vec(vec![4, 0]), &IndexVector::scalar(2))
            .expect("permuted rows");
        assert_eq!(perm.as_slice(), &[15.0, 11.0]);
        assert_eq!(perm.dims().as_slice(), &[2, 1]);

        let rev = a
            .index2(&IndexVector::scalar(0), &IndexVector::range(4, 5, -1).expect("range"))
            .expect("reversed");
        assert_eq!(rev.as_slice(), &[21.0, 16.0, 11.0, 6.0, 1.0]);
    }

    #[test]
    fn out_of_range_subscript_names_position() {
        let a = magic5();
        let err = a
            .index2(&IndexVector::scalar(0), &IndexVector::scalar(6))
            .expect_err("column 7 of 5");
        assert_eq!(err.to_string(), "index (_,7): out of bound 5 (dimensions are 5x5)");
    }

    #[test]
    fn nd_index_of_trailing_page_is_a_view() {
        let a = DenseArray::from_vec((0..12).map(f64::from).collect(), [2, 3, 2]).expect("shape");
        let page = a
            .index_nd(&[IndexVector::colon(), IndexVector::colon(), IndexVector::scalar(1)])
            .expect("page");
        assert!(page.shares_storage_with(&a));
        assert_eq!(page.dims().as_slice(), &[2, 3]);
        assert_eq!(*page.elem(0), 6.0);

        let fibre = a
            .index_nd(&[IndexVector::scalar(1), IndexVector::scalar(2), IndexVector::colon()])
            .expect("fibre");
        assert_eq!(fibre.dims().as_slice(), &[1, 1, 2]);
        assert_eq!(fibre.as_slice(), &[5.0, 11.0]);
    }

    #[test]
    fn index_resize_pads_out_of_range_reads() {
        let a = DenseArray::row(vec![1.0, 2.0]);
        let b = a
            .index_resize(&[IndexVector::contiguous(0, 4)], &0.0)
            .expect("grown");
        assert_eq!(b.as_slice(), &[1.0, 2.0, 0.0, 0.0]);
        let c = a.index_resize(&[IndexVector::scalar(9)], &-1.0).expect("scalar");
        assert_eq!(c.as_slice(), &[-1.0]);
    }

    #[test]
    fn assign_row_with_matching_vector() {
        let mut a = DenseArray::filled([2, 3], 0.0);
        let rhs = DenseArray::row(vec![9.0, 9.0, 9.0]);
        a.assign_nd(&[IndexVector::scalar(1), IndexVector::contiguous(0, 3)], &rhs, &0.0)
            .expect("conformant");
        assert_eq!(a.as_slice(), &[0.0, 9.0, 0.0, 9.0, 0.0, 9.0]);
    }

    #[test]
    fn assign_grows_and_rejects_mismatch() {
        let mut a = DenseArray::row(vec![1.0, 2.0]);
        a.assign(&IndexVector::scalar(4), &DenseArray::scalar(5.0), &0.0)
            .expect("grow");
        assert_eq!(a.as_slice(), &[1.0, 2.0, 0.0, 0.0, 5.0]);

        let err = a
            .assign(&IndexVector::from_vec(vec![0, 1, 2]), &DenseArray::row(vec![1.0, 2.0]), &0.0)
            .expect_err("three positions, two values");
        assert_eq!(
            err.to_string(),
            "=: nonconformant arguments (op1 is 3x1, op2 is 1x2)"
        );

        let mut m = magic5();
        let err = m
            .assign_nd(
                &[IndexVector::contiguous(0, 2), IndexVector::contiguous(0, 2)],
                &DenseArray::new([3, 3]),
                &0.0,
            )
            .expect_err("2x2 target, 3x3 source");
        assert!(matches!(err, ArrayError::DimensionMismatch(_)));
    }

    #[test]
    fn empty_array_takes_colon_extent_from_rhs() {
        let mut a = DenseArray::<f64>::empty();
        a.assign_nd(
            &[IndexVector::colon(), IndexVector::scalar(0)],
            &DenseArray::column(vec![1.0, 2.0, 3.0]),
            &0.0,
        )
        .expect("inquire");
        assert_eq!(a.dims().as_slice(), &[3, 1]);

        let mut b = DenseArray::<f64>::empty();
        b.assign(&IndexVector::contiguous(0, 3), &DenseArray::scalar(7.0), &0.0)
            .expect("fill");
        assert_eq!(b.dims().as_slice(), &[1, 3]);
    }

    #[test]
    fn assign_does_not_touch_aliases() {
        let a = magic5();
        let mut b = a.clone();
        b.assign(&IndexVector::scalar(0), &DenseArray::scalar(-1.0), &0.0)
            .expect("assign");
        assert_eq!(*a.elem(0), 1.0);
        assert_eq!(*b.elem(0), -1.0);
    }

    #[test]
    fn deleting_middle_columns() {
        let mut a = magic5();
        a.delete_elements_nd(&[IndexVector::colon(), IndexVector::contiguous(1, 4)])
            .expect("delete columns");
        assert_eq!(a.dims().as_slice(), &[5, 2]);
        let expected: Vec<f64> = (1..=5).chain(21..=25).map(f64::from).collect();
        assert_eq!(a.as_slice(), expected.as_slice());
    }

    #[test]
    fn deleting_scattered_rows_uses_complement() {
        let mut a = magic5();
        a.delete_elements_nd(&[IndexVector::from_vec(vec![0, 2]), IndexVector::colon()])
            .expect("delete rows");
        assert_eq!(a.dims().as_slice(), &[3, 5]);
        assert_eq!(*a.elem2(0, 0), 2.0);
        assert_eq!(*a.elem2(2, 4), 25.0);
    }

    #[test]
    fn linear_deletion_from_matrix_gives_row() {
        let mut a = magic5();
        a.delete_elements(&IndexVector::from_vec(vec![0, 24])).expect("delete");
        assert_eq!(a.dims().as_slice(), &[1, 23]);

        let mut v = DenseArray::column(vec![1.0, 2.0, 3.0]);
        v.delete_elements(&IndexVector::scalar(2)).expect("pop");
        assert_eq!(v.dims().as_slice(), &[2, 1]);
    }

    #[test]
    fn two_partial_subscripts_cannot_delete() {
        let mut a = magic5();
        let err = a
            .delete_elements_nd(&[IndexVector::scalar(0), IndexVector::scalar(0)])
            .expect_err("ambiguous deletion");
        assert!(matches!(err, ArrayError::InvalidResize(_)));
        assert_eq!(a.numel(), 25);

        a.delete_elements_nd(&[IndexVector::from_vec(Vec::new()), IndexVector::scalar(0)])
            .expect("empty selection deletes nothing");
        assert_eq!(a.numel(), 25);
    }
}
