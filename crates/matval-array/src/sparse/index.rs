//! Indexing, indexed assignment and deletion for sparse matrices.
//!
//! Assignment collects every write before touching the target, so an
//! interrupt or a shape error leaves the matrix as it was.

use std::sync::Arc;

use super::{CscBuilder, SparseArray, SparseRep};
use crate::dense::{linear_result_dims, zero_dims_inquire2};
use crate::dims::DimVector;
use crate::element::Element;
use crate::error::{ArrayError, Result};
use crate::index::IndexVector;
use crate::interrupt::{check_interrupt, InterruptPoller};

/// Pending write as `(col, row, value)`; a zero value erases the entry.
type Update<T> = (usize, usize, T);

/// Selection lengths against the right-hand side shape, ignoring
/// singleton dimensions on both sides.
fn selection_matches(lens: &[usize], rhs: &DimVector) -> bool {
    let rh = rhs.chop_all_singletons();
    let mut j = 0;
    for &l in lens {
        if l == 1 {
            continue;
        }
        if j >= rh.ndims() || l != rh.get(j) {
            return false;
        }
        j += 1;
    }
    j == rh.ndims() || rh.get(j) == 1
}

fn two_partial_deletion() -> ArrayError {
    ArrayError::InvalidDeletion("a null assignment can only have one non-colon index".to_string())
}

impl<T: Element> SparseArray<T> {
    fn linear_value(&self, k: usize) -> T {
        let nr = self.rows();
        self.celem(k % nr, k / nr)
    }

    /// `A(idx)` with a linear subscript.
    pub fn index(&self, idx: &IndexVector) -> Result<Self> {
        let n = self.numel();
        if idx.is_colon() {
            return self.reshape(DimVector::matrix(n, 1));
        }
        let ext = idx.extent(n);
        if ext != n {
            return Err(ArrayError::out_of_range(ext, n, None, &self.dims()));
        }
        let len = idx.length(n);
        let mut rd = linear_result_dims(&self.dims(), idx, len);
        if rd.ndims() > 2 {
            rd = DimVector::matrix(len, 1);
        }
        let (rnr, rnc) = (rd.rows(), rd.cols());
        if len == 0 {
            return Ok(Self::new(rnr, rnc));
        }
        let mut poller = InterruptPoller::new();

        if self.cols() == 1 && rnc == 1 {
            if let Some((lo, hi)) = idx.is_cont_range(n) {
                let rows = self.ridx();
                let a = rows.partition_point(|&r| r < lo);
                let b = rows.partition_point(|&r| r < hi);
                poller.advance(b - a)?;
                let mut builder = CscBuilder::new(1, b - a);
                for (&r, v) in rows[a..b].iter().zip(&self.data()[a..b]) {
                    builder.push(r - lo, v.clone());
                }
                builder.end_column();
                return Ok(builder.finish(rnr, 1));
            }
        }

        let mut builder = CscBuilder::new(rnc, len.min(self.nnz()));
        for (k, p) in idx.iter(n).enumerate() {
            poller.tick()?;
            let value = self.linear_value(p);
            if !value.is_zero() {
                builder.open_column(k / rnr);
                builder.push(k % rnr, value);
            }
        }
        Ok(builder.finish(rnr, rnc))
    }

    fn select_columns(&self, j: &IndexVector) -> Result<Self> {
        let nc = self.cols();
        if j.is_colon_equiv(nc) {
            return Ok(self.clone());
        }
        if let Some((lo, hi)) = j.is_cont_range(nc) {
            let cidx = self.cidx();
            let (a, b) = (cidx[lo], cidx[hi]);
            return Ok(Self {
                rep: Arc::new(SparseRep {
                    data: self.data()[a..b].to_vec(),
                    ridx: self.ridx()[a..b].to_vec(),
                    cidx: cidx[lo..=hi].iter().map(|&p| p - a).collect(),
                    nrows: self.rows(),
                    ncols: hi - lo,
                }),
            });
        }
        let jl = j.length(nc);
        let total: usize = j.iter(nc).map(|c| self.column(c).0.len()).sum();
        let mut poller = InterruptPoller::new();
        let mut builder = CscBuilder::new(jl, total);
        for c in j.iter(nc) {
            let (rows, vals) = self.column(c);
            poller.advance(rows.len().max(1))?;
            for (&r, v) in rows.iter().zip(vals) {
                builder.push(r, v.clone());
            }
            builder.end_column();
        }
        Ok(builder.finish(self.rows(), jl))
    }

    fn select_rows(&self, i: &IndexVector) -> Result<Self> {
        let (nr, nc) = (self.rows(), self.cols());
        if i.is_colon_equiv(nr) {
            return Ok(self.clone());
        }
        let il = i.length(nr);
        let mut poller = InterruptPoller::new();
        let mut builder = CscBuilder::new(nc, self.nnz().min(il.saturating_mul(nc)));

        if let IndexVector::Scalar(r) = i {
            for c in 0..nc {
                poller.tick()?;
                if let Ok(p) = self.position(*r, c) {
                    builder.push(0, self.rep.data[p].clone());
                }
                builder.end_column();
            }
            return Ok(builder.finish(1, nc));
        }

        if let Some((lo, hi)) = i.is_cont_range(nr) {
            for c in 0..nc {
                let (rows, vals) = self.column(c);
                let a = rows.partition_point(|&r| r < lo);
                let b = rows.partition_point(|&r| r < hi);
                poller.advance(b - a + 1)?;
                for (&r, v) in rows[a..b].iter().zip(&vals[a..b]) {
                    builder.push(r - lo, v.clone());
                }
                builder.end_column();
            }
            return Ok(builder.finish(il, nc));
        }

        // Source row -> output rows, bucketed by counting.
        let mut starts = vec![0usize; nr + 1];
        for r in i.iter(nr) {
            starts[r + 1] += 1;
        }
        for r in 0..nr {
            starts[r + 1] += starts[r];
        }
        let mut next = starts.clone();
        let mut targets = vec![0usize; il];
        for (k, r) in i.iter(nr).enumerate() {
            targets[next[r]] = k;
            next[r] += 1;
        }
        let mut column: Vec<(usize, &T)> = Vec::new();
        for c in 0..nc {
            let (rows, vals) = self.column(c);
            column.clear();
            for (&r, v) in rows.iter().zip(vals) {
                column.extend(targets[starts[r]..starts[r + 1]].iter().map(|&k| (k, v)));
            }
            poller.advance(column.len().max(1))?;
            column.sort_unstable_by_key(|&(k, _)| k);
            for &(k, v) in &column {
                builder.push(k, v.clone());
            }
            builder.end_column();
        }
        Ok(builder.finish(il, nc))
    }

    /// `A(i, j)`.
    pub fn index2(&self, i: &IndexVector, j: &IndexVector) -> Result<Self> {
        let (nr, nc) = (self.rows(), self.cols());
        if i.extent(nr) != nr {
            return Err(ArrayError::out_of_range(i.extent(nr), nr, Some((1, 2)), &self.dims()));
        }
        if j.extent(nc) != nc {
            return Err(ArrayError::out_of_range(j.extent(nc), nc, Some((2, 2)), &self.dims()));
        }
        self.select_columns(j)?.select_rows(i)
    }

    /// `A(i, j, ...)`; subscripts past the second must select the single
    /// page a matrix has.
    pub fn index_nd(&self, idx: &[IndexVector]) -> Result<Self> {
        match idx {
            [] => Ok(self.clone()),
            [i] => self.index(i),
            [i, j] => self.index2(i, j),
            [i, j, rest @ ..] => {
                for (k, ix) in rest.iter().enumerate() {
                    let ext = ix.extent(1);
                    if ext != 1 {
                        return Err(ArrayError::out_of_range(
                            ext,
                            1,
                            Some((k + 3, idx.len())),
                            &self.dims(),
                        ));
                    }
                    if ix.length(1) != 1 {
                        return Err(ArrayError::InvalidArgument(
                            "index: a sparse result must be two-dimensional".to_string(),
                        ));
                    }
                }
                self.index2(i, j)
            }
        }
    }

    /// Indexing that grows the matrix to cover every subscript first.
    /// Out-of-range scalar subscripts read a single zero.
    pub fn index_resize(&self, idx: &[IndexVector]) -> Result<Self> {
        match idx {
            [i] => {
                let n = self.numel();
                let nx = i.extent(n);
                if nx == n {
                    return self.index(i);
                }
                if i.is_scalar() {
                    return Ok(Self::new(1, 1));
                }
                let mut tmp = self.clone();
                tmp.resize1(nx)?;
                tmp.index(i)
            }
            [i, j] => {
                let (nr, nc) = (self.rows(), self.cols());
                let (rx, cx) = (i.extent(nr), j.extent(nc));
                if (rx, cx) == (nr, nc) {
                    return self.index2(i, j);
                }
                if i.is_scalar() && j.is_scalar() {
                    return Ok(Self::new(1, 1));
                }
                let mut tmp = self.clone();
                tmp.resize(rx, cx);
                tmp.index2(i, j)
            }
            _ => self.index_nd(idx),
        }
    }

    /// `A(idx) = rhs` with a linear subscript. Zeros in `rhs` remove the
    /// entries they land on.
    pub fn assign(&mut self, idx: &IndexVector, rhs: &Self) -> Result<()> {
        let n = self.numel();
        let rhl = rhs.numel();
        let il = idx.length(n);
        if rhl != 1 && il != rhl {
            return Err(ArrayError::nonconformant_assign(
                &DimVector::matrix(il, 1),
                &rhs.dims(),
            ));
        }
        let nx = idx.extent(n);
        let (nr, nc) = if nx != n {
            self.resize1_dims(nx)?
        } else {
            (self.rows(), self.cols())
        };

        let fill = (rhl == 1).then(|| rhs.linear_value(0));
        let mut poller = InterruptPoller::new();
        let mut updates = Vec::with_capacity(il);
        for (k, p) in idx.iter(n).enumerate() {
            poller.tick()?;
            let value = match &fill {
                Some(v) => v.clone(),
                None => rhs.linear_value(k),
            };
            updates.push((p / nr, p % nr, value));
        }
        check_interrupt()?;

        if (nr, nc) != (self.rows(), self.cols()) {
            self.resize(nr, nc);
        }
        self.apply_updates(updates);
        Ok(())
    }

    /// `A(i, j) = rhs`. A 0x0 target takes colon extents from `rhs`.
    pub fn assign2(&mut self, i: &IndexVector, j: &IndexVector, rhs: &Self) -> Result<()> {
        let (nr, nc) = (self.rows(), self.cols());
        let (rr, rc) = if nr == 0 && nc == 0 {
            let rdv = zero_dims_inquire2(i, j, &rhs.dims());
            (rdv[0], rdv[1])
        } else {
            (i.extent(nr), j.extent(nc))
        };
        let (il, jl) = (i.length(rr), j.length(rc));
        let isfill = rhs.numel() == 1;
        if !isfill && !selection_matches(&[il, jl], &rhs.dims()) {
            if (il == 0 || jl == 0) && rhs.is_empty() {
                return Ok(());
            }
            return Err(ArrayError::nonconformant_assign(
                &DimVector::matrix(il, jl),
                &rhs.dims(),
            ));
        }

        let fill = isfill.then(|| rhs.linear_value(0));
        let mut poller = InterruptPoller::new();
        let mut updates = Vec::with_capacity(il.saturating_mul(jl));
        let mut k = 0;
        for c in j.iter(rc) {
            for r in i.iter(rr) {
                poller.tick()?;
                let value = match &fill {
                    Some(v) => v.clone(),
                    None => rhs.linear_value(k),
                };
                updates.push((c, r, value));
                k += 1;
            }
        }
        check_interrupt()?;

        if (rr, rc) != (nr, nc) {
            self.resize(rr, rc);
        }
        self.apply_updates(updates);
        Ok(())
    }

    /// `A(i1, ..., in) = rhs`. Subscripts past the second may only address
    /// the first page.
    pub fn assign_nd(&mut self, idx: &[IndexVector], rhs: &Self) -> Result<()> {
        match idx {
            [] => Err(ArrayError::InvalidArgument(
                "assignment requires at least one subscript".to_string(),
            )),
            [i] => self.assign(i, rhs),
            [i, j] => self.assign2(i, j, rhs),
            [i, j, rest @ ..] => {
                if rest.iter().any(|ix| ix.extent(1) != 1) {
                    return Err(ArrayError::InvalidResize(
                        "a sparse matrix cannot grow beyond two dimensions".to_string(),
                    ));
                }
                self.assign2(i, j, rhs)
            }
        }
    }

    /// Merge sorted writes into the stored pattern. Later writes to the
    /// same position win.
    fn apply_updates(&mut self, mut updates: Vec<Update<T>>) {
        if updates.is_empty() {
            return;
        }
        updates.sort_by_key(|u| (u.0, u.1));
        let mut merged: Vec<Update<T>> = Vec::with_capacity(updates.len());
        for u in updates {
            match merged.last_mut() {
                Some(last) if last.0 == u.0 && last.1 == u.1 => *last = u,
                _ => merged.push(u),
            }
        }

        let (nr, nc) = (self.rows(), self.cols());
        let mut builder = CscBuilder::new(nc, self.nnz() + merged.len());
        let mut pending = merged.into_iter().peekable();
        for c in 0..nc {
            let (rows, vals) = self.column(c);
            let mut p = 0;
            loop {
                let next_row = pending.peek().filter(|u| u.0 == c).map(|u| u.1);
                match (rows.get(p), next_row) {
                    (Some(&r), Some(ur)) if r < ur => {
                        builder.push(r, vals[p].clone());
                        p += 1;
                    }
                    (Some(&r), Some(ur)) if r == ur => {
                        p += 1;
                        if let Some((_, _, v)) = pending.next() {
                            builder.push(ur, v);
                        }
                    }
                    (_, Some(ur)) => {
                        if let Some((_, _, v)) = pending.next() {
                            builder.push(ur, v);
                        }
                    }
                    (Some(&r), None) => {
                        builder.push(r, vals[p].clone());
                        p += 1;
                    }
                    (None, None) => break,
                }
            }
            builder.end_column();
        }
        *self = builder.finish(nr, nc);
    }

    /// `A(idx) = []` with a linear subscript. Deleting from a matrix
    /// leaves a row vector.
    pub fn delete_elements(&mut self, idx: &IndexVector) -> Result<()> {
        let n = self.numel();
        if idx.is_colon() {
            *self = Self::new(0, 0);
            return Ok(());
        }
        if idx.length(n) == 0 {
            return Ok(());
        }
        let ext = idx.extent(n);
        if ext != n {
            return Err(ArrayError::out_of_range(ext, n, None, &self.dims()));
        }
        check_interrupt()?;

        if self.cols() == 1 && self.rows() != 1 {
            if let Some((lo, hi)) = idx.is_cont_range(n) {
                let width = hi - lo;
                let mut builder = CscBuilder::new(1, self.nnz());
                for (&r, v) in self.ridx().iter().zip(self.data()) {
                    if r < lo {
                        builder.push(r, v.clone());
                    } else if r >= hi {
                        builder.push(r - width, v.clone());
                    }
                }
                builder.end_column();
                *self = builder.finish(n - width, 1);
                return Ok(());
            }
        }
        *self = self.index(&idx.complement(n))?;
        Ok(())
    }

    /// `A(i, j) = []`: one subscript must cover its whole dimension.
    pub fn delete_elements2(&mut self, i: &IndexVector, j: &IndexVector) -> Result<()> {
        let (nr, nc) = (self.rows(), self.cols());
        if i.is_colon_equiv(nr) {
            return self.delete_columns(j);
        }
        if j.is_colon_equiv(nc) {
            return self.delete_rows(i);
        }
        if i.length(nr) == 0 || j.length(nc) == 0 {
            return Ok(());
        }
        Err(two_partial_deletion())
    }

    pub fn delete_elements_nd(&mut self, idx: &[IndexVector]) -> Result<()> {
        match idx {
            [] => Ok(()),
            [i] => self.delete_elements(i),
            [i, j] => self.delete_elements2(i, j),
            [i, j, rest @ ..] => {
                for (k, ix) in rest.iter().enumerate() {
                    let ext = ix.extent(1);
                    if ext != 1 {
                        return Err(ArrayError::out_of_range(
                            ext,
                            1,
                            Some((k + 3, idx.len())),
                            &self.dims(),
                        ));
                    }
                }
                if rest.iter().all(|ix| ix.is_colon_equiv(1)) {
                    return self.delete_elements2(i, j);
                }
                let (nr, nc) = (self.rows(), self.cols());
                if i.is_colon_equiv(nr) && j.is_colon_equiv(nc) {
                    return Ok(());
                }
                Err(two_partial_deletion())
            }
        }
    }

    fn delete_columns(&mut self, j: &IndexVector) -> Result<()> {
        let (nr, nc) = (self.rows(), self.cols());
        if j.length(nc) == 0 {
            return Ok(());
        }
        let ext = j.extent(nc);
        if ext != nc {
            return Err(ArrayError::out_of_range(ext, nc, Some((2, 2)), &self.dims()));
        }
        check_interrupt()?;

        if let Some((lo, hi)) = j.is_cont_range(nc) {
            let cidx = self.cidx();
            let (a, b) = (cidx[lo], cidx[hi]);
            let removed = b - a;
            let mut data = Vec::with_capacity(self.nnz() - removed);
            data.extend_from_slice(&self.data()[..a]);
            data.extend_from_slice(&self.data()[b..]);
            let mut ridx = Vec::with_capacity(self.nnz() - removed);
            ridx.extend_from_slice(&self.ridx()[..a]);
            ridx.extend_from_slice(&self.ridx()[b..]);
            let mut new_cidx = Vec::with_capacity(nc - (hi - lo) + 1);
            new_cidx.extend_from_slice(&cidx[..=lo]);
            new_cidx.extend(cidx[hi + 1..].iter().map(|&p| p - removed));
            *self = Self {
                rep: Arc::new(SparseRep {
                    data,
                    ridx,
                    cidx: new_cidx,
                    nrows: nr,
                    ncols: nc - (hi - lo),
                }),
            };
            return Ok(());
        }
        *self = self.select_columns(&j.complement(nc))?;
        Ok(())
    }

    fn delete_rows(&mut self, i: &IndexVector) -> Result<()> {
        let (nr, nc) = (self.rows(), self.cols());
        if i.length(nr) == 0 {
            return Ok(());
        }
        let ext = i.extent(nr);
        if ext != nr {
            return Err(ArrayError::out_of_range(ext, nr, Some((1, 2)), &self.dims()));
        }
        if let Some((lo, hi)) = i.is_cont_range(nr) {
            check_interrupt()?;
            let width = hi - lo;
            let mut builder = CscBuilder::new(nc, self.nnz());
            for c in 0..nc {
                let (rows, vals) = self.column(c);
                for (&r, v) in rows.iter().zip(vals) {
                    if r < lo {
                        builder.push(r, v.clone());
                    } else if r >= hi {
                        builder.push(r - width, v.clone());
                    }
                }
                builder.end_column();
            }
            *self = builder.finish(nr - width, nc);
            return Ok(());
        }
        let mut t = self.transpose();
        t.delete_columns(i)?;
        *self = t.transpose();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::DenseArray;

    fn sparse(rows: usize, cols: usize, data: &[f64]) -> SparseArray<f64> {
        let dense = DenseArray::from_vec(data.to_vec(), [rows, cols]).expect("shape");
        SparseArray::from_dense(&dense).expect("2-D")
    }

    // [1 0 2; 0 0 3; 4 0 0]
    fn sample() -> SparseArray<f64> {
        sparse(3, 3, &[1.0, 0.0, 4.0, 0.0, 0.0, 0.0, 2.0, 3.0, 0.0])
    }

    #[test]
    fn linear_index_follows_dense_shape_rules() {
        let s = sample();
        let all = s.index(&IndexVector::colon()).expect("colon");
        assert_eq!(all.dims().as_slice(), &[9, 1]);
        assert_eq!(all.nnz(), 4);

        let picked = s.index(&IndexVector::from_vec(vec![2, 6, 1])).expect("in range");
        assert_eq!(picked.dims().as_slice(), &[1, 3]);
        assert_eq!(picked.to_dense().as_slice(), &[4.0, 2.0, 0.0]);

        let err = s.index(&IndexVector::scalar(9)).expect_err("past the end");
        assert_eq!(err.to_string(), "index (10): out of bound 9 (dimensions are 3x3)");
    }

    #[test]
    fn contiguous_slice_of_column_vector() {
        let v = sparse(5, 1, &[0.0, 1.0, 0.0, 2.0, 3.0]);
        let part = v.index(&IndexVector::contiguous(1, 4)).expect("in range");
        assert_eq!(part.dims().as_slice(), &[3, 1]);
        assert_eq!(part.ridx(), &[0, 2]);
        assert_eq!(part.data(), &[1.0, 2.0]);
    }

    #[test]
    fn two_subscripts_select_rows_and_columns() {
        let s = sample();
        let sub = s
            .index2(&IndexVector::from_vec(vec![2, 0, 0]), &IndexVector::contiguous(0, 2))
            .expect("in range");
        assert_eq!(sub.dims().as_slice(), &[3, 2]);
        assert_eq!(sub.to_dense().as_slice(), &[4.0, 1.0, 1.0, 0.0, 0.0, 0.0]);

        let row = s.index2(&IndexVector::scalar(1), &IndexVector::colon()).expect("row");
        assert_eq!(row.to_dense().as_slice(), &[0.0, 0.0, 3.0]);

        let cols = s
            .index2(&IndexVector::colon(), &IndexVector::from_vec(vec![2, 0]))
            .expect("columns");
        assert_eq!(cols.celem(0, 0), 2.0);
        assert_eq!(cols.celem(2, 1), 4.0);

        let err = s
            .index2(&IndexVector::scalar(0), &IndexVector::scalar(6))
            .expect_err("column 7");
        assert_eq!(err.to_string(), "index (_,7): out of bound 3 (dimensions are 3x3)");
    }

    #[test]
    fn trailing_subscripts_must_be_one() {
        let s = sample();
        let same = s
            .index_nd(&[IndexVector::colon(), IndexVector::colon(), IndexVector::scalar(0)])
            .expect("first page");
        assert_eq!(same, s);
        assert!(s
            .index_nd(&[IndexVector::colon(), IndexVector::colon(), IndexVector::scalar(1)])
            .is_err());
    }

    #[test]
    fn assignment_reads_back_and_erases_zeros() {
        let mut s = sample();
        s.assign2(
            &IndexVector::scalar(1),
            &IndexVector::contiguous(0, 3),
            &sparse(1, 3, &[7.0, 0.0, 0.0]),
        )
        .expect("conformant");
        assert_eq!(s.celem(1, 0), 7.0);
        assert_eq!(s.celem(1, 2), 0.0);
        assert!(s.is_compressed());
        assert_eq!(s.nnz(), 4);

        s.assign(&IndexVector::scalar(0), &SparseArray::new(1, 1)).expect("scalar");
        assert_eq!(s.nnz(), 3);
    }

    #[test]
    fn assignment_grows_vectors_and_matrices() {
        let mut v = SparseArray::<f64>::new(1, 2);
        v.assign(&IndexVector::scalar(4), &sparse(1, 1, &[5.0])).expect("grow");
        assert_eq!(v.dims().as_slice(), &[1, 5]);
        assert_eq!(v.celem(0, 4), 5.0);

        let mut m = sample();
        m.assign2(&IndexVector::scalar(4), &IndexVector::scalar(0), &sparse(1, 1, &[8.0]))
            .expect("grow");
        assert_eq!(m.dims().as_slice(), &[5, 3]);
        assert_eq!(m.celem(4, 0), 8.0);

        let err = sample()
            .assign(&IndexVector::scalar(20), &sparse(1, 1, &[1.0]))
            .expect_err("matrix cannot grow linearly");
        assert!(matches!(err, ArrayError::InvalidResize(_)));
    }

    #[test]
    fn empty_target_takes_shape_from_rhs() {
        let mut e = SparseArray::<f64>::new(0, 0);
        e.assign2(&IndexVector::colon(), &IndexVector::scalar(1), &sparse(3, 1, &[1.0, 0.0, 2.0]))
            .expect("inquire");
        assert_eq!(e.dims().as_slice(), &[3, 2]);
        assert_eq!(e.celem(2, 1), 2.0);
    }

    #[test]
    fn mismatched_assignment_leaves_target_alone() {
        let mut s = sample();
        let before = s.clone();
        let err = s
            .assign2(&IndexVector::colon(), &IndexVector::scalar(0), &sparse(1, 2, &[1.0, 2.0]))
            .expect_err("3 rows vs 2 values");
        assert_eq!(err.to_string(), "=: nonconformant arguments (op1 is 3x1, op2 is 1x2)");
        assert_eq!(s, before);
        assert!(s.shares_storage_with(&before));
    }

    #[test]
    fn repeated_subscripts_keep_the_last_value() {
        let mut s = SparseArray::<f64>::new(2, 2);
        s.assign(&IndexVector::from_vec(vec![3, 3]), &sparse(1, 2, &[1.0, 2.0]))
            .expect("conformant");
        assert_eq!(s.celem(1, 1), 2.0);
    }

    #[test]
    fn deleting_columns_and_rows() {
        let mut s = sample();
        s.delete_elements2(&IndexVector::colon(), &IndexVector::contiguous(1, 2))
            .expect("middle column");
        assert_eq!(s.dims().as_slice(), &[3, 2]);
        assert_eq!(s.cidx(), &[0, 2, 4]);

        let mut s = sample();
        s.delete_elements2(&IndexVector::from_vec(vec![0, 2]), &IndexVector::colon())
            .expect("scattered rows");
        assert_eq!(s.dims().as_slice(), &[1, 3]);
        assert_eq!(s.to_dense().as_slice(), &[0.0, 0.0, 3.0]);

        let mut s = sample();
        s.delete_elements2(&IndexVector::contiguous(0, 1), &IndexVector::colon())
            .expect("first row");
        assert_eq!(s.to_dense().as_slice(), &[0.0, 4.0, 0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn deletion_needs_one_full_subscript() {
        let mut s = sample();
        let err = s
            .delete_elements2(&IndexVector::scalar(0), &IndexVector::scalar(0))
            .expect_err("two partial subscripts");
        assert!(matches!(err, ArrayError::InvalidDeletion(_)));
        s.delete_elements2(&IndexVector::scalar(0), &IndexVector::from_vec(Vec::new()))
            .expect("empty selection is a no-op");
        assert_eq!(s, sample());
    }

    #[test]
    fn linear_deletion() {
        let mut v = sparse(4, 1, &[1.0, 0.0, 3.0, 4.0]);
        v.delete_elements(&IndexVector::contiguous(0, 2)).expect("head");
        assert_eq!(v.dims().as_slice(), &[2, 1]);
        assert_eq!(v.data(), &[3.0, 4.0]);

        let mut m = sample();
        m.delete_elements(&IndexVector::from_vec(vec![0, 8])).expect("corners");
        assert_eq!(m.dims().as_slice(), &[1, 7]);
        assert_eq!(m.nnz(), 3);

        m.delete_elements(&IndexVector::colon()).expect("all");
        assert_eq!(m.dims().as_slice(), &[0, 0]);
    }
}
