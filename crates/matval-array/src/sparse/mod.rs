//! Compressed sparse column matrices.
//!
//! Storage is one shared representation holding `cidx` (ncols + 1 column
//! starts), `ridx` and `data` (both `nzmax` long, the first `nnz` entries
//! live). Row indices within a column are strictly increasing. Public
//! mutators never leave an explicit zero behind; only [`SparseArray::elem_mut`]
//! can, and callers finish with [`SparseArray::maybe_compress`].

mod index;
mod ops;

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

use crate::dense::{concat_mismatch, DenseArray};
use crate::dims::DimVector;
use crate::element::Element;
use crate::error::{ArrayError, Result};
use crate::interrupt::InterruptPoller;

#[derive(Clone)]
struct SparseRep<T> {
    data: Vec<T>,
    ridx: Vec<usize>,
    cidx: Vec<usize>,
    nrows: usize,
    ncols: usize,
}

impl<T> SparseRep<T> {
    fn nnz(&self) -> usize {
        self.cidx[self.ncols]
    }
}

impl<T: Clone + Default> SparseRep<T> {
    fn with_capacity(nrows: usize, ncols: usize, nzmax: usize) -> Self {
        Self {
            data: vec![T::default(); nzmax],
            ridx: vec![0; nzmax],
            cidx: vec![0; ncols + 1],
            nrows,
            ncols,
        }
    }

    /// Resize the entry arrays, never below the live entry count.
    fn change_length(&mut self, nz: usize) {
        let nz = nz.max(self.nnz());
        self.data.resize(nz, T::default());
        self.ridx.resize(nz, 0);
    }
}

pub struct SparseArray<T> {
    rep: Arc<SparseRep<T>>,
}

/// Result of mapping a function over a sparse matrix: it stays sparse
/// only when the function sends zero to zero.
#[derive(Debug, Clone, PartialEq)]
pub enum SparseMap<U> {
    Sparse(SparseArray<U>),
    Full(DenseArray<U>),
}

/// Column-by-column assembly of a CSC matrix.
pub(crate) struct CscBuilder<T> {
    data: Vec<T>,
    ridx: Vec<usize>,
    cidx: Vec<usize>,
}

impl<T: Element> CscBuilder<T> {
    pub(crate) fn new(ncols: usize, nnz_hint: usize) -> Self {
        let mut cidx = Vec::with_capacity(ncols + 1);
        cidx.push(0);
        Self {
            data: Vec::with_capacity(nnz_hint),
            ridx: Vec::with_capacity(nnz_hint),
            cidx,
        }
    }

    /// Append to the open column, skipping zeros. Rows must be pushed in
    /// increasing order.
    pub(crate) fn push(&mut self, row: usize, value: T) {
        if !value.is_zero() {
            self.ridx.push(row);
            self.data.push(value);
        }
    }

    pub(crate) fn end_column(&mut self) {
        self.cidx.push(self.data.len());
    }

    /// Close columns until `col` is the open one.
    pub(crate) fn open_column(&mut self, col: usize) {
        while self.cidx.len() <= col {
            self.cidx.push(self.data.len());
        }
    }

    pub(crate) fn finish(mut self, nrows: usize, ncols: usize) -> SparseArray<T> {
        self.open_column(ncols);
        self.cidx.truncate(ncols + 1);
        SparseArray {
            rep: Arc::new(SparseRep {
                data: self.data,
                ridx: self.ridx,
                cidx: self.cidx,
                nrows,
                ncols,
            }),
        }
    }
}

impl<T> Clone for SparseArray<T> {
    fn clone(&self) -> Self {
        Self {
            rep: Arc::clone(&self.rep),
        }
    }
}

impl<T> SparseArray<T> {
    pub fn rows(&self) -> usize {
        self.rep.nrows
    }

    pub fn cols(&self) -> usize {
        self.rep.ncols
    }

    pub fn dims(&self) -> DimVector {
        DimVector::matrix(self.rep.nrows, self.rep.ncols)
    }

    pub fn numel(&self) -> usize {
        self.rep.nrows * self.rep.ncols
    }

    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Stored entries.
    pub fn nnz(&self) -> usize {
        self.rep.nnz()
    }

    /// Allocated entry capacity.
    pub fn nzmax(&self) -> usize {
        self.rep.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.rep.data[..self.nnz()]
    }

    pub fn ridx(&self) -> &[usize] {
        &self.rep.ridx[..self.nnz()]
    }

    pub fn cidx(&self) -> &[usize] {
        &self.rep.cidx
    }

    /// Row indices and values stored in column `c`.
    pub fn column(&self, c: usize) -> (&[usize], &[T]) {
        let (lo, hi) = (self.rep.cidx[c], self.rep.cidx[c + 1]);
        (&self.rep.ridx[lo..hi], &self.rep.data[lo..hi])
    }

    /// `(row, col, value)` for every stored entry in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        (0..self.rep.ncols).flat_map(move |c| {
            let (rows, vals) = self.column(c);
            rows.iter().zip(vals).map(move |(&r, v)| (r, c, v))
        })
    }

    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.rep)
    }

    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rep, &other.rep)
    }

    fn position(&self, r: usize, c: usize) -> std::result::Result<usize, usize> {
        let (lo, hi) = (self.rep.cidx[c], self.rep.cidx[c + 1]);
        self.rep.ridx[lo..hi]
            .binary_search(&r)
            .map(|p| lo + p)
            .map_err(|p| lo + p)
    }

    fn check_bounds(&self, r: usize, c: usize) -> Result<()> {
        if r >= self.rep.nrows {
            return Err(ArrayError::out_of_range(r + 1, self.rep.nrows, Some((1, 2)), &self.dims()));
        }
        if c >= self.rep.ncols {
            return Err(ArrayError::out_of_range(c + 1, self.rep.ncols, Some((2, 2)), &self.dims()));
        }
        Ok(())
    }
}

impl<T: Element> SparseArray<T> {
    /// An all-zero `nrows x ncols` matrix.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self::with_capacity(nrows, ncols, 0)
    }

    pub fn with_capacity(nrows: usize, ncols: usize, nzmax: usize) -> Self {
        Self {
            rep: Arc::new(SparseRep::with_capacity(nrows, ncols, nzmax)),
        }
    }

    /// Every element equal to `value`.
    pub fn filled(nrows: usize, ncols: usize, value: T) -> Self {
        if value.is_zero() {
            return Self::new(nrows, ncols);
        }
        let nz = nrows * ncols;
        Self {
            rep: Arc::new(SparseRep {
                data: vec![value; nz],
                ridx: (0..ncols).flat_map(|_| 0..nrows).collect(),
                cidx: (0..=ncols).map(|c| c * nrows).collect(),
                nrows,
                ncols,
            }),
        }
    }

    /// Build from raw CSC arrays, checking the storage invariants.
    pub fn from_csc(
        nrows: usize,
        ncols: usize,
        data: Vec<T>,
        ridx: Vec<usize>,
        cidx: Vec<usize>,
    ) -> Result<Self> {
        let invalid = |what: &str| Err(ArrayError::InvalidArgument(format!("sparse: {what}")));
        if cidx.len() != ncols + 1 || cidx[0] != 0 {
            return invalid("column pointer array has the wrong length or start");
        }
        if cidx.windows(2).any(|w| w[0] > w[1]) {
            return invalid("column pointers must be non-decreasing");
        }
        let nnz = cidx[ncols];
        if data.len() < nnz || ridx.len() != data.len() {
            return invalid("entry arrays are shorter than the column pointers require");
        }
        for c in 0..ncols {
            let rows = &ridx[cidx[c]..cidx[c + 1]];
            if rows.windows(2).any(|w| w[0] >= w[1]) || rows.iter().any(|&r| r >= nrows) {
                return invalid("row indices must be increasing and in range within a column");
            }
        }
        Ok(Self {
            rep: Arc::new(SparseRep {
                data,
                ridx,
                cidx,
                nrows,
                ncols,
            }),
        })
    }

    /// Build from coordinate triplets. `values` holds one value per
    /// coordinate or a single value shared by all of them. Repeated
    /// coordinates are summed when `sum_duplicates` is set, otherwise the
    /// last one wins.
    pub fn from_triplets(
        values: &[T],
        rows: &[usize],
        cols: &[usize],
        nrows: usize,
        ncols: usize,
        sum_duplicates: bool,
        nzmax: Option<usize>,
    ) -> Result<Self> {
        let n = rows.len();
        if cols.len() != n || (values.len() != n && values.len() != 1) {
            return Err(ArrayError::DimensionMismatch(format!(
                "sparse: dimension mismatch ({} row indices, {} column indices, {} values)",
                n,
                cols.len(),
                values.len()
            )));
        }
        let dims = DimVector::matrix(nrows, ncols);
        for (&r, &c) in rows.iter().zip(cols) {
            if r >= nrows {
                return Err(ArrayError::out_of_range(r + 1, nrows, Some((1, 2)), &dims));
            }
            if c >= ncols {
                return Err(ArrayError::out_of_range(c + 1, ncols, Some((2, 2)), &dims));
            }
        }
        let value = |k: usize| if values.len() == 1 { &values[0] } else { &values[k] };
        let mut poller = InterruptPoller::new();

        // Bucket by column, keeping input order within a column.
        let mut starts = vec![0usize; ncols + 1];
        for &c in cols {
            starts[c + 1] += 1;
        }
        for c in 0..ncols {
            starts[c + 1] += starts[c];
        }
        let mut next = starts.clone();
        let mut order = vec![0usize; n];
        for (k, &c) in cols.iter().enumerate() {
            poller.tick()?;
            order[next[c]] = k;
            next[c] += 1;
        }

        let mut builder = CscBuilder::new(ncols, n);
        for c in 0..ncols {
            let bucket = &mut order[starts[c]..starts[c + 1]];
            poller.advance(bucket.len())?;
            bucket.sort_by_key(|&k| rows[k]);
            let mut pos = 0;
            while pos < bucket.len() {
                let r = rows[bucket[pos]];
                let mut acc = value(bucket[pos]).clone();
                pos += 1;
                while pos < bucket.len() && rows[bucket[pos]] == r {
                    if sum_duplicates {
                        acc.accumulate(value(bucket[pos]));
                    } else {
                        acc = value(bucket[pos]).clone();
                    }
                    pos += 1;
                }
                builder.push(r, acc);
            }
            builder.end_column();
        }
        let mut out = builder.finish(nrows, ncols);
        if let Some(nz) = nzmax {
            out.change_capacity(nz);
        }
        debug!(
            "sparse {}x{} built from {} triplets ({} stored)",
            nrows,
            ncols,
            n,
            out.nnz()
        );
        Ok(out)
    }

    pub fn from_dense(dense: &DenseArray<T>) -> Result<Self> {
        if dense.ndims() > 2 {
            return Err(ArrayError::InvalidArgument(
                "sparse: N-dimensional arrays cannot be stored as sparse matrices".to_string(),
            ));
        }
        let (nr, nc) = (dense.rows(), dense.cols());
        let src = dense.as_slice();
        let mut builder = CscBuilder::new(nc, dense.nnz());
        let mut poller = InterruptPoller::new();
        for c in 0..nc {
            poller.advance(nr)?;
            for (r, v) in src[c * nr..(c + 1) * nr].iter().enumerate() {
                builder.push(r, v.clone());
            }
            builder.end_column();
        }
        Ok(builder.finish(nr, nc))
    }

    pub fn to_dense(&self) -> DenseArray<T> {
        let (nr, nc) = (self.rows(), self.cols());
        let mut out = vec![T::default(); nr * nc];
        for (r, c, v) in self.iter() {
            out[r + c * nr] = v.clone();
        }
        DenseArray::row(out)
            .reshape(DimVector::matrix(nr, nc))
            .unwrap_or_else(|_| DenseArray::new(DimVector::matrix(nr, nc)))
    }

    /// Value at `(r, c)`; zero when nothing is stored there.
    pub fn celem(&self, r: usize, c: usize) -> T {
        match self.position(r, c) {
            Ok(p) => self.rep.data[p].clone(),
            Err(_) => T::default(),
        }
    }

    pub fn checkelem(&self, r: usize, c: usize) -> Result<T> {
        self.check_bounds(r, c)?;
        Ok(self.celem(r, c))
    }

    /// Mutable access to `(r, c)`, inserting a stored zero when the entry
    /// is absent. Fails when no spare capacity is left.
    pub fn elem_mut(&mut self, r: usize, c: usize) -> Result<&mut T> {
        self.check_bounds(r, c)?;
        let found = self.position(r, c);
        let nnz = self.nnz();
        let nzmax = self.nzmax();
        match found {
            Ok(p) => Ok(&mut Arc::make_mut(&mut self.rep).data[p]),
            Err(_) if nnz == nzmax => Err(ArrayError::CapacityExhausted { nzmax }),
            Err(at) => {
                let rep = Arc::make_mut(&mut self.rep);
                rep.ridx[at..=nnz].rotate_right(1);
                rep.data[at..=nnz].rotate_right(1);
                rep.ridx[at] = r;
                rep.data[at] = T::default();
                for start in &mut rep.cidx[c + 1..] {
                    *start += 1;
                }
                Ok(&mut rep.data[at])
            }
        }
    }

    /// Set the entry capacity, never below the stored count.
    pub fn change_capacity(&mut self, nzmax: usize) {
        if nzmax.max(self.nnz()) != self.nzmax() {
            trace!("sparse capacity {} -> {}", self.nzmax(), nzmax.max(self.nnz()));
            Arc::make_mut(&mut self.rep).change_length(nzmax);
        }
    }

    /// Shrink capacity to the stored count, dropping stored zeros first when
    /// `remove_zeros` is set.
    pub fn maybe_compress(&mut self, remove_zeros: bool) {
        let has_zeros = remove_zeros && self.data().iter().any(Element::is_zero);
        if !has_zeros && self.nnz() == self.nzmax() {
            return;
        }
        let rep = Arc::make_mut(&mut self.rep);
        if has_zeros {
            let mut k = 0;
            let mut i = 0;
            for c in 0..rep.ncols {
                let end = rep.cidx[c + 1];
                while i < end {
                    if !rep.data[i].is_zero() {
                        rep.data.swap(k, i);
                        rep.ridx[k] = rep.ridx[i];
                        k += 1;
                    }
                    i += 1;
                }
                rep.cidx[c + 1] = k;
            }
        }
        let nnz = rep.nnz();
        rep.data.truncate(nnz);
        rep.ridx.truncate(nnz);
    }

    fn resize1_dims(&self, n: usize) -> Result<(usize, usize)> {
        let (nr, nc) = (self.rows(), self.cols());
        if nr == 0 {
            Ok((1, nc.max(n)))
        } else if nc == 0 {
            Ok((nr, n.div_ceil(nr)))
        } else if nr == 1 {
            Ok((1, n))
        } else if nc == 1 {
            Ok((n, 1))
        } else {
            Err(ArrayError::invalid_resize())
        }
    }

    /// Grow or shrink a vector to `n` elements.
    pub fn resize1(&mut self, n: usize) -> Result<()> {
        let (r, c) = self.resize1_dims(n)?;
        self.resize(r, c);
        Ok(())
    }

    /// Change both dimensions. Entries outside the new bounds are dropped.
    pub fn resize(&mut self, nrows: usize, ncols: usize) {
        if nrows == self.rows() && ncols == self.cols() {
            return;
        }
        let rep = Arc::make_mut(&mut self.rep);
        if nrows < rep.nrows {
            let mut k = 0;
            let mut i = 0;
            for c in 0..rep.ncols {
                let end = rep.cidx[c + 1];
                while i < end {
                    if rep.ridx[i] < nrows {
                        rep.data.swap(k, i);
                        rep.ridx[k] = rep.ridx[i];
                        k += 1;
                    }
                    i += 1;
                }
                rep.cidx[c + 1] = k;
            }
        }
        rep.nrows = nrows;
        if ncols != rep.ncols {
            let last = rep.cidx[ncols.min(rep.ncols)];
            rep.cidx.resize(ncols + 1, last);
            rep.ncols = ncols;
        }
        let nnz = rep.nnz();
        rep.change_length(nnz);
    }

    /// Counting-sort transpose.
    pub fn transpose(&self) -> Self {
        let (nr, nc, nz) = (self.rows(), self.cols(), self.nnz());
        let mut cidx = vec![0usize; nr + 1];
        for &r in self.ridx() {
            cidx[r + 1] += 1;
        }
        for r in 0..nr {
            cidx[r + 1] += cidx[r];
        }
        let mut next = cidx.clone();
        let mut data = vec![T::default(); nz];
        let mut ridx = vec![0usize; nz];
        for (r, c, v) in self.iter() {
            let q = next[r];
            ridx[q] = c;
            data[q] = v.clone();
            next[r] += 1;
        }
        Self {
            rep: Arc::new(SparseRep {
                data,
                ridx,
                cidx,
                nrows: nc,
                ncols: nr,
            }),
        }
    }

    /// Same elements in a new two-dimensional shape.
    pub fn reshape(&self, dims: impl Into<DimVector>) -> Result<Self> {
        let dims = dims.into();
        if dims.ndims() > 2 {
            return Err(ArrayError::InvalidArgument(
                "reshape: sparse reshape to N-D array not valid".to_string(),
            ));
        }
        let (nr, nc) = (self.rows() as u128, self.cols() as u128);
        let (nr2, nc2) = (dims.rows(), dims.cols());
        if nr * nc != nr2 as u128 * nc2 as u128 {
            return Err(ArrayError::DimensionMismatch(format!(
                "reshape: can't reshape {} array to {dims} array",
                self.dims()
            )));
        }
        if (nr2, nc2) == (self.rows(), self.cols()) {
            return Ok(self.clone());
        }
        let mut builder = CscBuilder::new(nc2, self.nnz());
        for (r, c, v) in self.iter() {
            let linear = r as u128 + c as u128 * nr;
            let col = (linear / nr2 as u128) as usize;
            let row = (linear % nr2 as u128) as usize;
            builder.open_column(col);
            builder.push(row, v.clone());
        }
        Ok(builder.finish(nr2, nc2))
    }

    /// `perm` is zero-based and must be `[0, 1]` or `[1, 0]`.
    pub fn permute(&self, perm: &[usize], _inverse: bool) -> Result<Self> {
        match perm {
            [0, 1] => Ok(self.clone()),
            [1, 0] => Ok(self.transpose()),
            _ => Err(ArrayError::InvalidArgument(
                "permute: invalid permutation for a sparse matrix".to_string(),
            )),
        }
    }

    pub fn squeeze(&self) -> Self {
        self.clone()
    }

    /// Concatenate along rows (`dim == 0`) or columns (`dim == 1`).
    pub fn cat(dim: usize, arrays: &[&SparseArray<T>]) -> Result<Self> {
        if dim > 1 {
            return Err(ArrayError::InvalidArgument(format!(
                "cat: sparse matrices cannot be concatenated along dimension {}",
                dim + 1
            )));
        }
        let Some(first) = arrays.first() else {
            return Ok(Self::new(0, 0));
        };
        let mut dims = first.dims();
        for a in &arrays[1..] {
            if !dims.concat(&a.dims(), dim) {
                return Err(concat_mismatch(dim, &dims, &a.dims()));
            }
        }
        let parts: Vec<&SparseArray<T>> = arrays
            .iter()
            .copied()
            .filter(|a| !(a.dims().zero_by_zero() && !dims.zero_by_zero()))
            .collect();
        let (nr, nc) = (dims.rows(), dims.cols());
        let total: usize = parts.iter().map(|a| a.nnz()).sum();
        let mut builder = CscBuilder::new(nc, total);
        if dim == 0 {
            for c in 0..nc {
                let mut offset = 0;
                for a in &parts {
                    let (rows, vals) = a.column(c);
                    for (&r, v) in rows.iter().zip(vals) {
                        builder.push(r + offset, v.clone());
                    }
                    offset += a.rows();
                }
                builder.end_column();
            }
        } else {
            for a in &parts {
                for c in 0..a.cols() {
                    let (rows, vals) = a.column(c);
                    for (&r, v) in rows.iter().zip(vals) {
                        builder.push(r, v.clone());
                    }
                    builder.end_column();
                }
            }
        }
        Ok(builder.finish(nr, nc))
    }

    /// Apply `f` to every element. The result is sparse when `f(0) == 0`
    /// and full otherwise.
    pub fn map<U: Element, F>(&self, mut f: F) -> Result<SparseMap<U>>
    where
        F: FnMut(&T) -> U,
    {
        let zero = f(&T::default());
        let mut poller = InterruptPoller::new();
        if !zero.is_zero() {
            let nr = self.rows();
            let mut out = vec![zero; self.numel()];
            for (r, c, v) in self.iter() {
                poller.tick()?;
                out[r + c * nr] = f(v);
            }
            return Ok(SparseMap::Full(DenseArray::from_vec(out, self.dims())?));
        }
        let mut builder = CscBuilder::new(self.cols(), self.nnz());
        for c in 0..self.cols() {
            let (rows, vals) = self.column(c);
            for (&r, v) in rows.iter().zip(vals) {
                poller.tick()?;
                builder.push(r, f(v));
            }
            builder.end_column();
        }
        Ok(SparseMap::Sparse(builder.finish(self.rows(), self.cols())))
    }

    /// Apply `f` to stored entries only; zeros stay zero.
    pub fn map_nonzeros<U: Element, F>(&self, mut f: F) -> Result<SparseArray<U>>
    where
        F: FnMut(&T) -> U,
    {
        let mut poller = InterruptPoller::new();
        let mut builder = CscBuilder::new(self.cols(), self.nnz());
        for c in 0..self.cols() {
            let (rows, vals) = self.column(c);
            for (&r, v) in rows.iter().zip(vals) {
                poller.tick()?;
                builder.push(r, f(v));
            }
            builder.end_column();
        }
        Ok(builder.finish(self.rows(), self.cols()))
    }

    /// True when every stored value is nonzero.
    pub fn is_compressed(&self) -> bool {
        !self.data().iter().any(Element::is_zero)
    }
}

impl<T: PartialEq> PartialEq for SparseArray<T> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.rep, &other.rep);
        let (na, nb) = (a.nnz(), b.nnz());
        a.nrows == b.nrows
            && a.ncols == b.ncols
            && a.cidx == b.cidx
            && a.ridx[..na] == b.ridx[..nb]
            && a.data[..na] == b.data[..nb]
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nnz = self.nnz();
        f.debug_struct("SparseArray")
            .field("dims", &self.dims())
            .field("cidx", &self.rep.cidx)
            .field("ridx", &&self.rep.ridx[..nnz])
            .field("data", &&self.rep.data[..nnz])
            .finish()
    }
}
