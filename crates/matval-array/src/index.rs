//! Index vectors.
//!
//! Subscripts are stored zero-based. The specialised variants let the
//! containers recognise `:` and contiguous ranges without materialising an
//! explicit list of positions.

use std::sync::Arc;

use crate::dims::DimVector;
use crate::error::{ArrayError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum IndexVector {
    /// Every element along the dimension (`:`).
    Colon,
    Scalar(usize),
    /// `len` positions starting at `start`, `step` apart.
    Range {
        start: usize,
        len: usize,
        step: isize,
    },
    /// Explicit positions; `orig` is the shape the subscript had and `ext`
    /// is one past the largest position.
    Vector {
        data: Arc<[usize]>,
        orig: DimVector,
        ext: usize,
    },
}

fn bad_subscript(value: f64) -> ArrayError {
    ArrayError::BadIndex(format!(
        "index ({value}): subscripts must be either integers 1 to (2^63)-1 or logicals"
    ))
}

impl IndexVector {
    pub fn colon() -> Self {
        IndexVector::Colon
    }

    pub fn scalar(i: usize) -> Self {
        IndexVector::Scalar(i)
    }

    /// Positions `[lo, hi)`.
    pub fn contiguous(lo: usize, hi: usize) -> Self {
        let len = hi.saturating_sub(lo);
        if len == 1 {
            return IndexVector::Scalar(lo);
        }
        IndexVector::Range {
            start: lo,
            len,
            step: 1,
        }
    }

    pub fn range(start: usize, len: usize, step: isize) -> Result<Self> {
        if len == 1 {
            return Ok(IndexVector::Scalar(start));
        }
        if len > 1 && step < 0 {
            let span = (len - 1).saturating_mul(step.unsigned_abs());
            if span > start {
                return Err(ArrayError::BadIndex(format!(
                    "index ({}): out of bound; value {} out of bound {}",
                    start as isize + 1 - span as isize,
                    start as isize + 1 - span as isize,
                    start + 1
                )));
            }
        }
        Ok(IndexVector::Range { start, len, step })
    }

    /// Explicit positions shaped as a row vector.
    pub fn from_vec(data: Vec<usize>) -> Self {
        let len = data.len();
        Self::vector_with_orig(data, DimVector::matrix(1, len))
    }

    /// Explicit positions with the subscript's original shape.
    pub fn with_dims(data: Vec<usize>, dims: DimVector) -> Result<Self> {
        if dims.numel() != data.len() {
            return Err(ArrayError::DimensionMismatch(format!(
                "index vector has {} elements but shape {dims}",
                data.len()
            )));
        }
        Ok(Self::vector_with_orig(data, dims))
    }

    fn vector_with_orig(data: Vec<usize>, orig: DimVector) -> Self {
        if data.len() == 1 {
            return IndexVector::Scalar(data[0]);
        }
        let ext = data.iter().max().map(|&m| m + 1).unwrap_or(0);
        IndexVector::Vector {
            data: data.into(),
            orig,
            ext,
        }
    }

    /// Positions of the true entries of a logical mask.
    pub fn from_mask(mask: &[bool], dims: &DimVector) -> Self {
        let data: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(k, &m)| m.then_some(k))
            .collect();
        let orig = dims.make_nd_vector(data.len());
        Self::vector_with_orig(data, orig)
    }

    /// Convert 1-based numeric subscripts.
    pub fn from_one_based(values: &[f64], dims: DimVector) -> Result<Self> {
        let mut data = Vec::with_capacity(values.len());
        for &v in values {
            if !(v.is_finite() && v >= 1.0 && v.fract() == 0.0) {
                return Err(bad_subscript(v));
            }
            data.push(v as usize - 1);
        }
        Self::with_dims(data, dims)
    }

    /// Convert a 1-based arithmetic progression of `numel` subscripts.
    pub fn from_one_based_range(base: f64, increment: f64, numel: usize) -> Result<Self> {
        if numel == 0 {
            return Ok(IndexVector::Range {
                start: 0,
                len: 0,
                step: 1,
            });
        }
        if !(base.is_finite() && base >= 1.0 && base.fract() == 0.0) {
            return Err(bad_subscript(base));
        }
        if numel > 1 && !(increment.is_finite() && increment.fract() == 0.0) {
            return Err(bad_subscript(base + increment));
        }
        let last = base + (numel - 1) as f64 * increment;
        if last < 1.0 {
            return Err(bad_subscript(last));
        }
        Self::range(base as usize - 1, numel, increment as isize)
    }

    pub fn is_colon(&self) -> bool {
        matches!(self, IndexVector::Colon)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, IndexVector::Scalar(_))
    }

    /// Number of positions selected from a dimension of extent `n`.
    pub fn length(&self, n: usize) -> usize {
        match self {
            IndexVector::Colon => n,
            IndexVector::Scalar(_) => 1,
            IndexVector::Range { len, .. } => *len,
            IndexVector::Vector { data, .. } => data.len(),
        }
    }

    /// Extent a dimension of size `n` must have to hold every position.
    pub fn extent(&self, n: usize) -> usize {
        match self {
            IndexVector::Colon => n,
            IndexVector::Scalar(i) => n.max(i + 1),
            IndexVector::Range { start, len, step } => {
                if *len == 0 {
                    n
                } else if *step >= 0 {
                    n.max(start + (len - 1) * step.unsigned_abs() + 1)
                } else {
                    n.max(start + 1)
                }
            }
            IndexVector::Vector { ext, .. } => n.max(*ext),
        }
    }

    /// The `k`-th selected position.
    #[inline]
    pub fn get(&self, k: usize) -> usize {
        match self {
            IndexVector::Colon => k,
            IndexVector::Scalar(i) => *i,
            IndexVector::Range { start, step, .. } => {
                (*start as isize + k as isize * *step) as usize
            }
            IndexVector::Vector { data, .. } => data[k],
        }
    }

    pub fn is_colon_equiv(&self, n: usize) -> bool {
        match self {
            IndexVector::Colon => true,
            IndexVector::Scalar(i) => n == 1 && *i == 0,
            IndexVector::Range { start, len, step } => {
                *start == 0 && *len == n && (*step == 1 || n <= 1)
            }
            IndexVector::Vector { data, .. } => {
                data.len() == n && data.iter().enumerate().all(|(k, &v)| k == v)
            }
        }
    }

    /// `Some((lo, hi))` when the selection is exactly `lo..hi` in order.
    pub fn is_cont_range(&self, n: usize) -> Option<(usize, usize)> {
        match self {
            IndexVector::Colon => Some((0, n)),
            IndexVector::Scalar(i) => Some((*i, i + 1)),
            IndexVector::Range { start, len, step } => {
                if *step == 1 || *len <= 1 {
                    Some((*start, start + len))
                } else {
                    None
                }
            }
            IndexVector::Vector { data, .. } => {
                let lo = *data.first()?;
                data.iter()
                    .enumerate()
                    .all(|(k, &v)| v == lo + k)
                    .then_some((lo, lo + data.len()))
            }
        }
    }

    pub fn is_permutation(&self, n: usize) -> bool {
        if self.length(n) != n {
            return false;
        }
        match self {
            IndexVector::Colon => true,
            IndexVector::Scalar(i) => *i == 0,
            IndexVector::Range { start, len, step } => {
                *len == 0 || (*step == 1 && *start == 0) || (*step == -1 && start + 1 == *len)
            }
            IndexVector::Vector { data, .. } => {
                let mut seen = vec![false; n];
                for &v in data.iter() {
                    if v >= n || seen[v] {
                        return false;
                    }
                    seen[v] = true;
                }
                true
            }
        }
    }

    /// True for `n:-1:1` over a dimension of extent `n`.
    pub fn is_reversal(&self, n: usize) -> bool {
        matches!(self, IndexVector::Range { start, len, step: -1 } if *len == n && start + 1 == n)
    }

    /// Shape of the subscript as written.
    pub fn orig_dims(&self, n: usize) -> DimVector {
        match self {
            IndexVector::Colon => DimVector::matrix(n, 1),
            IndexVector::Scalar(_) => DimVector::scalar(),
            IndexVector::Range { len, .. } => DimVector::matrix(1, *len),
            IndexVector::Vector { orig, .. } => orig.clone(),
        }
    }

    pub fn iter(&self, n: usize) -> IndexIter<'_> {
        IndexIter {
            idx: self,
            pos: 0,
            len: self.length(n),
        }
    }

    pub fn to_vec(&self, n: usize) -> Vec<usize> {
        self.iter(n).collect()
    }

    /// Positions of `0..n` that are not selected, as a row.
    pub fn complement(&self, n: usize) -> IndexVector {
        let mut keep = vec![true; n];
        for k in self.iter(n) {
            if k < n {
                keep[k] = false;
            }
        }
        let rest: Vec<usize> = (0..n).filter(|&k| keep[k]).collect();
        let len = rest.len();
        Self::vector_with_orig(rest, DimVector::matrix(1, len))
    }

    /// Selected positions in increasing order without repeats.
    pub fn sorted_unique(&self, n: usize) -> Vec<usize> {
        let mut out = self.to_vec(n);
        out.sort_unstable();
        out.dedup();
        out
    }
}

pub struct IndexIter<'a> {
    idx: &'a IndexVector,
    pos: usize,
    len: usize,
}

impl<'a> Iterator for IndexIter<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.pos >= self.len {
            return None;
        }
        let value = self.idx.get(self.pos);
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.pos;
        (rest, Some(rest))
    }
}

impl<'a> ExactSizeIterator for IndexIter<'a> {}
