//! Dimension vectors.
//!
//! A `DimVector` always has at least two entries. Trailing singleton
//! dimensions beyond the second are chopped when the vector is built or
//! modified, so `[2, 3, 1, 1]` and `[2, 3]` are the same shape.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimVector {
    dims: SmallVec<[usize; 4]>,
}

impl DimVector {
    pub fn new<I: IntoIterator<Item = usize>>(dims: I) -> Self {
        let mut dims: SmallVec<[usize; 4]> = dims.into_iter().collect();
        match dims.len() {
            0 => dims.extend([0, 0]),
            1 => dims.push(1),
            _ => {}
        }
        let mut dv = Self { dims };
        dv.chop_trailing_singletons();
        dv
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: SmallVec::from_slice(&[rows, cols]),
        }
    }

    pub fn scalar() -> Self {
        Self::matrix(1, 1)
    }

    /// The 0x0 shape.
    pub fn empty() -> Self {
        Self::matrix(0, 0)
    }

    fn chop_trailing_singletons(&mut self) {
        while self.dims.len() > 2 && self.dims[self.dims.len() - 1] == 1 {
            self.dims.pop();
        }
    }

    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.dims
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.dims.to_vec()
    }

    /// Extent of dimension `i`; dimensions past `ndims()` are 1.
    pub fn get(&self, i: usize) -> usize {
        self.dims.get(i).copied().unwrap_or(1)
    }

    pub fn with_dim(&self, i: usize, value: usize) -> Self {
        let mut dims = self.dims.clone();
        if dims.len() <= i {
            dims.resize(i + 1, 1);
        }
        dims[i] = value;
        let mut dv = Self { dims };
        dv.chop_trailing_singletons();
        dv
    }

    pub fn rows(&self) -> usize {
        self.dims[0]
    }

    pub fn cols(&self) -> usize {
        self.dims[1]
    }

    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Element count, or `None` when the product overflows `usize`.
    pub fn safe_numel(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    pub fn is_scalar(&self) -> bool {
        self.ndims() == 2 && self.dims[0] == 1 && self.dims[1] == 1
    }

    pub fn is_vector(&self) -> bool {
        self.ndims() == 2 && (self.dims[0] == 1 || self.dims[1] == 1)
    }

    pub fn is_row(&self) -> bool {
        self.ndims() == 2 && self.dims[0] == 1
    }

    pub fn is_column(&self) -> bool {
        self.ndims() == 2 && self.dims[1] == 1
    }

    /// True when at most one dimension differs from 1.
    pub fn is_nd_vector(&self) -> bool {
        self.dims.iter().filter(|&&d| d != 1).count() == 1
    }

    pub fn any_zero(&self) -> bool {
        self.dims.contains(&0)
    }

    pub fn all_zero(&self) -> bool {
        self.dims.iter().all(|&d| d == 0)
    }

    pub fn zero_by_zero(&self) -> bool {
        self.ndims() == 2 && self.dims[0] == 0 && self.dims[1] == 0
    }

    pub fn first_non_singleton(&self) -> usize {
        self.dims.iter().position(|&d| d != 1).unwrap_or(0)
    }

    /// Reinterpret as exactly `n` dimensions. Extra leading dimensions are
    /// padded with 1; surplus trailing dimensions fold into the last one.
    pub fn redim(&self, n: usize) -> Vec<usize> {
        let n = n.max(1);
        let nd = self.ndims();
        if nd <= n {
            let mut out = self.dims.to_vec();
            out.resize(n, 1);
            return out;
        }
        let mut out: Vec<usize> = self.dims[..n - 1].to_vec();
        out.push(self.dims[n - 1..].iter().product());
        out
    }

    /// Column-major strides.
    pub fn strides(&self) -> Vec<usize> {
        strides_of(&self.dims)
    }

    /// Remove every singleton dimension, keeping at least two entries.
    pub fn chop_all_singletons(&self) -> Self {
        let mut dims: SmallVec<[usize; 4]> =
            self.dims.iter().copied().filter(|&d| d != 1).collect();
        match dims.len() {
            0 => return Self::scalar(),
            1 => dims.push(1),
            _ => {}
        }
        Self { dims }
    }

    /// Drop singleton dimensions of an N-d shape. Two-dimensional shapes
    /// are returned unchanged; a lone surviving dimension becomes a column.
    pub fn squeeze(&self) -> Self {
        if self.ndims() <= 2 {
            return self.clone();
        }
        self.chop_all_singletons()
    }

    /// Shape of an `n`-element vector oriented along this shape's only
    /// non-singleton dimension, or a column when there is no such
    /// dimension.
    pub fn make_nd_vector(&self, n: usize) -> Self {
        if self.is_nd_vector() {
            let k = self.first_non_singleton();
            return self.with_dim(k, n);
        }
        Self::matrix(n, 1)
    }

    /// Append `other` along `dim`. A 0x0 operand on either side is neutral.
    /// Returns false when the remaining dimensions disagree.
    pub fn concat(&mut self, other: &DimVector, dim: usize) -> bool {
        let orig_nd = self.ndims();
        let ndb = other.ndims();
        let new_nd = if dim < ndb { ndb } else { dim + 1 }.max(orig_nd);
        let mut dims = self.dims.clone();
        dims.resize(new_nd, 1);

        let mut matches = true;
        for i in 0..new_nd {
            if i != dim && dims[i] != other.get(i) {
                matches = false;
                break;
            }
        }
        if matches {
            dims[dim] += other.get(dim);
        } else if other.zero_by_zero() {
            matches = true;
        } else if self.zero_by_zero() {
            matches = true;
            dims = other.dims.clone();
        }
        if matches {
            self.dims = dims;
            self.chop_trailing_singletons();
        }
        matches
    }
}

pub(crate) fn strides_of(dims: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(dims.len());
    let mut stride = 1usize;
    for &d in dims {
        strides.push(stride);
        stride = stride.saturating_mul(d);
    }
    strides
}

impl Default for DimVector {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for DimVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.dims.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join("x"))
    }
}

impl fmt::Debug for DimVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DimVector({self})")
    }
}

impl From<Vec<usize>> for DimVector {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for DimVector {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.iter().copied())
    }
}

impl<const N: usize> From<[usize; N]> for DimVector {
    fn from(dims: [usize; N]) -> Self {
        Self::new(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_singletons_are_chopped() {
        let dv = DimVector::new([2, 3, 1, 1]);
        assert_eq!(dv.as_slice(), &[2, 3]);
        let dv = DimVector::new([2, 1, 4, 1]);
        assert_eq!(dv.as_slice(), &[2, 1, 4]);
        assert_eq!(DimVector::new([5]).as_slice(), &[5, 1]);
        assert_eq!(DimVector::new(Vec::new()).as_slice(), &[0, 0]);
    }

    #[test]
    fn redim_folds_trailing_dimensions() {
        let dv = DimVector::new([2, 3, 4]);
        assert_eq!(dv.redim(2), vec![2, 12]);
        assert_eq!(dv.redim(4), vec![2, 3, 4, 1]);
        assert_eq!(dv.redim(1), vec![24]);
    }

    #[test]
    fn squeeze_only_touches_nd_shapes() {
        assert_eq!(DimVector::new([1, 1, 3]).squeeze().as_slice(), &[3, 1]);
        assert_eq!(DimVector::matrix(1, 3).squeeze().as_slice(), &[1, 3]);
        assert_eq!(DimVector::new([2, 1, 3]).squeeze().as_slice(), &[2, 3]);
        assert_eq!(DimVector::new([1, 1, 1, 2]).squeeze().as_slice(), &[2, 1]);
    }

    #[test]
    fn concat_treats_zero_by_zero_as_neutral() {
        let mut dv = DimVector::matrix(2, 3);
        assert!(dv.concat(&DimVector::matrix(2, 4), 1));
        assert_eq!(dv.as_slice(), &[2, 7]);
        assert!(dv.concat(&DimVector::empty(), 0));
        assert_eq!(dv.as_slice(), &[2, 7]);
        assert!(!dv.concat(&DimVector::matrix(3, 1), 1));

        let mut dv = DimVector::empty();
        assert!(dv.concat(&DimVector::matrix(1, 3), 0));
        assert_eq!(dv.as_slice(), &[1, 3]);

        let mut dv = DimVector::matrix(2, 2);
        assert!(dv.concat(&DimVector::matrix(2, 2), 2));
        assert_eq!(dv.as_slice(), &[2, 2, 2]);
    }

    #[test]
    fn display_joins_with_x() {
        assert_eq!(DimVector::new([2, 3, 4]).to_string(), "2x3x4");
    }
}
