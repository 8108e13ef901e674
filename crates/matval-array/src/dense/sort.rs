use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::DenseArray;
use crate::element::Element;
use crate::error::Result;
use crate::interrupt::InterruptPoller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    Ascending,
    Descending,
}

impl SortMode {
    fn compare<T: Element>(self, a: &T, b: &T) -> Ordering {
        match self {
            SortMode::Ascending => a.sort_cmp(b),
            SortMode::Descending => b.sort_cmp(a),
        }
    }
}

impl<T: Element> DenseArray<T> {
    /// Sort every slice along `dim` (zero-based). The sort is stable; NaN
    /// values go last in ascending order and first in descending order.
    pub fn sort(&self, dim: usize, mode: SortMode) -> Result<Self> {
        Ok(self.sort_with_indices(dim, mode)?.0)
    }

    /// Like [`DenseArray::sort`], also returning for every output element
    /// its zero-based position within the original slice.
    pub fn sort_with_indices(
        &self,
        dim: usize,
        mode: SortMode,
    ) -> Result<(Self, DenseArray<usize>)> {
        let dims = self.dims.clone();
        let total = self.numel();
        let ns = dims.get(dim);
        if ns <= 1 || total == 0 {
            let idx = DenseArray::filled(dims, 0usize);
            return Ok((self.clone(), idx));
        }
        let stride: usize = dims.as_slice()[..dim.min(dims.ndims())].iter().product();
        let src = self.as_slice();
        let mut values = src.to_vec();
        let mut indices = vec![0usize; total];
        let mut poller = InterruptPoller::new();
        let mut slice: Vec<(usize, &T)> = Vec::with_capacity(ns);

        for outer in 0..total / (ns * stride) {
            for inner in 0..stride {
                poller.advance(ns)?;
                let base = outer * ns * stride + inner;
                slice.clear();
                slice.extend((0..ns).map(|k| (k, &src[base + k * stride])));
                slice.sort_by(|a, b| mode.compare(a.1, b.1));
                for (k, (orig, value)) in slice.iter().enumerate() {
                    values[base + k * stride] = (*value).clone();
                    indices[base + k * stride] = *orig;
                }
            }
        }
        Ok((
            Self::from_vec(values, dims.clone())?,
            DenseArray::from_vec(indices, dims)?,
        ))
    }

    pub fn is_sorted(&self, mode: SortMode) -> bool {
        self.as_slice()
            .windows(2)
            .all(|w| mode.compare(&w[0], &w[1]) != Ordering::Greater)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_columns_and_reports_origin() {
        let a = DenseArray::from_vec(vec![3.0, 1.0, 2.0, 0.0, 5.0, 4.0], [3, 2]).expect("shape");
        let (s, i) = a.sort_with_indices(0, SortMode::Ascending).expect("sort");
        assert_eq!(s.as_slice(), &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0]);
        assert_eq!(i.as_slice(), &[1, 2, 0, 0, 2, 1]);
    }

    #[test]
    fn sorts_rows_descending() {
        let a = DenseArray::from_vec(vec![1.0, 6.0, 3.0, 4.0, 2.0, 5.0], [2, 3]).expect("shape");
        let s = a.sort(1, SortMode::Descending).expect("sort");
        assert_eq!(s.as_slice(), &[3.0, 6.0, 2.0, 5.0, 1.0, 4.0]);
    }

    #[test]
    fn nan_placement_depends_on_direction() {
        let a = DenseArray::row(vec![2.0, f64::NAN, 1.0]);
        let up = a.sort(1, SortMode::Ascending).expect("sort");
        assert_eq!(&up.as_slice()[..2], &[1.0, 2.0]);
        assert!(up.as_slice()[2].is_nan());
        let down = a.sort(1, SortMode::Descending).expect("sort");
        assert!(down.as_slice()[0].is_nan());
        assert_eq!(&down.as_slice()[1..], &[2.0, 1.0]);
    }

    #[test]
    fn equal_keys_keep_their_order() {
        let a = DenseArray::row(vec![1i32, 0, 1, 0]);
        let (_, i) = a.sort_with_indices(1, SortMode::Ascending).expect("sort");
        assert_eq!(i.as_slice(), &[1, 3, 0, 2]);
        let (_, i) = a.sort_with_indices(1, SortMode::Descending).expect("sort");
        assert_eq!(i.as_slice(), &[0, 2, 1, 3]);
    }

    #[test]
    fn sorting_a_singleton_dimension_is_identity() {
        let a = DenseArray::row(vec![3.0, 1.0]);
        let (s, i) = a.sort_with_indices(0, SortMode::Ascending).expect("sort");
        assert_eq!(s, a);
        assert_eq!(i.as_slice(), &[0, 0]);
        assert!(!a.is_sorted(SortMode::Ascending));
        assert!(a.is_sorted(SortMode::Descending));
    }
}
