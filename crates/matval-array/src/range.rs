//! Lazy arithmetic progressions `base:increment:limit`.
//!
//! The element count uses a tolerant floor so accumulated rounding cannot
//! drop or add an element, and the first and last elements are returned as
//! stored rather than recomputed. A dense row is built on first request and
//! cached until the range changes.

use std::fmt;

use log::debug;
use once_cell::sync::OnceCell;

use crate::dense::{DenseArray, SortMode};
use crate::dims::DimVector;
use crate::error::{ArrayError, Result};
use crate::index::IndexVector;
use crate::interrupt::InterruptPoller;

const TOLERANCE: f64 = 3.0 * f64::EPSILON;

/// Hagerty's FL5 tolerant floor.
fn tfloor(x: f64, ct: f64) -> f64 {
    let q = if x < 0.0 { 1.0 - ct } else { 1.0 };
    let rmax = q / (2.0 - ct);
    let mut t1 = 1.0 + x.floor();
    t1 = (ct / q) * t1.abs();
    t1 = t1.min(rmax);
    t1 = t1.max(ct);
    t1 = (x + t1).floor();
    if x <= 0.0 || (t1 - x) < rmax {
        t1
    } else {
        t1 - 1.0
    }
}

/// Relative equality within `TOLERANCE`.
fn teq(u: f64, v: f64) -> bool {
    (u - v).abs() < u.abs().max(v.abs()) * TOLERANCE
}

fn count_elements(base: f64, increment: f64, limit: f64) -> Result<usize> {
    if !base.is_finite() || !increment.is_finite() || limit.is_nan() {
        return Err(ArrayError::InvalidArgument(
            "invalid range: base, increment and limit must not be NaN".to_string(),
        ));
    }
    if limit.is_infinite() && ((increment > 0.0 && limit > 0.0) || (increment < 0.0 && limit < 0.0))
    {
        return Err(ArrayError::InvalidArgument(
            "invalid range: the range would have infinitely many elements".to_string(),
        ));
    }
    if increment == 0.0 || (increment > 0.0 && base > limit) || (increment < 0.0 && base < limit) {
        return Ok(0);
    }
    let estimate = tfloor((limit - base + increment) / increment, TOLERANCE);
    if estimate >= i64::MAX as f64 {
        return Err(ArrayError::InvalidArgument(
            "invalid range: too many elements".to_string(),
        ));
    }
    let mut n = if estimate > 0.0 { estimate as i64 } else { 0 };
    if !teq(base + (n - 1) as f64 * increment, limit) {
        if teq(base + (n - 2) as f64 * increment, limit) {
            n -= 1;
        } else if teq(base + n as f64 * increment, limit) {
            n += 1;
        }
    }
    Ok(n.max(0) as usize)
}

fn elements_are_ints(base: f64, increment: f64, final_value: f64, numel: usize) -> bool {
    if numel == 0 || final_value.is_nan() {
        return false;
    }
    if base.round() == base && increment.round() == increment {
        return true;
    }
    numel == 1 && base.round() == base
}

fn final_element(base: f64, increment: f64, limit: f64, numel: usize) -> f64 {
    if numel <= 1 {
        return base;
    }
    let mut last = base + (numel - 1) as f64 * increment;
    if (increment > 0.0 && last >= limit) || (increment < 0.0 && last <= limit) || teq(last, limit)
    {
        last = limit;
    }
    if elements_are_ints(base, increment, last, numel) {
        last = last.round();
    }
    last
}

#[derive(Clone)]
pub struct Range {
    base: f64,
    increment: f64,
    limit: f64,
    final_value: f64,
    numel: usize,
    cache: OnceCell<DenseArray<f64>>,
}

/// Outcome of scalar arithmetic on a range.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeArith {
    Lazy(Range),
    Materialized(DenseArray<f64>),
}

impl Range {
    /// `base:increment:limit`. Fails when an endpoint is NaN or the range
    /// would be infinite.
    pub fn new(base: f64, increment: f64, limit: f64) -> Result<Self> {
        let numel = count_elements(base, increment, limit)?;
        let final_value = final_element(base, increment, limit, numel);
        Ok(Self {
            base,
            increment,
            limit,
            final_value,
            numel,
            cache: OnceCell::new(),
        })
    }

    /// `base:limit` with unit increment.
    pub fn unit(base: f64, limit: f64) -> Result<Self> {
        Self::new(base, 1.0, limit)
    }

    /// A range whose element count and last element are already known.
    pub fn from_parts(base: f64, increment: f64, final_value: f64, numel: usize) -> Result<Self> {
        if !base.is_finite() || !increment.is_finite() || (numel > 0 && !final_value.is_finite()) {
            return Err(ArrayError::InvalidArgument(
                "invalid range: endpoints must be finite".to_string(),
            ));
        }
        Ok(Self {
            base,
            increment,
            limit: final_value,
            final_value: if numel == 0 { base } else { final_value },
            numel,
            cache: OnceCell::new(),
        })
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// The limit as requested, which the progression may not reach.
    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// The last element actually produced.
    pub fn final_value(&self) -> f64 {
        self.final_value
    }

    pub fn numel(&self) -> usize {
        self.numel
    }

    pub fn is_empty(&self) -> bool {
        self.numel == 0
    }

    pub fn dims(&self) -> DimVector {
        DimVector::matrix(1, self.numel)
    }

    pub fn elem(&self, i: usize) -> f64 {
        if i == 0 {
            if self.numel > 0 {
                self.base
            } else {
                self.final_value
            }
        } else if i + 1 < self.numel {
            self.base + i as f64 * self.increment
        } else {
            self.final_value
        }
    }

    pub fn checkelem(&self, i: usize) -> Result<f64> {
        if i >= self.numel {
            return Err(ArrayError::out_of_range(i + 1, self.numel, None, &self.dims()));
        }
        Ok(self.elem(i))
    }

    /// The dense row vector, built once.
    pub fn materialize(&self) -> &DenseArray<f64> {
        self.cache.get_or_init(|| {
            debug!("materializing range with {} elements", self.numel);
            DenseArray::row((0..self.numel).map(|i| self.elem(i)).collect())
        })
    }

    pub fn to_array(&self) -> DenseArray<f64> {
        self.materialize().clone()
    }

    pub fn is_materialized(&self) -> bool {
        self.cache.get().is_some()
    }

    fn reset(&mut self, base: f64, increment: f64, limit: f64) -> Result<()> {
        *self = Self::new(base, increment, limit)?;
        Ok(())
    }

    pub fn set_base(&mut self, base: f64) -> Result<()> {
        self.reset(base, self.increment, self.limit)
    }

    pub fn set_increment(&mut self, increment: f64) -> Result<()> {
        self.reset(self.base, increment, self.limit)
    }

    pub fn set_limit(&mut self, limit: f64) -> Result<()> {
        self.reset(self.base, self.increment, limit)
    }

    pub fn min(&self) -> Option<f64> {
        (self.numel > 0).then(|| {
            if self.increment > 0.0 {
                self.base
            } else {
                self.final_value
            }
        })
    }

    pub fn max(&self) -> Option<f64> {
        (self.numel > 0).then(|| {
            if self.increment > 0.0 {
                self.final_value
            } else {
                self.base
            }
        })
    }

    /// Number of nonzero elements, computed from the endpoints.
    pub fn nnz(&self) -> usize {
        if self.numel == 0 {
            return 0;
        }
        let (b, f) = (self.base, self.final_value);
        if (b > 0.0 && f > 0.0) || (b < 0.0 && f < 0.0) {
            self.numel
        } else if self.increment != 0.0 {
            if b == 0.0 || f == 0.0 {
                self.numel - 1
            } else if (b / self.increment).fract() != 0.0 {
                self.numel
            } else {
                self.numel - 1
            }
        } else {
            0
        }
    }

    pub fn all_elements_are_ints(&self) -> bool {
        elements_are_ints(self.base, self.increment, self.final_value, self.numel)
    }

    fn reversed(&self) -> Self {
        Self {
            base: self.final_value,
            increment: -self.increment,
            limit: self.base,
            final_value: self.base,
            numel: self.numel,
            cache: OnceCell::new(),
        }
    }

    fn needs_reversal(&self, mode: SortMode) -> bool {
        self.numel > 1
            && match mode {
                SortMode::Ascending => self.increment < 0.0,
                SortMode::Descending => self.increment > 0.0,
            }
    }

    /// Sorting only swaps the endpoints and negates the increment.
    pub fn sort(&self, mode: SortMode) -> Self {
        if self.needs_reversal(mode) {
            self.reversed()
        } else {
            self.clone()
        }
    }

    /// Sort plus the zero-based origin of every element.
    pub fn sort_with_indices(&self, mode: SortMode) -> (Self, DenseArray<usize>) {
        let n = self.numel;
        if self.needs_reversal(mode) {
            (self.reversed(), DenseArray::row((0..n).rev().collect()))
        } else {
            (self.clone(), DenseArray::row((0..n).collect()))
        }
    }

    pub fn is_sorted(&self, mode: SortMode) -> bool {
        !self.needs_reversal(mode)
    }

    /// `r(idx)`, computing elements directly from the progression.
    pub fn index(&self, idx: &IndexVector) -> Result<DenseArray<f64>> {
        let n = self.numel;
        if idx.is_colon() {
            return self.materialize().reshape(DimVector::matrix(n, 1));
        }
        let ext = idx.extent(n);
        if ext != n {
            return Err(ArrayError::out_of_range(ext, n, None, &self.dims()));
        }
        let len = idx.length(n);
        let mut dims = idx.orig_dims(n);
        if n != 1 && dims.is_vector() {
            dims = DimVector::matrix(1, len);
        }
        let mut poller = InterruptPoller::new();
        let mut out = Vec::with_capacity(len);
        for i in idx.iter(n) {
            poller.tick()?;
            out.push(self.elem(i));
        }
        DenseArray::from_vec(out, dims)
    }

    fn transformed<F>(&self, base: f64, increment: f64, final_value: f64, f: F) -> Result<RangeArith>
    where
        F: Fn(f64) -> f64,
    {
        if self.numel == 0 {
            return Ok(RangeArith::Lazy(self.clone()));
        }
        let finite = base.is_finite() && increment.is_finite() && final_value.is_finite();
        if !finite || (self.numel > 1 && increment == 0.0) {
            debug!("range arithmetic left the lazy domain; materializing");
            return Ok(RangeArith::Materialized(self.materialize().map(|&v| f(v))?));
        }
        Ok(RangeArith::Lazy(Self::from_parts(
            base,
            increment,
            final_value,
            self.numel,
        )?))
    }

    /// `-r`
    pub fn neg(&self) -> Result<RangeArith> {
        self.transformed(-self.base, -self.increment, -self.final_value, |v| -v)
    }

    /// `r + x`
    pub fn add_scalar(&self, x: f64) -> Result<RangeArith> {
        self.transformed(self.base + x, self.increment, self.final_value + x, |v| v + x)
    }

    /// `r - x`
    pub fn sub_scalar(&self, x: f64) -> Result<RangeArith> {
        self.transformed(self.base - x, self.increment, self.final_value - x, |v| v - x)
    }

    /// `x - r`
    pub fn rsub_scalar(&self, x: f64) -> Result<RangeArith> {
        self.transformed(x - self.base, -self.increment, x - self.final_value, |v| x - v)
    }

    /// `r * x` (and `x * r`)
    pub fn mul_scalar(&self, x: f64) -> Result<RangeArith> {
        self.transformed(self.base * x, self.increment * x, self.final_value * x, |v| v * x)
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.numel == other.numel
            && (0..self.numel.min(2)).all(|i| self.elem(i).to_bits() == other.elem(i).to_bits())
            && self.final_value.to_bits() == other.final_value.to_bits()
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range")
            .field("base", &self.base)
            .field("increment", &self.increment)
            .field("limit", &self.limit)
            .field("final", &self.final_value)
            .field("numel", &self.numel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerant_count_recovers_rounded_element() {
        let r = Range::new(1.8, 0.05, 1.9).expect("finite");
        assert_eq!(r.numel(), 3);
        assert_eq!(r.elem(2), 1.9);
        assert_eq!(r.elem(0), 1.8);

        let r = Range::new(0.0, 0.1, 0.3).expect("finite");
        assert_eq!(r.numel(), 4);
        assert_eq!(r.elem(3), 0.3);
    }

    #[test]
    fn endpoints_are_stored_not_recomputed() {
        let r = Range::new(-0.0, 1.0, 3.0).expect("finite");
        assert!(r.elem(0).is_sign_negative());
        assert_eq!(r.elem(r.numel() - 1).to_bits(), 3.0f64.to_bits());
    }

    #[test]
    fn unreached_limit_is_clipped() {
        let r = Range::new(0.0, 2.0, 5.0).expect("finite");
        assert_eq!(r.numel(), 3);
        assert_eq!(r.final_value(), 4.0);
        assert_eq!(r.limit(), 5.0);
        assert_eq!(r.max(), Some(4.0));
    }

    #[test]
    fn empty_and_invalid_ranges() {
        assert_eq!(Range::new(3.0, 1.0, 1.0).expect("empty").numel(), 0);
        assert_eq!(Range::new(1.0, 0.0, 5.0).expect("empty").numel(), 0);
        assert!(matches!(
            Range::new(1.0, 1.0, f64::INFINITY),
            Err(ArrayError::InvalidArgument(_))
        ));
        assert!(Range::new(f64::NAN, 1.0, 2.0).is_err());
    }

    #[test]
    fn materialized_row_is_cached() {
        let r = Range::unit(1.0, 4.0).expect("finite");
        assert!(!r.is_materialized());
        let a = r.materialize().clone();
        assert!(r.is_materialized());
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.dims().as_slice(), &[1, 4]);

        let mut r = r;
        r.set_limit(2.0).expect("finite");
        assert!(!r.is_materialized());
        assert_eq!(r.numel(), 2);
    }

    #[test]
    fn scalar_arithmetic_stays_lazy() {
        let r = Range::unit(1.0, 3.0).expect("finite");
        match r.mul_scalar(2.0).expect("mul") {
            RangeArith::Lazy(m) => {
                assert_eq!(m.increment(), 2.0);
                assert_eq!(m.final_value(), 6.0);
                assert_eq!(m.numel(), 3);
            }
            other => panic!("expected lazy range, got {other:?}"),
        }
        match r.rsub_scalar(10.0).expect("rsub") {
            RangeArith::Lazy(m) => assert_eq!(m.to_array().as_slice(), &[9.0, 8.0, 7.0]),
            other => panic!("expected lazy range, got {other:?}"),
        }
        match r.mul_scalar(0.0).expect("collapse") {
            RangeArith::Materialized(a) => assert_eq!(a.as_slice(), &[0.0, 0.0, 0.0]),
            other => panic!("expected dense result, got {other:?}"),
        }
        match r.mul_scalar(f64::INFINITY).expect("overflow") {
            RangeArith::Materialized(a) => assert!(a.iter().all(|v| v.is_infinite())),
            other => panic!("expected dense result, got {other:?}"),
        }
    }

    #[test]
    fn sort_swaps_endpoints() {
        let r = Range::new(5.0, -1.0, 1.0).expect("finite");
        let (s, idx) = r.sort_with_indices(SortMode::Ascending);
        assert_eq!(s.base(), 1.0);
        assert_eq!(s.increment(), 1.0);
        assert_eq!(s.final_value(), 5.0);
        assert_eq!(idx.as_slice(), &[4, 3, 2, 1, 0]);
        assert!(s.is_sorted(SortMode::Ascending));
    }

    #[test]
    fn analytic_nnz() {
        assert_eq!(Range::unit(-2.0, 2.0).expect("finite").nnz(), 4);
        assert_eq!(Range::new(-1.5, 1.0, 1.5).expect("finite").nnz(), 4);
        assert_eq!(Range::unit(0.0, 3.0).expect("finite").nnz(), 3);
    }

    #[test]
    fn index_reads_through_progression() {
        let r = Range::unit(10.0, 14.0).expect("finite");
        let picked = r.index(&IndexVector::from_vec(vec![4, 0])).expect("in range");
        assert_eq!(picked.as_slice(), &[14.0, 10.0]);
        assert!(r.index(&IndexVector::scalar(5)).is_err());
        let col = r.index(&IndexVector::colon()).expect("colon");
        assert_eq!(col.dims().as_slice(), &[5, 1]);
    }
}
