//! Implicit expansion of singleton dimensions for element-wise operators.
//!
//! A plan is computed from shape metadata only; callers iterate the
//! `(output, a, b)` offset triples without materialising expanded operands.

use super::DenseArray;
use crate::dims::{strides_of, DimVector};
use crate::error::{ArrayError, Result};
use crate::interrupt::InterruptPoller;

#[derive(Debug, Clone)]
pub struct BroadcastPlan {
    output: DimVector,
    shape: Vec<usize>,
    len: usize,
    advance_a: Vec<usize>,
    advance_b: Vec<usize>,
}

impl BroadcastPlan {
    /// Plan `a op b`. Shapes are compared dimension by dimension after
    /// padding the shorter one with trailing singletons; `op` names the
    /// operator in the mismatch message.
    pub fn new(op: &str, a: &DimVector, b: &DimVector) -> Result<Self> {
        let ndims = a.ndims().max(b.ndims());
        let ext_a = a.redim(ndims);
        let ext_b = b.redim(ndims);

        let mut shape = Vec::with_capacity(ndims);
        for (&da, &db) in ext_a.iter().zip(&ext_b) {
            if da == db || db == 1 {
                shape.push(da);
            } else if da == 1 {
                shape.push(db);
            } else {
                return Err(ArrayError::nonconformant(op, a, b));
            }
        }

        let strides_a = strides_of(&ext_a);
        let strides_b = strides_of(&ext_b);
        let advance = |ext: &[usize], strides: &[usize]| -> Vec<usize> {
            ext.iter()
                .zip(strides)
                .map(|(&size, &stride)| if size <= 1 { 0 } else { stride })
                .collect()
        };

        Ok(Self {
            output: DimVector::new(shape.iter().copied()),
            len: shape.iter().product(),
            advance_a: advance(&ext_a, &strides_a),
            advance_b: advance(&ext_b, &strides_b),
            shape,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn output_dims(&self) -> &DimVector {
        &self.output
    }

    /// Yields `(output_index, index_a, index_b)` for every output element.
    pub fn iter(&self) -> BroadcastIter<'_> {
        BroadcastIter {
            plan: self,
            offset: 0,
            index_a: 0,
            index_b: 0,
            coords: vec![0; self.shape.len()],
        }
    }
}

pub struct BroadcastIter<'a> {
    plan: &'a BroadcastPlan,
    offset: usize,
    index_a: usize,
    index_b: usize,
    coords: Vec<usize>,
}

impl<'a> Iterator for BroadcastIter<'a> {
    type Item = (usize, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.plan.len {
            return None;
        }
        let current = (self.offset, self.index_a, self.index_b);
        self.offset += 1;
        if self.offset == self.plan.len {
            return Some(current);
        }
        for dim in 0..self.plan.shape.len() {
            self.coords[dim] += 1;
            if self.coords[dim] < self.plan.shape[dim] {
                self.index_a += self.plan.advance_a[dim];
                self.index_b += self.plan.advance_b[dim];
                break;
            }
            self.coords[dim] = 0;
            let rewind = self.plan.shape[dim].saturating_sub(1);
            self.index_a -= self.plan.advance_a[dim] * rewind;
            self.index_b -= self.plan.advance_b[dim] * rewind;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.plan.len - self.offset;
        (rest, Some(rest))
    }
}

impl<T> DenseArray<T> {
    /// Element-wise combination with implicit expansion.
    pub fn zip_with<U, V, F>(&self, other: &DenseArray<U>, op: &str, mut f: F) -> Result<DenseArray<V>>
    where
        F: FnMut(&T, &U) -> V,
    {
        let a = self.as_slice();
        let b = other.as_slice();
        let mut poller = InterruptPoller::new();
        if self.dims() == other.dims() {
            let mut out = Vec::with_capacity(a.len());
            for (x, y) in a.iter().zip(b) {
                poller.tick()?;
                out.push(f(x, y));
            }
            return DenseArray::from_vec(out, self.dims().clone());
        }
        let plan = BroadcastPlan::new(op, self.dims(), other.dims())?;
        let mut out = Vec::with_capacity(plan.len());
        for (_, ia, ib) in plan.iter() {
            poller.tick()?;
            out.push(f(&a[ia], &b[ib]));
        }
        DenseArray::from_vec(out, plan.output_dims().clone())
    }

    /// Combine every element with a single value.
    pub fn zip_scalar<U, V, F>(&self, value: &U, mut f: F) -> Result<DenseArray<V>>
    where
        F: FnMut(&T, &U) -> V,
    {
        let mut poller = InterruptPoller::new();
        let mut out = Vec::with_capacity(self.numel());
        for x in self.as_slice() {
            poller.tick()?;
            out.push(f(x, value));
        }
        DenseArray::from_vec(out, self.dims().clone())
    }
}
