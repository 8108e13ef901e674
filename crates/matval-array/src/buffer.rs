//! Reference-counted storage shared by the containers.
//!
//! Cloning a `SharedBuffer` acquires another reference; dropping it
//! releases one. Storage is only ever written through [`SharedBuffer::make_unique`],
//! which copies the elements first when another handle can still see them.

use log::trace;
use std::sync::Arc;

#[derive(Debug)]
pub struct SharedBuffer<T> {
    inner: Arc<Vec<T>>,
}

impl<T> SharedBuffer<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            inner: Arc::new(data),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    /// Take another reference to the same storage.
    pub fn acquire(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Give up this reference.
    pub fn release(self) {}

    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> SharedBuffer<T> {
    /// Exclusive access to the elements, copying them first when shared.
    pub fn make_unique(&mut self) -> &mut Vec<T> {
        if !self.is_unique() {
            trace!(
                "copy-on-write: detaching {} elements from {} sharers",
                self.inner.len(),
                self.ref_count()
            );
        }
        Arc::make_mut(&mut self.inner)
    }

    /// A fresh buffer holding a copy of the elements, with one reference.
    pub fn deep_clone(&self) -> Self {
        Self::new(self.inner.as_ref().clone())
    }

    pub fn into_vec(self) -> Vec<T> {
        Arc::try_unwrap(self.inner).unwrap_or_else(|shared| shared.as_ref().clone())
    }
}

impl<T> Clone for SharedBuffer<T> {
    fn clone(&self) -> Self {
        self.acquire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_until_written() {
        let a = SharedBuffer::new(vec![1, 2, 3]);
        let mut b = a.clone();
        assert_eq!(a.ref_count(), 2);
        assert!(a.ptr_eq(&b));

        b.make_unique()[0] = 10;
        assert_eq!(a.as_slice(), &[1, 2, 3]);
        assert_eq!(b.as_slice(), &[10, 2, 3]);
        assert!(!a.ptr_eq(&b));
        assert!(a.is_unique());
        assert!(b.is_unique());
    }

    #[test]
    fn release_drops_one_reference() {
        let a = SharedBuffer::new(vec![0u8; 4]);
        let b = a.acquire();
        assert_eq!(a.ref_count(), 2);
        b.release();
        assert_eq!(a.ref_count(), 1);
    }

    #[test]
    fn unique_buffer_is_written_in_place() {
        let mut a = SharedBuffer::new(vec![1.0, 2.0]);
        let before = a.as_slice().as_ptr();
        a.make_unique()[1] = 5.0;
        assert_eq!(a.as_slice().as_ptr(), before);
        assert_eq!(a.into_vec(), vec![1.0, 5.0]);
    }
}
