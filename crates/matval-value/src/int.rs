//! Integer-typed scalars and arrays.
//!
//! Arithmetic is carried out in `i128` (or `f64` when a float operand is
//! involved) and narrowed back with saturation, so every class shares one
//! implementation.

use std::fmt;

use matval_array::{DenseArray, DimVector, Element};

use crate::error::Result;
use crate::kind::IntClass;

pub trait IntElement: Element + Copy + Ord + Into<i128> + Send + Sync + fmt::Display {
    const CLASS: IntClass;

    /// Narrow with saturation.
    fn from_wide(v: i128) -> Self;

    /// Round half away from zero, saturate, NaN becomes zero.
    fn from_f64(v: f64) -> Self;

    fn to_f64(self) -> f64;

    fn wide(self) -> i128 {
        self.into()
    }

    fn wrap_scalar(self) -> IntScalar;

    fn wrap_array(array: DenseArray<Self>) -> IntArray;
}

macro_rules! impl_int_element {
    ($($t:ty => $class:ident),* $(,)?) => {$(
        impl IntElement for $t {
            const CLASS: IntClass = IntClass::$class;

            fn from_wide(v: i128) -> Self {
                v.clamp(<$t>::MIN as i128, <$t>::MAX as i128) as $t
            }

            fn from_f64(v: f64) -> Self {
                // float-to-int `as` saturates and maps NaN to 0
                v.round() as $t
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn wrap_scalar(self) -> IntScalar {
                IntScalar::$class(self)
            }

            fn wrap_array(array: DenseArray<Self>) -> IntArray {
                IntArray::$class(array)
            }
        }
    )*};
}

impl_int_element!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

/// Run `$body` with `$t` aliased to the Rust type of `$class`.
macro_rules! for_int_class {
    ($class:expr, $t:ident => $body:expr) => {
        match $class {
            $crate::kind::IntClass::I8 => {
                type $t = i8;
                $body
            }
            $crate::kind::IntClass::I16 => {
                type $t = i16;
                $body
            }
            $crate::kind::IntClass::I32 => {
                type $t = i32;
                $body
            }
            $crate::kind::IntClass::I64 => {
                type $t = i64;
                $body
            }
            $crate::kind::IntClass::U8 => {
                type $t = u8;
                $body
            }
            $crate::kind::IntClass::U16 => {
                type $t = u16;
                $body
            }
            $crate::kind::IntClass::U32 => {
                type $t = u32;
                $body
            }
            $crate::kind::IntClass::U64 => {
                type $t = u64;
                $body
            }
        }
    };
}

/// Evaluate `$body` against the typed payload of an [`IntArray`].
macro_rules! with_int_array {
    ($array:expr, $a:ident => $body:expr) => {
        match $array {
            $crate::int::IntArray::I8($a) => $body,
            $crate::int::IntArray::I16($a) => $body,
            $crate::int::IntArray::I32($a) => $body,
            $crate::int::IntArray::I64($a) => $body,
            $crate::int::IntArray::U8($a) => $body,
            $crate::int::IntArray::U16($a) => $body,
            $crate::int::IntArray::U32($a) => $body,
            $crate::int::IntArray::U64($a) => $body,
        }
    };
}

/// Like [`with_int_array`], rewrapping the resulting array in the same class.
macro_rules! map_int_array {
    ($array:expr, $a:ident => $body:expr) => {
        match $array {
            $crate::int::IntArray::I8($a) => $crate::int::IntArray::I8($body),
            $crate::int::IntArray::I16($a) => $crate::int::IntArray::I16($body),
            $crate::int::IntArray::I32($a) => $crate::int::IntArray::I32($body),
            $crate::int::IntArray::I64($a) => $crate::int::IntArray::I64($body),
            $crate::int::IntArray::U8($a) => $crate::int::IntArray::U8($body),
            $crate::int::IntArray::U16($a) => $crate::int::IntArray::U16($body),
            $crate::int::IntArray::U32($a) => $crate::int::IntArray::U32($body),
            $crate::int::IntArray::U64($a) => $crate::int::IntArray::U64($body),
        }
    };
}

pub(crate) use {map_int_array, with_int_array};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntScalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl IntScalar {
    pub fn class(&self) -> IntClass {
        match self {
            IntScalar::I8(_) => IntClass::I8,
            IntScalar::I16(_) => IntClass::I16,
            IntScalar::I32(_) => IntClass::I32,
            IntScalar::I64(_) => IntClass::I64,
            IntScalar::U8(_) => IntClass::U8,
            IntScalar::U16(_) => IntClass::U16,
            IntScalar::U32(_) => IntClass::U32,
            IntScalar::U64(_) => IntClass::U64,
        }
    }

    pub fn wide(&self) -> i128 {
        match *self {
            IntScalar::I8(v) => v.into(),
            IntScalar::I16(v) => v.into(),
            IntScalar::I32(v) => v.into(),
            IntScalar::I64(v) => v.into(),
            IntScalar::U8(v) => v.into(),
            IntScalar::U16(v) => v.into(),
            IntScalar::U32(v) => v.into(),
            IntScalar::U64(v) => v.into(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.wide() as f64
    }

    pub fn from_wide(class: IntClass, v: i128) -> Self {
        for_int_class!(class, T => T::from_wide(v).wrap_scalar())
    }

    pub fn from_f64(class: IntClass, v: f64) -> Self {
        for_int_class!(class, T => T::from_f64(v).wrap_scalar())
    }

    pub fn to_array(&self) -> IntArray {
        match *self {
            IntScalar::I8(v) => IntArray::I8(DenseArray::scalar(v)),
            IntScalar::I16(v) => IntArray::I16(DenseArray::scalar(v)),
            IntScalar::I32(v) => IntArray::I32(DenseArray::scalar(v)),
            IntScalar::I64(v) => IntArray::I64(DenseArray::scalar(v)),
            IntScalar::U8(v) => IntArray::U8(DenseArray::scalar(v)),
            IntScalar::U16(v) => IntArray::U16(DenseArray::scalar(v)),
            IntScalar::U32(v) => IntArray::U32(DenseArray::scalar(v)),
            IntScalar::U64(v) => IntArray::U64(DenseArray::scalar(v)),
        }
    }
}

impl fmt::Display for IntScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wide())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntArray {
    I8(DenseArray<i8>),
    I16(DenseArray<i16>),
    I32(DenseArray<i32>),
    I64(DenseArray<i64>),
    U8(DenseArray<u8>),
    U16(DenseArray<u16>),
    U32(DenseArray<u32>),
    U64(DenseArray<u64>),
}

impl IntArray {
    pub fn class(&self) -> IntClass {
        match self {
            IntArray::I8(_) => IntClass::I8,
            IntArray::I16(_) => IntClass::I16,
            IntArray::I32(_) => IntClass::I32,
            IntArray::I64(_) => IntClass::I64,
            IntArray::U8(_) => IntClass::U8,
            IntArray::U16(_) => IntClass::U16,
            IntArray::U32(_) => IntClass::U32,
            IntArray::U64(_) => IntClass::U64,
        }
    }

    /// All-zero array of `class`.
    pub fn zeros(class: IntClass, dims: impl Into<DimVector>) -> Self {
        let dims = dims.into();
        for_int_class!(class, T => T::wrap_array(DenseArray::<T>::new(dims)))
    }

    pub fn dims(&self) -> &DimVector {
        with_int_array!(self, a => a.dims())
    }

    pub fn numel(&self) -> usize {
        with_int_array!(self, a => a.numel())
    }

    pub fn elem_wide(&self, i: usize) -> i128 {
        with_int_array!(self, a => a.elem(i).wide())
    }

    pub fn scalar(&self, i: usize) -> IntScalar {
        with_int_array!(self, a => a.elem(i).wrap_scalar())
    }

    pub fn to_wide(&self) -> Result<DenseArray<i128>> {
        Ok(with_int_array!(self, a => a.map(|v| v.wide())?))
    }

    pub fn to_f64(&self) -> Result<DenseArray<f64>> {
        Ok(with_int_array!(self, a => a.map(|v| v.to_f64())?))
    }

    pub fn from_wide(class: IntClass, src: &DenseArray<i128>) -> Result<Self> {
        Ok(for_int_class!(class, T => T::wrap_array(src.map(|&v| T::from_wide(v))?)))
    }

    pub fn from_f64(class: IntClass, src: &DenseArray<f64>) -> Result<Self> {
        Ok(for_int_class!(class, T => T::wrap_array(src.map(|&v| T::from_f64(v))?)))
    }

    /// Same values in another integer class, saturating.
    pub fn cast(&self, class: IntClass) -> Result<Self> {
        if class == self.class() {
            return Ok(self.clone());
        }
        Self::from_wide(class, &self.to_wide()?)
    }

    pub fn reshape(&self, dims: impl Into<DimVector>) -> Result<Self> {
        let dims = dims.into();
        Ok(map_int_array!(self, a => a.reshape(dims)?))
    }

    pub fn transpose(&self) -> Result<Self> {
        Ok(map_int_array!(self, a => a.transpose()?))
    }

    pub fn nnz(&self) -> usize {
        with_int_array!(self, a => a.nnz())
    }

    pub fn all_nonzero(&self) -> bool {
        with_int_array!(self, a => a.iter().all(|v| v.wide() != 0))
    }
}

/// `a / b` rounded to nearest with ties away from zero. Division by zero
/// saturates toward the sign of `a`; `0 / 0` is zero.
pub fn int_div(a: i128, b: i128, class: IntClass) -> i128 {
    if b == 0 {
        return match a.signum() {
            1 => class.max_value(),
            -1 => class.min_value(),
            _ => 0,
        };
    }
    let mut q = a / b;
    let r = a % b;
    if 2 * r.abs() >= b.abs() {
        q += a.signum() * b.signum();
    }
    class.saturate(q)
}

/// `a ^ b` for a non-negative integer exponent, saturating at every step.
pub fn int_pow(a: i128, b: u32, class: IntClass) -> i128 {
    let mut result: i128 = 1;
    let mut base = class.saturate(a);
    let mut e = b;
    while e > 0 {
        if e & 1 == 1 {
            result = class.saturate(result.saturating_mul(base));
        }
        e >>= 1;
        if e > 0 {
            base = class.saturate(base.saturating_mul(base));
        }
    }
    result
}
