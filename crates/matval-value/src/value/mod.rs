//! The polymorphic value.
//!
//! Every payload is a copy-on-write container, so cloning a `Value` is
//! cheap and mutation through [`Value::assign`] and friends only copies
//! storage that is still shared.

mod convert;
mod display;
mod index;

pub(crate) use convert::nan_to_logical;
pub use display::format_number;
pub(crate) use index::{check_struct_subscripts, index_vectors};
pub use index::Subscript;

use std::sync::Arc;

use log::trace;
use matval_array::{engine_config, DenseArray, DimVector, Range, SparseArray};
use num_complex::{Complex32, Complex64};

use crate::int::{IntArray, IntScalar};
use crate::kind::Kind;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    MagicColon,
    Double(f64),
    DoubleMatrix(DenseArray<f64>),
    Single(f32),
    SingleMatrix(DenseArray<f32>),
    Complex(Complex64),
    ComplexMatrix(DenseArray<Complex64>),
    FloatComplex(Complex32),
    FloatComplexMatrix(DenseArray<Complex32>),
    Int(IntScalar),
    IntMatrix(IntArray),
    Bool(bool),
    BoolMatrix(DenseArray<bool>),
    Char(DenseArray<char>),
    Range(Range),
    Sparse(SparseArray<f64>),
    SparseComplex(SparseArray<Complex64>),
    SparseBool(SparseArray<bool>),
    Cell(DenseArray<Value>),
    Struct(Arc<StructValue>),
}

/// The empty double matrix, which is also what new cells hold.
impl Default for Value {
    fn default() -> Self {
        Value::DoubleMatrix(DenseArray::empty())
    }
}

/// A scalar struct: named fields in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Undefined => Kind::Undefined,
            Value::Null => Kind::Null,
            Value::MagicColon => Kind::MagicColon,
            Value::Double(_) => Kind::Double,
            Value::DoubleMatrix(_) => Kind::DoubleMatrix,
            Value::Single(_) => Kind::Single,
            Value::SingleMatrix(_) => Kind::SingleMatrix,
            Value::Complex(_) => Kind::Complex,
            Value::ComplexMatrix(_) => Kind::ComplexMatrix,
            Value::FloatComplex(_) => Kind::FloatComplex,
            Value::FloatComplexMatrix(_) => Kind::FloatComplexMatrix,
            Value::Int(s) => Kind::IntScalar(s.class()),
            Value::IntMatrix(a) => Kind::IntMatrix(a.class()),
            Value::Bool(_) => Kind::Bool,
            Value::BoolMatrix(_) => Kind::BoolMatrix,
            Value::Char(_) => Kind::Char,
            Value::Range(_) => Kind::Range,
            Value::Sparse(_) => Kind::Sparse,
            Value::SparseComplex(_) => Kind::SparseComplex,
            Value::SparseBool(_) => Kind::SparseBool,
            Value::Cell(_) => Kind::Cell,
            Value::Struct(_) => Kind::Struct,
        }
    }

    pub fn type_name(&self) -> String {
        self.kind().type_name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind().class_name()
    }

    pub fn dims(&self) -> DimVector {
        match self {
            Value::Undefined | Value::Null => DimVector::empty(),
            Value::MagicColon
            | Value::Double(_)
            | Value::Single(_)
            | Value::Complex(_)
            | Value::FloatComplex(_)
            | Value::Int(_)
            | Value::Bool(_)
            | Value::Struct(_) => DimVector::scalar(),
            Value::DoubleMatrix(a) => a.dims().clone(),
            Value::SingleMatrix(a) => a.dims().clone(),
            Value::ComplexMatrix(a) => a.dims().clone(),
            Value::FloatComplexMatrix(a) => a.dims().clone(),
            Value::IntMatrix(a) => a.dims().clone(),
            Value::BoolMatrix(a) => a.dims().clone(),
            Value::Char(a) => a.dims().clone(),
            Value::Range(r) => r.dims(),
            Value::Sparse(s) => s.dims(),
            Value::SparseComplex(s) => s.dims(),
            Value::SparseBool(s) => s.dims(),
            Value::Cell(c) => c.dims().clone(),
        }
    }

    pub fn numel(&self) -> usize {
        self.dims().numel()
    }

    pub fn ndims(&self) -> usize {
        self.dims().ndims()
    }

    pub fn rows(&self) -> usize {
        self.dims().rows()
    }

    pub fn columns(&self) -> usize {
        self.dims().cols()
    }

    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_magic_colon(&self) -> bool {
        matches!(self, Value::MagicColon)
    }

    pub fn is_scalar_type(&self) -> bool {
        self.kind().is_scalar_kind()
    }

    pub fn is_complex(&self) -> bool {
        self.kind().is_complex()
    }

    pub fn is_real(&self) -> bool {
        self.kind().is_numeric_like() && !self.is_complex()
    }

    pub fn is_single(&self) -> bool {
        self.kind().is_single()
    }

    pub fn is_double(&self) -> bool {
        self.class_name() == "double"
    }

    pub fn is_integer(&self) -> bool {
        self.kind().int_class().is_some()
    }

    pub fn is_bool(&self) -> bool {
        self.kind().is_bool()
    }

    pub fn is_char(&self) -> bool {
        matches!(self, Value::Char(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Char(c) if c.rows() <= 1 && c.ndims() == 2)
    }

    pub fn is_sparse(&self) -> bool {
        self.kind().is_sparse()
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Value::Range(_))
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, Value::Cell(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Value::Struct(_))
    }

    pub fn is_numeric(&self) -> bool {
        let kind = self.kind();
        kind.is_numeric_like() && !kind.is_bool() && kind != Kind::Char
    }

    /// Number of nonzero elements; stored entries for sparse values.
    pub fn nnz(&self) -> usize {
        match self {
            Value::Double(x) => usize::from(*x != 0.0),
            Value::Single(x) => usize::from(*x != 0.0),
            Value::Complex(z) => usize::from(z.re != 0.0 || z.im != 0.0),
            Value::FloatComplex(z) => usize::from(z.re != 0.0 || z.im != 0.0),
            Value::Int(s) => usize::from(s.wide() != 0),
            Value::Bool(b) => usize::from(*b),
            Value::DoubleMatrix(a) => a.nnz(),
            Value::SingleMatrix(a) => a.nnz(),
            Value::ComplexMatrix(a) => a.nnz(),
            Value::FloatComplexMatrix(a) => a.nnz(),
            Value::IntMatrix(a) => a.nnz(),
            Value::BoolMatrix(a) => a.nnz(),
            Value::Char(a) => a.nnz(),
            Value::Range(r) => r.nnz(),
            Value::Sparse(s) => s.nnz(),
            Value::SparseComplex(s) => s.nnz(),
            Value::SparseBool(s) => s.nnz(),
            Value::Undefined
            | Value::Null
            | Value::MagicColon
            | Value::Cell(_)
            | Value::Struct(_) => 0,
        }
    }

    pub fn str(text: &str) -> Value {
        Value::Char(DenseArray::row(text.chars().collect()))
    }

    pub fn row(values: Vec<f64>) -> Value {
        Value::DoubleMatrix(DenseArray::row(values))
    }

    pub fn matrix(values: Vec<f64>, rows: usize, cols: usize) -> crate::error::Result<Value> {
        Ok(Value::DoubleMatrix(DenseArray::from_vec(
            values,
            DimVector::matrix(rows, cols),
        )?))
    }

    pub fn cell(values: Vec<Value>, dims: impl Into<DimVector>) -> crate::error::Result<Value> {
        Ok(Value::Cell(DenseArray::from_vec(values, dims)?))
    }

    /// `Null` stands for `[]` only as an operand; stored it is a 0x0 double.
    pub fn storable_value(&self) -> Value {
        match self {
            Value::Null => Value::default(),
            other => other.clone(),
        }
    }

    /// Narrow a result to its simplest kind: 1x1 matrices become scalars,
    /// complex values with no imaginary part become real, ranges are
    /// materialized when lazy ranges are off, and sparse results may go
    /// full when that is smaller.
    pub fn maybe_mutate(self) -> Value {
        match self {
            Value::DoubleMatrix(a) if a.numel() == 1 => Value::Double(*a.elem(0)),
            Value::SingleMatrix(a) if a.numel() == 1 => Value::Single(*a.elem(0)),
            Value::BoolMatrix(a) if a.numel() == 1 => Value::Bool(*a.elem(0)),
            Value::IntMatrix(a) if a.numel() == 1 => Value::Int(a.scalar(0)),
            Value::Complex(z) if z.im == 0.0 => Value::Double(z.re),
            Value::FloatComplex(z) if z.im == 0.0 => Value::Single(z.re),
            Value::ComplexMatrix(a) => {
                if a.iter().all(|z| z.im == 0.0) {
                    match a.map(|z| z.re) {
                        Ok(re) => Value::DoubleMatrix(re).maybe_mutate(),
                        Err(_) => Value::ComplexMatrix(a),
                    }
                } else if a.numel() == 1 {
                    Value::Complex(*a.elem(0))
                } else {
                    Value::ComplexMatrix(a)
                }
            }
            Value::FloatComplexMatrix(a) => {
                if a.iter().all(|z| z.im == 0.0) {
                    match a.map(|z| z.re) {
                        Ok(re) => Value::SingleMatrix(re).maybe_mutate(),
                        Err(_) => Value::FloatComplexMatrix(a),
                    }
                } else if a.numel() == 1 {
                    Value::FloatComplex(*a.elem(0))
                } else {
                    Value::FloatComplexMatrix(a)
                }
            }
            Value::Range(r) => {
                if r.numel() == 1 {
                    Value::Double(r.elem(0))
                } else if !engine_config().lazy_ranges {
                    trace!("lazy ranges disabled; materializing {} elements", r.numel());
                    Value::DoubleMatrix(r.to_array())
                } else {
                    Value::Range(r)
                }
            }
            Value::SparseComplex(s) => {
                if s.data().iter().all(|z| z.im == 0.0) {
                    match s.map_nonzeros(|z| z.re) {
                        Ok(re) => Value::Sparse(re).maybe_mutate(),
                        Err(_) => Value::SparseComplex(s),
                    }
                } else if sparse_prefers_full(s.rows(), s.cols(), s.nnz(), 16) {
                    trace!("sparse complex result converted to full storage");
                    Value::ComplexMatrix(s.to_dense())
                } else {
                    Value::SparseComplex(s)
                }
            }
            Value::Sparse(s) if sparse_prefers_full(s.rows(), s.cols(), s.nnz(), 8) => {
                trace!("sparse result converted to full storage");
                Value::DoubleMatrix(s.to_dense()).maybe_mutate()
            }
            Value::SparseBool(s) if sparse_prefers_full(s.rows(), s.cols(), s.nnz(), 1) => {
                trace!("sparse bool result converted to full storage");
                Value::BoolMatrix(s.to_dense()).maybe_mutate()
            }
            other => other,
        }
    }
}

/// Full storage wins when it needs fewer bytes than CSC storage.
fn sparse_prefers_full(nr: usize, nc: usize, nnz: usize, elem_size: usize) -> bool {
    if !engine_config().sparse_auto_mutate {
        return false;
    }
    let full = (nr as u128) * (nc as u128) * elem_size as u128;
    let sparse = (nnz as u128) * (elem_size as u128 + 8) + (nc as u128 + 1) * 8;
    full < sparse
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }
    )*};
}

value_from!(
    f64 => Double,
    f32 => Single,
    Complex64 => Complex,
    Complex32 => FloatComplex,
    bool => Bool,
    IntScalar => Int,
    IntArray => IntMatrix,
    DenseArray<f64> => DoubleMatrix,
    DenseArray<f32> => SingleMatrix,
    DenseArray<Complex64> => ComplexMatrix,
    DenseArray<Complex32> => FloatComplexMatrix,
    DenseArray<bool> => BoolMatrix,
    DenseArray<char> => Char,
    DenseArray<Value> => Cell,
    Range => Range,
    SparseArray<f64> => Sparse,
    SparseArray<Complex64> => SparseComplex,
    SparseArray<bool> => SparseBool,
);

macro_rules! value_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(crate::int::IntElement::wrap_scalar(v))
            }
        }

        impl From<DenseArray<$t>> for Value {
            fn from(v: DenseArray<$t>) -> Self {
                Value::IntMatrix(crate::int::IntElement::wrap_array(v))
            }
        }
    )*};
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(&s)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(Arc::new(s))
    }
}
