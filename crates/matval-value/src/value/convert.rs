//! Extraction of typed payloads and class conversion.

use matval_array::{engine_config, DenseArray, DimVector, IndexVector, SparseArray};
use num_complex::{Complex32, Complex64};

use super::{StructValue, Value};
use crate::error::{bad_index, conversion_error, Result, RuntimeError};
use crate::int::IntArray;
use crate::kind::{IntClass, Kind};

fn invalid_conversion(from: &Value, to: &str) -> RuntimeError {
    conversion_error(format!("invalid conversion from {} to {to}", from.type_name()))
}

pub(crate) fn nan_to_logical() -> RuntimeError {
    conversion_error("invalid conversion from NaN to logical value")
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Value {
    /// Real double elements. Complex values are rejected rather than
    /// silently dropping their imaginary part.
    pub fn array_value(&self) -> Result<DenseArray<f64>> {
        Ok(match self {
            Value::Double(x) => DenseArray::scalar(*x),
            Value::DoubleMatrix(a) => a.clone(),
            Value::Single(x) => DenseArray::scalar(f64::from(*x)),
            Value::SingleMatrix(a) => a.map(|&v| f64::from(v))?,
            Value::Int(s) => DenseArray::scalar(s.to_f64()),
            Value::IntMatrix(a) => a.to_f64()?,
            Value::Bool(b) => DenseArray::scalar(bool_to_f64(*b)),
            Value::BoolMatrix(a) => a.map(|&b| bool_to_f64(b))?,
            Value::Char(a) => a.map(|&c| f64::from(u32::from(c)))?,
            Value::Range(r) => r.to_array(),
            Value::Sparse(s) => s.to_dense(),
            Value::SparseBool(s) => s.to_dense().map(|&b| bool_to_f64(b))?,
            Value::Null => DenseArray::empty(),
            other => return Err(invalid_conversion(other, "real matrix")),
        })
    }

    pub fn complex_array_value(&self) -> Result<DenseArray<Complex64>> {
        Ok(match self {
            Value::Complex(z) => DenseArray::scalar(*z),
            Value::ComplexMatrix(a) => a.clone(),
            Value::FloatComplex(z) => DenseArray::scalar(widen_complex(*z)),
            Value::FloatComplexMatrix(a) => a.map(|&z| widen_complex(z))?,
            Value::SparseComplex(s) => s.to_dense(),
            other => other.array_value()?.map(|&v| Complex64::new(v, 0.0))?,
        })
    }

    pub fn float_array_value(&self) -> Result<DenseArray<f32>> {
        Ok(match self {
            Value::Single(x) => DenseArray::scalar(*x),
            Value::SingleMatrix(a) => a.clone(),
            other => other.array_value()?.map(|&v| v as f32)?,
        })
    }

    pub fn float_complex_array_value(&self) -> Result<DenseArray<Complex32>> {
        Ok(match self {
            Value::FloatComplex(z) => DenseArray::scalar(*z),
            Value::FloatComplexMatrix(a) => a.clone(),
            Value::Complex(_) | Value::ComplexMatrix(_) | Value::SparseComplex(_) => self
                .complex_array_value()?
                .map(|z| Complex32::new(z.re as f32, z.im as f32))?,
            other => other.float_array_value()?.map(|&v| Complex32::new(v, 0.0))?,
        })
    }

    /// Logical elements; NaN cannot be converted.
    pub fn bool_array_value(&self) -> Result<DenseArray<bool>> {
        match self {
            Value::Bool(b) => Ok(DenseArray::scalar(*b)),
            Value::BoolMatrix(a) => Ok(a.clone()),
            Value::SparseBool(s) => Ok(s.to_dense()),
            Value::IntMatrix(a) => Ok(a.to_wide()?.map(|&v| v != 0)?),
            Value::Int(s) => Ok(DenseArray::scalar(s.wide() != 0)),
            other if other.is_complex() => Err(invalid_conversion(other, "logical value")),
            other => {
                let a = other.array_value()?;
                if a.any_nan() {
                    return Err(nan_to_logical());
                }
                Ok(a.map(|&v| v != 0.0)?)
            }
        }
    }

    pub fn char_array_value(&self) -> Result<DenseArray<char>> {
        if let Value::Char(a) = self {
            return Ok(a.clone());
        }
        if self.is_complex() {
            return Err(invalid_conversion(self, "char matrix"));
        }
        let a = self.array_value()?;
        let mut out = Vec::with_capacity(a.numel());
        for &v in a.iter() {
            let code = if v.is_finite() && v >= 0.0 {
                char::from_u32(v.round() as u32)
            } else {
                None
            };
            match code {
                Some(c) => out.push(c),
                None => {
                    return Err(conversion_error(format!(
                        "invalid conversion from {v} to a character code"
                    )))
                }
            }
        }
        Ok(DenseArray::from_vec(out, a.dims().clone())?)
    }

    pub fn int_array_value(&self, class: IntClass) -> Result<IntArray> {
        match self {
            Value::IntMatrix(a) => a.cast(class),
            Value::Int(s) => s.to_array().cast(class),
            other if other.is_complex() => Err(invalid_conversion(other, &format!("{class} matrix"))),
            other => IntArray::from_f64(class, &other.array_value()?),
        }
    }

    pub fn sparse_value(&self) -> Result<SparseArray<f64>> {
        match self {
            Value::Sparse(s) => Ok(s.clone()),
            Value::SparseBool(s) => Ok(s.map_nonzeros(|&b| bool_to_f64(b))?),
            other if other.is_complex() => Err(invalid_conversion(other, "sparse matrix")),
            other => Ok(SparseArray::from_dense(&other.array_value()?)?),
        }
    }

    pub fn sparse_complex_value(&self) -> Result<SparseArray<Complex64>> {
        match self {
            Value::SparseComplex(s) => Ok(s.clone()),
            Value::Sparse(s) => Ok(s.map_nonzeros(|&v| Complex64::new(v, 0.0))?),
            other if other.is_complex() => {
                Ok(SparseArray::from_dense(&other.complex_array_value()?)?)
            }
            other => Ok(other.sparse_value()?.map_nonzeros(|&v| Complex64::new(v, 0.0))?),
        }
    }

    pub fn sparse_bool_value(&self) -> Result<SparseArray<bool>> {
        match self {
            Value::SparseBool(s) => Ok(s.clone()),
            other if other.is_complex() => Err(invalid_conversion(other, "sparse bool matrix")),
            other => {
                let s = other.sparse_value()?;
                if s.data().iter().any(|v| v.is_nan()) {
                    return Err(nan_to_logical());
                }
                Ok(s.map_nonzeros(|&v| v != 0.0)?)
            }
        }
    }

    pub fn cell_value(&self) -> Result<DenseArray<Value>> {
        match self {
            Value::Cell(c) => Ok(c.clone()),
            other => Err(invalid_conversion(other, "cell array")),
        }
    }

    pub fn struct_value(&self) -> Result<&StructValue> {
        match self {
            Value::Struct(s) => Ok(s),
            other => Err(invalid_conversion(other, "struct")),
        }
    }

    /// First element as a real double.
    pub fn scalar_value(&self) -> Result<f64> {
        match self {
            Value::Double(x) => Ok(*x),
            Value::Single(x) => Ok(f64::from(*x)),
            Value::Int(s) => Ok(s.to_f64()),
            Value::Bool(b) => Ok(bool_to_f64(*b)),
            Value::Range(r) if !r.is_empty() => Ok(r.elem(0)),
            other => {
                let a = other.array_value()?;
                if a.is_empty() {
                    return Err(conversion_error(
                        "invalid conversion from empty value to real scalar",
                    ));
                }
                Ok(*a.elem(0))
            }
        }
    }

    pub fn complex_value(&self) -> Result<Complex64> {
        let a = self.complex_array_value()?;
        if a.is_empty() {
            return Err(conversion_error(
                "invalid conversion from empty value to complex scalar",
            ));
        }
        Ok(*a.elem(0))
    }

    /// Text of a character row vector.
    pub fn string_value(&self) -> Result<String> {
        match self {
            Value::Char(a) if a.rows() <= 1 && a.ndims() == 2 => Ok(a.iter().collect()),
            other => Err(invalid_conversion(other, "string")),
        }
    }

    /// Truth of a condition: every element nonzero, and false when empty.
    pub fn is_true(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Double(x) if x.is_nan() => Err(nan_to_logical()),
            Value::Double(x) => Ok(*x != 0.0),
            Value::Int(s) => Ok(s.wide() != 0),
            Value::IntMatrix(a) => Ok(a.numel() > 0 && a.all_nonzero()),
            Value::BoolMatrix(a) => Ok(a.numel() > 0 && a.iter().all(|&b| b)),
            Value::Range(r) => Ok(!r.is_empty() && r.nnz() == r.numel()),
            Value::SparseBool(s) => Ok(s.numel() > 0 && s.nnz() == s.numel()),
            Value::Undefined | Value::MagicColon | Value::Cell(_) | Value::Struct(_) => Err(
                conversion_error(format!("wrong type argument '{}'", self.type_name())),
            ),
            other if other.is_complex() => {
                let a = other.complex_array_value()?;
                if a.iter().any(|z| z.re.is_nan() || z.im.is_nan()) {
                    return Err(nan_to_logical());
                }
                Ok(a.numel() > 0 && a.iter().all(|z| z.re != 0.0 || z.im != 0.0))
            }
            other => {
                let a = other.array_value()?;
                if a.any_nan() {
                    return Err(nan_to_logical());
                }
                Ok(a.numel() > 0 && a.iter().all(|&v| v != 0.0))
            }
        }
    }

    /// Convert to the named class (`"double"`, `"single"`, `"int8"`, ...,
    /// `"logical"`, `"char"`), narrowing the result.
    pub fn convert_to_class(&self, name: &str) -> Result<Value> {
        if self.class_name() == name {
            return Ok(self.clone());
        }
        let converted = match name {
            "double" if self.is_sparse() => self.convert_to_kind(Kind::Sparse)?,
            "double" if self.is_complex() => self.convert_to_kind(Kind::ComplexMatrix)?,
            "double" => self.convert_to_kind(Kind::DoubleMatrix)?,
            "single" if self.is_complex() => self.convert_to_kind(Kind::FloatComplexMatrix)?,
            "single" => self.convert_to_kind(Kind::SingleMatrix)?,
            "logical" if self.is_sparse() => self.convert_to_kind(Kind::SparseBool)?,
            "logical" => self.convert_to_kind(Kind::BoolMatrix)?,
            "char" => self.convert_to_kind(Kind::Char)?,
            other => match IntClass::from_name(other) {
                Some(class) => self.convert_to_kind(Kind::IntMatrix(class))?,
                None => return Err(invalid_conversion(self, other)),
            },
        };
        Ok(converted.maybe_mutate())
    }

    /// Re-express the value as exactly `kind`, without narrowing.
    pub fn convert_to_kind(&self, kind: Kind) -> Result<Value> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        Ok(match kind {
            Kind::Double => Value::Double(self.single_element(kind)?.scalar_value()?),
            Kind::Bool => Value::Bool(*self.single_element(kind)?.bool_array_value()?.elem(0)),
            Kind::DoubleMatrix => Value::DoubleMatrix(self.array_value()?),
            Kind::SingleMatrix => Value::SingleMatrix(self.float_array_value()?),
            Kind::ComplexMatrix => Value::ComplexMatrix(self.complex_array_value()?),
            Kind::FloatComplexMatrix => {
                Value::FloatComplexMatrix(self.float_complex_array_value()?)
            }
            Kind::IntMatrix(class) => Value::IntMatrix(self.int_array_value(class)?),
            Kind::BoolMatrix => Value::BoolMatrix(self.bool_array_value()?),
            Kind::Char => Value::Char(self.char_array_value()?),
            Kind::Sparse => Value::Sparse(self.sparse_value()?),
            Kind::SparseComplex => Value::SparseComplex(self.sparse_complex_value()?),
            Kind::SparseBool => Value::SparseBool(self.sparse_bool_value()?),
            Kind::Cell if self.is_empty() => {
                Value::Cell(DenseArray::from_vec(Vec::new(), self.dims())?)
            }
            Kind::Struct if self.is_empty() => Value::from(StructValue::new()),
            other => return Err(invalid_conversion(self, &other.type_name())),
        })
    }

    fn single_element(&self, kind: Kind) -> Result<&Value> {
        if self.numel() != 1 {
            return Err(invalid_conversion(self, &kind.type_name()));
        }
        Ok(self)
    }

    /// Interpret the value as a subscript: 1-based numbers, logical masks,
    /// ranges and `:`.
    pub fn index_vector(&self) -> Result<IndexVector> {
        match self {
            Value::MagicColon => Ok(IndexVector::colon()),
            Value::Null => Ok(IndexVector::with_dims(Vec::new(), DimVector::empty())?),
            Value::Double(x) => one_based_scalar(*x),
            Value::Int(s) => one_based_scalar(s.to_f64()),
            Value::Single(x) => one_based_scalar(f64::from(*x)),
            Value::Bool(b) => Ok(IndexVector::from_mask(&[*b], &DimVector::scalar())),
            Value::BoolMatrix(m) => Ok(IndexVector::from_mask(m.as_slice(), m.dims())),
            Value::SparseBool(s) => {
                let m = s.to_dense();
                Ok(IndexVector::from_mask(m.as_slice(), m.dims()))
            }
            Value::Range(r) => {
                if engine_config().allow_noninteger_range_index && !r.all_elements_are_ints() {
                    let truncated: Vec<f64> = r.to_array().iter().map(|v| v.trunc()).collect();
                    Ok(IndexVector::from_one_based(&truncated, r.dims())?)
                } else {
                    Ok(IndexVector::from_one_based_range(
                        r.base(),
                        r.increment(),
                        r.numel(),
                    )?)
                }
            }
            Value::Complex(_)
            | Value::ComplexMatrix(_)
            | Value::FloatComplex(_)
            | Value::FloatComplexMatrix(_)
            | Value::SparseComplex(_) => Err(bad_index(
                "subscript indices must be either positive integers or logicals; complex values are not allowed",
            )),
            Value::Undefined | Value::Cell(_) | Value::Struct(_) => Err(bad_index(format!(
                "{} cannot be used as a subscript",
                self.type_name()
            ))),
            other => {
                let a = other.array_value()?;
                Ok(IndexVector::from_one_based(a.as_slice(), a.dims().clone())?)
            }
        }
    }
}

fn one_based_scalar(x: f64) -> Result<IndexVector> {
    if x.is_finite() && x >= 1.0 && x.fract() == 0.0 {
        return Ok(IndexVector::scalar(x as usize - 1));
    }
    Ok(IndexVector::from_one_based(&[x], DimVector::scalar())?)
}

fn widen_complex(z: Complex32) -> Complex64 {
    Complex64::new(f64::from(z.re), f64::from(z.im))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_conversion_rejects_nan() {
        let v = Value::row(vec![1.0, f64::NAN]);
        let err = v.bool_array_value().expect_err("NaN");
        assert_eq!(err.to_string(), "invalid conversion from NaN to logical value");
        assert!(v.is_true().is_err());
    }

    #[test]
    fn truth_of_empty_and_partial() {
        assert!(!Value::default().is_true().expect("empty"));
        assert!(!Value::row(vec![1.0, 0.0]).is_true().expect("real"));
        assert!(Value::row(vec![1.0, 2.0]).is_true().expect("real"));
    }

    #[test]
    fn class_conversion_saturates_integers() {
        let v = Value::row(vec![-1.5, 300.0]).convert_to_class("uint8").expect("uint8");
        assert_eq!(v, Value::from(DenseArray::row(vec![0u8, 255])));
        let c = Value::row(vec![72.0, 105.0]).convert_to_class("char").expect("char");
        assert_eq!(c.string_value().expect("row"), "Hi");
        assert!(Value::row(vec![1.0]).convert_to_class("quaternion").is_err());
    }

    #[test]
    fn subscripts_from_values() {
        assert_eq!(Value::from(3.0).index_vector().expect("scalar"), IndexVector::scalar(2));
        let err = Value::from(0.0).index_vector().expect_err("zero");
        assert!(err.to_string().starts_with("index (0)"));
        let mask = Value::BoolMatrix(DenseArray::row(vec![false, true, true]));
        let iv = mask.index_vector().expect("mask");
        assert_eq!(iv.to_vec(3), vec![1, 2]);
        assert!(Value::Complex(Complex64::new(1.0, 1.0)).index_vector().is_err());
    }

    #[test]
    fn complex_does_not_silently_become_real() {
        let z = Value::Complex(Complex64::new(1.0, 2.0));
        assert!(z.array_value().is_err());
        assert_eq!(z.complex_value().expect("complex"), Complex64::new(1.0, 2.0));
    }
}
