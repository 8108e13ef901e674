//! Flat, owned buffers for native callers.
//!
//! A [`ForeignArray`] never aliases the storage of the value it came from:
//! every plane is copied out, so the foreign side can neither observe nor
//! trigger a copy-on-write of a live container.

use matval_array::{DenseArray, DimVector, SparseArray};
use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};

use crate::error::{conversion_error, Result};
use crate::int::IntArray;
use crate::kind::{IntClass, Kind};
use crate::value::Value;

/// One plane of element data, column-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForeignPlane {
    F64(Vec<f64>),
    F32(Vec<f32>),
    /// Signed integer classes, widened.
    I64(Vec<i64>),
    /// Unsigned integer classes, widened.
    U64(Vec<u64>),
    Bool(Vec<bool>),
    Char(Vec<char>),
}

impl ForeignPlane {
    pub fn len(&self) -> usize {
        match self {
            ForeignPlane::F64(v) => v.len(),
            ForeignPlane::F32(v) => v.len(),
            ForeignPlane::I64(v) => v.len(),
            ForeignPlane::U64(v) => v.len(),
            ForeignPlane::Bool(v) => v.len(),
            ForeignPlane::Char(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// CSC index arrays of a sparse foreign array. The planes then hold the
/// stored entries only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignSparse {
    pub ridx: Vec<usize>,
    pub cidx: Vec<usize>,
}

impl ForeignSparse {
    fn of<T: matval_array::Element>(s: &SparseArray<T>) -> Self {
        let nnz = s.nnz();
        Self {
            ridx: s.ridx()[..nnz].to_vec(),
            cidx: s.cidx().to_vec(),
        }
    }
}

/// Class-tagged copy of a numeric, logical or char value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignArray {
    /// Class name: `"double"`, `"single"`, `"int8"`, ..., `"logical"`, `"char"`.
    pub class: String,
    pub dims: Vec<usize>,
    pub real: ForeignPlane,
    pub imag: Option<ForeignPlane>,
    pub sparse: Option<ForeignSparse>,
}

fn split<T: Copy, R>(values: &[T], re: impl Fn(T) -> R, im: impl Fn(T) -> R) -> (Vec<R>, Vec<R>) {
    values.iter().map(|&z| (re(z), im(z))).unzip()
}

fn int_plane(a: &IntArray) -> Result<ForeignPlane> {
    let wide = a.to_wide()?;
    Ok(if a.class().is_signed() {
        ForeignPlane::I64(wide.iter().map(|&v| v as i64).collect())
    } else {
        ForeignPlane::U64(wide.iter().map(|&v| v as u64).collect())
    })
}

impl Value {
    /// Deep copy into a foreign array. Cells, structs and the marker values
    /// have no flat representation.
    pub fn as_foreign_array(&self) -> Result<ForeignArray> {
        let kind = self.kind();
        let dims = self.dims().to_vec();
        let class = kind.class_name().to_string();
        let dense = |real: ForeignPlane, imag: Option<ForeignPlane>| ForeignArray {
            class: class.clone(),
            dims: dims.clone(),
            real,
            imag,
            sparse: None,
        };
        Ok(match self {
            Value::Sparse(s) => ForeignArray {
                sparse: Some(ForeignSparse::of(s)),
                ..dense(ForeignPlane::F64(s.data()[..s.nnz()].to_vec()), None)
            },
            Value::SparseComplex(s) => {
                let (re, im) = split(&s.data()[..s.nnz()], |z: Complex64| z.re, |z| z.im);
                ForeignArray {
                    sparse: Some(ForeignSparse::of(s)),
                    ..dense(ForeignPlane::F64(re), Some(ForeignPlane::F64(im)))
                }
            }
            Value::SparseBool(s) => ForeignArray {
                sparse: Some(ForeignSparse::of(s)),
                ..dense(ForeignPlane::Bool(s.data()[..s.nnz()].to_vec()), None)
            },
            v if kind.is_complex() && kind.is_single() => {
                let a = v.float_complex_array_value()?;
                let (re, im) = split(a.as_slice(), |z: Complex32| z.re, |z| z.im);
                dense(ForeignPlane::F32(re), Some(ForeignPlane::F32(im)))
            }
            v if kind.is_complex() => {
                let a = v.complex_array_value()?;
                let (re, im) = split(a.as_slice(), |z: Complex64| z.re, |z| z.im);
                dense(ForeignPlane::F64(re), Some(ForeignPlane::F64(im)))
            }
            v if kind.is_single() => dense(ForeignPlane::F32(v.float_array_value()?.as_slice().to_vec()), None),
            v if kind.int_class().is_some() => {
                let a = match v {
                    Value::Int(s) => s.to_array(),
                    Value::IntMatrix(a) => a.clone(),
                    _ => return Err(unrepresentable(v)),
                };
                dense(int_plane(&a)?, None)
            }
            v if kind.is_bool() => dense(ForeignPlane::Bool(v.bool_array_value()?.as_slice().to_vec()), None),
            Value::Char(a) => dense(ForeignPlane::Char(a.as_slice().to_vec()), None),
            v if matches!(kind, Kind::Double | Kind::DoubleMatrix | Kind::Range | Kind::Null) => {
                dense(ForeignPlane::F64(v.array_value()?.as_slice().to_vec()), None)
            }
            other => return Err(unrepresentable(other)),
        })
    }

    /// Rebuild a value from a foreign array, narrowing the result.
    pub fn from_foreign_array(fa: &ForeignArray) -> Result<Value> {
        let dims = DimVector::new(fa.dims.iter().copied());
        if dims.ndims() < 2 {
            return Err(conversion_error("foreign array: at least two dimensions are required"));
        }
        if let Some(imag) = &fa.imag {
            if imag.len() != fa.real.len() {
                return Err(conversion_error(format!(
                    "foreign array: real and imaginary planes differ in length ({} vs {})",
                    fa.real.len(),
                    imag.len()
                )));
            }
        }
        let value = match &fa.sparse {
            Some(sp) => sparse_from_foreign(fa, &dims, sp)?,
            None => {
                if fa.real.len() != dims.numel() {
                    return Err(conversion_error(format!(
                        "foreign array: {} elements do not fill a {} array",
                        fa.real.len(),
                        dims
                    )));
                }
                dense_from_foreign(fa, dims)?
            }
        };
        Ok(value.maybe_mutate())
    }
}

fn unrepresentable(v: &Value) -> crate::error::RuntimeError {
    conversion_error(format!("cannot convert {} to a foreign array", v.type_name()))
}

fn class_mismatch(fa: &ForeignArray) -> crate::error::RuntimeError {
    conversion_error(format!(
        "foreign array: class '{}' does not match its data planes",
        fa.class
    ))
}

fn join<T: Copy, C>(re: &[T], im: &[T], make: impl Fn(T, T) -> C) -> Vec<C> {
    re.iter().zip(im).map(|(&r, &i)| make(r, i)).collect()
}

fn dense_from_foreign(fa: &ForeignArray, dims: DimVector) -> Result<Value> {
    use ForeignPlane as P;
    Ok(match (fa.class.as_str(), &fa.real, &fa.imag) {
        ("double", P::F64(re), None) => Value::DoubleMatrix(DenseArray::from_vec(re.clone(), dims)?),
        ("double", P::F64(re), Some(P::F64(im))) => {
            Value::ComplexMatrix(DenseArray::from_vec(join(re, im, Complex64::new), dims)?)
        }
        ("single", P::F32(re), None) => Value::SingleMatrix(DenseArray::from_vec(re.clone(), dims)?),
        ("single", P::F32(re), Some(P::F32(im))) => {
            Value::FloatComplexMatrix(DenseArray::from_vec(join(re, im, Complex32::new), dims)?)
        }
        ("logical", P::Bool(b), None) => Value::BoolMatrix(DenseArray::from_vec(b.clone(), dims)?),
        ("char", P::Char(c), None) => Value::Char(DenseArray::from_vec(c.clone(), dims)?),
        (name, plane, None) => {
            let class = IntClass::from_name(name).ok_or_else(|| class_mismatch(fa))?;
            let wide: Vec<i128> = match plane {
                P::I64(v) if class.is_signed() => v.iter().map(|&x| x.into()).collect(),
                P::U64(v) if !class.is_signed() => v.iter().map(|&x| x.into()).collect(),
                _ => return Err(class_mismatch(fa)),
            };
            Value::IntMatrix(IntArray::from_wide(class, &DenseArray::from_vec(wide, dims)?)?)
        }
        _ => return Err(class_mismatch(fa)),
    })
}

fn sparse_from_foreign(fa: &ForeignArray, dims: &DimVector, sp: &ForeignSparse) -> Result<Value> {
    use ForeignPlane as P;
    if dims.ndims() != 2 {
        return Err(conversion_error("foreign array: sparse data must be two-dimensional"));
    }
    let (nr, nc) = (dims.rows(), dims.cols());
    let ridx = sp.ridx.clone();
    let cidx = sp.cidx.clone();
    Ok(match (fa.class.as_str(), &fa.real, &fa.imag) {
        ("double", P::F64(re), None) => {
            Value::Sparse(SparseArray::from_csc(nr, nc, re.clone(), ridx, cidx)?)
        }
        ("double", P::F64(re), Some(P::F64(im))) => Value::SparseComplex(SparseArray::from_csc(
            nr,
            nc,
            join(re, im, Complex64::new),
            ridx,
            cidx,
        )?),
        ("logical", P::Bool(b), None) => {
            Value::SparseBool(SparseArray::from_csc(nr, nc, b.clone(), ridx, cidx)?)
        }
        _ => return Err(class_mismatch(fa)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_copies_storage() {
        let v = Value::matrix(vec![1.0, 2.0, 3.0, 4.0], 2, 2).expect("2x2");
        let mut fa = v.as_foreign_array().expect("export");
        assert_eq!(fa.class, "double");
        assert_eq!(fa.dims, vec![2, 2]);
        if let ForeignPlane::F64(data) = &mut fa.real {
            data[0] = 99.0;
        }
        assert_eq!(v.array_value().expect("real").as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn complex_values_split_into_planes() {
        let v = Value::Complex(Complex64::new(1.0, -2.0));
        let fa = v.as_foreign_array().expect("export");
        assert_eq!(fa.real, ForeignPlane::F64(vec![1.0]));
        assert_eq!(fa.imag, Some(ForeignPlane::F64(vec![-2.0])));
        assert_eq!(Value::from_foreign_array(&fa).expect("import"), v);
    }

    #[test]
    fn integer_classes_keep_their_width() {
        let v = Value::from(DenseArray::row(vec![u64::MAX, 0, 7]));
        let fa = v.as_foreign_array().expect("export");
        assert_eq!(fa.class, "uint64");
        assert_eq!(fa.real, ForeignPlane::U64(vec![u64::MAX, 0, 7]));
        assert_eq!(Value::from_foreign_array(&fa).expect("import"), v);
    }

    #[test]
    fn sparse_export_carries_csc_arrays() {
        let d = DenseArray::from_vec(vec![0.0, 5.0, 0.0, 6.0], [2, 2]).expect("2x2");
        let v = Value::Sparse(SparseArray::from_dense(&d).expect("sparse"));
        let fa = v.as_foreign_array().expect("export");
        let sp = fa.sparse.as_ref().expect("csc");
        assert_eq!(sp.ridx, vec![1, 1]);
        assert_eq!(sp.cidx, vec![0, 1, 2]);
        assert_eq!(Value::from_foreign_array(&fa).expect("import"), v);
    }

    #[test]
    fn cells_and_bad_planes_are_rejected() {
        let c = Value::cell(vec![Value::from(1.0)], [1, 1]).expect("cell");
        assert!(c.as_foreign_array().is_err());
        let fa = ForeignArray {
            class: "int8".to_string(),
            dims: vec![1, 2],
            real: ForeignPlane::F64(vec![1.0, 2.0]),
            imag: None,
            sparse: None,
        };
        assert!(Value::from_foreign_array(&fa).is_err());
        let short = ForeignArray { class: "double".to_string(), ..fa };
        let short = ForeignArray { real: ForeignPlane::F64(vec![1.0]), ..short };
        assert!(Value::from_foreign_array(&short).is_err());
    }
}
