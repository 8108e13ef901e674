//! Chained indexing: `a(i)`, `a{i}`, `a.name` and their assignment forms.

use std::mem;

use matval_array::{ArrayError, DenseArray, DimVector, IndexVector};

use super::{StructValue, Value};
use crate::error::{bad_index, runtime_error, ErrorKind, Result, RuntimeError};
use crate::int::{map_int_array, with_int_array};
use crate::kind::Kind;

/// One link of an index chain such as `a(1){2}.field`.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    Paren(Vec<Value>),
    Brace(Vec<Value>),
    Dot(String),
}

impl Subscript {
    fn symbol(&self) -> &'static str {
        match self {
            Subscript::Paren(_) => "(",
            Subscript::Brace(_) => "{",
            Subscript::Dot(_) => ".",
        }
    }
}

fn cannot_index(value: &Value, sub: &Subscript) -> RuntimeError {
    bad_index(format!(
        "{} cannot be indexed with {}",
        value.type_name(),
        sub.symbol()
    ))
}

pub(crate) fn index_vectors(idx: &[Value]) -> Result<Vec<IndexVector>> {
    idx.iter().map(Value::index_vector).collect()
}

/// Scalar structs accept only subscripts that select their single element.
pub(crate) fn check_struct_subscripts(ivs: &[IndexVector]) -> Result<()> {
    let n = ivs.len();
    for (k, iv) in ivs.iter().enumerate() {
        let ext = iv.extent(1);
        if ext > 1 {
            let position = if n > 1 { Some((k + 1, n)) } else { None };
            return Err(ArrayError::out_of_range(ext, 1, position, &DimVector::scalar()).into());
        }
        if iv.length(1) != 1 {
            return Err(runtime_error("struct arrays are not supported")
                .with_kind(ErrorKind::UnsupportedOperation)
                .build());
        }
    }
    Ok(())
}

impl Value {
    /// `a(i, j, ...)`
    pub fn index(&self, idx: &[Value]) -> Result<Value> {
        if idx.is_empty() {
            return Ok(self.clone());
        }
        let ivs = index_vectors(idx)?;
        let out = match self {
            Value::Double(x) => Value::DoubleMatrix(DenseArray::scalar(*x).index_nd(&ivs)?),
            Value::Single(x) => Value::SingleMatrix(DenseArray::scalar(*x).index_nd(&ivs)?),
            Value::Complex(z) => Value::ComplexMatrix(DenseArray::scalar(*z).index_nd(&ivs)?),
            Value::FloatComplex(z) => {
                Value::FloatComplexMatrix(DenseArray::scalar(*z).index_nd(&ivs)?)
            }
            Value::Bool(b) => Value::BoolMatrix(DenseArray::scalar(*b).index_nd(&ivs)?),
            Value::Int(s) => {
                Value::IntMatrix(map_int_array!(s.to_array(), a => a.index_nd(&ivs)?))
            }
            Value::Null => Value::DoubleMatrix(DenseArray::<f64>::empty().index_nd(&ivs)?),
            Value::DoubleMatrix(a) => Value::DoubleMatrix(a.index_nd(&ivs)?),
            Value::SingleMatrix(a) => Value::SingleMatrix(a.index_nd(&ivs)?),
            Value::ComplexMatrix(a) => Value::ComplexMatrix(a.index_nd(&ivs)?),
            Value::FloatComplexMatrix(a) => Value::FloatComplexMatrix(a.index_nd(&ivs)?),
            Value::IntMatrix(a) => Value::IntMatrix(map_int_array!(a, m => m.index_nd(&ivs)?)),
            Value::BoolMatrix(a) => Value::BoolMatrix(a.index_nd(&ivs)?),
            Value::Char(a) => Value::Char(a.index_nd(&ivs)?),
            Value::Range(r) => match ivs.as_slice() {
                [iv] => Value::DoubleMatrix(r.index(iv)?),
                _ => Value::DoubleMatrix(r.materialize().index_nd(&ivs)?),
            },
            Value::Sparse(s) => Value::Sparse(s.index_nd(&ivs)?),
            Value::SparseComplex(s) => Value::SparseComplex(s.index_nd(&ivs)?),
            Value::SparseBool(s) => Value::SparseBool(s.index_nd(&ivs)?),
            Value::Cell(c) => Value::Cell(c.index_nd(&ivs)?),
            Value::Struct(_) => {
                check_struct_subscripts(&ivs)?;
                self.clone()
            }
            Value::Undefined | Value::MagicColon => {
                return Err(cannot_index(self, &Subscript::Paren(idx.to_vec())))
            }
        };
        Ok(out.maybe_mutate())
    }

    /// Evaluate an index chain. Brace indexing of a cell yields a list with
    /// one value per selected element; any further link needs exactly one.
    pub fn subsref(&self, chain: &[Subscript]) -> Result<Vec<Value>> {
        let Some((first, rest)) = chain.split_first() else {
            return Ok(vec![self.clone()]);
        };
        let mut values = match (first, self) {
            (Subscript::Paren(idx), _) => vec![self.index(idx)?],
            (Subscript::Brace(idx), Value::Cell(c)) => {
                if idx.is_empty() {
                    c.to_vec()
                } else {
                    c.index_nd(&index_vectors(idx)?)?.into_vec()
                }
            }
            (Subscript::Dot(name), Value::Struct(s)) => match s.get(name) {
                Some(v) => vec![v.clone()],
                None => {
                    return Err(bad_index(format!("invalid use of undefined value: no field '{name}'")))
                }
            },
            (sub, other) => return Err(cannot_index(other, sub)),
        };
        if rest.is_empty() {
            return Ok(values);
        }
        if values.len() != 1 {
            return Err(bad_index("a cs-list cannot be further indexed"));
        }
        values.swap_remove(0).subsref(rest)
    }

    /// Assign through an index chain. An undefined or empty target becomes
    /// a cell for `{}` and a struct for `.`; on error the value is left as
    /// it was.
    pub fn subsasgn(&mut self, chain: &[Subscript], rhs: &Value) -> Result<()> {
        let Some((first, rest)) = chain.split_first() else {
            *self = rhs.storable_value();
            return Ok(());
        };
        match first {
            Subscript::Paren(idx) if rest.is_empty() => self.assign(idx, rhs),
            Subscript::Paren(idx) => {
                if matches!(self, Value::Struct(_) | Value::Undefined) {
                    check_struct_subscripts(&index_vectors(idx)?)?;
                    return self.subsasgn(rest, rhs);
                }
                let mut inner = self.index(idx)?;
                inner.subsasgn(rest, rhs)?;
                self.assign(idx, &inner)
            }
            Subscript::Brace(idx) => {
                if idx.is_empty() {
                    return Err(bad_index("{} assignment requires at least one subscript"));
                }
                let ivs = index_vectors(idx)?;
                let element = if rest.is_empty() {
                    rhs.storable_value()
                } else {
                    let mut current = match self.subsref(std::slice::from_ref(first)) {
                        Ok(mut v) if v.len() == 1 => v.swap_remove(0),
                        _ => Value::Undefined,
                    };
                    current.subsasgn(rest, rhs)?;
                    current
                };
                let mut cell = match self {
                    Value::Cell(c) => mem::take(c),
                    Value::Undefined => DenseArray::empty(),
                    ref other if other.is_empty() && !other.is_struct() => DenseArray::empty(),
                    ref other => return Err(cannot_index(other, first)),
                };
                // container mutators validate before writing, so `cell` is
                // intact when this fails
                match cell.assign_nd(&ivs, &DenseArray::scalar(element), &Value::default()) {
                    Ok(()) => {
                        *self = Value::Cell(cell);
                        Ok(())
                    }
                    Err(e) => {
                        if let Value::Cell(c) = self {
                            *c = cell;
                        }
                        Err(e.into())
                    }
                }
            }
            Subscript::Dot(name) => {
                let promote = match &*self {
                    Value::Undefined => true,
                    Value::Struct(_) => false,
                    other => other.is_empty() && !other.is_cell(),
                };
                if promote {
                    let mut fields = StructValue::new();
                    let mut inner = Value::Undefined;
                    inner.subsasgn(rest, rhs)?;
                    fields.set(name.clone(), inner);
                    *self = Value::from(fields);
                    return Ok(());
                }
                let Value::Struct(s) = self else {
                    return Err(cannot_index(self, first));
                };
                let mut inner = s.get(name).cloned().unwrap_or(Value::Undefined);
                inner.subsasgn(rest, rhs)?;
                std::sync::Arc::make_mut(s).set(name.clone(), inner);
                Ok(())
            }
        }
    }

    /// `a(idx) = []`
    pub fn delete_elements(&mut self, idx: &[Value]) -> Result<()> {
        let ivs = index_vectors(idx)?;
        let kind = self.kind();
        let widened = kind.is_scalar_kind() || matches!(kind, Kind::Range | Kind::Null);
        let mut target = if widened {
            self.convert_to_kind(kind.matrix_kind())?
        } else {
            mem::take(self)
        };
        let deleted = match &mut target {
            Value::DoubleMatrix(a) => a.delete_elements_nd(&ivs),
            Value::SingleMatrix(a) => a.delete_elements_nd(&ivs),
            Value::ComplexMatrix(a) => a.delete_elements_nd(&ivs),
            Value::FloatComplexMatrix(a) => a.delete_elements_nd(&ivs),
            Value::IntMatrix(a) => with_int_array!(a, m => m.delete_elements_nd(&ivs)),
            Value::BoolMatrix(a) => a.delete_elements_nd(&ivs),
            Value::Char(a) => a.delete_elements_nd(&ivs),
            Value::Sparse(s) => s.delete_elements_nd(&ivs),
            Value::SparseComplex(s) => s.delete_elements_nd(&ivs),
            Value::SparseBool(s) => s.delete_elements_nd(&ivs),
            Value::Cell(c) => c.delete_elements_nd(&ivs),
            other => Err(ArrayError::InvalidDeletion(format!(
                "a null assignment is not defined for {}",
                other.type_name()
            ))),
        };
        match deleted {
            Ok(()) => {
                *self = target.maybe_mutate();
                Ok(())
            }
            Err(e) => {
                if !widened {
                    *self = target;
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magic3() -> Value {
        Value::matrix(vec![8.0, 3.0, 4.0, 1.0, 5.0, 9.0, 6.0, 7.0, 2.0], 3, 3).expect("3x3")
    }

    #[test]
    fn paren_index_narrows_to_scalar() {
        let m = magic3();
        let v = m.index(&[Value::from(2.0), Value::from(3.0)]).expect("(2,3)");
        assert_eq!(v, Value::Double(7.0));
        let row = m.index(&[Value::from(1.0), Value::MagicColon]).expect("(1,:)");
        assert_eq!(row, Value::row(vec![8.0, 1.0, 6.0]));
    }

    #[test]
    fn out_of_range_reports_position() {
        let err = magic3()
            .index(&[Value::from(4.0), Value::from(1.0)])
            .expect_err("row 4");
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(err.to_string(), "index (4,_): out of bound 3 (dimensions are 3x3)");
    }

    #[test]
    fn brace_returns_cs_list() {
        let c = Value::cell(vec![Value::from(1.0), Value::str("two")], [1, 2]).expect("cell");
        let all = c.subsref(&[Subscript::Brace(vec![Value::MagicColon])]).expect("c{:}");
        assert_eq!(all.len(), 2);
        let err = c
            .subsref(&[Subscript::Brace(vec![Value::MagicColon]), Subscript::Paren(vec![Value::from(1.0)])])
            .expect_err("cs-list");
        assert_eq!(err.kind(), ErrorKind::BadIndex);
        let err = Value::from(1.0)
            .subsref(&[Subscript::Brace(vec![Value::from(1.0)])])
            .expect_err("double{1}");
        assert_eq!(err.to_string(), "scalar cannot be indexed with {");
    }

    #[test]
    fn chained_assignment_builds_containers() {
        let mut v = Value::Undefined;
        v.subsasgn(
            &[Subscript::Dot("data".into()), Subscript::Brace(vec![Value::from(2.0)])],
            &Value::from(5.0),
        )
        .expect("s.data{2} = 5");
        let got = v
            .subsref(&[Subscript::Dot("data".into()), Subscript::Brace(vec![Value::from(2.0)])])
            .expect("read back");
        assert_eq!(got, vec![Value::from(5.0)]);
        let cell = v.subsref(&[Subscript::Dot("data".into())]).expect("field");
        assert_eq!(cell[0].dims(), DimVector::matrix(1, 2));
    }

    #[test]
    fn failed_assignment_leaves_value_untouched() {
        let mut v = Value::from(3.0);
        let err = v
            .subsasgn(&[Subscript::Brace(vec![Value::from(1.0)])], &Value::from(1.0))
            .expect_err("scalar{1} = 1");
        assert_eq!(err.kind(), ErrorKind::BadIndex);
        assert_eq!(v, Value::from(3.0));
    }

    #[test]
    fn empty_values_become_containers_on_assignment() {
        let mut c = Value::default();
        c.subsasgn(&[Subscript::Brace(vec![Value::from(2.0)])], &Value::str("x"))
            .expect("c{2} = 'x'");
        assert_eq!(c.kind(), Kind::Cell);
        assert_eq!(c.numel(), 2);

        let mut s = Value::default();
        s.subsasgn(&[Subscript::Dot("gain".to_string())], &Value::from(4.0))
            .expect("s.gain = 4");
        assert!(s.is_struct());
        assert_eq!(
            s.subsref(&[Subscript::Dot("gain".to_string())]).expect("s.gain"),
            vec![Value::from(4.0)]
        );

        let mut cell = Value::cell(vec![Value::from(1.0)], [1, 1]).expect("cell");
        let err = cell
            .subsasgn(&[Subscript::Dot("f".to_string())], &Value::from(1.0))
            .expect_err("cell.f = 1");
        assert_eq!(err.kind(), ErrorKind::BadIndex);
    }

    #[test]
    fn failed_brace_assignment_keeps_cell_contents() {
        let items: Vec<Value> = (1..=4).map(|k| Value::from(f64::from(k))).collect();
        let mut c = Value::cell(items, [2, 2]).expect("2x2 cell");
        let before = c.clone();
        assert!(c
            .subsasgn(&[Subscript::Brace(vec![Value::from(7.0)])], &Value::from(0.0))
            .is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn deleting_columns() {
        let mut m = magic3();
        m.delete_elements(&[Value::MagicColon, Value::from(2.0)]).expect("(:,2) = []");
        assert_eq!(m, Value::matrix(vec![8.0, 3.0, 4.0, 6.0, 7.0, 2.0], 3, 2).expect("3x2"));
    }
}
