//! Operators and their per-family implementations.
//!
//! Each family module exposes one function per operator arity taking the
//! operator as a parameter; the dispatch table decides which family handles
//! which pair of kinds.

pub(crate) mod arith;
pub(crate) mod assign;
pub(crate) mod concat;
pub(crate) mod int;
pub(crate) mod range;
pub(crate) mod sparse;

use std::fmt;

use crate::dispatch::dispatch_table;
use crate::error::{unary_undefined, Result};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Ldiv,
    Pow,
    ElMul,
    ElDiv,
    ElLdiv,
    ElPow,
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
    And,
    Or,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 18] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Ldiv,
        BinaryOp::Pow,
        BinaryOp::ElMul,
        BinaryOp::ElDiv,
        BinaryOp::ElLdiv,
        BinaryOp::ElPow,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Ge,
        BinaryOp::Gt,
        BinaryOp::And,
        BinaryOp::Or,
    ];

    pub const COMPARISONS: [BinaryOp; 6] = [
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Ge,
        BinaryOp::Gt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Ldiv => "\\",
            BinaryOp::Pow => "^",
            BinaryOp::ElMul => ".*",
            BinaryOp::ElDiv => "./",
            BinaryOp::ElLdiv => ".\\",
            BinaryOp::ElPow => ".^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Ge => ">=",
            BinaryOp::Gt => ">",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
        }
    }

    pub fn is_comparison(self) -> bool {
        Self::COMPARISONS.contains(&self)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Linear-algebra operators whose meaning differs from the element-wise
    /// form unless a scalar is involved.
    pub fn is_matrix_op(self) -> bool {
        matches!(
            self,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Ldiv | BinaryOp::Pow
        )
    }

    /// The element-wise operator a matrix operator reduces to when one
    /// operand is a scalar.
    pub fn elementwise(self) -> BinaryOp {
        match self {
            BinaryOp::Mul => BinaryOp::ElMul,
            BinaryOp::Div => BinaryOp::ElDiv,
            BinaryOp::Ldiv => BinaryOp::ElLdiv,
            BinaryOp::Pow => BinaryOp::ElPow,
            other => other,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    UPlus,
    UMinus,
    Transpose,
    Hermitian,
    Incr,
    Decr,
}

impl UnaryOp {
    /// Operators that produce a new value rather than updating a variable.
    pub const CONST: [UnaryOp; 5] = [
        UnaryOp::Not,
        UnaryOp::UPlus,
        UnaryOp::UMinus,
        UnaryOp::Transpose,
        UnaryOp::Hermitian,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::UPlus => "+",
            UnaryOp::UMinus => "-",
            UnaryOp::Transpose => ".'",
            UnaryOp::Hermitian => "'",
            UnaryOp::Incr => "++",
            UnaryOp::Decr => "--",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Value {
    /// `a op b`
    pub fn binary_op(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
        dispatch_table().binary_op(op, a, b)
    }

    /// `op a`
    pub fn unary_op(op: UnaryOp, a: &Value) -> Result<Value> {
        dispatch_table().unary_op(op, a)
    }

    /// `a++` / `a--` and the other in-place unary updates.
    pub fn non_const_unary_op(&mut self, op: UnaryOp) -> Result<()> {
        let updated = match op {
            UnaryOp::Incr => Value::binary_op(BinaryOp::Add, self, &Value::Double(1.0))?,
            UnaryOp::Decr => Value::binary_op(BinaryOp::Sub, self, &Value::Double(1.0))?,
            other => Value::unary_op(other, self)?,
        };
        *self = updated;
        Ok(())
    }

    /// `a op= b`
    pub fn assign_op(&mut self, op: BinaryOp, rhs: &Value) -> Result<()> {
        let updated = Value::binary_op(op, self, rhs)?;
        *self = updated;
        Ok(())
    }

    /// `a(idx) op= b`
    pub fn assign_indexed_op(&mut self, idx: &[Value], op: BinaryOp, rhs: &Value) -> Result<()> {
        let current = self.index(idx)?;
        let updated = Value::binary_op(op, &current, rhs)?;
        self.assign(idx, &updated)
    }

    /// Concatenate along `dim` (zero-based) by folding pairwise through the
    /// concatenation table.
    pub fn concat(values: &[Value], dim: usize) -> Result<Value> {
        let table = dispatch_table();
        let Some((first, rest)) = values.split_first() else {
            return Ok(Value::default());
        };
        let mut acc = first.storable_value();
        for v in rest {
            acc = table.cat(&acc, v, dim)?;
        }
        Ok(acc.maybe_mutate())
    }

    /// `[a, b, ...]`
    pub fn hcat(values: &[Value]) -> Result<Value> {
        Value::concat(values, 1)
    }

    /// `[a; b; ...]`
    pub fn vcat(values: &[Value]) -> Result<Value> {
        Value::concat(values, 0)
    }
}

/// Transposition and negation for kinds whose element type is not numeric:
/// logicals, text, cells and structs. Other unary operators on these kinds
/// are reached through the table's conversions.
pub(crate) fn container_unary(op: UnaryOp, a: &Value) -> Result<Value> {
    let out = match (op, a) {
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOp::Not, Value::BoolMatrix(m)) => Value::BoolMatrix(m.map(|b| !b)?),
        (UnaryOp::Transpose | UnaryOp::Hermitian, v) => match v {
            Value::BoolMatrix(m) => Value::BoolMatrix(m.transpose()?),
            Value::Char(m) => Value::Char(m.transpose()?),
            Value::Cell(c) => Value::Cell(c.transpose()?),
            Value::Bool(_) | Value::Struct(_) => v.clone(),
            other => return Err(unary_undefined(op.symbol(), &other.type_name())),
        },
        (op, v) => return Err(unary_undefined(op.symbol(), &v.type_name())),
    };
    Ok(out.maybe_mutate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_ops_reduce_to_elementwise() {
        for op in BinaryOp::ALL {
            if op.is_matrix_op() {
                assert_ne!(op.elementwise(), op);
            } else {
                assert_eq!(op.elementwise(), op);
            }
        }
    }

    #[test]
    fn increment_updates_in_place() {
        let mut v = Value::from(41.0);
        v.non_const_unary_op(UnaryOp::Incr).expect("++");
        assert_eq!(v, Value::from(42.0));
        v.assign_op(BinaryOp::Mul, &Value::from(2.0)).expect("*=");
        assert_eq!(v, Value::from(84.0));
    }
}
