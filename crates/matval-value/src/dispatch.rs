//! Operator dispatch.
//!
//! A [`DispatchTable`] maps operator and operand kinds to the function that
//! implements them, plus the concatenation, assignment and widening tables.
//! The table is built once by [`initialize_dispatch`] and is read-only
//! afterwards; registration is data driven from the family modules under
//! `ops`.

use std::borrow::Cow;
use std::collections::HashMap;

use log::debug;
use once_cell::sync::OnceCell;

use crate::error::{binary_undefined, cat_undefined, conversion_error, unary_undefined, Result};
use crate::kind::{IntClass, Kind};
use crate::ops::arith::{float_binary, float_unary};
use crate::ops::assign::{assign_rule, widen_container};
use crate::ops::concat::cat_rule;
use crate::ops::int::{int_binary, int_pair_supports, int_unary};
use crate::ops::range::{range_binary, range_unary};
use crate::ops::sparse::{sparse_binary, sparse_bool_unary, sparse_unary};
use crate::ops::{container_unary, BinaryOp, UnaryOp};
use crate::value::Value;

pub type UnaryFn = fn(UnaryOp, &Value) -> Result<Value>;
pub type BinaryFn = fn(BinaryOp, &Value, &Value) -> Result<Value>;
pub type CatFn = fn(&Value, &Value, usize) -> Result<Value>;
pub type ConversionFn = fn(&Value) -> Result<Value>;
pub type WideningFn = fn(&Value, Kind) -> Result<Value>;

/// Number of entries per table, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchCounts {
    pub unary: usize,
    pub binary: usize,
    pub cat: usize,
    pub assign: usize,
    pub widening: usize,
    pub conversions: usize,
}

#[derive(Default)]
pub struct DispatchTable {
    unary: HashMap<(UnaryOp, Kind), UnaryFn>,
    binary: HashMap<(BinaryOp, Kind, Kind), BinaryFn>,
    cat: HashMap<(Kind, Kind), CatFn>,
    assign: HashMap<(Kind, Kind), Kind>,
    widening: HashMap<(Kind, Kind), WideningFn>,
    conversions: HashMap<Kind, (Kind, ConversionFn)>,
}

impl DispatchTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table with every operator family installed.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.install_float();
        table.install_int();
        table.install_sparse();
        table.install_range();
        table.install_containers();
        table.install_cat();
        table.install_assign();
        table.install_conversions();
        table
    }

    pub fn register_unary(&mut self, op: UnaryOp, kind: Kind, f: UnaryFn) {
        self.unary.insert((op, kind), f);
    }

    pub fn register_binary(&mut self, op: BinaryOp, a: Kind, b: Kind, f: BinaryFn) {
        self.binary.insert((op, a, b), f);
    }

    /// Register `f` for every operator on the pair `(a, b)` and `(b, a)`.
    fn register_pair(&mut self, a: Kind, b: Kind, f: BinaryFn) {
        for op in BinaryOp::ALL {
            self.register_binary(op, a, b, f);
            self.register_binary(op, b, a, f);
        }
    }

    pub fn register_cat(&mut self, a: Kind, b: Kind, f: CatFn) {
        self.cat.insert((a, b), f);
    }

    pub fn register_assign(&mut self, lhs: Kind, rhs: Kind, result: Kind) {
        self.assign.insert((lhs, rhs), result);
    }

    pub fn register_widening(&mut self, from: Kind, to: Kind, f: WideningFn) {
        self.widening.insert((from, to), f);
    }

    pub fn register_conversion(&mut self, from: Kind, to: Kind, f: ConversionFn) {
        self.conversions.insert(from, (to, f));
    }

    fn install_float(&mut self) {
        for a in Kind::FLOAT {
            for b in Kind::FLOAT {
                for op in BinaryOp::ALL {
                    self.register_binary(op, a, b, float_binary);
                }
            }
            for op in UnaryOp::CONST {
                self.register_unary(op, a, float_unary);
            }
        }
    }

    fn install_int(&mut self) {
        let partners = [
            Kind::Double,
            Kind::DoubleMatrix,
            Kind::Single,
            Kind::SingleMatrix,
            Kind::Bool,
            Kind::BoolMatrix,
            Kind::Char,
        ];
        let int_kinds: Vec<Kind> = IntClass::ALL
            .into_iter()
            .flat_map(|c| [Kind::IntScalar(c), Kind::IntMatrix(c)])
            .collect();
        for &a in &int_kinds {
            for &b in &int_kinds {
                for op in BinaryOp::ALL {
                    if int_pair_supports(op, a.int_class(), b.int_class()) {
                        self.register_binary(op, a, b, int_binary);
                    }
                }
            }
            for p in partners {
                self.register_pair(a, p, int_binary);
            }
            for op in UnaryOp::CONST {
                self.register_unary(op, a, int_unary);
            }
        }
    }

    fn install_sparse(&mut self) {
        let sparse = [Kind::Sparse, Kind::SparseComplex];
        let partners = [
            Kind::Double,
            Kind::DoubleMatrix,
            Kind::Complex,
            Kind::ComplexMatrix,
            Kind::Sparse,
            Kind::SparseComplex,
        ];
        for s in sparse {
            for p in partners {
                self.register_pair(s, p, sparse_binary);
            }
            for op in UnaryOp::CONST {
                self.register_unary(op, s, sparse_unary);
            }
        }
        for op in UnaryOp::CONST {
            self.register_unary(op, Kind::SparseBool, sparse_bool_unary);
        }
    }

    fn install_range(&mut self) {
        self.register_pair(Kind::Range, Kind::Double, range_binary);
        for op in [UnaryOp::UPlus, UnaryOp::UMinus] {
            self.register_unary(op, Kind::Range, range_unary);
        }
    }

    fn install_containers(&mut self) {
        for kind in [Kind::Bool, Kind::BoolMatrix, Kind::Char, Kind::Cell, Kind::Struct] {
            self.register_unary(UnaryOp::Transpose, kind, container_unary);
            self.register_unary(UnaryOp::Hermitian, kind, container_unary);
        }
        self.register_unary(UnaryOp::Not, Kind::Bool, container_unary);
        self.register_unary(UnaryOp::Not, Kind::BoolMatrix, container_unary);
    }

    fn install_cat(&mut self) {
        let kinds = Kind::all();
        for &a in &kinds {
            for &b in &kinds {
                if let Some(f) = cat_rule(a, b) {
                    self.register_cat(a, b, f);
                }
            }
        }
    }

    fn install_assign(&mut self) {
        let kinds = Kind::all();
        for &lhs in &kinds {
            for &rhs in &kinds {
                let Some(result) = assign_rule(lhs, rhs) else {
                    continue;
                };
                self.register_assign(lhs, rhs, result);
                if result != lhs && lhs != Kind::Undefined {
                    self.register_widening(lhs, result, widen_container);
                }
            }
        }
    }

    fn install_conversions(&mut self) {
        self.register_conversion(Kind::Bool, Kind::Double, |v| v.convert_to_kind(Kind::Double));
        self.register_conversion(Kind::BoolMatrix, Kind::DoubleMatrix, |v| {
            v.convert_to_kind(Kind::DoubleMatrix)
        });
        self.register_conversion(Kind::Char, Kind::DoubleMatrix, |v| {
            v.convert_to_kind(Kind::DoubleMatrix)
        });
        self.register_conversion(Kind::Range, Kind::DoubleMatrix, |v| {
            v.convert_to_kind(Kind::DoubleMatrix)
        });
        self.register_conversion(Kind::Null, Kind::DoubleMatrix, |v| {
            v.convert_to_kind(Kind::DoubleMatrix)
        });
        self.register_conversion(Kind::SparseBool, Kind::Sparse, |v| v.convert_to_kind(Kind::Sparse));
    }

    pub fn lookup_binary(&self, op: BinaryOp, a: Kind, b: Kind) -> Option<BinaryFn> {
        self.binary.get(&(op, a, b)).copied()
    }

    pub fn lookup_unary(&self, op: UnaryOp, kind: Kind) -> Option<UnaryFn> {
        self.unary.get(&(op, kind)).copied()
    }

    /// The kind `kind` converts to when no entry matches it directly.
    pub fn conversion_target(&self, kind: Kind) -> Option<Kind> {
        self.conversions.get(&kind).map(|(to, _)| *to)
    }

    /// The entry `op` resolves to for the pair, after at most one widening
    /// step, together with the conversions to apply first.
    fn resolve_binary(
        &self,
        op: BinaryOp,
        a: Kind,
        b: Kind,
    ) -> Option<(BinaryFn, Option<ConversionFn>, Option<ConversionFn>)> {
        if let Some(f) = self.lookup_binary(op, a, b) {
            return Some((f, None, None));
        }
        let ca = self.conversions.get(&a).copied();
        let cb = self.conversions.get(&b).copied();
        // right operand first, then left, then both
        let candidates = [(None, cb), (ca, None), (ca, cb)];
        candidates
            .into_iter()
            .filter(|(conv_a, conv_b)| conv_a.is_some() || conv_b.is_some())
            .find_map(|(conv_a, conv_b)| {
                let ka = conv_a.map_or(a, |(k, _)| k);
                let kb = conv_b.map_or(b, |(k, _)| k);
                self.lookup_binary(op, ka, kb)
                    .map(|f| (f, conv_a.map(|(_, c)| c), conv_b.map(|(_, c)| c)))
            })
    }

    /// True when `op` is defined for the pair, directly or after widening.
    pub fn resolves(&self, op: BinaryOp, a: Kind, b: Kind) -> bool {
        self.resolve_binary(op, a, b).is_some()
    }

    /// `a op b`
    pub fn binary_op(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
        let (ka, kb) = (a.kind(), b.kind());
        let Some((f, conv_a, conv_b)) = self.resolve_binary(op, ka, kb) else {
            return Err(binary_undefined(op.symbol(), &a.type_name(), &b.type_name()));
        };
        if conv_a.is_some() || conv_b.is_some() {
            debug!("binary {op}: widening '{ka}' by '{kb}' before dispatch");
        }
        let a = match conv_a {
            Some(c) => Cow::Owned(c(a)?),
            None => Cow::Borrowed(a),
        };
        let b = match conv_b {
            Some(c) => Cow::Owned(c(b)?),
            None => Cow::Borrowed(b),
        };
        f(op, &a, &b)
    }

    /// `op a`, with one conversion retry.
    pub fn unary_op(&self, op: UnaryOp, a: &Value) -> Result<Value> {
        let kind = a.kind();
        if let Some(f) = self.lookup_unary(op, kind) {
            return f(op, a);
        }
        if let Some((to, convert)) = self.conversions.get(&kind).copied() {
            if let Some(f) = self.lookup_unary(op, to) {
                debug!("unary {op}: widening '{kind}' to '{to}' before dispatch");
                return f(op, &convert(a)?);
            }
        }
        Err(unary_undefined(op.symbol(), &a.type_name()))
    }

    /// One pairwise step of `[a, b]` along `dim`.
    pub fn cat(&self, a: &Value, b: &Value, dim: usize) -> Result<Value> {
        match self.cat.get(&(a.kind(), b.kind())) {
            Some(f) => f(a, b, dim),
            None => Err(cat_undefined(&a.type_name(), &b.type_name())),
        }
    }

    /// Container kind after assigning a `rhs`-kinded value into a
    /// `lhs`-kinded container.
    pub fn assign_kind(&self, lhs: Kind, rhs: Kind) -> Option<Kind> {
        self.assign.get(&(lhs, rhs)).copied()
    }

    /// Convert a container to the wider kind an assignment needs.
    pub fn widen(&self, v: &Value, to: Kind) -> Result<Value> {
        match self.widening.get(&(v.kind(), to)) {
            Some(f) => f(v, to),
            None => Err(conversion_error(format!(
                "no widening from {} to {}",
                v.type_name(),
                to.type_name()
            ))),
        }
    }

    pub fn counts(&self) -> DispatchCounts {
        DispatchCounts {
            unary: self.unary.len(),
            binary: self.binary.len(),
            cat: self.cat.len(),
            assign: self.assign.len(),
            widening: self.widening.len(),
            conversions: self.conversions.len(),
        }
    }
}

static DISPATCH: OnceCell<DispatchTable> = OnceCell::new();

/// Build the process-wide dispatch table. Later calls return the table
/// built by the first one.
pub fn initialize_dispatch() -> &'static DispatchTable {
    DISPATCH.get_or_init(|| {
        let table = DispatchTable::standard();
        let counts = table.counts();
        debug!(
            "dispatch initialized: {} binary, {} unary, {} cat, {} assign, {} widening, {} conversions",
            counts.binary, counts.unary, counts.cat, counts.assign, counts.widening, counts.conversions
        );
        table
    })
}

pub(crate) fn dispatch_table() -> &'static DispatchTable {
    initialize_dispatch()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_is_idempotent() {
        let first = initialize_dispatch() as *const DispatchTable;
        let second = initialize_dispatch() as *const DispatchTable;
        assert_eq!(first, second);
        let counts = initialize_dispatch().counts();
        assert!(counts.binary > 0 && counts.cat > 0 && counts.assign > 0);
        assert_eq!(counts.conversions, 6);
    }

    #[test]
    fn bool_pairs_widen_once() {
        let table = initialize_dispatch();
        assert!(table.lookup_binary(BinaryOp::Add, Kind::Bool, Kind::Bool).is_none());
        assert!(table.resolves(BinaryOp::Add, Kind::Bool, Kind::Bool));
        let v = table
            .binary_op(BinaryOp::Add, &Value::Bool(true), &Value::Bool(true))
            .expect("true + true");
        assert_eq!(v, Value::from(2.0));
    }

    #[test]
    fn right_operand_converts_first() {
        let table = initialize_dispatch();
        let v = table
            .binary_op(BinaryOp::Mul, &Value::from(2.0), &Value::str("a"))
            .expect("2 * 'a'");
        assert_eq!(v, Value::from(194.0));
    }

    #[test]
    fn unknown_pairs_name_both_kinds() {
        let table = initialize_dispatch();
        let err = table
            .binary_op(BinaryOp::Add, &Value::from(1.0), &Value::cell(vec![], [0, 0]).expect("cell"))
            .expect_err("1 + {}");
        assert_eq!(
            err.to_string(),
            "binary operator '+' not implemented for 'scalar' by 'cell' operations"
        );
        let err = table.unary_op(UnaryOp::UMinus, &Value::cell(vec![], [0, 0]).expect("cell"));
        assert!(err.is_err());
    }

    #[test]
    fn unary_conversion_retry() {
        let table = initialize_dispatch();
        assert_eq!(
            table.unary_op(UnaryOp::UMinus, &Value::Bool(true)).expect("-true"),
            Value::from(-1.0)
        );
        let t = table.unary_op(UnaryOp::Transpose, &Value::str("ab")).expect("'ab'.'");
        assert_eq!(t.kind(), Kind::Char);
        assert_eq!(t.dims().as_slice(), &[2, 1]);
    }
}
