//! Polymorphic values for the matval runtime.
//!
//! [`Value`] wraps every container kind of `matval-array` behind one enum.
//! Operators resolve through a [`DispatchTable`] keyed by operand kinds,
//! which is built once by [`initialize_dispatch`]; every entry point that
//! needs it builds it on first use as well.

pub mod dispatch;
pub mod error;
pub mod int;
pub mod interop;
pub mod kernels;
pub mod kind;
pub mod ops;
pub mod persist;
pub mod value;

pub use dispatch::{
    initialize_dispatch, BinaryFn, CatFn, ConversionFn, DispatchCounts, DispatchTable, UnaryFn,
    WideningFn,
};
pub use error::{runtime_error, ErrorKind, Result, RuntimeError, RuntimeErrorBuilder};
pub use int::{IntArray, IntScalar};
pub use interop::{ForeignArray, ForeignPlane, ForeignSparse};
pub use kernels::{LinalgScalar, MatrixType};
pub use kind::{IntClass, Kind};
pub use ops::{BinaryOp, UnaryOp};
pub use persist::{LoadStream, SaveFormat, SaveStream, SavedPayload, SavedValue};
pub use value::{format_number, StructValue, Subscript, Value};

pub use matval_array;
