//! Save/load hooks.
//!
//! A value is captured as a [`SavedValue`] holding its type name, dims and
//! raw buffers. The stream decides how that record is encoded; this module
//! only produces and consumes the record.

use std::io;
use std::sync::Arc;

use log::{trace, warn};
use matval_array::{DenseArray, DimVector, Range};
use serde::{Deserialize, Serialize};

use crate::error::{conversion_error, Result};
use crate::interop::ForeignArray;
use crate::kind::Kind;
use crate::value::{StructValue, Value};

/// Bump when the layout of [`SavedValue`] changes.
pub const SAVED_VALUE_VERSION: u32 = 1;

/// Encoding a stream performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveFormat {
    Text,
    Binary,
    Hierarchical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SavedPayload {
    /// `[]`, which has no buffers.
    Null,
    Array(ForeignArray),
    Range {
        base: f64,
        increment: f64,
        final_value: f64,
        numel: usize,
    },
    /// Column-major cell elements.
    Cell(Vec<SavedValue>),
    /// Fields in insertion order.
    Struct(Vec<(String, SavedValue)>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedValue {
    pub type_name: String,
    pub dims: Vec<usize>,
    pub payload: SavedPayload,
    /// Optional to allow reading records written before versioning.
    #[serde(default)]
    pub version: Option<u32>,
}

pub trait SaveStream {
    fn format(&self) -> SaveFormat;
    fn write_value(&mut self, name: &str, value: &SavedValue) -> io::Result<()>;
}

pub trait LoadStream {
    fn format(&self) -> SaveFormat;
    /// Next record, or `None` at the end of the stream.
    fn read_value(&mut self) -> io::Result<Option<(String, SavedValue)>>;
}

impl SavedValue {
    pub fn capture(value: &Value) -> Result<Self> {
        let payload = match value {
            Value::Null => SavedPayload::Null,
            Value::Range(r) => SavedPayload::Range {
                base: r.base(),
                increment: r.increment(),
                final_value: r.final_value(),
                numel: r.numel(),
            },
            Value::Cell(c) => {
                SavedPayload::Cell(c.iter().map(Self::capture).collect::<Result<_>>()?)
            }
            Value::Struct(s) => SavedPayload::Struct(
                s.iter()
                    .map(|(name, v)| Ok((name.to_string(), Self::capture(v)?)))
                    .collect::<Result<_>>()?,
            ),
            other => SavedPayload::Array(other.as_foreign_array()?),
        };
        Ok(Self {
            type_name: value.type_name(),
            dims: value.dims().to_vec(),
            payload,
            version: Some(SAVED_VALUE_VERSION),
        })
    }

    /// Rebuild the value with the exact kind it was saved with.
    pub fn restore(&self) -> Result<Value> {
        if let Some(v) = self.version {
            if v > SAVED_VALUE_VERSION {
                return Err(conversion_error(format!(
                    "saved value has version {v}, newer than {SAVED_VALUE_VERSION}"
                )));
            }
        }
        let dims = DimVector::new(self.dims.iter().copied());
        let value = match &self.payload {
            SavedPayload::Null => Value::Null,
            SavedPayload::Array(fa) => Value::from_foreign_array(fa)?,
            SavedPayload::Range {
                base,
                increment,
                final_value,
                numel,
            } => Value::Range(Range::from_parts(*base, *increment, *final_value, *numel)?),
            SavedPayload::Cell(items) => Value::Cell(DenseArray::from_vec(
                items.iter().map(SavedValue::restore).collect::<Result<_>>()?,
                dims,
            )?),
            SavedPayload::Struct(fields) => {
                let mut s = StructValue::new();
                for (name, v) in fields {
                    s.set(name.clone(), v.restore()?);
                }
                Value::Struct(Arc::new(s))
            }
        };
        if value.type_name() == self.type_name {
            return Ok(value);
        }
        // narrowed on the way in; undo it
        match Kind::all().into_iter().find(|k| k.type_name() == self.type_name) {
            Some(kind) => value.convert_to_kind(kind),
            None => Err(conversion_error(format!(
                "saved value has unknown type '{}'",
                self.type_name
            ))),
        }
    }
}

impl Value {
    /// Hand the value to `stream` under `name`. Returns false when the value
    /// cannot be captured or the stream fails.
    pub fn save(&self, name: &str, stream: &mut dyn SaveStream) -> bool {
        let record = match SavedValue::capture(self) {
            Ok(r) => r,
            Err(e) => {
                warn!("save: cannot capture '{name}': {e}");
                return false;
            }
        };
        trace!("save: '{name}' as {} ({:?})", record.type_name, stream.format());
        match stream.write_value(name, &record) {
            Ok(()) => true,
            Err(e) => {
                warn!("save: writing '{name}' failed: {e}");
                false
            }
        }
    }

    /// Replace `self` with the next record of `stream`. On failure `self`
    /// is left as it was.
    pub fn load(&mut self, stream: &mut dyn LoadStream) -> bool {
        let (name, record) = match stream.read_value() {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                warn!("load: stream is exhausted");
                return false;
            }
            Err(e) => {
                warn!("load: reading failed: {e}");
                return false;
            }
        };
        match record.restore() {
            Ok(v) => {
                trace!("load: '{name}' as {} ({:?})", record.type_name, stream.format());
                *self = v;
                true
            }
            Err(e) => {
                warn!("load: cannot restore '{name}': {e}");
                false
            }
        }
    }
}
