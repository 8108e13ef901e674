use std::error::Error as StdError;
use std::fmt;

use matval_array::ArrayError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Category of a value-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DimensionMismatch,
    IndexOutOfRange,
    BadIndex,
    UnsupportedOperation,
    InvalidResize,
    InvalidDeletion,
    CapacityExhausted,
    InvalidArgument,
    InvalidConversion,
    Interrupted,
}

impl ErrorKind {
    pub fn default_identifier(self) -> &'static str {
        match self {
            ErrorKind::DimensionMismatch => "MatVal:nonconformant",
            ErrorKind::IndexOutOfRange => "MatVal:index-out-of-bounds",
            ErrorKind::BadIndex => "MatVal:bad-index",
            ErrorKind::UnsupportedOperation => "MatVal:undefined-operation",
            ErrorKind::InvalidResize => "MatVal:invalid-resize",
            ErrorKind::InvalidDeletion => "MatVal:invalid-deletion",
            ErrorKind::CapacityExhausted => "MatVal:sparse-filled",
            ErrorKind::InvalidArgument => "MatVal:invalid-input",
            ErrorKind::InvalidConversion => "MatVal:invalid-conversion",
            ErrorKind::Interrupted => "MatVal:interrupted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DimensionMismatch => "dimension mismatch",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::BadIndex => "bad index",
            ErrorKind::UnsupportedOperation => "unsupported operation",
            ErrorKind::InvalidResize => "invalid resize",
            ErrorKind::InvalidDeletion => "invalid deletion",
            ErrorKind::CapacityExhausted => "capacity exhausted",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidConversion => "invalid conversion",
            ErrorKind::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, miette::Diagnostic)]
#[error("{message}")]
#[diagnostic(code(matval::value::error))]
pub struct RuntimeError {
    pub message: String,
    pub kind: ErrorKind,
    pub identifier: Option<String>,
    /// Operator or entry point that raised the error, e.g. `"binary +"`.
    pub operation: Option<String>,
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            identifier: None,
            operation: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn identifier(&self) -> &str {
        self.identifier
            .as_deref()
            .unwrap_or_else(|| self.kind.default_identifier())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    pub fn is_interrupt(&self) -> bool {
        self.kind == ErrorKind::Interrupted
    }

    pub fn format_diagnostic(&self) -> String {
        let mut lines = vec![format!("error: {}", self.message), format!("id: {}", self.identifier())];
        if let Some(op) = self.operation.as_deref() {
            lines.push(format!("in: {op}"));
        }
        let mut cause = self.source.as_deref().map(|e| e as &(dyn StdError + 'static));
        while let Some(err) = cause {
            lines.push(format!("caused by: {err}"));
            cause = err.source();
        }
        lines.join("\n")
    }
}

impl From<ArrayError> for RuntimeError {
    fn from(err: ArrayError) -> Self {
        let kind = match &err {
            ArrayError::DimensionMismatch(_) => ErrorKind::DimensionMismatch,
            ArrayError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            ArrayError::BadIndex(_) => ErrorKind::BadIndex,
            ArrayError::InvalidResize(_) => ErrorKind::InvalidResize,
            ArrayError::InvalidDeletion(_) => ErrorKind::InvalidDeletion,
            ArrayError::CapacityExhausted { .. } => ErrorKind::CapacityExhausted,
            ArrayError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ArrayError::Interrupted => ErrorKind::Interrupted,
        };
        RuntimeError {
            message: err.to_string(),
            kind,
            identifier: Some(err.identifier().to_string()),
            operation: None,
            source: None,
        }
    }
}

pub struct RuntimeErrorBuilder {
    error: RuntimeError,
}

impl RuntimeErrorBuilder {
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.error.kind = kind;
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.error.identifier = Some(identifier.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.error.operation = Some(operation.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.error.source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> RuntimeError {
        self.error
    }
}

/// Start building an error; the kind defaults to `InvalidArgument`.
pub fn runtime_error(message: impl Into<String>) -> RuntimeErrorBuilder {
    RuntimeErrorBuilder {
        error: RuntimeError::new(ErrorKind::InvalidArgument, message),
    }
}

pub(crate) fn binary_undefined(op: &str, a: &str, b: &str) -> RuntimeError {
    runtime_error(format!(
        "binary operator '{op}' not implemented for '{a}' by '{b}' operations"
    ))
    .with_kind(ErrorKind::UnsupportedOperation)
    .with_operation(format!("binary {op}"))
    .build()
}

pub(crate) fn unary_undefined(op: &str, a: &str) -> RuntimeError {
    runtime_error(format!("unary operator '{op}' not implemented for '{a}' operations"))
        .with_kind(ErrorKind::UnsupportedOperation)
        .with_operation(format!("unary {op}"))
        .build()
}

pub(crate) fn cat_undefined(a: &str, b: &str) -> RuntimeError {
    runtime_error(format!(
        "concatenation operator not implemented for '{a}' by '{b}' operations"
    ))
    .with_kind(ErrorKind::UnsupportedOperation)
    .with_operation("concatenation")
    .build()
}

pub(crate) fn assign_undefined(a: &str, b: &str) -> RuntimeError {
    runtime_error(format!("operator = undefined for '{a}' by '{b}' operations"))
        .with_kind(ErrorKind::UnsupportedOperation)
        .with_operation("assignment")
        .build()
}

pub(crate) fn conversion_error(message: impl Into<String>) -> RuntimeError {
    runtime_error(message)
        .with_kind(ErrorKind::InvalidConversion)
        .build()
}

pub(crate) fn bad_index(message: impl Into<String>) -> RuntimeError {
    runtime_error(message).with_kind(ErrorKind::BadIndex).build()
}
