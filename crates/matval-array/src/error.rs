use thiserror::Error;

use crate::dims::DimVector;

pub type Result<T> = std::result::Result<T, ArrayError>;

/// Failures raised by the container layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrayError {
    #[error("{0}")]
    DimensionMismatch(String),

    #[error("{}", out_of_range_message(.index, .extent, .position, .dims))]
    IndexOutOfRange {
        /// Offending index, 1-based.
        index: usize,
        /// Valid extent along the indexed dimension.
        extent: usize,
        /// `(k, n)` when the k-th (1-based) of n subscripts overflowed;
        /// `None` for linear indexing.
        position: Option<(usize, usize)>,
        dims: DimVector,
    },

    #[error("{0}")]
    BadIndex(String),

    #[error("{0}")]
    InvalidResize(String),

    #[error("{0}")]
    InvalidDeletion(String),

    #[error("sparse matrix filled (nzmax = {nzmax})")]
    CapacityExhausted { nzmax: usize },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("interrupted")]
    Interrupted,
}

impl ArrayError {
    pub fn nonconformant(op: &str, a: &DimVector, b: &DimVector) -> Self {
        ArrayError::DimensionMismatch(format!(
            "operator {op}: nonconformant arguments (op1 is {a}, op2 is {b})"
        ))
    }

    /// The indexed target of `A(idx) = B` and the shape of `B` disagree.
    pub fn nonconformant_assign(lhs: &DimVector, rhs: &DimVector) -> Self {
        ArrayError::DimensionMismatch(format!(
            "=: nonconformant arguments (op1 is {lhs}, op2 is {rhs})"
        ))
    }

    pub fn out_of_range(
        index: usize,
        extent: usize,
        position: Option<(usize, usize)>,
        dims: &DimVector,
    ) -> Self {
        ArrayError::IndexOutOfRange {
            index,
            extent,
            position,
            dims: dims.clone(),
        }
    }

    pub fn invalid_resize() -> Self {
        ArrayError::InvalidResize(
            "Invalid resizing operation or ambiguous assignment to an out-of-bounds array element"
                .to_string(),
        )
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            ArrayError::DimensionMismatch(_) => "MatVal:nonconformant",
            ArrayError::IndexOutOfRange { .. } => "MatVal:index-out-of-bounds",
            ArrayError::BadIndex(_) => "MatVal:bad-index",
            ArrayError::InvalidResize(_) => "MatVal:invalid-resize",
            ArrayError::InvalidDeletion(_) => "MatVal:invalid-deletion",
            ArrayError::CapacityExhausted { .. } => "MatVal:sparse-filled",
            ArrayError::InvalidArgument(_) => "MatVal:invalid-input",
            ArrayError::Interrupted => "MatVal:interrupted",
        }
    }
}

fn out_of_range_message(
    index: &usize,
    extent: &usize,
    position: &Option<(usize, usize)>,
    dims: &DimVector,
) -> String {
    let subscript = match position {
        Some((k, n)) if *n > 1 => (1..=*n)
            .map(|p| {
                if p == *k {
                    index.to_string()
                } else {
                    "_".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(","),
        _ => index.to_string(),
    };
    format!("index ({subscript}): out of bound {extent} (dimensions are {dims})")
}
