//! Copy-on-write containers for the matval runtime.
//!
//! Every container shares its storage until a mutating entry point is
//! reached; mutation first makes the storage exclusive. Dense arrays are
//! column-major N-d arrays with an O(1) slice view, sparse arrays use
//! compressed-sparse-column storage, and [`Range`] keeps an arithmetic
//! progression lazy until something forces it into a dense row vector.

pub mod buffer;
pub mod config;
pub mod dense;
pub mod dims;
pub mod element;
pub mod error;
pub mod index;
pub mod interrupt;
pub mod range;
pub mod sparse;

pub use buffer::SharedBuffer;
pub use config::{engine_config, set_engine_config, EngineConfig, EngineConfigBuilder};
pub use dense::{BroadcastPlan, DenseArray, SortMode};
pub use dims::DimVector;
pub use element::Element;
pub use error::{ArrayError, Result};
pub use index::IndexVector;
pub use interrupt::{check_interrupt, is_cancelled, replace_interrupt, InterruptGuard, InterruptPoller};
pub use range::{Range, RangeArith};
pub use sparse::{SparseArray, SparseMap};
