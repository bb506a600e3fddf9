//! Core framework components
//!
//! Error taxonomy and cooperative cancellation shared by every stage
//! of the pipeline.

pub mod cancel;
pub mod error;

pub use cancel::{CancelSource, CancelToken};
pub use error::{CodecOperation, FailureKind, RenderError, Result, ResultExt};
