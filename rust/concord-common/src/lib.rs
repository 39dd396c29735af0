//! Core definitions relied upon by all concord-* crates: the error type shared
//! across the boundary, the `Result` alias and argument verification macros.

pub mod error;
pub mod result;

pub use error::{Error, ErrorCode, ErrorKind};
pub use result::Result;
