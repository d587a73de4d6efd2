//! Diagnostic system for the Shoal compiler core.
//!
//! Every fatal problem in the declared model (bad dispatch names, illegal
//! overrides, unresolvable parents) and every generator consistency failure
//! is reported as a [`Diagnostic`] carrying:
//! - An error code for searchability (`shoalc --explain E2001`)
//! - A clear message (what went wrong)
//! - Labels naming the offending symbol or class (where it went wrong)
//! - Notes and suggestions (why, and how to fix)
//!
//! There are no source spans at this layer: the front end that owns source
//! text is a separate collaborator, so labels point at model symbols.

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod errors;

pub use diagnostic::{internal_error, Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use errors::ErrorDocs;

/// Result alias used by every fallible operation of the compiler core.
pub type DiagResult<T> = Result<T, Diagnostic>;
