//! C code generation for Shoal class hierarchies.
//!
//! Given a built [`shoal_model::CompilationSession`], the generators lay out
//! a dispatch table per class and emit:
//! - a header per class with the instance struct, offset symbols, method
//!   typedefs and inline invocation thunks,
//! - a parcel header with the runtime prelude and a parcel source file with
//!   the method specs and bootstrap function,
//! - declarations of the host override callbacks.
//!
//! All output is built as a [`c_ast::Item`] tree and rendered in one place,
//! which keeps repeated runs byte-identical.

mod artifact;
mod bind_class;
pub mod bind_method;
mod bind_parcel;
pub mod c_ast;
mod emitter;
mod generator;
mod layout;
mod sink;

#[cfg(test)]
mod test_fixtures;

pub use artifact::{as_comment, Artifact, ArtifactSet, Boilerplate, CommentStyle};
pub use bind_class::{ClassBinding, SpecKind};
pub use bind_parcel::ParcelBinding;
pub use emitter::{Emitter, StringEmitter};
pub use generator::{CoreGenerator, GenConfig};
pub use layout::{DispatchLayout, DISPATCH_HEADER_SLOTS};
pub use sink::{ArtifactSink, FsSink, MemorySink, SinkError, WriteOutcome};
