//! Host-language bindings for Shoal parcels.
//!
//! Binding generation runs in two stages. [`plan`] turns each bindable
//! method into a host-neutral plan: calling convention, conversions from
//! a [`TypeMap`], dispatch or direct invocation, reference adjustments.
//! The host modules ([`perl`], [`ruby`]) render plans into C glue.
//!
//! A method whose types a host cannot convert still gets an entry point;
//! it raises when called, and everything else in the library keeps
//! working.

mod glue;
mod host;
pub mod perl;
pub mod plan;
pub mod ruby;
pub mod typemap;

#[cfg(test)]
mod test_fixtures;

pub use host::{host_by_name, BindConfig, HostLanguage, HOST_NAMES};
pub use perl::{PerlHost, PerlTypeMap};
pub use ruby::{RubyHost, RubyTypeMap};
pub use typemap::{Conversion, KnownClasses, TypeMap};
