//! The declarative model of a Shoal library and its hierarchy resolution.
//!
//! A front end fills a [`CompilationSession`] with parcels, classes and
//! their declared members. [`CompilationSession::build`] then links parents,
//! checks overrides, bequeaths member variables and methods down the tree
//! and freezes the result for the code generators.
//!
//! # Ownership
//!
//! Classes and methods live in arenas owned by the session and are addressed
//! by [`ClassId`] and [`MethodId`]. A method stores the id of its declaring
//! class instead of a reference, so the model has no reference cycles.

mod class;
mod docu;
mod function;
mod method;
mod param_list;
mod parcel;
mod session;
mod symbol;
mod types;
mod variable;
mod version;

pub use class::{Class, ClassDecl, ClassName};
pub use docu::DocComment;
pub use function::Function;
pub use method::{ClassLineage, Method, MethodModifiers, NoLineage, SignatureMismatch};
pub use param_list::{Param, ParamList};
pub use parcel::{Parcel, Prefix};
pub use session::{
    ClassId, CompilationSession, FunctionDecl, LineageTable, MethodDecl, MethodId, ParamDecl,
    ParcelId, VarDecl,
};
pub use symbol::{
    is_class_component, is_lower_identifier, validate_dispatch_name, Exposure, Symbol,
};
pub use types::{CompositeType, ObjectType, Ownership, Primitive, PrimitiveKind, Type, TypeFlags, TypeKind};
pub use variable::Variable;
pub use version::Version;
