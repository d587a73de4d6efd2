//! Conversions between native values and host-language values.
//!
//! A [`TypeMap`] answers, per [`Type`], how to turn a host value into a
//! native one and back. Conversions are templates in the style of Perl XS
//! typemaps: `$arg` stands for the host expression and `$var` for the
//! native one.
//!
//! Ownership contract for object conversions: `to_native` yields a borrowed
//! pointer, `to_host` yields a host value holding its own reference.

use rustc_hash::FxHashMap;
use shoal_model::{CompilationSession, ObjectType, Primitive, Type};

/// How values of one type cross the host boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    to_native: String,
    to_host: String,
}

impl Conversion {
    /// Build from templates; `to_native` uses `$arg`, `to_host` uses `$var`.
    pub fn new(to_native: impl Into<String>, to_host: impl Into<String>) -> Self {
        Conversion {
            to_native: to_native.into(),
            to_host: to_host.into(),
        }
    }

    /// Native value of the host expression `arg`.
    pub fn to_native(&self, arg: &str) -> String {
        self.to_native.replace("$arg", arg)
    }

    /// Host value of the native expression `var`.
    pub fn to_host(&self, var: &str) -> String {
        self.to_host.replace("$var", var)
    }
}

/// Lookup from native types to host conversions.
pub trait TypeMap {
    /// Name of the host language, for messages.
    fn host_name(&self) -> &'static str;

    /// Conversion for `ty`, or `None` if the host cannot represent it.
    /// `void` never has a conversion.
    fn conversion(&self, ty: &Type) -> Option<Conversion>;
}

/// Classes a type map knows how to wrap, keyed by full struct symbol.
#[derive(Clone, Debug, Default)]
pub struct KnownClasses {
    class_vars: FxHashMap<String, String>,
}

impl KnownClasses {
    /// Every non-inert class of the session, included parcels too.
    pub fn from_session(session: &CompilationSession) -> Self {
        let class_vars = session
            .ordered_classes()
            .filter(|class| !class.is_inert())
            .map(|class| (class.full_struct_sym(), class.full_class_var()))
            .collect();
        KnownClasses { class_vars }
    }

    /// Class singleton variable for an object type, if the class is known.
    pub fn class_var(&self, object: &ObjectType) -> Option<&str> {
        self.class_vars
            .get(&object.full_struct_sym())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.class_vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_vars.is_empty()
    }
}

const PRIMITIVES: [Primitive; 13] = [
    Primitive::I8,
    Primitive::I16,
    Primitive::I32,
    Primitive::I64,
    Primitive::U8,
    Primitive::U16,
    Primitive::U32,
    Primitive::U64,
    Primitive::F32,
    Primitive::F64,
    Primitive::Bool,
    Primitive::Char,
    Primitive::SizeT,
];

/// Every conversion a map offers, keyed by C type: the primitives first,
/// then each non-inert class of the session in hierarchy order.
pub fn table_entries(
    map: &dyn TypeMap,
    session: &CompilationSession,
) -> Vec<(String, Conversion)> {
    let primitives = PRIMITIVES.iter().map(|&prim| Type::primitive(prim));
    let objects = session
        .ordered_classes()
        .filter(|class| !class.is_inert())
        .filter_map(|class| Type::object_named(&class.full_struct_sym()).ok());
    primitives
        .chain(objects)
        .filter_map(|ty| Some((ty.to_c(), map.conversion(&ty)?)))
        .collect()
}

/// C expression for a type's nullability: `true` or `false`.
pub(crate) fn nullable_flag(ty: &Type) -> &'static str {
    if ty.is_nullable() {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn templates_substitute_expressions() {
        let conv = Conversion::new("(int32_t)SvIV($arg)", "newSViv((IV)$var)");
        assert_eq!(conv.to_native("ST(1)"), "(int32_t)SvIV(ST(1))");
        assert_eq!(conv.to_host("retval"), "newSViv((IV)retval)");
    }
}
