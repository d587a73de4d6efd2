//! Ruby conversions.

use shoal_model::{CompilationSession, Primitive, PrimitiveKind, Type};

use crate::typemap::{nullable_flag, table_entries, Conversion, KnownClasses, TypeMap};

/// Maps primitives and the session's classes to Ruby `VALUE`s.
#[derive(Clone, Debug)]
pub struct RubyTypeMap {
    classes: KnownClasses,
}

impl RubyTypeMap {
    pub fn new(session: &CompilationSession) -> Self {
        RubyTypeMap {
            classes: KnownClasses::from_session(session),
        }
    }

    /// A frozen Ruby hash from C type to `[to_native, to_host]` templates,
    /// for build scripts that generate further glue.
    pub fn to_ruby_table(&self, session: &CompilationSession) -> String {
        let mut out = String::from("SHOAL_TYPEMAP = {\n");
        for (c_type, conversion) in table_entries(self, session) {
            out.push_str(&format!(
                "  '{c_type}' => ['{}', '{}'],\n",
                conversion.to_native("$arg"),
                conversion.to_host("$var")
            ));
        }
        out.push_str("}.freeze\n");
        out
    }
}

impl TypeMap for RubyTypeMap {
    fn host_name(&self) -> &'static str {
        "Ruby"
    }

    fn conversion(&self, ty: &Type) -> Option<Conversion> {
        if let Some(prim) = ty.as_primitive() {
            return Some(primitive(prim));
        }
        let object = ty.as_object()?;
        let class_var = self.classes.class_var(object)?;
        Some(Conversion::new(
            format!(
                "({}*)ShoalRb_value_to_obj($arg, {class_var}, {})",
                object.full_struct_sym(),
                nullable_flag(ty)
            ),
            "ShoalRb_obj_to_value((void*)$var)",
        ))
    }
}

fn primitive(prim: Primitive) -> Conversion {
    let c_name = prim.c_name();
    let (to_native, to_host) = match (prim.kind(), prim.width()) {
        (PrimitiveKind::Int, 64) => ("NUM2LL", "LL2NUM"),
        (PrimitiveKind::Int | PrimitiveKind::Char, _) => ("NUM2INT", "INT2NUM"),
        (PrimitiveKind::UInt, 64) | (PrimitiveKind::Size, _) => ("NUM2ULL", "ULL2NUM"),
        (PrimitiveKind::UInt, _) => ("NUM2UINT", "UINT2NUM"),
        (PrimitiveKind::Float, _) => ("NUM2DBL", "DBL2NUM"),
        (PrimitiveKind::Bool, _) => {
            return Conversion::new("RTEST($arg)", "($var ? Qtrue : Qfalse)");
        }
    };
    Conversion::new(
        format!("({c_name}){to_native}($arg)"),
        format!("{to_host}($var)"),
    )
}
