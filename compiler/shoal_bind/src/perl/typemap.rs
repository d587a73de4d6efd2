//! Perl conversions and the `typemap` file xsubpp reads.

use shoal_model::{CompilationSession, Primitive, PrimitiveKind, Type};

use crate::typemap::{nullable_flag, table_entries, Conversion, KnownClasses, TypeMap};

/// Maps primitives and the session's classes to Perl scalars.
#[derive(Clone, Debug)]
pub struct PerlTypeMap {
    classes: KnownClasses,
}

impl PerlTypeMap {
    pub fn new(session: &CompilationSession) -> Self {
        PerlTypeMap {
            classes: KnownClasses::from_session(session),
        }
    }

    /// Contents of the `typemap` file, with `TYPEMAP`, `INPUT` and `OUTPUT`
    /// sections. Primitives are keyed `SHOAL_<C TYPE>`, classes by their
    /// class variable plus a trailing underscore.
    pub fn to_typemap_file(&self, session: &CompilationSession) -> String {
        let entries: Vec<(String, String, Conversion)> = table_entries(self, session)
            .into_iter()
            .map(|(c_type, conversion)| {
                let key = match c_type.strip_suffix('*') {
                    Some(struct_sym) => format!("{}_", struct_sym.to_ascii_uppercase()),
                    None => format!("SHOAL_{}", c_type.to_ascii_uppercase()),
                };
                (c_type, key, conversion)
            })
            .collect();

        let mut out = String::from("TYPEMAP\n");
        for (c_type, key, _) in &entries {
            out.push_str(&format!("{c_type}\t{key}\n"));
        }
        out.push_str("\nINPUT\n");
        for (_, key, conversion) in &entries {
            out.push_str(&format!("\n{key}\n    $var = {};\n", conversion.to_native("$arg")));
        }
        out.push_str("\nOUTPUT\n");
        for (_, key, conversion) in &entries {
            out.push_str(&format!("\n{key}\n    $arg = {};\n", conversion.to_host("$var")));
        }
        out
    }
}

impl TypeMap for PerlTypeMap {
    fn host_name(&self) -> &'static str {
        "Perl"
    }

    fn conversion(&self, ty: &Type) -> Option<Conversion> {
        if let Some(prim) = ty.as_primitive() {
            return Some(primitive(prim));
        }
        let object = ty.as_object()?;
        let class_var = self.classes.class_var(object)?;
        Some(Conversion::new(
            format!(
                "({}*)ShoalXS_sv_to_obj(aTHX_ $arg, {class_var}, {})",
                object.full_struct_sym(),
                nullable_flag(ty)
            ),
            "ShoalXS_obj_to_sv(aTHX_ (void*)$var)",
        ))
    }
}

fn primitive(prim: Primitive) -> Conversion {
    let c_name = prim.c_name();
    match (prim.kind(), prim.width()) {
        (PrimitiveKind::Int, 64) => Conversion::new(
            format!("({c_name})(sizeof(IV) == 8 ? SvIV($arg) : SvNV($arg))"),
            "(sizeof(IV) == 8 ? newSViv((IV)$var) : newSVnv((NV)$var))",
        ),
        (PrimitiveKind::Int | PrimitiveKind::Char, _) => {
            Conversion::new(format!("({c_name})SvIV($arg)"), "newSViv((IV)$var)")
        }
        (PrimitiveKind::UInt, 64) | (PrimitiveKind::Size, _) => Conversion::new(
            format!("({c_name})(sizeof(UV) == 8 ? SvUV($arg) : SvNV($arg))"),
            "(sizeof(UV) == 8 ? newSVuv((UV)$var) : newSVnv((NV)$var))",
        ),
        (PrimitiveKind::UInt, _) => {
            Conversion::new(format!("({c_name})SvUV($arg)"), "newSVuv((UV)$var)")
        }
        (PrimitiveKind::Float, _) => {
            Conversion::new(format!("({c_name})SvNV($arg)"), "newSVnv((NV)$var)")
        }
        (PrimitiveKind::Bool, _) => Conversion::new("SvTRUE($arg)", "newSViv($var ? 1 : 0)"),
    }
}
