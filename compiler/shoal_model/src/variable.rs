use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

use crate::symbol::is_lower_identifier;
use crate::{ClassName, Exposure, Prefix, Symbol, Type};

/// A named, typed slot: a member variable, a class-level (inert) variable,
/// or a parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    symbol: Symbol,
    ty: Type,
    inert: bool,
}

impl Variable {
    pub fn new(
        prefix: &Prefix,
        exposure: Exposure,
        class: Option<&ClassName>,
        name: &str,
        ty: Type,
        inert: bool,
    ) -> DiagResult<Self> {
        if !is_lower_identifier(name) {
            return Err(Diagnostic::error(ErrorCode::E1010)
                .with_message(format!("Invalid variable name: '{name}'"))
                .with_label(
                    scoped_subject(class, name),
                    "variable names must be lowercase identifiers",
                ));
        }
        Ok(Variable {
            symbol: Symbol::new(prefix, exposure, class, name),
            ty,
            inert,
        })
    }

    pub fn name(&self) -> &str {
        self.symbol.name()
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub(crate) fn ty_mut(&mut self) -> &mut Type {
        &mut self.ty
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn exposure(&self) -> Exposure {
        self.symbol.exposure()
    }

    /// Class-level variable rather than an instance member.
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// `int32_t count` or `char* buf[16]`.
    pub fn local_c(&self) -> String {
        format!("{} {}{}", self.ty.to_c(), self.name(), self.ty.array_postfix())
    }

    /// `int32_t count;`
    pub fn local_declaration(&self) -> String {
        format!("{};", self.local_c())
    }

    /// Declaration using the globally unique symbol: `int32_t neato_Dog_count`.
    pub fn global_c(&self) -> String {
        format!(
            "{} {}{}",
            self.ty.to_c(),
            self.symbol.full_sym(),
            self.ty.array_postfix()
        )
    }
}

pub(crate) fn scoped_subject(class: Option<&ClassName>, name: &str) -> String {
    match class {
        Some(class) => format!("{}#{name}", class.name()),
        None => name.to_string(),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::Primitive;
    use pretty_assertions::assert_eq;

    #[test]
    fn declarations() {
        let prefix = Prefix::from_nickname("Neato");
        let class = ClassName::new("Neato::Dog", None).unwrap();
        let var = Variable::new(
            &prefix,
            Exposure::Parcel,
            Some(&class),
            "count",
            Type::primitive(Primitive::I32),
            true,
        )
        .unwrap();

        assert_eq!(var.local_c(), "int32_t count");
        assert_eq!(var.local_declaration(), "int32_t count;");
        assert_eq!(var.global_c(), "int32_t neato_Dog_count");
        assert!(var.is_inert());
    }

    #[test]
    fn rejects_uppercase_names() {
        let prefix = Prefix::from_nickname("Neato");
        let err = Variable::new(
            &prefix,
            Exposure::Local,
            None,
            "Count",
            Type::primitive(Primitive::I32),
            false,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::E1010);
    }
}
