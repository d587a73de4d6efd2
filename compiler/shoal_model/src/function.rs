use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

use crate::symbol::is_lower_identifier;
use crate::variable::scoped_subject;
use crate::{ClassName, DocComment, Exposure, ParamList, Prefix, Symbol, Type};

/// A free (inert) function declared by a class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Function {
    symbol: Symbol,
    return_type: Type,
    params: ParamList,
    doc: Option<DocComment>,
    is_inline: bool,
}

impl Function {
    #[expect(clippy::too_many_arguments, reason = "mirrors the declaration shape")]
    pub fn new(
        prefix: &Prefix,
        exposure: Exposure,
        class: Option<&ClassName>,
        name: &str,
        return_type: Type,
        params: ParamList,
        doc: Option<DocComment>,
        is_inline: bool,
    ) -> DiagResult<Self> {
        if !is_lower_identifier(name) {
            return Err(Diagnostic::error(ErrorCode::E1010)
                .with_message(format!("Invalid function name: '{name}'"))
                .with_label(
                    scoped_subject(class, name),
                    "function names must be lowercase identifiers",
                ));
        }
        Ok(Self::new_unchecked(
            prefix,
            exposure,
            class,
            name,
            return_type,
            params,
            doc,
            is_inline,
        ))
    }

    /// Construct without validating the name; methods use their lowercased
    /// dispatch name here, which has already been validated.
    #[expect(clippy::too_many_arguments, reason = "mirrors the declaration shape")]
    pub(crate) fn new_unchecked(
        prefix: &Prefix,
        exposure: Exposure,
        class: Option<&ClassName>,
        name: &str,
        return_type: Type,
        params: ParamList,
        doc: Option<DocComment>,
        is_inline: bool,
    ) -> Self {
        Function {
            symbol: Symbol::new(prefix, exposure, class, name),
            return_type,
            params,
            doc,
            is_inline,
        }
    }

    pub fn name(&self) -> &str {
        self.symbol.name()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn exposure(&self) -> Exposure {
        self.symbol.exposure()
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn params(&self) -> &ParamList {
        &self.params
    }

    pub fn doc(&self) -> Option<&DocComment> {
        self.doc.as_ref()
    }

    pub fn is_inline(&self) -> bool {
        self.is_inline
    }

    /// `Dog_new`.
    pub fn short_func_sym(&self) -> String {
        self.symbol.short_sym()
    }

    /// `neato_Dog_new`.
    pub fn full_func_sym(&self) -> String {
        self.symbol.full_sym()
    }

    /// Every type mentioned by the signature, for prefix resolution.
    pub(crate) fn types_mut(&mut self) -> impl Iterator<Item = &mut Type> {
        std::iter::once(&mut self.return_type)
            .chain(self.params.iter_mut().map(|p| p.var.ty_mut()))
    }
}
