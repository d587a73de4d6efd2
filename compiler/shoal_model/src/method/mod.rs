//! Methods: functions with a leading `self` parameter and dispatch metadata.
//!
//! A method starts out novel. During hierarchy build it may be marked as
//! overriding an ancestor's method ([`Method::override_method`]), and a final
//! class receives finalized copies ([`Method::finalize`]) of the methods it
//! inherits. Neither step touches the ancestor's method.

use std::fmt;

use bitflags::bitflags;
use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

use crate::symbol::validate_dispatch_name;
use crate::{
    Class, ClassId, ClassName, DocComment, Exposure, Function, ParamList, Prefix, Type,
};

bitflags! {
    /// Declared method modifiers.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MethodModifiers: u8 {
        /// Cannot be overridden; calls bypass the dispatch table.
        const FINAL = 1 << 0;
        /// No implementation in the declaring class.
        const ABSTRACT = 1 << 1;
    }
}

/// Ancestry queries needed to accept covariant object returns.
///
/// Classes are identified by their full struct symbol (`neato_Dog`).
pub trait ClassLineage {
    /// Full struct symbol of the parent class, if the class is known and
    /// has one.
    fn parent_of(&self, full_struct_sym: &str) -> Option<&str>;

    /// Whether `candidate` is `ancestor` or a declared descendant of it.
    fn is_same_or_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        let mut current = Some(candidate);
        while let Some(sym) = current {
            if sym == ancestor {
                return true;
            }
            current = self.parent_of(sym);
        }
        false
    }
}

/// Lineage that knows no parents: only identical classes are related.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoLineage;

impl ClassLineage for NoLineage {
    fn parent_of(&self, _full_struct_sym: &str) -> Option<&str> {
        None
    }
}

/// First reason two method signatures are incompatible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureMismatch {
    Name,
    Exposure,
    Arity { candidate: usize, ancestor: usize },
    Default { index: usize },
    Param { index: usize },
    ReturnType,
}

impl fmt::Display for SignatureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureMismatch::Name => write!(f, "dispatch names differ"),
            SignatureMismatch::Exposure => write!(f, "one method is public, the other is not"),
            SignatureMismatch::Arity { candidate, ancestor } => write!(
                f,
                "parameter count differs ({candidate} vs. {ancestor})"
            ),
            SignatureMismatch::Default { index } => {
                write!(f, "default value of parameter {index} differs")
            }
            SignatureMismatch::Param { index } => {
                write!(f, "parameter {index} differs in name or type")
            }
            SignatureMismatch::ReturnType => write!(f, "return types are incompatible"),
        }
    }
}

/// A method declared by a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    function: Function,
    macro_sym: String,
    owner: ClassId,
    modifiers: MethodModifiers,
    is_novel: bool,
    host_alias: Option<String>,
    is_excluded: bool,
}

impl Method {
    /// Create a method for the class `class` (arena id `owner`).
    ///
    /// `macro_sym` is the dispatch name (`Speak`, `Get_Name`). The first
    /// parameter must be `self`, typed as the owning class.
    #[expect(clippy::too_many_arguments, reason = "mirrors the declaration shape")]
    pub fn new(
        prefix: &Prefix,
        owner: ClassId,
        class: &ClassName,
        exposure: Exposure,
        macro_sym: &str,
        return_type: Type,
        params: ParamList,
        doc: Option<DocComment>,
        modifiers: MethodModifiers,
    ) -> DiagResult<Self> {
        let subject = format!("{}#{macro_sym}", class.name());
        if !validate_dispatch_name(macro_sym) {
            return Err(Diagnostic::error(ErrorCode::E1001)
                .with_message(format!("Invalid dispatch name: '{macro_sym}'"))
                .with_label(
                    subject,
                    "every `_`-separated segment must start with an uppercase letter",
                )
                .with_suggestion("use a name like `Speak` or `Get_Name`"));
        }

        let Some(self_param) = params.first().filter(|p| p.var.name() == "self") else {
            return Err(Diagnostic::error(ErrorCode::E1002)
                .with_message(format!("Missing 'self' argument for method '{macro_sym}'"))
                .with_label(subject, "the first parameter of a method must be `self`"));
        };

        let self_ok = self_param.var.ty().as_object().is_some_and(|obj| {
            obj.specifier() == class.struct_sym()
                && obj.prefix().map_or(true, |p| p == prefix.lower())
        });
        if !self_ok {
            return Err(Diagnostic::error(ErrorCode::E1003)
                .with_message(format!(
                    "First arg type doesn't match class: '{}' '{}'",
                    class.name(),
                    self_param.var.ty()
                ))
                .with_label(subject, format!("`self` must be a `{}`", class.struct_sym())));
        }

        let micro_sym = macro_sym.to_ascii_lowercase();
        Ok(Method {
            function: Function::new_unchecked(
                prefix,
                exposure,
                Some(class),
                &micro_sym,
                return_type,
                params,
                doc,
                false,
            ),
            macro_sym: macro_sym.to_string(),
            owner,
            modifiers,
            is_novel: true,
            host_alias: None,
            is_excluded: false,
        })
    }

    /// Id of the class that declared this method.
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    /// Name of the class that declared this method.
    pub fn class_name(&self) -> &str {
        self.function.symbol().class().map_or("", ClassName::name)
    }

    pub fn class_nickname(&self) -> &str {
        self.function.symbol().class().map_or("", ClassName::nickname)
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Dispatch name: `Get_Name`.
    pub fn macro_sym(&self) -> &str {
        &self.macro_sym
    }

    /// Lower-cased dispatch name: `get_name`.
    pub fn micro_sym(&self) -> &str {
        self.function.name()
    }

    pub fn exposure(&self) -> Exposure {
        self.function.exposure()
    }

    pub fn is_public(&self) -> bool {
        self.exposure().is_public()
    }

    pub fn return_type(&self) -> &Type {
        self.function.return_type()
    }

    pub fn params(&self) -> &ParamList {
        self.function.params()
    }

    pub fn doc(&self) -> Option<&DocComment> {
        self.function.doc()
    }

    pub fn modifiers(&self) -> MethodModifiers {
        self.modifiers
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.contains(MethodModifiers::FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(MethodModifiers::ABSTRACT)
    }

    /// True unless the method overrides an ancestor's method.
    pub fn is_novel(&self) -> bool {
        self.is_novel
    }

    /// Type of the `self` parameter.
    pub fn self_type(&self) -> Option<&Type> {
        self.params().first().map(|p| p.var.ty())
    }

    /// Subject used in diagnostics: `Neato::Dog#Speak`.
    pub fn subject(&self) -> String {
        format!("{}#{}", self.class_name(), self.macro_sym)
    }

    /// First incompatibility between this method and `ancestor`, if any.
    pub fn mismatch(
        &self,
        ancestor: &Method,
        lineage: &dyn ClassLineage,
    ) -> Option<SignatureMismatch> {
        if self.macro_sym != ancestor.macro_sym {
            return Some(SignatureMismatch::Name);
        }
        if self.is_public() != ancestor.is_public() {
            return Some(SignatureMismatch::Exposure);
        }

        let mine = self.params();
        let theirs = ancestor.params();
        if mine.len() != theirs.len() {
            return Some(SignatureMismatch::Arity {
                candidate: mine.len(),
                ancestor: theirs.len(),
            });
        }
        for (index, (a, b)) in mine.iter().zip(theirs.iter()).enumerate().skip(1) {
            if a.default != b.default {
                return Some(SignatureMismatch::Default { index });
            }
            if a.var.name() != b.var.name() || a.var.ty() != b.var.ty() {
                return Some(SignatureMismatch::Param { index });
            }
        }

        let ret = self.return_type();
        let orig = ancestor.return_type();
        let returns_ok = match (ret.as_object(), orig.as_object()) {
            (Some(candidate), Some(original)) => {
                ret.flags() == orig.flags()
                    && candidate.ownership() == original.ownership()
                    && lineage.is_same_or_descendant(
                        &candidate.full_struct_sym(),
                        &original.full_struct_sym(),
                    )
            }
            _ => ret == orig,
        };
        if !returns_ok {
            return Some(SignatureMismatch::ReturnType);
        }
        None
    }

    /// Whether this method may stand in for `ancestor`.
    ///
    /// Object return types may be covariant: the candidate may return the
    /// ancestor's class or a descendant of it. Every other part of the
    /// signature past `self` must match exactly.
    pub fn compatible(&self, ancestor: &Method, lineage: &dyn ClassLineage) -> bool {
        self.mismatch(ancestor, lineage).is_none()
    }

    /// Mark this method as overriding `ancestor`.
    ///
    /// # Errors
    ///
    /// `E2001` if `ancestor` is final, `E2002` if the signatures are not
    /// compatible. The method is left untouched on error.
    pub fn override_method(
        &mut self,
        ancestor: &Method,
        lineage: &dyn ClassLineage,
    ) -> DiagResult<()> {
        if ancestor.is_final() {
            return Err(Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "Attempt to override final method '{}' from '{}' by '{}'",
                    ancestor.macro_sym,
                    ancestor.class_name(),
                    self.class_name()
                ))
                .with_label(self.subject(), "overrides a final method")
                .with_secondary_label(ancestor.subject(), "declared final here"));
        }
        if let Some(mismatch) = self.mismatch(ancestor, lineage) {
            return Err(Diagnostic::error(ErrorCode::E2002)
                .with_message(format!(
                    "Non-matching signatures for {} and {}",
                    self.implementing_func_sym(),
                    ancestor.implementing_func_sym()
                ))
                .with_label(self.subject(), "override declared here")
                .with_secondary_label(ancestor.subject(), "original declared here")
                .with_note(mismatch.to_string()));
        }
        self.is_novel = false;
        Ok(())
    }

    /// A copy of this method marked final. `self` is not modified.
    #[must_use]
    pub fn finalize(&self) -> Method {
        let mut finalized = self.clone();
        finalized.modifiers |= MethodModifiers::FINAL;
        finalized
    }

    /// Bind the method under a different name in host languages.
    ///
    /// # Errors
    ///
    /// `E1008` if the method is not novel, the alias is empty, or a
    /// different alias was already set.
    pub fn set_host_alias(&mut self, alias: &str) -> DiagResult<()> {
        if alias.is_empty() {
            return Err(self.host_error("Missing required param 'alias'"));
        }
        if !self.is_novel {
            return Err(self.host_error(format!(
                "Can't set_host_alias {alias} -- method {} not novel in {}",
                self.macro_sym,
                self.class_name()
            )));
        }
        match &self.host_alias {
            Some(existing) if existing == alias => Ok(()),
            Some(existing) => Err(self.host_error(format!(
                "Can't set_host_alias {alias} -- already set to {existing} for method {} in {}",
                self.macro_sym,
                self.class_name()
            ))),
            None => {
                self.host_alias = Some(alias.to_string());
                Ok(())
            }
        }
    }

    /// Keep the method out of host bindings and callbacks.
    ///
    /// # Errors
    ///
    /// `E1008` if the method is not novel.
    pub fn exclude_from_host(&mut self) -> DiagResult<()> {
        if !self.is_novel {
            return Err(self.host_error(format!(
                "Can't exclude_from_host -- method {} not novel in {}",
                self.macro_sym,
                self.class_name()
            )));
        }
        self.is_excluded = true;
        Ok(())
    }

    fn host_error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(ErrorCode::E1008)
            .with_message(message)
            .with_label(self.subject(), "host settings belong to the novel method")
    }

    pub fn host_alias(&self) -> Option<&str> {
        self.host_alias.as_deref()
    }

    pub fn is_excluded_from_host(&self) -> bool {
        self.is_excluded
    }

    /// Name the method is bound under in host languages.
    pub fn host_name(&self) -> &str {
        self.host_alias.as_deref().unwrap_or_else(|| self.micro_sym())
    }

    /// `Dog_Speak`, scoped to the invoking class.
    pub fn short_method_sym(&self, invoker: &Class) -> String {
        format!("{}_{}", invoker.nickname(), self.macro_sym)
    }

    /// `Neato_Dog_Speak`.
    pub fn full_method_sym(&self, invoker: &Class) -> String {
        format!("{}{}_{}", invoker.prefix().title(), invoker.nickname(), self.macro_sym)
    }

    /// `Neato_Dog_Speak_OFFSET`.
    pub fn full_offset_sym(&self, invoker: &Class) -> String {
        format!("{}_OFFSET", self.full_method_sym(invoker))
    }

    /// `Dog_Speak_t`.
    pub fn short_typedef(&self, invoker: &Class) -> String {
        format!("{}_t", self.short_method_sym(invoker))
    }

    /// `Neato_Dog_Speak_t`.
    pub fn full_typedef(&self, invoker: &Class) -> String {
        format!("{}_t", self.full_method_sym(invoker))
    }

    /// `Dog_Speak_IMP`, named after the declaring class.
    pub fn short_imp_func(&self) -> String {
        format!("{}_{}_IMP", self.class_nickname(), self.macro_sym)
    }

    /// `Neato_Dog_Speak_IMP`.
    pub fn implementing_func_sym(&self) -> String {
        format!("{}{}", self.function.symbol().prefix().title(), self.short_imp_func())
    }

    /// `Neato_Dog_Speak_OVERRIDE`: the host callback installed in the
    /// dispatch table when a host subclass overrides the method.
    pub fn full_override_sym(&self) -> String {
        format!(
            "{}{}_{}_OVERRIDE",
            self.function.symbol().prefix().title(),
            self.class_nickname(),
            self.macro_sym
        )
    }

    pub(crate) fn types_mut(&mut self) -> impl Iterator<Item = &mut Type> {
        self.function.types_mut()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
