//! Classes: hierarchy nodes aggregating member variables, inert variables,
//! functions and methods.

use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

use crate::symbol::is_class_component;
use crate::{ClassId, DocComment, Exposure, Function, MethodId, ParcelId, Prefix, Variable};

/// A validated class name with its nickname and struct symbol.
///
/// `Neato::Animal::Dog` has struct symbol `Dog`; the nickname defaults to
/// the struct symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassName {
    name: String,
    nickname: String,
    struct_sym: String,
}

impl ClassName {
    pub fn new(name: &str, nickname: Option<&str>) -> DiagResult<Self> {
        if !name.split("::").all(is_class_component) {
            return Err(Diagnostic::error(ErrorCode::E1004)
                .with_message(format!("Invalid class name: '{name}'"))
                .with_label(name, "each `::` component must start with an uppercase letter"));
        }
        let struct_sym = name.rsplit("::").next().unwrap_or(name).to_string();
        let nickname = match nickname {
            Some(nick) if is_class_component(nick) && !nick.contains('_') => nick.to_string(),
            Some(nick) => {
                return Err(Diagnostic::error(ErrorCode::E1004)
                    .with_message(format!("Invalid class nickname: '{nick}'"))
                    .with_label(name, "nicknames are a single capitalized word"));
            }
            None => struct_sym.clone(),
        };
        Ok(ClassName {
            name: name.to_string(),
            nickname,
            struct_sym,
        })
    }

    /// Fully qualified name, e.g. `Neato::Dog`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short name used in symbols, e.g. `Dog`.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Last component of the name.
    pub fn struct_sym(&self) -> &str {
        &self.struct_sym
    }

    /// Header path relative to the include directory: `Neato/Dog.h`.
    pub fn include_h(&self) -> String {
        format!("{}.h", self.name.replace("::", "/"))
    }
}

/// What a front end declares about a class before members are added.
#[derive(Clone, Debug, Default)]
pub struct ClassDecl {
    pub name: String,
    pub nickname: Option<String>,
    pub parent: Option<String>,
    pub exposure: Exposure,
    pub is_final: bool,
    pub is_inert: bool,
    pub doc: Option<DocComment>,
}

/// A class in the hierarchy.
///
/// After [`CompilationSession::build`](crate::CompilationSession::build)
/// the class is read-only, except for the generated-code buffer which only
/// grows.
#[derive(Clone, Debug)]
pub struct Class {
    pub(crate) id: ClassId,
    pub(crate) parcel: ParcelId,
    pub(crate) prefix: Prefix,
    pub(crate) name: ClassName,
    pub(crate) exposure: Exposure,
    pub(crate) doc: Option<DocComment>,
    pub(crate) parent_name: Option<String>,
    pub(crate) parent: Option<ClassId>,
    pub(crate) children: Vec<ClassId>,
    /// Member variables declared by this class itself.
    pub(crate) fresh_member_vars: Vec<Variable>,
    /// Full ordered field set: the parent's followed by the fresh ones.
    pub(crate) member_vars: Vec<Variable>,
    pub(crate) inert_vars: Vec<Variable>,
    pub(crate) functions: Vec<Function>,
    /// Methods declared by this class, in declaration order.
    pub(crate) fresh_methods: Vec<MethodId>,
    /// Every method reachable by the class, in dispatch-table order.
    pub(crate) methods: Vec<MethodId>,
    pub(crate) autocode: String,
    pub(crate) is_final: bool,
    pub(crate) is_inert: bool,
    pub(crate) is_included: bool,
}

impl Class {
    pub(crate) fn new(
        id: ClassId,
        parcel: ParcelId,
        prefix: &Prefix,
        is_included: bool,
        name: ClassName,
        decl: ClassDecl,
    ) -> Self {
        Class {
            id,
            parcel,
            prefix: prefix.clone(),
            name,
            exposure: decl.exposure,
            doc: decl.doc,
            parent_name: decl.parent,
            parent: None,
            children: Vec::new(),
            fresh_member_vars: Vec::new(),
            member_vars: Vec::new(),
            inert_vars: Vec::new(),
            functions: Vec::new(),
            fresh_methods: Vec::new(),
            methods: Vec::new(),
            autocode: String::new(),
            is_final: decl.is_final,
            is_inert: decl.is_inert,
            is_included,
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn parcel(&self) -> ParcelId {
        self.parcel
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn class_name(&self) -> &ClassName {
        &self.name
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn nickname(&self) -> &str {
        self.name.nickname()
    }

    pub fn struct_sym(&self) -> &str {
        self.name.struct_sym()
    }

    pub fn exposure(&self) -> Exposure {
        self.exposure
    }

    pub fn doc(&self) -> Option<&DocComment> {
        self.doc.as_ref()
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
    }

    /// Resolved parent; `None` before `build()` or for roots.
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    pub fn children(&self) -> &[ClassId] {
        &self.children
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Static-only class: inert variables and functions, no instances.
    pub fn is_inert(&self) -> bool {
        self.is_inert
    }

    /// Declared in an included parcel; resolved but not generated.
    pub fn is_included(&self) -> bool {
        self.is_included
    }

    pub fn fresh_member_vars(&self) -> &[Variable] {
        &self.fresh_member_vars
    }

    /// All member variables including inherited ones (after `build()`).
    pub fn member_vars(&self) -> &[Variable] {
        &self.member_vars
    }

    pub fn inert_vars(&self) -> &[Variable] {
        &self.inert_vars
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name() == name)
    }

    /// Generated code attached to the class by earlier passes.
    pub fn autocode(&self) -> &str {
        &self.autocode
    }

    pub(crate) fn append_autocode(&mut self, code: &str) {
        self.autocode.push_str(code);
    }

    /// `neato_Dog`.
    pub fn full_struct_sym(&self) -> String {
        format!("{}{}", self.prefix.lower(), self.struct_sym())
    }

    /// `DogIVARS`.
    pub fn short_ivars_struct(&self) -> String {
        format!("{}IVARS", self.struct_sym())
    }

    /// `neato_DogIVARS`.
    pub fn full_ivars_struct(&self) -> String {
        format!("{}{}", self.prefix.lower(), self.short_ivars_struct())
    }

    /// `Dog_IVARS`.
    pub fn short_ivars_func(&self) -> String {
        format!("{}_IVARS", self.nickname())
    }

    /// `neato_Dog_IVARS`.
    pub fn full_ivars_func(&self) -> String {
        format!("{}{}", self.prefix.lower(), self.short_ivars_func())
    }

    /// `neato_Dog_IVARS_OFFSET`.
    pub fn full_ivars_offset(&self) -> String {
        format!("{}_OFFSET", self.full_ivars_func())
    }

    /// Class singleton variable: `NEATO_DOG`.
    pub fn full_class_var(&self) -> String {
        format!("{}{}", self.prefix.upper(), self.struct_sym().to_ascii_uppercase())
    }

    /// `DOG`.
    pub fn short_class_var(&self) -> String {
        self.struct_sym().to_ascii_uppercase()
    }

    /// Macro guarding the instance struct layout: `C_NEATO_DOG`.
    pub fn privacy_symbol(&self) -> String {
        format!("C_{}", self.full_class_var())
    }

    /// `Neato/Dog.h`.
    pub fn include_h(&self) -> String {
        self.name.include_h()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn class(name: &str, nick: Option<&str>) -> Class {
        let decl = ClassDecl {
            name: name.to_string(),
            nickname: nick.map(str::to_string),
            ..ClassDecl::default()
        };
        Class::new(
            ClassId::from_raw(0),
            ParcelId::from_raw(0),
            &Prefix::from_nickname("Neato"),
            false,
            ClassName::new(name, nick).unwrap(),
            decl,
        )
    }

    #[test]
    fn derived_names() {
        let foo_jr = class("Foo::FooJr", Some("FooJr"));
        assert_eq!(foo_jr.struct_sym(), "FooJr");
        assert_eq!(foo_jr.full_struct_sym(), "neato_FooJr");
        assert_eq!(foo_jr.full_ivars_struct(), "neato_FooJrIVARS");
        assert_eq!(foo_jr.full_ivars_func(), "neato_FooJr_IVARS");
        assert_eq!(foo_jr.full_ivars_offset(), "neato_FooJr_IVARS_OFFSET");
        assert_eq!(foo_jr.full_class_var(), "NEATO_FOOJR");
        assert_eq!(foo_jr.privacy_symbol(), "C_NEATO_FOOJR");
        assert_eq!(foo_jr.include_h(), "Foo/FooJr.h");
    }

    #[test]
    fn nickname_defaults_to_struct_sym() {
        let dog = class("Neato::Animal::Dog", None);
        assert_eq!(dog.nickname(), "Dog");
        assert_eq!(dog.short_ivars_func(), "Dog_IVARS");
    }

    #[test]
    fn explicit_nickname_is_used_in_symbols() {
        let dog = class("Neato::Doggie", Some("Dg"));
        assert_eq!(dog.short_ivars_func(), "Dg_IVARS");
        assert_eq!(dog.full_struct_sym(), "neato_Doggie");
    }

    #[test]
    fn invalid_names() {
        for bad in ["Neato::dog", "Neato::", "", "Neato::Do-g"] {
            assert_eq!(ClassName::new(bad, None).unwrap_err().code, ErrorCode::E1004);
        }
        assert!(ClassName::new("Neato::Dog", Some("dg")).is_err());
        assert!(ClassName::new("Neato::Dog", Some("D_g")).is_err());
    }

    #[test]
    fn autocode_is_append_only() {
        let mut dog = class("Neato::Dog", None);
        dog.append_autocode("int a;\n");
        dog.append_autocode("int b;\n");
        assert_eq!(dog.autocode(), "int a;\nint b;\n");
    }
}
