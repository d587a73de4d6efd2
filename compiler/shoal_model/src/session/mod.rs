//! The compilation session: arenas of parcels, classes and methods plus the
//! two-phase hierarchy build.
//!
//! A session is created empty, filled by a front end through the `add_*`
//! methods, resolved once by [`CompilationSession::build`] and read by the
//! generators. [`CompilationSession::clear`] drops everything at the end of
//! a run.

use rustc_hash::FxHashMap;
use shoal_diagnostic::{internal_error, DiagResult, Diagnostic, ErrorCode};
use tracing::{debug, trace};

use crate::method::ClassLineage;
use crate::{
    Class, ClassDecl, ClassName, DocComment, Exposure, Function, Method, MethodModifiers,
    ParamList, Parcel, Type, Variable,
};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an id from a raw index.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                $name(raw)
            }

            /// Position in the owning arena.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id! {
    /// Index of a [`Parcel`] in its session.
    ParcelId
}

arena_id! {
    /// Index of a [`Class`] in its session.
    ClassId
}

arena_id! {
    /// Index of a [`Method`] in its session.
    MethodId
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "arenas never approach u32::MAX entries"
)]
fn next_raw(len: usize) -> u32 {
    len as u32
}

/// A member or inert variable as declared.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub exposure: Exposure,
    pub name: String,
    pub ty: Type,
}

/// A parameter as declared.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub name: String,
    pub ty: Type,
    pub default: Option<String>,
}

/// An inert function as declared.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub exposure: Exposure,
    pub name: String,
    pub return_type: Type,
    pub params: Vec<ParamDecl>,
    pub doc: Option<DocComment>,
    pub is_inline: bool,
}

/// A method as declared. `params` starts with `self`.
#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub exposure: Exposure,
    pub name: String,
    pub return_type: Type,
    pub params: Vec<ParamDecl>,
    pub doc: Option<DocComment>,
    pub modifiers: MethodModifiers,
}

/// Parent links by full struct symbol, captured at build time.
#[derive(Clone, Debug, Default)]
pub struct LineageTable {
    parents: FxHashMap<String, String>,
}

impl LineageTable {
    pub fn insert(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.parents.insert(child.into(), parent.into());
    }
}

impl ClassLineage for LineageTable {
    fn parent_of(&self, full_struct_sym: &str) -> Option<&str> {
        self.parents.get(full_struct_sym).map(String::as_str)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SessionState {
    Declaring,
    Built,
    Failed,
}

/// Owns every parcel, class and method of one compilation run.
#[derive(Debug)]
pub struct CompilationSession {
    parcels: Vec<Parcel>,
    classes: Vec<Class>,
    methods: Vec<Method>,
    class_index: FxHashMap<String, ClassId>,
    ordered: Vec<ClassId>,
    lineage: LineageTable,
    state: SessionState,
}

impl Default for CompilationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationSession {
    pub fn new() -> Self {
        CompilationSession {
            parcels: Vec::new(),
            classes: Vec::new(),
            methods: Vec::new(),
            class_index: FxHashMap::default(),
            ordered: Vec::new(),
            lineage: LineageTable::default(),
            state: SessionState::Declaring,
        }
    }

    fn ensure_declaring(&self, what: &str) -> DiagResult<()> {
        match self.state {
            SessionState::Declaring => Ok(()),
            SessionState::Built | SessionState::Failed => {
                Err(Diagnostic::error(ErrorCode::E2010)
                    .with_message(format!("Cannot {what} after the hierarchy was built"))
                    .with_note("declarations are frozen once `build()` has run"))
            }
        }
    }

    fn ensure_built(&self, what: &str) -> DiagResult<()> {
        if self.state == SessionState::Built {
            Ok(())
        } else {
            Err(Diagnostic::error(ErrorCode::E2010)
                .with_message(format!("Cannot {what} before the hierarchy was built")))
        }
    }

    /// Register a parcel.
    ///
    /// # Errors
    ///
    /// `E2006` if a parcel with the same name or nickname exists.
    pub fn register_parcel(&mut self, parcel: Parcel) -> DiagResult<ParcelId> {
        self.ensure_declaring("register a parcel")?;
        if let Some(existing) = self
            .parcels
            .iter()
            .find(|p| p.name() == parcel.name() || p.nickname() == parcel.nickname())
        {
            return Err(Diagnostic::error(ErrorCode::E2006)
                .with_message(format!("Parcel '{}' registered twice", parcel.name()))
                .with_label(parcel.name(), "registered here")
                .with_secondary_label(existing.name(), "conflicts with this parcel"));
        }
        let id = ParcelId::from_raw(next_raw(self.parcels.len()));
        self.parcels.push(parcel);
        Ok(id)
    }

    /// Declare a class in `parcel`.
    ///
    /// # Errors
    ///
    /// `E2007` for an unknown parcel, `E1004` for a bad name, `E2005` if the
    /// class name, its prefixed struct symbol, or its nickname within the
    /// parcel is already taken.
    pub fn add_class(&mut self, parcel: ParcelId, decl: ClassDecl) -> DiagResult<ClassId> {
        self.ensure_declaring("add a class")?;
        let Some(owner) = self.parcels.get(parcel.index()) else {
            return Err(Diagnostic::error(ErrorCode::E2007)
                .with_message(format!("Class '{}' refers to an unknown parcel", decl.name))
                .with_label(&decl.name, "parcel was never registered"));
        };
        let name = ClassName::new(&decl.name, decl.nickname.as_deref())?;
        if self.class_index.contains_key(name.name()) {
            return Err(Diagnostic::error(ErrorCode::E2005)
                .with_message(format!("Two classes with name {}", name.name()))
                .with_label(name.name(), "declared again here"));
        }
        let struct_sym = format!("{}{}", owner.prefix().lower(), name.struct_sym());
        for existing in &self.classes {
            let (what, clashes) = if existing.full_struct_sym() == struct_sym {
                ("struct symbol", true)
            } else {
                (
                    "nickname",
                    existing.parcel() == parcel && existing.nickname() == name.nickname(),
                )
            };
            if clashes {
                return Err(Diagnostic::error(ErrorCode::E2005)
                    .with_message(format!(
                        "Class {} reuses the {what} of {}",
                        name.name(),
                        existing.name()
                    ))
                    .with_label(name.name(), format!("{what} declared again here"))
                    .with_secondary_label(existing.name(), "first declared here"));
            }
        }

        let id = ClassId::from_raw(next_raw(self.classes.len()));
        let class = Class::new(
            id,
            parcel,
            owner.prefix(),
            owner.is_included(),
            name.clone(),
            decl,
        );
        self.class_index.insert(name.name().to_string(), id);
        self.classes.push(class);
        Ok(id)
    }

    fn variable(&self, class: ClassId, decl: VarDecl, inert: bool) -> DiagResult<Variable> {
        let owner = &self.classes[class.index()];
        Variable::new(
            owner.prefix(),
            decl.exposure,
            Some(owner.class_name()),
            &decl.name,
            decl.ty,
            inert,
        )
    }

    fn param_list(&self, class: ClassId, params: Vec<ParamDecl>) -> DiagResult<ParamList> {
        let prefix = self.classes[class.index()].prefix();
        let mut list = ParamList::new();
        for param in params {
            let var = Variable::new(prefix, Exposure::Local, None, &param.name, param.ty, false)?;
            list.push(var, param.default)?;
        }
        Ok(list)
    }

    fn check_class(&self, class: ClassId) -> DiagResult<()> {
        if class.index() < self.classes.len() {
            Ok(())
        } else {
            Err(internal_error(format!("class id {} out of range", class.index())))
        }
    }

    /// Add an instance variable declared by `class` itself.
    pub fn add_member_var(&mut self, class: ClassId, decl: VarDecl) -> DiagResult<()> {
        self.ensure_declaring("add a member variable")?;
        self.check_class(class)?;
        let var = self.variable(class, decl, false)?;
        self.classes[class.index()].fresh_member_vars.push(var);
        Ok(())
    }

    /// Add a class-level variable.
    pub fn add_inert_var(&mut self, class: ClassId, decl: VarDecl) -> DiagResult<()> {
        self.ensure_declaring("add an inert variable")?;
        self.check_class(class)?;
        let var = self.variable(class, decl, true)?;
        self.classes[class.index()].inert_vars.push(var);
        Ok(())
    }

    /// Add an inert function.
    pub fn add_function(&mut self, class: ClassId, decl: FunctionDecl) -> DiagResult<()> {
        self.ensure_declaring("add a function")?;
        self.check_class(class)?;
        let params = self.param_list(class, decl.params)?;
        let owner = &self.classes[class.index()];
        let function = Function::new(
            owner.prefix(),
            decl.exposure,
            Some(owner.class_name()),
            &decl.name,
            decl.return_type,
            params,
            decl.doc,
            decl.is_inline,
        )?;
        self.classes[class.index()].functions.push(function);
        Ok(())
    }

    /// Add a method declared by `class`.
    ///
    /// # Errors
    ///
    /// `E1001`-`E1003` from method validation, `E1009` if the class already
    /// declares a method with the same dispatch name.
    pub fn add_method(&mut self, class: ClassId, decl: MethodDecl) -> DiagResult<MethodId> {
        self.ensure_declaring("add a method")?;
        self.check_class(class)?;
        let params = self.param_list(class, decl.params)?;
        let owner = &self.classes[class.index()];
        let method = Method::new(
            owner.prefix(),
            class,
            owner.class_name(),
            decl.exposure,
            &decl.name,
            decl.return_type,
            params,
            decl.doc,
            decl.modifiers,
        )?;
        if owner
            .fresh_methods
            .iter()
            .any(|&m| self.methods[m.index()].macro_sym() == method.macro_sym())
        {
            return Err(Diagnostic::error(ErrorCode::E1009)
                .with_message(format!(
                    "Method '{}' declared twice in '{}'",
                    method.macro_sym(),
                    owner.name()
                ))
                .with_label(method.subject(), "declared again here"));
        }

        let id = MethodId::from_raw(next_raw(self.methods.len()));
        self.methods.push(method);
        self.classes[class.index()].fresh_methods.push(id);
        Ok(id)
    }

    fn fresh_method_named(&self, class: ClassId, macro_sym: &str) -> DiagResult<MethodId> {
        self.check_class(class)?;
        let owner = &self.classes[class.index()];
        owner
            .fresh_methods
            .iter()
            .copied()
            .find(|&m| self.methods[m.index()].macro_sym() == macro_sym)
            .ok_or_else(|| {
                Diagnostic::error(ErrorCode::E1008)
                    .with_message(format!(
                        "Class '{}' declares no method '{macro_sym}'",
                        owner.name()
                    ))
                    .with_label(owner.name(), "host settings need a declared method")
            })
    }

    /// Bind a method declared by `class` under `alias` in host languages.
    ///
    /// Host configuration happens after `build()`, once novelty is known.
    pub fn set_host_alias(
        &mut self,
        class: ClassId,
        macro_sym: &str,
        alias: &str,
    ) -> DiagResult<()> {
        self.ensure_built("set a host alias")?;
        let id = self.fresh_method_named(class, macro_sym)?;
        self.methods[id.index()].set_host_alias(alias)
    }

    /// Keep a method declared by `class` out of host bindings.
    pub fn exclude_from_host(&mut self, class: ClassId, macro_sym: &str) -> DiagResult<()> {
        self.ensure_built("exclude a method from host bindings")?;
        let id = self.fresh_method_named(class, macro_sym)?;
        self.methods[id.index()].exclude_from_host()
    }

    /// Attach generated code to a class. The buffer only grows.
    pub fn append_autocode(&mut self, class: ClassId, code: &str) -> DiagResult<()> {
        self.check_class(class)?;
        self.classes[class.index()].append_autocode(code);
        Ok(())
    }

    #[inline]
    pub fn parcel(&self, id: ParcelId) -> &Parcel {
        &self.parcels[id.index()]
    }

    pub fn parcels(&self) -> impl Iterator<Item = (ParcelId, &Parcel)> {
        self.parcels
            .iter()
            .enumerate()
            .map(|(i, p)| (ParcelId::from_raw(next_raw(i)), p))
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn class_by_name(&self, name: &str) -> Option<&Class> {
        self.class_index.get(name).map(|&id| self.class(id))
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Classes with parents before children. Empty until `build()`.
    pub fn ordered_classes(&self) -> impl Iterator<Item = &Class> {
        self.ordered.iter().map(|&id| self.class(id))
    }

    /// Ids of the methods first declared or first overridden in `class`.
    pub fn fresh_method_ids(&self, class: ClassId) -> &[MethodId] {
        &self.class(class).fresh_methods
    }

    /// Every method reachable by `class`, in dispatch-table order.
    pub fn method_ids(&self, class: ClassId) -> &[MethodId] {
        &self.class(class).methods
    }

    /// Methods first declared or first overridden in `class`.
    pub fn fresh_methods(&self, class: ClassId) -> impl Iterator<Item = &Method> {
        self.fresh_method_ids(class).iter().map(|&m| self.method(m))
    }

    /// Ids of methods `class` reaches without declaring them.
    pub fn inherited_method_ids(&self, class: ClassId) -> Vec<MethodId> {
        let fresh = self.fresh_method_ids(class);
        self.method_ids(class)
            .iter()
            .copied()
            .filter(|m| !fresh.contains(m))
            .collect()
    }

    /// Methods `class` reaches without declaring them.
    pub fn inherited_methods(&self, class: ClassId) -> impl Iterator<Item = &Method> {
        self.inherited_method_ids(class)
            .into_iter()
            .map(|m| self.method(m))
    }

    /// Every method reachable by `class`, in dispatch-table order.
    pub fn methods(&self, class: ClassId) -> impl Iterator<Item = &Method> {
        self.method_ids(class).iter().map(|&m| self.method(m))
    }

    /// Parent class, once linked.
    pub fn parent(&self, class: ClassId) -> Option<&Class> {
        self.class(class).parent.map(|p| self.class(p))
    }

    pub fn lineage(&self) -> &LineageTable {
        &self.lineage
    }

    pub fn is_built(&self) -> bool {
        self.state == SessionState::Built
    }

    /// Drop every parcel, class and method, returning to an empty session.
    pub fn clear(&mut self) {
        *self = CompilationSession::new();
    }

    /// Resolve the hierarchy.
    ///
    /// Links parents, orders classes topologically, resolves object type
    /// prefixes, bequeaths member variables and methods down the tree,
    /// validating every override on the way. On error the session is
    /// unusable and must be cleared.
    #[tracing::instrument(level = "debug", skip_all, fields(classes = self.classes.len()))]
    pub fn build(&mut self) -> DiagResult<()> {
        self.ensure_declaring("build the hierarchy")?;
        let result = self.build_inner();
        self.state = if result.is_ok() {
            SessionState::Built
        } else {
            SessionState::Failed
        };
        result
    }

    fn build_inner(&mut self) -> DiagResult<()> {
        self.link_parents()?;
        self.order_classes()?;
        self.lineage = self.build_lineage();
        self.resolve_types()?;
        self.bequeath_member_vars();
        self.bequeath_methods()?;
        debug!(
            classes = self.classes.len(),
            methods = self.methods.len(),
            "hierarchy built"
        );
        Ok(())
    }

    fn link_parents(&mut self) -> DiagResult<()> {
        for index in 0..self.classes.len() {
            let Some(parent_name) = self.classes[index].parent_name.clone() else {
                continue;
            };
            let class_name = self.classes[index].name().to_string();
            let Some(&parent) = self.class_index.get(&parent_name) else {
                return Err(Diagnostic::error(ErrorCode::E2003)
                    .with_message(format!(
                        "Parent class '{parent_name}' of '{class_name}' not defined"
                    ))
                    .with_label(class_name, format!("extends unknown class `{parent_name}`")));
            };
            if self.classes[parent.index()].is_final {
                return Err(Diagnostic::error(ErrorCode::E2004)
                    .with_message(format!(
                        "Attempt to inherit from final class '{parent_name}' by '{class_name}'"
                    ))
                    .with_label(class_name, "extends a final class")
                    .with_secondary_label(parent_name, "declared final here"));
            }
            let child = ClassId::from_raw(next_raw(index));
            self.classes[index].parent = Some(parent);
            self.classes[parent.index()].children.push(child);
        }
        Ok(())
    }

    fn order_classes(&mut self) -> DiagResult<()> {
        let mut ordered = Vec::with_capacity(self.classes.len());
        let mut stack: Vec<ClassId> = self
            .classes
            .iter()
            .rev()
            .filter(|c| c.parent.is_none())
            .map(|c| c.id)
            .collect();
        while let Some(id) = stack.pop() {
            ordered.push(id);
            stack.extend(self.classes[id.index()].children.iter().rev().copied());
        }

        if ordered.len() != self.classes.len() {
            let mut visited = vec![false; self.classes.len()];
            for id in &ordered {
                visited[id.index()] = true;
            }
            let culprit = self
                .classes
                .iter()
                .find(|c| !visited[c.id.index()])
                .map_or_else(String::new, |c| c.name().to_string());
            return Err(Diagnostic::error(ErrorCode::E2009)
                .with_message(format!("Inheritance cycle involving '{culprit}'"))
                .with_label(culprit, "is its own ancestor"));
        }
        self.ordered = ordered;
        Ok(())
    }

    fn build_lineage(&self) -> LineageTable {
        let mut lineage = LineageTable::default();
        for class in &self.classes {
            if let Some(parent) = class.parent {
                lineage.insert(
                    class.full_struct_sym(),
                    self.classes[parent.index()].full_struct_sym(),
                );
            }
        }
        lineage
    }

    fn resolve_types(&mut self) -> DiagResult<()> {
        let resolver = TypeResolver::new(&self.classes);
        for class in &mut self.classes {
            let (parcel, subject) = (class.parcel, class.name().to_string());
            let Class {
                fresh_member_vars,
                inert_vars,
                functions,
                ..
            } = class;
            for var in fresh_member_vars.iter_mut().chain(inert_vars.iter_mut()) {
                resolver.resolve(var.ty_mut(), parcel, &subject)?;
            }
            for func in functions.iter_mut() {
                for ty in func.types_mut() {
                    resolver.resolve(ty, parcel, &subject)?;
                }
            }
        }
        for method in &mut self.methods {
            let owner = &self.classes[method.owner().index()];
            let (parcel, subject) = (owner.parcel, method.subject());
            for ty in method.types_mut() {
                resolver.resolve(ty, parcel, &subject)?;
            }
        }
        Ok(())
    }

    fn bequeath_member_vars(&mut self) {
        for i in 0..self.ordered.len() {
            let id = self.ordered[i];
            let mut vars = match self.classes[id.index()].parent {
                Some(parent) => self.classes[parent.index()].member_vars.clone(),
                None => Vec::new(),
            };
            let class = &mut self.classes[id.index()];
            vars.extend(class.fresh_member_vars.iter().cloned());
            class.member_vars = vars;
        }
    }

    fn bequeath_methods(&mut self) -> DiagResult<()> {
        for i in 0..self.ordered.len() {
            let id = self.ordered[i];
            let inherited = match self.classes[id.index()].parent {
                Some(parent) => self.classes[parent.index()].methods.clone(),
                None => Vec::new(),
            };
            let mut declared = self.classes[id.index()].fresh_methods.clone();
            let mut claimed = vec![false; declared.len()];
            let mut methods = Vec::with_capacity(inherited.len() + declared.len());

            for parent_method in inherited {
                let macro_sym = self.methods[parent_method.index()].macro_sym();
                let overrider = declared
                    .iter()
                    .position(|&m| self.methods[m.index()].macro_sym() == macro_sym);
                match overrider {
                    Some(pos) => {
                        let ancestor = self.methods[parent_method.index()].clone();
                        let candidate = declared[pos];
                        self.methods[candidate.index()]
                            .override_method(&ancestor, &self.lineage)?;
                        trace!(method = %self.methods[candidate.index()].subject(), "overridden");
                        claimed[pos] = true;
                        methods.push(candidate);
                    }
                    None => methods.push(parent_method),
                }
            }
            methods.extend(
                declared
                    .iter()
                    .zip(&claimed)
                    .filter(|(_, claimed)| !**claimed)
                    .map(|(&m, _)| m),
            );

            if self.classes[id.index()].is_final {
                for slot in &mut methods {
                    if self.methods[slot.index()].is_final() {
                        continue;
                    }
                    let finalized = self.methods[slot.index()].finalize();
                    let new_id = MethodId::from_raw(next_raw(self.methods.len()));
                    trace!(
                        method = %finalized.subject(),
                        class = %self.classes[id.index()].name(),
                        "finalized"
                    );
                    self.methods.push(finalized);
                    if let Some(fresh) = declared.iter_mut().find(|m| **m == *slot) {
                        *fresh = new_id;
                    }
                    *slot = new_id;
                }
            }

            let class = &mut self.classes[id.index()];
            class.fresh_methods = declared;
            class.methods = methods;
        }
        Ok(())
    }
}

/// Maps unprefixed class specifiers to parcel prefixes.
struct TypeResolver {
    by_struct: FxHashMap<String, Vec<(ParcelId, String)>>,
}

impl TypeResolver {
    fn new(classes: &[Class]) -> Self {
        let mut by_struct: FxHashMap<String, Vec<(ParcelId, String)>> = FxHashMap::default();
        for class in classes {
            by_struct
                .entry(class.struct_sym().to_string())
                .or_default()
                .push((class.parcel, class.prefix().lower().to_string()));
        }
        TypeResolver { by_struct }
    }

    /// Give an unprefixed object type the prefix of the class it names,
    /// preferring classes in `parcel`.
    fn resolve(&self, ty: &mut Type, parcel: ParcelId, subject: &str) -> DiagResult<()> {
        let Some(object) = ty.as_object_mut() else {
            return Ok(());
        };
        if object.prefix().is_some() {
            return Ok(());
        }
        let candidates = self
            .by_struct
            .get(object.specifier())
            .map_or(&[][..], Vec::as_slice);
        let chosen = candidates
            .iter()
            .find(|(p, _)| *p == parcel)
            .or(match candidates {
                [only] => Some(only),
                _ => None,
            });
        match chosen {
            Some((_, prefix)) => {
                object.set_prefix(prefix);
                Ok(())
            }
            None => {
                let message = if candidates.is_empty() {
                    format!("Unknown object type '{}'", object.specifier())
                } else {
                    format!("Ambiguous object type '{}'", object.specifier())
                };
                Err(Diagnostic::error(ErrorCode::E2008)
                    .with_message(message)
                    .with_label(subject, "mentions this type")
                    .with_suggestion("declare the class or spell the type with its parcel prefix"))
            }
        }
    }
}
