//! Per-class C output: the class header and the class's share of the
//! parcel source file.

use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use shoal_model::{Class, CompilationSession, DocComment, Method, MethodId};

use crate::bind_method;
use crate::c_ast::{Field, Init, Item, Signature, Stmt, Storage};
use crate::layout::DispatchLayout;

/// Generates C for one class of a built session.
pub struct ClassBinding<'a> {
    session: &'a CompilationSession,
    class: &'a Class,
    layout: DispatchLayout,
}

/// Kind of method spec a dispatch slot contributes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpecKind {
    Novel,
    Overridden,
    Inherited,
}

impl<'a> ClassBinding<'a> {
    pub fn new(session: &'a CompilationSession, class: &'a Class, layout: DispatchLayout) -> Self {
        ClassBinding {
            session,
            class,
            layout,
        }
    }

    fn parent(&self) -> Option<&'a Class> {
        self.class.parent().map(|p| self.session.class(p))
    }

    fn methods(&self) -> impl Iterator<Item = (MethodId, &'a Method)> + 'a {
        let session = self.session;
        session
            .method_ids(self.class.id())
            .iter()
            .map(move |&m| (m, session.method(m)))
    }

    fn fresh_methods(&self) -> impl Iterator<Item = &'a Method> + 'a {
        self.session.fresh_methods(self.class.id())
    }

    fn short_names_macro(&self) -> String {
        format!("{}USE_SHORT_NAMES", self.class.prefix().upper())
    }

    /// Which spec array the method in a dispatch slot belongs to.
    pub fn spec_kind(&self, id: MethodId) -> SpecKind {
        let fresh = self.session.fresh_method_ids(self.class.id()).contains(&id);
        match (fresh, self.session.method(id).is_novel()) {
            (true, true) => SpecKind::Novel,
            (true, false) => SpecKind::Overridden,
            (false, _) => SpecKind::Inherited,
        }
    }

    /// Include guard for the class header: `H_NEATO_ANIMAL_DOG`.
    pub fn include_guard(&self) -> String {
        let stem = self.class.name().replace("::", "_");
        format!("H_{}", stem.to_ascii_uppercase())
    }

    /// Verify the dispatch table and struct layout against the parent.
    ///
    /// # Errors
    ///
    /// `E3001` if an inherited slot disagrees with the parent's, `E3002` if
    /// the member variables are not the parent's followed by the class's
    /// own.
    pub fn check_consistency(&self) -> DiagResult<()> {
        let Some(parent) = self.parent() else {
            return Ok(());
        };

        let mine = self.session.method_ids(self.class.id());
        let theirs = self.session.method_ids(parent.id());
        if mine.len() < theirs.len() {
            return Err(Diagnostic::error(ErrorCode::E3001)
                .with_message(format!(
                    "'{}' has {} dispatch slots, fewer than parent '{}' ({})",
                    self.class.name(),
                    mine.len(),
                    parent.name(),
                    theirs.len()
                ))
                .with_label(self.class.name(), "dispatch table is truncated"));
        }
        for (slot, (&m, &p)) in mine.iter().zip(theirs).enumerate() {
            let ours = self.session.method(m).macro_sym();
            let inherited = self.session.method(p).macro_sym();
            if ours != inherited {
                return Err(Diagnostic::error(ErrorCode::E3001)
                    .with_message(format!(
                        "Dispatch slot {slot} of '{}' holds '{ours}' but parent '{}' holds '{inherited}'",
                        self.class.name(),
                        parent.name()
                    ))
                    .with_label(self.class.name(), "slot order must extend the parent's"));
            }
        }

        let members = self.class.member_vars();
        let inherited = parent.member_vars();
        let prefix_ok = members.len() == inherited.len() + self.class.fresh_member_vars().len()
            && members.starts_with(inherited)
            && members[inherited.len()..] == *self.class.fresh_member_vars();
        if !prefix_ok {
            return Err(Diagnostic::error(ErrorCode::E3002)
                .with_message(format!(
                    "Member variables of '{}' do not extend those of '{}'",
                    self.class.name(),
                    parent.name()
                ))
                .with_label(self.class.name(), "struct layout is not prefix-compatible")
                .with_secondary_label(parent.name(), "parent layout"));
        }
        Ok(())
    }

    /// Body of the class header, without include guard or boilerplate.
    pub fn to_c_header(&self) -> Vec<Item> {
        let mut items = Vec::new();
        if let Some(doc) = self.class.doc() {
            items.push(doc_item(doc));
            items.push(Item::Blank);
        }
        if self.class.is_inert() {
            self.inert_header(&mut items);
        } else {
            self.dynamic_header(&mut items);
        }
        if !self.class.autocode().is_empty() {
            items.push(Item::Verbatim(self.class.autocode().to_string()));
            items.push(Item::Blank);
        }
        items
    }

    fn inert_header(&self, items: &mut Vec<Item>) {
        section(items, "Declare this class's inert variables.");
        items.extend(self.inert_var_declarations());
        items.push(Item::Blank);
        section(items, "Declare this class's inert functions.");
        items.extend(self.sub_declarations());
        section(items, "Define \"short names\" for this class's symbols.");
        items.push(self.short_names());
        items.push(Item::Blank);
    }

    fn dynamic_header(&self, items: &mut Vec<Item>) {
        let privacy = self.class.privacy_symbol();
        let prefix_upper = self.class.prefix().upper();

        if let Some(parent) = self.parent() {
            section(items, "Include the header for this class's parent.");
            items.push(Item::include(parent.include_h()));
            items.push(Item::Blank);
        }

        section(items, "Define the struct layout for instances of this class.");
        let mut layout = self.ivars_func();
        layout.push(self.struct_definition());
        items.push(Item::IfDef {
            symbol: privacy,
            items: layout,
        });
        items.push(Item::Blank);

        section(items, "Declare this class's inert variables.");
        items.extend(self.inert_var_declarations());
        items.push(Item::Blank);

        section(
            items,
            "Declare both this class's inert functions and the C functions which\n\
             implement this class's dynamic methods.",
        );
        items.extend(self.sub_declarations());

        section(
            items,
            "Define typedefs for each dynamic method, allowing us to cast generic\n\
             pointers to the appropriate function pointer type more cleanly.",
        );
        for (_, method) in self.methods() {
            items.push(bind_method::typedef_dec(method, self.class));
            items.push(Item::Blank);
        }

        section(
            items,
            "Define the inline functions which implement this class's virtual methods.",
        );
        for (_, method) in self.methods() {
            items.extend(bind_method::method_def(method, self.class));
            items.push(Item::Blank);
        }

        section(items, "Declare the singleton for this class.");
        items.push(Item::extern_decl(
            Storage::exported(prefix_upper),
            format!("shoal_Class *{}", self.class.full_class_var()),
        ));
        items.push(Item::Blank);

        section(items, "Define \"short names\" for this class's symbols.");
        items.push(self.short_names());
        items.push(Item::Blank);
    }

    fn ivars_func(&self) -> Vec<Item> {
        let class = self.class;
        let full_struct = class.full_ivars_struct();
        let full_offset = class.full_ivars_offset();
        vec![
            Item::extern_decl(Storage::Plain, format!("size_t {full_offset}")),
            Item::Typedef {
                target: format!("struct {full_struct}"),
                alias: full_struct.clone(),
            },
            Item::Function {
                sig: Signature::new(
                    Storage::StaticInline,
                    format!("{full_struct}*"),
                    class.full_ivars_func(),
                    format!("{} *self", class.full_struct_sym()),
                ),
                body: vec![
                    Stmt::decl("char", "*ptr", format!("(char*)self + {full_offset}")),
                    Stmt::ret(format!("({full_struct}*)ptr")),
                ],
            },
            Item::IfDef {
                symbol: self.short_names_macro(),
                items: vec![
                    Item::define(class.short_ivars_struct(), full_struct),
                    Item::define(class.short_ivars_func(), class.full_ivars_func()),
                ],
            },
        ]
    }

    /// The struct holding the member variables this class declares itself.
    fn struct_definition(&self) -> Item {
        let mut fields: Vec<String> = self
            .class
            .fresh_member_vars()
            .iter()
            .map(shoal_model::Variable::local_declaration)
            .collect();
        if fields.is_empty() {
            fields.push("char shoal_empty_;".to_string());
        }
        Item::Struct {
            name: self.class.full_ivars_struct(),
            fields,
        }
    }

    fn inert_var_declarations(&self) -> Vec<Item> {
        let storage = Storage::exported(self.class.prefix().upper());
        self.class
            .inert_vars()
            .iter()
            .map(|var| Item::extern_decl(storage.clone(), var.global_c()))
            .collect()
    }

    fn sub_declarations(&self) -> Vec<Item> {
        let prefix_upper = self.class.prefix().upper();
        let mut items = Vec::new();
        for func in self.class.functions() {
            if let Some(doc) = func.doc() {
                items.push(doc_item(doc));
            }
            let storage = if func.is_inline() {
                Storage::StaticInline
            } else {
                Storage::exported(prefix_upper)
            };
            items.push(Item::Prototype(Signature::new(
                storage,
                func.return_type().to_c(),
                func.full_func_sym(),
                func.params().to_c(),
            )));
            items.push(Item::Blank);
        }
        if !self.class.is_inert() {
            for method in self.fresh_methods() {
                if let Some(doc) = method.doc() {
                    items.push(doc_item(doc));
                }
                items.push(bind_method::imp_declaration(method, prefix_upper));
                items.push(Item::Blank);
            }
        }
        items
    }

    /// Short aliases for every symbol of the class, behind the parcel's
    /// opt-in macro.
    pub fn short_names(&self) -> Item {
        let class = self.class;
        let mut defines = Vec::new();
        if !class.is_inert() {
            defines.push(Item::define(class.struct_sym(), class.full_struct_sym()));
            defines.push(Item::define(class.short_class_var(), class.full_class_var()));
        }
        for func in class.functions() {
            defines.push(Item::define(func.short_func_sym(), func.full_func_sym()));
        }
        for var in class.inert_vars() {
            defines.push(Item::define(var.symbol().short_sym(), var.symbol().full_sym()));
        }
        if !class.is_inert() {
            for method in self.fresh_methods() {
                defines.push(Item::define(
                    method.short_imp_func(),
                    method.implementing_func_sym(),
                ));
            }
            for (_, method) in self.methods() {
                defines.push(Item::define(
                    method.short_method_sym(class),
                    method.full_method_sym(class),
                ));
                defines.push(Item::define(
                    method.short_typedef(class),
                    method.full_typedef(class),
                ));
            }
        }
        Item::IfDef {
            symbol: self.short_names_macro(),
            items: defines,
        }
    }

    /// The class's definitions in the parcel source file.
    pub fn to_c_data(&self) -> Vec<Item> {
        if self.class.is_inert() {
            return Vec::new();
        }
        let class = self.class;
        let spec_base = class.full_class_var();
        let mut offsets = Vec::new();
        let mut abstract_defs = Vec::new();
        let mut novel = Vec::new();
        let mut overridden = Vec::new();
        let mut inherited = Vec::new();

        for (slot, (id, method)) in self.methods().enumerate() {
            offsets.push(Item::Var {
                storage: Storage::Plain,
                ty: "size_t".to_string(),
                name: method.full_offset_sym(class),
                init: Some(self.layout.offset(slot).to_string()),
            });
            let kind = self.spec_kind(id);
            if kind != SpecKind::Inherited && method.is_abstract() {
                abstract_defs.push(bind_method::abstract_def(method));
                abstract_defs.push(Item::Blank);
            }
            match (kind, self.parent()) {
                (SpecKind::Novel, _) => novel.push(bind_method::novel_spec(method, class)),
                (SpecKind::Overridden, Some(parent)) => {
                    overridden.push(bind_method::overridden_spec(method, class, parent));
                }
                (SpecKind::Inherited, Some(parent)) => {
                    inherited.push(bind_method::inherited_spec(method, class, parent));
                }
                (_, None) => {}
            }
        }

        let mut items = Vec::new();
        section(
            &mut items,
            "Offset from the top of the object at which the IVARS struct\ncan be found.",
        );
        items.push(Item::var(
            Storage::Plain,
            "size_t",
            class.full_ivars_offset(),
        ));
        items.push(Item::Blank);

        section(
            &mut items,
            "Offsets for method pointers, measured in bytes, from the top\n\
             of this class's dispatch table.",
        );
        items.extend(offsets);
        items.push(Item::Blank);

        if !abstract_defs.is_empty() {
            section(&mut items, "Define abstract methods of this class.");
            items.extend(abstract_defs);
        }

        section(
            &mut items,
            "Define the method specs used during class initialization.",
        );
        for (ty, suffix, elements) in [
            ("shoal_NovelMethSpec", "NOVEL_METHS", novel),
            ("shoal_OverriddenMethSpec", "OVERRIDDEN_METHS", overridden),
            ("shoal_InheritedMethSpec", "INHERITED_METHS", inherited),
        ] {
            if elements.is_empty() {
                continue;
            }
            items.push(Item::Array {
                storage: Storage::StaticConst,
                ty: ty.to_string(),
                name: format!("{spec_base}_{suffix}"),
                elements,
            });
            items.push(Item::Blank);
        }

        section(&mut items, "Define this class's singleton.");
        items.push(Item::var(Storage::Plain, "shoal_Class", format!("*{spec_base}")));
        items.push(Item::Blank);
        items
    }

    /// Entry of the parcel's class spec array.
    pub fn spec_def(&self) -> Init {
        let class = self.class;
        let spec_base = class.full_class_var();
        let (mut num_novel, mut num_overridden, mut num_inherited) = (0usize, 0usize, 0usize);
        for (id, _) in self.methods() {
            match self.spec_kind(id) {
                SpecKind::Novel => num_novel += 1,
                SpecKind::Overridden => num_overridden += 1,
                SpecKind::Inherited => num_inherited += 1,
            }
        }
        let array = |count: usize, suffix: &str| {
            if count == 0 {
                "NULL".to_string()
            } else {
                format!("{spec_base}_{suffix}")
            }
        };
        let parent_ref = self
            .parent()
            .map_or_else(|| "NULL".to_string(), |p| format!("&{}", p.full_class_var()));

        Init::Fields(vec![
            Field::new(format!("&{spec_base}"), "klass"),
            Field::new(parent_ref, "parent"),
            Field::new(format!("\"{}\"", class.name()), "name"),
            Field::new(format!("sizeof({})", class.full_ivars_struct()), "ivars_size"),
            Field::new(format!("&{}", class.full_ivars_offset()), "ivars_offset_ptr"),
            Field::new(num_novel.to_string(), "num_novel"),
            Field::new(num_overridden.to_string(), "num_overridden"),
            Field::new(num_inherited.to_string(), "num_inherited"),
            Field::new(array(num_novel, "NOVEL_METHS"), "novel_meth_specs"),
            Field::new(array(num_overridden, "OVERRIDDEN_METHS"), "overridden_meth_specs"),
            Field::new(array(num_inherited, "INHERITED_METHS"), "inherited_meth_specs"),
        ])
    }

    /// Declarations of the host override callbacks for this class.
    pub fn callback_decs(&self) -> Vec<Item> {
        if self.class.is_inert() {
            return Vec::new();
        }
        let mut items = Vec::new();
        for method in self.fresh_methods() {
            if bind_method::has_host_callback(method) {
                items.push(bind_method::callback_dec(method));
                items.push(Item::Blank);
            }
        }
        items
    }
}

fn section(items: &mut Vec<Item>, text: &str) {
    items.push(Item::comment(text));
    items.push(Item::Blank);
}

/// Render a parsed doc comment back into a `/** */` block.
pub(crate) fn doc_item(doc: &DocComment) -> Item {
    let mut text = doc.description();
    for (name, desc) in doc.params() {
        text.push_str(&format!("\n\n@param {name} {desc}"));
    }
    if let Some(retval) = doc.retval() {
        text.push_str(&format!("\n\n@return {retval}"));
    }
    Item::DocComment(text)
}
