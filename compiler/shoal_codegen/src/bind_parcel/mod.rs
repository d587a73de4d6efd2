//! Per-parcel C output: the parcel header with the runtime prelude, the
//! parcel source file holding every class's dispatch data, and the header
//! declaring host override callbacks.

use shoal_model::{Class, CompilationSession, Parcel, ParcelId};

use crate::bind_class::ClassBinding;
use crate::c_ast::{Item, Signature, Stmt, Storage};
use crate::layout::{DispatchLayout, DISPATCH_HEADER_SLOTS};

/// Guard shared by every parcel header so the runtime types are declared
/// once per translation unit.
const RUNTIME_GUARD: &str = "H_SHOAL_RUNTIME";

pub struct ParcelBinding<'a> {
    session: &'a CompilationSession,
    id: ParcelId,
    parcel: &'a Parcel,
    layout: DispatchLayout,
}

impl<'a> ParcelBinding<'a> {
    pub fn new(session: &'a CompilationSession, id: ParcelId, layout: DispatchLayout) -> Self {
        ParcelBinding {
            session,
            id,
            parcel: session.parcel(id),
            layout,
        }
    }

    pub fn parcel(&self) -> &'a Parcel {
        self.parcel
    }

    /// Classes of this parcel, parents before children.
    pub fn classes(&self) -> impl Iterator<Item = &'a Class> + 'a {
        let id = self.id;
        self.session
            .ordered_classes()
            .filter(move |class| class.parcel() == id)
    }

    fn dynamic_classes(&self) -> impl Iterator<Item = &'a Class> + 'a {
        self.classes().filter(|class| !class.is_inert())
    }

    fn binding(&self, class: &'a Class) -> ClassBinding<'a> {
        ClassBinding::new(self.session, class, self.layout)
    }

    /// `neato_parcel.h`
    pub fn parcel_h_name(&self) -> String {
        format!("{}parcel.h", self.parcel.prefix().lower())
    }

    /// `neato_parcel.c`
    pub fn parcel_c_name(&self) -> String {
        format!("{}parcel.c", self.parcel.prefix().lower())
    }

    /// `neato_callbacks.h`
    pub fn callbacks_h_name(&self) -> String {
        format!("{}callbacks.h", self.parcel.prefix().lower())
    }

    /// `neato_bootstrap_parcel`
    pub fn bootstrap_func(&self) -> String {
        format!("{}bootstrap_parcel", self.parcel.prefix().lower())
    }

    fn guard(&self, what: &str) -> String {
        format!("H_{}{what}", self.parcel.prefix().upper())
    }

    /// The parcel header, without boilerplate.
    pub fn to_parcel_h(&self) -> Item {
        let prefix = self.parcel.prefix();
        let visible = format!("{}VISIBLE", prefix.upper());

        let mut items = vec![
            Item::system_include("stddef.h"),
            Item::system_include("stdint.h"),
            Item::Blank,
        ];
        items.push(runtime_prelude(self.layout));
        items.push(Item::Blank);

        items.push(Item::comment(
            "Symbol visibility for the parcel's shared library.",
        ));
        items.push(Item::If {
            cond: format!("defined({})", self.parcel.privacy_sym()),
            then: vec![Item::define(visible.clone(), "SHOAL_EXPORT")],
            otherwise: vec![Item::define(visible, "SHOAL_IMPORT")],
        });
        items.push(Item::Blank);

        let structs: Vec<&Class> = self.dynamic_classes().collect();
        if !structs.is_empty() {
            items.push(Item::comment("Opaque struct typedefs for every class."));
            for class in structs {
                let full = class.full_struct_sym();
                items.push(Item::Typedef {
                    target: format!("struct {full}"),
                    alias: full,
                });
            }
            items.push(Item::Blank);
        }

        items.push(Item::Prototype(Signature::new(
            Storage::exported(prefix.upper()),
            "void",
            self.bootstrap_func(),
            "void",
        )));

        Item::Guard {
            symbol: self.guard("PARCEL"),
            items: vec![Item::ExternC(items)],
        }
    }

    /// The parcel source file, without boilerplate.
    pub fn to_parcel_c(&self) -> Vec<Item> {
        let prefix = self.parcel.prefix();
        let mut items = vec![
            Item::define(self.parcel.privacy_sym(), ""),
            Item::define(format!("{}USE_SHORT_NAMES", prefix.upper()), ""),
        ];
        // The class spec array takes `sizeof` of every IVARS struct, which
        // each header only exposes under its class privacy symbol.
        let classes: Vec<&Class> = self.classes().collect();
        for class in &classes {
            items.push(Item::define(class.privacy_symbol(), ""));
        }
        items.push(Item::Blank);
        items.push(Item::include(self.parcel_h_name()));
        items.push(Item::include(self.callbacks_h_name()));
        for class in &classes {
            items.push(Item::include(class.include_h()));
        }
        items.push(Item::Blank);

        for class in &classes {
            let mut data = self.binding(class).to_c_data();
            if data.is_empty() {
                continue;
            }
            items.push(Item::comment(class.name()));
            items.push(Item::Blank);
            items.append(&mut data);
        }

        let specs: Vec<_> = self
            .dynamic_classes()
            .map(|class| self.binding(class).spec_def())
            .collect();
        let num_specs = specs.len();
        let spec_array = format!("{}CLASS_SPECS", prefix.upper());
        if num_specs > 0 {
            items.push(Item::Array {
                storage: Storage::StaticConst,
                ty: "shoal_ClassSpec".to_string(),
                name: spec_array.clone(),
                elements: specs,
            });
            items.push(Item::Blank);
        }

        let body = if num_specs > 0 {
            vec![Stmt::expr(format!(
                "shoal_bootstrap_classes({spec_array}, {num_specs})"
            ))]
        } else {
            Vec::new()
        };
        items.push(Item::Function {
            sig: Signature::new(Storage::Plain, "void", self.bootstrap_func(), "void"),
            body,
        });
        items
    }

    /// Declarations of every host override callback in the parcel.
    pub fn to_callbacks_h(&self) -> Item {
        let mut items = vec![Item::include(self.parcel_h_name()), Item::Blank];
        for class in self.classes() {
            let binding = self.binding(class);
            let mut decs = binding.callback_decs();
            if decs.is_empty() {
                continue;
            }
            items.push(Item::include(class.include_h()));
            items.push(Item::Blank);
            items.append(&mut decs);
        }
        Item::Guard {
            symbol: self.guard("CALLBACKS"),
            items: vec![Item::ExternC(items)],
        }
    }
}

/// Runtime types and macros the generated headers rely on.
///
/// The object layout is a pointer to the class, and the class struct starts
/// with `DISPATCH_HEADER_SLOTS` pointer-sized fields followed by the
/// dispatch table.
fn runtime_prelude(layout: DispatchLayout) -> Item {
    let mut items = vec![
        Item::If {
            cond: "defined(_MSC_VER)".to_string(),
            then: vec![Item::define("SHOAL_INLINE", "__inline")],
            otherwise: vec![Item::define("SHOAL_INLINE", "inline")],
        },
        Item::If {
            cond: "defined(_WIN32)".to_string(),
            then: vec![
                Item::define("SHOAL_EXPORT", "__declspec(dllexport)"),
                Item::define("SHOAL_IMPORT", "__declspec(dllimport)"),
            ],
            otherwise: vec![
                Item::define("SHOAL_EXPORT", ""),
                Item::define("SHOAL_IMPORT", ""),
            ],
        },
        Item::Blank,
        Item::Define {
            name: "SHOAL_UNUSED_VAR".to_string(),
            params: Some("var".to_string()),
            body: vec!["((void)(var))".to_string()],
        },
        Item::Define {
            name: "SHOAL_UNREACHABLE_RETURN".to_string(),
            params: Some("type".to_string()),
            body: vec!["return (type)0".to_string()],
        },
        Item::Define {
            name: "SHOAL_THROW".to_string(),
            params: Some("...".to_string()),
            body: vec!["shoal_throw(__VA_ARGS__)".to_string()],
        },
        Item::Define {
            name: "SHOAL_INCREF".to_string(),
            params: Some("obj".to_string()),
            body: vec!["shoal_incref((void*)(obj))".to_string()],
        },
        Item::Define {
            name: "SHOAL_DECREF".to_string(),
            params: Some("obj".to_string()),
            body: vec!["shoal_decref((void*)(obj))".to_string()],
        },
        Item::Blank,
        Item::FnPtrTypedef {
            ret: "void".to_string(),
            name: "shoal_method_t".to_string(),
            params: "const void *vself".to_string(),
        },
        Item::Typedef {
            target: "struct shoal_Class".to_string(),
            alias: "shoal_Class".to_string(),
        },
        Item::Blank,
        Item::comment(format!(
            "{DISPATCH_HEADER_SLOTS} header slots of {} bytes precede the dispatch table.",
            layout.pointer_size
        )),
        Item::Struct {
            name: "shoal_Class".to_string(),
            fields: vec![
                "shoal_Class *parent;".to_string(),
                "const char *name;".to_string(),
                "size_t obj_alloc_size;".to_string(),
                "size_t num_methods;".to_string(),
                "shoal_method_t methods[1];".to_string(),
            ],
        },
        Item::Blank,
    ];

    for (name, fields) in [
        (
            "shoal_NovelMethSpec",
            &[
                "size_t *offset;",
                "const char *name;",
                "shoal_method_t func;",
                "shoal_method_t callback_func;",
            ][..],
        ),
        (
            "shoal_OverriddenMethSpec",
            &[
                "size_t *offset;",
                "size_t *parent_offset;",
                "shoal_method_t func;",
            ][..],
        ),
        (
            "shoal_InheritedMethSpec",
            &["size_t *offset;", "size_t *parent_offset;"][..],
        ),
        (
            "shoal_ClassSpec",
            &[
                "shoal_Class **klass;",
                "shoal_Class **parent;",
                "const char *name;",
                "size_t ivars_size;",
                "size_t *ivars_offset_ptr;",
                "uint32_t num_novel_meths;",
                "uint32_t num_overridden_meths;",
                "uint32_t num_inherited_meths;",
                "const shoal_NovelMethSpec *novel_meth_specs;",
                "const shoal_OverriddenMethSpec *overridden_meth_specs;",
                "const shoal_InheritedMethSpec *inherited_meth_specs;",
            ][..],
        ),
    ] {
        items.push(Item::Typedef {
            target: format!("struct {name}"),
            alias: name.to_string(),
        });
        items.push(Item::Struct {
            name: name.to_string(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        });
        items.push(Item::Blank);
    }

    for (ret, name, params) in [
        ("void", "shoal_throw", "const char *pattern, ..."),
        ("void*", "shoal_incref", "void *obj"),
        ("uint32_t", "shoal_decref", "void *obj"),
        (
            "void",
            "shoal_bootstrap_classes",
            "const shoal_ClassSpec *specs, size_t num_specs",
        ),
    ] {
        items.push(Item::Prototype(Signature::new(
            Storage::Plain,
            ret,
            name,
            params,
        )));
    }
    items.push(Item::Blank);

    items.push(Item::Function {
        sig: Signature::new(
            Storage::StaticInline,
            "shoal_method_t",
            "shoal_obj_method",
            "const void *self, size_t offset",
        ),
        body: vec![
            Stmt::decl(
                "const shoal_Class",
                "*klass",
                "*(shoal_Class* const*)self",
            ),
            Stmt::ret("*(shoal_method_t*)((char*)klass + offset)"),
        ],
    });
    items.push(Item::Blank);
    items.push(Item::Function {
        sig: Signature::new(
            Storage::StaticInline,
            "const char*",
            "shoal_class_name_of",
            "const void *self, shoal_Class *fallback",
        ),
        body: vec![
            Stmt::decl(
                "const shoal_Class",
                "*klass",
                "self ? *(shoal_Class* const*)self : fallback",
            ),
            Stmt::ret("klass ? klass->name : \"\""),
        ],
    });

    Item::Guard {
        symbol: RUNTIME_GUARD.to_string(),
        items,
    }
}
