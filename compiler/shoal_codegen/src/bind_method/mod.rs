//! Per-method C output: invocation thunks, typedefs, method specs and
//! abstract stubs.

use shoal_model::{Class, Method, ObjectType, Type};

use crate::c_ast::{Field, Init, Item, Signature, Stmt, Storage};

/// Full struct symbol of the method's `self` type: `neato_Animal`.
pub(crate) fn self_struct(method: &Method) -> String {
    method
        .self_type()
        .and_then(Type::as_object)
        .map(ObjectType::full_struct_sym)
        .unwrap_or_default()
}

/// Invocation symbol for `method` as seen from `invoker`.
///
/// Final methods alias the implementing function directly. Virtual methods
/// get a static inline thunk that fetches the function pointer from the
/// object's dispatch table.
pub fn method_def(method: &Method, invoker: &Class) -> Vec<Item> {
    if method.is_final() {
        final_method_def(method, invoker)
    } else {
        virtual_method_def(method, invoker)
    }
}

fn final_method_def(method: &Method, invoker: &Class) -> Vec<Item> {
    let arg_names = method.params().name_list();
    vec![
        Item::extern_decl(
            Storage::Plain,
            format!("size_t {}", method.full_offset_sym(invoker)),
        ),
        Item::Define {
            name: method.full_method_sym(invoker),
            params: Some(arg_names.clone()),
            body: vec![format!(
                "{}(({}*){arg_names})",
                method.implementing_func_sym(),
                self_struct(method)
            )],
        },
    ]
}

fn virtual_method_def(method: &Method, invoker: &Class) -> Vec<Item> {
    let offset = method.full_offset_sym(invoker);
    let typedef = method.full_typedef(invoker);
    let rest = method.params().iter().skip(1);

    let mut params = format!("const {} *self", invoker.full_struct_sym());
    let mut args = format!("({}*)self", self_struct(method));
    for param in rest {
        params.push_str(", ");
        params.push_str(&param.var.local_c());
        args.push_str(", ");
        args.push_str(param.var.name());
    }

    let call = format!("method({args})");
    let invoke = if method.return_type().is_void() {
        Stmt::expr(call)
    } else {
        Stmt::ret(call)
    };

    vec![
        Item::extern_decl(
            Storage::exported(invoker.prefix().upper()),
            format!("size_t {offset}"),
        ),
        Item::Function {
            sig: Signature::new(
                Storage::StaticInline,
                method.return_type().to_c(),
                method.full_method_sym(invoker),
                params,
            ),
            body: vec![
                Stmt::decl(
                    format!("const {typedef}"),
                    "method",
                    format!("({typedef})shoal_obj_method(self, {offset})"),
                ),
                invoke,
            ],
        },
    ]
}

/// Function pointer typedef for casting dispatch-table entries.
pub fn typedef_dec(method: &Method, invoker: &Class) -> Item {
    Item::FnPtrTypedef {
        ret: method.return_type().to_c(),
        name: method.full_typedef(invoker),
        params: method.params().to_c(),
    }
}

/// Declaration of the implementing function.
pub fn imp_declaration(method: &Method, prefix_upper: &str) -> Item {
    let storage = if method.is_final() {
        Storage::exported(prefix_upper)
    } else {
        Storage::Plain
    };
    Item::Prototype(Signature::new(
        storage,
        method.return_type().to_c(),
        method.implementing_func_sym(),
        method.params().to_c(),
    ))
}

/// Whether hosts may override `method` through a callback installed in the
/// dispatch table.
pub fn has_host_callback(method: &Method) -> bool {
    method.is_novel() && !method.is_final() && !method.is_excluded_from_host()
}

/// Spec entry for a method first declared by `invoker`.
pub fn novel_spec(method: &Method, invoker: &Class) -> Init {
    let callback = if has_host_callback(method) {
        method.full_override_sym()
    } else {
        "NULL".to_string()
    };
    Init::Fields(vec![
        Field::new(format!("&{}", method.full_offset_sym(invoker)), "offset"),
        Field::new(format!("\"{}\"", method.macro_sym()), "name"),
        Field::new(
            format!("(shoal_method_t){}", method.implementing_func_sym()),
            "func",
        ),
        Field::new(format!("(shoal_method_t){callback}"), "callback_func"),
    ])
}

/// Spec entry for a method `invoker` overrides.
pub fn overridden_spec(method: &Method, invoker: &Class, parent: &Class) -> Init {
    Init::Fields(vec![
        Field::new(format!("&{}", method.full_offset_sym(invoker)), "offset"),
        Field::new(format!("&{}", method.full_offset_sym(parent)), "parent_offset"),
        Field::new(
            format!("(shoal_method_t){}", method.implementing_func_sym()),
            "func",
        ),
    ])
}

/// Spec entry for a method `invoker` inherits unchanged.
pub fn inherited_spec(method: &Method, invoker: &Class, parent: &Class) -> Init {
    Init::Fields(vec![
        Field::new(format!("&{}", method.full_offset_sym(invoker)), "offset"),
        Field::new(format!("&{}", method.full_offset_sym(parent)), "parent_offset"),
    ])
}

/// Implementation of an abstract method that throws when called.
pub fn abstract_def(method: &Method) -> Item {
    let class_var = method
        .self_type()
        .and_then(Type::as_object)
        .map(ObjectType::class_var)
        .unwrap_or_default();

    let mut body = vec![Stmt::decl(
        "const char*",
        "klass",
        format!("shoal_class_name_of((const void*)self, {class_var})"),
    )];
    body.extend(
        method
            .params()
            .iter()
            .skip(1)
            .map(|p| Stmt::expr(format!("SHOAL_UNUSED_VAR({})", p.var.name()))),
    );
    body.push(Stmt::expr(format!(
        "SHOAL_THROW(\"Abstract method '{}' not defined by %s\", klass)",
        method.macro_sym()
    )));
    if !method.return_type().is_void() {
        body.push(Stmt::expr(format!(
            "SHOAL_UNREACHABLE_RETURN({})",
            method.return_type().to_c()
        )));
    }

    Item::Function {
        sig: Signature::new(
            Storage::Plain,
            method.return_type().to_c(),
            method.implementing_func_sym(),
            method.params().to_c(),
        ),
        body,
    }
}

/// Declaration of the host override callback for a novel method.
pub fn callback_dec(method: &Method) -> Item {
    Item::Prototype(Signature::new(
        Storage::Plain,
        method.return_type().to_c(),
        method.full_override_sym(),
        method.params().to_c(),
    ))
}
