//! Ruby C-extension bindings.
//!
//! Output, relative to the destination directory:
//!
//! - `ruby/<boot>_ruby.c`: method wrappers and the `Init_<boot>` entry
//!   point, which defines every class under its parent
//! - `ruby/callbacks.c`: `_OVERRIDE` functions calling back into Ruby
//! - `ruby/typemap.rb`: the conversion table as a Ruby hash
//!
//! Methods with labeled arguments take a trailing hash keyed by symbol.

mod typemap;

pub use typemap::RubyTypeMap;

use shoal_codegen::c_ast::{Item, Signature, Stmt, Storage};
use shoal_codegen::{ArtifactSet, CommentStyle};
use shoal_diagnostic::DiagResult;
use shoal_model::{Class, CompilationSession};
use tracing::debug;

use crate::glue::{callback_stub, convert_return, invoke, local};
use crate::host::{insert_c, prepare, BindConfig, HostLanguage};
use crate::plan::{
    bound_methods, callback_methods, plan_callback, plan_constructor, plan_method, throw_pattern,
    ArgPlan, Binding, BindingPlan, CallbackPlan, CallingConvention, ReturnPlan, StubPlan,
};

fn no_rename(_: &str) -> Option<&'static str> {
    None
}

/// `S_Neato_Animal_eat`
fn wrapper_name(class_name: &str, host_name: &str) -> String {
    format!("S_{}_{host_name}", class_name.replace("::", "_"))
}

/// `rb_Neato_Animal`
fn class_value(class: &Class) -> String {
    format!("rb_{}", class.name().replace("::", "_"))
}

fn raise(message: &str) -> Stmt {
    Stmt::expr(format!("rb_raise(rb_eArgError, \"{message}\")"))
}

fn wrapper_sig(name: String) -> Signature {
    Signature::new(
        Storage::Static,
        "VALUE",
        name,
        "int argc, VALUE *argv, VALUE rb_self",
    )
}

fn stub_wrapper(stub: &StubPlan) -> Item {
    Item::Function {
        sig: wrapper_sig(wrapper_name(&stub.class_name, &stub.host_name)),
        body: vec![
            Stmt::expr("SHOAL_UNUSED_VAR(argc)"),
            Stmt::expr("SHOAL_UNUSED_VAR(argv)"),
            Stmt::expr("SHOAL_UNUSED_VAR(rb_self)"),
            Stmt::expr(format!("SHOAL_THROW({})", throw_pattern(&stub.message))),
            Stmt::ret("Qnil"),
        ],
    }
}

fn convert_arg(arg: &ArgPlan, value: &str, present: &str) -> Stmt {
    let converted = arg.conversion.to_native(value);
    let init = match &arg.default {
        None => converted,
        Some(default) => format!("({present} && !NIL_P({value})) ? {converted} : {default}"),
    };
    Stmt::decl(arg.c_type.as_str(), local(&arg.name), init)
}

fn positional_args(plan: &BindingPlan) -> Vec<Stmt> {
    let max = plan.args.len();
    let min = plan.min_required() - 1;
    let (cond, expected) = if min == max {
        (format!("argc != {max}"), max.to_string())
    } else {
        (format!("argc < {min} || argc > {max}"), format!("{min}..{max}"))
    };
    let mut stmts = vec![Stmt::If {
        cond,
        then: vec![Stmt::expr(format!(
            "rb_raise(rb_eArgError, \"wrong number of arguments (%d for {expected})\", argc)"
        ))],
        otherwise: Vec::new(),
    }];
    for (i, arg) in plan.args.iter().enumerate() {
        stmts.push(convert_arg(arg, &format!("argv[{i}]"), &format!("argc > {i}")));
    }
    stmts
}

fn labeled_args(plan: &BindingPlan) -> Vec<Stmt> {
    let mut stmts = vec![
        Stmt::decl("VALUE", "opts", "argc == 1 ? argv[0] : Qnil"),
        Stmt::If {
            cond: "argc > 1 || (argc == 1 && !RB_TYPE_P(opts, T_HASH))".to_string(),
            then: vec![raise("expected a hash of labeled params")],
            otherwise: Vec::new(),
        },
    ];
    for arg in &plan.args {
        let value = format!("rb_{}", arg.name);
        stmts.push(Stmt::decl(
            "VALUE",
            value.as_str(),
            format!("ShoalRb_hash_fetch(opts, \"{}\")", arg.name),
        ));
        if arg.is_required() {
            stmts.push(Stmt::If {
                cond: format!("{value} == Qundef"),
                then: vec![raise(&format!("Missing required param '{}'", arg.name))],
                otherwise: Vec::new(),
            });
        }
        stmts.push(convert_arg(arg, &value, &format!("{value} != Qundef")));
    }
    stmts
}

fn wrapper(plan: &BindingPlan) -> Item {
    let receiver = &plan.receiver;
    let self_init = if plan.constructs {
        format!("({})ShoalRb_new_blank_obj(rb_self)", receiver.c_type)
    } else {
        receiver.conversion.to_native("rb_self")
    };
    let mut body = match plan.convention {
        CallingConvention::Positional => positional_args(plan),
        CallingConvention::Labeled => labeled_args(plan),
    };
    body.insert(
        0,
        Stmt::decl(receiver.c_type.as_str(), local(&receiver.name), self_init),
    );
    body.extend(invoke(plan));
    let ret = convert_return(&plan.ret, |host| Stmt::decl("VALUE", "rb_retval", host));
    if ret.is_empty() {
        body.push(Stmt::ret("Qnil"));
    } else {
        body.extend(ret);
        body.push(Stmt::ret("rb_retval"));
    }
    Item::Function {
        sig: wrapper_sig(wrapper_name(&plan.class_name, &plan.host_name)),
        body,
    }
}

fn callback(plan: &CallbackPlan) -> Item {
    let mut body = vec![Stmt::decl(
        "VALUE",
        "rb_self",
        format!("ShoalRb_obj_to_value((void*){})", plan.receiver),
    )];
    let args: Vec<String> = if plan.args.len() > 1 {
        body.push(Stmt::decl("VALUE", "opts", "rb_hash_new()"));
        for arg in &plan.args {
            body.push(Stmt::expr(format!(
                "rb_hash_aset(opts, ID2SYM(rb_intern(\"{}\")), {})",
                arg.name,
                arg.conversion.to_host(&arg.name)
            )));
        }
        vec!["opts".to_string()]
    } else {
        plan.args
            .iter()
            .map(|arg| arg.conversion.to_host(&arg.name))
            .collect()
    };
    let mut call = format!(
        "rb_funcall(rb_self, rb_intern(\"{}\"), {}",
        plan.host_name,
        args.len()
    );
    for arg in &args {
        call.push_str(", ");
        call.push_str(arg);
    }
    call.push(')');

    let adjustments = plan.after_call.iter().map(|op| Stmt::expr(op.to_c()));
    match &plan.ret {
        ReturnPlan::Void => {
            body.push(Stmt::expr(call));
            body.extend(adjustments);
        }
        ReturnPlan::Value {
            c_type, conversion, ..
        } => {
            body.push(Stmt::decl("VALUE", "rb_retval", call));
            body.push(Stmt::decl(
                c_type.as_str(),
                "retval",
                conversion.to_native("rb_retval"),
            ));
            body.extend(adjustments);
            body.push(Stmt::ret("retval"));
        }
    }
    Item::Function {
        sig: Signature::new(
            Storage::Plain,
            plan.ret_type.as_str(),
            plan.override_sym.as_str(),
            plan.params.as_str(),
        ),
        body,
    }
}

/// The Ruby host.
#[derive(Copy, Clone, Debug, Default)]
pub struct RubyHost;

impl HostLanguage for RubyHost {
    fn name(&self) -> &'static str {
        "ruby"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(boot = %config.boot_class))]
    fn generate(
        &self,
        session: &CompilationSession,
        config: &BindConfig,
    ) -> DiagResult<ArtifactSet> {
        let mut artifacts = ArtifactSet::new();
        if prepare(session, config)?.is_none() {
            return Ok(artifacts);
        }
        let map = RubyTypeMap::new(session);
        let boot = config.boot_ident().to_ascii_lowercase();

        let mut includes = vec![Item::system_include("ruby.h"), Item::include("ShoalRb.h")];
        let mut wrappers = Vec::new();
        let mut decls = Vec::new();
        let mut init_body = Vec::new();
        let mut callback_items = Vec::new();
        let mut stubs = 0usize;

        for (_, parcel) in session.parcels().filter(|(_, p)| !p.is_included()) {
            init_body.push(Stmt::expr(format!(
                "{}bootstrap_parcel()",
                parcel.prefix().lower()
            )));
        }

        for class in session
            .ordered_classes()
            .filter(|c| !c.is_included() && !c.is_inert())
        {
            includes.push(Item::include(class.include_h()));
            let value = class_value(class);
            decls.push(Stmt::Decl {
                ty: "VALUE".to_string(),
                name: value.clone(),
                init: None,
            });
            let parent = match session.parent(class.id()) {
                Some(parent) if parent.is_included() => {
                    format!("ShoalRb_find_class(\"{}\")", parent.name())
                }
                Some(parent) => class_value(parent),
                None => "rb_cObject".to_string(),
            };
            init_body.push(Stmt::expr(format!(
                "{value} = ShoalRb_define_class(\"{}\", {parent})",
                class.name()
            )));

            let mut bindings = Vec::new();
            if let Some(ctor) = plan_constructor(class, &map)? {
                bindings.push(ctor);
            }
            bindings.extend(
                bound_methods(session, class).map(|m| plan_method(m, class, &map, no_rename)),
            );
            for binding in &bindings {
                let (item, host_name, name) = match binding {
                    Binding::Ready(plan) => (
                        wrapper(plan),
                        &plan.host_name,
                        wrapper_name(&plan.class_name, &plan.host_name),
                    ),
                    Binding::Stub(stub) => (
                        stub_wrapper(stub),
                        &stub.host_name,
                        wrapper_name(&stub.class_name, &stub.host_name),
                    ),
                };
                stubs += usize::from(binding.is_stub());
                let define = if host_name == "new" {
                    "rb_define_singleton_method"
                } else {
                    "rb_define_method"
                };
                init_body.push(Stmt::expr(format!(
                    "{define}({value}, \"{host_name}\", {name}, -1)"
                )));
                wrappers.push(Item::Blank);
                wrappers.push(item);
            }

            for method in callback_methods(session, class) {
                let binding = plan_callback(method, &map, no_rename);
                stubs += usize::from(binding.is_stub());
                callback_items.push(Item::Blank);
                callback_items.push(match &binding {
                    Binding::Ready(plan) => callback(plan),
                    Binding::Stub(stub) => callback_stub(stub),
                });
            }
        }
        debug!(classes = decls.len(), stubs, "ruby bindings planned");

        let mut ext = includes.clone();
        ext.extend(wrappers);
        ext.push(Item::Blank);
        decls.extend(init_body);
        ext.push(Item::Function {
            sig: Signature::new(Storage::Plain, "void", format!("Init_{boot}"), "void"),
            body: decls,
        });
        insert_c(&mut artifacts, config, &format!("ruby/{boot}_ruby.c"), &ext)?;

        let mut callback_file = includes;
        callback_file.extend(
            session
                .parcels()
                .filter(|(_, p)| !p.is_included())
                .map(|(_, p)| Item::include(format!("{}callbacks.h", p.prefix().lower()))),
        );
        callback_file.extend(callback_items);
        insert_c(&mut artifacts, config, "ruby/callbacks.c", &callback_file)?;

        artifacts.insert(
            "ruby/typemap.rb",
            config
                .boilerplate
                .wrap(&map.to_ruby_table(session), CommentStyle::Hash),
        )?;
        Ok(artifacts)
    }
}
