//! Override callbacks that forward native dispatch into Perl.

use shoal_codegen::c_ast::{Item, Signature, Stmt, Storage};

use crate::glue::callback_stub;
use crate::plan::{Binding, CallbackPlan, ReturnPlan};

/// Helpers every callback file starts with.
pub(crate) fn helpers() -> Vec<Item> {
    vec![
        Item::Function {
            sig: Signature::new(
                Storage::Static,
                "void",
                "S_finish_callback_void",
                "pTHX_ const char *meth_name",
            ),
            body: vec![
                Stmt::decl("int", "count", "call_method(meth_name, G_VOID | G_DISCARD)"),
                Stmt::If {
                    cond: "count != 0".to_string(),
                    then: vec![Stmt::expr(
                        "SHOAL_THROW(\"Bad callback to '%s': %d\", meth_name, count)",
                    )],
                    otherwise: Vec::new(),
                },
                Stmt::Line("FREETMPS;".to_string()),
                Stmt::Line("LEAVE;".to_string()),
            ],
        },
        Item::Blank,
        Item::Function {
            sig: Signature::new(
                Storage::Static,
                "SV*",
                "S_start_callback_sv",
                "pTHX_ const char *meth_name",
            ),
            body: vec![
                Stmt::Line("dSP;".to_string()),
                Stmt::decl("int", "count", "call_method(meth_name, G_SCALAR)"),
                Stmt::If {
                    cond: "count != 1".to_string(),
                    then: vec![Stmt::expr(
                        "SHOAL_THROW(\"Bad callback to '%s': %d\", meth_name, count)",
                    )],
                    otherwise: Vec::new(),
                },
                Stmt::Line("SPAGAIN;".to_string()),
                Stmt::decl("SV", "*return_sv", "POPs"),
                Stmt::Line("PUTBACK;".to_string()),
                Stmt::ret("return_sv"),
            ],
        },
        Item::Blank,
        Item::Function {
            sig: Signature::new(Storage::Static, "void", "S_finish_callback", "pTHX"),
            body: vec![
                Stmt::Line("FREETMPS;".to_string()),
                Stmt::Line("LEAVE;".to_string()),
            ],
        },
    ]
}

/// The `_OVERRIDE` function for one novel method.
pub(crate) fn callback(binding: &Binding<CallbackPlan>) -> Item {
    match binding {
        Binding::Ready(plan) => ready(plan),
        Binding::Stub(stub) => callback_stub(stub),
    }
}

fn ready(plan: &CallbackPlan) -> Item {
    let labeled = plan.args.len() > 1;
    let stack_slots = 1 + plan.args.len() * if labeled { 2 } else { 1 };
    let mut body = vec![
        Stmt::Line("dTHX;".to_string()),
        Stmt::Line("dSP;".to_string()),
        Stmt::expr(format!("EXTEND(SP, {stack_slots})")),
        Stmt::Line("ENTER;".to_string()),
        Stmt::Line("SAVETMPS;".to_string()),
        Stmt::expr("PUSHMARK(SP)"),
        Stmt::expr(format!(
            "mPUSHs(ShoalXS_obj_to_sv(aTHX_ (void*){}))",
            plan.receiver
        )),
    ];
    for arg in &plan.args {
        if labeled {
            body.push(Stmt::expr(format!(
                "mPUSHp(\"{}\", {})",
                arg.name,
                arg.name.len()
            )));
        }
        body.push(Stmt::expr(format!(
            "mPUSHs({})",
            arg.conversion.to_host(&arg.name)
        )));
    }
    body.push(Stmt::Line("PUTBACK;".to_string()));

    let name = &plan.host_name;
    let adjustments = plan.after_call.iter().map(|op| Stmt::expr(op.to_c()));
    match &plan.ret {
        ReturnPlan::Void => {
            body.push(Stmt::expr(format!("S_finish_callback_void(aTHX_ \"{name}\")")));
            body.extend(adjustments);
        }
        ReturnPlan::Value {
            c_type, conversion, ..
        } => {
            body.push(Stmt::decl(
                "SV",
                "*return_sv",
                format!("S_start_callback_sv(aTHX_ \"{name}\")"),
            ));
            body.push(Stmt::decl(
                c_type.as_str(),
                "retval",
                conversion.to_native("return_sv"),
            ));
            // The scalar owning retval dies with the temps.
            body.extend(adjustments);
            body.push(Stmt::expr("S_finish_callback(aTHX)"));
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
