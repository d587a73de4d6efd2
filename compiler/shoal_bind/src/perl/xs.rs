//! XSUBs: the Perl-callable entry points.

use shoal_codegen::c_ast::{Item, Stmt};

use crate::glue::{convert_return, invoke, local};
use crate::plan::{throw_pattern, ArgPlan, Binding, BindingPlan, CallingConvention, StubPlan};

/// `XS_Neato_Animal_eat`
pub(crate) fn xsub_name(class_name: &str, host_name: &str) -> String {
    format!("XS_{}_{host_name}", class_name.replace("::", "_"))
}

/// Declaration and definition of the XSUB for one binding.
pub(crate) fn xsub(binding: &Binding<BindingPlan>) -> Vec<Item> {
    let (name, body) = match binding {
        Binding::Ready(plan) => (
            xsub_name(&plan.class_name, &plan.host_name),
            ready_body(plan),
        ),
        Binding::Stub(stub) => (xsub_name(&stub.class_name, &stub.host_name), stub_body(stub)),
    };
    vec![
        Item::Verbatim(format!("XS({name});")),
        Item::Block {
            head: format!("XS({name})"),
            body,
        },
    ]
}

fn prologue() -> Vec<Stmt> {
    vec![
        Stmt::Line("dXSARGS;".to_string()),
        Stmt::expr("SHOAL_UNUSED_VAR(cv)"),
        Stmt::expr("SP -= items"),
    ]
}

fn stub_body(stub: &StubPlan) -> Vec<Stmt> {
    let mut body = prologue();
    body.push(Stmt::expr(format!("SHOAL_THROW({})", throw_pattern(&stub.message))));
    body.push(Stmt::expr("XSRETURN(0)"));
    body
}

fn usage(plan: &BindingPlan) -> Stmt {
    let first = if plan.constructs { "class_name" } else { "self" };
    let names = match plan.convention {
        CallingConvention::Labeled => format!("{first}, ..."),
        CallingConvention::Positional => std::iter::once(first.to_string())
            .chain(plan.args.iter().map(|a| {
                if a.is_required() {
                    a.name.clone()
                } else {
                    format!("[{}]", a.name)
                }
            }))
            .collect::<Vec<_>>()
            .join(", "),
    };
    Stmt::expr(format!("ShoalXS_usage(aTHX_ cv, \"{names}\")"))
}

fn arity_check(plan: &BindingPlan) -> Stmt {
    let cond = match plan.convention {
        CallingConvention::Labeled => "items < 1".to_string(),
        CallingConvention::Positional => {
            let max = plan.args.len() + 1;
            let min = plan.min_required();
            if min == max {
                format!("items != {max}")
            } else {
                format!("items < {min} || items > {max}")
            }
        }
    };
    Stmt::If {
        cond,
        then: vec![usage(plan)],
        otherwise: Vec::new(),
    }
}

fn receiver(plan: &BindingPlan) -> Stmt {
    let arg = &plan.receiver;
    let init = if plan.constructs {
        format!("({})ShoalXS_new_blank_obj(aTHX_ ST(0))", arg.c_type)
    } else {
        arg.conversion.to_native("ST(0)")
    };
    Stmt::decl(arg.c_type.as_str(), local(&arg.name), init)
}

fn sv_name(arg: &ArgPlan) -> String {
    format!("sv_{}", arg.name)
}

/// Native value from host expression `sv`, falling back to the default
/// when `present` does not hold.
fn convert_arg(arg: &ArgPlan, sv: &str, present: &str) -> Stmt {
    let converted = arg.conversion.to_native(sv);
    let init = match &arg.default {
        None => converted,
        Some(default) => {
            format!("({present} && ShoalXS_sv_defined(aTHX_ {sv})) ? {converted} : {default}")
        }
    };
    Stmt::decl(arg.c_type.as_str(), local(&arg.name), init)
}

fn positional_args(plan: &BindingPlan) -> Vec<Stmt> {
    plan.args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let pos = i + 1;
            convert_arg(arg, &format!("ST({pos})"), &format!("items > {pos}"))
        })
        .collect()
}

fn labeled_args(plan: &BindingPlan) -> Vec<Stmt> {
    let mut stmts: Vec<Stmt> = plan
        .args
        .iter()
        .map(|arg| Stmt::Decl {
            ty: "SV".to_string(),
            name: format!("*{}", sv_name(arg)),
            init: Some("NULL".to_string()),
        })
        .collect();
    if !plan.args.is_empty() {
        let pairs: String = plan
            .args
            .iter()
            .map(|arg| format!("\"{}\", &{}, ", arg.name, sv_name(arg)))
            .collect();
        stmts.push(Stmt::expr(format!(
            "ShoalXS_allot_params(aTHX_ &(ST(0)), 1, items, {pairs}NULL)"
        )));
    }
    for arg in plan.args.iter().filter(|a| a.is_required()) {
        stmts.push(Stmt::If {
            cond: format!("!{}", sv_name(arg)),
            then: vec![Stmt::expr(format!(
                "SHOAL_THROW(\"Missing required param '{}'\")",
                arg.name
            ))],
            otherwise: Vec::new(),
        });
    }
    for arg in &plan.args {
        let sv = sv_name(arg);
        stmts.push(convert_arg(arg, &sv, &sv));
    }
    stmts
}

fn ready_body(plan: &BindingPlan) -> Vec<Stmt> {
    let mut body = prologue();
    body.push(arity_check(plan));
    body.push(receiver(plan));
    body.extend(match plan.convention {
        CallingConvention::Positional => positional_args(plan),
        CallingConvention::Labeled => labeled_args(plan),
    });
    body.extend(invoke(plan));

    let ret = convert_return(&plan.ret, |host| Stmt::expr(format!("ST(0) = {host}")));
    if ret.is_empty() {
        body.push(Stmt::expr("XSRETURN(0)"));
    } else {
        body.extend(ret);
        body.push(Stmt::expr("sv_2mortal(ST(0))"));
        body.push(Stmt::expr("XSRETURN(1)"));
    }
    body
}

/// The XS section registering every XSUB under its Perl name.
pub(crate) fn module_section(boot_class: &str, registrations: &[(String, String)]) -> String {
    let mut out = format!("MODULE = {boot_class}   PACKAGE = {boot_class}\n\n");
    out.push_str("void\n_init_autobindings()\nPPCODE:\n{\n");
    out.push_str("    const char* file = __FILE__;\n");
    out.push_str("    SHOAL_UNUSED_VAR(cv);\n");
    out.push_str("    SHOAL_UNUSED_VAR(items);\n");
    for (perl_name, xsub) in registrations {
        out.push_str(&format!("    newXS(\"{perl_name}\", {xsub}, file);\n"));
    }
    out.push_str("}\n");
    out
}
