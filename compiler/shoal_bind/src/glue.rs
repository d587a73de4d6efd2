//! C fragments shared by every host renderer.

use shoal_codegen::c_ast::{Item, Signature, Stmt, Storage};

use crate::plan::{throw_pattern, BindingPlan, Invocation, RefcountOp, ReturnPlan, StubPlan};

/// Local variable holding the native value of argument `name`.
pub(crate) fn local(name: &str) -> String {
    format!("arg_{name}")
}

/// Statements that call the native function and, for non-void methods,
/// store the result in `retval`. Reference adjustments for consumed
/// arguments come first.
pub(crate) fn invoke(plan: &BindingPlan) -> Vec<Stmt> {
    let mut stmts: Vec<Stmt> = plan
        .before_call
        .iter()
        .map(|op| Stmt::expr(local_op(op).to_c()))
        .collect();

    let args = std::iter::once(&plan.receiver)
        .chain(&plan.args)
        .map(|a| local(&a.name))
        .collect::<Vec<_>>()
        .join(", ");
    let call = match &plan.invocation {
        Invocation::Direct { func } => format!("{func}({args})"),
        Invocation::Dispatch { typedef, offset } => {
            stmts.push(Stmt::decl(
                typedef.as_str(),
                "method",
                format!(
                    "({typedef})shoal_obj_method({}, {offset})",
                    local(&plan.receiver.name)
                ),
            ));
            format!("method({args})")
        }
    };
    match &plan.ret {
        ReturnPlan::Void => stmts.push(Stmt::expr(call)),
        ReturnPlan::Value { c_type, .. } => stmts.push(Stmt::decl(c_type.as_str(), "retval", call)),
    }
    stmts
}

/// Host value of `retval`, followed by the release of an incremented
/// return value. `assign` receives the host expression.
pub(crate) fn convert_return(ret: &ReturnPlan, assign: impl FnOnce(String) -> Stmt) -> Vec<Stmt> {
    match ret {
        ReturnPlan::Void => Vec::new(),
        ReturnPlan::Value {
            conversion,
            incremented,
            ..
        } => {
            let mut stmts = vec![assign(conversion.to_host("retval"))];
            if *incremented {
                stmts.push(Stmt::expr(RefcountOp::Decref("retval".to_string()).to_c()));
            }
            stmts
        }
    }
}

fn local_op(op: &RefcountOp) -> RefcountOp {
    match op {
        RefcountOp::Incref(var) => RefcountOp::Incref(local(var)),
        RefcountOp::Decref(var) => RefcountOp::Decref(local(var)),
    }
}

/// Override callback for a method whose types have no conversion: it
/// raises unconditionally.
pub(crate) fn callback_stub(stub: &StubPlan) -> Item {
    let mut body: Vec<Stmt> = stub
        .arg_names
        .iter()
        .map(|name| Stmt::expr(format!("SHOAL_UNUSED_VAR({name})")))
        .collect();
    body.push(Stmt::expr(format!("SHOAL_THROW({})", throw_pattern(&stub.message))));
    if stub.ret_type != "void" {
        body.push(Stmt::expr(format!("SHOAL_UNREACHABLE_RETURN({})", stub.ret_type)));
    }
    Item::Function {
        sig: Signature::new(
            Storage::Plain,
            stub.ret_type.as_str(),
            stub.symbol.as_str(),
            stub.params.as_str(),
        ),
        body,
    }
}
