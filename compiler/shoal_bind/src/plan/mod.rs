//! Host-neutral binding plans.
//!
//! A plan decides everything about a binding that does not depend on the
//! host's syntax: calling convention, argument conversions, how the native
//! code is reached and which reference counts to adjust. Host generators
//! only render plans.
//!
//! Types without a conversion never fail generation. The plan degrades to a
//! [`Binding::Stub`] that raises at runtime when invoked.

use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use shoal_model::{Class, CompilationSession, Function, Method, Param, ParamList, Type};
use tracing::debug;

use crate::typemap::{Conversion, TypeMap};

/// Methods with more than this many parameters, `self` included, take
/// labeled arguments.
pub const MAX_POSITIONAL_PARAMS: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallingConvention {
    Positional,
    Labeled,
}

impl CallingConvention {
    pub fn for_params(params: &ParamList) -> Self {
        if params.len() > MAX_POSITIONAL_PARAMS {
            CallingConvention::Labeled
        } else {
            CallingConvention::Positional
        }
    }
}

/// How a binding reaches the native implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Call the function by name; used for final methods and constructors.
    Direct { func: String },
    /// Load the function pointer from the object's dispatch table.
    Dispatch { typedef: String, offset: String },
}

/// A reference count adjustment around a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefcountOp {
    Incref(String),
    Decref(String),
}

impl RefcountOp {
    /// The C statement, without the trailing semicolon.
    pub fn to_c(&self) -> String {
        match self {
            RefcountOp::Incref(var) => format!("SHOAL_INCREF({var})"),
            RefcountOp::Decref(var) => format!("SHOAL_DECREF({var})"),
        }
    }
}

/// One converted argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgPlan {
    pub name: String,
    /// Position in the native parameter list; `self` is 0.
    pub index: usize,
    pub c_type: String,
    pub conversion: Conversion,
    pub default: Option<String>,
}

impl ArgPlan {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// What happens to the native return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnPlan {
    Void,
    Value {
        c_type: String,
        conversion: Conversion,
        /// Object returned with an extra reference the caller must release.
        incremented: bool,
    },
}

/// A host-callable entry point for a method or constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingPlan {
    /// Name of the class as seen by the host: `Neato::Dog`.
    pub class_name: String,
    /// Name of the function in the host: `speak`, `DESTROY`, `new`.
    pub host_name: String,
    pub convention: CallingConvention,
    /// `self`, or the blank object a constructor initializes.
    pub receiver: ArgPlan,
    /// The receiver is allocated from the host class name rather than
    /// converted from a host object.
    pub constructs: bool,
    pub args: Vec<ArgPlan>,
    pub invocation: Invocation,
    pub ret: ReturnPlan,
    /// Adjustments before the call, for arguments the callee consumes.
    pub before_call: Vec<RefcountOp>,
}

impl BindingPlan {
    /// Every argument name in native order, `self` first.
    pub fn name_list(&self) -> String {
        std::iter::once(self.receiver.name.as_str())
            .chain(self.args.iter().map(|a| a.name.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of leading arguments, `self` included, without defaults.
    pub fn min_required(&self) -> usize {
        self.args
            .iter()
            .rposition(ArgPlan::is_required)
            .map_or(1, |i| i + 2)
    }
}

/// A host override callback for a novel method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackPlan {
    /// `Neato_Animal_Eat_OVERRIDE`
    pub override_sym: String,
    /// Host method invoked on the host object.
    pub host_name: String,
    pub ret_type: String,
    /// Native parameter list.
    pub params: String,
    pub receiver: String,
    pub args: Vec<ArgPlan>,
    pub ret: ReturnPlan,
    /// Adjustments after the host returns.
    pub after_call: Vec<RefcountOp>,
}

/// A binding that could not be planned because a type has no conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubPlan {
    pub class_name: String,
    pub host_name: String,
    /// Symbol the stub must define; the override symbol for callbacks.
    pub symbol: String,
    pub ret_type: String,
    pub params: String,
    pub arg_names: Vec<String>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding<T> {
    Ready(T),
    Stub(StubPlan),
}

impl<T> Binding<T> {
    pub fn is_stub(&self) -> bool {
        matches!(self, Binding::Stub(_))
    }
}

/// A C string literal safe to pass as the pattern of `SHOAL_THROW`.
pub fn throw_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("%%"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Host name of a method: its alias, else its lower-case name.
pub fn host_method_name(method: &Method) -> String {
    method.host_name().to_string()
}

/// Methods of `class` that get host bindings: public, novel methods
/// declared by the class and not excluded.
pub fn bound_methods<'a>(
    session: &'a CompilationSession,
    class: &'a Class,
) -> impl Iterator<Item = &'a Method> + 'a {
    let inert = class.is_inert();
    session
        .fresh_methods(class.id())
        .filter(move |m| !inert && m.is_novel() && m.is_public() && !m.is_excluded_from_host())
}

/// Methods of `class` that get host override callbacks.
pub fn callback_methods<'a>(
    session: &'a CompilationSession,
    class: &'a Class,
) -> impl Iterator<Item = &'a Method> + 'a {
    let inert = class.is_inert();
    session
        .fresh_methods(class.id())
        .filter(move |m| !inert && shoal_codegen::bind_method::has_host_callback(m))
}

fn unmapped_message(map: &dyn TypeMap, subject: &str, ty: &Type) -> String {
    format!(
        "Can't bind {subject} via {}: type '{}' has no conversion",
        map.host_name(),
        ty.to_c()
    )
}

fn plan_arg(param: &Param, index: usize, map: &dyn TypeMap) -> Result<ArgPlan, Type> {
    let ty = param.var.ty();
    let conversion = map.conversion(ty).ok_or_else(|| ty.clone())?;
    Ok(ArgPlan {
        name: param.var.name().to_string(),
        index,
        c_type: ty.to_c(),
        conversion,
        default: param.default.clone(),
    })
}

fn plan_return(ty: &Type, map: &dyn TypeMap) -> Result<ReturnPlan, Type> {
    if ty.is_void() {
        return Ok(ReturnPlan::Void);
    }
    let conversion = map.conversion(ty).ok_or_else(|| ty.clone())?;
    Ok(ReturnPlan::Value {
        c_type: ty.to_c(),
        conversion,
        incremented: ty.is_object() && ty.is_incremented(),
    })
}

fn plan_args(params: &ParamList, map: &dyn TypeMap) -> Result<(ArgPlan, Vec<ArgPlan>), Type> {
    let mut planned = Vec::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        planned.push(plan_arg(param, index, map)?);
    }
    let mut iter = planned.into_iter();
    match iter.next() {
        Some(receiver) => Ok((receiver, iter.collect())),
        None => Err(Type::void()),
    }
}

/// Arguments the callee consumes must be retained so the host keeps its
/// reference.
fn consumed_args(params: &ParamList) -> Vec<RefcountOp> {
    params
        .variables()
        .filter(|v| v.ty().is_object() && v.ty().is_decremented())
        .map(|v| RefcountOp::Incref(v.name().to_string()))
        .collect()
}

fn stub(
    class_name: &str,
    host_name: String,
    symbol: String,
    ret: &Type,
    params: &ParamList,
    message: String,
) -> StubPlan {
    debug!(%message, "binding degraded to stub");
    StubPlan {
        class_name: class_name.to_string(),
        host_name,
        symbol,
        ret_type: ret.to_c(),
        params: params.to_c(),
        arg_names: params.variables().map(|v| v.name().to_string()).collect(),
        message,
    }
}

/// Plan the host entry point for a novel method.
///
/// `rename` lets a host respell names it reserves, such as Perl's
/// `DESTROY`.
pub fn plan_method(
    method: &Method,
    invoker: &Class,
    map: &dyn TypeMap,
    rename: fn(&str) -> Option<&'static str>,
) -> Binding<BindingPlan> {
    let alias = host_method_name(method);
    let host_name = rename(&alias).map_or(alias, str::to_string);
    let class_name = invoker.name().to_string();

    let planned = plan_args(method.params(), map)
        .and_then(|(receiver, args)| Ok((receiver, args, plan_return(method.return_type(), map)?)));
    let (receiver, args, ret) = match planned {
        Ok(planned) => planned,
        Err(ty) => {
            let message = unmapped_message(map, &format!("{class_name}#{host_name}"), &ty);
            return Binding::Stub(stub(
                &class_name,
                host_name,
                method.full_method_sym(invoker),
                method.return_type(),
                method.params(),
                message,
            ));
        }
    };

    let invocation = if method.is_final() {
        Invocation::Direct {
            func: method.implementing_func_sym(),
        }
    } else {
        Invocation::Dispatch {
            typedef: method.full_typedef(invoker),
            offset: method.full_offset_sym(invoker),
        }
    };

    Binding::Ready(BindingPlan {
        class_name,
        host_name,
        convention: CallingConvention::for_params(method.params()),
        receiver,
        constructs: false,
        args,
        invocation,
        ret,
        before_call: consumed_args(method.params()),
    })
}

/// Plan the host override callback for a novel, non-final method.
pub fn plan_callback(
    method: &Method,
    map: &dyn TypeMap,
    rename: fn(&str) -> Option<&'static str>,
) -> Binding<CallbackPlan> {
    let alias = host_method_name(method);
    let host_name = rename(&alias).map_or(alias, str::to_string);
    let params = method.params();

    let planned = plan_args(params, map)
        .and_then(|(receiver, args)| Ok((receiver, args, plan_return(method.return_type(), map)?)));
    let (receiver, args, ret) = match planned {
        Ok(planned) => planned,
        Err(ty) => {
            let message = format!(
                "Can't override {} via {}: type '{}' has no conversion",
                method.subject(),
                map.host_name(),
                ty.to_c()
            );
            return Binding::Stub(stub(
                method.class_name(),
                host_name,
                method.full_override_sym(),
                method.return_type(),
                params,
                message,
            ));
        }
    };

    let ret_ty = method.return_type();
    let mut after_call: Vec<RefcountOp> = params
        .variables()
        .skip(1)
        .filter(|v| v.ty().is_object() && v.ty().is_decremented())
        .map(|v| RefcountOp::Decref(v.name().to_string()))
        .collect();
    if ret_ty.is_object() && ret_ty.is_incremented() {
        after_call.insert(0, RefcountOp::Incref("retval".to_string()));
    }

    Binding::Ready(CallbackPlan {
        override_sym: method.full_override_sym(),
        host_name,
        ret_type: ret_ty.to_c(),
        params: params.to_c(),
        receiver: receiver.name,
        args,
        ret,
        after_call,
    })
}

/// Plan the host `new` for a class with an inert `init` function.
///
/// Returns `Ok(None)` when the class has no initializer.
///
/// # Errors
///
/// `E1012` if `init` does not take the class as `self` and return it.
pub fn plan_constructor(
    class: &Class,
    map: &dyn TypeMap,
) -> DiagResult<Option<Binding<BindingPlan>>> {
    let Some(init) = class.function("init") else {
        return Ok(None);
    };
    check_initializer(class, init)?;

    let class_name = class.name().to_string();
    let planned = plan_args(init.params(), map)
        .and_then(|(receiver, args)| Ok((receiver, args, plan_return(init.return_type(), map)?)));
    let (receiver, args, ret) = match planned {
        Ok(planned) => planned,
        Err(ty) => {
            let message = unmapped_message(map, &format!("{class_name}#new"), &ty);
            return Ok(Some(Binding::Stub(stub(
                &class_name,
                "new".to_string(),
                init.full_func_sym(),
                init.return_type(),
                init.params(),
                message,
            ))));
        }
    };

    Ok(Some(Binding::Ready(BindingPlan {
        class_name,
        host_name: "new".to_string(),
        convention: CallingConvention::Labeled,
        receiver,
        constructs: true,
        args,
        invocation: Invocation::Direct {
            func: init.full_func_sym(),
        },
        ret,
        before_call: consumed_args(init.params()),
    })))
}

fn check_initializer(class: &Class, init: &Function) -> DiagResult<()> {
    let takes_self = init.params().first().is_some_and(|p| {
        p.var.name() == "self"
            && p.var
                .ty()
                .as_object()
                .is_some_and(|o| o.full_struct_sym() == class.full_struct_sym())
    });
    let returns_class = init
        .return_type()
        .as_object()
        .is_some_and(|o| o.full_struct_sym() == class.full_struct_sym());
    if takes_self && returns_class {
        return Ok(());
    }
    Err(Diagnostic::error(ErrorCode::E1012)
        .with_message(format!(
            "Invalid constructor initializer '{}' for '{}'",
            init.full_func_sym(),
            class.name()
        ))
        .with_label(class.name(), "`init` must take `self` and return the class")
        .with_suggestion(format!(
            "declare `{} init({} *self, ...)`",
            class.full_struct_sym(),
            class.full_struct_sym()
        )))
}
