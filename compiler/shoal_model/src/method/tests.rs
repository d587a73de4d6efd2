use super::*;
use crate::{ClassDecl, ParcelId, Primitive, Variable};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn prefix() -> Prefix {
    Prefix::from_nickname("Neato")
}

fn param(name: &str, ty: Type) -> Variable {
    Variable::new(&prefix(), Exposure::Local, None, name, ty, false).unwrap()
}

fn self_params(struct_sym: &str, extra: &[(&str, Type, Option<&str>)]) -> ParamList {
    let mut params = ParamList::new();
    params
        .push(param("self", Type::object_named(struct_sym).unwrap()), None)
        .unwrap();
    for (name, ty, default) in extra {
        params
            .push(param(name, ty.clone()), default.map(str::to_string))
            .unwrap();
    }
    params
}

fn method_in(class: &str, macro_sym: &str, ret: Type, params: ParamList) -> DiagResult<Method> {
    let name = ClassName::new(class, None).unwrap();
    Method::new(
        &prefix(),
        ClassId::from_raw(0),
        &name,
        Exposure::Public,
        macro_sym,
        ret,
        params,
        None,
        MethodModifiers::empty(),
    )
}

fn simple(class: &str, macro_sym: &str, ret: Type) -> Method {
    let struct_sym = class.rsplit("::").next().unwrap();
    method_in(class, macro_sym, ret, self_params(struct_sym, &[])).unwrap()
}

fn invoker(name: &str) -> Class {
    let decl = ClassDecl {
        name: name.to_string(),
        ..ClassDecl::default()
    };
    Class::new(
        ClassId::from_raw(1),
        ParcelId::from_raw(0),
        &prefix(),
        false,
        ClassName::new(name, None).unwrap(),
        decl,
    )
}

struct Chain;

impl ClassLineage for Chain {
    fn parent_of(&self, full_struct_sym: &str) -> Option<&str> {
        match full_struct_sym {
            "neato_Dog" => Some("neato_Animal"),
            "neato_Animal" => Some("neato_Obj"),
            _ => None,
        }
    }
}

#[test]
fn dispatch_name_validation() {
    let ret = Type::void();
    assert!(method_in("Neato::Dog", "Speak", ret.clone(), self_params("Dog", &[])).is_ok());
    assert!(method_in("Neato::Dog", "Speak_Now", ret.clone(), self_params("Dog", &[])).is_ok());
    for bad in ["speak", "Speak_2Now", "Speak_now", ""] {
        let err = method_in("Neato::Dog", bad, ret.clone(), self_params("Dog", &[])).unwrap_err();
        assert_eq!(err.code, ErrorCode::E1001, "{bad}");
    }
}

#[test]
fn missing_self() {
    let err = method_in("Neato::Dog", "Speak", Type::void(), ParamList::new()).unwrap_err();
    assert_eq!(err.code, ErrorCode::E1002);

    let mut params = ParamList::new();
    params
        .push(param("dog", Type::object_named("Dog").unwrap()), None)
        .unwrap();
    let err = method_in("Neato::Dog", "Speak", Type::void(), params).unwrap_err();
    assert_eq!(err.code, ErrorCode::E1002);
}

#[test]
fn self_type_must_match_class() {
    let err = method_in("Neato::Dog", "Speak", Type::void(), self_params("Cat", &[])).unwrap_err();
    assert_eq!(err.code, ErrorCode::E1003);

    let err = method_in("Neato::Dog", "Speak", Type::void(), self_params("other_Dog", &[]))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::E1003);

    assert!(method_in("Neato::Dog", "Speak", Type::void(), self_params("neato_Dog", &[])).is_ok());
}

#[test]
fn symbols() {
    let speak = simple("Neato::Animal", "Speak", Type::void());
    let dog = invoker("Neato::Dog");
    assert_eq!(speak.micro_sym(), "speak");
    assert_eq!(speak.short_method_sym(&dog), "Dog_Speak");
    assert_eq!(speak.full_method_sym(&dog), "Neato_Dog_Speak");
    assert_eq!(speak.full_offset_sym(&dog), "Neato_Dog_Speak_OFFSET");
    assert_eq!(speak.short_typedef(&dog), "Dog_Speak_t");
    assert_eq!(speak.full_typedef(&dog), "Neato_Dog_Speak_t");
    assert_eq!(speak.implementing_func_sym(), "Neato_Animal_Speak_IMP");
    assert_eq!(speak.full_override_sym(), "Neato_Animal_Speak_OVERRIDE");
    assert_eq!(speak.subject(), "Neato::Animal#Speak");
}

#[test]
fn compatible_requires_matching_params() {
    let i32_t = Type::primitive(Primitive::I32);
    let base = method_in(
        "Neato::Animal",
        "Eat",
        Type::void(),
        self_params("Animal", &[("grams", i32_t.clone(), None)]),
    )
    .unwrap();

    let same = method_in(
        "Neato::Dog",
        "Eat",
        Type::void(),
        self_params("Dog", &[("grams", i32_t.clone(), None)]),
    )
    .unwrap();
    assert!(same.compatible(&base, &NoLineage));

    let renamed = method_in(
        "Neato::Dog",
        "Eat",
        Type::void(),
        self_params("Dog", &[("kilos", i32_t.clone(), None)]),
    )
    .unwrap();
    assert_eq!(
        renamed.mismatch(&base, &NoLineage),
        Some(SignatureMismatch::Param { index: 1 })
    );

    let defaulted = method_in(
        "Neato::Dog",
        "Eat",
        Type::void(),
        self_params("Dog", &[("grams", i32_t.clone(), Some("0"))]),
    )
    .unwrap();
    assert_eq!(
        defaulted.mismatch(&base, &NoLineage),
        Some(SignatureMismatch::Default { index: 1 })
    );

    let longer = method_in(
        "Neato::Dog",
        "Eat",
        Type::void(),
        self_params(
            "Dog",
            &[("grams", i32_t.clone(), None), ("fast", Type::primitive(Primitive::Bool), None)],
        ),
    )
    .unwrap();
    assert_eq!(
        longer.mismatch(&base, &NoLineage),
        Some(SignatureMismatch::Arity { candidate: 3, ancestor: 2 })
    );

    let other = simple("Neato::Dog", "Drink", Type::void());
    assert_eq!(other.mismatch(&base, &NoLineage), Some(SignatureMismatch::Name));
}

#[test]
fn primitive_returns_must_be_identical() {
    let base = simple("Neato::Animal", "Count", Type::primitive(Primitive::I32));
    let mut wider = simple("Neato::Dog", "Count", Type::primitive(Primitive::I64));
    assert!(!wider.compatible(&base, &NoLineage));

    let err = wider.override_method(&base, &NoLineage).unwrap_err();
    assert_eq!(err.code, ErrorCode::E2002);
    assert_eq!(
        err.message,
        "Non-matching signatures for Neato_Dog_Count_IMP and Neato_Animal_Count_IMP"
    );
    assert!(wider.is_novel());
}

#[test]
fn covariant_object_returns() {
    let animal = || Type::object_named("neato_Animal").unwrap();
    let dog = || Type::object_named("neato_Dog").unwrap();
    let obj = || Type::object_named("neato_Obj").unwrap();

    let base = simple("Neato::Animal", "Clone", animal());
    assert!(simple("Neato::Dog", "Clone", dog()).compatible(&base, &Chain));
    assert!(simple("Neato::Dog", "Clone", animal()).compatible(&base, &Chain));
    assert!(!simple("Neato::Dog", "Clone", obj()).compatible(&base, &Chain));
    assert!(!simple("Neato::Dog", "Clone", dog()).compatible(&base, &NoLineage));
    assert!(!simple("Neato::Dog", "Clone", dog().nullable()).compatible(&base, &Chain));
    assert!(!simple("Neato::Dog", "Clone", Type::void()).compatible(&base, &Chain));
}

#[test]
fn override_of_final_method_fails() {
    let base = simple("Neato::Animal", "Speak", Type::void()).finalize();
    let mut speak = simple("Neato::Dog", "Speak", Type::void());
    let err = speak.override_method(&base, &NoLineage).unwrap_err();
    assert_eq!(err.code, ErrorCode::E2001);
    assert_eq!(
        err.message,
        "Attempt to override final method 'Speak' from 'Neato::Animal' by 'Neato::Dog'"
    );
    assert_eq!(err.primary_subject(), Some("Neato::Dog#Speak"));
}

#[test]
fn override_clears_novel() {
    let base = simple("Neato::Animal", "Speak", Type::void());
    let mut speak = simple("Neato::Dog", "Speak", Type::void());
    assert!(speak.is_novel());
    speak.override_method(&base, &NoLineage).unwrap();
    assert!(!speak.is_novel());
    assert!(base.is_novel());
}

#[test]
fn finalize_copies() {
    let speak = simple("Neato::Animal", "Speak", Type::void());
    let finalized = speak.finalize();
    assert!(finalized.is_final());
    assert!(!speak.is_final());
    assert_eq!(finalized.macro_sym(), speak.macro_sym());
    assert_eq!(finalized.is_novel(), speak.is_novel());
    assert_eq!(finalized.params(), speak.params());
    assert_eq!(finalized.owner(), speak.owner());
}

#[test]
fn host_alias_rules() {
    let base = simple("Neato::Animal", "Speak", Type::void());
    let mut speak = simple("Neato::Animal", "Speak", Type::void());
    assert_eq!(speak.host_name(), "speak");
    speak.set_host_alias("talk").unwrap();
    speak.set_host_alias("talk").unwrap();
    assert_eq!(speak.host_name(), "talk");
    assert_eq!(speak.set_host_alias("bark").unwrap_err().code, ErrorCode::E1008);
    assert_eq!(speak.set_host_alias("").unwrap_err().code, ErrorCode::E1008);

    let mut over = simple("Neato::Dog", "Speak", Type::void());
    over.override_method(&base, &NoLineage).unwrap();
    assert_eq!(over.set_host_alias("talk").unwrap_err().code, ErrorCode::E1008);
    assert_eq!(over.exclude_from_host().unwrap_err().code, ErrorCode::E1008);

    let mut fresh = simple("Neato::Animal", "Sleep", Type::void());
    fresh.exclude_from_host().unwrap();
    assert!(fresh.is_excluded_from_host());
}

proptest! {
    #[test]
    fn overriding_final_always_fails(
        ret_a in prop::sample::select(vec![Primitive::I32, Primitive::U8, Primitive::F64]),
        ret_b in prop::sample::select(vec![Primitive::I32, Primitive::U8, Primitive::F64]),
        name in "[A-Z][a-z]{0,6}(_[A-Z][a-z0-9]{0,4}){0,2}",
    ) {
        let base = simple("Neato::Animal", &name, Type::primitive(ret_a)).finalize();
        let mut candidate = simple("Neato::Dog", &name, Type::primitive(ret_b));
        let err = candidate.override_method(&base, &NoLineage).unwrap_err();
        prop_assert_eq!(err.code, ErrorCode::E2001);
        prop_assert!(candidate.is_novel());
    }

    #[test]
    fn symbols_are_deterministic(name in "[A-Z][a-z]{0,6}(_[A-Z][a-z0-9]{0,4}){0,2}") {
        let method = simple("Neato::Animal", &name, Type::void());
        let dog = invoker("Neato::Dog");
        prop_assert_eq!(method.full_method_sym(&dog), method.full_method_sym(&dog));
        prop_assert_eq!(method.full_method_sym(&dog), format!("Neato_Dog_{name}"));
        prop_assert_eq!(method.short_method_sym(&dog), format!("Dog_{name}"));
    }
}
