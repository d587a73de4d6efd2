//! A zoo hierarchy exercising every binding shape.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use shoal_model::{
    ClassDecl, ClassId, CompilationSession, Exposure, FunctionDecl, MethodDecl, MethodModifiers,
    Ownership, Parcel, ParamDecl, Primitive, Type,
};

pub(crate) struct Zoo {
    pub session: CompilationSession,
    pub animal: ClassId,
    pub dog: ClassId,
    pub util: ClassId,
}

fn object(spec: &str) -> Type {
    Type::object_named(spec).unwrap()
}

pub(crate) fn param(name: &str, ty: Type) -> ParamDecl {
    ParamDecl {
        name: name.to_string(),
        ty,
        default: None,
    }
}

fn optional(name: &str, ty: Type, default: &str) -> ParamDecl {
    ParamDecl {
        default: Some(default.to_string()),
        ..param(name, ty)
    }
}

pub(crate) fn method(
    struct_sym: &str,
    name: &str,
    ret: Type,
    extra: Vec<ParamDecl>,
    modifiers: MethodModifiers,
) -> MethodDecl {
    let mut params = vec![param("self", object(struct_sym))];
    params.extend(extra);
    MethodDecl {
        exposure: Exposure::Public,
        name: name.to_string(),
        return_type: ret,
        params,
        doc: None,
        modifiers,
    }
}

/// `Animal` has a constructor and the methods:
///
/// * `Speak`: abstract, no arguments
/// * `Get_Age`: returns `int32_t`, bound as `age`
/// * `Eat(int32_t amount)`: positional
/// * `Play(Animal *friend, double minutes = 1.0)`: labeled
/// * `Adopt(decremented Animal *pup)`: consumes its argument
/// * `Clone`: returns an incremented object
/// * `Destroy`
/// * `Write_To(FILE *fp)`: no conversion
/// * `Secret`: excluded from hosts
///
/// `Dog` overrides `Speak` as final and adds final `Wag`. `Util` is inert.
pub(crate) fn zoo_with(init: Option<FunctionDecl>) -> Zoo {
    let mut session = CompilationSession::new();
    let parcel = session
        .register_parcel(Parcel::new("Neato", None, None, false).unwrap())
        .unwrap();
    let class = |name: &str, parent: Option<&str>, is_inert| ClassDecl {
        name: name.to_string(),
        parent: parent.map(str::to_string),
        is_inert,
        ..ClassDecl::default()
    };
    let animal = session
        .add_class(parcel, class("Neato::Animal", None, false))
        .unwrap();
    let dog = session
        .add_class(parcel, class("Neato::Dog", Some("Neato::Animal"), false))
        .unwrap();
    let util = session
        .add_class(parcel, class("Neato::Util", None, true))
        .unwrap();

    if let Some(init) = init {
        session.add_function(animal, init).unwrap();
    }

    let i32_ty = || Type::primitive(Primitive::I32);
    let none = MethodModifiers::empty;
    let animal_methods = vec![
        method("Animal", "Speak", Type::void(), vec![], MethodModifiers::ABSTRACT),
        method("Animal", "Get_Age", i32_ty(), vec![], none()),
        method("Animal", "Eat", Type::void(), vec![param("amount", i32_ty())], none()),
        method(
            "Animal",
            "Play",
            Type::void(),
            vec![
                param("friend", object("Animal").nullable()),
                optional("minutes", Type::primitive(Primitive::F64), "1.0"),
            ],
            none(),
        ),
        method(
            "Animal",
            "Adopt",
            Type::void(),
            vec![param(
                "pup",
                object("Animal").with_ownership(Ownership::Decremented),
            )],
            none(),
        ),
        method(
            "Animal",
            "Clone",
            object("Animal").with_ownership(Ownership::Incremented),
            vec![],
            none(),
        ),
        method("Animal", "Destroy", Type::void(), vec![], none()),
        method(
            "Animal",
            "Write_To",
            Type::void(),
            vec![param("fp", Type::composite(Type::arbitrary("FILE"), 1, None))],
            none(),
        ),
        method("Animal", "Secret", Type::void(), vec![], none()),
    ];
    for decl in animal_methods {
        session.add_method(animal, decl).unwrap();
    }

    session
        .add_method(
            dog,
            method("Dog", "Speak", Type::void(), vec![], MethodModifiers::FINAL),
        )
        .unwrap();
    session
        .add_method(
            dog,
            method("Dog", "Wag", Type::void(), vec![], MethodModifiers::FINAL),
        )
        .unwrap();

    session
        .add_function(
            util,
            FunctionDecl {
                exposure: Exposure::Public,
                name: "add".to_string(),
                return_type: i32_ty(),
                params: vec![param("a", i32_ty()), param("b", i32_ty())],
                doc: None,
                is_inline: false,
            },
        )
        .unwrap();

    session.build().unwrap();
    session.set_host_alias(animal, "Get_Age", "age").unwrap();
    session.exclude_from_host(animal, "Secret").unwrap();
    Zoo {
        session,
        animal,
        dog,
        util,
    }
}

/// `neato_Animal* init(neato_Animal *self, int32_t age = 0)`
pub(crate) fn animal_init() -> FunctionDecl {
    FunctionDecl {
        exposure: Exposure::Public,
        name: "init".to_string(),
        return_type: object("Animal").with_ownership(Ownership::Incremented),
        params: vec![
            param("self", object("Animal")),
            optional("age", Type::primitive(Primitive::I32), "0"),
        ],
        doc: None,
        is_inline: false,
    }
}

pub(crate) fn zoo() -> Zoo {
    zoo_with(Some(animal_init()))
}
