//! A small zoo hierarchy shared by the generator tests.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use shoal_model::{
    ClassDecl, ClassId, CompilationSession, DocComment, Exposure, FunctionDecl, MethodDecl,
    MethodModifiers, Ownership, Parcel, ParamDecl, Primitive, Type, VarDecl,
};

pub(crate) struct Zoo {
    pub session: CompilationSession,
    pub animal: ClassId,
    pub dog: ClassId,
    pub util: ClassId,
}

pub(crate) fn self_param(struct_sym: &str) -> ParamDecl {
    ParamDecl {
        name: "self".to_string(),
        ty: Type::object_named(struct_sym).unwrap(),
        default: None,
    }
}

fn i32_param(name: &str) -> ParamDecl {
    ParamDecl {
        name: name.to_string(),
        ty: Type::primitive(Primitive::I32),
        default: None,
    }
}

pub(crate) fn method(
    struct_sym: &str,
    name: &str,
    ret: Type,
    extra: Vec<ParamDecl>,
    modifiers: MethodModifiers,
) -> MethodDecl {
    let mut params = vec![self_param(struct_sym)];
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

fn incremented(class: &str) -> Type {
    Type::object_named(class)
        .unwrap()
        .with_ownership(Ownership::Incremented)
}

/// `Animal` declares abstract `Speak`, `Get_Age`, `Eat` and `Clone`.
/// `Dog` overrides `Speak` as final and `Clone` covariantly. `Util` is
/// inert with a single function.
pub(crate) fn zoo_with_doc(speak_doc: &str) -> Zoo {
    let mut session = CompilationSession::new();
    let parcel = session
        .register_parcel(Parcel::new("Neato", None, None, false).unwrap())
        .unwrap();

    let animal = session
        .add_class(
            parcel,
            ClassDecl {
                name: "Neato::Animal".to_string(),
                doc: Some(DocComment::parse("An animal.")),
                ..ClassDecl::default()
            },
        )
        .unwrap();
    let dog = session
        .add_class(
            parcel,
            ClassDecl {
                name: "Neato::Dog".to_string(),
                parent: Some("Neato::Animal".to_string()),
                ..ClassDecl::default()
            },
        )
        .unwrap();
    let util = session
        .add_class(
            parcel,
            ClassDecl {
                name: "Neato::Util".to_string(),
                is_inert: true,
                ..ClassDecl::default()
            },
        )
        .unwrap();

    session
        .add_member_var(
            animal,
            VarDecl {
                exposure: Exposure::Private,
                name: "age".to_string(),
                ty: Type::primitive(Primitive::I32),
            },
        )
        .unwrap();
    session
        .add_member_var(
            dog,
            VarDecl {
                exposure: Exposure::Private,
                name: "tail_length".to_string(),
                ty: Type::primitive(Primitive::I32),
            },
        )
        .unwrap();

    let mut speak = method(
        "Animal",
        "Speak",
        Type::void(),
        Vec::new(),
        MethodModifiers::ABSTRACT,
    );
    speak.doc = Some(DocComment::parse(speak_doc));
    session.add_method(animal, speak).unwrap();
    session
        .add_method(
            animal,
            method(
                "Animal",
                "Get_Age",
                Type::primitive(Primitive::I32),
                Vec::new(),
                MethodModifiers::empty(),
            ),
        )
        .unwrap();
    session
        .add_method(
            animal,
            method(
                "Animal",
                "Eat",
                Type::void(),
                vec![i32_param("amount")],
                MethodModifiers::empty(),
            ),
        )
        .unwrap();
    session
        .add_method(
            animal,
            method(
                "Animal",
                "Clone",
                incremented("Animal"),
                Vec::new(),
                MethodModifiers::empty(),
            ),
        )
        .unwrap();

    session
        .add_method(
            dog,
            method("Dog", "Speak", Type::void(), Vec::new(), MethodModifiers::FINAL),
        )
        .unwrap();
    session
        .add_method(
            dog,
            method(
                "Dog",
                "Clone",
                incremented("Dog"),
                Vec::new(),
                MethodModifiers::empty(),
            ),
        )
        .unwrap();

    session
        .add_function(
            util,
            FunctionDecl {
                exposure: Exposure::Public,
                name: "add".to_string(),
                return_type: Type::primitive(Primitive::I32),
                params: vec![i32_param("a"), i32_param("b")],
                doc: None,
                is_inline: false,
            },
        )
        .unwrap();

    session.build().unwrap();
    Zoo {
        session,
        animal,
        dog,
        util,
    }
}

pub(crate) fn zoo() -> Zoo {
    zoo_with_doc("Make a noise.")
}
