use super::*;
use pretty_assertions::assert_eq;

#[test]
fn comments() {
    let out = render(&[
        Item::comment("Define the struct layout.\nSecond line."),
        Item::DocComment("Brief.\n\nLong.".to_string()),
    ]);
    assert_eq!(
        out,
        "/* Define the struct layout.\n * Second line.\n */\n/** Brief.\n *\n * Long.\n */\n"
    );
}

#[test]
fn function_with_branches() {
    let out = render(&[Item::Function {
        sig: Signature::new(Storage::Static, "int32_t", "pick", "bool yes"),
        body: vec![
            Stmt::decl("int32_t", "n", "0"),
            Stmt::If {
                cond: "yes".to_string(),
                then: vec![Stmt::expr("n = 1")],
                otherwise: vec![Stmt::expr("n = 2")],
            },
            Stmt::ret("n"),
        ],
    }]);
    assert_eq!(
        out,
        "static int32_t\n\
         pick(bool yes) {\n\
         \x20   int32_t n = 0;\n\
         \x20   if (yes) {\n\
         \x20       n = 1;\n\
         \x20   }\n\
         \x20   else {\n\
         \x20       n = 2;\n\
         \x20   }\n\
         \x20   return n;\n\
         }\n"
    );
}

#[test]
fn function_like_macro() {
    let out = render(&[Item::Define {
        name: "Neato_Dog_Speak".to_string(),
        params: Some("self".to_string()),
        body: vec!["Neato_Dog_Speak_IMP((neato_Dog*)self)".to_string()],
    }]);
    assert_eq!(
        out,
        "#define Neato_Dog_Speak(self) \\\n    Neato_Dog_Speak_IMP((neato_Dog*)self)\n"
    );
}

#[test]
fn nested_preprocessor_lines_indent() {
    let out = render(&[Item::IfDef {
        symbol: "NEATO_USE_SHORT_NAMES".to_string(),
        items: vec![Item::define("Dog", "neato_Dog"), Item::define("DOG", "NEATO_DOG")],
    }]);
    assert_eq!(
        out,
        "#ifdef NEATO_USE_SHORT_NAMES\n  #define Dog neato_Dog\n  #define DOG NEATO_DOG\n#endif /* NEATO_USE_SHORT_NAMES */\n"
    );
}

#[test]
fn macro_headed_block() {
    let out = render(&[Item::Block {
        head: "XS(XS_Neato_Dog_bark)".to_string(),
        body: vec![Stmt::expr("dXSARGS"), Stmt::Line("/* Execute */".to_string())],
    }]);
    assert_eq!(out, "XS(XS_Neato_Dog_bark) {\n    dXSARGS;\n    /* Execute */\n}\n");
}

#[test]
fn conditional_with_else_branch() {
    let out = render(&[Item::If {
        cond: "defined(SHOAL_PARCEL_NEATO)".to_string(),
        then: vec![Item::define("NEATO_VISIBLE", "SHOAL_EXPORT")],
        otherwise: vec![Item::define("NEATO_VISIBLE", "SHOAL_IMPORT")],
    }]);
    assert_eq!(
        out,
        "#if defined(SHOAL_PARCEL_NEATO)
  #define NEATO_VISIBLE SHOAL_EXPORT
         #else
  #define NEATO_VISIBLE SHOAL_IMPORT
#endif
"
    );
}

#[test]
fn guards_and_extern_c() {
    let out = render(&[Item::Guard {
        symbol: "H_NEATO_DOG".to_string(),
        items: vec![Item::ExternC(vec![Item::extern_decl(
            Storage::exported("NEATO_"),
            "shoal_Class *NEATO_DOG",
        )])],
    }]);
    assert_eq!(
        out,
        "#ifndef H_NEATO_DOG\n#define H_NEATO_DOG 1\n\n\
         #ifdef __cplusplus\nextern \"C\" {\n#endif\n\n\
         extern NEATO_VISIBLE shoal_Class *NEATO_DOG;\n\n\
         #ifdef __cplusplus\n}\n#endif\n\n\
         #endif /* H_NEATO_DOG */\n"
    );
}

#[test]
fn struct_and_typedefs() {
    let out = render(&[
        Item::Typedef {
            target: "struct neato_DogIVARS".to_string(),
            alias: "neato_DogIVARS".to_string(),
        },
        Item::Struct {
            name: "neato_DogIVARS".to_string(),
            fields: vec!["int32_t legs;".to_string()],
        },
        Item::FnPtrTypedef {
            ret: "void".to_string(),
            name: "Neato_Dog_Speak_t".to_string(),
            params: "neato_Dog* self".to_string(),
        },
    ]);
    assert_eq!(
        out,
        "typedef struct neato_DogIVARS neato_DogIVARS;\n\
         struct neato_DogIVARS {\n    int32_t legs;\n};\n\
         typedef void\n(*Neato_Dog_Speak_t)(neato_Dog* self);\n"
    );
}

#[test]
fn array_of_structs() {
    let out = render(&[Item::Array {
        storage: Storage::StaticConst,
        ty: "shoal_InheritedMethSpec".to_string(),
        name: "NEATO_DOG_INHERITED_METHS".to_string(),
        elements: vec![
            Init::Fields(vec![
                Field::new("&Neato_Dog_Eat_OFFSET", "offset"),
                Field::new("&Neato_Animal_Eat_OFFSET", "parent_offset"),
            ]),
            Init::Fields(vec![
                Field::new("&Neato_Dog_Sleep_OFFSET", "offset"),
                Field::new("&Neato_Animal_Sleep_OFFSET", "parent_offset"),
            ]),
        ],
    }]);
    assert_eq!(
        out,
        "static const shoal_InheritedMethSpec NEATO_DOG_INHERITED_METHS[] = {\n\
         \x20   {\n\
         \x20       &Neato_Dog_Eat_OFFSET, /* offset */\n\
         \x20       &Neato_Animal_Eat_OFFSET /* parent_offset */\n\
         \x20   },\n\
         \x20   {\n\
         \x20       &Neato_Dog_Sleep_OFFSET, /* offset */\n\
         \x20       &Neato_Animal_Sleep_OFFSET /* parent_offset */\n\
         \x20   }\n\
         };\n"
    );
}

#[test]
fn verbatim_gets_trailing_newline() {
    let out = render(&[Item::Verbatim("int x;".to_string()), Item::Blank]);
    assert_eq!(out, "int x;\n\n");
}

#[test]
fn rendering_is_deterministic() {
    let items = vec![
        Item::include("neato_parcel.h"),
        Item::system_include("stddef.h"),
        Item::var(Storage::Plain, "size_t", "Neato_Dog_Speak_OFFSET"),
    ];
    assert_eq!(render(&items), render(&items));
    assert_eq!(
        render(&items),
        "#include \"neato_parcel.h\"\n#include <stddef.h>\nsize_t Neato_Dog_Speak_OFFSET;\n"
    );
}
