use super::*;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const NEATO_CFP: &str = r#"{"name": "Neato", "version": "v0.1.0"}"#;

const ANIMALS: &str = r#"{
    "parcel": "Neato",
    "classes": [
        {
            "name": "Neato::Animal",
            "doc": "/** A creature. */",
            "member_vars": [{"name": "age", "type": {"primitive": "int32_t"}}],
            "functions": [
                {
                    "name": "init",
                    "returns": {"object": "Animal", "ownership": "incremented"},
                    "params": [
                        {"name": "self", "type": {"object": "Animal"}},
                        {"name": "age", "type": {"primitive": "int32_t"}, "default": "0"}
                    ]
                }
            ],
            "methods": [
                {"name": "Speak", "abstract": true},
                {"name": "Get_Age", "returns": {"primitive": "int32_t"}, "host_alias": "age"},
                {"name": "Secret", "exclude_from_host": true},
                {
                    "name": "Write_To",
                    "params": [{"name": "fp", "type": {"composite": {"element": {"arbitrary": "FILE"}, "indirection": 1}}}]
                }
            ]
        },
        {
            "name": "Neato::Dog",
            "parent": "Neato::Animal",
            "methods": [{"name": "Speak", "final": true}]
        }
    ]
}"#;

fn tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Neato.cfp", NEATO_CFP);
    write(dir.path(), "Neato/Animal.json", ANIMALS);
    dir
}

#[test]
fn discovers_declaration_files_in_sorted_order() {
    let dir = tree();
    write(dir.path(), "Neato/README.txt", "ignored");
    write(dir.path(), "A/Zebra.json", r#"{"parcel": "Neato"}"#);

    let found: Vec<_> = discover(dir.path())
        .unwrap()
        .into_iter()
        .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();

    assert_eq!(
        found,
        vec![
            PathBuf::from("A/Zebra.json"),
            PathBuf::from("Neato.cfp"),
            PathBuf::from("Neato/Animal.json"),
        ]
    );
}

#[test]
fn missing_directory_is_e5004() {
    let dir = TempDir::new().unwrap();
    let err = discover(&dir.path().join("nope")).unwrap_err();
    assert_eq!(err.code, ErrorCode::E5004);
}

#[test]
fn loads_a_buildable_hierarchy() {
    let dir = tree();
    let mut session = CompilationSession::new();
    let loaded = load(&mut session, &[dir.path().to_path_buf()], &[]).unwrap();
    assert_eq!(loaded.files, 2);
    assert!(!loaded.host_settings.is_empty());

    session.build().unwrap();
    loaded.host_settings.apply(&mut session).unwrap();

    let names: Vec<_> = session.ordered_classes().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["Neato::Animal", "Neato::Dog"]);

    let animal = session.class_by_name("Neato::Animal").unwrap();
    assert_eq!(animal.member_vars().len(), 1);
    assert!(animal.function("init").is_some());
    assert!(animal.doc().is_some());

    let methods: Vec<_> = session.fresh_methods(animal.id()).collect();
    let get_age = methods.iter().find(|m| m.macro_sym() == "Get_Age").unwrap();
    assert_eq!(get_age.host_name(), "age");
    assert_eq!(get_age.params().len(), 1);
    let secret = methods.iter().find(|m| m.macro_sym() == "Secret").unwrap();
    assert!(secret.is_excluded_from_host());
    let write_to = methods.iter().find(|m| m.macro_sym() == "Write_To").unwrap();
    assert_eq!(write_to.params().to_c(), "neato_Animal* self, FILE* fp");

    let dog = session.class_by_name("Neato::Dog").unwrap();
    let speak = session
        .fresh_methods(dog.id())
        .find(|m| m.macro_sym() == "Speak")
        .unwrap();
    assert!(speak.is_final());
}

#[test]
fn include_directories_mark_parcels_included() {
    let include = tree();
    let source = TempDir::new().unwrap();
    write(source.path(), "Zoo.cfp", r#"{"name": "Zoo"}"#);
    write(
        source.path(),
        "Zoo/Keeper.json",
        r#"{"parcel": "Zoo", "classes": [{"name": "Zoo::Keeper", "parent": "Neato::Animal"}]}"#,
    );

    let mut session = CompilationSession::new();
    load(
        &mut session,
        &[source.path().to_path_buf()],
        &[include.path().to_path_buf()],
    )
    .unwrap();
    session.build().unwrap();

    let included: Vec<_> = session
        .parcels()
        .map(|(_, p)| (p.name().to_string(), p.is_included()))
        .collect();
    assert_eq!(
        included,
        vec![("Neato".to_string(), true), ("Zoo".to_string(), false)]
    );
    assert!(session.class_by_name("Neato::Animal").unwrap().is_included());
    assert!(!session.class_by_name("Zoo::Keeper").unwrap().is_included());
}

#[test]
fn malformed_json_is_e5002() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Neato.cfp", "{\"name\": ");
    let mut session = CompilationSession::new();
    let err = load(&mut session, &[dir.path().to_path_buf()], &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::E5002);
}

#[test]
fn unknown_field_is_e5002() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Neato.cfp", r#"{"name": "Neato", "colour": "blue"}"#);
    let mut session = CompilationSession::new();
    let err = load(&mut session, &[dir.path().to_path_buf()], &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::E5002);
}

#[test]
fn unregistered_parcel_is_e2007() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Orphan.json", r#"{"parcel": "Nowhere", "classes": []}"#);
    let mut session = CompilationSession::new();
    let err = load(&mut session, &[dir.path().to_path_buf()], &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::E2007);
}

#[test]
fn bad_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Neato.cfp", r#"{"name": "Neato", "version": "1.0"}"#);
    let mut session = CompilationSession::new();
    let err = load(&mut session, &[dir.path().to_path_buf()], &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::E5002);
}

#[test]
fn model_errors_name_the_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Neato.cfp", NEATO_CFP);
    write(
        dir.path(),
        "bad.json",
        r#"{"parcel": "Neato", "classes": [{"name": "neato::lower"}]}"#,
    );
    let mut session = CompilationSession::new();
    let err = load(&mut session, &[dir.path().to_path_buf()], &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::E1004);
    assert!(err.to_string().contains("bad.json"));
}

#[test]
fn type_with_two_kinds_is_rejected() {
    let spec: TypeSpec =
        serde_json::from_str(r#"{"primitive": "int32_t", "object": "Animal"}"#).unwrap();
    assert_eq!(spec.to_type().unwrap_err().code, ErrorCode::E5002);

    let empty: TypeSpec = serde_json::from_str("{}").unwrap();
    assert_eq!(empty.to_type().unwrap_err().code, ErrorCode::E5002);
}

#[test]
fn type_modifiers_apply() {
    let spec: TypeSpec = serde_json::from_str(
        r#"{"object": "Animal", "nullable": true, "ownership": "decremented"}"#,
    )
    .unwrap();
    let ty = spec.to_type().unwrap();
    assert!(ty.is_nullable());
    assert!(ty.is_decremented());

    let void: TypeSpec = serde_json::from_str(r#"{"void": {}}"#).unwrap();
    assert!(void.to_type().unwrap().is_void());

    let unknown: TypeSpec = serde_json::from_str(r#"{"primitive": "long"}"#).unwrap();
    assert_eq!(unknown.to_type().unwrap_err().code, ErrorCode::E1011);
}
