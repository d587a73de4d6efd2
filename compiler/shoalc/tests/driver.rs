// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end runs of the driver against declaration trees on disk.

use std::fs;
use std::path::Path;
use std::process::Command;

use pretty_assertions::assert_eq;
use shoal_diagnostic::ErrorCode;
use shoalc::{compile, generate, CompileOptions};
use tempfile::TempDir;

const PARCEL: &str = r#"{"name": "Neato", "version": "v1.2"}"#;

const CLASSES: &str = r#"{
    "parcel": "Neato",
    "classes": [
        {
            "name": "Neato::Animal",
            "doc": "/** Sentinel docstring for the animal. */",
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
                {"name": "Get_Age", "returns": {"primitive": "int32_t"}},
                {"name": "Eat", "params": [{"name": "amount", "type": {"primitive": "int32_t"}}]}
            ]
        },
        {
            "name": "Neato::Dog",
            "parent": "Neato::Animal",
            "doc": "/** A loyal creature. */",
            "member_vars": [{"name": "tricks", "type": {"primitive": "uint32_t"}}],
            "methods": [
                {"name": "Speak"},
                {"name": "Wag", "final": true}
            ]
        }
    ]
}"#;

struct Project {
    root: TempDir,
}

impl Project {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let source = root.path().join("core");
        fs::create_dir_all(source.join("Neato")).unwrap();
        fs::write(source.join("Neato.cfp"), PARCEL).unwrap();
        fs::write(source.join("Neato").join("Animal.json"), CLASSES).unwrap();
        Project { root }
    }

    fn dest(&self) -> std::path::PathBuf {
        self.root.path().join("autogen")
    }

    fn options(&self) -> CompileOptions {
        let mut options = CompileOptions::new(self.dest());
        options.sources.push(self.root.path().join("core"));
        options
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.dest().join(rel))
            .unwrap_or_else(|err| panic!("cannot read {rel}: {err}"))
    }
}

#[test]
fn writes_core_artifacts() {
    let project = Project::new();
    let report = compile(&project.options()).unwrap();

    assert_eq!(report.classes, 2);
    assert_eq!(report.written, report.artifacts);
    for rel in [
        "include/Neato/Animal.h",
        "include/Neato/Dog.h",
        "include/neato_parcel.h",
        "include/neato_callbacks.h",
        "source/neato_parcel.c",
    ] {
        assert!(project.dest().join(rel).is_file(), "missing {rel}");
    }
    assert!(project.read("include/Neato/Dog.h").contains("neato_Dog"));
}

#[test]
fn second_run_leaves_files_alone() {
    let project = Project::new();
    let mut options = project.options();
    options.hosts = vec!["perl".to_string(), "ruby".to_string()];

    let first = compile(&options).unwrap();
    assert!(first.written > 0);
    let before = fs::metadata(project.dest().join("include/Neato/Animal.h"))
        .unwrap()
        .modified()
        .unwrap();

    let second = compile(&options).unwrap();
    assert_eq!(second.written, 0);
    assert_eq!(second.artifacts, first.artifacts);
    let after = fs::metadata(project.dest().join("include/Neato/Animal.h"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn repeated_generation_is_byte_identical() {
    let project = Project::new();
    let mut options = project.options();
    options.hosts = vec!["perl".to_string()];

    let (_, first) = generate(&options).unwrap();
    let (_, second) = generate(&options).unwrap();
    let first: Vec<_> = first.iter().collect();
    let second: Vec<_> = second.iter().collect();
    assert_eq!(first, second);
}

#[test]
fn docstrings_stay_with_their_class() {
    let project = Project::new();
    compile(&project.options()).unwrap();

    let animal = project.read("include/Neato/Animal.h");
    let dog = project.read("include/Neato/Dog.h");
    assert!(animal.contains("Sentinel docstring"));
    assert!(!dog.contains("Sentinel docstring"));
    assert!(dog.contains("A loyal creature."));
    assert!(!animal.contains("A loyal creature."));
}

#[test]
fn editing_a_docstring_only_touches_that_class_header() {
    let project = Project::new();
    let (_, before) = generate(&project.options()).unwrap();

    let decls = project.root.path().join("core/Neato/Animal.json");
    let edited = CLASSES.replace("A loyal creature.", "A very loyal creature.");
    fs::write(&decls, edited).unwrap();
    let (_, after) = generate(&project.options()).unwrap();

    let changed: Vec<_> = before
        .iter()
        .filter(|(path, content)| after.get(path) != Some(*content))
        .map(|(path, _)| path.to_string())
        .collect();
    assert_eq!(changed, vec!["include/Neato/Dog.h".to_string()]);
}

#[test]
fn header_and_footer_wrap_every_file() {
    let project = Project::new();
    let mut options = project.options();
    options.header = "Generated by the zoo.".to_string();
    options.footer = "End of generated file.".to_string();
    options.hosts = vec!["perl".to_string(), "ruby".to_string()];

    let (_, artifacts) = generate(&options).unwrap();
    for (path, content) in artifacts.iter() {
        assert!(content.contains("Generated by the zoo."), "no header in {path}");
        if Path::new(path).extension().is_some_and(|ext| ext == "h" || ext == "c") {
            assert!(content.contains("End of generated file."), "no footer in {path}");
        }
    }
}

#[test]
fn host_artifacts_use_the_source_parcel_as_boot_class() {
    let project = Project::new();
    let mut options = project.options();
    options.hosts = vec!["perl".to_string(), "ruby".to_string()];
    compile(&options).unwrap();

    for rel in [
        "perl/Neato.xs",
        "perl/callbacks.c",
        "perl/boot.h",
        "perl/boot.c",
        "perl/typemap",
        "ruby/neato_ruby.c",
        "ruby/callbacks.c",
        "ruby/typemap.rb",
    ] {
        assert!(project.dest().join(rel).is_file(), "missing {rel}");
    }
    assert!(project.read("perl/Neato.xs").contains("MODULE = Neato"));
    assert!(project.read("ruby/neato_ruby.c").contains("Init_neato"));
}

#[test]
fn included_parcels_get_no_artifacts() {
    let project = Project::new();
    let ext = project.root.path().join("ext");
    fs::create_dir_all(&ext).unwrap();
    fs::write(ext.join("Zoo.cfp"), r#"{"name": "Zoo"}"#).unwrap();
    fs::write(
        ext.join("Keeper.json"),
        r#"{"parcel": "Zoo", "classes": [{"name": "Zoo::Keeper", "parent": "Neato::Animal",
            "methods": [{"name": "Speak"}]}]}"#,
    )
    .unwrap();

    let mut options = CompileOptions::new(project.dest());
    options.sources.push(ext);
    options.includes.push(project.root.path().join("core"));
    compile(&options).unwrap();

    assert!(project.dest().join("include/Zoo/Keeper.h").is_file());
    assert!(!project.dest().join("include/Neato/Animal.h").exists());
    assert!(!project.dest().join("source/neato_parcel.c").exists());
}

#[test]
fn override_of_final_method_fails() {
    let project = Project::new();
    let pup = project.root.path().join("core").join("Pup.json");
    fs::write(
        &pup,
        r#"{"parcel": "Neato", "classes": [{"name": "Neato::Pup", "parent": "Neato::Dog",
            "methods": [{"name": "Wag"}]}]}"#,
    )
    .unwrap();

    let err = compile(&project.options()).unwrap_err();
    assert_eq!(err.code, ErrorCode::E2001);
    assert!(!project.dest().exists());
}

#[test]
fn unknown_host_is_rejected() {
    let project = Project::new();
    let mut options = project.options();
    options.hosts = vec!["cobol".to_string()];
    assert_eq!(compile(&options).unwrap_err().code, ErrorCode::E5003);
}

#[test]
fn missing_source_directory_is_e5004() {
    let project = Project::new();
    let mut options = project.options();
    options.sources.push(project.root.path().join("nowhere"));
    assert_eq!(compile(&options).unwrap_err().code, ErrorCode::E5004);
}

fn shoalc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_shoalc"))
}

#[test]
fn binary_exits_nonzero_with_a_diagnostic() {
    let project = Project::new();
    let output = shoalc()
        .arg("--dest")
        .arg(project.dest())
        .arg("--source")
        .arg(project.root.path().join("missing"))
        .arg("--color")
        .arg("never")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E5004"), "stderr was: {stderr}");
}

#[test]
fn binary_rejects_bad_flags() {
    let output = shoalc().arg("--frobnicate").arg("yes").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("E5003"));
}

#[test]
fn binary_compiles_and_succeeds() {
    let project = Project::new();
    let status = shoalc()
        .arg("--dest")
        .arg(project.dest())
        .arg("--source")
        .arg(project.root.path().join("core"))
        .arg("--host")
        .arg("perl")
        .status()
        .unwrap();

    assert!(status.success());
    assert!(project.dest().join("perl/Neato.xs").is_file());
}

#[test]
fn binary_explains_error_codes() {
    let output = shoalc().arg("--explain").arg("E2001").output().unwrap();
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());

    let unknown = shoalc().arg("--explain").arg("E0000").output().unwrap();
    assert!(!unknown.status.success());
}
