//! Loads parcels and class declarations from JSON files.
//!
//! A source tree holds two kinds of files:
//! - `*.cfp`: one parcel, `{"name": "Neato", "nickname": "Neato", "version": "v0.1.0"}`
//! - `*.json`: classes of a registered parcel, `{"parcel": "Neato", "classes": [...]}`
//!
//! Every parcel file is registered before any class is declared, so a
//! declaration file may name a parcel defined anywhere in the tree. Files
//! are visited in sorted path order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use shoal_model::{
    ClassDecl, ClassId, CompilationSession, DocComment, Exposure, FunctionDecl, MethodDecl,
    MethodModifiers, Ownership, ParamDecl, Parcel, ParcelId, Primitive, Type, VarDecl, Version,
};
use tracing::{debug, trace};

const PARCEL_EXT: &str = "cfp";
const DECL_EXT: &str = "json";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParcelFile {
    name: String,
    nickname: Option<String>,
    version: Option<Version>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeclFile {
    parcel: String,
    #[serde(default)]
    classes: Vec<ClassSpec>,
}

fn public() -> Exposure {
    Exposure::Public
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassSpec {
    name: String,
    nickname: Option<String>,
    parent: Option<String>,
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default, rename = "inert")]
    is_inert: bool,
    #[serde(default = "public")]
    exposure: Exposure,
    doc: Option<String>,
    #[serde(default)]
    member_vars: Vec<VarSpec>,
    #[serde(default)]
    inert_vars: Vec<VarSpec>,
    #[serde(default)]
    functions: Vec<FunctionSpec>,
    #[serde(default)]
    methods: Vec<MethodSpec>,
    autocode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VarSpec {
    name: String,
    #[serde(rename = "type")]
    ty: TypeSpec,
    #[serde(default)]
    exposure: Exposure,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamSpec {
    name: String,
    #[serde(rename = "type")]
    ty: TypeSpec,
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionSpec {
    name: String,
    returns: Option<TypeSpec>,
    #[serde(default)]
    params: Vec<ParamSpec>,
    doc: Option<String>,
    #[serde(default)]
    inline: bool,
    #[serde(default = "public")]
    exposure: Exposure,
}

/// A method. `self` is implied and must not be listed in `params`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodSpec {
    name: String,
    returns: Option<TypeSpec>,
    #[serde(default)]
    params: Vec<ParamSpec>,
    doc: Option<String>,
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default = "public")]
    exposure: Exposure,
    host_alias: Option<String>,
    #[serde(default)]
    exclude_from_host: bool,
}

/// A structured type. Exactly one of the kind fields must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeSpec {
    primitive: Option<String>,
    object: Option<String>,
    void: Option<serde_json::Value>,
    composite: Option<Box<CompositeSpec>>,
    arbitrary: Option<String>,
    #[serde(default)]
    nullable: bool,
    #[serde(default, rename = "const")]
    constant: bool,
    #[serde(default)]
    ownership: Ownership,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompositeSpec {
    element: TypeSpec,
    #[serde(default)]
    indirection: u8,
    array: Option<String>,
}

impl TypeSpec {
    fn to_type(&self) -> DiagResult<Type> {
        let kinds = [
            self.primitive.is_some(),
            self.object.is_some(),
            self.void.is_some(),
            self.composite.is_some(),
            self.arbitrary.is_some(),
        ];
        if kinds.iter().filter(|present| **present).count() != 1 {
            return Err(Diagnostic::error(ErrorCode::E5002)
                .with_message("A type must name exactly one kind")
                .with_suggestion(
                    "use one of `primitive`, `object`, `void`, `composite` or `arbitrary`",
                ));
        }

        let mut ty = if let Some(name) = &self.primitive {
            let prim = Primitive::from_c(name).ok_or_else(|| {
                Diagnostic::error(ErrorCode::E1011)
                    .with_message(format!("Unknown primitive type '{name}'"))
                    .with_label(name, "not a supported C primitive")
            })?;
            Type::primitive(prim)
        } else if let Some(spec) = &self.object {
            Type::object_named(spec)?
        } else if let Some(composite) = &self.composite {
            Type::composite(
                composite.element.to_type()?,
                composite.indirection,
                composite.array.clone(),
            )
        } else if let Some(name) = &self.arbitrary {
            Type::arbitrary(name.as_str())
        } else {
            Type::void()
        };

        if self.nullable {
            ty = ty.nullable();
        }
        if self.constant {
            ty = ty.constant();
        }
        if self.ownership != Ownership::None {
            ty = ty.with_ownership(self.ownership);
        }
        Ok(ty)
    }
}

fn return_type(spec: Option<&TypeSpec>) -> DiagResult<Type> {
    spec.map_or_else(|| Ok(Type::void()), TypeSpec::to_type)
}

fn params(specs: &[ParamSpec]) -> DiagResult<Vec<ParamDecl>> {
    specs
        .iter()
        .map(|spec| {
            Ok(ParamDecl {
                name: spec.name.clone(),
                ty: spec.ty.to_type()?,
                default: spec.default.clone(),
            })
        })
        .collect()
}

fn var(spec: &VarSpec) -> DiagResult<VarDecl> {
    Ok(VarDecl {
        exposure: spec.exposure,
        name: spec.name.clone(),
        ty: spec.ty.to_type()?,
    })
}

/// Host settings read from declaration files.
///
/// Aliases and exclusions depend on method novelty, which is only known
/// after the hierarchy is built.
#[derive(Debug, Default)]
pub struct HostSettings {
    aliases: Vec<(ClassId, String, String)>,
    exclusions: Vec<(ClassId, String)>,
}

impl HostSettings {
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.exclusions.is_empty()
    }

    /// Apply every setting to a built session.
    ///
    /// # Errors
    ///
    /// `E1008` when a setting targets a method the class does not declare
    /// or an inherited one.
    pub fn apply(self, session: &mut CompilationSession) -> DiagResult<()> {
        for (class, method, alias) in self.aliases {
            session.set_host_alias(class, &method, &alias)?;
        }
        for (class, method) in self.exclusions {
            session.exclude_from_host(class, &method)?;
        }
        Ok(())
    }
}

/// Parcels and classes read from a set of directories.
#[derive(Debug, Default)]
pub struct Loaded {
    pub files: usize,
    pub host_settings: HostSettings,
}

/// Every declaration file below `dir`, sorted by path.
///
/// # Errors
///
/// `E5004` if `dir` is not a directory, `E5002` if it cannot be read.
pub fn discover(dir: &Path) -> DiagResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Diagnostic::error(ErrorCode::E5004)
            .with_message(format!("Directory '{}' does not exist", dir.display()))
            .with_label(dir.display().to_string(), "given on the command line"));
    }

    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(next) = pending.pop() {
        let entries = fs::read_dir(&next).map_err(|err| unreadable(&next, &err))?;
        for entry in entries {
            let path = entry.map_err(|err| unreadable(&next, &err))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some(PARCEL_EXT | DECL_EXT)
            ) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

fn unreadable(path: &Path, err: &io::Error) -> Diagnostic {
    Diagnostic::error(ErrorCode::E5002)
        .with_message(format!("Cannot read '{}': {err}", path.display()))
        .with_label(path.display().to_string(), "unreadable")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> DiagResult<T> {
    let text = fs::read_to_string(path).map_err(|err| unreadable(path, &err))?;
    serde_json::from_str(&text).map_err(|err| {
        Diagnostic::error(ErrorCode::E5002)
            .with_message(format!("Malformed declaration file '{}'", path.display()))
            .with_label(path.display().to_string(), err.to_string())
    })
}

fn in_file(path: &Path) -> impl FnOnce(Diagnostic) -> Diagnostic + '_ {
    move |diag| diag.with_note(format!("declared in '{}'", path.display()))
}

fn is_parcel_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(PARCEL_EXT)
}

/// Declares everything below `includes` and `sources` in `session`.
///
/// Parcels found below an include directory are marked included: their
/// classes take part in resolution but get no artifacts.
///
/// # Errors
///
/// `E5004` for a missing directory, `E5002` for a malformed file, and
/// any model error raised by a declaration.
#[tracing::instrument(level = "debug", skip_all, fields(sources = sources.len(), includes = includes.len()))]
pub fn load(
    session: &mut CompilationSession,
    sources: &[PathBuf],
    includes: &[PathBuf],
) -> DiagResult<Loaded> {
    let mut files = Vec::new();
    for dir in includes {
        files.extend(discover(dir)?.into_iter().map(|path| (path, true)));
    }
    for dir in sources {
        files.extend(discover(dir)?.into_iter().map(|path| (path, false)));
    }

    let mut parcels: FxHashMap<String, ParcelId> = FxHashMap::default();
    for (path, is_included) in files.iter().filter(|(path, _)| is_parcel_file(path)) {
        let file: ParcelFile = read_json(path)?;
        let parcel = Parcel::new(
            &file.name,
            file.nickname.as_deref(),
            file.version,
            *is_included,
        )
        .map_err(in_file(path))?;
        let id = session.register_parcel(parcel).map_err(in_file(path))?;
        debug!(parcel = %file.name, included = is_included, "parcel registered");
        parcels.insert(file.name, id);
    }

    let mut loaded = Loaded {
        files: files.len(),
        host_settings: HostSettings::default(),
    };
    for (path, _) in files.iter().filter(|(path, _)| !is_parcel_file(path)) {
        let file: DeclFile = read_json(path)?;
        let Some(&parcel) = parcels.get(&file.parcel) else {
            return Err(Diagnostic::error(ErrorCode::E2007)
                .with_message(format!("Parcel '{}' was never registered", file.parcel))
                .with_label(path.display().to_string(), "declarations refer to it here")
                .with_suggestion(format!(
                    "add a `.{PARCEL_EXT}` file for '{}' to a source or include directory",
                    file.parcel
                )));
        };
        for class in &file.classes {
            declare_class(session, parcel, class, &mut loaded.host_settings)
                .map_err(in_file(path))?;
        }
        trace!(path = %path.display(), classes = file.classes.len(), "declarations loaded");
    }
    Ok(loaded)
}

fn declare_class(
    session: &mut CompilationSession,
    parcel: ParcelId,
    spec: &ClassSpec,
    host_settings: &mut HostSettings,
) -> DiagResult<()> {
    let id = session.add_class(
        parcel,
        ClassDecl {
            name: spec.name.clone(),
            nickname: spec.nickname.clone(),
            parent: spec.parent.clone(),
            exposure: spec.exposure,
            is_final: spec.is_final,
            is_inert: spec.is_inert,
            doc: spec.doc.as_deref().map(DocComment::parse),
        },
    )?;
    let self_type = session.class(id).struct_sym().to_string();

    for member in &spec.member_vars {
        session.add_member_var(id, var(member)?)?;
    }
    for inert in &spec.inert_vars {
        session.add_inert_var(id, var(inert)?)?;
    }
    for func in &spec.functions {
        session.add_function(
            id,
            FunctionDecl {
                exposure: func.exposure,
                name: func.name.clone(),
                return_type: return_type(func.returns.as_ref())?,
                params: params(&func.params)?,
                doc: func.doc.as_deref().map(DocComment::parse),
                is_inline: func.inline,
            },
        )?;
    }
    for method in &spec.methods {
        let mut all_params = vec![ParamDecl {
            name: "self".to_string(),
            ty: Type::object_named(&self_type)?,
            default: None,
        }];
        all_params.extend(params(&method.params)?);

        let mut modifiers = MethodModifiers::empty();
        modifiers.set(MethodModifiers::FINAL, method.is_final);
        modifiers.set(MethodModifiers::ABSTRACT, method.is_abstract);

        session.add_method(
            id,
            MethodDecl {
                exposure: method.exposure,
                name: method.name.clone(),
                return_type: return_type(method.returns.as_ref())?,
                params: all_params,
                doc: method.doc.as_deref().map(DocComment::parse),
                modifiers,
            },
        )?;
        if let Some(alias) = &method.host_alias {
            host_settings
                .aliases
                .push((id, method.name.clone(), alias.clone()));
        }
        if method.exclude_from_host {
            host_settings.exclusions.push((id, method.name.clone()));
        }
    }
    if let Some(code) = &spec.autocode {
        session.append_autocode(id, code)?;
    }
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
