//! The seam between the driver and the per-language generators.

use shoal_codegen::c_ast::{render, Item};
use shoal_codegen::{ArtifactSet, Boilerplate, CommentStyle};
use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use shoal_model::{ClassName, CompilationSession, Parcel};

use crate::perl::PerlHost;
use crate::ruby::RubyHost;

/// Settings shared by every host generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindConfig {
    /// Host package that owns the bootstrap code, e.g. `Neato`.
    pub boot_class: String,
    pub boilerplate: Boilerplate,
}

impl BindConfig {
    pub fn new(boot_class: impl Into<String>) -> Self {
        BindConfig {
            boot_class: boot_class.into(),
            boilerplate: Boilerplate::default(),
        }
    }

    /// `Neato::Util` becomes `Neato_Util`.
    pub fn boot_ident(&self) -> String {
        self.boot_class.replace("::", "_")
    }
}

/// A generator of bindings for one host language.
pub trait HostLanguage {
    /// Lower-case name used on the command line: `perl`, `ruby`.
    fn name(&self) -> &'static str;

    /// Produce every binding artifact for the session.
    ///
    /// # Errors
    ///
    /// `E2010` if the session is not built, `E1004` for a bad boot class,
    /// `E1012` for an invalid constructor initializer.
    fn generate(
        &self,
        session: &CompilationSession,
        config: &BindConfig,
    ) -> DiagResult<ArtifactSet>;
}

/// Every host language this crate supports, by command-line name.
pub fn host_by_name(name: &str) -> Option<Box<dyn HostLanguage>> {
    match name {
        "perl" => Some(Box::new(PerlHost)),
        "ruby" => Some(Box::new(RubyHost)),
        _ => None,
    }
}

pub const HOST_NAMES: &[&str] = &["perl", "ruby"];

/// Validate what every host generator needs before it starts.
///
/// Returns the prefix-bearing parcel the boot code belongs to: the first
/// parcel that is not included, if any.
pub(crate) fn prepare<'s>(
    session: &'s CompilationSession,
    config: &BindConfig,
) -> DiagResult<Option<&'s Parcel>> {
    if !session.is_built() {
        return Err(Diagnostic::error(ErrorCode::E2010)
            .with_message("Cannot generate bindings before the hierarchy is built"));
    }
    ClassName::new(&config.boot_class, None).map_err(|err| {
        err.with_note(format!("'{}' is used as the boot class", config.boot_class))
    })?;
    Ok(session
        .parcels()
        .map(|(_, parcel)| parcel)
        .find(|parcel| !parcel.is_included()))
}

/// Render `items` as a C file wrapped in the configured boilerplate.
pub(crate) fn insert_c(
    artifacts: &mut ArtifactSet,
    config: &BindConfig,
    path: &str,
    items: &[Item],
) -> DiagResult<()> {
    artifacts.insert(path, config.boilerplate.wrap(&render(items), CommentStyle::C))
}
