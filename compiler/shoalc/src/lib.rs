//! The Shoal compiler driver.
//!
//! [`compile`] runs the whole pipeline: load declarations, build the
//! hierarchy, generate the core C artifacts and any host bindings, then
//! write everything below the destination directory. Files whose content
//! is unchanged are left untouched.

pub mod cli;
pub mod loader;

use std::path::PathBuf;
use std::sync::Once;

use shoal_bind::{host_by_name, BindConfig, HOST_NAMES};
use shoal_codegen::{
    ArtifactSet, ArtifactSink, Boilerplate, CoreGenerator, DispatchLayout, FsSink, GenConfig,
};
use shoal_diagnostic::emitter::ColorMode;
use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use shoal_model::CompilationSession;
use tracing::{debug, info};

/// Everything one compiler run needs.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub dest: PathBuf,
    pub sources: Vec<PathBuf>,
    pub includes: Vec<PathBuf>,
    /// Text placed at the top of every generated file.
    pub header: String,
    /// Text placed at the bottom of every generated file.
    pub footer: String,
    /// Host languages to bind, by name: `perl`, `ruby`.
    pub hosts: Vec<String>,
    /// Host package owning the boot code. Defaults to the first source parcel's name.
    pub boot_class: Option<String>,
    pub layout: DispatchLayout,
    pub color: ColorMode,
}

impl CompileOptions {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        CompileOptions {
            dest: dest.into(),
            sources: Vec::new(),
            includes: Vec::new(),
            header: String::new(),
            footer: String::new(),
            hosts: Vec::new(),
            boot_class: None,
            layout: DispatchLayout::default(),
            color: ColorMode::Auto,
        }
    }

    fn boilerplate(&self) -> Boilerplate {
        Boilerplate::new(self.header.as_str(), self.footer.as_str())
    }
}

/// What a successful run produced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub classes: usize,
    pub artifacts: usize,
    /// Artifacts whose content changed on disk.
    pub written: usize,
}

/// Build every artifact for `options` without touching the filesystem
/// beyond reading declarations.
///
/// # Errors
///
/// Any load, model, generator or binding diagnostic; `E5003` for an
/// unknown host language.
pub fn generate(options: &CompileOptions) -> DiagResult<(CompilationSession, ArtifactSet)> {
    for host in &options.hosts {
        if host_by_name(host).is_none() {
            return Err(unknown_host(host));
        }
    }

    let mut session = CompilationSession::new();
    let loaded = loader::load(&mut session, &options.sources, &options.includes)?;
    debug!(files = loaded.files, classes = session.num_classes(), "declarations loaded");
    session.build()?;
    loaded.host_settings.apply(&mut session)?;

    let gen_config = GenConfig {
        boilerplate: options.boilerplate(),
        layout: options.layout,
    };
    let mut artifacts = CoreGenerator::new(&session, &gen_config).generate()?;

    if !options.hosts.is_empty() {
        let boot_class = boot_class(options, &session)?;
        let bind_config = BindConfig {
            boot_class,
            boilerplate: options.boilerplate(),
        };
        for name in &options.hosts {
            let host = host_by_name(name).ok_or_else(|| unknown_host(name))?;
            artifacts.merge(host.generate(&session, &bind_config)?)?;
        }
    }
    Ok((session, artifacts))
}

/// Run the whole pipeline and write the results below `options.dest`.
///
/// # Errors
///
/// Everything [`generate`] reports, plus `E5001` when an artifact cannot
/// be written.
#[tracing::instrument(level = "debug", skip_all, fields(dest = %options.dest.display()))]
pub fn compile(options: &CompileOptions) -> DiagResult<CompileReport> {
    let (session, artifacts) = generate(options)?;

    let mut sink = FsSink::new(&options.dest);
    let written = sink.write_all(&artifacts).map_err(|err| {
        Diagnostic::error(ErrorCode::E5001)
            .with_message(err.to_string())
            .with_label(options.dest.display().to_string(), "destination directory")
    })?;

    let report = CompileReport {
        classes: session.num_classes(),
        artifacts: artifacts.len(),
        written,
    };
    info!(
        classes = report.classes,
        artifacts = report.artifacts,
        written = report.written,
        "compilation finished"
    );
    Ok(report)
}

fn boot_class(options: &CompileOptions, session: &CompilationSession) -> DiagResult<String> {
    if let Some(boot) = &options.boot_class {
        return Ok(boot.clone());
    }
    session
        .parcels()
        .map(|(_, parcel)| parcel)
        .find(|parcel| !parcel.is_included())
        .map(|parcel| parcel.name().to_string())
        .ok_or_else(|| {
            Diagnostic::error(ErrorCode::E5003)
                .with_message("Host bindings need a boot class")
                .with_note("no source directory defines a parcel")
                .with_suggestion("pass `--boot <Class>` or add a parcel to a source directory")
        })
}

fn unknown_host(name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E5003)
        .with_message(format!("Unknown host language '{name}'"))
        .with_label(name, "given to --host")
        .with_note(format!("supported hosts: {}", HOST_NAMES.join(", ")))
}

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber when `RUST_LOG` is set.
///
/// `SHOAL_LOG_TREE` switches from flat lines to an indented span tree.
/// Calling this more than once is harmless.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var("SHOAL_LOG_TREE").is_ok() {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}
