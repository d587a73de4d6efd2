//! Command-line parsing.

use std::fs;
use std::path::PathBuf;

use shoal_codegen::DispatchLayout;
use shoal_diagnostic::emitter::ColorMode;
use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

use crate::CompileOptions;

/// What the user asked for.
#[derive(Clone, Debug)]
pub enum Command {
    Compile(CompileOptions),
    Explain(String),
    Help,
}

pub const USAGE: &str = "\
Shoal compiler

Usage: shoalc --dest <dir> --source <dir> [options]
       shoalc --explain <code>

Options:
  --dest <dir>           Output directory (required)
  --source <dir>         Declarations to generate code for (repeatable)
  --include <dir>        Declarations used only for resolution (repeatable)
  --header <file>        Text placed at the top of every generated file
  --footer <file>        Text placed at the bottom of every generated file
  --host <lang>          Generate bindings for perl or ruby (repeatable)
  --boot <class>         Host package owning the boot code
  --pointer-size <4|8>   Target pointer width in bytes (default: 8)
  --color <mode>         Diagnostics colour: auto, always, never
  --explain <code>       Explain an error code (e.g., E2001)
  --help                 Show this help message";

fn bad_usage(message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(ErrorCode::E5003)
        .with_message(message)
        .with_suggestion("run `shoalc --help` for usage")
}

fn read_text(flag: &str, path: &str) -> DiagResult<String> {
    fs::read_to_string(path).map_err(|err| {
        bad_usage(format!("Cannot read {flag} file '{path}': {err}")).with_label(path, flag)
    })
}

/// Parse the arguments after the program name.
///
/// # Errors
///
/// `E5003` for an unknown flag, a missing value or a missing `--dest`.
pub fn parse_args(args: &[String]) -> DiagResult<Command> {
    let mut options = CompileOptions::new(PathBuf::new());
    let mut dest = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let flag = flag.as_str();
        if flag == "--help" || flag == "-h" {
            return Ok(Command::Help);
        }
        let Some(value) = iter.next() else {
            return Err(
                bad_usage(format!("Missing value for '{flag}'")).with_label(flag, "needs a value")
            );
        };
        match flag {
            "--explain" => return Ok(Command::Explain(value.clone())),
            "--dest" => dest = Some(PathBuf::from(value)),
            "--source" => options.sources.push(PathBuf::from(value)),
            "--include" => options.includes.push(PathBuf::from(value)),
            "--header" => options.header = read_text(flag, value)?,
            "--footer" => options.footer = read_text(flag, value)?,
            "--host" => options.hosts.push(value.clone()),
            "--boot" => options.boot_class = Some(value.clone()),
            "--pointer-size" => {
                options.layout = match value.as_str() {
                    "4" => DispatchLayout::for_pointer_size(4),
                    "8" => DispatchLayout::for_pointer_size(8),
                    _ => {
                        return Err(bad_usage(format!("Unsupported pointer size '{value}'"))
                            .with_label(value, "expected 4 or 8"))
                    }
                };
            }
            "--color" => {
                options.color = ColorMode::from_flag(value).ok_or_else(|| {
                    bad_usage(format!("Unknown colour mode '{value}'"))
                        .with_label(value, "expected auto, always or never")
                })?;
            }
            _ => {
                return Err(bad_usage(format!("Unknown option '{flag}'"))
                    .with_label(flag, "not recognized"))
            }
        }
    }

    let Some(dest) = dest else {
        return Err(bad_usage("Missing required option '--dest'"));
    };
    if options.sources.is_empty() {
        return Err(bad_usage("At least one '--source' directory is required"));
    }
    options.dest = dest;
    Ok(Command::Compile(options))
}

/// The `--color` value given anywhere in `args`, so diagnostics about the
/// rest of the command line can honour it.
pub fn color_mode(args: &[String]) -> ColorMode {
    args.windows(2)
        .find(|pair| pair[0] == "--color")
        .and_then(|pair| ColorMode::from_flag(&pair[1]))
        .unwrap_or_default()
}
