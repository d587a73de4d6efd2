//! Shoal compiler CLI.

use shoal_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use shoal_diagnostic::{Diagnostic, ErrorCode, ErrorDocs};
use shoalc::cli::{color_mode, parse_args, Command, USAGE};

fn main() {
    shoalc::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        println!("{USAGE}");
        return;
    }

    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(diag) => fail(&diag, color_mode(&args)),
    };

    match command {
        Command::Help => println!("{USAGE}"),
        Command::Explain(code) => explain_error(&code),
        Command::Compile(options) => {
            if let Err(diag) = shoalc::compile(&options) {
                fail(&diag, options.color);
            }
        }
    }
}

fn fail(diag: &Diagnostic, mode: ColorMode) -> ! {
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let mut emitter = TerminalEmitter::<std::io::Stderr>::stderr(mode, is_tty);
    emitter.emit(diag);
    emitter.emit_summary(1, 0);
    emitter.flush();
    std::process::exit(1);
}

fn explain_error(code_str: &str) {
    let Ok(code) = code_str.parse::<ErrorCode>() else {
        eprintln!("Unknown error code: {code_str}");
        eprintln!();
        eprintln!("Codes have the format EXXXX where X is a digit, e.g. E2001.");
        std::process::exit(1);
    };

    if let Some(doc) = ErrorDocs::get(code) {
        println!("{doc}");
    } else {
        eprintln!("No documentation available for {code}");
        std::process::exit(1);
    }
}
