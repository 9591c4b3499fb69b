use clap::Parser;
use colored::*;
use kxn_vm::asm::{render_error, Assembler};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Assembles KXN mnemonic source into a raw image.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the `.asm` source file.
    input: PathBuf,
    /// Path the assembled image is written to.
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(error) => {
            eprintln!(
                "{} could not read {}: {error}",
                "error:".red().bold(),
                cli.input.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let assembled = Assembler::assemble(&source);

    for warning in &assembled.warnings {
        eprint!("{}", render_error(&source, warning));
    }

    if let Err(error) = fs::write(&cli.output, &assembled.bytes) {
        eprintln!(
            "{} could not write {}: {error}",
            "error:".red().bold(),
            cli.output.display()
        );
        return ExitCode::FAILURE;
    }

    if assembled.is_ok() {
        ExitCode::SUCCESS
    } else {
        for error in &assembled.errors {
            eprint!("{}", render_error(&source, error));
        }
        ExitCode::FAILURE
    }
}
