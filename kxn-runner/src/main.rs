mod headless_host;
mod sdl_host;

use clap::Parser;
use colored::*;
use headless_host::HeadlessHost;
use kxn_vm::engine::Engine;
use kxn_vm::error::Status;
use sdl_host::{SdlHost, SdlSystem};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Runs a KXN image, either in a scaled SDL2 window or headless.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the assembled image.
    image: PathBuf,

    /// Run without opening a window; PRINT_CHAR still goes to stdout.
    #[arg(long)]
    headless: bool,

    /// Window scale over the 320x240 logical framebuffer.
    #[arg(long, default_value_t = 2)]
    scale: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let image = match fs::read(&cli.image) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!(
                "{} could not read {}: {error}",
                "error:".red().bold(),
                cli.image.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let mut engine = Engine::new();
    engine.init(&image);

    let status = if cli.headless {
        let mut host = HeadlessHost::new();
        engine.run(&mut host)
    } else {
        let system = match SdlSystem::new(cli.scale) {
            Ok(system) => system,
            Err(message) => {
                eprintln!(
                    "{} failed to start the display: {message}",
                    "error:".red().bold()
                );
                return ExitCode::FAILURE;
            }
        };
        let mut host = match SdlHost::new(&system, cli.scale) {
            Ok(host) => host,
            Err(message) => {
                eprintln!(
                    "{} failed to start the display: {message}",
                    "error:".red().bold()
                );
                return ExitCode::FAILURE;
            }
        };
        engine.run(&mut host)
    };

    report(status, &engine)
}

fn report(status: Status, engine: &Engine) -> ExitCode {
    match status {
        Status::Halt | Status::Ok => {
            eprintln!("{} {status} at pc={:#06x}", "halt:".green().bold(), engine.pc());
            ExitCode::SUCCESS
        }
        Status::HostShutdown => {
            eprintln!("{} {status}", "halt:".green().bold());
            ExitCode::SUCCESS
        }
        Status::Fault(fault) => {
            eprintln!(
                "{} {fault} at pc={:#06x} sp={:#06x}",
                "fault:".red().bold(),
                engine.pc(),
                engine.sp()
            );
            ExitCode::FAILURE
        }
    }
}
