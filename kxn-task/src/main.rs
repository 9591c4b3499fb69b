use clap::{Parser, Subcommand};
use colored::*;
use kxn_vm::asm::Assembler;
use kxn_vm::host_io::io_op_name;
use kxn_vm::opcodes::{Opcode, OperandKind};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a raw image back to mnemonic text, one instruction per line.
    Disassemble(DisassembleArgs),
    /// Assemble one of the bundled example programs to a raw image.
    Fixture(FixtureArgs),
}

#[derive(Parser)]
struct DisassembleArgs {
    /// Path to the raw binary image.
    image: PathBuf,
}

#[derive(Parser)]
struct FixtureArgs {
    /// Name of the bundled program: add, print-a, div-by-zero, subroutine,
    /// loop-to-ten.
    name: String,
    /// Path the assembled image is written to.
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Disassemble(args) => disassemble(&args.image),
        Commands::Fixture(args) => fixture(&args.name, &args.output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{} {message}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn disassemble(path: &PathBuf) -> Result<(), String> {
    let image = fs::read(path).map_err(|e| format!("could not read {}: {e}", path.display()))?;

    let mut pc = 0usize;
    while pc < image.len() {
        let byte = image[pc];
        match Opcode::decode(byte) {
            Some(opcode) => {
                let line = match opcode.operand_kind() {
                    OperandKind::None => format!("{:#06x}: {}", pc, opcode.mnemonic()),
                    OperandKind::Imm8 => {
                        if pc + 1 < image.len() {
                            let operand = image[pc + 1];
                            if opcode == Opcode::Io {
                                format!(
                                    "{:#06x}: {} {:#04x} ; {}",
                                    pc,
                                    opcode.mnemonic(),
                                    operand,
                                    io_op_name(operand)
                                )
                            } else {
                                format!("{:#06x}: {} {:#04x}", pc, opcode.mnemonic(), operand)
                            }
                        } else {
                            format!("{:#06x}: {} <truncated>", pc, opcode.mnemonic())
                        }
                    }
                    OperandKind::Addr16 => {
                        if pc + 2 < image.len() {
                            let addr = u16::from_le_bytes([image[pc + 1], image[pc + 2]]);
                            format!("{:#06x}: {} {:#06x}", pc, opcode.mnemonic(), addr)
                        } else {
                            format!("{:#06x}: {} <truncated>", pc, opcode.mnemonic())
                        }
                    }
                };
                println!("{line}");
                pc += opcode.instruction_len() as usize;
            }
            None => {
                println!("{:#06x}: .byte {byte:#04x}", pc);
                pc += 1;
            }
        }
    }

    Ok(())
}

fn fixture(name: &str, output: &PathBuf) -> Result<(), String> {
    let source = fixture_source(name).ok_or_else(|| format!("unknown fixture `{name}`"))?;

    let assembled = Assembler::assemble(source);
    if !assembled.is_ok() {
        let messages: Vec<String> = assembled
            .errors
            .iter()
            .map(|e| format!("{}:{}: {}", e.line, e.column, e.message))
            .collect();
        return Err(format!(
            "fixture `{name}` failed to assemble: {}",
            messages.join("; ")
        ));
    }

    fs::write(output, &assembled.bytes)
        .map_err(|e| format!("could not write {}: {e}", output.display()))
}

/// Source text for the bundled example programs, one per literal end-to-end
/// scenario this toolchain is tested against.
fn fixture_source(name: &str) -> Option<&'static str> {
    Some(match name {
        "add" => "PUSH 5\nPUSH 7\nADD\nIO 0x01\nIO 0x00\n",
        "print-a" => "PUSH 0x41\nIO 0x01\nHALT\n",
        "div-by-zero" => "PUSH 5\nPUSH 0\nDIV\nHALT\n",
        "subroutine" => concat!(
            "CALL routine\n",
            "STORE 0x0200\n",
            "HALT\n",
            "routine:\n",
            "PUSH 42\n",
            "RET\n",
        ),
        "loop-to-ten" => concat!(
            "PUSH 0\n",
            "STORE 0x0100\n",
            "loop:\n",
            "LOAD 0x0100\n",
            "PUSH 10\n",
            "LT\n",
            "JZ end\n",
            "LOAD 0x0100\n",
            "PUSH 1\n",
            "ADD\n",
            "STORE 0x0100\n",
            "JMP loop\n",
            "end:\n",
            "HALT\n",
        ),
        _ => return None,
    })
}
