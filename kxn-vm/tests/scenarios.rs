//! End-to-end coverage driving the real assemble -> load -> run pipeline,
//! rather than hand-built byte arrays (see `engine`'s own unit tests for
//! that half).

use kxn_vm::asm::Assembler;
use kxn_vm::engine::Engine;
use kxn_vm::error::{Fault, Status};
use kxn_vm::host_io::stub::StubHost;

fn run(source: &str) -> (Engine, StubHost) {
    let assembled = Assembler::assemble(source);
    assert!(
        assembled.is_ok(),
        "fixture source failed to assemble: {:?}",
        assembled.errors
    );
    let mut engine = Engine::new();
    engine.init(&assembled.bytes);
    let mut host = StubHost::new();
    engine.run(&mut host);
    (engine, host)
}

#[test]
fn test_minimal_halt() {
    let (engine, _) = run("HALT\n");
    assert_eq!(engine.status, Status::Halt);
    assert_eq!(engine.pc(), 1);
    assert_eq!(engine.sp(), 0xFFFF);
}

#[test]
fn test_add_two_numbers() {
    let (engine, _) = run("PUSH 5\nPUSH 7\nADD\nIO 0x00\n");
    assert_eq!(engine.status, Status::Halt);
}

#[test]
fn test_print_a() {
    let (engine, host) = run("PUSH 0x41\nIO 0x01\nHALT\n");
    assert_eq!(engine.status, Status::Halt);
    assert_eq!(host.printed, vec![0x41]);
}

#[test]
fn test_division_by_zero_faults_before_halt() {
    let (engine, _) = run("PUSH 5\nPUSH 0\nDIV\nHALT\n");
    assert_eq!(engine.status, Status::Fault(Fault::DivisionByZero));
}

#[test]
fn test_subroutine_round_trip() {
    let source = "\
CALL routine
STORE 0x0200
HALT
routine:
PUSH 42
RET
";
    let (engine, _) = run(source);
    assert_eq!(engine.status, Status::Halt);
    assert_eq!(engine.read_byte(0x0200), 42);
}

#[test]
fn test_loop_count_to_ten() {
    let source = "\
PUSH 0
STORE 0x0100
loop:
LOAD 0x0100
PUSH 10
LT
JZ end
LOAD 0x0100
PUSH 1
ADD
STORE 0x0100
JMP loop
end:
HALT
";
    let (engine, _) = run(source);
    assert_eq!(engine.status, Status::Halt);
    assert_eq!(engine.read_byte(0x0100), 10);
}

#[test]
fn test_label_round_trip_across_forward_and_backward_references() {
    let source = "\
JMP forward
back:
HALT
forward:
JMP back
";
    let assembled = Assembler::assemble(source);
    assert!(assembled.is_ok());
    // JMP forward -> address of `forward:` (byte 4: 3-byte JMP, then HALT).
    assert_eq!(&assembled.bytes[1..3], &4u16.to_le_bytes());
    // JMP back -> address of `back:` (byte 3, right after the first JMP).
    assert_eq!(&assembled.bytes[5..7], &3u16.to_le_bytes());
}

#[test]
fn test_stack_balance_after_push_pop_sequence() {
    let (engine, _) = run("PUSH 1\nPUSH 2\nPOP\nPOP\nHALT\n");
    assert_eq!(engine.status, Status::Halt);
    assert_eq!(engine.sp(), 0xFFFF);
}
