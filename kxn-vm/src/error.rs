use std::fmt;

/// The fault taxonomy the execution engine can land in. `Halt` is a clean
/// stop, not a failure; everything else short-circuits the run loop at the
/// next instruction boundary (see `engine::Engine::step`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Pushed with the stack pointer already at `0x0000`.
    StackOverflow,
    /// Popped with the stack pointer already at `0xFFFF` (empty).
    StackUnderflow,
    /// Fetched a byte with no entry in the opcode table.
    InvalidOpcode,
    /// `DIV`/`MOD` with a zero divisor.
    DivisionByZero,
    /// A memory access (including `PC`) landed outside `0x0000..=0xFFFF`,
    /// or a 2-byte access straddled the top of the image.
    InvalidAddress,
    /// The host-I/O dispatcher reported failure for a non-exit operation.
    HostIo,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Fault::StackOverflow => "stack overflow",
            Fault::StackUnderflow => "stack underflow",
            Fault::InvalidOpcode => "invalid opcode",
            Fault::DivisionByZero => "division by zero",
            Fault::InvalidAddress => "invalid address",
            Fault::HostIo => "host I/O error",
        };
        write!(f, "{message}")
    }
}

impl std::error::Error for Fault {}

/// The engine's error slot. `Ok` and `Halt` both mean "keep the bytes
/// produced, nothing went wrong"; `Halt` additionally means the run loop
/// exited on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Halt,
    /// The host event pump asked for shutdown (e.g. a closed window). Exits
    /// cleanly like `Halt` but is reported distinctly in diagnostics.
    HostShutdown,
    Fault(Fault),
}

impl Status {
    /// The run loop stops for any status other than `Ok`.
    pub fn stops_the_loop(self) -> bool {
        !matches!(self, Status::Ok)
    }

    /// The process exit code a CLI driving the engine should use.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Halt => 0,
            Status::Ok => 0,
            Status::HostShutdown => 0,
            Status::Fault(_) => 1,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Halt => write!(f, "halt"),
            Status::HostShutdown => write!(f, "host shutdown"),
            Status::Fault(fault) => write!(f, "{fault}"),
        }
    }
}
