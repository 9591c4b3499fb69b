//! The two-pass assembler: mnemonic source text to image bytes.
//!
//! Pass one walks the source line by line, emitting bytes and recording
//! label definitions as they're seen; label references in a 2-byte operand
//! slot emit a placeholder and a patch request instead of stalling on a
//! forward reference. Pass two resolves every patch against the finished
//! label table.

use crate::opcodes::{match_mnemonic, Opcode, OperandKind};
use colored::*;
use std::collections::HashMap;
use std::fmt;

/// One diagnostic, carrying the 1-based line/column it was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl AsmError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> AsmError {
        AsmError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for AsmError {}

/// Renders an error the way `kxn-asm` prints it: source context in white,
/// the row:column prefix in cyan, the message in red.
pub fn render_error(source: &str, error: &AsmError) -> String {
    let target = error.line.saturating_sub(1);
    let mut out = String::new();
    for (index, text) in source.lines().enumerate() {
        if index == target {
            out.push_str(&format!("{:>4}: ", index + 1).cyan().to_string());
            out.push_str(text);
            out.push('\n');
            let indent = " ".repeat(error.column + 5);
            out.push_str(&indent);
            out.push_str(&format!("^ {}", error.message).red().to_string());
            out.push('\n');
        }
    }
    out
}

struct PatchRequest {
    label: String,
    position: usize,
    line: usize,
    column: usize,
}

/// A single assembly run. Scoped to one invocation — the label table and
/// patch list own no state outside this value, per the "no global mutable
/// assembler state" design constraint.
pub struct Assembler {
    labels: HashMap<String, u16>,
    patches: Vec<PatchRequest>,
    bytes: Vec<u8>,
    warnings: Vec<AsmError>,
}

/// The result of assembling a source file: the emitted bytes (always
/// produced, even on unresolved labels — best effort) plus any errors. A
/// non-empty `errors` means the caller should exit non-zero.
pub struct Assembled {
    pub bytes: Vec<u8>,
    pub warnings: Vec<AsmError>,
    pub errors: Vec<AsmError>,
}

impl Assembled {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler {
            labels: HashMap::new(),
            patches: Vec::new(),
            bytes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn assemble(source: &str) -> Assembled {
        let mut assembler = Assembler::new();
        assembler.pass_one(source);
        let errors = assembler.pass_two();
        Assembled {
            bytes: assembler.bytes,
            warnings: assembler.warnings,
            errors,
        }
    }

    fn pass_one(&mut self, source: &str) {
        for (index, raw_line) in source.lines().enumerate() {
            let line_number = index + 1;
            self.assemble_line(raw_line, line_number);
        }
    }

    fn assemble_line(&mut self, raw_line: &str, line_number: usize) {
        let trimmed = raw_line.trim_start();
        let leading_ws = raw_line.len() - trimmed.len();
        let without_comment = strip_comment(trimmed);
        let without_comment = without_comment.trim_end();
        if without_comment.is_empty() {
            return;
        }

        let mut rest = without_comment;
        let mut column = leading_ws + 1;

        if let Some(colon) = rest.find(':') {
            let (label, after_colon) = rest.split_at(colon);
            let label = label.trim();
            if is_valid_label_name(label) {
                self.define_label(label.to_string(), line_number, column);
                let remainder = &after_colon[1..];
                let trimmed = remainder.trim_start();
                column = leading_ws + colon + 2 + (remainder.len() - trimmed.len());
                rest = trimmed;
                if rest.is_empty() {
                    return;
                }
            }
        }

        self.assemble_instruction(rest, line_number, column);
    }

    fn define_label(&mut self, name: String, line: usize, column: usize) {
        let address = self.bytes.len() as u16;
        if self.labels.insert(name.clone(), address).is_some() {
            self.warnings.push(AsmError::new(
                format!("label `{name}` redefined, using the later definition"),
                line,
                column,
            ));
        }
    }

    fn assemble_instruction(&mut self, text: &str, line: usize, column: usize) {
        let mut words = text.split_whitespace();
        let mnemonic = match words.next() {
            Some(word) => word,
            None => return,
        };
        let operand = words.next();
        let trailing = words.next();

        let opcode = match match_mnemonic(mnemonic) {
            Some(opcode) => opcode,
            None => {
                self.warnings.push(AsmError::new(
                    format!("unknown mnemonic `{mnemonic}`, skipped"),
                    line,
                    column,
                ));
                return;
            }
        };

        if trailing.is_some() {
            self.warnings.push(AsmError::new(
                format!("unexpected trailing tokens after `{mnemonic} {}`", operand.unwrap_or("")),
                line,
                column,
            ));
        }

        self.bytes.push(opcode as u8);

        match opcode.operand_kind() {
            OperandKind::None => {
                if operand.is_some() {
                    self.warnings.push(AsmError::new(
                        format!("`{mnemonic}` takes no operand, ignoring `{}`", operand.unwrap()),
                        line,
                        column,
                    ));
                }
            }
            OperandKind::Imm8 => match operand {
                Some(token) => match parse_u8(token) {
                    Ok(value) => self.bytes.push(value),
                    Err(message) => {
                        self.warnings.push(AsmError::new(message, line, column));
                        self.bytes.push(0);
                    }
                },
                None => {
                    self.warnings.push(AsmError::new(
                        format!("`{mnemonic}` requires an immediate operand"),
                        line,
                        column,
                    ));
                    self.bytes.push(0);
                }
            },
            OperandKind::Addr16 => match operand {
                Some(token) if is_label_reference(token) => {
                    let position = self.bytes.len();
                    self.bytes.extend_from_slice(&[0, 0]);
                    self.patches.push(PatchRequest {
                        label: token.to_string(),
                        position,
                        line,
                        column,
                    });
                }
                Some(token) => match parse_u16(token) {
                    Ok(value) => self.bytes.extend_from_slice(&value.to_le_bytes()),
                    Err(message) => {
                        self.warnings.push(AsmError::new(message, line, column));
                        self.bytes.extend_from_slice(&[0, 0]);
                    }
                },
                None => {
                    self.warnings.push(AsmError::new(
                        format!("`{mnemonic}` requires an address operand"),
                        line,
                        column,
                    ));
                    self.bytes.extend_from_slice(&[0, 0]);
                }
            },
        }
    }

    fn pass_two(&mut self) -> Vec<AsmError> {
        let mut errors = Vec::new();
        for patch in &self.patches {
            match self.labels.get(&patch.label) {
                Some(address) => {
                    let [lo, hi] = address.to_le_bytes();
                    self.bytes[patch.position] = lo;
                    self.bytes[patch.position + 1] = hi;
                }
                None => errors.push(AsmError::new(
                    format!("unresolved label `{}`", patch.label),
                    patch.line,
                    patch.column,
                )),
            }
        }
        errors
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(index) => &line[..index],
        None => line,
    }
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_label_reference(token: &str) -> bool {
    token
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
}

fn parse_number(token: &str) -> Result<u32, String> {
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|_| format!("invalid hex literal `{token}`"))
    } else {
        token
            .parse::<u32>()
            .map_err(|_| format!("invalid numeric literal `{token}`"))
    }
}

fn parse_u8(token: &str) -> Result<u8, String> {
    let value = parse_number(token)?;
    u8::try_from(value).map_err(|_| format!("`{token}` does not fit in a single byte"))
}

fn parse_u16(token: &str) -> Result<u16, String> {
    let value = parse_number(token)?;
    u16::try_from(value).map_err(|_| format!("`{token}` does not fit in an address"))
}

#[cfg(test)]
mod test {
    use super::*;
    use Opcode::*;

    macro_rules! assert_program {
        ($text:expr, [$( $bytes:expr ),* $(,)?]) => {
            let assembled = Assembler::assemble($text);
            assert!(
                assembled.errors.is_empty(),
                "unexpected errors: {:?}",
                assembled.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>()
            );
            assert_eq!(vec![$( $bytes as u8, )*], assembled.bytes);
        };
    }

    #[test]
    fn test_no_operand_instruction() {
        assert_program!("halt", [Halt]);
    }

    #[test]
    fn test_immediate_instruction() {
        assert_program!("push 0x42", [Push, 0x42]);
        assert_program!("push 66", [Push, 0x42]);
    }

    #[test]
    fn test_case_insensitive_mnemonics() {
        assert_program!("PuSh 5", [Push, 5]);
    }

    #[test]
    fn test_sys_aliases_io() {
        assert_program!("sys 0", [Io, 0x00]);
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        assert_program!(
            "
            ; a comment
            nop

            halt ; trailing comment
            ",
            [Nop, Halt]
        );
    }

    #[test]
    fn test_multiple_instructions() {
        assert_program!(
            "push 5
             push 7
             add",
            [Push, 5, Push, 7, Add]
        );
    }

    #[test]
    fn test_forward_label_reference_resolves() {
        let assembled = Assembler::assemble(
            "jmp target
             nop
             target: halt",
        );
        assert!(assembled.errors.is_empty());
        assert_eq!(
            assembled.bytes,
            vec![Jmp as u8, 0x04, 0x00, Nop as u8, Halt as u8]
        );
    }

    #[test]
    fn test_backward_label_reference_resolves() {
        let assembled = Assembler::assemble(
            "start: nop
             jmp start",
        );
        assert!(assembled.errors.is_empty());
        assert_eq!(
            assembled.bytes,
            vec![Nop as u8, Jmp as u8, 0x00, 0x00]
        );
    }

    #[test]
    fn test_label_and_instruction_share_a_line() {
        let assembled = Assembler::assemble("loop: push 1");
        assert!(assembled.errors.is_empty());
        assert_eq!(assembled.bytes, vec![Push as u8, 1]);
    }

    #[test]
    fn test_underscore_prefixed_label_resolves() {
        let assembled = Assembler::assemble(
            "jmp _loop
             _loop: halt",
        );
        assert!(assembled.errors.is_empty());
        assert_eq!(
            assembled.bytes,
            vec![Jmp as u8, 0x03, 0x00, Halt as u8]
        );
    }

    #[test]
    fn test_unresolved_label_is_reported_but_still_emits_bytes() {
        let assembled = Assembler::assemble("jmp nowhere");
        assert_eq!(assembled.bytes, vec![Jmp as u8, 0x00, 0x00]);
        assert_eq!(assembled.errors.len(), 1);
        assert!(assembled.errors[0].message.contains("nowhere"));
    }

    #[test]
    fn test_unknown_mnemonic_is_a_warning_not_an_error() {
        let assembled = Assembler::assemble("frobnicate");
        assert!(assembled.errors.is_empty());
        assert_eq!(assembled.warnings.len(), 1);
        assert!(assembled.bytes.is_empty());
    }

    #[test]
    fn test_loop_count_to_ten_assembles() {
        let source = "
            push 0
            store 0x0100
        loop:
            load 0x0100
            push 10
            lt
            jz done
            load 0x0100
            push 1
            add
            store 0x0100
            jmp loop
        done:
            halt
        ";
        let assembled = Assembler::assemble(source);
        assert!(assembled.errors.is_empty());
        assert!(!assembled.bytes.is_empty());
    }
}
