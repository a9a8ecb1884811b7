use std::io;

use bfcpu_asm::Opcode;
use thiserror::Error;

/// Fatal conditions that stop the execution engine
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("illegal code PC={pc:#04x} code={code:#x}")]
    IllegalOpcode { pc: usize, code: u8 },

    #[error("unbalanced {opcode} at PC={pc:#04x}: no matching bracket within {capacity} cells")]
    UnbalancedBracket { pc: usize, opcode: Opcode, capacity: usize },

    #[error("trace output failed: {0}")]
    Io(#[from] io::Error),
}
