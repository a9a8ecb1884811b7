use log::debug;

use crate::{
    error::{AsmError, Result},
    isa::Opcode,
    lexer::Token,
};

/// One entry of the assembled program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub address: usize,

    /// `None` marks a comment or blank line, which is listed but takes no ROM cell.
    pub opcode: Option<Opcode>,
    pub source_text: String,
}

/// The program in arrival order, with every entry stamped with its ROM address.
#[derive(Clone, Debug, Default)]
pub struct InstructionChain {
    instructions: Vec<Instruction>,
    program_counter: usize,
}

impl InstructionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Result<Self> {
        let mut chain = Self::new();
        for token in tokens {
            chain.install(token.opcode, token.text)?;
        }
        Ok(chain)
    }

    /// Appends an entry at the current program counter. Only real instructions advance it.
    pub fn install(&mut self, opcode: Option<Opcode>, source_text: impl Into<String>) -> Result<()> {
        if self.instructions.try_reserve(1).is_err() {
            self.dispose();
            return Err(AsmError::CannotAllocate);
        }

        let instruction = Instruction {
            address: self.program_counter,
            opcode,
            source_text: source_text.into(),
        };
        debug!(
            "PC={:#04x} CODE={} SRC={}",
            instruction.address,
            instruction.opcode.map_or("-".to_string(), |op| format!("{:x}", op.nibble())),
            instruction.source_text,
        );

        if opcode.is_some() {
            self.program_counter += 1;
        }
        self.instructions.push(instruction);
        Ok(())
    }

    /// Releases every entry and rewinds the program counter. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.instructions = Vec::new();
        self.program_counter = 0;
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Address the next real instruction would be placed at.
    pub fn program_counter(&self) -> usize {
        self.program_counter
    }
}
