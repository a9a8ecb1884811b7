//! Assembler half of the bfCPU toolchain, and the instruction set and object format it shares
//! with the simulator.

pub mod chain;
pub mod emit;
pub mod error;
pub mod hex;
pub mod isa;
pub mod lexer;

pub use chain::{Instruction, InstructionChain};
pub use emit::{OutputNames, RomImage};
pub use error::{AsmError, HexError};
pub use isa::Opcode;

/// Default ROM capacity in nibble cells: 32K bytes, two cells each.
pub const ROM_SIZE_DEFAULT: usize = 32768 * 2;

/// Largest ROM whose byte addresses still fit the 16-bit Intel-hex address field.
pub const ROM_SIZE_MAX: usize = 0x10000 * 2;

/// Assembles bfCPU source text into a ROM image of `capacity` nibble cells.
///
/// Returns an error if the program does not fit, or if `capacity` is outside `1..=ROM_SIZE_MAX`.
pub fn assemble_source(code: &str, capacity: usize) -> Result<RomImage, AsmError> {
    let chain = InstructionChain::from_tokens(lexer::tokenize(code))?;
    RomImage::stamp(&chain, capacity)
}
