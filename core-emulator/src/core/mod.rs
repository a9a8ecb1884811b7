use bfcpu_asm::{assemble_source, AsmError, ROM_SIZE_DEFAULT};

use crate::{Ram, Rom};

/// Default RAM capacity in bytes.
pub const RAM_SIZE_DEFAULT: usize = 32768;

/// How `IN` and `OUT` talk to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IoMode {
    /// Hex numbers in, annotated hex/decimal/character lines out.
    #[default]
    Binary,

    /// Raw characters in and out.
    Ascii,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub rom_size: usize,
    pub ram_size: usize,
    pub io_mode: IoMode,

    /// Stop after this many executed instructions.
    pub step_limit: Option<u64>,

    /// Stop when sequential execution runs off the top of ROM and wraps back to zero.
    pub halt_on_wrap: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rom_size: ROM_SIZE_DEFAULT,
            ram_size: RAM_SIZE_DEFAULT,
            io_mode: IoMode::Binary,
            step_limit: None,
            halt_on_wrap: false,
        }
    }
}

#[derive(Clone)]
pub struct Core {
    pub program_counter: usize,
    pub pointer: usize,
    pub rom: Rom,
    pub ram: Ram,

    /// Trace-only instruction counter, cleared by RESET.
    pub step_count: u64,

    /// Highest data pointer reached since the last RESET.
    pub max_pointer: usize,

    pub config: SimConfig,
}

impl Core {
    /// # Panics
    ///
    /// Panics if `config.rom_size` or `config.ram_size` is zero. The command line rejects both
    /// before a core is ever built.
    pub fn new(config: SimConfig) -> Self {
        Self {
            program_counter: 0,
            pointer: 0,
            rom: Rom::new(vec![bfcpu_asm::Opcode::Nop.nibble(); config.rom_size]),
            ram: Ram::new(config.ram_size),
            step_count: 0,
            max_pointer: 0,
            config,
        }
    }

    pub fn new_with_rom(rom: &[u8], config: SimConfig) -> Self {
        let mut this = Self::new(config);
        this.load_rom(rom);
        this
    }

    pub fn new_with_source(code: &str, config: SimConfig) -> Result<Self, AsmError> {
        let rom = assemble_source(code, config.rom_size)?;
        Ok(Self::new_with_rom(&rom.cells, config))
    }
}

mod exec;
pub use exec::*;

mod mem;
