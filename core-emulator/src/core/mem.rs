use bfcpu_asm::{hex::{self, Packing}, HexError, Opcode};
use log::{debug, warn};

use crate::{Memory, Rom};

use super::Core;

impl Core {
    pub fn load_rom(&mut self, rom: &[u8]) {
        self.clear_rom();

        let capacity = self.rom.capacity();
        if rom.len() > capacity {
            warn!("ROM image of {} cells truncated to {capacity}", rom.len());
        }
        for (addr, cell) in rom.iter().take(capacity).enumerate() {
            self.rom.write_cell(addr, *cell);
        }
    }

    /// Loads an Intel-hex object file, two nibble cells per encoded byte.
    pub fn load_hex(&mut self, text: &str) -> Result<(), HexError> {
        let image = hex::decode(text, Packing::Nibble, self.config.rom_size)?;
        debug!(
            "loaded {} cells, highest written address {:?}",
            image.cells.len(),
            image.highest_address,
        );
        self.rom = Rom::new(image.cells);
        Ok(())
    }

    pub fn clear_rom(&mut self) {
        self.rom = Rom::new(vec![Opcode::Nop.nibble(); self.config.rom_size]);
    }

    /// Puts the machine back into its power-on state, leaving ROM untouched.
    pub fn reset(&mut self) {
        self.program_counter = 0;
        self.pointer = 0;
        self.ram.clear();
        self.step_count = 0;
        self.max_pointer = 0;
    }

    pub fn current_cell(&self) -> u8 {
        self.ram.read_cell(self.pointer)
    }
}
