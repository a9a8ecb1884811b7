//! The nine-instruction bfCPU instruction set, plus the NOP filler used for unassigned ROM.

use std::fmt;

/// A 4-bit bfCPU opcode, as stored in one nibble-wide ROM cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    PInc = 0x0,
    PDec = 0x1,
    Inc = 0x2,
    Dec = 0x3,
    Out = 0x4,
    In = 0x5,
    Begin = 0x6,
    End = 0x7,
    Reset = 0x8,

    /// Content of every ROM cell that no instruction was stamped into.
    Nop = 0xF,
}

impl Opcode {
    pub const ALL: [Opcode; 10] = [
        Opcode::PInc, Opcode::PDec, Opcode::Inc, Opcode::Dec, Opcode::Out,
        Opcode::In, Opcode::Begin, Opcode::End, Opcode::Reset, Opcode::Nop,
    ];

    /// Decodes a ROM cell. Only the low nibble is considered.
    pub fn from_nibble(cell: u8) -> Option<Opcode> {
        match cell & 0x0F {
            0x0 => Some(Opcode::PInc),
            0x1 => Some(Opcode::PDec),
            0x2 => Some(Opcode::Inc),
            0x3 => Some(Opcode::Dec),
            0x4 => Some(Opcode::Out),
            0x5 => Some(Opcode::In),
            0x6 => Some(Opcode::Begin),
            0x7 => Some(Opcode::End),
            0x8 => Some(Opcode::Reset),
            0xF => Some(Opcode::Nop),
            _ => None,
        }
    }

    pub fn nibble(self) -> u8 {
        self as u8
    }

    /// Maps a source character onto its opcode. NOP has no source form.
    pub fn from_source_char(c: char) -> Option<Opcode> {
        match c {
            '>' => Some(Opcode::PInc),
            '<' => Some(Opcode::PDec),
            '+' => Some(Opcode::Inc),
            '-' => Some(Opcode::Dec),
            '.' => Some(Opcode::Out),
            ',' => Some(Opcode::In),
            '[' => Some(Opcode::Begin),
            ']' => Some(Opcode::End),
            '!' => Some(Opcode::Reset),
            _ => None,
        }
    }

    /// Five-column mnemonic used in simulator traces.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::PInc => "P++  ",
            Opcode::PDec => "P--  ",
            Opcode::Inc => "INC  ",
            Opcode::Dec => "DEC  ",
            Opcode::Out => "OUT  ",
            Opcode::In => "IN   ",
            Opcode::Begin => "BEGIN",
            Opcode::End => "END  ",
            Opcode::Reset => "RESET",
            Opcode::Nop => "NOP  ",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic().trim_end())
    }
}
