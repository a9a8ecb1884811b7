//! Intel-hex records, as used for bfCPU object files.
//!
//! ROM cells are nibble-wide, so the object format packs two cells into every encoded byte:
//! the odd cell goes into the high nibble, the even cell into the low nibble. The external
//! SRAM loader reads the very same files but keeps every encoded byte as one byte-wide cell,
//! so the decoder is parameterised over [`Packing`].

use std::fmt;

use log::debug;

use crate::{error::HexError, isa::Opcode};

/// Number of encoded bytes in every data record the encoder produces.
pub const RECORD_DATA_LEN: usize = 16;

/// Number of nibble cells covered by one data record.
pub const RECORD_CELLS: usize = RECORD_DATA_LEN * 2;

const TYPE_DATA: u8 = 0x00;
const TYPE_END_OF_FILE: u8 = 0x01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packing {
    /// Two 4-bit cells per encoded byte (simulator and assembler).
    Nibble,

    /// One 8-bit cell per encoded byte (SRAM loader).
    Byte,
}

impl Packing {
    /// Content of a cell that no record wrote to. Always decodes as NOP.
    pub fn blank_cell(self) -> u8 {
        let nop = Opcode::Nop.nibble();
        match self {
            Packing::Nibble => nop,
            Packing::Byte => (nop << 4) | nop,
        }
    }
}

/// A single Intel-hex record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HexRecord {
    Data { address: u16, data: Vec<u8> },
    EndOfFile,
}

impl HexRecord {
    pub fn checksum(&self) -> u8 {
        match self {
            HexRecord::Data { address, data } => {
                let [hi, lo] = address.to_be_bytes();
                let sum = data.iter().fold(
                    (data.len() as u8).wrapping_add(hi).wrapping_add(lo),
                    |acc, byte| acc.wrapping_add(*byte),
                );
                0u8.wrapping_sub(sum)
            }
            HexRecord::EndOfFile => 0xFF,
        }
    }
}

impl fmt::Display for HexRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexRecord::Data { address, data } => {
                write!(f, ":{:02X}{:04X}{:02X}", data.len(), address, TYPE_DATA)?;
                for byte in data {
                    write!(f, "{byte:02X}")?;
                }
                write!(f, "{:02X}", self.checksum())
            }
            HexRecord::EndOfFile => write!(f, ":00000001FF"),
        }
    }
}

/// Packs a nibble ROM image into data records followed by the end-of-file record.
///
/// Records cover 32 cells each and stop once a record would start past `highest`. The last
/// record is cut short at the end of `cells`, so decoding into the same capacity never
/// overflows; an odd trailing cell is paired with a NOP. With `highest == None` only the
/// end-of-file record is produced.
pub fn encode_nibbles(cells: &[u8], highest: Option<usize>) -> Result<Vec<HexRecord>, HexError> {
    let cell = |index: usize| cells.get(index).copied().unwrap_or(Packing::Nibble.blank_cell()) & 0x0F;
    let byte_len = cells.len().div_ceil(2);

    let mut records = vec![];
    if let Some(highest) = highest {
        let mut start = 0;
        while start <= highest && start < cells.len() {
            let byte_start = start / 2;
            let address = u16::try_from(byte_start)
                .map_err(|_| HexError::AddressOutOfRange { address: byte_start })?;
            let data = (byte_start..byte_len.min(byte_start + RECORD_DATA_LEN))
                .map(|byte| (cell(byte * 2 + 1) << 4) | cell(byte * 2))
                .collect();
            records.push(HexRecord::Data { address, data });
            start += RECORD_CELLS;
        }
    }
    records.push(HexRecord::EndOfFile);
    Ok(records)
}

/// Result of decoding an object file into a cell array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexImage {
    pub cells: Vec<u8>,

    /// Highest cell index any data record wrote, if there was any data at all.
    pub highest_address: Option<usize>,
}

/// Decodes Intel-hex text into `capacity` cells laid out according to `packing`.
///
/// Decoding ends at the first end-of-file record, or at the end of the text. Blank lines
/// between records are skipped, and both LF and CRLF line endings are accepted.
pub fn decode(text: &str, packing: Packing, capacity: usize) -> Result<HexImage, HexError> {
    let mut cells = vec![packing.blank_cell(); capacity];
    let mut highest_address = None;
    let mut seen_record = false;

    for (index, raw) in text.split('\n').enumerate() {
        let line = index + 1;
        let record = raw.trim_end_matches('\r');
        if record.is_empty() {
            continue;
        }
        seen_record = true;

        let mut fields = RecordFields::new(record, line)?;
        let byte_count = fields.byte()?;
        let address = u16::from_be_bytes([fields.byte()?, fields.byte()?]);
        match fields.byte()? {
            TYPE_END_OF_FILE => {
                debug!("end of file record on line {line}");
                break;
            }
            TYPE_DATA => {}
            _ => return Err(HexError::Format { line, reason: "unsupported record type" }),
        }

        let [hi, lo] = address.to_be_bytes();
        let mut sum = byte_count.wrapping_add(hi).wrapping_add(lo);
        for offset in 0..byte_count as usize {
            let data = fields.byte()?;
            let byte_address = address as usize + offset;

            let highest = match packing {
                Packing::Nibble => {
                    let (even, odd) = (byte_address * 2, byte_address * 2 + 1);
                    // An image with an odd number of cells pads its last byte with a NOP
                    let padded = odd == capacity && data >> 4 == packing.blank_cell();
                    if even >= capacity || (odd >= capacity && !padded) {
                        return Err(HexError::Overflow { line, address: byte_address, capacity });
                    }
                    cells[even] = data & 0x0F;
                    if padded {
                        even
                    } else {
                        cells[odd] = data >> 4;
                        odd
                    }
                }
                Packing::Byte => {
                    if byte_address >= capacity {
                        return Err(HexError::Overflow { line, address: byte_address, capacity });
                    }
                    cells[byte_address] = data;
                    byte_address
                }
            };
            highest_address = highest_address.max(Some(highest));
            sum = sum.wrapping_add(data);
        }

        let recorded = fields.byte()?;
        let computed = 0u8.wrapping_sub(sum);
        if computed != recorded {
            return Err(HexError::ChecksumMismatch { line, computed, recorded });
        }
        fields.finish()?;
    }

    if !seen_record {
        return Err(HexError::Format { line: 1, reason: "no records" });
    }

    Ok(HexImage { cells, highest_address })
}

/// Cursor over the hex digits of one record, after its start code.
struct RecordFields<'a> {
    digits: &'a [u8],
    line: usize,
}

impl<'a> RecordFields<'a> {
    fn new(record: &'a str, line: usize) -> Result<Self, HexError> {
        match record.strip_prefix(':') {
            Some(rest) => Ok(Self { digits: rest.as_bytes(), line }),
            None => Err(HexError::Format { line, reason: "missing start code" }),
        }
    }

    fn byte(&mut self) -> Result<u8, HexError> {
        let line = self.line;
        let digits = self.digits;
        let (pair, rest) = digits
            .split_first_chunk::<2>()
            .ok_or(HexError::Format { line, reason: "truncated record" })?;

        let nibble = |digit: u8| {
            (digit as char)
                .to_digit(16)
                .map(|value| value as u8)
                .ok_or(HexError::Format { line, reason: "non-hex digit" })
        };
        let byte = (nibble(pair[0])? << 4) | nibble(pair[1])?;

        self.digits = rest;
        Ok(byte)
    }

    fn finish(self) -> Result<(), HexError> {
        if self.digits.is_empty() {
            Ok(())
        } else {
            Err(HexError::Format { line: self.line, reason: "trailing characters after checksum" })
        }
    }
}
