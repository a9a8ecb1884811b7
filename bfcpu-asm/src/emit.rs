//! Turns a finished instruction chain into the three assembler artifacts: an Intel-hex object,
//! a memory-initialisation text file for HDL simulation, and an indented listing.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    chain::InstructionChain,
    error::{AsmError, Result},
    hex::{self, Packing},
    isa::Opcode,
    ROM_SIZE_MAX,
};

/// Resolved paths of the three artifacts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNames {
    pub object: PathBuf,
    pub memvalue: PathBuf,
    pub listing: PathBuf,
}

impl OutputNames {
    /// Explicit names win; otherwise each name is the input with its extension replaced.
    ///
    /// Fails if any two of input, object, memvalue and listing are the same path.
    pub fn resolve(
        input: &Path,
        object: Option<PathBuf>,
        memvalue: Option<PathBuf>,
        listing: Option<PathBuf>,
    ) -> Result<Self> {
        let names = Self {
            object: object.unwrap_or_else(|| input.with_extension("hex")),
            memvalue: memvalue.unwrap_or_else(|| input.with_extension("v")),
            listing: listing.unwrap_or_else(|| input.with_extension("lis")),
        };
        debug!("fname_obj={:?} fname_ver={:?} fname_lis={:?}", names.object, names.memvalue, names.listing);

        let all = [
            ("input", input),
            ("object", names.object.as_path()),
            ("memvalue", names.memvalue.as_path()),
            ("listing", names.listing.as_path()),
        ];
        for (i, (first, a)) in all.iter().enumerate() {
            for (second, b) in &all[i + 1..] {
                if a == b {
                    return Err(AsmError::NameConflict { first: *first, second: *second, path: a.to_path_buf() });
                }
            }
        }

        Ok(names)
    }
}

/// Nibble-wide ROM contents produced from a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RomImage {
    pub cells: Vec<u8>,

    /// Highest address any instruction was stamped at, zero for an empty program.
    pub addr_max: usize,
}

impl RomImage {
    /// Clears `capacity` cells to NOP and stamps every real instruction at its address.
    pub fn stamp(chain: &InstructionChain, capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > ROM_SIZE_MAX {
            return Err(AsmError::CapacityOutOfRange { capacity, max: ROM_SIZE_MAX });
        }
        let mut cells = vec![Packing::Nibble.blank_cell(); capacity];
        let mut addr_max = 0;

        for instruction in chain.iter() {
            if instruction.address >= capacity {
                return Err(AsmError::RomOverflow { address: instruction.address, capacity });
            }
            if let Some(opcode) = instruction.opcode {
                cells[instruction.address] = opcode.nibble();
                addr_max = addr_max.max(instruction.address);
            }
        }

        Ok(Self { cells, addr_max })
    }

    fn cell(&self, address: usize) -> u8 {
        self.cells.get(address).copied().unwrap_or(Opcode::Nop.nibble())
    }
}

pub fn write_object(rom: &RomImage, has_code: bool, out: &mut impl Write) -> Result<()> {
    for record in hex::encode_nibbles(&rom.cells, has_code.then_some(rom.addr_max))? {
        writeln!(out, "{record}")?;
    }
    Ok(())
}

/// One `@<byte address> <odd><even>` line per pair of cells, up to `addr_max`.
pub fn write_memvalue(rom: &RomImage, out: &mut impl Write) -> Result<()> {
    for addr in (0..rom.cells.len()).step_by(2) {
        if addr > rom.addr_max {
            break;
        }
        writeln!(out, "@{:02x} {:x}{:x}", addr / 2, rom.cell(addr + 1), rom.cell(addr))?;
    }
    Ok(())
}

/// Address, opcode and source text of every chain entry, with loop bodies indented.
pub fn write_listing(chain: &InstructionChain, out: &mut impl Write) -> Result<()> {
    let mut indent = 0usize;

    for instruction in chain.iter() {
        match instruction.opcode {
            Some(opcode) => write!(out, "{:02x} {:x}    ", instruction.address, opcode.nibble())?,
            None => write!(out, "{:02x} -    ", instruction.address)?,
        }

        if instruction.opcode == Some(Opcode::End) {
            indent = indent.saturating_sub(1);
        }
        writeln!(out, "{}{}", "    ".repeat(indent), instruction.source_text)?;
        if instruction.opcode == Some(Opcode::Begin) {
            indent += 1;
        }
    }
    Ok(())
}

/// Writes all three artifacts. Nothing is created if the chain does not fit the ROM.
pub fn emit(chain: &InstructionChain, names: &OutputNames, capacity: usize) -> Result<RomImage> {
    let rom = RomImage::stamp(chain, capacity)?;

    let create = |path: &PathBuf| {
        File::create(path)
            .map(BufWriter::new)
            .map_err(|source| AsmError::CannotOpen { path: path.clone(), source })
    };
    let mut object = create(&names.object)?;
    let mut memvalue = create(&names.memvalue)?;
    let mut listing = create(&names.listing)?;

    write_object(&rom, !chain.is_empty(), &mut object)?;
    write_memvalue(&rom, &mut memvalue)?;
    write_listing(chain, &mut listing)?;

    object.flush()?;
    memvalue.flush()?;
    listing.flush()?;

    info!("wrote {:?}, {:?} and {:?}", names.object, names.memvalue, names.listing);
    Ok(rom)
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use super::{emit, write_listing, write_memvalue, write_object, OutputNames, RomImage};
    use crate::{
        chain::InstructionChain,
        error::AsmError,
        hex::{self, Packing},
        isa::Opcode,
        lexer::tokenize,
        ROM_SIZE_MAX,
    };

    fn chain(source: &str) -> InstructionChain {
        InstructionChain::from_tokens(tokenize(source)).unwrap()
    }

    fn render(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut out = vec![];
        f(&mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_stamp() {
        let rom = RomImage::stamp(&chain("+++.[-]"), 16).unwrap();

        use Opcode::*;
        let expected: Vec<u8> = [Inc, Inc, Inc, Out, Begin, Dec, End].iter().map(|op| op.nibble()).collect();
        assert_eq!(rom.cells[..7], expected[..]);
        assert!(rom.cells[7..].iter().all(|c| *c == Nop.nibble()));
        assert_eq!(rom.addr_max, 6);
    }

    #[test]
    fn test_stamp_overflow() {
        let err = RomImage::stamp(&chain("++++"), 3).unwrap_err();
        assert!(matches!(err, AsmError::RomOverflow { address: 3, capacity: 3 }));
    }

    #[test]
    fn test_stamp_capacity_range() {
        let err = RomImage::stamp(&chain("+"), ROM_SIZE_MAX + 2).unwrap_err();
        assert!(matches!(err, AsmError::CapacityOutOfRange { capacity, .. } if capacity == ROM_SIZE_MAX + 2));

        assert!(matches!(RomImage::stamp(&chain(""), 0), Err(AsmError::CapacityOutOfRange { .. })));
        assert!(RomImage::stamp(&chain("+"), ROM_SIZE_MAX).is_ok());
    }

    #[test]
    fn test_object_reloads_at_odd_capacity() {
        for capacity in [1, 7, 8, 33] {
            let rom = RomImage::stamp(&chain("+"), capacity).unwrap();
            let text = render(|out| write_object(&rom, true, out).unwrap());

            let image = hex::decode(&text, Packing::Nibble, capacity).unwrap();
            assert_eq!(image.cells, rom.cells, "capacity {capacity}");
        }
    }

    #[test]
    fn test_object() {
        let rom = RomImage::stamp(&chain("+++.[-]"), 64).unwrap();
        let text = render(|out| write_object(&rom, true, out).unwrap());

        assert_eq!(text, ":10000000224236F7FFFFFFFFFFFFFFFFFFFFFFFF6B\n:00000001FF\n");
    }

    #[test]
    fn test_object_empty_program() {
        let empty = InstructionChain::new();
        let rom = RomImage::stamp(&empty, 64).unwrap();
        let text = render(|out| write_object(&rom, !empty.is_empty(), out).unwrap());

        assert_eq!(text, ":00000001FF\n");
    }

    #[test]
    fn test_memvalue() {
        let rom = RomImage::stamp(&chain("+++.[-]"), 64).unwrap();
        let text = render(|out| write_memvalue(&rom, out).unwrap());

        assert_eq!(text, "@00 22\n@01 42\n@02 36\n@03 f7\n");
    }

    #[test]
    fn test_listing_indents_loops() {
        let text = render(|out| write_listing(&chain("clear\n[\n[-]\n]\n"), out).unwrap());

        assert_eq!(text, concat!(
            "00 -    clear\n",
            "00 6    [\n",
            "01 6        [\n",
            "02 3            -\n",
            "03 7        ]\n",
            "04 7    ]\n",
        ));
    }

    #[test]
    fn test_listing_unbalanced_end_clamps() {
        let text = render(|out| write_listing(&chain("]+"), out).unwrap());
        assert_eq!(text, "00 7    ]\n01 2    +\n");
    }

    #[test]
    fn test_resolve_names() {
        let names = OutputNames::resolve(Path::new("dir/prog.bf"), None, Some("rom.mem".into()), None).unwrap();

        assert_eq!(names.object, PathBuf::from("dir/prog.hex"));
        assert_eq!(names.memvalue, PathBuf::from("rom.mem"));
        assert_eq!(names.listing, PathBuf::from("dir/prog.lis"));
    }

    #[test]
    fn test_resolve_conflicts() {
        let input = Path::new("prog.bf");

        let err = OutputNames::resolve(input, Some("prog.bf".into()), None, None).unwrap_err();
        assert!(matches!(err, AsmError::NameConflict { first: "input", second: "object", .. }));

        let err = OutputNames::resolve(input, None, Some("prog.lis".into()), None).unwrap_err();
        assert!(matches!(err, AsmError::NameConflict { first: "memvalue", second: "listing", .. }));

        // An input already carrying a derived extension collides with its own artifact
        let err = OutputNames::resolve(Path::new("prog.hex"), None, None, None).unwrap_err();
        assert!(matches!(err, AsmError::NameConflict { first: "input", second: "object", .. }));
    }

    #[test]
    fn test_emit_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("prog.bf");
        let names = OutputNames::resolve(&input, None, None, None).unwrap();

        emit(&chain("+.\n"), &names, 64).unwrap();

        assert_eq!(std::fs::read_to_string(&names.object).unwrap().lines().last(), Some(":00000001FF"));
        assert_eq!(std::fs::read_to_string(&names.memvalue).unwrap(), "@00 42\n");
        assert_eq!(std::fs::read_to_string(&names.listing).unwrap(), "00 2    +\n01 4    .\n");
    }

    #[test]
    fn test_emit_overflow_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let names = OutputNames::resolve(&dir.path().join("prog.bf"), None, None, None).unwrap();

        assert!(emit(&chain("+++"), &names, 2).is_err());
        assert!(!names.object.exists());
        assert!(!names.listing.exists());
    }
}
