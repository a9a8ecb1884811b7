use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use num_traits::{Num, One, Zero};

/// A fixed-capacity cell array whose addresses wrap around at both ends.
pub trait Memory {
    type AddressSpace: Copy + Num + PartialOrd;

    fn capacity(&self) -> Self::AddressSpace;

    fn read_cell(&self, addr: Self::AddressSpace) -> u8;
    fn write_cell(&mut self, addr: Self::AddressSpace, value: u8);

    /// The address after `addr`; the last address is followed by zero.
    fn next_address(&self, addr: Self::AddressSpace) -> Self::AddressSpace {
        let next = addr + One::one();
        if next >= self.capacity() { Zero::zero() } else { next }
    }

    /// The address before `addr`; zero is preceded by the last address.
    fn prev_address(&self, addr: Self::AddressSpace) -> Self::AddressSpace {
        if addr.is_zero() { self.capacity() - One::one() } else { addr - One::one() }
    }
}

/// Program memory. Each cell holds one 4-bit opcode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rom {
    cells: Vec<u8>,
}

impl Rom {
    pub fn new(cells: Vec<u8>) -> Self {
        assert!(!cells.is_empty(), "ROM must have at least one cell");
        Self { cells }
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

impl Memory for Rom {
    type AddressSpace = usize;

    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn read_cell(&self, addr: usize) -> u8 {
        self.cells[addr]
    }

    fn write_cell(&mut self, addr: usize, value: u8) {
        self.cells[addr] = value & 0x0F;
    }
}

/// Data memory. Byte-wide, zero-initialised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ram {
    cells: Vec<u8>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "RAM must have at least one cell");
        Self { cells: vec![0; size] }
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

impl Memory for Ram {
    type AddressSpace = usize;

    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn read_cell(&self, addr: usize) -> u8 {
        self.cells[addr]
    }

    fn write_cell(&mut self, addr: usize, value: u8) {
        self.cells[addr] = value;
    }
}

/// Shared flag used to ask a running simulation to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::{CancelToken, Memory, Ram, Rom};

    #[test]
    fn test_wraparound() {
        let ram = Ram::new(4);
        assert_eq!(ram.next_address(3), 0);
        assert_eq!(ram.prev_address(0), 3);
        assert_eq!(ram.next_address(1), 2);

        let rom = Rom::new(vec![0xF; 7]);
        assert_eq!(rom.next_address(6), 0);
        assert_eq!(rom.prev_address(0), 6);
    }

    #[test]
    fn test_single_cell_wraps_onto_itself() {
        let ram = Ram::new(1);
        assert_eq!(ram.next_address(0), 0);
        assert_eq!(ram.prev_address(0), 0);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let handler_side = token.clone();

        handler_side.cancel();
        assert!(token.is_cancelled());

        token.reset();
        assert!(!handler_side.is_cancelled());
    }
}
