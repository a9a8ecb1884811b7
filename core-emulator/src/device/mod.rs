mod scripted;
pub use scripted::*;

mod stdin;
pub use stdin::*;

use crate::CancelToken;

/// Outcome of a blocking read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceInput<T> {
    Ready(T),

    /// The cancel token fired while waiting.
    Cancelled,

    /// No more input will ever arrive.
    Closed,
}

/// Source of the bytes consumed by `IN` and by the RESET confirmation.
pub trait Device {
    /// Blocks until one byte arrives, the input closes, or `cancel` fires.
    fn read_byte(&mut self, cancel: &CancelToken) -> DeviceInput<u8>;

    /// Reads up to and excluding the next line feed; a trailing carriage return is dropped.
    fn read_line(&mut self, cancel: &CancelToken) -> DeviceInput<String> {
        let mut bytes = vec![];
        loop {
            match self.read_byte(cancel) {
                DeviceInput::Ready(b'\n') => break,
                DeviceInput::Ready(byte) => bytes.push(byte),
                DeviceInput::Cancelled => return DeviceInput::Cancelled,
                DeviceInput::Closed if bytes.is_empty() => return DeviceInput::Closed,
                DeviceInput::Closed => break,
            }
        }

        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        DeviceInput::Ready(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Parses an interactive hex entry such as `41`, ` 0x7f ` or `1FF`.
///
/// Values are reduced modulo 256. Returns `None` for anything that is not a single hex
/// literal surrounded by optional whitespace.
pub fn parse_hex_entry(entry: &str) -> Option<u8> {
    let entry = entry.trim();
    let digits = entry
        .strip_prefix("0x")
        .or_else(|| entry.strip_prefix("0X"))
        .unwrap_or(entry);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok().map(|value| (value % 256) as u8)
}
