use std::collections::VecDeque;

use crate::CancelToken;

use super::{Device, DeviceInput};

/// Serves a fixed byte sequence, then reports the input as closed.
pub struct ScriptedDevice {
    input: VecDeque<u8>,
    interrupt_when_drained: bool,
}

impl ScriptedDevice {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            interrupt_when_drained: false,
        }
    }

    /// Once the input runs out, behaves as if the user hit Ctrl-C while a read was blocked.
    pub fn interrupting_when_drained(input: &[u8]) -> Self {
        Self { interrupt_when_drained: true, ..Self::new(input) }
    }
}

impl Device for ScriptedDevice {
    fn read_byte(&mut self, cancel: &CancelToken) -> DeviceInput<u8> {
        if cancel.is_cancelled() {
            return DeviceInput::Cancelled;
        }

        match self.input.pop_front() {
            Some(byte) => DeviceInput::Ready(byte),
            None if self.interrupt_when_drained => {
                cancel.cancel();
                DeviceInput::Cancelled
            }
            None => DeviceInput::Closed,
        }
    }
}
