use std::{
    io::{self, Read},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::Duration,
};

use log::warn;

use crate::CancelToken;

use super::{Device, DeviceInput};

/// How often a blocked read wakes up to look at the cancel token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Reads the process's standard input.
///
/// Reading happens on a worker thread which forwards bytes over a channel, so that a read
/// blocked waiting for the user can still be abandoned when the cancel token fires.
#[derive(Default)]
pub struct StdinDevice {
    rx: Option<Receiver<u8>>,
}

impl StdinDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Device for StdinDevice {
    fn read_byte(&mut self, cancel: &CancelToken) -> DeviceInput<u8> {
        let rx = self.rx.get_or_insert_with(spawn_stdin_worker);

        loop {
            if cancel.is_cancelled() {
                return DeviceInput::Cancelled;
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(byte) => return DeviceInput::Ready(byte),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return DeviceInput::Closed,
            }
        }
    }
}

fn spawn_stdin_worker() -> Receiver<u8> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for byte in io::stdin().lock().bytes() {
            match byte {
                Ok(byte) => {
                    if tx.send(byte).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!("stdin read failed: {err}");
                    break;
                }
            }
        }
    });
    rx
}
