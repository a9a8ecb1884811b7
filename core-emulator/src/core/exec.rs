use std::io::Write;

use bfcpu_asm::Opcode;
use log::{debug, info, warn};

use crate::{
    device::{parse_hex_entry, Device, DeviceInput},
    trace::TraceWriter,
    CancelToken, ExecError, IoMode, Memory,
};

use super::Core;

/// Everything outside the CPU that an instruction can touch.
pub struct Peripherals<'a, C: Write, L: Write> {
    pub device: &'a mut dyn Device,
    pub trace: &'a mut TraceWriter<C, L>,
    pub cancel: &'a CancelToken,
}

pub enum ExecutionResult {
    Continue,
    Stop(StopReason),
}

/// Why a run ended without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,

    /// Input reached end-of-file while RESET was waiting for confirmation.
    InputClosed,
    StepLimit,
    Wrapped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,

    /// Instructions executed during this run, across resets.
    pub steps: u64,
    pub max_pointer: usize,
}

impl Core {
    /// Runs until cancelled, until one of the optional halts in the config triggers, or until an
    /// undecodable opcode is fetched.
    pub fn execute_until_stopped<C: Write, L: Write>(
        &mut self,
        io: &mut Peripherals<'_, C, L>,
    ) -> Result<RunSummary, ExecError> {
        info!("simulation started: ROM {} cells, RAM {} bytes", self.rom.capacity(), self.ram.capacity());

        let mut steps = 0u64;
        let reason = loop {
            if self.config.step_limit.is_some_and(|limit| steps >= limit) {
                break StopReason::StepLimit;
            }

            let result = self.execute_one_instruction(io)?;
            steps += 1;

            if let ExecutionResult::Stop(reason) = result {
                break reason;
            }
            if io.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
        };
        io.trace.flush()?;

        info!("simulation stopped ({reason:?}) after {steps} steps");
        Ok(RunSummary { reason, steps, max_pointer: self.max_pointer })
    }

    pub fn execute_one_instruction<C: Write, L: Write>(
        &mut self,
        io: &mut Peripherals<'_, C, L>,
    ) -> Result<ExecutionResult, ExecError> {
        let pc = self.program_counter;
        let code = self.rom.read_cell(pc);
        io.trace.dual(format_args!("{:05} : ", self.step_count))?;

        let Some(opcode) = Opcode::from_nibble(code) else {
            return Err(ExecError::IllegalOpcode { pc, code });
        };

        let mut result = ExecutionResult::Continue;
        match opcode {
            Opcode::PInc => {
                self.pointer = self.ram.next_address(self.pointer);
                self.max_pointer = self.max_pointer.max(self.pointer);
                self.trace_cell(io.trace, opcode, pc)?;
                result = self.step_forward();
            }

            Opcode::PDec => {
                self.pointer = self.ram.prev_address(self.pointer);
                self.trace_cell(io.trace, opcode, pc)?;
                result = self.step_forward();
            }

            Opcode::Inc => {
                self.ram.write_cell(self.pointer, self.current_cell().wrapping_add(1));
                self.trace_cell(io.trace, opcode, pc)?;
                result = self.step_forward();
            }

            Opcode::Dec => {
                self.ram.write_cell(self.pointer, self.current_cell().wrapping_sub(1));
                self.trace_cell(io.trace, opcode, pc)?;
                result = self.step_forward();
            }

            Opcode::Out => {
                self.output(io.trace, pc)?;
                result = self.step_forward();
            }

            Opcode::In => {
                self.input(io, pc)?;
                result = self.step_forward();
            }

            Opcode::Begin => {
                self.trace_cell(io.trace, opcode, pc)?;
                if self.current_cell() == 0 {
                    self.skip_to_matching_end(io.cancel)?;
                } else {
                    result = self.step_forward();
                }
            }

            Opcode::End => {
                self.trace_cell(io.trace, opcode, pc)?;
                if self.current_cell() != 0 {
                    self.skip_back_to_matching_begin(io.cancel)?;
                } else {
                    result = self.step_forward();
                }
            }

            Opcode::Reset => {
                self.trace_cell(io.trace, opcode, pc)?;
                self.reset();

                io.trace.console(format_args!("Hit Enter to Reset\n"))?;
                io.trace.flush_console()?;
                if io.device.read_line(io.cancel) == DeviceInput::Closed {
                    result = ExecutionResult::Stop(StopReason::InputClosed);
                }
            }

            Opcode::Nop => {
                self.trace_cell(io.trace, opcode, pc)?;
                result = self.step_forward();
            }
        }

        self.step_count = if opcode == Opcode::Reset { 0 } else { self.step_count + 1 };
        Ok(result)
    }

    /// Moves to the next ROM cell, reporting a halt if that wraps and the config asks for it.
    fn step_forward(&mut self) -> ExecutionResult {
        let next = self.rom.next_address(self.program_counter);
        let wrapped = next <= self.program_counter;
        self.program_counter = next;

        if wrapped && self.config.halt_on_wrap {
            debug!("PC wrapped to zero");
            ExecutionResult::Stop(StopReason::Wrapped)
        } else {
            ExecutionResult::Continue
        }
    }

    /// Leaves PC just past the END matching the BEGIN at PC.
    fn skip_to_matching_end(&mut self, cancel: &CancelToken) -> Result<(), ExecError> {
        let origin = self.program_counter;
        let capacity = self.rom.capacity();
        let mut pc = self.rom.next_address(origin);
        let mut depth = 0usize;

        for _ in 0..capacity {
            let code = Opcode::from_nibble(self.rom.read_cell(pc));
            pc = self.rom.next_address(pc);

            match code {
                Some(Opcode::End) if depth == 0 => {
                    self.program_counter = pc;
                    return Ok(());
                }
                Some(Opcode::End) => depth -= 1,
                Some(Opcode::Begin) => depth += 1,
                _ => {}
            }

            if cancel.is_cancelled() {
                self.program_counter = pc;
                return Ok(());
            }
        }

        Err(ExecError::UnbalancedBracket { pc: origin, opcode: Opcode::Begin, capacity })
    }

    /// Leaves PC just past the BEGIN matching the END at PC.
    fn skip_back_to_matching_begin(&mut self, cancel: &CancelToken) -> Result<(), ExecError> {
        let origin = self.program_counter;
        let capacity = self.rom.capacity();
        let mut pc = self.rom.prev_address(origin);
        let mut depth = 0usize;

        for _ in 0..capacity {
            match Opcode::from_nibble(self.rom.read_cell(pc)) {
                Some(Opcode::Begin) if depth == 0 => {
                    self.program_counter = self.rom.next_address(pc);
                    return Ok(());
                }
                Some(Opcode::Begin) => depth -= 1,
                Some(Opcode::End) => depth += 1,
                _ => {}
            }
            pc = self.rom.prev_address(pc);

            if cancel.is_cancelled() {
                self.program_counter = pc;
                return Ok(());
            }
        }

        Err(ExecError::UnbalancedBracket { pc: origin, opcode: Opcode::End, capacity })
    }

    fn output<C: Write, L: Write>(&mut self, trace: &mut TraceWriter<C, L>, pc: usize) -> Result<(), ExecError> {
        let value = self.current_cell();
        let line = format!(
            "{}--> PTR=0x{ptr:02x} RAM[0x{ptr:02x}]=0x{value:02x} OUTPUT=0x{value:02x}({value:3})({})\n",
            self.fetch_text(Opcode::Out, pc),
            printable(value),
            ptr = self.pointer,
        );

        match self.config.io_mode {
            IoMode::Binary => {
                trace.console(format_args!("{line}"))?;
                trace.log(format_args!("{line}"))?;
            }
            IoMode::Ascii => {
                trace.dual(format_args!("{line}"))?;
                trace.console_bytes(&[value])?;
                if trace.console_enabled() {
                    trace.console(format_args!("\n"))?;
                }
            }
        }
        trace.flush_console()?;
        Ok(())
    }

    fn input<C: Write, L: Write>(&mut self, io: &mut Peripherals<'_, C, L>, pc: usize) -> Result<(), ExecError> {
        let value = match self.config.io_mode {
            IoMode::Binary => {
                io.trace.console(format_args!("{}Input 8bit Hex Number? ", self.fetch_text(Opcode::In, pc)))?;
                loop {
                    io.trace.flush_console()?;
                    match io.device.read_line(io.cancel) {
                        DeviceInput::Ready(entry) => match parse_hex_entry(&entry) {
                            Some(value) => break value,
                            None => io.trace.console(format_args!(
                                "Illegal hex number {:?}. Input 8bit Hex Number? ",
                                entry.trim(),
                            ))?,
                        },
                        DeviceInput::Cancelled => break 0,
                        DeviceInput::Closed => {
                            warn!("input closed while waiting for a hex number, storing 0");
                            break 0;
                        }
                    }
                }
            }
            IoMode::Ascii => {
                let verbose = io.trace.console_enabled();
                if verbose {
                    io.trace.console(format_args!("Input an ASCII Character? "))?;
                    io.trace.flush_console()?;
                }
                let value = match io.device.read_byte(io.cancel) {
                    DeviceInput::Ready(byte) => byte,
                    DeviceInput::Cancelled => 0,
                    DeviceInput::Closed => {
                        debug!("input closed, storing 0");
                        0
                    }
                };
                if verbose {
                    io.trace.console(format_args!("\n"))?;
                }
                value
            }
        };

        self.ram.write_cell(self.pointer, value);
        io.trace.dual(format_args!(
            "{}--> PTR=0x{ptr:02x} RAM[0x{ptr:02x}]=0x{value:02x} INPUT=0x{value:02x}({value:3})({})\n",
            self.fetch_text(Opcode::In, pc),
            printable(value),
            ptr = self.pointer,
        ))?;
        Ok(())
    }

    fn fetch_text(&self, opcode: Opcode, pc: usize) -> String {
        format!("PC=0x{pc:02x} ROM[0x{pc:02x}]=0x{:x} ({}) ", opcode.nibble(), opcode.mnemonic())
    }

    /// The trace line shared by every instruction without I/O: what was fetched, then the
    /// current cell after execution.
    fn trace_cell<C: Write, L: Write>(
        &self,
        trace: &mut TraceWriter<C, L>,
        opcode: Opcode,
        pc: usize,
    ) -> Result<(), ExecError> {
        let value = self.current_cell();
        trace.dual(format_args!(
            "{}--> PTR=0x{ptr:02x} RAM[0x{ptr:02x}]=0x{value:02x}({value:3})\n",
            self.fetch_text(opcode, pc),
            ptr = self.pointer,
        ))?;
        Ok(())
    }
}

fn printable(byte: u8) -> char {
    if byte.is_ascii_graphic() || byte == b' ' { byte as char } else { '.' }
}
