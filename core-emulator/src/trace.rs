//! Dual output: simulator trace lines go to the console and to a log file, each sink switched
//! on independently.

use std::{
    fmt,
    io::{self, Write},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceConfig {
    /// Echo trace lines on the console (the `--verbose` switch).
    pub console_enabled: bool,

    /// Copy trace lines into the log sink.
    pub log_enabled: bool,
}

pub struct TraceWriter<C: Write, L: Write> {
    console: C,
    log: Option<L>,
    config: TraceConfig,
}

impl<C: Write, L: Write> TraceWriter<C, L> {
    /// A missing log sink silently disables logging, whatever `config` says.
    pub fn new(console: C, log: Option<L>, config: TraceConfig) -> Self {
        Self { console, log, config }
    }

    pub fn console_enabled(&self) -> bool {
        self.config.console_enabled
    }

    /// Writes a trace fragment to whichever sinks are enabled.
    pub fn dual(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        if self.config.console_enabled {
            self.console.write_fmt(args)?;
        }
        self.log(args)
    }

    /// Writes to the log sink only, if enabled.
    pub fn log(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        match &mut self.log {
            Some(log) if self.config.log_enabled => log.write_fmt(args),
            _ => Ok(()),
        }
    }

    /// Writes to the console regardless of the verbose switch. Used for program output and prompts.
    pub fn console(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.console.write_fmt(args)
    }

    pub fn console_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.console.write_all(bytes)
    }

    pub fn flush_console(&mut self) -> io::Result<()> {
        self.console.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.console.flush()?;
        if let Some(log) = &mut self.log {
            log.flush()?;
        }
        Ok(())
    }

    pub fn console_sink(&self) -> &C {
        &self.console
    }

    pub fn log_sink(&self) -> Option<&L> {
        self.log.as_ref()
    }

    pub fn into_parts(self) -> (C, Option<L>) {
        (self.console, self.log)
    }
}

#[cfg(test)]
mod test {
    use super::{TraceConfig, TraceWriter};

    fn writer(console_enabled: bool, log_enabled: bool) -> TraceWriter<Vec<u8>, Vec<u8>> {
        TraceWriter::new(vec![], Some(vec![]), TraceConfig { console_enabled, log_enabled })
    }

    #[test]
    fn test_sinks_are_independent() {
        for (console_enabled, log_enabled) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut trace = writer(console_enabled, log_enabled);
            trace.dual(format_args!("line\n")).unwrap();

            let (console, log) = trace.into_parts();
            assert_eq!(!console.is_empty(), console_enabled);
            assert_eq!(!log.unwrap().is_empty(), log_enabled);
        }
    }

    #[test]
    fn test_console_ignores_verbose() {
        let mut trace = writer(false, true);
        trace.console(format_args!("prompt? ")).unwrap();

        assert_eq!(trace.console_sink(), b"prompt? ");
        assert_eq!(trace.log_sink().map(Vec::len), Some(0));
    }

    #[test]
    fn test_missing_log_sink() {
        let mut trace: TraceWriter<Vec<u8>, Vec<u8>> =
            TraceWriter::new(vec![], None, TraceConfig { console_enabled: false, log_enabled: true });
        trace.dual(format_args!("line\n")).unwrap();
        assert!(trace.console_sink().is_empty());
    }
}
