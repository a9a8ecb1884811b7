use std::{
    fs::{self, File},
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use bfcpu_asm::{emit, lexer, InstructionChain, OutputNames, ROM_SIZE_DEFAULT, ROM_SIZE_MAX};
use bfcpu_core_emulator::{
    device::StdinDevice,
    trace::{TraceConfig, TraceWriter},
    CancelToken, Core, IoMode, Peripherals, SimConfig, StopReason, RAM_SIZE_DEFAULT,
};
use clap::Parser;
use log::{debug, info};

const RAM_SIZE_MAX: usize = 1 << 24;

/// bfCPU assembler and simulator
#[derive(Parser, Debug)]
#[command(name = "bftool", author, version, about, long_about = None)]
struct Args {
    /// Source file to assemble, or Intel-hex object file to simulate
    input: PathBuf,

    /// Assemble the input (default)
    #[arg(short, long, conflicts_with = "sim")]
    asm: bool,

    /// Simulate the input
    #[arg(short, long)]
    sim: bool,

    /// ROM size in 4-bit cells
    #[arg(short = 'i', long = "rom", value_name = "CELLS", default_value_t = ROM_SIZE_DEFAULT, value_parser = parse_rom_size)]
    rom_size: usize,

    /// RAM size in bytes
    #[arg(short = 'd', long = "ram", value_name = "BYTES", default_value_t = RAM_SIZE_DEFAULT, value_parser = parse_ram_size)]
    ram_size: usize,

    /// Object file name (Intel hex) [default: <input>.hex]
    #[arg(short = 'o', long = "obj", value_name = "FILE")]
    object: Option<PathBuf>,

    /// Memory-initialisation file name [default: <input>.v]
    #[arg(short = 'v', long = "ver", value_name = "FILE")]
    memvalue: Option<PathBuf>,

    /// Listing file name [default: <input>.lis]
    #[arg(short = 'l', long = "lis", value_name = "FILE")]
    listing: Option<PathBuf>,

    /// Write the simulation trace to a log file [default: <input>.sim]
    #[arg(short = 'g', long = "log", value_name = "FILE", num_args = 0..=1, require_equals = true)]
    log: Option<Option<PathBuf>>,

    /// Print the simulation trace on stdout
    #[arg(short = 'b', long)]
    verbose: bool,

    /// Simulator I/O uses raw characters instead of hex numbers
    #[arg(short = 't', long)]
    ascii: bool,

    /// Stop the simulation after this many instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Stop the simulation when execution runs off the top of ROM
    #[arg(long)]
    halt_on_wrap: bool,
}

fn parse_size(value: &str, max: usize) -> Result<usize, String> {
    let size: usize = value.parse().map_err(|_| format!("`{value}` is not a number"))?;
    if size == 0 || size > max {
        return Err(format!("must be between 1 and {max}"));
    }
    Ok(size)
}

fn parse_rom_size(value: &str) -> Result<usize, String> {
    parse_size(value, ROM_SIZE_MAX)
}

fn parse_ram_size(value: &str) -> Result<usize, String> {
    parse_size(value, RAM_SIZE_MAX)
}

fn main() -> Result<()> {
    let env = env_logger::Env::default()
        .filter_or("BFCPU_LOG", "warn")
        .write_style_or("BFCPU_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let args = Args::parse();
    debug!("{args:?}");

    if args.sim {
        simulate(&args)
    } else {
        assemble(&args)
    }
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("can't open {path:?}"))
}

fn assemble(args: &Args) -> Result<()> {
    let names = OutputNames::resolve(
        &args.input,
        args.object.clone(),
        args.memvalue.clone(),
        args.listing.clone(),
    )?;
    let source = read_input(&args.input)?;

    let chain = InstructionChain::from_tokens(lexer::tokenize(&source))?;
    let rom = emit::emit(&chain, &names, args.rom_size)?;

    info!("assembled {} instructions, highest address {:#06x}", chain.program_counter(), rom.addr_max);
    Ok(())
}

fn simulate(args: &Args) -> Result<()> {
    let log_path = match &args.log {
        Some(Some(path)) => Some(path.clone()),
        Some(None) => Some(args.input.with_extension("sim")),
        None => None,
    };
    if log_path.as_deref() == Some(args.input.as_path()) {
        bail!("file name conflict: log file and input are both {:?}", args.input);
    }

    let config = SimConfig {
        rom_size: args.rom_size,
        ram_size: args.ram_size,
        io_mode: if args.ascii { IoMode::Ascii } else { IoMode::Binary },
        step_limit: args.max_steps,
        halt_on_wrap: args.halt_on_wrap,
    };

    let object = read_input(&args.input)?;
    let mut core = Core::new(config);
    core.load_hex(&object).with_context(|| format!("can't load {:?}", args.input))?;

    let log = log_path
        .as_ref()
        .map(|path| File::create(path).map(BufWriter::new).with_context(|| format!("can't open {path:?}")))
        .transpose()?;
    let trace_config = TraceConfig { console_enabled: args.verbose, log_enabled: log.is_some() };
    let mut trace = TraceWriter::new(io::stdout(), log, trace_config);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("can't install Ctrl-C handler")?;

    let mut device = StdinDevice::new();
    let summary = core.execute_until_stopped(&mut Peripherals {
        device: &mut device,
        trace: &mut trace,
        cancel: &cancel,
    })?;

    match summary.reason {
        StopReason::Cancelled => println!("\nAborted: MAXPTR=0x{0:04x}({0})", summary.max_pointer),
        reason => info!("stopped ({reason:?}): MAXPTR=0x{0:04x}({0})", summary.max_pointer),
    }
    Ok(())
}
