//! gekko-probe - Gekko instruction interpreter
//!
//! Command line front end: loads a raw big-endian code image into a memory
//! image, seeds registers and runs, traces or disassembles it.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gk_core::config::Config;
use gk_cpu::driver::EVENT_QUEUE_CAPACITY;
use gk_cpu::{DriverEvent, EvaluationDriver, InvalidInstruction, RegisterFile, StopReason};
use gk_debug::{GekkoDisassembler, Profiler};
use gk_memory::{MemoryImage, MemoryPort};
use serde::Serialize;

/// Where applications are conventionally loaded
const DEFAULT_LOAD_ADDRESS: u32 = 0x8000_3100;
const DEFAULT_STEPS: u64 = 1_000_000;

#[derive(Parser, Debug)]
#[command(name = "gekko-probe", version, about = "Gekko (GameCube PowerPC) instruction interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute an image and dump the registers it leaves behind
    Run {
        #[command(flatten)]
        image: ImageArgs,
        #[command(flatten)]
        exec: ExecArgs,
        /// Print hotspot and mnemonic counts after the run
        #[arg(long)]
        profile: bool,
    },
    /// Execute an image printing every instruction before it runs
    Trace {
        #[command(flatten)]
        image: ImageArgs,
        #[command(flatten)]
        exec: ExecArgs,
    },
    /// Disassemble an image without executing it
    Disasm {
        #[command(flatten)]
        image: ImageArgs,
        /// Number of instructions (defaults to the whole image)
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Raw big-endian code image
    path: PathBuf,
    /// Address the image is loaded at
    #[arg(long, value_parser = parse_u32, default_value_t = DEFAULT_LOAD_ADDRESS)]
    load_address: u32,
}

#[derive(Args, Debug)]
struct ExecArgs {
    /// Initial program counter (defaults to the load address)
    #[arg(long, value_parser = parse_u32)]
    entry: Option<u32>,
    /// Maximum number of instructions to execute
    #[arg(long, default_value_t = DEFAULT_STEPS)]
    steps: u64,
    /// Seed a register, e.g. `r3=0x10` or `ctr=5` (repeatable)
    #[arg(long = "reg", value_name = "NAME=VALUE")]
    registers: Vec<String>,
    /// Stop at the first instruction that cannot be executed
    #[arg(long)]
    halt_on_invalid: bool,
    /// Stop before executing the instruction at this address (repeatable)
    #[arg(long = "break", value_parser = parse_u32, value_name = "ADDR")]
    breakpoints: Vec<u32>,
    /// Register dump format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// JSON form of a finished run
#[derive(Serialize)]
struct RunReport<'a> {
    stop_reason: String,
    invalid_instructions: usize,
    registers: &'a RegisterFile,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config to get initial log level
    let config = Config::load().unwrap_or_default();
    gk_core::logging::init(&config);

    match cli.command {
        Command::Run { image, exec, profile } => run(&config, &image, &exec, Mode::Run { profile }),
        Command::Trace { image, exec } => run(&config, &image, &exec, Mode::Trace),
        Command::Disasm { image, count } => disasm(&config, &image, count),
    }
}

/// Accept `0x`-prefixed hex or decimal
fn parse_u32(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", text, e))
}

/// Apply one `NAME=VALUE` register assignment
fn seed_register(regs: &mut RegisterFile, assignment: &str) -> anyhow::Result<()> {
    let Some((name, value)) = assignment.split_once('=') else {
        bail!("register assignment '{}' is not NAME=VALUE", assignment);
    };
    let value = parse_u32(value.trim()).map_err(anyhow::Error::msg)?;
    let name = name.trim().to_ascii_lowercase();

    match name.as_str() {
        "pc" => regs.pc = value,
        "lr" => regs.lr = value,
        "ctr" => regs.ctr = value,
        "cr" => regs.cr = value,
        "xer" => regs.xer = value,
        "msr" => regs.msr = value,
        "fpscr" => regs.fpscr = value,
        _ => {
            let index = name
                .strip_prefix('r')
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n < 32)
                .with_context(|| format!("unknown register '{}'", name))?;
            regs.gpr[index] = value;
        }
    }
    Ok(())
}

fn load_image(config: &Config, args: &ImageArgs) -> anyhow::Result<(std::sync::Arc<MemoryImage>, u32)> {
    let code = fs::read(&args.path).with_context(|| format!("read image {}", args.path.display()))?;
    let memory = MemoryImage::with_size(config.memory.main_ram_size);
    memory
        .load_bytes(args.load_address, &code)
        .with_context(|| format!("load image at 0x{:08X}", args.load_address))?;
    tracing::info!(
        "Loaded {} bytes from {} at 0x{:08X}",
        code.len(),
        args.path.display(),
        args.load_address
    );
    Ok((memory, code.len() as u32))
}

fn disasm(config: &Config, args: &ImageArgs, count: Option<usize>) -> anyhow::Result<()> {
    let (memory, len) = load_image(config, args)?;
    let count = count.unwrap_or((len / 4) as usize);
    let listing = GekkoDisassembler::disassemble_port(&*memory, args.load_address, count)
        .context("read instructions")?;
    for line in listing {
        println!("{:08X}:  {}  {}", line.address, line.opcode_hex(), line);
    }
    Ok(())
}

enum Mode {
    Run { profile: bool },
    Trace,
}

fn run(config: &Config, image: &ImageArgs, exec: &ExecArgs, mode: Mode) -> anyhow::Result<()> {
    let (memory, _) = load_image(config, image)?;

    let mut config = config.clone();
    config.interpreter.halt_on_invalid |= exec.halt_on_invalid;

    let mut initial = RegisterFile::new(exec.entry.unwrap_or(image.load_address));
    for assignment in &exec.registers {
        seed_register(&mut initial, assignment)?;
    }

    let driver = EvaluationDriver::new(memory.clone(), &config, initial);
    for &addr in &exec.breakpoints {
        driver
            .interpreter()
            .add_breakpoint(addr, gk_cpu::BreakpointType::Unconditional);
    }
    let mut profiler = match mode {
        Mode::Run { profile: true } => {
            let mut profiler = Profiler::new();
            profiler.enable();
            Some(profiler)
        }
        _ => None,
    };

    let mut invalid = Vec::new();
    let reason = match (&mode, profiler.as_mut()) {
        (Mode::Trace, _) => step_each(&driver, &*memory, exec.steps, |pc, word| {
            println!("{:08X}:  {:08X}  {}", pc, word, GekkoDisassembler::disassemble(pc, word));
            drain_invalid(&driver, &mut invalid);
        }),
        (Mode::Run { .. }, Some(profiler)) => step_each(&driver, &*memory, exec.steps, |pc, word| {
            profiler.record_instruction(pc, word);
            drain_invalid(&driver, &mut invalid);
        }),
        (Mode::Run { .. }, None) => run_chunked(&driver, exec.steps, || drain_invalid(&driver, &mut invalid)),
    };
    drain_invalid(&driver, &mut invalid);

    for diagnostic in &invalid {
        eprintln!("invalid instruction: {}", diagnostic);
    }

    if let Some(profiler) = profiler.as_mut() {
        for _ in &invalid {
            profiler.record_invalid();
        }
        eprintln!("{}", profiler.generate_report());
    }

    let regs = driver.registers();
    match exec.format {
        OutputFormat::Text => {
            println!("stopped: {}", reason);
            print!("{}", format_registers(&regs));
        }
        OutputFormat::Json => {
            let report = RunReport {
                stop_reason: reason.to_string(),
                invalid_instructions: invalid.len(),
                registers: &regs,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    match reason {
        StopReason::MemoryFault(err) | StopReason::Alignment(err) => Err(err.into()),
        StopReason::Detached => bail!("memory port detached"),
        _ => Ok(()),
    }
}

/// Move queued invalid-instruction diagnostics into `out`
fn drain_invalid(driver: &EvaluationDriver, out: &mut Vec<InvalidInstruction>) {
    out.extend(driver.events().try_iter().filter_map(|event| match event {
        DriverEvent::InvalidInstruction(invalid) => Some(invalid),
        _ => None,
    }));
}

/// Run `steps` instructions in slices small enough that no diagnostic is
/// dropped from the event queue, calling `between` after each slice
fn run_chunked(driver: &EvaluationDriver, steps: u64, mut between: impl FnMut()) -> StopReason {
    let chunk = (EVENT_QUEUE_CAPACITY / 2) as u64;
    let mut remaining = steps;
    while remaining > 0 {
        let slice = remaining.min(chunk);
        let reason = driver.run_for(slice);
        between();
        if reason != StopReason::StepLimit {
            return reason;
        }
        remaining -= slice;
    }
    StopReason::StepLimit
}

/// Single-step the driver, reporting each instruction word before it runs
fn step_each(
    driver: &EvaluationDriver,
    memory: &MemoryImage,
    steps: u64,
    mut on_instruction: impl FnMut(u32, u32),
) -> StopReason {
    for _ in 0..steps {
        let pc = driver.with_registers(|regs| regs.pc);
        if let Ok(word) = memory.read_u32(pc) {
            on_instruction(pc, word);
        }
        match driver.run_for(1) {
            StopReason::StepLimit => {}
            reason => return reason,
        }
    }
    StopReason::StepLimit
}

fn format_registers(regs: &RegisterFile) -> String {
    let mut out = String::new();
    for row in 0..8 {
        let line: Vec<String> = (0..4)
            .map(|col| {
                let index = row * 4 + col;
                format!("r{:<2} {:08X}", index, regs.gpr[index])
            })
            .collect();
        out.push_str(&line.join("  "));
        out.push('\n');
    }
    out.push_str(&format!(
        "pc  {:08X}  lr  {:08X}  ctr {:08X}  cr  {:08X}\n",
        regs.pc, regs.lr, regs.ctr, regs.cr
    ));
    out.push_str(&format!(
        "xer {:08X}  msr {:08X}  fpscr {:08X}  tb {}\n",
        regs.xer, regs.msr, regs.fpscr, regs.tb
    ));
    for (index, bits) in regs.fpr.iter().enumerate().filter(|(_, bits)| **bits != 0) {
        out.push_str(&format!("f{:<2} {:016X} ({})\n", index, bits, f64::from_bits(*bits)));
    }
    out
}
