//! Evaluation driver
//!
//! Owns the register file of one session and runs the interpreter, either on
//! a dedicated `gekko-interpreter` thread or synchronously with [`run_for`].
//! The register file is locked for the whole of each step, so host snapshots
//! always observe instruction boundaries.
//!
//! [`run_for`]: EvaluationDriver::run_for

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use gk_core::config::Config;
use gk_core::driver_debug;
use gk_core::error::CpuError;
use gk_memory::MemoryPort;
use parking_lot::Mutex;

use crate::interpreter::{Interpreter, InvalidInstruction, StepOutcome};
use crate::registers::RegisterFile;

/// Name of the evaluation thread
pub const THREAD_NAME: &str = "gekko-interpreter";

/// Capacity of the event queue
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Queue slots kept free for `Started` and `Stopped`
const LIFECYCLE_SLOTS: usize = 2;

/// Why the evaluation loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The host called `stop`
    Requested,
    /// The memory port lost its target
    Detached,
    /// A fetch or data access failed
    MemoryFault(CpuError),
    /// The PC or a data access was misaligned
    Alignment(CpuError),
    /// An enabled breakpoint matched before the instruction ran
    Breakpoint { addr: u32 },
    /// An instruction could not be executed and `halt_on_invalid` is set
    InvalidInstruction(InvalidInstruction),
    /// `run_for` executed all of its steps
    StepLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stop requested"),
            StopReason::Detached => write!(f, "memory port detached"),
            StopReason::MemoryFault(err) | StopReason::Alignment(err) => write!(f, "{}", err),
            StopReason::Breakpoint { addr } => write!(f, "breakpoint at 0x{:08x}", addr),
            StopReason::InvalidInstruction(invalid) => write!(f, "invalid instruction: {}", invalid),
            StopReason::StepLimit => write!(f, "step limit reached"),
        }
    }
}

/// Notification sent to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// The evaluation thread started
    Started,
    /// The evaluation thread stopped
    Stopped { reason: StopReason },
    /// An instruction was skipped
    InvalidInstruction(InvalidInstruction),
}

/// State shared between the host and the evaluation thread
struct Core {
    interpreter: Arc<Interpreter>,
    registers: Mutex<RegisterFile>,
    last_invalid: Mutex<Option<InvalidInstruction>>,
    /// Breakpoint address to step over on the next step
    resume_at: Mutex<Option<u32>>,
    events: Sender<DriverEvent>,
    halt_on_invalid: bool,
}

impl Core {
    /// Run one step; `Some` means the loop must stop
    fn step(&self) -> Option<StopReason> {
        if !self.interpreter.memory().is_connected() {
            return Some(StopReason::Detached);
        }

        let result = {
            let mut regs = self.registers.lock();
            let resume = self.resume_at.lock().take() == Some(regs.pc);
            if resume {
                self.interpreter.execute_step(&mut regs)
            } else {
                self.interpreter.step(&mut regs)
            }
        };

        match result {
            Ok(StepOutcome::Executed) => None,
            Ok(StepOutcome::Invalid(invalid)) => {
                *self.last_invalid.lock() = Some(invalid);
                // Diagnostics are dropped once the host falls behind; `last_invalid` keeps the latest
                if self.events.len() < EVENT_QUEUE_CAPACITY - LIFECYCLE_SLOTS {
                    let _ = self.events.try_send(DriverEvent::InvalidInstruction(invalid));
                }
                self.halt_on_invalid.then_some(StopReason::InvalidInstruction(invalid))
            }
            Err(CpuError::Breakpoint { addr }) => {
                *self.resume_at.lock() = Some(addr);
                Some(StopReason::Breakpoint { addr })
            }
            Err(err) if err.is_memory_fault() => Some(StopReason::MemoryFault(err)),
            Err(err) => Some(StopReason::Alignment(err)),
        }
    }

    fn notify(&self, event: DriverEvent) {
        if let Err(err) = self.events.try_send(event) {
            tracing::warn!("Event queue full, dropped {:?}", err.into_inner());
        }
    }
}

/// Runs the interpreter over one register file and memory port
pub struct EvaluationDriver {
    core: Arc<Core>,
    running: Arc<AtomicBool>,
    events: Receiver<DriverEvent>,
    handle: Option<JoinHandle<StopReason>>,
}

impl EvaluationDriver {
    /// Create a stopped driver seeded with `initial`
    pub fn new(memory: Arc<dyn MemoryPort>, config: &Config, initial: RegisterFile) -> Self {
        let (sender, receiver) = channel::bounded(EVENT_QUEUE_CAPACITY);
        let core = Core {
            interpreter: Arc::new(Interpreter::with_config(memory, config)),
            registers: Mutex::new(initial),
            last_invalid: Mutex::new(None),
            resume_at: Mutex::new(None),
            events: sender,
            halt_on_invalid: config.interpreter.halt_on_invalid,
        };

        Self {
            core: Arc::new(core),
            running: Arc::new(AtomicBool::new(false)),
            events: receiver,
            handle: None,
        }
    }

    /// Start the evaluation thread; does nothing if it is already running
    pub fn start(&mut self) -> gk_core::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // Reap a loop that stopped on its own
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        self.running.store(true, Ordering::Release);
        let core = Arc::clone(&self.core);
        let running = Arc::clone(&self.running);
        let spawned = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_loop(&core, &running));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Evaluation driver started");
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(err.into())
            }
        }
    }

    /// Stop the evaluation thread and wait for it
    ///
    /// Returns why the loop ended, or `None` if no thread was started.
    pub fn stop(&mut self) -> Option<StopReason> {
        self.running.store(false, Ordering::Release);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(reason) => Some(reason),
            Err(_) => {
                tracing::error!("Evaluation thread panicked");
                None
            }
        }
    }

    /// Whether the evaluation thread is currently executing
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Execute up to `steps` instructions on the calling thread
    pub fn run_for(&self, steps: u64) -> StopReason {
        for _ in 0..steps {
            if let Some(reason) = self.core.step() {
                driver_debug!("run_for stopped early: {}", reason);
                return reason;
            }
        }
        StopReason::StepLimit
    }

    /// Snapshot of the register file
    pub fn registers(&self) -> RegisterFile {
        self.core.registers.lock().clone()
    }

    /// Inspect or modify the register file between two steps
    pub fn with_registers<R>(&self, f: impl FnOnce(&mut RegisterFile) -> R) -> R {
        f(&mut self.core.registers.lock())
    }

    /// Most recent invalid-instruction diagnostic
    pub fn last_invalid(&self) -> Option<InvalidInstruction> {
        *self.core.last_invalid.lock()
    }

    /// Receiver for driver events
    pub fn events(&self) -> Receiver<DriverEvent> {
        self.events.clone()
    }

    /// Interpreter, for breakpoint management
    pub fn interpreter(&self) -> &Interpreter {
        &self.core.interpreter
    }
}

impl Drop for EvaluationDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(core: &Core, running: &AtomicBool) -> StopReason {
    core.notify(DriverEvent::Started);
    driver_debug!("Evaluation loop entered");

    let reason = loop {
        if !running.load(Ordering::Acquire) {
            break StopReason::Requested;
        }
        if let Some(reason) = core.step() {
            break reason;
        }
    };

    running.store(false, Ordering::Release);
    tracing::info!("Evaluation loop stopped: {}", reason);
    core.notify(DriverEvent::Stopped { reason: reason.clone() });
    reason
}
