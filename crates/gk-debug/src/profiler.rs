//! Execution profiler for hotspot analysis

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gk_cpu::decoder::{self, Instruction};

/// Hotspot entry
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    /// Address
    pub address: u32,
    /// Hit count
    pub hit_count: u64,
    /// Percentage of all recorded instructions
    pub percentage: f64,
}

/// Mnemonic frequency entry
#[derive(Debug, Clone, PartialEq)]
pub struct MnemonicCount {
    pub mnemonic: &'static str,
    pub count: u64,
}

/// Execution profiler
///
/// Counts executed addresses and mnemonics. Recording is a no-op while the
/// profiler is disabled.
pub struct Profiler {
    /// Is profiling enabled
    pub enabled: bool,
    /// Start time of profiling session
    session_start: Instant,
    /// Hits per instruction address
    hotspots: HashMap<u32, u64>,
    /// Hits per mnemonic
    mnemonics: HashMap<&'static str, u64>,
    /// Invalid instructions seen
    invalid_instructions: u64,
    /// Total instructions executed (for percentage calculation)
    total_instructions: u64,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    /// Create a new profiler
    pub fn new() -> Self {
        Self {
            enabled: false,
            session_start: Instant::now(),
            hotspots: HashMap::new(),
            mnemonics: HashMap::new(),
            invalid_instructions: 0,
            total_instructions: 0,
        }
    }

    /// Enable profiling
    pub fn enable(&mut self) {
        self.enabled = true;
        self.session_start = Instant::now();
        tracing::info!("Profiler enabled");
    }

    /// Disable profiling
    pub fn disable(&mut self) {
        self.enabled = false;
        tracing::info!("Profiler disabled");
    }

    /// Record execution of `opcode` at `address`
    pub fn record_instruction(&mut self, address: u32, opcode: u32) {
        if !self.enabled {
            return;
        }
        *self.hotspots.entry(address).or_insert(0) += 1;
        let (_, mnemonic) = decoder::lookup(Instruction(opcode));
        *self.mnemonics.entry(mnemonic).or_insert(0) += 1;
        self.total_instructions += 1;
    }

    /// Record an instruction the interpreter could not execute
    pub fn record_invalid(&mut self) {
        if self.enabled {
            self.invalid_instructions += 1;
        }
    }

    /// Total instructions recorded
    pub fn total_instructions(&self) -> u64 {
        self.total_instructions
    }

    /// Get hotspots (top N by hit count, ties by address)
    pub fn get_hotspots(&self, count: usize) -> Vec<Hotspot> {
        let mut hotspots: Vec<_> = self
            .hotspots
            .iter()
            .map(|(&address, &hits)| Hotspot {
                address,
                hit_count: hits,
                percentage: self.percentage(hits),
            })
            .collect();

        hotspots.sort_by(|a, b| b.hit_count.cmp(&a.hit_count).then(a.address.cmp(&b.address)));
        hotspots.truncate(count);
        hotspots
    }

    /// Get the most frequent mnemonics (top N, ties by name)
    pub fn get_mnemonics(&self, count: usize) -> Vec<MnemonicCount> {
        let mut mnemonics: Vec<_> = self
            .mnemonics
            .iter()
            .map(|(&mnemonic, &count)| MnemonicCount { mnemonic, count })
            .collect();

        mnemonics.sort_by(|a, b| b.count.cmp(&a.count).then(a.mnemonic.cmp(b.mnemonic)));
        mnemonics.truncate(count);
        mnemonics
    }

    /// Get session duration
    pub fn session_duration(&self) -> Duration {
        self.session_start.elapsed()
    }

    /// Reset all profiling data
    pub fn reset(&mut self) {
        self.hotspots.clear();
        self.mnemonics.clear();
        self.invalid_instructions = 0;
        self.total_instructions = 0;
        self.session_start = Instant::now();
        tracing::info!("Profiler reset");
    }

    fn percentage(&self, hits: u64) -> f64 {
        if self.total_instructions > 0 {
            (hits as f64 / self.total_instructions as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Generate profiling report as text
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Execution Profile Report ===\n\n");

        report.push_str(&format!("Session duration: {:.2}s\n", self.session_duration().as_secs_f64()));
        report.push_str(&format!("Instructions executed: {}\n", self.total_instructions));
        report.push_str(&format!("Invalid instructions: {}\n", self.invalid_instructions));

        report.push_str("\n--- Hotspots ---\n");
        for hotspot in self.get_hotspots(10) {
            report.push_str(&format!(
                "0x{:08X}: {} hits ({:.2}%)\n",
                hotspot.address, hotspot.hit_count, hotspot.percentage
            ));
        }

        report.push_str("\n--- Mnemonics ---\n");
        for entry in self.get_mnemonics(10) {
            report.push_str(&format!(
                "{:8} {} ({:.2}%)\n",
                entry.mnemonic,
                entry.count,
                self.percentage(entry.count)
            ));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiler_creation() {
        let profiler = Profiler::new();
        assert!(!profiler.enabled);
        assert_eq!(profiler.total_instructions(), 0);
    }

    #[test]
    fn test_disabled_profiler_ignores_records() {
        let mut profiler = Profiler::new();
        profiler.record_instruction(0x8000_3100, 0x38600005);
        profiler.record_invalid();
        assert_eq!(profiler.total_instructions(), 0);
        assert!(profiler.get_hotspots(10).is_empty());
    }

    #[test]
    fn test_hotspots() {
        let mut profiler = Profiler::new();
        profiler.enable();

        profiler.record_instruction(0x8000_3100, 0x38600005);
        profiler.record_instruction(0x8000_3100, 0x38600005);
        profiler.record_instruction(0x8000_3104, 0x4E800020);
        profiler.record_instruction(0x8000_3108, 0x4E800020);

        let hotspots = profiler.get_hotspots(2);
        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].address, 0x8000_3100);
        assert_eq!(hotspots[0].hit_count, 2);
        assert_eq!(hotspots[0].percentage, 50.0);
        assert_eq!(hotspots[1].address, 0x8000_3104);
    }

    #[test]
    fn test_mnemonic_counts() {
        let mut profiler = Profiler::new();
        profiler.enable();

        profiler.record_instruction(0, 0x7C642A14); // add
        profiler.record_instruction(4, 0x38600005); // addi
        profiler.record_instruction(8, 0x7C642A14); // add

        let mnemonics = profiler.get_mnemonics(10);
        assert_eq!(
            mnemonics,
            vec![
                MnemonicCount { mnemonic: "add", count: 2 },
                MnemonicCount { mnemonic: "addi", count: 1 },
            ]
        );
    }

    #[test]
    fn test_report_and_reset() {
        let mut profiler = Profiler::new();
        profiler.enable();
        profiler.record_instruction(0x8000_3100, 0x38600005);
        profiler.record_invalid();

        let report = profiler.generate_report();
        assert!(report.contains("Instructions executed: 1"));
        assert!(report.contains("Invalid instructions: 1"));
        assert!(report.contains("0x80003100: 1 hits"));

        profiler.reset();
        assert_eq!(profiler.total_instructions(), 0);
        assert!(profiler.get_mnemonics(10).is_empty());
    }
}
