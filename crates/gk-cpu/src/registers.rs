//! Gekko architectural register file

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Processor version register value reported by a Gekko
pub const GEKKO_PVR: u32 = 0x0008_3214;

/// SPR numbers
pub mod spr {
    pub const XER: u16 = 1;
    pub const LR: u16 = 8;
    pub const CTR: u16 = 9;
    pub const DSISR: u16 = 18;
    pub const DAR: u16 = 19;
    pub const DEC: u16 = 22;
    pub const SDR1: u16 = 25;
    pub const SRR0: u16 = 26;
    pub const SRR1: u16 = 27;
    /// Time base lower (read encoding)
    pub const TBL: u16 = 268;
    /// Time base upper (read encoding)
    pub const TBU: u16 = 269;
    pub const SPRG0: u16 = 272;
    pub const SPRG1: u16 = 273;
    pub const SPRG2: u16 = 274;
    pub const SPRG3: u16 = 275;
    pub const EAR: u16 = 282;
    /// Time base lower (write encoding)
    pub const TBL_WRITE: u16 = 284;
    /// Time base upper (write encoding)
    pub const TBU_WRITE: u16 = 285;
    pub const PVR: u16 = 287;
    pub const IBAT0U: u16 = 528;
    pub const DBAT0U: u16 = 536;
    pub const GQR0: u16 = 912;
    pub const HID2: u16 = 920;
    pub const WPAR: u16 = 921;
    pub const DMAU: u16 = 922;
    pub const DMAL: u16 = 923;
    pub const HID0: u16 = 1008;
    pub const HID1: u16 = 1009;
    pub const IABR: u16 = 1010;
    pub const DABR: u16 = 1013;
    pub const L2CR: u16 = 1017;

    /// SPRs that instructions may read but never write
    pub const fn is_read_only(id: u16) -> bool {
        matches!(id, TBL | TBU | TBL_WRITE | TBU_WRITE | PVR)
    }
}

/// XER summary overflow
pub const XER_SO: u32 = 0x8000_0000;
/// XER overflow
pub const XER_OV: u32 = 0x4000_0000;
/// XER carry
pub const XER_CA: u32 = 0x2000_0000;
/// XER string byte count
pub const XER_BYTE_COUNT: u32 = 0x7F;

bitflags! {
    /// Machine state register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Msr: u32 {
        const POW = 0x0004_0000;
        const ILE = 0x0001_0000;
        const EE = 0x0000_8000;
        const PR = 0x0000_4000;
        const FP = 0x0000_2000;
        const ME = 0x0000_1000;
        const FE0 = 0x0000_0800;
        const SE = 0x0000_0400;
        const BE = 0x0000_0200;
        const FE1 = 0x0000_0100;
        const IP = 0x0000_0040;
        const IR = 0x0000_0020;
        const DR = 0x0000_0010;
        const PM = 0x0000_0004;
        const RI = 0x0000_0002;
        const LE = 0x0000_0001;
    }
}

bitflags! {
    /// Floating-point status and control register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Fpscr: u32 {
        /// Exception summary (sticky)
        const FX = 0x8000_0000;
        /// Enabled exception summary
        const FEX = 0x4000_0000;
        /// Invalid operation summary
        const VX = 0x2000_0000;
        const OX = 0x1000_0000;
        const UX = 0x0800_0000;
        const ZX = 0x0400_0000;
        const XX = 0x0200_0000;
        const VXSNAN = 0x0100_0000;
        const VXISI = 0x0080_0000;
        const VXIDI = 0x0040_0000;
        const VXZDZ = 0x0020_0000;
        const VXIMZ = 0x0010_0000;
        const VXVC = 0x0008_0000;
        const FR = 0x0004_0000;
        const FI = 0x0002_0000;
        /// Result class descriptor
        const C = 0x0001_0000;
        /// Less than or negative
        const FL = 0x0000_8000;
        /// Greater than or positive
        const FG = 0x0000_4000;
        /// Equal or zero
        const FE = 0x0000_2000;
        /// Unordered or NaN
        const FU = 0x0000_1000;
        const VXSOFT = 0x0000_0400;
        const VXSQRT = 0x0000_0200;
        const VXCVI = 0x0000_0100;
        const VE = 0x0000_0080;
        const OE = 0x0000_0040;
        const UE = 0x0000_0020;
        const ZE = 0x0000_0010;
        const XE = 0x0000_0008;
        const NI = 0x0000_0004;
        const RN = 0x0000_0003;

        /// Condition code bits
        const FPCC = Self::FL.bits() | Self::FG.bits() | Self::FE.bits() | Self::FU.bits();
        /// Result flags
        const FPRF = Self::C.bits() | Self::FPCC.bits();
        /// Every invalid-operation cause
        const VX_ANY = Self::VXSNAN.bits()
            | Self::VXISI.bits()
            | Self::VXIDI.bits()
            | Self::VXZDZ.bits()
            | Self::VXIMZ.bits()
            | Self::VXVC.bits()
            | Self::VXSOFT.bits()
            | Self::VXSQRT.bits()
            | Self::VXCVI.bits();
        /// Exception bits whose 0 -> 1 transition sets FX
        const EXCEPTIONS = Self::OX.bits()
            | Self::UX.bits()
            | Self::ZX.bits()
            | Self::XX.bits()
            | Self::VX_ANY.bits();
    }
}

/// Architectural state of one Gekko core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    /// General purpose registers
    pub gpr: [u32; 32],
    /// Floating point registers, as raw IEEE double bits
    pub fpr: [u64; 32],
    /// Condition register
    pub cr: u32,
    /// Link register
    pub lr: u32,
    /// Count register
    pub ctr: u32,
    /// Program counter
    pub pc: u32,
    /// Machine state register
    pub msr: u32,
    /// Save/restore register 0
    pub srr0: u32,
    /// Save/restore register 1
    pub srr1: u32,
    /// Fixed-point exception register
    pub xer: u32,
    /// FP status and control register
    pub fpscr: u32,
    /// Time base
    pub tb: u64,
    /// Every other SPR, keyed by SPR number
    pub spr: BTreeMap<u16, u32>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        let mut spr = BTreeMap::new();
        spr.insert(spr::PVR, GEKKO_PVR);

        Self {
            gpr: [0; 32],
            fpr: [0; 32],
            cr: 0,
            lr: 0,
            ctr: 0,
            pc: 0,
            msr: 0,
            srr0: 0,
            srr1: 0,
            xer: 0,
            fpscr: 0,
            tb: 0,
            spr,
        }
    }
}

impl RegisterFile {
    /// Create a reset register file with the program counter at `pc`
    pub fn new(pc: u32) -> Self {
        Self {
            pc,
            ..Self::default()
        }
    }

    /// Advance the program counter by one instruction
    #[inline]
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(4);
    }

    #[inline]
    pub fn gpr(&self, index: usize) -> u32 {
        self.gpr[index]
    }

    #[inline]
    pub fn set_gpr(&mut self, index: usize, value: u32) {
        self.gpr[index] = value;
    }

    /// `(rA|0)`: the value of rA, or 0 when the field names r0
    #[inline]
    pub fn gpr_or_zero(&self, index: usize) -> u32 {
        if index == 0 {
            0
        } else {
            self.gpr[index]
        }
    }

    /// Read an FPR as a double
    #[inline]
    pub fn fpr(&self, index: usize) -> f64 {
        f64::from_bits(self.fpr[index])
    }

    /// Write a double into an FPR
    #[inline]
    pub fn set_fpr(&mut self, index: usize, value: f64) {
        self.fpr[index] = value.to_bits();
    }

    #[inline]
    pub fn fpr_bits(&self, index: usize) -> u64 {
        self.fpr[index]
    }

    #[inline]
    pub fn set_fpr_bits(&mut self, index: usize, bits: u64) {
        self.fpr[index] = bits;
    }

    /// Get CR field value (0-7)
    #[inline]
    pub fn cr_field(&self, field: usize) -> u32 {
        (self.cr >> (28 - field * 4)) & 0xF
    }

    /// Set CR field value (0-7)
    #[inline]
    pub fn set_cr_field(&mut self, field: usize, value: u32) {
        let shift = 28 - field * 4;
        self.cr = (self.cr & !(0xF << shift)) | ((value & 0xF) << shift);
    }

    /// Get a single CR bit, numbered from the most significant bit
    #[inline]
    pub fn cr_bit(&self, bit: usize) -> bool {
        (self.cr >> (31 - bit)) & 1 != 0
    }

    #[inline]
    pub fn set_cr_bit(&mut self, bit: usize, value: bool) {
        let mask = 1 << (31 - bit);
        if value {
            self.cr |= mask;
        } else {
            self.cr &= !mask;
        }
    }

    /// Record a signed comparison of `value` against zero in CR0
    pub fn update_cr0(&mut self, value: u32) {
        let value = value as i32;
        let c = if value < 0 {
            0b1000
        } else if value > 0 {
            0b0100
        } else {
            0b0010
        };
        self.set_cr_field(0, c | self.xer_so() as u32);
    }

    /// Copy FPSCR[FX, FEX, VX, OX] into CR1
    pub fn update_cr1(&mut self) {
        self.set_cr_field(1, self.fpscr >> 28);
    }

    #[inline]
    pub fn xer_so(&self) -> bool {
        self.xer & XER_SO != 0
    }

    #[inline]
    pub fn xer_ov(&self) -> bool {
        self.xer & XER_OV != 0
    }

    #[inline]
    pub fn xer_ca(&self) -> bool {
        self.xer & XER_CA != 0
    }

    #[inline]
    pub fn set_xer_ca(&mut self, value: bool) {
        if value {
            self.xer |= XER_CA;
        } else {
            self.xer &= !XER_CA;
        }
    }

    /// Set or clear OV; a set OV also sets the sticky SO
    #[inline]
    pub fn set_xer_ov(&mut self, value: bool) {
        if value {
            self.xer |= XER_OV | XER_SO;
        } else {
            self.xer &= !XER_OV;
        }
    }

    /// String instruction byte count
    #[inline]
    pub fn xer_byte_count(&self) -> u32 {
        self.xer & XER_BYTE_COUNT
    }

    pub fn msr_flags(&self) -> Msr {
        Msr::from_bits_retain(self.msr)
    }

    pub fn fpscr_flags(&self) -> Fpscr {
        Fpscr::from_bits_retain(self.fpscr)
    }

    pub fn set_fpscr_flags(&mut self, flags: Fpscr) {
        self.fpscr = flags.bits();
    }

    /// Read an SPR by number; SPRs never written read as 0
    pub fn read_spr(&self, id: u16) -> u32 {
        match id {
            spr::XER => self.xer,
            spr::LR => self.lr,
            spr::CTR => self.ctr,
            spr::SRR0 => self.srr0,
            spr::SRR1 => self.srr1,
            spr::TBL | spr::TBL_WRITE => self.tb as u32,
            spr::TBU | spr::TBU_WRITE => (self.tb >> 32) as u32,
            _ => self.spr.get(&id).copied().unwrap_or(0),
        }
    }

    /// Write an SPR by number
    ///
    /// Read-only SPRs are filtered out by the caller; this only routes the
    /// value to the dedicated field or the sparse map.
    pub fn write_spr(&mut self, id: u16, value: u32) {
        match id {
            spr::XER => self.xer = value,
            spr::LR => self.lr = value,
            spr::CTR => self.ctr = value,
            spr::SRR0 => self.srr0 = value,
            spr::SRR1 => self.srr1 = value,
            _ => {
                self.spr.insert(id, value);
            }
        }
    }

    /// Count one executed instruction on the time base
    #[inline]
    pub fn tick(&mut self) {
        self.tb = self.tb.wrapping_add(1);
    }
}
