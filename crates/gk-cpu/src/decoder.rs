//! Gekko instruction decoder
//!
//! [`Instruction`] wraps a raw 32-bit word and exposes every bit field by name.
//! Field positions use the big-endian PowerPC numbering where bit 0 is the most
//! significant bit. Extraction is total: any word decodes, and whether the
//! opcode is meaningful is decided later by the opcode tables below.

use std::fmt;

/// Raw instruction word with named field accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Wrap a raw instruction word
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw word
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    const fn field(self, shift: u32, mask: u32) -> u32 {
        (self.0 >> shift) & mask
    }

    /// Primary opcode (bits 0-5)
    #[inline]
    pub const fn opcd(self) -> u8 {
        self.field(26, 0x3F) as u8
    }

    /// Destination GPR (bits 6-10)
    #[inline]
    pub const fn rd(self) -> usize {
        self.field(21, 0x1F) as usize
    }

    /// Source GPR (bits 6-10)
    #[inline]
    pub const fn rs(self) -> usize {
        self.rd()
    }

    /// GPR A (bits 11-15)
    #[inline]
    pub const fn ra(self) -> usize {
        self.field(16, 0x1F) as usize
    }

    /// GPR B (bits 16-20)
    #[inline]
    pub const fn rb(self) -> usize {
        self.field(11, 0x1F) as usize
    }

    /// Destination/source FPR (bits 6-10)
    #[inline]
    pub const fn fd(self) -> usize {
        self.rd()
    }

    /// FPR A (bits 11-15)
    #[inline]
    pub const fn fa(self) -> usize {
        self.ra()
    }

    /// FPR B (bits 16-20)
    #[inline]
    pub const fn fb(self) -> usize {
        self.rb()
    }

    /// FPR C (bits 21-25)
    #[inline]
    pub const fn fc(self) -> usize {
        self.field(6, 0x1F) as usize
    }

    /// Signed 16-bit immediate (bits 16-31)
    #[inline]
    pub const fn simm(self) -> i16 {
        self.0 as u16 as i16
    }

    /// Unsigned 16-bit immediate (bits 16-31)
    #[inline]
    pub const fn uimm(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Load/store displacement, sign extended (bits 16-31)
    #[inline]
    pub const fn d(self) -> i32 {
        self.simm() as i32
    }

    /// Branch target displacement of I-form branches, sign extended, in bytes
    #[inline]
    pub const fn li(self) -> i32 {
        (((self.0 & 0x03FF_FFFC) << 6) as i32) >> 6
    }

    /// Branch displacement of B-form branches, sign extended, in bytes
    #[inline]
    pub const fn bd(self) -> i32 {
        (self.0 & 0xFFFC) as u16 as i16 as i32
    }

    /// Branch options (bits 6-10)
    #[inline]
    pub const fn bo(self) -> u8 {
        self.field(21, 0x1F) as u8
    }

    /// Condition register bit tested by a branch (bits 11-15)
    #[inline]
    pub const fn bi(self) -> usize {
        self.field(16, 0x1F) as usize
    }

    /// Absolute address bit (bit 30)
    #[inline]
    pub const fn aa(self) -> bool {
        self.field(1, 1) != 0
    }

    /// Link bit (bit 31)
    #[inline]
    pub const fn lk(self) -> bool {
        self.0 & 1 != 0
    }

    /// Record bit (bit 31)
    #[inline]
    pub const fn rc(self) -> bool {
        self.0 & 1 != 0
    }

    /// Overflow enable (bit 21)
    #[inline]
    pub const fn oe(self) -> bool {
        self.field(10, 1) != 0
    }

    /// Shift amount (bits 16-20)
    #[inline]
    pub const fn sh(self) -> u32 {
        self.field(11, 0x1F)
    }

    /// Mask begin (bits 21-25)
    #[inline]
    pub const fn mb(self) -> u32 {
        self.field(6, 0x1F)
    }

    /// Mask end (bits 26-30)
    #[inline]
    pub const fn me(self) -> u32 {
        self.field(1, 0x1F)
    }

    /// Destination CR field (bits 6-8)
    #[inline]
    pub const fn crfd(self) -> usize {
        self.field(23, 0x7) as usize
    }

    /// Source CR/FPSCR field (bits 11-13)
    #[inline]
    pub const fn crfs(self) -> usize {
        self.field(18, 0x7) as usize
    }

    /// Compare length bit (bit 10)
    #[inline]
    pub const fn l(self) -> bool {
        self.field(21, 1) != 0
    }

    /// Destination CR bit (bits 6-10)
    #[inline]
    pub const fn crbd(self) -> usize {
        self.field(21, 0x1F) as usize
    }

    /// Source CR bit A (bits 11-15)
    #[inline]
    pub const fn crba(self) -> usize {
        self.field(16, 0x1F) as usize
    }

    /// Source CR bit B (bits 16-20)
    #[inline]
    pub const fn crbb(self) -> usize {
        self.field(11, 0x1F) as usize
    }

    /// CR field mask of `mtcrf` (bits 12-19)
    #[inline]
    pub const fn crm(self) -> u32 {
        self.field(12, 0xFF)
    }

    /// FPSCR field mask of `mtfsf` (bits 7-14)
    #[inline]
    pub const fn fm(self) -> u32 {
        self.field(17, 0xFF)
    }

    /// Immediate of `mtfsfi` (bits 16-19)
    #[inline]
    pub const fn imm(self) -> u32 {
        self.field(12, 0xF)
    }

    /// SPR number, with the two 5-bit halves swapped back (bits 11-20)
    #[inline]
    pub const fn spr(self) -> u16 {
        (self.field(16, 0x1F) | (self.field(11, 0x1F) << 5)) as u16
    }

    /// Time base register number (same encoding as `spr`)
    #[inline]
    pub const fn tbr(self) -> u16 {
        self.spr()
    }

    /// Byte count of `lswi`/`stswi` (bits 16-20)
    #[inline]
    pub const fn nb(self) -> u32 {
        self.field(11, 0x1F)
    }

    /// Trap condition (bits 6-10)
    #[inline]
    pub const fn to(self) -> u32 {
        self.field(21, 0x1F)
    }

    /// Segment register number (bits 12-15)
    #[inline]
    pub const fn sr(self) -> u32 {
        self.field(16, 0xF)
    }

    /// 10-bit extended opcode (bits 21-30)
    #[inline]
    pub const fn xo_10(self) -> u16 {
        self.field(1, 0x3FF) as u16
    }

    /// 9-bit extended opcode of XO-form arithmetic (bits 22-30)
    #[inline]
    pub const fn xo_9(self) -> u16 {
        self.field(1, 0x1FF) as u16
    }

    /// 5-bit extended opcode of A-form floating point (bits 26-30)
    #[inline]
    pub const fn xo_5(self) -> u16 {
        self.field(1, 0x1F) as u16
    }
}

impl From<u32> for Instruction {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// The opcode table in which a lookup happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeTable {
    /// Primary opcode (bits 0-5)
    Primary,
    /// Opcode 4: paired-single extensions
    PairedSingle,
    /// Opcode 19: branches to LR/CTR and CR logic
    ControlFlow,
    /// Opcode 31: fixed-point extended operations
    Extended,
    /// Opcode 59: single-precision arithmetic
    FloatSingle,
    /// Opcode 63: double-precision arithmetic and FPSCR moves
    FloatDouble,
}

impl OpcodeTable {
    /// Short name used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            OpcodeTable::Primary => "primary",
            OpcodeTable::PairedSingle => "paired-single",
            OpcodeTable::ControlFlow => "control-flow",
            OpcodeTable::Extended => "fixed-extended",
            OpcodeTable::FloatSingle => "float-single",
            OpcodeTable::FloatDouble => "float-double",
        }
    }
}

impl fmt::Display for OpcodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primary opcode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryOp {
    Twi,
    PairedSingle,
    Mulli,
    Subfic,
    Cmpli,
    Cmpi,
    Addic,
    AddicRc,
    Addi,
    Addis,
    Bc,
    Sc,
    B,
    ControlFlow,
    Rlwimi,
    Rlwinm,
    Rlwnm,
    Ori,
    Oris,
    Xori,
    Xoris,
    AndiRc,
    AndisRc,
    Extended,
    Lwz,
    Lwzu,
    Lbz,
    Lbzu,
    Stw,
    Stwu,
    Stb,
    Stbu,
    Lhz,
    Lhzu,
    Lha,
    Lhau,
    Sth,
    Sthu,
    Lmw,
    Stmw,
    Lfs,
    Lfsu,
    Lfd,
    Lfdu,
    Stfs,
    Stfsu,
    Stfd,
    Stfdu,
    PsqL,
    PsqLu,
    FloatSingle,
    PsqSt,
    PsqStu,
    FloatDouble,
    Unknown(u8),
}

impl PrimaryOp {
    /// Look up the primary opcode of `inst`
    pub const fn decode(inst: Instruction) -> Self {
        match inst.opcd() {
            3 => PrimaryOp::Twi,
            4 => PrimaryOp::PairedSingle,
            7 => PrimaryOp::Mulli,
            8 => PrimaryOp::Subfic,
            10 => PrimaryOp::Cmpli,
            11 => PrimaryOp::Cmpi,
            12 => PrimaryOp::Addic,
            13 => PrimaryOp::AddicRc,
            14 => PrimaryOp::Addi,
            15 => PrimaryOp::Addis,
            16 => PrimaryOp::Bc,
            17 => PrimaryOp::Sc,
            18 => PrimaryOp::B,
            19 => PrimaryOp::ControlFlow,
            20 => PrimaryOp::Rlwimi,
            21 => PrimaryOp::Rlwinm,
            23 => PrimaryOp::Rlwnm,
            24 => PrimaryOp::Ori,
            25 => PrimaryOp::Oris,
            26 => PrimaryOp::Xori,
            27 => PrimaryOp::Xoris,
            28 => PrimaryOp::AndiRc,
            29 => PrimaryOp::AndisRc,
            31 => PrimaryOp::Extended,
            32 => PrimaryOp::Lwz,
            33 => PrimaryOp::Lwzu,
            34 => PrimaryOp::Lbz,
            35 => PrimaryOp::Lbzu,
            36 => PrimaryOp::Stw,
            37 => PrimaryOp::Stwu,
            38 => PrimaryOp::Stb,
            39 => PrimaryOp::Stbu,
            40 => PrimaryOp::Lhz,
            41 => PrimaryOp::Lhzu,
            42 => PrimaryOp::Lha,
            43 => PrimaryOp::Lhau,
            44 => PrimaryOp::Sth,
            45 => PrimaryOp::Sthu,
            46 => PrimaryOp::Lmw,
            47 => PrimaryOp::Stmw,
            48 => PrimaryOp::Lfs,
            49 => PrimaryOp::Lfsu,
            50 => PrimaryOp::Lfd,
            51 => PrimaryOp::Lfdu,
            52 => PrimaryOp::Stfs,
            53 => PrimaryOp::Stfsu,
            54 => PrimaryOp::Stfd,
            55 => PrimaryOp::Stfdu,
            56 => PrimaryOp::PsqL,
            57 => PrimaryOp::PsqLu,
            59 => PrimaryOp::FloatSingle,
            60 => PrimaryOp::PsqSt,
            61 => PrimaryOp::PsqStu,
            63 => PrimaryOp::FloatDouble,
            op => PrimaryOp::Unknown(op),
        }
    }

    /// Assembler mnemonic (table entries report the table they select)
    pub const fn mnemonic(self) -> &'static str {
        match self {
            PrimaryOp::Twi => "twi",
            PrimaryOp::PairedSingle => "ps",
            PrimaryOp::Mulli => "mulli",
            PrimaryOp::Subfic => "subfic",
            PrimaryOp::Cmpli => "cmpli",
            PrimaryOp::Cmpi => "cmpi",
            PrimaryOp::Addic => "addic",
            PrimaryOp::AddicRc => "addic.",
            PrimaryOp::Addi => "addi",
            PrimaryOp::Addis => "addis",
            PrimaryOp::Bc => "bc",
            PrimaryOp::Sc => "sc",
            PrimaryOp::B => "b",
            PrimaryOp::ControlFlow => "table19",
            PrimaryOp::Rlwimi => "rlwimi",
            PrimaryOp::Rlwinm => "rlwinm",
            PrimaryOp::Rlwnm => "rlwnm",
            PrimaryOp::Ori => "ori",
            PrimaryOp::Oris => "oris",
            PrimaryOp::Xori => "xori",
            PrimaryOp::Xoris => "xoris",
            PrimaryOp::AndiRc => "andi.",
            PrimaryOp::AndisRc => "andis.",
            PrimaryOp::Extended => "table31",
            PrimaryOp::Lwz => "lwz",
            PrimaryOp::Lwzu => "lwzu",
            PrimaryOp::Lbz => "lbz",
            PrimaryOp::Lbzu => "lbzu",
            PrimaryOp::Stw => "stw",
            PrimaryOp::Stwu => "stwu",
            PrimaryOp::Stb => "stb",
            PrimaryOp::Stbu => "stbu",
            PrimaryOp::Lhz => "lhz",
            PrimaryOp::Lhzu => "lhzu",
            PrimaryOp::Lha => "lha",
            PrimaryOp::Lhau => "lhau",
            PrimaryOp::Sth => "sth",
            PrimaryOp::Sthu => "sthu",
            PrimaryOp::Lmw => "lmw",
            PrimaryOp::Stmw => "stmw",
            PrimaryOp::Lfs => "lfs",
            PrimaryOp::Lfsu => "lfsu",
            PrimaryOp::Lfd => "lfd",
            PrimaryOp::Lfdu => "lfdu",
            PrimaryOp::Stfs => "stfs",
            PrimaryOp::Stfsu => "stfsu",
            PrimaryOp::Stfd => "stfd",
            PrimaryOp::Stfdu => "stfdu",
            PrimaryOp::PsqL => "psq_l",
            PrimaryOp::PsqLu => "psq_lu",
            PrimaryOp::FloatSingle => "table59",
            PrimaryOp::PsqSt => "psq_st",
            PrimaryOp::PsqStu => "psq_stu",
            PrimaryOp::FloatDouble => "table63",
            PrimaryOp::Unknown(_) => "unknown",
        }
    }
}

/// Opcode 19 table, keyed by the 10-bit extended opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlowOp {
    Mcrf,
    Bclr,
    Crnor,
    Rfi,
    Crandc,
    Isync,
    Crxor,
    Crnand,
    Crand,
    Creqv,
    Crorc,
    Cror,
    Bcctr,
    Unknown(u16),
}

impl ControlFlowOp {
    pub const fn decode(inst: Instruction) -> Self {
        match inst.xo_10() {
            0 => ControlFlowOp::Mcrf,
            16 => ControlFlowOp::Bclr,
            33 => ControlFlowOp::Crnor,
            50 => ControlFlowOp::Rfi,
            129 => ControlFlowOp::Crandc,
            150 => ControlFlowOp::Isync,
            193 => ControlFlowOp::Crxor,
            225 => ControlFlowOp::Crnand,
            257 => ControlFlowOp::Crand,
            289 => ControlFlowOp::Creqv,
            417 => ControlFlowOp::Crorc,
            449 => ControlFlowOp::Cror,
            528 => ControlFlowOp::Bcctr,
            xo => ControlFlowOp::Unknown(xo),
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ControlFlowOp::Mcrf => "mcrf",
            ControlFlowOp::Bclr => "bclr",
            ControlFlowOp::Crnor => "crnor",
            ControlFlowOp::Rfi => "rfi",
            ControlFlowOp::Crandc => "crandc",
            ControlFlowOp::Isync => "isync",
            ControlFlowOp::Crxor => "crxor",
            ControlFlowOp::Crnand => "crnand",
            ControlFlowOp::Crand => "crand",
            ControlFlowOp::Creqv => "creqv",
            ControlFlowOp::Crorc => "crorc",
            ControlFlowOp::Cror => "cror",
            ControlFlowOp::Bcctr => "bcctr",
            ControlFlowOp::Unknown(_) => "unknown",
        }
    }
}

/// Opcode 31 table
///
/// XO-form arithmetic is keyed by the 9-bit opcode so that the OE bit does not
/// select a different entry; everything else uses the 10-bit opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedOp {
    // XO-form arithmetic
    Subfc,
    Addc,
    Mulhwu,
    Subf,
    Mulhw,
    Neg,
    Subfe,
    Adde,
    Subfze,
    Addze,
    Subfme,
    Addme,
    Mullw,
    Add,
    Divwu,
    Divw,
    // Compare, trap, logic, shifts
    Cmp,
    Tw,
    Cmpl,
    Slw,
    Cntlzw,
    And,
    Andc,
    Nor,
    Eqv,
    Xor,
    Orc,
    Or,
    Nand,
    Srw,
    Sraw,
    Srawi,
    Extsh,
    Extsb,
    // Loads and stores
    Lwarx,
    Lwzx,
    Lwzux,
    Lbzx,
    Lbzux,
    Stwcx,
    Stwx,
    Stwux,
    Stbx,
    Stbux,
    Lhzx,
    Lhzux,
    Lhax,
    Lhaux,
    Sthx,
    Sthux,
    Lswx,
    Lwbrx,
    Lswi,
    Stswx,
    Stwbrx,
    Stswi,
    Lhbrx,
    Sthbrx,
    Eciwx,
    Ecowx,
    Lfsx,
    Lfsux,
    Lfdx,
    Lfdux,
    Stfsx,
    Stfsux,
    Stfdx,
    Stfdux,
    Stfiwx,
    // Register moves
    Mfcr,
    Mfmsr,
    Mtcrf,
    Mtmsr,
    Mtsr,
    Mtsrin,
    Mfspr,
    Mftb,
    Mtspr,
    Mcrxr,
    Mfsr,
    Mfsrin,
    // Cache and synchronization
    Dcbst,
    Dcbf,
    Dcbtst,
    Dcbt,
    Dcbi,
    Dcba,
    Dcbz,
    Icbi,
    Sync,
    Eieio,
    Tlbie,
    Tlbsync,
    Unknown(u16),
}

impl ExtendedOp {
    pub const fn decode(inst: Instruction) -> Self {
        match inst.xo_9() {
            8 => return ExtendedOp::Subfc,
            10 => return ExtendedOp::Addc,
            11 => return ExtendedOp::Mulhwu,
            40 => return ExtendedOp::Subf,
            75 => return ExtendedOp::Mulhw,
            104 => return ExtendedOp::Neg,
            136 => return ExtendedOp::Subfe,
            138 => return ExtendedOp::Adde,
            200 => return ExtendedOp::Subfze,
            202 => return ExtendedOp::Addze,
            232 => return ExtendedOp::Subfme,
            234 => return ExtendedOp::Addme,
            235 => return ExtendedOp::Mullw,
            266 => return ExtendedOp::Add,
            459 => return ExtendedOp::Divwu,
            491 => return ExtendedOp::Divw,
            _ => {}
        }

        match inst.xo_10() {
            0 => ExtendedOp::Cmp,
            4 => ExtendedOp::Tw,
            19 => ExtendedOp::Mfcr,
            20 => ExtendedOp::Lwarx,
            23 => ExtendedOp::Lwzx,
            24 => ExtendedOp::Slw,
            26 => ExtendedOp::Cntlzw,
            28 => ExtendedOp::And,
            32 => ExtendedOp::Cmpl,
            54 => ExtendedOp::Dcbst,
            55 => ExtendedOp::Lwzux,
            60 => ExtendedOp::Andc,
            83 => ExtendedOp::Mfmsr,
            86 => ExtendedOp::Dcbf,
            87 => ExtendedOp::Lbzx,
            119 => ExtendedOp::Lbzux,
            124 => ExtendedOp::Nor,
            144 => ExtendedOp::Mtcrf,
            146 => ExtendedOp::Mtmsr,
            150 => ExtendedOp::Stwcx,
            151 => ExtendedOp::Stwx,
            183 => ExtendedOp::Stwux,
            210 => ExtendedOp::Mtsr,
            215 => ExtendedOp::Stbx,
            242 => ExtendedOp::Mtsrin,
            246 => ExtendedOp::Dcbtst,
            247 => ExtendedOp::Stbux,
            278 => ExtendedOp::Dcbt,
            279 => ExtendedOp::Lhzx,
            284 => ExtendedOp::Eqv,
            306 => ExtendedOp::Tlbie,
            310 => ExtendedOp::Eciwx,
            311 => ExtendedOp::Lhzux,
            316 => ExtendedOp::Xor,
            339 => ExtendedOp::Mfspr,
            343 => ExtendedOp::Lhax,
            371 => ExtendedOp::Mftb,
            375 => ExtendedOp::Lhaux,
            407 => ExtendedOp::Sthx,
            412 => ExtendedOp::Orc,
            438 => ExtendedOp::Ecowx,
            439 => ExtendedOp::Sthux,
            444 => ExtendedOp::Or,
            467 => ExtendedOp::Mtspr,
            470 => ExtendedOp::Dcbi,
            476 => ExtendedOp::Nand,
            512 => ExtendedOp::Mcrxr,
            533 => ExtendedOp::Lswx,
            534 => ExtendedOp::Lwbrx,
            535 => ExtendedOp::Lfsx,
            536 => ExtendedOp::Srw,
            566 => ExtendedOp::Tlbsync,
            567 => ExtendedOp::Lfsux,
            595 => ExtendedOp::Mfsr,
            597 => ExtendedOp::Lswi,
            598 => ExtendedOp::Sync,
            599 => ExtendedOp::Lfdx,
            631 => ExtendedOp::Lfdux,
            659 => ExtendedOp::Mfsrin,
            661 => ExtendedOp::Stswx,
            662 => ExtendedOp::Stwbrx,
            663 => ExtendedOp::Stfsx,
            695 => ExtendedOp::Stfsux,
            725 => ExtendedOp::Stswi,
            727 => ExtendedOp::Stfdx,
            758 => ExtendedOp::Dcba,
            759 => ExtendedOp::Stfdux,
            790 => ExtendedOp::Lhbrx,
            792 => ExtendedOp::Sraw,
            824 => ExtendedOp::Srawi,
            854 => ExtendedOp::Eieio,
            918 => ExtendedOp::Sthbrx,
            922 => ExtendedOp::Extsh,
            954 => ExtendedOp::Extsb,
            982 => ExtendedOp::Icbi,
            983 => ExtendedOp::Stfiwx,
            1014 => ExtendedOp::Dcbz,
            xo => ExtendedOp::Unknown(xo),
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ExtendedOp::Subfc => "subfc",
            ExtendedOp::Addc => "addc",
            ExtendedOp::Mulhwu => "mulhwu",
            ExtendedOp::Subf => "subf",
            ExtendedOp::Mulhw => "mulhw",
            ExtendedOp::Neg => "neg",
            ExtendedOp::Subfe => "subfe",
            ExtendedOp::Adde => "adde",
            ExtendedOp::Subfze => "subfze",
            ExtendedOp::Addze => "addze",
            ExtendedOp::Subfme => "subfme",
            ExtendedOp::Addme => "addme",
            ExtendedOp::Mullw => "mullw",
            ExtendedOp::Add => "add",
            ExtendedOp::Divwu => "divwu",
            ExtendedOp::Divw => "divw",
            ExtendedOp::Cmp => "cmp",
            ExtendedOp::Tw => "tw",
            ExtendedOp::Cmpl => "cmpl",
            ExtendedOp::Slw => "slw",
            ExtendedOp::Cntlzw => "cntlzw",
            ExtendedOp::And => "and",
            ExtendedOp::Andc => "andc",
            ExtendedOp::Nor => "nor",
            ExtendedOp::Eqv => "eqv",
            ExtendedOp::Xor => "xor",
            ExtendedOp::Orc => "orc",
            ExtendedOp::Or => "or",
            ExtendedOp::Nand => "nand",
            ExtendedOp::Srw => "srw",
            ExtendedOp::Sraw => "sraw",
            ExtendedOp::Srawi => "srawi",
            ExtendedOp::Extsh => "extsh",
            ExtendedOp::Extsb => "extsb",
            ExtendedOp::Lwarx => "lwarx",
            ExtendedOp::Lwzx => "lwzx",
            ExtendedOp::Lwzux => "lwzux",
            ExtendedOp::Lbzx => "lbzx",
            ExtendedOp::Lbzux => "lbzux",
            ExtendedOp::Stwcx => "stwcx.",
            ExtendedOp::Stwx => "stwx",
            ExtendedOp::Stwux => "stwux",
            ExtendedOp::Stbx => "stbx",
            ExtendedOp::Stbux => "stbux",
            ExtendedOp::Lhzx => "lhzx",
            ExtendedOp::Lhzux => "lhzux",
            ExtendedOp::Lhax => "lhax",
            ExtendedOp::Lhaux => "lhaux",
            ExtendedOp::Sthx => "sthx",
            ExtendedOp::Sthux => "sthux",
            ExtendedOp::Lswx => "lswx",
            ExtendedOp::Lwbrx => "lwbrx",
            ExtendedOp::Lswi => "lswi",
            ExtendedOp::Stswx => "stswx",
            ExtendedOp::Stwbrx => "stwbrx",
            ExtendedOp::Stswi => "stswi",
            ExtendedOp::Lhbrx => "lhbrx",
            ExtendedOp::Sthbrx => "sthbrx",
            ExtendedOp::Eciwx => "eciwx",
            ExtendedOp::Ecowx => "ecowx",
            ExtendedOp::Lfsx => "lfsx",
            ExtendedOp::Lfsux => "lfsux",
            ExtendedOp::Lfdx => "lfdx",
            ExtendedOp::Lfdux => "lfdux",
            ExtendedOp::Stfsx => "stfsx",
            ExtendedOp::Stfsux => "stfsux",
            ExtendedOp::Stfdx => "stfdx",
            ExtendedOp::Stfdux => "stfdux",
            ExtendedOp::Stfiwx => "stfiwx",
            ExtendedOp::Mfcr => "mfcr",
            ExtendedOp::Mfmsr => "mfmsr",
            ExtendedOp::Mtcrf => "mtcrf",
            ExtendedOp::Mtmsr => "mtmsr",
            ExtendedOp::Mtsr => "mtsr",
            ExtendedOp::Mtsrin => "mtsrin",
            ExtendedOp::Mfspr => "mfspr",
            ExtendedOp::Mftb => "mftb",
            ExtendedOp::Mtspr => "mtspr",
            ExtendedOp::Mcrxr => "mcrxr",
            ExtendedOp::Mfsr => "mfsr",
            ExtendedOp::Mfsrin => "mfsrin",
            ExtendedOp::Dcbst => "dcbst",
            ExtendedOp::Dcbf => "dcbf",
            ExtendedOp::Dcbtst => "dcbtst",
            ExtendedOp::Dcbt => "dcbt",
            ExtendedOp::Dcbi => "dcbi",
            ExtendedOp::Dcba => "dcba",
            ExtendedOp::Dcbz => "dcbz",
            ExtendedOp::Icbi => "icbi",
            ExtendedOp::Sync => "sync",
            ExtendedOp::Eieio => "eieio",
            ExtendedOp::Tlbie => "tlbie",
            ExtendedOp::Tlbsync => "tlbsync",
            ExtendedOp::Unknown(_) => "unknown",
        }
    }

    /// True for the XO-form entries that honor the OE bit
    pub const fn has_overflow_enable(self) -> bool {
        matches!(
            self,
            ExtendedOp::Subfc
                | ExtendedOp::Addc
                | ExtendedOp::Subf
                | ExtendedOp::Neg
                | ExtendedOp::Subfe
                | ExtendedOp::Adde
                | ExtendedOp::Subfze
                | ExtendedOp::Addze
                | ExtendedOp::Subfme
                | ExtendedOp::Addme
                | ExtendedOp::Mullw
                | ExtendedOp::Add
                | ExtendedOp::Divwu
                | ExtendedOp::Divw
        )
    }
}

/// Opcode 59 table, keyed by the 5-bit extended opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatSingleOp {
    Fdivs,
    Fsubs,
    Fadds,
    Fres,
    Fmuls,
    Fmsubs,
    Fmadds,
    Fnmsubs,
    Fnmadds,
    Unknown(u16),
}

impl FloatSingleOp {
    pub const fn decode(inst: Instruction) -> Self {
        match inst.xo_5() {
            18 => FloatSingleOp::Fdivs,
            20 => FloatSingleOp::Fsubs,
            21 => FloatSingleOp::Fadds,
            24 => FloatSingleOp::Fres,
            25 => FloatSingleOp::Fmuls,
            28 => FloatSingleOp::Fmsubs,
            29 => FloatSingleOp::Fmadds,
            30 => FloatSingleOp::Fnmsubs,
            31 => FloatSingleOp::Fnmadds,
            xo => FloatSingleOp::Unknown(xo),
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            FloatSingleOp::Fdivs => "fdivs",
            FloatSingleOp::Fsubs => "fsubs",
            FloatSingleOp::Fadds => "fadds",
            FloatSingleOp::Fres => "fres",
            FloatSingleOp::Fmuls => "fmuls",
            FloatSingleOp::Fmsubs => "fmsubs",
            FloatSingleOp::Fmadds => "fmadds",
            FloatSingleOp::Fnmsubs => "fnmsubs",
            FloatSingleOp::Fnmadds => "fnmadds",
            FloatSingleOp::Unknown(_) => "unknown",
        }
    }
}

/// Opcode 63 table
///
/// A-form entries set bit 4 of the 10-bit opcode and are keyed by the 5-bit
/// opcode; X-form entries are keyed by the full 10-bit opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatDoubleOp {
    // A-form
    Fdiv,
    Fsub,
    Fadd,
    Fsel,
    Fmul,
    Frsqrte,
    Fmsub,
    Fmadd,
    Fnmsub,
    Fnmadd,
    // X-form
    Fcmpu,
    Frsp,
    Fctiw,
    Fctiwz,
    Fcmpo,
    Mtfsb1,
    Fneg,
    Mcrfs,
    Mtfsb0,
    Fmr,
    Mtfsfi,
    Fnabs,
    Fabs,
    Mffs,
    Mtfsf,
    Unknown(u16),
}

impl FloatDoubleOp {
    pub const fn decode(inst: Instruction) -> Self {
        if inst.xo_10() & 0x10 != 0 {
            return match inst.xo_5() {
                18 => FloatDoubleOp::Fdiv,
                20 => FloatDoubleOp::Fsub,
                21 => FloatDoubleOp::Fadd,
                23 => FloatDoubleOp::Fsel,
                25 => FloatDoubleOp::Fmul,
                26 => FloatDoubleOp::Frsqrte,
                28 => FloatDoubleOp::Fmsub,
                29 => FloatDoubleOp::Fmadd,
                30 => FloatDoubleOp::Fnmsub,
                31 => FloatDoubleOp::Fnmadd,
                xo => FloatDoubleOp::Unknown(xo),
            };
        }

        match inst.xo_10() {
            0 => FloatDoubleOp::Fcmpu,
            12 => FloatDoubleOp::Frsp,
            14 => FloatDoubleOp::Fctiw,
            15 => FloatDoubleOp::Fctiwz,
            32 => FloatDoubleOp::Fcmpo,
            38 => FloatDoubleOp::Mtfsb1,
            40 => FloatDoubleOp::Fneg,
            64 => FloatDoubleOp::Mcrfs,
            70 => FloatDoubleOp::Mtfsb0,
            72 => FloatDoubleOp::Fmr,
            134 => FloatDoubleOp::Mtfsfi,
            136 => FloatDoubleOp::Fnabs,
            264 => FloatDoubleOp::Fabs,
            583 => FloatDoubleOp::Mffs,
            711 => FloatDoubleOp::Mtfsf,
            xo => FloatDoubleOp::Unknown(xo),
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            FloatDoubleOp::Fdiv => "fdiv",
            FloatDoubleOp::Fsub => "fsub",
            FloatDoubleOp::Fadd => "fadd",
            FloatDoubleOp::Fsel => "fsel",
            FloatDoubleOp::Fmul => "fmul",
            FloatDoubleOp::Frsqrte => "frsqrte",
            FloatDoubleOp::Fmsub => "fmsub",
            FloatDoubleOp::Fmadd => "fmadd",
            FloatDoubleOp::Fnmsub => "fnmsub",
            FloatDoubleOp::Fnmadd => "fnmadd",
            FloatDoubleOp::Fcmpu => "fcmpu",
            FloatDoubleOp::Frsp => "frsp",
            FloatDoubleOp::Fctiw => "fctiw",
            FloatDoubleOp::Fctiwz => "fctiwz",
            FloatDoubleOp::Fcmpo => "fcmpo",
            FloatDoubleOp::Mtfsb1 => "mtfsb1",
            FloatDoubleOp::Fneg => "fneg",
            FloatDoubleOp::Mcrfs => "mcrfs",
            FloatDoubleOp::Mtfsb0 => "mtfsb0",
            FloatDoubleOp::Fmr => "fmr",
            FloatDoubleOp::Mtfsfi => "mtfsfi",
            FloatDoubleOp::Fnabs => "fnabs",
            FloatDoubleOp::Fabs => "fabs",
            FloatDoubleOp::Mffs => "mffs",
            FloatDoubleOp::Mtfsf => "mtfsf",
            FloatDoubleOp::Unknown(_) => "unknown",
        }
    }
}

/// Opcode 4 table (paired singles)
///
/// Every entry is recognized for diagnostics only; none of them executes.
/// Exact 10-bit matches take precedence over the 6-bit indexed forms, which
/// take precedence over the 5-bit arithmetic forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairedSingleOp {
    Named(&'static str),
    Unknown(u16),
}

impl PairedSingleOp {
    pub const fn decode(inst: Instruction) -> Self {
        let name = match inst.xo_10() {
            0 => "ps_cmpu0",
            32 => "ps_cmpo0",
            40 => "ps_neg",
            64 => "ps_cmpu1",
            72 => "ps_mr",
            96 => "ps_cmpo1",
            136 => "ps_nabs",
            264 => "ps_abs",
            528 => "ps_merge00",
            560 => "ps_merge01",
            592 => "ps_merge10",
            624 => "ps_merge11",
            1014 => "dcbz_l",
            xo => match xo & 0x3F {
                6 => "psq_lx",
                7 => "psq_stx",
                38 => "psq_lux",
                39 => "psq_stux",
                _ => match inst.xo_5() {
                    10 => "ps_sum0",
                    11 => "ps_sum1",
                    12 => "ps_muls0",
                    13 => "ps_muls1",
                    14 => "ps_madds0",
                    15 => "ps_madds1",
                    18 => "ps_div",
                    20 => "ps_sub",
                    21 => "ps_add",
                    23 => "ps_sel",
                    24 => "ps_res",
                    25 => "ps_mul",
                    26 => "ps_rsqrte",
                    28 => "ps_msub",
                    29 => "ps_madd",
                    30 => "ps_nmsub",
                    31 => "ps_nmadd",
                    _ => return PairedSingleOp::Unknown(xo),
                },
            },
        };
        PairedSingleOp::Named(name)
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            PairedSingleOp::Named(name) => name,
            PairedSingleOp::Unknown(_) => "unknown",
        }
    }
}

/// Mnemonic of `inst` and the deepest opcode table consulted to find it
///
/// Secondary tables report their own name, so an unknown sub-opcode of
/// opcode 31 comes back as `(Extended, "unknown")`.
pub fn lookup(inst: Instruction) -> (OpcodeTable, &'static str) {
    match PrimaryOp::decode(inst) {
        PrimaryOp::PairedSingle => (OpcodeTable::PairedSingle, PairedSingleOp::decode(inst).mnemonic()),
        PrimaryOp::ControlFlow => (OpcodeTable::ControlFlow, ControlFlowOp::decode(inst).mnemonic()),
        PrimaryOp::Extended => (OpcodeTable::Extended, ExtendedOp::decode(inst).mnemonic()),
        PrimaryOp::FloatSingle => (OpcodeTable::FloatSingle, FloatSingleOp::decode(inst).mnemonic()),
        PrimaryOp::FloatDouble => (OpcodeTable::FloatDouble, FloatDoubleOp::decode(inst).mnemonic()),
        op => (OpcodeTable::Primary, op.mnemonic()),
    }
}
