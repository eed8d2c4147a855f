//! Disassembler for Gekko instructions
//!
//! Mnemonics come from the interpreter's opcode tables so the text shown in
//! traces always agrees with what the dispatcher would execute. Operands are
//! formatted per instruction form, with the usual simplified mnemonics
//! (`li`, `lis`, `mr`, `nop`, `blr`, `bctr`, `mflr` ...).

use std::fmt;

use gk_core::error::MemoryError;
use gk_cpu::decoder::{
    self, ControlFlowOp, ExtendedOp, FloatDoubleOp, FloatSingleOp, Instruction, OpcodeTable, PrimaryOp,
};
use gk_cpu::registers::spr;
use gk_memory::MemoryPort;

/// Disassembled instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledInstruction {
    /// Address of the instruction
    pub address: u32,
    /// Raw instruction word
    pub opcode: u32,
    /// Opcode table the mnemonic was found in
    pub table: OpcodeTable,
    /// Mnemonic, including `o`/`.`/`l`/`a` suffixes
    pub mnemonic: String,
    /// Operands as a string
    pub operands: String,
    /// Comment (if any)
    pub comment: Option<String>,
}

impl DisassembledInstruction {
    /// Get opcode as hex string
    pub fn opcode_hex(&self) -> String {
        format!("{:08X}", self.opcode)
    }

    /// Whether the word matched no opcode table entry
    pub fn is_unknown(&self) -> bool {
        self.mnemonic == UNKNOWN_MNEMONIC
    }
}

impl fmt::Display for DisassembledInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.mnemonic)?;
        } else {
            write!(f, "{:8} {}", self.mnemonic, self.operands)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "  ; {}", comment)?;
        }
        Ok(())
    }
}

const UNKNOWN_MNEMONIC: &str = "???";

/// Mnemonic and operand text before suffixes are settled
struct Text {
    mnemonic: String,
    operands: String,
    comment: Option<String>,
}

impl Text {
    fn new(mnemonic: &str, operands: String) -> Self {
        Self {
            mnemonic: mnemonic.to_string(),
            operands,
            comment: None,
        }
    }

    fn bare(mnemonic: &str) -> Self {
        Self::new(mnemonic, String::new())
    }

    /// Append `.` when the record bit is set
    fn record(mut self, inst: Instruction) -> Self {
        if inst.rc() {
            self.mnemonic.push('.');
        }
        self
    }

    fn with_comment(mut self, comment: String) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// Gekko instruction disassembler
pub struct GekkoDisassembler;

impl GekkoDisassembler {
    /// Disassemble a single instruction word located at `address`
    pub fn disassemble(address: u32, opcode: u32) -> DisassembledInstruction {
        let inst = Instruction(opcode);
        let (table, mnemonic) = decoder::lookup(inst);

        let text = if mnemonic == "unknown" {
            Text::new(UNKNOWN_MNEMONIC, format!("0x{:08X}", opcode))
                .with_comment(format!("unknown {} opcode", table))
        } else {
            match PrimaryOp::decode(inst) {
                PrimaryOp::PairedSingle => {
                    Text::bare(mnemonic).with_comment("paired single, not executed".to_string())
                }
                PrimaryOp::ControlFlow => Self::control_flow(inst),
                PrimaryOp::Extended => Self::extended(inst),
                PrimaryOp::FloatSingle => Self::float_single(inst),
                PrimaryOp::FloatDouble => Self::float_double(inst),
                op => Self::primary(address, inst, op),
            }
        };

        DisassembledInstruction {
            address,
            opcode,
            table,
            mnemonic: text.mnemonic,
            operands: text.operands,
            comment: text.comment,
        }
    }

    /// Disassemble consecutive big-endian words from a byte slice
    pub fn disassemble_range(memory: &[u8], base_address: u32, count: usize) -> Vec<DisassembledInstruction> {
        memory
            .chunks_exact(4)
            .take(count)
            .enumerate()
            .map(|(i, bytes)| {
                let opcode = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                Self::disassemble(base_address.wrapping_add(4 * i as u32), opcode)
            })
            .collect()
    }

    /// Disassemble `count` words read through a memory port
    pub fn disassemble_port<P: MemoryPort + ?Sized>(
        port: &P,
        address: u32,
        count: usize,
    ) -> Result<Vec<DisassembledInstruction>, MemoryError> {
        (0..count as u32)
            .map(|i| {
                let addr = address.wrapping_add(4 * i);
                port.read_u32(addr).map(|word| Self::disassemble(addr, word))
            })
            .collect()
    }

    fn primary(address: u32, inst: Instruction, op: PrimaryOp) -> Text {
        let (rd, ra) = (inst.rd(), inst.ra());
        let mnemonic = op.mnemonic();

        match op {
            PrimaryOp::Twi => Text::new(mnemonic, format!("{}, r{}, {}", inst.to(), ra, inst.simm())),
            PrimaryOp::Mulli | PrimaryOp::Subfic | PrimaryOp::Addic | PrimaryOp::AddicRc => {
                Text::new(mnemonic, format!("r{}, r{}, {}", rd, ra, inst.simm()))
            }
            PrimaryOp::Cmpli => Text::new(mnemonic, format!("cr{}, r{}, 0x{:X}", inst.crfd(), ra, inst.uimm())),
            PrimaryOp::Cmpi => Text::new(mnemonic, format!("cr{}, r{}, {}", inst.crfd(), ra, inst.simm())),
            PrimaryOp::Addi if ra == 0 => Text::new("li", format!("r{}, {}", rd, inst.simm())),
            PrimaryOp::Addi => Text::new(mnemonic, format!("r{}, r{}, {}", rd, ra, inst.simm())),
            PrimaryOp::Addis if ra == 0 => Text::new("lis", format!("r{}, 0x{:X}", rd, inst.uimm())),
            PrimaryOp::Addis => Text::new(mnemonic, format!("r{}, r{}, 0x{:X}", rd, ra, inst.uimm())),
            PrimaryOp::Bc => {
                let target = if inst.aa() {
                    inst.bd() as u32
                } else {
                    address.wrapping_add(inst.bd() as u32)
                };
                Text::new(
                    &branch_suffix("bc", inst),
                    format!("{}, {}, 0x{:X}", inst.bo(), inst.bi(), target),
                )
            }
            PrimaryOp::Sc => Text::bare(mnemonic),
            PrimaryOp::B => {
                let target = if inst.aa() {
                    inst.li() as u32
                } else {
                    address.wrapping_add(inst.li() as u32)
                };
                Text::new(&branch_suffix("b", inst), format!("0x{:X}", target))
            }
            PrimaryOp::Rlwimi | PrimaryOp::Rlwinm => Text::new(
                mnemonic,
                format!("r{}, r{}, {}, {}, {}", ra, inst.rs(), inst.sh(), inst.mb(), inst.me()),
            )
            .record(inst),
            PrimaryOp::Rlwnm => Text::new(
                mnemonic,
                format!("r{}, r{}, r{}, {}, {}", ra, inst.rs(), inst.rb(), inst.mb(), inst.me()),
            )
            .record(inst),
            PrimaryOp::Ori if inst.rs() == 0 && ra == 0 && inst.uimm() == 0 => Text::bare("nop"),
            PrimaryOp::Ori
            | PrimaryOp::Oris
            | PrimaryOp::Xori
            | PrimaryOp::Xoris
            | PrimaryOp::AndiRc
            | PrimaryOp::AndisRc => Text::new(mnemonic, format!("r{}, r{}, 0x{:X}", ra, inst.rs(), inst.uimm())),
            PrimaryOp::Lwz
            | PrimaryOp::Lwzu
            | PrimaryOp::Lbz
            | PrimaryOp::Lbzu
            | PrimaryOp::Stw
            | PrimaryOp::Stwu
            | PrimaryOp::Stb
            | PrimaryOp::Stbu
            | PrimaryOp::Lhz
            | PrimaryOp::Lhzu
            | PrimaryOp::Lha
            | PrimaryOp::Lhau
            | PrimaryOp::Sth
            | PrimaryOp::Sthu
            | PrimaryOp::Lmw
            | PrimaryOp::Stmw => Text::new(mnemonic, format!("r{}, {}(r{})", rd, inst.d(), ra)),
            PrimaryOp::Lfs
            | PrimaryOp::Lfsu
            | PrimaryOp::Lfd
            | PrimaryOp::Lfdu
            | PrimaryOp::Stfs
            | PrimaryOp::Stfsu
            | PrimaryOp::Stfd
            | PrimaryOp::Stfdu => Text::new(mnemonic, format!("f{}, {}(r{})", inst.fd(), inst.d(), ra)),
            PrimaryOp::PsqL | PrimaryOp::PsqLu | PrimaryOp::PsqSt | PrimaryOp::PsqStu => {
                Text::bare(mnemonic).with_comment("quantized paired single, not executed".to_string())
            }
            // Secondary tables and unknown opcodes are handled by the caller
            PrimaryOp::PairedSingle
            | PrimaryOp::ControlFlow
            | PrimaryOp::Extended
            | PrimaryOp::FloatSingle
            | PrimaryOp::FloatDouble
            | PrimaryOp::Unknown(_) => Text::bare(mnemonic),
        }
    }

    fn control_flow(inst: Instruction) -> Text {
        let op = ControlFlowOp::decode(inst);
        match op {
            ControlFlowOp::Mcrf => Text::new(op.mnemonic(), format!("cr{}, cr{}", inst.crfd(), inst.crfs())),
            ControlFlowOp::Bclr | ControlFlowOp::Bcctr => {
                let short = if op == ControlFlowOp::Bclr { "blr" } else { "bctr" };
                if inst.bo() == 0b10100 {
                    let mnemonic = if inst.lk() { format!("{}l", short) } else { short.to_string() };
                    Text::bare(&mnemonic)
                } else {
                    let mnemonic = if inst.lk() {
                        format!("{}l", op.mnemonic())
                    } else {
                        op.mnemonic().to_string()
                    };
                    Text::new(&mnemonic, format!("{}, {}", inst.bo(), inst.bi()))
                }
            }
            ControlFlowOp::Crnor
            | ControlFlowOp::Crandc
            | ControlFlowOp::Crxor
            | ControlFlowOp::Crnand
            | ControlFlowOp::Crand
            | ControlFlowOp::Creqv
            | ControlFlowOp::Crorc
            | ControlFlowOp::Cror => Text::new(
                op.mnemonic(),
                format!("{}, {}, {}", inst.crbd(), inst.crba(), inst.crbb()),
            ),
            ControlFlowOp::Rfi | ControlFlowOp::Isync | ControlFlowOp::Unknown(_) => Text::bare(op.mnemonic()),
        }
    }

    fn extended(inst: Instruction) -> Text {
        let op = ExtendedOp::decode(inst);
        let (rd, ra, rb) = (inst.rd(), inst.ra(), inst.rb());
        let mnemonic = op.mnemonic();

        if op.has_overflow_enable() || matches!(op, ExtendedOp::Mulhw | ExtendedOp::Mulhwu) {
            let mut name = mnemonic.to_string();
            if op.has_overflow_enable() && inst.oe() {
                name.push('o');
            }
            let operands = match op {
                ExtendedOp::Neg
                | ExtendedOp::Addze
                | ExtendedOp::Addme
                | ExtendedOp::Subfze
                | ExtendedOp::Subfme => format!("r{}, r{}", rd, ra),
                _ => format!("r{}, r{}, r{}", rd, ra, rb),
            };
            return Text::new(&name, operands).record(inst);
        }

        match op {
            ExtendedOp::Cmp | ExtendedOp::Cmpl => {
                Text::new(mnemonic, format!("cr{}, r{}, r{}", inst.crfd(), ra, rb))
            }
            ExtendedOp::Tw => Text::new(mnemonic, format!("{}, r{}, r{}", inst.to(), ra, rb)),
            ExtendedOp::Or if inst.rs() == rb => Text::new("mr", format!("r{}, r{}", ra, inst.rs())).record(inst),
            ExtendedOp::Slw
            | ExtendedOp::And
            | ExtendedOp::Andc
            | ExtendedOp::Nor
            | ExtendedOp::Eqv
            | ExtendedOp::Xor
            | ExtendedOp::Orc
            | ExtendedOp::Or
            | ExtendedOp::Nand
            | ExtendedOp::Srw
            | ExtendedOp::Sraw => Text::new(mnemonic, format!("r{}, r{}, r{}", ra, inst.rs(), rb)).record(inst),
            ExtendedOp::Cntlzw | ExtendedOp::Extsh | ExtendedOp::Extsb => {
                Text::new(mnemonic, format!("r{}, r{}", ra, inst.rs())).record(inst)
            }
            ExtendedOp::Srawi => Text::new(mnemonic, format!("r{}, r{}, {}", ra, inst.rs(), inst.sh())).record(inst),
            ExtendedOp::Lswi | ExtendedOp::Stswi => {
                Text::new(mnemonic, format!("r{}, r{}, {}", rd, ra, inst.nb()))
            }
            ExtendedOp::Lfsx
            | ExtendedOp::Lfsux
            | ExtendedOp::Lfdx
            | ExtendedOp::Lfdux
            | ExtendedOp::Stfsx
            | ExtendedOp::Stfsux
            | ExtendedOp::Stfdx
            | ExtendedOp::Stfdux
            | ExtendedOp::Stfiwx => Text::new(mnemonic, format!("f{}, r{}, r{}", inst.fd(), ra, rb)),
            ExtendedOp::Lwarx
            | ExtendedOp::Lwzx
            | ExtendedOp::Lwzux
            | ExtendedOp::Lbzx
            | ExtendedOp::Lbzux
            | ExtendedOp::Stwcx
            | ExtendedOp::Stwx
            | ExtendedOp::Stwux
            | ExtendedOp::Stbx
            | ExtendedOp::Stbux
            | ExtendedOp::Lhzx
            | ExtendedOp::Lhzux
            | ExtendedOp::Lhax
            | ExtendedOp::Lhaux
            | ExtendedOp::Sthx
            | ExtendedOp::Sthux
            | ExtendedOp::Lswx
            | ExtendedOp::Lwbrx
            | ExtendedOp::Stswx
            | ExtendedOp::Stwbrx
            | ExtendedOp::Lhbrx
            | ExtendedOp::Sthbrx
            | ExtendedOp::Eciwx
            | ExtendedOp::Ecowx => Text::new(mnemonic, format!("r{}, r{}, r{}", rd, ra, rb)),
            ExtendedOp::Mfcr | ExtendedOp::Mfmsr => Text::new(mnemonic, format!("r{}", rd)),
            ExtendedOp::Mtmsr => Text::new(mnemonic, format!("r{}", inst.rs())),
            ExtendedOp::Mtcrf if inst.crm() == 0xFF => Text::new("mtcr", format!("r{}", inst.rs())),
            ExtendedOp::Mtcrf => Text::new(mnemonic, format!("0x{:02X}, r{}", inst.crm(), inst.rs())),
            ExtendedOp::Mtsr => Text::new(mnemonic, format!("{}, r{}", inst.sr(), inst.rs())),
            ExtendedOp::Mtsrin => Text::new(mnemonic, format!("r{}, r{}", inst.rs(), rb)),
            ExtendedOp::Mfsr => Text::new(mnemonic, format!("r{}, {}", rd, inst.sr())),
            ExtendedOp::Mfsrin => Text::new(mnemonic, format!("r{}, r{}", rd, rb)),
            ExtendedOp::Mfspr => match short_spr_name(inst.spr()) {
                Some(name) => Text::new(&format!("mf{}", name), format!("r{}", rd)),
                None => Text::new(mnemonic, format!("r{}, {}", rd, spr_name(inst.spr()))),
            },
            ExtendedOp::Mtspr => match short_spr_name(inst.spr()) {
                Some(name) => Text::new(&format!("mt{}", name), format!("r{}", inst.rs())),
                None => Text::new(mnemonic, format!("{}, r{}", spr_name(inst.spr()), inst.rs())),
            },
            ExtendedOp::Mftb => match inst.tbr() {
                spr::TBL => Text::new("mftb", format!("r{}", rd)),
                spr::TBU => Text::new("mftbu", format!("r{}", rd)),
                tbr => Text::new(mnemonic, format!("r{}, {}", rd, tbr)),
            },
            ExtendedOp::Mcrxr => Text::new(mnemonic, format!("cr{}", inst.crfd())),
            ExtendedOp::Dcbst
            | ExtendedOp::Dcbf
            | ExtendedOp::Dcbtst
            | ExtendedOp::Dcbt
            | ExtendedOp::Dcbi
            | ExtendedOp::Dcba
            | ExtendedOp::Dcbz
            | ExtendedOp::Icbi => Text::new(mnemonic, format!("r{}, r{}", ra, rb)),
            ExtendedOp::Tlbie => Text::new(mnemonic, format!("r{}", rb)),
            _ => Text::bare(mnemonic),
        }
    }

    fn float_single(inst: Instruction) -> Text {
        let op = FloatSingleOp::decode(inst);
        let (fd, fa, fb, fc) = (inst.fd(), inst.fa(), inst.fb(), inst.fc());
        let operands = match op {
            FloatSingleOp::Fdivs | FloatSingleOp::Fsubs | FloatSingleOp::Fadds => {
                format!("f{}, f{}, f{}", fd, fa, fb)
            }
            FloatSingleOp::Fmuls => format!("f{}, f{}, f{}", fd, fa, fc),
            FloatSingleOp::Fres => format!("f{}, f{}", fd, fb),
            FloatSingleOp::Fmsubs | FloatSingleOp::Fmadds | FloatSingleOp::Fnmsubs | FloatSingleOp::Fnmadds => {
                format!("f{}, f{}, f{}, f{}", fd, fa, fc, fb)
            }
            FloatSingleOp::Unknown(_) => String::new(),
        };
        Text::new(op.mnemonic(), operands).record(inst)
    }

    fn float_double(inst: Instruction) -> Text {
        let op = FloatDoubleOp::decode(inst);
        let (fd, fa, fb, fc) = (inst.fd(), inst.fa(), inst.fb(), inst.fc());
        let operands = match op {
            FloatDoubleOp::Fdiv | FloatDoubleOp::Fsub | FloatDoubleOp::Fadd => format!("f{}, f{}, f{}", fd, fa, fb),
            FloatDoubleOp::Fmul => format!("f{}, f{}, f{}", fd, fa, fc),
            FloatDoubleOp::Fsel
            | FloatDoubleOp::Fmsub
            | FloatDoubleOp::Fmadd
            | FloatDoubleOp::Fnmsub
            | FloatDoubleOp::Fnmadd => format!("f{}, f{}, f{}, f{}", fd, fa, fc, fb),
            FloatDoubleOp::Frsqrte
            | FloatDoubleOp::Frsp
            | FloatDoubleOp::Fctiw
            | FloatDoubleOp::Fctiwz
            | FloatDoubleOp::Fneg
            | FloatDoubleOp::Fmr
            | FloatDoubleOp::Fnabs
            | FloatDoubleOp::Fabs => format!("f{}, f{}", fd, fb),
            FloatDoubleOp::Fcmpu | FloatDoubleOp::Fcmpo => {
                // Compares have no record form
                return Text::new(op.mnemonic(), format!("cr{}, f{}, f{}", inst.crfd(), fa, fb));
            }
            FloatDoubleOp::Mcrfs => {
                return Text::new(op.mnemonic(), format!("cr{}, cr{}", inst.crfd(), inst.crfs()));
            }
            FloatDoubleOp::Mtfsb0 | FloatDoubleOp::Mtfsb1 => format!("{}", inst.crbd()),
            FloatDoubleOp::Mtfsfi => format!("cr{}, {}", inst.crfd(), inst.imm()),
            FloatDoubleOp::Mffs => format!("f{}", fd),
            FloatDoubleOp::Mtfsf => format!("0x{:02X}, f{}", inst.fm(), fb),
            FloatDoubleOp::Unknown(_) => String::new(),
        };
        Text::new(op.mnemonic(), operands).record(inst)
    }
}

/// Append the link and absolute suffixes of a branch mnemonic
fn branch_suffix(base: &str, inst: Instruction) -> String {
    let mut name = base.to_string();
    if inst.lk() {
        name.push('l');
    }
    if inst.aa() {
        name.push('a');
    }
    name
}

/// SPRs with dedicated `mfxxx`/`mtxxx` simplified mnemonics
fn short_spr_name(id: u16) -> Option<&'static str> {
    match id {
        spr::XER => Some("xer"),
        spr::LR => Some("lr"),
        spr::CTR => Some("ctr"),
        _ => None,
    }
}

/// Display name of an SPR, or its number
fn spr_name(id: u16) -> String {
    let name = match id {
        spr::DSISR => "dsisr",
        spr::DAR => "dar",
        spr::DEC => "dec",
        spr::SDR1 => "sdr1",
        spr::SRR0 => "srr0",
        spr::SRR1 => "srr1",
        spr::SPRG0 => "sprg0",
        spr::SPRG1 => "sprg1",
        spr::SPRG2 => "sprg2",
        spr::SPRG3 => "sprg3",
        spr::EAR => "ear",
        spr::TBL_WRITE => "tbl",
        spr::TBU_WRITE => "tbu",
        spr::PVR => "pvr",
        spr::HID0 => "hid0",
        spr::HID1 => "hid1",
        spr::HID2 => "hid2",
        spr::WPAR => "wpar",
        spr::DMAU => "dma_u",
        spr::DMAL => "dma_l",
        spr::IABR => "iabr",
        spr::DABR => "dabr",
        spr::L2CR => "l2cr",
        id if (spr::GQR0..spr::GQR0 + 8).contains(&id) => return format!("gqr{}", id - spr::GQR0),
        id => return id.to_string(),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(address: u32, opcode: u32) -> String {
        GekkoDisassembler::disassemble(address, opcode).to_string()
    }

    #[test]
    fn test_disassemble_nop() {
        // ori r0, r0, 0 = nop
        let dis = GekkoDisassembler::disassemble(0, 0x60000000);
        assert_eq!(dis.mnemonic, "nop");
        assert_eq!(dis.to_string(), "nop");
    }

    #[test]
    fn test_disassemble_li_and_addi() {
        let dis = GekkoDisassembler::disassemble(0, 0x38600005);
        assert_eq!(dis.mnemonic, "li");
        assert_eq!(dis.operands, "r3, 5");
        assert_eq!(dis.table, OpcodeTable::Primary);

        // addi r3, r3, -1
        assert_eq!(GekkoDisassembler::disassemble(0, 0x3863FFFF).operands, "r3, r3, -1");
    }

    #[test]
    fn test_disassemble_branches() {
        // bl +0x20 from 0x1000
        let dis = GekkoDisassembler::disassemble(0x1000, 0x48000021);
        assert_eq!(dis.mnemonic, "bl");
        assert_eq!(dis.operands, "0x1020");

        // bdnz -8 from 0x8000_3114
        let dis = GekkoDisassembler::disassemble(0x8000_3114, 0x4200FFF8);
        assert_eq!(dis.mnemonic, "bc");
        assert_eq!(dis.operands, "16, 0, 0x8000310C");

        assert_eq!(text(0, 0x4E800020), "blr");
        assert_eq!(text(0, 0x4E800421), "bctrl");
        // bclr 12, 2
        assert_eq!(text(0, 0x4D820020), "bclr     12, 2");
    }

    #[test]
    fn test_disassemble_suffixes() {
        // addo. r3, r4, r5
        let dis = GekkoDisassembler::disassemble(0, 0x7C642E15);
        assert_eq!(dis.mnemonic, "addo.");
        assert_eq!(dis.operands, "r3, r4, r5");
        assert_eq!(dis.table, OpcodeTable::Extended);

        // rlwinm r3, r4, 8, 24, 31
        assert_eq!(text(0, 0x5483463E), "rlwinm   r3, r4, 8, 24, 31");
        // fadd f1, f2, f3
        assert_eq!(text(0, 0xFC22182A), "fadd     f1, f2, f3");
        // fmuls f4, f2, f3
        assert_eq!(text(0, 0xEC8200F2), "fmuls    f4, f2, f3");
    }

    #[test]
    fn test_disassemble_spr_moves() {
        assert_eq!(text(0, 0x7C8903A6), "mtctr    r4");
        assert_eq!(text(0, 0x7CC102A6), "mfxer    r6");
        // mtspr 284, r3
        assert_eq!(text(0, 0x7C7C43A6), "mtspr    tbl, r3");
        // mfspr r3, 272
        assert_eq!(text(0, 0x7C7042A6), "mfspr    r3, sprg0");
    }

    #[test]
    fn test_disassemble_loads_and_stores() {
        assert_eq!(text(0, 0x80650000), "lwz      r3, 0(r5)");
        assert_eq!(text(0, 0x9421FFF0), "stwu     r1, -16(r1)");
        // lwarx r3, 0, r4
        assert_eq!(text(0, 0x7C602028), "lwarx    r3, r0, r4");
    }

    #[test]
    fn test_disassemble_unknown_and_paired() {
        let dis = GekkoDisassembler::disassemble(0, 0x04000000);
        assert!(dis.is_unknown());
        assert_eq!(dis.operands, "0x04000000");
        assert_eq!(dis.comment.as_deref(), Some("unknown primary opcode"));

        let dis = GekkoDisassembler::disassemble(0, 0x7C000002);
        assert!(dis.is_unknown());
        assert_eq!(dis.table, OpcodeTable::Extended);

        let dis = GekkoDisassembler::disassemble(0, 0x10201090);
        assert_eq!(dis.mnemonic, "ps_mr");
        assert_eq!(dis.table, OpcodeTable::PairedSingle);
        assert!(dis.comment.is_some());
    }

    #[test]
    fn test_disassemble_range() {
        let bytes: Vec<u8> = [0x38600005u32, 0x4E800020]
            .iter()
            .flat_map(|w| w.to_be_bytes())
            .chain([0xAA, 0xBB])
            .collect();
        let listing = GekkoDisassembler::disassemble_range(&bytes, 0x8000_3100, 10);
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[1].address, 0x8000_3104);
        assert_eq!(listing[1].mnemonic, "blr");
    }

    #[test]
    fn test_disassemble_port() {
        let memory = gk_memory::MemoryImage::with_size(0x10000);
        memory.write_u32(0x8000_3100, 0x48000021).unwrap();
        memory.write_u32(0x8000_3104, 0x60000000).unwrap();

        let listing = GekkoDisassembler::disassemble_port(&*memory, 0x8000_3100, 2).unwrap();
        assert_eq!(listing[0].operands, "0x80003120");
        assert_eq!(listing[1].mnemonic, "nop");

        assert!(GekkoDisassembler::disassemble_port(&*memory, 0x9000_0000, 1).is_err());
    }
}
