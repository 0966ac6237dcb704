//! Addressing mode definitions and their fixed cost table.
//!
//! The 68000 has 12 addressing modes, encoded as a 3-bit mode field plus
//! a 3-bit register field (mode 7 overloads the register field for the
//! absolute/PC-relative/immediate variants). Each mode carries a fixed
//! extra-cycle cost that the timing model charges when the effective
//! address is resolved.

use crate::alu::Size;

/// One of the 12 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Data register direct: Dn
    DataReg(u8),
    /// Address register direct: An
    AddrReg(u8),
    /// Address register indirect: (An)
    AddrInd(u8),
    /// Address register indirect with postincrement: (An)+
    PostInc(u8),
    /// Address register indirect with predecrement: -(An)
    PreDec(u8),
    /// Address register indirect with 16-bit displacement: d16(An)
    Disp(u8),
    /// Address register indirect with index: d8(An,Xn)
    Index(u8),
    /// Absolute short: (xxx).W
    AbsShort,
    /// Absolute long: (xxx).L
    AbsLong,
    /// Program counter with 16-bit displacement: d16(PC)
    PcDisp,
    /// Program counter with index: d8(PC,Xn)
    PcIndex,
    /// Immediate: #<data>
    Immediate,
}

impl AddrMode {
    /// Decode the mode/register field pair. Returns `None` for the
    /// reserved mode-7 encodings (register field 5-7).
    #[must_use]
    pub fn decode(mode: u8, reg: u8) -> Option<Self> {
        let reg = reg & 0x07;
        match mode & 0x07 {
            0 => Some(Self::DataReg(reg)),
            1 => Some(Self::AddrReg(reg)),
            2 => Some(Self::AddrInd(reg)),
            3 => Some(Self::PostInc(reg)),
            4 => Some(Self::PreDec(reg)),
            5 => Some(Self::Disp(reg)),
            6 => Some(Self::Index(reg)),
            _ => match reg {
                0 => Some(Self::AbsShort),
                1 => Some(Self::AbsLong),
                2 => Some(Self::PcDisp),
                3 => Some(Self::PcIndex),
                4 => Some(Self::Immediate),
                _ => None,
            },
        }
    }

    /// Fixed extra cycles for resolving this mode. Register-direct modes
    /// are free; everything else pays for its extension words and address
    /// arithmetic.
    #[must_use]
    pub const fn extra_cycles(self) -> u32 {
        match self {
            Self::DataReg(_) | Self::AddrReg(_) => 0,
            Self::AddrInd(_) | Self::PostInc(_) | Self::Immediate => 4,
            Self::PreDec(_) => 6,
            Self::Disp(_) | Self::AbsShort | Self::PcDisp => 8,
            Self::Index(_) | Self::PcIndex => 10,
            Self::AbsLong => 12,
        }
    }

    /// Number of extension words this mode consumes from the instruction
    /// stream for an operand of `size`.
    #[must_use]
    pub const fn ext_words(self, size: Size) -> u32 {
        match self {
            Self::DataReg(_)
            | Self::AddrReg(_)
            | Self::AddrInd(_)
            | Self::PostInc(_)
            | Self::PreDec(_) => 0,
            Self::Disp(_) | Self::Index(_) | Self::AbsShort | Self::PcDisp | Self::PcIndex => 1,
            Self::AbsLong => 2,
            Self::Immediate => match size {
                Size::Byte | Size::Word => 1,
                Size::Long => 2,
            },
        }
    }

    /// True for modes that may be written through (excludes An, PC
    /// relative and immediate).
    #[must_use]
    pub const fn is_data_alterable(self) -> bool {
        matches!(
            self,
            Self::DataReg(_)
                | Self::AddrInd(_)
                | Self::PostInc(_)
                | Self::PreDec(_)
                | Self::Disp(_)
                | Self::Index(_)
                | Self::AbsShort
                | Self::AbsLong
        )
    }

    /// True for memory destinations (excludes both register-direct forms).
    #[must_use]
    pub const fn is_memory_alterable(self) -> bool {
        matches!(
            self,
            Self::AddrInd(_)
                | Self::PostInc(_)
                | Self::PreDec(_)
                | Self::Disp(_)
                | Self::Index(_)
                | Self::AbsShort
                | Self::AbsLong
        )
    }

    /// True for modes usable as a control (jump/load-address) target.
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(
            self,
            Self::AddrInd(_)
                | Self::Disp(_)
                | Self::Index(_)
                | Self::AbsShort
                | Self::AbsLong
                | Self::PcDisp
                | Self::PcIndex
        )
    }
}
