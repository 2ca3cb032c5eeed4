use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
// CIGAR operations
// See SAM v1 section 1.4.6
pub enum CigarOp {
    M(u32),
    I(u32),
    D(u32),
    N(u32),
    S(u32),
    H(u32),
    P(u32),
    Eq(u32),
    X(u32),
}

impl Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CigarOp::M(v) => write!(f, "{v}M"),
            CigarOp::I(v) => write!(f, "{v}I"),
            CigarOp::D(v) => write!(f, "{v}D"),
            CigarOp::N(v) => write!(f, "{v}N"),
            CigarOp::S(v) => write!(f, "{v}S"),
            CigarOp::H(v) => write!(f, "{v}H"),
            CigarOp::P(v) => write!(f, "{v}P"),
            CigarOp::Eq(v) => write!(f, "{v}="),
            CigarOp::X(v) => write!(f, "{v}X"),
        }
    }
}

impl CigarOp {
    /// The run length, regardless of operation kind.
    pub fn len(self) -> u32 {
        match self {
            CigarOp::M(v)
            | CigarOp::I(v)
            | CigarOp::D(v)
            | CigarOp::N(v)
            | CigarOp::S(v)
            | CigarOp::H(v)
            | CigarOp::P(v)
            | CigarOp::Eq(v)
            | CigarOp::X(v) => v,
        }
    }

    /// The wire opcode, 0..=8, for the low 4 bits of a packed CIGAR word.
    pub fn opcode(self) -> u8 {
        match self {
            CigarOp::M(_) => 0,
            CigarOp::I(_) => 1,
            CigarOp::D(_) => 2,
            CigarOp::N(_) => 3,
            CigarOp::S(_) => 4,
            CigarOp::H(_) => 5,
            CigarOp::P(_) => 6,
            CigarOp::Eq(_) => 7,
            CigarOp::X(_) => 8,
        }
    }

    /// Builds a `CigarOp` from a wire opcode and run length. Returns
    /// `None` for any opcode outside 0..=8.
    pub fn from_opcode(opcode: u8, len: u32) -> Option<Self> {
        Some(match opcode {
            0 => CigarOp::M(len),
            1 => CigarOp::I(len),
            2 => CigarOp::D(len),
            3 => CigarOp::N(len),
            4 => CigarOp::S(len),
            5 => CigarOp::H(len),
            6 => CigarOp::P(len),
            7 => CigarOp::Eq(len),
            8 => CigarOp::X(len),
            _ => return None,
        })
    }
}
