use lyso_common::CigarOp;

use crate::error::CigarError;

/// Decodes a packed CIGAR blob (`n_cigar_op` little-endian 32-bit
/// words) into a vector of operations. Each word's low 4 bits hold the
/// opcode (0..=8); the remaining 28 bits hold the run length.
pub fn decode_cigar(blob: &[u8]) -> Result<Vec<CigarOp>, CigarError> {
    if blob.len() % 4 != 0 {
        return Err(CigarError::WrongCigarLength(blob.len()));
    }
    let mut ops = Vec::with_capacity(blob.len() / 4);
    for word in blob.chunks_exact(4) {
        let v = u32::from_le_bytes(word.try_into().unwrap());
        let opcode = (v & 0xF) as u8;
        let len = v >> 4;
        match CigarOp::from_opcode(opcode, len) {
            Some(op) => ops.push(op),
            None => return Err(CigarError::WrongCigar(word.to_vec())),
        }
    }
    Ok(ops)
}

/// Encodes a vector of operations into a packed CIGAR blob, the
/// inverse of [`decode_cigar`].
pub fn encode_cigar(ops: &[CigarOp]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ops.len() * 4);
    for op in ops {
        let word = (op.len() << 4) | op.opcode() as u32;
        out.extend(word.to_le_bytes());
    }
    out
}
