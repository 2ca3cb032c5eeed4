/// The 16-symbol BAM nucleotide alphabet, indexed by the 4-bit codes
/// packed two-per-byte in a raw alignment's `seq` field.
const NT16_STR: &[u8; 16] = b"=ACMGRSVTWYHKDBN";

/// Converts a sequence of already-unpacked nibble codes (0..=15) into
/// their ASCII letters.
pub fn nibbles_to_seq(nibbles: &[u8]) -> String {
    nibbles
        .iter()
        .map(|&n| NT16_STR[(n & 0x0F) as usize] as char)
        .collect()
}

/// Converts an ASCII nucleotide string into nibble codes. Unrecognized
/// letters (anything outside the 16-symbol alphabet) map to `N` (15),
/// matching the convention used by the wider BAM/SAM ecosystem.
pub fn seq_to_nibbles(seq: &str) -> Vec<u8> {
    seq.bytes()
        .map(|b| {
            let upper = b.to_ascii_uppercase();
            NT16_STR
                .iter()
                .position(|&c| c == upper)
                .map(|i| i as u8)
                .unwrap_or(15)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_standard_bases() {
        let nibbles = seq_to_nibbles("ACGTN");
        assert_eq!(nibbles_to_seq(&nibbles), "ACGTN");
    }

    #[test]
    fn unrecognized_letters_map_to_n() {
        assert_eq!(seq_to_nibbles("Q"), vec![15]);
    }

    #[test]
    fn lowercase_is_normalized() {
        assert_eq!(seq_to_nibbles("acgt"), seq_to_nibbles("ACGT"));
    }
}
