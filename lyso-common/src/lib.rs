pub mod cigar;
pub mod phred;
pub mod transform;

pub use cigar::CigarOp;
pub use phred::{guess_phred_encoding, Phred, PhredEncoding};
pub use transform::{drain_to_end, Compose, Either, Polled, Transform};
