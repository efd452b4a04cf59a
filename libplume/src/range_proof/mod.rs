mod confidential;
mod public;

pub use confidential::{Confidential, MultiSig, Part1, Part2, Part3, Phase};
pub use public::Public;

use crate::kdf::KeyIdv;

/// Inputs binding a proof to its owner: the derivation path being committed
/// and the seed all proof nonces and recovery material derive from.
#[derive(Clone, Copy, Debug)]
pub struct CreatorParams {
    pub kidv: KeyIdv,
    pub seed: [u8; 32],
}
