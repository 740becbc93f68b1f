//! Seeded random number streams.

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Random generator used throughout the simulation.
pub type SimRng = ChaCha12Rng;

const TICK_DERIVATION_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;

/// Stream reserved for the serial commit phase of a tick.
pub const COMMIT_STREAM: u64 = u64::MAX;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> SimRng {
    SimRng::seed_from_u64(seed)
}

/// Derive the RNG for one `stream` (usually an entity key) during `tick`.
///
/// Streams are independent of each other and of the order in which entities
/// are visited, so parallel updates draw the same numbers as serial ones.
pub fn derive_rng(seed: u64, tick: u64, stream: u64) -> SimRng {
    let mut rng = SimRng::seed_from_u64(seed.wrapping_add(tick.wrapping_mul(TICK_DERIVATION_PRIME)));
    rng.set_stream(stream);
    rng
}
