//! Seeded randomness and id minting.
//!
//! Every random draw in the engine comes from an explicit `ChaCha8Rng`
//! stream; there is no ambient/thread RNG anywhere. Two stream kinds exist:
//!
//! - the **broker stream**, seeded directly from `BrokerConfig::seed`, which
//!   mints account ids;
//! - one **account stream** per account, derived from `(seed, account_id)`,
//!   which mints order/fill ids and feeds the slippage draw.
//!
//! Per-account streams keep replays byte-identical even when accounts are
//! driven in parallel: interleaving cannot reorder another account's draws.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// The broker-level stream (account id minting).
pub fn broker_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Derive an account's private stream from the broker seed and its id.
pub fn account_rng(seed: u64, account_id: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ fnv1a64(account_id.as_bytes()))
}

/// Mint an id of the form `<prefix>-<epoch_millis>-<rand4>`.
pub fn mint_id(prefix: &str, ts_millis: i64, rng: &mut ChaCha8Rng) -> String {
    format!("{prefix}-{ts_millis}-{}", rand4(rng))
}

/// Four lowercase base-36 characters from the stream.
fn rand4(rng: &mut ChaCha8Rng) -> String {
    (0..4)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// FNV-1a over the id bytes; stable across platforms and runs.
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
