//! Event identifier generation
//!
//! Identifiers are a random base-36 fragment followed by a base-36 millisecond
//! timestamp. The timestamp fragment never repeats within one generator, so
//! identifiers from the same session are pairwise distinct even when the
//! random fragments collide.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

const RANDOM_LEN: usize = 9;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates session-unique event identifiers.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh identifier.
    pub fn next_id(&self) -> String {
        let millis = self.next_millis();
        let mut id = random_fragment();
        id.push_str(&to_base36(millis as u128));
        id
    }

    /// Current wall-clock millis, bumped past the last value handed out.
    fn next_millis(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(observed) => last = observed,
            }
        }
    }
}

fn random_fragment() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(RANDOM_LEN);
    for _ in 0..RANDOM_LEN {
        out.push(ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }
    out
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
