//! Rolling content fingerprints.
//!
//! Each element hashes to a fixed 8-byte digest (truncated `Sha256` over its
//! funnel bytes). A window of `w` elements then fingerprints as a Rabin–Karp
//! polynomial hash over the `8 × w` digest bytes, modulo the Mersenne prime
//! `2^61 − 1` with base 257, so sliding the window forward by one element is
//! eight constant-time byte rolls rather than a rehash.
//!
//! Fingerprints are position-independent: any instance of the same
//! configuration fed the same bytes agrees. Collisions are possible and are
//! broken downstream by content comparison.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use crate::model::element::Element;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Width of a single element's content hash.
pub const ELEMENT_HASH_BYTES: usize = 8;

/// Polynomial base; any value coprime to the modulus works, 257 covers the
/// byte alphabet injectively.
const HASH_BASE: u128 = 257;

/// Mersenne prime `2^61 − 1`, chosen so reduction is two shifts and an add.
const HASH_MOD: u128 = (1 << 61) - 1;

/// Reduce `x` modulo `2^61 − 1` without division.
///
/// Two folds bring any 128-bit value under `2 × modulus`; the conditional
/// subtract finishes the job.
const fn mod_mersenne(x: u128) -> u128 {
    let folded = (x & HASH_MOD) + (x >> 61);
    let folded = (folded & HASH_MOD) + (folded >> 61);
    if folded >= HASH_MOD {
        folded - HASH_MOD
    } else {
        folded
    }
}

/// `HASH_BASE^exponent mod HASH_MOD` by square-and-multiply.
fn base_power(mut exponent: usize) -> u128 {
    let mut result: u128 = 1;
    let mut base = HASH_BASE;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mod_mersenne(result * base);
        }
        base = mod_mersenne(base * base);
        exponent >>= 1;
    }
    result
}

// ---------------------------------------------------------------------------
// Element hashing
// ---------------------------------------------------------------------------

/// Fixed-width content hash of one element.
#[must_use]
pub fn element_hash<E: Element>(element: &E) -> [u8; ELEMENT_HASH_BYTES] {
    let mut funnel = Vec::new();
    element.funnel(&mut funnel);
    let digest = Sha256::digest(&funnel);
    let mut out = [0u8; ELEMENT_HASH_BYTES];
    out.copy_from_slice(&digest[..ELEMENT_HASH_BYTES]);
    out
}

/// Content hashes for a whole element sequence, computed once per file and
/// reused across every window size.
#[must_use]
pub fn element_hashes<E: Element>(elements: &[E]) -> Vec<[u8; ELEMENT_HASH_BYTES]> {
    elements.iter().map(element_hash).collect()
}

// ---------------------------------------------------------------------------
// RollingHashFactory
// ---------------------------------------------------------------------------

/// Configuration for rolling hashes of one window size.
///
/// The factory pre-announces how many byte fingerprints its hashes will take;
/// that figure only feeds progress estimation, never correctness. The
/// expensive part — the top base power used to roll a byte out of the window
/// — is computed once here and shared by every hash the factory hands out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollingHashFactory {
    window_size_in_elements: usize,
    window_size_in_bytes: usize,
    number_of_fingerprints: usize,
    top_power: u128,
}

impl RollingHashFactory {
    /// # Panics
    ///
    /// Panics on a zero window size; fingerprinting nothing is a logic error.
    #[must_use]
    pub fn new(window_size_in_elements: usize, number_of_fingerprints: usize) -> Self {
        assert!(window_size_in_elements > 0, "window size must be positive");
        let window_size_in_bytes = ELEMENT_HASH_BYTES * window_size_in_elements;
        Self {
            window_size_in_elements,
            window_size_in_bytes,
            number_of_fingerprints,
            top_power: base_power(window_size_in_bytes - 1),
        }
    }

    #[must_use]
    pub const fn window_size_in_elements(&self) -> usize {
        self.window_size_in_elements
    }

    #[must_use]
    pub const fn window_size_in_bytes(&self) -> usize {
        self.window_size_in_bytes
    }

    /// The pre-announced fingerprint count, for progress estimation.
    #[must_use]
    pub const fn number_of_fingerprints(&self) -> usize {
        self.number_of_fingerprints
    }

    /// A fresh rolling hash over an empty window.
    #[must_use]
    pub fn rolling_hash(&self) -> RollingHash<'_> {
        RollingHash {
            factory: self,
            window: VecDeque::with_capacity(self.window_size_in_bytes),
            accumulator: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// RollingHash
// ---------------------------------------------------------------------------

/// Incremental hash over a sliding byte window.
#[derive(Clone, Debug)]
pub struct RollingHash<'a> {
    factory: &'a RollingHashFactory,
    window: VecDeque<u8>,
    accumulator: u128,
}

impl RollingHash<'_> {
    /// Slide one byte into the window, evicting the oldest byte once the
    /// window is full.
    pub fn push_byte(&mut self, byte: u8) {
        if self.window.len() == self.factory.window_size_in_bytes {
            let leaving = self.window.pop_front().expect("window is non-empty");
            let evicted = mod_mersenne(u128::from(leaving) * self.factory.top_power);
            self.accumulator = self.accumulator + HASH_MOD - evicted;
        }
        self.window.push_back(byte);
        self.accumulator = mod_mersenne(self.accumulator * HASH_BASE + u128::from(byte));
    }

    /// Slide one element's content hash into the window.
    pub fn push_element_hash(&mut self, hash: &[u8; ELEMENT_HASH_BYTES]) {
        for &byte in hash {
            self.push_byte(byte);
        }
    }

    /// Whether a full window has been absorbed.
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.window.len() == self.factory.window_size_in_bytes
    }

    /// The fingerprint of the current window, once primed.
    #[must_use]
    pub fn fingerprint(&self) -> Option<u128> {
        self.is_primed().then_some(self.accumulator)
    }
}

/// Fingerprints of every window of the factory's size over `hashes`, one per
/// start position. Shorter inputs yield nothing.
#[must_use]
pub fn window_fingerprints(
    factory: &RollingHashFactory,
    hashes: &[[u8; ELEMENT_HASH_BYTES]],
) -> Vec<u128> {
    let window = factory.window_size_in_elements();
    if hashes.len() < window {
        return Vec::new();
    }
    let mut rolling = factory.rolling_hash();
    let mut fingerprints = Vec::with_capacity(hashes.len() - window + 1);
    for (index, hash) in hashes.iter().enumerate() {
        rolling.push_element_hash(hash);
        if index + 1 >= window {
            fingerprints.push(rolling.fingerprint().expect("window is primed"));
        }
    }
    fingerprints
}

// ---------------------------------------------------------------------------
// FactoryCache
// ---------------------------------------------------------------------------

/// Write-once, read-many cache of factories, keyed by window size and the
/// announced fingerprint count.
#[derive(Clone, Debug, Default)]
pub struct FactoryCache {
    factories: BTreeMap<(usize, usize), Rc<RollingHashFactory>>,
}

impl FactoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory_for(
        &mut self,
        window_size_in_elements: usize,
        number_of_fingerprints: usize,
    ) -> Rc<RollingHashFactory> {
        Rc::clone(
            self.factories
                .entry((window_size_in_elements, number_of_fingerprints))
                .or_insert_with(|| {
                    Rc::new(RollingHashFactory::new(
                        window_size_in_elements,
                        number_of_fingerprints,
                    ))
                }),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_hash_is_stable_and_discriminating() {
        assert_eq!(element_hash(&42i32), element_hash(&42i32));
        assert_ne!(element_hash(&42i32), element_hash(&43i32));
    }

    #[test]
    fn mod_mersenne_agrees_with_division() {
        for x in [0u128, 1, HASH_MOD - 1, HASH_MOD, HASH_MOD + 1, u64::MAX as u128 * 7] {
            assert_eq!(mod_mersenne(x), x % HASH_MOD, "x = {x}");
        }
    }

    #[test]
    fn base_power_matches_naive_exponentiation() {
        let mut naive: u128 = 1;
        for exponent in 0..20 {
            assert_eq!(base_power(exponent), naive);
            naive = mod_mersenne(naive * HASH_BASE);
        }
    }

    #[test]
    fn fingerprint_is_position_independent() {
        let factory = RollingHashFactory::new(2, 0);
        let hashes = element_hashes(&[10i32, 20, 30, 20, 30]);

        let fingerprints = window_fingerprints(&factory, &hashes);
        assert_eq!(fingerprints.len(), 4);
        // Windows [20, 30] at positions 1 and 3 carry identical content.
        assert_eq!(fingerprints[1], fingerprints[3]);
        assert_ne!(fingerprints[0], fingerprints[1]);
    }

    #[test]
    fn independent_instances_agree_on_the_same_bytes() {
        let factory = RollingHashFactory::new(3, 0);
        let hashes = element_hashes(&[1i32, 2, 3, 4, 5, 6]);

        // One hash rolled across the whole sequence vs. a fresh hash fed only
        // the final window.
        let rolled = *window_fingerprints(&factory, &hashes)
            .last()
            .expect("input longer than window");
        let mut fresh = factory.rolling_hash();
        for hash in &hashes[3..] {
            fresh.push_element_hash(hash);
        }
        assert_eq!(fresh.fingerprint(), Some(rolled));
    }

    #[test]
    fn unprimed_hash_has_no_fingerprint() {
        let factory = RollingHashFactory::new(4, 0);
        let mut rolling = factory.rolling_hash();
        rolling.push_element_hash(&element_hash(&1i32));
        assert!(!rolling.is_primed());
        assert_eq!(rolling.fingerprint(), None);
    }

    #[test]
    fn short_input_yields_no_fingerprints() {
        let factory = RollingHashFactory::new(5, 0);
        let hashes = element_hashes(&[1i32, 2]);
        assert!(window_fingerprints(&factory, &hashes).is_empty());
    }

    #[test]
    fn cache_is_write_once() {
        let mut cache = FactoryCache::new();
        let a = cache.factory_for(3, 10);
        let b = cache.factory_for(3, 10);
        assert!(Rc::ptr_eq(&a, &b));
        let _ = cache.factory_for(4, 10);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    #[should_panic(expected = "window size must be positive")]
    fn zero_window_is_rejected() {
        let _ = RollingHashFactory::new(0, 0);
    }
}
