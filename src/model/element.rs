//! The element abstraction the merge core is generic over.
//!
//! An element is an opaque, comparable unit of content — a token, a
//! character, or (in tests) a plain integer. The core never inspects an
//! element beyond the operations declared here: equality and total order for
//! alignment, a byte funnel for content hashing, and a width for size-based
//! scoring and thresholds.

use std::fmt::Debug;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A unit of mergeable content.
///
/// Equality drives the content-level equivalence used by alignment; the total
/// order breaks fingerprint ties deterministically. `funnel` must emit a byte
/// serialization that is injective per type (two unequal elements must funnel
/// different bytes), since the content hash is computed from it. `width`
/// returns the element's size contribution — tokens of different lengths may
/// weigh differently in match thresholds and LCS scoring.
pub trait Element: Clone + Eq + Ord + Hash + Debug {
    /// Append this element's content bytes to `out`.
    fn funnel(&self, out: &mut Vec<u8>);

    /// Size of this element; non-negative by construction.
    fn width(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Primitive impls
// ---------------------------------------------------------------------------

macro_rules! impl_element_for_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                fn funnel(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_be_bytes());
                }

                fn width(&self) -> usize {
                    1
                }
            }
        )*
    };
}

impl_element_for_int!(i8, i16, i32, i64, u16, u32, u64);

impl Element for u8 {
    fn funnel(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    fn width(&self) -> usize {
        1
    }
}

impl Element for char {
    fn funnel(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        out.extend_from_slice(self.encode_utf8(&mut buf).as_bytes());
    }

    fn width(&self) -> usize {
        1
    }
}

/// Token-shaped elements: a `String` weighs as many units as it has bytes, so
/// a long identifier counts for more than a brace when sizing matches.
impl Element for String {
    fn funnel(&self, out: &mut Vec<u8>) {
        // Length prefix keeps the funnel injective across concatenations.
        out.extend_from_slice(&(self.len() as u64).to_be_bytes());
        out.extend_from_slice(self.as_bytes());
    }

    fn width(&self) -> usize {
        self.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
