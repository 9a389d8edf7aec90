//! Two-phase half-step coil sequence.
//!
//! The table's motors are driven by a fixed, ordered cycle of eight
//! four-bit winding patterns. The sequence index wraps circularly in both
//! directions and is the only per-axis stepping state.

/// One four-bit winding state, in (A, A', B, B') order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoilPattern([bool; 4]);

impl CoilPattern {
    /// The winding bits in (A, A', B, B') order.
    #[inline]
    pub const fn bits(&self) -> [bool; 4] {
        self.0
    }

    /// Whether any winding is energized.
    #[inline]
    pub fn is_energized(&self) -> bool {
        self.0.iter().any(|&b| b)
    }
}

/// All windings off.
pub const DE_ENERGIZED: CoilPattern = CoilPattern([false, false, false, false]);

/// All windings on. Only used by the self-test script.
pub const ALL_ENERGIZED: CoilPattern = CoilPattern([true, true, true, true]);

/// The half-step drive cycle. Adjacent entries differ by exactly one
/// winding; entry 7 wraps back to entry 0.
pub const HALF_STEP_SEQUENCE: [CoilPattern; 8] = [
    CoilPattern([true, false, true, false]),
    CoilPattern([true, false, false, false]),
    CoilPattern([true, false, false, true]),
    CoilPattern([false, false, false, true]),
    CoilPattern([false, true, false, true]),
    CoilPattern([false, true, false, false]),
    CoilPattern([false, true, true, false]),
    CoilPattern([false, false, true, false]),
];

/// Position within [`HALF_STEP_SEQUENCE`], always in `[0, 7]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceIndex(u8);

impl SequenceIndex {
    /// Current index value.
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// The pattern at the current index.
    #[inline]
    pub fn pattern(self) -> CoilPattern {
        HALF_STEP_SEQUENCE[self.0 as usize]
    }

    /// Advance one step forward (7 wraps to 0) and return the new pattern.
    pub fn advance(&mut self) -> CoilPattern {
        self.0 = (self.0 + 1) % 8;
        self.pattern()
    }

    /// Retreat one step backward (0 wraps to 7) and return the new pattern.
    pub fn retreat(&mut self) -> CoilPattern {
        self.0 = (self.0 + 7) % 8;
        self.pattern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_forward_wraps_seven_to_zero() {
        let mut index = SequenceIndex::default();
        for _ in 0..7 {
            index.advance();
        }
        assert_eq!(index.value(), 7);
        index.advance();
        assert_eq!(index.value(), 0);
    }

    #[test]
    fn test_backward_wraps_zero_to_seven() {
        let mut index = SequenceIndex::default();
        let pattern = index.retreat();
        assert_eq!(index.value(), 7);
        assert_eq!(pattern, HALF_STEP_SEQUENCE[7]);
    }

    #[test]
    fn test_adjacent_patterns_differ_by_one_winding() {
        for i in 0..8 {
            let here = HALF_STEP_SEQUENCE[i].bits();
            let next = HALF_STEP_SEQUENCE[(i + 1) % 8].bits();
            let flipped = here.iter().zip(next.iter()).filter(|(a, b)| a != b).count();
            assert_eq!(flipped, 1, "entries {} and {} differ by {}", i, (i + 1) % 8, flipped);
        }
    }

    #[test]
    fn test_sequence_patterns_are_distinct() {
        for i in 0..8 {
            for j in (i + 1)..8 {
                assert_ne!(HALF_STEP_SEQUENCE[i], HALF_STEP_SEQUENCE[j]);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_index_stays_in_range(steps in proptest::collection::vec(any::<bool>(), 0..256)) {
            let mut index = SequenceIndex::default();
            let mut net: i32 = 0;
            for forward in steps {
                let pattern = if forward {
                    net += 1;
                    index.advance()
                } else {
                    net -= 1;
                    index.retreat()
                };
                prop_assert!(index.value() <= 7);
                prop_assert_eq!(pattern, index.pattern());
            }
            prop_assert_eq!(i32::from(index.value()), net.rem_euclid(8));
        }
    }
}
