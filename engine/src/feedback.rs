//! Feedback computation for a (guess, answer) pair
//!
//! Each position gets a ternary digit: 0 = absent, 1 = present elsewhere,
//! 2 = correct position. The five digits are packed base-3 with the first
//! position most significant, giving a code in 0..=242.
//!
//! Duplicate letters follow the usual two-pass rule: exact matches consume
//! their letter first, then the remaining guess letters draw "present" marks
//! from whatever count of that letter the answer has left.

use crate::error::{LookupError, Result};
use crate::word::{Word, WORD_LEN};
use std::fmt;

/// Number of distinct feedback codes
pub const FEEDBACK_COUNT: u16 = 243;

/// Packed feedback code in 0..=242
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Feedback(u8);

impl Feedback {
    /// Every letter in the correct position
    pub const ALL_CORRECT: Feedback = Feedback(242);

    /// Validate a raw code (as read from a trace or a table file)
    pub fn new(code: u16) -> Result<Self> {
        if code >= FEEDBACK_COUNT {
            return Err(LookupError::InvalidFeedback(code));
        }
        Ok(Feedback(code as u8))
    }

    /// Compose a code from per-position digits; any digit above 2 is rejected.
    pub fn from_digits(digits: [u8; WORD_LEN]) -> Result<Self> {
        let mut code = 0u16;
        for d in digits {
            if d > 2 {
                return Err(LookupError::InvalidFeedback(u16::from(d)));
            }
            code = code * 3 + u16::from(d);
        }
        Feedback::new(code)
    }

    /// Per-position digits, first position first
    pub fn digits(self) -> [u8; WORD_LEN] {
        let mut digits = [0u8; WORD_LEN];
        let mut rest = self.0;
        for slot in digits.iter_mut().rev() {
            *slot = rest % 3;
            rest /= 3;
        }
        digits
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn is_solved(self) -> bool {
        self == Feedback::ALL_CORRECT
    }
}

/// Renders the colour pattern, e.g. `BGGYB` (Black/Yellow/Green).
impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.digits() {
            let c = match d {
                2 => 'G',
                1 => 'Y',
                _ => 'B',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Feedback the guesser sees after playing `guess` when the answer is `answer`.
pub fn feedback(guess: Word, answer: Word) -> Feedback {
    let guess = guess.letters();
    let answer = answer.letters();

    let mut remaining = [0u8; 26];
    for &l in &answer {
        remaining[l as usize] += 1;
    }

    let mut digits = [0u8; WORD_LEN];

    // Pass 1: exact matches
    for pos in 0..WORD_LEN {
        if guess[pos] == answer[pos] {
            digits[pos] = 2;
            remaining[guess[pos] as usize] -= 1;
        }
    }

    // Pass 2: present elsewhere, limited by what is left of each letter
    for pos in 0..WORD_LEN {
        let slot = &mut remaining[guess[pos] as usize];
        if digits[pos] == 0 && *slot > 0 {
            digits[pos] = 1;
            *slot -= 1;
        }
    }

    let code = digits.iter().fold(0u8, |acc, &d| acc * 3 + d);
    Feedback(code)
}
