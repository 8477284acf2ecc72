//! Percentile dice abstraction used by every probabilistic component.
//!
//! Any [`rand::RngCore`] is a [`Dice`]. [`ScriptedDice`] replays a fixed roll
//! sequence, which is how reference playtraces are reproduced exactly.

use rand::{Rng, RngCore};
use std::collections::VecDeque;

/// Source of uniform rolls.
pub trait Dice {
    /// Uniform roll in `0..100`.
    fn percent(&mut self) -> u8;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// Roll a percentile against `pct`. Always consumes exactly one roll so
    /// that roll sequences stay aligned regardless of the chance value.
    fn chance(&mut self, pct: i32) -> bool {
        i32::from(self.percent()) < pct
    }
}

impl<R: RngCore> Dice for R {
    fn percent(&mut self) -> u8 {
        self.gen_range(0..100)
    }

    fn index(&mut self, len: usize) -> usize {
        self.gen_range(0..len.max(1))
    }
}

/// Dice that replay a queue of pre-recorded rolls.
///
/// Percentile rolls are taken verbatim (clamped to `0..100`); index rolls take
/// the next value modulo `len`. An exhausted script rolls 99, which fails
/// every chance below 100.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u8>,
    consumed: usize,
}

impl ScriptedDice {
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            consumed: 0,
        }
    }

    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    fn next_roll(&mut self) -> u8 {
        self.consumed += 1;
        self.rolls.pop_front().unwrap_or(99)
    }
}

impl Dice for ScriptedDice {
    fn percent(&mut self) -> u8 {
        self.next_roll().min(99)
    }

    fn index(&mut self, len: usize) -> usize {
        usize::from(self.next_roll()) % len.max(1)
    }
}
