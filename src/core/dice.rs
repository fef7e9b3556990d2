//! Dice pool for a player

use crate::core::{DiceKind, Element};
use crate::{Result, TcgError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiset of dice, kept in canonical order (omni first, then element order)
/// so that indices seen by a client stay meaningful until the next mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DicePool {
    dice: Vec<DiceKind>,
}

impl DicePool {
    pub fn new() -> Self {
        DicePool { dice: Vec::new() }
    }

    pub fn from_dice(dice: impl IntoIterator<Item = DiceKind>) -> Self {
        let mut pool = DicePool {
            dice: dice.into_iter().collect(),
        };
        pool.dice.sort();
        pool
    }

    /// Draw one die: omni with probability `omni_probability`, otherwise a
    /// uniformly chosen element.
    pub fn roll_die<R: Rng + ?Sized>(rng: &mut R, omni_probability: f64) -> DiceKind {
        if rng.gen_bool(omni_probability) {
            DiceKind::Omni
        } else {
            DiceKind::from(Element::ALL[rng.gen_range(0..Element::ALL.len())])
        }
    }

    /// Replace the pool with `count` freshly rolled dice
    pub fn roll<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, omni_probability: f64) {
        self.dice.clear();
        for _ in 0..count {
            self.dice.push(Self::roll_die(rng, omni_probability));
        }
        self.dice.sort();
    }

    /// Re-roll the dice at `indices` once. Indices refer to the current order.
    pub fn reroll<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        indices: &[usize],
        omni_probability: f64,
    ) -> Result<()> {
        let mut seen = vec![false; self.dice.len()];
        for &i in indices {
            if i >= self.dice.len() {
                return Err(TcgError::InvalidPayload(format!(
                    "die index {i} out of range (pool has {})",
                    self.dice.len()
                )));
            }
            if seen[i] {
                return Err(TcgError::InvalidPayload(format!("die index {i} listed twice")));
            }
            seen[i] = true;
        }
        for &i in indices {
            self.dice[i] = Self::roll_die(rng, omni_probability);
        }
        self.dice.sort();
        Ok(())
    }

    pub fn add(&mut self, kind: DiceKind) {
        self.dice.push(kind);
        self.dice.sort();
    }

    /// Remove one die of `kind`; false if none present
    pub fn remove(&mut self, kind: DiceKind) -> bool {
        match self.dice.iter().position(|d| *d == kind) {
            Some(pos) => {
                self.dice.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn count(&self, kind: DiceKind) -> u8 {
        self.dice.iter().filter(|d| **d == kind).count() as u8
    }

    /// Count table indexed by `DiceKind::index`
    pub fn counts(&self) -> [u8; 8] {
        let mut counts = [0u8; 8];
        for d in &self.dice {
            counts[d.index()] += 1;
        }
        counts
    }

    /// Rebuild the pool from a count table
    pub fn set_counts(&mut self, counts: [u8; 8]) {
        self.dice.clear();
        for kind in DiceKind::ALL {
            for _ in 0..counts[kind.index()] {
                self.dice.push(kind);
            }
        }
    }

    pub fn dice(&self) -> &[DiceKind] {
        &self.dice
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn clear(&mut self) {
        self.dice.clear();
    }
}

impl fmt::Display for DicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = DiceKind::ALL
            .iter()
            .filter_map(|k| {
                let n = self.count(*k);
                (n > 0).then(|| format!("{n}{k}"))
            })
            .collect();
        if parts.is_empty() {
            f.write_str("no dice")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}
