//! Cost payment
//!
//! Payment is planned against a snapshot of the pool and applied only when
//! the whole plan succeeds. Omni dice are the last resort for every atom
//! except pure omni demands.

use crate::core::{Cost, CostAtom, DiceKind, DicePool, Element};
use crate::{Result, TcgError};
use serde::{Deserialize, Serialize};

/// Dice and energy a payment consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentPlan {
    /// Dice spent per kind, indexed by `DiceKind::index`
    pub dice: [u8; 8],
    pub energy: u8,
}

impl PaymentPlan {
    pub fn dice_spent(&self) -> usize {
        self.dice.iter().map(|n| *n as usize).sum()
    }

    pub fn spent(&self, kind: DiceKind) -> u8 {
        self.dice[kind.index()]
    }
}

fn unpayable(cost: &Cost, why: &str) -> TcgError {
    TcgError::UnpayableCost(format!("cannot pay {cost}: {why}"))
}

/// Plan a payment of `cost` from `pool` for a character of `active_element`
/// holding `energy` points.
pub fn plan(
    cost: &Cost,
    pool: &DicePool,
    active_element: Option<Element>,
    energy: u8,
) -> Result<PaymentPlan> {
    let mut remaining = pool.counts();
    let mut plan = PaymentPlan {
        energy: cost.energy_count(),
        ..PaymentPlan::default()
    };
    if plan.energy > energy {
        return Err(unpayable(cost, "not enough energy"));
    }

    let omni = DiceKind::Omni.index();
    let mut specific = [0u8; 7];
    let mut omni_only = 0u8;
    let mut unaligned = 0u8;
    for atom in cost.atoms() {
        match atom {
            CostAtom::Specific(e) => specific[DiceKind::from(*e).index() - 1] += 1,
            CostAtom::Same => match active_element {
                Some(e) => specific[DiceKind::from(e).index() - 1] += 1,
                None => omni_only += 1,
            },
            CostAtom::Omni => omni_only += 1,
            CostAtom::Unaligned => unaligned += 1,
            CostAtom::Energy => {}
        }
    }

    if remaining[omni] < omni_only {
        return Err(unpayable(cost, "not enough omni dice"));
    }
    remaining[omni] -= omni_only;
    plan.dice[omni] += omni_only;

    for (offset, need) in specific.iter().enumerate() {
        let kind = offset + 1;
        let real = remaining[kind].min(*need);
        remaining[kind] -= real;
        plan.dice[kind] += real;
        let rest = need - real;
        if remaining[omni] < rest {
            return Err(unpayable(cost, "not enough matching dice"));
        }
        remaining[omni] -= rest;
        plan.dice[omni] += rest;
    }

    for _ in 0..unaligned {
        // Most abundant element first; the earliest kind wins ties
        let pick = (1..remaining.len())
            .filter(|&k| remaining[k] > 0)
            .max_by(|&a, &b| remaining[a].cmp(&remaining[b]).then(b.cmp(&a)));
        let kind = match pick {
            Some(kind) => kind,
            None if remaining[omni] > 0 => omni,
            None => return Err(unpayable(cost, "not enough dice")),
        };
        remaining[kind] -= 1;
        plan.dice[kind] += 1;
    }

    Ok(plan)
}

pub fn can_pay(cost: &Cost, pool: &DicePool, active_element: Option<Element>, energy: u8) -> bool {
    plan(cost, pool, active_element, energy).is_ok()
}

/// Plan and apply a payment. On error neither the pool nor the energy changes.
pub fn pay(
    cost: &Cost,
    pool: &mut DicePool,
    active_element: Option<Element>,
    energy: &mut u8,
) -> Result<PaymentPlan> {
    let plan = plan(cost, pool, active_element, *energy)?;
    let mut counts = pool.counts();
    for (kind, spent) in plan.dice.iter().enumerate() {
        counts[kind] -= spent;
    }
    pool.set_counts(counts);
    *energy -= plan.energy;
    Ok(plan)
}
