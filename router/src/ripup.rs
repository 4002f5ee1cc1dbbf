//! Strategies for choosing which net to rip up next.
//!
//! Selection only affects solution quality; the driver is correct with any
//! of these.

use crate::net::MultipinRoute;
use pcb_common::util::config::RipUpPolicyKind;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub trait RipUpPolicy {
    /// Index into `nets` of the next net to rip up and reroute, or `None`
    /// when there is nothing worth rerouting.
    fn next_ripup_net(&mut self, nets: &[MultipinRoute]) -> Option<usize>;
}

fn candidates(nets: &[MultipinRoute]) -> Vec<usize> {
    nets.iter()
        .enumerate()
        .filter(|(_, n)| n.needs_routing())
        .map(|(i, _)| i)
        .collect()
}

/// Alternates between unrouted nets, in rotation, and the routed net with
/// the highest route cost that was not ripped up last time. Unrouted nets
/// go first.
pub struct HighestCostPolicy {
    last_routed: Option<usize>,
    last_unrouted: Option<usize>,
    unrouted_turn: bool,
}

impl HighestCostPolicy {
    fn next_unrouted(&self, unrouted: &[usize]) -> usize {
        let after_last = self.last_unrouted.map_or(0, |l| l + 1);
        unrouted
            .iter()
            .copied()
            .find(|&i| i >= after_last)
            .unwrap_or(unrouted[0])
    }

    fn highest_routed(&self, nets: &[MultipinRoute], routed: &[usize]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for &i in routed {
            if routed.len() > 1 && Some(i) == self.last_routed {
                continue;
            }
            if best.is_none_or(|b| nets[i].current_route_cost > nets[b].current_route_cost) {
                best = Some(i);
            }
        }
        best
    }
}

impl RipUpPolicy for HighestCostPolicy {
    /// Unrouted nets and the costliest routed net take turns, so a net that
    /// can never be routed does not pin the loop to itself.
    fn next_ripup_net(&mut self, nets: &[MultipinRoute]) -> Option<usize> {
        let candidates = candidates(nets);
        if candidates.is_empty() {
            return None;
        }

        let (routed, unrouted): (Vec<usize>, Vec<usize>) =
            candidates.into_iter().partition(|&i| nets[i].is_routed());
        let take_unrouted = !unrouted.is_empty() && (self.unrouted_turn || routed.is_empty());
        let pick = if take_unrouted {
            let pick = self.next_unrouted(&unrouted);
            self.last_unrouted = Some(pick);
            pick
        } else {
            let pick = self.highest_routed(nets, &routed)?;
            self.last_routed = Some(pick);
            pick
        };
        self.unrouted_turn = !take_unrouted;
        Some(pick)
    }
}

impl Default for HighestCostPolicy {
    fn default() -> Self {
        Self {
            last_routed: None,
            last_unrouted: None,
            unrouted_turn: true,
        }
    }
}

#[derive(Default)]
pub struct RoundRobinPolicy {
    next: usize,
}

impl RipUpPolicy for RoundRobinPolicy {
    fn next_ripup_net(&mut self, nets: &[MultipinRoute]) -> Option<usize> {
        let candidates = candidates(nets);
        let pick = candidates
            .iter()
            .copied()
            .find(|&i| i >= self.next)
            .or_else(|| candidates.first().copied())?;
        self.next = pick + 1;
        Some(pick)
    }
}

pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl RipUpPolicy for RandomPolicy {
    fn next_ripup_net(&mut self, nets: &[MultipinRoute]) -> Option<usize> {
        candidates(nets).choose(&mut self.rng).copied()
    }
}

pub fn make_policy(kind: RipUpPolicyKind, seed: Option<u64>) -> Box<dyn RipUpPolicy> {
    match kind {
        RipUpPolicyKind::HighestCost => Box::new(HighestCostPolicy::default()),
        RipUpPolicyKind::RoundRobin => Box::new(RoundRobinPolicy::default()),
        RipUpPolicyKind::Random => Box::new(RandomPolicy::new(seed)),
    }
}
