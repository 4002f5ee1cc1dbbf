//! Connectivity verification of a routed net list.

use crate::net::MultipinRoute;
use pcb_common::db::indices::NetId;
use pcb_common::geom::coord::Location;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    Unrouted { net: NetId },
    /// A pin of a routed net that no path reaches.
    Open { net: NetId, pin: Location },
    Discontinuous { net: NetId, path: usize },
    Short { a: NetId, b: NetId, at: Location },
}

#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    pub violations: Vec<Violation>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn unrouted(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::Unrouted { .. }))
            .count()
    }

    pub fn shorts(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::Short { .. }))
            .count()
    }
}

fn check_net(net: &MultipinRoute) -> Vec<Violation> {
    if !net.needs_routing() {
        return Vec::new();
    }
    if !net.is_routed() {
        return vec![Violation::Unrouted { net: net.net_id }];
    }

    let mut out = Vec::new();
    for (i, path) in net.paths.iter().enumerate() {
        if !path.is_contiguous() {
            out.push(Violation::Discontinuous {
                net: net.net_id,
                path: i,
            });
        }
    }

    let on_route: HashSet<Location> = net.features.iter().copied().collect();
    for group in net.terminals() {
        if !group.iter().any(|l| on_route.contains(l)) {
            out.push(Violation::Open {
                net: net.net_id,
                pin: group[0],
            });
        }
    }
    out
}

fn check_shorts(nets: &[MultipinRoute]) -> Vec<Violation> {
    let mut owner: HashMap<Location, NetId> = HashMap::new();
    let mut out = Vec::new();

    // pins claim their cells first, so a trace over a foreign pad is a short
    for net in nets {
        for l in net.terminals().into_iter().flatten() {
            owner.entry(l).or_insert(net.net_id);
        }
    }
    for net in nets.iter().filter(|n| n.is_routed()) {
        for &l in &net.features {
            match owner.get(&l) {
                Some(&other) if other != net.net_id => out.push(Violation::Short {
                    a: other,
                    b: net.net_id,
                    at: l,
                }),
                Some(_) => {}
                None => {
                    owner.insert(l, net.net_id);
                }
            }
        }
    }
    out
}

/// Checks every net for completeness and continuity in parallel, then looks
/// for cells claimed by more than one net.
pub fn run(nets: &[MultipinRoute]) -> CheckReport {
    log::info!("Starting Routing Verification over {} nets", nets.len());

    let (per_net, shorts) = rayon::join(
        || {
            nets.par_iter()
                .flat_map_iter(check_net)
                .collect::<Vec<_>>()
        },
        || check_shorts(nets),
    );

    let report = CheckReport {
        violations: per_net.into_iter().chain(shorts).collect(),
    };

    for v in &report.violations {
        log::error!("{:?}", v);
    }
    if report.shorts() == 0 {
        log::info!("\x1b[32mPASS\x1b[0m: No shorts between nets.");
    } else {
        log::error!("\x1b[31mFAIL\x1b[0m: {} short(s) detected", report.shorts());
    }
    if report.is_clean() {
        log::info!("\x1b[32mPASS\x1b[0m: All nets are fully connected.");
    } else if report.unrouted() > 0 {
        log::warn!("{} net(s) left unrouted", report.unrouted());
    }
    report
}
