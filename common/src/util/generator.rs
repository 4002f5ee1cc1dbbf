use crate::db::core::{BoardDB, NetData, NetclassData, PadData, PadLayers, PadShape};
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

const PAD_PITCH: f64 = 1.0;
const PAD_SIZE: f64 = 0.5;

pub struct BoardSpec {
    pub width: f64,
    pub height: f64,
    pub layers: usize,
    pub nets: usize,
    pub pins_per_net: usize,
    /// Fraction of pads generated as through-hole.
    pub through_hole_ratio: f64,
}

impl Default for BoardSpec {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            layers: 2,
            nets: 8,
            pins_per_net: 2,
            through_hole_ratio: 0.25,
        }
    }
}

/// Builds a random board with pads snapped to a coarse pitch so no two pads overlap.
pub fn generate_random_board(spec: &BoardSpec, seed: u64) -> BoardDB {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut db = BoardDB::new();
    db.outline = Rect::new(Point::new(0.0, 0.0), Point::new(spec.width, spec.height));

    let layers = spec.layers.max(1);
    for l in 0..layers {
        db.add_layer(format!("L{}.Cu", l + 1));
    }
    let netclass = db.add_netclass(NetclassData::default());

    let cols = ((spec.width / PAD_PITCH) as usize).saturating_sub(1).max(1);
    let rows = ((spec.height / PAD_PITCH) as usize).saturating_sub(1).max(1);
    let capacity = cols * rows;
    let wanted = spec.nets * spec.pins_per_net;
    if wanted > capacity {
        log::warn!(
            "Requested {} pads but only {} sites fit; truncating nets",
            wanted,
            capacity
        );
    }

    let mut used = HashSet::new();
    let pins_per_net = spec.pins_per_net.max(2);
    let num_nets = spec.nets.min(capacity / pins_per_net);

    for n in 0..num_nets {
        let mut net = NetData::new(format!("N{}", n));
        net.netclass = Some(netclass);
        let net_id = db.add_net(net);

        for p in 0..pins_per_net {
            let site = loop {
                let site = (rng.gen_range(0..cols), rng.gen_range(0..rows));
                if used.insert(site) {
                    break site;
                }
            };
            let layers = if rng.gen_bool(spec.through_hole_ratio.clamp(0.0, 1.0)) {
                PadLayers::All
            } else {
                let l = rng.gen_range(0..layers);
                PadLayers::Single(db.layers[l].name.clone())
            };
            db.add_pad(PadData {
                name: format!("N{}.P{}", n, p),
                position: Point::new(
                    (site.0 + 1) as f64 * PAD_PITCH,
                    (site.1 + 1) as f64 * PAD_PITCH,
                ),
                shape: PadShape::Rect {
                    width: PAD_SIZE,
                    height: PAD_SIZE,
                },
                layers,
                net: Some(net_id),
            });
        }
    }

    log::info!(
        "Generated board {:.1}x{:.1} with {} layers, {} nets, {} pads",
        spec.width,
        spec.height,
        layers,
        db.num_nets(),
        db.num_pads()
    );
    db
}
