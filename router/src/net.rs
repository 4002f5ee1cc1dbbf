use crate::grid::CostStamp;
use pcb_common::db::indices::{NetId, NetclassId};
use pcb_common::geom::coord::Location;
use std::collections::HashSet;

/// A pad mapped onto the grid: its centre on each layer it occupies and the
/// cell offsets its copper covers.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPin {
    pub pin_with_layers: Vec<Location>,
    pub pin_shape: Vec<(i32, i32)>,
}

impl GridPin {
    pub fn new(pin_with_layers: Vec<Location>, pin_shape: Vec<(i32, i32)>) -> Self {
        Self {
            pin_with_layers,
            pin_shape,
        }
    }

    /// Centre on the first layer the pad occupies.
    pub fn location(&self) -> Option<Location> {
        self.pin_with_layers.first().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Via {
    pub x: i32,
    pub y: i32,
    pub from_layer: i32,
    pub to_layer: i32,
}

impl Via {
    pub fn location(&self) -> Location {
        Location::new(self.x, self.y, self.from_layer)
    }
}

/// One connected run of cells produced by a single search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridPath {
    pub cells: Vec<Location>,
}

impl GridPath {
    pub fn new(cells: Vec<Location>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Planar grid steps along the path.
    pub fn wirelength(&self) -> usize {
        self.cells
            .windows(2)
            .filter(|w| w[0].layer == w[1].layer)
            .map(|w| w[0].manhattan_distance(&w[1]) as usize)
            .sum()
    }

    pub fn vias(&self) -> Vec<Via> {
        self.cells
            .windows(2)
            .filter(|w| w[0].layer != w[1].layer)
            .map(|w| Via {
                x: w[0].x,
                y: w[0].y,
                from_layer: w[0].layer,
                to_layer: w[1].layer,
            })
            .collect()
    }

    /// Endpoints and bends only: collinear runs on one layer collapse to
    /// their two ends, and every layer change keeps both sides.
    pub fn corners(&self) -> Vec<Location> {
        let n = self.cells.len();
        if n <= 2 {
            return self.cells.clone();
        }
        let mut out = vec![self.cells[0]];
        for i in 1..n - 1 {
            let (a, b, c) = (self.cells[i - 1], self.cells[i], self.cells[i + 1]);
            let straight = a.layer == b.layer
                && b.layer == c.layer
                && (b.x - a.x, b.y - a.y) == (c.x - b.x, c.y - b.y);
            if !straight {
                out.push(b);
            }
        }
        out.push(self.cells[n - 1]);
        out
    }

    pub fn is_contiguous(&self) -> bool {
        self.cells.windows(2).all(|w| w[0].is_adjacent(&w[1]))
    }
}

/// A net to be routed: its terminals, sizing in grid cells, and the geometry
/// found by the last successful search.
#[derive(Clone, Debug)]
pub struct MultipinRoute {
    pub net_id: NetId,
    pub grid_netclass_id: NetclassId,
    pub name: String,
    pub pins: Vec<Location>,
    /// Pad geometry per pin, when the net came from a board. Through-hole pads
    /// make every layer of the pin a valid terminal.
    pub grid_pins: Vec<GridPin>,
    /// Terminal cells not yet reached by the search in progress, or left
    /// unreached by the last failed attempt.
    pub target_pins: HashSet<Location>,
    pub features: Vec<Location>,
    pub paths: Vec<GridPath>,
    pub vias: Vec<Via>,
    pub trace_width: i32,
    pub clearance: i32,
    pub via_size: i32,
    pub current_route_cost: f64,
    pub(crate) stamp: Option<CostStamp>,
}

impl MultipinRoute {
    pub fn new(net_id: NetId, pins: Vec<Location>) -> Self {
        Self {
            net_id,
            grid_netclass_id: NetclassId::new(0),
            name: format!("net{}", net_id.index()),
            pins,
            grid_pins: Vec::new(),
            target_pins: HashSet::new(),
            features: Vec::new(),
            paths: Vec::new(),
            vias: Vec::new(),
            trace_width: 1,
            clearance: 0,
            via_size: 1,
            current_route_cost: 0.0,
            stamp: None,
        }
    }

    pub fn with_sizes(mut self, trace_width: i32, clearance: i32, via_size: i32) -> Self {
        self.trace_width = trace_width.max(1);
        self.clearance = clearance.max(0);
        self.via_size = via_size.max(1);
        self
    }

    pub fn with_grid_pins(mut self, grid_pins: Vec<GridPin>) -> Self {
        self.pins = grid_pins.iter().filter_map(GridPin::location).collect();
        self.grid_pins = grid_pins;
        self
    }

    pub fn trace_radius(&self) -> i32 {
        self.trace_width / 2
    }

    pub fn via_radius(&self) -> i32 {
        self.via_size / 2
    }

    /// Whether the route is currently rasterized into the grid.
    pub fn is_routed(&self) -> bool {
        self.stamp.is_some()
    }

    pub fn stamp(&self) -> Option<&CostStamp> {
        self.stamp.as_ref()
    }

    /// Terminal groups: one entry per pin listing every cell that counts as
    /// reaching it.
    pub fn terminals(&self) -> Vec<Vec<Location>> {
        if self.grid_pins.is_empty() {
            self.pins.iter().map(|&p| vec![p]).collect()
        } else {
            self.grid_pins
                .iter()
                .filter(|p| !p.pin_with_layers.is_empty())
                .map(|p| p.pin_with_layers.clone())
                .collect()
        }
    }

    pub fn needs_routing(&self) -> bool {
        self.terminals().len() >= 2
    }

    pub fn clear_geometry(&mut self) {
        self.features.clear();
        self.paths.clear();
        self.vias.clear();
        self.target_pins.clear();
        self.current_route_cost = 0.0;
    }

    pub(crate) fn push_path(&mut self, cells: Vec<Location>, cost: f64) {
        let path = GridPath::new(cells);
        self.vias.extend(path.vias());
        self.features.extend_from_slice(&path.cells);
        self.current_route_cost += cost;
        self.paths.push(path);
    }

    pub fn routed_wirelength(&self) -> usize {
        self.paths.iter().map(GridPath::wirelength).sum()
    }

    pub fn routed_num_vias(&self) -> usize {
        self.vias.len()
    }
}
