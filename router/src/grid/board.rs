use super::cell::GridCell;
use crate::algo::dijkstra::SearchParams;
use crate::error::{Result, RouterError};
use crate::net::{GridPin, MultipinRoute};
use crate::utils::raster::{inflate_offsets, rasterized_circle};
use pcb_common::geom::coord::Location;
use pcb_common::util::config::RoutingConfig;
use std::collections::{BTreeMap, HashSet};

/// Occupy cost of a keepout cell. Large but finite so sums stay comparable.
pub const FORBIDDEN_COST: f64 = 1.0e7;

#[derive(Clone, Copy, Debug)]
pub struct GridCosts {
    pub step_cost: f64,
    pub layer_change_cost: f64,
    pub via_insertion_cost: f64,
    pub trace_basic_cost: f64,
    pub max_layers: usize,
}

impl From<&RoutingConfig> for GridCosts {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            step_cost: config.step_cost,
            layer_change_cost: config.layer_change_cost,
            via_insertion_cost: config.via_insertion_cost,
            trace_basic_cost: config.trace_basic_cost,
            max_layers: config.max_layers,
        }
    }
}

impl Default for GridCosts {
    fn default() -> Self {
        Self::from(&RoutingConfig::default())
    }
}

/// Exact per-cell record of what one route wrote into the grid.
///
/// Rip-up subtracts these entries instead of re-rasterizing the geometry, so
/// overlapping discs of the same route are counted once on the way in and
/// once on the way out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CostStamp {
    base: BTreeMap<usize, f64>,
    via: BTreeMap<usize, f64>,
}

impl CostStamp {
    pub fn num_cells(&self) -> usize {
        self.base.len()
    }

    pub fn base_delta(&self, id: usize) -> f64 {
        self.base.get(&id).copied().unwrap_or(0.0)
    }

    fn merge_max(map: &mut BTreeMap<usize, f64>, id: usize, value: f64) {
        map.entry(id)
            .and_modify(|v| *v = v.max(value))
            .or_insert(value);
    }
}

/// The routing cost grid: `w * h * l` cells stored layer-major in one buffer.
/// Dimensions are fixed once initialized.
#[derive(Clone)]
pub struct BoardGrid {
    w: i32,
    h: i32,
    l: i32,
    pub(crate) cells: Vec<GridCell>,
    pub(crate) costs: GridCosts,
    pub(crate) search_tag: u32,
}

impl BoardGrid {
    /// An empty grid; call [`BoardGrid::initialize`] before use.
    pub fn new(costs: GridCosts) -> Self {
        Self {
            w: 0,
            h: 0,
            l: 0,
            cells: Vec::new(),
            costs,
            search_tag: 0,
        }
    }

    pub fn with_dimensions(w: i32, h: i32, l: i32, costs: GridCosts) -> Result<Self> {
        let mut grid = Self::new(costs);
        grid.initialize(w, h, l)?;
        Ok(grid)
    }

    pub fn initialize(&mut self, w: i32, h: i32, l: i32) -> Result<()> {
        if self.is_initialized() {
            return Err(RouterError::AlreadyInitialized);
        }
        if w <= 0 || h <= 0 || l <= 0 {
            return Err(RouterError::InvalidDimensions { w, h, layers: l });
        }
        if l as usize > self.costs.max_layers {
            return Err(RouterError::TooManyLayers {
                layers: l as usize,
                max: self.costs.max_layers,
            });
        }
        let size = (w as usize)
            .checked_mul(h as usize)
            .and_then(|s| s.checked_mul(l as usize))
            .ok_or(RouterError::InvalidDimensions { w, h, layers: l })?;

        if size > 200_000_000 {
            log::warn!(
                "Allocating large BoardGrid: {} cells. Ensure sufficient RAM.",
                size
            );
        }
        log::debug!("Initializing BoardGrid {}x{}x{}", w, h, l);

        self.w = w;
        self.h = h;
        self.l = l;
        self.cells = vec![GridCell::default(); size];
        self.search_tag = 0;
        Ok(())
    }

    /// Drops all storage so the grid can be initialized again.
    pub fn reset(&mut self) {
        self.w = 0;
        self.h = 0;
        self.l = 0;
        self.cells = Vec::new();
        self.search_tag = 0;
    }

    pub fn is_initialized(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn width(&self) -> i32 {
        self.w
    }
    pub fn height(&self) -> i32 {
        self.h
    }
    pub fn layers(&self) -> i32 {
        self.l
    }
    pub fn size(&self) -> usize {
        self.cells.len()
    }
    pub fn costs(&self) -> &GridCosts {
        &self.costs
    }

    #[inline(always)]
    pub fn validate_location(&self, l: &Location) -> bool {
        l.x >= 0 && l.x < self.w && l.y >= 0 && l.y < self.h && l.layer >= 0 && l.layer < self.l
    }

    #[inline(always)]
    pub(crate) fn idx(&self, l: Location) -> usize {
        ((l.layer as usize) * (self.h as usize) + (l.y as usize)) * (self.w as usize)
            + (l.x as usize)
    }

    pub fn location_to_id(&self, l: &Location) -> Result<usize> {
        if !self.validate_location(l) {
            return Err(RouterError::OutOfBounds(*l));
        }
        Ok(self.idx(*l))
    }

    pub fn id_to_location(&self, id: usize) -> Location {
        let plane = (self.w as usize) * (self.h as usize);
        let layer = id / plane;
        let rem = id % plane;
        Location::new(
            (rem % self.w as usize) as i32,
            (rem / self.w as usize) as i32,
            layer as i32,
        )
    }

    pub fn cell(&self, l: &Location) -> Result<&GridCell> {
        let id = self.location_to_id(l)?;
        Ok(&self.cells[id])
    }

    // base cost

    pub fn base_cost_fill(&mut self, value: f64) {
        for c in &mut self.cells {
            c.base_cost = value;
        }
    }

    pub fn base_cost_at(&self, l: &Location) -> Result<f64> {
        Ok(self.cell(l)?.base_cost)
    }

    pub fn base_cost_set(&mut self, value: f64, l: &Location) -> Result<()> {
        let id = self.location_to_id(l)?;
        self.cells[id].base_cost = value;
        Ok(())
    }

    pub fn base_cost_add(&mut self, value: f64, l: &Location) -> Result<()> {
        let id = self.location_to_id(l)?;
        self.cells[id].base_cost += value;
        Ok(())
    }

    // via cost

    pub fn via_cost_at(&self, l: &Location) -> Result<f64> {
        Ok(self.cell(l)?.via_cost)
    }

    pub fn via_cost_set(&mut self, value: f64, l: &Location) -> Result<()> {
        let id = self.location_to_id(l)?;
        self.cells[id].via_cost = value;
        Ok(())
    }

    pub fn via_cost_add(&mut self, value: f64, l: &Location) -> Result<()> {
        let id = self.location_to_id(l)?;
        self.cells[id].via_cost += value;
        Ok(())
    }

    // obstacles

    pub fn set_forbidden(&mut self, l: &Location, forbidden: bool) -> Result<()> {
        let id = self.location_to_id(l)?;
        self.cells[id].forbidden = forbidden;
        Ok(())
    }

    pub fn is_forbidden(&self, l: &Location) -> Result<bool> {
        Ok(self.cell(l)?.forbidden)
    }

    pub fn set_via_forbidden(&mut self, l: &Location, forbidden: bool) -> Result<()> {
        let id = self.location_to_id(l)?;
        self.cells[id].via_forbidden = forbidden;
        Ok(())
    }

    /// True when a keepout or at least one stamped pad forbids a via here.
    pub fn is_via_forbidden(&self, l: &Location) -> Result<bool> {
        Ok(self.cell(l)?.blocks_via())
    }

    /// A through via at (x, y) is blocked if any layer forbids it there.
    pub(crate) fn via_blocked_at(&self, x: i32, y: i32) -> bool {
        (0..self.l).any(|layer| self.cells[self.idx(Location::new(x, y, layer))].blocks_via())
    }

    #[inline(always)]
    pub(crate) fn obstacle_cost(&self, id: usize) -> f64 {
        let c = &self.cells[id];
        if c.forbidden {
            c.base_cost + FORBIDDEN_COST
        } else {
            c.base_cost
        }
    }

    /// Cost of placing copper on one cell: step cost plus base cost, plus
    /// [`FORBIDDEN_COST`] on keepout cells.
    pub fn cost_to_occupy(&self, l: &Location) -> Result<f64> {
        let id = self.location_to_id(l)?;
        Ok(self.costs.step_cost + self.obstacle_cost(id))
    }

    /// Sum of obstacle cost over `disc` centred on `l`, same layer. Cells off
    /// the grid contribute nothing.
    pub(crate) fn disc_cost(&self, l: Location, disc: &[(i32, i32)]) -> f64 {
        let mut total = 0.0;
        for &(dx, dy) in disc {
            let p = Location::new(l.x + dx, l.y + dy, l.layer);
            if self.validate_location(&p) {
                total += self.obstacle_cost(self.idx(p));
            }
        }
        total
    }

    /// Sum of via cost over `disc` centred on (l.x, l.y), across all layers.
    pub(crate) fn via_disc_cost(&self, l: Location, disc: &[(i32, i32)]) -> f64 {
        let mut total = 0.0;
        for layer in 0..self.l {
            for &(dx, dy) in disc {
                let p = Location::new(l.x + dx, l.y + dy, layer);
                if self.validate_location(&p) {
                    total += self.cells[self.idx(p)].via_cost;
                }
            }
        }
        total
    }

    /// Base cost aggregated over a trace disc of `trace_radius` cells.
    pub fn sized_trace_cost_at(&self, l: &Location, trace_radius: i32) -> Result<f64> {
        self.location_to_id(l)?;
        Ok(self.disc_cost(*l, &rasterized_circle(trace_radius)))
    }

    /// Via cost aggregated over a via footprint of `via_radius` cells on every layer.
    pub fn sized_via_cost_at(&self, l: &Location, via_radius: i32) -> Result<f64> {
        self.location_to_id(l)?;
        Ok(self.via_disc_cost(*l, &rasterized_circle(via_radius)))
    }

    // search targets

    pub fn set_targeted_pins(&mut self, pins: &[Location]) -> Result<()> {
        for p in pins {
            self.set_is_targeted_pin(p, true)?;
        }
        Ok(())
    }

    pub fn clear_targeted_pins(&mut self, pins: &[Location]) -> Result<()> {
        for p in pins {
            self.set_is_targeted_pin(p, false)?;
        }
        Ok(())
    }

    pub fn set_is_targeted_pin(&mut self, l: &Location, value: bool) -> Result<()> {
        let id = self.location_to_id(l)?;
        self.cells[id].is_targeted_pin = value;
        Ok(())
    }

    /// False for locations off the grid.
    pub fn is_targeted_pin(&self, l: &Location) -> bool {
        self.validate_location(l) && self.cells[self.idx(*l)].is_targeted_pin
    }

    // pins

    /// Stamps `value` over a pad's shape on each of its layers. A negative
    /// value undoes an earlier stamp, including its via block. Cells outside
    /// the grid are skipped.
    pub fn add_pin_avoiding_cost(
        &mut self,
        pin: &GridPin,
        value: f64,
        to_via_cost: bool,
        to_via_forbidden: bool,
        to_base_cost: bool,
        inflate: i32,
    ) -> Result<()> {
        let shape = inflate_offsets(&pin.pin_shape, inflate);
        for center in &pin.pin_with_layers {
            for &(dx, dy) in &shape {
                let p = Location::new(center.x + dx, center.y + dy, center.layer);
                if !self.validate_location(&p) {
                    continue;
                }
                let id = self.idx(p);
                let cell = &mut self.cells[id];
                if to_base_cost {
                    cell.base_cost += value;
                }
                if to_via_cost {
                    cell.via_cost += value;
                }
                if to_via_forbidden {
                    if value > 0.0 {
                        cell.pad_via_blocks = cell.pad_via_blocks.saturating_add(1);
                    } else if value < 0.0 {
                        cell.pad_via_blocks = cell.pad_via_blocks.saturating_sub(1);
                    }
                }
            }
        }
        Ok(())
    }

    // rasterization

    fn rasterize(&self, route: &MultipinRoute) -> CostStamp {
        let trace_disc = rasterized_circle(route.trace_radius() + route.clearance);
        let via_disc = rasterized_circle(route.via_radius() + route.clearance);
        let cost = self.costs.trace_basic_cost;
        let via_cost = self.costs.via_insertion_cost;
        let mut stamp = CostStamp::default();

        for f in &route.features {
            for &(dx, dy) in &trace_disc {
                let p = Location::new(f.x + dx, f.y + dy, f.layer);
                if self.validate_location(&p) {
                    let id = self.idx(p);
                    CostStamp::merge_max(&mut stamp.base, id, cost);
                    CostStamp::merge_max(&mut stamp.via, id, cost);
                }
            }
        }
        for via in &route.vias {
            for layer in 0..self.l {
                for &(dx, dy) in &via_disc {
                    let p = Location::new(via.x + dx, via.y + dy, layer);
                    if self.validate_location(&p) {
                        let id = self.idx(p);
                        CostStamp::merge_max(&mut stamp.base, id, cost);
                        CostStamp::merge_max(&mut stamp.via, id, via_cost);
                    }
                }
            }
        }
        stamp
    }

    /// Writes the route's trace and via footprints into base and via cost,
    /// keeping the exact deltas on the route for later removal.
    pub fn add_route_to_base_cost(&mut self, route: &mut MultipinRoute) -> Result<()> {
        if route.stamp.is_some() {
            return Err(RouterError::AlreadyRouted {
                net_id: route.net_id,
            });
        }
        let stamp = self.rasterize(route);
        for (&id, &d) in &stamp.base {
            self.cells[id].base_cost += d;
        }
        for (&id, &d) in &stamp.via {
            self.cells[id].via_cost += d;
        }
        route.stamp = Some(stamp);
        Ok(())
    }

    pub fn remove_route_from_base_cost(&mut self, route: &mut MultipinRoute) -> Result<()> {
        let stamp = route.stamp.take().ok_or(RouterError::InconsistentRipup {
            net_id: route.net_id,
        })?;
        for (&id, &d) in &stamp.base {
            self.cells[id].base_cost -= d;
        }
        for (&id, &d) in &stamp.via {
            self.cells[id].via_cost -= d;
        }
        Ok(())
    }

    // routes

    /// Connects every terminal of `route`, then rasterizes the result.
    ///
    /// Each search grows the net's tree by one terminal; cells already on the
    /// tree are zero-cost sources so later pins attach anywhere on it.
    pub fn add_route(&mut self, route: &mut MultipinRoute) -> Result<()> {
        if route.is_routed() {
            return Err(RouterError::AlreadyRouted {
                net_id: route.net_id,
            });
        }
        let terminals = route.terminals();
        for t in terminals.iter().flatten() {
            self.location_to_id(t)?;
        }
        route.clear_geometry();

        if terminals.len() < 2 {
            return self.add_route_to_base_cost(route);
        }

        let params = SearchParams {
            trace_radius: route.trace_radius(),
            via_radius: route.via_radius(),
        };
        let mut tree: Vec<Location> = terminals[0].clone();
        let mut on_tree: HashSet<Location> = tree.iter().copied().collect();
        let mut pending: Vec<&Vec<Location>> = terminals[1..]
            .iter()
            .filter(|t| !t.iter().any(|l| on_tree.contains(l)))
            .collect();
        route.target_pins = pending.iter().flat_map(|t| t.iter().copied()).collect();

        while !pending.is_empty() {
            let targets: Vec<Location> = pending.iter().flat_map(|t| t.iter().copied()).collect();
            self.set_targeted_pins(&targets)?;
            let hit = self.dijkstras_with_came_from(&tree, &params);
            self.clear_targeted_pins(&targets)?;

            let Some(hit) = hit? else {
                let unreached = pending.len();
                log::debug!(
                    "Net {:?}: frontier exhausted with {} pin(s) unreached",
                    route.net_id,
                    unreached
                );
                route.clear_geometry();
                route.target_pins = targets.into_iter().collect();
                return Err(RouterError::Unroutable {
                    net_id: route.net_id,
                    unreached,
                });
            };

            let path = self.came_from_to_features(hit.target);
            for &p in &path {
                if on_tree.insert(p) {
                    tree.push(p);
                }
            }
            pending.retain(|t| {
                let reached = t.iter().any(|l| on_tree.contains(l));
                if reached {
                    for &l in t.iter() {
                        if on_tree.insert(l) {
                            tree.push(l);
                        }
                    }
                }
                !reached
            });
            route.push_path(path, hit.cost);
            route.target_pins = pending.iter().flat_map(|t| t.iter().copied()).collect();
        }

        self.add_route_to_base_cost(route)
    }

    /// Undoes the rasterization of `route`. Geometry is kept on the route.
    pub fn ripup_route(&mut self, route: &mut MultipinRoute) -> Result<()> {
        self.remove_route_from_base_cost(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_common::db::indices::NetId;

    fn grid(w: i32, h: i32, l: i32) -> BoardGrid {
        BoardGrid::with_dimensions(w, h, l, GridCosts::default()).unwrap()
    }

    fn snapshot(g: &BoardGrid) -> Vec<(f64, f64)> {
        g.cells.iter().map(|c| (c.base_cost, c.via_cost)).collect()
    }

    fn assert_same_costs(a: &[(f64, f64)], b: &[(f64, f64)]) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x.0 - y.0).abs() < 1e-9, "base cost differs at {}", i);
            assert!((x.1 - y.1).abs() < 1e-9, "via cost differs at {}", i);
        }
    }

    #[test]
    fn initialize_rejects_bad_dimensions() {
        let mut g = BoardGrid::new(GridCosts::default());
        assert!(matches!(
            g.initialize(0, 5, 1),
            Err(RouterError::InvalidDimensions { .. })
        ));
        assert!(g.initialize(4, 5, -1).is_err());
        g.initialize(4, 5, 2).unwrap();
        assert_eq!(g.size(), 40);
        assert_eq!(g.initialize(4, 5, 2), Err(RouterError::AlreadyInitialized));
        g.reset();
        assert!(g.initialize(2, 2, 1).is_ok());
    }

    #[test]
    fn initialize_rejects_too_many_layers() {
        let costs = GridCosts {
            max_layers: 4,
            ..GridCosts::default()
        };
        assert_eq!(
            BoardGrid::with_dimensions(3, 3, 5, costs).err(),
            Some(RouterError::TooManyLayers { layers: 5, max: 4 })
        );
    }

    #[test]
    fn id_and_location_round_trip() {
        let g = grid(7, 5, 3);
        for id in [0, 6, 7, 34, 35, 104] {
            let l = g.id_to_location(id);
            assert_eq!(g.location_to_id(&l).unwrap(), id);
        }
    }

    #[test]
    fn out_of_bounds_access_is_reported() {
        let mut g = grid(3, 3, 1);
        let bad = Location::new(3, 0, 0);
        assert_eq!(g.base_cost_at(&bad), Err(RouterError::OutOfBounds(bad)));
        assert!(g.base_cost_add(1.0, &Location::new(0, -1, 0)).is_err());
        assert!(g.via_cost_set(1.0, &Location::new(0, 0, 1)).is_err());
        assert!(!g.is_targeted_pin(&bad));
    }

    #[test]
    fn base_cost_accessors() {
        let mut g = grid(3, 3, 2);
        let l = Location::new(1, 2, 1);
        g.base_cost_set(2.5, &l).unwrap();
        g.base_cost_add(1.5, &l).unwrap();
        assert_eq!(g.base_cost_at(&l).unwrap(), 4.0);
        assert_eq!(g.cost_to_occupy(&l).unwrap(), 5.0);
        g.base_cost_fill(0.5);
        assert_eq!(g.base_cost_at(&l).unwrap(), 0.5);
    }

    #[test]
    fn forbidden_cells_are_expensive_but_finite() {
        let mut g = grid(3, 3, 1);
        let l = Location::new(1, 1, 0);
        g.set_forbidden(&l, true).unwrap();
        let c = g.cost_to_occupy(&l).unwrap();
        assert!(c.is_finite());
        assert!(c >= FORBIDDEN_COST);
    }

    #[test]
    fn sized_costs_aggregate_over_disc() {
        let mut g = grid(5, 5, 2);
        g.base_cost_set(3.0, &Location::new(2, 1, 0)).unwrap();
        g.base_cost_set(7.0, &Location::new(3, 3, 0)).unwrap();
        let c = Location::new(2, 2, 0);
        assert_eq!(g.sized_trace_cost_at(&c, 0).unwrap(), 0.0);
        assert_eq!(g.sized_trace_cost_at(&c, 1).unwrap(), 3.0);
        assert_eq!(g.sized_trace_cost_at(&c, 2).unwrap(), 10.0);

        g.via_cost_set(4.0, &Location::new(2, 2, 1)).unwrap();
        g.via_cost_set(1.0, &Location::new(1, 2, 0)).unwrap();
        assert_eq!(g.sized_via_cost_at(&c, 0).unwrap(), 4.0);
        assert_eq!(g.sized_via_cost_at(&c, 1).unwrap(), 5.0);
    }

    #[test]
    fn targeted_pins_set_and_clear() {
        let mut g = grid(4, 4, 1);
        let pins = [Location::new(0, 0, 0), Location::new(3, 3, 0)];
        g.set_targeted_pins(&pins).unwrap();
        assert!(g.is_targeted_pin(&pins[1]));
        g.clear_targeted_pins(&pins).unwrap();
        assert!(!g.is_targeted_pin(&pins[0]));
    }

    #[test]
    fn pin_stamp_is_undone_by_negative_value() {
        let mut g = grid(6, 6, 2);
        let before = snapshot(&g);
        let pin = GridPin::new(vec![Location::new(0, 0, 0), Location::new(0, 0, 1)], vec![(0, 0), (1, 0)]);
        g.add_pin_avoiding_cost(&pin, 50.0, true, true, true, 1).unwrap();
        assert_eq!(g.base_cost_at(&Location::new(2, 1, 1)).unwrap(), 50.0);
        assert!(g.is_via_forbidden(&Location::new(0, 0, 0)).unwrap());
        g.add_pin_avoiding_cost(&pin, -50.0, true, true, true, 1).unwrap();
        assert!(!g.is_via_forbidden(&Location::new(0, 0, 0)).unwrap());
        assert_same_costs(&before, &snapshot(&g));
    }

    #[test]
    fn overlapping_pad_keeps_via_block_after_neighbour_is_unstamped() {
        let mut g = grid(6, 6, 1);
        let a = GridPin::new(vec![Location::new(2, 2, 0)], vec![(0, 0), (1, 0)]);
        let b = GridPin::new(vec![Location::new(3, 2, 0)], vec![(0, 0)]);
        g.add_pin_avoiding_cost(&a, 10.0, false, true, false, 0).unwrap();
        g.add_pin_avoiding_cost(&b, 10.0, false, true, false, 0).unwrap();
        g.add_pin_avoiding_cost(&a, -10.0, false, true, false, 0).unwrap();
        assert!(!g.is_via_forbidden(&Location::new(2, 2, 0)).unwrap());
        assert!(g.is_via_forbidden(&Location::new(3, 2, 0)).unwrap());

        // keepout flag is independent of pad stamps
        g.set_via_forbidden(&Location::new(2, 2, 0), true).unwrap();
        g.add_pin_avoiding_cost(&b, -10.0, false, true, false, 0).unwrap();
        assert!(g.is_via_forbidden(&Location::new(2, 2, 0)).unwrap());
        assert!(!g.is_via_forbidden(&Location::new(3, 2, 0)).unwrap());
    }

    #[test]
    fn add_then_ripup_restores_grid_for_various_sizes() {
        for (trace_width, clearance, via_size) in [(1, 0, 1), (3, 1, 3), (5, 2, 7)] {
            let mut g = grid(20, 20, 2);
            g.base_cost_set(2.0, &Location::new(5, 5, 0)).unwrap();
            g.via_cost_set(3.0, &Location::new(9, 9, 1)).unwrap();
            let before = snapshot(&g);

            let mut route = MultipinRoute::new(
                NetId::new(0),
                vec![
                    Location::new(2, 2, 0),
                    Location::new(15, 14, 1),
                    Location::new(3, 16, 0),
                ],
            )
            .with_sizes(trace_width, clearance, via_size);
            g.add_route(&mut route).unwrap();
            assert!(route.is_routed());
            assert!(!route.vias.is_empty());

            g.ripup_route(&mut route).unwrap();
            assert!(!route.is_routed());
            assert_same_costs(&before, &snapshot(&g));
        }
    }

    #[test]
    fn overlapping_routes_rip_up_in_any_order() {
        let mut g = grid(12, 12, 1);
        let before = snapshot(&g);
        let mut a = MultipinRoute::new(NetId::new(0), vec![Location::new(1, 5, 0), Location::new(10, 5, 0)])
            .with_sizes(3, 1, 1);
        let mut b = MultipinRoute::new(NetId::new(1), vec![Location::new(5, 1, 0), Location::new(5, 10, 0)])
            .with_sizes(3, 1, 1);
        g.add_route(&mut a).unwrap();
        g.add_route(&mut b).unwrap();
        g.ripup_route(&mut a).unwrap();
        g.ripup_route(&mut b).unwrap();
        assert_same_costs(&before, &snapshot(&g));
    }

    #[test]
    fn double_ripup_is_rejected() {
        let mut g = grid(5, 5, 1);
        let mut r = MultipinRoute::new(NetId::new(3), vec![Location::new(0, 0, 0), Location::new(4, 0, 0)]);
        assert_eq!(
            g.ripup_route(&mut r),
            Err(RouterError::InconsistentRipup { net_id: NetId::new(3) })
        );
        g.add_route(&mut r).unwrap();
        assert_eq!(
            g.add_route(&mut r),
            Err(RouterError::AlreadyRouted { net_id: NetId::new(3) })
        );
        g.ripup_route(&mut r).unwrap();
        assert!(g.ripup_route(&mut r).is_err());
    }

    #[test]
    fn rasterized_route_repels_later_search() {
        let mut g = grid(10, 10, 1);
        let mut r = MultipinRoute::new(NetId::new(0), vec![Location::new(0, 4, 0), Location::new(9, 4, 0)]);
        g.add_route(&mut r).unwrap();
        let trace_cost = g.costs().trace_basic_cost;
        assert_eq!(g.base_cost_at(&Location::new(4, 4, 0)).unwrap(), trace_cost);
        assert_eq!(g.base_cost_at(&Location::new(4, 5, 0)).unwrap(), 0.0);
    }

    #[test]
    fn single_pin_net_routes_trivially() {
        let mut g = grid(5, 5, 1);
        let mut r = MultipinRoute::new(NetId::new(0), vec![Location::new(2, 2, 0)]);
        g.add_route(&mut r).unwrap();
        assert!(r.is_routed());
        assert!(r.paths.is_empty());
        assert_eq!(r.current_route_cost, 0.0);
    }

    #[test]
    fn route_with_pin_off_grid_fails_before_search() {
        let mut g = grid(5, 5, 1);
        let mut r = MultipinRoute::new(NetId::new(0), vec![Location::new(2, 2, 0), Location::new(9, 2, 0)]);
        assert_eq!(
            g.add_route(&mut r),
            Err(RouterError::OutOfBounds(Location::new(9, 2, 0)))
        );
        assert!(!r.is_routed());
    }
}
