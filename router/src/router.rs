use crate::error::{Result, RouterError};
use crate::grid::{BoardGrid, GridCosts};
use crate::net::{GridPin, MultipinRoute};
use crate::ripup::{RipUpPolicy, make_policy};
use crate::utils::conversion::GridConverter;
use crate::utils::raster::{rasterized_circle_f, rasterized_rect};
use pcb_common::db::core::{BoardDB, PadData, PadLayers, PadShape, RouteSegment, ViaPlacement};
use pcb_common::db::indices::{NetId, NetclassId};
use pcb_common::geom::coord::Location;
use pcb_common::geom::point::Point;
use pcb_common::util::config::RoutingConfig;
use pcb_common::util::profiler::ScopedTimer;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolutionSummary {
    /// Route costs plus the unrouted-net penalty; the quantity being minimized.
    pub total_cost: f64,
    pub route_cost: f64,
    pub total_wirelength: usize,
    pub total_vias: usize,
    pub routed_nets: usize,
    pub unrouted_nets: usize,
}

impl SolutionSummary {
    pub fn of(nets: &[MultipinRoute], unrouted_net_penalty: f64) -> Self {
        let mut s = SolutionSummary::default();
        for net in nets.iter().filter(|n| n.needs_routing()) {
            if net.is_routed() {
                s.routed_nets += 1;
                s.route_cost += net.current_route_cost;
                s.total_wirelength += net.routed_wirelength();
                s.total_vias += net.routed_num_vias();
            } else {
                s.unrouted_nets += 1;
            }
        }
        s.total_cost = s.route_cost + s.unrouted_nets as f64 * unrouted_net_penalty;
        s
    }
}

/// Owns the cost grid and every net for one routing session, and runs the
/// initial pass followed by rip-up-and-reroute.
pub struct GridBasedRouter {
    config: RoutingConfig,
    grid: BoardGrid,
    converter: GridConverter,
    layer_names: Vec<String>,
    grid_pins: Vec<GridPin>,
    grid_nets: Vec<MultipinRoute>,
    best_solution: Vec<MultipinRoute>,
    best_summary: Option<SolutionSummary>,
    history: Vec<SolutionSummary>,
}

impl GridBasedRouter {
    /// Builds the grid from a board: sizes it from the board extents, stamps
    /// every pad and keepout, and maps each net's pads to grid pins.
    pub fn new(db: &BoardDB, config: RoutingConfig) -> Result<Self> {
        config.validate().map_err(RouterError::InvalidConfig)?;
        let _t = ScopedTimer::new("Router setup");

        let (grid, converter) = Self::setup_board_and_mapping_structure(db, &config)?;
        let layer_names: Vec<String> = db.layers.iter().map(|l| l.name.clone()).collect();

        let mut router = Self {
            config,
            grid,
            converter,
            layer_names,
            grid_pins: Vec::new(),
            grid_nets: Vec::new(),
            best_solution: Vec::new(),
            best_summary: None,
            history: Vec::new(),
        };
        router.setup_grid_nets_and_grid_pins(db)?;
        router.add_all_pin_cost_to_grid()?;
        router.add_keepouts(db)?;
        Ok(router)
    }

    /// Wraps an already built grid and net list. The converter maps grid
    /// cells to board units at `config.input_scale` from the origin.
    ///
    /// Nets given only as bare pins get a single-cell grid pin per pin, so
    /// every terminal is stamped as an obstacle to the other nets.
    pub fn from_grid(grid: BoardGrid, nets: Vec<MultipinRoute>, config: RoutingConfig) -> Result<Self> {
        config.validate().map_err(RouterError::InvalidConfig)?;
        let converter = GridConverter::new(
            config.input_scale,
            Point::new(0.0, 0.0),
            grid.width(),
            grid.height(),
        )?;
        let layer_names = (0..grid.layers()).map(|l| format!("L{}", l)).collect();
        let nets: Vec<MultipinRoute> = nets
            .into_iter()
            .map(|net| {
                if net.grid_pins.is_empty() {
                    let pins = net
                        .pins
                        .iter()
                        .map(|&p| GridPin::new(vec![p], vec![(0, 0)]))
                        .collect();
                    net.with_grid_pins(pins)
                } else {
                    net
                }
            })
            .collect();
        let grid_pins = nets.iter().flat_map(|n| n.grid_pins.iter().cloned()).collect();
        let mut router = Self {
            config,
            grid,
            converter,
            layer_names,
            grid_pins,
            grid_nets: nets,
            best_solution: Vec::new(),
            best_summary: None,
            history: Vec::new(),
        };
        router.add_all_pin_cost_to_grid()?;
        Ok(router)
    }

    fn setup_board_and_mapping_structure(
        db: &BoardDB,
        config: &RoutingConfig,
    ) -> Result<(BoardGrid, GridConverter)> {
        let extents = db.extents();
        let layers = db.layers.len() as i32;
        if extents.is_empty() || layers == 0 {
            return Err(RouterError::InvalidDimensions {
                w: extents.width() as i32,
                h: extents.height() as i32,
                layers,
            });
        }

        let scale = config.input_scale;
        let enlarge = config.enlarge_boundary as i32;
        let origin = Point::new(
            extents.min.x - enlarge as f64 / scale,
            extents.min.y - enlarge as f64 / scale,
        );
        let w = (extents.width() * scale).ceil() as i32 + 2 * enlarge + 1;
        let h = (extents.height() * scale).ceil() as i32 + 2 * enlarge + 1;

        log::info!(
            "Board {:.3}x{:.3} at scale {} -> grid {}x{}x{}",
            extents.width(),
            extents.height(),
            scale,
            w,
            h,
            layers
        );

        let converter = GridConverter::new(scale, origin, w, h)?;
        let grid = BoardGrid::with_dimensions(w, h, layers, GridCosts::from(config))?;
        Ok((grid, converter))
    }

    fn grid_pin(&self, pad: &PadData, layer_map: &HashMap<String, usize>) -> Result<GridPin> {
        let center = self
            .converter
            .db_point_to_grid_point_round(pad.position)
            .ok_or_else(|| RouterError::PadOutsideGrid(pad.name.clone()))?;

        let layers: Vec<i32> = match &pad.layers {
            PadLayers::Single(name) => {
                let l = layer_map
                    .get(name)
                    .ok_or_else(|| RouterError::UnknownLayer(name.clone()))?;
                vec![*l as i32]
            }
            PadLayers::All => (0..self.grid.layers()).collect(),
        };

        let shape = match pad.shape {
            PadShape::Rect { width, height } => rasterized_rect(
                self.converter.db_length_to_grid_length_floor(width / 2.0),
                self.converter.db_length_to_grid_length_floor(height / 2.0),
            ),
            PadShape::Circle { diameter } => {
                rasterized_circle_f(self.converter.db_length_to_grid_length(diameter / 2.0))
            }
        };

        Ok(GridPin::new(
            layers
                .into_iter()
                .map(|l| Location::new(center.x, center.y, l))
                .collect(),
            shape,
        ))
    }

    fn setup_grid_nets_and_grid_pins(&mut self, db: &BoardDB) -> Result<()> {
        let layer_map = db.layer_name_map();
        let mut pad_pins = Vec::with_capacity(db.pads.len());
        for pad in &db.pads {
            pad_pins.push(self.grid_pin(pad, &layer_map)?);
        }

        for (i, net) in db.nets.iter().enumerate() {
            let netclass = db.netclass(net.netclass);
            let trace_width = net.trace_width.unwrap_or(netclass.trace_width);
            let clearance = net.clearance.unwrap_or(netclass.clearance);
            let via_diameter = net.via_diameter.unwrap_or(netclass.via_diameter);

            let pins: Vec<GridPin> = net
                .pads
                .iter()
                .filter_map(|p| pad_pins.get(p.index()).cloned())
                .collect();

            let mut route = MultipinRoute::new(NetId::new(i), Vec::new())
                .with_grid_pins(pins)
                .with_sizes(
                    self.converter.db_length_to_grid_length_ceil(trace_width),
                    self.converter.db_length_to_grid_length_ceil(clearance),
                    self.converter.db_length_to_grid_length_ceil(via_diameter),
                );
            route.grid_netclass_id = net.netclass.unwrap_or(NetclassId::new(0));
            route.name = net.name.clone();
            log::debug!(
                "Net '{}': {} pins, trace {} clearance {} via {}",
                route.name,
                route.pins.len(),
                route.trace_width,
                route.clearance,
                route.via_size
            );
            self.grid_nets.push(route);
        }

        self.grid_pins = pad_pins;
        log::info!(
            "Mapped {} pads and {} nets onto the grid",
            self.grid_pins.len(),
            self.grid_nets.len()
        );
        Ok(())
    }

    fn add_all_pin_cost_to_grid(&mut self) -> Result<()> {
        let cost = self.config.pin_obstacle_cost;
        let inflate = self.config.pin_inflate as i32;
        for pin in &self.grid_pins {
            self.grid
                .add_pin_avoiding_cost(pin, cost, true, false, true, inflate)?;
        }
        Ok(())
    }

    fn add_keepouts(&mut self, db: &BoardDB) -> Result<()> {
        let layer_map = db.layer_name_map();
        for keepout in &db.keepouts {
            let layers: Vec<i32> = if keepout.layers.is_empty() {
                (0..self.grid.layers()).collect()
            } else {
                keepout
                    .layers
                    .iter()
                    .map(|n| {
                        layer_map
                            .get(n)
                            .map(|&l| l as i32)
                            .ok_or_else(|| RouterError::UnknownLayer(n.clone()))
                    })
                    .collect::<Result<_>>()?
            };
            let Some((lo, hi)) = self.converter.covering_range(keepout.rect.min, keepout.rect.max)
            else {
                continue;
            };
            for &layer in &layers {
                for y in lo.y..=hi.y {
                    for x in lo.x..=hi.x {
                        let l = Location::new(x, y, layer);
                        self.grid.set_forbidden(&l, true)?;
                        self.grid.set_via_forbidden(&l, true)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Lifts or restores the pin obstacle cost of a net's own pads so the
    /// net is not repelled by its own terminals.
    fn set_own_pin_cost(&mut self, net: usize, present: bool) -> Result<()> {
        let cost = if present {
            self.config.pin_obstacle_cost
        } else {
            -self.config.pin_obstacle_cost
        };
        let inflate = self.config.pin_inflate as i32;
        for pin in &self.grid_nets[net].grid_pins {
            self.grid
                .add_pin_avoiding_cost(pin, cost, true, false, true, inflate)?;
        }
        Ok(())
    }

    /// Routes one net against the current grid. Returns `false` when the net
    /// is unroutable this time around.
    fn route_net(&mut self, net: usize) -> Result<bool> {
        self.set_own_pin_cost(net, false)?;
        let result = self.grid.add_route(&mut self.grid_nets[net]);
        self.set_own_pin_cost(net, true)?;

        match result {
            Ok(()) => {
                let r = &self.grid_nets[net];
                log::debug!(
                    "Routed '{}': cost {:.2}, wirelength {}, vias {}, {} cells stamped",
                    r.name,
                    r.current_route_cost,
                    r.routed_wirelength(),
                    r.routed_num_vias(),
                    r.stamp().map_or(0, |s| s.num_cells())
                );
                Ok(true)
            }
            Err(RouterError::Unroutable { unreached, .. }) => {
                log::warn!(
                    "Net '{}' is unroutable ({} pin(s) unreached)",
                    self.grid_nets[net].name,
                    unreached
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn route_all_net_with_ripup_and_reroute(&mut self) -> Result<SolutionSummary> {
        let mut policy = make_policy(self.config.ripup_policy, self.config.seed);
        self.route_with_policy(policy.as_mut())
    }

    pub fn route_with_policy(&mut self, policy: &mut dyn RipUpPolicy) -> Result<SolutionSummary> {
        let penalty = self.config.unrouted_net_penalty;
        {
            let _t = ScopedTimer::new("Initial routing pass");
            log::info!("Initial pass over {} nets", self.grid_nets.len());
            for net in 0..self.grid_nets.len() {
                if self.grid_nets[net].is_routed() {
                    self.grid.ripup_route(&mut self.grid_nets[net])?;
                }
                self.route_net(net)?;
            }
        }

        let initial = SolutionSummary::of(&self.grid_nets, penalty);
        log::info!(
            "Initial pass: cost {:.2}, wirelength {}, vias {}, unrouted {}",
            initial.total_cost,
            initial.total_wirelength,
            initial.total_vias,
            initial.unrouted_nets
        );
        self.best_solution = self.grid_nets.clone();
        self.best_summary = Some(initial);
        self.history = vec![initial];

        let timer = ScopedTimer::new("Rip-up and reroute");
        let mut stagnant = 0;
        for iter in 0..self.config.num_ripup_reroute_iterations {
            let Some(net) = policy.next_ripup_net(&self.grid_nets) else {
                log::info!("Nothing left to rip up at iteration {}", iter);
                break;
            };
            if self.grid_nets[net].is_routed() {
                self.grid.ripup_route(&mut self.grid_nets[net])?;
            }
            self.route_net(net)?;

            let summary = SolutionSummary::of(&self.grid_nets, penalty);
            self.history.push(summary);
            let best_cost = self.best_summary.map_or(f64::INFINITY, |s| s.total_cost);
            if summary.total_cost < best_cost {
                log::info!(
                    "Iter {}: rerouted '{}', new best cost {:.2} (unrouted {})",
                    iter,
                    self.grid_nets[net].name,
                    summary.total_cost,
                    summary.unrouted_nets
                );
                self.best_solution = self.grid_nets.clone();
                self.best_summary = Some(summary);
                stagnant = 0;
            } else {
                log::debug!(
                    "Iter {}: rerouted '{}', cost {:.2} (best {:.2})",
                    iter,
                    self.grid_nets[net].name,
                    summary.total_cost,
                    best_cost
                );
                stagnant += 1;
            }

            if self.config.stagnation_threshold > 0 && stagnant >= self.config.stagnation_threshold {
                log::info!("No improvement for {} iterations, stopping", stagnant);
                break;
            }
        }

        let best = self.best_summary.unwrap_or(initial);
        log::info!(
            "Best solution after {} iteration(s) in {:.3?}: cost {:.2}, wirelength {}, vias {}, routed {}, unrouted {}",
            self.history.len() - 1,
            timer.elapsed(),
            best.total_cost,
            best.total_wirelength,
            best.total_vias,
            best.routed_nets,
            best.unrouted_nets
        );
        Ok(best)
    }

    pub fn grid(&self) -> &BoardGrid {
        &self.grid
    }

    pub fn converter(&self) -> &GridConverter {
        &self.converter
    }

    pub fn grid_nets(&self) -> &[MultipinRoute] {
        &self.grid_nets
    }

    pub fn grid_pins(&self) -> &[GridPin] {
        &self.grid_pins
    }

    /// Best net list observed; not necessarily the current grid state.
    pub fn best_solution(&self) -> &[MultipinRoute] {
        &self.best_solution
    }

    pub fn best_summary(&self) -> Option<SolutionSummary> {
        self.best_summary
    }

    /// Summary after the initial pass followed by one entry per iteration.
    pub fn history(&self) -> &[SolutionSummary] {
        &self.history
    }

    /// Writes the best solution back onto the board in board units.
    pub fn write_solution_back(&self, db: &mut BoardDB) {
        db.clear_routes();
        for route in &self.best_solution {
            let Some(net) = db.nets.get_mut(route.net_id.index()) else {
                continue;
            };
            if !route.is_routed() {
                continue;
            }
            let width = self.converter.grid_length_to_db_length(route.trace_width as f64);
            for path in &route.paths {
                for pair in path.corners().windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if a.layer != b.layer {
                        continue;
                    }
                    net.route_segments.push(RouteSegment {
                        layer: self.layer_name(a.layer),
                        p1: self.converter.to_world(a),
                        p2: self.converter.to_world(b),
                        width,
                    });
                }
            }
            let diameter = self.converter.grid_length_to_db_length(route.via_size as f64);
            for via in &route.vias {
                net.vias.push(ViaPlacement {
                    position: self.converter.to_world(via.location()),
                    from_layer: self.layer_name(via.from_layer),
                    to_layer: self.layer_name(via.to_layer),
                    diameter,
                });
            }
        }
    }

    fn layer_name(&self, layer: i32) -> String {
        self.layer_names
            .get(layer as usize)
            .cloned()
            .unwrap_or_else(|| format!("L{}", layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_common::db::core::{KeepoutData, NetData, NetclassData};
    use pcb_common::geom::rect::Rect;

    fn board() -> BoardDB {
        let mut db = BoardDB::new();
        db.outline = Rect::new(Point::new(0.0, 0.0), Point::new(4.0, 4.0));
        db.add_layer("F.Cu");
        db.add_layer("B.Cu");
        db.add_netclass(NetclassData {
            name: "Default".into(),
            trace_width: 0.1,
            clearance: 0.1,
            via_diameter: 0.3,
        });
        let n0 = db.add_net(NetData::new("A"));
        let n1 = db.add_net(NetData::new("B"));
        let pad = |name: &str, x: f64, y: f64, layers: PadLayers, net| PadData {
            name: name.into(),
            position: Point::new(x, y),
            shape: PadShape::Rect {
                width: 0.2,
                height: 0.2,
            },
            layers,
            net: Some(net),
        };
        db.add_pad(pad("A1", 0.6, 0.6, PadLayers::Single("F.Cu".into()), n0));
        db.add_pad(pad("A2", 3.6, 0.6, PadLayers::Single("B.Cu".into()), n0));
        db.add_pad(pad("B1", 0.6, 3.6, PadLayers::All, n1));
        db.add_pad(pad("B2", 3.6, 3.6, PadLayers::Single("B.Cu".into()), n1));
        db
    }

    fn config() -> RoutingConfig {
        RoutingConfig {
            input_scale: 5.0,
            enlarge_boundary: 2,
            num_ripup_reroute_iterations: 4,
            ..RoutingConfig::default()
        }
    }

    #[test]
    fn setup_sizes_grid_from_board() {
        let router = GridBasedRouter::new(&board(), config()).unwrap();
        // 4.0 * 5 = 20 cells plus 2 on each side plus one
        assert_eq!(router.grid().width(), 25);
        assert_eq!(router.grid().height(), 25);
        assert_eq!(router.grid().layers(), 2);
        assert_eq!(router.grid_nets().len(), 2);
        assert_eq!(router.grid_pins().len(), 4);

        let a = &router.grid_nets()[0];
        assert_eq!(a.pins[0], Location::new(5, 5, 0));
        assert_eq!(a.trace_width, 1);
        assert_eq!(a.clearance, 1);
        assert_eq!(a.via_size, 2);
        assert_eq!(router.grid_nets()[1].terminals()[0].len(), 2);
    }

    #[test]
    fn pads_are_stamped_as_obstacles() {
        let router = GridBasedRouter::new(&board(), config()).unwrap();
        let cost = router.config.pin_obstacle_cost;
        assert_eq!(router.grid().base_cost_at(&Location::new(5, 5, 0)).unwrap(), cost);
        assert_eq!(router.grid().base_cost_at(&Location::new(5, 5, 1)).unwrap(), 0.0);
        assert_eq!(router.grid().base_cost_at(&Location::new(5, 20, 1)).unwrap(), cost);
    }

    #[test]
    fn zero_scale_is_a_configuration_error() {
        let cfg = RoutingConfig {
            input_scale: 0.0,
            ..config()
        };
        assert!(matches!(
            GridBasedRouter::new(&board(), cfg),
            Err(RouterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_pad_layer_is_reported() {
        let mut db = board();
        db.pads[0].layers = PadLayers::Single("In1.Cu".into());
        assert_eq!(
            GridBasedRouter::new(&db, config()).err(),
            Some(RouterError::UnknownLayer("In1.Cu".into()))
        );
    }

    #[test]
    fn routes_board_and_writes_segments_back() {
        let mut db = board();
        let mut router = GridBasedRouter::new(&db, config()).unwrap();
        let summary = router.route_all_net_with_ripup_and_reroute().unwrap();
        assert_eq!(summary.unrouted_nets, 0);
        assert_eq!(summary.routed_nets, 2);
        assert!(summary.total_vias >= 1);

        router.write_solution_back(&mut db);
        let a = &db.nets[0];
        assert!(!a.route_segments.is_empty());
        assert_eq!(a.vias.len(), 1);
        assert_eq!(a.vias[0].from_layer, "F.Cu");
        assert_eq!(a.vias[0].to_layer, "B.Cu");
        // straight run along the pad row
        for seg in &a.route_segments {
            assert!((seg.p1.y - 0.6).abs() < 1e-9 && (seg.p2.y - 0.6).abs() < 1e-9);
        }
        // through-hole B1 reaches B2 on the bottom layer without a via
        assert!(db.nets[1].vias.is_empty());
        assert!(db.nets[1].route_segments.iter().all(|s| s.layer == "B.Cu"));
    }

    #[test]
    fn keepout_walling_off_a_pad_leaves_net_unrouted() {
        let mut db = board();
        // ring around A2 on every layer, two cells clear of the pad
        for (min, max) in [
            ((3.0, 0.0), (4.2, 0.0)),
            ((3.0, 1.2), (4.2, 1.2)),
            ((3.0, 0.0), (3.0, 1.2)),
            ((4.2, 0.0), (4.2, 1.2)),
        ] {
            db.keepouts.push(KeepoutData {
                rect: Rect::new(Point::new(min.0, min.1), Point::new(max.0, max.1)),
                layers: Vec::new(),
            });
        }
        let mut router = GridBasedRouter::new(&db, config()).unwrap();
        // left wall column at board x = 3.0
        assert!(router.grid().is_forbidden(&Location::new(17, 5, 0)).unwrap());
        assert!(router.grid().is_via_forbidden(&Location::new(17, 5, 1)).unwrap());
        assert!(!router.grid().is_forbidden(&Location::new(20, 5, 1)).unwrap());
        let summary = router.route_all_net_with_ripup_and_reroute().unwrap();
        assert_eq!(summary.unrouted_nets, 1);
        assert!(!router.best_solution()[0].is_routed());
        assert!(router.best_solution()[1].is_routed());
        assert!(summary.total_cost >= router.config.unrouted_net_penalty);
    }
}
