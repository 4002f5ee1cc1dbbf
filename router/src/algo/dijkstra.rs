use super::neighbors::{NeighborGenerator, StepKind};
use crate::error::Result;
use crate::grid::BoardGrid;
use crate::utils::raster::rasterized_circle;
use pcb_common::geom::coord::Location;
use priority_queue::PriorityQueue;
use std::cmp::{Ordering, Reverse};

/// Accumulated path cost with a total order, so it can key the frontier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cost(pub f64);

impl Eq for Cost {}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SearchParams {
    pub trace_radius: i32,
    pub via_radius: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchHit {
    pub target: Location,
    pub cost: f64,
}

impl BoardGrid {
    fn begin_search(&mut self) {
        self.search_tag = self.search_tag.wrapping_add(1);
        if self.search_tag == 0 {
            for c in &mut self.cells {
                c.visit_tag = 0;
                c.closed_tag = 0;
            }
            self.search_tag = 1;
        }
    }

    /// Multi-source Dijkstra from `sources` to the nearest targeted pin.
    ///
    /// Leaves `came_from` back-pointers in the grid for
    /// [`BoardGrid::came_from_to_features`]. Returns `None` when the frontier
    /// runs dry. Equal-cost paths may be returned in either order; only the
    /// cost is stable.
    pub fn dijkstras_with_came_from(
        &mut self,
        sources: &[Location],
        params: &SearchParams,
    ) -> Result<Option<SearchHit>> {
        if sources.is_empty() {
            return Ok(None);
        }
        let mut neighbors =
            NeighborGenerator::new(self.width(), self.height(), self.layers(), self.costs.max_layers)?;
        let trace_disc = rasterized_circle(params.trace_radius);
        let via_disc = rasterized_circle(params.via_radius);
        let costs = self.costs;

        let mut source_ids = Vec::with_capacity(sources.len());
        for s in sources {
            source_ids.push(self.location_to_id(s)?);
        }

        self.begin_search();
        let tag = self.search_tag;
        let mut frontier: PriorityQueue<usize, Reverse<Cost>> = PriorityQueue::new();

        for id in source_ids {
            self.cells[id].visit(tag, 0.0, None);
            frontier.push(id, Reverse(Cost(0.0)));
        }

        while let Some((id, Reverse(Cost(cost)))) = frontier.pop() {
            self.cells[id].closed_tag = tag;
            let current = self.id_to_location(id);
            if self.cells[id].is_targeted_pin {
                return Ok(Some(SearchHit {
                    target: current,
                    cost,
                }));
            }

            for step in neighbors.generate(current) {
                let next = step.location;
                let next_id = self.idx(next);
                {
                    let cell = &self.cells[next_id];
                    if cell.is_closed(tag) || cell.forbidden {
                        continue;
                    }
                }

                let occupy = costs.step_cost + self.disc_cost(next, &trace_disc);
                let step_cost = match step.kind {
                    StepKind::Planar => occupy,
                    StepKind::Via => {
                        if self.via_blocked_at(next.x, next.y) {
                            continue;
                        }
                        occupy
                            + costs.via_insertion_cost
                            + costs.layer_change_cost
                            + self.via_disc_cost(next, &via_disc)
                    }
                };

                let new_cost = cost + step_cost;
                let cell = &mut self.cells[next_id];
                if !cell.is_visited(tag) || new_cost < cell.working_cost {
                    cell.visit(tag, new_cost, Some(id as u32));
                    frontier.push_increase(next_id, Reverse(Cost(new_cost)));
                }
            }
        }
        Ok(None)
    }

    /// Walks back-pointers from `end` to a search source. The returned path
    /// runs source first.
    pub fn came_from_to_features(&self, end: Location) -> Vec<Location> {
        let mut path = Vec::new();
        if !self.validate_location(&end) {
            return path;
        }
        let tag = self.search_tag;
        let mut id = self.idx(end);
        loop {
            path.push(self.id_to_location(id));
            let cell = &self.cells[id];
            match cell.came_from {
                Some(prev) if cell.is_visited(tag) && path.len() <= self.size() => {
                    id = prev as usize
                }
                _ => break,
            }
        }
        path.reverse();
        path
    }

    /// Cost accumulated to `l` in the most recent search, if it was reached.
    pub fn working_cost_at(&self, l: &Location) -> Option<f64> {
        let c = self.cell(l).ok()?;
        c.is_visited(self.search_tag).then_some(c.working_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCosts;

    fn grid(w: i32, h: i32, l: i32) -> BoardGrid {
        BoardGrid::with_dimensions(w, h, l, GridCosts::default()).unwrap()
    }

    fn search(g: &mut BoardGrid, from: Location, to: Location) -> Option<SearchHit> {
        g.set_targeted_pins(&[to]).unwrap();
        let hit = g
            .dijkstras_with_came_from(&[from], &SearchParams::default())
            .unwrap();
        g.clear_targeted_pins(&[to]).unwrap();
        hit
    }

    #[test]
    fn cost_ordering_is_total() {
        assert!(Cost(1.0) < Cost(2.0));
        assert_eq!(Cost(3.0).cmp(&Cost(3.0)), Ordering::Equal);
        assert!(Reverse(Cost(1.0)) > Reverse(Cost(2.0)));
    }

    #[test]
    fn adjacent_pins_cost_one_step() {
        let mut g = grid(10, 10, 2);
        let hit = search(&mut g, Location::new(4, 4, 0), Location::new(5, 4, 0)).unwrap();
        assert_eq!(hit.target, Location::new(5, 4, 0));
        assert_eq!(hit.cost, g.costs().step_cost);
        let path = g.came_from_to_features(hit.target);
        assert_eq!(path, vec![Location::new(4, 4, 0), Location::new(5, 4, 0)]);
    }

    #[test]
    fn empty_grid_cost_is_manhattan_distance() {
        let mut g = grid(10, 10, 2);
        let hit = search(&mut g, Location::new(1, 1, 0), Location::new(7, 4, 0)).unwrap();
        assert_eq!(hit.cost, 9.0 * g.costs().step_cost);
        let path = g.came_from_to_features(hit.target);
        assert_eq!(path.len(), 10);
        assert!(path.windows(2).all(|w| w[0].is_adjacent(&w[1])));
        assert!(path.iter().all(|p| p.layer == 0));
    }

    #[test]
    fn layer_change_pays_via_and_layer_cost() {
        let mut g = grid(5, 5, 2);
        let hit = search(&mut g, Location::new(2, 2, 0), Location::new(2, 2, 1)).unwrap();
        let c = g.costs();
        assert_eq!(hit.cost, c.step_cost + c.via_insertion_cost + c.layer_change_cost);
    }

    #[test]
    fn search_detours_around_expensive_cells() {
        let mut g = grid(5, 3, 1);
        for y in 0..2 {
            g.base_cost_set(100.0, &Location::new(2, y, 0)).unwrap();
        }
        let hit = search(&mut g, Location::new(0, 0, 0), Location::new(4, 0, 0)).unwrap();
        // straight through costs 4 + 100; the detour via y = 2 costs 8
        assert_eq!(hit.cost, 8.0);
        let path = g.came_from_to_features(hit.target);
        assert!(path.contains(&Location::new(2, 2, 0)));
    }

    #[test]
    fn forbidden_cells_are_never_entered() {
        let mut g = grid(5, 5, 1);
        for y in 0..5 {
            g.set_forbidden(&Location::new(2, y, 0), true).unwrap();
        }
        assert!(search(&mut g, Location::new(0, 2, 0), Location::new(4, 2, 0)).is_none());
    }

    #[test]
    fn via_forbidden_blocks_layer_change() {
        let mut g = grid(1, 1, 2);
        g.set_via_forbidden(&Location::new(0, 0, 1), true).unwrap();
        assert!(search(&mut g, Location::new(0, 0, 0), Location::new(0, 0, 1)).is_none());
    }

    #[test]
    fn multiple_sources_start_at_zero_cost() {
        let mut g = grid(10, 1, 1);
        g.set_targeted_pins(&[Location::new(9, 0, 0)]).unwrap();
        let hit = g
            .dijkstras_with_came_from(
                &[Location::new(0, 0, 0), Location::new(6, 0, 0)],
                &SearchParams::default(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(hit.cost, 3.0);
        assert_eq!(g.came_from_to_features(hit.target)[0], Location::new(6, 0, 0));
        assert_eq!(g.working_cost_at(&Location::new(0, 0, 0)), Some(0.0));
    }

    #[test]
    fn wide_trace_sees_neighbouring_cost() {
        let mut g = grid(7, 3, 1);
        g.base_cost_set(50.0, &Location::new(3, 0, 0)).unwrap();
        let from = Location::new(0, 1, 0);
        let to = Location::new(6, 1, 0);
        g.set_targeted_pins(&[to]).unwrap();
        let thin = g
            .dijkstras_with_came_from(&[from], &SearchParams::default())
            .unwrap()
            .unwrap();
        let wide = g
            .dijkstras_with_came_from(
                &[from],
                &SearchParams {
                    trace_radius: 1,
                    via_radius: 0,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(thin.cost, 6.0);
        assert!(wide.cost > thin.cost);
    }

    #[test]
    fn repeated_searches_agree_on_cost() {
        let mut g = grid(12, 12, 2);
        for i in 2..10 {
            g.base_cost_set(5.0, &Location::new(i, 6, 0)).unwrap();
        }
        let a = search(&mut g, Location::new(1, 1, 0), Location::new(10, 10, 0)).unwrap();
        let b = search(&mut g, Location::new(1, 1, 0), Location::new(10, 10, 0)).unwrap();
        assert_eq!(a.cost, b.cost);
    }
}
