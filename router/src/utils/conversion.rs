//! Board-unit to grid-unit transforms.
//!
//! The ceil, floor and round variants are distinct on purpose: obstacle
//! extents are grown with ceil, clearance-free interiors shrink with floor,
//! and pad centres snap with round.

use crate::error::{Result, RouterError};
use pcb_common::geom::coord::Location;
use pcb_common::geom::point::Point;

#[derive(Clone, Debug)]
pub struct GridConverter {
    input_scale: f64,
    offset_x: f64,
    offset_y: f64,
    grid_w: i32,
    grid_h: i32,
}

impl GridConverter {
    /// `input_scale` is grid cells per board unit; `origin` is the board point
    /// that maps to grid (0, 0).
    pub fn new(input_scale: f64, origin: Point<f64>, grid_w: i32, grid_h: i32) -> Result<Self> {
        if !input_scale.is_finite() || input_scale <= 0.0 {
            return Err(RouterError::InvalidScale(input_scale));
        }
        Ok(Self {
            input_scale,
            offset_x: origin.x,
            offset_y: origin.y,
            grid_w,
            grid_h,
        })
    }

    pub fn input_scale(&self) -> f64 {
        self.input_scale
    }

    pub fn grid_factor(&self) -> f64 {
        1.0 / self.input_scale
    }

    pub fn db_length_to_grid_length_ceil(&self, db_length: f64) -> i32 {
        (db_length * self.input_scale).ceil() as i32
    }

    pub fn db_length_to_grid_length_floor(&self, db_length: f64) -> i32 {
        (db_length * self.input_scale).floor() as i32
    }

    pub fn db_length_to_grid_length(&self, db_length: f64) -> f64 {
        db_length * self.input_scale
    }

    pub fn grid_length_to_db_length(&self, grid_length: f64) -> f64 {
        grid_length / self.input_scale
    }

    /// Unrounded grid position; may lie outside the grid.
    pub fn db_point_to_grid_point(&self, p: Point<f64>) -> Point<f64> {
        Point::new(
            (p.x - self.offset_x) * self.input_scale,
            (p.y - self.offset_y) * self.input_scale,
        )
    }

    pub fn db_point_to_grid_point_ceil(&self, p: Point<f64>) -> Option<Point<i32>> {
        self.snap(p, f64::ceil)
    }

    pub fn db_point_to_grid_point_floor(&self, p: Point<f64>) -> Option<Point<i32>> {
        self.snap(p, f64::floor)
    }

    pub fn db_point_to_grid_point_round(&self, p: Point<f64>) -> Option<Point<i32>> {
        self.snap(p, f64::round)
    }

    pub fn grid_point_to_db_point(&self, g: Point<f64>) -> Point<f64> {
        Point::new(
            g.x / self.input_scale + self.offset_x,
            g.y / self.input_scale + self.offset_y,
        )
    }

    pub fn to_grid(&self, p: Point<f64>, layer: i32) -> Option<Location> {
        self.db_point_to_grid_point_round(p)
            .map(|g| Location::new(g.x, g.y, layer))
    }

    pub fn to_world(&self, g: Location) -> Point<f64> {
        self.grid_point_to_db_point(Point::new(g.x as f64, g.y as f64))
    }

    /// Grid cell range (inclusive) covered by a board rectangle, clamped to the grid.
    pub fn covering_range(&self, min: Point<f64>, max: Point<f64>) -> Option<(Point<i32>, Point<i32>)> {
        let lo = self.db_point_to_grid_point(min);
        let hi = self.db_point_to_grid_point(max);
        let x0 = (lo.x.floor() as i32).max(0);
        let y0 = (lo.y.floor() as i32).max(0);
        let x1 = (hi.x.ceil() as i32).min(self.grid_w - 1);
        let y1 = (hi.y.ceil() as i32).min(self.grid_h - 1);
        (x0 <= x1 && y0 <= y1).then(|| (Point::new(x0, y0), Point::new(x1, y1)))
    }

    fn snap(&self, p: Point<f64>, rule: fn(f64) -> f64) -> Option<Point<i32>> {
        let g = self.db_point_to_grid_point(p);
        let x = rule(g.x);
        let y = rule(g.y);
        if x < 0.0 || y < 0.0 || x >= self.grid_w as f64 || y >= self.grid_h as f64 {
            return None;
        }
        Some(Point::new(x as i32, y as i32))
    }
}
