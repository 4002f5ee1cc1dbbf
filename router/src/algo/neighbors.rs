use crate::error::{Result, RouterError};
use pcb_common::geom::coord::Location;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Planar,
    Via,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub location: Location,
    pub kind: StepKind,
}

/// Enumerates in-bounds neighbors of a cell: four planar moves plus one via
/// move to every other layer. The buffer is sized for the grid's layer count
/// up front and never truncated.
pub struct NeighborGenerator {
    width: i32,
    height: i32,
    layers: i32,
    buf: Vec<Step>,
}

impl NeighborGenerator {
    pub fn new(width: i32, height: i32, layers: i32, max_layers: usize) -> Result<Self> {
        if layers as usize > max_layers {
            return Err(RouterError::TooManyLayers {
                layers: layers as usize,
                max: max_layers,
            });
        }
        Ok(Self {
            width,
            height,
            layers,
            buf: Vec::with_capacity(Self::capacity_for(layers)),
        })
    }

    pub fn capacity_for(layers: i32) -> usize {
        4 + (layers - 1).max(0) as usize
    }

    pub fn capacity(&self) -> usize {
        Self::capacity_for(self.layers)
    }

    pub fn generate(&mut self, l: Location) -> &[Step] {
        self.buf.clear();
        let planar = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        for (dx, dy) in planar {
            let (x, y) = (l.x + dx, l.y + dy);
            if x >= 0 && x < self.width && y >= 0 && y < self.height {
                self.buf.push(Step {
                    location: Location::new(x, y, l.layer),
                    kind: StepKind::Planar,
                });
            }
        }
        for layer in 0..self.layers {
            if layer != l.layer {
                self.buf.push(Step {
                    location: l.with_layer(layer),
                    kind: StepKind::Via,
                });
            }
        }
        debug_assert!(self.buf.len() <= self.capacity());
        &self.buf
    }
}
