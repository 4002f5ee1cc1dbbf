//! Board design database as seen by the router.
//!
//! Everything here is in board units. Parsing a native PCB file into this
//! structure is the job of an external loader; the CLI reads it from TOML.

use crate::db::indices::*;
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerData {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetclassData {
    pub name: String,
    pub trace_width: f64,
    pub clearance: f64,
    pub via_diameter: f64,
}

impl Default for NetclassData {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            trace_width: 0.25,
            clearance: 0.2,
            via_diameter: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PadShape {
    Rect { width: f64, height: f64 },
    Circle { diameter: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadLayers {
    /// Surface mount pad on a single named layer.
    Single(String),
    /// Through-hole pad present on every copper layer.
    All,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PadData {
    pub name: String,
    pub position: Point<f64>,
    pub shape: PadShape,
    pub layers: PadLayers,
    #[serde(default)]
    pub net: Option<NetId>,
}

impl PadData {
    pub fn bounding_box(&self) -> Rect {
        match self.shape {
            PadShape::Rect { width, height } => Rect::from_center(self.position, width, height),
            PadShape::Circle { diameter } => Rect::from_center(self.position, diameter, diameter),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeepoutData {
    pub rect: Rect,
    /// Layer names covered. Empty means every layer.
    #[serde(default)]
    pub layers: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteSegment {
    pub layer: String,
    pub p1: Point<f64>,
    pub p2: Point<f64>,
    pub width: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViaPlacement {
    pub position: Point<f64>,
    pub from_layer: String,
    pub to_layer: String,
    pub diameter: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetData {
    pub name: String,
    #[serde(default)]
    pub netclass: Option<NetclassId>,
    pub pads: Vec<PadId>,
    #[serde(default)]
    pub trace_width: Option<f64>,
    #[serde(default)]
    pub clearance: Option<f64>,
    #[serde(default)]
    pub via_diameter: Option<f64>,
    #[serde(default)]
    pub route_segments: Vec<RouteSegment>,
    #[serde(default)]
    pub vias: Vec<ViaPlacement>,
}

impl NetData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            netclass: None,
            pads: Vec::new(),
            trace_width: None,
            clearance: None,
            via_diameter: None,
            route_segments: Vec::new(),
            vias: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoardDB {
    /// Board outline. When empty, the extents are derived from the pads.
    #[serde(default)]
    pub outline: Rect,
    pub layers: Vec<LayerData>,
    #[serde(default)]
    pub netclasses: Vec<NetclassData>,
    #[serde(default)]
    pub pads: Vec<PadData>,
    #[serde(default)]
    pub nets: Vec<NetData>,
    #[serde(default)]
    pub keepouts: Vec<KeepoutData>,
}

impl BoardDB {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read board file {:?}", path))?;
        let mut db: BoardDB = toml::from_str(&text)
            .with_context(|| format!("Failed to parse board file {:?}", path))?;
        db.link_pads_to_nets();
        Ok(db)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self).context("Failed to serialize board")?;
        std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    pub fn num_pads(&self) -> usize {
        self.pads.len()
    }

    pub fn add_layer(&mut self, name: impl Into<String>) -> usize {
        self.layers.push(LayerData { name: name.into() });
        self.layers.len() - 1
    }

    pub fn add_netclass(&mut self, netclass: NetclassData) -> NetclassId {
        self.netclasses.push(netclass);
        NetclassId::new(self.netclasses.len() - 1)
    }

    pub fn add_net(&mut self, net: NetData) -> NetId {
        self.nets.push(net);
        NetId::new(self.nets.len() - 1)
    }

    /// Adds a pad and, when it belongs to a net, appends it to that net's pad list.
    pub fn add_pad(&mut self, pad: PadData) -> PadId {
        let id = PadId::new(self.pads.len());
        if let Some(net) = pad.net {
            self.nets[net.index()].pads.push(id);
        }
        self.pads.push(pad);
        id
    }

    pub fn layer_name_map(&self) -> HashMap<String, usize> {
        self.layers
            .iter()
            .enumerate()
            .map(|(i, l)| (l.name.clone(), i))
            .collect()
    }

    pub fn netclass(&self, id: Option<NetclassId>) -> NetclassData {
        id.and_then(|id| self.netclasses.get(id.index()).cloned())
            .or_else(|| self.netclasses.first().cloned())
            .unwrap_or_default()
    }

    /// Outline if given, otherwise the bounding box of all pads.
    pub fn extents(&self) -> Rect {
        if !self.outline.is_empty() {
            return self.outline;
        }
        self.pads
            .iter()
            .map(|p| p.bounding_box())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }

    /// Fills in `PadData::net` from the net pad lists, for boards where only
    /// the nets list their pads.
    pub fn link_pads_to_nets(&mut self) {
        for (net_idx, net) in self.nets.iter().enumerate() {
            for pad in &net.pads {
                if let Some(p) = self.pads.get_mut(pad.index()) {
                    p.net.get_or_insert(NetId::new(net_idx));
                }
            }
        }
    }

    pub fn clear_routes(&mut self) {
        for net in &mut self.nets {
            net.route_segments.clear();
            net.vias.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smd(name: &str, x: f64, y: f64, net: Option<NetId>) -> PadData {
        PadData {
            name: name.to_string(),
            position: Point::new(x, y),
            shape: PadShape::Rect {
                width: 1.0,
                height: 0.5,
            },
            layers: PadLayers::Single("F.Cu".to_string()),
            net,
        }
    }

    #[test]
    fn add_pad_registers_with_net() {
        let mut db = BoardDB::new();
        db.add_layer("F.Cu");
        let net = db.add_net(NetData::new("GND"));
        let pad = db.add_pad(smd("P1", 1.0, 1.0, Some(net)));
        assert_eq!(db.nets[0].pads, vec![pad]);
    }

    #[test]
    fn extents_fall_back_to_pad_bounds() {
        let mut db = BoardDB::new();
        db.add_pad(smd("P1", 1.0, 1.0, None));
        db.add_pad(smd("P2", 5.0, 3.0, None));
        let r = db.extents();
        assert!((r.min.x - 0.5).abs() < 1e-9);
        assert!((r.max.x - 5.5).abs() < 1e-9);
        assert!((r.min.y - 0.75).abs() < 1e-9);
        assert!((r.max.y - 3.25).abs() < 1e-9);
    }

    #[test]
    fn board_survives_toml_round_trip() {
        let mut db = BoardDB::new();
        db.add_layer("F.Cu");
        db.add_layer("B.Cu");
        let net = db.add_net(NetData::new("SIG"));
        db.add_pad(smd("P1", 1.0, 1.0, Some(net)));
        let text = toml::to_string_pretty(&db).unwrap();
        let back: BoardDB = toml::from_str(&text).unwrap();
        assert_eq!(back.layers.len(), 2);
        assert_eq!(back.pads[0].layers, PadLayers::Single("F.Cu".to_string()));
        assert_eq!(back.nets[0].pads.len(), 1);
    }

    #[test]
    fn netclass_defaults_when_missing() {
        let db = BoardDB::new();
        let nc = db.netclass(None);
        assert_eq!(nc.name, "Default");
    }
}
