use pcb_common::db::indices::NetId;
use pcb_common::geom::coord::Location;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouterError {
    #[error("invalid grid dimensions {w}x{h}x{layers}")]
    InvalidDimensions { w: i32, h: i32, layers: i32 },
    #[error("board grid is already initialized")]
    AlreadyInitialized,
    #[error("scale factor must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("{layers} layers exceeds the configured maximum of {max}")]
    TooManyLayers { layers: usize, max: usize },
    #[error("location {0} is outside the grid")]
    OutOfBounds(Location),
    #[error("net {net_id:?} is unroutable: {unreached} pin(s) unreached")]
    Unroutable { net_id: NetId, unreached: usize },
    #[error("net {net_id:?} is already routed")]
    AlreadyRouted { net_id: NetId },
    #[error("net {net_id:?} has no rasterized route to rip up")]
    InconsistentRipup { net_id: NetId },
    #[error("unknown layer '{0}'")]
    UnknownLayer(String),
    #[error("pad '{0}' lies outside the routing grid")]
    PadOutsideGrid(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;
