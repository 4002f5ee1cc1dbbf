pub mod dijkstra;
pub mod neighbors;
