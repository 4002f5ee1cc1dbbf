use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RipUpPolicyKind {
    HighestCost,
    RoundRobin,
    Random,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    /// Grid cells per board unit.
    #[serde(default = "default_input_scale")]
    pub input_scale: f64,
    #[serde(default = "default_num_ripup_reroute_iterations")]
    pub num_ripup_reroute_iterations: usize,
    /// Extra grid cells added on every side of the board extents.
    #[serde(default = "default_enlarge_boundary")]
    pub enlarge_boundary: u32,
    #[serde(default = "default_step_cost")]
    pub step_cost: f64,
    #[serde(default = "default_layer_change_cost")]
    pub layer_change_cost: f64,
    #[serde(default = "default_trace_basic_cost")]
    pub trace_basic_cost: f64,
    #[serde(default = "default_via_insertion_cost")]
    pub via_insertion_cost: f64,
    #[serde(default = "default_pin_obstacle_cost")]
    pub pin_obstacle_cost: f64,
    /// Grid cells by which pad obstacles are grown before stamping.
    #[serde(default)]
    pub pin_inflate: u32,
    /// Cost charged per unrouted net when comparing solutions.
    #[serde(default = "default_unrouted_net_penalty")]
    pub unrouted_net_penalty: f64,
    #[serde(default = "default_max_layers")]
    pub max_layers: usize,
    #[serde(default = "default_ripup_policy")]
    pub ripup_policy: RipUpPolicyKind,
    /// Stop after this many iterations without improvement. Zero disables.
    #[serde(default)]
    pub stagnation_threshold: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            input_scale: default_input_scale(),
            num_ripup_reroute_iterations: default_num_ripup_reroute_iterations(),
            enlarge_boundary: default_enlarge_boundary(),
            step_cost: default_step_cost(),
            layer_change_cost: default_layer_change_cost(),
            trace_basic_cost: default_trace_basic_cost(),
            via_insertion_cost: default_via_insertion_cost(),
            pin_obstacle_cost: default_pin_obstacle_cost(),
            pin_inflate: 0,
            unrouted_net_penalty: default_unrouted_net_penalty(),
            max_layers: default_max_layers(),
            ripup_policy: default_ripup_policy(),
            stagnation_threshold: 0,
            seed: None,
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.input_scale.is_finite() || self.input_scale <= 0.0 {
            return Err(format!("input_scale must be positive, got {}", self.input_scale));
        }
        if self.max_layers == 0 {
            return Err("max_layers must be at least 1".to_string());
        }
        let costs = [
            ("step_cost", self.step_cost),
            ("layer_change_cost", self.layer_change_cost),
            ("trace_basic_cost", self.trace_basic_cost),
            ("via_insertion_cost", self.via_insertion_cost),
            ("pin_obstacle_cost", self.pin_obstacle_cost),
            ("unrouted_net_penalty", self.unrouted_net_penalty),
        ];
        for (name, value) in costs {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be finite and non-negative, got {}", name, value));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_board_file")]
    pub board_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            board_file: default_board_file(),
            output_file: default_output_file(),
        }
    }
}

fn default_input_scale() -> f64 {
    10.0
}

fn default_num_ripup_reroute_iterations() -> usize {
    20
}

fn default_enlarge_boundary() -> u32 {
    10
}

fn default_step_cost() -> f64 {
    1.0
}

fn default_layer_change_cost() -> f64 {
    10.0
}

fn default_trace_basic_cost() -> f64 {
    10.0
}

fn default_via_insertion_cost() -> f64 {
    100.0
}

fn default_pin_obstacle_cost() -> f64 {
    1000.0
}

fn default_unrouted_net_penalty() -> f64 {
    1.0e6
}

fn default_max_layers() -> usize {
    16
}

fn default_ripup_policy() -> RipUpPolicyKind {
    RipUpPolicyKind::HighestCost
}

fn default_board_file() -> String {
    "inputs/board.toml".to_string()
}

fn default_output_file() -> String {
    "output/routed.toml".to_string()
}
