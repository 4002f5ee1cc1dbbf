/// Per-cell routing state.
///
/// `working_cost` and `came_from` are only meaningful while `visit_tag`
/// matches the grid's current search tag, which lets a new search start
/// without sweeping the whole array.
#[derive(Clone, Copy, Debug)]
pub struct GridCell {
    pub(crate) base_cost: f64,
    pub(crate) working_cost: f64,
    pub(crate) via_cost: f64,
    pub(crate) came_from: Option<u32>,
    pub(crate) visit_tag: u32,
    pub(crate) closed_tag: u32,
    pub(crate) is_targeted_pin: bool,
    pub(crate) forbidden: bool,
    pub(crate) via_forbidden: bool,
    /// Pads currently forbidding a via here. Counted so overlapping pads can
    /// be unstamped one at a time.
    pub(crate) pad_via_blocks: u16,
}

impl Default for GridCell {
    fn default() -> Self {
        Self {
            base_cost: 0.0,
            working_cost: 0.0,
            via_cost: 0.0,
            came_from: None,
            visit_tag: 0,
            closed_tag: 0,
            is_targeted_pin: false,
            forbidden: false,
            via_forbidden: false,
            pad_via_blocks: 0,
        }
    }
}

impl GridCell {
    #[inline(always)]
    pub(crate) fn is_visited(&self, tag: u32) -> bool {
        self.visit_tag == tag
    }

    #[inline(always)]
    pub(crate) fn is_closed(&self, tag: u32) -> bool {
        self.closed_tag == tag
    }

    #[inline(always)]
    pub(crate) fn visit(&mut self, tag: u32, cost: f64, came_from: Option<u32>) {
        self.visit_tag = tag;
        self.working_cost = cost;
        self.came_from = came_from;
    }

    #[inline(always)]
    pub(crate) fn blocks_via(&self) -> bool {
        self.via_forbidden || self.pad_via_blocks > 0
    }

    pub fn base_cost(&self) -> f64 {
        self.base_cost
    }

    pub fn via_cost(&self) -> f64 {
        self.via_cost
    }
}
