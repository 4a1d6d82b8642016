/// A connection cost matrix mapping (previous right context, next left
/// context) → cost. Used by the Viterbi search to score transitions.
#[derive(Debug, Clone)]
pub struct ConnectionMatrix {
    pub(super) num_left: u16,
    pub(super) num_right: u16,
    pub(super) costs: Vec<i16>,
}

impl ConnectionMatrix {
    /// `costs` is row-major: one row of `num_right` costs per previous
    /// right-context ID. Returns `None` when the length does not match.
    pub fn new(num_left: u16, num_right: u16, costs: Vec<i16>) -> Option<Self> {
        (costs.len() == num_left as usize * num_right as usize).then_some(Self {
            num_left,
            num_right,
            costs,
        })
    }

    /// Look up the connection cost between two morphemes.
    /// Index: right_id * num_right + left_id. Out-of-bounds returns 0.
    pub fn cost(&self, right_id: u16, left_id: u16) -> i16 {
        if right_id >= self.num_left || left_id >= self.num_right {
            return 0;
        }
        let idx = right_id as usize * self.num_right as usize + left_id as usize;
        self.costs.get(idx).copied().unwrap_or(0)
    }

    /// Number of right-context IDs a preceding morpheme can carry.
    pub fn num_left(&self) -> u16 {
        self.num_left
    }

    /// Number of left-context IDs a following morpheme can carry.
    pub fn num_right(&self) -> u16 {
        self.num_right
    }
}
