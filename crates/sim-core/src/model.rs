//! Step -> kernel state mapping.
//!
//! The step range is cut into blocks of `block_steps`; block `k` accumulates
//! the diagonal output element `(k, k)`. Inside a block the reduction index
//! advances every `reduction_steps`. The LOAD/COMPUTE phase is cut once at
//! the global midpoint and does not follow block boundaries, so a block can
//! start in one phase and finish in the other.

use std::fmt;

use crate::config::{TilingConfig, MAX_MATRIX_SIZE};

const FULL: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Load,
    Compute,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Load => "LOAD",
            Phase::Compute => "COMPUTE",
        }
    }

    /// Numeric label shown as "Execution Phase N".
    pub fn index(self) -> u8 {
        match self {
            Phase::Load => 0,
            Phase::Compute => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub row: u32,
    pub col: u32,
}

impl GridPos {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Cosmetic thread label. Not bounded by the matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ThreadIndex {
    pub row: u32,
    pub col: u32,
}

/// Per-cell fill percentage of the output matrix, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressGrid {
    size: u32,
    cells: Vec<u8>,
}

impl ProgressGrid {
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Out-of-bounds cells read as untouched.
    pub fn get(&self, row: u32, col: u32) -> u8 {
        if row >= self.size || col >= self.size {
            return 0;
        }
        self.cells[(row * self.size + col) as usize]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    pub fn completed(&self) -> usize {
        self.cells.iter().filter(|&&p| p == FULL).count()
    }
}

/// Which slots of a shared-memory tile are populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMask {
    size: u32,
    filled: Vec<bool>,
}

impl TileMask {
    fn build(size: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut filled = Vec::with_capacity((size * size) as usize);
        for r in 0..size {
            for c in 0..size {
                filled.push(f(r, c));
            }
        }
        Self { size, filled }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_filled(&self, row: u32, col: u32) -> bool {
        row < self.size && col < self.size && self.filled[(row * self.size + col) as usize]
    }

    pub fn filled_count(&self) -> usize {
        self.filled.iter().filter(|&&b| b).count()
    }

    /// 0/1 bytes, row-major, for typed-array export.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.filled.iter().map(|&b| b as u8).collect()
    }
}

/// Highlight flags for a cell of input matrix M or N.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellMark {
    /// Row/column currently being copied into shared memory.
    pub loading: bool,
    /// The element feeding the current partial product.
    pub focus: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationState {
    pub step: u32,
    pub total_steps: u32,
    pub phase: Phase,
    pub output_tile: GridPos,
    pub reduction_index: u32,
    pub thread: ThreadIndex,
    pub progress: ProgressGrid,
    pub tile_m: TileMask,
    pub tile_n: TileMask,
    tile_size: u32,
}

impl SimulationState {
    pub fn cell_progress(&self, row: u32, col: u32) -> u8 {
        self.progress.get(row, col)
    }

    /// Global M element held in shared tile slot `(row, col)`.
    pub fn tile_m_element(&self, row: u32, col: u32) -> GridPos {
        GridPos::new(
            (self.output_tile.row * self.tile_size).saturating_add(row),
            self.reduction_index.saturating_add(col),
        )
    }

    /// Global N element held in shared tile slot `(row, col)`.
    pub fn tile_n_element(&self, row: u32, col: u32) -> GridPos {
        GridPos::new(
            self.reduction_index.saturating_add(row),
            (self.output_tile.col * self.tile_size).saturating_add(col),
        )
    }

    pub fn m_mark(&self, row: u32, col: u32) -> CellMark {
        CellMark {
            loading: self.phase == Phase::Load && col == self.reduction_index,
            focus: row == self.output_tile.row && col == self.reduction_index,
        }
    }

    pub fn n_mark(&self, row: u32, col: u32) -> CellMark {
        CellMark {
            loading: self.phase == Phase::Load && row == self.reduction_index,
            focus: row == self.reduction_index && col == self.output_tile.col,
        }
    }

    pub fn narration(&self) -> Narration<'_> {
        Narration(self)
    }
}

/// One-line description of what the active thread is doing.
pub struct Narration<'a>(&'a SimulationState);

impl fmt::Display for Narration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let (tr, tc) = (s.thread.row, s.thread.col);
        match s.phase {
            Phase::Load => write!(
                f,
                "Loading tiles from global memory to shared memory: Thread({tr},{tc}) loads elements"
            ),
            Phase::Compute => {
                let k = s.output_tile;
                let r = s.reduction_index;
                write!(
                    f,
                    "Performing computation: Thread({tr},{tc}) computing P[{k}] += M[{},{r}] * N[{r},{}]",
                    k.row, k.col
                )
            }
        }
    }
}

/// State at `step` under the reference configuration.
pub fn compute_state(step: u32, total_steps: u32) -> SimulationState {
    compute_state_with(&TilingConfig::default(), step, total_steps)
}

/// State at `step`. Steps past `total_steps` saturate; range enforcement
/// belongs to the step controller.
pub fn compute_state_with(cfg: &TilingConfig, step: u32, total_steps: u32) -> SimulationState {
    let cfg = TilingConfig {
        total_steps,
        ..*cfg
    };
    let step = step.min(total_steps);
    let block_steps = cfg.block_steps.max(1);
    let size = cfg.matrix_size.min(MAX_MATRIX_SIZE);

    let block = step / block_steps;
    let offset = step % block_steps;
    let last_tile = cfg.diagonal_tiles() - 1;
    let tile = block.min(last_tile);

    let phase = if step < cfg.phase_split() {
        Phase::Load
    } else {
        Phase::Compute
    };
    let reduction_index = offset / cfg.reduction_steps.max(1);
    let thread_cols = cfg.thread_cols.max(1);
    let thread = ThreadIndex {
        row: step / thread_cols,
        col: step % thread_cols,
    };

    // The sweep position may run one past the last tile once every block
    // is done; that marks every earlier cell complete.
    let sweep = block.min(size);
    let active = ((offset as u64 * FULL as u64) / block_steps as u64).min(FULL as u64) as u8;
    let mut cells = Vec::with_capacity((size * size) as usize);
    for row in 0..size {
        for col in 0..size {
            let p = if row < sweep || (row == sweep && col < sweep) {
                FULL
            } else if row == sweep && col == sweep {
                active
            } else {
                0
            };
            cells.push(p);
        }
    }

    let t = cfg.tile_size.min(size);
    SimulationState {
        step,
        total_steps,
        phase,
        output_tile: GridPos::new(tile, tile),
        reduction_index,
        thread,
        progress: ProgressGrid { size, cells },
        tile_m: TileMask::build(t, |_, c| c <= reduction_index),
        tile_n: TileMask::build(t, |r, _| r <= reduction_index),
        tile_size: t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: u32 = 100;

    #[test]
    fn step_zero_starts_loading_first_tile() {
        let s = compute_state(0, TOTAL);
        assert_eq!(s.phase, Phase::Load);
        assert_eq!(s.output_tile, GridPos::new(0, 0));
        assert_eq!(s.reduction_index, 0);
        assert!(s.progress.as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn step_24_is_end_of_first_block() {
        let s = compute_state(24, TOTAL);
        assert_eq!(s.phase, Phase::Load);
        assert_eq!(s.output_tile, GridPos::new(0, 0));
        assert_eq!(s.reduction_index, 4);
        assert_eq!(s.cell_progress(0, 0), 96);
        assert_eq!(s.cell_progress(0, 1), 0);
    }

    #[test]
    fn step_50_flips_phase_mid_sweep() {
        let s = compute_state(50, TOTAL);
        assert_eq!(s.phase, Phase::Compute);
        assert_eq!(s.output_tile, GridPos::new(2, 2));
        assert_eq!(s.reduction_index, 0);
        assert_eq!(s.cell_progress(2, 2), 0);
        assert_eq!(s.cell_progress(2, 1), 100);
        assert_eq!(s.cell_progress(1, 3), 100);
        assert_eq!(s.cell_progress(2, 3), 0);
    }

    #[test]
    fn phase_cut_is_global_not_per_block() {
        assert_eq!(compute_state(49, TOTAL).phase, Phase::Load);
        assert_eq!(compute_state(49, TOTAL).output_tile, GridPos::new(1, 1));
        assert_eq!(compute_state(26, TOTAL).phase, Phase::Load);
        assert_eq!(compute_state(74, TOTAL).phase, Phase::Compute);
    }

    #[test]
    fn final_step_completes_every_cell() {
        let s = compute_state(TOTAL, TOTAL);
        assert_eq!(s.output_tile, GridPos::new(3, 3));
        assert_eq!(s.reduction_index, 0);
        assert_eq!(s.progress.completed(), 16);
    }

    #[test]
    fn steps_past_total_saturate() {
        assert_eq!(compute_state(250, TOTAL), compute_state(TOTAL, TOTAL));
    }

    #[test]
    fn thread_label_is_unbounded() {
        let s = compute_state(87, TOTAL);
        assert_eq!(s.thread, ThreadIndex { row: 8, col: 7 });
    }

    #[test]
    fn tile_masks_follow_reduction_index() {
        let s = compute_state(0, TOTAL);
        assert!(s.tile_m.is_filled(0, 0));
        assert!(s.tile_m.is_filled(1, 0));
        assert!(!s.tile_m.is_filled(0, 1));
        assert!(s.tile_n.is_filled(0, 1));
        assert!(!s.tile_n.is_filled(1, 0));
        assert_eq!(s.tile_m.filled_count(), 2);

        let s = compute_state(6, TOTAL);
        assert_eq!(s.tile_m.filled_count(), 4);
        assert_eq!(s.tile_n.to_bytes(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn shared_tile_elements() {
        let s = compute_state(32, TOTAL);
        assert_eq!(s.output_tile, GridPos::new(1, 1));
        assert_eq!(s.reduction_index, 1);
        assert_eq!(s.tile_m_element(0, 0), GridPos::new(2, 1));
        assert_eq!(s.tile_m_element(1, 1), GridPos::new(3, 2));
        assert_eq!(s.tile_n_element(1, 0), GridPos::new(2, 2));
    }

    #[test]
    fn input_marks() {
        let s = compute_state(13, TOTAL);
        assert_eq!(s.reduction_index, 2);
        assert!(s.m_mark(3, 2).loading);
        assert!(!s.m_mark(3, 2).focus);
        assert!(s.m_mark(0, 2).focus);
        assert!(s.n_mark(2, 0).focus);
        assert!(s.n_mark(2, 3).loading);

        let late = compute_state(60, TOTAL);
        assert_eq!(late.reduction_index, 1);
        assert!(!late.m_mark(0, 1).loading);
        assert!(late.m_mark(2, 1).focus);
    }

    #[test]
    fn narration_text() {
        let s = compute_state(12, TOTAL);
        assert_eq!(
            s.narration().to_string(),
            "Loading tiles from global memory to shared memory: Thread(1,2) loads elements"
        );
        let s = compute_state(57, TOTAL);
        assert_eq!(
            s.narration().to_string(),
            "Performing computation: Thread(5,7) computing P[2,2] += M[2,1] * N[1,2]"
        );
    }

    #[test]
    fn short_run_stops_sweep_early() {
        let cfg = TilingConfig::default();
        let s = compute_state_with(&cfg, 50, 50);
        assert_eq!(s.output_tile, GridPos::new(1, 1));
        assert_eq!(s.cell_progress(1, 1), 100);
        assert_eq!(s.cell_progress(2, 2), 0);
    }

    #[test]
    fn unvalidated_matrix_size_is_capped() {
        let cfg = TilingConfig {
            matrix_size: 70_000,
            tile_size: 70_000,
            ..TilingConfig::default()
        };
        for step in [0, 37, 100] {
            let s = compute_state_with(&cfg, step, 100);
            assert_eq!(s.progress.size(), MAX_MATRIX_SIZE);
            assert_eq!(s.progress.as_slice().len(), 64 * 64);
            assert_eq!(s.tile_m.size(), MAX_MATRIX_SIZE);
            let corner = s.tile_m_element(MAX_MATRIX_SIZE - 1, MAX_MATRIX_SIZE - 1);
            assert!(corner.row >= s.output_tile.row * MAX_MATRIX_SIZE);
        }
    }

    #[test]
    fn out_of_bounds_progress_reads_zero() {
        let s = compute_state(TOTAL, TOTAL);
        assert_eq!(s.cell_progress(4, 0), 0);
        assert!(!s.tile_m.is_filled(2, 0));
    }
}
