use log::debug;

/// Sole owner of the current simulation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepController {
    step: u32,
    total_steps: u32,
}

impl StepController {
    pub fn new(total_steps: u32) -> Self {
        Self {
            step: 0,
            total_steps,
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Moves one step forward. Returns whether the step changed.
    pub fn advance(&mut self) -> bool {
        self.apply(self.step as i64 + 1)
    }

    /// Moves one step back. Returns whether the step changed.
    pub fn retreat(&mut self) -> bool {
        self.apply(self.step as i64 - 1)
    }

    /// Jumps to `n`, clamped into `[0, total_steps]`.
    pub fn set_step(&mut self, n: i64) -> bool {
        self.apply(n)
    }

    pub fn reset(&mut self) -> bool {
        self.apply(0)
    }

    /// Changes the range; the current step is pulled back inside it.
    pub fn set_total_steps(&mut self, total_steps: u32) {
        self.total_steps = total_steps;
        self.step = self.step.min(total_steps);
    }

    fn apply(&mut self, n: i64) -> bool {
        let next = n.clamp(0, self.total_steps as i64) as u32;
        if next == self.step {
            return false;
        }
        debug!("step {} -> {} (requested {})", self.step, next, n);
        self.step = next;
        true
    }
}
