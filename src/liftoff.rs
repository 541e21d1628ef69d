use tracing::info;

/// Prefix the mission clock shows once the vehicle has left the pad
pub const LIFTOFF_PREFIX: &str = "T+";

/// Where the run stands relative to liftoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiftoffState {
    PreLiftoff,
    PostLiftoff { frame_index: u64 },
}

impl LiftoffState {
    pub fn is_post_liftoff(&self) -> bool {
        matches!(self, Self::PostLiftoff { .. })
    }

    pub fn liftoff_frame(&self) -> Option<u64> {
        match self {
            Self::PreLiftoff => None,
            Self::PostLiftoff { frame_index } => Some(*frame_index),
        }
    }
}

/// One-way latch on the first clock reading that starts with `T+`
///
/// Holds the per-run pipeline state; a fresh detector is created for each run.
#[derive(Debug, Clone)]
pub struct LiftoffDetector {
    state: LiftoffState,
}

impl LiftoffDetector {
    pub fn new() -> Self {
        Self { state: LiftoffState::PreLiftoff }
    }

    /// Feed the cleaned clock text of `frame_index` and return the resulting state
    ///
    /// Once post-liftoff, later readings are ignored.
    pub fn observe(&mut self, frame_index: u64, clock_text: &str) -> LiftoffState {
        if self.state == LiftoffState::PreLiftoff && clock_text.starts_with(LIFTOFF_PREFIX) {
            info!("Liftoff detected at frame {} ({})", frame_index, clock_text);
            self.state = LiftoffState::PostLiftoff { frame_index };
        }
        self.state
    }

    pub fn state(&self) -> LiftoffState {
        self.state
    }
}

impl Default for LiftoffDetector {
    fn default() -> Self {
        Self::new()
    }
}
