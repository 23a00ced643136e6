//! Monotonic progress tracking shared by the job and preview controllers.
//!
//! Real server reports and locally simulated advancement both feed a single
//! [`ProgressTrack`] through [`ProgressTrack::apply`], which is the only place
//! that decides whether the displayed value moves.

pub const COMPLETE: u8 = 100;

/// One producer's contribution to the displayed progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Authoritative value reported by the server.
    Real(u8),
    /// Locally computed value.
    Simulated(u8),
}

/// What applying an update did to the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The displayed value increased.
    Advanced,
    /// A real report was stored as the new server high-water mark without
    /// moving the display.
    Recorded,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressTrack {
    displayed: u8,
    last_server: u8,
}

impl ProgressTrack {
    pub fn displayed(&self) -> u8 {
        self.displayed
    }

    /// Highest value the server has reported; 0 means nothing reported yet.
    pub fn last_server(&self) -> u8 {
        self.last_server
    }

    /// Applies one update. The displayed value never decreases.
    pub fn apply(&mut self, update: ProgressUpdate) -> MergeOutcome {
        match update {
            ProgressUpdate::Real(value) => {
                let value = value.min(COMPLETE);
                if self.last_server != 0 && value <= self.last_server {
                    return MergeOutcome::Ignored;
                }
                self.last_server = value;
                if value > self.displayed {
                    self.displayed = value;
                    MergeOutcome::Advanced
                } else {
                    MergeOutcome::Recorded
                }
            }
            ProgressUpdate::Simulated(value) => {
                let value = value.min(COMPLETE);
                if value > self.displayed {
                    self.displayed = value;
                    MergeOutcome::Advanced
                } else {
                    MergeOutcome::Ignored
                }
            }
        }
    }

    /// Raises the display to at least `floor` without touching server state.
    pub fn raise_floor(&mut self, floor: u8) {
        self.apply(ProgressUpdate::Simulated(floor));
    }

    /// Next decelerating job simulation value, clamped to `ceiling`.
    pub fn simulated_next(&self, ceiling: u8) -> ProgressUpdate {
        let step = simulation_step(self.displayed);
        ProgressUpdate::Simulated(self.displayed.saturating_add(step).min(ceiling))
    }
}

/// Increment used by the job simulation at the given displayed value.
pub fn simulation_step(current: u8) -> u8 {
    match current {
        0..=29 => 4,
        30..=69 => 2,
        _ => 1,
    }
}

/// Phase label for simulated job progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    Preparing,
    Transferring,
    Finalizing,
}

impl SimulationPhase {
    pub fn for_progress(value: u8) -> Self {
        match value {
            0..=29 => SimulationPhase::Preparing,
            30..=69 => SimulationPhase::Transferring,
            _ => SimulationPhase::Finalizing,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SimulationPhase::Preparing => "Preparing download...",
            SimulationPhase::Transferring => "Transferring media...",
            SimulationPhase::Finalizing => "Finalizing file...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{simulation_step, MergeOutcome, ProgressTrack, ProgressUpdate, SimulationPhase};

    #[test]
    fn first_real_report_is_accepted() {
        let mut track = ProgressTrack::default();
        track.raise_floor(5);
        assert_eq!(track.apply(ProgressUpdate::Real(20)), MergeOutcome::Advanced);
        assert_eq!(track.displayed(), 20);
        assert_eq!(track.last_server(), 20);
    }

    #[test]
    fn stale_real_report_is_ignored() {
        let mut track = ProgressTrack::default();
        track.apply(ProgressUpdate::Real(40));
        assert_eq!(track.apply(ProgressUpdate::Real(40)), MergeOutcome::Ignored);
        assert_eq!(track.apply(ProgressUpdate::Real(30)), MergeOutcome::Ignored);
        assert_eq!(track.displayed(), 40);
    }

    #[test]
    fn lower_real_report_is_recorded_but_not_displayed() {
        let mut track = ProgressTrack::default();
        track.apply(ProgressUpdate::Simulated(60));
        assert_eq!(track.apply(ProgressUpdate::Real(35)), MergeOutcome::Recorded);
        assert_eq!(track.displayed(), 60);
        assert_eq!(track.last_server(), 35);

        assert_eq!(track.apply(ProgressUpdate::Real(70)), MergeOutcome::Advanced);
        assert_eq!(track.displayed(), 70);
    }

    #[test]
    fn real_values_are_clamped_to_complete() {
        let mut track = ProgressTrack::default();
        track.apply(ProgressUpdate::Real(250));
        assert_eq!(track.displayed(), 100);
        assert_eq!(track.last_server(), 100);
    }

    #[test]
    fn simulation_decelerates_and_respects_ceiling() {
        assert!(simulation_step(10) > simulation_step(50));
        assert!(simulation_step(50) > simulation_step(80));

        let mut track = ProgressTrack::default();
        track.raise_floor(93);
        assert_eq!(track.simulated_next(94), ProgressUpdate::Simulated(94));
        track.apply(track.simulated_next(94));
        assert_eq!(track.apply(track.simulated_next(94)), MergeOutcome::Ignored);
        assert_eq!(track.displayed(), 94);
    }

    #[test]
    fn phase_follows_progress() {
        assert_eq!(SimulationPhase::for_progress(5), SimulationPhase::Preparing);
        assert_eq!(SimulationPhase::for_progress(30), SimulationPhase::Transferring);
        assert_eq!(SimulationPhase::for_progress(88), SimulationPhase::Finalizing);
    }
}
