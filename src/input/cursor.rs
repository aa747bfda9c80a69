//! Per-window cursor-grab state machine.

use crate::error::{NgError, NgResult};

/// Requested grab mode as passed through `set_cursor_grab`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    /// Release any grab.
    None = 0,
    /// Confine the pointer to the window; absolute motion continues.
    Confined = 1,
    /// Hide and lock the pointer; motion is reported as relative deltas.
    Locked = 2,
}

impl GrabMode {
    pub fn from_raw(mode: i32) -> NgResult<GrabMode> {
        match mode {
            0 => Ok(GrabMode::None),
            1 => Ok(GrabMode::Confined),
            2 => Ok(GrabMode::Locked),
            _ => Err(NgError::InvalidParameter("cursor grab mode must be 0, 1 or 2")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    #[default]
    Free,
    Confined,
    Locked,
}

/// How a pointer motion sample should be reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionOutput {
    Absolute { x: f64, y: f64 },
    Relative { dx: f64, dy: f64 },
}

/// Which native stream supplies deltas for the current lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeltaSource {
    /// Deltas are derived from absolute pointer positions.
    Absolute,
    /// Deltas come from the platform's relative motion events.
    Native,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorTracker {
    state: CursorState,
    last_position: Option<(f64, f64)>,
    delta_source: Option<DeltaSource>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn last_position(&self) -> Option<(f64, f64)> {
        self.last_position
    }

    pub fn set_mode(&mut self, mode: GrabMode) {
        self.delta_source = None;
        self.state = match mode {
            GrabMode::None => {
                self.last_position = None;
                CursorState::Free
            }
            GrabMode::Confined => CursorState::Confined,
            GrabMode::Locked => {
                // Every lock measures its first delta from its own first sample.
                self.last_position = None;
                CursorState::Locked
            }
        };
    }

    /// Interpret an absolute pointer position.
    ///
    /// While locked the first sample yields a zero delta. The first non-zero
    /// delta claims the lock for absolute positions; once native relative
    /// motion owns the lock, positions are tracked but report nothing.
    pub fn on_motion(&mut self, x: f64, y: f64) -> Option<MotionOutput> {
        match self.state {
            CursorState::Free => Some(MotionOutput::Absolute { x, y }),
            CursorState::Confined => {
                self.last_position = Some((x, y));
                Some(MotionOutput::Absolute { x, y })
            }
            CursorState::Locked => {
                let (lx, ly) = self.last_position.unwrap_or((x, y));
                self.last_position = Some((x, y));
                let (dx, dy) = (x - lx, y - ly);
                match self.delta_source {
                    Some(DeltaSource::Native) => None,
                    Some(DeltaSource::Absolute) => Some(MotionOutput::Relative { dx, dy }),
                    None => {
                        if dx != 0.0 || dy != 0.0 {
                            self.delta_source = Some(DeltaSource::Absolute);
                        }
                        Some(MotionOutput::Relative { dx, dy })
                    }
                }
            }
        }
    }

    /// Native relative motion is only forwarded while locked, and only when
    /// absolute positions have not already claimed the lock.
    pub fn on_raw_motion(&mut self, dx: f64, dy: f64) -> Option<(f64, f64)> {
        if self.state != CursorState::Locked {
            return None;
        }
        match self.delta_source {
            Some(DeltaSource::Absolute) => None,
            _ => {
                self.delta_source = Some(DeltaSource::Native);
                Some((dx, dy))
            }
        }
    }
}
