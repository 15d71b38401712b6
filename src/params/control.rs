//! Auto-level controller and timing configuration.

/// Field-of-view setpoints for auto mode.
///
/// Chosen to match a fixed-lens camera module: 45° horizontal by 34°
/// vertical. Auto mode drags the up/right patch edges until the
/// estimated FOV settles on these values.
#[derive(Debug, Clone, Copy)]
pub struct FovTargets {
    /// Target horizontal field of view (degrees)
    pub horizontal_deg: f64,

    /// Target vertical field of view (degrees)
    pub vertical_deg: f64,
}

impl Default for FovTargets {
    fn default() -> Self {
        Self {
            horizontal_deg: 45.0,
            vertical_deg: 34.0,
        }
    }
}

/// PID gains shared by both edge controllers.
#[derive(Debug, Clone, Copy)]
pub struct PidGains {
    /// Proportional gain (meters per degree of error)
    pub kp: f64,

    /// Integral gain (meters per degree-second)
    pub ki: f64,

    /// Derivative gain (meters per degree-per-second)
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        // Proportional-only; ki/kd stay at zero in the shipped tuning
        Self {
            kp: 0.01,
            ki: 0.0,
            kd: 0.0,
        }
    }
}

/// Frame pacing and input debounce windows.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Maximum simulation steps per second
    pub target_fps: f64,

    /// Minimum interval between toggle flips of one key (milliseconds)
    pub debounce_window_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_fps: 100.0,
            debounce_window_ms: 200,
        }
    }
}

impl TimingConfig {
    /// Shortest accepted frame interval (seconds)
    pub fn min_frame_interval_s(&self) -> f64 {
        1.0 / self.target_fps
    }
}

/// Aggregate controller parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlConfig {
    pub targets: FovTargets,
    pub gains: PidGains,
    pub timing: TimingConfig,
}
