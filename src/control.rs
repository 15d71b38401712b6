//! PID controller for the auto-level mode.

use crate::params::PidGains;

/// Textbook PID with caller-supplied timestep.
///
/// The controller owns no clock: callers pass the elapsed time per
/// update, which keeps runs reproducible and lets tests drive it with
/// synthetic timesteps.
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    integral: f64,
    last_error: f64,
    feedback: f64,
}

impl Pid {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            last_error: 0.0,
            feedback: 0.0,
        }
    }

    /// Advance the controller by `dt_s` seconds and return the new
    /// feedback value.
    ///
    /// A zero timestep returns the previous feedback without touching
    /// any state, so a duplicate timer reading cannot divide by zero
    /// or double-count the integral.
    pub fn update(&mut self, setpoint: f64, measured: f64, dt_s: f64) -> f64 {
        if dt_s == 0.0 {
            return self.feedback;
        }

        let error = setpoint - measured;
        let derivative = (error - self.last_error) / dt_s;
        self.integral += error * dt_s;
        self.last_error = error;

        self.feedback =
            self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        self.feedback
    }

    /// Clear all accumulated state.
    ///
    /// After a reset the controller behaves exactly like a freshly
    /// constructed one with the same gains.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.feedback = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(kp: f64, ki: f64, kd: f64) -> PidGains {
        PidGains { kp, ki, kd }
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = Pid::new(gains(0.5, 0.0, 0.0));

        assert_eq!(pid.update(10.0, 4.0, 0.01), 3.0);
        assert_eq!(pid.update(10.0, 12.0, 0.01), -1.0);
    }

    #[test]
    fn test_integral_accumulates_error_time() {
        let mut pid = Pid::new(gains(0.0, 1.0, 0.0));

        // Constant error of 2.0 over two 0.5s steps: integral reaches 2.0
        assert_eq!(pid.update(2.0, 0.0, 0.5), 1.0);
        assert_eq!(pid.update(2.0, 0.0, 0.5), 2.0);
    }

    #[test]
    fn test_derivative_tracks_error_rate() {
        let mut pid = Pid::new(gains(0.0, 0.0, 1.0));

        // Error jumps from 0 to 3 in 0.1s
        let out = pid.update(3.0, 0.0, 0.1);
        assert!((out - 30.0).abs() < 1e-12);

        // Error steady: derivative falls to zero
        let out = pid.update(3.0, 0.0, 0.1);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn test_zero_dt_returns_previous_feedback() {
        let mut pid = Pid::new(gains(1.0, 1.0, 1.0));

        let first = pid.update(5.0, 0.0, 0.1);
        assert_eq!(pid.update(5.0, 123.0, 0.0), first);

        // The zero-dt call must not have disturbed the state
        let mut reference = Pid::new(gains(1.0, 1.0, 1.0));
        reference.update(5.0, 0.0, 0.1);
        assert_eq!(pid.update(5.0, 1.0, 0.1), reference.update(5.0, 1.0, 0.1));
    }

    #[test]
    fn test_reset_matches_fresh_controller() {
        let mut used = Pid::new(gains(0.3, 0.7, 0.2));
        for i in 0..10 {
            used.update(8.0, i as f64, 0.05);
        }
        used.reset();

        let mut fresh = Pid::new(gains(0.3, 0.7, 0.2));
        for i in 0..5 {
            let measured = 1.5 * i as f64;
            assert_eq!(
                used.update(8.0, measured, 0.05),
                fresh.update(8.0, measured, 0.05)
            );
        }
    }
}
