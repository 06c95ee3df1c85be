//! PID control-loop controller.
//!
//! Textbook parallel form, `u = kp·e + ki·∫e dt + kd·de/dt`, with two
//! safeguards:
//!
//! - the integral is clamped to `±integral_limit` (anti-windup), so a long
//!   saturated period does not leave a huge accumulated term behind;
//! - the output is clamped to `[output_min, output_max]`.
//!
//! The derivative is taken on the error and is zero on the first update after
//! construction or [`PidController::reset`].

/// Controller gains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,
}

impl PidGains {
    /// Gains `kp`, `ki`, `kd`.
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// PID controller state.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral_limit: f32,
    output_min: f32,
    output_max: f32,
    integral: f32,
    prev_error: Option<f32>,
    output: f32,
}

impl PidController {
    /// Unclamped controller.
    pub const fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral_limit: f32::INFINITY,
            output_min: f32::NEG_INFINITY,
            output_max: f32::INFINITY,
            integral: 0.0,
            prev_error: None,
            output: 0.0,
        }
    }

    /// Clamp the output to `[min, max]`. Bounds given in the wrong order are
    /// swapped.
    #[must_use]
    pub fn with_output_limits(mut self, min: f32, max: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.output_min = min;
        self.output_max = max;
        self
    }

    /// Clamp the accumulated integral to `±limit`.
    #[must_use]
    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = if limit < 0.0 { -limit } else { limit };
        self
    }

    /// Advance the loop by `dt_s` seconds and return the new output.
    ///
    /// A non-positive (or NaN) `dt_s` leaves the state untouched and returns
    /// the previous output.
    pub fn update(&mut self, setpoint: f32, measurement: f32, dt_s: f32) -> f32 {
        if dt_s.is_nan() || dt_s <= 0.0 {
            return self.output;
        }

        let error = setpoint - measurement;
        self.integral = clamp(
            self.integral + error * dt_s,
            -self.integral_limit,
            self.integral_limit,
        );
        let derivative = self.prev_error.map_or(0.0, |prev| (error - prev) / dt_s);
        self.prev_error = Some(error);

        let PidGains { kp, ki, kd } = self.gains;
        self.output = clamp(
            kp * error + ki * self.integral + kd * derivative,
            self.output_min,
            self.output_max,
        );
        self.output
    }

    /// Clear the integral, derivative history and output.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.output = 0.0;
    }

    /// Last output.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Accumulated integral of the error.
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Current gains.
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Retune without resetting the loop state.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }
}

// `f32::clamp` panics on NaN bounds.
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn proportional_only() {
        let mut pid = PidController::new(PidGains::new(2.0, 0.0, 0.0));
        assert!(close(pid.update(10.0, 4.0, 0.1), 12.0));
        assert!(close(pid.update(10.0, 9.0, 0.1), 2.0));
    }

    #[test]
    fn integral_accumulates_error_over_time() {
        let mut pid = PidController::new(PidGains::new(0.0, 1.0, 0.0));
        pid.update(1.0, 0.0, 0.5);
        assert!(close(pid.update(1.0, 0.0, 0.5), 1.0));
        assert!(close(pid.integral(), 1.0));
    }

    #[test]
    fn derivative_needs_a_previous_error() {
        let mut pid = PidController::new(PidGains::new(0.0, 0.0, 1.0));
        assert_eq!(pid.update(5.0, 0.0, 0.1), 0.0);
        // Error 5 -> 3 over 0.1 s.
        assert!(close(pid.update(5.0, 2.0, 0.1), -20.0));
    }

    #[test]
    fn integral_is_clamped() {
        let mut pid = PidController::new(PidGains::new(0.0, 1.0, 0.0)).with_integral_limit(2.0);
        for _ in 0..100 {
            pid.update(10.0, 0.0, 1.0);
        }
        assert!(close(pid.integral(), 2.0));
        // Recovers as soon as the error changes sign.
        pid.update(0.0, 1.0, 1.0);
        assert!(close(pid.integral(), 1.0));
    }

    #[test]
    fn output_is_clamped() {
        let mut pid = PidController::new(PidGains::new(100.0, 0.0, 0.0)).with_output_limits(1.0, -1.0);
        assert_eq!(pid.update(1.0, 0.0, 0.01), 1.0);
        assert_eq!(pid.update(-1.0, 0.0, 0.01), -1.0);
    }

    #[test]
    fn non_positive_dt_keeps_previous_output() {
        let mut pid = PidController::new(PidGains::new(1.0, 1.0, 0.0));
        let out = pid.update(3.0, 0.0, 1.0);
        assert_eq!(pid.update(100.0, 0.0, 0.0), out);
        assert_eq!(pid.update(100.0, 0.0, -1.0), out);
        assert_eq!(pid.update(100.0, 0.0, f32::NAN), out);
        assert!(close(pid.integral(), 3.0));
    }

    #[test]
    fn reset_clears_state() {
        let mut pid = PidController::new(PidGains::new(1.0, 1.0, 1.0));
        pid.update(1.0, 0.0, 1.0);
        pid.update(2.0, 0.0, 1.0);
        pid.reset();
        assert_eq!(pid.output(), 0.0);
        assert_eq!(pid.integral(), 0.0);
        // No derivative kick after reset.
        assert!(close(pid.update(1.0, 0.0, 1.0), 2.0));
    }
}
