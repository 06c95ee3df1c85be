//! Property tests for the application components.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use components::{Button, ButtonEvent, PidController, PidGains, Polarity};
use platform::mocks::MockPin;
use platform::PinState;
use proptest::prelude::*;

proptest! {
    /// Output never leaves its limits and the integral never leaves its
    /// clamp, whatever the inputs.
    #[test]
    fn pid_respects_its_limits(
        steps in prop::collection::vec((-1e3f32..1e3, -1e3f32..1e3, -0.5f32..0.5), 1..64),
        kp in 0f32..10.0,
        ki in 0f32..10.0,
        kd in 0f32..1.0,
    ) {
        let mut pid = PidController::new(PidGains::new(kp, ki, kd))
            .with_output_limits(-5.0, 5.0)
            .with_integral_limit(2.0);
        for (setpoint, measurement, dt) in steps {
            let out = pid.update(setpoint, measurement, dt);
            prop_assert!((-5.0..=5.0).contains(&out));
            prop_assert!((-2.0..=2.0).contains(&pid.integral()));
        }
    }

    /// Pulses shorter than the window never produce an event.
    #[test]
    fn short_glitches_are_filtered(
        window in 2u64..50,
        pulses in prop::collection::vec(1u64..50, 1..16),
    ) {
        let pin = MockPin::new(PinState::Low);
        let mut button = Button::new(&pin, Polarity::ActiveHigh, window);
        let mut now = 0;
        for width in pulses {
            let width = width % window;
            pin.set_level(PinState::High);
            prop_assert_eq!(button.update(now).unwrap(), None);
            now += width;
            // Still bouncing: last high sample is inside the window.
            if width > 0 {
                prop_assert_eq!(button.update(now - 1).unwrap(), None);
            }
            pin.set_level(PinState::Low);
            prop_assert_eq!(button.update(now).unwrap(), None);
            now += 1;
        }
        prop_assert!(!button.is_pressed());
    }
}

#[test]
fn held_button_reports_one_press_and_one_release() {
    let pin = MockPin::new(PinState::High);
    let mut button = Button::new(&pin, Polarity::ActiveLow, 10);

    pin.set_level(PinState::Low);
    let events: Vec<_> = (0..=100)
        .step_by(5)
        .filter_map(|t| button.update(t).unwrap())
        .collect();
    assert_eq!(events, [ButtonEvent::Pressed]);

    pin.set_level(PinState::High);
    let events: Vec<_> = (105..=200)
        .step_by(5)
        .filter_map(|t| button.update(t).unwrap())
        .collect();
    assert_eq!(events, [ButtonEvent::Released]);
    assert_eq!(button.release().level(), PinState::High);
}
