//! Debounced push button.
//!
//! The button is sampled, not interrupt driven: call [`Button::update`] from
//! a periodic task with the current time. A new level is accepted only after
//! it has been read continuously for the debounce window, so contact bounce
//! shorter than the window never produces an event.
//!
//! ```
//! use components::{Button, ButtonEvent, Polarity};
//! use platform::mocks::MockPin;
//! use platform::PinState;
//!
//! let pin = MockPin::new(PinState::High);
//! let mut button = Button::new(&pin, Polarity::ActiveLow, 20);
//!
//! pin.set_level(PinState::Low);
//! assert_eq!(button.update(0), Ok(None));
//! assert_eq!(button.update(20), Ok(Some(ButtonEvent::Pressed)));
//! ```

use platform::{Clock, InputPin};

/// Electrical wiring of the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Pressed reads high (pull-down wiring).
    ActiveHigh,
    /// Pressed reads low (pull-up wiring).
    ActiveLow,
}

/// Debounced state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// The button went down.
    Pressed,
    /// The button came back up.
    Released,
}

/// Push button debounced over a fixed time window.
pub struct Button<P> {
    pin: P,
    polarity: Polarity,
    debounce_ms: u64,
    pressed: bool,
    /// Level that differs from the accepted one, and when it was first seen.
    candidate: Option<(bool, u64)>,
}

impl<P: InputPin> Button<P> {
    /// Button on `pin`, initially released.
    pub const fn new(pin: P, polarity: Polarity, debounce_ms: u64) -> Self {
        Self {
            pin,
            polarity,
            debounce_ms,
            pressed: false,
            candidate: None,
        }
    }

    /// Sample the pin at `now_ms` and report an accepted state change.
    pub fn update(&mut self, now_ms: u64) -> Result<Option<ButtonEvent>, P::Error> {
        let high = self.pin.is_high()?;
        let pressed = match self.polarity {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        };

        if pressed == self.pressed {
            self.candidate = None;
            return Ok(None);
        }

        let since = match self.candidate {
            Some((level, since)) if level == pressed => since,
            _ => {
                self.candidate = Some((pressed, now_ms));
                now_ms
            }
        };
        if now_ms.saturating_sub(since) < self.debounce_ms {
            return Ok(None);
        }

        self.pressed = pressed;
        self.candidate = None;
        let event = if pressed {
            ButtonEvent::Pressed
        } else {
            ButtonEvent::Released
        };
        trace!("button {}", pressed);
        Ok(Some(event))
    }

    /// [`update`](Self::update) with the time taken from `clock`.
    pub fn poll<C: Clock>(&mut self, clock: &C) -> Result<Option<ButtonEvent>, P::Error> {
        self.update(clock.now_ms())
    }

    /// Debounced state.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Stability window in milliseconds.
    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}
