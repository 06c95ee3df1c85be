//! GPIO pin abstraction layer
//!
//! Minimal digital pin traits used by the application components, plus
//! adapters that lift any `embedded-hal` 1.0 pin (e.g. an `embassy-stm32`
//! `Input`) into them.

use embedded_hal::digital;

/// Input pin operations
pub trait InputPin {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read pin state
    fn is_high(&mut self) -> Result<bool, Self::Error>;

    /// Read pin state (inverted)
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|v| !v)
    }

    /// Read pin state as a [`PinState`]
    fn state(&mut self) -> Result<PinState, Self::Error> {
        self.is_high().map(PinState::from)
    }
}

/// Output pin operations
pub trait OutputPin {
    /// Error type
    type Error: core::fmt::Debug;

    /// Set pin high
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Set pin low
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Set pin state
    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        match state {
            PinState::High => self.set_high(),
            PinState::Low => self.set_low(),
        }
    }
}

/// Pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1)
    High,
    /// Low (logic 0)
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// Adapter exposing an `embedded-hal` input pin as a Plat4m [`InputPin`].
pub struct HalInputPin<P>(pub P);

impl<P: digital::InputPin> InputPin for HalInputPin<P> {
    type Error = P::Error;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

/// Adapter exposing an `embedded-hal` output pin as a Plat4m [`OutputPin`].
pub struct HalOutputPin<P>(pub P);

impl<P: digital::OutputPin> OutputPin for HalOutputPin<P> {
    type Error = P::Error;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct EhPin {
        level: bool,
    }

    impl digital::ErrorType for EhPin {
        type Error = Infallible;
    }

    impl digital::InputPin for EhPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.level)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.level)
        }
    }

    impl digital::OutputPin for EhPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.level = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.level = true;
            Ok(())
        }
    }

    #[test]
    fn pin_state_round_trips_through_bool() {
        assert_eq!(PinState::from(true), PinState::High);
        assert!(!bool::from(PinState::Low));
    }

    #[test]
    fn hal_input_pin_reads_embedded_hal_level() {
        let mut pin = HalInputPin(EhPin { level: true });
        assert_eq!(pin.state(), Ok(PinState::High));
        assert_eq!(pin.is_low(), Ok(false));
    }

    #[test]
    fn hal_output_pin_drives_embedded_hal_level() {
        let mut pin = HalOutputPin(EhPin { level: false });
        pin.set_state(PinState::High).ok();
        assert!(pin.0.level);
        pin.set_low().ok();
        assert!(!pin.0.level);
    }
}
