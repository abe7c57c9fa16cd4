//! Panel supply and reset sequencing over GPIO.
//!
//! PWREN is active low (it drives the gate of the supply switch). The panel
//! needs 10 ms with RESET held after power is applied and 120 ms after
//! RESET is released before it accepts DCS commands.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use platform::PanelPower;

/// RESET hold time after power-up, ms.
pub const RESET_HOLD_MS: u32 = 10;

/// Wait after RESET release before the first command, ms.
pub const RESET_RECOVERY_MS: u32 = 120;

/// GPIO failure during power sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinError;

/// Panel power switch and reset line.
pub struct GpioPanelPower<PWREN, RST, D> {
    pwren: PWREN,
    rst: RST,
    delay: D,
}

impl<PWREN, RST, D> GpioPanelPower<PWREN, RST, D>
where
    PWREN: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    /// Take the two pins. Their state is not touched until
    /// [`PanelPower::power_on`].
    pub fn new(pwren: PWREN, rst: RST, delay: D) -> Self {
        Self { pwren, rst, delay }
    }

    /// Give the pins back.
    pub fn release(self) -> (PWREN, RST, D) {
        (self.pwren, self.rst, self.delay)
    }
}

impl<PWREN, RST, D> PanelPower for GpioPanelPower<PWREN, RST, D>
where
    PWREN: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    type Error = PinError;

    fn power_on(&mut self) -> Result<(), PinError> {
        self.pwren.set_low().map_err(|_| PinError)?;
        self.rst.set_low().map_err(|_| PinError)?;
        self.delay.delay_ms(RESET_HOLD_MS);
        self.rst.set_high().map_err(|_| PinError)?;
        self.delay.delay_ms(RESET_RECOVERY_MS);
        Ok(())
    }

    fn power_off(&mut self) {
        // Best effort: a stuck pin cannot be recovered here.
        let _ = self.rst.set_low();
        let _ = self.pwren.set_high();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::MockError;
    use std::io::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use platform::mocks::MockDelay;

    #[test]
    fn power_on_holds_reset_then_waits() {
        let pwren = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let rst = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut power = GpioPanelPower::new(pwren, rst, MockDelay::new());
        assert!(power.power_on().is_ok());

        let (mut pwren, mut rst, delay) = power.release();
        assert_eq!(delay.total_ns(), 130_000_000);
        pwren.done();
        rst.done();
    }

    #[test]
    fn power_off_asserts_reset_and_cuts_supply() {
        let pwren = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let rst = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut power = GpioPanelPower::new(pwren, rst, NoopDelay::new());
        power.power_off();

        let (mut pwren, mut rst, _) = power.release();
        pwren.done();
        rst.done();
    }

    #[test]
    fn pin_failure_aborts_power_on() {
        let pwren = PinMock::new(&[
            PinTransaction::set(PinState::Low).with_error(MockError::Io(ErrorKind::Other))
        ]);
        let rst = PinMock::new(&[]);
        let mut power = GpioPanelPower::new(pwren, rst, NoopDelay::new());
        assert_eq!(power.power_on(), Err(PinError));

        let (mut pwren, mut rst, _) = power.release();
        pwren.done();
        rst.done();
    }
}
