//! Clock domain controller: PLL3 bring-up and teardown.
//!
//! PLL3 feeds the LTDC pixel clock (R output) and, until the D-PHY PLL is
//! running, the DSI host kernel clock (P output).

use platform::clock_config::{
    ClockControl, ClockSource, DsiClockSource, HseFrequency, LtdcClockSource, Pll3Config,
    Pll3Outputs, PllInputRange,
};
use platform::{DisplayError, WaitCondition, WaitPolicy};

use super::clock_math::{PLL3_P_DIV, PLL3_Q_DIV};
use super::profile::TimingProfile;

/// PLL3 parameters for `profile` on a board with `hse`.
pub const fn pll3_config(profile: &TimingProfile, hse: HseFrequency) -> Pll3Config {
    Pll3Config {
        source: ClockSource::Hse,
        m: hse.pll3_m(),
        n: profile.pixel.pll3_n,
        p: PLL3_P_DIV,
        q: PLL3_Q_DIV,
        r: profile.pixel.pll3_r,
        input_range: PllInputRange::Range0,
        outputs: Pll3Outputs::R.union(Pll3Outputs::P),
        fractional: false,
    }
}

/// PLL3 owner.
#[derive(Debug, Clone, Copy)]
pub struct ClockDomain {
    hse: HseFrequency,
    wait: WaitPolicy,
}

impl ClockDomain {
    /// Controller for a board with `hse`, bounding PLL flag waits by `wait`.
    pub const fn new(hse: HseFrequency, wait: WaitPolicy) -> Self {
        Self { hse, wait }
    }

    /// Reprogram PLL3 for `profile` and route both display kernel clocks
    /// to it.
    ///
    /// On a lock timeout PLL3 is left off.
    pub fn init<H: ClockControl + ?Sized>(
        &self,
        hal: &mut H,
        profile: &TimingProfile,
    ) -> Result<(), DisplayError> {
        hal.pll3_disable();
        self.wait
            .wait_for(WaitCondition::Pll3Unlocked, || !hal.pll3_is_ready())?;

        let config = pll3_config(profile, self.hse);
        debug!(
            "PLL3: m={} n={} r={}",
            config.m,
            config.n,
            config.r
        );
        hal.pll3_configure(&config);
        hal.pll3_enable();

        if let Err(e) = self
            .wait
            .wait_for(WaitCondition::Pll3Locked, || hal.pll3_is_ready())
        {
            hal.pll3_disable();
            return Err(e);
        }

        hal.set_dsi_clock_source(DsiClockSource::Pll3);
        hal.set_ltdc_clock_source(LtdcClockSource::Pll3);
        Ok(())
    }

    /// Switch PLL3 off.
    pub fn deinit<H: ClockControl + ?Sized>(&self, hal: &mut H) {
        hal.pll3_disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::profile::DisplayProfile;
    use platform::mocks::{FailPoint, HalCall, MockDisplayHal};

    fn domain() -> ClockDomain {
        ClockDomain::new(HseFrequency::Mhz32, WaitPolicy::Polls(16))
    }

    #[test]
    fn config_uses_profile_dividers() {
        let t = DisplayProfile::DEFAULT.timing();
        let c = pll3_config(t, HseFrequency::Mhz32);
        assert_eq!((c.m, c.n, c.p, c.q, c.r), (8, 112, 8, 8, 24));
        assert_eq!(c.outputs, Pll3Outputs::R | Pll3Outputs::P);
        assert!(!c.fractional);
        assert_eq!(pll3_config(t, HseFrequency::Mhz16).m, 4);
    }

    #[test]
    fn init_sequence() {
        let mut hal = MockDisplayHal::new();
        let t = DisplayProfile::DEFAULT.timing();
        assert!(domain().init(&mut hal, t).is_ok());
        assert_eq!(
            hal.calls(),
            &[
                HalCall::Pll3Disable,
                HalCall::Pll3Configure(pll3_config(t, HseFrequency::Mhz32)),
                HalCall::Pll3Enable,
                HalCall::DsiClockSource(DsiClockSource::Pll3),
                HalCall::LtdcClockSource(LtdcClockSource::Pll3),
            ]
        );
        assert!(hal.pll3_on());
    }

    #[test]
    fn lock_timeout_leaves_pll_off() {
        let mut hal = MockDisplayHal::new();
        hal.fail_at(FailPoint::Pll3Lock);
        let result = domain().init(&mut hal, DisplayProfile::DEFAULT.timing());
        assert_eq!(result, Err(DisplayError::Timeout(WaitCondition::Pll3Locked)));
        assert!(!hal.pll3_on());
        assert_eq!(hal.count(|c| matches!(c, HalCall::DsiClockSource(_))), 0);
    }

    #[test]
    fn stuck_ready_flag_times_out_before_reconfiguring() {
        let mut hal = MockDisplayHal::new();
        hal.fail_at(FailPoint::Pll3Unlock);
        let result = domain().init(&mut hal, DisplayProfile::DEFAULT.timing());
        assert_eq!(result, Err(DisplayError::Timeout(WaitCondition::Pll3Unlocked)));
        assert_eq!(hal.count(|c| matches!(c, HalCall::Pll3Configure(_))), 0);
    }
}
