use crate::core::{ApuFamily, PerfMode, PowerSnapshot};
use crate::smu::{RyzenAdjSmu, SmuInterface};
use crate::util::error::PowerError;
use log::debug;

/// Controller for the APU's power and thermal limit state.
///
/// Owns the platform interface handle for its whole lifetime; the handle is
/// released when the controller drops. All reads and writes of chip power
/// limits go through here, from a single thread.
pub struct PowerState {
    smu: Box<dyn SmuInterface>,
    pub snapshot: PowerSnapshot,
}

impl PowerState {
    /// Acquire the platform interface and perform the priming read, so the
    /// snapshot is well-defined from the start.
    ///
    /// Fails when the interface cannot be acquired. There is no retry: the
    /// absence of the interface means the host is unsupported or the process
    /// lacks privilege, and the caller should abort startup.
    pub fn new() -> Result<Self, PowerError> {
        Self::with_interface(Box::new(RyzenAdjSmu::acquire()?))
    }

    /// Construct around an already-acquired interface. Lets tests substitute
    /// a double for the native library.
    pub fn with_interface(smu: Box<dyn SmuInterface>) -> Result<Self, PowerError> {
        let mut state = Self {
            smu,
            snapshot: PowerSnapshot::default(),
        };
        state.refresh()?;
        Ok(state)
    }

    /// Trigger one coherent re-read of the register table, then copy out
    /// every telemetry field in a single pass. Call once per tick before
    /// trusting any snapshot field.
    pub fn refresh(&mut self) -> Result<(), PowerError> {
        self.smu.refresh()?;

        let s = &mut self.snapshot;
        s.stapm_limit = self.smu.stapm_limit().map(watts);
        s.stapm_fast_limit = self.smu.fast_limit().map(watts);
        s.stapm_slow_limit = self.smu.slow_limit().map(watts);
        s.apu_slow_limit = self.smu.apu_slow_limit().map(watts);
        s.stapm_value = self.smu.stapm_value();
        s.stapm_fast_value = self.smu.fast_value();
        s.stapm_slow_value = self.smu.slow_value();
        s.apu_slow_value = self.smu.apu_slow_value();
        s.stapm_time = self.smu.stapm_time();
        s.stapm_slow_time = self.smu.slow_time();
        s.vrm_limit = self.smu.vrm_current();
        s.vrm_value = self.smu.vrm_current_value();
        s.vrm_soc_limit = self.smu.vrmsoc_current();
        s.vrm_soc_value = self.smu.vrmsoc_current_value();
        s.vrm_max_limit = self.smu.vrmmax_current();
        s.vrm_max_value = self.smu.vrmmax_current_value();
        s.vrm_soc_max_limit = self.smu.vrmsocmax_current();
        s.vrm_soc_max_value = self.smu.vrmsocmax_current_value();
        s.core_temp_limit = self.smu.tctl_temp();
        s.core_temp_value = self.smu.tctl_temp_value();
        s.apu_skin_temp_limit = self.smu.apu_skin_temp_limit();
        s.apu_skin_temp_value = self.smu.apu_skin_temp_value();
        s.dgpu_skin_temp_limit = self.smu.dgpu_skin_temp_limit();
        s.dgpu_skin_temp_value = self.smu.dgpu_skin_temp_value();
        s.cclk_setpoint = self.smu.cclk_setpoint();
        s.cclk_busy_value = self.smu.cclk_busy_value();
        Ok(())
    }

    /// Program a new TDP target across the four related sub-limits: the
    /// sustained, slow and APU-slow limits take `tdp`, the fast limit runs
    /// 2 W above it. Values reach the interface in milliwatts.
    ///
    /// Range clamping is the caller's responsibility; the next refresh
    /// observes the applied limits once the hardware has taken them.
    pub fn set_tdp(&mut self, tdp: u32) -> Result<(), PowerError> {
        let fast = tdp + 2;
        debug!("programming TDP {tdp} W (fast limit {fast} W)");
        self.smu.set_stapm_limit(tdp * 1000)?;
        self.smu.set_fast_limit(fast * 1000)?;
        self.smu.set_slow_limit(tdp * 1000)?;
        self.smu.set_apu_slow_limit(tdp * 1000)?;
        Ok(())
    }

    pub fn family(&self) -> ApuFamily {
        ApuFamily::from(self.smu.family_id())
    }

    /// Human-readable family name; unrecognized identifiers degrade to
    /// "Unknown" rather than failing.
    pub fn family_name(&self) -> &'static str {
        self.family().name()
    }

    /// Flip between maximum-performance and power-saving mode. A toggle,
    /// not an idempotent set: two consecutive calls restore the original
    /// mode. The flag only changes once the directive has been accepted.
    pub fn toggle_max_performance(&mut self) -> Result<PerfMode, PowerError> {
        let target = !self.snapshot.on_max_perf;
        if target {
            self.smu.set_max_performance()?;
        } else {
            self.smu.set_power_saving()?;
        }
        self.snapshot.on_max_perf = target;
        Ok(if target {
            PerfMode::MaxPerformance
        } else {
            PerfMode::PowerSaving
        })
    }
}

fn watts(value: f32) -> u32 {
    value.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct MockTable {
        stapm_mw: u32,
        fast_mw: u32,
        slow_mw: u32,
        apu_slow_mw: u32,
        refreshes: usize,
        directives: Vec<&'static str>,
        family: i32,
        fail_adjust: bool,
    }

    /// Interface double over a shared register table, so tests keep a view
    /// of the state after handing the interface to the controller.
    #[derive(Default, Clone)]
    struct MockSmu {
        table: Rc<RefCell<MockTable>>,
    }

    impl MockSmu {
        fn mw(&self, read: fn(&MockTable) -> u32) -> Option<f32> {
            Some(read(&self.table.borrow()) as f32 / 1000.0)
        }

        fn store(
            &mut self,
            call: &'static str,
            write: fn(&mut MockTable, u32),
            mw: u32,
        ) -> Result<(), PowerError> {
            let mut table = self.table.borrow_mut();
            if table.fail_adjust {
                return Err(PowerError::CallFailed { call, status: -3 });
            }
            write(&mut table, mw);
            Ok(())
        }
    }

    impl SmuInterface for MockSmu {
        fn refresh(&mut self) -> Result<(), PowerError> {
            self.table.borrow_mut().refreshes += 1;
            Ok(())
        }

        fn stapm_limit(&self) -> Option<f32> {
            self.mw(|t| t.stapm_mw)
        }
        fn fast_limit(&self) -> Option<f32> {
            self.mw(|t| t.fast_mw)
        }
        fn slow_limit(&self) -> Option<f32> {
            self.mw(|t| t.slow_mw)
        }
        fn apu_slow_limit(&self) -> Option<f32> {
            self.mw(|t| t.apu_slow_mw)
        }
        fn stapm_value(&self) -> Option<f32> {
            Some(7.5)
        }
        fn fast_value(&self) -> Option<f32> {
            Some(9.25)
        }
        fn slow_value(&self) -> Option<f32> {
            Some(8.0)
        }
        fn apu_slow_value(&self) -> Option<f32> {
            Some(7.75)
        }
        fn stapm_time(&self) -> Option<f32> {
            Some(500.0)
        }
        fn slow_time(&self) -> Option<f32> {
            Some(30.0)
        }
        fn vrm_current(&self) -> Option<f32> {
            Some(40.0)
        }
        fn vrm_current_value(&self) -> Option<f32> {
            Some(12.3)
        }
        fn vrmsoc_current(&self) -> Option<f32> {
            Some(10.0)
        }
        fn vrmsoc_current_value(&self) -> Option<f32> {
            Some(4.1)
        }
        fn vrmmax_current(&self) -> Option<f32> {
            Some(70.0)
        }
        fn vrmmax_current_value(&self) -> Option<f32> {
            Some(25.8)
        }
        fn vrmsocmax_current(&self) -> Option<f32> {
            Some(15.0)
        }
        fn vrmsocmax_current_value(&self) -> Option<f32> {
            Some(6.6)
        }
        fn tctl_temp(&self) -> Option<f32> {
            Some(95.0)
        }
        fn tctl_temp_value(&self) -> Option<f32> {
            Some(64.2)
        }
        fn apu_skin_temp_limit(&self) -> Option<f32> {
            Some(45.0)
        }
        fn apu_skin_temp_value(&self) -> Option<f32> {
            Some(38.9)
        }
        // No discrete GPU on the mock platform.
        fn dgpu_skin_temp_limit(&self) -> Option<f32> {
            None
        }
        fn dgpu_skin_temp_value(&self) -> Option<f32> {
            None
        }
        fn cclk_setpoint(&self) -> Option<f32> {
            Some(85.0)
        }
        fn cclk_busy_value(&self) -> Option<f32> {
            Some(42.0)
        }

        fn set_stapm_limit(&mut self, mw: u32) -> Result<(), PowerError> {
            self.store("set_stapm_limit", |t, v| t.stapm_mw = v, mw)
        }
        fn set_fast_limit(&mut self, mw: u32) -> Result<(), PowerError> {
            self.store("set_fast_limit", |t, v| t.fast_mw = v, mw)
        }
        fn set_slow_limit(&mut self, mw: u32) -> Result<(), PowerError> {
            self.store("set_slow_limit", |t, v| t.slow_mw = v, mw)
        }
        fn set_apu_slow_limit(&mut self, mw: u32) -> Result<(), PowerError> {
            self.store("set_apu_slow_limit", |t, v| t.apu_slow_mw = v, mw)
        }

        fn set_max_performance(&mut self) -> Result<(), PowerError> {
            self.table.borrow_mut().directives.push("max_performance");
            Ok(())
        }
        fn set_power_saving(&mut self) -> Result<(), PowerError> {
            self.table.borrow_mut().directives.push("power_saving");
            Ok(())
        }

        fn family_id(&self) -> i32 {
            self.table.borrow().family
        }
    }

    fn controller() -> (PowerState, MockSmu) {
        let mock = MockSmu::default();
        let state = PowerState::with_interface(Box::new(mock.clone())).unwrap();
        (state, mock)
    }

    #[test]
    fn construction_performs_the_priming_read() {
        let (state, mock) = controller();
        assert_eq!(mock.table.borrow().refreshes, 1);
        // All-zero table reads as zero-watt limits, not as absent ones.
        assert_eq!(state.snapshot.stapm_limit, Some(0));
        assert_eq!(state.snapshot.stapm_value, Some(7.5));
    }

    #[test]
    fn set_tdp_programs_all_four_limits_in_milliwatts() {
        let (mut state, mock) = controller();
        state.set_tdp(15).unwrap();

        {
            let table = mock.table.borrow();
            assert_eq!(table.stapm_mw, 15_000);
            assert_eq!(table.fast_mw, 17_000);
            assert_eq!(table.slow_mw, 15_000);
            assert_eq!(table.apu_slow_mw, 15_000);
        }

        state.refresh().unwrap();
        assert_eq!(state.snapshot.stapm_limit, Some(15));
        assert_eq!(state.snapshot.stapm_fast_limit, Some(17));
        assert_eq!(state.snapshot.stapm_slow_limit, Some(15));
        assert_eq!(state.snapshot.apu_slow_limit, Some(15));
    }

    #[test]
    fn toggle_max_performance_is_an_involution() {
        let (mut state, mock) = controller();
        assert!(!state.snapshot.on_max_perf);

        assert_eq!(
            state.toggle_max_performance().unwrap(),
            PerfMode::MaxPerformance
        );
        assert!(state.snapshot.on_max_perf);

        assert_eq!(
            state.toggle_max_performance().unwrap(),
            PerfMode::PowerSaving
        );
        assert!(!state.snapshot.on_max_perf);

        assert_eq!(
            mock.table.borrow().directives,
            vec!["max_performance", "power_saving"]
        );
    }

    #[test]
    fn failed_limit_write_surfaces_instead_of_passing_silently() {
        let (mut state, mock) = controller();
        mock.table.borrow_mut().fail_adjust = true;

        let err = state.set_tdp(15).unwrap_err();
        assert!(matches!(
            err,
            PowerError::CallFailed {
                call: "set_stapm_limit",
                status: -3
            }
        ));
        // Nothing was applied before the failure.
        assert_eq!(mock.table.borrow().stapm_mw, 0);
    }

    #[test]
    fn unavailable_metrics_stay_none_after_refresh() {
        let (mut state, _mock) = controller();
        state.refresh().unwrap();
        assert_eq!(state.snapshot.dgpu_skin_temp_limit, None);
        assert_eq!(state.snapshot.dgpu_skin_temp_value, None);
        assert_eq!(state.snapshot.core_temp_value, Some(64.2));
    }

    #[test]
    fn family_resolves_through_the_lookup_table() {
        let mock = MockSmu::default();
        mock.table.borrow_mut().family = 3;
        let state = PowerState::with_interface(Box::new(mock.clone())).unwrap();
        assert_eq!(state.family_name(), "Cezanne");

        mock.table.borrow_mut().family = 8;
        assert_eq!(state.family_name(), "Unknown");
    }
}
