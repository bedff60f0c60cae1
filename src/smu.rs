use crate::util::error::PowerError;
use libloading::Library;
use log::debug;
use std::os::raw::{c_int, c_void};

/// Opaque access handle vended by the native library.
type RyzenAccess = *mut c_void;

type GetFn = unsafe extern "C" fn(RyzenAccess) -> f32;
type SetFn = unsafe extern "C" fn(RyzenAccess, u32) -> c_int;
type CallFn = unsafe extern "C" fn(RyzenAccess) -> c_int;

/// Sonames tried when acquiring the platform power-management library.
const LIBRARY_NAMES: &[&str] = &["libryzenadj.so", "libryzenadj.so.0"];

/// The platform power-management interface.
///
/// One coherent register-table refresh, per-field telemetry getters, setters
/// for the four TDP sub-limits (in milliwatts), the raw family identifier,
/// and the two performance-mode directives. Getters return `None` when the
/// firmware table carries no sample for the metric, so "unavailable" never
/// masquerades as zero.
pub trait SmuInterface {
    fn refresh(&mut self) -> Result<(), PowerError>;

    fn stapm_limit(&self) -> Option<f32>;
    fn fast_limit(&self) -> Option<f32>;
    fn slow_limit(&self) -> Option<f32>;
    fn apu_slow_limit(&self) -> Option<f32>;
    fn stapm_value(&self) -> Option<f32>;
    fn fast_value(&self) -> Option<f32>;
    fn slow_value(&self) -> Option<f32>;
    fn apu_slow_value(&self) -> Option<f32>;
    fn stapm_time(&self) -> Option<f32>;
    fn slow_time(&self) -> Option<f32>;
    fn vrm_current(&self) -> Option<f32>;
    fn vrm_current_value(&self) -> Option<f32>;
    fn vrmsoc_current(&self) -> Option<f32>;
    fn vrmsoc_current_value(&self) -> Option<f32>;
    fn vrmmax_current(&self) -> Option<f32>;
    fn vrmmax_current_value(&self) -> Option<f32>;
    fn vrmsocmax_current(&self) -> Option<f32>;
    fn vrmsocmax_current_value(&self) -> Option<f32>;
    fn tctl_temp(&self) -> Option<f32>;
    fn tctl_temp_value(&self) -> Option<f32>;
    fn apu_skin_temp_limit(&self) -> Option<f32>;
    fn apu_skin_temp_value(&self) -> Option<f32>;
    fn dgpu_skin_temp_limit(&self) -> Option<f32>;
    fn dgpu_skin_temp_value(&self) -> Option<f32>;
    fn cclk_setpoint(&self) -> Option<f32>;
    fn cclk_busy_value(&self) -> Option<f32>;

    fn set_stapm_limit(&mut self, mw: u32) -> Result<(), PowerError>;
    fn set_fast_limit(&mut self, mw: u32) -> Result<(), PowerError>;
    fn set_slow_limit(&mut self, mw: u32) -> Result<(), PowerError>;
    fn set_apu_slow_limit(&mut self, mw: u32) -> Result<(), PowerError>;

    fn set_max_performance(&mut self) -> Result<(), PowerError>;
    fn set_power_saving(&mut self) -> Result<(), PowerError>;

    fn family_id(&self) -> i32;
}

// Field names double as the exported symbol names, so the table below is the
// complete list of native entry points this crate touches.
macro_rules! library_symbols {
    ($( $name:ident: $ty:ty, )+) => {
        struct LibSymbols {
            $( $name: $ty, )+
        }

        impl LibSymbols {
            fn load(lib: &Library) -> Result<Self, libloading::Error> {
                Ok(Self {
                    $( $name: unsafe {
                        *lib.get::<$ty>(concat!(stringify!($name), "\0").as_bytes())?
                    }, )+
                })
            }
        }
    };
}

library_symbols! {
    init_ryzenadj: unsafe extern "C" fn() -> RyzenAccess,
    cleanup_ryzenadj: unsafe extern "C" fn(RyzenAccess),
    init_table: CallFn,
    refresh_table: CallFn,
    get_cpu_family: unsafe extern "C" fn(RyzenAccess) -> c_int,
    set_stapm_limit: SetFn,
    set_fast_limit: SetFn,
    set_slow_limit: SetFn,
    set_apu_slow_limit: SetFn,
    set_max_performance: CallFn,
    set_power_saving: CallFn,
    get_stapm_limit: GetFn,
    get_fast_limit: GetFn,
    get_slow_limit: GetFn,
    get_apu_slow_limit: GetFn,
    get_stapm_value: GetFn,
    get_fast_value: GetFn,
    get_slow_value: GetFn,
    get_apu_slow_value: GetFn,
    get_stapm_time: GetFn,
    get_slow_time: GetFn,
    get_vrm_current: GetFn,
    get_vrm_current_value: GetFn,
    get_vrmsoc_current: GetFn,
    get_vrmsoc_current_value: GetFn,
    get_vrmmax_current: GetFn,
    get_vrmmax_current_value: GetFn,
    get_vrmsocmax_current: GetFn,
    get_vrmsocmax_current_value: GetFn,
    get_tctl_temp: GetFn,
    get_tctl_temp_value: GetFn,
    get_apu_skin_temp_limit: GetFn,
    get_apu_skin_temp_value: GetFn,
    get_dgpu_skin_temp_limit: GetFn,
    get_dgpu_skin_temp_value: GetFn,
    get_cclk_setpoint: GetFn,
    get_cclk_busy_value: GetFn,
}

/// Production interface backed by the dynamically loaded `libryzenadj`.
///
/// The access handle is exclusively owned: the struct is `!Send`/`!Sync`
/// through the raw pointer, there is no way to clone it, and the native
/// cleanup runs exactly once when the value drops.
pub struct RyzenAdjSmu {
    symbols: LibSymbols,
    access: RyzenAccess,
    // Keeps the symbol addresses valid; must outlive every call above.
    _lib: Library,
}

impl RyzenAdjSmu {
    /// Load the native library and acquire the SMU access handle.
    ///
    /// Failure means the host is unsupported or the process lacks the
    /// privilege to map the SMU; callers are expected to abort startup
    /// rather than retry.
    pub fn acquire() -> Result<Self, PowerError> {
        let lib = Self::open_library()?;
        let symbols = LibSymbols::load(&lib)?;

        let access = unsafe { (symbols.init_ryzenadj)() };
        if access.is_null() {
            return Err(PowerError::InterfaceUnavailable(
                "init_ryzenadj returned no handle (unsupported APU or insufficient privilege)"
                    .to_string(),
            ));
        }

        let status = unsafe { (symbols.init_table)(access) };
        if status != 0 {
            unsafe { (symbols.cleanup_ryzenadj)(access) };
            return Err(PowerError::CallFailed {
                call: "init_table",
                status,
            });
        }

        debug!("acquired SMU access handle");
        Ok(Self {
            symbols,
            access,
            _lib: lib,
        })
    }

    fn open_library() -> Result<Library, PowerError> {
        let mut result = Err(PowerError::InterfaceUnavailable(format!(
            "no candidate library name out of {LIBRARY_NAMES:?} could be loaded"
        )));
        for name in LIBRARY_NAMES {
            match unsafe { Library::new(name) } {
                Ok(lib) => return Ok(lib),
                Err(e) => result = Err(PowerError::Library(e)),
            }
        }
        result
    }

    fn sample(&self, getter: GetFn) -> Option<f32> {
        // The native getters report NaN when the firmware table has no
        // sample for a metric.
        let value = unsafe { getter(self.access) };
        value.is_finite().then_some(value)
    }

    fn call(&self, name: &'static str, f: CallFn) -> Result<(), PowerError> {
        let status = unsafe { f(self.access) };
        if status == 0 {
            Ok(())
        } else {
            Err(PowerError::CallFailed { call: name, status })
        }
    }

    fn adjust(&self, name: &'static str, f: SetFn, mw: u32) -> Result<(), PowerError> {
        let status = unsafe { f(self.access, mw) };
        if status == 0 {
            Ok(())
        } else {
            Err(PowerError::CallFailed { call: name, status })
        }
    }
}

impl SmuInterface for RyzenAdjSmu {
    fn refresh(&mut self) -> Result<(), PowerError> {
        self.call("refresh_table", self.symbols.refresh_table)
    }

    fn stapm_limit(&self) -> Option<f32> {
        self.sample(self.symbols.get_stapm_limit)
    }
    fn fast_limit(&self) -> Option<f32> {
        self.sample(self.symbols.get_fast_limit)
    }
    fn slow_limit(&self) -> Option<f32> {
        self.sample(self.symbols.get_slow_limit)
    }
    fn apu_slow_limit(&self) -> Option<f32> {
        self.sample(self.symbols.get_apu_slow_limit)
    }
    fn stapm_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_stapm_value)
    }
    fn fast_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_fast_value)
    }
    fn slow_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_slow_value)
    }
    fn apu_slow_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_apu_slow_value)
    }
    fn stapm_time(&self) -> Option<f32> {
        self.sample(self.symbols.get_stapm_time)
    }
    fn slow_time(&self) -> Option<f32> {
        self.sample(self.symbols.get_slow_time)
    }
    fn vrm_current(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrm_current)
    }
    fn vrm_current_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrm_current_value)
    }
    fn vrmsoc_current(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrmsoc_current)
    }
    fn vrmsoc_current_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrmsoc_current_value)
    }
    fn vrmmax_current(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrmmax_current)
    }
    fn vrmmax_current_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrmmax_current_value)
    }
    fn vrmsocmax_current(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrmsocmax_current)
    }
    fn vrmsocmax_current_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_vrmsocmax_current_value)
    }
    fn tctl_temp(&self) -> Option<f32> {
        self.sample(self.symbols.get_tctl_temp)
    }
    fn tctl_temp_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_tctl_temp_value)
    }
    fn apu_skin_temp_limit(&self) -> Option<f32> {
        self.sample(self.symbols.get_apu_skin_temp_limit)
    }
    fn apu_skin_temp_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_apu_skin_temp_value)
    }
    fn dgpu_skin_temp_limit(&self) -> Option<f32> {
        self.sample(self.symbols.get_dgpu_skin_temp_limit)
    }
    fn dgpu_skin_temp_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_dgpu_skin_temp_value)
    }
    fn cclk_setpoint(&self) -> Option<f32> {
        self.sample(self.symbols.get_cclk_setpoint)
    }
    fn cclk_busy_value(&self) -> Option<f32> {
        self.sample(self.symbols.get_cclk_busy_value)
    }

    fn set_stapm_limit(&mut self, mw: u32) -> Result<(), PowerError> {
        self.adjust("set_stapm_limit", self.symbols.set_stapm_limit, mw)
    }
    fn set_fast_limit(&mut self, mw: u32) -> Result<(), PowerError> {
        self.adjust("set_fast_limit", self.symbols.set_fast_limit, mw)
    }
    fn set_slow_limit(&mut self, mw: u32) -> Result<(), PowerError> {
        self.adjust("set_slow_limit", self.symbols.set_slow_limit, mw)
    }
    fn set_apu_slow_limit(&mut self, mw: u32) -> Result<(), PowerError> {
        self.adjust("set_apu_slow_limit", self.symbols.set_apu_slow_limit, mw)
    }

    fn set_max_performance(&mut self) -> Result<(), PowerError> {
        self.call("set_max_performance", self.symbols.set_max_performance)
    }
    fn set_power_saving(&mut self) -> Result<(), PowerError> {
        self.call("set_power_saving", self.symbols.set_power_saving)
    }

    fn family_id(&self) -> i32 {
        unsafe { (self.symbols.get_cpu_family)(self.access) }
    }
}

impl Drop for RyzenAdjSmu {
    fn drop(&mut self) {
        unsafe { (self.symbols.cleanup_ryzenadj)(self.access) };
        debug!("released SMU access handle");
    }
}
