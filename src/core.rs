use std::fmt;

/// Telemetry and limit state mirrored out of the SMU register table.
///
/// Every field is `None` until the owning controller has completed at least
/// one refresh, and stays `None` for any metric the firmware table does not
/// provide on the running family. Limits are whole watts as reported by the
/// hardware; live values and time constants keep the native float precision.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PowerSnapshot {
    pub stapm_limit: Option<u32>,
    pub stapm_fast_limit: Option<u32>,
    pub stapm_slow_limit: Option<u32>,
    pub apu_slow_limit: Option<u32>,
    pub stapm_value: Option<f32>,
    pub stapm_fast_value: Option<f32>,
    pub stapm_slow_value: Option<f32>,
    pub apu_slow_value: Option<f32>,
    pub stapm_time: Option<f32>,
    pub stapm_slow_time: Option<f32>,
    pub vrm_limit: Option<f32>,
    pub vrm_value: Option<f32>,
    pub vrm_soc_limit: Option<f32>,
    pub vrm_soc_value: Option<f32>,
    pub vrm_max_limit: Option<f32>,
    pub vrm_max_value: Option<f32>,
    pub vrm_soc_max_limit: Option<f32>,
    pub vrm_soc_max_value: Option<f32>,
    pub core_temp_limit: Option<f32>,
    pub core_temp_value: Option<f32>,
    pub apu_skin_temp_limit: Option<f32>,
    pub apu_skin_temp_value: Option<f32>,
    pub dgpu_skin_temp_limit: Option<f32>,
    pub dgpu_skin_temp_value: Option<f32>,
    pub cclk_setpoint: Option<f32>,
    pub cclk_busy_value: Option<f32>,

    /// Whether the last issued mode directive was maximum performance.
    pub on_max_perf: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfMode {
    MaxPerformance,
    PowerSaving,
}

impl fmt::Display for PerfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPerformance => f.write_str("maximum performance"),
            Self::PowerSaving => f.write_str("power saving"),
        }
    }
}

/// APU silicon family, resolved from the raw identifier the interface
/// reports. `Unknown` is the designated fallback for every identifier
/// without a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApuFamily {
    Raven,
    Picasso,
    Renoir,
    Cezanne,
    Dali,
    Lucienne,
    Vangogh,
    Rembrandt,
    Phoenix,
    HawkPoint,
    StrixPoint,
    Unknown,
}

impl ApuFamily {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Raven => "Raven",
            Self::Picasso => "Picasso",
            Self::Renoir => "Renoir",
            Self::Cezanne => "Cezanne",
            Self::Dali => "Dali",
            Self::Lucienne => "Lucienne",
            Self::Vangogh => "Vangogh",
            Self::Rembrandt => "Rembrandt",
            Self::Phoenix => "Phoenix Point",
            Self::HawkPoint => "Hawk Point",
            Self::StrixPoint => "Strix Point",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<i32> for ApuFamily {
    // Raw ids follow the native library's family enumeration. Id 8
    // (Mendocino) has no display name and resolves to Unknown.
    fn from(id: i32) -> Self {
        match id {
            0 => Self::Raven,
            1 => Self::Picasso,
            2 => Self::Renoir,
            3 => Self::Cezanne,
            4 => Self::Dali,
            5 => Self::Lucienne,
            6 => Self::Vangogh,
            7 => Self::Rembrandt,
            9 => Self::Phoenix,
            10 => Self::HawkPoint,
            11 => Self::StrixPoint,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ApuFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
