use crate::util::error::ControlError;
use crate::util::sysfs;
use log::{debug, warn};
use std::path::{Path, PathBuf};

pub type Result<T, E = ControlError> = std::result::Result<T, E>;

/// Enumeration cap, bounding worst-case discovery cost.
pub const MAX_CPUS: u32 = 128;

const CPU_ROOT: &str = "/sys/devices/system/cpu";

#[derive(Debug, Clone)]
pub struct CpuCore {
    pub id: u32,
    pub path: PathBuf,
    pub online: bool,
}

/// Enumerated CPU cores plus the cpufreq policy state read from CPU 0.
///
/// Populated by an explicit [`discover`](Self::discover) call; the setters
/// mutate the live kernel policy but never write back into these cached
/// fields, so callers re-discover to observe confirmed state. Empty policy
/// fields mean the corresponding attribute does not exist on this system.
#[derive(Debug)]
pub struct CpuTopology {
    root: PathBuf,
    pub cores: Vec<CpuCore>,
    pub scaling_governor: String,
    pub scaling_available_governors: Vec<String>,
    pub epp: String,
    pub epp_available_options: Vec<String>,
}

impl CpuTopology {
    pub fn new() -> Self {
        Self::with_root(CPU_ROOT)
    }

    /// Anchor the device tree at an alternate root. Tests point this at a
    /// simulated tree.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cores: Vec::new(),
            scaling_governor: String::new(),
            scaling_available_governors: Vec::new(),
            epp: String::new(),
            epp_available_options: Vec::new(),
        }
    }

    /// Enumerate cores and read the cpufreq policy state from CPU 0.
    ///
    /// CPU 0 is always recorded as present and online. Enumeration walks
    /// indices 1 upward and stops at the first index whose device directory
    /// or `online` attribute is missing, capped at [`MAX_CPUS`]. Missing
    /// policy attributes are skipped silently; I/O failures on files that do
    /// exist surface as errors.
    pub fn discover(&mut self) -> Result<()> {
        self.cores.clear();
        self.cores.push(CpuCore {
            id: 0,
            path: self.root.join("cpu0"),
            online: true,
        });

        for id in 1..MAX_CPUS {
            let path = self.root.join(format!("cpu{id}"));
            let online_attr = path.join("online");
            if !path.is_dir() || !online_attr.is_file() {
                break;
            }
            let raw = sysfs::read_sysfs_value(&online_attr)?;
            let online = raw.parse::<i32>().map_err(|_| {
                ControlError::ParseError(format!(
                    "Could not parse '{}' from {:?}",
                    raw,
                    online_attr.display()
                ))
            })? == 1;
            self.cores.push(CpuCore { id, path, online });
        }
        debug!(
            "enumerated {} cores ({} online)",
            self.cores.len(),
            self.cores.iter().filter(|c| c.online).count()
        );

        self.scaling_governor = String::new();
        self.scaling_available_governors = Vec::new();
        self.epp = String::new();
        self.epp_available_options = Vec::new();

        let cpufreq = self.root.join("cpu0").join("cpufreq");
        if !cpufreq.is_dir() {
            // No frequency scaling driver bound to CPU 0; leave every
            // policy field empty.
            return Ok(());
        }

        if let Some(governor) = sysfs::read_first_line(cpufreq.join("scaling_governor"))? {
            self.scaling_governor = governor;
        }
        if let Some(governors) = sysfs::read_token_list(cpufreq.join("scaling_available_governors"))?
        {
            self.scaling_available_governors = governors;
        }
        if let Some(epp) = sysfs::read_first_line(cpufreq.join("energy_performance_preference"))? {
            self.epp = epp;
        }
        if let Some(options) =
            sysfs::read_token_list(cpufreq.join("energy_performance_available_preferences"))?
        {
            self.epp_available_options = options;
        }

        Ok(())
    }

    /// Write `option` to the `scaling_governor` attribute of every online
    /// core.
    pub fn set_scaling_governor(&self, option: &str) -> Result<()> {
        self.broadcast("scaling_governor", option)
    }

    /// Write `option` to the `energy_performance_preference` attribute of
    /// every online core.
    pub fn set_epp(&self, option: &str) -> Result<()> {
        self.broadcast("energy_performance_preference", option)
    }

    // Each core is written independently with no rollback: a failure on one
    // core does not stop the sweep, and the first failure is reported once
    // every core has been attempted.
    fn broadcast(&self, attribute: &str, value: &str) -> Result<()> {
        let mut first_error = None;
        for core in self.cores.iter().filter(|c| c.online) {
            let path = core.path.join("cpufreq").join(attribute);
            if let Err(e) = sysfs::write_sysfs_value(&path, value) {
                warn!("failed to write {attribute} for cpu{}: {e}", core.id);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for CpuTopology {
    fn default() -> Self {
        Self::new()
    }
}
