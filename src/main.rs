mod config;
mod core;
mod cpu;
mod power;
mod smu;
mod util;
mod watch;

use crate::config::AppConfig;
use crate::cpu::CpuTopology;
use crate::power::PowerState;
use crate::util::error::{AppError, ControlError, PowerError};
use clap::Parser;
use log::warn;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Display APU power state and CPU scaling policy
    Info,
    /// Poll telemetry continuously until interrupted
    Watch {
        #[clap(long)]
        verbose: bool,
    },
    /// Program a new TDP target in watts (clamped to the configured bounds)
    SetTdp { watts: u32 },
    /// Set the cpufreq scaling governor on every online CPU
    SetGovernor { governor: String },
    /// Set the Energy Performance Preference on every online CPU
    SetEpp { epp: String },
    /// Switch between maximum-performance and power-saving mode
    ToggleMaxPerf,
}

fn main() {
    // The env filter stays wide open; the effective level is driven through
    // log::set_max_level so watch mode can raise it at runtime.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();
    log::set_max_level(log::LevelFilter::Info);

    let cli = Cli::parse();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!("error loading configuration: {e}; using default values");
            AppConfig::default()
        }
    };

    let command_result = match cli.command {
        Some(Commands::Info) => run_info(),
        Some(Commands::Watch { verbose }) => watch::run_watch(config, verbose),
        Some(Commands::SetTdp { watts }) => run_set_tdp(&config, watts),
        Some(Commands::SetGovernor { governor }) => run_set_governor(&governor),
        Some(Commands::SetEpp { epp }) => run_set_epp(&epp),
        Some(Commands::ToggleMaxPerf) => run_toggle_max_perf(),
        None => {
            println!("apuctl: AMD APU power state control. Use --help for commands.");
            Ok(())
        }
    };

    if let Err(e) = command_result {
        eprintln!("Error: {e}");
        match &e {
            AppError::Control(ControlError::PermissionDenied(_)) => {
                eprintln!(
                    "Hint: this operation may require administrator privileges (e.g. run with sudo)."
                );
            }
            AppError::Power(PowerError::Library(_) | PowerError::InterfaceUnavailable(_)) => {
                eprintln!("Hint: SMU access requires a supported AMD APU and root privileges.");
            }
            _ => {}
        }
        std::process::exit(1);
    }
}

fn run_info() -> Result<(), AppError> {
    let mut power = PowerState::new()?;
    power.refresh()?;
    let s = &power.snapshot;

    println!("--- APU Power State ---");
    println!("CPU Family: {}", power.family_name());
    println!(
        "Mode: {}",
        if s.on_max_perf {
            "maximum performance"
        } else {
            "power saving"
        }
    );
    println!("STAPM limit:        {:>8} W    value: {:>8} W", opt(s.stapm_limit), optf(s.stapm_value));
    println!("PPT fast limit:     {:>8} W    value: {:>8} W", opt(s.stapm_fast_limit), optf(s.stapm_fast_value));
    println!("PPT slow limit:     {:>8} W    value: {:>8} W", opt(s.stapm_slow_limit), optf(s.stapm_slow_value));
    println!("PPT APU limit:      {:>8} W    value: {:>8} W", opt(s.apu_slow_limit), optf(s.apu_slow_value));
    println!("STAPM time const:   {:>8} s    slow: {:>9} s", optf(s.stapm_time), optf(s.stapm_slow_time));
    println!("TDC VDD limit:      {:>8} A    value: {:>8} A", optf(s.vrm_limit), optf(s.vrm_value));
    println!("TDC SoC limit:      {:>8} A    value: {:>8} A", optf(s.vrm_soc_limit), optf(s.vrm_soc_value));
    println!("EDC VDD limit:      {:>8} A    value: {:>8} A", optf(s.vrm_max_limit), optf(s.vrm_max_value));
    println!("EDC SoC limit:      {:>8} A    value: {:>8} A", optf(s.vrm_soc_max_limit), optf(s.vrm_soc_max_value));
    println!("Tctl limit:         {:>8} C    value: {:>8} C", optf(s.core_temp_limit), optf(s.core_temp_value));
    println!("APU skin limit:     {:>8} C    value: {:>8} C", optf(s.apu_skin_temp_limit), optf(s.apu_skin_temp_value));
    println!("dGPU skin limit:    {:>8} C    value: {:>8} C", optf(s.dgpu_skin_temp_limit), optf(s.dgpu_skin_temp_value));
    println!("CCLK boost setpt:   {:>8}      busy: {:>9}", optf(s.cclk_setpoint), optf(s.cclk_busy_value));

    let mut topology = CpuTopology::new();
    topology.discover()?;
    let online = topology.cores.iter().filter(|c| c.online).count();

    println!("\n--- CPU Scaling Policy ---");
    println!(
        "Logical CPUs: {} enumerated, {} online ({} reported by the OS)",
        topology.cores.len(),
        online,
        num_cpus::get()
    );
    println!("Scaling governor: {}", non_empty(&topology.scaling_governor));
    println!(
        "Available governors: {}",
        join_list(&topology.scaling_available_governors)
    );
    println!("EPP: {}", non_empty(&topology.epp));
    println!(
        "Available EPP preferences: {}",
        join_list(&topology.epp_available_options)
    );

    Ok(())
}

fn run_set_tdp(config: &AppConfig, watts: u32) -> Result<(), AppError> {
    let target = config.tdp.clamp(watts);
    if target != watts {
        warn!(
            "requested {watts} W is outside the configured {}-{} W bounds, clamping to {target} W",
            config.tdp.min_watts, config.tdp.max_watts
        );
    }

    let mut power = PowerState::new()?;
    power.set_tdp(target)?;
    println!("TDP target set to {target} W (fast limit {} W)", target + 2);
    Ok(())
}

fn run_set_governor(governor: &str) -> Result<(), AppError> {
    let mut topology = CpuTopology::new();
    topology.discover()?;
    validate_option("governor", governor, &topology.scaling_available_governors)?;
    topology.set_scaling_governor(governor)?;
    println!("Scaling governor set to '{governor}' on all online CPUs");
    Ok(())
}

fn run_set_epp(epp: &str) -> Result<(), AppError> {
    let mut topology = CpuTopology::new();
    topology.discover()?;
    validate_option("EPP value", epp, &topology.epp_available_options)?;
    topology.set_epp(epp)?;
    println!("Energy Performance Preference set to '{epp}' on all online CPUs");
    Ok(())
}

fn run_toggle_max_perf() -> Result<(), AppError> {
    let mut power = PowerState::new()?;
    let mode = power.toggle_max_performance()?;
    println!("Switched to {mode} mode");
    Ok(())
}

// An empty available list is a capability gap, not grounds to reject the
// request; the kernel remains the final arbiter.
fn validate_option(what: &str, value: &str, available: &[String]) -> Result<(), ControlError> {
    if !available.is_empty() && !available.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        return Err(ControlError::InvalidValueError(format!(
            "{what} '{value}' is not available on this system. Valid options: {}",
            available.join(", ")
        )));
    }
    Ok(())
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn optf(value: Option<f32>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn non_empty(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

fn join_list(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".to_string()
    } else {
        items.join(", ")
    }
}
