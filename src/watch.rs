use crate::config::{AppConfig, ConfigWatcher, existing_config_path};
use crate::core::PowerSnapshot;
use crate::power::PowerState;
use crate::util::error::AppError;
use log::{LevelFilter, debug, error, info, warn};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Poll telemetry until interrupted: one coherent refresh per tick, then
/// display, exactly the cadence a frontend frame loop would use.
pub fn run_watch(mut config: AppConfig, verbose: bool) -> Result<(), AppError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        config.watch.log_level.to_filter()
    };
    log::set_max_level(level);

    // Fail fast before installing any handlers; an unsupported host has
    // nothing to watch.
    let mut power = PowerState::new()?;
    info!(
        "watching {} APU (poll interval {}s)",
        power.family_name(),
        config.watch.poll_interval_sec
    );

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        info!("received shutdown signal, exiting...");
        flag.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let mut config_watcher = match existing_config_path() {
        Some(path) => match ConfigWatcher::watch(&path) {
            Ok(watcher) => {
                info!("watching config file: {}", path.display());
                Some(watcher)
            }
            Err(e) => {
                warn!("failed to initialize config file watcher: {e}");
                None
            }
        },
        None => {
            debug!("no config file found to watch for changes");
            None
        }
    };

    while running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        if let Some(watcher) = &mut config_watcher {
            match watcher.poll() {
                Some(Ok(new_config)) => {
                    info!("config file changed, updating configuration");
                    config = new_config;
                }
                Some(Err(e)) => error!("error loading new configuration: {e}"),
                None => {}
            }
        }

        match power.refresh() {
            Ok(()) => {
                log_snapshot(&power.snapshot);
                if let Some(stats_path) = &config.watch.stats_file_path {
                    if let Err(e) =
                        write_stats_file(Path::new(stats_path), power.family_name(), &power.snapshot)
                    {
                        error!("failed to write stats file: {e}");
                    }
                }
            }
            // Keep polling: a transient SMU hiccup should not end the
            // session, and the snapshot keeps its last coherent state.
            Err(e) => warn!("telemetry refresh failed: {e}"),
        }

        let interval = Duration::from_secs(config.watch.poll_interval_sec.max(1));
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    info!("watch stopped");
    Ok(())
}

fn log_snapshot(s: &PowerSnapshot) {
    info!(
        "stapm {} / {} W | fast {} / {} W | slow {} / {} W | apu {} / {} W | tctl {} C",
        fmt_value(s.stapm_value),
        fmt_limit(s.stapm_limit),
        fmt_value(s.stapm_fast_value),
        fmt_limit(s.stapm_fast_limit),
        fmt_value(s.stapm_slow_value),
        fmt_limit(s.stapm_slow_limit),
        fmt_value(s.apu_slow_value),
        fmt_limit(s.apu_slow_limit),
        fmt_value(s.core_temp_value),
    );
}

fn fmt_limit(value: Option<u32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn fmt_value(value: Option<f32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

/// Write the latest snapshot as key=value lines for external consumers.
fn write_stats_file(path: &Path, family: &str, s: &PowerSnapshot) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "timestamp={}", chrono::Local::now().to_rfc3339())?;
    writeln!(file, "family={family}")?;
    writeln!(file, "max_perf={}", s.on_max_perf)?;

    if let Some(w) = s.stapm_limit {
        writeln!(file, "stapm_limit_w={w}")?;
    }
    if let Some(v) = s.stapm_value {
        writeln!(file, "stapm_value_w={v:.2}")?;
    }
    if let Some(w) = s.stapm_fast_limit {
        writeln!(file, "fast_limit_w={w}")?;
    }
    if let Some(v) = s.stapm_fast_value {
        writeln!(file, "fast_value_w={v:.2}")?;
    }
    if let Some(w) = s.stapm_slow_limit {
        writeln!(file, "slow_limit_w={w}")?;
    }
    if let Some(v) = s.stapm_slow_value {
        writeln!(file, "slow_value_w={v:.2}")?;
    }
    if let Some(t) = s.core_temp_value {
        writeln!(file, "tctl_temp_c={t:.1}")?;
    }

    Ok(())
}
