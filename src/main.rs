//! # Spacemouse Core
//!
//! Host-side driver for an eight-sensor Hall-effect spacemouse.
//!
//! Reads sensor samples, resolves them into translation and rotation
//! velocities and streams paced HID reports to a serial HID bridge.
//!
//! Send `SIGUSR1` to re-zero the knob while running.

use std::env;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use spacemouse_core::config::{Config, KeyConfig};
use spacemouse_core::hid::ReportScheduler;
use spacemouse_core::motion::calibration::RangeStep;
use spacemouse_core::pipeline::{CalibrationKind, CycleOutput, Mode, Pipeline};
use spacemouse_core::sensor::source::{IdleSource, ReplaySource};
use spacemouse_core::sensor::SensorSource;
use spacemouse_core::serial::{candidate_paths, HidLink};
use spacemouse_core::telemetry::console::{
    format_axes, format_keys, format_velocity, DebugMode, DebugThrottle, FrequencyCounter,
};
use spacemouse_core::telemetry::logger::{CycleRecord, CycleRecorder};
use spacemouse_core::telemetry::DEBUG_TARGET;

/// Configuration file used when none is named on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Control cycle period in milliseconds
const CYCLE_PERIOD_MS: u64 = 1;

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 1000;

/// Interval between range discovery progress messages
const RANGE_PROGRESS_INTERVAL_MS: u32 = 1000;

/// Command line options.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config_path: Option<String>,
    range: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut parsed = Args::default();
    for arg in args {
        if arg == "--range" {
            parsed.range = true;
        } else {
            parsed.config_path = Some(arg);
        }
    }
    parsed
}

/// Loads the named config, falling back to built-in defaults only when the
/// default file is absent.
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_PATH)),
        None => {
            info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn open_source(config: &Config) -> Result<Box<dyn SensorSource>> {
    match &config.sensors.replay_file {
        Some(path) => Ok(Box::new(ReplaySource::open(path, config.sensors.adc_max)?)),
        None => {
            info!("No replay file configured, knob held at rest");
            Ok(Box::new(IdleSource::new(config.calibration.zero)))
        }
    }
}

/// Re-zeroing requests from outside the process (`SIGUSR1` on Unix).
struct ZeroTrigger {
    #[cfg(unix)]
    signal: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl ZeroTrigger {
    fn new() -> Self {
        use tokio::signal::unix::{signal, SignalKind};
        let signal = match signal(SignalKind::user_defined1()) {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!("Re-zeroing on SIGUSR1 unavailable: {}", e);
                None
            }
        };
        Self { signal }
    }

    /// Completes on the next request; never completes without a trigger.
    async fn requested(&mut self) {
        let received = match self.signal.as_mut() {
            Some(signal) => signal.recv().await,
            None => None,
        };
        if received.is_none() {
            self.signal = None;
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
impl ZeroTrigger {
    fn new() -> Self {
        Self {}
    }

    async fn requested(&mut self) {
        std::future::pending::<()>().await;
    }
}

/// Wrapping millisecond clock.
fn clock_ms(start: Instant) -> u32 {
    start.elapsed().as_millis() as u32
}

fn dump_stage(mode: DebugMode, output: &CycleOutput) {
    match mode {
        DebugMode::Raw => info!(target: DEBUG_TARGET, "{}", format_axes(&output.filtered)),
        DebugMode::Centered => info!(target: DEBUG_TARGET, "{}", format_axes(&output.centered)),
        DebugMode::Normalized => {
            info!(target: DEBUG_TARGET, "{}", format_axes(&output.normalized))
        }
        DebugMode::Velocity => {
            info!(target: DEBUG_TARGET, "{}", format_velocity(&output.velocity))
        }
        DebugMode::AxesAndVelocity => info!(
            target: DEBUG_TARGET,
            "{}  {}",
            format_axes(&output.centered),
            format_velocity(&output.velocity)
        ),
        DebugMode::Buttons => info!(target: DEBUG_TARGET, "{}", format_keys(&output.buttons)),
        DebugMode::Off | DebugMode::Frequency => {}
    }
}

/// Main entry point
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up non-blocking logging
///    - Load configuration and build the pipeline
///    - Seed the filters and run zeroing if configured
///    - Open the serial link to the HID bridge
///
/// 2. **Main Loop** (1 ms cycle)
///    - `Normal`: run a cycle and hand the result to the report scheduler
///    - `Calibrating`: run the calibration step instead, no reports
///    - Log LED output reports from the host
///    - Re-zero on `SIGUSR1`
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid, the replay file cannot
/// be loaded, or no serial device can be opened.
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Spacemouse Core v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = parse_args(env::args().skip(1));
    let config = load_config(args.config_path.as_deref())?;

    let mut pipeline = Pipeline::from_config(&config)?;
    let mut source = open_source(&config)?;
    let first = source.read();
    pipeline.seed(&first);

    if config.calibration.zero_on_startup {
        pipeline.run_zeroing(&config.calibration.zeroing(), source.as_mut());
    }
    if args.range {
        pipeline.start_range_discovery(config.calibration.range_discovery(config.sensors.adc_max));
    }

    let mut link = HidLink::open_with_paths(
        &candidate_paths(&config.serial.port),
        config.serial.baud_rate,
        Duration::from_millis(config.serial.timeout_ms),
    )?;
    info!("HID bridge opened at: {}", link.device_path());

    let button_map = config.keys.as_ref().map(KeyConfig::button_map);
    let mut scheduler = ReportScheduler::new(
        config.report.interval_ms,
        config.report.zero_frames,
        button_map.as_ref().map(|m| m.report_bytes()),
    );

    let mut recorder = if config.debug.record {
        Some(CycleRecorder::new(
            &config.debug.log_dir,
            config.debug.max_records_per_file,
            config.debug.max_files_to_keep,
        )?)
    } else {
        None
    };

    let mut throttle = DebugThrottle::new(config.debug.interval_ms);
    let mut range_progress = DebugThrottle::new(RANGE_PROGRESS_INTERVAL_MS);
    let mut frequency = FrequencyCounter::new();
    let mut zero_trigger = ZeroTrigger::new();
    let mut receiving = true;

    let mut cycle_interval = interval(Duration::from_millis(CYCLE_PERIOD_MS));
    cycle_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting control loop every {} ms", CYCLE_PERIOD_MS);
    info!("Press Ctrl+C to exit");

    let start = Instant::now();
    let mut last_log_count: u64 = 0;

    loop {
        tokio::select! {
            _ = cycle_interval.tick() => {
                let now = clock_ms(start);
                let raw = source.read();

                match pipeline.mode() {
                    Mode::Normal => {}
                    Mode::Calibrating(CalibrationKind::Zeroing) => {
                        pipeline.run_zeroing(&config.calibration.zeroing(), source.as_mut());
                        continue;
                    }
                    Mode::Calibrating(CalibrationKind::RangeDiscovery) => {
                        match pipeline.step_range(now, &raw) {
                            RangeStep::Pause(delay) => {
                                info!("Start moving the knob in {} ms", delay.as_millis());
                                sleep(delay).await;
                            }
                            RangeStep::Measuring { remaining_ms } => {
                                if range_progress.is_due(now) {
                                    info!("Range discovery: {} s left", remaining_ms / 1000);
                                }
                            }
                            RangeStep::Finished(_) | RangeStep::Done => {}
                        }
                        continue;
                    }
                }

                // Host sources carry no key levels
                let output = pipeline.cycle(now, &raw, &[]);
                let packed = button_map
                    .as_ref()
                    .map(|m| m.pack(&output.buttons))
                    .unwrap_or_default();

                if let Some(frame) = scheduler.poll(now, &output.velocity, &packed) {
                    if let Err(e) = link.send_report(&frame).await {
                        debug!("Failed to send report: {}", e);
                    }
                }

                if config.debug.mode == DebugMode::Frequency {
                    if let Some(hz) = frequency.tick(now) {
                        info!(target: DEBUG_TARGET, "Loop frequency: {} Hz", hz);
                    }
                } else if config.debug.mode != DebugMode::Off && throttle.is_due(now) {
                    dump_stage(config.debug.mode, &output);
                }

                if let Some(recorder) = recorder.as_mut() {
                    if let Err(e) = recorder.record(&CycleRecord::from_cycle(&output)) {
                        warn!("Failed to record cycle: {}", e);
                    }
                }

                let sent = link.frames_sent();
                if sent - last_log_count >= LOG_INTERVAL_FRAMES {
                    info!("Sent {} reports", sent);
                    last_log_count = sent;
                }
            }

            led = link.receive_led(), if receiving => match led {
                Ok(on) => info!("Host set LED {}", if on { "on" } else { "off" }),
                Err(e) => {
                    warn!("Stopped reading from HID bridge: {}", e);
                    receiving = false;
                }
            },

            _ = zero_trigger.requested() => {
                info!("Re-zeroing requested");
                pipeline.request_zeroing();
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total reports sent: {}", link.frames_sent());
                break;
            }
        }
    }

    if let Some(mut recorder) = recorder {
        recorder.flush()?;
    }

    Ok(())
}
