//! `bh1730-script`: run Rhai scripts against a BH1730 sensor.
//!
//! ```bash
//! bh1730-script run scripts/read_lux.rhai --addr 0x29
//! bh1730-script read --count 5 --interval-ms 500 --json
//! bh1730-script check scripts/read_lux.rhai
//! bh1730-script config
//! ```
//!
//! Built without `--features native_driver` every command talks to a mock
//! sensor that answers at the configured address with `--mock-lux`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bh1730_script::config::{parse_address, Settings, DEFAULT_CONFIG_FILE};
use bh1730_script::logging;
use bh1730_script::mock::MockDriver;
use bh1730_script::native::NativeDriver;
use bh1730_script::scripting::{RhaiEngine, ScriptEngine, ScriptValue};
use bh1730_script::sensor::Bh1730;
use clap::{Parser, Subcommand};
use rhai::{Dynamic, INT};
use tracing::info;

/// Handle value the mock sensor hands out.
const MOCK_HANDLE: usize = 0x1000;

/// Lux reported by the mock sensor unless `--mock-lux` is given.
#[cfg(not(feature = "native_driver"))]
const DEFAULT_MOCK_LUX: f64 = 100.0;

#[derive(Parser)]
#[command(name = "bh1730-script", version, about = "Run Rhai scripts against a BH1730 light sensor")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a script with the BH1730 module registered
    Run {
        /// Script file
        file: PathBuf,
        /// I2C address exposed to the script as SENSOR_ADDR
        #[arg(long, value_parser = parse_address)]
        addr: Option<u8>,
        /// Use a mock sensor reporting this lux value
        #[arg(long)]
        mock_lux: Option<f64>,
        /// Override the operation budget
        #[arg(long)]
        max_operations: Option<u64>,
    },
    /// Create a sensor and print lux readings
    Read {
        /// I2C address to probe
        #[arg(long, value_parser = parse_address)]
        addr: Option<u8>,
        /// Number of readings
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Pause between readings
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
        /// Use a mock sensor reporting this lux value
        #[arg(long)]
        mock_lux: Option<f64>,
        /// Print one JSON object per reading
        #[arg(long)]
        json: bool,
    },
    /// Check script syntax without running it
    Check {
        /// Script file
        file: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    logging::init(&settings.logging)?;

    match cli.command {
        Command::Run {
            file,
            addr,
            mock_lux,
            max_operations,
        } => {
            let addr = addr.unwrap_or(settings.sensor.address);
            let factory = Bh1730::new(open_driver(addr, mock_lux)?)
                .with_release_policy(settings.sensor.release_policy);
            info!(driver = factory.driver_name(), addr, file = %file.display(), "running script");

            let budget = max_operations.unwrap_or(settings.script.max_operations);
            let mut engine = RhaiEngine::with_sensor(factory, budget);
            engine.set_global("SENSOR_ADDR", ScriptValue::new(Dynamic::from(INT::from(addr))))?;

            let result: Dynamic = engine.execute_file(&file).await?.downcast()?;
            if !result.is_unit() {
                println!("{}", result);
            }
        }
        Command::Read {
            addr,
            count,
            interval_ms,
            mock_lux,
            json,
        } => {
            let addr = addr.unwrap_or(settings.sensor.address);
            let factory = Bh1730::new(open_driver(addr, mock_lux)?)
                .with_release_policy(settings.sensor.release_policy);
            // Readings block on the I2C bus
            tokio::task::spawn_blocking(move || read_loop(&factory, addr, count, interval_ms, json))
                .await??;
        }
        Command::Check { file } => {
            let script = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            RhaiEngine::new().validate_script(&script).await?;
            println!("{}: OK", file.display());
        }
        Command::Config => {
            print!("{}", settings.to_toml()?);
        }
    }

    Ok(())
}

fn read_loop(factory: &Bh1730, addr: u8, count: u32, interval_ms: u64, json: bool) -> Result<()> {
    let mut sensor = factory.try_create(i32::from(addr))?;
    for i in 0..count {
        if i > 0 && interval_ms > 0 {
            std::thread::sleep(Duration::from_millis(interval_ms));
        }
        let lux = sensor.read_lux();
        let ok = lux != bh1730_script::READ_FAILED;
        if json {
            println!(
                "{}",
                serde_json::json!({ "addr": addr, "lux": lux, "ok": ok })
            );
        } else if ok {
            println!("{:.2} lx", lux);
        } else {
            println!("read failed");
        }
    }
    sensor.close();
    Ok(())
}

#[cfg(feature = "native_driver")]
fn open_driver(addr: u8, mock_lux: Option<f64>) -> Result<Arc<dyn NativeDriver>> {
    match mock_lux {
        Some(lux) => Ok(mock_driver(addr, lux)),
        None => Ok(Arc::new(bh1730_script::ffi::FfiDriver::new()?)),
    }
}

#[cfg(not(feature = "native_driver"))]
fn open_driver(addr: u8, mock_lux: Option<f64>) -> Result<Arc<dyn NativeDriver>> {
    Ok(mock_driver(addr, mock_lux.unwrap_or(DEFAULT_MOCK_LUX)))
}

fn mock_driver(addr: u8, lux: f64) -> Arc<dyn NativeDriver> {
    Arc::new(MockDriver::new().with_sensor(i32::from(addr), MOCK_HANDLE, lux))
}
