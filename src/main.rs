extern crate chrono;
extern crate config;
#[macro_use]
extern crate failure;
extern crate itertools;
extern crate rand;
extern crate reqwest;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_envlogger;
extern crate slog_scope;
extern crate slog_stdlog;
extern crate slog_term;
#[macro_use]
extern crate structopt;
#[cfg(test)]
extern crate tempfile;
extern crate tokio;

use std::env;
use std::fs;
use std::io;
use std::path;
use std::process;

use slog::Drain;
use structopt::StructOpt;

pub mod alert;
pub mod auth;
pub mod catalog;
pub mod export;
pub mod history;
pub mod model;
pub mod monitor;
pub mod query;
pub mod registry;
pub mod sensors;
pub mod settings;
pub mod storage;
pub mod thresholds;
pub mod util;

#[derive(Debug, StructOpt)]
#[structopt(name = "iotmon", about = "Simulated IoT temperature/humidity monitor")]
struct Options {
    /// Config file to use instead of ./iotmon.{toml,json,yaml}
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config: Option<path::PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Starts a session with the demo credentials
    #[structopt(name = "login")]
    Login {
        #[structopt(long = "email")]
        email: String,
        #[structopt(long = "password")]
        password: String,
    },
    /// Ends the current session
    #[structopt(name = "logout")]
    Logout,
    /// Shows who is logged in
    #[structopt(name = "whoami")]
    Whoami,
    /// Lists catalog devices with their effective thresholds
    #[structopt(name = "devices")]
    Devices {
        #[structopt(long = "search", default_value = "")]
        search: String,
        #[structopt(long = "page", default_value = "1")]
        page: usize,
    },
    /// Shows or edits alert thresholds
    #[structopt(name = "thresholds")]
    Thresholds {
        #[structopt(subcommand)]
        command: ThresholdsCommand,
    },
    /// Runs the live monitor
    #[structopt(name = "monitor")]
    Monitor {
        /// Stop after this many ticks
        #[structopt(long = "ticks")]
        ticks: Option<u64>,
    },
    /// Exports a generated history of a device as CSV
    #[structopt(name = "history")]
    History {
        #[structopt(long = "device")]
        device: String,
        /// One of 24h, 7d, 3m
        #[structopt(long = "range", default_value = "24h")]
        range: history::Range,
        /// Write to this file instead of stdout
        #[structopt(short = "o", long = "output", parse(from_os_str))]
        output: Option<path::PathBuf>,
    },
}

#[derive(Debug, StructOpt)]
enum ThresholdsCommand {
    #[structopt(name = "show")]
    Show,
    #[structopt(
        name = "set-global",
        raw(setting = "structopt::clap::AppSettings::AllowNegativeNumbers")
    )]
    SetGlobal {
        #[structopt(long = "temp-min")]
        temp_min: f64,
        #[structopt(long = "temp-max")]
        temp_max: f64,
        #[structopt(long = "hum-min")]
        hum_min: f64,
        #[structopt(long = "hum-max")]
        hum_max: f64,
    },
    #[structopt(
        name = "set-device",
        raw(setting = "structopt::clap::AppSettings::AllowNegativeNumbers")
    )]
    SetDevice {
        device: String,
        #[structopt(long = "temp-min")]
        temp_min: f64,
        #[structopt(long = "temp-max")]
        temp_max: f64,
        #[structopt(long = "hum-min")]
        hum_min: f64,
        #[structopt(long = "hum-max")]
        hum_max: f64,
    },
}

fn main() {
    let options = Options::from_args();

    let code = {
        let log = init_log();
        let _scope_guard = slog_scope::set_global_logger(log.clone());
        let result = slog_stdlog::init()
            .map_err(|e| failure::err_msg(format!("could not bridge std logging: {}", e)))
            .and_then(|()| run(&log, options));

        match result {
            Ok(()) => 0,
            Err(e) => {
                error!(log, "command failed"; "error" => %e);
                eprintln!("{}", error_report(&e));
                1
            }
        }
    };
    process::exit(code);
}

/// The user-facing text of an error: its message, then one line per underlying cause.
fn error_report(error: &failure::Error) -> String {
    let mut report = error.to_string();
    for cause in error.iter_chain().skip(1) {
        report.push_str("\ncaused by: ");
        report.push_str(&cause.to_string());
    }
    report
}

fn init_log() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::LogBuilder::new(drain)
        .filter(None, slog::FilterLevel::Info)
        .parse(&env::var("RUST_LOG").unwrap_or_default())
        .build()
        .ignore_res();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

fn run(log: &slog::Logger, options: Options) -> Result<(), failure::Error> {
    let settings = settings::Settings::load(options.config.as_ref().map(|p| p.as_path()))?;
    debug!(log, "loaded settings"; "settings" => ?settings);

    let session = storage::FileStorage::open(settings.session_dir())?;
    let catalog_log = log.new(o!("component" => "catalog"));
    let devices = || catalog::fetch(&catalog_log, &settings.catalog_url, settings.catalog_timeout());

    match options.command {
        Command::Login { email, password } => {
            let user = auth::login(&session, &settings.credentials, &email, &password)?;
            info!(log, "logged in"; "email" => &user.email);
            println!("Logged in as {}", user.email);
        }
        Command::Logout => {
            auth::logout(&session)?;
            println!("Logged out");
        }
        Command::Whoami => match auth::current_user(&session) {
            Some(user) => println!("{}", user.email),
            None => println!("Not logged in"),
        },
        Command::Devices { search, page } => {
            let thresholds = open_thresholds(log, &settings, &session)?;
            let devices = devices();
            let found = query::filter_by_name(&devices, &search);
            let page = query::paginate(&found, page, query::ITEMS_PER_PAGE);

            if page.items.is_empty() {
                println!("No devices found.");
            }
            for device in page.items {
                let marker = if thresholds.is_overridden(&device.id) {
                    "custom"
                } else {
                    "global"
                };
                println!(
                    "{:<12} {:<28} {} ({})",
                    device.id,
                    device.name,
                    thresholds.resolve(&device.id),
                    marker
                );
            }
            if page.total_pages > 1 {
                println!("page {} of {}", page.number, page.total_pages);
            }
        }
        Command::Thresholds { command } => {
            let mut thresholds = open_thresholds(log, &settings, &session)?;
            match command {
                ThresholdsCommand::Show => {
                    let config = thresholds.config();
                    println!("global: {}", config.global);
                    for (device, bounds) in &config.per_device {
                        println!("{}: {}", device, bounds);
                    }
                }
                ThresholdsCommand::SetGlobal {
                    temp_min,
                    temp_max,
                    hum_min,
                    hum_max,
                } => {
                    thresholds.update_global(model::ThresholdBounds {
                        temp_min,
                        temp_max,
                        hum_min,
                        hum_max,
                    })?;
                    println!("Thresholds saved!");
                }
                ThresholdsCommand::SetDevice {
                    device,
                    temp_min,
                    temp_max,
                    hum_min,
                    hum_max,
                } => {
                    find_device(&devices(), &device)?;
                    thresholds.set_per_device(
                        &device,
                        model::ThresholdBounds {
                            temp_min,
                            temp_max,
                            hum_min,
                            hum_max,
                        },
                    )?;
                    println!("Thresholds saved!");
                }
            }
        }
        Command::Monitor { ticks } => {
            let thresholds = open_thresholds(log, &settings, &session)?;
            let mut registry = registry::Registry::new(sensors::Simulator::new());
            registry.initialize(devices());
            for device_id in &settings.disabled_devices {
                if registry.set_enabled(device_id, false).is_none() {
                    warn!(log, "cannot disable unknown device"; "device" => device_id);
                }
            }

            let mut monitor =
                monitor::Monitor::new(log.new(o!("component" => "monitor")), registry, thresholds);
            monitor.run(settings.tick_interval(), ticks)?;
        }
        Command::History {
            device,
            range,
            output,
        } => {
            auth::require_user(&session)?;
            let device = find_device(&devices(), &device)?;
            let points = history::generate(
                &mut rand::thread_rng(),
                &device.id,
                range,
                chrono::Utc::now(),
            );
            if let Some(summary) = history::summarize(&points) {
                info!(log, "generated history";
                      "device" => &device.id,
                      "range" => %range,
                      "points" => points.len(),
                      "temperature" => ?summary.temperature,
                      "humidity" => ?summary.humidity);
            }

            match output {
                Some(path) => {
                    export::write_csv(&points, io::BufWriter::new(fs::File::create(&path)?))?;
                    println!("Exported {} points to {}", points.len(), path.display());
                }
                None => {
                    let stdout = io::stdout();
                    export::write_csv(&points, stdout.lock())?;
                }
            }
        }
    }

    Ok(())
}

/// Checks for a logged in user and loads the thresholds they work with.
fn open_thresholds(
    log: &slog::Logger,
    settings: &settings::Settings,
    session: &storage::FileStorage,
) -> Result<thresholds::ThresholdStore<storage::FileStorage>, failure::Error> {
    auth::require_user(session)?;
    let local = storage::FileStorage::open(settings.local_dir())?;
    Ok(thresholds::ThresholdStore::load(
        log.new(o!("component" => "thresholds")),
        local,
    ))
}

fn find_device(devices: &[model::Device], id: &str) -> Result<model::Device, failure::Error> {
    devices
        .iter()
        .find(|d| d.id == id)
        .cloned()
        .ok_or_else(|| format_err!("unknown device {:?}", id))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejected_thresholds_report_their_message() {
        let error = failure::Error::from(model::ThresholdError::TemperatureRange {
            min: 10.0,
            max: 5.0,
        });

        let report = error_report(&error);
        assert_eq!("Temperature Min must be less than Max! (10 >= 5)", report);
        assert!(!report.contains("TemperatureRange"));
    }

    #[test]
    fn report_lists_causes() {
        let error: failure::Error = failure::err_msg("disk full")
            .context("could not save thresholds")
            .into();

        assert_eq!(
            "could not save thresholds\ncaused by: disk full",
            error_report(&error)
        );
    }
}
