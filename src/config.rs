use log::{info, warn};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::InitArgs;

const DEFAULT_REPETITIONS: i64 = 10;
const DEFAULT_DELAY_SECS: f64 = 0.3;
const DEFAULT_INTERVAL_SECS: u64 = 1800; // 30 minutes
const DEFAULT_SYSFS_ROOT: &str = "/sys";
const SENSOR_ARGS_PREFIX: &str = "SENSOR_ARGS_";

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Samples taken per sensor in one burst
    pub repetitions: i64,
    /// Pause after every sample, in seconds
    pub delay_secs: f64,
    /// Pause between bursts, in seconds
    pub interval_secs: u64,
    pub sysfs_root: PathBuf,
    /// Initialization arguments keyed by sensor identifier
    pub sensor_args: HashMap<String, InitArgs>,
}

impl ReaderConfig {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_vars(env::vars())
    }

    /// Build the configuration from `(name, value)` pairs.
    ///
    /// Values that cannot be converted to the expected type fail with
    /// `TypeValidation`; range checks are left to the reader.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let repetitions = parse_var(&vars, "READER_REPETITIONS", "whole number")?
            .unwrap_or(DEFAULT_REPETITIONS);
        let delay_secs = parse_var(&vars, "READER_DELAY_SECS", "real number")?
            .unwrap_or(DEFAULT_DELAY_SECS);
        let interval_secs = parse_var(&vars, "READER_INTERVAL_SECS", "non-negative whole number")?
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        let sysfs_root = vars
            .get("SYSFS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSFS_ROOT));

        // Sorted so a clash between differently cased keys is reported the same way every run
        let mut keys: Vec<&String> = vars
            .keys()
            .filter(|key| key.starts_with(SENSOR_ARGS_PREFIX))
            .collect();
        keys.sort();

        let mut sensor_args = HashMap::new();
        let mut sources: HashMap<String, &str> = HashMap::new();
        for key in keys {
            let sensor = &key[SENSOR_ARGS_PREFIX.len()..];
            if sensor.is_empty() {
                warn!("Ignoring {} without a sensor name", key);
                continue;
            }
            let name = sensor.to_uppercase();
            if let Some(previous) = sources.get(&name) {
                return Err(Error::InvalidArguments {
                    args: format!("{} and {} both configure {}", previous, key, name),
                });
            }
            let args = InitArgs::parse(&vars[key])?;
            info!("Sensor {} will be initialized with {:?}", name, args);
            sources.insert(name.clone(), key);
            sensor_args.insert(name, args);
        }

        Ok(ReaderConfig {
            repetitions,
            delay_secs,
            interval_secs,
            sysfs_root,
            sensor_args,
        })
    }
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    expected: &str,
) -> Result<Option<T>> {
    match vars.get(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::TypeValidation {
                name: name.to_string(),
                desc: format!("expected a {}, got {:?}", expected, raw),
            }),
    }
}
