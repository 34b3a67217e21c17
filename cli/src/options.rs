use std::fmt;

use log::LevelFilter;
use volley_engine::config::Config;

pub const USAGE: &str = "usage: volley [--headless <ticks>] [--seed <n>] [--workers <n>] \
[--threshold <n>] [--log <level>]";

/// Command line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Run this many ticks without a terminal.
    pub headless: Option<u64>,
    pub seed: Option<u64>,
    pub workers: Option<usize>,
    pub threshold: Option<usize>,
    pub log_level: LevelFilter,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            headless: None,
            seed: None,
            workers: None,
            threshold: None,
            log_level: LevelFilter::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    Unknown(String),
    MissingValue(&'static str),
    Invalid { flag: &'static str, value: String },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::Unknown(arg) => write!(f, "unknown argument '{arg}'"),
            OptionsError::MissingValue(flag) => write!(f, "{flag} needs a value"),
            OptionsError::Invalid { flag, value } => {
                write!(f, "invalid value '{value}' for {flag}")
            }
        }
    }
}

impl std::error::Error for OptionsError {}

impl Options {
    /// Parse arguments, not including the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let flag: &'static str = match arg.as_ref() {
                "--headless" => "--headless",
                "--seed" => "--seed",
                "--workers" => "--workers",
                "--threshold" => "--threshold",
                "--log" => "--log",
                other => return Err(OptionsError::Unknown(other.to_string())),
            };
            let value = args.next().ok_or(OptionsError::MissingValue(flag))?;
            let value = value.as_ref();
            match flag {
                "--headless" => options.headless = Some(number(flag, value)?),
                "--seed" => options.seed = Some(number(flag, value)?),
                "--workers" => {
                    let workers = number(flag, value)?;
                    if workers == 0 {
                        return Err(invalid(flag, value));
                    }
                    options.workers = Some(workers);
                }
                "--threshold" => options.threshold = Some(number(flag, value)?),
                _ => options.log_level = value.parse().map_err(|_| invalid(flag, value))?,
            }
        }
        Ok(options)
    }

    /// Apply the overrides to a configuration.
    pub fn configure(&self, mut config: Config) -> Config {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(workers) = self.workers {
            config.dispatch.workers = workers;
        }
        if let Some(threshold) = self.threshold {
            config.dispatch.threshold = threshold;
        }
        config
    }
}

fn invalid(flag: &'static str, value: &str) -> OptionsError {
    OptionsError::Invalid {
        flag,
        value: value.to_string(),
    }
}

fn number<T: std::str::FromStr>(flag: &'static str, value: &str) -> Result<T, OptionsError> {
    value.parse().map_err(|_| invalid(flag, value))
}
