use anyhow::{anyhow, Context, Result};
use arrows_core::generator::GeneratorConfig;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::{
    env,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

const LOGGER_CONFIG: &str = "config/logger.yaml";
const GENERATOR_CONFIG: &str = "config/generator.yaml";
const LOG_ENV: &str = "ARROWS_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub stdout: bool,
    pub level_filter: LevelFilter,
    pub log_file: Option<PathBuf>,
    /// Lets `ARROWS_LOG` replace `level_filter`.
    pub allow_env_override: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            level_filter: LevelFilter::Info,
            log_file: None,
            allow_env_override: true,
        }
    }
}

pub fn application_root_dir() -> Result<PathBuf> {
    if let Some(manifest_dir) = env::var_os("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    let exe = env::current_exe().context("cannot locate the executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("executable `{}` has no parent", exe.display()))
}

/// A missing default file gives the default value, a missing user-specified one is an error.
fn load_yaml<T>(path: Option<PathBuf>, default_path: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let is_user_specified = path.is_some();
    let path = path.unwrap_or_else(|| PathBuf::from(default_path));
    let path = if path.is_relative() && !is_user_specified {
        application_root_dir()?.join(path)
    } else {
        path
    };

    if path.exists() {
        let file =
            File::open(&path).with_context(|| format!("cannot open `{}`", path.display()))?;
        let mut reader = BufReader::new(file);
        serde_yaml::from_reader(&mut reader)
            .with_context(|| format!("cannot parse `{}`", path.display()))
    } else if is_user_specified {
        Err(anyhow!(
            "Failed to read configuration file: `{}`.",
            path.display()
        ))
    } else {
        Ok(T::default())
    }
}

pub fn logger_setup(logger_config_path: Option<PathBuf>) -> Result<()> {
    let mut logger_config: LoggerConfig = load_yaml(logger_config_path, LOGGER_CONFIG)?;
    if logger_config.allow_env_override {
        if let Some(level) = env::var(LOG_ENV).ok().and_then(|value| value.parse().ok()) {
            logger_config.level_filter = level;
        }
    }

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if logger_config.stdout {
        loggers.push(TermLogger::new(
            logger_config.level_filter,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if let Some(log_file) = &logger_config.log_file {
        let file = File::create(log_file)
            .with_context(|| format!("cannot create `{}`", log_file.display()))?;
        loggers.push(WriteLogger::new(
            logger_config.level_filter,
            Config::default(),
            file,
        ));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}

pub fn load_generator_config(path: Option<PathBuf>) -> Result<GeneratorConfig> {
    load_yaml(path, GENERATOR_CONFIG)
}

#[test]
fn test_logger_config_defaults_missing_fields() {
    let config: LoggerConfig = serde_yaml::from_str("level_filter: Debug").unwrap();
    assert_eq!(config.level_filter, LevelFilter::Debug);
    assert!(config.stdout);
    assert_eq!(config.log_file, None);
}

#[test]
fn test_generator_config_from_yaml() {
    let config: GeneratorConfig =
        serde_yaml::from_str("rows: 10\ncols: 6\nverifier:\n  max_states: 50\n").unwrap();
    assert_eq!((config.rows, config.cols), (10, 6));
    assert_eq!(config.verifier.max_states, 50);
    assert_eq!(config.verifier.max_depth, 100);
    assert_eq!(config.min_len, 3);
}

#[test]
fn test_missing_user_file_is_an_error() {
    let missing = PathBuf::from("/nonexistent/arrows/generator.yaml");
    assert!(load_generator_config(Some(missing)).is_err());
}
