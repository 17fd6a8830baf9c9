use crate::config::{parse_hosts, validate_log_level, validate_width, Config, ValidationError};
use crate::ip::codec::{parse_ipv4, Cidr};
use crate::session::OutputFormat;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::fs::File;
use std::path::Path;

/// Log filter used when neither the command line nor the file sets one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path).wrap_err_with(|| {
        format!("Failed to open configuration file '{}'", config_path.display())
    })?;

    let config: Config = serde_yaml::from_reader(file).wrap_err_with(|| {
        format!("Failed to parse configuration file '{}'", config_path.display())
    })?;

    config.validate()?;

    Ok(config)
}

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub prefix: Option<String>,
    pub width: Option<u8>,
    pub format: Option<OutputFormat>,
    pub log_level: Option<String>,
}

/// Everything needed to start a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub subnet: Cidr,
    pub format: OutputFormat,
    pub log_level: String,
    pub hosts_up: Vec<u32>,
}

/// Merge the optional configuration file with command-line overrides.
///
/// The prefix and width may come from either source, one field at a time;
/// the command line wins where both are present. Both must be known in the
/// end.
pub fn resolve_settings(
    config: Option<&Config>,
    overrides: &CliOverrides,
) -> Result<Settings, ValidationError> {
    let network = config.and_then(|c| c.network.as_ref());

    let prefix = overrides
        .prefix
        .as_deref()
        .or(network.map(|n| n.prefix.as_str()))
        .ok_or_else(|| ValidationError::InvalidNetwork("no network prefix given".to_string()))?;
    let width = overrides
        .width
        .or(network.map(|n| n.width))
        .ok_or_else(|| {
            ValidationError::InvalidNetwork("no network prefix width given".to_string())
        })?;

    validate_width(width)?;
    let address = parse_ipv4(prefix).map_err(|e| ValidationError::InvalidNetwork(e.to_string()))?;
    let subnet = Cidr::new(address, width);
    if subnet.prefix() != address {
        debug!("Aligned network prefix {} to {}", prefix, subnet);
    }

    let general = config.map(|c| c.general.clone()).unwrap_or_default();
    let format = overrides.format.or(general.output_format).unwrap_or_default();
    let log_level = overrides
        .log_level
        .clone()
        .or(general.log_level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    validate_log_level(&log_level)?;

    let hosts = config.map(|c| c.hosts_up.as_slice()).unwrap_or_default();
    let hosts_up = parse_hosts(hosts, Some(subnet))?;

    Ok(Settings {
        subnet,
        format,
        log_level,
        hosts_up,
    })
}
