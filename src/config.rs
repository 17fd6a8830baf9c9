use crate::ip::codec::{parse_ipv4, Cidr, HOST_WIDTH, MIN_WIDTH};
use crate::session::OutputFormat;
use serde::{Deserialize, Serialize};

/// Log levels accepted by the `log_level` setting
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Startup configuration file
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkConfig>,
    #[serde(default)]
    pub general: GeneralConfig,
    /// Hosts marked up before the command loop starts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts_up: Vec<String>,
}

/// The monitored subnet
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    pub prefix: String,
    pub width: u8,
}

impl NetworkConfig {
    /// Parse into an aligned block, checking the width bounds
    pub fn to_cidr(&self) -> Result<Cidr, ValidationError> {
        validate_width(self.width)?;
        let prefix = parse_ipv4(&self.prefix)
            .map_err(|e| ValidationError::InvalidNetwork(e.to_string()))?;
        Ok(Cidr::new(prefix, self.width))
    }
}

/// Loop and logging settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.general.log_level {
            validate_log_level(level)?;
        }

        let subnet = self.network.as_ref().map(NetworkConfig::to_cidr).transpose()?;
        parse_hosts(&self.hosts_up, subnet)?;

        Ok(())
    }
}

/// Parse `hosts_up` entries, checking each against `subnet` when one is known
pub fn parse_hosts(hosts: &[String], subnet: Option<Cidr>) -> Result<Vec<u32>, ValidationError> {
    hosts
        .iter()
        .map(|host| {
            let address =
                parse_ipv4(host).map_err(|e| ValidationError::InvalidHost(e.to_string()))?;

            match subnet {
                Some(subnet) if !subnet.contains(address) => {
                    Err(ValidationError::InvalidHost(format!(
                        "{} is not within the sub-network {}",
                        host, subnet
                    )))
                }
                _ => Ok(address),
            }
        })
        .collect()
}

/// Check that a subnet width is one the tree can hold
pub fn validate_width(width: u8) -> Result<(), ValidationError> {
    if !(MIN_WIDTH..=HOST_WIDTH).contains(&width) {
        return Err(ValidationError::InvalidNetwork(format!(
            "The network_prefix_width must be in the range {}..{}, got {}",
            MIN_WIDTH, HOST_WIDTH, width
        )));
    }
    Ok(())
}

/// Check that a log level is one env_logger understands
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return Err(ValidationError::InvalidGeneral(format!(
            "log_level must be one of {}, got '{}'",
            LOG_LEVELS.join(", "),
            level
        )));
    }
    Ok(())
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid host in hosts_up: {0}")]
    InvalidHost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
network:
  prefix: "128.250.1.0"
  width: 24
general:
  log_level: debug
  output_format: json
hosts_up:
  - "128.250.1.1"
  - "128.250.1.2"
"#,
        );

        assert!(config.validate().is_ok());
        let network = config.network.as_ref().unwrap();
        assert_eq!(network.to_cidr().unwrap().to_string(), "128.250.1.0/24");
        assert_eq!(config.general.output_format, Some(OutputFormat::Json));
        assert_eq!(config.hosts_up.len(), 2);
    }

    #[test]
    fn test_minimal_config() {
        let config = parse("hosts_up: [\"10.0.0.1\"]\n");
        assert!(config.network.is_none());
        assert!(config.general.log_level.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_width() {
        let config = parse("network:\n  prefix: \"10.0.0.0\"\n  width: 8\n");
        match config.validate() {
            Err(ValidationError::InvalidNetwork(msg)) => assert!(msg.contains("16..32")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_prefix() {
        let config = parse("network:\n  prefix: \"10.0.0\"\n  width: 24\n");
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNetwork(_))));
    }

    #[test]
    fn test_host_outside_subnet() {
        let config = parse(
            "network:\n  prefix: \"10.0.0.0\"\n  width: 24\nhosts_up: [\"10.0.1.1\"]\n",
        );
        assert!(matches!(config.validate(), Err(ValidationError::InvalidHost(_))));
    }

    #[test]
    fn test_parse_hosts() {
        let hosts = vec!["10.0.0.1".to_string(), "10.0.0.200".to_string()];
        let subnet = Cidr::new(0x0a00_0000, 24);

        assert_eq!(parse_hosts(&hosts, Some(subnet)).unwrap(), vec![0x0a00_0001, 0x0a00_00c8]);
        assert!(parse_hosts(&hosts, Some(Cidr::new(0x0a00_0000, 25))).is_err());
        assert_eq!(parse_hosts(&hosts, None).unwrap().len(), 2);
        assert!(parse_hosts(&["10.0.0".to_string()], None).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let config = parse("general:\n  log_level: loud\n");
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));
        assert!(validate_log_level("INFO").is_ok());
    }

    #[test]
    fn test_unknown_output_format_fails_to_parse() {
        let result: Result<Config, _> = serde_yaml::from_str("general:\n  output_format: xml\n");
        assert!(result.is_err());
    }
}
