use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Source,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub format: OutputFormat,

    /// Encoding for `cast="bytes"` elements without an `encoding` attribute.
    #[serde(default = "default_encoding")]
    pub default_encoding: String,

    #[serde(default = "default_pretty")]
    pub pretty: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}
fn default_pretty() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            format: OutputFormat::Source,
            default_encoding: default_encoding(),
            pretty: true,
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.format, OutputFormat::Source);
        assert_eq!(config.default_encoding, "utf-8");
        assert!(config.pretty);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_deserialize_full_config() {
        let json = r#"{
            "format": "json",
            "default_encoding": "latin-1",
            "pretty": false,
            "log_level": "debug"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.default_encoding, "latin-1");
        assert!(!config.pretty);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: Config = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.default_encoding, "utf-8");
        assert!(config.pretty);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"format": "yaml"}"#).is_err());
    }
}
