use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(
        default = "default_log_level",
        deserialize_with = "deserialize_log_level"
    )]
    pub log_level: LogLevel,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5001
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    #[serde(default = "default_onnx_file")]
    pub onnx_file: String,
    #[serde(default = "default_model_instances")]
    pub num_instances: usize,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("model")
}

fn default_onnx_file() -> String {
    "satellite_standard_unet_100epochs.onnx".into()
}

fn default_model_instances() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            onnx_file: default_onnx_file(),
            num_instances: default_model_instances(),
        }
    }
}

pub trait Validatable {
    fn get_path(&self) -> PathBuf;
    fn validate(&self) -> Result<(), String>;
}

impl ModelConfig {
    /// Anchors a relative `model_dir` to `base_path`.
    pub fn resolve_against(mut self, base_path: &Path) -> Self {
        if self.model_dir.is_relative() {
            self.model_dir = base_path.join(&self.model_dir);
        }
        self
    }
}

impl Validatable for ModelConfig {
    fn get_path(&self) -> PathBuf {
        self.model_dir.join(&self.onnx_file)
    }

    fn validate(&self) -> Result<(), String> {
        if self.num_instances == 0 {
            return Err("model.num_instances must be at least 1".into());
        }
        if !self.get_path().exists() {
            return Err(format!("Model file not found: {:?}", self.get_path()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

/// Loads `configuration/base.yaml`, the environment overlay, `APP_*` variables
/// and finally `PORT`. Missing files are skipped. A relative `model.model_dir`
/// is anchored next to the running binary.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no working directory: {}", e)))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let mut config = load_from(
        &base_path,
        &environment,
        Some(app_environment()),
        std::env::var("PORT").ok(),
    )?;
    config.model = config.model.resolve_against(&executable_dir()?);

    config.model.validate().map_err(|e| {
        tracing::error!("Configuration validation failed: {}", e);
        config::ConfigError::Message(e)
    })?;

    Ok(config)
}

/// Directory of the running binary.
pub fn executable_dir() -> Result<PathBuf, config::ConfigError> {
    let executable = std::env::current_exe()
        .map_err(|e| config::ConfigError::Message(format!("no executable path: {}", e)))?;

    executable
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            config::ConfigError::Message(format!("{:?} has no parent directory", executable))
        })
}

fn app_environment() -> config::Environment {
    config::Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_from(
    base_path: &Path,
    environment: &Environment,
    env_source: Option<config::Environment>,
    port_override: Option<String>,
) -> Result<Config, config::ConfigError> {
    let configuration_directory = base_path.join("configuration");

    let port_override = port_override
        .map(|port| {
            port.parse::<u16>()
                .map_err(|e| config::ConfigError::Message(format!("invalid PORT {:?}: {}", port, e)))
        })
        .transpose()?;

    let mut builder = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        );
    if let Some(env_source) = env_source {
        builder = builder.add_source(env_source);
    }

    builder
        .set_override_option("server.port", port_override.map(i64::from))?
        .build()?
        .try_deserialize::<Config>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("landcover-config-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("configuration")).unwrap();
        dir
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = std::env::temp_dir().join(format!("landcover-config-empty-{}", std::process::id()));
        let config = load_from(&dir, &Environment::Local, None, None).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.model.num_instances, 1);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(
            config.model.get_path(),
            PathBuf::from("model").join("satellite_standard_unet_100epochs.onnx")
        );
    }

    #[test]
    fn test_app_variables_override_files() {
        let dir = scratch_dir("envvars");
        fs::write(
            dir.join("configuration/base.yaml"),
            "server:\n  port: 8000\nmodel:\n  num_instances: 2\n",
        )
        .unwrap();
        let variables = [
            ("APP_SERVER__PORT", "7000"),
            ("APP_MODEL__NUM_INSTANCES", "4"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = load_from(
            &dir,
            &Environment::Local,
            Some(app_environment().source(Some(variables))),
            None,
        )
        .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.model.num_instances, 4);

        let config = load_from(
            &dir,
            &Environment::Local,
            Some(app_environment().source(Some(
                [("APP_SERVER__PORT".to_string(), "7000".to_string())]
                    .into_iter()
                    .collect(),
            ))),
            Some("9100".into()),
        )
        .unwrap();
        assert_eq!(config.server.port, 9100);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_relative_model_dir_sits_next_to_executable() {
        let exe_dir = executable_dir().unwrap();
        let executable = std::env::current_exe().unwrap();
        assert_eq!(Some(exe_dir.as_path()), executable.parent());

        let model = ModelConfig::default().resolve_against(&exe_dir);
        assert_eq!(
            model.get_path(),
            exe_dir.join("model").join("satellite_standard_unet_100epochs.onnx")
        );

        let absolute = ModelConfig {
            model_dir: PathBuf::from("/opt/models"),
            ..ModelConfig::default()
        }
        .resolve_against(&exe_dir);
        assert_eq!(absolute.model_dir, PathBuf::from("/opt/models"));
    }

    #[test]
    fn test_environment_overlay_and_port_override() {
        let dir = scratch_dir("overlay");
        fs::write(
            dir.join("configuration/base.yaml"),
            "log_level: info\nserver:\n  host: 127.0.0.1\n  port: 8000\nmodel:\n  model_dir: /opt/models\n  onnx_file: unet.onnx\n",
        )
        .unwrap();
        fs::write(
            dir.join("configuration/production.yaml"),
            "log_level: debug\nmodel:\n  num_instances: 3\n",
        )
        .unwrap();

        let config = load_from(&dir, &Environment::Production, None, Some("9100".into())).unwrap();

        assert_eq!(config.server.get_address(), "127.0.0.1:9100");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.model.num_instances, 3);
        assert_eq!(config.model.get_path(), PathBuf::from("/opt/models/unet.onnx"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_invalid_port_override() {
        let dir = scratch_dir("badport");
        let result = load_from(&dir, &Environment::Local, None, Some("not-a-port".into()));
        assert!(result.is_err());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_model_and_zero_instances() {
        let missing = ModelConfig {
            model_dir: PathBuf::from("/definitely/not/here"),
            onnx_file: "unet.onnx".into(),
            num_instances: 1,
        };
        assert!(missing.validate().unwrap_err().contains("Model file not found"));

        let zero = ModelConfig {
            num_instances: 0,
            ..missing
        };
        assert!(zero.validate().unwrap_err().contains("num_instances"));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::try_from("DEBUG".to_string()), Ok(LogLevel::Debug));
        assert!(LogLevel::try_from("trace".to_string()).is_err());
        assert!(Environment::try_from("staging".to_string()).is_err());
    }
}
