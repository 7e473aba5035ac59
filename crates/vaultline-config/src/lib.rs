pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vaultline_cloud::orchestrator::{
    DEFAULT_POLICY_NAME, DEFAULT_REGION, DEFAULT_REPLICATION_RULE_ID,
};
use vaultline_cloud::{ProvisionRequest, RetryConfig};

/// 設定ファイルのパスを指定する環境変数
pub const CONFIG_PATH_ENV: &str = "VAULTLINE_CONFIG_PATH";

const CANDIDATES: [&str; 4] = [
    "vaultline.local.yaml",
    ".vaultline.local.yaml",
    "vaultline.yaml",
    ".vaultline.yaml",
];

/// プロジェクトの設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 VAULTLINE_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: vaultline.local.yaml, .vaultline.local.yaml, vaultline.yaml, .vaultline.yaml
/// 3. ./.vaultline/ ディレクトリ内: 同様の順序
/// 4. ~/.config/vaultline/vaultline.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    for dir in [current_dir.clone(), current_dir.join(".vaultline")] {
        if !dir.is_dir() {
            continue;
        }
        for filename in &CANDIDATES {
            let path = dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("vaultline").join("vaultline.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Retry settings as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            initial_backoff_ms: defaults.initial_delay.as_millis() as u64,
            max_backoff_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

/// プロビジョニング設定
///
/// ```yaml
/// region: eu-west-3
/// source_bucket: media-primary
/// destination_bucket: media-backup
/// role_name: media-replication
/// trail_name: media-audit
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// CLI の --region (AWS_REGION) が指定されていればそちらが優先される
    #[serde(default)]
    pub region: Option<String>,

    pub source_bucket: String,
    pub destination_bucket: String,
    pub role_name: String,
    pub trail_name: String,

    #[serde(default = "default_policy_name")]
    pub policy_name: String,

    #[serde(default = "default_replication_rule_id")]
    pub replication_rule_id: String,

    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_policy_name() -> String {
    DEFAULT_POLICY_NAME.to_string()
}

fn default_replication_rule_id() -> String {
    DEFAULT_REPLICATION_RULE_ID.to_string()
}

impl ProvisionConfig {
    /// Check the fields serde cannot: names must be non-empty and the
    /// buckets distinct
    pub fn validate(&self) -> std::result::Result<(), String> {
        let required = [
            ("source_bucket", &self.source_bucket),
            ("destination_bucket", &self.destination_bucket),
            ("role_name", &self.role_name),
            ("trail_name", &self.trail_name),
            ("policy_name", &self.policy_name),
            ("replication_rule_id", &self.replication_rule_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("`{}` must not be empty", field));
            }
        }

        if self.source_bucket == self.destination_bucket {
            return Err(format!(
                "source and destination bucket are both `{}`",
                self.source_bucket
            ));
        }

        if self.region.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err("`region` must not be empty when set".to_string());
        }

        Ok(())
    }

    /// `override_region` if given, else the file's region, else the default
    pub fn resolve_region(&self, override_region: Option<&str>) -> String {
        override_region
            .or(self.region.as_deref())
            .unwrap_or(DEFAULT_REGION)
            .to_string()
    }

    pub fn to_request(&self, region: impl Into<String>) -> ProvisionRequest {
        let mut request = ProvisionRequest::new(
            &self.source_bucket,
            &self.destination_bucket,
            &self.role_name,
            &self.trail_name,
        )
        .with_region(region);
        request.policy_name = self.policy_name.clone();
        request.replication_rule_id = self.replication_rule_id.clone();
        request
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_backoff_ms),
            max_delay: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }
}

/// 設定ファイルを読み込んで検証する
pub fn load_config(path: &Path) -> Result<ProvisionConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProvisionConfig =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    config.validate().map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const MINIMAL: &str = "\
source_bucket: media-primary
destination_bucket: media-backup
role_name: media-replication
trail_name: media-audit
";

    fn in_dir<F: FnOnce()>(dir: &Path, f: F) {
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        temp_env::with_var_unset(CONFIG_PATH_ENV, f);
        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("vaultline.yaml"), MINIMAL).unwrap();

        in_dir(temp_dir.path(), || {
            let config_file = find_config_file().unwrap();
            assert!(config_file.ends_with("vaultline.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("vaultline.yaml"), MINIMAL).unwrap();
        fs::write(temp_dir.path().join(".vaultline.local.yaml"), MINIMAL).unwrap();

        in_dir(temp_dir.path(), || {
            // .vaultline.local.yaml が優先される
            let config_file = find_config_file().unwrap();
            assert!(config_file.ends_with(".vaultline.local.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_vaultline_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_dir = temp_dir.path().join(".vaultline");
        fs::create_dir(&config_dir).unwrap();
        fs::write(config_dir.join("vaultline.yaml"), MINIMAL).unwrap();

        in_dir(temp_dir.path(), || {
            let config_file = find_config_file().unwrap();
            assert!(config_file.ends_with(".vaultline/vaultline.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, MINIMAL).unwrap();

        temp_env::with_var(CONFIG_PATH_ENV, Some(config_path.as_os_str()), || {
            assert_eq!(find_config_file().unwrap(), config_path);
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        in_dir(temp_dir.path(), || {
            // グローバル設定が存在する環境ではそちらが見つかる
            match find_config_file() {
                Ok(path) => assert!(path.ends_with("vaultline/vaultline.yaml")),
                Err(err) => assert!(matches!(err, ConfigError::ConfigFileNotFound)),
            }
        });
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("vaultline.yaml");
        fs::write(&path, MINIMAL).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.source_bucket, "media-primary");
        assert_eq!(config.region, None);
        assert_eq!(config.policy_name, DEFAULT_POLICY_NAME);
        assert_eq!(config.replication_rule_id, DEFAULT_REPLICATION_RULE_ID);
        assert_eq!(config.retry, RetrySettings::default());
    }

    #[test]
    fn test_to_request_and_retry_config() {
        let yaml = format!(
            "{}region: eu-west-3\npolicy_name: customPolicy\nretry:\n  max_attempts: 6\n",
            MINIMAL
        );
        let config: ProvisionConfig = serde_yaml::from_str(&yaml).unwrap();

        let region = config.resolve_region(None);
        assert_eq!(region, "eu-west-3");
        assert_eq!(config.resolve_region(Some("ap-northeast-1")), "ap-northeast-1");

        let request = config.to_request(region);
        assert_eq!(request.region, "eu-west-3");
        assert_eq!(request.destination_bucket, "media-backup");
        assert_eq!(request.policy_name, "customPolicy");
        assert_eq!(request.replication_rule_id, DEFAULT_REPLICATION_RULE_ID);

        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 6);
        assert_eq!(retry.initial_delay, Duration::from_secs(1));
        assert_eq!(retry.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_region_fallbacks() {
        let config: ProvisionConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(config.resolve_region(Some("ap-northeast-1")), "ap-northeast-1");
        assert_eq!(config.resolve_region(None), DEFAULT_REGION);
    }

    #[test]
    fn test_missing_name_is_a_yaml_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("vaultline.yaml");
        fs::write(&path, "source_bucket: media-primary\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("vaultline.yaml");

        let cases = [
            MINIMAL.replace("media-audit", "''"),
            MINIMAL.replace("media-backup", "media-primary"),
            format!("{}region: ' '\n", MINIMAL),
        ];
        for yaml in cases {
            fs::write(&path, &yaml).unwrap();
            let err = load_config(&path).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { .. }),
                "expected Invalid for:\n{}",
                yaml
            );
        }
    }
}
