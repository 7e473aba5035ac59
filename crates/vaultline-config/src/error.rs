use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: vaultline.local.yaml, .vaultline.local.yaml, vaultline.yaml, .vaultline.yaml\n\
        - ./.vaultline/ ディレクトリ\n\
        - ~/.config/vaultline/vaultline.yaml\n\
        または VAULTLINE_CONFIG_PATH 環境変数で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("設定が不正です ({path}): {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("YAML の解析に失敗しました ({path}): {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
