use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CLOUDGATE_CONFIG_PATH が存在しないファイルを指しています: {}", .0.display())]
    EnvPathMissing(PathBuf),

    #[error(
        "設定ファイルが見つかりません。./, ./.cloudgate/, ~/.config/cloudgate/ の順に\
        cloudgate.local.yaml, .cloudgate.local.yaml, cloudgate.yaml, .cloudgate.yaml を探します\
        (CLOUDGATE_CONFIG_PATH で直接指定も可)"
    )]
    ConfigFileNotFound,

    #[error("設定ファイルの解析に失敗しました: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("設定が不正です: {0}")]
    Invalid(String),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
