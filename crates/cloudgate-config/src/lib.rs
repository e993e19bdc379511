pub mod error;
pub mod gateway;

pub use error::*;
pub use gateway::{BackendEntry, ConvergenceSettings, DispatchSettings, GatewayConfig};

use std::path::{Path, PathBuf};

/// 設定ファイルパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "CLOUDGATE_CONFIG_PATH";

/// 各ディレクトリ内での優先順（local が共有設定より先）
const CANDIDATES: [&str; 4] = [
    "cloudgate.local.yaml",
    ".cloudgate.local.yaml",
    "cloudgate.yaml",
    ".cloudgate.yaml",
];

/// 検索するディレクトリ: ./ → ./.cloudgate/ → ~/.config/cloudgate/
fn search_dirs(current_dir: &Path) -> Vec<PathBuf> {
    let mut search = vec![current_dir.to_path_buf(), current_dir.join(".cloudgate")];
    if let Some(config_dir) = dirs::config_dir() {
        search.push(config_dir.join("cloudgate"));
    }
    search
}

/// cloudgateの設定ファイルを探す
///
/// CLOUDGATE_CONFIG_PATH が設定されていればそれだけを使う。
/// 指すファイルが無ければエラーで、デフォルトへは落ちない。
pub fn find_config_file() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) {
        return if path.is_file() {
            Ok(path)
        } else {
            Err(ConfigError::EnvPathMissing(path))
        };
    }

    let current_dir = std::env::current_dir()?;
    search_dirs(&current_dir)
        .iter()
        .flat_map(|dir| CANDIDATES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
        .ok_or(ConfigError::ConfigFileNotFound)
}

/// 設定ファイルを読み込む。見つからなければデフォルト設定
///
/// 戻り値の2番目は読み込んだファイルのパス
pub fn load_config() -> Result<(GatewayConfig, Option<PathBuf>)> {
    match find_config_file() {
        Ok(path) => {
            let config = GatewayConfig::from_path(&path)?;
            Ok((config, Some(path)))
        }
        Err(ConfigError::ConfigFileNotFound) => Ok((GatewayConfig::default(), None)),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    /// `files` を作った一時ディレクトリで `find_config_file` を実行する
    fn find_in(files: &[&str]) -> (tempfile::TempDir, Result<PathBuf>) {
        let temp_dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = temp_dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "# test").unwrap();
        }

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();
        let result = find_config_file();
        std::env::set_current_dir(original_dir).unwrap();

        (temp_dir, result)
    }

    #[test]
    #[serial]
    fn test_discovery_order() {
        let cases: &[(&[&str], &str)] = &[
            (&["cloudgate.yaml"], "cloudgate.yaml"),
            (&["cloudgate.yaml", "cloudgate.local.yaml"], "cloudgate.local.yaml"),
            (&[".cloudgate.local.yaml", "cloudgate.yaml"], ".cloudgate.local.yaml"),
            (&[".cloudgate/cloudgate.yaml"], ".cloudgate/cloudgate.yaml"),
            (
                &[".cloudgate.yaml", ".cloudgate/cloudgate.local.yaml"],
                ".cloudgate.yaml",
            ),
        ];

        for (files, expected) in cases {
            let (_dir, result) = find_in(files);
            let found = result.unwrap();
            assert!(found.ends_with(expected), "{:?} -> {:?}", files, found);
        }
    }

    #[test]
    #[serial]
    fn test_directory_named_like_config_is_skipped() {
        let (_dir, result) = find_in(&["cloudgate.yaml/placeholder", ".cloudgate.yaml"]);
        assert!(result.unwrap().ends_with(".cloudgate.yaml"));
    }

    #[test]
    #[serial]
    fn test_env_path_wins_over_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "# custom").unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &config_path);
        }
        let (_dir, result) = find_in(&["cloudgate.yaml"]);
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    #[serial]
    fn test_missing_env_path_is_an_error() {
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/cloudgate.yaml");
        }
        let result = load_config();
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        assert!(matches!(result, Err(ConfigError::EnvPathMissing(_))));
    }

    #[test]
    #[serial]
    fn test_load_config_from_env_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("gateway.yaml");
        fs::write(
            &config_path,
            "dispatch:\n  backend_timeout_ms: 5000\nbackends:\n  - id: eu\n    profile: paci\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &config_path);
        }
        let loaded = load_config();
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        let (config, source) = loaded.unwrap();
        assert_eq!(source.as_deref(), Some(config_path.as_path()));
        assert_eq!(config.dispatch.backend_timeout_ms, 5000);
        assert_eq!(config.backends[0].profile, "paci");
    }

    #[test]
    #[serial]
    fn test_load_config_malformed_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("broken.yaml");
        fs::write(&config_path, "convergence: [1, 2").unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &config_path);
        }
        let result = load_config();
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
