use directories::ProjectDirs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const APP: &str = "lianxi";
const DB_FILE: &str = "lianxi.db";
const CONFIG_FILE: &str = "config.json";

/// Where the deck database and the config file live.
///
/// The deck is state rather than configuration, so it goes under
/// `$XDG_STATE_HOME` (`~/.local/state` when unset) and survives a wiped
/// config directory.
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        state_dir(std::env::var_os("XDG_STATE_HOME"), std::env::var_os("HOME"))
            .or_else(|| ProjectDirs::from("", "", APP).map(|pd| pd.data_local_dir().to_path_buf()))
            .map(|dir| dir.join(DB_FILE))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP)
            .map(|pd| pd.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(format!("{APP}_{CONFIG_FILE}")))
    }

    /// `--db` wins over `db_path` in the config file, which wins over the
    /// state directory. A relative `db_path` is read relative to the config
    /// file, so a config can point at a deck kept next to it.
    pub fn resolve_db_path(cli: Option<&Path>, configured: Option<&Path>) -> PathBuf {
        if let Some(path) = cli {
            return path.to_path_buf();
        }
        if let Some(path) = configured {
            return relative_to(path, &Self::config_path());
        }
        Self::db_path().unwrap_or_else(|| PathBuf::from(DB_FILE))
    }
}

fn state_dir(xdg_state: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    // relative XDG paths are invalid and ignored
    let xdg = xdg_state.map(PathBuf::from).filter(|p| p.is_absolute());
    xdg.or_else(|| home.map(|h| PathBuf::from(h).join(".local").join("state")))
        .map(|base| base.join(APP))
}

fn relative_to(path: &Path, config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_path_wins() {
        let cli = Path::new("/tmp/cli.db");
        let configured = Path::new("/tmp/configured.db");
        assert_eq!(AppDirs::resolve_db_path(Some(cli), Some(configured)), cli);
        assert_eq!(AppDirs::resolve_db_path(None, Some(configured)), configured);
    }

    #[test]
    fn relative_configured_path_sits_next_to_config() {
        let config = Path::new("/home/me/.config/lianxi/config.json");
        assert_eq!(
            relative_to(Path::new("decks/hsk.db"), config),
            PathBuf::from("/home/me/.config/lianxi/decks/hsk.db")
        );
        assert_eq!(relative_to(Path::new("/srv/hsk.db"), config), PathBuf::from("/srv/hsk.db"));
    }

    #[test]
    fn state_dir_prefers_xdg() {
        assert_eq!(
            state_dir(Some("/xdg/state".into()), Some("/home/me".into())),
            Some(PathBuf::from("/xdg/state/lianxi"))
        );
        assert_eq!(
            state_dir(Some("relative".into()), Some("/home/me".into())),
            Some(PathBuf::from("/home/me/.local/state/lianxi"))
        );
        assert_eq!(state_dir(None, None), None);
    }

    #[test]
    fn default_path_names_the_app() {
        assert!(AppDirs::resolve_db_path(None, None).ends_with(DB_FILE));
        assert!(AppDirs::config_path().ends_with(CONFIG_FILE));
    }
}
