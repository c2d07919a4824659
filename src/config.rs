use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "hookshot.yaml";

/// Rules for the built-in PreToolUse guard.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Substrings that block a Bash command when present in it.
    pub blocked_commands: Vec<String>,
    /// Glob patterns for paths Edit/Write must not touch.
    pub protected_paths: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            blocked_commands: vec!["rm -rf /".to_string()],
            protected_paths: Vec::new(),
        }
    }
}

/// Where (and whether) to record hook events per session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionLogConfig {
    pub enabled: bool,
    /// Defaults to `$XDG_DATA_HOME/hookshot/sessions`.
    pub dir: Option<PathBuf>,
}

impl SessionLogConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            let data_home = std::env::var("XDG_DATA_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                    PathBuf::from(home).join(".local/share")
                });
            data_home.join("hookshot").join("sessions")
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookshotConfig {
    pub guard: GuardConfig,
    pub session_log: SessionLogConfig,
}

impl HookshotConfig {
    /// Resolve and load the config: `$HOOKSHOT_CONFIG`, then `./hookshot.yaml`,
    /// then `$XDG_CONFIG_HOME/hookshot/hookshot.yaml`. No file means defaults.
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var("HOOKSHOT_CONFIG") {
            return Self::load_from(Path::new(&explicit));
        }

        let local = PathBuf::from(CONFIG_FILENAME);
        if local.exists() {
            return Self::load_from(&local);
        }

        let xdg = xdg_config_path();
        if xdg.exists() {
            return Self::load_from(&xdg);
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: HookshotConfig = serde_yaml::from_str(content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for pattern in &self.guard.protected_paths {
            if glob::Pattern::new(pattern).is_err() {
                bail!(
                    "Invalid config at {}: bad glob pattern '{}' in guard.protected_paths",
                    path.display(),
                    pattern
                );
            }
        }
        for blocked in &self.guard.blocked_commands {
            if blocked.is_empty() {
                bail!(
                    "Invalid config at {}: empty entry in guard.blocked_commands",
                    path.display()
                );
            }
        }
        Ok(())
    }
}

fn xdg_config_path() -> PathBuf {
    let xdg_config = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    xdg_config.join("hookshot").join(CONFIG_FILENAME)
}
