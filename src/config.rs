use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::document::DEFAULT_LANG_ID;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub lang: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub perf: bool,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            lang: other.lang.clone().or_else(|| self.lang.clone()),
            cache_dir: other.cache_dir.clone().or_else(|| self.cache_dir.clone()),
            workers: other.workers.or(self.workers),
            perf: self.perf || other.perf,
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Language preferences, most preferred first.
    ///
    /// An explicit `--lang` wins, then the locale environment, then the
    /// built-in default.
    pub fn language_preferences(&self) -> Vec<String> {
        let env = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok());
        language_preferences_from(self.lang.as_deref(), env)
    }
}

fn language_preferences_from(
    explicit: Option<&str>,
    env: impl IntoIterator<Item = String>,
) -> Vec<String> {
    let mut prefs: Vec<String> = Vec::new();
    let candidates = explicit
        .map(ToOwned::to_owned)
        .into_iter()
        .chain(env.into_iter().filter(|v| !v.is_empty() && v != "C" && v != "POSIX"))
        .chain(std::iter::once(DEFAULT_LANG_ID.to_string()));
    for candidate in candidates {
        if !prefs.contains(&candidate) {
            prefs.push(candidate);
        }
    }
    prefs
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("swipe-list").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("swipe-list")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("swipe-list").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("swipe-list")
                .join("config");
        }
    }

    PathBuf::from(".swipelistrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".swipelistrc")
}

/// Directory prefetched resources are cached in when none is configured.
pub fn default_cache_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Caches")
                .join("swipe-list");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME") {
            return PathBuf::from(xdg).join("swipe-list");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".cache").join("swipe-list");
        }
    }

    std::env::temp_dir().join("swipe-list")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# swipe-list defaults (saved with --save)".to_string());
    if let Some(lang) = &flags.lang {
        lines.push(format!("--lang {lang}"));
    }
    if let Some(dir) = &flags.cache_dir {
        lines.push(format!("--cache-dir {}", dir.display()));
    }
    if let Some(workers) = flags.workers {
        lines.push(format!("--workers {workers}"));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--perf" {
            flags.perf = true;
        } else if let Some((name, value)) = token.split_once('=') {
            apply_valued_flag(&mut flags, name, value);
        } else if is_valued_flag(token) {
            if let Some(next) = tokens.get(i + 1) {
                apply_valued_flag(&mut flags, token, next);
                i += 1;
            }
        }
        i += 1;
    }
    flags
}

fn is_valued_flag(token: &str) -> bool {
    matches!(
        token,
        "--lang" | "--cache-dir" | "--workers" | "--render-debug-log"
    )
}

fn apply_valued_flag(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--lang" => flags.lang = Some(value.to_string()),
        "--cache-dir" => flags.cache_dir = Some(PathBuf::from(value)),
        "--workers" => flags.workers = value.parse().ok().filter(|n| *n > 0),
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}
