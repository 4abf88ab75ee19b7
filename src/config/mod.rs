use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

use crate::resolve::{BindingPrecedence, FixedBindings};

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    /// Defaults, then the rc file at `config_path`, then environment variables.
    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    /// Override a key for this instance only (environment still wins).
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn staging_path(&self) -> PathBuf {
        self.get_path("DATASET_STAGING_PATH")
            .unwrap_or_else(|| env::temp_dir().join("chartexec").join("datasets"))
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "PYTHON_INTERPRETER",
        "EXECUTION_TIMEOUT",
        "MAX_PARALLEL_UNITS",
        "DATA_URL_PREFIX",
        "BINDING_PRECEDENCE",
        "TABULAR_MODULE",
        "TABULAR_ALIAS",
        "PLOT_MODULE",
        "PLOT_ALIAS",
        "DATASET_SYMBOL",
        "DATASET_STAGING_PATH",
        "RASTER_DPI",
    ];

    KEYS.contains(&k) || k.starts_with("CHARTEXEC_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("chartexec").join(".chartexecrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let temp = env::temp_dir().join("chartexec");

    // Paths
    m.insert(
        "DATASET_STAGING_PATH".into(),
        temp.join("datasets").to_string_lossy().into_owned(),
    );

    // Numbers
    m.insert("EXECUTION_TIMEOUT".into(), "60".into());
    m.insert("MAX_PARALLEL_UNITS".into(), "1".into());
    m.insert("RASTER_DPI".into(), "100".into());

    // Strings
    m.insert("PYTHON_INTERPRETER".into(), "python3".into());
    m.insert("DATA_URL_PREFIX".into(), "/files/data".into());
    m.insert("BINDING_PRECEDENCE".into(), "fixed".into());
    m.insert("TABULAR_MODULE".into(), "polars".into());
    m.insert("TABULAR_ALIAS".into(), "pl".into());
    m.insert("PLOT_MODULE".into(), "matplotlib.pyplot".into());
    m.insert("PLOT_ALIAS".into(), "plt".into());
    m.insert("DATASET_SYMBOL".into(), "data".into());

    m
}

/// Typed view of the keys the executor consumes.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub interpreter: PathBuf,
    /// `None` disables the wall-clock limit.
    pub timeout: Option<Duration>,
    pub max_parallel: usize,
    pub data_url_prefix: String,
    pub precedence: BindingPrecedence,
    pub fixed: FixedBindings,
    pub staging_path: PathBuf,
    pub dpi: u32,
}

impl ExecutorSettings {
    pub fn from_config(cfg: &Config) -> Self {
        let timeout = cfg
            .get("EXECUTION_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        let precedence = match cfg.get("BINDING_PRECEDENCE").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("explicit") => BindingPrecedence::ExplicitWins,
            _ => BindingPrecedence::FixedWins,
        };
        let fixed = FixedBindings {
            tabular_module: cfg.get("TABULAR_MODULE").unwrap_or_else(|| "polars".into()),
            tabular_alias: cfg.get("TABULAR_ALIAS").unwrap_or_else(|| "pl".into()),
            plot_module: cfg
                .get("PLOT_MODULE")
                .unwrap_or_else(|| "matplotlib.pyplot".into()),
            plot_alias: cfg.get("PLOT_ALIAS").unwrap_or_else(|| "plt".into()),
            dataset_symbol: cfg.get("DATASET_SYMBOL").unwrap_or_else(|| "data".into()),
        };

        Self {
            interpreter: cfg
                .get_path("PYTHON_INTERPRETER")
                .unwrap_or_else(|| Path::new("python3").to_path_buf()),
            timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
            max_parallel: cfg.get_usize("MAX_PARALLEL_UNITS").unwrap_or(1).max(1),
            data_url_prefix: cfg
                .get("DATA_URL_PREFIX")
                .unwrap_or_else(|| "/files/data".into()),
            precedence,
            fixed,
            staging_path: cfg.staging_path(),
            dpi: cfg
                .get("RASTER_DPI")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(100),
        }
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from_config(&Config::load())
    }
}
