//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::env;
use std::path::{Path, PathBuf};

/// Fallbacks used when a knob is absent from every config source.
pub mod defaults {
    pub const CHUNK_SIZE: usize = 800;
    pub const CHUNK_OVERLAP: usize = 200;
    pub const EMBED_DIM: usize = 256;
    pub const TOP_K: usize = 10;
    pub const INDEX_DIR: &str = "index";
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn chunk_size(&self) -> usize {
        self.get("chunking.chunk_size").unwrap_or(defaults::CHUNK_SIZE)
    }

    pub fn chunk_overlap(&self) -> usize {
        self.get("chunking.chunk_overlap").unwrap_or(defaults::CHUNK_OVERLAP)
    }

    pub fn embed_dim(&self) -> usize {
        self.get("embed.dim").unwrap_or(defaults::EMBED_DIM)
    }

    pub fn top_k(&self) -> usize {
        self.get("retrieval.top_k").unwrap_or(defaults::TOP_K)
    }

    pub fn index_dir(&self) -> PathBuf {
        let dir: String = self
            .get("data.index_dir")
            .unwrap_or_else(|_| defaults::INDEX_DIR.to_string());
        expand_path(dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
