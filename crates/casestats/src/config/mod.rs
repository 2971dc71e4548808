//! Location of the case store and of files written relative to the caller.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail, ensure};

/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "CASESTATS_LOG";
pub const DEFAULT_LOG_FILTER: &str = "casestats=info";

/// Store used when `--db` is not given, relative to the home directory.
const DEFAULT_STORE: &str = ".casestats/casestats.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// Base for relative output paths such as report snapshots.
    pub cwd: PathBuf,
    pub db_path: PathBuf,
}

impl RuntimePaths {
    /// Resolves overrides against `$HOME` and the process working directory.
    pub fn from_environment(
        home_override: Option<&Path>,
        cwd_override: Option<&Path>,
        db: Option<&Path>,
    ) -> Result<Self> {
        let home_dir = match home_override {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os("HOME")
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
        };
        let cwd = match cwd_override {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir().context("failed to read the working directory")?,
        };
        Self::resolve(&home_dir, &cwd, db)
    }

    /// `~/...` store paths expand against `home_dir`, other relative paths
    /// against `cwd`; `~user` is refused.
    pub fn resolve(home_dir: &Path, cwd: &Path, db: Option<&Path>) -> Result<Self> {
        ensure!(
            home_dir.is_absolute(),
            "home_dir must be absolute: {}",
            home_dir.display()
        );
        ensure!(cwd.is_absolute(), "cwd must be absolute: {}", cwd.display());

        let db_path = match db {
            None => home_dir.join(DEFAULT_STORE),
            Some(path) => match path.strip_prefix("~") {
                Ok(rest) => home_dir.join(rest),
                Err(_) if path.to_str().is_some_and(|raw| raw.starts_with('~')) => {
                    bail!("only `~` and `~/...` are expanded in store paths: {}", path.display())
                }
                Err(_) => cwd.join(path),
            },
        };

        Ok(Self {
            cwd: normalize_lexical(cwd),
            db_path: normalize_lexical(&db_path),
        })
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    path.components()
        .fold(PathBuf::new(), |mut normalized, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other),
            }
            normalized
        })
}
