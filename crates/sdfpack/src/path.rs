//! Filesystem and environment expansion rules shared by CLI handles and
//! repository lookups so both agree on how to locate asset packs. CLI code
//! hands user input to `PathResolver` before the repository searches its
//! roots.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::BaseDirs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PathResolver {
    cwd: PathBuf,
}

impl PathResolver {
    pub fn new() -> Result<Self> {
        let cwd = env::current_dir().context("failed to resolve current working directory")?;
        Ok(Self { cwd })
    }

    pub fn with_cwd<P: Into<PathBuf>>(cwd: P) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Expands `~` and `$VAR` references in a user-supplied pack path.
    pub fn expand_path(&self, input: &str) -> Result<PathBuf> {
        let expanded = expand_home(&expand_env_vars(input)?)?;
        let path = PathBuf::from(expanded);
        debug!(original = %input, expanded = %path.display(), "expanded pack path");
        Ok(path)
    }

    /// Resolves a local pack path, preferring working-directory candidates
    /// when they exist.
    pub fn normalize_local_path(&self, input: &str) -> Result<PathBuf> {
        let expanded = self.expand_path(input)?;
        if expanded.is_absolute() {
            return Ok(expanded);
        }
        if expanded.as_os_str().is_empty() {
            anyhow::bail!("local pack path must not be empty");
        }

        let candidate = self.cwd.join(&expanded);
        if candidate.exists() {
            debug!(original = %input, normalized = %candidate.display(), "using cwd pack path");
            return Ok(candidate);
        }
        Ok(expanded)
    }
}

fn expand_home(input: &str) -> Result<String> {
    if !input.starts_with('~') {
        return Ok(input.to_string());
    }

    let base_dirs =
        BaseDirs::new().ok_or_else(|| anyhow!("unable to determine home directory"))?;
    let home = base_dirs.home_dir();

    match input.strip_prefix('~') {
        Some("") => Ok(home.to_string_lossy().into_owned()),
        Some(rest) if rest.starts_with('/') => {
            Ok(home.join(&rest[1..]).to_string_lossy().into_owned())
        }
        _ => anyhow::bail!("user-specific home expansion ('{input}') is not supported"),
    }
}

fn expand_env_vars(input: &str) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            output.push(ch);
            continue;
        }
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '_' || c.is_ascii_alphanumeric() {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            output.push('$');
            continue;
        }
        let value =
            env::var(&name).map_err(|_| anyhow!("environment variable '{name}' is not set"))?;
        output.push_str(&value);
    }

    Ok(output)
}
