//! Include/exclude policy applied to paths relative to the graph root

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{Result, VizualError};
use crate::model::FilterConfig;

/// Compiled include/exclude globs. Exclusion wins over inclusion.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl PathFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        Ok(PathFilter {
            include: build_set(&config.include_patterns)?,
            exclude: build_set(&config.exclude_patterns)?,
        })
    }

    /// Decide whether an entry at `relative` (forward slashes, no leading `/`) is kept.
    ///
    /// Directories are also tested as `relative/`, so `**/node_modules/**` rejects the
    /// `node_modules` folder itself and not only what is inside it.
    pub fn accepts(&self, relative: &str, is_dir: bool) -> bool {
        let with_slash = format!("{relative}/");
        let hits = |set: &GlobSet| set.is_match(relative) || (is_dir && set.is_match(&with_slash));

        if hits(&self.exclude) {
            return false;
        }
        hits(&self.include)
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder
        .build()
        .map_err(|e| VizualError::Configuration(format!("invalid glob set: {e}")))
}

fn compile(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| VizualError::Configuration(format!("invalid glob '{pattern}': {e}")))
}
