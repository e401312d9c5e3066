use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::Result;

///
/// One pipeline stage with declared inputs and outputs.
///
/// A stage is fresh when every output exists and none is older than any
/// input; fresh stages are skipped so an interrupted run resumes where it
/// stopped. Freshness is purely mtime-based — content-level caching (the
/// alignment library) is handled by its own digest.
///
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: &'static str,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

impl Stage {
    pub fn new(name: &'static str, inputs: Vec<PathBuf>, outputs: Vec<PathBuf>) -> Stage {
        Stage {
            name,
            inputs,
            outputs,
        }
    }

    pub fn is_fresh(&self) -> bool {
        let mtime = |path: &PathBuf| -> Option<SystemTime> {
            std::fs::metadata(path).and_then(|m| m.modified()).ok()
        };

        let mut oldest_output: Option<SystemTime> = None;
        for output in &self.outputs {
            match mtime(output) {
                Some(modified) => {
                    oldest_output = Some(oldest_output.map_or(modified, |o| o.min(modified)))
                }
                None => return false,
            }
        }
        let Some(oldest_output) = oldest_output else {
            return false;
        };

        match self.inputs.iter().filter_map(mtime).max() {
            Some(newest_input) => newest_input <= oldest_output,
            None => true,
        }
    }

    /// Run `work` unless the stage is fresh (or `force` it). Returns whether
    /// the stage actually ran.
    pub fn run<F>(&self, force: bool, work: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        if !force && self.is_fresh() {
            return Ok(false);
        }
        for output in &self.outputs {
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        work()?;
        Ok(true)
    }
}
