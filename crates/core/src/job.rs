//! [`CompileJob`]: the input to batch mode, independent of how it is
//! eventually dispatched (remote worker or local fallback).

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct CompileJob {
    pub job_id: String,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub compiler: String,
    pub args: Vec<String>,
    pub include_paths: Vec<String>,
    pub defines: Vec<String>,
}

impl CompileJob {
    pub fn source_basename(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.to_string_lossy().into_owned())
    }
}
