// file: src/exporter/json.rs
// description: json export of analysis, draft and search results

use crate::error::{PipelineError, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    pretty: bool,
}

/// Written next to the payload so results can be traced back to a run.
#[derive(Debug, Serialize)]
pub struct ExportEnvelope<'a, T: Serialize> {
    pub kind: &'a str,
    pub exported_at: String,
    pub source: Option<String>,
    pub payload: &'a T,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| PipelineError::FileOperation {
            path: output_dir.clone(),
            source: e,
        })?;
        Ok(Self {
            output_dir,
            pretty: true,
        })
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Serialize `payload` to `<output_dir>/<kind>_<stem>_<timestamp>.json`.
    pub fn export<T: Serialize>(
        &self,
        kind: &str,
        source: Option<&Path>,
        payload: &T,
    ) -> Result<PathBuf> {
        let now = Utc::now();
        let stem = source
            .and_then(|p| p.file_stem())
            .map(|s| sanitize(&s.to_string_lossy()))
            .unwrap_or_else(|| "result".to_string());
        let filename = format!("{}_{}_{}.json", kind, stem, now.format("%Y%m%dT%H%M%S"));
        let path = self.output_dir.join(filename);

        let envelope = ExportEnvelope {
            kind,
            exported_at: now.to_rfc3339(),
            source: source.map(|p| p.display().to_string()),
            payload,
        };
        let body = if self.pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };

        fs::write(&path, body).map_err(|e| PipelineError::FileOperation {
            path: path.clone(),
            source: e,
        })?;

        info!("Exported {} to {}", kind, path.display());
        Ok(path)
    }
}

fn sanitize(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
