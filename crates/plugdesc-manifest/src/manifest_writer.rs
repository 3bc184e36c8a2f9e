//! Descriptor serialization
//!
//! The document is rendered to block-style YAML in memory first, so a
//! serialization failure never touches the output directory. The file itself
//! is written to a temp path and renamed into place.

use crate::document::ManifestDocument;
use crate::errors::ManifestError;
use chrono::NaiveDateTime;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// File name of the generated descriptor
pub const ARTIFACT_NAME: &str = "plugin.yml";

/// Format of the generation timestamp in the header comment
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Renders and writes one descriptor
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    tool_id: String,
    artifact_name: String,
    generated_at: NaiveDateTime,
}

impl ManifestWriter {
    /// Writer stamped with the current local time
    pub fn new(tool_id: impl Into<String>) -> Self {
        ManifestWriter {
            tool_id: tool_id.into(),
            artifact_name: ARTIFACT_NAME.to_string(),
            generated_at: chrono::Local::now().naive_local(),
        }
    }

    /// File name named in the header comment
    pub fn with_artifact_name(mut self, artifact_name: impl Into<String>) -> Self {
        self.artifact_name = artifact_name.into();
        self
    }

    /// Pin the header timestamp
    pub fn with_timestamp(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn header(&self) -> String {
        format!(
            "# Auto-generated {}, generated at {} by {}\n\n",
            self.artifact_name,
            self.generated_at.format(TIMESTAMP_FORMAT),
            self.tool_id
        )
    }

    /// Header comment followed by the YAML body
    pub fn render(&self, doc: &ManifestDocument) -> Result<String, ManifestError> {
        let body = serde_yaml::to_string(doc)?;
        let mut out = self.header();
        out.push_str(&body);
        Ok(out)
    }

    /// Render `doc` and atomically replace `output_path` with it
    pub fn write_to_path(
        &self,
        doc: &ManifestDocument,
        output_path: &Path,
    ) -> Result<(), ManifestError> {
        debug!("Writing descriptor to: {:?}", output_path);
        let content = self.render(doc)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = output_path.with_extension("yml.tmp");
        if let Err(e) = write_file(&temp_path, &content) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, output_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        info!(
            "Descriptor written to {:?} ({} top-level keys)",
            output_path,
            doc.len()
        );
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes())?;
    writer.flush()
}
