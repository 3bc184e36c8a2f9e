//! One-pass descriptor generation
//!
//! Validation, field extraction and merging all finish before anything is
//! written, so a failed run never leaves a partial `plugin.yml` behind.

use crate::diagnostics::{report, Messager};
use crate::document::{ManifestDocument, Value};
use crate::errors::ManifestError;
use crate::extractor::{FieldExtractor, DEFAULT_VERSION};
use crate::manifest_writer::{ManifestWriter, ARTIFACT_NAME};
use crate::merger::{merge_commands, merge_permissions};
use crate::scanner::DeclarationScanner;
use crate::types::Marker;
use crate::validator::validate_entry_point;
use std::path::PathBuf;
use tracing::{debug, info};

/// Identifier written into the header comment by default
pub const DEFAULT_TOOL_ID: &str = "plugdesc::Aggregator";

/// Knobs for a generation run
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Build output root the descriptor is written under
    pub output_root: PathBuf,
    pub artifact_name: String,
    pub default_version: String,
    pub tool_id: String,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        AggregatorOptions {
            output_root: PathBuf::from("."),
            artifact_name: ARTIFACT_NAME.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
            tool_id: DEFAULT_TOOL_ID.to_string(),
        }
    }
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No entry point in this round
    Skipped,
    Written(PathBuf),
}

pub struct Aggregator {
    options: AggregatorOptions,
}

impl Aggregator {
    pub fn new(options: AggregatorOptions) -> Self {
        Aggregator { options }
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.options.output_root.join(&self.options.artifact_name)
    }

    /// Writer stamped now, naming this run's tool id and artifact
    pub fn writer(&self) -> ManifestWriter {
        ManifestWriter::new(self.options.tool_id.as_str())
            .with_artifact_name(self.options.artifact_name.as_str())
    }

    /// Build the descriptor document without writing it.
    ///
    /// `Ok(None)` when the round has no entry point. Failures are reported
    /// through `messager` before being returned.
    pub fn assemble<S: DeclarationScanner + ?Sized>(
        &self,
        scanner: &S,
        messager: &mut dyn Messager,
    ) -> Result<Option<ManifestDocument>, ManifestError> {
        self.build_document(scanner)
            .map_err(|err| report(&mut *messager, err))
    }

    /// Full run: assemble, then write the artifact under the output root
    pub fn process<S: DeclarationScanner + ?Sized>(
        &self,
        scanner: &S,
        messager: &mut dyn Messager,
    ) -> Result<RunOutcome, ManifestError> {
        self.process_with_writer(scanner, messager, &self.writer())
    }

    pub fn process_with_writer<S: DeclarationScanner + ?Sized>(
        &self,
        scanner: &S,
        messager: &mut dyn Messager,
        writer: &ManifestWriter,
    ) -> Result<RunOutcome, ManifestError> {
        let Some(doc) = self.assemble(scanner, messager)? else {
            return Ok(RunOutcome::Skipped);
        };

        let path = self.artifact_path();
        writer
            .write_to_path(&doc, &path)
            .map_err(|err| report(&mut *messager, err))?;
        info!("Generated {:?}", path);
        Ok(RunOutcome::Written(path))
    }

    fn build_document<S: DeclarationScanner + ?Sized>(
        &self,
        scanner: &S,
    ) -> Result<Option<ManifestDocument>, ManifestError> {
        let candidates = scanner.scan(Marker::Plugin);
        let Some(entry) = validate_entry_point(scanner, &candidates)? else {
            return Ok(None);
        };
        let decl = scanner
            .declaration(entry)
            .ok_or(ManifestError::UnknownDeclaration(entry.index()))?;

        let mut doc = ManifestDocument::new();
        let extractor = FieldExtractor::new(scanner, entry, decl, &self.options.default_version);
        extractor.populate_metadata(&mut doc)?;

        doc.insert("commands", Value::Map(merge_commands(scanner, entry)?));
        doc.insert("permissions", Value::Map(merge_permissions(scanner, entry)?));

        extractor.populate_api_version(&mut doc)?;

        debug!(
            "Assembled descriptor for {} with {} top-level keys",
            decl.qualified_name,
            doc.len()
        );
        Ok(Some(doc))
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Aggregator::new(AggregatorOptions::default())
    }
}
