//! Plugin descriptor generation
//!
//! This crate turns the annotated declarations a host toolchain discovered
//! into a `plugin.yml` descriptor. Declarations come in through the
//! `DeclarationScanner` seam; the `Aggregator` validates the entry point,
//! extracts metadata fields, merges commands and permissions and writes the
//! serialized document under the build output root.

pub mod aggregator;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod extractor;
pub mod manifest_writer;
pub mod merger;
pub mod scanner;
pub mod types;
pub mod validator;

pub use aggregator::{Aggregator, AggregatorOptions, RunOutcome, DEFAULT_TOOL_ID};
pub use diagnostics::{CollectingMessager, Diagnostic, Messager};
pub use document::{ManifestDocument, OrderedMap, Value};
pub use errors::{EntryPointViolation, ManifestError};
pub use extractor::DEFAULT_VERSION;
pub use manifest_writer::{ManifestWriter, ARTIFACT_NAME};
pub use scanner::{DeclarationHandle, DeclarationScanner, SnapshotScanner};
pub use types::{
    AnnotationRecord, AnnotationValue, Declaration, DeclarationKind, DeclarationSnapshot,
    Enclosing, Marker, Modifier,
};
