//! The seam between the aggregator and the host's declaration discovery
//!
//! Hosts implement `DeclarationScanner` over whatever their build tooling
//! exposes. `SnapshotScanner` is the in-memory implementation backed by a
//! `DeclarationSnapshot`, used by the CLI and the tests.

use crate::errors::ManifestError;
use crate::types::{AnnotationRecord, AnnotationValue, Declaration, DeclarationSnapshot, Marker};
use tracing::debug;

/// Opaque reference to one declaration of a scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationHandle(usize);

impl DeclarationHandle {
    pub fn new(index: usize) -> Self {
        DeclarationHandle(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Read access to the declarations of one processing round
pub trait DeclarationScanner {
    /// Declarations carrying `marker` directly, in declaration order
    fn scan(&self, marker: Marker) -> Vec<DeclarationHandle>;

    fn declaration(&self, handle: DeclarationHandle) -> Option<&Declaration>;

    /// Every instance of a repeatable marker on a declaration, in
    /// declaration order. Instances wrapped in the marker's container are
    /// flattened in place; a container holding anything else is an error.
    fn read_repeated(
        &self,
        handle: DeclarationHandle,
        marker: Marker,
    ) -> Result<Vec<&AnnotationRecord>, ManifestError> {
        let Some(decl) = self.declaration(handle) else {
            return Ok(Vec::new());
        };
        let container = marker.container();
        let mut records = Vec::new();
        for annotation in &decl.annotations {
            if annotation.marker == marker {
                records.push(annotation);
            } else if Some(annotation.marker) == container {
                records.extend(annotation.records_field("value", marker)?);
            }
        }
        Ok(records)
    }

    /// First instance of `marker` on a declaration
    fn read_annotation(
        &self,
        handle: DeclarationHandle,
        marker: Marker,
    ) -> Option<&AnnotationRecord> {
        self.declaration(handle)?
            .annotations
            .iter()
            .find(|a| a.marker == marker)
    }

    fn read_field(
        &self,
        handle: DeclarationHandle,
        marker: Marker,
        field: &str,
    ) -> Option<&AnnotationValue> {
        self.read_annotation(handle, marker)?.field(field)
    }
}

/// Scanner over an in-memory declaration snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotScanner {
    snapshot: DeclarationSnapshot,
}

impl SnapshotScanner {
    pub fn new(snapshot: DeclarationSnapshot) -> Self {
        debug!(
            "Snapshot scanner created with {} declarations",
            snapshot.len()
        );
        SnapshotScanner { snapshot }
    }

    pub fn snapshot(&self) -> &DeclarationSnapshot {
        &self.snapshot
    }
}

impl DeclarationScanner for SnapshotScanner {
    fn scan(&self, marker: Marker) -> Vec<DeclarationHandle> {
        self.snapshot
            .declarations
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.has_marker(marker))
            .map(|(idx, _)| DeclarationHandle(idx))
            .collect()
    }

    fn declaration(&self, handle: DeclarationHandle) -> Option<&Declaration> {
        self.snapshot.declarations.get(handle.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeclarationKind, Enclosing};

    fn named(name: &str) -> AnnotationRecord {
        AnnotationRecord::new(Marker::Command)
            .with("name", AnnotationValue::Str(name.to_string()))
    }

    fn decl(name: &str, annotations: Vec<AnnotationRecord>) -> Declaration {
        Declaration {
            qualified_name: name.to_string(),
            kind: DeclarationKind::Class,
            enclosing: Enclosing::Package("com.example".to_string()),
            modifiers: vec![],
            annotations,
        }
    }

    #[test]
    fn test_scan_returns_declaration_order() {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                decl("com.example.A", vec![AnnotationRecord::new(Marker::Commands)]),
                decl("com.example.B", vec![]),
                decl("com.example.C", vec![AnnotationRecord::new(Marker::Commands)]),
            ],
        });

        let handles = scanner.scan(Marker::Commands);
        assert_eq!(handles, vec![DeclarationHandle::new(0), DeclarationHandle::new(2)]);
        assert!(scanner.scan(Marker::Plugin).is_empty());
    }

    #[test]
    fn test_read_repeated_flattens_container() {
        let container = AnnotationRecord::new(Marker::Commands).with(
            "value",
            AnnotationValue::Array(vec![
                AnnotationValue::Nested(named("b")),
                AnnotationValue::Nested(named("c")),
            ]),
        );
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![decl("com.example.A", vec![named("a"), container])],
        });

        let names: Vec<_> = scanner
            .read_repeated(DeclarationHandle::new(0), Marker::Command)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| r.field("name").and_then(AnnotationValue::as_str))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_read_field_of_missing_declaration() {
        let scanner = SnapshotScanner::default();
        assert!(scanner
            .read_field(DeclarationHandle::new(3), Marker::Plugin, "name")
            .is_none());
        assert!(scanner
            .read_repeated(DeclarationHandle::new(3), Marker::Author)
            .is_ok_and(|records| records.is_empty()));
    }

    #[test]
    fn test_read_repeated_rejects_foreign_record_in_container() {
        let stray = AnnotationRecord::new(Marker::Permission)
            .with("name", AnnotationValue::Str("oops".to_string()));
        let container = AnnotationRecord::new(Marker::Commands).with(
            "value",
            AnnotationValue::Array(vec![
                AnnotationValue::Nested(named("fly")),
                AnnotationValue::Nested(stray),
            ]),
        );
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![decl("com.example.A", vec![container])],
        });

        let result = scanner.read_repeated(DeclarationHandle::new(0), Marker::Command);
        assert!(matches!(
            result,
            Err(ManifestError::InvalidValue { marker: Marker::Commands, .. })
        ));
    }
}
