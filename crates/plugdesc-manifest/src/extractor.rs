//! Top-level metadata fields read from the entry-point declaration

use crate::document::{ManifestDocument, Value};
use crate::errors::ManifestError;
use crate::scanner::{DeclarationHandle, DeclarationScanner};
use crate::types::{AnnotationValue, Declaration, LoadOrder, Marker};

/// Placeholder written when the `Plugin` record sets no version
pub const DEFAULT_VERSION: &str = "v0.0";

/// Reads the scalar and repeated fields of one entry point
pub struct FieldExtractor<'a, S: DeclarationScanner + ?Sized> {
    scanner: &'a S,
    entry: DeclarationHandle,
    decl: &'a Declaration,
    default_version: &'a str,
}

impl<'a, S: DeclarationScanner + ?Sized> FieldExtractor<'a, S> {
    pub fn new(
        scanner: &'a S,
        entry: DeclarationHandle,
        decl: &'a Declaration,
        default_version: &'a str,
    ) -> Self {
        FieldExtractor {
            scanner,
            entry,
            decl,
            default_version,
        }
    }

    /// Insert `main` through `loadbefore`, in descriptor key order
    pub fn populate_metadata(&self, doc: &mut ManifestDocument) -> Result<(), ManifestError> {
        // main always tracks the real class name
        doc.insert("main", Value::from(self.decl.qualified_name.as_str()));

        let name = self
            .scalar(Marker::Plugin, "name")?
            .unwrap_or_else(|| self.decl.simple_name().to_string());
        doc.insert("name", Value::from(name));

        let version = self
            .scalar(Marker::Plugin, "version")?
            .unwrap_or_else(|| self.default_version.to_string());
        doc.insert("version", Value::from(version));

        self.put_scalar(doc, "description", Marker::Description)?;

        if let Some(raw) = self.scalar(Marker::LoadOrder, "value")? {
            let order: LoadOrder = raw.parse().map_err(|_| ManifestError::InvalidValue {
                marker: Marker::LoadOrder,
                field: "value".to_string(),
                value: raw.clone(),
            })?;
            doc.insert("load", Value::from(order.as_str()));
        }

        let mut authors = self.repeated(Marker::Author)?;
        match authors.len() {
            0 => {}
            1 => {
                doc.insert("author", Value::Str(authors.remove(0)));
            }
            _ => {
                doc.insert("authors", Value::List(authors));
            }
        }

        self.put_scalar(doc, "website", Marker::Website)?;
        self.put_scalar(doc, "prefix", Marker::LogPrefix)?;

        self.put_list(doc, "libraries", Marker::Library)?;
        self.put_list(doc, "depend", Marker::Dependency)?;
        self.put_list(doc, "softdepend", Marker::SoftDependency)?;
        self.put_list(doc, "loadbefore", Marker::LoadBefore)?;

        Ok(())
    }

    /// Insert `api-version` unless absent or left at `DEFAULT`
    pub fn populate_api_version(&self, doc: &mut ManifestDocument) -> Result<(), ManifestError> {
        let Some(target) = self.scalar(Marker::ApiVersion, "value")? else {
            return Ok(());
        };
        if let Some(version) = api_version_from_target(&target)? {
            doc.insert("api-version", Value::from(version));
        }
        Ok(())
    }

    /// Non-blank string field of the entry point's first `marker` record
    fn scalar(&self, marker: Marker, field: &str) -> Result<Option<String>, ManifestError> {
        match self.scanner.read_field(self.entry, marker, field) {
            None => Ok(None),
            Some(AnnotationValue::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(AnnotationValue::Str(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ManifestError::InvalidValue {
                marker,
                field: field.to_string(),
                value: format!("{:?}", other),
            }),
        }
    }

    /// `value` of every instance of a repeatable marker
    fn repeated(&self, marker: Marker) -> Result<Vec<String>, ManifestError> {
        self.scanner
            .read_repeated(self.entry, marker)?
            .into_iter()
            .map(|record| record.required_str("value").map(str::to_string))
            .collect()
    }

    fn put_scalar(
        &self,
        doc: &mut ManifestDocument,
        key: &str,
        marker: Marker,
    ) -> Result<(), ManifestError> {
        if let Some(value) = self.scalar(marker, "value")? {
            doc.insert(key, Value::from(value));
        }
        Ok(())
    }

    fn put_list(
        &self,
        doc: &mut ManifestDocument,
        key: &str,
        marker: Marker,
    ) -> Result<(), ManifestError> {
        let values = self.repeated(marker)?;
        if !values.is_empty() {
            doc.insert(key, Value::List(values));
        }
        Ok(())
    }
}

/// Map an API target constant to the version string the server expects.
///
/// `DEFAULT` yields `None`; `v1_13` becomes `1.13`; plain dotted versions
/// pass through.
pub fn api_version_from_target(target: &str) -> Result<Option<String>, ManifestError> {
    let trimmed = target.trim();
    if trimmed.eq_ignore_ascii_case("default") {
        return Ok(None);
    }

    let version = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .map_or_else(|| trimmed.to_string(), |rest| rest.replace('_', "."));

    let well_formed = !version.is_empty()
        && version.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())
        });
    if !well_formed {
        return Err(ManifestError::InvalidValue {
            marker: Marker::ApiVersion,
            field: "value".to_string(),
            value: target.to_string(),
        });
    }
    Ok(Some(version))
}
