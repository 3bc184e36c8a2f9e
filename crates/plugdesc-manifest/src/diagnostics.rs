//! Diagnostics channel back to the host
//!
//! Fatal problems are reported here as error-level messages, attributed to a
//! declaration when one is known, before the run returns its error.

use crate::errors::ManifestError;

/// Host-provided sink for error diagnostics
pub trait Messager {
    fn error(&mut self, message: &str, origin: Option<&str>);
}

/// A reported diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub origin: Option<String>,
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingMessager {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingMessager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl Messager for CollectingMessager {
    fn error(&mut self, message: &str, origin: Option<&str>) {
        self.diagnostics.push(Diagnostic {
            message: message.to_string(),
            origin: origin.map(str::to_string),
        });
    }
}

/// Send `err` through the diagnostics channel and hand it back
pub fn report(messager: &mut dyn Messager, err: ManifestError) -> ManifestError {
    messager.error(&err.to_string(), err.origin());
    err
}
