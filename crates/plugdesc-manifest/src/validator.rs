//! Entry-point validation

use crate::errors::{EntryPointViolation, ManifestError};
use crate::scanner::{DeclarationHandle, DeclarationScanner};
use crate::types::{Declaration, Modifier};
use tracing::debug;

/// Pick the single entry point out of the `Plugin`-marked declarations.
///
/// `Ok(None)` means no entry point in this round, which is not an error:
/// multi-round builds only see the marker in one of their rounds.
pub fn validate_entry_point<S: DeclarationScanner + ?Sized>(
    scanner: &S,
    candidates: &[DeclarationHandle],
) -> Result<Option<DeclarationHandle>, ManifestError> {
    let handle = match candidates {
        [] => {
            debug!("No plugin main class in this round");
            return Ok(None);
        }
        [handle] => *handle,
        _ => return Err(ManifestError::MultipleEntryPoints(candidates.len())),
    };

    let decl = scanner
        .declaration(handle)
        .ok_or(ManifestError::UnknownDeclaration(handle.index()))?;

    if let Some(reason) = violation(decl) {
        return Err(ManifestError::InvalidEntryPoint {
            name: decl.qualified_name.clone(),
            reason,
        });
    }

    debug!("Plugin main class: {}", decl.qualified_name);
    Ok(Some(handle))
}

fn violation(decl: &Declaration) -> Option<EntryPointViolation> {
    if !decl.kind.is_class() {
        Some(EntryPointViolation::NotAClass)
    } else if !decl.is_top_level() {
        Some(EntryPointViolation::NotTopLevel)
    } else if decl.has_modifier(Modifier::Static) {
        Some(EntryPointViolation::StaticNested)
    } else if decl.has_modifier(Modifier::Abstract) {
        Some(EntryPointViolation::Abstract)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::SnapshotScanner;
    use crate::types::{AnnotationRecord, DeclarationKind, DeclarationSnapshot, Enclosing, Marker};

    fn plugin_decl(kind: DeclarationKind, enclosing: Enclosing, modifiers: Vec<Modifier>) -> Declaration {
        Declaration {
            qualified_name: "com.example.MyPlugin".to_string(),
            kind,
            enclosing,
            modifiers,
            annotations: vec![AnnotationRecord::new(Marker::Plugin)],
        }
    }

    fn package() -> Enclosing {
        Enclosing::Package("com.example".to_string())
    }

    fn check(decl: Declaration) -> Result<Option<DeclarationHandle>, ManifestError> {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![decl],
        });
        let candidates = scanner.scan(Marker::Plugin);
        validate_entry_point(&scanner, &candidates)
    }

    fn reason_of(result: Result<Option<DeclarationHandle>, ManifestError>) -> Option<EntryPointViolation> {
        match result {
            Err(ManifestError::InvalidEntryPoint { reason, .. }) => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn test_empty_round_is_not_an_error() {
        let scanner = SnapshotScanner::default();
        assert!(matches!(validate_entry_point(&scanner, &[]), Ok(None)));
    }

    #[test]
    fn test_more_than_one_entry_point() {
        let scanner = SnapshotScanner::default();
        let candidates = [DeclarationHandle::new(0), DeclarationHandle::new(1)];
        assert!(matches!(
            validate_entry_point(&scanner, &candidates),
            Err(ManifestError::MultipleEntryPoints(2))
        ));
    }

    #[test]
    fn test_valid_entry_point() {
        let result = check(plugin_decl(DeclarationKind::Class, package(), vec![Modifier::Public]));
        assert!(matches!(result, Ok(Some(h)) if h.index() == 0));
    }

    #[test]
    fn test_interface_is_not_a_class() {
        let result = check(plugin_decl(DeclarationKind::Interface, package(), vec![]));
        assert_eq!(reason_of(result), Some(EntryPointViolation::NotAClass));
    }

    #[test]
    fn test_method_is_not_a_class() {
        let result = check(plugin_decl(DeclarationKind::Method, package(), vec![]));
        assert_eq!(reason_of(result), Some(EntryPointViolation::NotAClass));
    }

    #[test]
    fn test_nested_class_rejected() {
        let enclosing = Enclosing::Type("com.example.Outer".to_string());
        let result = check(plugin_decl(DeclarationKind::Class, enclosing, vec![]));
        assert_eq!(reason_of(result), Some(EntryPointViolation::NotTopLevel));
    }

    #[test]
    fn test_static_rejected() {
        let result = check(plugin_decl(DeclarationKind::Class, package(), vec![Modifier::Static]));
        assert_eq!(reason_of(result), Some(EntryPointViolation::StaticNested));
    }

    #[test]
    fn test_abstract_rejected() {
        let result = check(plugin_decl(
            DeclarationKind::Class,
            package(),
            vec![Modifier::Public, Modifier::Abstract],
        ));
        assert_eq!(reason_of(result), Some(EntryPointViolation::Abstract));
    }

    #[test]
    fn test_dangling_handle() {
        let scanner = SnapshotScanner::default();
        assert!(matches!(
            validate_entry_point(&scanner, &[DeclarationHandle::new(7)]),
            Err(ManifestError::UnknownDeclaration(7))
        ));
    }
}
