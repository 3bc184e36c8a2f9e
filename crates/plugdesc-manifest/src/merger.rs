//! Command and permission merging
//!
//! Both maps are built in two phases: records found on other declarations
//! first, in declaration order, then the entry point's own records. A name
//! seen twice keeps the later record without any warning, so the entry point
//! always wins over external declarations.

use crate::document::{OrderedMap, Value};
use crate::errors::ManifestError;
use crate::scanner::{DeclarationHandle, DeclarationScanner};
use crate::types::{CommandSpec, Marker, PermissionDefault, PermissionSpec};
use tracing::debug;

/// Build the `commands` map
pub fn merge_commands<S: DeclarationScanner + ?Sized>(
    scanner: &S,
    entry: DeclarationHandle,
) -> Result<OrderedMap<Value>, ManifestError> {
    let mut commands = OrderedMap::new();

    let external = external_holders(scanner, entry, Marker::Commands, Marker::Command, |name| {
        ManifestError::InvalidCommandExecutor { name }
    })?;
    for handle in external {
        commands.extend(collect_commands(scanner, handle)?);
    }

    commands.extend(collect_commands(scanner, entry)?);
    debug!("Merged {} command(s)", commands.len());
    Ok(commands)
}

/// Build the `permissions` map
pub fn merge_permissions<S: DeclarationScanner + ?Sized>(
    scanner: &S,
    entry: DeclarationHandle,
) -> Result<OrderedMap<Value>, ManifestError> {
    let mut permissions = OrderedMap::new();

    let external = external_holders(
        scanner,
        entry,
        Marker::Permissions,
        Marker::Permission,
        |name| ManifestError::InvalidPermissionHolder { name },
    )?;
    for handle in external {
        permissions.extend(collect_permissions(scanner, handle)?);
    }

    permissions.extend(collect_permissions(scanner, entry)?);
    debug!("Merged {} permission(s)", permissions.len());
    Ok(permissions)
}

/// Descriptor entry for one command; blank fields are left out
pub fn command_entry(spec: &CommandSpec) -> OrderedMap<Value> {
    let mut entry = OrderedMap::new();

    match spec.aliases.as_slice() {
        [] => {}
        [alias] => {
            entry.insert("aliases", Value::from(alias.as_str()));
        }
        aliases => {
            entry.insert("aliases", Value::List(aliases.to_vec()));
        }
    }

    put_non_empty(&mut entry, "description", &spec.description);
    put_non_empty(&mut entry, "permission", &spec.permission);
    put_non_empty(&mut entry, "permission-message", &spec.permission_message);
    put_non_empty(&mut entry, "usage", &spec.usage);
    entry
}

/// Descriptor entry for one permission; `default: op` is implied and left out
pub fn permission_entry(spec: &PermissionSpec) -> OrderedMap<Value> {
    let mut entry = OrderedMap::new();

    put_non_empty(&mut entry, "description", &spec.description);

    if spec.default_value != PermissionDefault::Op {
        entry.insert("default", Value::from(spec.default_value.as_str()));
    }

    if !spec.children.is_empty() {
        let mut children = OrderedMap::new();
        for child in &spec.children {
            children.insert(&child.name, Value::Bool(child.inherit));
        }
        entry.insert("children", Value::Map(children));
    }

    entry
}

/// Declarations other than the entry point carrying `container` or `single`.
///
/// Every such declaration has to be a type; the first that is not aborts
/// the run.
fn external_holders<S, F>(
    scanner: &S,
    entry: DeclarationHandle,
    container: Marker,
    single: Marker,
    not_a_type: F,
) -> Result<Vec<DeclarationHandle>, ManifestError>
where
    S: DeclarationScanner + ?Sized,
    F: Fn(String) -> ManifestError,
{
    let mut handles = scanner.scan(container);
    handles.extend(scanner.scan(single));
    handles.sort_unstable();
    handles.dedup();

    let mut holders = Vec::with_capacity(handles.len());
    for handle in handles {
        let decl = scanner
            .declaration(handle)
            .ok_or(ManifestError::UnknownDeclaration(handle.index()))?;
        if !decl.kind.is_type() {
            return Err(not_a_type(decl.qualified_name.clone()));
        }
        if handle == entry {
            continue;
        }
        holders.push(handle);
    }
    Ok(holders)
}

fn collect_commands<S: DeclarationScanner + ?Sized>(
    scanner: &S,
    handle: DeclarationHandle,
) -> Result<OrderedMap<Value>, ManifestError> {
    let mut commands = OrderedMap::new();
    for record in scanner.read_repeated(handle, Marker::Command)? {
        let spec = CommandSpec::from_record(record)?;
        commands.insert(&spec.name, Value::Map(command_entry(&spec)));
    }
    Ok(commands)
}

fn collect_permissions<S: DeclarationScanner + ?Sized>(
    scanner: &S,
    handle: DeclarationHandle,
) -> Result<OrderedMap<Value>, ManifestError> {
    let mut permissions = OrderedMap::new();
    for record in scanner.read_repeated(handle, Marker::Permission)? {
        let spec = PermissionSpec::from_record(record)?;
        permissions.insert(&spec.name, Value::Map(permission_entry(&spec)));
    }
    Ok(permissions)
}

fn put_non_empty(entry: &mut OrderedMap<Value>, key: &str, value: &str) {
    if !value.is_empty() {
        entry.insert(key, Value::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::SnapshotScanner;
    use crate::types::{
        AnnotationRecord, AnnotationValue, ChildPermissionSpec, Declaration, DeclarationKind,
        DeclarationSnapshot, Enclosing,
    };
    use smallvec::smallvec;

    fn s(value: &str) -> AnnotationValue {
        AnnotationValue::Str(value.to_string())
    }

    fn command(name: &str, desc: &str) -> AnnotationRecord {
        AnnotationRecord::new(Marker::Command)
            .with("name", s(name))
            .with("desc", s(desc))
    }

    fn permission(name: &str, desc: &str) -> AnnotationRecord {
        AnnotationRecord::new(Marker::Permission)
            .with("name", s(name))
            .with("desc", s(desc))
    }

    fn container(marker: Marker, records: Vec<AnnotationRecord>) -> AnnotationRecord {
        AnnotationRecord::new(marker).with(
            "value",
            AnnotationValue::Array(records.into_iter().map(AnnotationValue::Nested).collect()),
        )
    }

    fn class(name: &str, annotations: Vec<AnnotationRecord>) -> Declaration {
        Declaration {
            qualified_name: name.to_string(),
            kind: DeclarationKind::Class,
            enclosing: Enclosing::Package("com.example".to_string()),
            modifiers: vec![],
            annotations,
        }
    }

    fn description_of<'a>(map: &'a OrderedMap<Value>, name: &str) -> Option<&'a str> {
        map.get(name)
            .and_then(Value::as_map)
            .and_then(|entry| entry.get("description"))
            .and_then(Value::as_str)
    }

    #[test]
    fn test_command_entry_omits_blank_fields() {
        let spec = CommandSpec {
            name: "fly".to_string(),
            aliases: smallvec!["f".to_string(), "flying".to_string()],
            ..Default::default()
        };
        let entry = command_entry(&spec);

        let keys: Vec<&str> = entry.keys().collect();
        assert_eq!(keys, vec!["aliases"]);
        assert_eq!(
            entry.get("aliases").and_then(Value::as_list),
            Some(&["f".to_string(), "flying".to_string()][..])
        );
    }

    #[test]
    fn test_single_alias_is_scalar() {
        let spec = CommandSpec {
            name: "fly".to_string(),
            aliases: smallvec!["f".to_string()],
            usage: "/fly".to_string(),
            permission: "fly.use".to_string(),
            permission_message: "no".to_string(),
            ..Default::default()
        };
        let entry = command_entry(&spec);
        assert_eq!(entry.get("aliases").and_then(Value::as_str), Some("f"));
        let keys: Vec<&str> = entry.keys().collect();
        assert_eq!(keys, vec!["aliases", "permission", "permission-message", "usage"]);
    }

    #[test]
    fn test_permission_entry_children_and_default() {
        let spec = PermissionSpec {
            name: "plugin.admin".to_string(),
            children: vec![ChildPermissionSpec {
                name: "plugin.admin.reload".to_string(),
                inherit: true,
            }],
            ..Default::default()
        };
        let entry = permission_entry(&spec);

        let keys: Vec<&str> = entry.keys().collect();
        assert_eq!(keys, vec!["children"]);
        let children = entry.get("children").and_then(Value::as_map);
        assert_eq!(children.map(OrderedMap::len), Some(1));
        assert_eq!(
            children.and_then(|c| c.get("plugin.admin.reload")).and_then(Value::as_bool),
            Some(true)
        );

        let not_op = PermissionSpec {
            name: "plugin.use".to_string(),
            default_value: PermissionDefault::NotOp,
            ..Default::default()
        };
        assert_eq!(
            permission_entry(&not_op).get("default").and_then(Value::as_str),
            Some("!op")
        );
    }

    #[test]
    fn test_entry_point_commands_win() {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                class(
                    "com.example.MyPlugin",
                    vec![
                        AnnotationRecord::new(Marker::Plugin),
                        container(Marker::Commands, vec![command("fly", "from main")]),
                    ],
                ),
                class(
                    "com.example.FlyExecutor",
                    vec![container(
                        Marker::Commands,
                        vec![command("fly", "from executor"), command("land", "down")],
                    )],
                ),
            ],
        });

        let commands = merge_commands(&scanner, DeclarationHandle::new(0));
        assert!(commands.is_ok());
        let commands = commands.unwrap_or_default();

        assert_eq!(commands.len(), 2);
        assert_eq!(description_of(&commands, "fly"), Some("from main"));
        assert_eq!(description_of(&commands, "land"), Some("down"));
        let keys: Vec<&str> = commands.keys().collect();
        assert_eq!(keys, vec!["fly", "land"]);
    }

    #[test]
    fn test_later_external_declaration_overwrites_earlier() {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                class("com.example.MyPlugin", vec![AnnotationRecord::new(Marker::Plugin)]),
                class("com.example.A", vec![command("home", "first")]),
                class("com.example.B", vec![command("home", "second")]),
            ],
        });

        let commands = merge_commands(&scanner, DeclarationHandle::new(0)).unwrap_or_default();
        assert_eq!(commands.len(), 1);
        assert_eq!(description_of(&commands, "home"), Some("second"));
    }

    #[test]
    fn test_command_on_non_type_aborts() {
        let mut method = class("com.example.MyPlugin#onFly", vec![command("fly", "")]);
        method.kind = DeclarationKind::Method;
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                class("com.example.MyPlugin", vec![AnnotationRecord::new(Marker::Plugin)]),
                method,
            ],
        });

        assert!(matches!(
            merge_commands(&scanner, DeclarationHandle::new(0)),
            Err(ManifestError::InvalidCommandExecutor { .. })
        ));
    }

    #[test]
    fn test_entry_point_permissions_win() {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                class(
                    "com.example.MyPlugin",
                    vec![
                        AnnotationRecord::new(Marker::Plugin),
                        permission("plugin.admin", "main"),
                    ],
                ),
                class(
                    "com.example.Perms",
                    vec![container(
                        Marker::Permissions,
                        vec![permission("plugin.admin", "external"), permission("plugin.use", "use")],
                    )],
                ),
            ],
        });

        let permissions = merge_permissions(&scanner, DeclarationHandle::new(0)).unwrap_or_default();
        assert_eq!(permissions.len(), 2);
        assert_eq!(description_of(&permissions, "plugin.admin"), Some("main"));
        assert_eq!(description_of(&permissions, "plugin.use"), Some("use"));
    }

    #[test]
    fn test_permission_on_field_aborts() {
        let mut field = class("com.example.MyPlugin#PERM", vec![permission("p", "")]);
        field.kind = DeclarationKind::Field;
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                class("com.example.MyPlugin", vec![AnnotationRecord::new(Marker::Plugin)]),
                field,
            ],
        });

        assert!(matches!(
            merge_permissions(&scanner, DeclarationHandle::new(0)),
            Err(ManifestError::InvalidPermissionHolder { .. })
        ));
    }

    #[test]
    fn test_no_declarations_gives_empty_maps() {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![class("com.example.MyPlugin", vec![AnnotationRecord::new(Marker::Plugin)])],
        });
        let entry = DeclarationHandle::new(0);
        assert!(merge_commands(&scanner, entry).is_ok_and(|m| m.is_empty()));
        assert!(merge_permissions(&scanner, entry).is_ok_and(|m| m.is_empty()));
    }

    #[test]
    fn test_malformed_container_aborts_instead_of_dropping() {
        let stray = permission("oops", "");
        let executor = class(
            "com.example.FlyExecutor",
            vec![AnnotationRecord::new(Marker::Commands).with(
                "value",
                AnnotationValue::Array(vec![
                    AnnotationValue::Nested(command("fly", "")),
                    AnnotationValue::Nested(stray),
                ]),
            )],
        );
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                class("com.example.MyPlugin", vec![AnnotationRecord::new(Marker::Plugin)]),
                executor,
            ],
        });

        assert!(matches!(
            merge_commands(&scanner, DeclarationHandle::new(0)),
            Err(ManifestError::InvalidValue { marker: Marker::Commands, .. })
        ));
    }

    #[test]
    fn test_holder_with_both_markers_is_visited_once() {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![
                class("com.example.MyPlugin", vec![AnnotationRecord::new(Marker::Plugin)]),
                class(
                    "com.example.Mixed",
                    vec![
                        command("home", "direct"),
                        container(Marker::Commands, vec![command("spawn", "wrapped")]),
                    ],
                ),
            ],
        });

        let handles = external_holders(
            &scanner,
            DeclarationHandle::new(0),
            Marker::Commands,
            Marker::Command,
            |name| ManifestError::InvalidCommandExecutor { name },
        )
        .unwrap_or_default();
        assert_eq!(handles, vec![DeclarationHandle::new(1)]);

        let commands = merge_commands(&scanner, DeclarationHandle::new(0)).unwrap_or_default();
        assert_eq!(commands.len(), 2);
        let keys: Vec<&str> = commands.keys().collect();
        assert_eq!(keys, vec!["home", "spawn"]);
    }

    #[test]
    fn test_bang_op_default_survives_merge() {
        let scanner = SnapshotScanner::new(DeclarationSnapshot {
            declarations: vec![class(
                "com.example.MyPlugin",
                vec![
                    AnnotationRecord::new(Marker::Plugin),
                    permission("plugin.guest", "").with("defaultValue", s("!op")),
                ],
            )],
        });

        let permissions = merge_permissions(&scanner, DeclarationHandle::new(0)).unwrap_or_default();
        let default = permissions
            .get("plugin.guest")
            .and_then(Value::as_map)
            .and_then(|entry| entry.get("default"))
            .and_then(Value::as_str);
        assert_eq!(default, Some("!op"));
    }
}
