//! Declaration and annotation types supplied by the host scanner
//!
//! A host toolchain hands over a `DeclarationSnapshot`: every declaration it
//! discovered together with the marker annotations attached to it. The typed
//! command and permission records further down are parsed from those
//! annotation records before they are merged into the manifest.

use crate::errors::ManifestError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// MARKERS
// =============================================================================

/// Annotation kinds recognised by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    Plugin,
    Description,
    LoadOrder,
    Author,
    Website,
    LogPrefix,
    Library,
    Dependency,
    SoftDependency,
    LoadBefore,
    Command,
    Commands,
    Permission,
    Permissions,
    ChildPermission,
    ApiVersion,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::Plugin => "Plugin",
            Marker::Description => "Description",
            Marker::LoadOrder => "LoadOrder",
            Marker::Author => "Author",
            Marker::Website => "Website",
            Marker::LogPrefix => "LogPrefix",
            Marker::Library => "Library",
            Marker::Dependency => "Dependency",
            Marker::SoftDependency => "SoftDependency",
            Marker::LoadBefore => "LoadBefore",
            Marker::Command => "Command",
            Marker::Commands => "Commands",
            Marker::Permission => "Permission",
            Marker::Permissions => "Permissions",
            Marker::ChildPermission => "ChildPermission",
            Marker::ApiVersion => "ApiVersion",
        }
    }

    /// Container marker that wraps repeated instances of this marker
    pub fn container(&self) -> Option<Marker> {
        match self {
            Marker::Command => Some(Marker::Commands),
            Marker::Permission => Some(Marker::Permissions),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DECLARATIONS
// =============================================================================

/// What kind of source element a declaration is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
    Method,
    Field,
    Constructor,
    Package,
}

impl DeclarationKind {
    /// Type declarations can hold command and permission containers
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Class
                | DeclarationKind::Interface
                | DeclarationKind::Enum
                | DeclarationKind::Annotation
                | DeclarationKind::Record
        )
    }

    /// Only concrete classes can be a plugin entry point
    pub fn is_class(&self) -> bool {
        matches!(self, DeclarationKind::Class | DeclarationKind::Record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
}

/// The element directly enclosing a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enclosing {
    Package(String),
    Type(String),
}

/// A single declaration as reported by the host scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub qualified_name: String,
    pub kind: DeclarationKind,
    pub enclosing: Enclosing,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
}

impl Declaration {
    /// Name after the last `.` of the qualified name
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or(self.qualified_name.as_str(), |(_, simple)| simple)
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_top_level(&self) -> bool {
        matches!(self.enclosing, Enclosing::Package(_))
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.annotations.iter().any(|a| a.marker == marker)
    }
}

/// Every declaration visible in one processing round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarationSnapshot {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl DeclarationSnapshot {
    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Append another snapshot's declarations after this one's
    pub fn append(&mut self, other: DeclarationSnapshot) {
        self.declarations.extend(other.declarations);
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// One annotation instance with its explicitly set fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub marker: Marker,
    #[serde(default)]
    pub fields: AHashMap<String, AnnotationValue>,
}

/// Annotation field value: scalar, array, or nested annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Bool(bool),
    Str(String),
    Array(Vec<AnnotationValue>),
    Nested(AnnotationRecord),
}

impl AnnotationValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl AnnotationRecord {
    pub fn new(marker: Marker) -> Self {
        AnnotationRecord {
            marker,
            fields: AHashMap::new(),
        }
    }

    /// Builder-style field setter, mostly for hosts assembling records in code
    pub fn with(mut self, field: &str, value: AnnotationValue) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn field(&self, field: &str) -> Option<&AnnotationValue> {
        self.fields.get(field)
    }

    /// String field; `Ok(None)` when unset
    pub fn str_field(&self, field: &str) -> Result<Option<&str>, ManifestError> {
        match self.fields.get(field) {
            None => Ok(None),
            Some(AnnotationValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(self.invalid(field, other)),
        }
    }

    /// String field that must be present
    pub fn required_str(&self, field: &str) -> Result<&str, ManifestError> {
        self.str_field(field)?
            .ok_or_else(|| ManifestError::MissingField {
                marker: self.marker,
                field: field.to_string(),
            })
    }

    pub fn bool_field(&self, field: &str) -> Result<Option<bool>, ManifestError> {
        match self.fields.get(field) {
            None => Ok(None),
            Some(AnnotationValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(field, other)),
        }
    }

    /// String-array field. A lone string counts as a one-element array,
    /// matching how annotation arrays accept a single element.
    pub fn strings_field(&self, field: &str) -> Result<Vec<String>, ManifestError> {
        match self.fields.get(field) {
            None => Ok(Vec::new()),
            Some(AnnotationValue::Str(s)) => Ok(vec![s.clone()]),
            Some(AnnotationValue::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(field, item))
                })
                .collect(),
            Some(other) => Err(self.invalid(field, other)),
        }
    }

    /// Nested-annotation-array field, keeping only records of `marker`
    pub fn records_field(
        &self,
        field: &str,
        marker: Marker,
    ) -> Result<Vec<&AnnotationRecord>, ManifestError> {
        let items: &[AnnotationValue] = match self.fields.get(field) {
            None => return Ok(Vec::new()),
            Some(AnnotationValue::Array(items)) => items,
            Some(single @ AnnotationValue::Nested(_)) => std::slice::from_ref(single),
            Some(other) => return Err(self.invalid(field, other)),
        };
        items
            .iter()
            .map(|item| match item {
                AnnotationValue::Nested(record) if record.marker == marker => Ok(record),
                other => Err(self.invalid(field, other)),
            })
            .collect()
    }

    fn invalid(&self, field: &str, value: &AnnotationValue) -> ManifestError {
        ManifestError::InvalidValue {
            marker: self.marker,
            field: field.to_string(),
            value: serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value)),
        }
    }
}

// =============================================================================
// TYPED METADATA
// =============================================================================

/// When the server should load the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrder {
    Startup,
    PostWorld,
}

impl LoadOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOrder::Startup => "STARTUP",
            LoadOrder::PostWorld => "POSTWORLD",
        }
    }
}

impl FromStr for LoadOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STARTUP" => Ok(LoadOrder::Startup),
            "POSTWORLD" => Ok(LoadOrder::PostWorld),
            other => Err(format!("unknown load order: {}", other)),
        }
    }
}

/// Who is granted a permission when nothing else says otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionDefault {
    True,
    False,
    #[default]
    Op,
    NotOp,
}

impl PermissionDefault {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionDefault::True => "true",
            PermissionDefault::False => "false",
            PermissionDefault::Op => "op",
            PermissionDefault::NotOp => "!op",
        }
    }
}

impl FromStr for PermissionDefault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `!` negates, so it survives normalization
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || *c == '!')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "true" => Ok(PermissionDefault::True),
            "false" => Ok(PermissionDefault::False),
            "op" => Ok(PermissionDefault::Op),
            "!op" | "notop" => Ok(PermissionDefault::NotOp),
            _ => Err(format!("unknown permission default: {}", s)),
        }
    }
}

/// A command declared through a `Command` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: SmallVec<[String; 2]>,
    pub description: String,
    pub permission: String,
    pub permission_message: String,
    pub usage: String,
}

impl CommandSpec {
    pub fn from_record(record: &AnnotationRecord) -> Result<Self, ManifestError> {
        Ok(CommandSpec {
            name: record.required_str("name")?.to_string(),
            aliases: record.strings_field("aliases")?.into_iter().collect(),
            description: record.str_field("desc")?.unwrap_or_default().to_string(),
            permission: record.str_field("permission")?.unwrap_or_default().to_string(),
            permission_message: record
                .str_field("permissionMessage")?
                .unwrap_or_default()
                .to_string(),
            usage: record.str_field("usage")?.unwrap_or_default().to_string(),
        })
    }
}

/// A child permission and whether it inherits the parent's grant
#[derive(Debug, Clone, PartialEq)]
pub struct ChildPermissionSpec {
    pub name: String,
    pub inherit: bool,
}

/// A permission declared through a `Permission` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PermissionSpec {
    pub name: String,
    pub description: String,
    pub default_value: PermissionDefault,
    pub children: Vec<ChildPermissionSpec>,
}

impl PermissionSpec {
    pub fn from_record(record: &AnnotationRecord) -> Result<Self, ManifestError> {
        let default_value = match record.str_field("defaultValue")? {
            None => PermissionDefault::default(),
            Some(raw) => raw.parse().map_err(|_| ManifestError::InvalidValue {
                marker: record.marker,
                field: "defaultValue".to_string(),
                value: raw.to_string(),
            })?,
        };

        let children = record
            .records_field("children", Marker::ChildPermission)?
            .into_iter()
            .map(|child| {
                Ok(ChildPermissionSpec {
                    name: child.required_str("name")?.to_string(),
                    inherit: child.bool_field("inherit")?.unwrap_or(true),
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        Ok(PermissionSpec {
            name: record.required_str("name")?.to_string(),
            description: record.str_field("desc")?.unwrap_or_default().to_string(),
            default_value,
            children,
        })
    }
}
