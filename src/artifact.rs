use compact_str::{CompactString, format_compact};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub type Str = CompactString;

pub type AnyObject = serde_json::Map<String, Value>;

/// Converts a kind to its plural resource name, with the same logic as the
/// cluster's own REST mapper.
///
/// Example:
///     Pod -> pods
///     Policy -> policies
///     BuildConfig -> buildconfigs
///
/// Irregular plurals beyond the `status` -> `statuses` case are deliberately
/// not handled, matching the cluster convention.
pub fn kind_to_resource(kind: &str) -> Str {
    let singular = kind.to_lowercase();
    if singular.ends_with("status") {
        format_compact!("{singular}es")
    } else if singular.ends_with('s') {
        singular.into()
    } else if let Some(stem) = singular.strip_suffix('y') {
        format_compact!("{stem}ies")
    } else {
        format_compact!("{singular}s")
    }
}

/// One structured manifest object. Only the fields this engine contractually
/// needs are typed; everything else rides along untouched and round-trips
/// back to the cluster as-is.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Artifact {
    kind: Str,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,
    #[serde(flatten)]
    rest: AnyObject,
}

impl Artifact {
    /// Parse manifest text into an artifact. `id` identifies the source
    /// manifest in errors.
    pub fn parse(id: &str, text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text).map_err(|source| Error::Parse {
            artifact: id.into(),
            source,
        })?;
        Self::from_value(id, value)
    }

    /// Interpret an already-structured object, e.g. one returned by template
    /// expansion.
    pub fn from_value(id: &str, value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(Error::MalformedArtifact {
                artifact: id.into(),
                reason: "not a mapping".into(),
            });
        };

        if !root.contains_key("kind") {
            return Err(Error::InvalidArtifact(id.into()));
        }

        serde_json::from_value(Value::Object(root)).map_err(|err| Error::MalformedArtifact {
            artifact: id.into(),
            reason: err.to_string(),
        })
    }

    pub fn kind(&self) -> &Str {
        &self.kind
    }

    /// The plural resource name for this artifact's kind.
    pub fn resource(&self) -> Str {
        kind_to_resource(&self.kind)
    }

    pub fn name(&self) -> Option<&Str> {
        self.metadata.name.as_ref()
    }

    /// The namespace the artifact itself declares, else `default`.
    pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.metadata
            .namespace
            .as_deref()
            .unwrap_or(default)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Str>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.namespace.is_none() && self.rest.is_empty()
    }
}
