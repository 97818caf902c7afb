use core::fmt;

use indexmap::IndexMap;

use crate::artifact::{Artifact, Str};

/// Parsed artifacts keyed by lowercase kind. Order within a kind is insertion
/// order and is the order objects are applied in; iteration order over kinds
/// is not part of the contract.
#[derive(Clone, Default)]
pub struct ArtifactRegistry {
    artifacts: IndexMap<Str, Vec<Artifact>>,
}

impl fmt::Debug for ArtifactRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.artifacts.iter().map(|(kind, list)| (kind, list.len())))
            .finish()
    }
}

impl ArtifactRegistry {
    pub fn insert(&mut self, artifact: Artifact) {
        let kind: Str = artifact.kind().to_lowercase().into();
        self.artifacts.entry(kind).or_default().push(artifact);
    }

    /// Total number of artifacts across all kinds.
    pub fn len(&self) -> usize {
        self.artifacts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn kinds(&self) -> impl ExactSizeIterator<Item = &Str> {
        self.artifacts.keys()
    }

    /// Artifacts registered under a kind, in insertion order. Lookup is by
    /// lowercase kind.
    pub fn get(&self, kind: &str) -> &[Artifact] {
        self.artifacts.get(kind).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Str, &[Artifact])> {
        self.artifacts
            .iter()
            .map(|(kind, list)| (kind, list.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(kind: &str, name: &str) -> Artifact {
        Artifact::parse(
            name,
            &format!("kind: {kind}\nmetadata:\n  name: {name}\n"),
        )
        .unwrap()
    }

    #[test]
    fn keys_are_lowercase_kinds() {
        let mut registry = ArtifactRegistry::default();
        registry.insert(artifact("Pod", "web"));
        registry.insert(artifact("pod", "db"));

        assert_eq!(registry.kinds().map(Str::as_str).collect::<Vec<_>>(), ["pod"]);
        assert_eq!(registry.get("pod").len(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn order_within_a_kind_is_insertion_order() {
        let mut registry = ArtifactRegistry::default();
        registry.insert(artifact("Service", "a"));
        registry.insert(artifact("Pod", "web"));
        registry.insert(artifact("Service", "b"));
        registry.insert(artifact("Service", "c"));

        let names: Vec<_> = registry
            .get("service")
            .iter()
            .filter_map(|a| a.name())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
