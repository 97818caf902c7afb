use serde_json::Value;

use crate::{
    artifact::{Artifact, Str},
    client::RestClient,
    config::EffectiveConfig,
    discovery::{ApiEndpoints, ResourceCatalog},
    error::{Error, Result},
    registry::ArtifactRegistry,
};

/// Resource name of the server-side template expansion endpoint. It shows up
/// in discovery like any other resource and is routed the same way.
const PROCESSED_TEMPLATES: &str = "processedtemplates";

/// Parses and validates raw manifests into an [`ArtifactRegistry`], expanding
/// templates through the cluster as it goes.
pub struct Processor<'a, C> {
    client: &'a C,
    config: &'a EffectiveConfig,
    endpoints: &'a ApiEndpoints,
    catalog: &'a ResourceCatalog,
}

impl<'a, C: RestClient> Processor<'a, C> {
    pub fn new(
        client: &'a C,
        config: &'a EffectiveConfig,
        endpoints: &'a ApiEndpoints,
        catalog: &'a ResourceCatalog,
    ) -> Self {
        Self {
            client,
            config,
            endpoints,
            catalog,
        }
    }

    /// Process manifests in input order. Templates never land in the registry
    /// themselves; only the objects their expansion returns do, keyed by
    /// their own kinds.
    #[tracing::instrument(skip_all)]
    pub async fn process<I, S, T>(&self, manifests: I) -> Result<ArtifactRegistry>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut registry = ArtifactRegistry::default();

        for (id, text) in manifests {
            let id = id.as_ref();
            tracing::debug!(artifact = id, "processing artifact");

            let artifact = Artifact::parse(id, text.as_ref())?;
            let resource = artifact.resource();
            if !self.catalog.supports(&resource) {
                return Err(Error::UnsupportedKind {
                    kind: artifact.kind().to_lowercase().to_string(),
                    artifact: id.into(),
                });
            }

            if artifact.kind().eq_ignore_ascii_case("template") {
                for object in self.expand_template(id, &artifact).await? {
                    registry.insert(object);
                }
            } else {
                registry.insert(artifact);
            }
        }

        Ok(registry)
    }

    /// Expand a template into concrete objects via a server round trip.
    /// Templates carry parameters which the cluster substitutes before
    /// returning the resulting objects.
    async fn expand_template(&self, id: &str, template: &Artifact) -> Result<Vec<Artifact>> {
        let namespace = template.namespace_or(&self.config.namespace);
        let group = self
            .catalog
            .group_for(PROCESSED_TEMPLATES)
            .ok_or_else(|| Error::UnsupportedKind {
                kind: PROCESSED_TEMPLATES.into(),
                artifact: id.into(),
            })?;
        let url = self.endpoints.url_for(
            group,
            namespace,
            PROCESSED_TEMPLATES,
            None,
            self.config.access_token.as_deref(),
        );

        let body = serde_json::to_value(template).map_err(|err| Error::MalformedArtifact {
            artifact: id.into(),
            reason: err.to_string(),
        })?;

        let res = self.client.post(&url, &body).await?;
        if res.status != 201 {
            return Err(Error::TemplateProcessingFailed {
                status: res.status,
                body: res.body_text(),
            });
        }

        let objects = match res.body {
            Some(Value::Object(mut root)) => match root.remove("objects") {
                Some(Value::Array(objects)) => objects,
                _ => {
                    return Err(Error::MalformedArtifact {
                        artifact: id.into(),
                        reason: "processed template has no objects list".into(),
                    });
                }
            },
            _ => {
                return Err(Error::MalformedArtifact {
                    artifact: id.into(),
                    reason: "processed template response is not a mapping".into(),
                });
            }
        };

        tracing::info!(
            template = template.name().map(Str::as_str).unwrap_or(id),
            objects = objects.len(),
            "template processed"
        );

        objects
            .into_iter()
            .enumerate()
            .map(|(i, object)| Artifact::from_value(&format!("{id}#objects[{i}]"), object))
            .collect()
    }
}
