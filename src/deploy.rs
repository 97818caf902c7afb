use crate::{
    artifact::{Artifact, Str, kind_to_resource},
    client::RestClient,
    config::EffectiveConfig,
    discovery::{ApiEndpoints, ResourceCatalog},
    error::{Error, Result},
    registry::ArtifactRegistry,
};

/// What happened (or, in dry-run mode, would have happened) to one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedObject {
    pub kind: Str,
    pub name: Option<Str>,
    pub url: String,
    /// False when the request was skipped by dry-run.
    pub applied: bool,
}

/// Applies (or deletes) every artifact in a registry, one blocking request at
/// a time. The first rejected object aborts the pass; objects already applied
/// are not rolled back.
pub struct Deployer<'a, C> {
    client: &'a C,
    config: &'a EffectiveConfig,
    endpoints: &'a ApiEndpoints,
    catalog: &'a ResourceCatalog,
    dry_run: bool,
}

impl<'a, C: RestClient> Deployer<'a, C> {
    pub fn new(
        client: &'a C,
        config: &'a EffectiveConfig,
        endpoints: &'a ApiEndpoints,
        catalog: &'a ResourceCatalog,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            config,
            endpoints,
            catalog,
            dry_run,
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn deploy(&self, registry: &ArtifactRegistry) -> Result<Vec<DeployedObject>> {
        let mut outcome = Vec::with_capacity(registry.len());

        for (kind, artifacts) in registry.iter() {
            for artifact in artifacts {
                let url = self.object_url(kind, artifact, None)?;

                if self.dry_run {
                    tracing::info!(%url, "DRY-RUN");
                    outcome.push(self.record(kind, artifact, url, false));
                    continue;
                }

                let body =
                    serde_json::to_value(artifact).map_err(|err| Error::MalformedArtifact {
                        artifact: kind.to_string(),
                        reason: err.to_string(),
                    })?;
                let res = self.client.post(&url, &body).await?;
                if res.status != 201 {
                    return Err(Error::DeploymentFailed {
                        url,
                        status: res.status,
                        body: res.body_text(),
                    });
                }

                tracing::info!(
                    name = artifact.name().map(Str::as_str).unwrap_or_default(),
                    "object successfully deployed"
                );
                outcome.push(self.record(kind, artifact, url, true));
            }
        }

        Ok(outcome)
    }

    /// Delete every artifact in the registry by name. An artifact without a
    /// `metadata.name` cannot be addressed.
    #[tracing::instrument(skip_all)]
    pub async fn undeploy(&self, registry: &ArtifactRegistry) -> Result<Vec<DeployedObject>> {
        let mut outcome = Vec::with_capacity(registry.len());

        for (kind, artifacts) in registry.iter() {
            for artifact in artifacts {
                let name = artifact.name().ok_or_else(|| Error::MalformedArtifact {
                    artifact: kind.to_string(),
                    reason: "object has no metadata.name to address it by".into(),
                })?;
                let url = self.object_url(kind, artifact, Some(name))?;

                if self.dry_run {
                    tracing::info!(%url, "DRY-RUN");
                    outcome.push(self.record(kind, artifact, url, false));
                    continue;
                }

                let res = self.client.delete(&url).await?;
                if res.status != 200 {
                    return Err(Error::DeploymentFailed {
                        url,
                        status: res.status,
                        body: res.body_text(),
                    });
                }

                tracing::info!(name = name.as_str(), "object deleted");
                outcome.push(self.record(kind, artifact, url, true));
            }
        }

        Ok(outcome)
    }

    fn object_url(&self, kind: &str, artifact: &Artifact, name: Option<&str>) -> Result<String> {
        let namespace = artifact.namespace_or(&self.config.namespace);
        let resource = kind_to_resource(kind);
        // Processing already rejected unknown kinds, but registries can be
        // handed in directly.
        let group = self
            .catalog
            .group_for(&resource)
            .ok_or_else(|| Error::UnsupportedKind {
                kind: kind.into(),
                artifact: artifact.name().map_or_else(String::new, Str::to_string),
            })?;
        Ok(self.endpoints.url_for(
            group,
            namespace,
            &resource,
            name,
            self.config.access_token.as_deref(),
        ))
    }

    fn record(
        &self,
        kind: &Str,
        artifact: &Artifact,
        url: String,
        applied: bool,
    ) -> DeployedObject {
        DeployedObject {
            kind: kind.clone(),
            name: artifact.name().cloned(),
            url,
            applied,
        }
    }
}
