pub mod artifact;
pub mod client;
pub mod config;
pub mod deploy;
pub mod discovery;
pub mod error;
pub mod process;
pub mod registry;

pub use self::{
    artifact::{Artifact, Metadata, Str, kind_to_resource},
    client::{ClientOptions, HttpClient, Response, RestClient},
    config::{Answers, EffectiveConfig, Kubeconfig},
    deploy::{DeployedObject, Deployer},
    discovery::{ApiEndpoints, ApiGroup, ResourceCatalog},
    error::{Error, Result},
    process::Processor,
    registry::ArtifactRegistry,
};

/// One end-to-end invocation against a single cluster endpoint. Construction
/// resolves configuration and discovers resource ownership; the session is
/// immutable afterwards and everything downstream borrows from it.
#[derive(Debug)]
pub struct Session<C> {
    client: C,
    config: EffectiveConfig,
    endpoints: ApiEndpoints,
    catalog: ResourceCatalog,
}

impl<C: RestClient> Session<C> {
    #[tracing::instrument(skip_all)]
    pub async fn init(
        client: C,
        answers: &Answers,
        kubeconfig: Option<&Kubeconfig>,
    ) -> Result<Self> {
        let config = EffectiveConfig::resolve(answers, kubeconfig)?;
        let endpoints = ApiEndpoints::new(&config.endpoint);
        tracing::debug!(
            core = endpoints.base(ApiGroup::Core),
            extended = endpoints.base(ApiGroup::Extended),
            "api endpoints"
        );

        let catalog = ResourceCatalog::discover(&client, &endpoints).await?;

        Ok(Self {
            client,
            config,
            endpoints,
            catalog,
        })
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Parse, validate and template-expand raw manifests in input order.
    pub async fn process<I, S, T>(&self, manifests: I) -> Result<ArtifactRegistry>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Processor::new(&self.client, &self.config, &self.endpoints, &self.catalog)
            .process(manifests)
            .await
    }

    /// Apply every artifact in the registry. With `dry_run` no request is
    /// made; the would-be URLs are still reported.
    pub async fn deploy(
        &self,
        registry: &ArtifactRegistry,
        dry_run: bool,
    ) -> Result<Vec<DeployedObject>> {
        Deployer::new(
            &self.client,
            &self.config,
            &self.endpoints,
            &self.catalog,
            dry_run,
        )
        .deploy(registry)
        .await
    }

    /// Delete every artifact in the registry by name.
    pub async fn undeploy(
        &self,
        registry: &ArtifactRegistry,
        dry_run: bool,
    ) -> Result<Vec<DeployedObject>> {
        Deployer::new(
            &self.client,
            &self.config,
            &self.endpoints,
            &self.catalog,
            dry_run,
        )
        .undeploy(registry)
        .await
    }
}
