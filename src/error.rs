use thiserror::Error;

use crate::discovery::ApiGroup;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a deployment session can fail. All variants are terminal for the
/// session; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The answers source and the cluster config file disagree on a resolved
    /// field.
    #[error(
        "conflicting values for `{field}`: answers has `{answers}`, cluster config has `{config}`"
    )]
    ConfigConflict {
        field: &'static str,
        answers: String,
        config: String,
    },

    /// The cluster config file's context/cluster/user chain cannot be
    /// resolved.
    #[error("malformed cluster config: {0}")]
    MalformedConfig(String),

    /// A resource-list query against one of the API groups did not yield a
    /// usable resource list.
    #[error("cannot list {api} API resources (status {status}): {detail}")]
    DiscoveryFailed {
        api: ApiGroup,
        status: u16,
        detail: String,
    },

    /// A manifest could not be parsed into a structured object.
    #[error("parsing artifact `{artifact}`")]
    Parse {
        artifact: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A parsed manifest has no `kind`.
    #[error("artifact `{0}` does not declare a kind")]
    InvalidArtifact(String),

    /// An object has a shape this engine cannot safely interpret.
    #[error("malformed artifact `{artifact}`: {reason}")]
    MalformedArtifact { artifact: String, reason: String },

    /// A kind whose resource name is served by neither API group.
    #[error("unsupported kind `{kind}` in artifact `{artifact}`")]
    UnsupportedKind { kind: String, artifact: String },

    /// The cluster rejected a template expansion request.
    #[error("template processing failed with status {status}: {body}")]
    TemplateProcessingFailed { status: u16, body: String },

    /// The cluster rejected an apply or delete request for a concrete object.
    #[error("deployment request to {url} failed with status {status}: {body}")]
    DeploymentFailed {
        url: String,
        status: u16,
        body: String,
    },

    #[error("timeout when connecting to {url}")]
    ConnectTimeout { url: String },

    #[error("timeout when reading from {url}")]
    ReadTimeout { url: String },

    /// Non-timeout transport failure (refused connection, TLS, ...).
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("building http client")]
    Client(#[source] reqwest::Error),
}
