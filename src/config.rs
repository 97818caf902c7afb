use std::path::Path;

use serde::Deserialize;

use crate::{
    artifact::Str,
    error::{Error, Result},
};

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_ENDPOINT: &str = "https://127.0.0.1:8443";

/// Configuration values supplied by the host framework's answers mechanism.
/// Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct Answers {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub namespace: Option<String>,
}

/// A kubeconfig-style cluster config file. Only the current-context chain is
/// followed; everything else is ignored.
///
/// Expected shape:
///
/// ```yaml
/// current-context: test/10-1-2-2:8443/test-admin
/// contexts:
/// - name: test/10-1-2-2:8443/test-admin
///   context:
///     cluster: 10-1-2-2:8443
///     user: test-admin/10-1-2-2:8443
///     namespace: test
/// clusters:
/// - name: 10-1-2-2:8443
///   cluster:
///     server: https://10.1.2.2:8443
/// users:
/// - name: test-admin/10-1-2-2:8443
///   user:
///     token: abcdef
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Kubeconfig {
    current_context: Str,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedContext {
    name: Str,
    context: Context,
}

#[derive(Debug, Clone, Deserialize)]
struct Context {
    cluster: Str,
    user: Str,
    #[serde(default)]
    namespace: Option<Str>,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedCluster {
    name: Str,
    cluster: Cluster,
}

#[derive(Debug, Clone, Deserialize)]
struct Cluster {
    server: String,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedUser {
    name: Str,
    user: User,
}

#[derive(Debug, Clone, Deserialize)]
struct User {
    #[serde(default)]
    token: Option<String>,
}

/// The (server, token, namespace) triple a cluster config file resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCreds {
    pub server: String,
    pub token: Option<String>,
    pub namespace: Option<String>,
}

impl Kubeconfig {
    pub fn parse(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|err| Error::MalformedConfig(err.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "parsing cluster config");
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::MalformedConfig(format!("reading {}: {err}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Follow current-context to the cluster and user entries it references.
    pub fn resolve(&self) -> Result<ClusterCreds> {
        let context = self
            .contexts
            .iter()
            .find(|c| c.name == self.current_context)
            .ok_or_else(|| {
                Error::MalformedConfig(format!(
                    "current context `{}` not found",
                    self.current_context
                ))
            })?;

        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.context.cluster)
            .ok_or_else(|| {
                Error::MalformedConfig(format!(
                    "cluster `{}` not found",
                    context.context.cluster
                ))
            })?;

        let user = self
            .users
            .iter()
            .find(|u| u.name == context.context.user)
            .ok_or_else(|| {
                Error::MalformedConfig(format!("user `{}` not found", context.context.user))
            })?;

        Ok(ClusterCreds {
            server: cluster.cluster.server.clone(),
            token: user.user.token.clone(),
            namespace: context.context.namespace.as_deref().map(Into::into),
        })
    }
}

/// The resolved (endpoint, token, namespace) triple for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub namespace: String,
}

impl EffectiveConfig {
    /// Merge the answers values with the cluster config file, field by field.
    /// A field actively set to differing values in both sources is a
    /// conflict, never a silent pick.
    pub fn resolve(answers: &Answers, config: Option<&Kubeconfig>) -> Result<Self> {
        let creds = config.map(Kubeconfig::resolve).transpose()?;

        let endpoint = pick(
            "endpoint",
            answers.endpoint.as_deref(),
            creds.as_ref().map(|c| c.server.as_str()),
        )?
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());

        let access_token = pick(
            "access_token",
            answers.access_token.as_deref(),
            creds.as_ref().and_then(|c| c.token.as_deref()),
        )?;

        let namespace = pick(
            "namespace",
            answers.namespace.as_deref(),
            creds.as_ref().and_then(|c| c.namespace.as_deref()),
        )?
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());

        Ok(Self {
            endpoint,
            access_token,
            namespace,
        })
    }
}

fn pick(
    field: &'static str,
    answers: Option<&str>,
    config: Option<&str>,
) -> Result<Option<String>> {
    let answers = answers.filter(|v| !v.is_empty());
    let config = config.filter(|v| !v.is_empty());

    match (answers, config) {
        (Some(a), Some(c)) if a != c => Err(Error::ConfigConflict {
            field,
            answers: a.to_owned(),
            config: c.to_owned(),
        }),
        (Some(a), _) => Ok(Some(a.to_owned())),
        (None, c) => Ok(c.map(str::to_owned)),
    }
}
