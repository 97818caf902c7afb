use core::fmt;

use indexmap::IndexSet;
use serde::Deserialize;

use crate::{
    artifact::Str,
    client::RestClient,
    error::{Error, Result},
};

/// The two REST namespaces a cluster exposes. Each owns a disjoint subset of
/// resources; which owns what is only known after discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGroup {
    Core,
    Extended,
}

impl fmt::Display for ApiGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiGroup::Core => write!(f, "core"),
            ApiGroup::Extended => write!(f, "extended"),
        }
    }
}

/// The two API group base URLs derived from the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    core: String,
    extended: String,
}

impl ApiEndpoints {
    pub fn new(endpoint: &str) -> Self {
        let endpoint = endpoint.trim_end_matches('/');
        Self {
            core: format!("{endpoint}/api/v1/"),
            extended: format!("{endpoint}/oapi/v1/"),
        }
    }

    pub fn base(&self, group: ApiGroup) -> &str {
        match group {
            ApiGroup::Core => &self.core,
            ApiGroup::Extended => &self.extended,
        }
    }

    /// Compose the object URL for a resource under a namespace. The name
    /// segment is appended only when addressing a single named object. The
    /// `access_token` parameter is always present, empty when there is no
    /// token.
    pub fn url_for(
        &self,
        group: ApiGroup,
        namespace: &str,
        resource: &str,
        name: Option<&str>,
        token: Option<&str>,
    ) -> String {
        let mut url = format!("{}namespaces/{namespace}/{resource}/", self.base(group));
        if let Some(name) = name {
            url.push_str(name);
        }
        url.push_str("?access_token=");
        url.push_str(token.unwrap_or_default());
        tracing::debug!(%url, "resolved url");
        url
    }
}

/// Immutable snapshot of which resource names each API group serves, fetched
/// once per session before any artifact is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCatalog {
    core: IndexSet<Str>,
    extended: IndexSet<Str>,
}

impl ResourceCatalog {
    pub fn from_parts(
        core: impl IntoIterator<Item = Str>,
        extended: impl IntoIterator<Item = Str>,
    ) -> Self {
        Self {
            core: core.into_iter().collect(),
            extended: extended.into_iter().collect(),
        }
    }

    /// Query both API groups for the resource kinds they serve.
    pub async fn discover(client: &impl RestClient, endpoints: &ApiEndpoints) -> Result<Self> {
        let extended = fetch_resources(client, endpoints, ApiGroup::Extended).await?;
        let core = fetch_resources(client, endpoints, ApiGroup::Core).await?;
        Ok(Self { core, extended })
    }

    /// Which API group serves this resource. The extended group is checked
    /// first, so it wins should a name ever appear in both.
    pub fn group_for(&self, resource: &str) -> Option<ApiGroup> {
        if self.extended.contains(resource) {
            Some(ApiGroup::Extended)
        } else if self.core.contains(resource) {
            Some(ApiGroup::Core)
        } else {
            None
        }
    }

    pub fn supports(&self, resource: &str) -> bool {
        self.group_for(resource).is_some()
    }
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    resources: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    name: Str,
}

async fn fetch_resources(
    client: &impl RestClient,
    endpoints: &ApiEndpoints,
    api: ApiGroup,
) -> Result<IndexSet<Str>> {
    let res = client.get(endpoints.base(api)).await?;
    if res.status != 200 {
        return Err(Error::DiscoveryFailed {
            api,
            status: res.status,
            detail: res.body_text(),
        });
    }

    let body = res.body.ok_or_else(|| Error::DiscoveryFailed {
        api,
        status: res.status,
        detail: "empty response body".into(),
    })?;

    let list: ResourceList =
        serde_json::from_value(body).map_err(|err| Error::DiscoveryFailed {
            api,
            status: res.status,
            detail: err.to_string(),
        })?;

    let names: IndexSet<Str> = list.resources.into_iter().map(|r| r.name).collect();
    tracing::debug!(%api, resources = names.len(), "discovered resources");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> ApiEndpoints {
        ApiEndpoints::new("https://cluster:8443")
    }

    #[test]
    fn bases_derive_from_endpoint() {
        let endpoints = endpoints();
        assert_eq!(endpoints.base(ApiGroup::Core), "https://cluster:8443/api/v1/");
        assert_eq!(
            endpoints.base(ApiGroup::Extended),
            "https://cluster:8443/oapi/v1/"
        );
    }

    #[test]
    fn trailing_slash_on_endpoint_is_ignored() {
        assert_eq!(ApiEndpoints::new("https://cluster:8443/"), endpoints());
    }

    #[test]
    fn url_for_collection() {
        let url = endpoints().url_for(
            ApiGroup::Core,
            "myproject",
            "pods",
            None,
            Some("tok"),
        );
        assert_eq!(
            url,
            "https://cluster:8443/api/v1/namespaces/myproject/pods/?access_token=tok"
        );
    }

    #[test]
    fn url_for_named_object_on_extended_api() {
        let url = endpoints().url_for(
            ApiGroup::Extended,
            "project1",
            "deploymentconfigs",
            Some("dc1"),
            Some("tok"),
        );
        assert_eq!(
            url,
            "https://cluster:8443/oapi/v1/namespaces/project1/deploymentconfigs/dc1?access_token=tok"
        );
    }

    #[test]
    fn url_token_parameter_is_present_even_without_token() {
        let url = endpoints().url_for(ApiGroup::Core, "default", "services", None, None);
        assert_eq!(
            url,
            "https://cluster:8443/api/v1/namespaces/default/services/?access_token="
        );
    }

    #[test]
    fn routing_prefers_the_extended_group() {
        let catalog = ResourceCatalog::from_parts(
            ["pods".into(), "templates".into()],
            ["templates".into(), "buildconfigs".into()],
        );

        assert_eq!(catalog.group_for("pods"), Some(ApiGroup::Core));
        assert_eq!(catalog.group_for("buildconfigs"), Some(ApiGroup::Extended));
        assert_eq!(catalog.group_for("templates"), Some(ApiGroup::Extended));
        assert_eq!(catalog.group_for("widgets"), None);
        assert!(!catalog.supports("widgets"));
    }
}
