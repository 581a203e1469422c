//! Live resource collection from the Kubernetes API.
//!
//! Every kind is listed cluster-wide through raw paginated GETs and decoded
//! into the engine's own resource model. A kind that cannot be listed (RBAC
//! denial, API group not served) is recorded as a note and left unavailable
//! in the inventory; only a failure to list namespaces aborts collection.
//!
//! # Example
//!
//! ```rust,ignore
//! use kube_audit::cluster::ClusterClient;
//!
//! let client = ClusterClient::connect(None, 500).await?;
//! let collected = client.collect().await?;
//! println!("{} notes", collected.notes.len());
//! ```

use crate::analyzer::inventory::Inventory;
use crate::analyzer::resources::{Node, ObjectList};
use crate::analyzer::types::ClusterMeta;
use crate::error::{AuditError, Result};
use kube::{Client, Config};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

const NAMESPACES: &str = "/api/v1/namespaces";
const SERVICE_ACCOUNTS: &str = "/api/v1/serviceaccounts";
const PODS: &str = "/api/v1/pods";
const SERVICES: &str = "/api/v1/services";
const NODES: &str = "/api/v1/nodes";
const ROLES: &str = "/apis/rbac.authorization.k8s.io/v1/roles";
const ROLE_BINDINGS: &str = "/apis/rbac.authorization.k8s.io/v1/rolebindings";
const CLUSTER_ROLES: &str = "/apis/rbac.authorization.k8s.io/v1/clusterroles";
const CLUSTER_ROLE_BINDINGS: &str = "/apis/rbac.authorization.k8s.io/v1/clusterrolebindings";
const NETWORK_POLICIES: &str = "/apis/networking.k8s.io/v1/networkpolicies";
const INGRESSES: &str = "/apis/networking.k8s.io/v1/ingresses";

/// Result of collecting a cluster.
#[derive(Debug, Clone)]
pub struct Collected {
    pub cluster: ClusterMeta,
    pub inventory: Inventory,
    /// Per-kind collection problems, keyed by plural kind name.
    pub notes: BTreeMap<String, String>,
}

/// Kubernetes API client for resource collection.
pub struct ClusterClient {
    client: Client,
    api_server: String,
    page_size: u32,
}

impl ClusterClient {
    /// Connect using the default kubeconfig or in-cluster environment, or a
    /// specific kubeconfig context.
    pub async fn connect(context: Option<&str>, page_size: u32) -> Result<Self> {
        // TLS to the API server needs a process-wide crypto provider
        let _ = rustls::crypto::ring::default_provider().install_default();

        let config = match context {
            Some(context) => {
                let kubeconfig = kube::config::Kubeconfig::read()?;
                Config::from_custom_kubeconfig(
                    kubeconfig,
                    &kube::config::KubeConfigOptions {
                        context: Some(context.to_string()),
                        ..Default::default()
                    },
                )
                .await?
            }
            None => Config::infer().await?,
        };
        let api_server = config.cluster_url.to_string();
        let client = Client::try_from(config)?;
        log::info!("Connected to {}", api_server);

        Ok(Self {
            client,
            api_server,
            page_size: page_size.max(1),
        })
    }

    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    /// The server's git version, if it can be read.
    pub async fn server_version(&self) -> Option<String> {
        match self.client.apiserver_version().await {
            Ok(info) => Some(info.git_version),
            Err(e) => {
                log::warn!("Cannot read server version: {}", e);
                None
            }
        }
    }

    /// List every kind the audit needs.
    pub async fn collect(&self) -> Result<Collected> {
        let mut notes = BTreeMap::new();

        let namespaces = self
            .list_all(NAMESPACES)
            .await
            .map_err(|e| AuditError::Collection {
                kind: "namespaces".to_string(),
                message: e.to_string(),
            })?;
        log::info!("Listed {} namespaces", namespaces.len());

        let inventory = Inventory {
            namespaces: Some(namespaces),
            service_accounts: self.list_kind("serviceaccounts", SERVICE_ACCOUNTS, &mut notes).await,
            pods: self.list_kind("pods", PODS, &mut notes).await,
            roles: self.list_kind("roles", ROLES, &mut notes).await,
            cluster_roles: self.list_kind("clusterroles", CLUSTER_ROLES, &mut notes).await,
            role_bindings: self.list_kind("rolebindings", ROLE_BINDINGS, &mut notes).await,
            cluster_role_bindings: self
                .list_kind("clusterrolebindings", CLUSTER_ROLE_BINDINGS, &mut notes)
                .await,
            network_policies: self.list_kind("networkpolicies", NETWORK_POLICIES, &mut notes).await,
            services: self.list_kind("services", SERVICES, &mut notes).await,
            ingresses: self.list_kind("ingresses", INGRESSES, &mut notes).await,
        };

        // Nodes feed no rule; listing them only records read coverage.
        if let Err(e) = self.list_all::<Node>(NODES).await {
            notes.insert(
                "nodes".to_string(),
                format!("cannot list nodes (ok for read-only mode): {}", e),
            );
        }

        Ok(Collected {
            cluster: ClusterMeta {
                server_version: self.server_version().await,
                api_server: self.api_server.clone(),
            },
            inventory,
            notes,
        })
    }

    /// List one kind, turning a failure into a note.
    async fn list_kind<T: DeserializeOwned>(
        &self,
        kind: &str,
        path: &str,
        notes: &mut BTreeMap<String, String>,
    ) -> Option<Vec<T>> {
        match self.list_all(path).await {
            Ok(items) => {
                log::info!("Listed {} {}", items.len(), kind);
                Some(items)
            }
            Err(e) => {
                log::warn!("Cannot list {}: {}", kind, e);
                notes.insert(kind.to_string(), format!("cannot list {}: {}", kind, e));
                None
            }
        }
    }

    /// Follow `continue` tokens until the list is exhausted.
    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let uri = page_uri(path, self.page_size, token.as_deref());
            let request = http::Request::builder()
                .method("GET")
                .uri(&uri)
                .body(Vec::new())
                .map_err(|e| AuditError::Collection {
                    kind: path.to_string(),
                    message: format!("Failed to build request: {}", e),
                })?;

            let page = self.client.request::<ObjectList<T>>(request).await?;
            let next = page.continue_token().map(str::to_string);
            items.extend(page.items);

            match next {
                Some(next) => {
                    log::debug!("{}: fetching next page", path);
                    token = Some(next);
                }
                None => break,
            }
        }

        Ok(items)
    }
}

/// Request path for one page of a list.
fn page_uri(path: &str, limit: u32, token: Option<&str>) -> String {
    match token {
        Some(token) => format!(
            "{}?limit={}&continue={}",
            path,
            limit,
            urlencoding::encode(token)
        ),
        None => format!("{}?limit={}", path, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::resources::Namespace;

    #[test]
    fn test_page_uri() {
        assert_eq!(page_uri(PODS, 500, None), "/api/v1/pods?limit=500");
        assert_eq!(
            page_uri(PODS, 100, Some("eyJ2Ijoi+/=")),
            "/api/v1/pods?limit=100&continue=eyJ2Ijoi%2B%2F%3D"
        );
    }

    // Same bounds as `list_all`: items need not implement Default.
    fn decode_page<T: DeserializeOwned>(body: &str) -> ObjectList<T> {
        serde_json::from_str(body).unwrap()
    }

    #[derive(Debug, serde::Deserialize)]
    struct NoDefault {
        name: String,
    }

    #[test]
    fn test_generic_page_decoding() {
        let page: ObjectList<NoDefault> = decode_page(r#"{"items": [{"name": "a"}]}"#);
        assert_eq!(page.items[0].name, "a");
        assert_eq!(page.continue_token(), None);

        let empty: ObjectList<NoDefault> = decode_page(r#"{"metadata": {}}"#);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_list_page_decoding() {
        let page: ObjectList<Namespace> = serde_json::from_str(
            r#"{
                "kind": "NamespaceList",
                "apiVersion": "v1",
                "metadata": {"resourceVersion": "42", "continue": "abc"},
                "items": [{"metadata": {"name": "default"}}]
            }"#,
        )
        .unwrap();
        assert_eq!(page.items[0].metadata.name, "default");
        assert_eq!(page.continue_token(), Some("abc"));

        let last: ObjectList<Namespace> =
            serde_json::from_str(r#"{"metadata": {"continue": ""}, "items": []}"#).unwrap();
        assert_eq!(last.continue_token(), None);
    }
}
