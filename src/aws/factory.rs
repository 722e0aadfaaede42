//! Client factory.
//!
//! Clients are cached per `(kind, region, role)` behind a single mutex held
//! across the whole check-and-insert. SupportApp is a global service and is
//! always pinned to `us-east-1`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::aws::cloudwatch::CloudWatchApi;
use crate::aws::discovery::{
    ApiGatewayFilter, AutoScalingApi, DmsApi, Ec2Api, PrometheusApi, ResourceFilter, ShieldApi,
    StorageGatewayApi,
};
use crate::aws::identity::{StsApi, SupportAppApi};
use crate::aws::queue::QueueSender;
use crate::aws::session::SessionProvider;
use crate::aws::tagging::TaggingApi;
use crate::config::{QueueSettings, ScrapeConfig};
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::DiscoveryJob;

const SUPPORT_APP_REGION: &str = "us-east-1";

/// The kinds of API client the pipeline can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClientKind {
    CloudWatch,
    Sts,
    SupportApp,
    Tagging,
    ApiGateway,
    AutoScaling,
    Dms,
    Ec2,
    Prometheus,
    StorageGateway,
    Shield,
}

impl ClientKind {
    /// The namespace-specific discovery client for a namespace, if any.
    /// Namespaces without an entry discover through the tagging API alone.
    pub fn discovery_filter(namespace: &str) -> Option<ClientKind> {
        match namespace {
            "AWS/ApiGateway" => Some(ClientKind::ApiGateway),
            "AWS/AutoScaling" => Some(ClientKind::AutoScaling),
            "AWS/DMS" => Some(ClientKind::Dms),
            "AWS/EC2Spot" => Some(ClientKind::Ec2),
            "AWS/Prometheus" => Some(ClientKind::Prometheus),
            "AWS/StorageGateway" => Some(ClientKind::StorageGateway),
            "AWS/TransitGateway" => Some(ClientKind::Ec2),
            "AWS/DDoSProtection" => Some(ClientKind::Shield),
            _ => None,
        }
    }
}

#[derive(Clone)]
enum ClientHandle {
    CloudWatch(Arc<CloudWatchApi>),
    Sts(Arc<StsApi>),
    SupportApp(Arc<SupportAppApi>),
    Tagging(Arc<TaggingApi>),
    ApiGateway(Arc<ApiGatewayFilter>),
    AutoScaling(Arc<AutoScalingApi>),
    Dms(Arc<DmsApi>),
    Ec2(Arc<Ec2Api>),
    Prometheus(Arc<PrometheusApi>),
    StorageGateway(Arc<StorageGatewayApi>),
    Shield(Arc<ShieldApi>),
}

type ClientKey = (ClientKind, String, Option<String>);

/// Owns authenticated API clients keyed by `(kind, region, role)`.
pub struct ClientFactory {
    sessions: SessionProvider,
    clients: Mutex<HashMap<ClientKey, ClientHandle>>,
}

impl ClientFactory {
    pub async fn new(config: &ScrapeConfig) -> Self {
        Self {
            sessions: SessionProvider::new(config).await,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// The set of discovery clients a group of jobs needs: the tagging API
    /// when any job carries resource-type filters, plus each job's
    /// namespace-specific client.
    pub fn required_discovery_clients(jobs: &[DiscoveryJob]) -> BTreeSet<ClientKind> {
        let mut required = BTreeSet::new();
        for job in jobs {
            if !job.resource_type_filters.is_empty() {
                required.insert(ClientKind::Tagging);
            }
            if let Some(kind) = ClientKind::discovery_filter(&job.namespace) {
                required.insert(kind);
            }
        }
        required
    }

    async fn handle(
        &self,
        kind: ClientKind,
        region: &str,
        role: Option<&str>,
    ) -> ScrapeResult<ClientHandle> {
        // SupportApp only exists in us-east-1.
        let region = if kind == ClientKind::SupportApp {
            SUPPORT_APP_REGION
        } else {
            region
        };
        let key = (kind, region.to_string(), role.map(str::to_string));

        let mut clients = self.clients.lock().await;
        if let Some(handle) = clients.get(&key) {
            return Ok(handle.clone());
        }

        let session = self.sessions.session_for(role).await?;
        let conf = SessionProvider::for_region(&session, region);
        let handle = match kind {
            ClientKind::CloudWatch => ClientHandle::CloudWatch(Arc::new(CloudWatchApi::new(&conf))),
            ClientKind::Sts => ClientHandle::Sts(Arc::new(StsApi::new(&conf))),
            ClientKind::SupportApp => ClientHandle::SupportApp(Arc::new(SupportAppApi::new(&conf))),
            ClientKind::Tagging => ClientHandle::Tagging(Arc::new(TaggingApi::new(&conf))),
            ClientKind::ApiGateway => {
                ClientHandle::ApiGateway(Arc::new(ApiGatewayFilter::new(&conf)))
            }
            ClientKind::AutoScaling => {
                ClientHandle::AutoScaling(Arc::new(AutoScalingApi::new(&conf)))
            }
            ClientKind::Dms => ClientHandle::Dms(Arc::new(DmsApi::new(&conf))),
            ClientKind::Ec2 => ClientHandle::Ec2(Arc::new(Ec2Api::new(&conf))),
            ClientKind::Prometheus => ClientHandle::Prometheus(Arc::new(PrometheusApi::new(&conf))),
            ClientKind::StorageGateway => {
                ClientHandle::StorageGateway(Arc::new(StorageGatewayApi::new(&conf)))
            }
            ClientKind::Shield => ClientHandle::Shield(Arc::new(ShieldApi::new(&conf))),
        };
        clients.insert(key, handle.clone());
        Ok(handle)
    }

    pub async fn cloudwatch(
        &self,
        region: &str,
        role: Option<&str>,
    ) -> ScrapeResult<Arc<CloudWatchApi>> {
        match self.handle(ClientKind::CloudWatch, region, role).await? {
            ClientHandle::CloudWatch(client) => Ok(client),
            _ => unreachable!("client cache kind mismatch"),
        }
    }

    pub async fn sts(&self, region: &str, role: Option<&str>) -> ScrapeResult<Arc<StsApi>> {
        match self.handle(ClientKind::Sts, region, role).await? {
            ClientHandle::Sts(client) => Ok(client),
            _ => unreachable!("client cache kind mismatch"),
        }
    }

    pub async fn support_app(
        &self,
        region: &str,
        role: Option<&str>,
    ) -> ScrapeResult<Arc<SupportAppApi>> {
        match self.handle(ClientKind::SupportApp, region, role).await? {
            ClientHandle::SupportApp(client) => Ok(client),
            _ => unreachable!("client cache kind mismatch"),
        }
    }

    pub async fn tagging(&self, region: &str, role: Option<&str>) -> ScrapeResult<Arc<TaggingApi>> {
        match self.handle(ClientKind::Tagging, region, role).await? {
            ClientHandle::Tagging(client) => Ok(client),
            _ => unreachable!("client cache kind mismatch"),
        }
    }

    /// A namespace-specific discovery client as its `ResourceFilter`
    /// capability.
    pub async fn resource_filter(
        &self,
        kind: ClientKind,
        region: &str,
        role: Option<&str>,
    ) -> ScrapeResult<Arc<dyn ResourceFilter>> {
        let filter: Arc<dyn ResourceFilter> = match self.handle(kind, region, role).await? {
            ClientHandle::ApiGateway(client) => client,
            ClientHandle::AutoScaling(client) => client,
            ClientHandle::Dms(client) => client,
            ClientHandle::Ec2(client) => client,
            ClientHandle::Prometheus(client) => client,
            ClientHandle::StorageGateway(client) => client,
            ClientHandle::Shield(client) => client,
            _ => {
                return Err(ScrapeError::config(format!(
                    "{kind:?} is not a resource discovery client"
                )))
            }
        };
        Ok(filter)
    }

    /// Build the queue sender for the configured destination.
    pub async fn queue_sender(&self, settings: &QueueSettings) -> ScrapeResult<QueueSender> {
        let session = self.sessions.session_for(settings.role.as_deref()).await?;
        let conf = SessionProvider::for_region(&session, &settings.region);
        Ok(QueueSender::new(&conf, settings.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn job(namespace: &str, filters: &[&str]) -> DiscoveryJob {
        DiscoveryJob {
            namespace: namespace.to_string(),
            metrics: Vec::new(),
            regions: Vec::new(),
            roles: Vec::new(),
            custom_tags: BTreeMap::new(),
            search_tags: HashMap::new(),
            search_dimensions: HashMap::new(),
            dimensions_exact: false,
            recently_active_only: true,
            linked_accounts: false,
            dimension_regexps: Vec::new(),
            resource_type_filters: filters.iter().map(|f| f.to_string()).collect(),
            exported_tags: BTreeSet::new(),
        }
    }

    #[test]
    fn tagging_required_only_with_resource_type_filters() {
        let jobs = vec![job("AWS/S3", &["s3"]), job("AWS/Prometheus", &[])];
        let required = ClientFactory::required_discovery_clients(&jobs);
        assert!(required.contains(&ClientKind::Tagging));
        assert!(required.contains(&ClientKind::Prometheus));
        assert_eq!(required.len(), 2);
    }

    #[test]
    fn transit_gateway_and_spot_share_the_ec2_client() {
        let jobs = vec![job("AWS/EC2Spot", &[]), job("AWS/TransitGateway", &[])];
        let required = ClientFactory::required_discovery_clients(&jobs);
        assert_eq!(required, BTreeSet::from([ClientKind::Ec2]));
    }

    #[test]
    fn plain_tagging_namespaces_need_no_extra_client() {
        let required = ClientFactory::required_discovery_clients(&[job("AWS/S3", &["s3"])]);
        assert_eq!(required, BTreeSet::from([ClientKind::Tagging]));
    }
}
