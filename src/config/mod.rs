//! Scrape configuration.
//!
//! The configuration document arrives as JSON in the `SCRAPE_CONFIG`
//! environment variable. Raw serde structs mirror the document; conversion
//! into the model types compiles every regex up front so malformed patterns
//! fail before any I/O happens.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::env;

use regex::Regex;
use serde::Deserialize;

use crate::catalog;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, MetricRequest, StaticJob};

pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_CONNECT_TIMEOUT: f64 = 1.0;
pub const DEFAULT_READ_TIMEOUT: f64 = 5.0;

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "default-region")]
    default_region: Option<String>,
    #[serde(rename = "sts-region")]
    sts_region: Option<String>,
    #[serde(rename = "boto-config")]
    client_config: Option<RawClientConfig>,
    #[serde(default)]
    discovery: RawDiscovery,
    #[serde(default, rename = "static")]
    static_jobs: RawStatic,
}

#[derive(Debug, Default, Deserialize)]
struct RawClientConfig {
    connect_timeout: Option<f64>,
    read_timeout: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDiscovery {
    #[serde(default)]
    exported_tags: Vec<String>,
    #[serde(default)]
    jobs: Vec<RawDiscoveryJob>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStatic {
    #[serde(default)]
    jobs: Vec<RawStaticJob>,
}

#[derive(Debug, Deserialize)]
struct RawDiscoveryJob {
    #[serde(rename = "type")]
    service: String,
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    custom_tags: BTreeMap<String, String>,
    #[serde(default)]
    search_tags: BTreeMap<String, String>,
    #[serde(default)]
    search_dimensions: BTreeMap<String, String>,
    #[serde(default)]
    dimensions_exact: bool,
    #[serde(default = "default_true")]
    recently_active_only: bool,
    #[serde(default)]
    linked_accounts: bool,
    metrics: Vec<RawMetricRequest>,
}

#[derive(Debug, Deserialize)]
struct RawStaticJob {
    #[serde(rename = "type")]
    service: String,
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    custom_tags: BTreeMap<String, String>,
    #[serde(default)]
    dimensions: BTreeMap<String, String>,
    metrics: Vec<RawMetricRequest>,
}

#[derive(Debug, Deserialize)]
struct RawMetricRequest {
    name: String,
    stats: Vec<String>,
    #[serde(default = "default_period")]
    period: i64,
    #[serde(default = "default_length")]
    length: i64,
    #[serde(default)]
    delay: i64,
    #[serde(default)]
    nil_to_zero: bool,
    #[serde(default = "default_true")]
    add_cw_timestamp: bool,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    search_dimensions: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    merge_dimensions: bool,
    #[serde(default)]
    dimensions_exact: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn default_period() -> i64 {
    60
}

fn default_length() -> i64 {
    60
}

fn compile_patterns(patterns: &BTreeMap<String, String>) -> ScrapeResult<HashMap<String, Regex>> {
    patterns
        .iter()
        .map(|(name, pattern)| {
            Regex::new(pattern)
                .map(|re| (name.clone(), re))
                .map_err(|e| {
                    ScrapeError::config(format!("invalid pattern for {name:?}: {e}"))
                })
        })
        .collect()
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter(|v| !v.is_empty()).collect()
}

impl TryFrom<RawMetricRequest> for MetricRequest {
    type Error = ScrapeError;

    fn try_from(raw: RawMetricRequest) -> ScrapeResult<Self> {
        Ok(MetricRequest {
            search_dimensions: compile_patterns(&raw.search_dimensions)?,
            name: raw.name,
            stats: raw.stats,
            period: raw.period,
            length: raw.length,
            delay: raw.delay,
            nil_to_zero: raw.nil_to_zero,
            add_cw_timestamp: raw.add_cw_timestamp,
            unit: raw.unit,
            merge_dimensions: raw.merge_dimensions,
            dimensions_exact: raw.dimensions_exact,
        })
    }
}

/// The fully parsed scrape configuration.
#[derive(Debug)]
pub struct ScrapeConfig {
    pub default_region: String,
    pub sts_region: String,
    pub connect_timeout: f64,
    pub read_timeout: f64,
    pub discovery_jobs: Vec<DiscoveryJob>,
    pub static_jobs: Vec<StaticJob>,
}

impl ScrapeConfig {
    /// Load from the `SCRAPE_CONFIG` environment variable.
    pub fn from_env() -> ScrapeResult<Self> {
        let raw = env::var("SCRAPE_CONFIG").unwrap_or_else(|_| "{}".to_string());
        Self::from_json(&raw, &HashMap::new())
    }

    /// Parse a configuration document. `rtf_overrides` replaces a
    /// namespace's catalogue resource-type filters, which tests use to
    /// discover resources the default filters would miss.
    pub fn from_json(
        json: &str,
        rtf_overrides: &HashMap<String, Vec<String>>,
    ) -> ScrapeResult<Self> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| ScrapeError::config(format!("invalid SCRAPE_CONFIG: {e}")))?;

        let default_region = raw
            .default_region
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let sts_region = raw.sts_region.unwrap_or_else(|| default_region.clone());
        let client_config = raw.client_config.unwrap_or_default();

        let exported_tags: BTreeSet<String> = raw
            .discovery
            .exported_tags
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();

        let mut discovery_jobs = Vec::with_capacity(raw.discovery.jobs.len());
        for job in raw.discovery.jobs {
            let service = catalog::lookup(&job.service)?;
            let resource_type_filters = rtf_overrides
                .get(&service.namespace)
                .cloned()
                .unwrap_or_else(|| service.resource_type_filters.clone());

            discovery_jobs.push(DiscoveryJob {
                namespace: service.namespace.clone(),
                metrics: job
                    .metrics
                    .into_iter()
                    .map(MetricRequest::try_from)
                    .collect::<ScrapeResult<_>>()?,
                regions: non_empty(job.regions),
                roles: non_empty(job.roles),
                custom_tags: job.custom_tags,
                search_tags: compile_patterns(&job.search_tags)?,
                search_dimensions: compile_patterns(&job.search_dimensions)?,
                dimensions_exact: job.dimensions_exact,
                recently_active_only: job.recently_active_only,
                linked_accounts: job.linked_accounts,
                dimension_regexps: service.dimension_regexps.clone(),
                resource_type_filters,
                exported_tags: exported_tags.clone(),
            });
        }

        let mut static_jobs = Vec::with_capacity(raw.static_jobs.jobs.len());
        for job in raw.static_jobs.jobs {
            let service = catalog::lookup(&job.service)?;
            static_jobs.push(StaticJob {
                namespace: service.namespace.clone(),
                metrics: job
                    .metrics
                    .into_iter()
                    .map(MetricRequest::try_from)
                    .collect::<ScrapeResult<_>>()?,
                regions: non_empty(job.regions),
                roles: non_empty(job.roles),
                custom_tags: job.custom_tags,
                dimensions: job.dimensions,
            });
        }

        Ok(ScrapeConfig {
            default_region,
            sts_region,
            connect_timeout: client_config
                .connect_timeout
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: client_config.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT),
            discovery_jobs,
            static_jobs,
        })
    }
}

/// Destination queue settings from the environment.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub url: String,
    pub region: String,
    pub role: Option<String>,
}

impl QueueSettings {
    pub fn from_env(default_region: &str) -> ScrapeResult<Self> {
        let url = env::var("QUEUE_URL")
            .map_err(|_| ScrapeError::config("QUEUE_URL is required"))?;
        let region = env::var("QUEUE_REGION").unwrap_or_else(|_| default_region.to_string());
        let role = env::var("QUEUE_ROLE").ok().filter(|r| !r.is_empty());
        Ok(Self { url, region, role })
    }
}

/// Per-client page concurrency, overridable through the environment.
pub(crate) fn api_concurrency(var: &str, default: usize) -> usize {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ScrapeConfig::from_json("{}", &HashMap::new()).unwrap();
        assert_eq!(config.default_region, "eu-west-2");
        assert_eq!(config.sts_region, "eu-west-2");
        assert_eq!(config.connect_timeout, 1.0);
        assert_eq!(config.read_timeout, 5.0);
        assert!(config.discovery_jobs.is_empty());
        assert!(config.static_jobs.is_empty());
    }

    #[test]
    fn discovery_job_joins_catalogue_entry() {
        let json = r#"{
            "default-region": "eu-west-1",
            "discovery": {
                "exported_tags": ["project", ""],
                "jobs": [{
                    "type": "s3",
                    "regions": ["eu-west-2", ""],
                    "search_tags": {"project": "^od.*"},
                    "metrics": [{"name": "NumberOfObjects", "stats": ["Average"], "period": 86400}]
                }]
            }
        }"#;
        let config = ScrapeConfig::from_json(json, &HashMap::new()).unwrap();
        assert_eq!(config.default_region, "eu-west-1");

        let job = &config.discovery_jobs[0];
        assert_eq!(job.namespace, "AWS/S3");
        assert_eq!(job.resource_type_filters, vec!["s3".to_string()]);
        assert_eq!(job.dimension_regexps.len(), 1);
        assert_eq!(job.regions, vec!["eu-west-2".to_string()]);
        assert!(job.recently_active_only);
        assert_eq!(
            job.exported_tags,
            BTreeSet::from(["project".to_string()])
        );

        let metric = &job.metrics[0];
        assert_eq!(metric.period, 86400);
        assert_eq!(metric.length, 60);
        assert_eq!(metric.delay, 0);
        assert!(metric.add_cw_timestamp);
        assert!(metric.merge_dimensions);
        assert!(metric.dimensions_exact.is_none());
    }

    #[test]
    fn rtf_overrides_replace_catalogue_filters() {
        let json = r#"{"discovery": {"jobs": [{
            "type": "alb",
            "metrics": [{"name": "RequestCount", "stats": ["Sum"]}]
        }]}}"#;
        let overrides = HashMap::from([(
            "AWS/ApplicationELB".to_string(),
            vec!["elasticloadbalancing:loadbalancer".to_string()],
        )]);
        let config = ScrapeConfig::from_json(json, &overrides).unwrap();
        assert_eq!(
            config.discovery_jobs[0].resource_type_filters,
            vec!["elasticloadbalancing:loadbalancer".to_string()]
        );
    }

    #[test]
    fn unknown_service_fails() {
        let json = r#"{"discovery": {"jobs": [{"type": "nope", "metrics": []}]}}"#;
        assert!(matches!(
            ScrapeConfig::from_json(json, &HashMap::new()),
            Err(ScrapeError::UnknownService { .. })
        ));
    }

    #[test]
    fn invalid_search_tag_pattern_fails_before_io() {
        let json = r#"{"discovery": {"jobs": [{
            "type": "s3",
            "search_tags": {"project": "["},
            "metrics": [{"name": "NumberOfObjects", "stats": ["Average"]}]
        }]}}"#;
        assert!(matches!(
            ScrapeConfig::from_json(json, &HashMap::new()),
            Err(ScrapeError::Config { .. })
        ));
    }

    #[test]
    fn static_job_parses_fixed_dimensions() {
        let json = r#"{"static": {"jobs": [{
            "type": "sqs",
            "dimensions": {"QueueName": "ingest"},
            "metrics": [{"name": "ApproximateNumberOfMessagesVisible", "stats": ["Maximum"]}]
        }]}}"#;
        let config = ScrapeConfig::from_json(json, &HashMap::new()).unwrap();
        let job = &config.static_jobs[0];
        assert_eq!(job.namespace, "AWS/SQS");
        assert_eq!(job.dimensions.get("QueueName").unwrap(), "ingest");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            ScrapeConfig::from_json("{not json", &HashMap::new()),
            Err(ScrapeError::Config { .. })
        ));
    }
}
