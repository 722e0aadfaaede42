//! Scenario tests exercising the pipeline's pure stages end to end:
//! association, filtering, task construction, grouping and message
//! building, using catalogue regexes against fixture resources.

use std::collections::HashMap;

use regex::Regex;

use crate::associator::Associator;
use crate::emitter::{build_message, group_by_signature, ContextLabels};
use crate::executor::tasks_for_metric;
use crate::tests::fixtures::{discovery_job, metric, metric_request, resource, with_result};

fn labels() -> ContextLabels {
    ContextLabels::new("eu-west-2".to_string(), String::new(), String::new())
}

#[test]
fn s3_bucket_discovery_binds_both_metrics() {
    let mut job = discovery_job("s3");
    job.exported_tags.insert("project".to_string());

    let associator = Associator::new(
        &job.dimension_regexps,
        vec![resource(
            "AWS/S3",
            "arn:aws:s3:::temp-x",
            &[("project", "odin")],
        )],
    );

    for name in ["NumberOfObjects", "BucketSizeBytes"] {
        let mut request = metric_request(name, &["Average"]);
        request.period = 86400;

        let listed = metric("AWS/S3", name, &[("BucketName", "temp-x")]);
        let tasks = tasks_for_metric(&job, &request, &listed, &associator).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].resource_name, "arn:aws:s3:::temp-x");
        assert_eq!(tasks[0].dimensions.get("BucketName").unwrap(), "temp-x");
        assert_eq!(tasks[0].tags.get("project").unwrap(), "odin");
    }
}

#[test]
fn alb_request_count_rolls_all_stats_into_one_message() {
    let job = discovery_job("alb");
    let arn = "arn:aws:elasticloadbalancing:eu-west-2:123:loadbalancer/app/my-lb/50dc6c";
    let associator = Associator::new(
        &job.dimension_regexps,
        vec![resource("AWS/ApplicationELB", arn, &[])],
    );

    let request = metric_request("RequestCount", &["Sum", "SampleCount", "Maximum"]);
    let listed = metric(
        "AWS/ApplicationELB",
        "RequestCount",
        &[("LoadBalancer", "app/my-lb/50dc6c")],
    );

    let tasks = tasks_for_metric(&job, &request, &listed, &associator).unwrap();
    assert_eq!(tasks.len(), 3);

    // one datum of 10 a minute ago, as the fetcher would populate it
    let fetched: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let value = if task.statistic == "SampleCount" { 1.0 } else { 10.0 };
            with_result(task, &[value], &[1_700_000_000])
        })
        .collect();

    let groups = group_by_signature(fetched);
    assert_eq!(groups.len(), 1);

    let message = build_message(&labels(), &groups[0]).unwrap();
    assert_eq!(message.metric_name, "RequestCount");
    assert_eq!(message.namespace, "AWS/ApplicationELB");
    assert_eq!(message.value.get("sum"), Some(&Some(10.0)));
    assert_eq!(message.value.get("count"), Some(&Some(1.0)));
    assert_eq!(message.value.get("max"), Some(&Some(10.0)));
    assert_eq!(message.timestamp, Some(1_700_000_000.0));
}

#[test]
fn mq_broker_binds_through_suffix_stripping() {
    let job = discovery_job("mq");
    let associator = Associator::new(
        &job.dimension_regexps,
        vec![resource(
            "AWS/AmazonMQ",
            "arn:aws:mq:eu-west-2:123:broker:foo:b-9f0",
            &[],
        )],
    );

    let request = metric_request("CpuUtilization", &["Average"]);
    let listed = metric("AWS/AmazonMQ", "CpuUtilization", &[("Broker", "foo-2")]);

    let tasks = tasks_for_metric(&job, &request, &listed, &associator).unwrap();
    assert!(tasks[0].resource_name.contains("broker:foo"));
}

#[test]
fn sagemaker_endpoint_binds_through_lowercasing() {
    let job = discovery_job("sagemaker");
    let associator = Associator::new(
        &job.dimension_regexps,
        vec![resource(
            "AWS/SageMaker",
            "arn:aws:sagemaker:eu-west-2:123:endpoint/myep",
            &[],
        )],
    );

    let request = metric_request("Invocations", &["Sum"]);
    let listed = metric("AWS/SageMaker", "Invocations", &[("EndpointName", "MyEP")]);

    let tasks = tasks_for_metric(&job, &request, &listed, &associator).unwrap();
    assert_eq!(
        tasks[0].resource_name,
        "arn:aws:sagemaker:eu-west-2:123:endpoint/myep"
    );
}

#[test]
fn unbindable_metric_is_dropped_not_sent_to_global() {
    let job = discovery_job("s3");
    let associator = Associator::new(
        &job.dimension_regexps,
        vec![resource("AWS/S3", "arn:aws:s3:::known-bucket", &[])],
    );

    let request = metric_request("NumberOfObjects", &["Average"]);
    let listed = metric("AWS/S3", "NumberOfObjects", &[("BucketName", "other-bucket")]);

    assert!(tasks_for_metric(&job, &request, &listed, &associator).is_none());
}

#[test]
fn unmatched_metric_falls_back_to_the_global_resource() {
    let job = discovery_job("s3");
    let request = metric_request("NumberOfObjects", &["Average"]);
    let listed = metric("AWS/S3", "NumberOfObjects", &[("BucketName", "temp-x")]);

    let tasks = tasks_for_metric(&job, &request, &listed, &Associator::noop()).unwrap();
    assert_eq!(tasks[0].resource_name, "global");
    assert!(tasks[0].tags.is_empty());
}

#[test]
fn exact_dimensions_drop_mismatched_metrics() {
    let mut job = discovery_job("s3");
    job.dimensions_exact = true;
    job.search_dimensions.insert(
        "BucketName".to_string(),
        Regex::new("^temp-.*").unwrap(),
    );

    let request = metric_request("NumberOfObjects", &["Average"]);

    // dimension-name set {BucketName, StorageType} != search keys
    let extra = metric(
        "AWS/S3",
        "NumberOfObjects",
        &[("BucketName", "temp-x"), ("StorageType", "AllStorageTypes")],
    );
    assert!(tasks_for_metric(&job, &request, &extra, &Associator::noop()).is_none());

    let exact = metric("AWS/S3", "NumberOfObjects", &[("BucketName", "temp-x")]);
    assert!(tasks_for_metric(&job, &request, &exact, &Associator::noop()).is_some());
}

#[test]
fn search_dimension_regexes_filter_values() {
    let mut job = discovery_job("s3");
    job.search_dimensions
        .insert("BucketName".to_string(), Regex::new("^temp-.*").unwrap());

    let request = metric_request("NumberOfObjects", &["Average"]);

    let matching = metric("AWS/S3", "NumberOfObjects", &[("BucketName", "temp-x")]);
    assert!(tasks_for_metric(&job, &request, &matching, &Associator::noop()).is_some());

    let other = metric("AWS/S3", "NumberOfObjects", &[("BucketName", "prod-x")]);
    assert!(tasks_for_metric(&job, &request, &other, &Associator::noop()).is_none());
}

#[test]
fn metric_level_search_dimensions_replace_or_merge() {
    let mut job = discovery_job("s3");
    job.search_dimensions
        .insert("BucketName".to_string(), Regex::new("^temp-.*").unwrap());

    let listed = metric(
        "AWS/S3",
        "NumberOfObjects",
        &[("BucketName", "prod-x"), ("StorageType", "StandardStorage")],
    );

    // merged: the job-level BucketName pattern still applies and rejects
    let mut merged = metric_request("NumberOfObjects", &["Average"]);
    merged
        .search_dimensions
        .insert("StorageType".to_string(), Regex::new("^Standard").unwrap());
    assert!(tasks_for_metric(&job, &merged, &listed, &Associator::noop()).is_none());

    // replaced: only the metric-level StorageType pattern applies
    let mut replaced = merged.clone();
    replaced.merge_dimensions = false;
    assert!(tasks_for_metric(&job, &replaced, &listed, &Associator::noop()).is_some());
}

#[test]
fn custom_tags_overlay_exported_tags() {
    let mut job = discovery_job("s3");
    job.exported_tags.insert("project".to_string());
    job.exported_tags.insert("owner".to_string());
    job.custom_tags
        .insert("project".to_string(), "pinned".to_string());

    let associator = Associator::new(
        &job.dimension_regexps,
        vec![resource(
            "AWS/S3",
            "arn:aws:s3:::temp-x",
            &[("project", "odin")],
        )],
    );
    let request = metric_request("NumberOfObjects", &["Average"]);
    let listed = metric("AWS/S3", "NumberOfObjects", &[("BucketName", "temp-x")]);

    let tasks = tasks_for_metric(&job, &request, &listed, &associator).unwrap();
    // custom tag wins; missing exported tag projects as empty
    assert_eq!(tasks[0].tags.get("project").unwrap(), "pinned");
    assert_eq!(tasks[0].tags.get("owner").unwrap(), "");
}

#[test]
fn repeated_runs_produce_identical_messages() {
    let job = discovery_job("alb");
    let arn = "arn:aws:elasticloadbalancing:eu-west-2:123:loadbalancer/app/my-lb/50dc6c";
    let request = metric_request("RequestCount", &["Sum", "Maximum"]);
    let listed = metric(
        "AWS/ApplicationELB",
        "RequestCount",
        &[("LoadBalancer", "app/my-lb/50dc6c")],
    );

    let run = || {
        let associator = Associator::new(
            &job.dimension_regexps,
            vec![resource("AWS/ApplicationELB", arn, &[])],
        );
        let tasks = tasks_for_metric(&job, &request, &listed, &associator).unwrap();
        let fetched: Vec<_> = tasks
            .into_iter()
            .map(|task| with_result(task, &[4.0], &[1_700_000_000]))
            .collect();
        group_by_signature(fetched)
            .iter()
            .map(|group| build_message(&labels(), group).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn config_document_drives_the_search_tag_predicate() {
    use crate::aws::discovery::matches_search_tags;
    use crate::config::ScrapeConfig;

    let json = r#"{"discovery": {"jobs": [{
        "type": "s3",
        "search_tags": {"project": "^od.*"},
        "metrics": [{"name": "NumberOfObjects", "stats": ["Average"]}]
    }]}}"#;
    let config = ScrapeConfig::from_json(json, &HashMap::new()).unwrap();
    let job = &config.discovery_jobs[0];

    let tagged = resource("AWS/S3", "arn:aws:s3:::temp-x", &[("project", "odin")]);
    assert!(matches_search_tags(&tagged.tags, &job.search_tags));

    let other = resource("AWS/S3", "arn:aws:s3:::temp-y", &[("project", "another")]);
    assert!(!matches_search_tags(&other.tags, &job.search_tags));
}
