//! Static catalogue of AWS service definitions.
//!
//! Each entry maps a short alias and a CloudWatch namespace to the tagging
//! API resource-type filters used for discovery and the ordered ARN regexes
//! whose named capture groups become CloudWatch dimension names. Entries
//! resolve by alias or namespace alike.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::Service;

struct ServiceDef {
    alias: &'static str,
    namespace: &'static str,
    resource_type_filters: &'static [&'static str],
    dimension_regexps: &'static [&'static str],
}

const SERVICES: &[ServiceDef] = &[
    ServiceDef {
        alias: "cwagent",
        namespace: "CWAgent",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "usage",
        namespace: "AWS/Usage",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "acm",
        namespace: "AWS/CertificateManager",
        resource_type_filters: &["acm:certificate"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "acm-pca",
        namespace: "AWS/ACMPrivateCA",
        resource_type_filters: &["acm-pca:certificate-authority"],
        dimension_regexps: &["(?P<PrivateCAArn>.*)"],
    },
    ServiceDef {
        alias: "airflow",
        namespace: "AmazonMWAA",
        resource_type_filters: &["airflow"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "mwaa",
        namespace: "AWS/MWAA",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "alb",
        namespace: "AWS/ApplicationELB",
        resource_type_filters: &[
            "elasticloadbalancing:loadbalancer/app",
            "elasticloadbalancing:targetgroup",
        ],
        dimension_regexps: &[
            ":(?P<TargetGroup>targetgroup/.+)",
            ":loadbalancer/(?P<LoadBalancer>.+)$",
        ],
    },
    ServiceDef {
        alias: "appstream",
        namespace: "AWS/AppStream",
        resource_type_filters: &["appstream"],
        dimension_regexps: &[":fleet/(?P<FleetName>[^/]+)"],
    },
    ServiceDef {
        alias: "backup",
        namespace: "AWS/Backup",
        resource_type_filters: &["backup"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "apigateway",
        namespace: "AWS/ApiGateway",
        resource_type_filters: &["apigateway"],
        dimension_regexps: &[
            "/restapis/(?P<ApiName>[^/]+)$",
            "/restapis/(?P<ApiName>[^/]+)/stages/(?P<Stage>[^/]+)$",
            "/apis/(?P<ApiId>[^/]+)$",
            "/apis/(?P<ApiId>[^/]+)/stages/(?P<Stage>[^/]+)$",
            "/apis/(?P<ApiId>[^/]+)/routes/(?P<Route>[^/]+)$",
        ],
    },
    ServiceDef {
        alias: "mq",
        namespace: "AWS/AmazonMQ",
        resource_type_filters: &["mq"],
        dimension_regexps: &["broker:(?P<Broker>[^:]+)"],
    },
    ServiceDef {
        alias: "apprunner",
        namespace: "AWS/AppRunner",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "appsync",
        namespace: "AWS/AppSync",
        resource_type_filters: &["appsync"],
        dimension_regexps: &["apis/(?P<GraphQLAPIId>[^/]+)"],
    },
    ServiceDef {
        alias: "athena",
        namespace: "AWS/Athena",
        resource_type_filters: &["athena"],
        dimension_regexps: &["workgroup/(?P<WorkGroup>[^/]+)"],
    },
    ServiceDef {
        alias: "asg",
        namespace: "AWS/AutoScaling",
        resource_type_filters: &[],
        dimension_regexps: &["autoScalingGroupName/(?P<AutoScalingGroupName>[^/]+)"],
    },
    ServiceDef {
        alias: "beanstalk",
        namespace: "AWS/ElasticBeanstalk",
        resource_type_filters: &["elasticbeanstalk:environment"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "billing",
        namespace: "AWS/Billing",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "cassandra",
        namespace: "AWS/Cassandra",
        resource_type_filters: &["cassandra"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "cloudfront",
        namespace: "AWS/CloudFront",
        resource_type_filters: &["cloudfront:distribution"],
        dimension_regexps: &["distribution/(?P<DistributionId>[^/]+)"],
    },
    ServiceDef {
        alias: "cognito-idp",
        namespace: "AWS/Cognito",
        resource_type_filters: &["cognito-idp:userpool"],
        dimension_regexps: &["userpool/(?P<UserPool>[^/]+)"],
    },
    ServiceDef {
        alias: "datasync",
        namespace: "AWS/DataSync",
        resource_type_filters: &["datasync:task", "datasync:agent"],
        dimension_regexps: &[":task/(?P<TaskId>[^/]+)", ":agent/(?P<AgentId>[^/]+)"],
    },
    ServiceDef {
        alias: "ds",
        namespace: "AWS/DirectoryService",
        resource_type_filters: &["ds:directory"],
        dimension_regexps: &[":directory/(?P<Directory_ID>[^/]+)"],
    },
    ServiceDef {
        alias: "dms",
        namespace: "AWS/DMS",
        resource_type_filters: &["dms"],
        dimension_regexps: &[
            "rep:[^/]+/(?P<ReplicationInstanceIdentifier>[^/]+)",
            "task:(?P<ReplicationTaskIdentifier>[^/]+)/(?P<ReplicationInstanceIdentifier>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "shield",
        namespace: "AWS/DDoSProtection",
        resource_type_filters: &["shield:protection"],
        dimension_regexps: &["(?P<ResourceArn>.+)"],
    },
    ServiceDef {
        alias: "docdb",
        namespace: "AWS/DocDB",
        resource_type_filters: &["rds:db", "rds:cluster"],
        dimension_regexps: &[
            "cluster:(?P<DBClusterIdentifier>[^/]+)",
            "db:(?P<DBInstanceIdentifier>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "dx",
        namespace: "AWS/DX",
        resource_type_filters: &["directconnect"],
        dimension_regexps: &[
            ":dxcon/(?P<ConnectionId>[^/]+)",
            ":dxlag/(?P<LagId>[^/]+)",
            ":dxvif/(?P<VirtualInterfaceId>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "dynamodb",
        namespace: "AWS/DynamoDB",
        resource_type_filters: &["dynamodb:table"],
        dimension_regexps: &[":table/(?P<TableName>[^/]+)"],
    },
    ServiceDef {
        alias: "ebs",
        namespace: "AWS/EBS",
        resource_type_filters: &["ec2:volume"],
        dimension_regexps: &["volume/(?P<VolumeId>[^/]+)"],
    },
    ServiceDef {
        alias: "ec",
        namespace: "AWS/ElastiCache",
        resource_type_filters: &["elasticache:cluster", "elasticache:serverlesscache"],
        dimension_regexps: &[
            "cluster:(?P<CacheClusterId>[^/]+)",
            "serverlesscache:(?P<clusterId>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "memorydb",
        namespace: "AWS/MemoryDB",
        resource_type_filters: &["memorydb:cluster"],
        dimension_regexps: &["cluster/(?P<ClusterName>[^/]+)"],
    },
    ServiceDef {
        alias: "ec2",
        namespace: "AWS/EC2",
        resource_type_filters: &["ec2:instance"],
        dimension_regexps: &["instance/(?P<InstanceId>[^/]+)"],
    },
    ServiceDef {
        alias: "ec2Spot",
        namespace: "AWS/EC2Spot",
        resource_type_filters: &[],
        dimension_regexps: &["(?P<FleetRequestId>.*)"],
    },
    ServiceDef {
        alias: "ec2CapacityReservations",
        namespace: "AWS/EC2CapacityReservations",
        resource_type_filters: &[],
        dimension_regexps: &[":capacity-reservation/(?P<CapacityReservationId>)$"],
    },
    ServiceDef {
        alias: "ecs-svc",
        namespace: "AWS/ECS",
        resource_type_filters: &["ecs:cluster", "ecs:service"],
        dimension_regexps: &[
            ":cluster/(?P<ClusterName>[^/]+)$",
            ":service/(?P<ClusterName>[^/]+)/(?P<ServiceName>[^/]+)$",
        ],
    },
    ServiceDef {
        alias: "ecs-containerinsights",
        namespace: "ECS/ContainerInsights",
        resource_type_filters: &["ecs:cluster", "ecs:service"],
        dimension_regexps: &[
            ":cluster/(?P<ClusterName>[^/]+)$",
            ":service/(?P<ClusterName>[^/]+)/(?P<ServiceName>[^/]+)$",
        ],
    },
    ServiceDef {
        alias: "containerinsights",
        namespace: "ContainerInsights",
        resource_type_filters: &["eks:cluster"],
        dimension_regexps: &[":cluster/(?P<ClusterName>[^/]+)$"],
    },
    ServiceDef {
        alias: "efs",
        namespace: "AWS/EFS",
        resource_type_filters: &["elasticfilesystem:file-system"],
        dimension_regexps: &["file-system/(?P<FileSystemId>[^/]+)"],
    },
    ServiceDef {
        alias: "elb",
        namespace: "AWS/ELB",
        resource_type_filters: &["elasticloadbalancing:loadbalancer"],
        dimension_regexps: &[":loadbalancer/(?P<LoadBalancerName>.+)$"],
    },
    ServiceDef {
        alias: "emr",
        namespace: "AWS/ElasticMapReduce",
        resource_type_filters: &["elasticmapreduce:cluster"],
        dimension_regexps: &["cluster/(?P<JobFlowId>[^/]+)"],
    },
    ServiceDef {
        alias: "emr-serverless",
        namespace: "AWS/EMRServerless",
        resource_type_filters: &["emr-serverless:applications"],
        dimension_regexps: &["applications/(?P<ApplicationId>[^/]+)"],
    },
    ServiceDef {
        alias: "es",
        namespace: "AWS/ES",
        resource_type_filters: &["es:domain"],
        dimension_regexps: &[":domain/(?P<DomainName>[^/]+)"],
    },
    ServiceDef {
        alias: "firehose",
        namespace: "AWS/Firehose",
        resource_type_filters: &["firehose"],
        dimension_regexps: &[":deliverystream/(?P<DeliveryStreamName>[^/]+)"],
    },
    ServiceDef {
        alias: "fsx",
        namespace: "AWS/FSx",
        resource_type_filters: &["fsx:file-system"],
        dimension_regexps: &["file-system/(?P<FileSystemId>[^/]+)"],
    },
    ServiceDef {
        alias: "gamelift",
        namespace: "AWS/GameLift",
        resource_type_filters: &["gamelift"],
        dimension_regexps: &[":fleet/(?P<FleetId>[^/]+)"],
    },
    ServiceDef {
        alias: "gwlb",
        namespace: "AWS/GatewayELB",
        resource_type_filters: &["elasticloadbalancing:loadbalancer"],
        dimension_regexps: &[
            ":(?P<TargetGroup>targetgroup/.+)",
            ":loadbalancer/(?P<LoadBalancer>.+)$",
        ],
    },
    ServiceDef {
        alias: "ga",
        namespace: "AWS/GlobalAccelerator",
        resource_type_filters: &["globalaccelerator"],
        dimension_regexps: &[
            "accelerator/(?P<Accelerator>[^/]+)$",
            "accelerator/(?P<Accelerator>[^/]+)/listener/(?P<Listener>[^/]+)$",
            "accelerator/(?P<Accelerator>[^/]+)/listener/(?P<Listener>[^/]+)/endpoint-group/(?P<EndpointGroup>[^/]+)$",
        ],
    },
    ServiceDef {
        alias: "glue",
        namespace: "Glue",
        resource_type_filters: &["glue:job"],
        dimension_regexps: &[":job/(?P<JobName>[^/]+)"],
    },
    ServiceDef {
        alias: "iot",
        namespace: "AWS/IoT",
        resource_type_filters: &["iot:rule", "iot:provisioningtemplate"],
        dimension_regexps: &[
            ":rule/(?P<RuleName>[^/]+)",
            ":provisioningtemplate/(?P<TemplateName>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "kafka",
        namespace: "AWS/Kafka",
        resource_type_filters: &["kafka:cluster"],
        dimension_regexps: &[":cluster/(?P<Cluster_Name>[^/]+)"],
    },
    ServiceDef {
        alias: "kafkaconnect",
        namespace: "AWS/KafkaConnect",
        resource_type_filters: &["kafka:cluster"],
        dimension_regexps: &[":connector/(?P<Connector_Name>[^/]+)"],
    },
    ServiceDef {
        alias: "kinesis",
        namespace: "AWS/Kinesis",
        resource_type_filters: &["kinesis:stream"],
        dimension_regexps: &[":stream/(?P<StreamName>[^/]+)"],
    },
    ServiceDef {
        alias: "kinesis-analytics",
        namespace: "AWS/KinesisAnalytics",
        resource_type_filters: &["kinesisanalytics:application"],
        dimension_regexps: &[":application/(?P<Application>[^/]+)"],
    },
    ServiceDef {
        alias: "kms",
        namespace: "AWS/KMS",
        resource_type_filters: &["kms:key"],
        dimension_regexps: &[":key/(?P<KeyId>[^/]+)"],
    },
    ServiceDef {
        alias: "lambda",
        namespace: "AWS/Lambda",
        resource_type_filters: &["lambda:function"],
        dimension_regexps: &[":function:(?P<FunctionName>[^/]+)"],
    },
    ServiceDef {
        alias: "lambdainsights",
        namespace: "LambdaInsights",
        resource_type_filters: &["lambda:function"],
        dimension_regexps: &[":function:(?P<FunctionName>[^/]+)"],
    },
    ServiceDef {
        alias: "logs",
        namespace: "AWS/Logs",
        resource_type_filters: &["logs:log-group"],
        dimension_regexps: &[":log-group:(?P<LogGroupName>.+)"],
    },
    ServiceDef {
        alias: "mediaconnect",
        namespace: "AWS/MediaConnect",
        resource_type_filters: &[
            "mediaconnect:flow",
            "mediaconnect:source",
            "mediaconnect:output",
        ],
        dimension_regexps: &[
            "^(?P<FlowARN>.*:flow:.*)$",
            "^(?P<SourceARN>.*:source:.*)$",
            "^(?P<OutputARN>.*:output:.*)$",
        ],
    },
    ServiceDef {
        alias: "mediaconvert",
        namespace: "AWS/MediaConvert",
        resource_type_filters: &["mediaconvert"],
        dimension_regexps: &["(?P<Queue>.*:.*:mediaconvert:.*:queues/.*)$"],
    },
    ServiceDef {
        alias: "mediapackage",
        namespace: "AWS/MediaPackage",
        resource_type_filters: &["mediapackage", "mediapackagev2", "mediapackage-vod"],
        dimension_regexps: &[
            ":channels/(?P<IngestEndpoint>.+)$",
            ":packaging-configurations/(?P<PackagingConfiguration>.+)$",
        ],
    },
    ServiceDef {
        alias: "medialive",
        namespace: "AWS/MediaLive",
        resource_type_filters: &["medialive:channel"],
        dimension_regexps: &[":channel:(?P<ChannelId>.+)$"],
    },
    ServiceDef {
        alias: "mediatailor",
        namespace: "AWS/MediaTailor",
        resource_type_filters: &["mediatailor:playbackConfiguration"],
        dimension_regexps: &["playbackConfiguration/(?P<ConfigurationName>[^/]+)"],
    },
    ServiceDef {
        alias: "neptune",
        namespace: "AWS/Neptune",
        resource_type_filters: &["rds:db", "rds:cluster"],
        dimension_regexps: &[
            ":cluster:(?P<DBClusterIdentifier>[^/]+)",
            ":db:(?P<DBInstanceIdentifier>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "nfw",
        namespace: "AWS/NetworkFirewall",
        resource_type_filters: &["network-firewall:firewall"],
        dimension_regexps: &["firewall/(?P<FirewallName>[^/]+)"],
    },
    ServiceDef {
        alias: "ngw",
        namespace: "AWS/NATGateway",
        resource_type_filters: &["ec2:natgateway"],
        dimension_regexps: &["natgateway/(?P<NatGatewayId>[^/]+)"],
    },
    ServiceDef {
        alias: "nlb",
        namespace: "AWS/NetworkELB",
        resource_type_filters: &[
            "elasticloadbalancing:loadbalancer/net",
            "elasticloadbalancing:targetgroup",
        ],
        dimension_regexps: &[
            ":(?P<TargetGroup>targetgroup/.+)",
            ":loadbalancer/(?P<LoadBalancer>.+)$",
        ],
    },
    ServiceDef {
        alias: "vpc-endpoint",
        namespace: "AWS/PrivateLinkEndpoints",
        resource_type_filters: &["ec2:vpc-endpoint"],
        dimension_regexps: &[":vpc-endpoint/(?P<VPC_Endpoint_Id>.+)"],
    },
    ServiceDef {
        alias: "vpc-endpoint-service",
        namespace: "AWS/PrivateLinkServices",
        resource_type_filters: &["ec2:vpc-endpoint-service"],
        dimension_regexps: &[":vpc-endpoint-service/(?P<Service_Id>.+)"],
    },
    ServiceDef {
        alias: "amp",
        namespace: "AWS/Prometheus",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "qldb",
        namespace: "AWS/QLDB",
        resource_type_filters: &["qldb"],
        dimension_regexps: &[":ledger/(?P<LedgerName>[^/]+)"],
    },
    ServiceDef {
        alias: "quicksight",
        namespace: "AWS/QuickSight",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "rds",
        namespace: "AWS/RDS",
        resource_type_filters: &["rds:db", "rds:cluster", "rds:db-proxy"],
        dimension_regexps: &[
            ":cluster:(?P<DBClusterIdentifier>[^/]+)",
            ":db:(?P<DBInstanceIdentifier>[^/]+)",
            ":db-proxy:(?P<ProxyIdentifier>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "redshift",
        namespace: "AWS/Redshift-Serverless",
        resource_type_filters: &[
            "redshift-serverless:workgroup",
            "redshift-serverless:namespace",
        ],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "route53-resolver",
        namespace: "AWS/Route53Resolver",
        resource_type_filters: &["route53resolver"],
        dimension_regexps: &[":resolver-endpoint/(?P<EndpointId>[^/]+)"],
    },
    ServiceDef {
        alias: "route53",
        namespace: "AWS/Route53",
        resource_type_filters: &["route53"],
        dimension_regexps: &[":healthcheck/(?P<HealthCheckId>[^/]+)"],
    },
    ServiceDef {
        alias: "rum",
        namespace: "AWS/RUM",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "s3",
        namespace: "AWS/S3",
        resource_type_filters: &["s3"],
        dimension_regexps: &["(?P<BucketName>[^:]+)$"],
    },
    ServiceDef {
        alias: "scheduler",
        namespace: "AWS/Scheduler",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "ecr",
        namespace: "AWS/ECR",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "timestream",
        namespace: "AWS/Timestream",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "secretsmanager",
        namespace: "AWS/SecretsManager",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "ses",
        namespace: "AWS/SES",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "sfn",
        namespace: "AWS/States",
        resource_type_filters: &["states"],
        dimension_regexps: &["(?P<StateMachineArn>.*)"],
    },
    ServiceDef {
        alias: "sns",
        namespace: "AWS/SNS",
        resource_type_filters: &["sns"],
        dimension_regexps: &["(?P<TopicName>[^:]+)$"],
    },
    ServiceDef {
        alias: "sqs",
        namespace: "AWS/SQS",
        resource_type_filters: &["sqs"],
        dimension_regexps: &["(?P<QueueName>[^:]+)$"],
    },
    ServiceDef {
        alias: "storagegateway",
        namespace: "AWS/StorageGateway",
        resource_type_filters: &["storagegateway"],
        dimension_regexps: &[
            ":gateway/(?P<GatewayId>[^:]+)$",
            ":share/(?P<ShareId>[^:]+)$",
            "^(?P<GatewayId>[^:/]+)/(?P<GatewayName>[^:]+)$",
        ],
    },
    ServiceDef {
        alias: "transfer",
        namespace: "AWS/Transfer",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "tgw",
        namespace: "AWS/TransitGateway",
        resource_type_filters: &["ec2:transit-gateway"],
        dimension_regexps: &[
            ":transit-gateway/(?P<TransitGateway>[^/]+)",
            "(?P<TransitGateway>[^/]+)/(?P<TransitGatewayAttachment>[^/]+)",
        ],
    },
    ServiceDef {
        alias: "trustedadvisor",
        namespace: "AWS/TrustedAdvisor",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "vpn",
        namespace: "AWS/VPN",
        resource_type_filters: &["ec2:vpn-connection"],
        dimension_regexps: &[":vpn-connection/(?P<VpnId>[^/]+)"],
    },
    ServiceDef {
        alias: "clientvpn",
        namespace: "AWS/ClientVPN",
        resource_type_filters: &["ec2:client-vpn-endpoint"],
        dimension_regexps: &[":client-vpn-endpoint/(?P<Endpoint>[^/]+)"],
    },
    ServiceDef {
        alias: "wafv2",
        namespace: "AWS/WAFV2",
        resource_type_filters: &["wafv2"],
        dimension_regexps: &["/webacl/(?P<WebACL>[^/]+)"],
    },
    ServiceDef {
        alias: "workspaces",
        namespace: "AWS/WorkSpaces",
        resource_type_filters: &["workspaces:workspace", "workspaces:directory"],
        dimension_regexps: &[
            ":workspace/(?P<WorkspaceId>[^/]+)$",
            ":directory/(?P<DirectoryId>[^/]+)$",
        ],
    },
    ServiceDef {
        alias: "aoss",
        namespace: "AWS/AOSS",
        resource_type_filters: &["aoss:collection"],
        dimension_regexps: &[":collection/(?P<CollectionId>[^/]+)"],
    },
    ServiceDef {
        alias: "sagemaker",
        namespace: "AWS/SageMaker",
        resource_type_filters: &["sagemaker:endpoint", "sagemaker:inference-component"],
        dimension_regexps: &[
            ":endpoint/(?P<EndpointName>[^/]+)$",
            ":inference-component/(?P<InferenceComponentName>[^/]+)$",
        ],
    },
    ServiceDef {
        alias: "sagemaker-endpoints",
        namespace: "/aws/sagemaker/Endpoints",
        resource_type_filters: &["sagemaker:endpoint"],
        dimension_regexps: &[":endpoint/(?P<EndpointName>[^/]+)$"],
    },
    ServiceDef {
        alias: "sagemaker-inference-components",
        namespace: "/aws/sagemaker/InferenceComponents",
        resource_type_filters: &["sagemaker:inference-component"],
        dimension_regexps: &[":inference-component/(?P<InferenceComponentName>[^/]+)$"],
    },
    ServiceDef {
        alias: "sagemaker-training",
        namespace: "/aws/sagemaker/TrainingJobs",
        resource_type_filters: &["sagemaker:training-job"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "sagemaker-processing",
        namespace: "/aws/sagemaker/ProcessingJobs",
        resource_type_filters: &["sagemaker:processing-job"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "sagemaker-transform",
        namespace: "/aws/sagemaker/TransformJobs",
        resource_type_filters: &["sagemaker:transform-job"],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "sagemaker-inf-rec",
        namespace: "/aws/sagemaker/InferenceRecommendationsJobs",
        resource_type_filters: &["sagemaker:inference-recommendations-job"],
        dimension_regexps: &[":inference-recommendations-job/(?P<JobName>[^/]+)"],
    },
    ServiceDef {
        alias: "sagemaker-model-building-pipeline",
        namespace: "AWS/Sagemaker/ModelBuildingPipeline",
        resource_type_filters: &["sagemaker:pipeline"],
        dimension_regexps: &[":pipeline/(?P<PipelineName>[^/]+)"],
    },
    ServiceDef {
        alias: "ipam",
        namespace: "AWS/IPAM",
        resource_type_filters: &["ec2:ipam-pool"],
        dimension_regexps: &[":ipam-pool/(?P<IpamPoolId>[^/]+)$"],
    },
    ServiceDef {
        alias: "bedrock",
        namespace: "AWS/Bedrock",
        resource_type_filters: &[],
        dimension_regexps: &[],
    },
    ServiceDef {
        alias: "event-rule",
        namespace: "AWS/Events",
        resource_type_filters: &["events"],
        dimension_regexps: &[
            ":rule/(?P<EventBusName>[^/]+)/(?P<RuleName>[^/]+)$",
            ":rule/aws.partner/(?P<EventBusName>.+)/(?P<RuleName>[^/]+)$",
        ],
    },
    ServiceDef {
        alias: "vpc-lattice",
        namespace: "AWS/VpcLattice",
        resource_type_filters: &["vpc-lattice:service"],
        dimension_regexps: &[":service/(?P<Service>[^/]+)$"],
    },
    ServiceDef {
        alias: "networkmanager",
        namespace: "AWS/Network Manager",
        resource_type_filters: &["networkmanager:core-network"],
        dimension_regexps: &[":core-network/(?P<CoreNetwork>[^/]+)$"],
    },
];

static CATALOG: Lazy<HashMap<&'static str, Arc<Service>>> = Lazy::new(|| {
    let mut by_key = HashMap::with_capacity(SERVICES.len() * 2);
    for def in SERVICES {
        let service = Arc::new(Service {
            alias: def.alias.to_string(),
            namespace: def.namespace.to_string(),
            resource_type_filters: def
                .resource_type_filters
                .iter()
                .map(|f| f.to_string())
                .collect(),
            dimension_regexps: def
                .dimension_regexps
                .iter()
                .map(|r| Regex::new(r).expect("invalid catalogue regex"))
                .collect(),
        });
        by_key.insert(def.alias, service.clone());
        by_key.insert(def.namespace, service);
    }
    by_key
});

/// Resolve a service by alias or namespace.
pub fn lookup(key: &str) -> ScrapeResult<Arc<Service>> {
    CATALOG
        .get(key)
        .cloned()
        .ok_or_else(|| ScrapeError::UnknownService {
            name: key.to_string(),
        })
}
