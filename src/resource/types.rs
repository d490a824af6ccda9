//! Resource type and action identifiers understood by Deployment Manager.
//! These are fixed external strings.

pub const CUSTOM_ROLE: &str = "gcp-types/iam-v1:projects.roles";
pub const STORAGE_BUCKET: &str = "storage.v1.bucket";
pub const BIGQUERY_DATASET: &str = "bigquery.v2.dataset";
pub const BIGQUERY_DATASET_PATCH: &str = "gcp-types/bigquery-v2:bigquery.datasets.patch";
pub const LOGGING_SINK: &str = "logging.v2.sink";
pub const LOGGING_METRIC: &str = "logging.v2.metric";
pub const PUBSUB_TOPIC: &str = "pubsub.v1.topic";
pub const PUBSUB_SUBSCRIPTION: &str = "pubsub.v1.subscription";

pub const GET_IAM_POLICY: &str =
    "gcp-types/cloudresourcemanager-v1:cloudresourcemanager.projects.getIamPolicy";
pub const SET_IAM_POLICY: &str =
    "gcp-types/cloudresourcemanager-v1:cloudresourcemanager.projects.setIamPolicy";
