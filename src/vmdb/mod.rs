pub mod endpoint;
pub mod exporter;
pub mod sample;

pub use endpoint::{resolver_for, Cluster, EndpointResolver, SingleNode};
pub use exporter::{MetricsBackend, VmExporter};
pub use sample::{Labels, MetricSample, SampleBatch, EXEC_TIMESTAMP_METRIC};
