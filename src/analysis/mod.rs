pub mod aggregate;
pub mod collaboration;
pub mod comparative;
pub mod metrics;
pub mod pipeline;

pub use aggregate::{aggregate, median, predict_time_to_merge};
pub use collaboration::{collaboration_stats, recommendations, CollaborationStats, Recommendation};
pub use comparative::compare_repositories;
pub use metrics::compute_metric;
pub use pipeline::{build_samples, AnalysisPipeline};
