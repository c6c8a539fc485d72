//! Kubernetes Memory Usage Reporter Library
//!
//! This library compares live container memory usage from the metrics API
//! with declared requests and limits, and summarizes how persistent volumes
//! concentrate on nodes through their required node affinity.

pub mod lib {
    pub mod affinity;
    pub mod cli;
    pub mod config;
    pub mod error;
    pub mod kubernetes;
    pub mod logger;
    pub mod metrics;
    pub mod output;
    pub mod progress;
    pub mod quantity;
    pub mod usage;
}

// Re-export commonly used types at the root level for convenience
pub use lib::affinity::{
    AffinityNode, NOT_BOUND, NodePlacement, PvRow, classify_volumes, report_pv_affinity,
};
pub use lib::cli::{Cli, Command, OutputFormat};
pub use lib::config::Config;
pub use lib::error::{ConfigError, KubememError, KubernetesError, QuantityError, Result};
pub use lib::kubernetes::{
    AffinityExpression, AffinityTerm, ClaimRef, ClusterSource, ContainerSpec, ContainerUsage,
    KubernetesLoader, MetricsSample, PodInfo, VolumeInfo,
};
pub use lib::logger::init_logger;
pub use lib::metrics::PodMetrics;
pub use lib::output::{
    ReportOutput, render_pv_table, render_usage_table, write_pv_report, write_usage_report,
};
pub use lib::progress::PodProgress;
pub use lib::quantity::{ResourceQuantity, format_quantity};
pub use lib::usage::{
    EXCLUDED_NAMESPACE, PodDiagnostic, UsageClass, UsageEntry, UsageRow, classify_usage,
    is_reportable, report_usage, reportable_pods,
};
