pub mod cache_keys;
pub mod feed;
pub mod heatmap;
pub mod impact;
pub mod lifecycle;
pub mod refresh;
pub mod top_tags;

pub use feed::{FeedError, FeedQuery, FeedQueryHandler};
pub use heatmap::{HeatmapError, HeatmapQueryHandler};
pub use impact::{ImpactError, ImpactQuery, ImpactQueryHandler};
pub use lifecycle::{LifecycleError, LifecycleQuery, LifecycleQueryHandler};
pub use refresh::SummaryRefreshTask;
pub use top_tags::{TopTagsError, TopTagsQuery, TopTagsQueryHandler};
