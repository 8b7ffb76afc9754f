pub mod principals;
pub mod subscriptions;
pub mod summary;
pub mod taggings;

pub use principals::{PostgresPrincipalStore, PrincipalStore};
pub use subscriptions::{PostgresSubscriptionStore, SubscriptionStore};
pub use summary::{PostgresTagSummaryStore, TagSummaryStore};
pub use taggings::{PostgresTaggingStore, TaggingStore};
