//! Tenant directory for EduSync.
//!
//! A keyed, queryable document store scoped by tenant ([`TenantStore`]),
//! the phone [`IdentityResolver`] that maps a guardian's number to their
//! students across every tenant, and the read models the conversational and
//! admin surfaces need (daily feed, parent contacts, dashboard stats).  All
//! read-heavy lookups go through the shared cache-aside layer.

pub mod feed;
pub mod identity;
pub mod keys;
pub mod memory;
pub mod roster;
pub mod stats;
pub mod store;

pub use feed::{Announcement, BroadcastRecord, DailyFeed, FeedItem, FeedKind};
pub use identity::{IdentityResolver, ResolverSettings};
pub use memory::MemoryTenantStore;
pub use roster::{Roster, StudentFilter};
pub use stats::{dashboard_stats, DashboardStats};
pub use store::{Direction, Document, Query, TenantStore};
