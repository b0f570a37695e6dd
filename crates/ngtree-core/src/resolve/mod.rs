//! Relation resolvers.
//!
//! Each resolver reads the full metadata list and returns its own relation
//! map. They are independent of each other and may run in any order.

pub mod composition;
pub mod routes;
pub mod usage;

pub use composition::CompositionResolver;
pub use routes::{OrphanRoutePolicy, RouteRelations, RouteResolver, RouteResolverConfig};
pub use usage::UsageResolver;
