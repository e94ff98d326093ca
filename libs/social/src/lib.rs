//! Social feed core
//!
//! The relational data model (identities, profiles, the follow graph, posts,
//! photos and likes) and the operations the services expose on top of it:
//! account provisioning, follow and like toggling, feed composition, post
//! creation and profile updates.
//!
//! Every operation is written against the [`store::SocialStore`] trait.
//! [`store::PgStore`] backs the services; [`store::MemoryStore`] keeps the same
//! rules in process.

pub mod credentials;
pub mod error;
pub mod feed;
pub mod follow_graph;
pub mod likes;
pub mod models;
pub mod pagination;
pub mod posts;
pub mod profiles;
pub mod provisioning;
pub mod slug;
pub mod store;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::{SocialError, SocialResult};
