//! Local world mirror for Emberlink.
//!
//! The server owns the truth about every entity; this crate keeps the
//! client's copy of it.
//!
//! # Key types
//!
//! - [`EntityStore`]: id → entity map, mutated only by the session as
//!   server messages arrive
//! - [`Entity`]: one mirrored entity and its named states
//! - [`StoreOutcome`]: what a mutation actually did (applied, or which
//!   anomaly made it a no-op)

mod entity;
mod store;

pub use entity::Entity;
pub use store::{EntityStore, StoreOutcome};
