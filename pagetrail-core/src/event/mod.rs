//! Event records and their construction
//!
//! Observers hand a kind, a target and extra fields to the [`EventFactory`],
//! which merges in the environment context and a fresh identifier.

mod factory;
mod id;
mod record;

pub use factory::EventFactory;
pub use id::IdGenerator;
pub use record::{EventKind, EventRecord, Fields, IDENTITY_FIELDS};
