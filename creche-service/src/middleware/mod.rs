pub mod tenant;

pub use tenant::{ActorRole, TenantContext};
