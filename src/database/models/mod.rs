pub mod profile;

pub use profile::{Profile, Role, SubscriptionStatus, PROFILES};
