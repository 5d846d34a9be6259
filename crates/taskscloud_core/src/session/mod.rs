//! Session handling: provider boundary, identity context, view gate and
//! credential flows.
//!
//! # Invariants
//! - The identity provider is reached only through `IdentityProvider`.
//! - The current identity is passed around as a `SessionContext`, never
//!   looked up from process-wide state.

pub mod auth;
pub mod context;
pub mod gate;
pub mod provider;
