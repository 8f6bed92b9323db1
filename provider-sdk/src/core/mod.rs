//! Core abstraction shared by every provider client.

/// Base trait for all provider clients
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// The base URL for the provider
    fn base_url(&self) -> &str;

    /// Whether the client has the credentials it needs to make calls
    fn is_configured(&self) -> bool;
}
