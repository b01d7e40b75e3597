/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level (via
/// Axum layers) so a protected endpoint cannot be exposed by accident.

/// Routes accessible without a session: health, and the sign-in surface of
/// the external identity flows.
pub mod public;

/// The rooms resource. Reads require any authenticated principal; mutations
/// additionally require the admin role, enforced per-handler by the
/// `AdminUser` extractor.
pub mod rooms;

/// Session introspection for signed-in clients.
pub mod session;
