/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly: the authenticated group carries an
/// auth middleware layer, and every admin handler takes the AdminUser
/// extractor, so no protected endpoint can be exposed by accident.
///
/// The three modules map directly to the defined access levels. Admin routes
/// deliberately share paths with public ones (e.g. GET /categories is public
/// while POST /categories is admin), so the groups are merged per-method
/// rather than nested under a separate prefix.

/// Routes accessible to all clients (anonymous, read-only plus liveness).
pub mod public;

/// Routes requiring a valid bearer token (order creation and listing).
pub mod authenticated;

/// Routes restricted exclusively to users with the 'admin' role.
pub mod admin;
