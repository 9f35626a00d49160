/// Router Module Index
///
/// Routing is split by access level. Access control is applied to a whole module
/// with a layer, so a handler cannot be exposed by forgetting an extractor.

/// Routes reachable without a token.
pub mod public;

/// Routes behind `auth_middleware`. Every handler receives a verified `AuthUser`.
pub mod authenticated;
