/// Analysis domain: coordinates, package records and the pure rules that
/// classify licenses, detect cycles and aggregate transitive metrics.
pub mod domain;
pub mod policies;
pub mod services;
