/// Ports module defining interfaces for hexagonal architecture
///
/// This module contains the outbound ports (driven ports - infrastructure
/// interfaces) that the application core depends on.
pub mod outbound;
