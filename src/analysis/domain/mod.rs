pub mod bytecode_version;
pub mod dependency;
pub mod gav;
pub mod license;
pub mod package_record;

pub use bytecode_version::BytecodeVersion;
pub use dependency::{DependencyNode, DependencyTree, FlatDependency, DEFAULT_SCOPE};
pub use gav::Gav;
pub use license::{License, LicenseCategory};
pub use package_record::{EffectiveMetrics, PackageRecord};
