use crate::analysis::domain::{BytecodeVersion, Gav};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Measurements taken from a package's primary file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageInfo {
    pub size: Option<u64>,
    pub bytecode_version: Option<BytecodeVersion>,
    /// Publication time of the inspected file
    pub created: Option<DateTime<Utc>>,
}

/// BinaryInspector port for measuring a package's primary file
///
/// The `jar` extension is preferred. Otherwise the file named after the
/// packaging is used, and when neither is available the result is empty.
#[async_trait]
pub trait BinaryInspector: Send + Sync {
    async fn inspect_package(
        &self,
        gav: &Gav,
        packaging: &str,
        available_extensions: &BTreeSet<String>,
    ) -> Result<PackageInfo>;
}
