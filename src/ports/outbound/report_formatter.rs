use crate::analysis::domain::DependencyTree;
use crate::shared::Result;

/// ReportFormatter port for rendering an analyzed dependency tree
pub trait ReportFormatter {
    /// Formats the tree rooted at the analyzed package
    ///
    /// # Arguments
    /// * `tree` - The analyzed package, possibly read at a limited depth
    /// * `total_size` - Size of the package's whole required closure, which
    ///   may reach beyond `tree`
    ///
    /// # Errors
    /// Returns an error if formatting or serialization fails
    fn format(&self, tree: &DependencyTree, total_size: Option<u64>) -> Result<String>;
}
