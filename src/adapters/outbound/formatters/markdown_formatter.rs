use crate::analysis::domain::{BytecodeVersion, DependencyTree, LicenseCategory, PackageRecord};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;

/// Markdown table header for the package summary
const SUMMARY_HEADER: &str = "| Property | Value |\n";

/// Markdown table separator line for the package summary
const SUMMARY_SEPARATOR: &str = "|----------|-------|\n";

/// Markdown table header for the license breakdown
const LICENSE_HEADER: &str = "| License | Size | Share |\n";

/// Markdown table separator line for the license breakdown
const LICENSE_SEPARATOR: &str = "|---------|------|-------|\n";

/// Placeholder for values that were not determined
const NOT_AVAILABLE: &str = "N/A";

/// Renders a byte count with decimal units and two decimals, e.g. `1.01KB`.
///
/// Counts below one kilobyte are printed exactly. Rounding is half-to-even.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [(u64, &str); 3] = [
        (1_000_000_000, "GB"),
        (1_000_000, "MB"),
        (1_000, "KB"),
    ];

    let Some((divisor, unit)) = UNITS.iter().find(|(divisor, _)| bytes >= *divisor) else {
        return format!("{}B", bytes);
    };

    let scaled = u128::from(bytes) * 100;
    let divisor = u128::from(*divisor);
    let mut hundredths = scaled / divisor;
    let remainder = scaled % divisor;
    if remainder * 2 > divisor || (remainder * 2 == divisor && hundredths % 2 == 1) {
        hundredths += 1;
    }
    format!("{}.{:02}{}", hundredths / 100, hundredths % 100, unit)
}

fn format_bytecode(version: Option<BytecodeVersion>) -> String {
    version
        .map(|v| v.java_release_label())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn format_size(size: Option<u64>) -> String {
    size.map(format_bytes)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// MarkdownFormatter adapter rendering an analyzed tree as a Markdown report
///
/// This adapter implements the ReportFormatter port for Markdown format:
/// a summary table, the license breakdown of the required closure and
/// the dependency tree as a nested list.
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Escapes pipe characters and newlines for safe Markdown table rendering
    fn escape_markdown_table_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper methods for rendering sections
impl MarkdownFormatter {
    fn render_header(&self, output: &mut String, record: &PackageRecord) {
        output.push_str(&format!("# Dependency Report: {}\n\n", record.gav));
        if let Some(description) = &record.description {
            output.push_str(&format!("{}\n\n", description.trim()));
        }
    }

    fn render_unresolved(&self, output: &mut String, record: &PackageRecord) {
        output.push_str("## Analysis Failed\n\n");
        output.push_str(&format!(
            "The package could not be analyzed ({} attempt(s)): {}\n\n",
            record.unresolved_count,
            record.unresolved_reason.as_deref().unwrap_or("unknown reason")
        ));
    }

    fn render_summary(
        &self,
        output: &mut String,
        tree: &DependencyTree,
        total_size: Option<u64>,
    ) {
        let record = &tree.record;
        let mut rows: Vec<(&str, String)> = vec![
            (
                "Name",
                record.name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            (
                "Packaging",
                record
                    .packaging
                    .clone()
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            ("Package size", format_size(record.package_size)),
            ("Bytecode", format_bytecode(record.bytecode_version)),
            ("License", self.license_names(record)),
        ];

        if let Some(metrics) = record.effective_metrics() {
            rows.push(("Total size", format_size(total_size)));
            rows.push((
                "Effective bytecode",
                format_bytecode(metrics.effective_bytecode_version),
            ));
            rows.push((
                "Dominant license",
                metrics
                    .dominant_license_category
                    .map(|category| category.label().to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ));
            rows.push((
                "Required dependencies",
                metrics.required_dependency_count.to_string(),
            ));
            rows.push((
                "Unresolved dependencies",
                metrics.unresolved_required_count.to_string(),
            ));
            rows.push((
                "Optional dependencies",
                metrics.optional_dependency_count.to_string(),
            ));
        }
        if let Some(created) = record.created {
            rows.push(("Published", created.format("%Y-%m-%d").to_string()));
        }
        if let Some(url) = &record.url {
            rows.push(("Homepage", url.clone()));
        }

        output.push_str("## Summary\n\n");
        output.push_str(SUMMARY_HEADER);
        output.push_str(SUMMARY_SEPARATOR);
        for (property, value) in rows {
            output.push_str(&format!(
                "| {} | {} |\n",
                property,
                Self::escape_markdown_table_cell(&value)
            ));
        }
        output.push('\n');
    }

    fn license_names(&self, record: &PackageRecord) -> String {
        let names: Vec<&str> = record
            .licenses
            .iter()
            .filter_map(|license| license.name.as_deref().or(license.url.as_deref()))
            .collect();
        if names.is_empty() {
            LicenseCategory::NoLicense.label().to_string()
        } else {
            names.join(", ")
        }
    }

    fn render_license_breakdown(&self, output: &mut String, record: &PackageRecord) {
        let Some(metrics) = record.effective_metrics() else {
            return;
        };
        let total: u64 = metrics.license_category_bytes.values().sum();
        if total == 0 {
            return;
        }

        output.push_str("## License Breakdown\n\n");
        output.push_str(
            "Size of the package and its required dependencies, grouped by license.\n\n",
        );
        output.push_str(LICENSE_HEADER);
        output.push_str(LICENSE_SEPARATOR);
        for (category, bytes) in &metrics.license_category_bytes {
            let share = *bytes as f64 * 100.0 / total as f64;
            output.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                category.label(),
                format_bytes(*bytes),
                share
            ));
        }
        output.push('\n');
    }

    fn render_dependencies(&self, output: &mut String, tree: &DependencyTree) {
        output.push_str("## Dependencies\n\n");
        if tree.dependencies.is_empty() {
            output.push_str("No dependencies.\n\n");
            return;
        }
        self.render_dependency_level(output, tree, 0);
        output.push('\n');
    }

    fn render_dependency_level(&self, output: &mut String, tree: &DependencyTree, level: usize) {
        for node in &tree.dependencies {
            let record = &node.tree.record;
            let mut line = format!("{}- `{}`", "  ".repeat(level), record.gav);

            if record.unresolved {
                line.push_str(" ⚠️ unresolved");
            } else {
                line.push_str(&format!(
                    " ({}, {})",
                    format_size(record.package_size),
                    format_bytecode(record.bytecode_version)
                ));
            }
            if node.scope != "compile" {
                line.push_str(&format!(" [{}]", node.scope));
            }
            if node.optional {
                line.push_str(" [optional]");
            }

            output.push_str(&line);
            output.push('\n');
            self.render_dependency_level(output, &node.tree, level + 1);
        }
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, tree: &DependencyTree, total_size: Option<u64>) -> Result<String> {
        let mut output = String::new();

        self.render_header(&mut output, &tree.record);
        if tree.record.unresolved {
            self.render_unresolved(&mut output, &tree.record);
            return Ok(output);
        }
        self.render_summary(&mut output, tree, total_size);
        self.render_license_breakdown(&mut output, &tree.record);
        self.render_dependencies(&mut output, tree);

        Ok(output)
    }
}
