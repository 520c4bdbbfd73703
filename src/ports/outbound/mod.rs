/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (registry, storage, console, etc.).
pub mod binary_inspector;
pub mod descriptor_resolver;
pub mod graph_store;
pub mod output_presenter;
pub mod progress_reporter;
pub mod registry_client;
pub mod report_formatter;

pub use binary_inspector::{BinaryInspector, PackageInfo};
pub use descriptor_resolver::{DescriptorInfo, DescriptorResolver};
pub use graph_store::GraphStore;
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use registry_client::{FilesInfo, RegistryClient, SearchHit};
pub use report_formatter::ReportFormatter;
