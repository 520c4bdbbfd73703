/// Network adapters for the remote package repository
mod http_fetcher;
mod jar_inspector;
mod maven_central_client;
mod pom_descriptor_resolver;
mod repository_layout;
mod xml_tree;

pub use http_fetcher::HttpFetcher;
pub use jar_inspector::JarInspector;
pub use maven_central_client::MavenCentralClient;
pub use pom_descriptor_resolver::PomDescriptorResolver;
pub use repository_layout::RepositoryLayout;
