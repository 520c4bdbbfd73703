mod license_categorizer;
mod version_ordering;

pub use license_categorizer::LicenseCategorizer;
pub use version_ordering::ComparableVersion;
