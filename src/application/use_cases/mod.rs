/// Use cases module containing application business logic orchestration
mod analyze_package;

pub use analyze_package::AnalyzePackageUseCase;
