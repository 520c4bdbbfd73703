use artifact_graph::adapters::outbound::console::StderrProgressReporter;
use artifact_graph::adapters::outbound::network::{
    HttpFetcher, JarInspector, MavenCentralClient, PomDescriptorResolver, RepositoryLayout,
};
use artifact_graph::adapters::outbound::storage::InMemoryGraphStore;
use artifact_graph::application::dto::{AnalysisRequest, AnalysisTarget, OutputFormat};
use artifact_graph::application::factories::{FormatterFactory, PresenterFactory};
use artifact_graph::application::services::{AnalysisOrchestrator, RetrySweeper};
use artifact_graph::application::use_cases::AnalyzePackageUseCase;
use artifact_graph::cli::{Args, Command};
use artifact_graph::config::{discover_config, load_config_from_path, Settings};
use artifact_graph::ports::outbound::{
    OutputPresenter, ProgressReporter, RegistryClient, ReportFormatter,
};
use artifact_graph::shared::error::ExitCode;
use artifact_graph::shared::Result;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Everything a command needs, wired from the effective settings
struct App {
    settings: Settings,
    store_path: PathBuf,
    store: Arc<InMemoryGraphStore>,
    registry: Arc<MavenCentralClient>,
    orchestrator: Arc<AnalysisOrchestrator>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse_args();
    init_tracing(args.verbose);

    let exit_code = match run(args).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            print_error(&e);
            ExitCode::for_error(&e)
        }
    };
    std::process::ExitCode::from(exit_code.as_i32() as u8)
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`
fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "artifact_graph=info",
        1 => "artifact_graph=debug",
        _ => "artifact_graph=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_error(error: &anyhow::Error) {
    let heading = "❌ An error occurred:";
    if std::io::stderr().is_terminal() {
        eprintln!("\n{}\n", heading.red().bold());
    } else {
        eprintln!("\n{}\n", heading);
    }
    eprintln!("{}", error);

    // Display error chain
    for cause in error.chain().skip(1) {
        eprintln!("\nCaused by: {}", cause);
    }
    eprintln!();
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Some(load_config_from_path(path)?),
        None => discover_config(&std::env::current_dir()?)?,
    };
    let settings = Settings::from_config(config);
    let app = App::wire(settings, args.store)?;

    match args.command {
        Command::Analyze {
            target,
            depth,
            format,
            output,
        } => {
            let outcome = app.analyze(target, depth, format, output).await;
            app.save()?;
            outcome
        }
        Command::Versions {
            group_id,
            artifact_id,
        } => app.versions(&group_id, &artifact_id).await,
        Command::Search { query } => app.search(&query).await,
        Command::Sweep { once } => {
            let outcome = app.sweep(once).await;
            app.save()?;
            outcome
        }
    }
}

impl App {
    fn wire(settings: Settings, store_override: Option<PathBuf>) -> Result<Self> {
        let store_path = store_override.unwrap_or_else(|| settings.store_path.clone());
        let store = Arc::new(InMemoryGraphStore::open(&store_path)?);

        let fetcher = Arc::new(HttpFetcher::new(
            settings.request_timeout,
            settings.max_retries,
        )?);
        let layout = RepositoryLayout::new(settings.repository_url.clone());
        let registry = Arc::new(MavenCentralClient::new(
            fetcher.clone(),
            layout.clone(),
            settings.search_url.clone(),
        ));
        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            registry.clone(),
            Arc::new(PomDescriptorResolver::new(fetcher.clone(), layout.clone())),
            Arc::new(JarInspector::new(fetcher, layout)),
            store.clone(),
        ));

        Ok(Self {
            settings,
            store_path,
            store,
            registry,
            orchestrator,
        })
    }

    fn save(&self) -> Result<()> {
        self.store.save_snapshot(&self.store_path)
    }

    async fn analyze(
        &self,
        target: AnalysisTarget,
        depth: Option<usize>,
        format: OutputFormat,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let progress_reporter = StderrProgressReporter::new();
        let use_case = AnalyzePackageUseCase::new(
            self.orchestrator.clone(),
            self.registry.clone(),
            StderrProgressReporter::new(),
        );

        let response = use_case
            .execute(AnalysisRequest::new(target, depth))
            .await?;
        let Some(tree) = response.tree else {
            progress_reporter.report(&format!(
                "⏳ Analysis of {} is still in progress",
                response.gav
            ));
            return Ok(());
        };

        progress_reporter.report(FormatterFactory::progress_message(format));
        let formatted_output =
            FormatterFactory::create(format).format(&tree, response.total_size)?;
        PresenterFactory::for_output(output).present(&formatted_output)
    }

    async fn versions(&self, group_id: &str, artifact_id: &str) -> Result<()> {
        let versions = self.registry.list_versions(group_id, artifact_id).await?;
        println!("{}", versions.join("\n"));
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<()> {
        let hits = self.registry.search(query).await?;
        if hits.is_empty() {
            eprintln!("No artifacts found for '{}'", query);
            return Ok(());
        }
        for hit in hits {
            match hit.latest_version {
                Some(version) => println!("{}:{} ({})", hit.group_id, hit.artifact_id, version),
                None => println!("{}:{}", hit.group_id, hit.artifact_id),
            }
        }
        Ok(())
    }

    async fn sweep(&self, once: bool) -> Result<()> {
        let progress_reporter = StderrProgressReporter::new();
        let sweeper = RetrySweeper::new(self.orchestrator.clone(), self.settings.sweeper.clone());

        if once {
            let retried = sweeper.run_once().await?;
            progress_reporter.report_completion(&format!(
                "✅ Retried {} unresolved package(s)",
                retried
            ));
            return Ok(());
        }

        sweeper.start()?;
        progress_reporter.report("🔁 Retry sweeper running, press Ctrl-C to stop");
        let interrupted = tokio::signal::ctrl_c().await;
        progress_reporter.report("⏹  Stopping retry sweeper...");
        sweeper.stop().await?;
        interrupted?;

        progress_reporter.report_completion(&format!(
            "✅ Retried {} unresolved package(s)",
            sweeper.processed_count()
        ));
        Ok(())
    }
}
