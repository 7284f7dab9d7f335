//! Command definitions and handlers.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use grabar::generate::GenerateRequest;
use grabar::prelude::*;

use crate::error::{CliError, CliResult};
use crate::output::{self, OutputFormat};

/// Grabar: turn recorded browser interactions into maintainable test
/// bundles.
#[derive(Debug, Parser)]
#[command(name = "grabar", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a test bundle from a capture request file
    Generate(GenerateArgs),
    /// Apply a targeted edit to an existing bundle
    Update(UpdateArgs),
    /// Run cleanup + parameter detection over raw captured source
    Refine(RefineArgs),
    /// Grade a locator for uniqueness and robustness
    Inspect(InspectArgs),
    /// List bundles under a root with completeness state
    List(ListArgs),
}

/// Arguments for `generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Capture request file (JSON, as handed over by the recorder shell)
    #[arg(long)]
    pub request: PathBuf,
    /// Bundle root directory
    #[arg(long)]
    pub root: PathBuf,
    /// Override the test display name
    #[arg(long)]
    pub name: Option<String>,
    /// Override the functional module
    #[arg(long)]
    pub module: Option<String>,
}

/// Arguments for `update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Bundle slug
    pub slug: String,
    /// Bundle root directory
    #[arg(long)]
    pub root: PathBuf,
    #[command(subcommand)]
    pub op: UpdateOp,
}

/// Step edit operations.
#[derive(Debug, Subcommand)]
pub enum UpdateOp {
    /// Append a step at the end of the test body
    AddStep {
        /// Step title for the marker comment
        #[arg(long)]
        title: String,
        /// Statement body
        #[arg(long)]
        body: String,
    },
    /// Insert a step before an index
    InsertStep {
        /// Target position
        index: usize,
        /// Step title for the marker comment
        #[arg(long)]
        title: String,
        /// Statement body
        #[arg(long)]
        body: String,
    },
    /// Delete the step at an index
    DeleteStep {
        /// Target step
        index: usize,
    },
    /// Replace the body of the step at an index
    UpdateStep {
        /// Target step
        index: usize,
        /// New statement body
        #[arg(long)]
        body: String,
    },
    /// Move a step range to a new position
    Reorder {
        /// First step of the range
        #[arg(long)]
        from_start: usize,
        /// Last step of the range (inclusive)
        #[arg(long)]
        from_end: usize,
        /// Destination position among the remaining steps
        #[arg(long)]
        to: usize,
    },
}

/// Arguments for `refine`.
#[derive(Debug, Args)]
pub struct RefineArgs {
    /// Raw captured source file
    pub input: PathBuf,
    /// Write the cleaned source back instead of printing it
    #[arg(long)]
    pub in_place: bool,
    /// Only print parameter candidates
    #[arg(long)]
    pub candidates_only: bool,
}

/// Locator strategy argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// ARIA role
    Role,
    /// Accessible label
    Label,
    /// Placeholder text
    Placeholder,
    /// Visible text
    Text,
    /// data-testid attribute
    TestId,
    /// CSS selector
    Css,
    /// XPath expression
    Xpath,
}

/// Arguments for `inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Selector text (role name, label text, CSS, ...)
    #[arg(long)]
    pub selector: String,
    /// Addressing strategy
    #[arg(long, value_enum)]
    pub strategy: StrategyArg,
    /// Accessible-name qualifier for role locators
    #[arg(long)]
    pub name: Option<String>,
    /// DOM snapshot file (JSON fixture) to grade against
    #[arg(long, conflicts_with = "url")]
    pub snapshot: Option<PathBuf>,
    /// Live page URL (requires the `browser` feature)
    #[arg(long)]
    pub url: Option<String>,
}

/// Arguments for `list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Bundle root directory
    #[arg(long)]
    pub root: PathBuf,
}

fn build_locator(args: &InspectArgs) -> Locator {
    match args.strategy {
        StrategyArg::Role => Locator::role(&args.selector, args.name.clone()),
        StrategyArg::Label => Locator::label(&args.selector),
        StrategyArg::Placeholder => Locator::placeholder(&args.selector),
        StrategyArg::Text => Locator::text(&args.selector),
        StrategyArg::TestId => Locator::test_id(&args.selector),
        StrategyArg::Css => Locator::css(&args.selector),
        StrategyArg::Xpath => Locator::xpath(&args.selector),
    }
}

/// Run `generate`.
pub fn run_generate(format: OutputFormat, args: &GenerateArgs) -> CliResult<()> {
    let text = std::fs::read_to_string(&args.request)?;
    let mut request: GenerateRequest = serde_json::from_str(&text)?;
    if let Some(name) = &args.name {
        request.test_name = name.clone();
    }
    if let Some(module) = &args.module {
        request.module = Some(module.clone());
    }

    let bundle = SpecGenerator::new(&args.root).generate(&request)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "slug": bundle.paths.slug,
                "spec": bundle.paths.spec,
                "metaJson": bundle.paths.meta_json,
                "metaMd": bundle.paths.meta_md,
                "dataFile": bundle.has_data_file.then_some(&bundle.paths.data_file),
            })
        ),
        OutputFormat::Text => {
            output::print_ok(&format!(
                "generated bundle '{}' at {}",
                bundle.paths.slug,
                bundle.paths.dir.display()
            ));
        }
    }
    Ok(())
}

/// Run `update`.
pub fn run_update(format: OutputFormat, args: &UpdateArgs) -> CliResult<()> {
    let updater = SpecUpdater::new(&args.root);
    let edit = match &args.op {
        UpdateOp::AddStep { title, body } => updater.add_step(&args.slug, title, body)?,
        UpdateOp::InsertStep { index, title, body } => {
            updater.insert_step(&args.slug, *index, title, body)?
        }
        UpdateOp::DeleteStep { index } => updater.delete_step(&args.slug, *index)?,
        UpdateOp::UpdateStep { index, body } => updater.update_step(&args.slug, *index, body)?,
        UpdateOp::Reorder {
            from_start,
            from_end,
            to,
        } => updater.reorder_steps(&args.slug, (*from_start, *from_end), *to)?,
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "slug": args.slug, "updatedSpans": edit.updated_spans })
        ),
        OutputFormat::Text => output::print_ok(&format!("updated bundle '{}'", args.slug)),
    }
    Ok(())
}

/// Run `refine`.
pub fn run_refine(format: OutputFormat, args: &RefineArgs) -> CliResult<()> {
    let raw = std::fs::read_to_string(&args.input)?;
    let cleaned = NavigationCleanup::default().apply(&raw);
    let candidates = detect(&cleaned.source);

    if args.in_place && !cleaned.is_unchanged() {
        std::fs::write(&args.input, &cleaned.source)?;
    }
    if !args.candidates_only && !args.in_place {
        print!("{}", cleaned.source);
    }
    output::print_candidates(format, &candidates);
    Ok(())
}

/// Run `inspect`.
pub fn run_inspect(format: OutputFormat, args: &InspectArgs) -> CliResult<()> {
    let locator = build_locator(args);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let evaluation = if let Some(url) = &args.url {
        inspect_live(&runtime, url, &locator)?
    } else {
        let snapshot = args.snapshot.as_ref().ok_or(CliError::InvalidArgument {
            message: "pass --snapshot <file> or --url <page>".to_string(),
        })?;
        let probe: StaticDomProbe = serde_json::from_str(&std::fs::read_to_string(snapshot)?)?;
        runtime.block_on(evaluate(&probe, &locator, &EvaluatorOptions::default()))
    };

    output::print_evaluation(format, &evaluation);
    Ok(())
}

#[cfg(feature = "browser")]
fn inspect_live(
    runtime: &tokio::runtime::Runtime,
    url: &str,
    locator: &Locator,
) -> CliResult<LocatorEvaluation> {
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    runtime.block_on(async {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| CliError::Browser { message: e })?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CliError::Browser {
                message: e.to_string(),
            })?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page(url).await.map_err(|e| CliError::Browser {
            message: e.to_string(),
        })?;
        let probe = grabar::evaluator::cdp::CdpProbe::new(Arc::new(Mutex::new(page)));
        let evaluation = evaluate(&probe, locator, &EvaluatorOptions::default()).await;
        drop(browser);
        handle.abort();
        Ok(evaluation)
    })
}

#[cfg(not(feature = "browser"))]
fn inspect_live(
    _runtime: &tokio::runtime::Runtime,
    _url: &str,
    _locator: &Locator,
) -> CliResult<LocatorEvaluation> {
    Err(CliError::Browser {
        message: "rebuild with --features browser for live inspection".to_string(),
    })
}

/// Run `list`.
pub fn run_list(format: OutputFormat, args: &ListArgs) -> CliResult<()> {
    let bundles = list_bundles(&args.root)?;
    output::print_bundles(format, &bundles);
    Ok(())
}
