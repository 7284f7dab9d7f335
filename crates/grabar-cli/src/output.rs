//! Output formatting for CLI results

use console::style;
use grabar::prelude::*;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Print a bundle listing.
pub fn print_bundles(format: OutputFormat, bundles: &[BundleSummary]) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(bundles).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Text => {
            if bundles.is_empty() {
                println!("no bundles");
                return;
            }
            for bundle in bundles {
                let state = match bundle.state {
                    BundleState::Complete => style("complete").green(),
                    BundleState::SpecOnly => style("spec only").yellow(),
                    BundleState::MetaOnly => style("meta only").yellow(),
                    BundleState::Missing => style("missing").red(),
                };
                println!("{:40} {}", bundle.slug, state);
            }
        }
    }
}

/// Print a locator evaluation.
pub fn print_evaluation(format: OutputFormat, evaluation: &LocatorEvaluation) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(evaluation).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Text => {
            let level = |l: Level| match l {
                Level::Excellent => style("excellent").green(),
                Level::Good => style("good").green(),
                Level::Fair => style("fair").yellow(),
                Level::Poor => style("poor").red(),
            };
            println!(
                "locator    {} ({})",
                evaluation.locator.selector,
                style(evaluation.locator.strategy.as_str()).dim()
            );
            println!(
                "quality    {} — {}",
                level(evaluation.quality.level),
                evaluation.quality.reason
            );
            println!(
                "uniqueness {} (matches: {})",
                if evaluation.uniqueness.is_unique {
                    style("unique").green()
                } else {
                    style("not unique").red()
                },
                evaluation.uniqueness.match_count
            );
            println!(
                "usability  {} [{}] — {}",
                level(evaluation.usability.level),
                evaluation.usability.score,
                evaluation.usability.recommendation
            );
        }
    }
}

/// Print parameter candidates.
pub fn print_candidates(format: OutputFormat, candidates: &[ParameterCandidate]) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(candidates).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Text => {
            if candidates.is_empty() {
                println!("no parameter candidates");
                return;
            }
            for candidate in candidates {
                let label = if candidate.label.is_empty() {
                    style("(no label)").dim().to_string()
                } else {
                    candidate.label.clone()
                };
                println!(
                    "{:24} '{}' -> {}",
                    label,
                    candidate.original_value,
                    style(&candidate.suggested_name).cyan()
                );
            }
        }
    }
}

/// Success line for a completed operation.
pub fn print_ok(message: &str) {
    println!("{} {}", style("ok").green().bold(), message);
}
