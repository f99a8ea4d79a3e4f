use clap::Parser;
use repair_advisor::{cli, config, error, analyzer, request};
use repair_advisor_common::RepairPlan;
use analyzer::{Pipeline, PipelineOutcome};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use request::{ImageInput, RepairRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(provider) = cli.ai_provider {
        config.ai_provider = provider;
    }

    match cli.command {
        Commands::Analyze { image, description, skill_level, budget, location, output, json } => {
            println!("🔧 repair-advisor - repair analysis\n");

            // 1. Photo
            println!("[1/3] Loading photo...");
            let image = ImageInput::from_path(&image)?;
            println!("✔ {} ({} bytes)\n", image.media_type, image.bytes.len());

            let request = RepairRequest {
                description,
                skill_level,
                budget_preference: budget,
                location,
                image: Some(image),
            };

            // 2-3. Analysis + narrative
            let pipeline = Pipeline::from_config(&config)?;
            let outcome = pipeline
                .run_with_progress(request, |current, total, message| {
                    println!("[{}/{}] {}", current + 1, total + 1, message);
                })
                .await?;

            if let Some(path) = output {
                std::fs::write(&path, serde_json::to_string_pretty(&outcome)?)?;
                println!("✔ Result saved: {}", path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }

            // already reported above; only the exit status is left
            if outcome.failure().is_some() {
                if json {
                    if let Some(line) = failure_line(&outcome) {
                        eprintln!("{}", line);
                    }
                }
                std::process::exit(1);
            }
            println!("\n✅ Done");
        }

        Commands::Config { set_api_key, show } => {
            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key saved ({})", config.ai_provider.name());
            }

            if show {
                println!("Settings:");
                println!("  Provider: {}", config.ai_provider.name());
                println!("  Analysis model: {}", config.analysis_model());
                println!("  Narrative model: {}", config.narrative_model());
                println!("  Endpoint: {}", config.base_url());
                println!("  Timeout: {}s", config.timeout_seconds);
                println!(
                    "  Defaults: {} / {} / {}",
                    config.default_skill_level, config.default_budget, config.default_location
                );
                println!(
                    "  API key: {}",
                    if config.get_api_key().is_ok() { "set" } else { "not set" }
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_outcome(outcome: &PipelineOutcome) {
    if let Some(data) = &outcome.data {
        print_summary(&data.plan());
    }

    if let Some(text) = &outcome.human_text {
        println!("\n{}", text);
    }

    if let Some(line) = failure_line(outcome) {
        println!("\n{}", line);
    }
}

fn failure_line(outcome: &PipelineOutcome) -> Option<String> {
    let err = outcome.failure()?;
    Some(format!("✖ {} failed ({}): {}", stage_name(outcome), err.kind, err.message))
}

fn stage_name(outcome: &PipelineOutcome) -> &'static str {
    match outcome.stage {
        Some(analyzer::Stage::Humanization) => "Narrative",
        _ => "Analysis",
    }
}

fn print_summary(plan: &RepairPlan) {
    println!("\nDiagnosis: {}", plan.diagnosis);
    if let Some(difficulty) = &plan.difficulty {
        println!("Difficulty: {}", difficulty);
    }
    println!("Steps: {}  Tools: {}  Materials: {}", plan.steps.len(), plan.tools.len(), plan.materials.len());

    if let Some(minutes) = plan.active_minutes() {
        println!("Hands-on time: ~{:.0} min", minutes);
    }
    if let Some(cost) = &plan.cost {
        if let Some(total) = cost.diy_total() {
            println!("DIY cost: ~{:.2} {}", total, cost.currency);
        }
        if let Some(pro) = cost.pro_total_cost_estimate {
            println!("Professional: ~{:.2} {}", pro, cost.currency);
        }
    } else if !plan.materials.is_empty() {
        println!("Materials: ~{:.2}", plan.estimated_materials_cost());
    }
    if plan.should_call_professional {
        println!("⚠ A professional is recommended:");
        for reason in &plan.professional_escalation_reasons {
            println!("  - {}", reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(json: &str) -> PipelineOutcome {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_failure_line_is_plain_text() {
        let failed = outcome(
            r#"{"success": false, "error": "quota exceeded", "errorKind": "transport_error", "stage": "humanization"}"#,
        );
        let line = failure_line(&failed).unwrap();

        assert_eq!(line, "✖ Narrative failed (transport_error): quota exceeded");
        assert!(!line.contains("AnalysisFailed"));
        assert!(!line.contains('{'));
    }

    #[test]
    fn test_failure_line_absent_on_success() {
        let done = outcome(r#"{"success": true, "humanText": "All set."}"#);
        assert!(failure_line(&done).is_none());
    }
}
