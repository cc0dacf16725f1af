use std::path::PathBuf;

use clap::Args;
use parley_agent::ContractAnalyzer;
use parley_core::domain::analysis::AnalysisRequest;
use serde_json::json;

use crate::commands::{
    application_failure, build_runtime, correlation_id, load_config, model_client,
    prompt_builder, CommandResult,
};

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    #[arg(long, conflicts_with = "file", help = "Contract text to analyze")]
    pub text: Option<String>,
    #[arg(long, help = "Plain-text (.txt) contract file to analyze")]
    pub file: Option<PathBuf>,
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    let config = match load_config("analyze") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("analyze") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let analyzer = ContractAnalyzer::new(model_client(&config)?, prompt_builder()?);
        let correlation_id = correlation_id("analyze");

        let analysis = match &args.file {
            Some(path) => analyzer.analyze_file(path, &correlation_id).await,
            None => {
                let request = AnalysisRequest::full(args.text.clone().unwrap_or_default());
                analyzer.analyze(request, &correlation_id).await
            }
        };
        analysis.map_err(application_failure)
    });

    match result {
        Ok(analysis) => CommandResult::success_with_data(
            "analyze",
            "contract analyzed",
            Some(json!(analysis)),
        ),
        Err(failure) => CommandResult::from_failure("analyze", failure),
    }
}

