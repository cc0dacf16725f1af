use std::path::PathBuf;

use clap::Args;
use parley_core::domain::contract::{
    ContractDraftRequest, ContractTerms, ContractType, NewContract, Party,
};
use parley_db::DEMO_USER_ID;
use serde_json::json;

use crate::commands::{
    application_failure, build_runtime, correlation_id, load_config, parse_user, CommandResult,
    Failure, Workbench,
};

#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    #[arg(long = "type", help = "nda|service_agreement|partnership|employment|general")]
    pub contract_type: String,
    #[arg(long = "party", help = "Party as `name` or `name:role`; repeat for each party")]
    pub parties: Vec<String>,
    #[arg(long)]
    pub jurisdiction: Option<String>,
    #[arg(long, help = "Additional requirements for the drafter")]
    pub requirements: Option<String>,
    #[arg(long)]
    pub start_date: Option<String>,
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long)]
    pub duration: Option<String>,
    #[arg(long)]
    pub payment_amount: Option<String>,
    #[arg(long)]
    pub payment_terms: Option<String>,
    #[arg(long)]
    pub deliverables: Option<String>,
    #[arg(long, help = "Save the draft under this title")]
    pub save_title: Option<String>,
    #[arg(long, default_value = DEMO_USER_ID, help = "Owner of the saved draft")]
    pub user: String,
    #[arg(long, help = "Write the contract text to this file")]
    pub out: Option<PathBuf>,
}

impl GenerateArgs {
    fn draft_request(&self) -> ContractDraftRequest {
        ContractDraftRequest {
            contract_type: Some(ContractType::from(self.contract_type.clone())),
            parties: self.parties.iter().map(|raw| parse_party(raw)).collect(),
            terms: ContractTerms {
                start_date: self.start_date.clone(),
                end_date: self.end_date.clone(),
                duration: self.duration.clone(),
                payment_amount: self.payment_amount.clone(),
                payment_terms: self.payment_terms.clone(),
                deliverables: self.deliverables.clone(),
            },
            jurisdiction: self.jurisdiction.clone(),
            custom_requirements: self.requirements.clone(),
        }
    }
}

pub fn run(args: GenerateArgs) -> CommandResult {
    let config = match load_config("generate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("generate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let workbench = Workbench::open(&config).await?;
        let outcome = generate(&workbench, &args).await;
        workbench.pool.close().await;
        outcome
    });

    match result {
        Ok(data) => CommandResult::success_with_data("generate", "contract generated", Some(data)),
        Err(failure) => CommandResult::from_failure("generate", failure),
    }
}

async fn generate(
    workbench: &Workbench,
    args: &GenerateArgs,
) -> Result<serde_json::Value, Failure> {
    let correlation_id = correlation_id("generate");
    let generated = workbench
        .drafter
        .generate(args.draft_request(), &correlation_id)
        .await
        .map_err(application_failure)?;

    if let Some(path) = &args.out {
        tokio::fs::write(path, generated.contract.as_bytes()).await.map_err(|error| {
            ("io", format!("could not write {}: {error}", path.display()), 10u8)
        })?;
    }

    let saved = match &args.save_title {
        Some(title) => {
            let user_id = parse_user(&args.user)?;
            let input = NewContract {
                title: title.clone(),
                content: generated.contract.clone(),
                contract_type: generated.contract_type.clone(),
            };
            let contract = workbench
                .drafter
                .save(&user_id, input, &correlation_id)
                .await
                .map_err(application_failure)?;
            Some(contract)
        }
        None => None,
    };

    Ok(json!({ "generated": generated, "saved": saved }))
}

fn parse_party(raw: &str) -> Party {
    match raw.split_once(':') {
        Some((name, role)) => Party {
            name: name.trim().to_string(),
            role: role.trim().to_string(),
            ..Party::default()
        },
        None => Party::named(raw.trim()),
    }
}
