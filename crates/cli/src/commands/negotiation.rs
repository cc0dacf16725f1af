//! Negotiation commands. Each invocation opens a fresh session for `--user`, so the
//! selection never outlives the command.

use std::str::FromStr;

use clap::Args;
use parley_core::domain::negotiation::{NegotiationId, NewNegotiation, Strategy};
use parley_db::DEMO_USER_ID;
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::{
    application_failure, build_runtime, load_config, parse_user, CommandResult, Failure,
    Workbench,
};

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long, default_value = DEMO_USER_ID, help = "Owner of the negotiations")]
    pub user: String,
    #[arg(long, help = "Return at most this many negotiations, newest first")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    #[arg(long, default_value = DEMO_USER_ID)]
    pub user: String,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub counterparty: Option<String>,
    #[arg(long, help = "Deal value, e.g. 120000 or 99.50")]
    pub deal_value: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TranscriptArgs {
    #[arg(long, default_value = DEMO_USER_ID)]
    pub user: String,
    #[arg(long)]
    pub negotiation: String,
}

#[derive(Debug, Clone, Args)]
pub struct SendArgs {
    #[arg(long, default_value = DEMO_USER_ID)]
    pub user: String,
    #[arg(long)]
    pub negotiation: String,
    #[arg(long)]
    pub message: String,
    #[arg(long, default_value = "balanced", help = "balanced|aggressive|collaborative|defensive")]
    pub strategy: String,
}

pub fn list(args: ListArgs) -> CommandResult {
    run_with_workbench("negotiations", |workbench| async move {
        let user_id = parse_user(&args.user)?;
        let negotiations = workbench.session(user_id).negotiations(args.limit).await;
        let message = format!("{} negotiation(s)", negotiations.len());
        Ok::<_, Failure>((message, json!(negotiations)))
    })
}

pub fn create(args: CreateArgs) -> CommandResult {
    run_with_workbench("new-negotiation", |workbench| async move {
        let user_id = parse_user(&args.user)?;
        let deal_value = args.deal_value.as_deref().map(parse_deal_value).transpose()?;
        let input = NewNegotiation {
            title: args.title,
            description: args.description,
            counterparty_name: args.counterparty,
            deal_value,
        };

        let mut session = workbench.session(user_id);
        let negotiation = session.create(input).await.map_err(application_failure)?;
        Ok::<_, Failure>((format!("created negotiation {}", negotiation.id), json!(negotiation)))
    })
}

pub fn messages(args: TranscriptArgs) -> CommandResult {
    run_with_workbench("messages", |workbench| async move {
        let user_id = parse_user(&args.user)?;
        let mut session = workbench.session(user_id);
        session.select(&NegotiationId(args.negotiation)).await.map_err(application_failure)?;

        let transcript = session.transcript();
        Ok::<_, Failure>((format!("{} message(s)", transcript.len()), json!(transcript)))
    })
}

pub fn send(args: SendArgs) -> CommandResult {
    run_with_workbench("send", |workbench| async move {
        let user_id = parse_user(&args.user)?;
        let strategy = parse_strategy(&args.strategy)?;

        let mut session = workbench.session(user_id);
        session.select(&NegotiationId(args.negotiation)).await.map_err(application_failure)?;
        session.set_strategy(strategy);
        let reply = session.send(&args.message).await.map_err(application_failure)?;

        let data = json!({ "reply": reply, "transcript_length": session.transcript().len() });
        Ok::<_, Failure>(("assistant replied".to_string(), data))
    })
}

fn run_with_workbench<F, Fut>(command: &'static str, body: F) -> CommandResult
where
    F: FnOnce(Workbench) -> Fut,
    Fut: std::future::Future<Output = Result<(String, serde_json::Value), Failure>>,
{
    let config = match load_config(command) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let workbench = Workbench::open(&config).await?;
        let pool = workbench.pool.clone();
        let outcome = body(workbench).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data(command, message, Some(data)),
        Err(failure) => CommandResult::from_failure(command, failure),
    }
}

fn parse_deal_value(raw: &str) -> Result<Decimal, Failure> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    Decimal::from_str(&cleaned)
        .map_err(|_| ("validation", format!("deal value `{raw}` is not a number"), 7u8))
}

fn parse_strategy(raw: &str) -> Result<Strategy, Failure> {
    Strategy::parse(raw).ok_or_else(|| {
        (
            "validation",
            format!(
                "unknown strategy `{raw}` (expected balanced|aggressive|collaborative|defensive)"
            ),
            7u8,
        )
    })
}
