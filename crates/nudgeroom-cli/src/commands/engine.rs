use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use clap::Args;
use nudgeroom_core::storage::data_dir;
use nudgeroom_core::{
    Config, JsonFileContext, MemoryChannel, NudgeEngine, NudgeScheduler, PushChannel, PushError,
    PushPayload, SystemClock,
};
use serde_json::json;

use super::{open_store, CliResult};

#[derive(Args)]
pub struct TickArgs {
    /// Context JSON file (default: <data dir>/context.json)
    #[arg(long)]
    context: Option<PathBuf>,
    /// Evaluate at this RFC 3339 instant instead of now; its offset is the local offset
    #[arg(long)]
    at: Option<String>,
    /// Print the tick report as JSON instead of showing notifications
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct RunArgs {
    /// Context JSON file (default: <data dir>/context.json)
    #[arg(long)]
    context: Option<PathBuf>,
}

/// Prints notifications to stdout.
struct ConsolePushChannel;

impl PushChannel for ConsolePushChannel {
    fn send(&self, payload: &PushPayload) -> Result<(), PushError> {
        let stamp = Local::now().format("%H:%M");
        println!("[{stamp}] {}", payload.title);
        println!("    {}", payload.body);
        if !payload.actions.is_empty() {
            let actions: Vec<String> = payload
                .actions
                .iter()
                .map(|a| format!("{} ({})", a.title, a.action))
                .collect();
            println!("    actions: {}", actions.join(", "));
        }
        println!("    id: {}", payload.data.nudge_id);
        Ok(())
    }
}

fn context_source(path: Option<PathBuf>) -> Result<JsonFileContext, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path,
        None => data_dir()?.join("context.json"),
    };
    Ok(JsonFileContext::new(path))
}

pub fn tick(args: TickArgs) -> CliResult {
    let config = Config::load()?;
    let channel: Arc<dyn PushChannel> = if args.json {
        Arc::new(MemoryChannel::new())
    } else {
        Arc::new(ConsolePushChannel)
    };
    let mut engine = NudgeEngine::new(
        &config,
        open_store()?,
        Arc::new(context_source(args.context)?),
        channel,
    )?;

    let (now, offset) = match args.at.as_deref() {
        Some(at) => {
            let at = DateTime::parse_from_rfc3339(at)
                .map_err(|e| format!("invalid --at '{at}': {e}"))?;
            (at.with_timezone(&Utc), *at.offset())
        }
        None => (Utc::now(), *Local::now().offset()),
    };

    let report = engine.tick(now, offset);
    if let Some(err) = report.context_error {
        return Err(format!("context unavailable: {err}").into());
    }

    if args.json {
        let out = json!({
            "fired": report
                .fired
                .iter()
                .map(|f| json!({
                    "nudge": f.nudge,
                    "displayed": f.outcome.is_displayed(),
                }))
                .collect::<Vec<_>>(),
            "rejected": report
                .rejected
                .iter()
                .map(|(t, reason)| json!({ "type": t, "reason": reason.to_string() }))
                .collect::<Vec<_>>(),
            "failed": report
                .failed
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (t, reason) in &report.rejected {
            eprintln!("skipped {t}: {reason}");
        }
        for failure in &report.failed {
            eprintln!("trigger failed: {failure}");
        }
        if report.is_quiet() {
            println!("no nudges");
        }
    }
    Ok(())
}

pub async fn run(args: RunArgs) -> CliResult {
    let config = Config::load()?;
    let engine = NudgeEngine::new(
        &config,
        open_store()?,
        Arc::new(context_source(args.context)?),
        Arc::new(ConsolePushChannel),
    )?;

    let engine = Arc::new(tokio::sync::Mutex::new(engine));
    let mut scheduler = NudgeScheduler::new(engine, Arc::new(SystemClock), config.tick_interval());
    scheduler.start();
    println!(
        "watching for nudges every {}s, press Ctrl-C to stop",
        config.tick_interval().as_secs()
    );

    tokio::signal::ctrl_c().await?;
    scheduler.stop().await;
    Ok(())
}
