use chrono::Local;
use clap::Subcommand;
use nudgeroom_core::Config;

use super::{open_history, CliResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List fired nudges, newest first
    List {
        /// Maximum number of entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Only unread nudges
        #[arg(long)]
        unread: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one nudge
    Show {
        /// Nudge ID
        id: String,
    },
    /// Mark a nudge as read
    Read {
        /// Nudge ID
        id: String,
    },
    /// Record the action taken on a nudge
    Act {
        /// Nudge ID
        id: String,
        /// Action ID (e.g. "snooze", "start_break")
        action: String,
    },
    /// Delete all history
    Clear,
}

pub fn run(action: HistoryAction) -> CliResult {
    let config = Config::load()?;
    let history = open_history(&config)?;

    match action {
        HistoryAction::List {
            limit,
            unread,
            json,
        } => {
            let mut items = history.recent(history.limit());
            if unread {
                items.retain(|i| !i.read);
            }
            items.truncate(limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("no nudges");
            } else {
                for item in &items {
                    let flag = if item.read { " " } else { "*" };
                    println!(
                        "{flag} {}  {}  {:<17} {} {}",
                        item.id(),
                        item.fired_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        item.nudge_type().as_str(),
                        item.nudge.emoji,
                        item.nudge.title
                    );
                }
                println!("{} unread", history.unread_count());
            }
        }
        HistoryAction::Show { id } => {
            let item = history
                .get(&id)
                .ok_or_else(|| format!("nudge not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        HistoryAction::Read { id } => {
            if history.get(&id).is_none() {
                return Err(format!("nudge not found: {id}").into());
            }
            if history.mark_read(&id) {
                println!("ok");
            } else {
                println!("already read");
            }
        }
        HistoryAction::Act { id, action } => {
            let item = history
                .get(&id)
                .ok_or_else(|| format!("nudge not found: {id}"))?;
            if !history.mark_action(&id, &action) {
                let taken = item.action_taken.unwrap_or_default();
                return Err(format!("action already recorded for {id}: {taken}").into());
            }
            println!("ok");
        }
        HistoryAction::Clear => {
            history.clear();
            println!("history cleared");
        }
    }
    Ok(())
}
