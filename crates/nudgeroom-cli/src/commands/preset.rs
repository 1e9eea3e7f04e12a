use clap::Subcommand;
use nudgeroom_core::{Config, Intensity, NudgeType};

use super::CliResult;

#[derive(Subcommand)]
pub enum PresetAction {
    /// List the intensity presets
    List,
    /// Show cooldowns and daily caps of a preset
    Show {
        /// minimal, normal or frequent
        name: String,
    },
    /// Switch the configured intensity
    Use {
        /// minimal, normal or frequent
        name: String,
    },
}

pub fn run(action: PresetAction) -> CliResult {
    match action {
        PresetAction::List => {
            let current = Config::load()?.intensity;
            for preset in Intensity::ALL {
                let marker = if preset == current { "*" } else { " " };
                println!(
                    "{marker} {:<9} global cap {}",
                    preset.as_str(),
                    preset.limits().global
                );
            }
        }
        PresetAction::Show { name } => {
            let preset: Intensity = name.parse()?;
            let cooldowns = preset.cooldowns();
            let limits = preset.limits();
            println!("{:<18} {:>9} {:>6}", "type", "cooldown", "cap");
            for t in NudgeType::ALL {
                let cap = limits
                    .per_type(t)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:<18} {:>8}m {:>6}",
                    t.as_str(),
                    cooldowns.get(t).num_minutes(),
                    cap
                );
            }
            println!("global cap: {}", limits.global);
        }
        PresetAction::Use { name } => {
            let mut config = Config::load()?;
            config.set("intensity", &name)?;
            config.save()?;
            println!("intensity set to {name}");
        }
    }
    Ok(())
}
