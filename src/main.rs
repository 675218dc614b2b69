/*
 * This file is part of gp66-fancontrol.
 *
 * Copyright (C) 2025 gp66-fancontrol contributors
 *
 * gp66-fancontrol is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * gp66-fancontrol is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with gp66-fancontrol. If not, see <https://www.gnu.org/licenses/>.
 */

use anyhow::{anyhow, bail, Context};
use serde_json::{json, Value};

use gp66_fancontrol::config::{config_path, ProfileStore};
use gp66_fancontrol::logger;
use gp66_fancontrol::profile::{default_profile, FanCurve, FanProfile};
use gp66_fancontrol::{DebugfsEc, HardwareApplier};

const USAGE: &str = "\
usage: gp66-fancontrol [--logging] <command>

commands:
  apply                       apply the saved profile to the EC
  show                        print the saved profile
  set [--flag N] [--cpu a,b,c,d,e,f,g] [--gpu a,b,c,d,e,f,g] [--apply]
                              update and save the profile, optionally apply it
  reset [--apply]             save the default profile, optionally apply it
  path                        print the config file location";

#[derive(Debug, PartialEq)]
enum Command {
    Apply,
    Show,
    Set {
        flag: Option<String>,
        cpu: Option<String>,
        gpu: Option<String>,
        apply: bool,
    },
    Reset {
        apply: bool,
    },
    Path,
    Help,
}

impl Command {
    fn needs_root(&self) -> bool {
        !matches!(self, Command::Path | Command::Help)
    }
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().map(String::as_str).filter(|a| *a != "--logging");
    let cmd = match it.next() {
        Some("apply") => Command::Apply,
        Some("show") => Command::Show,
        Some("path") => Command::Path,
        Some("help") | Some("--help") | Some("-h") | None => Command::Help,
        Some("reset") => {
            let mut apply = false;
            for arg in it.by_ref() {
                match arg {
                    "--apply" => apply = true,
                    other => bail!("unexpected argument for reset: {}", other),
                }
            }
            Command::Reset { apply }
        }
        Some("set") => {
            let (mut flag, mut cpu, mut gpu, mut apply) = (None, None, None, false);
            while let Some(arg) = it.next() {
                let slot = match arg {
                    "--apply" => {
                        apply = true;
                        continue;
                    }
                    "--flag" => &mut flag,
                    "--cpu" => &mut cpu,
                    "--gpu" => &mut gpu,
                    other => bail!("unexpected argument for set: {}", other),
                };
                let value = it.next().ok_or_else(|| anyhow!("{} needs a value", arg))?;
                *slot = Some(value.to_string());
            }
            Command::Set { flag, cpu, gpu, apply }
        }
        Some(other) => bail!("unknown command: {}\n\n{}", other, USAGE),
    };
    if let Some(extra) = it.next() {
        bail!("unexpected argument: {}", extra);
    }
    Ok(cmd)
}

/// Merge command-line overrides over the saved profile. Values stay loosely
/// typed; the store validates them on save.
fn merge_overrides(base: &FanProfile, flag: Option<&str>, cpu: Option<&str>, gpu: Option<&str>) -> Value {
    let mut raw = base.to_value();
    if let Some(flag) = flag {
        raw["flag"] = json!(flag);
    }
    let split = |s: &str| -> Value { s.split(',').map(|v| json!(v)).collect::<Vec<_>>().into() };
    if let Some(cpu) = cpu {
        raw["cpu"] = split(cpu);
    }
    if let Some(gpu) = gpu {
        raw["gpu"] = split(gpu);
    }
    raw
}

fn format_curve(label: &str, curve: &FanCurve) -> String {
    let steps: Vec<String> = curve
        .points()
        .map(|(temp, pct)| format!("{}°C:{:>3}%", temp, pct))
        .collect();
    format!("{}  {}", label, steps.join("  "))
}

fn print_profile(profile: &FanProfile) {
    println!("flag {}", profile.flag());
    println!("{}", format_curve("CPU", profile.cpu()));
    println!("{}", format_curve("GPU", profile.gpu()));
}

fn apply_to_ec(profile: &FanProfile) -> anyhow::Result<()> {
    let mut applier = HardwareApplier::new(DebugfsEc::new());
    applier.apply(profile).context("applying profile to the embedded controller")?;
    println!("Applied fan profile to the embedded controller");
    Ok(())
}

fn run(cmd: Command) -> anyhow::Result<()> {
    let store = ProfileStore::system();
    match cmd {
        Command::Help => println!("{}", USAGE),
        Command::Path => println!("{}", config_path().display()),
        Command::Show => print_profile(&store.load()?),
        Command::Apply => {
            let profile = store.load()?;
            apply_to_ec(&profile)?;
        }
        Command::Reset { apply } => {
            let profile = default_profile();
            store.save(&profile)?;
            println!("Saved default profile to {}", store.path().display());
            if apply {
                apply_to_ec(&profile)?;
            }
        }
        Command::Set { flag, cpu, gpu, apply } => {
            let current = store.load()?;
            let raw = merge_overrides(&current, flag.as_deref(), cpu.as_deref(), gpu.as_deref());
            store.save(&raw)?;
            // re-read so what gets applied is exactly what was persisted
            let saved = store.load()?;
            println!("Saved profile to {}", store.path().display());
            print_profile(&saved);
            if apply {
                apply_to_ec(&saved)?;
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event("startup", json!({ "args": args }));
    }

    let cmd = match parse_command(&args) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    if cmd.needs_root() && unsafe { libc::geteuid() } != 0 {
        eprintln!("Error: gp66-fancontrol requires root privileges to write the fan profile and EC registers.");
        eprintln!("Please run with: sudo gp66-fancontrol {}", args.join(" "));
        std::process::exit(1);
    }

    if let Err(err) = run(cmd) {
        eprintln!("error: {:#}", err);
        logger::log_event("fatal_error", json!({ "error": format!("{:#}", err) }));
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command(&args(&["apply"])).unwrap(), Command::Apply);
        assert_eq!(parse_command(&args(&["--logging", "show"])).unwrap(), Command::Show);
        assert_eq!(parse_command(&args(&[])).unwrap(), Command::Help);
        assert_eq!(parse_command(&args(&["reset", "--apply"])).unwrap(), Command::Reset { apply: true });
    }

    #[test]
    fn test_parse_set() {
        let cmd = parse_command(&args(&["set", "--flag", "13", "--cpu", "1,2,3,4,5,6,7", "--apply"])).unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                flag: Some("13".into()),
                cpu: Some("1,2,3,4,5,6,7".into()),
                gpu: None,
                apply: true,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command(&args(&["frobnicate"])).is_err());
        assert!(parse_command(&args(&["set", "--cpu"])).is_err());
        assert!(parse_command(&args(&["apply", "extra"])).is_err());
        assert!(parse_command(&args(&["reset", "--force"])).is_err());
    }

    #[test]
    fn test_merge_overrides_is_normalized_by_profile_model() {
        let raw = merge_overrides(&default_profile(), Some("20"), Some("1, 2,3,4,5,6,7"), None);
        let profile = gp66_fancontrol::normalize(&raw).unwrap();
        assert_eq!(profile.flag(), 20);
        assert_eq!(profile.cpu().steps(), &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(profile.gpu(), default_profile().gpu());

        let bad = merge_overrides(&default_profile(), None, None, Some("1,2,3"));
        assert!(gp66_fancontrol::normalize(&bad).is_err());
    }

    #[test]
    fn test_format_curve() {
        let line = format_curve("CPU", default_profile().cpu());
        assert!(line.starts_with("CPU  40°C: 45%"));
        assert!(line.ends_with("100°C:100%"));
    }
}
