//! Local terminal entry point.
//!
//! Runs one simulator session against stdin/stdout: loads a scenario (the
//! embedded default, or a TOML path given as the first argument), then
//! executes lines until EOF or `exit`.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use hacklab_engine::{Scenario, Simulator};

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/default.toml");
const SESSION_ID: &str = "local";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scenario = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading scenario {path}"))?;
            Scenario::from_toml(&text).with_context(|| format!("parsing scenario {path}"))?
        },
        None => Scenario::from_toml(DEFAULT_SCENARIO).context("parsing embedded scenario")?,
    };

    log::info!("starting lab terminal (scenario {})", scenario.name);
    let user = scenario.user.clone();
    let sim = Simulator::new(scenario);
    sim.open_session(SESSION_ID)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        let cwd = sim.current_directory(SESSION_ID)?;
        print!("{user}@labbox:{cwd}$ ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line == "exit" {
            break;
        }

        let response = sim.execute_command(SESSION_ID, line)?;
        if response.clear_screen {
            print!("\x1b[2J\x1b[H");
        }
        if !response.output.is_empty() {
            println!("{}", response.output);
        }
    }

    Ok(())
}
