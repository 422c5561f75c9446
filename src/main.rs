use tbsim::{bench_integrate, conservation, prompt_scenario};
use tbsim::{Scenario, ScenarioConfig, N_BODIES};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Planar gravitational three-body simulator")]
struct Args {
    /// Scenario YAML; bare names are looked up in scenarios/
    #[arg(short, long)]
    file_name: Option<String>,

    /// Enter initial conditions interactively
    #[arg(short, long)]
    interactive: bool,

    /// Override the end time of the scenario
    #[arg(long)]
    t_end: Option<f64>,

    /// Run the tolerance sweep benchmark and exit
    #[arg(long)]
    bench: bool,

    /// Replay the trajectory in a window (needs the `viewer` feature)
    #[arg(long)]
    view: bool,
}

fn scenario_path(file_name: &str) -> PathBuf {
    let direct = PathBuf::from(file_name);
    if direct.exists() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = scenario_path(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg = ScenarioConfig::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.bench {
        bench_integrate();
        return Ok(());
    }

    let mut scenario_cfg = match &args.file_name {
        Some(file_name) => load_scenario_from_yaml(file_name)?,
        None => ScenarioConfig::default(),
    };
    if args.interactive {
        let stdin = io::stdin();
        scenario_cfg = prompt_scenario(&mut stdin.lock(), &mut io::stdout(), scenario_cfg)
            .context("failed to read initial conditions")?;
    }
    if let Some(t_end) = args.t_end {
        scenario_cfg.parameters.t_end = t_end;
    }

    let scenario = Scenario::build_scenario(scenario_cfg)?;
    let (trajectory, _stats) = scenario.run()?;

    let Some(last) = trajectory.last() else {
        bail!("integration returned no samples");
    };
    info!("final state at t = {}", last.t);
    for i in 0..N_BODIES {
        let x = last.state.position(i);
        let v = last.state.velocity(i);
        info!(
            "  body {}: x = ({:.6}, {:.6}), v = ({:.6}, {:.6})",
            i + 1,
            x.x,
            x.y,
            v.x,
            v.y
        );
    }
    let drift = conservation(&trajectory, &scenario.masses, &scenario.gravity());
    info!(
        "relative drift: energy {:e}, angular momentum {:e}",
        drift.energy_drift, drift.angular_momentum_drift
    );

    if args.view {
        #[cfg(feature = "viewer")]
        tbsim::run_2d(trajectory);
        #[cfg(not(feature = "viewer"))]
        log::warn!("built without the `viewer` feature, nothing to show");
    }

    Ok(())
}
