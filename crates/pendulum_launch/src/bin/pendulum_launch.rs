//! Pendulum Launch CLI
//!
//! Usage:
//!   pendulum_launch
//!   pendulum_launch --dry-run --format yaml
//!   pendulum_launch my_robot_description --description urdf/robot.urdf --with-debug-nodes

use pendulum_launch::{
    build_launch_plan_with, AmentIndex, LaunchArgs, PlanFormat, Supervisor, SupervisorConfig,
};
use std::path::PathBuf;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    let args: LaunchArgs = argh::from_env();

    // Initialize logging
    let env = env_logger::Env::default().default_filter_or(args.log_filter());
    env_logger::init_from_env(env);

    let config = match args.assembler_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let index = AmentIndex::from_env();
    log::debug!("Package index prefixes: {:?}", index.prefixes());

    let plan = match build_launch_plan_with(&index, &config) {
        Ok(plan) => plan,
        Err(e) => {
            log::error!("Failed to assemble launch plan: {}", e);
            std::process::exit(1);
        }
    };

    // Dry run mode
    if args.dry_run {
        let rendered = match args.format {
            PlanFormat::Text => Ok(plan.to_string()),
            PlanFormat::Yaml => plan.to_yaml().map_err(|e| e.to_string()),
            PlanFormat::Json => plan.to_json().map_err(|e| e.to_string()),
        };
        match rendered {
            Ok(text) => println!("{}", text),
            Err(e) => {
                log::error!("Failed to render launch plan: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut supervisor_config = SupervisorConfig {
        shutdown_timeout: args.shutdown_timeout(),
        ..Default::default()
    };
    if let Some(dir) = &args.log_dir {
        supervisor_config.log_dir = PathBuf::from(dir);
    }

    let mut supervisor = match Supervisor::new(&plan, &index, supervisor_config) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to prepare nodes: {}", e);
            std::process::exit(1);
        }
    };

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // Set up Ctrl+C handler
    {
        let shutdown_tx = shutdown_tx.clone();
        ctrlc::set_handler(move || {
            log::info!("Received Ctrl+C, initiating shutdown...");
            let _ = shutdown_tx.send(());
        })
        .expect("Error setting Ctrl+C handler");
    }

    if let Err(e) = supervisor.launch(&shutdown_rx) {
        log::error!("Launch failed: {}", e);
        supervisor.shutdown().await;
        std::process::exit(1);
    }

    supervisor.wait(shutdown_rx).await;
    supervisor.shutdown().await;

    log::info!("pendulum_launch exiting");
}
