//! qhx CLI entry point.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, DriverArgs};
use qhx::{Circuit, RotationChain};
use qir_passes::QuantumHxPass;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fuse {
            angles,
            axis,
            mixed_axes,
            cross_region,
            driver,
        } => {
            let chain = RotationChain {
                axis: axis.into(),
                angles,
                mixed_axes,
                cross_region,
            };
            run(chain.build(), &driver)
        }
        Command::Hadamard { driver } => run(qhx::hadamard_sandwich(), &driver),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(mut circuit: Circuit, driver: &DriverArgs) -> ExitCode {
    let pass = QuantumHxPass::new(driver.config()).with_axis_policy(driver.axis_policy());

    println!("=== Input ===\n{}", circuit.print());
    let result = circuit.optimize(&pass);
    println!("=== Output ===\n{}", circuit.print());

    match result {
        Ok(report) => {
            println!(
                "converged after {} sweep(s), {} rewrite(s)",
                report.iterations, report.rewrites
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
