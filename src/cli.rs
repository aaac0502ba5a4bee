//! Command-line interface for the quantum-hx optimizer.

use clap::{Args, Parser, Subcommand, ValueEnum};
use qir::Axis;
use qir::rewrite::DriverConfig;
use qir_passes::AxisPolicy;

#[derive(Parser)]
#[command(name = "qhx")]
#[command(about = "Peephole optimizer for quantum circuits in SSA form", long_about = None)]
pub struct Cli {
    /// Log every applied rewrite (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a chain of rotations on one qubit and fuse it
    Fuse {
        /// Rotation angles in radians, in circuit order
        #[arg(long, value_delimiter = ',', default_values_t = [0.25, 0.5])]
        angles: Vec<f64>,

        /// Axis shared by the rotations
        #[arg(long, value_enum, default_value_t = AxisArg::Z)]
        axis: AxisArg,

        /// Alternate the axis between the rotations
        #[arg(long)]
        mixed_axes: bool,

        /// Put the last rotation inside a conditional region
        #[arg(long)]
        cross_region: bool,

        #[command(flatten)]
        driver: DriverArgs,
    },
    /// Build `h(x(h(h(h(q)))))` and simplify it
    Hadamard {
        #[command(flatten)]
        driver: DriverArgs,
    },
}

#[derive(Args)]
pub struct DriverArgs {
    /// Maximum number of sweeps over the function
    #[arg(long, default_value_t = 10)]
    pub max_iterations: usize,

    /// Maximum number of applied rewrites
    #[arg(long, default_value_t = 10_000, conflicts_with = "unbounded")]
    pub max_rewrites: usize,

    /// Drop the total rewrite limit; each sweep is still capped per operation
    #[arg(long)]
    pub unbounded: bool,

    /// Skip constant folding of angle arithmetic
    #[arg(long)]
    pub no_fold: bool,

    /// Fuse rotations about different axes
    #[arg(long)]
    pub permissive_axis: bool,

    /// Validate the IR after every rewrite
    #[arg(long)]
    pub verify_each: bool,
}

impl DriverArgs {
    pub fn config(&self) -> DriverConfig {
        DriverConfig::default()
            .with_max_iterations(self.max_iterations)
            .with_max_rewrites((!self.unbounded).then_some(self.max_rewrites))
            .with_fold(!self.no_fold)
            .with_verify_each_rewrite(self.verify_each)
    }

    pub fn axis_policy(&self) -> AxisPolicy {
        if self.permissive_axis {
            AxisPolicy::Ignore
        } else {
            AxisPolicy::RequireSame
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AxisArg {
    X,
    Y,
    Z,
}

impl From<AxisArg> for Axis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
            AxisArg::Z => Axis::Z,
        }
    }
}
