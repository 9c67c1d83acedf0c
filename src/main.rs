use charge_field::driver::DeviceIndices;
use charge_field::initialize::DEFAULT_SEED;
use charge_field::state::{report, run, RunOptions};
use charge_field::SimParams;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process::ExitCode;

/// Charged particle cloud pushed around by two charged controllers
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Number of particles (1..=1000000)
  #[arg(short, long, default_value_t = 50_000)]
  count: u32,
  /// Charge (nC) of a controller with its trigger fully pressed (-0.5..=0.5)
  #[arg(long, default_value_t = -0.1, allow_negative_numbers = true)]
  controller_max_charge: f32,
  /// Velocity damping applied each frame (0..=0.02)
  #[arg(long, default_value_t = 0.005)]
  damping: f32,
  /// Charge (nC) of each particle (0..=0.001)
  #[arg(long, default_value_t = 0.0001)]
  particle_charge: f32,
  /// Mass (kg) of each particle (0..=10)
  #[arg(long, default_value_t = 1.0)]
  particle_mass: f32,
  /// Softening factor limiting force amplitudes (0..=1)
  #[arg(long, default_value_t = 0.1)]
  softening_factor: f32,
  /// Tracked device index of the left controller
  #[arg(long, default_value_t = 1)]
  left_device: u32,
  /// Tracked device index of the right controller
  #[arg(long, default_value_t = 2)]
  right_device: u32,
  /// Seed for the initial particle positions
  #[arg(long, default_value_t = DEFAULT_SEED)]
  seed: u64,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Frames to simulate in headless mode
  #[arg(long, default_value_t = 900)]
  frames: u32,
  /// Failed controller lookups before the headless controllers come online
  #[arg(long, default_value_t = 3)]
  warmup: u32,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn main() -> ExitCode {
  env_logger::init();
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return ExitCode::SUCCESS;
  }

  let options = RunOptions {
    params: SimParams {
      count: args.count,
      controller_max_charge: args.controller_max_charge,
      damping: args.damping,
      particle_charge: args.particle_charge,
      particle_mass: args.particle_mass,
      softening_factor: args.softening_factor,
    },
    devices: DeviceIndices {
      left: args.left_device,
      right: args.right_device,
    },
    seed: args.seed,
    headless: args.headless,
    frames: args.frames,
    warmup: args.warmup,
  };

  match run(options) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      report(&e);
      ExitCode::FAILURE
    }
  }
}
