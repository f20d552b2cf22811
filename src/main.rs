//! Latente CLI
//!
//! Training and latent-space exploration entry point for the latente
//! library.
//!
//! # Usage
//!
//! ```bash
//! # Train a new run
//! latente train --run demo
//!
//! # Resume a run, overriding a training hyperparameter
//! latente train --run demo --resume --learning-rate 0.0005
//!
//! # Greedy-decode every sentence in a file through the latent space
//! latente decode --run demo --input-file input.txt
//!
//! # Draw 5 samples around one sentence's encoding
//! latente sample --run demo --input-file input.txt --num-samples 5
//!
//! # Interpolate between two sentences
//! latente interpolate --run demo --input-file input.txt --num-pts 7
//!
//! # Exercise the whole pipeline on synthetic data
//! latente self-test
//! ```

use clap::Parser;
use latente::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
