mod eval;
mod partition;
mod records_io;
mod run_simulate;
mod run_train;
mod simulate;

use run_simulate::*;
use run_train::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "SYNCLIN",
    long_about = "SYNthetic CLINical records for rare-disease research.\n\
		  Generate labeled synthetic patient records from a small\n\
		  clinical knowledge graph, and train a hierarchical VAE-GAN\n\
		  on their multi-modal numeric encoding."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Generate synthetic patient records",
        long_about = "Generate synthetic patient records in three stages:\n\
		      (1) Build a variant-disease knowledge graph with random edge weights\n\
		      (2) Sample demographics, labs, and graph-guided disease labels\n\
		      (3) Write the records as a (gzipped) TSV table.\n"
    )]
    Simulate(SimulateArgs),

    #[command(
        about = "Train the hierarchical VAE-GAN on patient records",
        long_about = "Train the hierarchical VAE-GAN in three stages:\n\
		      (1) Partition records into genetic/clinical/environmental modalities\n\
		      (2) Optimize the joint reconstruction + KL + adversarial objective via SGD\n\
		      (3) Summarize the reconstruction against the real feature columns.\n"
    )]
    Train(TrainArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.commands {
        Commands::Simulate(args) => run_simulate(args)?,
        Commands::Train(args) => run_train(args)?,
    }

    Ok(())
}
