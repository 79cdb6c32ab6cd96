use crate::records_io::{mkdir, write_data_dictionary, write_records_tsv};
use crate::simulate::*;

use clap::{Args, ValueEnum};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(ValueEnum, Clone, Debug, PartialEq)]
#[clap(rename_all = "kebab-case")]
enum Template {
    RareGeneticDisorder,
    NeurologicalStudy,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// number of samples to generate
    #[arg(short = 'n', long, default_value_t = 1000)]
    num_samples: usize,

    /// rare diseases to include (comma-separated)
    #[arg(short, long, value_delimiter(','))]
    diseases: Option<Vec<Box<str>>>,

    /// genetic variants linked to these diseases (comma-separated)
    #[arg(short, long, value_delimiter(','))]
    genetic_variants: Option<Vec<Box<str>>>,

    /// predefined disease/variant setup overriding the two lists
    #[arg(short, long, value_enum)]
    template: Option<Template>,

    /// random seed
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// output header; writes {out}.records.tsv.gz
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// also write {out}.dictionary.tsv describing every column
    #[arg(long, default_value_t = false)]
    with_data_dictionary: bool,
}

pub fn run_simulate(args: &SimulateArgs) -> anyhow::Result<()> {
    let (diseases, variants) = match args.template {
        Some(Template::RareGeneticDisorder) => {
            info!("template: pre-filled rare genetic disorder setup");
            (boxed_names(&["Cystic Fibrosis"]), boxed_names(&["Mutation X"]))
        }
        Some(Template::NeurologicalStudy) => {
            info!("template: pre-filled neurological study setup");
            (
                boxed_names(&["Huntington's Disease"]),
                boxed_names(&["Mutation Y", "Mutation Z"]),
            )
        }
        None => (
            args.diseases
                .clone()
                .unwrap_or_else(|| boxed_names(&DEFAULT_DISEASES)),
            args.genetic_variants
                .clone()
                .unwrap_or_else(|| boxed_names(&DEFAULT_VARIANTS)),
        ),
    };

    let mut rng = StdRng::seed_from_u64(args.rseed);

    let graph = KnowledgeGraph::build(&diseases, &variants, &mut rng)?;
    let records = simulate_records(args.num_samples, &graph, &mut rng)?;

    let records_file = format!("{}.records.tsv.gz", args.out);
    mkdir(&records_file)?;
    write_records_tsv(&records, &records_file)?;
    info!("wrote {} records to {}", records.len(), records_file);

    if args.with_data_dictionary {
        let dictionary_file = format!("{}.dictionary.tsv", args.out);
        write_data_dictionary(&dictionary_file)?;
        info!("wrote data dictionary to {}", dictionary_file);
    }

    Ok(())
}
