use crate::eval::{summarize_features, write_feature_summaries};
use crate::partition::{partition_records, ModalityMatrices, FEATURE_NAMES};
use crate::records_io::{mkdir, open_buf_writer, read_records_tsv};
use crate::simulate::*;

use candle_core::{Device, Tensor};
use candle_vaegan::candle_data_loader::{InMemoryMultimodalData, MultimodalMinibatch};
use candle_vaegan::candle_model_vaegan::{HierarchicalVaeGan, VaeGanConfig};
use candle_vaegan::candle_vaegan_trainer::{
    AdversarialMode, EpochReport, TrainConfig, VaeGanTrainer,
};

use clap::{Args, ValueEnum};
use log::info;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

#[derive(ValueEnum, Clone, Debug, PartialEq)]
#[clap(rename_all = "lowercase")]
enum ComputeDevice {
    Cpu,
    Cuda,
    Metal,
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
#[clap(rename_all = "kebab-case")]
enum AdversarialArg {
    /// one combined gradient step over generator and discriminator
    Joint,
    /// discriminator step on real vs. fake, then a generator step
    TwoStep,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// records file written by `synclin simulate`; a fresh dataset is
    /// simulated when omitted
    data_file: Option<Box<str>>,

    /// number of samples to simulate when no records file is given
    #[arg(short = 'n', long, default_value_t = 1000)]
    num_samples: usize,

    /// number of latent dimensions
    #[arg(short = 'k', long, default_value_t = 10)]
    latent_dim: usize,

    /// modality embedding dimension
    #[arg(long, default_value_t = 64)]
    embed_dim: usize,

    /// hidden layer dimension
    #[arg(long, default_value_t = 128)]
    hidden_dim: usize,

    /// number of training epochs
    #[arg(short = 'i', long, default_value_t = 5)]
    epochs: usize,

    /// minibatch size
    #[arg(long, default_value_t = 32)]
    minibatch_size: usize,

    /// learning rate
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f32,

    /// adversarial optimization scheme
    #[arg(long, value_enum, default_value = "joint")]
    adversarial: AdversarialArg,

    /// compute device
    #[arg(long, value_enum, default_value = "cpu")]
    device: ComputeDevice,

    /// random seed (initialization, shuffling, latent noise)
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// log per-epoch losses instead of a progress bar
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// skip the post-training reconstruction summary
    #[arg(long, default_value_t = false)]
    skip_evaluation: bool,

    /// output header; writes {out}.loss_trace.tsv and
    /// {out}.evaluation.tsv
    #[arg(long, short, required = true)]
    out: Box<str>,
}

pub fn run_train(args: &TrainArgs) -> anyhow::Result<()> {
    let records = match &args.data_file {
        Some(data_file) => {
            info!("reading records from {}", data_file);
            read_records_tsv(data_file)?
        }
        None => {
            info!("simulating {} records", args.num_samples);
            let mut rng = StdRng::seed_from_u64(args.rseed);
            let graph = KnowledgeGraph::build(
                &boxed_names(&DEFAULT_DISEASES),
                &boxed_names(&DEFAULT_VARIANTS),
                &mut rng,
            )?;
            simulate_records(args.num_samples, &graph, &mut rng)?
        }
    };

    let matrices = partition_records(&records)?;
    let (n_genetic, n_clinical, n_environmental) = matrices.widths();

    info!(
        "{} records: genetic {}, clinical {}, environmental {}",
        matrices.num_samples(),
        n_genetic,
        n_clinical,
        n_environmental
    );

    let dev = match args.device {
        ComputeDevice::Metal => Device::new_metal(0)?,
        ComputeDevice::Cuda => Device::new_cuda(0)?,
        _ => Device::Cpu,
    };

    let config = VaeGanConfig::new(n_genetic, n_clinical, n_environmental)
        .with_latent(args.latent_dim)
        .with_embed(args.embed_dim)
        .with_hidden(args.hidden_dim);

    let (model, generator_vars, discriminator_vars) =
        HierarchicalVaeGan::build_seeded(&config, &dev, args.rseed)?;

    info!(
        "input: {} -> encoder -> {} latent dims -> decoder -> output: {}",
        model.config().sum_features(),
        model.config().n_latent,
        model.config().sum_features()
    );

    let mut data = InMemoryMultimodalData::new_with_seed(
        &matrices.genetic,
        &matrices.clinical,
        &matrices.environmental,
        args.rseed,
    )?;

    let train_config = TrainConfig {
        learning_rate: args.learning_rate,
        batch_size: args.minibatch_size,
        num_epochs: args.epochs,
        adversarial: match args.adversarial {
            AdversarialArg::Joint => AdversarialMode::Joint,
            AdversarialArg::TwoStep => AdversarialMode::TwoStep,
        },
        device: dev.clone(),
        seed: Some(args.rseed),
        verbose: false,
        show_progress: !args.verbose,
    };

    // run training on a dedicated worker so the caller's loop stays
    // responsive; per-epoch reports come back over a channel
    let (tx, rx) = std::sync::mpsc::channel::<EpochReport>();

    let loss_trace = std::thread::scope(|scope| -> anyhow::Result<Vec<f32>> {
        let worker = scope.spawn(|| -> anyhow::Result<Vec<f32>> {
            let mut trainer = VaeGanTrainer::build(&model, &generator_vars, &discriminator_vars);
            trainer.train_with_report(&mut data, &train_config, move |report| {
                let _ = tx.send(*report);
            })
        });

        for report in rx.iter() {
            if args.verbose {
                info!(
                    "[{}] loss: {} (recon: {}, kl: {}, adversarial: {})",
                    report.epoch + 1,
                    report.loss,
                    report.recon_loss,
                    report.kl_loss,
                    report.adversarial_loss
                );
            }
        }

        worker
            .join()
            .map_err(|_| anyhow::anyhow!("training worker panicked"))?
    })?;

    let trace_file = format!("{}.loss_trace.tsv", args.out);
    mkdir(&trace_file)?;
    write_loss_trace(&loss_trace, &trace_file)?;
    info!("wrote loss trace to {}", trace_file);

    if !args.skip_evaluation {
        let summaries_file = format!("{}.evaluation.tsv", args.out);
        evaluate_reconstruction(&model, &matrices, &dev, &summaries_file)?;
        info!("wrote evaluation summary to {}", summaries_file);
    }

    Ok(())
}

fn write_loss_trace(loss_trace: &[f32], output_file: &str) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(output_file)?;
    writeln!(buf, "Epoch\tLoss")?;
    for (epoch, loss) in loss_trace.iter().enumerate() {
        writeln!(buf, "{}\t{}", epoch + 1, loss)?;
    }
    buf.flush()?;
    Ok(())
}

/// Reconstruct the full dataset in eval mode (posterior mean, no
/// sampling noise) and summarize per-feature moments against the real
/// values.
fn evaluate_reconstruction(
    model: &HierarchicalVaeGan,
    matrices: &ModalityMatrices,
    dev: &Device,
    output_file: &str,
) -> anyhow::Result<()> {
    let batch = MultimodalMinibatch {
        genetic: array_to_tensor(&matrices.genetic, dev)?,
        clinical: array_to_tensor(&matrices.clinical, dev)?,
        environmental: array_to_tensor(&matrices.environmental, dev)?,
    };

    let out = model.forward_t(&batch, false)?;

    let recon_rows = out.recon.to_device(&Device::Cpu)?.to_vec2::<f32>()?;
    let width = recon_rows.first().map(|row| row.len()).unwrap_or(0);
    let recon = Array2::from_shape_vec(
        (recon_rows.len(), width),
        recon_rows.into_iter().flatten().collect(),
    )?;

    let real = matrices.concat();
    let summaries = summarize_features(&FEATURE_NAMES, &real, &recon)?;

    for s in summaries.iter() {
        info!(
            "{}: real {:.3} +- {:.3} vs. synthetic {:.3} +- {:.3} (KS {:.3})",
            s.name, s.real_mean, s.real_std, s.recon_mean, s.recon_std, s.ks_stat
        );
    }

    write_feature_summaries(&summaries, output_file)
}

fn array_to_tensor(x: &Array2<f32>, dev: &Device) -> anyhow::Result<Tensor> {
    if x.ncols() == 0 {
        return Ok(Tensor::zeros(
            (x.nrows(), 0),
            candle_core::DType::F32,
            dev,
        )?);
    }
    Ok(Tensor::from_vec(
        x.iter().cloned().collect::<Vec<f32>>(),
        (x.nrows(), x.ncols()),
        dev,
    )?)
}
