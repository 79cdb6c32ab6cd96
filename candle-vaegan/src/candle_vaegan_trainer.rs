use crate::candle_data_loader::{MultimodalDataLoader, MultimodalMinibatch};
use crate::candle_latent_gaussian::LatentGaussian;
use crate::candle_loss_functions::{binary_cross_entropy, mean_squared_error};
use crate::candle_model_traits::{DecoderModuleT, DiscriminatorModuleT};
use crate::candle_model_vaegan::{HierarchicalVaeGan, VaeGanOutput};

use candle_core::Tensor;
use candle_nn::{AdamW, Optimizer, VarMap};
use indicatif::{ProgressBar, ProgressDrawTarget};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// How the adversarial term is optimized.
///
/// `Joint` reproduces the reference behavior: one combined gradient
/// step per batch over generator and discriminator together, with the
/// discriminator only ever scoring reconstructions. `TwoStep` is the
/// canonical alternative: a discriminator step on real vs. detached
/// reconstruction, then a generator step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdversarialMode {
    #[default]
    Joint,
    TwoStep,
}

pub struct TrainConfig {
    pub learning_rate: f32,
    pub batch_size: usize,
    pub num_epochs: usize,
    pub adversarial: AdversarialMode,
    pub device: candle_core::Device,
    pub seed: Option<u64>,
    pub verbose: bool,
    pub show_progress: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            batch_size: 32,
            num_epochs: 5,
            adversarial: AdversarialMode::Joint,
            device: candle_core::Device::Cpu,
            seed: None,
            verbose: false,
            show_progress: true,
        }
    }
}

/// Loss terms of the last applied batch of an epoch. No epoch
/// averaging happens anywhere; `loss` is the final batch's joint
/// objective (in two-step mode, the generator objective).
#[derive(Clone, Copy, Debug)]
pub struct EpochReport {
    pub epoch: usize,
    pub loss: f32,
    pub recon_loss: f32,
    pub kl_loss: f32,
    pub adversarial_loss: f32,
}

#[derive(Clone, Copy)]
struct BatchLosses {
    total: f32,
    recon: f32,
    kl: f32,
    adversarial: f32,
}

/// Drives the epoch x batch loop and owns the only code path that
/// mutates the model parameters. One trainer per parameter set at a
/// time; nothing is persisted between runs.
pub struct VaeGanTrainer<'a> {
    pub model: &'a HierarchicalVaeGan,
    pub generator_vars: &'a VarMap,
    pub discriminator_vars: &'a VarMap,
}

impl<'a> VaeGanTrainer<'a> {
    pub fn build(
        model: &'a HierarchicalVaeGan,
        generator_vars: &'a VarMap,
        discriminator_vars: &'a VarMap,
    ) -> Self {
        Self {
            model,
            generator_vars,
            discriminator_vars,
        }
    }

    /// Train the model, returning the per-epoch loss trace.
    pub fn train<DataL>(&mut self, data: &mut DataL, config: &TrainConfig) -> anyhow::Result<Vec<f32>>
    where
        DataL: MultimodalDataLoader,
    {
        self.train_with_report(data, config, |_| {})
    }

    /// Train the model, invoking `report` after every epoch with the
    /// final batch's loss terms. The trainer itself runs synchronously;
    /// a caller that wants cooperative offloading bridges `report`
    /// onto its own channel or task.
    pub fn train_with_report<DataL, F>(
        &mut self,
        data: &mut DataL,
        config: &TrainConfig,
        mut report: F,
    ) -> anyhow::Result<Vec<f32>>
    where
        DataL: MultimodalDataLoader,
        F: FnMut(&EpochReport),
    {
        let device = &config.device;

        // CPU tensors cannot be seeded through the device, so seeded
        // runs draw their latent noise from a host RNG instead.
        let mut noise_rng = config.seed.map(StdRng::seed_from_u64);

        let mut optimizers = Optimizers::new(config, self.generator_vars, self.discriminator_vars)?;

        let pb = ProgressBar::new(config.num_epochs as u64);

        if !config.show_progress || config.verbose {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        let mut loss_trace = vec![];

        for epoch in 0..config.num_epochs {
            data.shuffle_minibatch(config.batch_size)?;

            let mut last_applied: Option<BatchLosses> = None;

            for b in 0..data.num_minibatch() {
                let minibatch = data.minibatch_shuffled(b, device)?;

                if let Some(losses) = optimizers.step(self.model, &minibatch, b, &mut noise_rng)? {
                    last_applied = Some(losses);
                }
            }

            let losses = last_applied.ok_or_else(|| {
                anyhow::anyhow!("every batch of epoch {} had a non-finite loss", epoch + 1)
            })?;

            loss_trace.push(losses.total);
            pb.inc(1);

            if config.verbose {
                info!(
                    "[{}] loss: {} (recon: {}, kl: {}, adversarial: {})",
                    epoch + 1,
                    losses.total,
                    losses.recon,
                    losses.kl,
                    losses.adversarial
                );
            }

            report(&EpochReport {
                epoch,
                loss: losses.total,
                recon_loss: losses.recon,
                kl_loss: losses.kl,
                adversarial_loss: losses.adversarial,
            });
        } // each epoch

        pb.finish_and_clear();
        Ok(loss_trace)
    }
}

enum Optimizers {
    Joint(AdamW),
    TwoStep { generator: AdamW, discriminator: AdamW },
}

impl Optimizers {
    fn new(
        config: &TrainConfig,
        generator_vars: &VarMap,
        discriminator_vars: &VarMap,
    ) -> anyhow::Result<Self> {
        let lr = config.learning_rate.into();

        match config.adversarial {
            AdversarialMode::Joint => {
                let mut vars = generator_vars.all_vars();
                vars.extend(discriminator_vars.all_vars());
                Ok(Self::Joint(AdamW::new_lr(vars, lr)?))
            }
            AdversarialMode::TwoStep => Ok(Self::TwoStep {
                generator: AdamW::new_lr(generator_vars.all_vars(), lr)?,
                discriminator: AdamW::new_lr(discriminator_vars.all_vars(), lr)?,
            }),
        }
    }

    /// Apply one batch worth of updates. Returns `None` when the batch
    /// was skipped on a non-finite loss; the skipped update is never
    /// applied.
    fn step(
        &mut self,
        model: &HierarchicalVaeGan,
        minibatch: &MultimodalMinibatch,
        batch_idx: usize,
        noise_rng: &mut Option<StdRng>,
    ) -> anyhow::Result<Option<BatchLosses>> {
        match self {
            Self::Joint(adam) => Self::joint_step(adam, model, minibatch, batch_idx, noise_rng),
            Self::TwoStep {
                generator,
                discriminator,
            } => Self::two_step(generator, discriminator, model, minibatch, batch_idx, noise_rng),
        }
    }

    /// One training-mode pass through all four stages, drawing fresh
    /// latent noise on every call.
    fn forward_training(
        model: &HierarchicalVaeGan,
        minibatch: &MultimodalMinibatch,
        noise_rng: &mut Option<StdRng>,
    ) -> anyhow::Result<VaeGanOutput> {
        let latent = model.encode_t(minibatch, true)?;
        let z_nk = sample_latent(&latent, noise_rng)?;
        let recon = model.decoder().forward(&z_nk)?;
        let validity = model.discriminator().forward_t(&recon, true)?;

        Ok(VaeGanOutput {
            recon,
            validity,
            latent,
        })
    }

    /// The combined objective: reconstruction + KL + adversarial, one
    /// gradient pass over all trainable parameters.
    fn joint_step(
        adam: &mut AdamW,
        model: &HierarchicalVaeGan,
        minibatch: &MultimodalMinibatch,
        batch_idx: usize,
        noise_rng: &mut Option<StdRng>,
    ) -> anyhow::Result<Option<BatchLosses>> {
        let x_nd = minibatch.concat_features()?;
        let out = Self::forward_training(model, minibatch, noise_rng)?;

        let recon_n = mean_squared_error(&x_nd, &out.recon)?;
        let kl_n = out.latent.kl_div()?;
        let real_labels = out.validity.ones_like()?;
        let adversarial_n = binary_cross_entropy(&out.validity, &real_labels)?;

        let loss = ((&recon_n + &kl_n)? + &adversarial_n)?.mean_all()?;
        let total = loss.to_scalar::<f32>()?;

        if !total.is_finite() {
            warn!(
                "skipping batch {}: non-finite joint loss ({})",
                batch_idx, total
            );
            return Ok(None);
        }

        adam.backward_step(&loss)?;

        Ok(Some(BatchLosses {
            total,
            recon: recon_n.mean_all()?.to_scalar::<f32>()?,
            kl: kl_n.mean_all()?.to_scalar::<f32>()?,
            adversarial: adversarial_n.mean_all()?.to_scalar::<f32>()?,
        }))
    }

    /// Canonical adversarial alternative: discriminator step on real
    /// vs. detached reconstruction, then a generator step against the
    /// updated discriminator.
    fn two_step(
        adam_g: &mut AdamW,
        adam_d: &mut AdamW,
        model: &HierarchicalVaeGan,
        minibatch: &MultimodalMinibatch,
        batch_idx: usize,
        noise_rng: &mut Option<StdRng>,
    ) -> anyhow::Result<Option<BatchLosses>> {
        let x_nd = minibatch.concat_features()?;

        let out = Self::forward_training(model, minibatch, noise_rng)?;
        let recon_detached = out.recon.detach();

        let d_real = model.discriminator().forward_t(&x_nd, true)?;
        let d_fake = model.discriminator().forward_t(&recon_detached, true)?;

        let real_labels = d_real.ones_like()?;
        let fake_labels = d_fake.zeros_like()?;

        let d_loss = (binary_cross_entropy(&d_real, &real_labels)?
            + binary_cross_entropy(&d_fake, &fake_labels)?)?
        .mean_all()?;
        let d_total = d_loss.to_scalar::<f32>()?;

        if !d_total.is_finite() {
            warn!(
                "skipping batch {}: non-finite discriminator loss ({})",
                batch_idx, d_total
            );
            return Ok(None);
        }

        adam_d.backward_step(&d_loss)?;

        let out = Self::forward_training(model, minibatch, noise_rng)?;

        let recon_n = mean_squared_error(&x_nd, &out.recon)?;
        let kl_n = out.latent.kl_div()?;
        let real_labels = out.validity.ones_like()?;
        let adversarial_n = binary_cross_entropy(&out.validity, &real_labels)?;

        let g_loss = ((&recon_n + &kl_n)? + &adversarial_n)?.mean_all()?;
        let g_total = g_loss.to_scalar::<f32>()?;

        if !g_total.is_finite() {
            warn!(
                "skipping generator update of batch {}: non-finite loss ({})",
                batch_idx, g_total
            );
            return Ok(None);
        }

        adam_g.backward_step(&g_loss)?;

        Ok(Some(BatchLosses {
            total: g_total,
            recon: recon_n.mean_all()?.to_scalar::<f32>()?,
            kl: kl_n.mean_all()?.to_scalar::<f32>()?,
            adversarial: adversarial_n.mean_all()?.to_scalar::<f32>()?,
        }))
    }
}

fn sample_latent(
    latent: &LatentGaussian,
    noise_rng: &mut Option<StdRng>,
) -> candle_core::Result<Tensor> {
    match noise_rng {
        Some(rng) => latent.sample_seeded(rng),
        None => latent.sample_t(true),
    }
}
