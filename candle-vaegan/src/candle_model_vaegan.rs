use crate::candle_data_loader::MultimodalMinibatch;
use crate::candle_decoder_feature::FeatureDecoder;
use crate::candle_discriminator::Discriminator;
use crate::candle_encoder_modality::ModalityEncoder;
use crate::candle_latent_gaussian::LatentGaussian;
use crate::candle_latent_projector::LatentProjector;
use crate::candle_model_traits::*;
use crate::error::VaeGanError;

use candle_core::{Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Per-modality input widths and network dims, fixed before model
/// construction. Absent modalities keep a zero width rather than being
/// dropped.
#[derive(Debug, Clone)]
pub struct VaeGanConfig {
    pub n_genetic: usize,
    pub n_clinical: usize,
    pub n_environmental: usize,
    pub n_embed: usize,
    pub n_hidden: usize,
    pub n_latent: usize,
}

impl VaeGanConfig {
    pub fn new(n_genetic: usize, n_clinical: usize, n_environmental: usize) -> Self {
        Self {
            n_genetic,
            n_clinical,
            n_environmental,
            n_embed: 64,
            n_hidden: 128,
            n_latent: 10,
        }
    }

    pub fn with_latent(mut self, n_latent: usize) -> Self {
        self.n_latent = n_latent;
        self
    }

    pub fn with_embed(mut self, n_embed: usize) -> Self {
        self.n_embed = n_embed;
        self
    }

    pub fn with_hidden(mut self, n_hidden: usize) -> Self {
        self.n_hidden = n_hidden;
        self
    }

    /// Full concatenated feature width (g + c + e).
    pub fn sum_features(&self) -> usize {
        self.n_genetic + self.n_clinical + self.n_environmental
    }
}

/// One forward pass worth of outputs.
pub struct VaeGanOutput {
    pub recon: Tensor,
    pub validity: Tensor,
    pub latent: LatentGaussian,
}

/// The hierarchical VAE-GAN: three independent modality encoders fused
/// by a latent projector, a reparameterized sampling step, a feature
/// decoder, and a discriminator, composed explicitly stage by stage.
///
/// Generator parameters (encoders, projector, decoder) and the
/// discriminator parameters live in separate `VarMap`s so the trainer
/// can update them jointly or alternately.
pub struct HierarchicalVaeGan {
    config: VaeGanConfig,
    genetic_encoder: ModalityEncoder,
    clinical_encoder: ModalityEncoder,
    environmental_encoder: ModalityEncoder,
    projector: LatentProjector,
    decoder: FeatureDecoder,
    discriminator: Discriminator,
}

impl HierarchicalVaeGan {
    /// Construct the model and its two fresh variable maps on `device`.
    pub fn build(
        config: &VaeGanConfig,
        device: &Device,
    ) -> Result<(Self, VarMap, VarMap), VaeGanError> {
        let generator_vars = VarMap::new();
        let discriminator_vars = VarMap::new();

        let vs_gen = VarBuilder::from_varmap(&generator_vars, candle_core::DType::F32, device);
        let vs_disc = VarBuilder::from_varmap(&discriminator_vars, candle_core::DType::F32, device);

        let model = Self::new(config, vs_gen, vs_disc)?;
        Ok((model, generator_vars, discriminator_vars))
    }

    /// Like `build`, but with every weight re-initialized from a
    /// seeded host RNG. The CPU backend's tensor RNG cannot be seeded,
    /// so reproducible runs initialize here and draw latent noise via
    /// `LatentGaussian::sample_seeded`.
    pub fn build_seeded(
        config: &VaeGanConfig,
        device: &Device,
        seed: u64,
    ) -> Result<(Self, VarMap, VarMap), VaeGanError> {
        let (model, generator_vars, discriminator_vars) = Self::build(config, device)?;

        let mut rng = StdRng::seed_from_u64(seed);
        reinit_vars_seeded(&generator_vars, &mut rng)?;
        reinit_vars_seeded(&discriminator_vars, &mut rng)?;

        Ok((model, generator_vars, discriminator_vars))
    }

    /// Construct the model from caller-provided variable builders.
    pub fn new(
        config: &VaeGanConfig,
        vs_gen: VarBuilder,
        vs_disc: VarBuilder,
    ) -> Result<Self, VaeGanError> {
        if config.sum_features() == 0 {
            return Err(VaeGanError::Configuration {
                reason: "all modality widths are zero".to_string(),
            });
        }
        if config.n_embed == 0 || config.n_hidden == 0 || config.n_latent == 0 {
            return Err(VaeGanError::Configuration {
                reason: format!(
                    "network dims must be positive: embed {}, hidden {}, latent {}",
                    config.n_embed, config.n_hidden, config.n_latent
                ),
            });
        }

        let genetic_encoder = ModalityEncoder::new(
            config.n_genetic,
            config.n_hidden,
            config.n_embed,
            vs_gen.pp("genetic"),
        )?;
        let clinical_encoder = ModalityEncoder::new(
            config.n_clinical,
            config.n_hidden,
            config.n_embed,
            vs_gen.pp("clinical"),
        )?;
        let environmental_encoder = ModalityEncoder::new(
            config.n_environmental,
            config.n_hidden,
            config.n_embed,
            vs_gen.pp("environmental"),
        )?;

        let projector = LatentProjector::new(
            3 * config.n_embed,
            config.n_latent,
            vs_gen.pp("projector"),
        )?;

        let decoder = FeatureDecoder::new(
            config.n_latent,
            config.n_hidden,
            config.sum_features(),
            vs_gen.pp("decoder"),
        )?;

        let discriminator = Discriminator::new(
            config.sum_features(),
            &[config.n_hidden, config.n_embed],
            vs_disc.pp("discriminator"),
        )?;

        Self::from_parts(
            config.clone(),
            genetic_encoder,
            clinical_encoder,
            environmental_encoder,
            projector,
            decoder,
            discriminator,
        )
    }

    /// Assemble pre-built stages, validating every cross-stage width
    /// once here so no mismatch survives to a forward pass.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        config: VaeGanConfig,
        genetic_encoder: ModalityEncoder,
        clinical_encoder: ModalityEncoder,
        environmental_encoder: ModalityEncoder,
        projector: LatentProjector,
        decoder: FeatureDecoder,
        discriminator: Discriminator,
    ) -> Result<Self, VaeGanError> {
        let concat_width = genetic_encoder.dim_embed()
            + clinical_encoder.dim_embed()
            + environmental_encoder.dim_embed();

        if concat_width != projector.dim_embed_in() {
            return Err(VaeGanError::Configuration {
                reason: format!(
                    "concatenated embedding width {} does not match projector input width {}",
                    concat_width,
                    projector.dim_embed_in()
                ),
            });
        }
        if projector.dim_latent() != decoder.dim_latent() {
            return Err(VaeGanError::Configuration {
                reason: format!(
                    "projector latent dim {} does not match decoder latent dim {}",
                    projector.dim_latent(),
                    decoder.dim_latent()
                ),
            });
        }
        if decoder.dim_obs() != config.sum_features() {
            return Err(VaeGanError::Configuration {
                reason: format!(
                    "decoder output width {} does not match total feature width {}",
                    decoder.dim_obs(),
                    config.sum_features()
                ),
            });
        }
        if discriminator.dim_obs() != config.sum_features() {
            return Err(VaeGanError::Configuration {
                reason: format!(
                    "discriminator input width {} does not match total feature width {}",
                    discriminator.dim_obs(),
                    config.sum_features()
                ),
            });
        }

        Ok(Self {
            config,
            genetic_encoder,
            clinical_encoder,
            environmental_encoder,
            projector,
            decoder,
            discriminator,
        })
    }

    pub fn config(&self) -> &VaeGanConfig {
        &self.config
    }

    /// Validate a batch's modality widths against the construction-time
    /// configuration; runs before any gradient computation so a bad
    /// batch never corrupts the parameters.
    pub fn check_batch(&self, batch: &MultimodalMinibatch) -> Result<(), VaeGanError> {
        let (g, c, e) = batch.widths();
        let expected = [
            ("genetic", self.config.n_genetic, g),
            ("clinical", self.config.n_clinical, c),
            ("environmental", self.config.n_environmental, e),
        ];
        for (modality, expected, found) in expected {
            if expected != found {
                return Err(VaeGanError::DataShape {
                    modality,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Project a batch into its latent Gaussian parameters.
    pub fn encode_t(
        &self,
        batch: &MultimodalMinibatch,
        train: bool,
    ) -> Result<LatentGaussian, VaeGanError> {
        self.check_batch(batch)?;

        let emb_g = self.genetic_encoder.forward_t(&batch.genetic, train)?;
        let emb_c = self.clinical_encoder.forward_t(&batch.clinical, train)?;
        let emb_e = self
            .environmental_encoder
            .forward_t(&batch.environmental, train)?;

        let emb = Tensor::cat(&[&emb_g, &emb_c, &emb_e], 1)?;
        Ok(self.projector.forward(&emb)?)
    }

    /// Full forward pass: encode, sample, decode, and score the
    /// reconstruction's validity.
    pub fn forward_t(
        &self,
        batch: &MultimodalMinibatch,
        train: bool,
    ) -> Result<VaeGanOutput, VaeGanError> {
        let latent = self.encode_t(batch, train)?;
        let z_nk = latent.sample_t(train)?;
        let recon = self.decoder.forward(&z_nk)?;
        let validity = self.discriminator.forward_t(&recon, train)?;

        Ok(VaeGanOutput {
            recon,
            validity,
            latent,
        })
    }

    pub fn decoder(&self) -> &FeatureDecoder {
        &self.decoder
    }

    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }
}

/// Overwrite every variable with a fresh draw from `rng`: zeros for
/// biases, Kaiming-normal for weights. Variables are visited in sorted
/// name order so the same seed always yields the same parameters.
fn reinit_vars_seeded(vars: &VarMap, rng: &mut StdRng) -> candle_core::Result<()> {
    let data = vars.data().lock().expect("varmap lock");

    let mut names: Vec<String> = data.keys().cloned().collect();
    names.sort();

    for name in names.iter() {
        let var = &data[name];
        let dims = var.dims().to_vec();
        let n: usize = dims.iter().product();

        let values: Vec<f32> = if name.ends_with("bias") {
            vec![0.; n]
        } else {
            let fan_in = *dims.last().unwrap_or(&1);
            let std = (2. / fan_in as f32).sqrt();
            (0..n)
                .map(|_| {
                    let z: f32 = StandardNormal.sample(rng);
                    z * std
                })
                .collect()
        };

        var.set(&Tensor::from_vec(values, dims, var.device())?)?;
    }

    Ok(())
}
