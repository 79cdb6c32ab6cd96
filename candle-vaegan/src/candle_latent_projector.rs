use crate::candle_latent_gaussian::LatentGaussian;
use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

/// Fuses the concatenated modality embeddings into per-sample latent
/// Gaussian parameters. Neither head carries an output activation; the
/// log variance is clamped to keep `exp` well-behaved during training.
pub struct LatentProjector {
    n_embed_in: usize,
    n_latent: usize,
    z_mean: Linear,
    z_lnvar: Linear,
}

impl LatentProjector {
    /// Will create a new latent projector with these variables:
    ///
    /// * `nn.enc.z.mean.weight` / `bias`
    /// * `nn.enc.z.lnvar.weight` / `bias`
    ///
    /// # Arguments
    /// * `n_embed_in` - concatenated embedding width
    /// * `n_latent` - latent dim
    /// * `vs` - variable builder
    pub fn new(n_embed_in: usize, n_latent: usize, vs: VarBuilder) -> Result<Self> {
        let z_mean = candle_nn::linear(n_embed_in, n_latent, vs.pp("nn.enc.z.mean"))?;
        let z_lnvar = candle_nn::linear(n_embed_in, n_latent, vs.pp("nn.enc.z.lnvar"))?;

        Ok(Self {
            n_embed_in,
            n_latent,
            z_mean,
            z_lnvar,
        })
    }

    ///
    /// Evaluate latent Gaussian parameters: mu and log_var
    /// z ~ (mu(x), log_var(x))
    ///
    pub fn forward(&self, emb_nd: &Tensor) -> Result<LatentGaussian> {
        let min_lv = -8.; // stabilize
        let max_lv = 8.; // log variance

        let z_mean_nk = self.z_mean.forward(emb_nd)?;
        let z_lnvar_nk = self.z_lnvar.forward(emb_nd)?.clamp(min_lv, max_lv)?;

        Ok(LatentGaussian::new(z_mean_nk, z_lnvar_nk))
    }

    pub fn dim_embed_in(&self) -> usize {
        self.n_embed_in
    }

    pub fn dim_latent(&self) -> usize {
        self.n_latent
    }
}
