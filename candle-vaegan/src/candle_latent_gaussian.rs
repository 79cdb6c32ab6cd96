use crate::candle_loss_functions::gaussian_kl_loss;
use candle_core::{Result, Tensor};
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

/// Per-sample latent distribution parameters (n x k mean and log
/// variance), produced fresh on every forward pass.
pub struct LatentGaussian {
    pub mean: Tensor,
    pub lnvar: Tensor,
}

impl LatentGaussian {
    pub fn new(mean: Tensor, lnvar: Tensor) -> Self {
        debug_assert_eq!(mean.dims(), lnvar.dims());
        Self { mean, lnvar }
    }

    ///
    /// z = mu + sigma * eps
    /// where eps ~ N(0, 1)
    ///
    /// `eps` is redrawn on every call and carries no gradient, so the
    /// sampled `z` stays differentiable with respect to `mu` and the
    /// log variance. With `train == false` the mean is returned.
    ///
    pub fn sample_t(&self, train: bool) -> Result<Tensor> {
        let z_mean = &self.mean;
        let z_lnvar = &self.lnvar;
        if train {
            let eps = Tensor::randn_like(z_mean, 0., 1.)?;
            z_mean + (z_lnvar * 0.5)?.exp()? * eps
        } else {
            Ok(z_mean.clone())
        }
    }

    /// Same reparameterized draw, with the noise taken from a caller
    /// supplied RNG instead of the device RNG. The CPU backend cannot
    /// be seeded through `Device::set_seed`, so reproducible training
    /// routes every draw through here.
    pub fn sample_seeded(&self, rng: &mut StdRng) -> Result<Tensor> {
        let z_mean = &self.mean;
        let z_lnvar = &self.lnvar;

        let noise: Vec<f32> = (0..z_mean.elem_count())
            .map(|_| StandardNormal.sample(rng))
            .collect();
        let eps = Tensor::from_vec(noise, z_mean.dims().to_vec(), z_mean.device())?;

        z_mean + (z_lnvar * 0.5)?.exp()? * eps
    }

    /// Closed-form KL divergence from the standard normal prior,
    /// one value per sample.
    pub fn kl_div(&self) -> Result<Tensor> {
        gaussian_kl_loss(&self.mean, &self.lnvar)
    }

    pub fn dim_latent(&self) -> usize {
        self.mean.dims()[self.mean.rank() - 1]
    }
}
