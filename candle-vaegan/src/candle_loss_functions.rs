#![allow(dead_code)]

use candle_core::{Result, Tensor};

/// KL divergence of a diagonal Gaussian from the standard normal prior
///
/// -0.5 * mean_k (1 + log(sigma^2) - mu^2 - sigma^2)
///
/// averaged over the latent dimensions, one value per sample.
///
/// * `z_mean` - mean of Gaussian distribution
/// * `z_lnvar` - log variance of Gaussian distribution
///
pub fn gaussian_kl_loss(z_mean: &Tensor, z_lnvar: &Tensor) -> Result<Tensor> {
    let z_var = z_lnvar.exp()?;
    (z_var - 1. + z_mean.powf(2.)? - z_lnvar)?.mean(z_mean.rank() - 1)? * 0.5
}

/// Mean squared error between observed and reconstructed feature vectors
///
/// mse(i) = mean_w [ x(i,w) - xhat(i,w) ]^2
///
/// * `x_nd` - data tensor (observed data)
/// * `xhat_nd` - reconstruction tensor
///
pub fn mean_squared_error(x_nd: &Tensor, xhat_nd: &Tensor) -> Result<Tensor> {
    x_nd.sub(xhat_nd)?.powf(2.)?.mean(x_nd.rank() - 1)
}

/// Binary cross-entropy on probabilities (not logits)
///
/// bce(i) = - mean_w [ t(i,w) * log p(i,w) + (1 - t(i,w)) * log(1 - p(i,w)) ]
///
/// Probabilities are clamped to `[eps, 1 - eps]` to keep `log` finite.
///
/// * `p_n` - predicted probabilities
/// * `target_n` - target labels in [0,1]
///
pub fn binary_cross_entropy(p_n: &Tensor, target_n: &Tensor) -> Result<Tensor> {
    let eps = 1e-6;
    let p_n = p_n.clamp(eps, 1. - eps)?;

    let on_target = target_n.mul(&p_n.log()?)?;
    let off_target = target_n
        .affine(-1., 1.)?
        .mul(&p_n.affine(-1., 1.)?.log()?)?;

    (on_target + off_target)?.mean(p_n.rank() - 1)? * (-1.)
}
