use crate::candle_aux_layers::StackLayers;
use crate::candle_model_traits::DecoderModuleT;
use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

////////////////////////////
// Feature Vector Decoder //
////////////////////////////

/// Reconstructs the full concatenated feature vector from a latent
/// vector. Every output coordinate passes through a sigmoid, so callers
/// must normalize observed modality vectors into [0,1] before training.
pub struct FeatureDecoder {
    n_features: usize,
    n_latent: usize,
    fc: StackLayers<Linear>,
}

impl FeatureDecoder {
    /// Will create a new feature decoder with these variables:
    ///
    /// * `nn.dec.fc.0.weight` / `bias`
    /// * `nn.dec.recon.weight` / `bias`
    pub fn new(
        n_latent: usize,
        n_hidden: usize,
        n_features: usize,
        vs: VarBuilder,
    ) -> Result<Self> {
        let mut fc = StackLayers::<Linear>::new();
        fc.push_with_act(
            candle_nn::linear(n_latent, n_hidden, vs.pp("nn.dec.fc.0"))?,
            candle_nn::Activation::Relu,
        );
        fc.push_with_act(
            candle_nn::linear(n_hidden, n_features, vs.pp("nn.dec.recon"))?,
            candle_nn::Activation::Sigmoid,
        );

        Ok(Self {
            n_features,
            n_latent,
            fc,
        })
    }
}

impl DecoderModuleT for FeatureDecoder {
    fn forward(&self, z_nk: &Tensor) -> Result<Tensor> {
        self.fc.forward(z_nk)
    }

    fn dim_obs(&self) -> usize {
        self.n_features
    }

    fn dim_latent(&self) -> usize {
        self.n_latent
    }
}
