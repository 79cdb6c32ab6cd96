use crate::candle_aux_layers::StackLayers;
use crate::candle_model_traits::EncoderModuleT;
use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

/// One feed-forward encoder per modality, no parameter sharing across
/// modalities. A zero-width modality holds no trainable layers and
/// produces a constant zero embedding so concatenation widths stay
/// consistent downstream.
pub struct ModalityEncoder {
    n_features: usize,
    n_embed: usize,
    fc: Option<StackLayers<Linear>>,
}

impl ModalityEncoder {
    /// Will create a new per-modality encoder with these variables:
    ///
    /// * `nn.enc.fc.0.weight` / `bias`
    /// * `nn.enc.fc.1.weight` / `bias`
    ///
    /// # Arguments
    /// * `n_features` - modality input width (may be zero)
    /// * `n_hidden` - hidden layer dim
    /// * `n_embed` - embedding dim (shared across modalities)
    /// * `vs` - variable builder
    pub fn new(
        n_features: usize,
        n_hidden: usize,
        n_embed: usize,
        vs: VarBuilder,
    ) -> Result<Self> {
        if n_features == 0 {
            return Ok(Self {
                n_features,
                n_embed,
                fc: None,
            });
        }

        let mut fc = StackLayers::<Linear>::new();
        fc.push_with_act(
            candle_nn::linear(n_features, n_hidden, vs.pp("nn.enc.fc.0"))?,
            candle_nn::Activation::Relu,
        );
        fc.push_with_act(
            candle_nn::linear(n_hidden, n_embed, vs.pp("nn.enc.fc.1"))?,
            candle_nn::Activation::Relu,
        );

        Ok(Self {
            n_features,
            n_embed,
            fc: Some(fc),
        })
    }
}

impl EncoderModuleT for ModalityEncoder {
    fn forward_t(&self, x_nd: &Tensor, _train: bool) -> Result<Tensor> {
        match &self.fc {
            Some(fc) => fc.forward(x_nd),
            None => {
                let n = x_nd.dims()[0];
                Tensor::zeros((n, self.n_embed), x_nd.dtype(), x_nd.device())
            }
        }
    }

    fn dim_obs(&self) -> usize {
        self.n_features
    }

    fn dim_embed(&self) -> usize {
        self.n_embed
    }
}
