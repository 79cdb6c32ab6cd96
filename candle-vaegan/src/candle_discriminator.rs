use crate::candle_aux_layers::StackLayers;
use crate::candle_model_traits::DiscriminatorModuleT;
use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

/// Scores a feature vector's realism as a probability in [0,1]. In the
/// default training mode it only ever sees reconstructions, so the
/// adversarial signal steers reconstruction realism rather than pure
/// generation.
pub struct Discriminator {
    n_features: usize,
    fc: StackLayers<Linear>,
}

impl Discriminator {
    /// Will create a new discriminator with these variables:
    ///
    /// * `nn.disc.fc.{}.weight` / `bias` where {} is the layer index
    /// * `nn.disc.score.weight` / `bias`
    ///
    /// # Arguments
    /// * `n_features` - full concatenated feature width
    /// * `layers` - hidden layers, each with the dim
    /// * `vs` - variable builder
    pub fn new(n_features: usize, layers: &[usize], vs: VarBuilder) -> Result<Self> {
        debug_assert!(!layers.is_empty());

        let mut fc = StackLayers::<Linear>::new();
        let mut prev_dim = n_features;
        for (j, &next_dim) in layers.iter().enumerate() {
            let _name = format!("nn.disc.fc.{}", j);
            fc.push_with_act(
                candle_nn::linear(prev_dim, next_dim, vs.pp(_name))?,
                candle_nn::Activation::Relu,
            );
            prev_dim = next_dim;
        }

        fc.push_with_act(
            candle_nn::linear(prev_dim, 1, vs.pp("nn.disc.score"))?,
            candle_nn::Activation::Sigmoid,
        );

        Ok(Self { n_features, fc })
    }
}

impl DiscriminatorModuleT for Discriminator {
    fn forward_t(&self, x_nd: &Tensor, _train: bool) -> Result<Tensor> {
        self.fc.forward(x_nd)
    }

    fn dim_obs(&self) -> usize {
        self.n_features
    }
}
