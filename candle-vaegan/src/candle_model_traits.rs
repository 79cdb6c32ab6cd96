use candle_core::{Result, Tensor};

pub trait EncoderModuleT {
    /// An encoder that projects one modality into an embedding
    ///
    /// # Arguments
    /// * `x_nd` - modality data (n x d)
    /// * `train` - whether this is a training-mode forward pass
    ///
    /// # Returns `emb_ne`
    /// * `emb_ne` - modality embedding (n x e)
    fn forward_t(&self, x_nd: &Tensor, train: bool) -> Result<Tensor>;

    fn dim_obs(&self) -> usize;

    fn dim_embed(&self) -> usize;
}

pub trait DecoderModuleT {
    /// A decoder that spits out reconstruction from latent states
    fn forward(&self, z_nk: &Tensor) -> Result<Tensor>;

    fn dim_obs(&self) -> usize;

    fn dim_latent(&self) -> usize;
}

pub trait DiscriminatorModuleT {
    /// Score a feature vector's realism
    ///
    /// # Returns `validity_n1`
    /// * `validity_n1` - probability in [0,1] that the input is real (n x 1)
    fn forward_t(&self, x_nd: &Tensor, train: bool) -> Result<Tensor>;

    fn dim_obs(&self) -> usize;
}
