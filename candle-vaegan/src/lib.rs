pub mod candle_aux_layers;
pub mod candle_data_loader;
pub mod candle_decoder_feature;
pub mod candle_discriminator;
pub mod candle_encoder_modality;
pub mod candle_latent_gaussian;
pub mod candle_latent_projector;
pub mod candle_loss_functions;
pub mod candle_model_traits;
pub mod candle_model_vaegan;
pub mod candle_vaegan_trainer;
pub mod error;

pub use candle_core;
pub use candle_nn;
