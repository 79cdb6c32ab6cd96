use thiserror::Error;

/// Errors raised by model construction and per-batch shape validation.
/// Everything else (tensor ops, optimizer steps) propagates unmodified as
/// `candle_core::Error`.
#[derive(Error, Debug)]
pub enum VaeGanError {
    #[error("model configuration error: {reason}")]
    Configuration { reason: String },

    #[error(
        "batch shape mismatch in {modality} modality: \
	 model expects width {expected}, batch has width {found}"
    )]
    DataShape {
        modality: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}
