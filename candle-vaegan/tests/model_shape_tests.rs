use candle_core::{DType, Device, Tensor};
use candle_vaegan::candle_data_loader::MultimodalMinibatch;
use candle_vaegan::candle_decoder_feature::FeatureDecoder;
use candle_vaegan::candle_discriminator::Discriminator;
use candle_vaegan::candle_encoder_modality::ModalityEncoder;
use candle_vaegan::candle_latent_projector::LatentProjector;
use candle_vaegan::candle_model_traits::EncoderModuleT;
use candle_vaegan::candle_model_vaegan::{HierarchicalVaeGan, VaeGanConfig};
use candle_vaegan::candle_nn::{VarBuilder, VarMap};
use candle_vaegan::error::VaeGanError;

fn rand_or_zero(n: usize, d: usize) -> candle_core::Result<Tensor> {
    if d == 0 {
        Tensor::zeros((n, 0), DType::F32, &Device::Cpu)
    } else {
        Tensor::rand(0_f32, 1_f32, (n, d), &Device::Cpu)
    }
}

fn random_batch(n: usize, g: usize, c: usize, e: usize) -> candle_core::Result<MultimodalMinibatch> {
    Ok(MultimodalMinibatch {
        genetic: rand_or_zero(n, g)?,
        clinical: rand_or_zero(n, c)?,
        environmental: rand_or_zero(n, e)?,
    })
}

#[test]
fn reconstruction_width_is_the_total_feature_width() -> anyhow::Result<()> {
    let config = VaeGanConfig::new(1, 5, 0).with_latent(10);
    let (model, _gen, _disc) = HierarchicalVaeGan::build(&config, &Device::Cpu)?;

    let out = model.forward_t(&random_batch(7, 1, 5, 0)?, false)?;

    assert_eq!(out.recon.dims(), &[7, 6]);
    assert_eq!(out.validity.dims(), &[7, 1]);
    assert_eq!(out.latent.dim_latent(), 10);
    assert_eq!(out.latent.mean.dims(), &[7, 10]);
    assert_eq!(out.latent.lnvar.dims(), &[7, 10]);
    Ok(())
}

#[test]
fn all_modalities_present() -> anyhow::Result<()> {
    let config = VaeGanConfig::new(2, 3, 4).with_latent(6);
    let (model, _gen, _disc) = HierarchicalVaeGan::build(&config, &Device::Cpu)?;

    let out = model.forward_t(&random_batch(11, 2, 3, 4)?, true)?;
    assert_eq!(out.recon.dims(), &[11, 9]);
    Ok(())
}

#[test]
fn zero_width_modality_embeds_to_constant_zero() -> anyhow::Result<()> {
    let vars = VarMap::new();
    let vs = VarBuilder::from_varmap(&vars, DType::F32, &Device::Cpu);

    let encoder = ModalityEncoder::new(0, 128, 64, vs)?;
    let emb = encoder.forward_t(&rand_or_zero(5, 0)?, true)?;

    assert_eq!(emb.dims(), &[5, 64]);
    assert!(emb
        .flatten_all()?
        .to_vec1::<f32>()?
        .iter()
        .all(|&v| v == 0.));
    assert!(vars.all_vars().is_empty());
    Ok(())
}

#[test]
fn misconfigured_projector_fails_at_construction() -> anyhow::Result<()> {
    let vars = VarMap::new();
    let vs = VarBuilder::from_varmap(&vars, DType::F32, &Device::Cpu);

    let config = VaeGanConfig::new(1, 5, 0).with_latent(10);

    let genetic = ModalityEncoder::new(1, 128, 64, vs.pp("genetic"))?;
    let clinical = ModalityEncoder::new(5, 128, 64, vs.pp("clinical"))?;
    let environmental = ModalityEncoder::new(0, 128, 64, vs.pp("environmental"))?;

    // the three embeddings concatenate to 192, not 100
    let projector = LatentProjector::new(100, 10, vs.pp("projector"))?;
    let decoder = FeatureDecoder::new(10, 128, 6, vs.pp("decoder"))?;
    let discriminator = Discriminator::new(6, &[128, 64], vs.pp("discriminator"))?;

    let err = HierarchicalVaeGan::from_parts(
        config,
        genetic,
        clinical,
        environmental,
        projector,
        decoder,
        discriminator,
    )
    .err()
    .expect("construction must fail");

    assert!(matches!(err, VaeGanError::Configuration { .. }));
    Ok(())
}

#[test]
fn degenerate_config_is_rejected() {
    let err = HierarchicalVaeGan::build(&VaeGanConfig::new(0, 0, 0), &Device::Cpu)
        .err()
        .expect("construction must fail");
    assert!(matches!(err, VaeGanError::Configuration { .. }));
}

#[test]
fn mismatched_batch_fails_before_any_update() -> anyhow::Result<()> {
    let config = VaeGanConfig::new(1, 5, 0).with_latent(10);
    let (model, _gen, _disc) = HierarchicalVaeGan::build(&config, &Device::Cpu)?;

    let err = model
        .check_batch(&random_batch(4, 1, 4, 0)?)
        .err()
        .expect("shape check must fail");

    match err {
        VaeGanError::DataShape {
            modality,
            expected,
            found,
        } => {
            assert_eq!(modality, "clinical");
            assert_eq!(expected, 5);
            assert_eq!(found, 4);
        }
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}
