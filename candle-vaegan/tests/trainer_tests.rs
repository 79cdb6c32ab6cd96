use candle_core::Device;
use candle_vaegan::candle_data_loader::{InMemoryMultimodalData, MultimodalDataLoader};
use candle_vaegan::candle_model_vaegan::{HierarchicalVaeGan, VaeGanConfig};
use candle_vaegan::candle_nn::VarMap;
use candle_vaegan::candle_vaegan_trainer::{AdversarialMode, TrainConfig, VaeGanTrainer};

use ndarray::Array2;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn toy_matrices(n: usize) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    let mut rng = ndarray_rand::rand::rngs::StdRng::seed_from_u64(1);
    let genetic = Array2::random_using((n, 1), Uniform::new(0_f32, 1.), &mut rng);
    let clinical = Array2::random_using((n, 5), Uniform::new(0_f32, 1.), &mut rng);
    (genetic, clinical, Array2::zeros((n, 0)))
}

fn snapshot(vars: &VarMap, name: &str) -> anyhow::Result<Vec<f32>> {
    let data = vars.data().lock().expect("varmap lock");
    let var = data
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("missing variable: {}", name))?;
    Ok(var.as_tensor().flatten_all()?.to_vec1::<f32>()?)
}

fn quiet_config(num_epochs: usize) -> TrainConfig {
    TrainConfig {
        num_epochs,
        seed: Some(9),
        show_progress: false,
        ..Default::default()
    }
}

#[test]
fn one_epoch_updates_the_parameters() -> anyhow::Result<()> {
    let (g, c, e) = toy_matrices(320);

    let config = VaeGanConfig::new(1, 5, 0).with_latent(10);
    let (model, gen_vars, disc_vars) = HierarchicalVaeGan::build_seeded(&config, &Device::Cpu, 42)?;

    let before = snapshot(&gen_vars, "decoder.nn.dec.recon.weight")?;

    let mut data = InMemoryMultimodalData::new_with_seed(&g, &c, &e, 7)?;
    let mut trainer = VaeGanTrainer::build(&model, &gen_vars, &disc_vars);
    let trace = trainer.train(&mut data, &quiet_config(1))?;

    // 320 samples at batch size 32
    assert_eq!(data.num_minibatch(), 10);
    assert_eq!(trace.len(), 1);
    assert!(trace[0].is_finite());

    let after = snapshot(&gen_vars, "decoder.nn.dec.recon.weight")?;
    assert!(before.iter().zip(after.iter()).any(|(a, b)| a != b));
    Ok(())
}

#[test]
fn seeded_training_is_reproducible() -> anyhow::Result<()> {
    fn run_once() -> anyhow::Result<Vec<f32>> {
        let (g, c, e) = toy_matrices(96);
        let config = VaeGanConfig::new(1, 5, 0).with_latent(4).with_hidden(16).with_embed(8);
        let (model, gen_vars, disc_vars) =
            HierarchicalVaeGan::build_seeded(&config, &Device::Cpu, 42)?;

        let mut data = InMemoryMultimodalData::new_with_seed(&g, &c, &e, 7)?;
        let mut trainer = VaeGanTrainer::build(&model, &gen_vars, &disc_vars);
        trainer.train(&mut data, &quiet_config(2))
    }

    let first = run_once()?;
    let second = run_once()?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn final_partial_batch_is_kept() -> anyhow::Result<()> {
    let (g, c, e) = toy_matrices(100);

    let config = VaeGanConfig::new(1, 5, 0).with_latent(4).with_hidden(16).with_embed(8);
    let (model, gen_vars, disc_vars) = HierarchicalVaeGan::build_seeded(&config, &Device::Cpu, 3)?;

    let mut data = InMemoryMultimodalData::new_with_seed(&g, &c, &e, 5)?;
    let mut trainer = VaeGanTrainer::build(&model, &gen_vars, &disc_vars);
    trainer.train(&mut data, &quiet_config(1))?;

    // 3 full batches of 32 plus one of 4
    assert_eq!(data.num_minibatch(), 4);
    Ok(())
}

#[test]
fn two_step_mode_updates_both_parameter_sets() -> anyhow::Result<()> {
    let (g, c, e) = toy_matrices(64);

    let config = VaeGanConfig::new(1, 5, 0).with_latent(4).with_hidden(16).with_embed(8);
    let (model, gen_vars, disc_vars) = HierarchicalVaeGan::build_seeded(&config, &Device::Cpu, 8)?;

    let gen_before = snapshot(&gen_vars, "decoder.nn.dec.recon.weight")?;
    let disc_before = snapshot(&disc_vars, "discriminator.nn.disc.score.weight")?;

    let mut data = InMemoryMultimodalData::new_with_seed(&g, &c, &e, 2)?;
    let mut trainer = VaeGanTrainer::build(&model, &gen_vars, &disc_vars);

    let train_config = TrainConfig {
        adversarial: AdversarialMode::TwoStep,
        ..quiet_config(1)
    };
    let trace = trainer.train(&mut data, &train_config)?;
    assert!(trace[0].is_finite());

    let gen_after = snapshot(&gen_vars, "decoder.nn.dec.recon.weight")?;
    let disc_after = snapshot(&disc_vars, "discriminator.nn.disc.score.weight")?;

    assert!(gen_before.iter().zip(gen_after.iter()).any(|(a, b)| a != b));
    assert!(disc_before
        .iter()
        .zip(disc_after.iter())
        .any(|(a, b)| a != b));
    Ok(())
}
