use approx::assert_abs_diff_eq;
use candle_core::{Device, Tensor};
use candle_vaegan::candle_loss_functions::*;

#[test]
fn mse_is_zero_only_at_equality() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let x = Tensor::from_vec(vec![0.2_f32, 0.4, 0.6, 0.1, 0.9, 0.5], (2, 3), &device)?;

    for mse in mean_squared_error(&x, &x)?.to_vec1::<f32>()? {
        assert_abs_diff_eq!(mse, 0., epsilon = 1e-7);
    }

    let y = (&x + 0.1)?;
    for mse in mean_squared_error(&x, &y)?.to_vec1::<f32>()? {
        assert!(mse > 0.);
        assert_abs_diff_eq!(mse, 0.01, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn bce_at_an_uninformative_score_is_ln_two() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let p = Tensor::from_vec(vec![0.5_f32; 4], (4, 1), &device)?;
    let target = p.ones_like()?;

    for bce in binary_cross_entropy(&p, &target)?.to_vec1::<f32>()? {
        assert_abs_diff_eq!(bce, std::f32::consts::LN_2, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn bce_rewards_confident_correct_scores() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let target = Tensor::from_vec(vec![1.0_f32; 3], (3, 1), &device)?;

    let confident = Tensor::from_vec(vec![0.99_f32; 3], (3, 1), &device)?;
    let hesitant = Tensor::from_vec(vec![0.6_f32; 3], (3, 1), &device)?;

    let bce_confident = binary_cross_entropy(&confident, &target)?.to_vec1::<f32>()?;
    let bce_hesitant = binary_cross_entropy(&hesitant, &target)?.to_vec1::<f32>()?;

    for (a, b) in bce_confident.iter().zip(bce_hesitant.iter()) {
        assert!(a < b);
    }
    Ok(())
}

#[test]
fn bce_stays_finite_at_saturated_scores() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let p = Tensor::from_vec(vec![0.0_f32, 1.0], (2, 1), &device)?;
    let target = Tensor::from_vec(vec![1.0_f32, 0.0], (2, 1), &device)?;

    for bce in binary_cross_entropy(&p, &target)?.to_vec1::<f32>()? {
        assert!(bce.is_finite());
    }
    Ok(())
}

#[test]
fn kl_matches_the_closed_form() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let mean = Tensor::from_vec(vec![1.0_f32, 0.0], (1, 2), &device)?;
    let lnvar = Tensor::from_vec(vec![0.0_f32, 0.0], (1, 2), &device)?;

    // -0.5 * mean_k(1 + lnvar - mu^2 - exp(lnvar)) = 0.5 * mean(1, 0) = 0.25
    let kl = gaussian_kl_loss(&mean, &lnvar)?.to_vec1::<f32>()?;
    assert_abs_diff_eq!(kl[0], 0.25, epsilon = 1e-6);
    Ok(())
}
