use crate::records_io::open_buf_writer;
use ndarray::Array2;
use std::io::Write;

/// Per-feature comparison of the real data against the model's
/// reconstruction: first two moments plus a two-sample
/// Kolmogorov-Smirnov statistic.
pub struct FeatureSummary {
    pub name: Box<str>,
    pub real_mean: f32,
    pub real_std: f32,
    pub recon_mean: f32,
    pub recon_std: f32,
    pub ks_stat: f32,
}

pub fn summarize_features(
    names: &[&str],
    real: &Array2<f32>,
    recon: &Array2<f32>,
) -> anyhow::Result<Vec<FeatureSummary>> {
    if real.dim() != recon.dim() {
        return Err(anyhow::anyhow!(
            "real {:?} vs. reconstructed {:?} dims disagree",
            real.dim(),
            recon.dim()
        ));
    }
    if names.len() != real.ncols() {
        return Err(anyhow::anyhow!(
            "{} feature names for {} columns",
            names.len(),
            real.ncols()
        ));
    }

    let summaries = names
        .iter()
        .enumerate()
        .map(|(j, &name)| {
            let x: Vec<f32> = real.column(j).to_vec();
            let y: Vec<f32> = recon.column(j).to_vec();
            let (real_mean, real_std) = mean_std(&x);
            let (recon_mean, recon_std) = mean_std(&y);
            FeatureSummary {
                name: name.into(),
                real_mean,
                real_std,
                recon_mean,
                recon_std,
                ks_stat: ks_statistic(&x, &y),
            }
        })
        .collect();

    Ok(summaries)
}

/// Write the summaries as a tab-separated table
pub fn write_feature_summaries(
    summaries: &[FeatureSummary],
    output_file: &str,
) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(output_file)?;
    writeln!(
        buf,
        "Feature\tReal_Mean\tReal_Std\tRecon_Mean\tRecon_Std\tKS_Stat"
    )?;
    for s in summaries {
        writeln!(
            buf,
            "{}\t{}\t{}\t{}\t{}\t{}",
            s.name, s.real_mean, s.real_std, s.recon_mean, s.recon_std, s.ks_stat
        )?;
    }
    buf.flush()?;
    Ok(())
}

fn mean_std(x: &[f32]) -> (f32, f32) {
    if x.is_empty() {
        return (0., 0.);
    }
    let n = x.len() as f32;
    let mean = x.iter().sum::<f32>() / n;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / (n - 1.).max(1.);
    (mean, var.sqrt())
}

/// Two-sample Kolmogorov-Smirnov statistic: the largest gap between
/// the two empirical CDFs.
pub fn ks_statistic(x: &[f32], y: &[f32]) -> f32 {
    if x.is_empty() || y.is_empty() {
        return 0.;
    }

    let mut x = x.to_vec();
    let mut y = y.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    y.sort_by(|a, b| a.total_cmp(b));

    let (nx, ny) = (x.len() as f32, y.len() as f32);
    let (mut i, mut j) = (0_usize, 0_usize);
    let mut ks = 0_f32;

    while i < x.len() && j < y.len() {
        let v = x[i].min(y[j]);
        while i < x.len() && x[i] <= v {
            i += 1;
        }
        while j < y.len() && y[j] <= v {
            j += 1;
        }
        let gap = (i as f32 / nx - j as f32 / ny).abs();
        ks = ks.max(gap);
    }

    ks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ks_of_identical_samples_is_zero() {
        let x = vec![0.1, 0.5, 0.9, 0.3, 0.7];
        assert_abs_diff_eq!(ks_statistic(&x, &x), 0., epsilon = 1e-6);
    }

    #[test]
    fn ks_of_disjoint_samples_is_one() {
        let x = vec![0.0, 0.1, 0.2];
        let y = vec![10.0, 11.0, 12.0];
        assert_abs_diff_eq!(ks_statistic(&x, &y), 1., epsilon = 1e-6);
    }

    #[test]
    fn summaries_cover_each_feature() -> anyhow::Result<()> {
        let real = Array2::from_shape_fn((100, 2), |(i, j)| (i + j) as f32 / 100.);
        let recon = real.clone();
        let summaries = summarize_features(&["a", "b"], &real, &recon)?;

        assert_eq!(summaries.len(), 2);
        for s in summaries {
            assert_abs_diff_eq!(s.real_mean, s.recon_mean, epsilon = 1e-6);
            assert_abs_diff_eq!(s.ks_stat, 0., epsilon = 1e-6);
        }
        Ok(())
    }
}
