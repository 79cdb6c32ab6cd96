use crate::simulate::PatientRecord;
use ndarray::{Array2, Axis};
use std::collections::BTreeMap;

/// Feature names in concatenation order (genetic, then clinical).
pub const FEATURE_NAMES: [&str; 6] = [
    "Genetic_Variant",
    "Age",
    "Gender",
    "Risk_Score",
    "Lab_Result_1",
    "Lab_Result_2",
];

/// The three fixed-width modality groups of one dataset, rows =
/// samples. No environmental fields exist in the record schema, so
/// that modality stays a zero-width matrix rather than disappearing.
pub struct ModalityMatrices {
    pub genetic: Array2<f32>,
    pub clinical: Array2<f32>,
    pub environmental: Array2<f32>,
}

impl ModalityMatrices {
    pub fn num_samples(&self) -> usize {
        self.genetic.nrows()
    }

    pub fn widths(&self) -> (usize, usize, usize) {
        (
            self.genetic.ncols(),
            self.clinical.ncols(),
            self.environmental.ncols(),
        )
    }

    /// Concatenate the modalities into one (n x (g+c+e)) matrix in
    /// genetic, clinical, environmental order.
    pub fn concat(&self) -> Array2<f32> {
        let n = self.num_samples();
        let width = self.genetic.ncols() + self.clinical.ncols() + self.environmental.ncols();

        let mut out = Array2::zeros((n, width));
        let mut offset = 0;
        for block in [&self.genetic, &self.clinical, &self.environmental] {
            if block.ncols() > 0 {
                out.slice_mut(ndarray::s![.., offset..offset + block.ncols()])
                    .assign(block);
                offset += block.ncols();
            }
        }
        out
    }
}

///
/// Split records into modality groups and encode them numerically:
/// the genetic modality carries the variant's category code, the
/// clinical modality carries age, gender code, risk score, and the two
/// lab results. Every column is then min-max scaled into [0,1], the
/// input range the decoder reconstructs into.
///
pub fn partition_records(records: &[PatientRecord]) -> anyhow::Result<ModalityMatrices> {
    if records.is_empty() {
        return Err(anyhow::anyhow!("no records to partition"));
    }

    let variant_codes = category_codes(records.iter().map(|r| &*r.genetic_variant));

    let n = records.len();
    let mut genetic = Array2::zeros((n, 1));
    let mut clinical = Array2::zeros((n, 5));

    for (i, r) in records.iter().enumerate() {
        genetic[[i, 0]] = variant_codes[&*r.genetic_variant];
        clinical[[i, 0]] = r.age as f32;
        clinical[[i, 1]] = r.gender.code();
        clinical[[i, 2]] = r.risk_score;
        clinical[[i, 3]] = r.lab_result_1;
        clinical[[i, 4]] = r.lab_result_2;
    }

    min_max_scale_columns(&mut genetic);
    min_max_scale_columns(&mut clinical);

    Ok(ModalityMatrices {
        genetic,
        clinical,
        environmental: Array2::zeros((n, 0)),
    })
}

/// Category codes in lexicographic order, like an ordered categorical
/// encoding.
fn category_codes<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<&'a str, f32> {
    let unique: std::collections::BTreeSet<&str> = values.collect();
    unique
        .into_iter()
        .enumerate()
        .map(|(code, name)| (name, code as f32))
        .collect()
}

/// Scale each column into [0,1]; a constant column maps to all zeros.
pub fn min_max_scale_columns(x: &mut Array2<f32>) {
    for mut column in x.axis_iter_mut(Axis(1)) {
        let min = column.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = column.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let span = max - min;
        if span > 0. {
            column.mapv_inplace(|v| (v - min) / span);
        } else {
            column.fill(0.);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_records(n: usize) -> Vec<PatientRecord> {
        let mut rng = StdRng::seed_from_u64(7);
        let graph = KnowledgeGraph::build(
            &boxed_names(&DEFAULT_DISEASES),
            &boxed_names(&DEFAULT_VARIANTS),
            &mut rng,
        )
        .unwrap();
        simulate_records(n, &graph, &mut rng).unwrap()
    }

    #[test]
    fn partition_has_fixed_widths() {
        let mm = partition_records(&sample_records(50)).unwrap();
        assert_eq!(mm.widths(), (1, 5, 0));
        assert_eq!(mm.num_samples(), 50);
        assert_eq!(mm.concat().dim(), (50, 6));
    }

    #[test]
    fn partition_scales_into_unit_interval() {
        let mm = partition_records(&sample_records(200)).unwrap();
        for x in mm.genetic.iter().chain(mm.clinical.iter()) {
            assert!((0. ..=1.).contains(x), "out of range: {}", x);
        }
    }

    #[test]
    fn constant_column_scales_to_zero() {
        let mut x = Array2::from_elem((4, 2), 3.5_f32);
        min_max_scale_columns(&mut x);
        assert!(x.iter().all(|&v| v == 0.));
    }
}
