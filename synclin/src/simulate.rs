use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{weighted::WeightedIndex, Distribution, Normal, Uniform};

pub const DEFAULT_DISEASES: [&str; 3] = ["Cystic Fibrosis", "Hemophilia", "Huntington's Disease"];

pub const DEFAULT_VARIANTS: [&str; 3] = ["Mutation X", "Mutation Y", "Mutation Z"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// Numeric encoding used by the feature partitioner
    pub fn code(&self) -> f32 {
        match self {
            Gender::Male => 0.,
            Gender::Female => 1.,
        }
    }

    pub fn parse(word: &str) -> anyhow::Result<Self> {
        match word {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            _ => Err(anyhow::anyhow!("unknown gender: {}", word)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::Low => "Low Risk",
        }
    }

    pub fn parse(word: &str) -> anyhow::Result<Self> {
        match word {
            "High Risk" => Ok(RiskLevel::High),
            "Medium Risk" => Ok(RiskLevel::Medium),
            "Low Risk" => Ok(RiskLevel::Low),
            _ => Err(anyhow::anyhow!("unknown risk level: {}", word)),
        }
    }
}

/// Semantic rule tying a genetic variant to a disease risk level.
pub fn disease_risk_for(variant: &str) -> RiskLevel {
    match variant {
        "Mutation X" => RiskLevel::High,
        "Mutation Y" => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// One synthetic patient. Immutable once generated; the model core
/// only ever reads the numeric encoding derived from these fields.
#[derive(Debug, Clone)]
pub struct PatientRecord {
    pub patient_id: usize,
    pub age: u32,
    pub gender: Gender,
    pub genetic_variant: Box<str>,
    pub disease_risk: RiskLevel,
    pub disease: Box<str>,
    pub risk_score: f32,
    pub lab_result_1: f32,
    pub lab_result_2: f32,
}

///
/// Weighted variant -> disease associations. Each pair carries a
/// weight in [0.5, 1), and disease assignment normalizes the outgoing
/// weights of a patient's variant into a probability vector.
///
pub struct KnowledgeGraph {
    diseases: Vec<Box<str>>,
    variants: Vec<Box<str>>,
    weights: Vec<Vec<f32>>, // variant x disease
}

impl KnowledgeGraph {
    pub fn build(
        diseases: &[Box<str>],
        variants: &[Box<str>],
        rng: &mut StdRng,
    ) -> anyhow::Result<Self> {
        if diseases.is_empty() || variants.is_empty() {
            return Err(anyhow::anyhow!(
                "need at least one disease and one genetic variant"
            ));
        }

        let unif = Uniform::new(0.5_f32, 1.0)?;

        let weights = (0..variants.len())
            .map(|_| (0..diseases.len()).map(|_| unif.sample(rng)).collect())
            .collect();

        Ok(Self {
            diseases: diseases.to_vec(),
            variants: variants.to_vec(),
            weights,
        })
    }

    pub fn diseases(&self) -> &[Box<str>] {
        &self.diseases
    }

    pub fn variants(&self) -> &[Box<str>] {
        &self.variants
    }

    /// Normalized disease probabilities for one variant; falls back to
    /// uniform when the variant has no outgoing weight.
    pub fn disease_probabilities(&self, variant_idx: usize) -> Vec<f32> {
        let weights = &self.weights[variant_idx];
        let total: f32 = weights.iter().sum();
        if total > 0. {
            weights.iter().map(|w| w / total).collect()
        } else {
            vec![1. / self.diseases.len() as f32; self.diseases.len()]
        }
    }
}

///
/// Generate `num_samples` synthetic patient records from the knowledge
/// graph: demographics and labs are drawn independently, the disease
/// follows the variant's normalized edge weights, and the risk level
/// follows the semantic rule.
///
pub fn simulate_records(
    num_samples: usize,
    graph: &KnowledgeGraph,
    rng: &mut StdRng,
) -> anyhow::Result<Vec<PatientRecord>> {
    let age_unif = Uniform::new(0_u32, 100)?;
    let score_unif = Uniform::new(0_f32, 1.)?;
    let lab1_distr = Normal::new(100_f32, 15.)?;
    let lab2_distr = Normal::new(50_f32, 10.)?;
    let variant_unif = Uniform::new(0_usize, graph.variants().len())?;

    let mut records = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let variant_idx = variant_unif.sample(rng);
        let genetic_variant = graph.variants()[variant_idx].clone();
        let disease_risk = disease_risk_for(&genetic_variant);

        let disease_probs = graph.disease_probabilities(variant_idx);
        let disease_idx = WeightedIndex::new(&disease_probs)?.sample(rng);

        records.push(PatientRecord {
            patient_id: i + 1,
            age: age_unif.sample(rng),
            gender: if rng.random_bool(0.5) {
                Gender::Male
            } else {
                Gender::Female
            },
            genetic_variant,
            disease_risk,
            disease: graph.diseases()[disease_idx].clone(),
            risk_score: score_unif.sample(rng),
            lab_result_1: lab1_distr.sample(rng),
            lab_result_2: lab2_distr.sample(rng),
        });
    }

    Ok(records)
}

pub fn boxed_names(names: &[&str]) -> Vec<Box<str>> {
    names.iter().map(|x| Box::from(*x)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn disease_probabilities_normalize() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(1);
        let graph = KnowledgeGraph::build(
            &boxed_names(&DEFAULT_DISEASES),
            &boxed_names(&DEFAULT_VARIANTS),
            &mut rng,
        )?;

        for v in 0..graph.variants().len() {
            let probs = graph.disease_probabilities(v);
            let total: f32 = probs.iter().sum();
            assert!((total - 1.).abs() < 1e-5);
            assert!(probs.iter().all(|&p| p > 0.));
        }
        Ok(())
    }

    #[test]
    fn semantic_risk_rule() {
        assert_eq!(disease_risk_for("Mutation X"), RiskLevel::High);
        assert_eq!(disease_risk_for("Mutation Y"), RiskLevel::Medium);
        assert_eq!(disease_risk_for("Mutation Z"), RiskLevel::Low);
        assert_eq!(disease_risk_for("anything else"), RiskLevel::Low);
    }

    #[test]
    fn simulated_records_stay_in_range() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let graph = KnowledgeGraph::build(
            &boxed_names(&DEFAULT_DISEASES),
            &boxed_names(&DEFAULT_VARIANTS),
            &mut rng,
        )?;
        let records = simulate_records(100, &graph, &mut rng)?;

        assert_eq!(records.len(), 100);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.patient_id, i + 1);
            assert!(r.age < 100);
            assert!((0. ..1.).contains(&r.risk_score));
            assert!(r.lab_result_1.is_finite());
            assert!(r.lab_result_2.is_finite());
            assert_eq!(r.disease_risk, disease_risk_for(&r.genetic_variant));
            assert!(graph.diseases().contains(&r.disease));
            assert!(graph.variants().contains(&r.genetic_variant));
        }
        Ok(())
    }
}
