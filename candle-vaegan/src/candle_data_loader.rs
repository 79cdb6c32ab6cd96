#![allow(dead_code)]

use candle_core::{Device, Tensor};
use ndarray::Array2;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// One minibatch of per-modality feature tensors (rows = samples). A
/// zero-width modality stays present as an `(n, 0)` tensor so the
/// concatenated feature layout never shifts.
pub struct MultimodalMinibatch {
    pub genetic: Tensor,
    pub clinical: Tensor,
    pub environmental: Tensor,
}

impl MultimodalMinibatch {
    pub fn num_samples(&self) -> usize {
        self.genetic.dims()[0]
    }

    pub fn widths(&self) -> (usize, usize, usize) {
        (
            self.genetic.dims()[1],
            self.clinical.dims()[1],
            self.environmental.dims()[1],
        )
    }

    /// Concatenate the modality tensors into one (n x (g+c+e)) feature
    /// tensor, in genetic, clinical, environmental order.
    pub fn concat_features(&self) -> candle_core::Result<Tensor> {
        let parts: Vec<&Tensor> = [&self.genetic, &self.clinical, &self.environmental]
            .into_iter()
            .filter(|t| t.dims()[1] > 0)
            .collect();
        Tensor::cat(&parts, 1)
    }
}

/// `MultimodalDataLoader` for minibatch learning
pub trait MultimodalDataLoader {
    fn minibatch_shuffled(
        &self,
        batch_idx: usize,
        target_device: &Device,
    ) -> anyhow::Result<MultimodalMinibatch>;

    fn num_samples(&self) -> usize;

    fn num_minibatch(&self) -> usize;

    fn shuffle_minibatch(&mut self, batch_size: usize) -> anyhow::Result<()>;
}

struct ModalityRows {
    width: usize,
    rows: Vec<Tensor>, // empty when width == 0
}

impl ModalityRows {
    fn from_array(x: &Array2<f32>) -> Self {
        let width = x.ncols();
        let rows = if width == 0 {
            vec![]
        } else {
            x.rows_to_tensor_vec()
        };
        Self { width, rows }
    }

    fn chunk(&self, samples: &[usize]) -> anyhow::Result<Tensor> {
        if self.width == 0 {
            return Ok(Tensor::zeros(
                (samples.len(), 0),
                candle_core::DType::F32,
                &Device::Cpu,
            )?);
        }
        let chunk: Vec<Tensor> = samples.iter().map(|&i| self.rows[i].clone()).collect();
        Ok(Tensor::cat(&chunk, 0)?)
    }
}

///
/// A data loader for three in-memory modality matrices sharing their
/// row (sample) indexing. Each epoch is a fresh without-replacement
/// permutation of the samples, chunked into minibatches; the final
/// chunk may be partial.
///
pub struct InMemoryMultimodalData {
    genetic: ModalityRows,
    clinical: ModalityRows,
    environmental: ModalityRows,

    shuffled_genetic: Option<Vec<Tensor>>,
    shuffled_clinical: Option<Vec<Tensor>>,
    shuffled_environmental: Option<Vec<Tensor>>,

    minibatches: Minibatches,
    rng: StdRng,
}

impl InMemoryMultimodalData {
    ///
    /// Create a data loader from the three modality matrices; all must
    /// have the same number of rows (a zero-width matrix is fine).
    ///
    pub fn new(
        genetic: &Array2<f32>,
        clinical: &Array2<f32>,
        environmental: &Array2<f32>,
    ) -> anyhow::Result<Self> {
        Self::build(genetic, clinical, environmental, None)
    }

    /// Same as `new`, with a fixed shuffling seed for reproducible
    /// batch order.
    pub fn new_with_seed(
        genetic: &Array2<f32>,
        clinical: &Array2<f32>,
        environmental: &Array2<f32>,
        seed: u64,
    ) -> anyhow::Result<Self> {
        Self::build(genetic, clinical, environmental, Some(seed))
    }

    fn build(
        genetic: &Array2<f32>,
        clinical: &Array2<f32>,
        environmental: &Array2<f32>,
        seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        let nrows = genetic.nrows();
        if clinical.nrows() != nrows || environmental.nrows() != nrows {
            return Err(anyhow::anyhow!(
                "modality row counts disagree: genetic {}, clinical {}, environmental {}",
                nrows,
                clinical.nrows(),
                environmental.nrows()
            ));
        }
        if nrows == 0 {
            return Err(anyhow::anyhow!("empty input in data loader"));
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        Ok(Self {
            genetic: ModalityRows::from_array(genetic),
            clinical: ModalityRows::from_array(clinical),
            environmental: ModalityRows::from_array(environmental),
            shuffled_genetic: None,
            shuffled_clinical: None,
            shuffled_environmental: None,
            minibatches: Minibatches {
                samples: (0..nrows).collect(),
                chunks: vec![],
            },
            rng,
        })
    }
}

impl MultimodalDataLoader for InMemoryMultimodalData {
    fn minibatch_shuffled(
        &self,
        batch_idx: usize,
        target_device: &Device,
    ) -> anyhow::Result<MultimodalMinibatch> {
        let genetic = take_shuffled(batch_idx, target_device, self.shuffled_genetic.as_ref())?;
        let clinical = take_shuffled(batch_idx, target_device, self.shuffled_clinical.as_ref())?;
        let environmental = take_shuffled(
            batch_idx,
            target_device,
            self.shuffled_environmental.as_ref(),
        )?;

        Ok(MultimodalMinibatch {
            genetic,
            clinical,
            environmental,
        })
    }

    fn num_samples(&self) -> usize {
        self.minibatches.size()
    }

    fn num_minibatch(&self) -> usize {
        self.minibatches.chunks.len()
    }

    fn shuffle_minibatch(&mut self, batch_size: usize) -> anyhow::Result<()> {
        if batch_size == 0 {
            return Err(anyhow::anyhow!("batch size must be positive"));
        }

        /////////////////////
        // shuffle indexes //
        /////////////////////

        self.minibatches.shuffle_minibatch(batch_size, &mut self.rng);

        ///////////////////////////////////
        // preload all the shuffled data //
        ///////////////////////////////////

        let mut genetic = Vec::with_capacity(self.num_minibatch());
        let mut clinical = Vec::with_capacity(self.num_minibatch());
        let mut environmental = Vec::with_capacity(self.num_minibatch());

        for samples in self.minibatches.chunks.iter() {
            genetic.push(self.genetic.chunk(samples)?);
            clinical.push(self.clinical.chunk(samples)?);
            environmental.push(self.environmental.chunk(samples)?);
        }

        self.shuffled_genetic = Some(genetic);
        self.shuffled_clinical = Some(clinical);
        self.shuffled_environmental = Some(environmental);

        Ok(())
    }
}

fn take_shuffled(
    batch_idx: usize,
    target_device: &Device,
    data_vec: Option<&Vec<Tensor>>,
) -> anyhow::Result<Tensor> {
    if let Some(data_vec) = data_vec {
        if data_vec.len() <= batch_idx {
            Err(anyhow::anyhow!(
                "invalid index = {} vs. total # = {}",
                batch_idx,
                data_vec.len()
            ))
        } else {
            Ok(data_vec[batch_idx].to_device(target_device)?)
        }
    } else {
        Err(anyhow::anyhow!("need to shuffle data"))
    }
}

///
/// A helper `struct` for shuffling and creating minibatch indexes;
/// after `shuffle_minibatch` is called, `chunks` partition the sample
/// indexes without replacement.
///
pub struct Minibatches {
    samples: Vec<usize>,
    pub chunks: Vec<Vec<usize>>,
}

impl Minibatches {
    pub fn shuffle_minibatch(&mut self, batch_size: usize, rng: &mut StdRng) {
        self.samples.shuffle(rng);
        self.chunks = self
            .samples
            .chunks(batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }
}

///
/// Convert rows of a matrix to a vector of `Tensor`
///
pub trait RowsToTensorVec {
    fn rows_to_tensor_vec(&self) -> Vec<Tensor>;
}

impl RowsToTensorVec for Array2<f32> {
    fn rows_to_tensor_vec(&self) -> Vec<Tensor> {
        let mut idx_data = self
            .axis_iter(ndarray::Axis(0))
            .enumerate()
            .par_bridge()
            .map(|(i, row)| {
                let mut v = Tensor::from_iter(row.iter().copied(), &Device::Cpu)
                    .expect("failed to create tensor");
                v = v.reshape((1, row.len())).expect("failed to reshape");
                (i, v)
            })
            .collect::<Vec<_>>();

        idx_data.sort_by_key(|(i, _)| *i);
        idx_data.into_iter().map(|(_, t)| t).collect()
    }
}
