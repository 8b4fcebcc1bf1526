//! Utilities.
use anyhow::Result;
use candle_core::{Tensor, D};
use candle_nn::{
    ops::{log_softmax, softmax},
    VarMap,
};
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::SmallRng,
};

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// Copies all variables of `src` into `dest`.
///
/// Variables are identified by their names; both maps must have been
/// populated from the same model configuration.
pub fn copy_params(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = dest.data().lock().unwrap();
    let src = src.data().lock().unwrap();

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src.get(k_dest).unwrap();
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// Samples from the categorical distribution over a `[1, n]` logit tensor.
///
/// Returns the sampled index and its log-probability.
pub fn sample_categorical(logits: &Tensor, rng: &mut SmallRng) -> Result<(usize, f32)> {
    let probs = softmax(logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;
    let logps = log_softmax(logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;
    let ix = WeightedIndex::new(&probs)?.sample(rng);
    Ok((ix, logps[ix]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use rand::SeedableRng;

    #[test]
    fn test_copy_params() -> Result<()> {
        use candle_core::DType;
        use candle_nn::Init;

        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };

        let vm_src = VarMap::new();
        vm_src.get((3,), "var1", init, DType::F32, &Device::Cpu)?;
        vm_src.data().lock().unwrap().get("var1").unwrap().set(&t_src)?;

        let vm_dest = VarMap::new();
        vm_dest.get((3,), "var1", init, DType::F32, &Device::Cpu)?;

        copy_params(&vm_dest, &vm_src)?;

        let t_dest = vm_dest
            .data()
            .lock()
            .unwrap()
            .get("var1")
            .unwrap()
            .as_tensor()
            .clone();
        assert_eq!(t_dest.to_vec1::<f32>()?, vec![1.0f32, 2.0, 3.0]);

        Ok(())
    }

    #[test]
    fn categorical_sampling_follows_logits() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(0);
        let logits = Tensor::from_slice(&[20.0f32, -20.0], (1, 2), &Device::Cpu)?;

        for _ in 0..10 {
            let (ix, logp) = sample_categorical(&logits, &mut rng)?;
            assert_eq!(ix, 0);
            assert!(logp.abs() < 1e-4);
        }

        Ok(())
    }
}
