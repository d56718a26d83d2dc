use std::path::Path;

use anyhow::Context;
use tract_onnx::prelude::*;

use super::{preprocess::INPUT_SIZE, Array4, SeverityModel};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A trained classifier exported to ONNX.
///
/// The graph must take one `f32` input of shape `[1, 224, 224, 3]` (NHWC,
/// values in [0, 1]) and produce the three class probabilities.
pub struct OnnxModel {
    plan: Plan,
}

impl OnnxModel {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let side = INPUT_SIZE as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("read onnx model {}", path.display()))?
            .with_input_fact(0, f32::fact([1, side, side, 3]).into())?
            .into_optimized()
            .context("optimize model")?
            .into_runnable()
            .context("build execution plan")?;
        Ok(Self { plan })
    }
}

impl SeverityModel for OnnxModel {
    fn predict(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>> {
        let tensor: Tensor = input.clone().into();
        let outputs = self.plan.run(tvec!(tensor.into())).context("run model")?;
        let probs = outputs
            .first()
            .context("model produced no output")?
            .to_array_view::<f32>()?
            .iter()
            .copied()
            .collect();
        Ok(probs)
    }
}
