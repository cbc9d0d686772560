//! Deep-learning models via ONNX Runtime
//!
//! The Keras architectures (hybrid CNN-LSTM, CNN, BiLSTM) are exported to
//! ONNX offline; at serve time they are all just sessions that map a float
//! tensor to a row of class scores per sample.

use std::path::Path;

use anyhow::{bail, Context};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use crate::preprocess::ScaledInput;

enum Backend {
    // ort sessions require &mut to run
    Onnx(Mutex<Session>),
    /// In-process stand-in for tests; ONNX fixtures are not checked in.
    #[cfg(test)]
    Scorer(Box<dyn Fn(&ScaledInput) -> Array2<f32> + Send + Sync>),
}

pub struct DeepModel {
    backend: Backend,
}

impl std::fmt::Debug for DeepModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepModel").finish_non_exhaustive()
    }
}

impl DeepModel {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let session = Session::builder()
            .context("creating session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("setting optimization level")?
            .commit_from_file(path)
            .with_context(|| format!("loading ONNX model {}", path.display()))?;

        Ok(Self {
            backend: Backend::Onnx(Mutex::new(session)),
        })
    }

    /// Build a model around a plain scoring function instead of a session.
    #[cfg(test)]
    pub fn from_scorer<F>(scorer: F) -> Self
    where
        F: Fn(&ScaledInput) -> Array2<f32> + Send + Sync + 'static,
    {
        Self {
            backend: Backend::Scorer(Box::new(scorer)),
        }
    }

    /// Run the model on a preprocessed batch and return class scores of
    /// shape rows x classes.
    pub fn predict(&self, input: &ScaledInput) -> anyhow::Result<Array2<f32>> {
        let n_rows = input.n_rows();
        if n_rows == 0 {
            bail!("empty input batch");
        }

        match &self.backend {
            Backend::Onnx(session) => run_session(session, input, n_rows),
            #[cfg(test)]
            Backend::Scorer(scorer) => Ok(scorer(input)),
        }
    }
}

fn run_session(
    session: &Mutex<Session>,
    input: &ScaledInput,
    n_rows: usize,
) -> anyhow::Result<Array2<f32>> {
    let mut session = session.lock();

    let output_name = session
        .outputs
        .first()
        .map(|o| o.name.clone())
        .context("model defines no output")?;

    let input_tensor = match input {
        ScaledInput::Flat(data) => {
            Value::from_array(data.clone()).context("building input tensor")?
        }
        ScaledInput::Seq(data) => {
            Value::from_array(data.clone()).context("building input tensor")?
        }
    };

    let outputs = session
        .run(ort::inputs![input_tensor])
        .context("running inference")?;

    let output = outputs
        .get(&output_name)
        .context("model produced no output")?;

    let (_, data) = output
        .try_extract_tensor::<f32>()
        .context("extracting output tensor")?;

    if data.len() % n_rows != 0 {
        bail!(
            "output length {} does not divide into {} rows",
            data.len(),
            n_rows
        );
    }

    let n_cols = data.len() / n_rows;
    Array2::from_shape_vec((n_rows, n_cols), data.to_vec()).context("shaping output scores")
}
