//! Inference-only LSTM and dense layers.
//!
//! Weight layout follows the common Keras convention: `kernel` is
//! `[input_dim][4 * units]`, `recurrent` is `[units][4 * units]`, and the
//! gate blocks are ordered input, forget, cell, output.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot-uniform matrix of shape `[fan_in][fan_out]`.
fn glorot_uniform<R: Rng>(rng: &mut R, fan_in: usize, fan_out: usize) -> Vec<Vec<f64>> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    (0..fan_in)
        .map(|_| (0..fan_out).map(|_| rng.gen_range(-limit..=limit)).collect())
        .collect()
}

fn check_matrix(name: &str, m: &[Vec<f64>], rows: usize, cols: usize) -> Result<(), ModelError> {
    if m.len() != rows || m.iter().any(|r| r.len() != cols) {
        return Err(ModelError::Format(format!(
            "{name} must be {rows}x{cols}"
        )));
    }
    Ok(())
}

/// Hidden and cell state carried between LSTM steps.
#[derive(Debug, Clone)]
pub struct LstmState {
    pub hidden: Vec<f64>,
    pub cell: Vec<f64>,
}

impl LstmState {
    pub fn zeros(units: usize) -> Self {
        Self {
            hidden: vec![0.0; units],
            cell: vec![0.0; units],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    pub units: usize,
    pub input_dim: usize,
    pub activation: Activation,
    pub kernel: Vec<Vec<f64>>,
    pub recurrent: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl LstmLayer {
    /// Untrained layer: Glorot-uniform weights, zero bias with the forget
    /// gate bias set to 1.
    pub fn initialized<R: Rng>(
        rng: &mut R,
        input_dim: usize,
        units: usize,
        activation: Activation,
    ) -> Self {
        let mut bias = vec![0.0; 4 * units];
        bias[units..2 * units].fill(1.0);
        Self {
            units,
            input_dim,
            activation,
            kernel: glorot_uniform(rng, input_dim, 4 * units),
            recurrent: glorot_uniform(rng, units, 4 * units),
            bias,
        }
    }

    pub fn check_shapes(&self) -> Result<(), ModelError> {
        let gates = 4 * self.units;
        check_matrix("lstm kernel", &self.kernel, self.input_dim, gates)?;
        check_matrix("lstm recurrent kernel", &self.recurrent, self.units, gates)?;
        if self.bias.len() != gates {
            return Err(ModelError::Format(format!("lstm bias must have {gates} entries")));
        }
        Ok(())
    }

    /// Advance one timestep.
    pub fn step(&self, input: &[f64], state: &mut LstmState) {
        let u = self.units;
        let mut z = self.bias.clone();
        for (x, row) in input.iter().zip(&self.kernel) {
            for (zj, w) in z.iter_mut().zip(row) {
                *zj += x * w;
            }
        }
        for (h, row) in state.hidden.iter().zip(&self.recurrent) {
            for (zj, w) in z.iter_mut().zip(row) {
                *zj += h * w;
            }
        }

        for j in 0..u {
            let i = sigmoid(z[j]);
            let f = sigmoid(z[u + j]);
            let g = self.activation.apply(z[2 * u + j]);
            let o = sigmoid(z[3 * u + j]);
            state.cell[j] = f * state.cell[j] + i * g;
            state.hidden[j] = o * self.activation.apply(state.cell[j]);
        }
    }

    /// Run a whole sequence from a zero state, returning every hidden state.
    pub fn run<'a, I>(&self, inputs: I) -> Vec<Vec<f64>>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut state = LstmState::zeros(self.units);
        inputs
            .into_iter()
            .map(|x| {
                self.step(x, &mut state);
                state.hidden.clone()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub input_dim: usize,
    pub units: usize,
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    pub fn initialized<R: Rng>(rng: &mut R, input_dim: usize, units: usize) -> Self {
        Self {
            input_dim,
            units,
            kernel: glorot_uniform(rng, input_dim, units),
            bias: vec![0.0; units],
        }
    }

    pub fn check_shapes(&self) -> Result<(), ModelError> {
        check_matrix("dense kernel", &self.kernel, self.input_dim, self.units)?;
        if self.bias.len() != self.units {
            return Err(ModelError::Format(format!(
                "dense bias must have {} entries",
                self.units
            )));
        }
        Ok(())
    }

    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut out = self.bias.clone();
        for (x, row) in input.iter().zip(&self.kernel) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        out
    }
}
