//! Sentence embeddings from an ONNX sentence-transformers model.
//!
//! The model directory holds `model.onnx` and `tokenizer.json`
//! (all-MiniLM-L6-v2 gives 384 dimensions). Output is mean-pooled over the
//! attention mask and L2-normalised, so dot product equals cosine similarity.

use std::path::Path;

use ort::session::Session;
use ort::value::{Tensor, ValueType};
use tokenizers::{Encoding, PaddingParams, Tokenizer, TruncationParams};
use tracing::info;

const DEFAULT_DIM: usize = 384;
const MAX_TOKENS: usize = 256;

pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

/// Row-major `[batch, seq_len]` model inputs.
struct BatchInputs {
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

impl BatchInputs {
    fn from_encodings(encodings: &[Encoding]) -> Self {
        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let cells = encodings.len() * seq_len;
        let mut inputs = Self {
            seq_len,
            input_ids: vec![0; cells],
            attention_mask: vec![0; cells],
            token_type_ids: vec![0; cells],
        };
        for (row, enc) in encodings.iter().enumerate() {
            let base = row * seq_len;
            let fill = |dst: &mut [i64], src: &[u32]| {
                for (slot, &v) in dst[base..].iter_mut().zip(src) {
                    *slot = i64::from(v);
                }
            };
            fill(&mut inputs.input_ids, enc.get_ids());
            fill(&mut inputs.attention_mask, enc.get_attention_mask());
            fill(&mut inputs.token_type_ids, enc.get_type_ids());
        }
        inputs
    }
}

impl Embedder {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(tokenizer_path.exists(), "tokenizer.json not found in {model_dir:?}");

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = output_dim(session.outputs()[0].dtype()).unwrap_or(DEFAULT_DIM);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// One unit-length vector per input text.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let inputs = BatchInputs::from_encodings(&encodings);
        let shape = [batch as i64, inputs.seq_len as i64];

        let outputs = self.session.run(ort::inputs![
            "input_ids" => Tensor::from_array((shape, inputs.input_ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, inputs.attention_mask.clone().into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, inputs.token_type_ids.into_boxed_slice()))?,
        ])?;

        let (out_shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = out_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch && dims[2] as usize == self.dim,
            "unexpected output shape {dims:?}, expected [{batch}, _, {}]",
            self.dim
        );
        let out_seq = dims[1] as usize;

        Ok((0..batch)
            .map(|row| {
                let mask = &inputs.attention_mask[row * inputs.seq_len..][..out_seq.min(inputs.seq_len)];
                let states = &hidden[row * out_seq * self.dim..][..out_seq * self.dim];
                mean_pool(states, mask, self.dim)
            })
            .collect())
    }
}

/// Average the token states the mask selects, then L2-normalise.
fn mean_pool(states: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut tokens = 0.0f32;
    for (token, &m) in states.chunks_exact(dim).zip(mask) {
        if m > 0 {
            let w = m as f32;
            for (p, &s) in pooled.iter_mut().zip(token) {
                *p += s * w;
            }
            tokens += w;
        }
    }
    if tokens > 0.0 {
        pooled.iter_mut().for_each(|p| *p /= tokens);
    }
    l2_normalize(&mut pooled);
    pooled
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

fn output_dim(output: &ValueType) -> Option<usize> {
    match output {
        ValueType::Tensor { shape, .. } => shape.last().and_then(|&d| (d > 0).then_some(d as usize)),
        _ => None,
    }
}
