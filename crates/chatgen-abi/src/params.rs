// Engine lifecycle parameters + environment overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_N_CTX: u32 = 4096;
pub const DEFAULT_N_BATCH: u32 = 512;

/// What an [`crate::EngineLoader`] needs to bring an engine up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadParams {
    pub model_path: PathBuf,
    /// Context capacity in tokens (prompt + generated).
    pub n_ctx: u32,
    /// Hard per-call ceiling on tokens in one decode batch.
    pub n_batch: u32,
    /// 0 means "use every logical core".
    pub n_threads: u32,
    /// Layers offloaded to an accelerator; 0 keeps everything on the CPU.
    pub n_gpu_layers: u32,
}

impl LoadParams {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            n_ctx: DEFAULT_N_CTX,
            n_batch: DEFAULT_N_BATCH,
            n_threads: 0,
            n_gpu_layers: 0,
        }
    }

    /// Defaults, then `CHATGEN_N_CTX` / `CHATGEN_N_BATCH` / `CHATGEN_N_THREADS` /
    /// `CHATGEN_N_GPU_LAYERS` where set and parseable.
    pub fn from_env<P: Into<PathBuf>>(model_path: P) -> Self {
        let mut p = Self::new(model_path);
        p.n_ctx = env_u32("CHATGEN_N_CTX").unwrap_or(p.n_ctx);
        p.n_batch = env_u32("CHATGEN_N_BATCH").unwrap_or(p.n_batch);
        p.n_threads = env_u32("CHATGEN_N_THREADS").unwrap_or(p.n_threads);
        p.n_gpu_layers = env_u32("CHATGEN_N_GPU_LAYERS").unwrap_or(p.n_gpu_layers);
        p
    }

    /// Thread count to hand the engine, resolving 0 to the machine's core count.
    pub fn effective_threads(&self) -> u32 {
        if self.n_threads == 0 {
            num_cpus::get().max(1) as u32
        } else {
            self.n_threads
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
