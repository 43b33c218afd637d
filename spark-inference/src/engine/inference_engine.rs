use anyhow::Result;
use log::info;
use ort::session::Session;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::str::FromStr;

pub struct OnnxSession {
    pub(crate) session: Session,
    pub(crate) executor: ExecutionProvider,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionProvider {
    CPU,
    CUDA(i32),
    TensorRT(i32),
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    /// Accepts `cpu`, `cuda`, `cuda:<id>`, `tensorrt` and `tensorrt:<id>`.
    fn from_str(s: &str) -> Result<Self> {
        let (name, device) = match s.split_once(':') {
            Some((name, device)) => (name, device.parse::<i32>()?),
            None => (s, 0),
        };

        match name.to_ascii_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::CPU),
            "cuda" => Ok(ExecutionProvider::CUDA(device)),
            "tensorrt" | "trt" => Ok(ExecutionProvider::TensorRT(device)),
            other => anyhow::bail!("Unknown execution provider: {}", other),
        }
    }
}

impl Deref for OnnxSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for OnnxSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl OnnxSession {
    pub fn new(
        url: impl AsRef<Path>,
        executor: ExecutionProvider,
        intra_threads: usize,
    ) -> Result<Self> {
        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .with_execution_providers([match executor {
                ExecutionProvider::CUDA(id) => {
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()
                }
                ExecutionProvider::TensorRT(id) => {
                    ort::execution_providers::TensorRTExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()
                }
                ExecutionProvider::CPU => ort::execution_providers::CPUExecutionProvider::default()
                    .build()
                    .error_on_failure(),
            }])?
            .commit_from_file(url.as_ref())?;
        info!(
            "Loaded {} on {:?} with {} intra-op threads",
            url.as_ref().display(),
            executor,
            intra_threads
        );

        Ok(OnnxSession { session, executor })
    }

    pub fn executor(&self) -> ExecutionProvider {
        self.executor
    }
}
