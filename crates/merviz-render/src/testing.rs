//! Test doubles for the engine seam.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{ImageBuffer, Rgba};
use tokio::fs;

use crate::engine::{Engine, EngineInvocation, EngineOutput};
use crate::error::{Error, Result};

/// What a [`FakeEngine`] does when invoked.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Write the given bytes to the output path.
    WriteBytes(Vec<u8>),
    /// Write a solid PNG of the given dimensions.
    WritePng(u32, u32),
    /// Report a diagram error with the given detail.
    FailDiagram(String),
    /// Report a startup failure.
    FailStartup,
    /// Fail startup for the first `n` invocations, then write bytes.
    FlakyStartup(usize, Vec<u8>),
    /// Reject sources containing the marker with a diagram error,
    /// otherwise write the bytes.
    RejectMarker(String, Vec<u8>),
}

/// Scripted engine for orchestrator and batch tests.
pub struct FakeEngine {
    behavior: FakeBehavior,
    invocations: AtomicUsize,
}

impl FakeEngine {
    pub fn new(behavior: FakeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            invocations: AtomicUsize::new(0),
        })
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, Rgba([42u8, 84, 126, 255]));
    let mut bytes = Vec::new();
    buffer
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("encoding a test png cannot fail");
    bytes
}

#[async_trait]
impl Engine for FakeEngine {
    async fn invoke(
        &self,
        input: &Path,
        output: &Path,
        _invocation: &EngineInvocation,
    ) -> Result<EngineOutput> {
        let attempt = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            FakeBehavior::WriteBytes(bytes) => {
                fs::write(output, bytes).await?;
                Ok(EngineOutput::default())
            }
            FakeBehavior::WritePng(width, height) => {
                fs::write(output, encode_png(*width, *height)).await?;
                Ok(EngineOutput::default())
            }
            FakeBehavior::FailDiagram(detail) => Err(Error::EngineFailure {
                detail: detail.clone(),
            }),
            FakeBehavior::FailStartup => Err(Error::EngineStartup {
                command: "fake-engine".to_owned(),
                message: "unavailable".to_owned(),
            }),
            FakeBehavior::FlakyStartup(failures, bytes) => {
                if attempt <= *failures {
                    Err(Error::EngineStartup {
                        command: "fake-engine".to_owned(),
                        message: "unavailable".to_owned(),
                    })
                } else {
                    fs::write(output, bytes).await?;
                    Ok(EngineOutput::default())
                }
            }
            FakeBehavior::RejectMarker(marker, bytes) => {
                let source = fs::read_to_string(input).await?;
                if source.contains(marker) {
                    Err(Error::EngineFailure {
                        detail: format!("Parse error: unexpected token `{marker}`"),
                    })
                } else {
                    fs::write(output, bytes).await?;
                    Ok(EngineOutput::default())
                }
            }
        }
    }
}
