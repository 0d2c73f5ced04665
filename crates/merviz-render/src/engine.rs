//! Rendering engine invocation.
//!
//! The engine is an external collaborator: it accepts a staged diagram
//! source and produces a rendered document, or reports a failure. The
//! [`Engine`] trait is the seam between orchestration and the concrete
//! engine so the pipeline can be exercised without a real binary.
//!
//! The canonical implementation invokes the Mermaid CLI (`mmdc`) as a
//! subprocess; completion is detected by the process exit code, bounded by
//! a timeout. Each invocation is its own process, so no document state can
//! leak between calls.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use merviz_core::{DiagramTheme, EngineConfig, RenderFormat};
use tokio::process::Command;
use tokio::time::timeout;

use crate::TRACING_TARGET_ENGINE;
use crate::error::{Error, Result};
use crate::options::ResolvedOptions;

/// Visual options passed to one engine invocation.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    /// Output format.
    pub format: RenderFormat,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Background color.
    pub background_color: String,
    /// Diagram theme.
    pub theme: DiagramTheme,
    /// Supersampling factor for raster output.
    pub scale: f32,
}

impl From<&ResolvedOptions> for EngineInvocation {
    fn from(options: &ResolvedOptions) -> Self {
        Self {
            format: options.format,
            width: options.width,
            height: options.height,
            background_color: options.background_color.clone(),
            theme: options.theme,
            scale: options.scale,
        }
    }
}

/// Raw outcome of a completed engine invocation.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// Engine diagnostics (stderr), kept for logging.
    pub diagnostics: String,
}

/// Seam between orchestration and the external rendering engine.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Renders the staged input into the given output path.
    ///
    /// Implementations must not retry; retry policy belongs to callers.
    ///
    /// # Errors
    ///
    /// - [`Error::EngineStartup`] when the engine cannot be started,
    /// - [`Error::EngineTimeout`] when no completion signal arrives within
    ///   the bound,
    /// - [`Error::EngineFailure`] when the engine reports an error in the
    ///   diagram source, carrying the engine's message verbatim.
    async fn invoke(
        &self,
        input: &Path,
        output: &Path,
        invocation: &EngineInvocation,
    ) -> Result<EngineOutput>;
}

/// Mermaid CLI subprocess invoker.
#[derive(Debug, Clone)]
pub struct MermaidCli {
    command: String,
    timeout: Duration,
}

impl MermaidCli {
    /// Creates an invoker from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: config.timeout(),
        }
    }

    fn build_command(
        &self,
        input: &Path,
        output: &Path,
        invocation: &EngineInvocation,
    ) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg("-t")
            .arg(invocation.theme.as_ref())
            .arg("-b")
            .arg(&invocation.background_color);

        match invocation.format {
            RenderFormat::Png => {
                cmd.arg("-s")
                    .arg(invocation.scale.to_string())
                    .arg("-w")
                    .arg(invocation.width.to_string())
                    .arg("-H")
                    .arg(invocation.height.to_string());
            }
            RenderFormat::Pdf => {
                cmd.arg("--pdfFit");
            }
            RenderFormat::Svg => {}
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // a timed-out invocation is killed when its future is dropped
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Engine for MermaidCli {
    async fn invoke(
        &self,
        input: &Path,
        output: &Path,
        invocation: &EngineInvocation,
    ) -> Result<EngineOutput> {
        let mut cmd = self.build_command(input, output, invocation);

        tracing::debug!(
            target: TRACING_TARGET_ENGINE,
            command = %self.command,
            input = %input.display(),
            output = %output.display(),
            format = %invocation.format,
            "invoking rendering engine"
        );

        let child = cmd.spawn().map_err(|e| Error::EngineStartup {
            command: self.command.clone(),
            message: e.to_string(),
        })?;

        let completed = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::warn!(
                    target: TRACING_TARGET_ENGINE,
                    timeout = ?self.timeout,
                    "engine invocation timed out, killing process"
                );
                Error::EngineTimeout {
                    timeout: self.timeout,
                }
            })?
            .map_err(|e| Error::EngineStartup {
                command: self.command.clone(),
                message: e.to_string(),
            })?;

        let diagnostics = String::from_utf8_lossy(&completed.stderr).trim().to_owned();

        if !completed.status.success() {
            let detail = if diagnostics.is_empty() {
                format!(
                    "exited with status {}",
                    completed.status.code().unwrap_or(-1)
                )
            } else {
                diagnostics
            };
            return Err(Error::EngineFailure { detail });
        }

        tracing::debug!(
            target: TRACING_TARGET_ENGINE,
            "engine invocation completed"
        );

        Ok(EngineOutput { diagnostics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(format: RenderFormat) -> EngineInvocation {
        EngineInvocation {
            format,
            width: 1200,
            height: 800,
            background_color: "white".to_owned(),
            theme: DiagramTheme::Forest,
            scale: 2.0,
        }
    }

    #[test]
    fn test_raster_invocation_includes_viewport_args() {
        let cli = MermaidCli::new(&EngineConfig::default());
        let cmd = cli.build_command(
            Path::new("/tmp/in.mmd"),
            Path::new("/tmp/out.png"),
            &invocation(RenderFormat::Png),
        );
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.windows(2).any(|w| w == ["-s", "2"]));
        assert!(args.windows(2).any(|w| w == ["-w", "1200"]));
        assert!(args.windows(2).any(|w| w == ["-H", "800"]));
        assert!(args.windows(2).any(|w| w == ["-t", "forest"]));
    }

    #[test]
    fn test_vector_invocation_skips_viewport_args() {
        let cli = MermaidCli::new(&EngineConfig::default());
        let cmd = cli.build_command(
            Path::new("/tmp/in.mmd"),
            Path::new("/tmp/out.svg"),
            &invocation(RenderFormat::Svg),
        );
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(!args.contains(&"-w".to_owned()));
        assert!(!args.contains(&"-s".to_owned()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_startup_failure() {
        let cli = MermaidCli::new(&EngineConfig {
            command: "definitely-not-a-real-engine".to_owned(),
            timeout_secs: 5,
        });
        let err = cli
            .invoke(
                Path::new("/tmp/in.mmd"),
                Path::new("/tmp/out.png"),
                &invocation(RenderFormat::Png),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EngineStartup { .. }));
    }
}
