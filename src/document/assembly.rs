// src/document/assembly.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::app_log;
use crate::document::{html, typst};
use crate::error::AssemblyError;
use crate::types::cv_data::AggregatedCvData;
use crate::utils::{document_file_name, write_file_safe};

/// Turns an aggregate into a printable binary document.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, data: &AggregatedCvData) -> Result<Vec<u8>, AssemblyError>;

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

/// Compiles the generated Typst source with the `typst` binary in a
/// per-request scratch directory.
pub struct TypstRenderer {
    typst_bin: PathBuf,
    workspace_root: PathBuf,
}

impl TypstRenderer {
    pub fn new(typst_bin: impl Into<PathBuf>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            typst_bin: typst_bin.into(),
            workspace_root: workspace_root.into(),
        }
    }

    async fn compile(
        &self,
        workspace: &Path,
        data: &AggregatedCvData,
    ) -> Result<Vec<u8>, AssemblyError> {
        let source_path = workspace.join("main.typ");
        let output_path = workspace.join("cv.pdf");

        write_file_safe(&source_path, typst::render_source(data).as_bytes())
            .await
            .map_err(|e| AssemblyError::Render(e.to_string()))?;

        let output = Command::new(&self.typst_bin)
            .arg("compile")
            .arg(&source_path)
            .arg(&output_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AssemblyError::Render(format!(
                    "Failed to execute {}: {}",
                    self.typst_bin.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(AssemblyError::Render(format!(
                "Typst compilation failed: stderr={}, stdout={}",
                stderr.trim(),
                stdout.trim()
            )));
        }

        Ok(tokio::fs::read(&output_path).await?)
    }
}

/// Removes the scratch directory however the render ends, including when
/// the render future is dropped on cancellation.
struct ScratchWorkspace(PathBuf);

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.0) {
            app_log!(warn, "Failed to clean up {}: {}", self.0.display(), e);
        }
    }
}

#[async_trait]
impl DocumentRenderer for TypstRenderer {
    async fn render(&self, data: &AggregatedCvData) -> Result<Vec<u8>, AssemblyError> {
        let workspace = ScratchWorkspace(
            self.workspace_root
                .join(format!("cv_{}", uuid::Uuid::new_v4().simple())),
        );
        tokio::fs::create_dir_all(&workspace.0).await?;

        self.compile(&workspace.0, data).await
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub html: String,
    pub base64: String,
    pub file_name: String,
    pub size_bytes: usize,
}

/// Clears the in-progress marker on every exit path.
struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DocumentAssembly {
    renderer: Arc<dyn DocumentRenderer>,
    in_progress: AtomicBool,
}

impl DocumentAssembly {
    pub fn new(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            renderer,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn preview_html(&self, data: &AggregatedCvData) -> String {
        html::render_preview(data)
    }

    /// Renders the preview and the binary document. The render is dropped
    /// as soon as `cancel` fires.
    pub async fn generate(
        &self,
        data: &AggregatedCvData,
        cancel: &CancellationToken,
    ) -> Result<GeneratedDocument, AssemblyError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AssemblyError::Busy);
        }
        let _guard = InProgress(&self.in_progress);

        if cancel.is_cancelled() {
            return Err(AssemblyError::Cancelled);
        }

        let html = html::render_preview(data);

        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                app_log!(info, "Document rendering cancelled");
                return Err(AssemblyError::Cancelled);
            }
            res = self.renderer.render(data) => res?,
        };

        let file_name = document_file_name(data.full_name().as_deref(), self.renderer.extension());
        app_log!(
            info,
            "Generated document {} ({} bytes)",
            file_name,
            bytes.len()
        );

        Ok(GeneratedDocument {
            html,
            base64: STANDARD.encode(&bytes),
            file_name,
            size_bytes: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cv_data::SectionValue;
    use crate::types::section::SectionKey;
    use serde_json::json;
    use std::time::Duration;

    struct FixedRenderer(Vec<u8>);

    #[async_trait]
    impl DocumentRenderer for FixedRenderer {
        async fn render(&self, _data: &AggregatedCvData) -> Result<Vec<u8>, AssemblyError> {
            Ok(self.0.clone())
        }
    }

    struct SlowRenderer;

    #[async_trait]
    impl DocumentRenderer for SlowRenderer {
        async fn render(&self, _data: &AggregatedCvData) -> Result<Vec<u8>, AssemblyError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(b"late".to_vec())
        }
    }

    fn data() -> AggregatedCvData {
        let mut data = AggregatedCvData::new();
        data.set(
            SectionKey::PersonalInformation,
            SectionValue::Single(
                json!({ "First Name": "Jane", "Last Name": "Doe" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        );
        data
    }

    #[tokio::test]
    async fn test_generate_encodes_base64_and_names_file() {
        let assembly = DocumentAssembly::new(Arc::new(FixedRenderer(b"%PDF-1.7".to_vec())));
        let doc = assembly
            .generate(&data(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(doc.base64, "JVBERi0xLjc=");
        assert_eq!(doc.size_bytes, 8);
        assert!(doc.file_name.starts_with("Jane_Doe_CV_"));
        assert!(doc.file_name.ends_with(".pdf"));
        assert!(doc.html.contains("Jane Doe"));
        assert!(!assembly.is_generating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_render() {
        let assembly = Arc::new(DocumentAssembly::new(Arc::new(SlowRenderer)));
        let token = CancellationToken::new();

        let task = {
            let assembly = assembly.clone();
            let token = token.clone();
            tokio::spawn(async move { assembly.generate(&data(), &token).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(assembly.is_generating());

        token.cancel();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(AssemblyError::Cancelled)));
        assert!(!assembly.is_generating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_generation_is_busy() {
        let assembly = Arc::new(DocumentAssembly::new(Arc::new(SlowRenderer)));
        let token = CancellationToken::new();

        let first = {
            let assembly = assembly.clone();
            let token = token.clone();
            tokio::spawn(async move { assembly.generate(&data(), &token).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = assembly.generate(&data(), &CancellationToken::new()).await;
        assert!(matches!(second, Err(AssemblyError::Busy)));

        token.cancel();
        let _ = first.await.unwrap();
    }

    #[tokio::test]
    async fn test_typst_renderer_reports_missing_binary() {
        let scratch = tempfile::tempdir().unwrap();
        let renderer = TypstRenderer::new("/nonexistent/typst-bin", scratch.path());

        let err = renderer.render(&data()).await.unwrap_err();
        assert!(matches!(err, AssemblyError::Render(_)));
        // scratch workspace removed even on failure
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_compile_removes_scratch_workspace() {
        use std::os::unix::fs::PermissionsExt;

        let bin_dir = tempfile::tempdir().unwrap();
        let fake_typst = bin_dir.path().join("typst");
        std::fs::write(&fake_typst, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&fake_typst, std::fs::Permissions::from_mode(0o755)).unwrap();

        let scratch = tempfile::tempdir().unwrap();
        let assembly = Arc::new(DocumentAssembly::new(Arc::new(TypstRenderer::new(
            &fake_typst,
            scratch.path(),
        ))));
        let token = CancellationToken::new();
        let task = {
            let assembly = assembly.clone();
            let token = token.clone();
            tokio::spawn(async move { assembly.generate(&data(), &token).await })
        };

        for _ in 0..100 {
            if std::fs::read_dir(scratch.path()).unwrap().count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 1);
        tokio::time::sleep(Duration::from_millis(300)).await;

        token.cancel();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(AssemblyError::Cancelled)));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
