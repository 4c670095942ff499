//! Fake renderers shared by the integration tests.
//!
//! None of them start a browser. They read the argument vector the same way
//! the real capture tool does: the input URI and output path are the last
//! two arguments.

#![allow(dead_code)]

use async_trait::async_trait;
use deck2pdf::{ConvertError, RendererInvoker, RendererOutput, ServiceConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Minimal bytes that pass the `%PDF` magic check.
pub const FIXTURE_PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n";

/// Config whose working areas live under `root`, so tests can see them.
pub fn config_in(root: &Path) -> ServiceConfig {
    ServiceConfig::builder()
        .work_root(root)
        .build()
        .expect("valid test config")
}

/// Number of entries directly under `dir`.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("readable dir").count()
}

fn input_and_output(args: &[String]) -> (PathBuf, PathBuf) {
    let n = args.len();
    let input = url::Url::parse(&args[n - 2])
        .expect("input is a URI")
        .to_file_path()
        .expect("input is a file URI");
    (input, PathBuf::from(&args[n - 1]))
}

/// Copies [`FIXTURE_PDF`] to the output path and records what it saw.
#[derive(Default)]
pub struct FixtureRenderer {
    pub calls: AtomicUsize,
    pub dirs: Mutex<Vec<PathBuf>>,
    pub args: Mutex<Vec<Vec<String>>>,
    pub html: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
}

impl FixtureRenderer {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }

    pub fn last_args(&self) -> Vec<String> {
        self.args.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl RendererInvoker for FixtureRenderer {
    async fn invoke(&self, args: &[String]) -> Result<RendererOutput, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (input, output) = input_and_output(args);
        self.dirs
            .lock()
            .unwrap()
            .push(input.parent().unwrap().to_path_buf());
        self.args.lock().unwrap().push(args.to_vec());
        let html = tokio::fs::read_to_string(&input).await.unwrap();
        self.html.lock().unwrap().push(html);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        tokio::fs::write(&output, FIXTURE_PDF).await.unwrap();
        Ok(RendererOutput {
            exit_code: Some(0),
            stdout: "Printed 1 slides\n".into(),
            stderr: String::new(),
        })
    }
}

/// Exits with a fixed code and diagnostics, writing nothing.
pub struct FailingRenderer {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub dirs: Mutex<Vec<PathBuf>>,
}

impl FailingRenderer {
    pub fn new(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            dirs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RendererInvoker for FailingRenderer {
    async fn invoke(&self, args: &[String]) -> Result<RendererOutput, ConvertError> {
        let (input, _) = input_and_output(args);
        self.dirs
            .lock()
            .unwrap()
            .push(input.parent().unwrap().to_path_buf());
        Ok(RendererOutput {
            exit_code: self.exit_code,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }
}

/// Exits 0 after writing `contents` (or nothing) to the output path.
pub struct SilentRenderer {
    pub contents: Option<Vec<u8>>,
}

#[async_trait]
impl RendererInvoker for SilentRenderer {
    async fn invoke(&self, args: &[String]) -> Result<RendererOutput, ConvertError> {
        let (_, output) = input_and_output(args);
        if let Some(contents) = &self.contents {
            tokio::fs::write(&output, contents).await.unwrap();
        }
        Ok(RendererOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Write an executable `/bin/sh` script standing in for the capture tool.
#[cfg(unix)]
pub fn shell_renderer(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
