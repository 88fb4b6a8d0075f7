//! Ways of reaching a native host.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader, DuplexStream};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vaultbridge_config::NativeConfig;
use vaultbridge_protocols::{BridgeError, BridgeResult};

pub type BoxedReader = Pin<Box<dyn AsyncRead + Send>>;
pub type BoxedWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Byte streams of one host connection.
pub struct NativeStream {
    /// Host to bridge.
    pub reader: BoxedReader,
    /// Bridge to host.
    pub writer: BoxedWriter,
    /// Host process, when the connector spawned one.
    pub child: Option<Child>,
}

impl NativeStream {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + 'static,
        W: AsyncWrite + Send + 'static,
    {
        Self {
            reader: Box::pin(reader),
            writer: Box::pin(writer),
            child: None,
        }
    }
}

/// Opens connections to the native host.
#[async_trait]
pub trait NativeConnector: Send + Sync {
    /// Open a fresh connection.
    async fn connect(&self) -> BridgeResult<NativeStream>;

    /// Name used in logs.
    fn describe(&self) -> String;
}

/// Native-messaging host manifest, as registered with the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct HostManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub path: PathBuf,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl HostManifest {
    /// Read `<dir>/<host_name>.json`.
    pub fn load(dir: &Path, host_name: &str) -> BridgeResult<Self> {
        let path = dir.join(format!("{}.json", host_name));
        let content = std::fs::read_to_string(&path).map_err(|e| {
            BridgeError::HostNotFound(format!("{}: {}", path.display(), e))
        })?;
        let manifest: HostManifest = serde_json::from_str(&content)
            .map_err(|e| BridgeError::Protocol(format!("invalid manifest {}: {}", path.display(), e)))?;
        if manifest.name != host_name {
            warn!(
                "Manifest {} declares name '{}', expected '{}'",
                path.display(),
                manifest.name,
                host_name
            );
        }
        Ok(manifest)
    }

    /// Executable path; relative paths are resolved against the manifest
    /// directory.
    pub fn executable(&self, manifest_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            manifest_dir.join(&self.path)
        }
    }
}

/// Spawns the host executable and talks to it over stdio.
pub struct ProcessConnector {
    host_name: String,
    host_path: Option<PathBuf>,
    manifest_dir: Option<PathBuf>,
    args: Vec<String>,
}

impl ProcessConnector {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            host_path: None,
            manifest_dir: None,
            args: Vec::new(),
        }
    }

    pub fn from_config(config: &NativeConfig) -> Self {
        Self {
            host_name: config.host_name.clone(),
            host_path: config.host_path.clone(),
            manifest_dir: config.resolved_manifest_dir(),
            args: config.host_args.clone(),
        }
    }

    pub fn with_host_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.host_path = Some(path.into());
        self
    }

    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = Some(dir.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Locate the host executable.
    pub fn resolve_executable(&self) -> BridgeResult<PathBuf> {
        if let Some(ref path) = self.host_path {
            return Ok(path.clone());
        }

        let dir = self.manifest_dir.as_deref().ok_or_else(|| {
            BridgeError::HostNotFound(format!("no manifest directory for {}", self.host_name))
        })?;
        let manifest = HostManifest::load(dir, &self.host_name)?;
        Ok(manifest.executable(dir))
    }
}

#[async_trait]
impl NativeConnector for ProcessConnector {
    async fn connect(&self) -> BridgeResult<NativeStream> {
        let executable = self.resolve_executable()?;
        if !executable.exists() {
            return Err(BridgeError::HostNotFound(executable.display().to_string()));
        }

        info!("Starting native host {:?}", executable);

        let mut child = Command::new(&executable)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Protocol("Failed to capture host stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::Protocol("Failed to capture host stdout".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let host_name = self.host_name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[{}] {}", host_name, line);
                }
            });
        }

        let mut stream = NativeStream::new(stdout, stdin);
        stream.child = Some(child);
        Ok(stream)
    }

    fn describe(&self) -> String {
        self.host_name.clone()
    }
}

/// In-process connector: each connect opens a duplex pipe and hands the host
/// end to whoever holds the receiver.
pub struct DuplexConnector {
    hosts: mpsc::UnboundedSender<DuplexStream>,
    refuse: AtomicBool,
    connects: AtomicUsize,
    buffer: usize,
}

impl DuplexConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DuplexStream>) {
        let (hosts, rx) = mpsc::unbounded_channel();
        let connector = Self {
            hosts,
            refuse: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            buffer: 64 * 1024,
        };
        (connector, rx)
    }

    /// Make subsequent connects fail as if the host could not start.
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of successful connects so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NativeConnector for DuplexConnector {
    async fn connect(&self) -> BridgeResult<NativeStream> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(BridgeError::ChannelUnavailable);
        }

        let (client, host) = tokio::io::duplex(self.buffer);
        self.hosts
            .send(host)
            .map_err(|_| BridgeError::ChannelUnavailable)?;
        self.connects.fetch_add(1, Ordering::SeqCst);
        debug!("Opened in-process host connection");

        let (reader, writer) = tokio::io::split(client);
        Ok(NativeStream::new(reader, writer))
    }

    fn describe(&self) -> String {
        "in-process".to_string()
    }
}
