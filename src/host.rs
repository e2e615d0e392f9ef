//! The privileged side: owns the pending file and serves file reads.

use crate::ipc::{LOAD_FILE, READ_FILE_CONTENT, ReadFileRequest, ReadFileResponse};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("{source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A model path waiting for the display to become ready.
#[derive(Debug, Default)]
pub struct PendingFile(Option<PathBuf>);

impl PendingFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self(path)
    }

    /// Buffers `path`, replacing anything already pending.
    pub fn queue(&mut self, path: PathBuf) {
        if let Some(old) = self.0.replace(path) {
            debug!("Replacing pending file {:?}", old);
        }
    }

    pub fn take(&mut self) -> Option<PathBuf> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

pub struct Host {
    pending: PendingFile,
    display_ready: bool,
    load_file: mpsc::UnboundedSender<PathBuf>,
}

impl Host {
    pub fn new(startup_file: Option<PathBuf>, load_file: mpsc::UnboundedSender<PathBuf>) -> Self {
        Host {
            pending: PendingFile::new(startup_file),
            display_ready: false,
            load_file,
        }
    }

    /// Handles an open-file request from the OS.
    pub fn open_file(&mut self, path: PathBuf) {
        if self.display_ready {
            info!("Display ready, sending {:?} right away", &path);
            self.send_load_file(path);
        } else {
            debug!("Display not ready, queueing {:?}", &path);
            self.pending.queue(path);
        }
    }

    /// Marks the display ready and hands over the pending file, if any.
    ///
    /// Returns whether a file was delivered.
    pub fn display_ready(&mut self) -> bool {
        self.display_ready = true;

        match self.pending.take() {
            Some(path) => {
                info!("Sending file to load to display: {:?}", &path);
                self.send_load_file(path)
            }
            None => false,
        }
    }

    fn send_load_file(&self, path: PathBuf) -> bool {
        match self.load_file.send(path) {
            Ok(()) => true,
            Err(err) => {
                warn!(channel = LOAD_FILE, "Display is gone, dropping {:?}", err.0);
                false
            }
        }
    }
}

/// Reads `path` for the display, reporting any failure in the response.
pub async fn read_file_content(path: &Path) -> ReadFileResponse {
    debug!(channel = READ_FILE_CONTENT, "Request for {:?}", path);

    let result = read_file(path).await;
    match &result {
        Ok(data) => info!("Read {:?} ({} bytes)", path, data.len()),
        Err(err) => error!("Error reading {:?}: {}", path, err),
    }
    result.into()
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ReadError> {
    let io_err = |source: io::Error| ReadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ReadError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(io_err(err)),
    };

    if !metadata.is_file() {
        return Err(ReadError::NotAFile(path.to_path_buf()));
    }

    debug!("Reading {:?} ({} bytes)", path, metadata.len());
    tokio::fs::read(path).await.map_err(io_err)
}

/// Answers `read-file-content` requests until every bridge is dropped.
pub async fn serve(mut requests: mpsc::Receiver<ReadFileRequest>) {
    while let Some(ReadFileRequest { path, reply }) = requests.recv().await {
        if cfg!(feature = "load-off-thread") {
            tokio::spawn(async move {
                let response = read_file_content(&path).await;
                if reply.send(response).is_err() {
                    debug!(channel = READ_FILE_CONTENT, "Requester went away");
                }
            });
        } else {
            let response = read_file_content(&path).await;
            if reply.send(response).is_err() {
                debug!(channel = READ_FILE_CONTENT, "Requester went away");
            }
        }
    }

    debug!("Request lane closed, host stops serving");
}
