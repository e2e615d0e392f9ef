//! The restricted surface the display gets to talk to the host.

use crate::ipc::{LOAD_FILE, READ_FILE_CONTENT, ReadFileRequest, ReadFileResponse};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// Default depth of the `read-file-content` request lane.
pub const DEFAULT_REQUEST_CAPACITY: usize = 16;

/// Host half of the bridge.
#[derive(Debug)]
pub struct HostEnd {
    pub load_file: mpsc::UnboundedSender<PathBuf>,
    pub requests: mpsc::Receiver<ReadFileRequest>,
}

/// Display half of the bridge.
///
/// This is everything the display may do: listen for `load-file`, ask for a
/// file's bytes, and stop listening.
#[derive(Debug)]
pub struct Bridge {
    load_file: Option<mpsc::UnboundedReceiver<PathBuf>>,
    requests: mpsc::Sender<ReadFileRequest>,
}

/// Creates a connected host/display pair.
pub fn channel(capacity: usize) -> (HostEnd, Bridge) {
    let (load_tx, load_rx) = mpsc::unbounded_channel();
    let (request_tx, request_rx) = mpsc::channel(capacity.max(1));

    (
        HostEnd {
            load_file: load_tx,
            requests: request_rx,
        },
        Bridge {
            load_file: Some(load_rx),
            requests: request_tx,
        },
    )
}

impl Bridge {
    /// Waits for the next `load-file` message.
    ///
    /// Returns `None` once the host is gone or listeners were removed.
    pub async fn next_load_file(&mut self) -> Option<PathBuf> {
        let path = self.load_file.as_mut()?.recv().await?;
        debug!(channel = LOAD_FILE, "Display received {:?}", &path);
        Some(path)
    }

    /// Asks the host for the contents of `path`.
    pub async fn read_file_content(&self, path: impl Into<PathBuf>) -> ReadFileResponse {
        let path = path.into();
        let (reply, response) = oneshot::channel();

        if self
            .requests
            .send(ReadFileRequest {
                path: path.clone(),
                reply,
            })
            .await
            .is_err()
        {
            warn!(channel = READ_FILE_CONTENT, "Host is gone, dropping request for {:?}", &path);
            return ReadFileResponse::failure("Host is not serving file requests");
        }

        response.await.unwrap_or_else(|_| {
            ReadFileResponse::failure(format!("Host dropped the request for {}", path.display()))
        })
    }

    /// Stops listening for `load-file` messages.
    pub fn remove_all_load_file_listeners(&mut self) {
        if let Some(mut rx) = self.load_file.take() {
            rx.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_load_file_in_order() {
        let (host, mut bridge) = channel(DEFAULT_REQUEST_CAPACITY);
        host.load_file.send(PathBuf::from("/a.drc")).unwrap();
        host.load_file.send(PathBuf::from("/b.glb")).unwrap();
        drop(host);

        assert_eq!(bridge.next_load_file().await, Some(PathBuf::from("/a.drc")));
        assert_eq!(bridge.next_load_file().await, Some(PathBuf::from("/b.glb")));
        assert_eq!(bridge.next_load_file().await, None);
    }

    #[tokio::test]
    async fn removed_listeners_see_nothing() {
        let (host, mut bridge) = channel(DEFAULT_REQUEST_CAPACITY);
        bridge.remove_all_load_file_listeners();

        assert!(host.load_file.send(PathBuf::from("/a.drc")).is_err());
        assert_eq!(bridge.next_load_file().await, None);
    }

    #[tokio::test]
    async fn request_round_trips_through_host_end() {
        let (mut host, bridge) = channel(DEFAULT_REQUEST_CAPACITY);

        let server = tokio::spawn(async move {
            let request = host.requests.recv().await.unwrap();
            assert_eq!(request.path, PathBuf::from("/model.glb"));
            request
                .reply
                .send(ReadFileResponse::Success { data: vec![9; 4] })
                .unwrap();
        });

        let response = bridge.read_file_content("/model.glb").await;
        assert_eq!(response, ReadFileResponse::Success { data: vec![9; 4] });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn stopped_host_yields_failure() {
        let (host, bridge) = channel(DEFAULT_REQUEST_CAPACITY);
        drop(host);

        match bridge.read_file_content("/model.drc").await {
            ReadFileResponse::Failure { error } => assert!(!error.is_empty()),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_reply_yields_failure() {
        let (mut host, bridge) = channel(DEFAULT_REQUEST_CAPACITY);

        let server = tokio::spawn(async move {
            let request = host.requests.recv().await.unwrap();
            drop(request);
        });

        let response = bridge.read_file_content("/model.drc").await;
        assert!(!response.is_success());
        server.await.unwrap();
    }
}
