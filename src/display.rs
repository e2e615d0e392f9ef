//! The display side: turns `load-file` announcements into loaded models.

use crate::bridge::Bridge;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use winit::event_loop::EventLoopProxy;

const GLB_MAGIC: &[u8] = b"glTF";
const DRACO_MAGIC: &[u8] = b"DRACO";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Draco,
    Glb,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("drc") {
            Some(Self::Draco)
        } else if ext.eq_ignore_ascii_case("glb") {
            Some(Self::Glb)
        } else {
            None
        }
    }

    /// Recognizes a model from its leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(GLB_MAGIC) {
            Some(Self::Glb)
        } else if bytes.starts_with(DRACO_MAGIC) {
            Some(Self::Draco)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Draco => "Draco",
            Self::Glb => "GLB",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw model bytes ready to be handed to a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    pub path: PathBuf,
    pub format: ModelFormat,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{0}")]
    Read(String),

    #[error("Unrecognized model format: {}", .0.display())]
    UnrecognizedFormat(PathBuf),
}

/// What the display reports back to the window.
#[derive(Debug)]
pub enum ViewerEvent {
    ModelLoaded(LoadedModel),
    LoadFailed { path: PathBuf, error: String },
}

/// Somewhere the display can post its results.
pub trait DisplaySink {
    /// Returns false once nobody is listening anymore.
    fn post(&self, event: ViewerEvent) -> bool;
}

impl DisplaySink for EventLoopProxy<ViewerEvent> {
    fn post(&self, event: ViewerEvent) -> bool {
        self.send_event(event).is_ok()
    }
}

impl DisplaySink for mpsc::UnboundedSender<ViewerEvent> {
    fn post(&self, event: ViewerEvent) -> bool {
        self.send(event).is_ok()
    }
}

/// Fetches `path` through the bridge and checks it looks like a model.
pub async fn load_model(bridge: &Bridge, path: PathBuf) -> Result<LoadedModel, LoadError> {
    let data = bridge
        .read_file_content(path.clone())
        .await
        .into_result()
        .map_err(LoadError::Read)?;

    let format = ModelFormat::sniff(&data)
        .ok_or_else(|| LoadError::UnrecognizedFormat(path.clone()))?;

    if let Some(expected) = ModelFormat::from_path(&path) {
        if expected != format {
            warn!("{:?} has a {} extension but {} contents", &path, expected, format);
        }
    }

    Ok(LoadedModel { path, format, data })
}

/// Loads every announced file until the host or the sink goes away.
pub async fn run(mut bridge: Bridge, sink: impl DisplaySink) {
    while let Some(path) = bridge.next_load_file().await {
        let event = match load_model(&bridge, path.clone()).await {
            Ok(model) => {
                info!(
                    "Loaded {} model {:?} ({} bytes)",
                    model.format,
                    &model.path,
                    model.data.len()
                );
                ViewerEvent::ModelLoaded(model)
            }
            Err(err) => {
                error!("Error loading {:?}: {}", &path, err);
                ViewerEvent::LoadFailed {
                    path,
                    error: err.to_string(),
                }
            }
        };

        if !sink.post(event) {
            debug!("Window is gone, display stops");
            break;
        }
    }

    bridge.remove_all_load_file_listeners();
}
