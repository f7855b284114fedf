//! Avaverse - VRM avatar retargeting for holistic tracking
//!
//! Takes face, body and hand landmarks from a tracker process, maps the
//! solved rotations onto a VRM humanoid skeleton every frame, and streams the
//! resulting pose to a browser viewer that draws the avatar over the video.

pub mod avatar;
pub mod config;
pub mod error;
pub mod output;
pub mod retarget;
pub mod rig;
pub mod session;
pub mod solver;
pub mod tracking;

pub use config::Config;
pub use error::{AvaverseError, Result};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};

use output::PoseSnapshot;
use session::AvatarStatus;

/// Application state shared across all components
#[derive(Debug)]
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// Most recently rendered pose
    snapshot: RwLock<Arc<PoseSnapshot>>,
    /// Channel for pose updates
    snapshot_tx: broadcast::Sender<Arc<PoseSnapshot>>,
    /// Shutdown signal
    shutdown_tx: broadcast::Sender<()>,
    /// Avatar loading state
    avatar_status: watch::Sender<AvatarStatus>,
    frames_rendered: AtomicU64,
}

impl AppState {
    /// Create a new application state with the given configuration
    pub fn new(config: Config) -> Arc<Self> {
        let (snapshot_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);
        let (avatar_status, _) = watch::channel(AvatarStatus::Loading);

        Arc::new(Self {
            config: RwLock::new(config),
            snapshot: RwLock::new(Arc::new(PoseSnapshot::default())),
            snapshot_tx,
            shutdown_tx,
            avatar_status,
            frames_rendered: AtomicU64::new(0),
        })
    }

    /// Store a new snapshot and broadcast it
    pub async fn publish_snapshot(&self, snapshot: PoseSnapshot) {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write().await = Arc::clone(&snapshot);
        self.frames_rendered.fetch_add(1, Ordering::Relaxed);
        let _ = self.snapshot_tx.send(snapshot);
    }

    pub async fn latest_snapshot(&self) -> Arc<PoseSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Subscribe to pose snapshots
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<Arc<PoseSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }

    pub fn set_avatar_status(&self, status: AvatarStatus) {
        self.avatar_status.send_replace(status);
    }

    pub fn avatar_status(&self) -> AvatarStatus {
        self.avatar_status.borrow().clone()
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
