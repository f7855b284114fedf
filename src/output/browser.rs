//! Browser viewer HTTP server and the renderer that feeds it
//!
//! The page loads the VRM model with three-vrm, then applies every `pose`
//! event from `/avatar/stream` over the passthrough video frame.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{sse, PoseSnapshot, RenderFrame, Renderer};
use crate::config::{Config, HttpConfig};
use crate::error::AvaverseError;
use crate::session::AvatarStatus;
use crate::AppState;

/// Camera, light and model placement for the viewer page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    /// Yaw applied to the model root (radians)
    pub scene_yaw: f32,
    pub camera_fov: f32,
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    pub light_direction: [f32; 3],
}

impl SceneSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scene_yaw: config.avatar.scene_yaw,
            camera_fov: config.render.camera_fov,
            camera_position: config.render.camera_position,
            camera_target: config.render.camera_target,
            light_direction: config.render.light_direction,
        }
    }
}

/// Publishes a `PoseSnapshot` per frame into the shared app state.
pub struct BrowserRenderer {
    app_state: Arc<AppState>,
    sequence: u64,
}

impl BrowserRenderer {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self {
            app_state,
            sequence: 0,
        }
    }
}

impl Renderer for BrowserRenderer {
    async fn render(&mut self, frame: RenderFrame<'_>) -> Result<(), AvaverseError> {
        self.sequence += 1;
        let snapshot = PoseSnapshot::capture(
            self.sequence,
            frame.avatar,
            frame.frame,
            frame.video_size,
            frame.report,
        );
        self.app_state.publish_snapshot(snapshot).await;
        Ok(())
    }
}

/// Viewer server state
pub struct BrowserServer {
    app_state: Arc<AppState>,
    model_path: PathBuf,
    scene: SceneSettings,
}

type BrowserState = Arc<BrowserServer>;

impl BrowserServer {
    pub fn new(app_state: Arc<AppState>, config: &Config) -> Self {
        Self {
            app_state,
            model_path: config.avatar.model_path.clone(),
            scene: SceneSettings::from_config(config),
        }
    }

    /// Create the router for viewer and status endpoints
    pub fn router(self, config: &HttpConfig) -> Router {
        let cors = if config.cors_enabled {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
        };

        Router::new()
            .route("/", get(viewer_page))
            .route("/avatar/state", get(avatar_state))
            .route("/avatar/stream", get(avatar_stream))
            .route("/avatar/model", get(avatar_model))
            .route("/avatar/scene", get(avatar_scene))
            .route("/api/status", get(status))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(self))
    }
}

/// Serve the viewer page
async fn viewer_page() -> Html<&'static str> {
    Html(VIEWER_HTML)
}

/// Latest pose snapshot as JSON
async fn avatar_state(State(state): State<BrowserState>) -> Json<PoseSnapshot> {
    let snapshot = state.app_state.latest_snapshot().await;
    Json(PoseSnapshot::clone(&snapshot))
}

/// SSE endpoint for pose updates
async fn avatar_stream(State(state): State<BrowserState>) -> impl IntoResponse {
    sse::create_pose_stream(Arc::clone(&state.app_state))
}

async fn avatar_scene(State(state): State<BrowserState>) -> Json<SceneSettings> {
    Json(state.scene.clone())
}

/// Serve the configured VRM file
async fn avatar_model(State(state): State<BrowserState>) -> Response {
    match tokio::fs::read(&state.model_path).await {
        Ok(data) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "model/gltf-binary")],
            data,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Cannot serve model {}: {}", state.model_path.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub avatar: AvatarStatus,
    pub frames_rendered: u64,
    pub visible: bool,
}

async fn status(State(state): State<BrowserState>) -> Json<StatusResponse> {
    let snapshot = state.app_state.latest_snapshot().await;
    Json(StatusResponse {
        version: crate::VERSION.to_string(),
        avatar: state.app_state.avatar_status(),
        frames_rendered: state.app_state.frames_rendered(),
        visible: snapshot.visible,
    })
}

const VIEWER_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Avaverse</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { background: #000; overflow: hidden; }
        #stage { position: relative; width: 100vw; height: 100vh; }
        #video, #avatar { position: absolute; inset: 0; width: 100%; height: 100%; object-fit: contain; }
        #avatar.hidden { visibility: hidden; }
    </style>
    <script type="importmap">
    {
        "imports": {
            "three": "https://unpkg.com/three@0.160.0/build/three.module.js",
            "three/addons/": "https://unpkg.com/three@0.160.0/examples/jsm/",
            "@pixiv/three-vrm": "https://unpkg.com/@pixiv/three-vrm@2.1.0/lib/three-vrm.module.js"
        }
    }
    </script>
</head>
<body>
    <div id="stage">
        <img id="video" alt="">
        <canvas id="avatar" class="hidden"></canvas>
    </div>

    <script type="module">
        import * as THREE from 'three';
        import { GLTFLoader } from 'three/addons/loaders/GLTFLoader.js';
        import { VRMLoaderPlugin } from '@pixiv/three-vrm';

        const scene = await (await fetch('/avatar/scene')).json();
        const canvas = document.getElementById('avatar');
        const video = document.getElementById('video');

        const renderer = new THREE.WebGLRenderer({ canvas, alpha: true, antialias: true });
        renderer.setPixelRatio(window.devicePixelRatio);

        const camera = new THREE.PerspectiveCamera(scene.camera_fov, 1, 0.1, 1000);
        camera.position.set(...scene.camera_position);

        const world = new THREE.Scene();
        const light = new THREE.DirectionalLight(0xffffff, Math.PI);
        light.position.set(...scene.light_direction).normalize();
        world.add(light);

        function resize(width, height) {
            renderer.setSize(width, height, false);
            camera.aspect = width / height;
            camera.updateProjectionMatrix();
            camera.lookAt(new THREE.Vector3(...scene.camera_target));
        }
        resize(window.innerWidth, window.innerHeight);

        let vrm = null;
        const loader = new GLTFLoader();
        loader.register((parser) => new VRMLoaderPlugin(parser));
        loader.load('/avatar/model', (gltf) => {
            vrm = gltf.userData.vrm;
            vrm.scene.rotation.y = scene.scene_yaw;
            world.add(vrm.scene);
        });

        let size = null;
        function apply(pose) {
            if (pose.image_uri) video.src = pose.image_uri;
            canvas.classList.toggle('hidden', !pose.visible);
            if (pose.size && (!size || size.width !== pose.size.width || size.height !== pose.size.height)) {
                size = pose.size;
                resize(size.width, size.height);
            }
            if (!vrm) return;
            for (const [name, bone] of Object.entries(pose.bones)) {
                const node = vrm.humanoid.getNormalizedBoneNode(name);
                if (!node) continue;
                node.quaternion.set(...bone.rotation);
                if (name === 'hips') node.position.set(...bone.position);
            }
            for (const [name, value] of Object.entries(pose.expressions)) {
                vrm.expressionManager?.setValue(name, value);
            }
            vrm.lookAt?.applier?.applyYawPitch(
                THREE.MathUtils.radToDeg(pose.look_at.yaw),
                THREE.MathUtils.radToDeg(pose.look_at.pitch)
            );
        }

        fetch('/avatar/state').then((r) => r.json()).then(apply);
        const events = new EventSource('/avatar/stream');
        events.addEventListener('pose', (event) => apply(JSON.parse(event.data)));
        events.onerror = (err) => console.error('SSE error:', err);

        const clock = new THREE.Clock();
        renderer.setAnimationLoop(() => {
            if (vrm) vrm.update(clock.getDelta());
            renderer.render(world, camera);
        });
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::Skeleton;
    use crate::retarget::FrameReport;
    use crate::tracking::DetectionFrame;

    #[tokio::test]
    async fn test_renderer_publishes_snapshots() {
        let app_state = AppState::new(Config::default());
        let mut rx = app_state.subscribe_snapshots();
        let mut renderer = BrowserRenderer::new(Arc::clone(&app_state));

        let skeleton = Skeleton::full();
        let frame = DetectionFrame::default();
        for _ in 0..2 {
            renderer
                .render(RenderFrame {
                    avatar: Some(&skeleton),
                    frame: &frame,
                    video_size: None,
                    report: FrameReport::default(),
                })
                .await
                .unwrap();
        }

        assert_eq!(rx.recv().await.unwrap().sequence, 1);
        assert_eq!(rx.recv().await.unwrap().sequence, 2);
        assert_eq!(app_state.latest_snapshot().await.sequence, 2);
        assert_eq!(app_state.frames_rendered(), 2);
        assert!(app_state.latest_snapshot().await.avatar_loaded);
    }

    #[tokio::test]
    async fn test_state_and_status_handlers() {
        let config = Config::default();
        let app_state = AppState::new(config.clone());
        let server = Arc::new(BrowserServer::new(Arc::clone(&app_state), &config));

        let Json(snapshot) = avatar_state(State(Arc::clone(&server))).await;
        assert_eq!(snapshot.sequence, 0);

        let Json(status) = status(State(Arc::clone(&server))).await;
        assert_eq!(status.version, crate::VERSION);
        assert_eq!(status.frames_rendered, 0);
        assert_eq!(status.avatar, AvatarStatus::Loading);

        let Json(scene) = avatar_scene(State(server)).await;
        assert_eq!(scene.camera_fov, 35.0);
        assert_eq!(scene.camera_position, [0.0, 0.95, 1.96]);
    }

    #[tokio::test]
    async fn test_missing_model_is_not_found() {
        let mut config = Config::default();
        config.avatar.model_path = "no/such/model.vrm".into();
        let app_state = AppState::new(config.clone());
        let server = Arc::new(BrowserServer::new(app_state, &config));

        let response = avatar_model(State(server)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
