//! memegif renders animated speech-bubble memes and exports them as looping GIFs.
//!
//! - Describe a meme with a [`RenderConfig`]
//! - Paint frames with a [`Renderer`] (live preview via [`PreviewLoop`])
//! - Export a fixed 2 s, 20 fps GIF with [`export_animation`]
//! - Or drive everything, including history and the VIP gate, through a [`MemeSession`]
#![forbid(unsafe_code)]

mod foundation;

pub mod anim;
pub mod assets;
pub mod config;
pub mod export;
pub mod preview;
pub mod render;
pub mod session;
pub mod store;
pub mod text;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Vec2};
pub use crate::foundation::error::{MemeError, MemeResult};

pub use crate::anim::AvatarMotion;
pub use crate::assets::avatar::AvatarHandle;
pub use crate::assets::color::Color;
pub use crate::assets::decode::{PreparedImage, decode_avatar_bytes, decode_avatar_source};
pub use crate::config::{AnimationType, AvatarShape, RenderConfig};
pub use crate::export::{
    ExportParams, ExportThreading, FrameSink, GifArtifact, GifSink, InMemorySink, SinkConfig,
    export_animation, export_animation_at, render_frames_to_sink, suggested_filename,
};
pub use crate::preview::PreviewLoop;
pub use crate::render::{FrameRGBA, Renderer, SceneLayout, cover_fit};
pub use crate::session::{ExportOutcome, MemeSession};
pub use crate::store::{
    HISTORY_LIMIT, HistoryRecord, HistoryStore, JsonFileHistory, JsonFileSettings, MemoryHistory,
    MemorySettings, Settings, SettingsStore,
};
pub use crate::text::{FontBook, TextEngine, wrap_chars};
