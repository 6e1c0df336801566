//! Full-screen image slideshow engine with Ken-Burns motion and timed transitions.
//!
//! The engine is display-agnostic: a [`SlideshowSession`] decides which image is on screen,
//! where each layer sits and how opaque it is. A display surface (see the `window` feature)
//! draws [`Compositor::layers`] and forwards input as [`Command`]s.
#![forbid(unsafe_code)]

pub mod cache;
pub mod command;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod kenburns;
pub mod playlist;
pub mod session;
pub mod settings;
pub mod state;
pub mod time_base;

pub use crate::cache::{CacheKey, ScaledImage, ScaledImageCache};
pub use crate::command::{Command, SessionEvent};
pub use crate::compositor::{
    Caption, CaptionStyle, Compositor, Layer, Pose, Transition, TransitionKind,
};
pub use crate::config::{FitMode, Profile, ProfileStore};
pub use crate::decoder::{Bitmap, Decoder, ImageDecoder};
pub use crate::error::{SlideshowError, SlideshowResult};
pub use crate::kenburns::{AnimationState, MotionParameters, MotionPattern};
pub use crate::playlist::Playlist;
pub use crate::session::SlideshowSession;
pub use crate::settings::{RetryPolicy, Settings};
pub use crate::state::SessionState;
pub use crate::time_base::{TimeBase, Timeline, ease_cosine};
