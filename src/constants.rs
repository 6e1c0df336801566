use std::time::Duration;

pub const ANIM_FPS: u32 = 24;                                   // Frame ticks per second while animating
pub const FRAME_INTERVAL: Duration = Duration::from_millis(1000 / ANIM_FPS as u64);

pub const CACHE_CAPACITY: usize = 3;                            // Scaled bitmaps kept around
pub const PRELOAD_COUNT: usize = 5;                             // Images warmed during loading
pub const LOADING_STEP: Duration = Duration::from_millis(100);  // Delay between preload steps

pub const DECODE_ATTEMPTS: u32 = 3;                             // In-place decode retries
pub const DECODE_RETRY_DELAY: Duration = Duration::from_millis(100);
pub const SKIP_THRESHOLD: u32 = 3;                              // Cumulative failures before a path is dropped

pub const ADVANCE_RETRY_DELAY: Duration = Duration::from_millis(100); // After a failed advance
pub const FINISH_DELAY: Duration = Duration::from_millis(50);         // Between a finished slide and the next advance
pub const MIN_RESUME_REMAINING: Duration = Duration::from_millis(100);

pub const NOTICE_DURATION: Duration = Duration::from_millis(3000);
pub const SKIP_NOTICE_DURATION: Duration = Duration::from_millis(2000);
pub const EXHAUSTED_NOTICE_DURATION: Duration = Duration::from_millis(5000);

pub const DEFAULT_INTERVAL_SECS: f64 = 5.0;                    // Slide interval when a profile gives none usable
pub const MIN_INTERVAL_SECS: f64 = 1.0;
pub const MAX_INTERVAL_SECS: f64 = 3600.0;
pub const MIN_TRANSITION_MS: u64 = 100;
pub const MAX_TRANSITION_MS: u64 = 10_000;

pub const CAPTION_PADDING: f64 = 20.0;                          // Pixels between caption and viewport edge

pub const WINDOW_WIDTH: i32 = 1280;                             // Initial window size
pub const WINDOW_HEIGHT: i32 = 720;
pub const DISPLAY_FPS: u32 = 60;                                // Redraw rate of the window
