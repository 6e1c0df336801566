//! The slideshow state machine.
//!
//! A [`SlideshowSession`] is owned by one driver loop. It keeps three deadlines (loading step,
//! advance, frame) instead of timers; the driver sleeps until [`SlideshowSession::next_deadline`]
//! and then calls [`SlideshowSession::poll`]. Every method takes the current instant.

use kurbo::Size;
use rand::Rng;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{CacheKey, ScaledImageCache};
use crate::command::{Command, SessionEvent};
use crate::compositor::{Compositor, EffectSelector, Layer, Transition};
use crate::constants::*;
use crate::decoder::{Bitmap, Decoder};
use crate::error::{SlideshowError, SlideshowResult};
use crate::kenburns::AnimationState;
use crate::playlist::Playlist;
use crate::settings::Settings;
use crate::state::SessionState;
use crate::time_base::Timeline;

/// Cumulative decode failures per path over the whole session.
#[derive(Debug, Default)]
pub struct FailureTracker {
    counts: HashMap<PathBuf, u32>,
}

impl FailureTracker {
    pub fn record(&mut self, path: &Path) -> u32 {
        let count = self.counts.entry(path.to_path_buf()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, path: &Path) -> u32 {
        self.counts.get(path).copied().unwrap_or(0)
    }

    pub fn forget(&mut self, path: &Path) {
        self.counts.remove(path);
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// A transient on-screen message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Loading {
    loaded: usize,
    total: usize,
}

pub struct SlideshowSession<D: Decoder, R: Rng> {
    settings: Settings,
    profile: String,
    playlist: Playlist,
    index: usize,

    decoder: D,
    rng: R,
    cache: ScaledImageCache,
    compositor: Compositor,
    selector: EffectSelector,
    failures: FailureTracker,

    state: SessionState,
    animating: bool,
    slide: Option<Timeline>,
    transition: Option<Timeline>,
    paused_at: Option<Instant>,
    loading: Option<Loading>,

    loading_at: Option<Instant>,
    advance_at: Option<Instant>,
    frame_at: Option<Instant>,

    notice: Option<Notice>,
    events: Vec<SessionEvent>,
    closed: bool,
}

fn validate_viewport(viewport: Size) -> SlideshowResult<()> {
    if viewport.width.is_finite()
        && viewport.height.is_finite()
        && viewport.width >= 1.0
        && viewport.height >= 1.0
    {
        Ok(())
    } else {
        Err(SlideshowError::Viewport {
            width: viewport.width,
            height: viewport.height,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl<D: Decoder, R: Rng> SlideshowSession<D, R> {
    pub fn new(
        settings: Settings,
        profile: impl Into<String>,
        playlist: Playlist,
        decoder: D,
        rng: R,
        viewport: Size,
    ) -> SlideshowResult<Self> {
        validate_viewport(viewport)?;
        let settings = settings.normalized();
        Ok(Self {
            compositor: Compositor::new(viewport, settings.caption.is_some()),
            selector: EffectSelector::new(settings.effect_order),
            settings,
            profile: profile.into(),
            playlist,
            index: 0,
            decoder,
            rng,
            cache: ScaledImageCache::default(),
            failures: FailureTracker::default(),
            state: SessionState::Loading,
            animating: false,
            slide: None,
            transition: None,
            paused_at: None,
            loading: None,
            loading_at: None,
            advance_at: None,
            frame_at: None,
            notice: None,
            events: Vec::new(),
            closed: false,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn cache(&self) -> &ScaledImageCache {
        &self.cache
    }

    pub fn failures(&self) -> &FailureTracker {
        &self.failures
    }

    pub fn viewport(&self) -> Size {
        self.compositor.viewport()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn is_transitioning(&self) -> bool {
        self.compositor.is_transitioning()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The image at [`Self::index`]: the incoming layer while a transition is in flight.
    pub fn current_path(&self) -> Option<&Path> {
        self.compositor
            .next()
            .or(self.compositor.current())
            .map(Layer::path)
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// The active notice, if it has not expired yet.
    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| now < n.expires_at)
            .map(|n| n.text.as_str())
    }

    /// Preload progress in `[0, 1]` while loading.
    pub fn loading_progress(&self) -> Option<f64> {
        let loading = self.loading?;
        if loading.total == 0 {
            return Some(1.0);
        }
        Some(loading.loaded as f64 / loading.total as f64)
    }

    /// Earliest instant at which [`Self::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.paused_at.is_some() || self.closed {
            return None;
        }
        [self.loading_at, self.advance_at, self.frame_at]
            .into_iter()
            .flatten()
            .min()
    }

    /// Time left in the current slide window, as seen by the slide timeline.
    pub fn slide_remaining(&self, now: Instant) -> Option<Duration> {
        self.slide.map(|s| s.remaining(now))
    }

    pub fn start(&mut self, now: Instant) {
        self.events.push(SessionEvent::Started);
        if self.playlist.is_empty() {
            info!(profile = %self.profile, "no images to show");
            self.enter_absorbing(now, SessionState::Empty, "No images found");
            return;
        }
        let total = self.settings.preload.min(self.playlist.len());
        info!(
            profile = %self.profile,
            images = self.playlist.len(),
            preload = total,
            "slideshow starting"
        );
        self.state = SessionState::Loading;
        self.loading = Some(Loading { loaded: 0, total });
        self.loading_at = Some(now);
    }

    /// Runs whatever deadline has come due: loading first, then advance, then frame.
    pub fn poll(&mut self, now: Instant) {
        if self.paused_at.is_some() || self.closed {
            return;
        }
        if self.loading_at.is_some_and(|at| at <= now) {
            self.loading_at = None;
            self.loading_step(now);
        }
        if self.advance_at.is_some_and(|at| at <= now) {
            self.advance_at = None;
            self.advance(now, false);
        }
        if self.frame_at.is_some_and(|at| at <= now) {
            self.frame_at = None;
            self.frame(now);
        }
    }

    pub fn handle(&mut self, now: Instant, command: Command) {
        debug!(?command, "command");
        match command {
            Command::Next => self.go_next(now),
            Command::Previous => self.go_prev(now),
            Command::TogglePause => {
                if self.is_paused() {
                    self.resume(now);
                } else {
                    self.pause(now);
                }
            }
            Command::AdvanceNow => self.advance(now, true),
            Command::Resize { width, height } => {
                if let Err(e) = self.resize(Size::new(width, height)) {
                    warn!(error = %e, "ignoring resize");
                }
            }
            Command::OpenSettings => self.events.push(SessionEvent::SettingsRequested {
                profile: self.profile.clone(),
            }),
            Command::SwitchProfile(profile) => {
                self.events
                    .push(SessionEvent::SwitchProfileRequested { profile });
            }
            Command::Close => self.close(),
        }
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.stop_timers();
        self.compositor.clear();
        self.closed = true;
        self.events.push(SessionEvent::Closed);
        info!(profile = %self.profile, "slideshow closed");
    }

    fn loading_step(&mut self, now: Instant) {
        let Some(mut loading) = self.loading else {
            return;
        };
        if loading.loaded < loading.total {
            let index = loading.loaded;
            if let Some(path) = self.playlist.get(index).map(Path::to_path_buf) {
                let key = self.cache_key(&path);
                if !self.cache.contains(&key) {
                    match self.decode_with_retry(&path) {
                        Ok(bitmap) => {
                            self.cache.get_or_scale(key, &bitmap);
                        }
                        Err(e) => warn!(path = %path.display(), error = %e, "preload failed"),
                    }
                }
            }
            loading.loaded += 1;
        }
        debug!(loaded = loading.loaded, total = loading.total, "loading");
        if loading.loaded >= loading.total {
            self.loading = None;
            self.index = 0;
            self.show_index(now, 0);
        } else {
            self.loading = Some(loading);
            self.loading_at = Some(now + LOADING_STEP);
        }
    }

    /// Moves to the next image through a transition.
    ///
    /// A no-op while an animation is running unless `forced`.
    pub fn advance(&mut self, now: Instant, forced: bool) {
        if self.closed || self.state.is_absorbing() || self.state == SessionState::Loading {
            return;
        }
        if self.paused_at.is_some() {
            self.advance_at = Some(now + self.settings.interval);
            return;
        }
        if self.animating && !forced {
            debug!("advance skipped, animation in flight");
            return;
        }
        if self.playlist.is_empty() {
            self.enter_absorbing(now, SessionState::Empty, "No images found");
            return;
        }
        if self.index >= self.playlist.len() {
            error!(index = self.index, len = self.playlist.len(), "index out of range, resetting");
            self.set_notice(now, "Playlist index reset", NOTICE_DURATION);
            self.index = 0;
        }
        if self.compositor.is_transitioning() {
            self.compositor.settle();
        }

        let target = (self.index + 1) % self.playlist.len();
        match self.load_layer(target) {
            Ok(layer) => {
                self.failures.forget(&layer.source);
                self.index = target;
                if self.compositor.current().is_none() {
                    self.compositor.show(layer);
                    self.state = SessionState::Showing;
                    self.start_animation(now, false);
                    return;
                }
                let kind = self
                    .selector
                    .next(&self.settings.effects, &mut self.rng);
                let effect = Transition::pick(kind, &mut self.rng);
                info!(
                    index = target,
                    effect = kind.name(),
                    path = %layer.source.display(),
                    "advancing"
                );
                self.compositor.begin_transition(layer, effect);
                self.state = SessionState::Transitioning;
                self.start_animation(now, true);
            }
            Err(e) => {
                warn!(index = target, error = %e, "advance failed");
                self.record_failure(now, target);
                if !self.state.is_absorbing() {
                    self.advance_at = Some(now + ADVANCE_RETRY_DELAY);
                }
            }
        }
    }

    fn frame(&mut self, now: Instant) {
        if !self.animating {
            return;
        }
        let Some(slide) = self.slide else {
            self.animating = false;
            return;
        };
        let slide_t = slide.eased(now);

        if let Some(transition) = self.transition {
            let effect_t = transition.eased(now);
            if let Err(e) = self.compositor.apply_transition(slide_t, effect_t) {
                warn!(error = %e, "dropping transition frame");
            }
            if transition.is_complete(now) {
                self.compositor.settle();
                self.transition = None;
                self.state = SessionState::Showing;
                debug!(index = self.index, "transition settled");
            }
        } else if let Err(e) = self.compositor.apply_ken_burns(slide_t) {
            warn!(error = %e, "dropping ken burns frame");
        }

        if slide.is_complete(now) {
            self.finish_animation(now);
            return;
        }
        // land exactly on the end of whichever timeline finishes next
        let mut at = (now + self.settings.frame_interval).min(now + slide.remaining(now));
        if let Some(transition) = self.transition {
            at = at.min(now + transition.remaining(now));
        }
        self.frame_at = Some(at);
    }

    fn start_animation(&mut self, now: Instant, with_transition: bool) {
        self.animating = true;
        self.slide = Some(Timeline::start(now, self.settings.interval));
        self.transition =
            with_transition.then(|| Timeline::start(now, self.settings.transition));
        self.advance_at = None;
        self.frame_at = Some(now);
    }

    fn finish_animation(&mut self, now: Instant) {
        self.animating = false;
        self.slide = None;
        self.transition = None;
        self.frame_at = None;
        self.advance_at = Some(now + FINISH_DELAY);
    }

    fn stop_timers(&mut self) {
        self.animating = false;
        self.slide = None;
        self.transition = None;
        self.loading = None;
        self.loading_at = None;
        self.advance_at = None;
        self.frame_at = None;
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_some()
            || self.closed
            || self.state.is_absorbing()
            || self.state == SessionState::Loading
        {
            return;
        }
        self.paused_at = Some(now);
        if let Some(slide) = self.slide.as_mut() {
            slide.pause(now);
        }
        if let Some(transition) = self.transition.as_mut() {
            transition.pause(now);
        }
        self.advance_at = None;
        self.frame_at = None;
        info!("paused");
        self.events.push(SessionEvent::PauseChanged { paused: true });
    }

    pub fn resume(&mut self, now: Instant) {
        let Some(paused_at) = self.paused_at.take() else {
            return;
        };
        if let Some(slide) = self.slide.as_mut() {
            slide.resume(now);
        }
        if let Some(transition) = self.transition.as_mut() {
            transition.resume(now);
        }
        match self.slide {
            Some(slide) if self.animating => {
                let remaining = self
                    .settings
                    .interval
                    .saturating_sub(slide.elapsed(now))
                    .max(MIN_RESUME_REMAINING);
                self.frame_at = Some(now);
                self.advance_at = Some(now + remaining);
            }
            _ => self.advance_at = Some(now + self.settings.interval),
        }
        let paused_for = now.saturating_duration_since(paused_at);
        info!(paused_for_ms = paused_for.as_millis() as u64, "resumed");
        self.events.push(SessionEvent::PauseChanged { paused: false });
    }

    pub fn go_next(&mut self, now: Instant) {
        self.navigate(now, 1);
    }

    pub fn go_prev(&mut self, now: Instant) {
        self.navigate(now, -1);
    }

    fn navigate(&mut self, now: Instant, step: isize) {
        if self.closed || self.playlist.is_empty() {
            return;
        }
        self.cancel(now);
        let len = self.playlist.len() as isize;
        let index = (self.index.min(self.playlist.len() - 1) as isize + step).rem_euclid(len);
        debug!(from = self.index, to = index, "manual navigation");
        self.show_index(now, index as usize);
    }

    /// Drops every animation and layer and leaves the paused state.
    fn cancel(&mut self, now: Instant) {
        self.stop_timers();
        self.compositor.clear();
        if self.paused_at.take().is_some() {
            debug!(at = ?now, "navigation cleared pause");
            self.events.push(SessionEvent::PauseChanged { paused: false });
        }
    }

    /// Shows the image at `index` without a transition.
    fn show_index(&mut self, now: Instant, index: usize) {
        self.index = index;
        match self.load_layer(index) {
            Ok(layer) => {
                self.failures.forget(&layer.source);
                info!(index, path = %layer.source.display(), "showing");
                self.compositor.show(layer);
                self.state = SessionState::Showing;
                self.start_animation(now, false);
            }
            Err(e) => {
                warn!(index, error = %e, "cannot show image");
                self.state = SessionState::Showing;
                self.record_failure(now, index);
                if !self.state.is_absorbing() {
                    self.advance_at = Some(now + ADVANCE_RETRY_DELAY);
                }
            }
        }
    }

    /// Removes the current image from disk and from the playlist once `confirm` agrees.
    ///
    /// Returns whether the file was deleted. Filesystem errors are returned untouched.
    pub fn delete_current<F>(&mut self, now: Instant, confirm: F) -> SlideshowResult<bool>
    where
        F: FnOnce(&Path) -> bool,
    {
        let Some(path) = self.playlist.get(self.index).map(Path::to_path_buf) else {
            return Ok(false);
        };
        if !confirm(&path) {
            debug!(path = %path.display(), "delete declined");
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!(path = %path.display(), "deleted image");
        self.playlist.remove_at(self.index);
        self.failures.forget(&path);
        self.cancel(now);
        if self.playlist.is_empty() {
            self.enter_absorbing(now, SessionState::Empty, "No images left");
            return Ok(true);
        }
        let index = self.index % self.playlist.len();
        self.show_index(now, index);
        Ok(true)
    }

    /// Restarts on a new profile and playlist.
    #[instrument(skip(self, settings, playlist), fields(images = playlist.len()))]
    pub fn reload(
        &mut self,
        now: Instant,
        settings: Settings,
        profile: impl Into<String> + std::fmt::Debug,
        playlist: Playlist,
    ) {
        self.stop_timers();
        self.compositor.clear();
        self.cache.clear();
        self.failures.clear();
        self.paused_at = None;
        self.notice = None;
        self.settings = settings.normalized();
        self.compositor.set_captions(self.settings.caption.is_some());
        self.selector.reset(self.settings.effect_order);
        self.profile = profile.into();
        self.playlist = playlist;
        self.index = 0;
        self.closed = false;
        self.start(now);
    }

    /// Later images are scaled for `viewport`.
    pub fn resize(&mut self, viewport: Size) -> SlideshowResult<()> {
        validate_viewport(viewport)?;
        debug!(width = viewport.width, height = viewport.height, "viewport resized");
        self.compositor.resize(viewport);
        Ok(())
    }

    fn viewport_px(&self) -> (u32, u32) {
        let viewport = self.viewport();
        (
            viewport.width.round() as u32,
            viewport.height.round() as u32,
        )
    }

    fn cache_key(&self, path: &Path) -> CacheKey {
        CacheKey {
            image: path.to_path_buf(),
            viewport: self.viewport_px(),
            for_animation: self.settings.ken_burns,
            ken_burns: self.settings.ken_burns,
            fit: self.settings.fit,
        }
    }

    fn load_layer(&mut self, index: usize) -> SlideshowResult<Layer> {
        let path = self
            .playlist
            .get(index)
            .map(Path::to_path_buf)
            .ok_or_else(|| SlideshowError::config(format!("no image at index {index}")))?;
        let key = self.cache_key(&path);
        let scaled = match self.cache.get(&key) {
            Some(hit) => hit,
            None => {
                let bitmap = self.decode_with_retry(&path)?;
                self.cache.get_or_scale(key, &bitmap)
            }
        };
        let viewport = self.viewport();
        let motion = if self.settings.ken_burns {
            let motion = AnimationState::generate(
                &mut self.rng,
                scaled.size(),
                viewport,
                self.settings.fit,
                self.settings.intensity,
            );
            debug!(
                index,
                pattern = motion.motion.pattern().name(),
                start_scale = motion.start_scale,
                end_scale = motion.end_scale,
                "ken burns motion"
            );
            motion
        } else {
            let (w, h) = self.viewport_px();
            AnimationState::still(scaled.snap_offset(Size::new(f64::from(w), f64::from(h))))
        };
        Ok(Layer::new(path, scaled, motion))
    }

    fn decode_with_retry(&mut self, path: &Path) -> SlideshowResult<Bitmap> {
        let attempts = self.settings.retry.attempts.max(1);
        let mut last = None;
        for attempt in 1..=attempts {
            match self.decoder.decode(path) {
                Ok(bitmap) if !bitmap.is_empty() => return Ok(bitmap),
                Ok(_) => last = Some(SlideshowError::decode(path, "decoded image is empty")),
                Err(e) => last = Some(e),
            }
            debug!(path = %path.display(), attempt, attempts, "decode attempt failed");
            if attempt < attempts && !self.settings.retry.delay.is_zero() {
                std::thread::sleep(self.settings.retry.delay);
            }
        }
        Err(last.unwrap_or_else(|| SlideshowError::decode(path, "decode failed")))
    }

    /// Counts a failed load of `index`; at the skip threshold the path leaves the playlist.
    fn record_failure(&mut self, now: Instant, index: usize) {
        let Some(path) = self.playlist.get(index).map(Path::to_path_buf) else {
            return;
        };
        let count = self.failures.record(&path);
        let name = display_name(&path);
        if count < SKIP_THRESHOLD {
            warn!(path = %path.display(), failures = count, "image failed to load");
            self.set_notice(now, format!("Could not load {name}"), NOTICE_DURATION);
            return;
        }

        warn!(path = %path.display(), failures = count, "skipping image permanently");
        self.playlist.remove_at(index);
        self.failures.forget(&path);
        self.events.push(SessionEvent::ImageSkipped { path });
        self.set_notice(now, format!("Skipped {name}"), SKIP_NOTICE_DURATION);

        let len = self.playlist.len();
        if len == 0 {
            self.enter_absorbing(now, SessionState::Error, "No displayable images");
            return;
        }
        if index < self.index {
            self.index -= 1;
        } else if index == self.index {
            // the next advance lands on whatever took the removed slot
            self.index = (index + len - 1) % len;
        }
        self.index %= len;
    }

    fn enter_absorbing(&mut self, now: Instant, state: SessionState, message: &str) {
        self.stop_timers();
        self.compositor.clear();
        self.paused_at = None;
        self.state = state;
        self.set_notice(now, message, EXHAUSTED_NOTICE_DURATION);
    }

    fn set_notice(&mut self, now: Instant, text: impl Into<String>, duration: Duration) {
        self.notice = Some(Notice {
            text: text.into(),
            expires_at: now + duration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::TransitionKind;
    use crate::settings::RetryPolicy;
    use image::{ImageBuffer, Rgba};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeDecoder {
        broken: HashSet<PathBuf>,
        calls: usize,
    }

    impl Decoder for FakeDecoder {
        fn decode(&mut self, path: &Path) -> SlideshowResult<Bitmap> {
            self.calls += 1;
            if self.broken.contains(path) {
                return Err(SlideshowError::decode(path, "broken"));
            }
            Ok(Bitmap::new(
                path,
                ImageBuffer::from_pixel(40, 30, Rgba([1, 2, 3, 255])),
            ))
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn settings() -> Settings {
        Settings {
            interval: ms(1000),
            transition: ms(200),
            retry: RetryPolicy {
                attempts: 3,
                delay: Duration::ZERO,
            },
            preload: 2,
            ..Settings::default()
        }
    }

    fn session(n: usize) -> SlideshowSession<FakeDecoder, StdRng> {
        let playlist = Playlist::new((0..n).map(|i| PathBuf::from(format!("{i}.png"))).collect());
        SlideshowSession::new(
            settings(),
            "Default",
            playlist,
            FakeDecoder::default(),
            StdRng::seed_from_u64(42),
            Size::new(160.0, 120.0),
        )
        .unwrap()
    }

    /// Polls every deadline up to `until`.
    fn run_until<D: Decoder, R: Rng>(s: &mut SlideshowSession<D, R>, until: Instant) {
        while let Some(at) = s.next_deadline() {
            if at > until {
                break;
            }
            s.poll(at);
        }
    }

    #[test]
    fn rejects_degenerate_viewport() {
        let result = SlideshowSession::new(
            settings(),
            "Default",
            Playlist::default(),
            FakeDecoder::default(),
            StdRng::seed_from_u64(1),
            Size::new(0.0, 100.0),
        );
        assert!(matches!(result, Err(SlideshowError::Viewport { .. })));
    }

    #[test]
    fn empty_playlist_is_absorbing() {
        let t0 = Instant::now();
        let mut s = session(0);
        s.start(t0);
        assert_eq!(s.state(), SessionState::Empty);
        assert!(s.next_deadline().is_none());
        assert!(s.notice(t0).is_some());
        s.go_next(t0);
        s.advance(t0, true);
        assert_eq!(s.state(), SessionState::Empty);
    }

    #[test]
    fn loading_preloads_then_shows_first() {
        let t0 = Instant::now();
        let mut s = session(4);
        s.start(t0);
        assert_eq!(s.loading_progress(), Some(0.0));
        s.poll(t0);
        assert_eq!(s.loading_progress(), Some(0.5));
        assert_eq!(s.state(), SessionState::Loading);
        assert_eq!(s.next_deadline(), Some(t0 + LOADING_STEP));
        s.poll(t0 + LOADING_STEP);
        assert_eq!(s.state(), SessionState::Showing);
        assert_eq!(s.current_path(), Some(Path::new("0.png")));
        assert!(s.is_animating());
        assert_eq!(s.cache().len(), 2);
    }

    #[test]
    fn cycle_is_interval_plus_finish_delay() {
        let t0 = Instant::now();
        let mut s = session(3);
        s.start(t0);
        run_until(&mut s, t0 + LOADING_STEP);
        let shown_at = t0 + LOADING_STEP;
        assert_eq!(s.index(), 0);

        run_until(&mut s, shown_at + ms(1049));
        assert_eq!(s.index(), 0);
        assert!(!s.is_animating());
        run_until(&mut s, shown_at + ms(1050));
        assert_eq!(s.index(), 1);
        assert!(s.is_transitioning());
        assert_eq!(s.state(), SessionState::Transitioning);

        run_until(&mut s, shown_at + ms(1050 + 250));
        assert!(!s.is_transitioning());
        assert_eq!(s.compositor().layers().len(), 1);
        assert_eq!(s.current_path(), Some(Path::new("1.png")));
    }

    #[test]
    fn forced_advance_interrupts_animation() {
        let t0 = Instant::now();
        let mut s = session(3);
        s.start(t0);
        run_until(&mut s, t0 + ms(300));
        assert!(s.is_animating());
        s.advance(t0 + ms(300), false);
        assert_eq!(s.index(), 0);
        s.handle(t0 + ms(300), Command::AdvanceNow);
        assert_eq!(s.index(), 1);
        assert!(s.is_transitioning());
    }

    #[test]
    fn pause_freezes_deadlines_and_resume_reschedules() {
        let t0 = Instant::now();
        let mut s = session(3);
        s.start(t0);
        run_until(&mut s, t0 + ms(500));
        let before = s.slide_remaining(t0 + ms(500)).unwrap();
        s.handle(t0 + ms(500), Command::TogglePause);
        assert!(s.is_paused());
        assert!(s.next_deadline().is_none());
        s.poll(t0 + ms(5000));
        assert_eq!(s.index(), 0);

        s.handle(t0 + ms(9500), Command::TogglePause);
        assert!(!s.is_paused());
        assert_eq!(s.slide_remaining(t0 + ms(9500)), Some(before));
        assert_eq!(s.next_deadline(), Some(t0 + ms(9500)));
        assert_eq!(
            s.drain_events()
                .into_iter()
                .filter(|e| matches!(e, SessionEvent::PauseChanged { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn resume_keeps_at_least_minimum_remaining() {
        let t0 = Instant::now();
        let mut s = session(2);
        s.start(t0);
        run_until(&mut s, t0 + ms(100));
        let shown_at = t0 + ms(100);
        run_until(&mut s, shown_at + ms(990));
        s.pause(shown_at + ms(990));
        s.resume(shown_at + ms(2000));
        assert_eq!(s.advance_at, Some(shown_at + ms(2000) + MIN_RESUME_REMAINING));
    }

    #[test]
    fn navigation_wraps_and_unpauses() {
        let t0 = Instant::now();
        let mut s = session(3);
        s.start(t0);
        run_until(&mut s, t0 + ms(100));
        s.pause(t0 + ms(200));
        s.go_prev(t0 + ms(300));
        assert!(!s.is_paused());
        assert_eq!(s.index(), 2);
        assert_eq!(s.current_path(), Some(Path::new("2.png")));
        s.go_next(t0 + ms(400));
        assert_eq!(s.index(), 0);
        assert!(!s.is_transitioning());
        assert_eq!(s.compositor().layers().len(), 1);
    }

    #[test]
    fn repeated_failures_remove_path() {
        let t0 = Instant::now();
        let mut s = session(3);
        s.decoder.broken.insert(PathBuf::from("1.png"));
        s.start(t0);
        run_until(&mut s, t0 + ms(100));
        s.cancel(t0);
        s.state = SessionState::Showing;

        for attempt in 1..=2 {
            s.advance(t0, true);
            assert_eq!(s.failures().count(Path::new("1.png")), attempt);
            assert_eq!(s.index(), 0);
            assert_eq!(s.advance_at, Some(t0 + ADVANCE_RETRY_DELAY));
        }
        s.advance(t0, true);
        assert_eq!(s.playlist().len(), 2);
        assert_eq!(s.playlist().position(Path::new("1.png")), None);
        assert!(
            s.drain_events()
                .contains(&SessionEvent::ImageSkipped {
                    path: PathBuf::from("1.png")
                })
        );
        assert_eq!(s.notice(t0), Some("Skipped 1.png"));

        run_until(&mut s, t0 + ADVANCE_RETRY_DELAY);
        assert_eq!(s.current_path(), Some(Path::new("2.png")));
    }

    #[test]
    fn every_image_failing_ends_in_error() {
        let t0 = Instant::now();
        let mut s = session(2);
        s.decoder.broken.insert(PathBuf::from("0.png"));
        s.decoder.broken.insert(PathBuf::from("1.png"));
        s.start(t0);
        run_until(&mut s, t0 + ms(10_000));
        assert_eq!(s.state(), SessionState::Error);
        assert!(s.playlist().is_empty());
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn decode_retries_in_place() {
        let t0 = Instant::now();
        let mut s = session(2);
        s.decoder.broken.insert(PathBuf::from("0.png"));
        s.settings.preload = 0;
        s.start(t0);
        s.poll(t0);
        // one failed show of index 0: three in-place attempts
        assert_eq!(s.decoder.calls, 3);
        assert_eq!(s.failures().count(Path::new("0.png")), 1);
    }

    #[test]
    fn delete_requires_confirmation_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..2)
            .map(|i| {
                let p = dir.path().join(format!("{i}.png"));
                fs::write(&p, b"x").unwrap();
                p
            })
            .collect();
        let t0 = Instant::now();
        let mut s = SlideshowSession::new(
            settings(),
            "Default",
            Playlist::new(paths.clone()),
            FakeDecoder::default(),
            StdRng::seed_from_u64(3),
            Size::new(160.0, 120.0),
        )
        .unwrap();
        s.start(t0);
        run_until(&mut s, t0 + ms(100));

        assert!(!s.delete_current(t0, |_| false).unwrap());
        assert!(paths[0].exists());

        assert!(s.delete_current(t0, |p| p == paths[0]).unwrap());
        assert!(!paths[0].exists());
        assert_eq!(s.playlist().len(), 1);
        assert_eq!(s.current_path(), Some(paths[1].as_path()));

        fs::remove_file(&paths[1]).unwrap();
        assert!(matches!(
            s.delete_current(t0, |_| true),
            Err(SlideshowError::Io(_))
        ));
    }

    #[test]
    fn delete_mid_transition_targets_incoming_image() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| {
                let p = dir.path().join(format!("{i}.png"));
                fs::write(&p, b"x").unwrap();
                p
            })
            .collect();
        let t0 = Instant::now();
        let mut s = SlideshowSession::new(
            settings(),
            "Default",
            Playlist::new(paths.clone()),
            FakeDecoder::default(),
            StdRng::seed_from_u64(5),
            Size::new(160.0, 120.0),
        )
        .unwrap();
        s.start(t0);
        run_until(&mut s, t0 + ms(100));
        let shown = t0 + ms(100);
        run_until(&mut s, shown + ms(1050 + 100));
        assert!(s.is_transitioning());
        assert_eq!(s.index(), 1);
        assert_eq!(s.current_path(), Some(paths[1].as_path()));

        let target = s.current_path().map(Path::to_path_buf).unwrap();
        assert!(s.delete_current(shown + ms(1150), |p| p == target).unwrap());
        assert!(paths[0].exists());
        assert!(!paths[1].exists());
        assert_eq!(s.current_path(), Some(paths[2].as_path()));
    }

    #[test]
    fn reload_restarts_on_new_playlist() {
        let t0 = Instant::now();
        let mut s = session(3);
        s.start(t0);
        run_until(&mut s, t0 + ms(3000));
        let mut next = settings();
        next.effects = vec![TransitionKind::Wipe];
        s.reload(
            t0 + ms(3000),
            next,
            "Night",
            Playlist::new(vec![PathBuf::from("x.png")]),
        );
        assert_eq!(s.profile(), "Night");
        assert_eq!(s.state(), SessionState::Loading);
        assert_eq!(s.index(), 0);
        run_until(&mut s, t0 + ms(3000));
        assert_eq!(s.current_path(), Some(Path::new("x.png")));
    }

    #[test]
    fn commands_emit_requests() {
        let t0 = Instant::now();
        let mut s = session(1);
        s.start(t0);
        s.handle(t0, Command::OpenSettings);
        s.handle(t0, Command::SwitchProfile("Night".into()));
        s.handle(t0, Command::Close);
        s.handle(t0, Command::Close);
        assert_eq!(
            s.drain_events(),
            vec![
                SessionEvent::Started,
                SessionEvent::SettingsRequested {
                    profile: "Default".into()
                },
                SessionEvent::SwitchProfileRequested {
                    profile: "Night".into()
                },
                SessionEvent::Closed,
            ]
        );
        assert!(s.is_closed());
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn resize_rejects_bad_viewport() {
        let mut s = session(1);
        assert!(s.resize(Size::new(f64::NAN, 10.0)).is_err());
        s.resize(Size::new(640.0, 480.0)).unwrap();
        assert_eq!(s.viewport(), Size::new(640.0, 480.0));
    }
}
