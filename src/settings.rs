use std::time::Duration;
use tracing::warn;

use crate::compositor::overlay::CaptionStyle;
use crate::compositor::transition::TransitionKind;
use crate::config::{EffectOrder, FitMode, Profile};
use crate::constants::*;

/// How decode failures are retried in place before they count against a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DECODE_ATTEMPTS,
            delay: DECODE_RETRY_DELAY,
        }
    }
}

/// Slide interval in seconds, clamped to the range profiles accept.
fn interval_secs(requested: f64) -> f64 {
    if !requested.is_finite() {
        warn!(
            interval_sec = requested,
            default = DEFAULT_INTERVAL_SECS,
            "slide interval is not a number"
        );
        return DEFAULT_INTERVAL_SECS;
    }
    let clamped = requested.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
    if clamped != requested {
        warn!(interval_sec = requested, clamped, "slide interval out of range");
    }
    clamped
}

/// Runtime view of a profile, as read by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub interval: Duration,
    pub transition: Duration,
    pub ken_burns: bool,
    pub intensity: u8,
    pub fit: FitMode,
    pub effects: Vec<TransitionKind>,
    pub effect_order: EffectOrder,
    pub caption: Option<CaptionStyle>,
    pub retry: RetryPolicy,
    pub preload: usize,
    pub frame_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_profile(&Profile::default())
    }
}

impl Settings {
    pub fn from_profile(profile: &Profile) -> Self {
        let interval = Duration::from_secs_f64(interval_secs(profile.interval_sec));
        Self {
            interval,
            transition: Duration::from_millis(
                profile
                    .fade_duration_ms
                    .clamp(MIN_TRANSITION_MS, MAX_TRANSITION_MS),
            ),
            ken_burns: profile.ken_burns,
            intensity: profile.ken_intensity,
            fit: profile.fit_mode,
            effects: profile.effects.enabled(),
            effect_order: profile.effect_order,
            caption: profile.show_filename.then(|| CaptionStyle::from_profile(profile)),
            retry: RetryPolicy::default(),
            preload: PRELOAD_COUNT,
            frame_interval: FRAME_INTERVAL,
        }
        .normalized()
    }

    /// Clamps values the engine cannot honor: intensity to 1..=10 and the transition to the
    /// slide interval, so a transition always plays inside its slide window.
    pub fn normalized(mut self) -> Self {
        let intensity = self.intensity.clamp(1, 10);
        if intensity != self.intensity {
            warn!(
                intensity = self.intensity,
                clamped = intensity,
                "ken burns intensity out of range"
            );
            self.intensity = intensity;
        }
        if self.transition > self.interval {
            warn!(
                transition_ms = self.transition.as_millis() as u64,
                interval_ms = self.interval.as_millis() as u64,
                "transition longer than slide interval, clamping"
            );
            self.transition = self.interval;
        }
        if self.frame_interval.is_zero() {
            self.frame_interval = FRAME_INTERVAL;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EffectToggles, VerticalAnchor};

    #[test]
    fn from_default_profile() {
        let settings = Settings::default();
        assert_eq!(settings.interval, Duration::from_secs(5));
        assert_eq!(settings.transition, Duration::from_millis(1000));
        assert!(settings.ken_burns);
        assert_eq!(settings.intensity, 5);
        assert_eq!(settings.effects, vec![TransitionKind::Crossfade]);
        assert!(settings.caption.is_none());
        assert_eq!(settings.retry.attempts, 3);
    }

    #[test]
    fn transition_is_clamped_to_interval() {
        let profile = Profile {
            interval_sec: 1.0,
            fade_duration_ms: 4000,
            ..Profile::default()
        };
        let settings = Settings::from_profile(&profile);
        assert_eq!(settings.transition, Duration::from_secs(1));
    }

    #[test]
    fn interval_is_clamped_to_profile_range() {
        let huge: Profile = serde_json::from_str(r#"{"interval_sec": 1e20}"#).unwrap();
        assert_eq!(Settings::from_profile(&huge).interval, Duration::from_secs(3600));

        let tiny: Profile = serde_json::from_str(r#"{"interval_sec": -3}"#).unwrap();
        assert_eq!(Settings::from_profile(&tiny).interval, Duration::from_secs(1));

        let nan = Profile {
            interval_sec: f64::NAN,
            ..Profile::default()
        };
        assert_eq!(Settings::from_profile(&nan).interval, Duration::from_secs(5));

        let flicker = Profile {
            fade_duration_ms: 5,
            ..Profile::default()
        };
        assert_eq!(Settings::from_profile(&flicker).transition, Duration::from_millis(100));
    }

    #[test]
    fn intensity_is_clamped() {
        let profile = Profile {
            ken_intensity: 0,
            ..Profile::default()
        };
        assert_eq!(Settings::from_profile(&profile).intensity, 1);
    }

    #[test]
    fn caption_style_follows_profile() {
        let profile = Profile {
            show_filename: true,
            filename_v_pos: VerticalAnchor::Top,
            font_size: 24,
            effects: EffectToggles {
                zoom: true,
                ..EffectToggles::default()
            },
            ..Profile::default()
        };
        let settings = Settings::from_profile(&profile);
        let caption = settings.caption.unwrap();
        assert_eq!(caption.vertical, VerticalAnchor::Top);
        assert_eq!(caption.font_size, 24);
        assert_eq!(
            settings.effects,
            vec![TransitionKind::Crossfade, TransitionKind::Zoom]
        );
    }
}
