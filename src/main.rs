use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use kurbo::Size;
use rand::SeedableRng;
use rand::rngs::StdRng;
use raylib::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cinematic_slideshow::constants::{DISPLAY_FPS, NOTICE_DURATION, WINDOW_HEIGHT, WINDOW_WIDTH};
use cinematic_slideshow::{
    ImageDecoder, Playlist, Profile, ProfileStore, SessionEvent, Settings, SlideshowSession,
};

mod display;

use crate::display::{Action, Input, TextureCache};

#[derive(Parser, Debug)]
#[command(version, about = "Full-screen photo slideshow with Ken-Burns motion")]
struct Args {
    /// Profile to start with
    profile: Option<String>,

    /// Profile to start with (same as the positional argument)
    #[arg(short, long = "profile", conflicts_with = "profile")]
    profile_flag: Option<String>,

    /// Profile store to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the stored profiles and exit
    #[arg(long)]
    list_profiles: bool,
}

fn build_playlist(profile: &Profile) -> Playlist {
    let mut rng = StdRng::from_os_rng();
    let playlist = Playlist::from_folders(&profile.folders, profile.random_order, &mut rng);
    info!(images = playlist.len(), folders = profile.folders.len(), "playlist ready");
    playlist
}

fn checked(name: &str, profile: &Profile) {
    if let Err(e) = profile.validate() {
        warn!(profile = name, error = %e, "profile out of range, values are clamped");
    }
}

/// The profile after `current` in store order, wrapping around.
fn following_profile(store: &ProfileStore, current: &str) -> Option<String> {
    if store.profiles.len() < 2 {
        return None;
    }
    store
        .profiles
        .keys()
        .skip_while(|name| name.as_str() != current)
        .nth(1)
        .or_else(|| store.profiles.keys().next())
        .cloned()
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let store_path = match args.config {
        Some(path) => path,
        None => ProfileStore::path().context("locating profile store")?,
    };
    let mut store = ProfileStore::load_or_default(&store_path);

    if args.list_profiles {
        if store.is_read_only() {
            println!("{} has errors, only readable profiles are listed", store_path.display());
        }
        for name in store.profiles.keys() {
            let marker = if *name == store.last_used_profile { "*" } else { " " };
            println!("{marker} {name}");
        }
        return Ok(());
    }

    let requested = args.profile_flag.or(args.profile);
    let (profile_name, profile) = store.resolve(requested.as_deref());
    checked(&profile_name, &profile);
    store.last_used_profile = profile_name.clone();
    if let Err(e) = store.save_to(&store_path) {
        warn!(path = %store_path.display(), error = %e, "could not record last used profile");
    }

    let (mut rl, thread) = raylib::init()
        .size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .title("Cinematic Slideshow")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(DISPLAY_FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    let viewport = Size::new(
        f64::from(rl.get_screen_width()),
        f64::from(rl.get_screen_height()),
    );
    let mut session = match SlideshowSession::new(
        Settings::from_profile(&profile),
        profile_name.clone(),
        build_playlist(&profile),
        ImageDecoder,
        StdRng::from_os_rng(),
        viewport,
    ) {
        Ok(session) => session,
        Err(e) => {
            display::show_fatal(&mut rl, &thread, &format!("Error: {e}"));
            return Err(e).context("starting slideshow");
        }
    };
    session.start(Instant::now());

    let mut textures = TextureCache::default();
    let mut input = Input::default();
    let mut alert: Option<(String, Instant)> = None;

    while !rl.window_should_close() && !session.is_closed() {
        let now = Instant::now();
        let upcoming = following_profile(&store, session.profile());

        for action in input.poll(&rl, &session, upcoming.as_deref()) {
            match action {
                Action::Command(command) => session.handle(now, command),
                Action::Delete(target) => {
                    match session.delete_current(now, |path| path == target.as_path()) {
                        Ok(true) => {}
                        Ok(false) => {
                            warn!(path = %target.display(), "image changed before deletion, kept");
                        }
                        Err(e) => {
                            warn!(error = %e, "delete failed");
                            alert = Some((format!("Delete failed: {e}"), now + NOTICE_DURATION));
                        }
                    }
                }
            }
        }

        session.poll(now);

        for event in session.drain_events() {
            match event {
                SessionEvent::SettingsRequested { profile } => {
                    info!(
                        %profile,
                        path = %store_path.display(),
                        "edit the profile store to change settings"
                    );
                }
                SessionEvent::SwitchProfileRequested { profile } => {
                    let (name, next) = store.resolve(Some(&profile));
                    checked(&name, &next);
                    let playlist = build_playlist(&next);
                    session.reload(now, Settings::from_profile(&next), name.clone(), playlist);
                    store.last_used_profile = name;
                    if let Err(e) = store.save_to(&store_path) {
                        warn!(error = %e, "could not record last used profile");
                    }
                }
                SessionEvent::ImageSkipped { path } => {
                    info!(path = %path.display(), "image skipped");
                }
                SessionEvent::Started
                | SessionEvent::PauseChanged { .. }
                | SessionEvent::Closed => {}
            }
        }

        if alert.as_ref().is_some_and(|(_, until)| *until <= now) {
            alert = None;
        }

        textures.sync(&mut rl, &thread, &session.compositor().layers());

        let mut d = rl.begin_drawing(&thread);
        display::draw(
            &mut d,
            &session,
            &textures,
            &input,
            alert.as_ref().map(|(text, _)| text.as_str()),
            now,
        );
    }

    session.close();
    Ok(())
}
