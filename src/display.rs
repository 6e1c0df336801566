use anyhow::{Context, Result, anyhow};
use cinematic_slideshow::compositor::{Caption, CaptionStyle, Layer};
use cinematic_slideshow::{Command, Decoder, SessionState, SlideshowSession};
use kurbo::Size;
use rand::Rng;
use raylib::core::text::measure_text;
use raylib::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, warn};

/// GPU textures for the layers currently on screen, keyed by source path and scaled size.
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<(PathBuf, u32, u32), Texture2D>,
}

impl TextureCache {
    fn key(layer: &Layer) -> (PathBuf, u32, u32) {
        let (w, h) = layer.image.image.dimensions();
        (layer.source.clone(), w, h)
    }

    /// Uploads missing textures and drops the ones no longer shown.
    pub fn sync(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, layers: &[&Layer]) {
        let wanted: Vec<_> = layers.iter().map(|l| Self::key(l)).collect();
        self.textures.retain(|key, _| wanted.contains(key));
        for layer in layers {
            let key = Self::key(layer);
            if self.textures.contains_key(&key) {
                continue;
            }
            match upload(rl, thread, layer) {
                Ok(texture) => {
                    self.textures.insert(key, texture);
                }
                Err(e) => error!(
                    path = %layer.source.display(),
                    error = %e,
                    "texture upload failed"
                ),
            }
        }
    }

    fn get(&self, layer: &Layer) -> Option<&Texture2D> {
        self.textures.get(&Self::key(layer))
    }
}

/// Allocates an RGBA8 texture of the layer's size and copies the bitmap into it.
fn upload(rl: &mut RaylibHandle, thread: &RaylibThread, layer: &Layer) -> Result<Texture2D> {
    let bitmap = &layer.image.image;
    let (w, h) = bitmap.dimensions();
    let width = i32::try_from(w).context("layer too wide for a texture")?;
    let height = i32::try_from(h).context("layer too tall for a texture")?;
    let blank = Image::gen_image_color(width, height, Color::BLANK);
    let mut texture = rl
        .load_texture_from_image(thread, &blank)
        .map_err(|e| anyhow!("creating texture: {e}"))?;
    texture
        .update_texture(bitmap.as_raw())
        .map_err(|e| anyhow!("filling texture: {e:?}"))?;
    Ok(texture)
}

fn alpha(opacity: f64) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Maps raylib input onto session commands. `Delete` arms a confirmation first.
#[derive(Default)]
pub struct Input {
    pending_delete: Option<PathBuf>,
}

pub enum Action {
    Command(Command),
    /// Confirmed deletion of the image that was on screen when `Delete` was pressed.
    Delete(PathBuf),
}

impl Input {
    pub fn pending_delete(&self) -> Option<&PathBuf> {
        self.pending_delete.as_ref()
    }

    pub fn poll<D: Decoder, R: Rng>(
        &mut self,
        rl: &RaylibHandle,
        session: &SlideshowSession<D, R>,
        next_profile: Option<&str>,
    ) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.pending_delete.is_some() {
            if rl.is_key_pressed(KeyboardKey::KEY_Y) {
                if let Some(path) = self.pending_delete.take() {
                    actions.push(Action::Delete(path));
                }
            } else if rl.is_key_pressed(KeyboardKey::KEY_N) {
                self.pending_delete = None;
            }
            return actions;
        }
        if rl.is_key_pressed(KeyboardKey::KEY_SPACE) {
            actions.push(Action::Command(Command::TogglePause));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_RIGHT) {
            actions.push(Action::Command(Command::Next));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_LEFT) {
            actions.push(Action::Command(Command::Previous));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_ENTER) {
            actions.push(Action::Command(Command::AdvanceNow));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_S) {
            actions.push(Action::Command(Command::OpenSettings));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_P) {
            if let Some(profile) = next_profile {
                actions.push(Action::Command(Command::SwitchProfile(profile.to_string())));
            }
        }
        if rl.is_key_pressed(KeyboardKey::KEY_DELETE) {
            self.pending_delete = session.current_path().map(PathBuf::from);
        }
        if rl.is_window_resized() {
            actions.push(Action::Command(Command::Resize {
                width: f64::from(rl.get_screen_width()),
                height: f64::from(rl.get_screen_height()),
            }));
        }
        actions
    }
}

/// Draws one frame of the session.
pub fn draw<D: Decoder, R: Rng>(
    d: &mut RaylibDrawHandle,
    session: &SlideshowSession<D, R>,
    textures: &TextureCache,
    input: &Input,
    alert: Option<&str>,
    now: Instant,
) {
    d.clear_background(Color::BLACK);
    let viewport = session.viewport();

    for layer in session.compositor().layers() {
        let Some(texture) = textures.get(layer) else {
            continue;
        };
        let rect = layer.visual_rect(viewport);
        d.draw_texture_pro(
            texture,
            Rectangle::new(0.0, 0.0, texture.width() as f32, texture.height() as f32),
            Rectangle::new(
                rect.x0 as f32,
                rect.y0 as f32,
                rect.width() as f32,
                rect.height() as f32,
            ),
            Vector2::new(0.0, 0.0),
            0.0,
            Color::new(255, 255, 255, alpha(layer.opacity)),
        );
    }

    if let (Some(caption), Some(style)) = (
        session.compositor().caption(),
        session.settings().caption.as_ref(),
    ) {
        draw_caption(d, caption, style, viewport);
    }

    match session.state() {
        SessionState::Loading => {
            let percent = (session.loading_progress().unwrap_or(0.0) * 100.0).round();
            draw_centered(d, &format!("Loading... {percent}%"), 30, viewport, Color::WHITE);
        }
        SessionState::Empty | SessionState::Error => {
            let text = session.notice(now).unwrap_or(if session.state() == SessionState::Empty {
                "No images found"
            } else {
                "No displayable images"
            });
            draw_centered(d, text, 30, viewport, Color::LIGHTGRAY);
        }
        SessionState::Showing | SessionState::Transitioning => {
            if let Some(text) = session.notice(now) {
                draw_banner(d, text, viewport, Color::new(200, 40, 40, 200));
            }
        }
    }

    if session.is_paused() {
        d.draw_text("PAUSED", 20, 20, 24, Color::new(255, 255, 255, 180));
    }
    if let Some(path) = input.pending_delete() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        draw_banner(d, &format!("Delete {name}? (Y/N)"), viewport, Color::new(0, 0, 0, 220));
    }
    if let Some(text) = alert {
        draw_banner(d, text, viewport, Color::new(200, 40, 40, 230));
    }
}

fn draw_caption(d: &mut RaylibDrawHandle, caption: &Caption, style: &CaptionStyle, viewport: Size) {
    if caption.opacity <= 0.0 {
        return;
    }
    let font_size = style.font_size.max(1) as i32;
    let text_w = measure_text(&caption.text, font_size);
    let pad_x = (font_size as f64 * 0.7) as i32;
    let pad_y = (font_size as f64 * 0.3) as i32;
    let box_w = text_w + pad_x * 2;
    let box_h = font_size + pad_y * 2;
    let at = style.position(Size::new(f64::from(box_w), f64::from(box_h)), viewport);
    let (x, y) = (at.x as i32, at.y as i32);
    let a = caption.opacity.clamp(0.0, 1.0);
    d.draw_rectangle(x, y, box_w, box_h, Color::new(0, 0, 0, (100.0 * a) as u8));
    let color = Color::new(255, 255, 255, alpha(a));
    d.draw_text(&caption.text, x + pad_x, y + pad_y, font_size, color);
    if style.font_bold {
        d.draw_text(&caption.text, x + pad_x + 1, y + pad_y, font_size, color);
    }
}

fn draw_centered(d: &mut RaylibDrawHandle, text: &str, size: i32, viewport: Size, color: Color) {
    let w = measure_text(text, size);
    let x = (viewport.width as i32 - w) / 2;
    let y = (viewport.height as i32 - size) / 2;
    d.draw_text(text, x, y, size, color);
}

fn draw_banner(d: &mut RaylibDrawHandle, text: &str, viewport: Size, background: Color) {
    let size = 22;
    let w = measure_text(text, size) + 40;
    let x = (viewport.width as i32 - w) / 2;
    let y = (viewport.height * 0.1) as i32;
    d.draw_rectangle(x, y, w, size + 20, background);
    d.draw_text(text, x + 20, y + 10, size, Color::WHITE);
}

/// Draws `text` and keeps it up until the window closes, used for fatal startup errors.
pub fn show_fatal(rl: &mut RaylibHandle, thread: &RaylibThread, text: &str) {
    warn!(%text, "fatal");
    while !rl.window_should_close() {
        let mut d = rl.begin_drawing(thread);
        d.clear_background(Color::BLACK);
        d.draw_text(text, 20, 20, 20, Color::RED);
    }
}
