//! Viewer window and input tracking with winit.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;
use winit::{
    event::{DeviceEvent, ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowBuilder},
};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width
    pub width: u32,
    /// Initial height
    pub height: u32,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "blockshade".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Owns the viewer window and the event loop that drives it.
pub struct WindowManager {
    window: Arc<Window>,
    event_loop: EventLoop<()>,
}

impl WindowManager {
    /// Create the window with the given configuration.
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;

        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height))
            .build(&event_loop)?;

        Ok(Self {
            window: Arc::new(window),
            event_loop,
        })
    }

    /// Shared handle to the window, for surface creation.
    pub fn window(&self) -> Arc<Window> {
        self.window.clone()
    }

    /// Run the event loop until the callback returns `false`.
    pub fn run<F>(self, mut callback: F) -> Result<()>
    where
        F: FnMut(Event<()>, &Window) -> bool + 'static,
    {
        let window = self.window;

        self.event_loop.run(move |event, elwt| {
            if !callback(event, &window) {
                elwt.exit();
            }
        })?;

        Ok(())
    }
}

/// Keyboard and mouse state accumulated between frames.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Keys currently held
    pub keys_pressed: HashSet<KeyCode>,
    /// Keys pressed since the last [`InputState::reset_frame`]
    pub keys_just_pressed: HashSet<KeyCode>,
    /// Raw mouse motion since the last frame
    pub mouse_delta: (f64, f64),
    /// Whether the cursor is grabbed for mouse look
    pub cursor_captured: bool,
}

impl InputState {
    /// Create an empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is held.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Whether `key` went down this frame.
    pub fn was_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_just_pressed.contains(&key)
    }

    /// Clear per-frame state.
    pub fn reset_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.keys_just_pressed.clear();
    }

    /// Handle a window event and update state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    self.handle_key(keycode, event.state);
                }
            }
            WindowEvent::Focused(false) => {
                // Held keys never see their release while unfocused.
                self.keys_pressed.clear();
            }
            _ => {}
        }
    }

    /// Record a key transition.
    pub fn handle_key(&mut self, keycode: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_pressed.insert(keycode) {
                    self.keys_just_pressed.insert(keycode);
                }
            }
            ElementState::Released => {
                self.keys_pressed.remove(&keycode);
            }
        }
    }

    /// Handle device-level events (raw mouse motion).
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_captured {
                self.mouse_delta.0 += delta.0;
                self.mouse_delta.1 += delta.1;
            }
        }
    }

    /// Grab or release the cursor for mouse look.
    pub fn set_cursor_capture(&mut self, window: &Window, capture: bool) {
        if capture {
            // Locked is unsupported on some platforms; fall back to Confined.
            let grab = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(err) = grab {
                warn!("Failed to capture cursor: {err}");
                self.cursor_captured = false;
                return;
            }
            window.set_cursor_visible(false);
            self.cursor_captured = true;
        } else {
            if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                warn!("Failed to release cursor grab: {err}");
            }
            window.set_cursor_visible(true);
            self.cursor_captured = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_is_reported_once() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.was_key_just_pressed(KeyCode::KeyW));

        input.reset_frame();
        // Key repeat delivers another Pressed without a release.
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.was_key_just_pressed(KeyCode::KeyW));

        input.handle_key(KeyCode::KeyW, ElementState::Released);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn mouse_motion_only_counts_while_captured() {
        let mut input = InputState::new();
        let motion = DeviceEvent::MouseMotion { delta: (3.0, -2.0) };

        input.handle_device_event(&motion);
        assert_eq!(input.mouse_delta, (0.0, 0.0));

        input.cursor_captured = true;
        input.handle_device_event(&motion);
        input.handle_device_event(&motion);
        assert_eq!(input.mouse_delta, (6.0, -4.0));

        input.reset_frame();
        assert_eq!(input.mouse_delta, (0.0, 0.0));
    }
}
