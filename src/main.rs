use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use candletree::hud::Hud;
use candletree::input::{Key, NamedKey};
use candletree::{winit_support, SceneConfig, Viewer};

/// Application state for the winit event loop
struct App<'a> {
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<'a>>,
    hud: Option<Hud>,
}

impl<'a> App<'a> {
    /// Initialize the window, viewer, and HUD
    fn initialize(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes().with_title("Candle Tree");

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        let viewer = pollster::block_on(Viewer::new(
            Arc::clone(&window),
            size.width,
            size.height,
            &SceneConfig::default(),
        ))
        .expect("Failed to build the scene");

        let (device, _queue) = viewer.wgpu_resources();
        let hud = Hud::new(&window, device, viewer.surface_format());

        window.request_redraw();

        self.window = Some(window);
        self.viewer = Some(viewer);
        self.hud = Some(hud);
    }
}

impl<'a> ApplicationHandler for App<'a> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Initialize on first resume
        if self.window.is_none() {
            self.initialize(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let viewer = self.viewer.as_mut().unwrap();
                let window = self.window.as_ref().unwrap();

                // Advance animation, then render the frame with the HUD
                viewer.update();
                viewer.render_with_hud(self.hud.as_mut().unwrap(), window);

                // Request next frame for continuous rendering
                window.request_redraw();
            }
            event => {
                let window = self.window.as_ref().unwrap();

                // The HUD gets first look; events it consumes stop here
                if self.hud.as_mut().unwrap().on_window_event(window, &event) {
                    return;
                }

                if let Some(app_event) = winit_support::convert_window_event(event) {
                    let viewer = self.viewer.as_mut().unwrap();
                    viewer.handle_event(&app_event);

                    // Check for exit on Escape key
                    if let candletree::event::Event::KeyboardInput {
                        event: key_event, ..
                    } = &app_event
                    {
                        if matches!(key_event.logical_key, Key::Named(NamedKey::Escape)) {
                            event_loop.exit();
                        }
                    }
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        // Convert and handle device events (e.g., mouse motion)
        if let Some(app_event) = winit_support::convert_device_event(event) {
            if let Some(viewer) = self.viewer.as_mut() {
                viewer.handle_event(&app_event);
            }
        }
    }
}

fn main() {
    // Initialize logging
    env_logger::init();

    // Create event loop
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    // Create application state
    let mut app = App {
        window: None,
        viewer: None,
        hud: None,
    };

    // Run the event loop
    event_loop.run_app(&mut app).expect("Event loop error");
}
