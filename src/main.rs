//! groundcam - an interactive look at how a UAV's downward camera
//! maps pixels to geographic coordinates.
//!
//! A rectangular ground patch models the camera footprint; dragging
//! its edges, the camera height or a sample object shows how frustum
//! geometry, field of view and geo-projection respond. An auto mode
//! closes the loop and drives the footprint toward target FOV angles.

mod cli;
mod control;
mod geo;
mod geometry;
mod hud;
mod input;
mod params;
mod rendering;
mod sim;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use cli::Args;
use hud::HudCanvas;
use input::{bindings, KeyStates};
use params::*;
use rendering::RenderSystem;
use sim::Simulation;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    hud: HudCanvas,

    // Simulation
    simulation: Simulation,
    keys: KeyStates,

    // Configuration
    render_config: RenderConfig,
    timing: TimingConfig,
    targets: FovTargets,
    title: String,

    // Time tracking
    start_time: Instant,
    last_frame: Instant,
}

impl App {
    fn new(args: &Args) -> Self {
        let sim_params = SimulationParams::default();
        let control_config = ControlConfig::default();
        let render_config = args.render_config();

        let simulation = Simulation::new(sim_params, control_config);
        let hud = HudCanvas::new(
            render_config.window_width,
            render_config.window_height,
            render_config.glyph_scale,
        );

        Self {
            window: None,
            render_system: None,
            hud,
            simulation,
            keys: KeyStates::new(),
            render_config,
            timing: control_config.timing,
            targets: control_config.targets,
            title: args.title.clone(),
            start_time: Instant::now(),
            last_frame: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(Arc::clone(&window))).unwrap();

        println!("\ngroundcam is running!");
        println!("Press ESC to quit\n");

        self.window = Some(window);
        self.render_system = Some(render_system);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(render_system) = &mut self.render_system {
                        render_system.resize(size.width, size.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.keys.press(code),
                ElementState::Released => self.keys.release(code),
            },
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    /// Run one paced simulation step and draw it
    fn render_frame(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        // Quit is observed at the start of a step
        if self.keys.held(bindings::QUIT) {
            event_loop.exit();
            return;
        }

        // Polling throttle: draw only when the target interval has
        // elapsed, otherwise just ask for another redraw
        let now = Instant::now();
        let dt_s = now.duration_since(self.last_frame).as_secs_f64();
        if dt_s < self.timing.min_frame_interval_s() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            return;
        }
        self.last_frame = now;

        let now_ms = self.start_time.elapsed().as_millis() as u64;
        let snapshot = self.simulation.step(&self.keys, now_ms, dt_s);

        let Some(ref render_system) = self.render_system else {
            return;
        };

        // The HUD canvas mirrors the physical surface size
        let (width, height) = render_system.window_size();
        if (self.hud.width(), self.hud.height()) != (width, height) {
            self.hud.resize(width, height);
        }

        let view_proj = rendering::observer_view_proj(&self.render_config);
        let scene = rendering::build_scene(
            &snapshot,
            view_proj,
            &self.render_config,
            render_system.window_size(),
        );
        hud::compose(
            &mut self.hud,
            &snapshot,
            view_proj,
            self.render_config.horizon_extent_m,
            self.targets,
        );

        if let Err(e) = render_system.render(&scene, view_proj, self.hud.pixels()) {
            eprintln!("Render error: {:?}", e);
        }
    }
}

fn main() {
    let args = Args::parse();

    println!("groundcam - downward-camera geometry simulator");
    println!("Initializing systems...\n");

    let mut app = App::new(&args);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);

    println!("\nExited main loop.");
}
