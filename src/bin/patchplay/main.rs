//! Opens a window filled with the background colour and plays `test.pd` through the default output for ten
//! seconds. Closing the window ends playback early.
//!
//! Always exits with status 0; failures are reported on the console only.

mod backdrop;

use std::sync::Arc;
use std::thread::JoinHandle;

use patchplay::prelude::*;
use patchplay::Error;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use backdrop::Backdrop;

/// Sent from the session thread when playback has fully shut down.
#[derive(Debug)]
enum SessionEvent {
    Finished,
}

struct App {
    config: PlayerConfig,
    proxy: EventLoopProxy<SessionEvent>,
    window: Option<Arc<Window>>,
    backdrop: Option<Backdrop>,
    stop: Option<StopHandle>,
    session: Option<JoinHandle<()>>,
}

impl App {
    fn new(config: PlayerConfig, proxy: EventLoopProxy<SessionEvent>) -> Self {
        Self {
            config,
            proxy,
            window: None,
            backdrop: None,
            stop: None,
            session: None,
        }
    }

    fn spawn_session(&mut self) {
        let (stop, signal) = stop_channel();
        let config = self.config.clone();
        let proxy = self.proxy.clone();

        // The CPAL stream is not `Send`, so the player is built on the
        // thread that keeps it.
        let spawned = std::thread::Builder::new()
            .name("patchplay-session".into())
            .spawn(move || {
                let outcome = PatchPlayerBuilder::new()
                    .config(config)
                    .build(LibPdEngine::new(), CpalHost::new())
                    .map(|player| Session::new(player).run(&signal));

                match outcome {
                    Ok(outcome) if outcome.is_success() => info!(?outcome, "session finished"),
                    Ok(outcome) => error!(?outcome, "session failed"),
                    Err(e) => error!("could not build player: {e}"),
                }

                let _ = proxy.send_event(SessionEvent::Finished);
            });

        match spawned {
            Ok(handle) => {
                self.stop = Some(stop);
                self.session = Some(handle);
            }
            Err(e) => error!("could not start session thread: {e}"),
        }
    }

    /// A window that cannot be painted still plays audio.
    fn paint(&mut self) {
        if let Some(backdrop) = &mut self.backdrop {
            if let Err(e) = backdrop.paint() {
                warn!("could not paint window: {e}");
            }
        }
    }

    fn join_session(&mut self) {
        if let Some(handle) = self.session.take() {
            if handle.join().is_err() {
                error!("session thread panicked");
            }
        }
    }
}

impl ApplicationHandler<SessionEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("{}", Error::Window(e.to_string()));
                event_loop.exit();
                return;
            }
        };

        self.backdrop = match Backdrop::new(window.clone(), self.config.window.background) {
            Ok(backdrop) => Some(backdrop),
            Err(e) => {
                warn!("window will stay unpainted: {e}");
                None
            }
        };
        self.window = Some(window);
        self.paint();
        self.spawn_session();

        if self.session.is_none() {
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => match &self.stop {
                // Exit once the session reports it has shut down.
                Some(stop) => stop.stop(),
                None => event_loop.exit(),
            },
            WindowEvent::Resized(_) => {
                if let Some(backdrop) = &mut self.backdrop {
                    backdrop.resize();
                }
                self.paint();
            }
            WindowEvent::RedrawRequested => self.paint(),
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: SessionEvent) {
        match event {
            SessionEvent::Finished => {
                self.join_session();
                self.backdrop = None;
                self.window = None;
                event_loop.exit();
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let event_loop = match EventLoop::<SessionEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("{}", Error::Window(e.to_string()));
            return;
        }
    };

    let mut app = App::new(PlayerConfig::default(), event_loop.create_proxy());
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("event loop: {e}");
    }

    // Covers an event loop that ended before the session reported back.
    if let Some(stop) = &app.stop {
        stop.stop();
    }
    app.join_session();
}
