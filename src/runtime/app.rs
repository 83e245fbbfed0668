use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use softbuffer::Context;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::ModifiersState;
use winit::window::Window;

use code_studio::cli::StartupConfig;
use code_studio::commands::Cmd;
use code_studio::keymap::{load_default_keymap, Keymap};
use code_studio::messages::{AppMsg, Msg, RunMsg, UiMsg};
use code_studio::model::AppModel;
use code_studio::run::{spawn_evaluation, write_and_open_preview, RunHandle};
use code_studio::update::update;
use code_studio::view::{click_msg, wheel_msg, Renderer};

use super::input::{handle_key, KeyMods};

/// Lines scrolled per wheel notch
const WHEEL_LINES: f32 = 3.0;
/// How long the loop sleeps between checks for worker messages
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Period of the cursor blink tick
const TICK_INTERVAL: Duration = Duration::from_millis(500);

pub struct App {
    model: AppModel,
    keymap: Keymap,
    renderer: Option<Renderer>,
    window: Option<Rc<Window>>,
    context: Option<Context<Rc<Window>>>,
    last_tick: Instant,
    modifiers: ModifiersState,
    mouse_position: Option<(f64, f64)>,
    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
    /// The evaluation worker, while a script runs
    run_handle: Option<RunHandle>,
    should_quit: bool,
}

impl App {
    pub fn new(window_width: u32, window_height: u32, startup_config: StartupConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();

        Self {
            model: AppModel::new(window_width, window_height, startup_config),
            keymap: load_default_keymap(),
            renderer: None,
            window: None,
            context: None,
            last_tick: Instant::now(),
            modifiers: ModifiersState::empty(),
            mouse_position: None,
            msg_tx,
            msg_rx,
            run_handle: None,
            should_quit: false,
        }
    }

    fn init_renderer(&mut self, window: Rc<Window>, context: &Context<Rc<Window>>) -> Result<()> {
        let renderer = Renderer::new(window, context, &self.model)?;
        self.model
            .set_font_metrics(renderer.line_height(), renderer.char_width());
        self.renderer = Some(renderer);
        Ok(())
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.model.window_title())
            .with_inner_size(LogicalSize::new(800, 600));

        let window = Rc::new(event_loop.create_window(window_attributes)?);
        let context = Context::new(Rc::clone(&window))
            .map_err(|e| anyhow!("Failed to create context: {}", e))?;

        let size = window.inner_size();
        self.model.resize(size.width, size.height);
        self.init_renderer(Rc::clone(&window), &context)?;
        self.window = Some(window);
        self.context = Some(context);
        Ok(())
    }

    /// Run a message through update and execute the resulting command
    fn dispatch(&mut self, msg: Msg) -> bool {
        // The worker is gone once it reports its result
        if matches!(msg, Msg::Run(RunMsg::Finished(_))) {
            if let Some(handle) = self.run_handle.take() {
                handle.join();
            }
        }

        match update(&mut self.model, msg) {
            Some(cmd) => {
                let needs_redraw = cmd.needs_redraw();
                self.process_cmd(cmd);
                needs_redraw
            }
            None => false,
        }
    }

    fn handle_event(&mut self, event: &WindowEvent) -> Option<Cmd> {
        match event {
            WindowEvent::Resized(size) => update(
                &mut self.model,
                Msg::App(AppMsg::Resize(size.width, size.height)),
            ),
            WindowEvent::ModifiersChanged(mods) => {
                self.modifiers = mods.state();
                None
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return None;
                }
                let mods = KeyMods {
                    ctrl: self.modifiers.control_key(),
                    shift: self.modifiers.shift_key(),
                    alt: self.modifiers.alt_key(),
                    logo: self.modifiers.super_key(),
                };
                handle_key(&mut self.model, &self.keymap, &event.logical_key, mods)
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Some((position.x, position.y));
                None
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.mouse_position?;
                let msg = click_msg(&self.model, &self.model.layout(), x, y)?;
                update(&mut self.model, msg)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = self.mouse_position?;
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, dy) => (-dy * WHEEL_LINES) as i32,
                    MouseScrollDelta::PixelDelta(pos) => {
                        (-pos.y / self.model.line_height as f64) as i32
                    }
                };
                let msg = wheel_msg(&self.model, &self.model.layout(), x, y, lines)?;
                update(&mut self.model, msg)
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    tracing::error!("Render error: {:#}", e);
                }
                None
            }
            _ => None,
        }
    }

    fn render(&mut self) -> Result<()> {
        if let Some(window) = &self.window {
            window.set_title(&self.model.window_title());
        }
        match &mut self.renderer {
            Some(renderer) => renderer.render(&self.model),
            None => Ok(()),
        }
    }

    fn tick(&mut self) -> Option<Cmd> {
        update(&mut self.model, Msg::Ui(UiMsg::BlinkCursor))
    }

    fn process_cmd(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::None | Cmd::Redraw => {}
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.process_cmd(cmd);
                }
            }

            Cmd::SaveFile { path, content } => {
                let tx = self.msg_tx.clone();
                std::thread::spawn(move || {
                    let result = std::fs::write(&path, content)
                        .map(|()| path)
                        .map_err(|e| e.to_string());
                    let _ = tx.send(Msg::App(AppMsg::SaveCompleted(result)));
                });
            }

            // =====================================================================
            // Native dialogs (using rfd)
            // =====================================================================
            Cmd::ShowSaveFileDialog { suggested_path } => {
                let tx = self.msg_tx.clone();
                std::thread::spawn(move || {
                    let mut dlg = rfd::FileDialog::new()
                        .set_title("Save File")
                        .add_filter("Python Files", &["py"])
                        .add_filter("HTML Files", &["html"])
                        .add_filter("All Files", &["*"]);
                    if let Some(ref path) = suggested_path {
                        if let Some(dir) = path.parent() {
                            dlg = dlg.set_directory(dir);
                        }
                        if let Some(name) = path.file_name() {
                            dlg = dlg.set_file_name(name.to_string_lossy());
                        }
                    }

                    let path = dlg.save_file();
                    let _ = tx.send(Msg::App(AppMsg::SaveDialogResult { path }));
                });
            }

            Cmd::ShowErrorDialog { title, message } => {
                std::thread::spawn(move || {
                    rfd::MessageDialog::new()
                        .set_level(rfd::MessageLevel::Error)
                        .set_title(title)
                        .set_description(message)
                        .set_buttons(rfd::MessageButtons::Ok)
                        .show();
                });
            }

            // =====================================================================
            // Run button
            // =====================================================================
            Cmd::OpenPreview { path, content } => {
                let tx = self.msg_tx.clone();
                std::thread::spawn(move || {
                    let result = write_and_open_preview(&path, &content);
                    let _ = tx.send(Msg::Run(RunMsg::PreviewFinished(result)));
                });
            }

            Cmd::StartEvaluation { source } => {
                match spawn_evaluation(source, self.msg_tx.clone()) {
                    Ok(handle) => self.run_handle = Some(handle),
                    Err(e) => {
                        tracing::error!("Failed to start evaluation thread: {}", e);
                        let _ = self
                            .msg_tx
                            .send(Msg::Run(RunMsg::Finished(Err(e.to_string()))));
                    }
                }
            }

            Cmd::ProvideInput(answer) => {
                if let Some(handle) = &self.run_handle {
                    handle.provide_input(answer);
                }
            }

            Cmd::CancelEvaluation => {
                if let Some(handle) = &self.run_handle {
                    handle.cancel();
                }
            }

            Cmd::Quit => {
                if let Some(handle) = &self.run_handle {
                    handle.cancel();
                }
                self.should_quit = true;
            }
        }
    }

    fn process_async_messages(&mut self) -> bool {
        let mut needs_redraw = false;
        while let Ok(msg) = self.msg_rx.try_recv() {
            needs_redraw |= self.dispatch(msg);
        }
        needs_redraw
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window(event_loop) {
                tracing::error!("Failed to create window: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let is_ours = self.window.as_ref().is_some_and(|w| w.id() == window_id);
        if !is_ours {
            return;
        }

        if matches!(event, WindowEvent::CloseRequested) {
            self.should_quit = true;
        } else if let Some(cmd) = self.handle_event(&event) {
            let needs_redraw = cmd.needs_redraw();
            self.process_cmd(cmd);
            if needs_redraw {
                self.request_redraw();
            }
        }

        if self.should_quit {
            if let Some(handle) = self.run_handle.take() {
                handle.cancel();
            }
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + FRAME_INTERVAL));

        if self.process_async_messages() {
            self.request_redraw();
        }

        let now = Instant::now();
        if now.duration_since(self.last_tick) > TICK_INTERVAL {
            self.last_tick = now;
            if self.tick().is_some() {
                self.request_redraw();
            }
        }
    }
}
