use anyhow::Result;
use clap::Parser;
use winit::event_loop::EventLoop;

use code_studio::cli::CliArgs;
use code_studio::config::EditorConfig;

mod runtime;

use runtime::App;

fn main() -> Result<()> {
    code_studio::tracing::init();

    let args = CliArgs::parse();
    let startup = args.into_config(EditorConfig::load());
    tracing::info!(
        "Starting with language {} and theme {}",
        startup.language.display_name(),
        startup.theme.label()
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(800, 600, startup);

    event_loop.run_app(&mut app)?;

    Ok(())
}
