//! Scene viewer
//!
//! Opens a window, loads one scene file and runs it until the window is
//! closed or Escape is pressed.

mod args;

use std::process::ExitCode;

use clap::Parser;
use quantum_engine::config::Config;
use quantum_engine::foundation::logging;
use quantum_engine::{Engine, EngineConfig, EngineError};

use crate::args::ViewerArgs;

fn main() -> ExitCode {
    logging::init();
    let args = ViewerArgs::parse();

    let config = match &args.config {
        Some(path) => match EngineConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    let mut engine = Engine::new(config);
    if let Err(e) = engine.init_from_config() {
        log::error!("Failed to initialize engine: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&mut engine, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &mut Engine, args: &ViewerArgs) -> Result<(), EngineError> {
    let id = engine.load_scene_file(&args.scene)?;
    engine.load_scene(&id)?;
    engine.run()
}
