mod bootstrap;
mod cli;
mod console;
mod paths;
mod run;
mod state;

use anyhow::Result;
use cli::{Command, StateAction};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::State(state_cmd)) => handle_state_command(state_cmd.action),
        Some(Command::Where) => run_where(),
        None => run::run(cli.run),
    }
}

fn handle_state_command(action: StateAction) -> Result<()> {
    let paths = AppPaths::discover()?;
    let state_file = paths.state_file();

    match action {
        StateAction::Show => {
            if !state_file.exists() {
                println!("No saved state at {}", state_file.display());
                return Ok(());
            }
            let saved = state::load(&state_file)?;
            println!("# {}", state_file.display());
            print!("{}", state::render(&saved)?);
            Ok(())
        }
        StateAction::Reset => {
            if state::reset(&state_file)? {
                println!("Removed {}", state_file.display());
            } else {
                println!("No saved state at {}", state_file.display());
            }
            Ok(())
        }
    }
}

fn run_where() -> Result<()> {
    let paths = AppPaths::discover()?;
    println!("Config directory: {}", paths.config_dir().display());
    println!("Data directory: {}", paths.data_dir().display());
    println!("Config file: {}", paths.config_file().display());
    println!("State file: {}", paths.state_file().display());
    println!("Captures: {}", paths.capture_dir().display());
    println!("Assets (user): {}", paths.user_assets_dir().display());
    Ok(())
}
