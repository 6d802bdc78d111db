//! Line-oriented command reader for `--console`.
//!
//! Runs on its own thread and drives the viewer through the same thread-safe
//! handle the window uses, so every command here goes through the
//! cross-thread enqueue path.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use renderer::{timestamped_file_name, HostHandle, Viewer};
use viewstate::{Hue, ViewTransform, MAX_ITERATIONS};

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

const HELP: &str = "\
commands:
  hue <fire|ice|ash|psychedelic>
  iterations <0-200>
  goto <x> <y> <scale>
  supersample <0.5-3.0>
  capture [path]
  state
  help
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Hue(Hue),
    Iterations(u32),
    Goto { x: f64, y: f64, scale: f64 },
    SuperSample(f64),
    Capture(Option<PathBuf>),
    State,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Parses one input line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("hue" | "theme", [name]) => {
            ConsoleCommand::Hue(name.parse::<Hue>().map_err(|err| err.to_string())?)
        }
        ("iterations" | "iter", [count]) => {
            let count: u32 = count
                .parse()
                .map_err(|_| format!("invalid iteration count '{count}'"))?;
            if count > MAX_ITERATIONS {
                return Err(format!("iterations must be at most {MAX_ITERATIONS}"));
            }
            ConsoleCommand::Iterations(count)
        }
        ("goto", [x, y, scale]) => ConsoleCommand::Goto {
            x: parse_number("x", x)?,
            y: parse_number("y", y)?,
            scale: parse_number("scale", scale)?,
        },
        ("supersample" | "ss", [factor]) => {
            ConsoleCommand::SuperSample(parse_number("factor", factor)?)
        }
        ("capture", []) => ConsoleCommand::Capture(None),
        ("capture", [path]) => ConsoleCommand::Capture(Some(PathBuf::from(*path))),
        ("state", []) => ConsoleCommand::State,
        ("help" | "?", []) => ConsoleCommand::Help,
        ("quit" | "exit", []) => ConsoleCommand::Quit,
        (other, _) => return Err(format!("unrecognised command '{other}'; try 'help'")),
    };
    Ok(Some(command))
}

fn parse_number(label: &str, value: &str) -> Result<f64, String> {
    let number: f64 = value
        .parse()
        .map_err(|_| format!("invalid {label} '{value}'"))?;
    if number.is_nan() {
        return Err(format!("{label} must be a number"));
    }
    Ok(number)
}

/// Applies a command to the viewer, writing any reply to `out`.
pub fn execute<W: Write>(
    command: ConsoleCommand,
    viewer: &Viewer,
    capture_dir: &Path,
    out: &mut W,
) -> io::Result<Outcome> {
    match command {
        ConsoleCommand::Hue(hue) => {
            viewer.set_active_hue(hue);
            viewer.request_render();
            writeln!(out, "hue {hue}")?;
        }
        ConsoleCommand::Iterations(count) => {
            viewer.set_iterations(count);
            viewer.request_render();
            writeln!(out, "iterations {}", viewer.iterations())?;
        }
        ConsoleCommand::Goto { x, y, scale } => {
            viewer.set_view(ViewTransform::new(x, y, scale));
            viewer.request_render();
            let view = viewer.view();
            writeln!(
                out,
                "at {} {} scale {}",
                view.position_x(),
                view.position_y(),
                view.scale()
            )?;
        }
        ConsoleCommand::SuperSample(factor) => match viewer.set_super_sampling(factor) {
            Ok(accepted) => writeln!(out, "supersample {accepted}")?,
            Err(err) => writeln!(out, "error: {err}")?,
        },
        ConsoleCommand::Capture(path) => {
            let path = path
                .unwrap_or_else(|| capture_dir.join(timestamped_file_name(chrono::Local::now())));
            let ticket = viewer.capture_frame(Some(path));
            match ticket.wait_timeout(CAPTURE_TIMEOUT) {
                Some(Ok(output)) => {
                    let location = output
                        .path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    writeln!(
                        out,
                        "captured {}x{} to {location}",
                        output.width, output.height
                    )?;
                }
                Some(Err(err)) => writeln!(out, "error: capture failed: {err}")?,
                None => writeln!(out, "error: no frame was rendered within {CAPTURE_TIMEOUT:?}")?,
            }
        }
        ConsoleCommand::State => {
            let view = viewer.view();
            let geometry = viewer.geometry();
            let (buffer_width, buffer_height) = geometry.render_buffer_size();
            writeln!(out, "positionX = {}", view.position_x())?;
            writeln!(out, "positionY = {}", view.position_y())?;
            writeln!(out, "scale = {}", view.scale())?;
            writeln!(out, "theme = {}", viewer.active_hue())?;
            writeln!(out, "iterations = {}", viewer.iterations())?;
            writeln!(out, "superSamplingFactor = {}", viewer.super_sampling())?;
            writeln!(out, "renderBuffer = {buffer_width}x{buffer_height}")?;
        }
        ConsoleCommand::Help => writeln!(out, "{HELP}")?,
        ConsoleCommand::Quit => return Ok(Outcome::Quit),
    }
    out.flush()?;
    Ok(Outcome::Continue)
}

/// Starts the console thread. It exits on `quit` or end of input.
pub fn spawn(
    viewer: Viewer,
    host: HostHandle,
    capture_dir: PathBuf,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("mandelgl-console".to_string())
        .spawn(move || console_loop(&viewer, &host, &capture_dir))
}

fn console_loop(viewer: &Viewer, host: &HostHandle, capture_dir: &Path) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    tracing::info!("console ready; type 'help' for commands");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read console input");
                break;
            }
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                if writeln!(stdout, "error: {message}").is_err() {
                    break;
                }
                continue;
            }
        };
        tracing::debug!(?command, "console command");
        match execute(command, viewer, capture_dir, &mut stdout) {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Quit) => {
                if !host.quit() {
                    tracing::debug!("window loop already gone");
                }
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, "console output failed");
                break;
            }
        }
    }
    tracing::debug!("console closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewstate::SavedView;

    fn run(viewer: &Viewer, line: &str) -> (Outcome, String) {
        let command = parse_command(line).unwrap().unwrap();
        let mut out = Vec::new();
        let outcome = execute(command, viewer, Path::new("."), &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("hue ICE").unwrap(),
            Some(ConsoleCommand::Hue(Hue::Ice))
        );
        assert_eq!(
            parse_command("  goto -0.75 0.1 4000 ").unwrap(),
            Some(ConsoleCommand::Goto {
                x: -0.75,
                y: 0.1,
                scale: 4000.0
            })
        );
        assert_eq!(
            parse_command("capture shots/a.png").unwrap(),
            Some(ConsoleCommand::Capture(Some(PathBuf::from("shots/a.png"))))
        );
        assert_eq!(parse_command("capture").unwrap(), Some(ConsoleCommand::Capture(None)));
        assert_eq!(parse_command("QUIT").unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("# note").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("hue plasma").is_err());
        assert!(parse_command("iterations 500").is_err());
        assert!(parse_command("goto 1 2").is_err());
        assert!(parse_command("goto 1 NaN 3").is_err());
        assert!(parse_command("zoom 2").is_err());
    }

    #[test]
    fn commands_update_the_viewer() {
        let viewer = Viewer::new(SavedView::default(), 50);

        let (outcome, reply) = run(&viewer, "hue ash");
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(viewer.active_hue(), Hue::Ash);
        assert_eq!(reply.trim(), "hue ASH");

        run(&viewer, "iterations 120");
        assert_eq!(viewer.iterations(), 120);

        run(&viewer, "goto 9 -0.5 10");
        assert_eq!(viewer.position_x(), 3.0);
        assert_eq!(viewer.position_y(), -0.5);
        assert_eq!(viewer.scale(), 75.0);

        let (_, reply) = run(&viewer, "supersample 4");
        assert!(reply.starts_with("error:"));
        assert_eq!(viewer.super_sampling(), 2.0);
        run(&viewer, "supersample 0.2");
        assert_eq!(viewer.super_sampling(), 0.5);
    }

    #[test]
    fn state_reports_current_values() {
        let viewer = Viewer::new(SavedView::default(), 64);
        let (_, reply) = run(&viewer, "state");
        assert!(reply.contains("theme = FIRE"));
        assert!(reply.contains("iterations = 64"));
        assert!(reply.contains("superSamplingFactor = 2"));
    }

    #[test]
    fn quit_stops_the_loop() {
        let viewer = Viewer::new(SavedView::default(), 50);
        let (outcome, reply) = run(&viewer, "quit");
        assert_eq!(outcome, Outcome::Quit);
        assert!(reply.is_empty());
    }
}
