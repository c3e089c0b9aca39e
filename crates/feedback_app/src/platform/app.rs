use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use feedback_core::{update, AppState, Msg};
use feedback_engine::EngineHandle;

use super::config;
use super::effects::EffectRunner;
use super::ui::input::{parse_command, Command, HELP};
use super::ui::render;

/// How long the foreground waits for console input before pumping engine events.
const PUMP_INTERVAL: Duration = Duration::from_millis(75);

pub fn run_app() -> anyhow::Result<()> {
    let config_path = config::default_path();
    let (app_config, load_error) = match config::load(&config_path) {
        Ok(app_config) => (app_config, None),
        Err(err) => (config::AppConfig::default(), Some(err)),
    };

    engine_logging::initialize(
        app_config.log.target.into(),
        app_config.log.level.into(),
        &app_config.log.file,
    );
    match load_error {
        Some(err) => engine_warn!("Using default settings, {:?} unusable: {}", config_path, err),
        None if !config_path.exists() => {
            if let Err(err) = config::save(&config_path, &app_config) {
                engine_warn!("Failed to write default settings to {:?}: {}", config_path, err);
            }
        }
        None => engine_info!("Loaded settings from {:?}", config_path),
    }

    let engine =
        EngineHandle::new(&app_config.engine_config()).context("failed to start the engine")?;
    let mut app = App::new(EffectRunner::new(engine));

    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to start the console reader")?;

    println!("{HELP}");
    app.print_status();

    loop {
        match line_rx.recv_timeout(PUMP_INTERVAL) {
            Ok(line) => {
                if !app.handle_line(&line) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                engine_info!("Console input closed");
                break;
            }
        }
        app.pump();
    }

    app.shutdown();
    Ok(())
}

/// The foreground context: owns the state machine and the engine, and is the
/// only place either is touched.
struct App {
    state: AppState,
    runner: EffectRunner,
    last_status: String,
}

impl App {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::default(),
            runner,
            last_status: String::new(),
        }
    }

    /// Returns `false` once the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        match parse_command(line) {
            Ok(None) => {}
            Ok(Some(Command::Msg(msg))) => self.dispatch(msg),
            Ok(Some(Command::Pick(rows))) => {
                let view = self.state.view();
                let mut picked = Vec::new();
                for row in rows {
                    match view.picklist.get(row - 1) {
                        Some(item) => picked.push(item.id.clone()),
                        None => println!("no picklist row {row}"),
                    }
                }
                self.dispatch(Msg::ItemsPicked(picked));
            }
            Ok(Some(Command::Show)) => {
                for line in render::render(&self.state.view()) {
                    println!("{line}");
                }
            }
            Ok(Some(Command::Help)) => println!("{HELP}"),
            Ok(Some(Command::Quit)) => return false,
            Err(err) => println!("{err}"),
        }
        true
    }

    fn pump(&mut self) {
        for msg in self.runner.pump() {
            self.dispatch(msg);
        }
    }

    /// Runs `msg` and every message its effects produce, then renders if dirty.
    fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            inbox.extend(self.runner.run(effects));
        }
        if self.state.consume_dirty() {
            self.print_status();
        }
    }

    fn print_status(&mut self) {
        let line = render::status_line(&self.state.view());
        if line != self.last_status {
            println!("{line}");
            self.last_status = line;
        }
    }

    fn shutdown(self) {
        self.runner.shutdown();
    }
}
