use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use anyhow::Context;
use citeline_core::{update, AppState, Msg};
use citeline_logging::{citeline_debug, citeline_info};

use super::config::{apply_env, config_path, load_config, BASE_URL_ENV};
use super::effects::EffectRunner;
use super::logging;
use super::ui::commands::{parse_input, Input, HELP};
use super::ui::constants::{PROMPT, TICK_INTERVAL};
use super::ui::render::Renderer;

enum Inbound {
    Msg(Msg),
    Quit,
}

pub fn run_app(explicit_config: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path(explicit_config);
    let config = apply_env(load_config(&path), std::env::var(BASE_URL_ENV).ok());
    logging::initialize(config.log_destination);
    citeline_info!("citeline starting, backend {}", config.base_url);

    let runner = EffectRunner::new(config.client_settings())
        .with_context(|| format!("cannot use backend {}", config.base_url))?;
    let conversation_id = uuid::Uuid::new_v4().to_string();
    citeline_debug!("conversation {conversation_id}");
    let state =
        AppState::with_settings(config.session_settings()).with_conversation_id(conversation_id);
    let mut session = Session::new(state, runner);

    let (input_tx, input_rx) = mpsc::channel::<Inbound>();
    thread::spawn(move || read_stdin(input_tx));

    println!("{HELP}\n");
    session.dispatch(Msg::DocumentsRefreshRequested);
    session.render()?;

    loop {
        match input_rx.recv_timeout(TICK_INTERVAL) {
            Ok(Inbound::Msg(msg)) => session.dispatch(msg),
            Ok(Inbound::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => session.dispatch(Msg::Tick),
        }
        for msg in session.runner.poll() {
            session.dispatch(msg);
        }
        session.render()?;
    }

    citeline_info!("citeline exiting");
    Ok(())
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
}

impl Session {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self {
            state,
            runner,
            renderer: Renderer::new(),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if !effects.is_empty() {
            citeline_debug!("running {} effects", effects.len());
            self.runner.run(effects);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        if !self.state.consume_dirty() {
            return Ok(());
        }
        let frame = self.renderer.frame(&self.state.view());
        if frame.is_empty() {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        write!(stdout, "\r{frame}")?;
        if !self.state.chat().is_loading() {
            write!(stdout, "{PROMPT}")?;
        }
        stdout.flush()
    }
}

fn read_stdin(tx: mpsc::Sender<Inbound>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let inbound = match parse_input(&line) {
            Input::Msg(msg) => Inbound::Msg(msg),
            Input::Quit => Inbound::Quit,
            Input::Help => {
                println!("{HELP}");
                continue;
            }
            Input::Invalid(reason) => {
                println!("{reason}");
                continue;
            }
            Input::Empty => continue,
        };
        if tx.send(inbound).is_err() {
            return;
        }
    }
    let _ = tx.send(Inbound::Quit);
}
