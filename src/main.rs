//! Flapic entry point
//!
//! Opens the controller transport, wires the reader thread and the keyboard
//! into the event mailbox, and runs the frame loop with either a text HUD or
//! JSON snapshot output.

use std::io::{self, Write, stdout};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, queue, style, terminal};

use flapic::consts::TELEMETRY_INTERVAL;
use flapic::protocol::normalize_key;
use flapic::sim::MENU_OPTIONS;
use flapic::transport::{
    Mailbox, MailboxSender, ReaderConfig, ReaderExit, StopFlag, TransportConfig, TransportError,
    open_transport, spawn_reader,
};
use flapic::{
    Cli, FrameScheduler, GameSession, InputDevice, KeyBinding, SessionState, Settings, Snapshot,
    TelemetryEmitter,
};

type ReaderHandle = JoinHandle<Result<ReaderExit, TransportError>>;

fn main() {
    env_logger::init();

    let settings = match Settings::from_cli(Cli::parse()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("flapic: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(settings) {
        log::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

fn run(settings: Settings) -> io::Result<()> {
    let seed = settings.seed.unwrap_or_else(rand::random);
    log::info!("Flapic starting (seed {})", seed);

    let mut session = GameSession::new(seed);
    session.test_mode = settings.test_mode;

    let (tx, mailbox) = Mailbox::new(settings.mailbox_capacity);
    let stop = StopFlag::new();
    let reader_config = ReaderConfig {
        chunk_size: settings.read_chunk,
    };

    let transport_config = TransportConfig {
        baud_rate: settings.baud_rate,
        read_timeout: Duration::from_millis(settings.read_timeout_ms),
    };

    let mut transport_reader: Option<ReaderHandle> = None;
    let writer = match settings.port.as_deref() {
        Some(address) => match open_transport(address, &transport_config) {
            Ok((reader, writer)) => {
                transport_reader = Some(spawn_reader(
                    reader,
                    tx.clone(),
                    stop.clone(),
                    reader_config,
                )?);
                log::info!("Transport open: {}", address);
                Some(writer)
            }
            Err(e) => {
                log::warn!("{}; continuing with keyboard only", e);
                None
            }
        },
        None => {
            log::info!("No transport configured, keyboard only");
            None
        }
    };

    let telemetry = TelemetryEmitter::new(writer);
    let mut scheduler = FrameScheduler::new(session, mailbox, telemetry, stop.clone())
        .with_frame_rate(settings.frame_rate);

    let result = if settings.headless {
        // Protocol tokens typed or piped on stdin count as controller input.
        // Stdin has no read timeout, so that reader is left to exit with the
        // process.
        let _stdin_reader = spawn_reader(io::stdin(), tx, stop.clone(), reader_config)?;
        run_headless(&mut scheduler)
    } else {
        run_terminal(&mut scheduler, tx, stop.clone())
    };

    stop.stop();
    // Transport reads time out, so the reader sees the flag and drops the
    // port on its way out
    if let Some(handle) = transport_reader {
        match handle.join() {
            Ok(Ok(exit)) => log::debug!("Transport reader joined: {:?}", exit),
            Ok(Err(e)) => log::debug!("Transport reader ended with: {}", e),
            Err(_) => log::error!("Transport reader panicked"),
        }
    }
    result
}

/// Print one JSON snapshot per telemetry window
fn run_headless(scheduler: &mut FrameScheduler) -> io::Result<()> {
    let mut out = stdout();
    let mut last_print: Option<f64> = None;
    let mut failure: Option<io::Error> = None;
    let stop = scheduler.stop_flag();

    scheduler.run(|snapshot| {
        let due = last_print
            .is_none_or(|t| snapshot.clock - t >= f64::from(TELEMETRY_INTERVAL));
        if !due {
            return;
        }
        last_print = Some(snapshot.clock);
        let written = serde_json::to_string(snapshot)
            .map_err(io::Error::other)
            .and_then(|line| writeln!(out, "{}", line));
        if let Err(e) = written {
            failure = Some(e);
            stop.stop();
        }
    });

    failure.map_or(Ok(()), Err)
}

/// Raw-mode terminal with a keyboard thread and a text HUD
fn run_terminal(
    scheduler: &mut FrameScheduler,
    tx: MailboxSender,
    stop: StopFlag,
) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;

    let cleanup = |out: &mut io::Stdout| -> io::Result<()> {
        execute!(out, terminal::LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()
    };

    let keyboard = match spawn_keyboard(tx, stop.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            cleanup(&mut out)?;
            return Err(e);
        }
    };

    let mut failure: Option<io::Error> = None;
    scheduler.run(|snapshot| {
        if let Err(e) = draw_hud(&mut out, snapshot) {
            failure = Some(e);
            stop.stop();
        }
    });

    stop.stop();
    let keyboard_result = keyboard
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("keyboard thread panicked")));
    cleanup(&mut out)?;

    match failure {
        Some(e) => Err(e),
        None => keyboard_result,
    }
}

/// Translate key presses into events until stopped
fn spawn_keyboard(tx: MailboxSender, stop: StopFlag) -> io::Result<JoinHandle<io::Result<()>>> {
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            while !stop.is_stopped() {
                if !event::poll(Duration::from_millis(50))? {
                    continue;
                }
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                let binding = match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        stop.stop();
                        break;
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        stop.stop();
                        break;
                    }
                    KeyCode::Char(' ') => KeyBinding::Space,
                    KeyCode::Up => KeyBinding::Up,
                    KeyCode::Down => KeyBinding::Down,
                    KeyCode::Enter => KeyBinding::Enter,
                    KeyCode::Left => KeyBinding::Left,
                    KeyCode::Right => KeyBinding::Right,
                    KeyCode::Char('t') => KeyBinding::TestMode,
                    _ => continue,
                };
                if tx.send(normalize_key(binding)).is_err() {
                    break;
                }
            }
            Ok(())
        })
}

fn draw_hud(out: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
    let mut lines: Vec<String> = Vec::new();
    lines.push("FLAPIC-BIRD".to_string());
    lines.push(String::new());

    match snapshot.state {
        SessionState::Menu if snapshot.menu.in_device_submenu => {
            lines.push("Select input device:".to_string());
            for (i, device) in InputDevice::ALL.iter().enumerate() {
                let marker = if i == snapshot.menu.device_option_index { '>' } else { ' ' };
                lines.push(format!(" {} {}", marker, device.label()));
            }
        }
        SessionState::Menu => {
            for (i, option) in MENU_OPTIONS.iter().enumerate() {
                let marker = if i == snapshot.menu.option_index { '>' } else { ' ' };
                lines.push(format!(" {} {}", marker, option));
            }
            if snapshot.menu.show_instructions {
                lines.push(String::new());
                lines.push("Space/BTN flaps (push button mode).".to_string());
                lines.push("Sensors steer the bird; Left/Right nudge them.".to_string());
                lines.push("Up/Down move, Enter selects, t test mode, q quits.".to_string());
            }
        }
        SessionState::Play => {
            lines.push(format!(
                "bird y {:6.1}  vy {:7.1}  tilt {:5.1}",
                snapshot.bird.y, snapshot.bird.vy, snapshot.bird.angle
            ));
            let next = snapshot.pipes.iter().find(|p| !p.scored);
            if let Some(pipe) = next {
                lines.push(format!(
                    "next pipe x {:6.1}  gap {:5.1}..{:5.1}",
                    pipe.x,
                    pipe.gap_top,
                    pipe.gap_bottom()
                ));
            }
        }
        SessionState::GameOver => {
            lines.push("GAME OVER".to_string());
            lines.push("Press start to return to the menu".to_string());
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "score {}  best {}",
        snapshot.score, snapshot.best_score
    ));
    let reading = snapshot
        .reading
        .map_or_else(String::new, |value| format!(" = {}", value));
    lines.push(format!("device {}{}", snapshot.device.label(), reading));
    if snapshot.test_mode {
        lines.push("TEST MODE".to_string());
    }

    queue!(out, cursor::MoveTo(0, 0), terminal::Clear(terminal::ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        queue!(out, cursor::MoveTo(0, row as u16), style::Print(line))?;
    }
    out.flush()
}
