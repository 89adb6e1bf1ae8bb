mod keys;
mod tui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use volley::net::{CandidateSelector, PeerSession, SessionConfig};
use volley::{GameLoop, InputSource, PaddleButtons};

use keys::CrosstermInput;
use tui::SceneBuffer;

/// Bounds how long a connection attempt waits for candidate ranking
/// before settling for the fallback list.
const CANDIDATE_WAIT: Duration = Duration::from_secs(8);
/// The host sits in this window waiting for a peer to join.
const HOST_WAIT: Duration = Duration::from_secs(600);
const JOIN_WAIT: Duration = Duration::from_secs(15);

#[derive(Parser)]
#[command(name = "volley")]
#[command(about = "Peer-to-peer ball-and-paddle game")]
struct Args {
    /// Display name announced to the opponent.
    #[arg(short, long, default_value = "Player 1")]
    name: String,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Play against the computer.
    Solo,
    /// Two players on one keyboard: arrows on the right, W/S on the
    /// left.
    Local {
        #[arg(long, default_value = "Player 2")]
        name2: String,
    },
    /// Host a session and wait for a peer to join.
    Host {
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,

        #[arg(short, long, default_value_t = volley::net::DEFAULT_PORT)]
        port: u16,
    },
    /// Join a hosted session by its id.
    Join { session_id: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let game = match args.mode {
        Mode::Solo => GameLoop::solo(args.name),
        // The primary player (arrow keys) drives the right paddle.
        Mode::Local { name2 } => GameLoop::local_duel(name2, args.name),
        Mode::Host { bind, port } => {
            let session = host_session(&format!("{bind}:{port}"), args.name)?;
            GameLoop::remote(session)
        }
        Mode::Join { session_id } => {
            let session = join_session(&session_id, args.name)?;
            GameLoop::remote(session)
        }
    };

    run_with_tui(game)
}

fn host_session(bind_addr: &str, name: String) -> Result<PeerSession> {
    let mut selector = CandidateSelector::spawn();
    let config = SessionConfig {
        display_name: name,
        ice_servers: selector.wait(CANDIDATE_WAIT),
    };

    let mut session = PeerSession::host(bind_addr, config).context("could not host a session")?;
    println!("Session id: {}", session.session_id());
    println!("Waiting for a peer to join...");

    session
        .wait_until_open(HOST_WAIT)
        .context("no peer joined the session")?;
    Ok(session)
}

fn join_session(session_id: &str, name: String) -> Result<PeerSession> {
    let mut selector = CandidateSelector::spawn();
    let config = SessionConfig {
        display_name: name,
        ice_servers: selector.wait(CANDIDATE_WAIT),
    };

    let mut session =
        PeerSession::connect(session_id, config).context("could not reach the session")?;
    println!("Connecting to session {session_id}...");

    session
        .wait_until_open(JOIN_WAIT)
        .context("the host did not answer")?;
    Ok(session)
}

fn run_with_tui(mut game: GameLoop) -> Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut game, &mut terminal);

    game.close();
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    result
}

fn run_loop(
    game: &mut GameLoop,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    let mut input = CrosstermInput::new();
    let mut held = [PaddleButtons::empty(); 2];
    let mut scene = SceneBuffer::new();

    loop {
        let events = input.poll_events();
        if input.quit_requested() {
            return Ok(());
        }
        game.apply_input(&events, &mut held);

        if game.update() > 0 && game.should_draw() {
            game.render(&mut scene);
            terminal.draw(|frame| tui::render(frame, &scene))?;
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}
