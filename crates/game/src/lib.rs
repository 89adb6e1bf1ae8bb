pub mod court;
pub mod game_loop;
pub mod input;
pub mod net;
pub mod physics;
pub mod surface;
pub mod sync;

pub use court::{MatchState, Side};
pub use game_loop::{GameLoop, GameMode};
pub use input::{InputEvent, InputSource, PaddleButtons, PlayerSlot};
pub use net::{
    BallHandoff, BallPosition, CandidateError, CandidateSelector, DEFAULT_PORT, Endpoint, Frame,
    FrameError, IceServer, MAX_FRAME_SIZE, PeerSession, SessionConfig, SessionError, SessionRole,
    SessionState, StateFrame, decode_session_id, encode_session_id, fallback_servers,
};
pub use physics::{
    BALL_SIZE, BALL_SPEED_RATE, BALL_SPEED_X, BALL_SPEED_Y, Ball, DRAW_EVERY_N_TICKS, Figure,
    MAX_BALL_SPEED_FACTOR, PADDLE_HEIGHT, PADDLE_STEP_SIZE, PADDLE_WIDTH, Paddle, TICK_RATE,
    effective_step,
};
pub use surface::{DrawSurface, TextField};
pub use sync::{FixedTimestep, HandoffSync, Ownership};
