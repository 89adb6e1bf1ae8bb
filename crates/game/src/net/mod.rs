pub mod endpoint;
pub mod ice;
pub mod protocol;
pub mod session;

pub use endpoint::{Endpoint, MAX_FRAME_SIZE};
pub use ice::{CandidateError, CandidateSelector, IceServer, fallback_servers};
pub use protocol::{BallHandoff, BallPosition, Frame, FrameError, StateFrame};
pub use session::{
    DEFAULT_PORT, PeerSession, SessionConfig, SessionError, SessionRole, SessionState,
    decode_session_id, encode_session_id,
};
