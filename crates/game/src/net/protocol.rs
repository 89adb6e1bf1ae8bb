use serde::{Deserialize, Serialize};

pub const HANDSHAKE_PREFIX: &str = "[HANDSHAKE] ";
pub const BOUNCE_PREFIX: &str = "[BOUNCE] ";

/// Ball position as carried by the periodic state frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallPosition {
    pub x: f64,
    pub y: f64,
}

/// Full ball state carried by the one-shot handoff frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallHandoff {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "speedX")]
    pub speed_x: f64,
    #[serde(rename = "speedY")]
    pub speed_y: f64,
}

/// The per-tick broadcast.
///
/// `score` is the sender's view of the *receiver's* score; a receiver
/// seeing a value different from its own concludes it has just scored.
/// `timestamp` is sender-local milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateFrame {
    #[serde(rename = "opponentPaddleY")]
    pub opponent_paddle_y: f64,
    pub ball: BallPosition,
    pub score: u32,
    pub timestamp: u64,
}

/// Every message on the data channel is one of these three text
/// frames. Anything else is a protocol violation.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Handshake(String),
    Bounce(BallHandoff),
    State(StateFrame),
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame encoding failed: {0}")]
    Encode(serde_json::Error),
    #[error("unrecognized frame: {0}")]
    Decode(serde_json::Error),
}

impl Frame {
    pub fn encode(&self) -> Result<String, FrameError> {
        match self {
            Frame::Handshake(name) => Ok(format!("{HANDSHAKE_PREFIX}{name}")),
            Frame::Bounce(handoff) => {
                let json = serde_json::to_string(handoff).map_err(FrameError::Encode)?;
                Ok(format!("{BOUNCE_PREFIX}{json}"))
            }
            Frame::State(state) => serde_json::to_string(state).map_err(FrameError::Encode),
        }
    }

    pub fn decode(text: &str) -> Result<Frame, FrameError> {
        if let Some(name) = text.strip_prefix(HANDSHAKE_PREFIX) {
            return Ok(Frame::Handshake(name.to_string()));
        }
        if let Some(json) = text.strip_prefix(BOUNCE_PREFIX) {
            let handoff = serde_json::from_str(json).map_err(FrameError::Decode)?;
            return Ok(Frame::Bounce(handoff));
        }
        let state = serde_json::from_str(text).map_err(FrameError::Decode)?;
        Ok(Frame::State(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_frame_round_trip_is_bit_exact() {
        let frame = Frame::State(StateFrame {
            opponent_paddle_y: 0.4,
            ball: BallPosition { x: 0.123456789, y: 0.5 },
            score: 7,
            timestamp: 1_700_000_000_123,
        });

        let encoded = frame.encode().unwrap();
        let decoded = Frame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn bounce_round_trip_preserves_speeds() {
        let frame = Frame::Bounce(BallHandoff {
            x: 0.9,
            y: 0.5,
            speed_x: 0.02,
            speed_y: 0.01,
        });

        let encoded = frame.encode().unwrap();
        assert!(encoded.starts_with(BOUNCE_PREFIX));
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn handshake_keeps_the_raw_name() {
        let frame = Frame::Handshake("Ada Lovelace".to_string());
        let encoded = frame.encode().unwrap();
        assert_eq!(encoded, "[HANDSHAKE] Ada Lovelace");
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn wire_shapes_match_the_original_field_names() {
        let encoded = Frame::State(StateFrame {
            opponent_paddle_y: 0.25,
            ball: BallPosition { x: 0.5, y: 0.5 },
            score: 0,
            timestamp: 42,
        })
        .encode()
        .unwrap();
        assert!(encoded.contains("\"opponentPaddleY\""));
        assert!(encoded.contains("\"timestamp\""));

        let encoded = Frame::Bounce(BallHandoff {
            x: 0.0,
            y: 0.0,
            speed_x: 0.1,
            speed_y: 0.2,
        })
        .encode()
        .unwrap();
        assert!(encoded.contains("\"speedX\""));
        assert!(encoded.contains("\"speedY\""));
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(Frame::decode("").is_err());
        assert!(Frame::decode("{\"opponentPaddleY\":0.4,\"ball\":{\"x\":0.5").is_err());
        assert!(Frame::decode("[BOUNCE] {not json}").is_err());
        assert!(Frame::decode("hello there").is_err());
    }
}
