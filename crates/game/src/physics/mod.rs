mod ball;
mod figure;
mod paddle;

pub use ball::Ball;
pub use figure::Figure;
pub use paddle::Paddle;

/// All dimensions and speeds are normalized to a `[0,1] x [0,1]` play
/// field, in units per tick at the reference rate of 60 ticks/s.
pub const BALL_SIZE: f64 = 0.01;
pub const BALL_SPEED_X: f64 = 0.015;
pub const BALL_SPEED_Y: f64 = 0.01;
pub const BALL_SPEED_RATE: f64 = 1.05;
pub const MAX_BALL_SPEED_FACTOR: f64 = 2.0;
pub const PADDLE_WIDTH: f64 = 0.02;
pub const PADDLE_HEIGHT: f64 = 0.2;
pub const PADDLE_STEP_SIZE: f64 = 0.025;

pub const TICK_RATE: u32 = 120;
pub const DRAW_EVERY_N_TICKS: u32 = 2;

/// Rescales a per-tick step so gameplay speed is independent of the
/// configured tick rate.
pub fn effective_step(step: f64) -> f64 {
    step * (60.0 / TICK_RATE as f64)
}
