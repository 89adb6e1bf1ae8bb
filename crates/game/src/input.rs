bitflags::bitflags! {
    /// The two directional controls of one paddle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PaddleButtons: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
    }
}

/// Up to two local players share one input source. Which paddle a
/// slot drives depends on the game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    Primary,
    Secondary,
}

/// A discrete key-down or key-up on one directional control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub slot: PlayerSlot,
    pub button: PaddleButtons,
    pub pressed: bool,
}

/// Input capture lives outside the core; anything that can deliver
/// discrete down/up events for two directional controls per local
/// player plugs in here.
pub trait InputSource {
    fn poll_events(&mut self) -> Vec<InputEvent>;
}
