/// Labeled text slots on the play field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    LeftName,
    RightName,
    LeftScore,
    RightScore,
    Ping,
    SessionId,
}

/// Rendering lives outside the core. Draw calls are batched by the
/// implementation and made visible by `flush`, once per render frame.
/// All geometry is in the normalized `[0,1] x [0,1]` play field.
pub trait DrawSurface {
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn draw_middle_line(&mut self);
    fn set_text(&mut self, field: TextField, value: &str);
    fn flush(&mut self);
}
