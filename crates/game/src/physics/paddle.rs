use glam::{DVec2, dvec2};

use super::figure::Figure;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub body: Figure,
}

impl Paddle {
    /// `x` is the fixed horizontal position of the paddle's side;
    /// `y_center` is the vertical center of the blade.
    pub fn new(x: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            body: Figure::new(
                dvec2(x, y_center - height / 2.0),
                dvec2(width, height),
                DVec2::ZERO,
            ),
        }
    }

    pub fn y(&self) -> f64 {
        self.body.pos.y
    }

    pub fn set_y(&mut self, y: f64) {
        self.body.pos.y = y;
    }

    pub fn set_speed(&mut self, speed_y: f64) {
        self.body.vel.y = speed_y;
    }

    /// Integrates and clamps so the paddle never leaves the play field.
    pub fn step(&mut self) {
        self.body.step();
        self.body.pos.y = self.body.pos.y.clamp(0.0, 1.0 - self.body.size.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{PADDLE_HEIGHT, PADDLE_WIDTH};

    #[test]
    fn paddle_stays_inside_field() {
        let mut paddle = Paddle::new(0.0, 0.5, PADDLE_WIDTH, PADDLE_HEIGHT);
        paddle.set_speed(-1.0);
        paddle.step();
        assert_eq!(paddle.y(), 0.0);

        paddle.set_speed(1.0);
        paddle.step();
        paddle.step();
        assert_eq!(paddle.y(), 1.0 - PADDLE_HEIGHT);
    }

    #[test]
    fn paddle_moves_by_its_speed() {
        let mut paddle = Paddle::new(0.0, 0.5, PADDLE_WIDTH, PADDLE_HEIGHT);
        paddle.set_speed(0.025);
        paddle.step();
        assert!((paddle.y() - (0.5 - PADDLE_HEIGHT / 2.0 + 0.025)).abs() < 1e-12);
    }
}
