//! Input handling.
//!
//! Actual key capture, pointer lock and the on-screen joystick live in the
//! windowing layer; this module only models their output. Keyboard axes are
//! discrete, the joystick is analog and overrides a keyboard axis whenever
//! it is nonzero, and the look orientation is a separate controller that the
//! kinematic integrator never writes to.

/// Pointer-capture sensitivity in radians per pixel of delta.
const POINTER_SENSITIVITY: f32 = 0.002;
/// Joystick look rate in radians per second at full deflection.
const JOYSTICK_LOOK_SPEED: f32 = 2.0;

/// Movement input sampled for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Pending jump impulse; consumed by the integrator on ground contact.
    pub jump: bool,
    /// Analog move vector `(x, y)`; each axis overrides the keyboard
    /// equivalent when nonzero.
    pub joystick_move: (f32, f32),
}

impl InputState {
    /// Combined `(x, z)` direction, normalized when nonzero.
    pub fn direction(&self) -> (f32, f32) {
        let mut z = (self.forward as i8 - self.backward as i8) as f32;
        let mut x = (self.right as i8 - self.left as i8) as f32;

        if self.joystick_move.1.abs() > 0.0 {
            z = self.joystick_move.1;
        }
        if self.joystick_move.0.abs() > 0.0 {
            x = self.joystick_move.0;
        }

        let len = (x * x + z * z).sqrt();
        if len > 0.0 {
            (x / len, z / len)
        } else {
            (0.0, 0.0)
        }
    }
}

/// Viewpoint orientation, decoupled from the kinematic integrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookController {
    /// Yaw in radians.
    pub yaw: f32,
    /// Pitch in radians, clamped to a half turn.
    pub pitch: f32,
}

impl LookController {
    /// Applies a pointer-capture delta in pixels.
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * POINTER_SENSITIVITY;
        self.pitch -= dy * POINTER_SENSITIVITY;
        self.clamp_pitch();
    }

    /// Applies a look-joystick vector as an angular rate over `dt`.
    pub fn apply_joystick(&mut self, x: f32, y: f32, dt: f32) {
        if x.abs() > 0.0 || y.abs() > 0.0 {
            self.yaw -= x * JOYSTICK_LOOK_SPEED * dt;
            self.pitch += y * JOYSTICK_LOOK_SPEED * dt;
            self.clamp_pitch();
        }
    }

    fn clamp_pitch(&mut self) {
        self.pitch = self
            .pitch
            .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn keyboard_axes_combine_and_normalize() {
        let input = InputState {
            forward: true,
            right: true,
            ..InputState::default()
        };
        let (x, z) = input.direction();
        let inv_sqrt2 = 1.0 / 2.0f32.sqrt();
        assert!((x - inv_sqrt2).abs() < 1e-5);
        assert!((z - inv_sqrt2).abs() < 1e-5);
    }

    #[test]
    fn opposed_keys_cancel() {
        let input = InputState {
            forward: true,
            backward: true,
            ..InputState::default()
        };
        assert_eq!(input.direction(), (0.0, 0.0));
    }

    #[test]
    fn joystick_overrides_keyboard_per_axis() {
        let input = InputState {
            forward: true,
            joystick_move: (0.0, -0.5),
            ..InputState::default()
        };
        // Keyboard says forward, the stick says backward: the stick wins on
        // its axis; x stays keyboard-driven (zero here).
        let (x, z) = input.direction();
        assert_eq!(x, 0.0);
        assert!((z - -1.0).abs() < 1e-5);
    }

    #[test]
    fn joystick_look_clamps_pitch() {
        let mut look = LookController::default();
        for _ in 0..100 {
            look.apply_joystick(0.0, 1.0, 0.1);
        }
        assert_eq!(look.pitch, FRAC_PI_2);

        look.apply_pointer_delta(0.0, 1.0e6);
        assert_eq!(look.pitch, -FRAC_PI_2);
    }

    #[test]
    fn idle_joystick_leaves_look_untouched() {
        let mut look = LookController {
            yaw: 1.0,
            pitch: 0.5,
        };
        look.apply_joystick(0.0, 0.0, 0.1);
        assert_eq!(look.yaw, 1.0);
        assert_eq!(look.pitch, 0.5);
    }
}
