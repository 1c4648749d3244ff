/// Per-frame driver intent, from a human or from [`crate::ai::AiDriver`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlInput {
    /// `[-1, 1]`; positive drives forward, negative reverses.
    pub throttle: f32,
    /// `[-1, 1]`
    pub steering: f32,
    pub brake: bool,
    pub turbo: bool,
}

impl ControlInput {
    /// Clamp axes into range; non-finite axes become 0.
    pub fn sanitized(self) -> Self {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            throttle: axis(self.throttle),
            steering: axis(self.steering),
            ..self
        }
    }
}
