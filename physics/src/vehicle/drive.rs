use super::input::ControlInput;
use crate::config::VehicleConfig;

/// Per-wheel engine force and brake for one update. Applied to all four
/// wheels (AWD).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriveCommand {
    pub engine_force: f32,
    pub brake: f32,
}

/// Map driver input to wheel forces.
///
/// Braking suppresses the engine. Otherwise the engine pushes with
/// `-throttle * engine_force` (times the turbo multiplier), but only below the
/// speed cap or while reversing.
pub fn drive_command(input: &ControlInput, speed_mps: f32, cfg: &VehicleConfig) -> DriveCommand {
    if input.brake {
        return DriveCommand {
            engine_force: 0.0,
            brake: cfg.brake_force,
        };
    }

    let mut engine_force = -input.throttle * cfg.engine_force;
    if input.turbo {
        engine_force *= cfg.turbo_multiplier;
    }

    let below_cap = speed_mps < cfg.max_speed_mps();
    if !(below_cap || input.throttle < 0.0) {
        engine_force = 0.0;
    }

    DriveCommand {
        engine_force,
        brake: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(t: f32) -> ControlInput {
        ControlInput {
            throttle: t,
            ..ControlInput::default()
        }
    }

    #[test]
    fn brake_overrides_engine_on_all_wheels() {
        let cfg = VehicleConfig::default();
        let input = ControlInput {
            throttle: 1.0,
            brake: true,
            turbo: true,
            ..ControlInput::default()
        };
        let cmd = drive_command(&input, 0.0, &cfg);
        assert_eq!(cmd.engine_force, 0.0);
        assert_eq!(cmd.brake, cfg.brake_force);
    }

    #[test]
    fn forward_force_is_cut_at_speed_cap() {
        let cfg = VehicleConfig::default();
        let cap = cfg.max_speed_mps();

        assert_eq!(drive_command(&throttle(1.0), cap * 0.5, &cfg).engine_force, -1400.0);
        for speed in [cap, cap + 0.01, cap * 3.0] {
            assert_eq!(drive_command(&throttle(1.0), speed, &cfg).engine_force, 0.0);
            assert_eq!(drive_command(&throttle(0.0), speed, &cfg).engine_force, 0.0);
        }
    }

    #[test]
    fn reverse_is_never_capped() {
        let cfg = VehicleConfig::default();
        for speed in [0.0, cfg.max_speed_mps(), 100.0] {
            let cmd = drive_command(&throttle(-0.5), speed, &cfg);
            assert_eq!(cmd.engine_force, 700.0);
            assert_eq!(cmd.brake, 0.0);
        }
    }

    #[test]
    fn turbo_multiplies_engine_force() {
        let cfg = VehicleConfig::default();
        let input = ControlInput {
            throttle: 0.5,
            turbo: true,
            ..ControlInput::default()
        };
        assert_eq!(drive_command(&input, 0.0, &cfg).engine_force, -2100.0);
    }
}
