use std::{fmt, str::FromStr};

use crate::error::Error;

/// One live-tunable vehicle constant, parsed from `name=value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VehicleParam {
    Mass(f32),
    MaxSpeedKmh(f32),
    EngineForce(f32),
    TurboMultiplier(f32),
    BrakeForce(f32),
    SteeringIncrement(f32),
    MaxSteering(f32),
    WheelRadius(f32),
    WheelWidth(f32),
    SuspensionStiffness(f32),
    SuspensionDamping(f32),
    SuspensionCompression(f32),
    SuspensionRestLength(f32),
    MaxSuspensionTravel(f32),
    MaxSuspensionForce(f32),
    FrictionSlip(f32),
    FrontFrictionSlip(f32),
    RearFrictionSlip(f32),
    ChassisWidth(f32),
    ChassisHeight(f32),
    ChassisLength(f32),
    DownForce(f32),
    AngularDamping(f32),
    LinearDamping(f32),
}

impl VehicleParam {
    pub const NAMES: &'static [&'static str] = &[
        "mass",
        "max_speed",
        "engine_force",
        "turbo_multiplier",
        "brake_force",
        "steering_increment",
        "max_steering",
        "wheel_radius",
        "wheel_width",
        "suspension_stiffness",
        "suspension_damping",
        "suspension_compression",
        "suspension_rest_length",
        "max_suspension_travel",
        "max_suspension_force",
        "friction_slip",
        "front_friction_slip",
        "rear_friction_slip",
        "chassis_width",
        "chassis_height",
        "chassis_length",
        "down_force",
        "angular_damping",
        "linear_damping",
    ];

    pub fn name(&self) -> &'static str {
        use VehicleParam::*;
        match self {
            Mass(_) => "mass",
            MaxSpeedKmh(_) => "max_speed",
            EngineForce(_) => "engine_force",
            TurboMultiplier(_) => "turbo_multiplier",
            BrakeForce(_) => "brake_force",
            SteeringIncrement(_) => "steering_increment",
            MaxSteering(_) => "max_steering",
            WheelRadius(_) => "wheel_radius",
            WheelWidth(_) => "wheel_width",
            SuspensionStiffness(_) => "suspension_stiffness",
            SuspensionDamping(_) => "suspension_damping",
            SuspensionCompression(_) => "suspension_compression",
            SuspensionRestLength(_) => "suspension_rest_length",
            MaxSuspensionTravel(_) => "max_suspension_travel",
            MaxSuspensionForce(_) => "max_suspension_force",
            FrictionSlip(_) => "friction_slip",
            FrontFrictionSlip(_) => "front_friction_slip",
            RearFrictionSlip(_) => "rear_friction_slip",
            ChassisWidth(_) => "chassis_width",
            ChassisHeight(_) => "chassis_height",
            ChassisLength(_) => "chassis_length",
            DownForce(_) => "down_force",
            AngularDamping(_) => "angular_damping",
            LinearDamping(_) => "linear_damping",
        }
    }

    pub fn value(&self) -> f32 {
        use VehicleParam::*;
        match *self {
            Mass(v) | MaxSpeedKmh(v) | EngineForce(v) | TurboMultiplier(v) | BrakeForce(v)
            | SteeringIncrement(v) | MaxSteering(v) | WheelRadius(v) | WheelWidth(v)
            | SuspensionStiffness(v) | SuspensionDamping(v) | SuspensionCompression(v)
            | SuspensionRestLength(v) | MaxSuspensionTravel(v) | MaxSuspensionForce(v)
            | FrictionSlip(v) | FrontFrictionSlip(v) | RearFrictionSlip(v) | ChassisWidth(v)
            | ChassisHeight(v) | ChassisLength(v) | DownForce(v) | AngularDamping(v)
            | LinearDamping(v) => v,
        }
    }

    /// Build from a name and value. Values must be finite and non-negative;
    /// sizes and mass must be positive.
    pub fn from_name(name: &str, value: f32) -> Result<Self, Error> {
        use VehicleParam::*;
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidParam(format!("{name}={value}")));
        }
        let param = match name {
            "mass" => Mass(value),
            "max_speed" => MaxSpeedKmh(value),
            "engine_force" => EngineForce(value),
            "turbo_multiplier" => TurboMultiplier(value),
            "brake_force" => BrakeForce(value),
            "steering_increment" => SteeringIncrement(value),
            "max_steering" => MaxSteering(value),
            "wheel_radius" => WheelRadius(value),
            "wheel_width" => WheelWidth(value),
            "suspension_stiffness" => SuspensionStiffness(value),
            "suspension_damping" => SuspensionDamping(value),
            "suspension_compression" => SuspensionCompression(value),
            "suspension_rest_length" => SuspensionRestLength(value),
            "max_suspension_travel" => MaxSuspensionTravel(value),
            "max_suspension_force" => MaxSuspensionForce(value),
            "friction_slip" => FrictionSlip(value),
            "front_friction_slip" => FrontFrictionSlip(value),
            "rear_friction_slip" => RearFrictionSlip(value),
            "chassis_width" => ChassisWidth(value),
            "chassis_height" => ChassisHeight(value),
            "chassis_length" => ChassisLength(value),
            "down_force" => DownForce(value),
            "angular_damping" => AngularDamping(value),
            "linear_damping" => LinearDamping(value),
            other => return Err(Error::InvalidParam(format!("unknown parameter `{other}`"))),
        };

        let needs_positive = matches!(
            param,
            Mass(_)
                | WheelRadius(_)
                | WheelWidth(_)
                | ChassisWidth(_)
                | ChassisHeight(_)
                | ChassisLength(_)
        );
        if needs_positive && value == 0.0 {
            return Err(Error::InvalidParam(format!("{name} must be positive")));
        }
        Ok(param)
    }
}

impl FromStr for VehicleParam {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidParam(format!("expected name=value, got `{s}`")))?;
        let value: f32 = value
            .trim()
            .parse()
            .map_err(|_| Error::InvalidParam(format!("`{value}` is not a number")))?;
        Self::from_name(name.trim(), value)
    }
}

impl fmt::Display for VehicleParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_name() {
        for name in VehicleParam::NAMES {
            let param: VehicleParam = format!("{name}=1.5").parse().unwrap();
            assert_eq!(param.name(), *name);
            assert_eq!(param.value(), 1.5);
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let p = VehicleParam::FrontFrictionSlip(22.0);
        assert_eq!(p.to_string().parse::<VehicleParam>().unwrap(), p);
    }

    #[test]
    fn rejects_bad_input() {
        for bad in ["mass", "mass=abc", "mass=0", "wheel_radius=-1", "warp=3", "engine_force=inf"] {
            assert!(
                matches!(bad.parse::<VehicleParam>(), Err(Error::InvalidParam(_))),
                "{bad} should be rejected"
            );
        }
        assert!("brake_force=0".parse::<VehicleParam>().is_ok());
    }
}
