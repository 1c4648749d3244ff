use std::f32::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use physics::{
    ControlInput, PhysicsConfig, PhysicsWorld, Vehicle, VehicleConfig, VehicleParam,
};

const FRAME: f32 = 1.0 / 60.0;

fn spawn_on_default_ground() -> (PhysicsWorld, Vehicle) {
    let mut world = PhysicsWorld::new(&PhysicsConfig::default());
    let vehicle = Vehicle::new(
        &mut world,
        "player",
        &VehicleConfig::default(),
        Point3::new(0.0, 1.5, 0.0),
        0.0,
    )
    .unwrap();
    (world, vehicle)
}

fn run(world: &mut PhysicsWorld, vehicle: &mut Vehicle, input: ControlInput, frames: usize) {
    for _ in 0..frames {
        vehicle.update(world, &input).unwrap();
        world.step(FRAME, &mut [&mut *vehicle]);
    }
}

fn assert_suspension_in_range(vehicle: &Vehicle) {
    let wheel = &vehicle.config().wheel;
    let max = wheel.suspension_rest_length
        + wheel.max_suspension_travel.min(wheel.suspension_rest_length);
    for len in vehicle.suspension_lengths() {
        assert!(len >= 0.0 && len <= max + 1.0e-4, "suspension length {len} outside [0, {max}]");
    }
}

#[test]
fn car_settles_on_its_wheels() {
    let (mut world, mut vehicle) = spawn_on_default_ground();
    run(&mut world, &mut vehicle, ControlInput::default(), 180);

    let t = vehicle.telemetry(&world).unwrap();
    assert!(t.position.y > 0.0 && t.position.y < 1.5, "chassis at {}", t.position.y);
    assert!(t.speed_kmh < 1.0);
    assert!(t.wheels.iter().all(|w| w.in_contact));
    assert_suspension_in_range(&vehicle);
}

#[test]
fn throttle_drives_toward_heading() {
    let (mut world, mut vehicle) = spawn_on_default_ground();
    run(&mut world, &mut vehicle, ControlInput::default(), 120);
    let start = vehicle.telemetry(&world).unwrap().position;

    let throttle = ControlInput {
        throttle: 1.0,
        ..ControlInput::default()
    };
    run(&mut world, &mut vehicle, throttle, 5);
    assert!(vehicle.last_command().engine_force < 0.0);

    run(&mut world, &mut vehicle, throttle, 55);
    let t = vehicle.telemetry(&world).unwrap();
    assert!(t.position.z - start.z > 1.0, "moved from {start} to {}", t.position);
    assert!(t.speed_kmh > 5.0);
}

#[test]
fn full_throttle_holds_the_speed_cap() {
    let (mut world, mut vehicle) = spawn_on_default_ground();
    run(&mut world, &mut vehicle, ControlInput::default(), 120);
    let cap = vehicle.config().max_speed_kmh;
    let throttle = ControlInput {
        throttle: 1.0,
        ..ControlInput::default()
    };

    let mut at_cap = 0;
    let mut peak = 0.0f32;
    for _ in 0..600 {
        vehicle.update(&mut world, &throttle).unwrap();
        let speed = vehicle.telemetry(&world).unwrap().speed_kmh;
        if speed >= cap + 0.01 {
            assert_eq!(vehicle.last_command().engine_force, 0.0);
            at_cap += 1;
        }
        peak = peak.max(speed);
        world.step(FRAME, &mut [&mut vehicle]);
    }
    assert!(at_cap > 0, "never reached {cap} km/h, peak {peak}");
    assert!(peak <= cap + 1.0, "peak {peak} km/h over cap {cap}");
}

#[test]
fn braking_slows_the_car() {
    let (mut world, mut vehicle) = spawn_on_default_ground();
    run(&mut world, &mut vehicle, ControlInput::default(), 120);
    run(
        &mut world,
        &mut vehicle,
        ControlInput {
            throttle: 1.0,
            ..ControlInput::default()
        },
        90,
    );
    let fast = vehicle.telemetry(&world).unwrap().speed_kmh;

    run(
        &mut world,
        &mut vehicle,
        ControlInput {
            brake: true,
            ..ControlInput::default()
        },
        120,
    );
    let slow = vehicle.telemetry(&world).unwrap().speed_kmh;
    assert!(slow < fast, "{slow} should be below {fast}");
}

#[test]
fn suspension_stays_in_range_after_tuning() {
    let (mut world, mut vehicle) = spawn_on_default_ground();
    for param in [
        "suspension_rest_length=0.25",
        "max_suspension_travel=0.6",
        "suspension_stiffness=60",
        "suspension_compression=2",
        "suspension_damping=5",
        "mass=800",
        "wheel_radius=0.35",
    ] {
        let param: VehicleParam = param.parse().unwrap();
        vehicle.apply(&mut world, param).unwrap();
    }
    run(&mut world, &mut vehicle, ControlInput::default(), 180);
    assert_suspension_in_range(&vehicle);

    vehicle
        .apply(&mut world, VehicleParam::SuspensionRestLength(0.5))
        .unwrap();
    run(&mut world, &mut vehicle, ControlInput::default(), 60);
    assert_suspension_in_range(&vehicle);
}

#[test]
fn reset_after_driving_restores_pose() {
    let (mut world, mut vehicle) = spawn_on_default_ground();
    run(
        &mut world,
        &mut vehicle,
        ControlInput {
            throttle: 1.0,
            steering: 1.0,
            ..ControlInput::default()
        },
        120,
    );

    vehicle
        .reset(&mut world, Point3::new(5.0, 3.0, -2.0), FRAC_PI_2)
        .unwrap();
    let body = world.body(vehicle.chassis()).unwrap();
    assert_relative_eq!(*body.translation(), Vector3::new(5.0, 3.0, -2.0));
    assert_eq!(*body.linvel(), Vector3::zeros());
    assert_eq!(*body.angvel(), Vector3::zeros());

    let t = vehicle.telemetry(&world).unwrap();
    assert_relative_eq!(t.yaw, FRAC_PI_2, epsilon = 1.0e-5);
    assert_eq!(t.steering, 0.0);
}
