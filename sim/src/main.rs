//! Headless driving simulation.
//!
//! Loads a track and a car model on the loader thread, drives a scripted
//! player car and an AI rival that chases it, recovers cars that leave the
//! map, and logs telemetry.

mod demo;
mod source;

use std::{fs, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use physics::{
    AiDriver, Config, ControlInput, LoadTarget, LoadedModel, MeshLoader, PhysicsWorld, TrackField,
    Vehicle, VehicleParam,
};

use source::{DEMO_CAR, DEMO_TRACK, SimSource};

#[derive(Parser, Debug)]
#[command(name = "sim", version, about = "Headless vehicle and track physics simulation")]
struct Opts {
    /// Track model (.glb/.gltf) or `demo:track`
    #[arg(long, default_value = DEMO_TRACK)]
    track: PathBuf,

    /// Car model (.glb/.gltf) or `demo:car`
    #[arg(long, default_value = DEMO_CAR)]
    car: PathBuf,

    /// JSON config; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 1200)]
    frames: u32,

    /// Wall-clock seconds per frame fed to the fixed-step clock
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_dt: f32,

    /// Player tuning, `name=value` (repeatable)
    #[arg(long = "tune", value_name = "NAME=VALUE")]
    tune: Vec<VehicleParam>,

    /// Log telemetry every N frames (0 disables)
    #[arg(long, default_value_t = 60)]
    report_every: u32,
}

const PLAYER: &str = "player";
const RIVAL: &str = "rival";

/// Gentle slalom for the player car.
fn scripted_input(frame: u32, frame_dt: f32) -> ControlInput {
    let t = frame as f32 * frame_dt;
    ControlInput {
        throttle: 0.7,
        steering: (t * 0.5).sin(),
        brake: false,
        turbo: false,
    }
}

struct Sim {
    cfg: Config,
    world: PhysicsWorld,
    field: TrackField,
    player: Vehicle,
    rival: Vehicle,
    ai: AiDriver,
    resets: u32,
}

impl Sim {
    fn new(cfg: Config) -> Result<Self> {
        let mut world = PhysicsWorld::new(&cfg.physics);
        let field = TrackField::new(cfg.field.clone());

        let offset = cfg.field.spawn.position_offset;
        let spawn = Point3::from(offset);
        let ai_spawn = spawn + Vector3::from(cfg.field.spawn.ai_offset);
        let yaw = cfg.field.spawn.yaw_deg.to_radians();

        let player = Vehicle::new(&mut world, PLAYER, &cfg.vehicle, spawn, yaw)?;
        let rival = Vehicle::new(&mut world, RIVAL, &cfg.vehicle, ai_spawn, yaw)?;
        let ai = AiDriver::new(cfg.ai.clone());

        Ok(Self {
            cfg,
            world,
            field,
            player,
            rival,
            ai,
            resets: 0,
        })
    }

    fn install(&mut self, target: &LoadTarget, model: LoadedModel) -> Result<()> {
        match target {
            LoadTarget::Track => {
                self.field.load(&mut self.world, model.nodes);
                self.respawn_all()?;
            }
            LoadTarget::Vehicle(name) => {
                for car in [&mut self.player, &mut self.rival] {
                    if car.name() == name {
                        car.install_model(&mut self.world, &model.nodes)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn spawn_point(&self, name: &str) -> (Point3<f32>, f32) {
        match self.field.spawn() {
            Some(s) if name == RIVAL => (s.ai_position, s.yaw_rad),
            Some(s) => (s.position, s.yaw_rad),
            None => {
                let spawn = &self.cfg.field.spawn;
                let p = Point3::from(spawn.position_offset);
                let p = if name == RIVAL {
                    p + Vector3::from(spawn.ai_offset)
                } else {
                    p
                };
                (p, spawn.yaw_deg.to_radians())
            }
        }
    }

    fn respawn_all(&mut self) -> Result<()> {
        let (p, yaw) = self.spawn_point(PLAYER);
        self.player.reset(&mut self.world, p, yaw)?;
        let (p, yaw) = self.spawn_point(RIVAL);
        self.rival.reset(&mut self.world, p, yaw)?;
        self.ai.reset();
        Ok(())
    }

    /// Reset any car that left the map or fell through the floor.
    fn recover(&mut self) -> Result<()> {
        let scale = self.field.transform().scale;
        let floor_y = self.field.surface_y().unwrap_or(0.0);
        let bounds = self.cfg.bounds;

        for name in [PLAYER, RIVAL] {
            let (spawn, yaw) = self.spawn_point(name);
            let car = if name == PLAYER {
                &mut self.player
            } else {
                &mut self.rival
            };
            let p = car.telemetry(&self.world)?.position;
            if !bounds.contains(p.x, p.y, p.z, scale, floor_y) {
                warn!("{name} out of bounds at {p}, resetting");
                car.reset(&mut self.world, spawn, yaw)?;
                self.resets += 1;
            }
        }
        Ok(())
    }

    fn frame(&mut self, frame: u32, frame_dt: f32) -> Result<()> {
        let player_input = scripted_input(frame, frame_dt);
        self.player.update(&mut self.world, &player_input)?;

        let me = self.rival.telemetry(&self.world)?;
        let target = self.player.telemetry(&self.world)?.position;
        let rival_input = self.ai.update(frame_dt, &me.position, me.yaw, &target);
        self.rival.update(&mut self.world, &rival_input)?;

        self.world
            .step(frame_dt, &mut [&mut self.player, &mut self.rival]);
        self.recover()
    }

    fn report(&self, frame: u32) -> Result<()> {
        for car in [&self.player, &self.rival] {
            let t = car.telemetry(&self.world)?;
            let contacts = t.wheels.iter().filter(|w| w.in_contact).count();
            info!(
                "frame {frame:>5} {:<6} pos ({:>7.2}, {:>6.2}, {:>7.2}) yaw {:>6.2} speed {:>6.1} km/h steer {:>5.2} wheels on ground {contacts}",
                car.name(),
                t.position.x,
                t.position.y,
                t.position.z,
                t.yaw,
                t.speed_kmh,
                t.steering,
            );
        }
        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let cfg = load_config(opts.config.as_ref())?;
    let mut sim = Sim::new(cfg)?;
    for param in &opts.tune {
        sim.player.apply(&mut sim.world, *param)?;
        info!("tuned {PLAYER}: {param}");
    }

    let mut loader = MeshLoader::spawn(SimSource)?;
    loader.request(LoadTarget::Track, &opts.track)?;
    loader.request(LoadTarget::Vehicle(PLAYER.into()), &opts.car)?;
    loader.request(LoadTarget::Vehicle(RIVAL.into()), &opts.car)?;

    let started = Instant::now();
    for frame in 0..opts.frames {
        for msg in loader.poll() {
            match msg.result {
                Ok(model) => sim.install(&msg.target, model)?,
                Err(e) => warn!("keeping fallback for {:?}: {e}", msg.target),
            }
        }

        sim.frame(frame, opts.frame_dt)?;

        if opts.report_every > 0 && frame % opts.report_every == 0 {
            sim.report(frame)?;
        }
    }

    sim.report(opts.frames)?;
    info!(
        "simulated {} frames ({:.1} s) in {:.2?}; {} out-of-bounds resets; track loaded: {}",
        opts.frames,
        opts.frames as f32 * opts.frame_dt,
        started.elapsed(),
        sim.resets,
        sim.field.is_loaded(),
    );
    Ok(())
}
