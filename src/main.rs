//! Tile Motor demo driver
//!
//! Runs a rider through a small tile level headlessly: seeded random input,
//! a shuttling moving platform and a fixed-timestep loop. Pass a JSON tuning
//! file as the first argument to override the default movement config.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use tile_motor::consts::*;
    use tile_motor::sim::{Aabb, BodyId, Layer, MotionResolver, Shape, StaticWorld};
    use tile_motor::{ConfigError, MovementConfig};

    const LEVEL: &str = "
#..........................#
#..........................#
#......======..............#
#..........................#
#..................../####.#
#.........#........./#####.#
############################
";

    const TILE: f32 = 1.0;
    const SEED: u64 = 0x5EED_1234;
    const FRAMES: u32 = 1200;
    /// Ticks between platform direction flips
    const PLATFORM_PERIOD: u32 = 180;

    /// Caller-side vertical state: the resolver never applies gravity
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Vertical {
        Grounded,
        Rising { ticks_left: u32 },
        Falling,
    }

    pub struct Demo {
        world: StaticWorld,
        rider: MotionResolver,
        platform: BodyId,
        platform_speed: f32,
        rng: Pcg32,
        vertical: Vertical,
        axis: f32,
        accumulator: f32,
        ticks: u32,
        landings: u32,
    }

    impl Demo {
        pub fn new(config: MovementConfig) -> Result<Self, Box<dyn std::error::Error>> {
            let mut world = StaticWorld::from_tiles(LEVEL, TILE)?;
            let platform_speed = 2.0;
            let platform = world.add_moving_platform(
                Shape::Box(Aabb::from_min_max(Vec2::new(11.0, 3.5), Vec2::new(13.0, 3.75))),
                Layer::Solid,
                Vec2::new(platform_speed, 0.0),
            );

            let rider = MotionResolver::builder(config)
                .shape(Aabb::new(Vec2::new(2.5, 1.5), Vec2::new(0.3, 0.5)))
                .build()?;

            Ok(Self {
                world,
                rider,
                platform,
                platform_speed,
                rng: Pcg32::seed_from_u64(SEED),
                vertical: Vertical::Falling,
                axis: 0.0,
                accumulator: 0.0,
                ticks: 0,
                landings: 0,
            })
        }

        /// Run simulation ticks for one rendered frame
        pub fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.tick();
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
        }

        fn tick(&mut self) {
            if self.ticks % PLATFORM_PERIOD == 0 && self.ticks > 0 {
                self.platform_speed = -self.platform_speed;
                self.world
                    .set_platform_velocity(self.platform, Vec2::new(self.platform_speed, 0.0));
            }
            // Platforms settle before riders read them
            self.world.advance(SIM_DT);

            self.drive();
            self.rider.update_physics(&self.world, SIM_DT);
            self.ticks += 1;

            let collision = self.rider.collision().clone();
            if collision.just_landed() {
                self.landings += 1;
                self.vertical = Vertical::Grounded;
                self.rider.set_fast_falling(false);
                self.rider.set_down_jumping(false);
                self.rider.set_dropping_through(false);
                log::info!(
                    "tick {}: landed at ({:.3}, {:.3}){}{}",
                    self.ticks,
                    self.rider.position().x,
                    self.rider.bounds().min().y,
                    if collision.is_on_moving_platform { " on platform" } else { "" },
                    if collision.is_on_slope { " on slope" } else { "" },
                );
            } else if collision.just_left_ground() && self.vertical == Vertical::Grounded {
                self.vertical = Vertical::Falling;
            }
            if collision.is_ceiling && matches!(self.vertical, Vertical::Rising { .. }) {
                self.vertical = Vertical::Falling;
            }
        }

        /// Seeded stand-in for player input plus the jump/fall state machine
        fn drive(&mut self) {
            if self.ticks % 30 == 0 {
                self.axis = self.rng.random_range(-1.0..=1.0);
            }
            self.rider.move_axis(self.axis);
            self.rider.set_wall_sliding(self.rider.is_against_wall() && !self.rider.is_grounded());

            let config = self.rider.config();
            let (ascent, descent) = (config.ascent_velocity(), config.descent_velocity());
            let vx = self.rider.physics().velocity.x;

            self.vertical = match self.vertical {
                Vertical::Grounded if self.rider.is_grounded() => {
                    let roll: f32 = self.rng.random();
                    if roll < 0.02 {
                        self.rider.set_velocity(Vec2::new(vx, ascent));
                        Vertical::Rising { ticks_left: 20 }
                    } else if roll < 0.03 && self.rider.collision().is_on_one_way_platform {
                        self.rider.set_dropping_through(true);
                        self.rider.set_down_jumping(true);
                        self.rider.set_velocity(Vec2::new(vx, descent));
                        log::debug!(
                            "tick {}: dropping through ({} air control)",
                            self.ticks,
                            self.rider.air_control().as_str()
                        );
                        Vertical::Falling
                    } else {
                        Vertical::Grounded
                    }
                }
                Vertical::Grounded => {
                    self.rider.set_velocity(Vec2::new(vx, descent));
                    Vertical::Falling
                }
                Vertical::Rising { ticks_left: 0 } => {
                    self.rider.set_velocity(Vec2::new(vx, descent));
                    self.rider.set_fast_falling(self.rng.random_bool(0.25));
                    log::debug!(
                        "tick {}: apex reached ({} air control)",
                        self.ticks,
                        self.rider.air_control().as_str()
                    );
                    Vertical::Falling
                }
                Vertical::Rising { ticks_left } => Vertical::Rising {
                    ticks_left: ticks_left - 1,
                },
                Vertical::Falling => {
                    if self.rider.physics().velocity.y > descent {
                        self.rider.set_velocity(Vec2::new(vx, descent));
                    }
                    Vertical::Falling
                }
            };
        }
    }

    pub fn load_config() -> Result<MovementConfig, ConfigError> {
        match std::env::args().nth(1) {
            Some(path) => MovementConfig::load(path),
            None => Ok(MovementConfig::default()),
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_config()?;
        let mut demo = Demo::new(config)?;
        let mut rng = Pcg32::seed_from_u64(SEED ^ 0xF00D);

        for _ in 0..FRAMES {
            // Jittery frame times exercise the fixed-step accumulator
            let frame_dt = rng.random_range(1.0 / 75.0..1.0 / 45.0);
            demo.update(frame_dt);
        }

        log::info!(
            "Finished {} ticks with {} landings; rider at ({:.3}, {:.3})",
            demo.ticks,
            demo.landings,
            demo.rider.position().x,
            demo.rider.position().y
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tile Motor demo starting...");

    if let Err(e) = demo::run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the wasm surface; the demo is native only
}
