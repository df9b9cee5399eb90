use super::collision::{self, BroadPhase};
use super::Simulation;
use crate::body::Body;
use crate::config::{CollisionConfig, ParameterUpdate, SimConfig};
use crate::diagnostics::{DiagnosticRecord, EnergyDiagnostics};
use crate::spatial_hash::SpatialHash;
use crate::vector::Vector2;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn body(pos: (f64, f64), vel: (f64, f64), mass: f64, radius: f64) -> Body {
    Body::new(Vector2::new(pos.0, pos.1), Vector2::new(vel.0, vel.1), mass, radius).unwrap()
}

fn small_config(body_count: usize) -> SimConfig {
    SimConfig { body_count, ..SimConfig::default() }
}

fn gravity_free_config() -> SimConfig {
    SimConfig {
        gravitational_constant: 1e-12,
        dt: 0.01,
        ..SimConfig::default()
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn new_generates_the_configured_disc() {
        let sim = Simulation::new(small_config(200)).unwrap();
        assert_eq!(sim.bodies().len(), 200);
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.time(), 0.0);
        let total: f64 = sim.bodies().iter().map(|b| b.mass).sum();
        assert!((sim.quadtree().root().unwrap().total_mass() - total).abs() < 1e-6);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimConfig { dt: -1.0, ..small_config(10) };
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn step_advances_frame_and_time() {
        let mut sim = Simulation::new(small_config(50)).unwrap();
        for _ in 0..4 {
            sim.step();
        }
        assert_eq!(sim.frame(), 4);
        assert!((sim.time() - 4.0 * sim.config().dt).abs() < 1e-12);
    }

    #[test]
    fn same_seed_runs_identically() {
        let mut a = Simulation::new(small_config(150)).unwrap();
        let mut b = Simulation::new(small_config(150)).unwrap();
        for _ in 0..5 {
            a.step();
            b.step();
        }
        assert_eq!(a.bodies(), b.bodies());
    }

    #[test]
    fn disc_stays_finite_over_many_steps() {
        let mut sim = Simulation::new(small_config(300)).unwrap();
        for frame in 0..60 {
            sim.step();
            assert!(sim.non_finite_bodies().is_empty(), "non-finite body at frame {frame}");
        }
    }

    #[test]
    fn exact_tree_matches_direct_summation() {
        let config = SimConfig { theta: 0.0, collisions: CollisionConfig { enabled: false, ..Default::default() }, ..small_config(120) };
        let mut tree_sim = Simulation::new(config.clone()).unwrap();
        let mut direct_sim = Simulation::new(SimConfig { barnes_hut: false, ..config }).unwrap();
        tree_sim.attract();
        direct_sim.attract();
        for (a, b) in tree_sim.bodies().iter().zip(direct_sim.bodies()) {
            let err = (a.acc - b.acc).mag();
            assert!(err <= 1e-9 * b.acc.mag().max(1.0), "tree {:?} vs direct {:?}", a.acc, b.acc);
        }
    }

    #[test]
    fn snapshot_copies_bodies_and_nodes() {
        let mut sim = Simulation::new(small_config(64)).unwrap();
        sim.step();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.bodies.len(), 64);
        assert_eq!(snapshot.nodes.len(), sim.quadtree().len());
        for (view, b) in snapshot.bodies.iter().zip(sim.bodies()) {
            assert_eq!(view.pos, b.pos);
            assert_eq!(view.mass, b.mass);
            assert_eq!(view.radius, b.radius);
        }
    }
}

mod parameters {
    use super::*;

    #[test]
    fn spawn_derives_radius_and_rejects_bad_mass() {
        let mut sim = Simulation::new(small_config(5)).unwrap();
        let index = sim.spawn(Vector2::new(300.0, 0.0), Vector2::zero(), 8.0).unwrap();
        assert_eq!(index, 5);
        assert_eq!(sim.bodies()[5].radius, 2.0);

        assert!(sim.spawn(Vector2::zero(), Vector2::zero(), 0.0).is_err());
        assert!(sim.spawn(Vector2::zero(), Vector2::zero(), -3.0).is_err());
        assert_eq!(sim.bodies().len(), 6);
    }

    #[test]
    fn add_body_appends() {
        let mut sim = Simulation::with_bodies(SimConfig::default(), Vec::new()).unwrap();
        assert_eq!(sim.add_body(body((1.0, 2.0), (0.0, 0.0), 3.0, 0.5)), 0);
        assert_eq!(sim.add_body(body((5.0, 2.0), (0.0, 0.0), 1.0, 0.5)), 1);
        sim.step();
        assert_eq!(sim.bodies().len(), 2);
    }

    #[test]
    fn theta_and_epsilon_apply_live() {
        let mut sim = Simulation::new(small_config(40)).unwrap();
        sim.step();
        let before = sim.bodies().to_vec();
        sim.update_parameters(&ParameterUpdate {
            theta: Some(0.8),
            epsilon: Some(2.0),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(sim.bodies(), before.as_slice());
        assert_eq!(sim.frame(), 1);
        assert!((sim.quadtree().theta() - 0.8).abs() < 1e-12);
        assert!((sim.quadtree().epsilon() - 2.0).abs() < 1e-12);
        assert_eq!(sim.config().theta, 0.8);
    }

    #[test]
    fn body_count_change_regenerates() {
        let mut sim = Simulation::new(small_config(40)).unwrap();
        sim.step();
        sim.update_parameters(&ParameterUpdate { body_count: Some(90), ..Default::default() })
            .unwrap();
        assert_eq!(sim.bodies().len(), 90);
        assert_eq!(sim.frame(), 0);

        let fresh = Simulation::new(small_config(90)).unwrap();
        assert_eq!(sim.bodies(), fresh.bodies());
    }

    #[test]
    fn invalid_update_changes_nothing() {
        let mut sim = Simulation::new(small_config(20)).unwrap();
        let result = sim.update_parameters(&ParameterUpdate {
            theta: Some(0.9),
            dt: Some(0.0),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(sim.config(), &small_config(20));
        assert!((sim.quadtree().theta() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reset_restarts_from_new_config() {
        let mut sim = Simulation::new(small_config(30)).unwrap();
        for _ in 0..3 {
            sim.step();
        }
        let config = SimConfig { seed: 7, theta: 0.3, ..small_config(45) };
        sim.reset(config.clone()).unwrap();
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.bodies().len(), 45);
        assert_eq!(sim.config(), &config);
        assert_eq!(sim.bodies(), Simulation::new(config).unwrap().bodies());

        assert!(sim.reset(SimConfig { theta: -0.1, ..SimConfig::default() }).is_err());
        assert_eq!(sim.bodies().len(), 45);
    }
}

mod energy {
    use super::*;

    const CENTRAL: f64 = 1000.0;
    const SATELLITE: f64 = 1.0;
    const RADIUS: f64 = 10.0;

    /// Two bodies on a circular orbit about their common centre of mass.
    fn binary() -> (SimConfig, Vec<Body>) {
        let total = CENTRAL + SATELLITE;
        let v_rel = (total / RADIUS).sqrt();
        let x_central = -RADIUS * SATELLITE / total;
        let x_satellite = RADIUS * CENTRAL / total;
        let bodies = vec![
            body((x_central, 0.0), (0.0, -v_rel * SATELLITE / total), CENTRAL, 0.0),
            body((x_satellite, 0.0), (0.0, v_rel * CENTRAL / total), SATELLITE, 0.0),
        ];
        let config = SimConfig {
            epsilon: 0.0,
            dt: 0.01,
            collisions: CollisionConfig { enabled: false, ..Default::default() },
            ..SimConfig::default()
        };
        (config, bodies)
    }

    // period is 2*pi*sqrt(r^3 / GM) ~ 6.28, so 3000 steps is a bit under five orbits
    const STEPS: usize = 3000;

    #[test]
    fn symplectic_euler_energy_stays_bounded() {
        let (config, bodies) = binary();
        let mut sim = Simulation::with_bodies(config, bodies).unwrap();
        let mut diag = EnergyDiagnostics::new();
        diag.update(&sim);
        for i in 0..STEPS {
            sim.step();
            if i % 10 == 0 {
                diag.update(&sim);
            }
        }
        diag.update(&sim);

        let drift = diag.max_relative_drift();
        assert!(drift < 0.02, "symplectic drift {drift}");
        let radius = (sim.bodies()[1].pos - sim.bodies()[0].pos).mag();
        assert!((radius - RADIUS).abs() < 0.5, "orbit radius wandered to {radius}");
    }

    #[test]
    fn explicit_euler_drifts_further() {
        let (config, bodies) = binary();
        let dt = config.dt;
        let mut symplectic = Simulation::with_bodies(config.clone(), bodies.clone()).unwrap();
        let mut explicit = Simulation::with_bodies(config, bodies).unwrap();
        let e0 = DiagnosticRecord::measure(&explicit).total_energy();

        let mut previous = 0.0;
        for i in 0..STEPS {
            symplectic.step();

            explicit.attract();
            for b in explicit.bodies.iter_mut() {
                b.pos += b.vel * dt;
                b.vel += b.acc * dt;
            }

            if i % 500 == 499 {
                let drift = (DiagnosticRecord::measure(&explicit).total_energy() - e0).abs();
                assert!(drift > previous, "explicit Euler drift should grow, step {i}");
                previous = drift;
            }
        }

        let explicit_drift =
            ((DiagnosticRecord::measure(&explicit).total_energy() - e0) / e0).abs();
        let symplectic_drift =
            ((DiagnosticRecord::measure(&symplectic).total_energy() - e0) / e0).abs();
        assert!(
            explicit_drift > 2.0 * symplectic_drift,
            "explicit {explicit_drift} vs symplectic {symplectic_drift}"
        );
    }

    #[test]
    fn momentum_is_conserved_by_the_exact_tree() {
        let (config, bodies) = binary();
        let mut sim = Simulation::with_bodies(config, bodies).unwrap();
        let p0 = crate::diagnostics::total_momentum(sim.bodies());
        for _ in 0..500 {
            sim.step();
        }
        let p1 = crate::diagnostics::total_momentum(sim.bodies());
        assert!((p1 - p0).mag() < 1e-9, "momentum changed by {:?}", p1 - p0);
    }
}

mod collisions {
    use super::*;

    fn random_crowd(n: usize, seed: u64) -> Vec<Body> {
        crowd_in_box(n, 40.0, seed)
    }

    fn crowd_in_box(n: usize, half_width: f64, seed: u64) -> Vec<Body> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                body(
                    (
                        rng.random_range(-half_width..half_width),
                        rng.random_range(-half_width..half_width),
                    ),
                    (rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
                    rng.random_range(0.5..4.0),
                    rng.random_range(0.3..1.5),
                )
            })
            .collect()
    }

    /// One brute-force collision pass over `bodies`.
    fn collide_once(bodies: &mut [Body], restitution: f64, percent: f64) -> Vec<(usize, usize)> {
        let config = CollisionConfig {
            restitution,
            correction_percent: percent,
            ..CollisionConfig::default()
        };
        let mut hash = SpatialHash::new(config.grid_size);
        collision::resolve_all(bodies, &mut hash, BroadPhase::BruteForce, &config)
    }

    fn overlap(a: &Body, b: &Body) -> f64 {
        a.radius + b.radius - (b.pos - a.pos).mag()
    }

    #[test]
    fn broad_phase_switches_above_threshold() {
        assert_eq!(BroadPhase::for_count(500, 500), BroadPhase::BruteForce);
        assert_eq!(BroadPhase::for_count(501, 500), BroadPhase::SpatialHash);
        assert_eq!(BroadPhase::for_count(0, 0), BroadPhase::BruteForce);
    }

    #[test]
    fn head_on_impulse_and_correction() {
        let mut bodies = vec![body((-0.9, 0.0), (1.0, 0.0), 1.0, 1.0), body((0.9, 0.0), (-1.0, 0.0), 1.0, 1.0)];
        assert_eq!(collide_once(&mut bodies, 0.5, 0.2), vec![(0, 1)]);

        // closing speed 2, restitution 0.5 -> separating at 1
        assert!((bodies[0].vel.x + 0.5).abs() < 1e-12);
        assert!((bodies[1].vel.x - 0.5).abs() < 1e-12);
        // overlap 0.2, 20% removed, split evenly
        assert!((bodies[0].pos.x + 0.92).abs() < 1e-12);
        assert!((bodies[1].pos.x - 0.92).abs() < 1e-12);
    }

    #[test]
    fn resolve_reports_shifts_without_moving() {
        let mut bodies = vec![body((-0.9, 0.0), (1.0, 0.0), 1.0, 1.0), body((0.9, 0.0), (-1.0, 0.0), 1.0, 1.0)];
        let (shift_a, shift_b) = collision::resolve(&mut bodies, 0, 1, 0.5, 0.2).unwrap();
        assert_eq!(bodies[0].pos, Vector2::new(-0.9, 0.0));
        assert_eq!(bodies[1].pos, Vector2::new(0.9, 0.0));
        assert!((shift_a.x + 0.02).abs() < 1e-12);
        assert!((shift_b.x - 0.02).abs() < 1e-12);
    }

    #[test]
    fn heavier_body_moves_less() {
        let mut bodies = vec![body((0.0, 0.0), (0.0, 0.0), 9.0, 1.0), body((1.5, 0.0), (-2.0, 0.0), 1.0, 1.0)];
        let p0 = bodies[0].momentum() + bodies[1].momentum();
        assert_eq!(collide_once(&mut bodies, 1.0, 0.5).len(), 1);
        let p1 = bodies[0].momentum() + bodies[1].momentum();
        assert!((p1 - p0).mag() < 1e-12, "impulse must conserve momentum");
        assert!(bodies[0].pos.x.abs() < (bodies[1].pos.x - 1.5).abs());
        // perfectly elastic: kinetic energy unchanged
        let ke = bodies[0].kinetic_energy() + bodies[1].kinetic_energy();
        assert!((ke - 2.0).abs() < 1e-12);
    }

    #[test]
    fn separating_or_coincident_pairs_are_ignored() {
        let mut separating = vec![body((0.0, 0.0), (-1.0, 0.0), 1.0, 1.0), body((1.0, 0.0), (1.0, 0.0), 1.0, 1.0)];
        let before = separating.clone();
        assert!(collision::resolve(&mut separating, 0, 1, 0.5, 0.2).is_none());
        assert!(collide_once(&mut separating, 0.5, 0.2).is_empty());
        assert_eq!(separating, before);

        let mut coincident = vec![body((2.0, 2.0), (1.0, 0.0), 1.0, 1.0), body((2.0, 2.0), (-1.0, 0.0), 1.0, 1.0)];
        let before = coincident.clone();
        assert!(collide_once(&mut coincident, 0.5, 0.2).is_empty());
        assert_eq!(coincident, before);

        let mut apart = vec![body((0.0, 0.0), (1.0, 0.0), 1.0, 1.0), body((2.0, 0.0), (-1.0, 0.0), 1.0, 1.0)];
        assert!(collision::resolve(&mut apart, 0, 1, 0.5, 0.2).is_none(), "touching is not overlapping");
    }

    #[test]
    fn crowded_contacts_never_end_deeper() {
        let cases = [(800, 40.0, 0..5), (400, 15.0, 0..3)];
        let mut improved = 0;
        for (n, half_width, seeds) in cases {
            for seed in seeds {
                let mut bodies = crowd_in_box(n, half_width, seed);
                let before = bodies.clone();
                collide_once(&mut bodies, 0.5, 0.2);

                for i in 0..n {
                    for j in i + 1..n {
                        let (a, b) = (&before[i], &before[j]);
                        let depth = overlap(a, b);
                        let approaching = (b.vel - a.vel).dot(b.pos - a.pos) < 0.0;
                        if depth <= 0.0 || !approaching {
                            continue;
                        }
                        let after = overlap(&bodies[i], &bodies[j]);
                        assert!(
                            after <= depth + 1e-12,
                            "n {n} seed {seed}: pair ({i}, {j}) went from {depth} to {after}"
                        );
                        if after < depth {
                            improved += 1;
                        }
                    }
                }
            }
        }
        assert!(improved > 0, "corrections should still separate some contacts");
    }

    #[test]
    fn three_body_pileup_corrects_without_deepening() {
        // the middle body is squeezed from both sides
        let mut bodies = vec![
            body((-1.8, 0.0), (1.0, 0.0), 1.0, 1.0),
            body((0.0, 0.0), (0.0, 0.0), 1.0, 1.0),
            body((1.8, 0.0), (-1.0, 0.0), 1.0, 1.0),
        ];
        let before = bodies.clone();
        assert_eq!(collide_once(&mut bodies, 0.5, 0.2).len(), 2);
        assert!(overlap(&bodies[0], &bodies[1]) <= overlap(&before[0], &before[1]));
        assert!(overlap(&bodies[1], &bodies[2]) <= overlap(&before[1], &before[2]));
        assert!(bodies[0].pos.x < -1.8 && bodies[2].pos.x > 1.8);
    }

    #[test]
    fn approaching_pair_never_passes_through() {
        let bodies = vec![body((-5.0, 0.0), (3.0, 0.0), 1.0, 1.0), body((5.0, 0.1), (-3.0, 0.0), 2.0, 1.0)];
        let mut sim = Simulation::with_bodies(gravity_free_config(), bodies).unwrap();
        let mut contacts = 0;
        for _ in 0..800 {
            sim.step();
            contacts += sim.last_collisions();
            let a = sim.bodies()[0];
            let b = sim.bodies()[1];
            assert!(a.pos.x < b.pos.x, "bodies crossed: {:?} {:?}", a.pos, b.pos);
        }
        assert!(contacts > 0);
        let a = sim.bodies()[0];
        let b = sim.bodies()[1];
        assert!((b.vel - a.vel).dot(b.pos - a.pos) > 0.0, "pair should end up separating");
    }

    #[test]
    fn disabled_collisions_leave_overlaps_alone() {
        let bodies = vec![body((-0.5, 0.0), (1.0, 0.0), 1.0, 1.0), body((0.5, 0.0), (-1.0, 0.0), 1.0, 1.0)];
        let config = SimConfig {
            collisions: CollisionConfig { enabled: false, ..Default::default() },
            ..gravity_free_config()
        };
        let mut sim = Simulation::with_bodies(config, bodies).unwrap();
        sim.step();
        assert_eq!(sim.last_collisions(), 0);
        assert!(sim.bodies()[0].vel.x > 0.0);
    }

    #[test]
    fn spatial_hash_finds_the_same_pairs_as_brute_force() {
        for seed in 0..3 {
            let bodies = random_crowd(800, seed);
            let mut hash = SpatialHash::new(1.0);
            let brute = collision::find_colliding_pairs(&bodies, &mut hash, BroadPhase::BruteForce, 1.0);
            let hashed = collision::find_colliding_pairs(&bodies, &mut hash, BroadPhase::SpatialHash, 1.0);
            assert!(!brute.is_empty());
            assert_eq!(brute, hashed, "seed {seed}");
        }
    }

    #[test]
    fn spatial_hash_resolves_identically() {
        let config = CollisionConfig::default();
        let mut by_brute = random_crowd(700, 42);
        let mut by_hash = by_brute.clone();
        let mut hash = SpatialHash::new(config.grid_size);

        let a = collision::resolve_all(&mut by_brute, &mut hash, BroadPhase::BruteForce, &config);
        let b = collision::resolve_all(&mut by_hash, &mut hash, BroadPhase::SpatialHash, &config);
        assert_eq!(a, b);
        assert_eq!(by_brute, by_hash);
    }

    #[test]
    fn cell_size_grows_to_fit_large_bodies() {
        // radius 5 bodies would be missed by a 3x3 search with 1-unit cells
        let bodies = vec![body((0.0, 0.0), (0.0, 0.0), 1.0, 5.0), body((8.0, 0.0), (0.0, 0.0), 1.0, 5.0)];
        let mut hash = SpatialHash::new(1.0);
        let pairs = collision::find_colliding_pairs(&bodies, &mut hash, BroadPhase::SpatialHash, 1.0);
        assert_eq!(pairs, vec![(0, 1)]);
        assert!(hash.cell_size >= 10.0);
    }
}
