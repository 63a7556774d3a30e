//! Scenario tests
//!
//! Whole-simulation situations driven through `Simulation::tick`:
//! - sliding down a slippy slope
//! - kursed items refusing to leave a living hand
//! - stacking ammo on pickup
//! - bouncing off a wall
//! - jumping off a mount
//! - footfall frame effects

use bevy::math::{Vec2, Vec3};

use egoboo_core::character::{AlertFlags, ChrRef, Slot, Team};
use egoboo_core::character::attach::GrabKind;
use egoboo_core::config::SimConfig;
use egoboo_core::constants::{DISMOUNTZVEL, GRIP_LEFT, GRIP_ONLY, GRIP_RIGHT, JUMPDELAY};
use egoboo_core::error::CoreError;
use egoboo_core::instance::action::Action;
use egoboo_core::mesh::{Mesh, MeshBuilder, TileFlags};
use egoboo_core::model::{FrameFx, ModelBuilder, ModelId};
use egoboo_core::physics::latch::{Latch, LatchButtons};
use egoboo_core::profile::CharacterProfile;
use egoboo_core::simulation::{SimEvent, SoundKind};
use egoboo_core::Simulation;

fn sim_on(mesh: Mesh) -> Simulation {
    Simulation::new(SimConfig::default(), mesh)
}

fn biped(sim: &mut Simulation) -> ModelId {
    sim.add_model(
        ModelBuilder::new("biped", 16)
            .action(Action::DA, 0, 3)
            .action(Action::WB, 4, 7)
            .fx(7, FrameFx::FOOTFALL)
            .build(),
    )
}

fn spawn_with(sim: &mut Simulation, profile: CharacterProfile, at: Vec3) -> ChrRef {
    let id = sim.add_profile(profile);
    sim.spawn(id, at, 0, Team::GOOD).unwrap()
}

// ============================================================
// S1: slide on slippy floor
// ============================================================

#[test]
fn test_slippy_slope_slides_downhill() {
    // rises toward +x everywhere, so downhill is -x
    let mesh = MeshBuilder::new(24, 4)
        .incline_x(0, 0, 23, 3, 32.0)
        .flag_rect(0, 0, 23, 3, TileFlags::SLIPPY)
        .build();
    let mut sim = sim_on(mesh);
    let r = spawn_with(&mut sim, CharacterProfile::default(), Vec3::new(1600.0, 256.0, 0.0));
    let start = sim.chars.get(r).unwrap().vel.truncate().length();

    sim.run(60);

    let vel = sim.chars.get(r).unwrap().vel;
    assert!(vel.truncate().length() > start);
    assert!(vel.x < 0.0, "slid uphill: {vel:?}");
    assert!(vel.y.abs() < vel.x.abs() * 0.01);
}

// ============================================================
// S2: drop kursed weapon
// ============================================================

#[test]
fn test_kursed_item_stays_in_living_hand() {
    let mut sim = sim_on(MeshBuilder::new(8, 8).build());
    let model = biped(&mut sim);
    let holder = spawn_with(
        &mut sim,
        CharacterProfile {
            model: Some(model),
            ..CharacterProfile::default()
        },
        Vec3::new(300.0, 300.0, 0.0),
    );
    let sword = spawn_with(
        &mut sim,
        CharacterProfile {
            is_kursed: true,
            ..CharacterProfile::item("Kursed Sword")
        },
        Vec3::new(320.0, 300.0, 0.0),
    );
    sim.tick();
    sim.attach(sword, holder, GRIP_LEFT).unwrap();

    assert_eq!(sim.detach(sword, false, false), Err(CoreError::Kursed));

    let it = sim.chars.get(sword).unwrap();
    assert_eq!(it.attached_to, Some(holder));
    assert!(it.ai.has(AlertFlags::NOTDROPPED));
    assert_eq!(sim.chars.get(holder).unwrap().holding(Slot::Left), Some(sword));

    // a kurse does not hold a corpse
    sim.chars.get_mut(holder).unwrap().alive = false;
    assert!(sim.detach(sword, false, false).is_ok());
    assert_eq!(sim.chars.get(sword).unwrap().attached_to, None);
}

// ============================================================
// S3: stack on pickup
// ============================================================

#[test]
fn test_pickup_tops_up_pack_stack() {
    let mut sim = sim_on(MeshBuilder::new(8, 8).build());
    let model = biped(&mut sim);
    let holder = spawn_with(
        &mut sim,
        CharacterProfile {
            model: Some(model),
            ..CharacterProfile::default()
        },
        Vec3::new(300.0, 300.0, 0.0),
    );
    let arrows = sim.add_profile(CharacterProfile {
        is_stackable: true,
        ammo: 3,
        ammo_max: 5,
        ..CharacterProfile::item("Arrows")
    });
    let stored = sim.spawn(arrows, Vec3::new(200.0, 200.0, 0.0), 0, Team::GOOD).unwrap();
    let loose = sim.spawn(arrows, Vec3::new(340.0, 300.0, 0.0), 0, Team::GOOD).unwrap();
    sim.tick();
    sim.inventory_add(stored, holder).unwrap();

    assert!(sim.grab_nearby(holder, Slot::Left, GrabKind::Item));

    assert_eq!(sim.chars.get(stored).unwrap().ammo, 5);
    let picked = sim.chars.get(loose).unwrap();
    assert_eq!(picked.ammo, 1);
    assert_eq!(picked.attached_to, Some(holder));
    assert_eq!(sim.pack_items(holder), vec![stored]);
    assert!(!sim.chars.get(holder).unwrap().ai.has(AlertFlags::TOOMUCHBAGGAGE));
}

#[test]
fn test_fully_stacked_pickup_is_consumed() {
    let mut sim = sim_on(MeshBuilder::new(8, 8).build());
    let model = biped(&mut sim);
    let holder = spawn_with(
        &mut sim,
        CharacterProfile {
            model: Some(model),
            ..CharacterProfile::default()
        },
        Vec3::new(300.0, 300.0, 0.0),
    );
    let arrows = sim.add_profile(CharacterProfile {
        is_stackable: true,
        ammo: 2,
        ammo_max: 5,
        ..CharacterProfile::item("Arrows")
    });
    let stored = sim.spawn(arrows, Vec3::new(200.0, 200.0, 0.0), 0, Team::GOOD).unwrap();
    let loose = sim.spawn(arrows, Vec3::new(340.0, 300.0, 0.0), 0, Team::GOOD).unwrap();
    sim.tick();
    sim.inventory_add(stored, holder).unwrap();

    assert!(sim.grab_nearby(holder, Slot::Left, GrabKind::Item));
    sim.tick();

    assert_eq!(sim.chars.get(stored).unwrap().ammo, 4);
    assert!(sim.chars.get(loose).is_none());
    assert_eq!(sim.chars.get(holder).unwrap().holding(Slot::Left), None);
}

// ============================================================
// S4: wall bounce
// ============================================================

#[test]
fn test_wall_stops_inward_motion() {
    // wall column at tile x = 4, starting at x = 512
    let mesh = MeshBuilder::new(8, 4)
        .flag_rect(4, 0, 4, 3, TileFlags::WALL)
        .build();
    let mut sim = sim_on(mesh);
    let r = spawn_with(&mut sim, CharacterProfile::default(), Vec3::new(487.0, 192.0, 0.0));
    sim.chars.get_mut(r).unwrap().vel = Vec3::new(1.0, 0.0, 0.0);

    sim.tick();

    let chr = sim.chars.get(r).unwrap();
    assert!(chr.vel.x <= 0.0);
    assert!(chr.pos.x < 512.0);
    assert!(chr.ai.has(AlertFlags::BLOCKED));
    assert!(sim.mesh.test_wall(chr.pos_xy(), 0.0, TileFlags::WALL).is_empty());
}

// ============================================================
// S5: mounted jump
// ============================================================

#[test]
fn test_rider_jumps_off_mount() {
    let mut sim = sim_on(MeshBuilder::new(8, 8).build());
    let model = biped(&mut sim);
    let horse = spawn_with(
        &mut sim,
        CharacterProfile {
            name: "Horse".into(),
            model: Some(model),
            is_mount: true,
            ..CharacterProfile::default()
        },
        Vec3::new(400.0, 400.0, 0.0),
    );
    let rider = spawn_with(
        &mut sim,
        CharacterProfile {
            model: Some(model),
            ..CharacterProfile::default()
        },
        Vec3::new(300.0, 300.0, 0.0),
    );
    let sword = spawn_with(&mut sim, CharacterProfile::item("Sword"), Vec3::new(310.0, 300.0, 0.0));
    sim.tick();
    sim.attach(sword, rider, GRIP_RIGHT).unwrap();
    sim.attach(rider, horse, GRIP_ONLY).unwrap();
    sim.tick();

    sim.set_latch(rider, Latch::new(Vec2::ZERO, LatchButtons::JUMP));
    sim.tick();

    let chr = sim.chars.get(rider).unwrap();
    assert_eq!(chr.attached_to, None);
    assert_eq!(chr.timers.jump, JUMPDELAY);
    // one tick of gravity at most
    assert!(chr.vel.z >= DISMOUNTZVEL - 1.0, "vz = {}", chr.vel.z);
    assert_eq!(chr.holding(Slot::Right), Some(sword));
    assert_eq!(chr.holding(Slot::Left), None);
    assert_eq!(sim.chars.get(sword).unwrap().attached_to, Some(rider));
    assert_eq!(sim.chars.get(horse).unwrap().holding(Slot::Left), None);
}

// ============================================================
// S6: frame FX footfall
// ============================================================

#[test]
fn test_footfall_fires_once_on_its_frame() {
    let mut sim = sim_on(MeshBuilder::new(8, 8).build());
    let model = biped(&mut sim);
    let r = spawn_with(
        &mut sim,
        CharacterProfile {
            model: Some(model),
            sound_footfall: Some(3),
            ..CharacterProfile::default()
        },
        Vec3::new(300.0, 300.0, 0.0),
    );
    sim.tick();
    assert!(sim.play_action(r, Action::WB, true));
    sim.chars.get_mut(r).unwrap().inst.action_loop = true;
    sim.drain_events();

    let footfalls = |events: Vec<SimEvent>| {
        events
            .iter()
            .filter(|e| matches!(e, SimEvent::Sound { kind: SoundKind::Footfall, sound: 3, .. }))
            .count()
    };

    // four ticks per frame: frames 5 and 6 come first
    sim.run(11);
    assert_eq!(footfalls(sim.drain_events()), 0);

    sim.tick();
    assert_eq!(sim.chars.get(r).unwrap().inst.frame_nxt, 7);
    assert_eq!(footfalls(sim.drain_events()), 1);

    // the rest of frame 7, then back to the start of the loop
    sim.run(4);
    assert_eq!(sim.chars.get(r).unwrap().inst.frame_nxt, 4);
    assert_eq!(footfalls(sim.drain_events()), 0);
}
