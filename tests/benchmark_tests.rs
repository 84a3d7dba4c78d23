//! Performance benchmarks for critical game systems

use server::game::GameState;
use shared::protocol::{encode_frame, FrameReader};
use shared::{Bullet, ClientMessage, ServerMessage, World, ARENA_HEIGHT};
use std::time::Instant;

/// A world with two tanks and `count` bullets spread across open lanes
fn busy_world(count: usize) -> World {
    let mut world = World::new();
    world.add_tank(0);
    world.add_tank(1);
    world.start_match();

    for i in 0..count {
        let x = 40.0 + (i % 700) as f32;
        let y = if i % 2 == 0 { 60.0 } else { ARENA_HEIGHT - 60.0 };
        world.bullets.push(Bullet::new(x, y, 0.0, (i % 2) as u32));
    }

    world
}

/// Benchmarks the simulation tick with many bullets in flight
#[test]
fn benchmark_tick_with_bullets() {
    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut world = busy_world(200);
        world.advance(0.033);
    }

    let duration = start.elapsed();
    println!(
        "Tick with 200 bullets: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks a full match worth of ticks
#[test]
fn benchmark_full_match() {
    let mut game = GameState::new();
    game.join();
    game.join();

    let ticks = (60.0 / 0.033) as usize + 1;
    let start = Instant::now();

    for i in 0..ticks {
        if i % 10 == 0 {
            game.handle_message(0, ClientMessage::Shoot);
            game.handle_message(1, ClientMessage::Shoot);
        }
        game.update(0.033);
    }

    let duration = start.elapsed();
    println!(
        "Full match: {} ticks in {:?} ({:.2} μs/tick)",
        ticks,
        duration,
        duration.as_micros() as f64 / ticks as f64
    );

    assert!(game.world.game_ended);
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks snapshot serialization as done once per broadcast
#[test]
fn benchmark_snapshot_encoding() {
    let world = busy_world(100);
    let iterations = 5_000;
    let start = Instant::now();

    let mut total_bytes = 0;
    for _ in 0..iterations {
        let frame = encode_frame(&ServerMessage::State {
            data: world.snapshot(),
        })
        .unwrap();
        total_bytes += frame.len();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot encoding: {} iterations in {:?} ({:.2} μs/iter, {} bytes/frame)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64,
        total_bytes / iterations
    );

    assert!(duration.as_millis() < 3000);
}

/// Benchmarks frame splitting and decoding on a coalesced stream
#[tokio::test]
async fn benchmark_frame_decoding() {
    let frame = encode_frame(&ClientMessage::Move {
        dx: 3.0,
        dy: -3.0,
        angle: Some(1.25),
    })
    .unwrap();

    let iterations = 50_000;
    let stream: Vec<u8> = frame
        .iter()
        .copied()
        .cycle()
        .take(frame.len() * iterations)
        .collect();
    let mut reader = FrameReader::new(stream.as_slice());

    let start = Instant::now();
    let mut decoded = 0;
    while let Some(message) = reader.next_frame::<ClientMessage>().await.unwrap() {
        assert!(matches!(message, Ok(ClientMessage::Move { .. })));
        decoded += 1;
    }

    let duration = start.elapsed();
    println!(
        "Frame decoding: {} frames in {:?} ({:.2} ns/frame)",
        decoded,
        duration,
        duration.as_nanos() as f64 / decoded as f64
    );

    assert_eq!(decoded, iterations);
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks merging snapshots into a client-side view
#[test]
fn benchmark_snapshot_merge() {
    let source = busy_world(100);
    let snapshot = source.snapshot();
    let mut view = World::new();

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        view.apply_snapshot(&snapshot);
    }

    let duration = start.elapsed();
    println!(
        "Snapshot merge: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(view.tanks.len(), 2);
    assert_eq!(view.bullets.len(), 100);
    assert!(duration.as_millis() < 3000);
}
