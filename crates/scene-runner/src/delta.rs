//! Simulated delta robot
//!
//! Stands in for the device transport: movements are queued or performed
//! against an in-memory effector position, and performing one takes its
//! duration (scaled by `time_scale`) of wall-clock time.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Duration of the simple directional moves, in milliseconds
pub const SIMPLE_MOVE_DURATION_MS: u64 = 1500;

/// Effector position in millimetres
pub type Point = [f64; 3];

/// How movement points are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveReference {
    Absolute,
    #[default]
    Relative,
}

/// One movement of the effector along a polyline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    #[serde(default)]
    pub reference: MoveReference,
    /// Duration in milliseconds
    pub duration: u64,
    pub points: Vec<Point>,
}

impl Movement {
    /// Straight relative move by `offset`
    pub fn line(id: i64, offset: Point) -> Self {
        Self {
            id,
            reference: MoveReference::Relative,
            duration: SIMPLE_MOVE_DURATION_MS,
            points: vec![[0.0, 0.0, 0.0], offset],
        }
    }

    /// Where the effector ends up when starting at `from`
    pub fn target(&self, from: Point) -> Point {
        let Some(last) = self.points.last() else {
            return from;
        };
        match self.reference {
            MoveReference::Absolute => *last,
            MoveReference::Relative => [from[0] + last[0], from[1] + last[1], from[2] + last[2]],
        }
    }
}

/// Axis-aligned moves offered as simple actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Forward,
        Self::Back,
    ];

    /// Action name, e.g. `move_up`
    pub fn action(&self) -> &'static str {
        match self {
            Self::Up => "move_up",
            Self::Down => "move_down",
            Self::Left => "move_left",
            Self::Right => "move_right",
            Self::Forward => "move_forward",
            Self::Back => "move_back",
        }
    }

    /// Offset for moving `amount` in this direction
    pub fn offset(&self, amount: f64) -> Point {
        match self {
            Self::Up => [0.0, 0.0, amount],
            Self::Down => [0.0, 0.0, -amount],
            Self::Left => [amount, 0.0, 0.0],
            Self::Right => [-amount, 0.0, 0.0],
            Self::Forward => [0.0, amount, 0.0],
            Self::Back => [0.0, -amount, 0.0],
        }
    }
}

#[derive(Debug, Default)]
struct DeltaState {
    position: Point,
    queue: VecDeque<Movement>,
}

/// In-memory delta robot
#[derive(Debug)]
pub struct SimulatedDelta {
    state: Mutex<DeltaState>,
    time_scale: f64,
}

impl SimulatedDelta {
    /// `time_scale` multiplies every movement duration; 0 moves instantly
    pub fn new(time_scale: f64) -> Self {
        Self {
            state: Mutex::new(DeltaState::default()),
            time_scale: time_scale.max(0.0),
        }
    }

    pub async fn position(&self) -> Point {
        self.state.lock().await.position
    }

    pub async fn queued(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Append a movement to the queue without starting it
    pub async fn enqueue(&self, movement: Movement) -> usize {
        let mut state = self.state.lock().await;
        debug!(id = movement.id, "Movement queued");
        state.queue.push_back(movement);
        state.queue.len()
    }

    /// Perform one movement and return the new position
    pub async fn perform(&self, movement: Movement) -> Point {
        let millis = (movement.duration as f64 * self.time_scale) as u64;
        tokio::time::sleep(Duration::from_millis(millis)).await;

        let mut state = self.state.lock().await;
        state.position = movement.target(state.position);
        debug!(id = movement.id, position = ?state.position, "Movement finished");
        state.position
    }

    /// Perform every queued movement in order and return the final position
    pub async fn execute_queue(&self) -> Point {
        let queued: Vec<Movement> = self.state.lock().await.queue.drain(..).collect();

        let mut position = self.position().await;
        for movement in queued {
            position = self.perform(movement).await;
        }
        position
    }
}
