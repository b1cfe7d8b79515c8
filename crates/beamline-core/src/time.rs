/// Simulation frames per second.
pub const GAME_SPEED: u32 = 30;

/// Simulation frame counter.
pub type Frame = u32;

/// Convert a duration in seconds to whole simulation frames (truncating).
pub fn seconds_to_frames(secs: f32) -> i32 {
    (secs * GAME_SPEED as f32) as i32
}
