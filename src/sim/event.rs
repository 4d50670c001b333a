/// Events emitted by input handling and the simulation step.
/// The presentation layer consumes these for sound and logging.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    RunStarted,
    Jumped,
    Landed,
    TokenCollected { id: u64, value: u32, score: u32 },
    SpeedUp { speed: f32 },
    Crashed { obstacle_id: u64, score: u32 },
}
