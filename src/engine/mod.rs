pub mod ladder;

pub use ladder::{DrillProgress, LevelUp, TempoLadder, level_up_visible};
