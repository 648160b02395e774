use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::Drill;
use crate::store::json_store::JsonStore;
use crate::store::schema::ProgressData;

/// Consecutive clean reps required to trigger one tempo step up.
const STREAK_TARGET: u32 = 3;

/// How long a level-up stays visible as a UI flash, in milliseconds.
const LEVEL_UP_FLASH_MS: i64 = 3500;

/// Most recent automatic tempo bump. `to_bpm` is the computed target and
/// may exceed the drill ceiling; the stored bpm is clamped separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub at: DateTime<Utc>,
    pub from_bpm: u32,
    pub to_bpm: u32,
}

/// Per-drill tempo progression state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillProgress {
    pub bpm: u32,
    pub clean_streak: u32,
    pub best_bpm: u32,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub last_level_up: Option<LevelUp>,
}

impl DrillProgress {
    fn seeded(start: u32, now: DateTime<Utc>) -> Self {
        Self {
            bpm: start,
            clean_streak: 0,
            best_bpm: start,
            last_activity: now,
            last_level_up: None,
        }
    }
}

/// The tempo ladder: owns the progress store and writes every mutation
/// through the persistence gateway. Records are created lazily on first
/// read and only ever reset explicitly.
pub struct TempoLadder {
    data: ProgressData,
    store: JsonStore,
}

impl TempoLadder {
    pub fn new(store: JsonStore) -> Self {
        let data = store.load_progress();
        Self { data, store }
    }

    pub fn get_or_init(&mut self, drill: &Drill) -> &DrillProgress {
        if !self.data.drills.contains_key(&drill.id) {
            let seed = DrillProgress::seeded(drill.tempo().start, Utc::now());
            self.data.drills.insert(drill.id.clone(), seed);
            self.store.save_progress(&self.data);
        }
        &self.data.drills[&drill.id]
    }

    pub fn progress(&self, drill_id: &str) -> Option<&DrillProgress> {
        self.data.drills.get(drill_id)
    }

    /// Set the practice tempo directly. Non-finite input is ignored; the
    /// value is rounded and clamped into the drill's tempo window. The
    /// clean streak resets only when the clamped value actually changes.
    pub fn set_bpm(&mut self, drill: &Drill, bpm: f64) {
        if !bpm.is_finite() {
            log::debug!("ignoring non-finite bpm for drill {}", drill.id);
            return;
        }
        let tempo = drill.tempo();
        let clamped = (bpm.round() as i64)
            .clamp(tempo.floor() as i64, tempo.ceiling() as i64) as u32;

        self.get_or_init(drill);
        let record = self.data.drills.get_mut(&drill.id).expect("seeded above");
        if clamped != record.bpm {
            record.clean_streak = 0;
        }
        record.bpm = clamped;
        record.best_bpm = record.best_bpm.max(clamped);
        record.last_activity = Utc::now();
        self.store.save_progress(&self.data);
    }

    /// Record a successful repetition. Every third consecutive clean rep
    /// bumps the tempo by one step and returns the transition. The
    /// level-up is reported even when the ceiling clamp leaves the stored
    /// bpm unchanged; the streak reset and flash fire regardless.
    pub fn record_clean_rep(&mut self, drill: &Drill) -> Option<LevelUp> {
        self.get_or_init(drill);
        let step = drill.tempo().step;
        let now = Utc::now();

        let record = self.data.drills.get_mut(&drill.id).expect("seeded above");
        record.clean_streak += 1;
        record.last_activity = now;

        if record.clean_streak < STREAK_TARGET {
            self.store.save_progress(&self.data);
            return None;
        }

        let level_up = LevelUp {
            at: now,
            from_bpm: record.bpm,
            to_bpm: record.bpm + step,
        };
        record.clean_streak = 0;
        record.last_level_up = Some(level_up);
        self.set_bpm(drill, level_up.to_bpm as f64);
        Some(level_up)
    }

    /// Record a failed repetition: the streak resets and the tempo drops
    /// one step, bottoming out at the drill floor.
    pub fn record_sloppy_rep(&mut self, drill: &Drill) {
        self.get_or_init(drill);
        let step = drill.tempo().step;

        let record = self.data.drills.get_mut(&drill.id).expect("seeded above");
        record.clean_streak = 0;
        record.last_activity = Utc::now();
        let target = record.bpm.saturating_sub(step);
        self.set_bpm(drill, target as f64);
    }

    /// Re-seed the drill to its starting tempo, discarding streak, best
    /// and level-up memory.
    pub fn reset(&mut self, drill: &Drill) {
        let seed = DrillProgress::seeded(drill.tempo().start, Utc::now());
        self.data.drills.insert(drill.id.clone(), seed);
        self.store.save_progress(&self.data);
    }
}

/// Whether a level-up flash should still be shown. Presentation hint
/// only; has no effect on ladder state.
pub fn level_up_visible(progress: &DrillProgress) -> bool {
    level_up_visible_at(progress, Utc::now())
}

pub fn level_up_visible_at(progress: &DrillProgress, now: DateTime<Utc>) -> bool {
    progress.last_level_up.is_some_and(|lu| {
        let elapsed = now.signed_duration_since(lu.at).num_milliseconds();
        (0..LEVEL_UP_FLASH_MS).contains(&elapsed)
    })
}
