use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slider bounds shared by every input surface (web form, CLI flags).
pub const MAX_SLEEP_HOURS: u32 = 12;
pub const MAX_EXERCISE_DAYS: u32 = 7;
pub const MAX_WATER_GLASSES: u32 = 15;
pub const MAX_SCREEN_HOURS: u32 = 16;

const SLEEP_TARGET: i32 = 7;
const EXERCISE_TARGET: i32 = 7;
const WATER_TARGET: i32 = 8;
const SCREEN_ALLOWANCE: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StressLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl StressLevel {
    pub const ALL: [StressLevel; 3] = [StressLevel::Low, StressLevel::Medium, StressLevel::High];

    /// Fixed contribution of the stress lookup table.
    pub fn weight(self) -> i32 {
        match self {
            StressLevel::Low => 5,
            StressLevel::Medium => 15,
            StressLevel::High => 30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::Medium => "Medium",
            StressLevel::High => "High",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StressLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(StressLevel::Low),
            "medium" => Ok(StressLevel::Medium),
            "high" => Ok(StressLevel::High),
            other => Err(format!("unknown stress level: {}", other)),
        }
    }
}

/// One submission of the lifestyle form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifestyleInput {
    #[serde(rename = "sleep")]
    pub sleep_hours: u32,
    #[serde(rename = "exercise")]
    pub exercise_days: u32,
    #[serde(rename = "water")]
    pub water_glasses: u32,
    #[serde(rename = "screen")]
    pub screen_hours: u32,
    #[serde(rename = "stress")]
    pub stress_level: StressLevel,
}

impl Default for LifestyleInput {
    fn default() -> Self {
        Self {
            sleep_hours: 7,
            exercise_days: 3,
            water_glasses: 6,
            screen_hours: 6,
            stress_level: StressLevel::Medium,
        }
    }
}

impl LifestyleInput {
    pub fn new(
        sleep_hours: u32,
        exercise_days: u32,
        water_glasses: u32,
        screen_hours: u32,
        stress_level: StressLevel,
    ) -> Self {
        Self {
            sleep_hours,
            exercise_days,
            water_glasses,
            screen_hours,
            stress_level,
        }
    }

    /// Pin every field into its slider range.
    pub fn clamped(self) -> Self {
        Self {
            sleep_hours: self.sleep_hours.min(MAX_SLEEP_HOURS),
            exercise_days: self.exercise_days.min(MAX_EXERCISE_DAYS),
            water_glasses: self.water_glasses.min(MAX_WATER_GLASSES),
            screen_hours: self.screen_hours.min(MAX_SCREEN_HOURS),
            stress_level: self.stress_level,
        }
    }
}

/// Per-metric contributions to the local risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScores {
    #[serde(rename = "Sleep")]
    pub sleep: i32,
    #[serde(rename = "Exercise")]
    pub exercise: i32,
    #[serde(rename = "Hydration")]
    pub hydration: i32,
    #[serde(rename = "Screen Time")]
    pub screen_time: i32,
    #[serde(rename = "Stress")]
    pub stress: i32,
}

impl ComponentScores {
    /// Components in display order, labelled.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i32)> {
        [
            ("Sleep", self.sleep),
            ("Exercise", self.exercise),
            ("Hydration", self.hydration),
            ("Screen Time", self.screen_time),
            ("Stress", self.stress),
        ]
        .into_iter()
    }

    pub fn total(&self) -> i32 {
        self.iter().map(|(_, v)| v).sum()
    }
}

/// Display band of a total score. The model is asked to use the same labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s < 35 => RiskLevel::Low,
            s if s < 65 => RiskLevel::Moderate,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic deficit/excess heuristic. Inputs outside the slider
/// bounds are the caller's problem; the exercise term is not clamped.
pub fn estimate(
    sleep_hours: u32,
    exercise_days: u32,
    water_glasses: u32,
    screen_hours: u32,
    stress: StressLevel,
) -> (ComponentScores, i32) {
    let sleep = sleep_hours as i32;
    let exercise = exercise_days as i32;
    let water = water_glasses as i32;
    let screen = screen_hours as i32;

    let components = ComponentScores {
        sleep: (SLEEP_TARGET - sleep).max(0) * 3,
        exercise: (EXERCISE_TARGET - exercise) * 3,
        hydration: (WATER_TARGET - water).max(0) * 2,
        screen_time: (screen - SCREEN_ALLOWANCE).max(0) * 2,
        stress: stress.weight(),
    };
    let total = components.total();

    (components, total)
}

/// Convenience wrapper over [`estimate`] for a whole form submission.
pub fn estimate_input(input: &LifestyleInput) -> (ComponentScores, i32) {
    estimate(
        input.sleep_hours,
        input.exercise_days,
        input.water_glasses,
        input.screen_hours,
        input.stress_level,
    )
}
