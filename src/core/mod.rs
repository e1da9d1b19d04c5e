pub mod assessment;
pub mod error;
pub mod profile;
pub mod risk;
pub mod store;

pub use assessment::{extract_level, extract_score, parse_score, RiskAssessment};
pub use error::{HealthError, Result};
pub use profile::UserProfile;
pub use risk::{estimate, estimate_input, ComponentScores, LifestyleInput, RiskLevel, StressLevel};
pub use store::{ProfileStore, Profiles};
