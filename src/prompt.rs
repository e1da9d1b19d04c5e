//! Message assembly for the two model calls.

use crate::ai_provider::ChatMessage;
use crate::core::LifestyleInput;

pub const HEALTH_ASSISTANT_PROMPT: &str =
    "You are a helpful health AI assistant. Provide general wellness advice only. No medical diagnosis.";

pub fn analysis_prompt(input: &LifestyleInput) -> String {
    format!(
        "Based on:\n\
         Sleep: {} hours\n\
         Exercise: {} days/week\n\
         Water: {} glasses/day\n\
         Screen Time: {} hours/day\n\
         Stress: {}\n\
         \n\
         Provide:\n\
         Risk Score (0-100)\n\
         Risk Level (Low/Moderate/High)\n\
         Short Explanation\n\
         3 Recommendations\n\
         \n\
         Start your answer with a line of the form \"Risk Score: <number>\".",
        input.sleep_hours,
        input.exercise_days,
        input.water_glasses,
        input.screen_hours,
        input.stress_level,
    )
}

pub fn analysis_messages(input: &LifestyleInput) -> Vec<ChatMessage> {
    vec![ChatMessage::user(analysis_prompt(input))]
}

/// System instruction followed by the last `window` turns of `history`.
pub fn chat_messages(history: &[ChatMessage], window: usize) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(window);
    std::iter::once(ChatMessage::system(HEALTH_ASSISTANT_PROMPT))
        .chain(history[start..].iter().cloned())
        .collect()
}
