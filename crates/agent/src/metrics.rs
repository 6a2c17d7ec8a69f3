//! Conversation counters
//!
//! Recorded through the `metrics` facade; the embedding application decides
//! whether an exporter is installed.

use metrics::counter;

pub fn record_session_started() {
    counter!("voice_coach_sessions_started_total").increment(1);
}

pub fn record_response_requested(trigger: &'static str) {
    counter!("voice_coach_responses_requested_total", "trigger" => trigger).increment(1);
}

pub fn record_user_utterance() {
    counter!("voice_coach_user_utterances_total").increment(1);
}

pub fn record_assistant_message() {
    counter!("voice_coach_assistant_messages_total").increment(1);
}
