pub fn word_key(word_id: &str) -> String {
    word_id.to_string()
}

pub fn progress_key(learner_id: &str, word_id: &str) -> String {
    format!("{}:{}", learner_id, word_id)
}

pub fn progress_prefix(learner_id: &str) -> String {
    format!("{}:", learner_id)
}

pub fn placement_session_key(session_id: &str) -> String {
    session_id.to_string()
}

pub fn placement_active_key(learner_id: &str) -> String {
    learner_id.to_string()
}

pub fn activity_key(learner_id: &str) -> String {
    learner_id.to_string()
}
