//! End-to-end behaviour of the cascade with the shipped models and tables.

mod common;

use std::sync::Arc;

use mindful_cascade::model::ModelArtifact;
use mindful_cascade::response::ResponseSelector;
use mindful_cascade::{load_cascade, Session, StageId, StartupError};

use common::{shipped_cascade, shipped_settings};

const CRISIS_MESSAGES: &[&str] = &[
    "I don't want to live anymore",
    "I'm having a panic attack",
    "I want to hurt myself",
    "Honestly I can't breathe right now",
];

#[test]
fn suicidal_message_gets_hotline() {
    let reply = shipped_cascade().respond("I don't want to live anymore");
    assert_eq!(reply.stage(), StageId::Crisis);
    assert_eq!(reply.label(), "suicidal_thoughts");
    assert!(reply.text.contains("988"), "no hotline in {:?}", reply.text);
}

#[test]
fn reworded_suicidal_messages_still_get_hotline() {
    let cascade = shipped_cascade();
    for text in [
        "I don\u{2019}t want to live anymore",
        "I dont want to live anymore",
        "i really don't want to live any more",
        "I DON'T WANT TO LIVE ANYMORE...",
    ] {
        let reply = cascade.respond(text);
        assert_eq!(reply.stage(), StageId::Crisis, "for {:?}", text);
        assert_eq!(reply.label(), "suicidal_thoughts", "for {:?}", text);
        assert!(reply.text.contains("988"), "no hotline in {:?}", reply.text);
    }
}

#[test]
fn job_loss_is_exploration() {
    let cascade = shipped_cascade();
    let selector = ResponseSelector::load_from_file(&shipped_settings().responses.file).unwrap();
    let candidates = selector.table(StageId::Flow).candidates("exploration").unwrap();

    let reply = cascade.respond("It started when I lost my job");
    assert_eq!(reply.stage(), StageId::Flow);
    assert_eq!(reply.label(), "exploration");
    assert!(candidates.contains(&reply.text));
}

#[test]
fn unmatched_message_gets_empathy_default() {
    let cascade = shipped_cascade();
    let selector = ResponseSelector::load_from_file(&shipped_settings().responses.file).unwrap();

    let reply = cascade.respond("Can we discuss the weather");
    assert_eq!(reply.stage(), StageId::Empathy);
    assert_eq!(reply.text, selector.table(StageId::Empathy).default_response());
}

#[test]
fn crisis_takes_priority_over_other_stages() {
    let cascade = shipped_cascade();
    let mixed = [
        "I've been feeling really anxious lately and I'm having a panic attack",
        "It started when I lost my job and now I don't want to live anymore",
        "I'm so stressed about my job, I want to hurt myself",
    ];
    for text in mixed {
        let reply = cascade.respond(text);
        assert_eq!(reply.stage(), StageId::Crisis, "for {:?}", text);
    }
    for text in CRISIS_MESSAGES {
        assert_eq!(cascade.respond(text).stage(), StageId::Crisis, "for {:?}", text);
    }
}

#[test]
fn flow_takes_priority_over_empathy() {
    let reply = shipped_cascade().respond("I've been feeling really anxious lately");
    assert_eq!(reply.stage(), StageId::Flow);
    assert_eq!(reply.label(), "initial_disclosure");
}

#[test]
fn emotion_answers_when_flow_does_not_apply() {
    let reply = shipped_cascade().respond("I'm so stressed about my job");
    assert_eq!(reply.stage(), StageId::Empathy);
    assert_eq!(reply.label(), "stress");
}

#[test]
fn every_message_gets_a_non_empty_reply() {
    let cascade = shipped_cascade();
    for text in ["", "   ", "?", "Can we discuss the weather", "ok", "🙂"] {
        let reply = cascade.respond(text);
        assert!(!reply.text.trim().is_empty(), "empty reply for {:?}", text);
    }
}

#[test]
fn transcript_keeps_every_turn_in_order() {
    let mut session = Session::new(Arc::new(shipped_cascade()));
    let inputs = [
        "I need to talk about something",
        "It started when I lost my job",
        "Thank you for listening",
    ];
    let replies: Vec<String> = inputs.iter().map(|t| session.turn(t).text).collect();

    let entries = session.transcript().all();
    assert_eq!(entries.len(), inputs.len());
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.ordinal(), i + 1);
        assert_eq!(entry.user_text(), inputs[i]);
        assert_eq!(entry.bot_text(), replies[i]);
    }
}

#[test]
fn shipped_artifacts_parse() {
    let paths = shipped_settings().models.paths();
    assert!(paths.missing().is_empty());
    for path in paths.all() {
        ModelArtifact::load_from_file(path).unwrap();
    }
}

#[test]
fn missing_artifact_fails_startup() {
    let mut settings = shipped_settings();
    settings.models.flow_model = "does_not_exist.json".into();
    match load_cascade(&settings) {
        Err(StartupError::Model(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("cascade built without a flow model"),
    }
}
