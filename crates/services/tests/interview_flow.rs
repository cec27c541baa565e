mod common;

use std::sync::Arc;

use common::{ScriptedAi, full_analysis, resume, workflow};
use interview_core::model::{
    Difficulty, FieldOutcome, IdentityField, ResumeOutcome, SessionStateError, Stage, Status,
    SubmitKind, SubmitOutcome, TickOutcome,
};
use services::ai::QuestionSource;
use services::error::SessionError;
use services::sessions::GateOutcome;
use services::voice::TranscriptEvent;
use storage::repository::{InMemoryRepository, SessionStore, StoreCounts};

fn store() -> Arc<dyn SessionStore> {
    Arc::new(InMemoryRepository::new())
}

#[tokio::test]
async fn non_answers_everywhere_blend_with_resume_score() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));
    let store = store();
    let mut flow = workflow(ai.clone(), store.clone());

    let outcome = flow.upload_resume(&resume("ada.txt")).await.unwrap();
    assert_eq!(outcome, ResumeOutcome::ReadyToInterview);
    assert_eq!(
        flow.start_interview().await.unwrap(),
        Some(QuestionSource::Personalized)
    );

    for i in 0..6 {
        let presented = flow.present_current().await.unwrap();
        assert_eq!(presented.index, i);
        assert_eq!(presented.gate, GateOutcome::FallbackDelay);
        let outcome = flow.submit("I don't know", SubmitKind::Manual).await.unwrap();
        if i < 5 {
            assert_eq!(outcome, SubmitOutcome::Advanced { next_index: i + 1 });
        } else {
            assert_eq!(outcome, SubmitOutcome::ReadyForEvaluation);
        }
    }

    let report = flow.evaluate_and_finish().await.unwrap();
    // round(5 * 0.8 + 70 * 0.2)
    assert_eq!(report.final_score.value(), 18);
    assert!(report.evaluations.iter().all(|e| e.score.value() == 5));
    assert!(
        report
            .record
            .questions
            .iter()
            .all(|q| q.reference_answer.is_some())
    );
    let calls = ai.calls();
    assert!(!calls.contains(&"evaluate"));
    assert_eq!(calls.iter().filter(|c| **c == "reference").count(), 6);

    let session = flow.session().unwrap();
    assert_eq!(session.stage(), Stage::Completed);
    assert_eq!(session.current_index(), 6);
    let texts: Vec<&str> = session
        .transcript()
        .messages()
        .iter()
        .map(|m| m.text.as_str())
        .collect();
    assert!(texts.contains(&"Per-question scores: Q1: 5% | Q2: 5% | Q3: 5% | Q4: 5% | Q5: 5% | Q6: 5%"));
    assert!(
        texts
            .last()
            .unwrap()
            .starts_with("Interview completed! Your final score is 18%.")
    );

    assert_eq!(
        store.counts().await.unwrap(),
        StoreCounts {
            in_progress: 0,
            completed: 1
        }
    );
}

#[tokio::test]
async fn generic_fallback_after_two_personalized_failures() {
    let ai = Arc::new(
        ScriptedAi::new(Some(full_analysis(
            "Grace Hopper",
            "grace@example.com",
            Some("555-000-1111"),
            60,
        )))
        .failing_personalized(2),
    );
    let mut flow = workflow(ai.clone(), store());

    flow.upload_resume(&resume("grace.txt")).await.unwrap();
    assert_eq!(
        flow.start_interview().await.unwrap(),
        Some(QuestionSource::Generic)
    );

    let questions = flow.session().unwrap().questions();
    assert_eq!(questions.len(), 6);
    let difficulties: Vec<Difficulty> = questions.iter().map(|q| q.difficulty).collect();
    assert_eq!(difficulties, Difficulty::BATCH.to_vec());
    assert!(questions.iter().all(|q| q.text.starts_with("Generic")));
    assert_eq!(
        ai.calls()
            .into_iter()
            .filter(|c| *c != "analyze_resume")
            .collect::<Vec<_>>(),
        ["personalized", "personalized", "generic"]
    );
}

#[tokio::test]
async fn missing_phone_is_collected_with_one_prompt() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        None,
        80,
    ))));
    let mut flow = workflow(ai, store());

    let outcome = flow.upload_resume(&resume("ada.txt")).await.unwrap();
    assert_eq!(outcome, ResumeOutcome::NeedsFields(vec![IdentityField::Phone]));

    let session = flow.session().unwrap();
    assert_eq!(session.stage(), Stage::CollectingInfo);
    assert_eq!(
        session.transcript().count_text(IdentityField::Phone.prompt()),
        1
    );

    assert!(matches!(
        flow.supply_field("   ").await,
        Err(SessionError::State(SessionStateError::BlankInput))
    ));
    assert_eq!(
        flow.supply_field("555-123-4567").await.unwrap(),
        FieldOutcome::Complete
    );
    let session = flow.session().unwrap();
    assert_eq!(session.stage(), Stage::Interview);
    assert_eq!(
        session.candidate().and_then(|c| c.phone.as_deref()),
        Some("555-123-4567")
    );
}

#[tokio::test]
async fn failed_extraction_collects_every_field() {
    let ai = Arc::new(ScriptedAi::new(None));
    let mut flow = workflow(ai, store());

    let outcome = flow.upload_resume(&resume("blank.txt")).await.unwrap();
    assert_eq!(outcome, ResumeOutcome::NeedsFields(IdentityField::ORDER.to_vec()));

    for value in ["Ada Lovelace", "ada@example.com"] {
        assert!(matches!(
            flow.supply_field(value).await.unwrap(),
            FieldOutcome::NextField(_)
        ));
    }
    assert_eq!(
        flow.supply_field("555-123-4567").await.unwrap(),
        FieldOutcome::Complete
    );

    // No resume analysis means generic questions straight away.
    assert_eq!(
        flow.start_interview().await.unwrap(),
        Some(QuestionSource::Generic)
    );
}

#[tokio::test(start_paused = true)]
async fn autosave_writes_pending_changes_while_waiting() {
    let store = store();
    let ai = Arc::new(ScriptedAi::new(None));
    let mut flow = workflow(ai, store.clone());
    let id = flow.begin().await;
    flow.upload_resume(&resume("blank.txt")).await.unwrap();

    // Debounced: the first field changes no milestone.
    flow.supply_field("Ada Lovelace").await.unwrap();
    assert!(flow.context().is_dirty());
    let stored = store.get_by_id(&id).await.unwrap();
    assert!(stored.candidate().and_then(|c| c.name.as_deref()).is_none());

    let waited = flow
        .autosave_while(async {
            tokio::time::sleep(std::time::Duration::from_secs(6)).await;
            "answered"
        })
        .await;
    assert_eq!(waited, "answered");
    assert!(!flow.context().is_dirty());
    let stored = store.get_by_id(&id).await.unwrap();
    assert_eq!(
        stored.candidate().and_then(|c| c.name.as_deref()),
        Some("Ada Lovelace")
    );
}

#[tokio::test]
async fn pause_and_resume_wait_for_reveal() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));
    let mut flow = workflow(ai, store());
    flow.upload_resume(&resume("ada.txt")).await.unwrap();
    flow.start_interview().await.unwrap();

    let first = flow.present_current().await.unwrap();
    assert_eq!(first.remaining_secs, 20);
    assert!(matches!(flow.tick().unwrap(), TickOutcome::Running { remaining: 19 }));

    flow.pause().await.unwrap();
    let session = flow.session().unwrap();
    assert_eq!(session.status(), Status::Paused);
    assert!(!session.question_active());
    assert_eq!(session.remaining_secs(), 0);

    flow.resume().await.unwrap();
    assert_eq!(flow.tick().unwrap(), TickOutcome::Idle);
    assert!(!flow.session().unwrap().question_active());

    let again = flow.present_current().await.unwrap();
    assert_eq!(again.index, 0);
    assert_eq!(again.gate, GateOutcome::Silent);
    assert_eq!(again.remaining_secs, 20);

    let text = flow.session().unwrap().questions()[0].text.clone();
    assert_eq!(flow.session().unwrap().transcript().count_text(&text), 1);
}

#[tokio::test]
async fn second_submit_is_rejected() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));
    let mut flow = workflow(ai, store());
    flow.upload_resume(&resume("ada.txt")).await.unwrap();
    flow.start_interview().await.unwrap();
    flow.present_current().await.unwrap();

    flow.submit("Closures capture scope.", SubmitKind::Manual)
        .await
        .unwrap();
    assert!(matches!(
        flow.submit("again", SubmitKind::Manual).await,
        Err(SessionError::State(SessionStateError::QuestionInactive))
    ));
}

#[tokio::test]
async fn resuming_after_the_last_answer_goes_to_evaluation() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));
    let mut flow = workflow(ai, store());
    flow.upload_resume(&resume("ada.txt")).await.unwrap();
    flow.start_interview().await.unwrap();
    for i in 0..6 {
        flow.present_current().await.unwrap();
        flow.submit(&format!("Answer {i}"), SubmitKind::Manual)
            .await
            .unwrap();
    }
    assert!(flow.session().unwrap().awaiting_evaluation());

    flow.pause().await.unwrap();
    flow.resume().await.unwrap();
    assert!(matches!(
        flow.present_current().await,
        Err(SessionError::State(SessionStateError::AwaitingEvaluation))
    ));
    let session = flow.session().unwrap();
    assert!(session.awaiting_evaluation());
    assert_eq!(session.questions()[5].answer.as_deref(), Some("Answer 5"));

    let report = flow.evaluate_and_finish().await.unwrap();
    assert_eq!(report.evaluations.len(), 6);
}

#[tokio::test]
async fn timeout_with_blank_draft_records_empty_answer() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));
    let mut flow = workflow(ai, store());
    flow.upload_resume(&resume("ada.txt")).await.unwrap();
    flow.start_interview().await.unwrap();
    flow.present_current().await.unwrap();

    let before = flow.session().unwrap().transcript().len();
    while flow.tick().unwrap() != TickOutcome::Expired {}
    flow.submit("", SubmitKind::Timeout).await.unwrap();

    let session = flow.session().unwrap();
    assert_eq!(session.transcript().len(), before);
    assert_eq!(session.questions()[0].answer.as_deref(), Some(""));
    assert_eq!(session.questions()[0].time_spent_secs, 20);
}

#[tokio::test]
async fn timeout_submits_the_transcribed_draft() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));
    let mut flow = workflow(ai, store());
    flow.upload_resume(&resume("ada.txt")).await.unwrap();
    flow.start_interview().await.unwrap();
    flow.present_current().await.unwrap();

    flow.apply_transcript(TranscriptEvent::Final("Closures capture".into()));
    flow.apply_transcript(TranscriptEvent::Partial("their scope".into()));
    assert_eq!(flow.draft(), "Closures capture their scope");

    while flow.tick().unwrap() != TickOutcome::Expired {}
    flow.submit_draft(SubmitKind::Timeout).await.unwrap();

    let session = flow.session().unwrap();
    let first = &session.questions()[0];
    assert_eq!(first.answer.as_deref(), Some("Closures capture their scope"));
    assert_eq!(first.time_spent_secs, 20);
    assert_eq!(
        session.transcript().last().map(|m| m.text.as_str()),
        Some("Closures capture their scope")
    );
    assert!(flow.draft().is_empty());

    flow.present_current().await.unwrap();
    flow.apply_transcript(TranscriptEvent::Final("half a thought".into()));
    flow.pause().await.unwrap();
    assert!(flow.draft().is_empty());
}

#[tokio::test]
async fn returning_to_a_stored_session_comes_back_paused() {
    let store = store();
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));

    let mut first = workflow(ai.clone(), store.clone());
    let id = first.begin().await;
    first.upload_resume(&resume("ada.txt")).await.unwrap();
    first.start_interview().await.unwrap();
    first.present_current().await.unwrap();
    first.flush().await;
    assert!(first.reset().is_some());

    let mut second = workflow(ai, store);
    assert_eq!(second.resume_from_store().await.unwrap(), Some(id));
    let session = second.session().unwrap();
    assert_eq!(session.status(), Status::Paused);
    assert!(!session.first_visit());
    assert!(!session.question_active());

    second.resume().await.unwrap();
    let presented = second.present_current().await.unwrap();
    assert_eq!(presented.gate, GateOutcome::Silent);
}

#[tokio::test]
async fn evaluation_waits_for_every_answer() {
    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Ada Lovelace",
        "ada@example.com",
        Some("555-123-4567"),
        70,
    ))));
    let mut flow = workflow(ai, store());
    flow.upload_resume(&resume("ada.txt")).await.unwrap();
    flow.start_interview().await.unwrap();

    assert!(matches!(
        flow.evaluate_and_finish().await,
        Err(SessionError::State(
            SessionStateError::UnansweredQuestions { remaining: 6 }
        ))
    ));
}
