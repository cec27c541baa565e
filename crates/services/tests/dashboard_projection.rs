mod common;

use std::sync::Arc;

use common::{ScriptedAi, full_analysis, resume, workflow};
use interview_core::model::{Stage, SubmitKind};
use services::dashboard::{CompletedSort, DashboardService, InProgressSort, SortDirection};
use storage::repository::{InMemoryRepository, SessionStore};

async fn complete_interview(store: &Arc<dyn SessionStore>, name: &str, email: &str, score: u8) {
    let ai = Arc::new(
        ScriptedAi::new(Some(full_analysis(name, email, Some("555-123-4567"), 50))).scoring(score),
    );
    let mut flow = workflow(ai, store.clone());
    flow.upload_resume(&resume("cv.txt")).await.unwrap();
    flow.start_interview().await.unwrap();
    for _ in 0..6 {
        flow.present_current().await.unwrap();
        flow.submit("A considered answer.", SubmitKind::Manual)
            .await
            .unwrap();
    }
    flow.evaluate_and_finish().await.unwrap();
}

async fn seeded() -> (DashboardService, Arc<dyn SessionStore>) {
    let store: Arc<dyn SessionStore> = Arc::new(InMemoryRepository::new());
    complete_interview(&store, "Ada Lovelace", "ada@example.com", 90).await;
    complete_interview(&store, "Grace Hopper", "grace@navy.mil", 40).await;

    let ai = Arc::new(ScriptedAi::new(Some(full_analysis(
        "Alan Turing",
        "alan@example.com",
        None,
        50,
    ))));
    let mut pending = workflow(ai, store.clone());
    pending.upload_resume(&resume("alan.txt")).await.unwrap();
    pending.flush().await;

    (DashboardService::new(store.clone()), store)
}

#[tokio::test]
async fn completed_sorts_by_score_and_name() {
    let (dashboard, _) = seeded().await;

    let by_score = dashboard
        .completed("", CompletedSort::Score, SortDirection::Descending)
        .await
        .unwrap();
    let names: Vec<&str> = by_score.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Ada Lovelace", "Grace Hopper"]);
    // round(90 * 0.8 + 50 * 0.2) and round(40 * 0.8 + 50 * 0.2)
    assert_eq!(by_score[0].final_score.value(), 82);
    assert_eq!(by_score[1].final_score.value(), 42);

    let by_name = dashboard
        .completed("", CompletedSort::Name, SortDirection::Descending)
        .await
        .unwrap();
    assert_eq!(by_name[0].name, "Grace Hopper");
}

#[tokio::test]
async fn filter_matches_name_or_email_case_insensitively() {
    let (dashboard, _) = seeded().await;

    let hits = dashboard
        .completed("NAVY", CompletedSort::Score, SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Grace Hopper");

    assert!(
        dashboard
            .completed("nobody", CompletedSort::Score, SortDirection::Ascending)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn in_progress_rows_carry_progress() {
    let (dashboard, _) = seeded().await;

    let rows = dashboard
        .in_progress("", InProgressSort::LastActivity, SortDirection::Descending)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Alan Turing");
    assert_eq!(rows[0].stage, Stage::CollectingInfo);
    assert_eq!(rows[0].percent, 25);
}

#[tokio::test]
async fn candidate_detail_reports_question_average() {
    let (dashboard, _) = seeded().await;
    let top = dashboard
        .completed("ada", CompletedSort::Score, SortDirection::Descending)
        .await
        .unwrap();

    let detail = dashboard.candidate(top[0].candidate_id).await.unwrap();
    assert_eq!(detail.record.questions.len(), 6);
    assert!((detail.question_average - 90.0).abs() < f64::EPSILON);

    let counts = dashboard.counts().await.unwrap();
    assert_eq!((counts.in_progress, counts.completed), (1, 2));
}
