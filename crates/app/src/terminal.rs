//! Line-oriented terminal front end for interviews and the dashboard.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use interview_core::model::{
    CandidateId, ChatMessage, Sender, SessionStateError, Stage, Status, SubmitKind,
    TickOutcome,
};
use services::dashboard::{CompletedSort, DashboardService, InProgressSort, SortDirection};
use services::error::SessionError;
use services::sessions::SessionProgress;
use services::voice::TranscriptEvent;
use services::{AppServices, InterviewWorkflow};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

type Input = Lines<BufReader<Stdin>>;

enum InputEvent {
    Tick,
    Line(Option<String>),
}

/// Prints transcript messages once each.
#[derive(Default)]
struct TranscriptPrinter {
    printed: usize,
}

impl TranscriptPrinter {
    fn flush(&mut self, flow: &InterviewWorkflow) {
        let Some(session) = flow.session() else {
            return;
        };
        let messages = session.transcript().messages();
        for message in messages.iter().skip(self.printed) {
            print_message(message);
        }
        self.printed = messages.len();
    }
}

fn print_message(message: &ChatMessage) {
    let who = match message.sender {
        Sender::Ai => "Interviewer",
        Sender::User => "You",
        Sender::System => "System",
    };
    println!("[{who}] {}", message.text);
}

async fn read_line(input: &mut Input, prompt: &str) -> Result<Option<String>> {
    println!("{prompt}");
    Ok(input.next_line().await?)
}

// ─── Interview ───────────────────────────────────────────────────────────────

pub async fn run_interview(services: &AppServices, resume: Option<PathBuf>, fresh: bool) -> Result<()> {
    let mut flow = services.workflow();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut printer = TranscriptPrinter::default();

    let returning = if fresh {
        None
    } else {
        flow.resume_from_store().await?
    };
    if let Some(id) = returning {
        if let Some(session) = flow.session() {
            let p = SessionProgress::of(session);
            printer.printed = session.transcript().len();
            println!(
                "Welcome back! Your interview is {} ({} of {} questions answered).",
                p.status, p.answered, p.total
            );
        }
        let answer = flow
            .autosave_while(read_line(&mut input, "Continue where you left off? [Y/n]"))
            .await?;
        if answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("n")) {
            flow.reset();
            services.store().remove(&id).await?;
            printer.printed = 0;
        }
    }

    if flow.session().is_none_or(|s| s.stage() == Stage::Upload) {
        let path = match resume {
            Some(path) => path,
            None => match read_line(&mut input, "Path to your resume (PDF or .txt):").await? {
                Some(line) => PathBuf::from(line.trim()),
                None => return Ok(()),
            },
        };
        upload(&mut flow, &path).await?;
        printer.flush(&flow);
    }

    if !collect_identity(&mut flow, &mut input, &mut printer).await? {
        return Ok(());
    }

    if flow.session().is_some_and(|s| s.status() == Status::Paused) {
        flow.resume().await?;
    }
    if let Some(source) = flow.start_interview().await? {
        debug!(?source, "question batch");
    }
    printer.flush(&flow);
    println!("Type your answer over one or more lines, then send an empty line. Commands: /skip, /pause, /quit");

    if !run_questions(&mut flow, &mut input, &mut printer).await? {
        return Ok(());
    }

    println!("Evaluating your answers...");
    let report = flow.evaluate_and_finish().await?;
    printer.flush(&flow);
    for (q, eval) in report.record.questions.iter().zip(&report.evaluations) {
        println!("\nQ{} ({}) {}: {}", q.id, q.difficulty, eval.score, eval.feedback);
        if let Some(reference) = q.reference_answer.as_deref() {
            println!("  Reference: {reference}");
        }
    }
    Ok(())
}

async fn upload(flow: &mut InterviewWorkflow, path: &Path) -> Result<()> {
    flow.upload_resume_file(path)
        .await
        .with_context(|| format!("uploading {}", path.display()))?;
    Ok(())
}

/// Returns `false` when input ended before identity was complete.
async fn collect_identity(
    flow: &mut InterviewWorkflow,
    input: &mut Input,
    printer: &mut TranscriptPrinter,
) -> Result<bool> {
    while let Some(field) = flow
        .session()
        .filter(|s| s.stage() == Stage::CollectingInfo)
        .and_then(|s| s.current_field())
    {
        let Some(line) = read_line(input, &format!("{}:", field.label())).await? else {
            flow.flush().await;
            return Ok(false);
        };
        match flow.supply_field(&line).await {
            Ok(_) => printer.flush(flow),
            Err(SessionError::State(SessionStateError::BlankInput)) => {
                println!("Please enter a value.");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Runs the question cycle. Returns `false` if the user quit or input ended.
async fn run_questions(
    flow: &mut InterviewWorkflow,
    input: &mut Input,
    printer: &mut TranscriptPrinter,
) -> Result<bool> {
    while !flow.session().is_some_and(|s| s.awaiting_evaluation()) {
        let presented = flow.present_current().await?;
        printer.flush(flow);
        println!("({}s)", presented.remaining_secs);

        let mut ticker = flow.cycle().ticker();
        loop {
            let event = tokio::select! {
                _ = ticker.tick() => InputEvent::Tick,
                line = input.next_line() => InputEvent::Line(line?),
            };
            match event {
                InputEvent::Tick => match flow.tick()? {
                    TickOutcome::Expired => {
                        println!("Time is up.");
                        flow.submit_draft(SubmitKind::Timeout).await?;
                        break;
                    }
                    TickOutcome::Running { remaining } if remaining % 15 == 0 || remaining <= 5 => {
                        println!("({remaining}s left)");
                    }
                    TickOutcome::Running { .. } | TickOutcome::Idle => {}
                },
                InputEvent::Line(None) => {
                    flow.pause().await?;
                    return Ok(false);
                }
                InputEvent::Line(Some(line)) => match line.trim() {
                    "/quit" => {
                        flow.pause().await?;
                        println!("Interview paused. Run again to continue.");
                        return Ok(false);
                    }
                    "/pause" => {
                        flow.pause().await?;
                        let resumed = flow
                            .autosave_while(read_line(input, "Paused. Press Enter to resume."))
                            .await?;
                        if resumed.is_none() {
                            return Ok(false);
                        }
                        flow.resume().await?;
                        break;
                    }
                    "/skip" => {
                        flow.submit_draft(SubmitKind::Skip).await?;
                        break;
                    }
                    "" => match flow.submit_draft(SubmitKind::Manual).await {
                        Ok(_) => break,
                        Err(SessionError::State(SessionStateError::BlankInput)) => {
                            println!("Type an answer, or /skip.");
                        }
                        Err(e) => return Err(e.into()),
                    },
                    text => flow.apply_transcript(TranscriptEvent::Final(text.to_string())),
                },
            }
        }
        printer.flush(flow);
        flow.flush().await;
    }
    Ok(true)
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

pub async fn show_completed(
    dashboard: &DashboardService,
    filter: &str,
    sort: CompletedSort,
    direction: SortDirection,
) -> Result<()> {
    let rows = dashboard.completed(filter, sort, direction).await?;
    if rows.is_empty() {
        println!("No finished interviews.");
        return Ok(());
    }
    println!("{:<6} {:<28} {:<32} {:<20} candidate", "score", "name", "email", "completed");
    for row in rows {
        println!(
            "{:<6} {:<28} {:<32} {:<20} {}",
            row.final_score.to_string(),
            row.name,
            row.email.as_deref().unwrap_or("-"),
            row.completed_at.format("%Y-%m-%d %H:%M"),
            row.candidate_id,
        );
    }
    Ok(())
}

pub async fn show_in_progress(
    dashboard: &DashboardService,
    filter: &str,
    sort: InProgressSort,
    direction: SortDirection,
) -> Result<()> {
    let rows = dashboard.in_progress(filter, sort, direction).await?;
    if rows.is_empty() {
        println!("No unfinished interviews.");
        return Ok(());
    }
    println!("{:<28} {:<16} {:<12} {:<9} {:<8} last activity", "name", "stage", "status", "progress", "answers");
    for row in rows {
        println!(
            "{:<28} {:<16} {:<12} {:<9} {:<8} {}",
            row.name,
            row.stage.as_str(),
            row.status.as_str(),
            format!("{}%", row.percent),
            format!("{}/{}", row.answered, row.total),
            row.last_activity_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

pub async fn show_candidate(dashboard: &DashboardService, id: CandidateId) -> Result<()> {
    let detail = dashboard
        .candidate(id)
        .await
        .with_context(|| format!("no finished interview for candidate {id}"))?;
    let record = &detail.record;
    let c = &record.candidate;
    println!("{}", c.display_name());
    println!("Email: {}", c.email.as_deref().unwrap_or("-"));
    println!("Phone: {}", c.phone.as_deref().unwrap_or("-"));
    println!("Final score: {}", record.final_score);
    println!("Question average: {:.1}%", detail.question_average);
    if let Some(score) = c.resume_score {
        println!("Resume score: {score}");
    }
    println!("\n{}\n", record.final_summary);
    for q in &record.questions {
        println!(
            "Q{} [{}] {}\n  Answer: {}\n  Score: {}  Time: {}s/{}s",
            q.id,
            q.difficulty,
            q.text,
            q.answer_text(),
            q.score.map_or_else(|| "-".to_string(), |s| s.to_string()),
            q.time_spent_secs,
            q.time_limit_secs,
        );
    }
    Ok(())
}
