use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use log::{info, error};
use tokio::io::{AsyncBufReadExt, BufReader};
use swipe_interview::config::AppConfig;
use swipe_interview::database::{Candidate, CandidateProfile, CandidateStatus, CandidateStore, CandidateUpdate};
use swipe_interview::interview::{ControllerHandle, InterviewEvent, ResumeOutcome};
use swipe_interview::session::SessionManager;

const USAGE: &str = "usage: swipe-interview <name> <email> <phone> [resume.txt]";

const HELP: &str = "Type your answer and press Enter. Commands: \
/pause /resume /away /back /retry /reset /status /quit";

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error running interview: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::var("INTERVIEW_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .init();
    config.log_summary();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        return Err(anyhow!(USAGE));
    }
    let resume_text = match args.get(3) {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?,
        None => String::new(),
    };

    let mut candidate = Candidate::new(resume_text);
    candidate
        .complete_profile(CandidateProfile {
            name: args[0].clone(),
            email: args[1].clone(),
            phone: args[2].clone(),
            summary: None,
        })
        .context("Profile is incomplete")?;

    let store = CandidateStore::new();
    store.add_candidate(candidate.clone());

    let manager = SessionManager::from_config(&config);
    let (handle, mut events) = manager.start_session(candidate.clone()).await?;
    handle.start().await?;
    store.update_candidate(&candidate.id, CandidateUpdate::status(CandidateStatus::InProgress))?;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if let InterviewEvent::TimerTick { remaining } = event {
                    // keep the terminal readable
                    if remaining > 5 && remaining % 10 != 0 {
                        continue;
                    }
                }
                let line = event.describe();
                if !line.is_empty() {
                    println!("{}", line);
                }
                if let InterviewEvent::CandidateFinalized { candidate } = event {
                    store.apply_finalized(candidate)?;
                    let metrics = store.metrics();
                    println!(
                        "Candidates: {} total, {} completed, average score {}%",
                        metrics.total_candidates, metrics.completed, metrics.average_score
                    );
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else { break };
                match handle_input(&handle, &candidate, line.trim()).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => println!("⚠️  {}", e),
                }
            }
        }
    }

    if let Err(e) = manager.end_session(&candidate.id).await {
        error!("Failed to close session: {}", e);
    }
    info!("Interview host exiting");
    Ok(())
}

async fn handle_input(handle: &ControllerHandle, candidate: &Candidate, input: &str) -> Result<Flow> {
    match input {
        "/pause" => handle.pause().await?,
        "/resume" => {
            if handle.resume().await? == ResumeOutcome::WelcomeBackRequired {
                println!("Type /back to continue or /reset to start over.");
            }
        }
        "/away" => {
            if !handle.visibility_lost().await? {
                println!("Only a paused interview can be left.");
            }
        }
        "/back" => handle.confirm_welcome_back().await?,
        "/retry" => {
            let snapshot = handle.snapshot().await?;
            handle.begin_round(snapshot.round_index).await?;
        }
        "/reset" => {
            handle.reset().await?;
            handle.mark_ready(candidate.clone()).await?;
            handle.start().await?;
        }
        "/status" => {
            let snapshot = handle.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        "/quit" => return Ok(Flow::Quit),
        answer => handle.submit_answer(answer).await?,
    }
    Ok(Flow::Continue)
}
