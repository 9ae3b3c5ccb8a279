//! Drives one runtime session for a parsed command line.
use anyhow::{Context, Result};
use tracing::{info, warn};

use ctman_core::{Command, RunOutcome, RunReport, SessionState, Step, StepOutcome};
use ctman_runtime::{LoadTarget, Runtime, SessionHandle, SnapshotId};

use crate::cli::Action;

pub struct App {
    runtime: Runtime,
}

impl App {
    pub fn new(runtime: Runtime) -> Self {
        Self { runtime }
    }

    pub async fn execute(self, action: Action) -> Result<()> {
        let handle = self.runtime.handle();

        match action {
            Action::Play {
                commands,
                load,
                save,
            } => play(&handle, commands, load, save).await?,
            Action::Saves => list_saves(&handle).await?,
            Action::Delete { id } => {
                handle.delete_save(SnapshotId::new(id.clone())).await?;
                println!("deleted {id}");
            }
            Action::Maze { load } => {
                if let Some(target) = load {
                    handle.load(target).await?;
                }
                print_state(&handle.query_state().await?);
            }
        }

        drop(handle);
        self.runtime.shutdown().await?;
        Ok(())
    }
}

async fn play(
    handle: &SessionHandle,
    commands: Vec<Command>,
    load: Option<LoadTarget>,
    save: Option<String>,
) -> Result<()> {
    if let Some(target) = load {
        handle.load(target).await.context("failed to load session")?;
    }

    for command in commands {
        handle
            .append_command(command)
            .await
            .with_context(|| format!("cannot queue `{command}`"))?;
    }

    let mut stream = handle.run().await?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            snapshot = stream.next_step() => match snapshot {
                Some(snapshot) => print_step(&snapshot.step),
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                // The run may have ended on its own in the meantime.
                if let Err(err) = handle.abort().await {
                    warn!(error = %err, "Abort request failed");
                }
            }
        }
    }

    let report = stream.finish().await?;
    print_report(&report);
    print_state(&handle.query_state().await?);

    if let Some(name) = save {
        let id = handle.save(name.clone()).await?;
        info!(id = %id, name = %name, "Session saved");
        println!("saved as {id}");
    }

    Ok(())
}

async fn list_saves(handle: &SessionHandle) -> Result<()> {
    let saves = handle.list_saves().await?;
    if saves.is_empty() {
        println!("no saves");
        return Ok(());
    }

    for save in saves {
        println!(
            "{}  {}  {}",
            save.id,
            save.saved_at.format("%Y-%m-%d %H:%M:%S"),
            save.name
        );
    }
    Ok(())
}

fn print_step(step: &Step) {
    let effect = match step.outcome {
        StepOutcome::Moved => String::new(),
        StepOutcome::AtePellet { reward } => format!("  +{reward}"),
        StepOutcome::Collided(collision) => format!(
            "  hit {} at {}, -{}, back to {}",
            collision.kind, collision.at, collision.penalty, collision.reset_to
        ),
    };
    println!(
        "#{:<2} {:<5} {} -> {}  score {}{}",
        step.instruction, step.direction, step.from, step.player, step.score, effect
    );
}

fn print_report(report: &RunReport) {
    let outcome = match report.outcome {
        RunOutcome::Completed => "completed".to_owned(),
        RunOutcome::Collided(collision) => format!("collided with {}", collision.kind),
        RunOutcome::Aborted => format!(
            "aborted ({} commands kept in the queue)",
            report.retained_commands
        ),
    };
    println!(
        "run {outcome} after {} steps: score {} -> {}",
        report.steps, report.score_before, report.score
    );
}

fn print_state(state: &SessionState) {
    println!("{}", state.grid);
    println!(
        "player {}  score {}  lives {}  iterations {}",
        state.player, state.score, state.lives, state.iterations
    );
}
