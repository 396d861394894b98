//! Challenge command handlers for the CLI.

use clap::Subcommand;
use tribeline_core::{DocumentStore, UserId, CATALOG};
use tribeline_engine::{ClaimOutcome, Engine, NotificationStatus};

/// Sub-commands available under `challenges`.
#[derive(Debug, Subcommand)]
pub enum ChallengeCommands {
    /// Print the challenge catalog
    List,
    /// Evaluate one challenge for a user
    Check {
        #[arg(long)]
        user: String,
        /// Challenge id, 1 through 17
        #[arg(long)]
        id: u32,
        /// Send the completion notification when satisfied
        #[arg(long)]
        notify: bool,
    },
    /// Evaluate and, if satisfied, credit a challenge exactly once
    Claim {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: u32,
    },
}

pub(crate) fn run_challenges_list() {
    println!("{:<4}{:<22}{:<11}{:<7}DESCRIPTION", "ID", "NAME", "LEVEL", "STARS");
    for def in CATALOG {
        println!(
            "{:<4}{:<22}{:<11}{:<7}{}",
            def.id,
            def.name,
            def.difficulty.label(),
            def.star_reward,
            def.description
        );
    }
}

/// Evaluate challenge `id` for `user`, optionally notifying.
///
/// # Errors
///
/// Returns an error for an unknown challenge id or when the store cannot be
/// read; a store failure is never reported as "not satisfied".
pub(crate) async fn run_challenge_check<S: DocumentStore>(
    engine: &Engine<S>,
    user: &UserId,
    id: u32,
    notify: bool,
) -> anyhow::Result<()> {
    if !notify {
        let satisfied = engine.evaluate(id, user).await?;
        println!("challenge {id} for {user}: {}", verdict(satisfied));
        return Ok(());
    }

    let outcome = engine.evaluate_and_notify(id, user).await?;
    let note = match &outcome.notification {
        NotificationStatus::NotSent => String::new(),
        NotificationStatus::Sent => " (notification sent)".to_string(),
        NotificationStatus::AlreadyCompleted => " (already completed)".to_string(),
        NotificationStatus::Failed { reason } => format!(" (notification failed: {reason})"),
    };
    println!(
        "challenge {id} for {user}: {}{note}",
        verdict(outcome.satisfied)
    );
    Ok(())
}

/// Claim challenge `id` for `user`.
///
/// # Errors
///
/// Returns an error for an unknown challenge id or a store failure.
pub(crate) async fn run_challenge_claim<S: DocumentStore>(
    engine: &Engine<S>,
    user: &UserId,
    id: u32,
) -> anyhow::Result<()> {
    match engine.claim(id, user).await? {
        ClaimOutcome::NotSatisfied => println!("challenge {id} for {user}: not yet earned"),
        ClaimOutcome::AlreadyClaimed => println!("challenge {id} for {user}: already claimed"),
        ClaimOutcome::Claimed {
            stars_awarded,
            total_stars,
            ..
        } => println!(
            "challenge {id} for {user}: claimed +{stars_awarded} stars ({total_stars} total)"
        ),
    }
    Ok(())
}

fn verdict(satisfied: bool) -> &'static str {
    if satisfied {
        "satisfied"
    } else {
        "not yet earned"
    }
}
