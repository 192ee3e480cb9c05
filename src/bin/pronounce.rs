use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use pronounce::audio::read_wav_file;
use pronounce::providers::SimulatedTranscriptionProvider;
use pronounce::{
    AttemptOutcome, PracticeSession, ProviderConfig, ProviderResult, ScoreBasis,
    TranscriptOrigin, evaluate,
};

#[derive(Parser)]
#[command(name = "pronounce")]
#[command(about = "Pronounce CLI - score spoken attempts at a target word")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a transcript against the target word.
    Score {
        #[arg(short, long)]
        target: String,

        /// What the learner was heard saying (empty for silence).
        #[arg(long, default_value = "")]
        transcript: String,

        /// Print the full outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Transcribe a WAV recording with the configured backend and score it.
    /// Without --audio (or without a backend) the attempt is simulated.
    Practice {
        #[arg(short, long)]
        target: String,

        /// 16-bit PCM WAV file with the attempt.
        #[arg(long)]
        audio: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Run simulated attempts and print their scores.
    Simulate {
        #[arg(short, long)]
        target: String,

        #[arg(short, long, default_value_t = 10)]
        count: usize,

        /// Seed for reproducible transcripts.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Mean of `count` scores summing to `total`
fn mean_score(total: u64, count: usize) -> Option<f64> {
    (count > 0).then(|| total as f64 / count as f64)
}

fn print_outcome(outcome: &AttemptOutcome, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")?
        );
        return Ok(());
    }

    println!("Target:     {}", outcome.target_word);
    println!("Heard:      {}", outcome.transcript);
    println!(
        "Accuracy:   {} (encouraged: {})",
        outcome.raw_accuracy, outcome.boosted_accuracy
    );
    println!("Quality:    {}", outcome.analysis.overall_quality);
    println!("{}", outcome.feedback_message);

    for issue in &outcome.analysis.specific_issues {
        println!("  - {issue}");
    }
    for strength in &outcome.analysis.strengths {
        println!("  + {strength}");
    }
    for suggestion in &outcome.analysis.suggestions {
        println!("  > {suggestion}");
    }
    if !outcome.alternatives.is_empty() {
        println!("Also heard: {}", outcome.alternatives.join(", "));
    }
    if let TranscriptOrigin::Simulated { reason } = &outcome.origin {
        println!("(simulated: {reason})");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Score {
            target,
            transcript,
            json,
        } => {
            let config = ProviderConfig::from_env().context("Invalid configuration")?;
            let outcome = evaluate(
                &target,
                &ProviderResult::from_transcript(transcript),
                TranscriptOrigin::Provider {
                    name: "cli".to_string(),
                },
                config.feedback_basis,
            );
            print_outcome(&outcome, json)?;
        }

        Command::Practice {
            target,
            audio,
            json,
        } => {
            let mut config = ProviderConfig::from_env().context("Invalid configuration")?;

            let audio = match audio {
                Some(path) => {
                    let (pcm, sample_rate) = read_wav_file(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    info!(sample_rate, bytes = pcm.len(), "Loaded recording");
                    config.sample_rate = sample_rate;
                    Some(pcm)
                }
                None => None,
            };

            let session = PracticeSession::new(&config);
            let outcome = session
                .transcribe_and_score(&target, audio)
                .await
                .context("Attempt failed")?;
            print_outcome(&outcome, json)?;
        }

        Command::Simulate {
            target,
            count,
            seed,
        } => {
            let simulator = SimulatedTranscriptionProvider::new(seed);
            let mut total = 0u64;

            for i in 1..=count {
                let result = simulator.simulate(&target);
                let outcome = evaluate(
                    &target,
                    &result,
                    TranscriptOrigin::Simulated {
                        reason: "simulate command".to_string(),
                    },
                    ScoreBasis::Raw,
                );
                total += u64::from(outcome.raw_accuracy);
                println!(
                    "{:>3}. {:<20} raw {:>3}  boosted {:>3}  {}",
                    i,
                    outcome.transcript,
                    outcome.raw_accuracy,
                    outcome.boosted_accuracy,
                    outcome.analysis.overall_quality
                );
            }

            if let Some(mean) = mean_score(total, count) {
                println!("Mean raw accuracy: {mean:.1}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_score_handles_large_totals() {
        // more than u32::MAX in total
        let count = 50_000_000usize;
        let total = 100 * count as u64;
        assert_eq!(mean_score(total, count), Some(100.0));
        assert_eq!(mean_score(0, 0), None);
    }
}
