//! Terminal front end: play the word game as one user on stdin/stdout.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use wordgame::catalog::{CatalogLoader, WordListLoader};
use wordgame::config::Config;
use wordgame::embedding::StaticVectorTable;
use wordgame::error::GameError;
use wordgame::game::{GameEngine, PlayResult};
use wordgame::store::FileUsedPairStore;

const ENV_USER: &str = "WORDGAME_USER";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let user_id = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENV_USER).ok())
        .unwrap_or_else(|| "player".to_string());

    let vectors_path = config
        .vectors_path
        .clone()
        .context("WORDGAME_VECTORS_PATH must point to a word -> vector JSON file")?;
    let catalog_path = config
        .catalog_path
        .clone()
        .context("WORDGAME_CATALOG_PATH must point to a JSON word list")?;

    let table = Arc::new(StaticVectorTable::from_json_file(&vectors_path)?);
    let catalog = WordListLoader::from_json_file(&catalog_path, Arc::clone(&table))?
        .load()
        .await?;
    let store = FileUsedPairStore::open(config.storage_path.clone())?;

    tracing::info!(user_id = %user_id, storage = %config.storage_path.display(), "Wordgame starting");

    let engine = GameEngine::new(config, table, store, catalog);
    let _reaper = engine.start_reaper();

    tokio::select! {
        result = run(&engine, &user_id) => result?,
        _ = signal::ctrl_c() => println!(),
    }

    if let Ok(summary) = engine.end_session(&user_id).await {
        println!(
            "Final score: {} over {} answers (round {})",
            summary.total_score, summary.accepted, summary.round
        );
    }
    engine.stop_reaper();
    Ok(())
}

async fn run(
    engine: &GameEngine<Arc<StaticVectorTable>, FileUsedPairStore>,
    user_id: &str,
) -> anyhow::Result<()> {
    println!("Answer each word with one related word. Commands: :reload :history :quit");

    let mut current = present(engine, user_id, None).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            ":quit" => break,
            ":history" => {
                for entry in engine.history(user_id).await? {
                    println!(
                        "  {} {:.3} {} {:+}",
                        entry.pair, entry.similarity, entry.tier, entry.points
                    );
                }
            }
            ":reload" => match engine.reload(user_id).await {
                Ok(outcome) => {
                    println!("Round {}: {} words", outcome.round, outcome.words);
                    current = present(engine, user_id, None).await?;
                }
                Err(err) => println!("{err}"),
            },
            response => {
                let Some(presented) = current.as_deref() else {
                    println!("Pool exhausted. Type :reload to play again.");
                    continue;
                };
                match engine.play(user_id, Some(presented), Some(response)).await {
                    Ok(PlayResult::Scored { outcome, next_word }) => {
                        println!(
                            "{} -> {:.3} ({}), {} points{}, total {}",
                            outcome.pair,
                            outcome.similarity,
                            outcome.tier,
                            outcome.points,
                            if outcome.counted { "" } else { " (not counted)" },
                            outcome.total_score
                        );
                        current = present(engine, user_id, next_word).await?;
                    }
                    Ok(PlayResult::Next { word }) => current = present(engine, user_id, Some(word)).await?,
                    Err(err) if err.is_retryable() => println!("Try again: {err}"),
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    Ok(())
}

/// Prints the word to answer, fetching one when `word` is `None`.
async fn present(
    engine: &GameEngine<Arc<StaticVectorTable>, FileUsedPairStore>,
    user_id: &str,
    word: Option<String>,
) -> anyhow::Result<Option<String>> {
    let word = match word {
        Some(word) => Some(word),
        None => match engine.next_word(user_id).await {
            Ok(word) => Some(word),
            Err(GameError::PoolExhausted) => None,
            Err(err) => return Err(err.into()),
        },
    };

    match &word {
        Some(word) => println!("> {word}"),
        None => println!("Pool exhausted. Type :reload to play again."),
    }
    Ok(word)
}
