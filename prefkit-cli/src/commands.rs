//! Subcommand execution against an open store.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use prefkit_core::{PreferenceKind, PreferenceValue, StorageError};
use prefkit_datastore::ReactivePreferencesDataStore;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::cli::Command;
use crate::error::CliError;

/// Run one subcommand, writing its output to `out`.
///
/// `shutdown` ends a `watch` early; other commands ignore it.
pub async fn run<W, S>(
    store: &ReactivePreferencesDataStore,
    command: Command,
    out: &mut W,
    shutdown: S,
) -> Result<(), CliError>
where
    W: Write,
    S: Future<Output = ()>,
{
    match command {
        Command::Get { key, kind } => get(store, &key, kind, out).await,
        Command::Set { key, value, kind } => set(store, &key, &value, kind, out).await,
        Command::Remove { key } => {
            if store.remove(&key).await? {
                writeln!(out, "removed {key}")?;
            } else {
                writeln!(out, "{key} is not set")?;
            }
            Ok(())
        }
        Command::List => list(store, out).await,
        Command::Clear => {
            let count = store.len().await?;
            store.clear_all().await?;
            info!(count, "Cleared preferences");
            writeln!(out, "cleared {count} keys")?;
            Ok(())
        }
        Command::Watch {
            key,
            interval_ms,
            count,
        } => watch(store, &key, Duration::from_millis(interval_ms), count, out, shutdown).await,
    }
}

fn render(key: &str, value: Option<&PreferenceValue>) -> String {
    match value {
        Some(value) => format!("{key} = {value} ({})", value.kind()),
        None => format!("{key} is not set"),
    }
}

async fn get<W: Write>(
    store: &ReactivePreferencesDataStore,
    key: &str,
    kind: Option<PreferenceKind>,
    out: &mut W,
) -> Result<(), CliError> {
    let value = store.get_value(key).await?;
    if let (Some(expected), Some(found)) = (kind, value.as_ref().map(PreferenceValue::kind)) {
        if expected != found {
            let mismatch = StorageError::TypeMismatch {
                key: key.to_string(),
                expected,
                found,
            };
            return Err(CliError::Store(mismatch.into()));
        }
    }
    writeln!(out, "{}", render(key, value.as_ref()))?;
    Ok(())
}

async fn set<W: Write>(
    store: &ReactivePreferencesDataStore,
    key: &str,
    raw: &str,
    kind: PreferenceKind,
    out: &mut W,
) -> Result<(), CliError> {
    let value = kind.parse_value(raw).ok_or_else(|| CliError::InvalidValue {
        kind,
        raw: raw.to_string(),
    })?;
    store.put_value(key, value.clone()).await?;
    writeln!(out, "{}", render(key, Some(&value)))?;
    Ok(())
}

async fn list<W: Write>(store: &ReactivePreferencesDataStore, out: &mut W) -> Result<(), CliError> {
    let keys = store.keys().await?;
    for key in &keys {
        let value = store.get_value(key).await?;
        writeln!(out, "{}", render(key, value.as_ref()))?;
    }
    debug!(count = keys.len(), "Listed preferences");
    Ok(())
}

async fn watch<W, S>(
    store: &ReactivePreferencesDataStore,
    key: &str,
    interval: Duration,
    count: Option<usize>,
    out: &mut W,
    shutdown: S,
) -> Result<(), CliError>
where
    W: Write,
    S: Future<Output = ()>,
{
    // Record what the backend holds now, so polling reports only later changes.
    store.refresh(key).await?;
    let values = store.observe_value(key)?;
    tokio::pin!(values);
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut printed = 0usize;

    loop {
        tokio::select! {
            item = values.next() => match item {
                Some(value) => {
                    writeln!(out, "{}", render(key, value?.as_ref()))?;
                    out.flush()?;
                    printed += 1;
                    if count.is_some_and(|limit| printed >= limit) {
                        break;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                store.refresh(key).await?;
            }
            _ = &mut shutdown => {
                debug!(key = %key, "Watch interrupted");
                break;
            }
        }
    }
    Ok(())
}
