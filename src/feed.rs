use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::http_client::{backend_base_url, http_client};
use crate::match_fetch::{self, FetchError, RetryPolicy};
use crate::skill_fetch;
use crate::state::{Delta, ProviderCommand, SkillLookupResult};
use crate::store;

/// Spawns the provider thread: one initial load, then a poll loop that also
/// drains ui commands. Every load gets a fresh generation from the shared
/// counter; bumping it supersedes whatever was still in flight.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) -> Arc<AtomicU64> {
    let latest: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
    let shared = latest.clone();

    thread::spawn(move || {
        let base_url = backend_base_url();
        let policy = retry_policy_from_env();
        let poll_interval = Duration::from_secs(
            env::var("MATCHES_POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(60)
                .max(10),
        );

        start_load(&tx, &shared, &base_url, policy);
        let mut last_load = Instant::now();

        loop {
            thread::sleep(Duration::from_millis(200));

            if last_load.elapsed() >= poll_interval {
                start_load(&tx, &shared, &base_url, policy);
                last_load = Instant::now();
            }

            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::Reload => {
                        start_load(&tx, &shared, &base_url, policy);
                        last_load = Instant::now();
                    }
                    ProviderCommand::LookupSkill { skill } => {
                        run_skill_lookup(&tx, &base_url, skill);
                    }
                }
            }
        }
    });

    latest
}

/// One load on its own thread so a slow backend never delays the command
/// loop, stamped with the next generation so the retry waits can notice a
/// newer load and bow out.
fn start_load(tx: &Sender<Delta>, latest: &Arc<AtomicU64>, base_url: &str, policy: RetryPolicy) {
    let generation = latest.fetch_add(1, Ordering::SeqCst) + 1;
    let tx = tx.clone();
    let latest = latest.clone();
    let base_url = base_url.to_string();

    thread::spawn(move || {
        let client = match http_client() {
            Ok(client) => client,
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] HTTP client: {err}")));
                return;
            }
        };

        let _ = tx.send(Delta::LoadStarted { generation });
        match match_fetch::fetch_matches_with_retry(client, &base_url, policy, &latest, generation)
        {
            Ok(raw) => {
                let raw_total = raw.len();
                let set = store::rebuild(raw, generation);
                let _ = tx.send(Delta::Log(format!(
                    "[INFO] Matches loaded: {} of {raw_total} valid",
                    set.valid_count()
                )));
                let _ = tx.send(Delta::StoreLoaded { set, raw_total });
            }
            Err(FetchError::Superseded) => {
                let _ = tx.send(Delta::Log(format!(
                    "[INFO] Load {generation} superseded by a newer request"
                )));
            }
            Err(error) => {
                let attempts = policy.max_retries + 1;
                let _ = tx.send(Delta::Log(format!(
                    "[WARN] Match load failed after {attempts} attempts: {error}"
                )));
                let _ = tx.send(Delta::LoadFailed {
                    error,
                    attempts,
                    generation,
                });
            }
        }
    });
}

fn run_skill_lookup(tx: &Sender<Delta>, base_url: &str, skill: String) {
    let tx = tx.clone();
    let base_url = base_url.to_string();

    thread::spawn(move || {
        let outcome = http_client()
            .and_then(|client| skill_fetch::fetch_workers_with_skill(client, &base_url, &skill));
        let result = match outcome {
            Ok(workers) if workers.is_empty() => SkillLookupResult::NotFound,
            Ok(workers) => {
                let _ = tx.send(Delta::Log(format!(
                    "[INFO] Skill \"{skill}\": {} freelancer(s)",
                    workers.len()
                )));
                SkillLookupResult::Found(workers)
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Skill lookup failed: {err}")));
                SkillLookupResult::Failed
            }
        };
        let _ = tx.send(Delta::SkillLookup { skill, result });
    });
}

fn retry_policy_from_env() -> RetryPolicy {
    let max_retries = env::var("MATCH_RETRY_MAX")
        .ok()
        .and_then(|val| val.parse::<u32>().ok())
        .unwrap_or(3)
        .clamp(0, 10);
    RetryPolicy {
        max_retries,
        ..RetryPolicy::default()
    }
}
