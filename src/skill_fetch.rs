use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::store::Worker;

/// Pass-through lookup against the backend's skill index. Single attempt:
/// an empty result and a failure both end up as a "not found / error" panel
/// state, so there is nothing worth retrying.
pub fn fetch_workers_with_skill(
    client: &Client,
    base_url: &str,
    skill: &str,
) -> Result<Vec<Worker>> {
    let url = format!("{base_url}/freelancers_with_skill");
    let resp = client
        .get(&url)
        .query(&[("skill", skill)])
        .send()
        .context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        anyhow::bail!("http {status}: {body}");
    }
    parse_workers_json(&body)
}

pub fn parse_workers_json(raw: &str) -> Result<Vec<Worker>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid freelancers json")
}
