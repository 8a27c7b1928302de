use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::state::{AnalysisResult, MatchStats, SearchCriteria};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 12;
const MAX_TOKENS: u32 = 400;

pub const MISSING_KEY_MESSAGE: &str =
    "OPENAI_API_KEY is not configured; set it to enable the automatic betting analysis.";

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = env::var("OPENAI_MODEL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(2, 60);

        Self {
            api_key,
            base_url,
            model,
            timeout_secs,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub fn build_analysis_prompt(criteria: &SearchCriteria, stats: &MatchStats) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str(
        "You are a football match analyst. Analyze the data below and suggest \
         market reads for Over/Under HT, Over/Under FT, Corners HT and Corners FT.\n\n",
    );
    prompt.push_str(&format!(
        "Match: {} vs {}\n",
        criteria.home_team, criteria.away_team
    ));
    if !criteria.league.is_empty() {
        prompt.push_str(&format!("Competition: {}\n", criteria.league));
    }
    prompt.push('\n');
    prompt.push_str(&format!("Half-time score: {}\n", stats.score_ht.display()));
    prompt.push_str(&format!("Full-time score: {}\n", stats.score_ft.display()));
    prompt.push_str(&format!(
        "Corners (home - away): {}\n",
        stats.corners.display()
    ));
    prompt.push_str(&format!(
        "Corners total FT: {}\n",
        stats.corners_ft_total.display()
    ));
    prompt.push_str(&format!(
        "Corners total HT: {}\n",
        stats.corners_ht_total.display()
    ));
    prompt.push_str(&format!(
        "Over/Under HT: {}\n",
        stats.over_under_ht.display()
    ));
    prompt.push_str(&format!(
        "Over/Under FT: {}\n",
        stats.over_under_ft.display()
    ));
    if stats.over_under_detail.is_available() {
        prompt.push_str(&format!(
            "Over/Under detail: {}\n",
            stats.over_under_detail.display()
        ));
    }
    prompt.push_str(
        "\nProvide:\n\
         - Estimated probabilities (in %)\n\
         - A short rationale (2-3 lines)\n\
         - Risk / reason for caution\n",
    );
    prompt
}

/// Never propagates: a missing key is the fixed degraded-mode message (and
/// zero outbound calls); transport and service errors come back as inline
/// error text.
pub fn request_analysis(
    cfg: &AiConfig,
    criteria: &SearchCriteria,
    stats: &MatchStats,
) -> AnalysisResult {
    let Some(api_key) = cfg.api_key.as_deref() else {
        return AnalysisResult {
            text: MISSING_KEY_MESSAGE.to_string(),
            is_error: true,
        };
    };
    match send_chat(cfg, api_key, &build_analysis_prompt(criteria, stats)) {
        Ok(text) => AnalysisResult {
            text,
            is_error: false,
        },
        Err(err) => AnalysisResult {
            text: format!("Analysis request failed: {err:#}"),
            is_error: true,
        },
    }
}

fn send_chat(cfg: &AiConfig, api_key: &str, prompt: &str) -> Result<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
        .context("failed to build analysis client")?;

    let request = ChatRequest {
        model: cfg.model.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        max_tokens: MAX_TOKENS,
    };

    let resp = client
        .post(format!("{}/chat/completions", cfg.base_url))
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .context("analysis request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading analysis body")?;
    if !status.is_success() {
        let snippet = body
            .trim()
            .replace('\n', " ")
            .chars()
            .take(220)
            .collect::<String>();
        return Err(anyhow::anyhow!("analysis http {}: {}", status, snippet));
    }

    let parsed: ChatResponse = serde_json::from_str(&body).context("invalid analysis json")?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("analysis response had no choices"))
}
