//! Relevance record CLI commands.

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ActivityId, Config, FetchOutcome, IndicatorState, UserId};
use crate::domain::ports::RelevanceStore;
use crate::infrastructure::relevance::HttpRelevanceClient;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// User identifier
    pub user_id: String,
    /// Activity identifier
    pub activity_id: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// User identifier
    pub user_id: String,
    /// Activity identifier
    pub activity_id: String,
    /// Whether the activity is relevant to the user
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub relevant: bool,
}

#[derive(Debug, Serialize)]
pub struct RelevanceOutput {
    pub user_id: String,
    pub activity_id: String,
    pub found: bool,
    pub relevant: Option<bool>,
    pub state: IndicatorState,
}

impl RelevanceOutput {
    fn new(user_id: &UserId, activity_id: &ActivityId, outcome: FetchOutcome) -> Self {
        let relevant = match outcome {
            FetchOutcome::Found { relevant } => Some(relevant),
            FetchOutcome::NotFound => None,
        };
        Self {
            user_id: user_id.to_string(),
            activity_id: activity_id.to_string(),
            found: relevant.is_some(),
            relevant,
            state: outcome.state(),
        }
    }
}

impl CommandOutput for RelevanceOutput {
    fn to_human(&self) -> String {
        let verdict = match self.relevant {
            Some(true) => "relevant",
            Some(false) => "irrelevant",
            None => "no record",
        };
        format!(
            "User: {}\nActivity: {}\nRelevance: {}\nIndicator: {}",
            self.user_id,
            self.activity_id,
            verdict,
            self.state.class_list()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct SetOutput {
    pub success: bool,
    pub message: String,
    pub user_id: String,
    pub activity_id: String,
    pub relevant: bool,
}

impl CommandOutput for SetOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn client(config: &Config) -> Result<HttpRelevanceClient> {
    HttpRelevanceClient::with_config(&config.remote, None)
        .context("No usable relevance service URL. Set remote.base_url or pass --base-url.")
}

pub async fn get(args: GetArgs, config: &Config, json_mode: bool) -> Result<()> {
    let client = client(config)?;
    let user_id = UserId::new(args.user_id);
    let activity_id = ActivityId::new(args.activity_id);

    let outcome = client
        .fetch_state(&user_id, &activity_id)
        .await
        .with_context(|| format!("Failed to read relevance of activity {activity_id}"))?;

    output(&RelevanceOutput::new(&user_id, &activity_id, outcome), json_mode);
    Ok(())
}

pub async fn set(args: SetArgs, config: &Config, json_mode: bool) -> Result<()> {
    let client = client(config)?;
    let user_id = UserId::new(args.user_id);
    let activity_id = ActivityId::new(args.activity_id);

    client
        .push_state(&user_id, &activity_id, args.relevant)
        .await
        .with_context(|| format!("Failed to record relevance of activity {activity_id}"))?;

    let out = SetOutput {
        success: true,
        message: format!(
            "Activity {activity_id} marked {} for {user_id}",
            IndicatorState::from_relevance(args.relevant).as_str()
        ),
        user_id: user_id.to_string(),
        activity_id: activity_id.to_string(),
        relevant: args.relevant,
    };
    output(&out, json_mode);
    Ok(())
}
