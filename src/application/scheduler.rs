use crate::application::context_builder::SchedulingContext;
use crate::infrastructure::assistant_client::{
    AssistantHttpClient, AssistantMessage, AssistantRequest,
};
use crate::infrastructure::config::SchedulerConfig;
use crate::infrastructure::error::InfraError;
use std::sync::Arc;
use tracing::{info, warn};

const SCHEDULER_INSTRUCTIONS: &str = "You are an AI task scheduler. Generate a JSON object with a 'days' field. \
For each day in the upcoming week, provide an ordered list of focus blocks. \
Each block must include title, start, end (HH:MM 24h), and details. Reference the \
tasks and goals the block advances, and whenever possible bundle several related \
tasks (especially those tied to the same goal) into a single block rather than \
creating one block per task. Ensure you respect busy blocks and avoid conflicts.";
const TEMPERATURE: f64 = 0.4;
const MAX_OUTPUT_TOKENS: u32 = 1500;

/// Client for the external scheduling assistant. Availability is fixed at
/// construction: without a credential every `generate` call is rejected.
pub struct GptScheduler<C>
where
    C: AssistantHttpClient,
{
    config: Option<SchedulerConfig>,
    client: Arc<C>,
}

impl<C> GptScheduler<C>
where
    C: AssistantHttpClient,
{
    pub fn new(config: Option<SchedulerConfig>, client: Arc<C>) -> Self {
        Self { config, client }
    }

    pub fn is_available(&self) -> bool {
        self.config.is_some()
    }

    pub fn model(&self) -> Option<&str> {
        self.config.as_ref().map(|config| config.model.as_str())
    }

    /// Returns the assistant's reply as raw JSON for the schedule parser.
    /// Callers check `is_available` first; calling while unavailable is a
    /// `Configuration` error.
    pub async fn generate(
        &self,
        context: &SchedulingContext,
    ) -> Result<serde_json::Value, InfraError> {
        let Some(config) = self.config.as_ref() else {
            return Err(InfraError::Configuration(
                "scheduling assistant is not configured; set OPENAI_API_KEY".to_string(),
            ));
        };

        let prompt = serde_json::to_string_pretty(context)?;
        let request = AssistantRequest {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            messages: vec![
                AssistantMessage::system(SCHEDULER_INSTRUCTIONS),
                AssistantMessage::user(format!("Create a schedule for this week: {prompt}")),
            ],
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        };

        info!(model = %config.model, tasks = context.tasks.len(), "requesting weekly schedule");
        let text = self.client.create_response(request).await?;
        serde_json::from_str(&text).map_err(|error| {
            warn!(%error, "assistant returned unparsable schedule");
            InfraError::Generation(format!("assistant returned invalid JSON: {error}"))
        })
    }
}
