use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Recoverable per-item failures from the matching oracle. The pipeline
/// logs these and moves on; the item stays in the raw store unscored.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(#[from] OpenAIError),
    #[error("oracle response had no content")]
    EmptyResponse,
    #[error("oracle response was not the expected JSON: {0}")]
    Malformed(String),
}

/// External matching oracle: a description in, a 0-10 compatibility score
/// out.
#[async_trait]
pub trait MatchOracle: Send + Sync {
    async fn score(&self, description: &str) -> Result<u8, OracleError>;
}

#[derive(Deserialize)]
struct MatchResponse {
    match_score: f64,
}

/// Oracle backed by an OpenAI chat model, prompted with the candidate's
/// resume and stated needs.
pub struct JobMatcher {
    client: Client<OpenAIConfig>,
    model: String,
    resume_text: String,
    my_needs: String,
}

impl JobMatcher {
    pub fn new(api_key: String, model: String, resume_text: String, my_needs: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        JobMatcher {
            client: Client::with_config(config),
            model,
            resume_text,
            my_needs,
        }
    }

    fn matching_prompt(&self, job_description: &str) -> String {
        format!(
            r#"You are a job matching expert. Analyze the following resume, job description, and candidate's needs to determine the likelihood of the candidate getting this job.

Resume:
{}

Job Description:
{}

What I'm Looking For:
{}

Based on the above information, provide a match score from 0-10 where:
- 0 means extremely unlikely to get the job (major mismatches in requirements, experience, or qualifications)
- 10 means extremely likely to get the job (perfect match in skills, experience, and qualifications)

Consider factors like:
- Required skills match with your experience
- Years of experience match with requirements
- Education and qualifications alignment
- Industry experience relevance
- Location and work arrangement preferences
- Overall fit with company culture and role expectations

Respond ONLY with a JSON object containing a single key "match_score" with a number between 0 and 10."#,
            self.resume_text, job_description, self.my_needs
        )
    }
}

#[async_trait]
impl MatchOracle for JobMatcher {
    async fn score(&self, description: &str) -> Result<u8, OracleError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .response_format(ResponseFormat::JsonObject)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(
                        "You are a job matching expert that provides match scores in JSON format.",
                    )
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(self.matching_prompt(description))
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(OracleError::EmptyResponse)?;

        let parsed: MatchResponse =
            serde_json::from_str(&content).map_err(|e| OracleError::Malformed(e.to_string()))?;

        Ok(parsed.match_score.round().clamp(0.0, 10.0) as u8)
    }
}
