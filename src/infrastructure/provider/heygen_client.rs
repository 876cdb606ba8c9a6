use crate::domain::render::RenderRequest;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::render_client::RenderJobClient;

const GENERATE_PATH: &str = "/v2/video/generate";
const AVATARS_PATH: &str = "/v2/avatars";
const VOICES_PATH: &str = "/v2/voices";

/// Output settings applied to every submitted job.
#[derive(Debug, Clone)]
pub struct RenderDefaults {
    pub width: u32,
    pub height: u32,
    pub background: String,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            background: "#F5F5F5".to_string(),
        }
    }
}

/// HeyGen implementation of [`RenderJobClient`].
pub struct HeygenRenderClient {
    base_url: String,
    api_key: String,
    defaults: RenderDefaults,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateVideoBody {
    video_inputs: Vec<VideoInput>,
    dimension: Dimension,
    test: bool,
}

#[derive(Debug, Serialize)]
struct VideoInput {
    character: Character,
    voice: VoiceInput,
    background: Background,
}

#[derive(Debug, Serialize)]
struct Character {
    #[serde(rename = "type")]
    kind: &'static str,
    avatar_id: String,
    avatar_style: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum VoiceInput {
    Text {
        input_text: String,
        voice_id: String,
    },
    Audio {
        audio_url: String,
    },
}

#[derive(Debug, Serialize)]
struct Background {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct Dimension {
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvatarSummary {
    pub avatar_id: String,
    #[serde(default)]
    pub avatar_name: Option<String>,
    #[serde(default)]
    pub preview_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceSummary {
    pub voice_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl HeygenRenderClient {
    pub fn new(base_url: String, api_key: String, defaults: RenderDefaults) -> Self {
        Self {
            base_url,
            api_key,
            defaults,
            http_client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> ProviderResult<Value> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .header("X-Api-Key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ProviderResult<Value> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .header("X-Api-Key", &self.api_key)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn parse_response(response: reqwest::Response) -> ProviderResult<Value> {
        let status = response.status();
        let body_text = response.text().await?;

        let body: Value = match serde_json::from_str(&body_text) {
            Ok(value) => value,
            Err(_) => {
                // Not JSON; on an error status surface the raw text.
                if !status.is_success() {
                    return Err(ProviderError::status(status.as_u16(), body_text.trim()));
                }
                return Err(ProviderError::Transport(format!(
                    "provider returned non-JSON body: {}",
                    body_text.chars().take(200).collect::<String>()
                )));
            }
        };

        if !status.is_success() {
            let message = extract_error_message(&body);
            tracing::error!(
                status = status.as_u16(),
                message = %message,
                "HeyGen API error"
            );
            return Err(ProviderError::status(status.as_u16(), message));
        }

        Ok(body)
    }

    async fn submit(&self, request: &RenderRequest, voice: VoiceInput) -> ProviderResult<String> {
        let body = GenerateVideoBody {
            video_inputs: vec![VideoInput {
                character: Character {
                    kind: "avatar",
                    avatar_id: request.avatar_id.clone(),
                    avatar_style: "normal",
                },
                voice,
                background: Background {
                    kind: "color",
                    value: self.defaults.background.clone(),
                },
            }],
            dimension: Dimension {
                width: self.defaults.width,
                height: self.defaults.height,
            },
            test: false,
        };

        let response = self.post(GENERATE_PATH, &body).await?;

        response
            .pointer("/data/video_id")
            .or_else(|| response.get("video_id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::Transport("submission response carried no video id".to_string())
            })
    }

    /// List the avatars available to this account.
    pub async fn list_avatars(&self) -> ProviderResult<Vec<AvatarSummary>> {
        let response = self.get(AVATARS_PATH).await?;
        let avatars = response
            .pointer("/data/avatars")
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        serde_json::from_value(avatars)
            .map_err(|e| ProviderError::Transport(format!("unexpected avatar list shape: {e}")))
    }

    /// List the voices available to this account.
    pub async fn list_voices(&self) -> ProviderResult<Vec<VoiceSummary>> {
        let response = self.get(VOICES_PATH).await?;
        let voices = response
            .pointer("/data/voices")
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        serde_json::from_value(voices)
            .map_err(|e| ProviderError::Transport(format!("unexpected voice list shape: {e}")))
    }
}

#[async_trait]
impl RenderJobClient for HeygenRenderClient {
    async fn submit_from_text(&self, request: &RenderRequest) -> ProviderResult<String> {
        let text = request.text.clone().unwrap_or_default();
        let voice_id = request.voice_id.clone().unwrap_or_default();

        tracing::info!(
            avatar_id = %request.avatar_id,
            voice_id = %voice_id,
            text_length = text.len(),
            "Submitting text-driven render job"
        );

        let job_id = self
            .submit(
                request,
                VoiceInput::Text {
                    input_text: text,
                    voice_id,
                },
            )
            .await?;

        tracing::info!(job_id = %job_id, "Render job accepted");
        Ok(job_id)
    }

    async fn submit_from_audio(&self, request: &RenderRequest) -> ProviderResult<String> {
        let audio_url = request.audio_source_url.clone().unwrap_or_default();

        tracing::info!(
            avatar_id = %request.avatar_id,
            "Submitting audio-driven render job"
        );

        let job_id = self
            .submit(request, VoiceInput::Audio { audio_url })
            .await?;

        tracing::info!(job_id = %job_id, "Render job accepted");
        Ok(job_id)
    }

    async fn get_status(&self, job_id: &str) -> ProviderResult<Value> {
        // The provider has shipped (at least) three status endpoint shapes.
        // Try each in fixed order; the first error is the one surfaced when
        // every variant fails, since the newest endpoint gives the most
        // useful diagnostics.
        let paths = [
            format!("/v2/videos/{job_id}"),
            format!("/v1/video_status.get?video_id={job_id}"),
            format!("/v1/videos/{job_id}/download"),
        ];

        let mut first_error: Option<ProviderError> = None;

        for path in &paths {
            match self.get(path).await {
                Ok(body) => {
                    // Unwrap the response envelope when present.
                    let payload = body.get("data").cloned().unwrap_or(body);
                    return Ok(payload);
                }
                Err(err) => {
                    tracing::debug!(
                        job_id = %job_id,
                        path = %path,
                        error = %err,
                        "Status endpoint variant failed, trying next"
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        Err(first_error
            .unwrap_or_else(|| ProviderError::Transport("no status endpoint tried".to_string())))
    }
}

/// Extract a human-readable message from whichever error-shape field the
/// provider used for this response.
fn extract_error_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| body.get("error").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown error".to_string())
}
