//! Qwen3-TTS inference server binding
//!
//! Talks to a model server over HTTP: one JSON request per generation with
//! the reference recording embedded as base64, a WAV file back. The server holds the weights, so "loading" this engine
//! only means checking the server answers.
//!
//! The server streams no progress, so this engine rejects a progress sink.

use std::time::Duration;

use base64::Engine as _;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::decode_wav_bytes;
use crate::core::error::{Result, TtsError};
use crate::progress::ProgressSink;
use super::traits::{
    GenerationRequest, GenerationResult, ProgressSupport, VoiceCloneEngine,
};

const ENGINE_ID: &str = "qwen3-tts-http";

/// HTTP engine settings
#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    /// Server base URL, e.g. `http://127.0.0.1:7861`
    pub base_url: String,
    /// Model the server should use
    pub model_id: String,
    /// Inference device requested from the server ("cuda:0", "cpu");
    /// `None` lets the server pick
    pub device: Option<String>,
    /// Forwarded as a bearer token when set
    pub hf_token: Option<String>,
    /// Whole-request timeout (generation included)
    pub timeout: Duration,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7861".to_string(),
            model_id: crate::DEFAULT_MODEL_ID.to_string(),
            device: None,
            hf_token: None,
            timeout: Duration::from_secs(600),
        }
    }
}

/// Voice-clone request body
#[derive(Debug, Serialize)]
struct VoiceCloneBody<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a str>,
    text: &'a str,
    language: &'a str,
    /// Reference recording, base64 of the file bytes
    ref_audio: String,
    ref_text: &'a str,
    x_vector_only_mode: bool,
}

/// Error payload returned by the server
#[derive(Debug, Deserialize)]
struct ServerError {
    detail: String,
}

/// Engine backed by a remote Qwen3-TTS server
pub struct HttpEngine {
    config: HttpEngineConfig,
    client: Client,
}

impl HttpEngine {
    pub fn new(config: HttpEngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TtsError::ModelLoad {
                component: ENGINE_ID.to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { config, client })
    }

    /// Create the engine and make sure the server is up
    pub fn connect(config: HttpEngineConfig) -> Result<Self> {
        let engine = Self::new(config)?;
        engine.ping()?;
        info!(url = %engine.config.base_url, model = %engine.config.model_id, "Connected to engine");
        Ok(engine)
    }

    pub fn config(&self) -> &HttpEngineConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Health check
    pub fn ping(&self) -> Result<()> {
        let url = self.endpoint("health");
        let response = self.client.get(&url).send().map_err(|e| TtsError::ModelLoad {
            component: ENGINE_ID.to_string(),
            message: format!("engine server unreachable at {}: {}", url, e),
        })?;
        if !response.status().is_success() {
            return Err(TtsError::ModelLoad {
                component: ENGINE_ID.to_string(),
                message: format!("engine health check returned {}", response.status()),
            });
        }
        Ok(())
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> Result<VoiceCloneBody<'a>> {
        let path = &request.reference_audio;
        let audio = std::fs::read(path).map_err(|e| {
            TtsError::generation(
                ENGINE_ID,
                format!("cannot read reference audio {}: {}", path.display(), e),
            )
        })?;

        Ok(VoiceCloneBody {
            model: &self.config.model_id,
            device: self.config.device.as_deref(),
            text: &request.text,
            language: request.language.name(),
            ref_audio: base64::engine::general_purpose::STANDARD.encode(&audio),
            ref_text: &request.reference_text,
            x_vector_only_mode: request.x_vector_only,
        })
    }
}

impl VoiceCloneEngine for HttpEngine {
    fn id(&self) -> &str {
        ENGINE_ID
    }

    fn progress_support(&self) -> ProgressSupport {
        ProgressSupport::Unsupported
    }

    fn generate(
        &self,
        request: &GenerationRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<GenerationResult> {
        if progress.is_some() {
            return Err(TtsError::CapabilityMismatch {
                argument: "progress".to_string(),
            });
        }

        let url = self.endpoint("v1/voice-clone");
        debug!(%url, chars = request.text.chars().count(), "Sending voice-clone request");

        let body = self.body(request)?;
        let mut call = self.client.post(&url).json(&body);
        if let Some(token) = &self.config.hf_token {
            call = call.bearer_auth(token);
        }

        let response = call
            .send()
            .map_err(|e| TtsError::generation(ENGINE_ID, format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ServerError>(&text)
                .map(|e| e.detail)
                .unwrap_or(text);
            return Err(TtsError::generation(
                ENGINE_ID,
                format!("server error ({}): {}", status, detail),
            ));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TtsError::generation(ENGINE_ID, format!("Failed to read response body: {}", e)))?;

        let (samples, sample_rate) = decode_wav_bytes(&bytes)
            .map_err(|e| TtsError::generation(ENGINE_ID, format!("undecodable audio: {}", e)))?;
        Ok(GenerationResult::new(samples, sample_rate))
    }
}
