use serde_json::Value;

/// Normalized lifecycle state of a render job, as reported by the provider.
///
/// The provider has shipped several incompatible status vocabularies over
/// time, so the raw term is mapped here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Processing,
    Ready,
    Failed,
    Unknown,
}

/// Classification of a URL found in a status response.
///
/// Only `DirectMedia` URLs can be handed to a native video player; a
/// `LandingPage` URL is the provider's human-facing web viewer and must never
/// be cached as a playable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlClass {
    DirectMedia,
    LandingPage,
    Unclassified,
}

#[derive(Debug, Clone)]
pub struct UrlCandidate {
    pub url: String,
    pub class: UrlClass,
}

/// One poll's worth of normalized provider state: the lifecycle state plus
/// every URL candidate found in the payload, in traversal order.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub state: JobState,
    pub candidates: Vec<UrlCandidate>,
}

impl StatusSnapshot {
    /// Normalize an arbitrary status payload.
    ///
    /// The status term is read from the handful of nesting paths the provider
    /// has used historically; URL candidates are found by scanning every
    /// string field and classifying by URL shape. Field names are deliberately
    /// ignored for URL extraction: the provider renames them between API
    /// versions, but the shape of a CDN asset URL has stayed stable.
    pub fn from_value(payload: &Value) -> Self {
        let mut candidates = Vec::new();
        collect_url_candidates(payload, &mut candidates);

        Self {
            state: normalize_state(payload),
            candidates,
        }
    }

    /// First directly playable URL, if any.
    pub fn direct_url(&self) -> Option<&str> {
        self.candidates
            .iter()
            .find(|c| c.class == UrlClass::DirectMedia)
            .map(|c| c.url.as_str())
    }

    /// First landing-page URL, if any. Last-resort fallback only.
    pub fn landing_url(&self) -> Option<&str> {
        self.candidates
            .iter()
            .find(|c| c.class == UrlClass::LandingPage)
            .map(|c| c.url.as_str())
    }
}

/// Classify a URL purely by its shape.
pub fn classify_url(url: &str) -> UrlClass {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return UrlClass::Unclassified;
    }

    // Viewer links are checked first: the provider has also served fabricated
    // "app.heygen.com/videos/{id}/video.mp4" paths that look like media but
    // are not fetchable assets.
    let landing_pattern = regex::Regex::new(r"app\.heygen\.com/videos/").unwrap();
    if landing_pattern.is_match(url) {
        return UrlClass::LandingPage;
    }

    if url.contains(".mp4")
        || url.contains("cloudfront.net")
        || url.contains("cdn")
        || url.contains("s3.amazonaws.com")
        || url.contains("amazonaws.com")
    {
        return UrlClass::DirectMedia;
    }

    UrlClass::Unclassified
}

/// Read the status term from any of the historically observed paths and map
/// the provider's vocabulary onto [`JobState`].
fn normalize_state(payload: &Value) -> JobState {
    let raw = payload
        .get("status")
        .or_else(|| payload.pointer("/data/status"))
        .or_else(|| payload.pointer("/video/status"))
        .or_else(|| payload.get("state"))
        .and_then(Value::as_str);

    match raw {
        Some(term) => match term.to_ascii_lowercase().as_str() {
            "completed" | "done" | "success" | "ready" | "finished" => JobState::Ready,
            "failed" | "error" | "failure" => JobState::Failed,
            "pending" | "waiting" | "queued" => JobState::Pending,
            _ => JobState::Processing,
        },
        None => JobState::Unknown,
    }
}

fn collect_url_candidates(value: &Value, out: &mut Vec<UrlCandidate>) {
    match value {
        Value::String(s) => {
            let class = classify_url(s);
            if class != UrlClass::Unclassified {
                out.push(UrlCandidate {
                    url: s.clone(),
                    class,
                });
            }
        }
        Value::Object(map) => {
            for nested in map.values() {
                collect_url_candidates(nested, out);
            }
        }
        Value::Array(items) => {
            for nested in items {
                collect_url_candidates(nested, out);
            }
        }
        _ => {}
    }
}

/// Error code and raw detail attached to a FAILED status payload.
#[derive(Debug, Clone)]
pub struct FailureDetail {
    pub code: Option<String>,
    pub message: String,
}

/// Pull the failure code/message out of whichever error-shape fields the
/// payload carries.
pub fn failure_detail(payload: &Value) -> FailureDetail {
    let error = payload
        .get("error")
        .or_else(|| payload.pointer("/data/error"))
        .or_else(|| payload.get("error_detail"));

    let code = error
        .and_then(|e| e.get("code"))
        .or_else(|| payload.get("error_code"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let message = error
        .and_then(|e| {
            e.get("message")
                .or_else(|| e.get("detail"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| e.as_str().map(str::to_string))
        })
        .or_else(|| {
            payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown error".to_string());

    FailureDetail { code, message }
}

/// Map a failure detail onto a user-facing message. Recognized billing codes
/// get dedicated phrasing; everything else falls back to a generic template
/// embedding the raw detail.
pub fn user_facing_failure(detail: &FailureDetail) -> String {
    let code = detail.code.as_deref().unwrap_or("");
    let message_lower = detail.message.to_lowercase();

    if code == "MOVIO_PAYMENT_INSUFFICIENT_CREDIT" || message_lower.contains("insufficient credit")
    {
        return "Your rendering account has insufficient credit. Please add credit and try again."
            .to_string();
    }

    if code == "MOVIO_PAYMENT_REQUIRED" || message_lower.contains("payment required") {
        return "Payment is required for your rendering account. Please check your subscription."
            .to_string();
    }

    format!("Video generation failed: {}", detail.message)
}
