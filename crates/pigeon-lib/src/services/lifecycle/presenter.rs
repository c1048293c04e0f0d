// Result Presenter
// Pure mapping from controller state to what a panel renders

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::state::{FailureKind, LifecycleState};
use crate::models::{GenerationResult, GroundingSource};

/// Rotating progress labels while a long-running job is polled
const PULSE_MESSAGES: &[&str] = &[
    "Sketching the first frames…",
    "Blocking out the camera moves…",
    "Timing the easing curves, hang tight…",
    "Layering light and texture…",
    "Rendering the final passes…",
];

const SUBMITTING_LABEL: &str = "Briefing the studio…";

/// Which pending sub-state is being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Submitting,
    Polling { attempts: u32 },
}

/// Transient controls offered next to a result. Triggering one never changes
/// the result itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAffordance {
    Enlarge,
    Download,
}

/// Exactly one thing a panel shows
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Nothing,
    Progress {
        stage: ProgressStage,
        label: &'static str,
    },
    Text {
        text: String,
        sources: Vec<GroundingSource>,
    },
    Image {
        mime_type: String,
        bytes: Vec<u8>,
        data_url: String,
    },
    Audio {
        sample_rate: u32,
        channels: u16,
        duration: Duration,
        samples: Vec<f32>,
    },
    Video {
        mime_type: String,
        bytes: Vec<u8>,
        source_uri: String,
    },
    Error {
        kind: FailureKind,
        message: String,
        prompt_for_credential: bool,
    },
}

pub fn present(state: &LifecycleState) -> ResultView {
    match state {
        LifecycleState::Idle => ResultView::Nothing,
        LifecycleState::Submitting => ResultView::Progress {
            stage: ProgressStage::Submitting,
            label: SUBMITTING_LABEL,
        },
        LifecycleState::Polling { attempts } => ResultView::Progress {
            stage: ProgressStage::Polling {
                attempts: *attempts,
            },
            label: pulse_message(*attempts),
        },
        LifecycleState::Succeeded(result) => present_result(result),
        LifecycleState::Failed(failure) => ResultView::Error {
            kind: failure.kind,
            message: failure.message.clone(),
            prompt_for_credential: failure.is_credential_required(),
        },
    }
}

fn present_result(result: &GenerationResult) -> ResultView {
    match result {
        GenerationResult::Text { text, sources } => ResultView::Text {
            text: text.clone(),
            sources: sources.clone(),
        },
        GenerationResult::Image(image) => ResultView::Image {
            mime_type: image.mime_type.clone(),
            bytes: image.bytes.clone(),
            data_url: format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.bytes)),
        },
        GenerationResult::Audio(audio) => ResultView::Audio {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            duration: audio.duration(),
            samples: audio.samples.clone(),
        },
        GenerationResult::Video(video) => ResultView::Video {
            mime_type: video.mime_type.clone(),
            bytes: video.bytes.clone(),
            source_uri: video.source_uri.clone(),
        },
    }
}

fn pulse_message(attempts: u32) -> &'static str {
    if PULSE_MESSAGES.is_empty() {
        return "Working on it…";
    }
    PULSE_MESSAGES[attempts as usize % PULSE_MESSAGES.len()]
}

impl ResultView {
    pub fn is_progress(&self) -> bool {
        matches!(self, ResultView::Progress { .. })
    }

    pub fn affordances(&self) -> &'static [ViewAffordance] {
        match self {
            ResultView::Image { .. } => &[ViewAffordance::Enlarge, ViewAffordance::Download],
            ResultView::Video { .. } => &[ViewAffordance::Download],
            _ => &[],
        }
    }

    /// Suggested file name for the download affordance
    pub fn download_file_name(&self) -> Option<String> {
        let (stem, mime_type) = match self {
            ResultView::Image { mime_type, .. } => ("pigeon-keyframe", mime_type),
            ResultView::Video { mime_type, .. } => ("pigeon-motion-reel", mime_type),
            _ => return None,
        };
        Some(format!("{}.{}", stem, extension_for(mime_type)))
    }
}

fn extension_for(mime_type: &str) -> &str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        other => other.rsplit('/').next().unwrap_or("bin"),
    }
}
