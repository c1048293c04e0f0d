// Voice brief recording
//
// Exclusive microphone capture for the voice brief panel. The device is held
// only between start and stop, and is released on every exit path.

use thiserror::Error;

use crate::models::AudioClip;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No microphone available: {0}")]
    DeviceUnavailable(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error("Capture failed: {0}")]
    Failed(String),
}

impl CaptureError {
    /// Message shown in the panel
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => {
                "We need microphone access to hear your brief. Check your browser permissions."
            }
            CaptureError::DeviceUnavailable(_) => "No microphone was found. Plug one in and try again.",
            CaptureError::AlreadyRecording => "Already listening. Stop the current recording first.",
            CaptureError::NotRecording => "Start a recording before stopping it.",
            CaptureError::Failed(_) => "The recording failed. Please try again.",
        }
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Platform microphone access
pub trait AudioCapture: Send {
    /// Acquire the device and begin capturing
    fn start(&mut self) -> CaptureResult<()>;

    /// Finish capturing and hand back the clip
    fn stop(&mut self) -> CaptureResult<AudioClip>;

    /// Give the device back. Must be safe to call more than once.
    fn release(&mut self);
}

/// Wraps a capture device with single-recording bookkeeping
pub struct VoiceBriefRecorder<C: AudioCapture> {
    capture: C,
    recording: bool,
}

impl<C: AudioCapture> VoiceBriefRecorder<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            recording: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn start(&mut self) -> CaptureResult<()> {
        if self.recording {
            return Err(CaptureError::AlreadyRecording);
        }
        if let Err(err) = self.capture.start() {
            log::warn!("[recording] could not start capture: {}", err);
            self.capture.release();
            return Err(err);
        }
        self.recording = true;
        log::debug!("[recording] capture started");
        Ok(())
    }

    pub fn stop(&mut self) -> CaptureResult<AudioClip> {
        if !self.recording {
            return Err(CaptureError::NotRecording);
        }
        let clip = self.capture.stop();
        self.capture.release();
        self.recording = false;

        match &clip {
            Ok(clip) => log::debug!(
                "[recording] captured {} bytes ({:.1}s)",
                clip.bytes.len(),
                clip.duration.as_secs_f32()
            ),
            Err(err) => log::warn!("[recording] capture failed on stop: {}", err),
        }
        clip
    }

    /// Abandon a recording without producing a clip
    pub fn discard(&mut self) {
        if self.recording {
            self.capture.release();
            self.recording = false;
        }
    }
}

impl<C: AudioCapture> Drop for VoiceBriefRecorder<C> {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Capture double that tracks whether the device is held
    #[derive(Default, Clone)]
    pub(crate) struct FakeCapture {
        pub held: Arc<AtomicBool>,
        pub releases: Arc<AtomicUsize>,
        pub start_error: Option<CaptureError>,
        pub stop_error: Option<CaptureError>,
    }

    impl AudioCapture for FakeCapture {
        fn start(&mut self) -> CaptureResult<()> {
            self.held.store(true, Ordering::SeqCst);
            match &self.start_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn stop(&mut self) -> CaptureResult<AudioClip> {
            if let Some(err) = &self.stop_error {
                return Err(err.clone());
            }
            Ok(AudioClip {
                mime_type: "audio/webm".to_string(),
                bytes: vec![1, 2, 3, 4],
                duration: Duration::from_secs(3),
            })
        }

        fn release(&mut self) {
            self.held.store(false, Ordering::SeqCst);
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_start_stop_releases_device() {
        let capture = FakeCapture::default();
        let held = capture.held.clone();
        let mut recorder = VoiceBriefRecorder::new(capture);

        recorder.start().unwrap();
        assert!(recorder.is_recording());
        assert!(held.load(Ordering::SeqCst));

        let clip = recorder.stop().unwrap();
        assert_eq!(clip.bytes, vec![1, 2, 3, 4]);
        assert!(!recorder.is_recording());
        assert!(!held.load(Ordering::SeqCst));
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut recorder = VoiceBriefRecorder::new(FakeCapture::default());
        recorder.start().unwrap();
        assert_eq!(recorder.start(), Err(CaptureError::AlreadyRecording));
        assert!(recorder.is_recording());
    }

    #[test]
    fn test_stop_without_start() {
        let mut recorder = VoiceBriefRecorder::new(FakeCapture::default());
        assert_eq!(recorder.stop(), Err(CaptureError::NotRecording));
    }

    #[test]
    fn test_permission_denied_releases_device() {
        let capture = FakeCapture {
            start_error: Some(CaptureError::PermissionDenied),
            ..Default::default()
        };
        let held = capture.held.clone();
        let mut recorder = VoiceBriefRecorder::new(capture);

        assert_eq!(recorder.start(), Err(CaptureError::PermissionDenied));
        assert!(!recorder.is_recording());
        assert!(!held.load(Ordering::SeqCst));
    }

    #[test]
    fn test_failed_stop_still_releases() {
        let capture = FakeCapture {
            stop_error: Some(CaptureError::Failed("encoder".to_string())),
            ..Default::default()
        };
        let held = capture.held.clone();
        let mut recorder = VoiceBriefRecorder::new(capture);

        recorder.start().unwrap();
        assert!(recorder.stop().is_err());
        assert!(!held.load(Ordering::SeqCst));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_drop_releases_active_recording() {
        let capture = FakeCapture::default();
        let held = capture.held.clone();
        let releases = capture.releases.clone();
        {
            let mut recorder = VoiceBriefRecorder::new(capture);
            recorder.start().unwrap();
        }
        assert!(!held.load(Ordering::SeqCst));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_user_messages() {
        assert!(CaptureError::PermissionDenied.user_message().contains("microphone"));
        assert!(CaptureError::DeviceUnavailable("none".into())
            .user_message()
            .contains("microphone"));
    }
}
