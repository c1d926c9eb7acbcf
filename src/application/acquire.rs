//! Stream acquisition use case

use tokio::sync::mpsc;

use crate::domain::error::AcquisitionError;
use crate::domain::media::{AudioConstraints, MediaStream, VideoConstraints, VideoTrack};

use super::ports::MediaDevices;

/// Progress reported to the recorder's event loop
#[derive(Debug, Clone)]
pub enum AcquisitionEvent {
    /// The screen source is available, the microphone is being requested
    VideoReady,
    /// Both sources are available and combined
    StreamReady(MediaStream),
    /// Acquisition failed; nothing will be retried
    Failed(AcquisitionError),
}

/// Obtains the screen stream, then the microphone, and combines them
pub struct StreamAcquirer<D: MediaDevices> {
    devices: D,
    video: VideoConstraints,
    audio: AudioConstraints,
}

impl<D: MediaDevices> StreamAcquirer<D> {
    /// Create a new acquirer
    pub fn new(devices: D, video: VideoConstraints, audio: AudioConstraints) -> Self {
        Self {
            devices,
            video,
            audio,
        }
    }

    /// Run both acquisition steps in order.
    ///
    /// `on_video_ready` is called between the two steps. Either step failing
    /// aborts the whole acquisition.
    pub async fn acquire<F>(&self, mut on_video_ready: F) -> Result<MediaStream, AcquisitionError>
    where
        F: FnMut(&VideoTrack),
    {
        let video = self.devices.request_video(&self.video).await?;
        if !self.video.accepts(video.width, video.height) {
            return Err(AcquisitionError::video(format!(
                "source resolution {}x{} is outside {}x{}..={}",
                video.width,
                video.height,
                self.video.width,
                self.video.height.start(),
                self.video.height.end()
            )));
        }
        on_video_ready(&video);

        let mut stream = MediaStream::from_video(video);
        let audio = self.devices.request_audio(&self.audio).await?;
        stream.add_audio_track(audio);

        Ok(stream)
    }

    /// Acquire and report every step on `events`
    pub async fn run(self, events: mpsc::UnboundedSender<AcquisitionEvent>) {
        let result = self
            .acquire(|_| {
                let _ = events.send(AcquisitionEvent::VideoReady);
            })
            .await;

        let event = match result {
            Ok(stream) => AcquisitionEvent::StreamReady(stream),
            Err(e) => AcquisitionEvent::Failed(e),
        };
        let _ = events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AcquisitionStep;
    use crate::domain::media::AudioTrack;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Devices that succeed or fail per step
    struct MockDevices {
        video_ok: bool,
        audio_ok: bool,
        height: u32,
        audio_requests: Arc<AtomicUsize>,
    }

    impl MockDevices {
        fn working() -> Self {
            Self {
                video_ok: true,
                audio_ok: true,
                height: 720,
                audio_requests: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl MediaDevices for MockDevices {
        async fn request_video(
            &self,
            constraints: &VideoConstraints,
        ) -> Result<VideoTrack, AcquisitionError> {
            if !self.video_ok {
                return Err(AcquisitionError::video("permission denied"));
            }
            Ok(VideoTrack {
                input_format: "mock".to_string(),
                device: "screen".to_string(),
                width: constraints.width,
                height: self.height,
                frame_rate: constraints.frame_rate,
            })
        }

        async fn request_audio(
            &self,
            _constraints: &AudioConstraints,
        ) -> Result<AudioTrack, AcquisitionError> {
            self.audio_requests.fetch_add(1, Ordering::SeqCst);
            if !self.audio_ok {
                return Err(AcquisitionError::audio("no microphone"));
            }
            Ok(AudioTrack {
                input_format: "mock".to_string(),
                device: "mic".to_string(),
            })
        }
    }

    fn acquirer(devices: MockDevices) -> StreamAcquirer<MockDevices> {
        StreamAcquirer::new(
            devices,
            VideoConstraints::default(),
            AudioConstraints::default(),
        )
    }

    #[tokio::test]
    async fn acquire_combines_tracks() {
        let mut video_ready = 0;
        let stream = acquirer(MockDevices::working())
            .acquire(|_| video_ready += 1)
            .await
            .unwrap();

        assert_eq!(video_ready, 1);
        assert!(stream.is_combined());
        assert_eq!(stream.video().width, 1280);
    }

    #[tokio::test]
    async fn video_failure_skips_audio() {
        let devices = MockDevices {
            video_ok: false,
            ..MockDevices::working()
        };
        let audio_requests = Arc::clone(&devices.audio_requests);

        let mut video_ready = false;
        let err = acquirer(devices)
            .acquire(|_| video_ready = true)
            .await
            .unwrap_err();

        assert_eq!(err.step, AcquisitionStep::Video);
        assert!(!video_ready);
        assert_eq!(audio_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn audio_failure_aborts() {
        let devices = MockDevices {
            audio_ok: false,
            ..MockDevices::working()
        };
        let err = acquirer(devices).acquire(|_| {}).await.unwrap_err();
        assert_eq!(err.step, AcquisitionStep::Audio);
    }

    #[tokio::test]
    async fn out_of_band_resolution_is_rejected() {
        let devices = MockDevices {
            height: 1080,
            ..MockDevices::working()
        };
        let err = acquirer(devices).acquire(|_| {}).await.unwrap_err();
        assert_eq!(err.step, AcquisitionStep::Video);
    }

    #[tokio::test]
    async fn run_reports_events_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        acquirer(MockDevices::working()).run(tx).await;

        assert!(matches!(rx.recv().await, Some(AcquisitionEvent::VideoReady)));
        assert!(matches!(
            rx.recv().await,
            Some(AcquisitionEvent::StreamReady(_))
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn run_reports_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let devices = MockDevices {
            video_ok: false,
            ..MockDevices::working()
        };
        acquirer(devices).run(tx).await;

        assert!(matches!(rx.recv().await, Some(AcquisitionEvent::Failed(_))));
        assert!(rx.recv().await.is_none());
    }
}
