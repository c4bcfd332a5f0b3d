use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::error::MediaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    Microphone,
    Camera,
    Screen,
}

/// An outgoing track fed with encoded samples by a capture pipeline.
///
/// Disabling a track drops its samples instead of removing it from the
/// connections, so muting never renegotiates.
pub struct LocalTrack {
    id: String,
    kind: TrackKind,
    source: TrackSource,
    rtp: Arc<TrackLocalStaticSample>,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl LocalTrack {
    pub fn new(source: TrackSource, stream_id: &str) -> Arc<Self> {
        let (kind, codec) = match source {
            TrackSource::Microphone => (
                TrackKind::Audio,
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48000,
                    channels: 2,
                    ..Default::default()
                },
            ),
            TrackSource::Camera | TrackSource::Screen => (
                TrackKind::Video,
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90000,
                    ..Default::default()
                },
            ),
        };
        let id = format!("{:?}-{}", source, Uuid::new_v4().simple()).to_lowercase();
        let rtp = Arc::new(TrackLocalStaticSample::new(
            codec,
            id.clone(),
            stream_id.to_owned(),
        ));

        Arc::new(Self {
            id,
            kind,
            source,
            rtp,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn source(&self) -> TrackSource {
        self.source
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn rtp_track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.rtp.clone()
    }

    /// Sends one encoded frame. Returns `Ok(false)` when the track is disabled
    /// and the frame was dropped.
    pub async fn write_frame(&self, data: Bytes, duration: Duration) -> Result<bool, MediaError> {
        if self.is_stopped() {
            return Err(MediaError::Stopped);
        }
        if !self.is_enabled() {
            return Ok(false);
        }
        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };
        self.rtp
            .write_sample(&sample)
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;
        Ok(true)
    }
}

/// The local capture shared read-only by every outgoing peer link.
#[derive(Clone)]
pub struct LocalStream {
    id: String,
    tracks: Vec<Arc<LocalTrack>>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<LocalTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<LocalTrack>] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    pub fn video_track(&self) -> Option<&Arc<LocalTrack>> {
        self.tracks_of(TrackKind::Video).next()
    }

    /// A copy of this stream whose video tracks are replaced by `video`.
    pub fn with_video(&self, video: Arc<LocalTrack>) -> Self {
        let mut tracks: Vec<_> = self.tracks_of(TrackKind::Audio).cloned().collect();
        tracks.push(video);
        Self {
            id: self.id.clone(),
            tracks,
        }
    }

    /// Flips every track of `kind` to `enabled`.
    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        for track in self.tracks_of(kind) {
            track.set_enabled(enabled);
        }
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.tracks.iter().all(|t| t.is_stopped())
    }
}
