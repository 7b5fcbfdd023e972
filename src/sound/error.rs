//! Error types for the audio engine.
//!
//! `SoundError` stays inside the engine: effects and synthesized noise log
//! it and carry on. Only file loads reach the host, wrapped in
//! `PlaybackError` together with the title of the failing track.

use std::path::PathBuf;

use thiserror::Error;

/// Failures inside the audio engine.
#[derive(Debug, Error)]
pub enum SoundError {
    /// The shared context has no open output device.
    #[error("オーディオ出力が停止中です")]
    Suspended,

    /// No usable output device exists.
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// The output stream refused a new sink.
    #[error("オーディオ出力を確保できません: {0}")]
    Sink(#[from] rodio::PlayError),

    #[error("音源ファイルがありません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("音源ファイルを読み込めません ({}): {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a supported audio format.
    #[error("音源をデコードできません: {0}")]
    Decode(String),
}

impl SoundError {
    /// Returns true when the output side is at fault, not the track.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::Suspended | Self::DeviceNotAvailable(_) | Self::Sink(_)
        )
    }

    /// Returns true when the track's file is at fault.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::FileRead { .. } | Self::Decode(_)
        )
    }

    /// Returns a hint for the user.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Suspended | Self::DeviceNotAvailable(_) => {
                "出力デバイスを接続してからもう一度お試しください"
            }
            Self::Sink(_) => "他のアプリケーションが出力を占有していないか確認してください",
            Self::FileNotFound(_) | Self::FileRead { .. } => {
                "--assets で音源ディレクトリを指定してください"
            }
            Self::Decode(_) => "MP3・WAV・FLAC・OGG 形式の音源を使用してください",
        }
    }
}

/// Errors surfaced to the host by the playback controller.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A file-backed track could not be fetched or decoded.
    #[error("「{title}」を再生できませんでした: {source}")]
    LoadFailed {
        title: String,
        #[source]
        source: SoundError,
    },

    /// The background loader thread could not be started.
    #[error("「{title}」の読み込みを開始できませんでした: {source}")]
    LoaderUnavailable {
        title: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlaybackError {
    pub(crate) fn load_failed(title: &str, source: SoundError) -> Self {
        Self::LoadFailed {
            title: title.to_string(),
            source,
        }
    }

    /// Returns a hint for the user.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::LoadFailed { source, .. } => source.suggestion(),
            Self::LoaderUnavailable { .. } => "しばらくしてからもう一度選択してください",
        }
    }
}
