use std::path::Path;

use serde::Serialize;

/// Audio codec as understood by the recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    EncodingUnspecified,
    Linear16,
    Flac,
    Mulaw,
    Amr,
    AmrWb,
    OggOpus,
    Mp3,
    Mp4,
    WebmOpus,
}

impl AudioEncoding {
    /// Map an uploaded filename to a codec by its extension
    ///
    /// Unknown or missing extensions map to `EncodingUnspecified` and the
    /// recognizer is left to sniff the container.
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("mp3") => Self::Mp3,
            Some("m4a" | "mp4") => Self::Mp4,
            Some("wav") => Self::Linear16,
            Some("flac") => Self::Flac,
            Some("ogg" | "opus") => Self::OggOpus,
            Some("webm") => Self::WebmOpus,
            Some("amr") => Self::Amr,
            Some("awb") => Self::AmrWb,
            Some("ul" | "mulaw") => Self::Mulaw,
            _ => Self::EncodingUnspecified,
        }
    }

    /// Name used on the wire, e.g. `LINEAR16`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EncodingUnspecified => "ENCODING_UNSPECIFIED",
            Self::Linear16 => "LINEAR16",
            Self::Flac => "FLAC",
            Self::Mulaw => "MULAW",
            Self::Amr => "AMR",
            Self::AmrWb => "AMR_WB",
            Self::OggOpus => "OGG_OPUS",
            Self::Mp3 => "MP3",
            Self::Mp4 => "MP4",
            Self::WebmOpus => "WEBM_OPUS",
        }
    }

    /// WAV and FLAC carry their own sample rate
    pub fn has_header(self) -> bool {
        matches!(self, Self::Linear16 | Self::Flac)
    }
}
