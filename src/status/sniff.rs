//! Video signature sniffing over a bounded byte prefix
//!
//! Recognizes the video entries of the WHATWG MIME sniffing table. Text,
//! truncated headers and unknown containers all classify as `None`.

/// Maximum number of bytes considered when sniffing.
pub const SNIFF_LEN: usize = 512;

const WEBM_MAGIC: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoKind {
    Mp4,
    WebM,
    Avi,
}

impl VideoKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoKind::Mp4 => "video/mp4",
            VideoKind::WebM => "video/webm",
            VideoKind::Avi => "video/avi",
        }
    }
}

/// Classify a file prefix. Only the first [`SNIFF_LEN`] bytes are looked at.
pub fn sniff_video(data: &[u8]) -> Option<VideoKind> {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if is_mp4(data) {
        Some(VideoKind::Mp4)
    } else if data.starts_with(WEBM_MAGIC) {
        Some(VideoKind::WebM)
    } else if is_avi(data) {
        Some(VideoKind::Avi)
    } else {
        None
    }
}

pub fn is_video(data: &[u8]) -> bool {
    sniff_video(data).is_some()
}

/// `ftyp` box whose major brand or one of the compatible brands starts
/// with `mp4`. The whole box must be present in `data`.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 {
        return false;
    }
    if &data[4..8] != b"ftyp" {
        return false;
    }

    // Offset 12 holds the minor version, not a brand
    (8..box_size)
        .step_by(4)
        .filter(|&offset| offset != 12)
        .any(|offset| &data[offset..offset + 3] == b"mp4")
}

fn is_avi(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"AVI "
}
