//! Streamed reply and upload DTOs

use chatline_core::chat::{ReplyEvent, UploadedImage};
use chatline_core::error::{ChatlineError, Result};
use serde::Deserialize;

/// One `data:` frame of the reply event stream.
///
/// Frames come in several shapes that share no tag:
///
/// ```text
/// {"session_id": "..."}
/// {"type": "chunk", "content": "..."}
/// {"type": "error", "content": "..."}
/// {"type": "done", "message_id": "..."}
/// {"error": "..."}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamFrameDto {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StreamFrameDto {
    /// Converts the frame into an event. Unknown shapes yield `None`.
    pub fn into_event(self) -> Option<ReplyEvent> {
        if let Some(error) = self.error {
            return Some(ReplyEvent::Error(error));
        }
        match self.kind.as_deref() {
            Some("chunk") => Some(ReplyEvent::Chunk(self.content.unwrap_or_default())),
            Some("error") => Some(ReplyEvent::Error(self.content.unwrap_or_default())),
            Some("done") => Some(ReplyEvent::Done {
                message_id: self.message_id,
            }),
            Some(_) => None,
            None => self.session_id.map(ReplyEvent::SessionAssigned),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponseDto {
    pub success: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TryFrom<UploadResponseDto> for UploadedImage {
    type Error = ChatlineError;

    fn try_from(dto: UploadResponseDto) -> Result<Self> {
        match (dto.success, dto.image_url) {
            (true, Some(url)) => Ok(UploadedImage {
                url,
                path: dto.image_path,
            }),
            _ => Err(ChatlineError::invalid_response(
                dto.error.unwrap_or_else(|| "Upload failed".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> Option<ReplyEvent> {
        serde_json::from_str::<StreamFrameDto>(json)
            .unwrap()
            .into_event()
    }

    #[test]
    fn test_frame_shapes() {
        assert_eq!(
            event(r#"{"session_id": "s1"}"#),
            Some(ReplyEvent::SessionAssigned("s1".to_string()))
        );
        assert_eq!(
            event(r#"{"content": "你", "type": "chunk"}"#),
            Some(ReplyEvent::Chunk("你".to_string()))
        );
        assert_eq!(
            event(r#"{"content": "AI服务暂时不可用", "type": "error"}"#),
            Some(ReplyEvent::Error("AI服务暂时不可用".to_string()))
        );
        assert_eq!(
            event(r#"{"type": "done", "message_id": "m9"}"#),
            Some(ReplyEvent::Done {
                message_id: Some("m9".to_string())
            })
        );
        assert_eq!(
            event(r#"{"error": "会话不存在"}"#),
            Some(ReplyEvent::Error("会话不存在".to_string()))
        );
    }

    #[test]
    fn test_unknown_frames_are_skipped() {
        assert_eq!(event(r#"{"type": "ping"}"#), None);
        assert_eq!(event("{}"), None);
    }

    #[test]
    fn test_upload_response() {
        let ok: UploadResponseDto = serde_json::from_str(
            r#"{"success": true, "image_url": "/uploads/x.png", "image_path": "uploads/x.png", "error": null}"#,
        )
        .unwrap();
        let image = UploadedImage::try_from(ok).unwrap();
        assert_eq!(image.url, "/uploads/x.png");
        assert_eq!(image.path.as_deref(), Some("uploads/x.png"));

        let failed: UploadResponseDto =
            serde_json::from_str(r#"{"success": false, "error": "上传失败"}"#).unwrap();
        let err = UploadedImage::try_from(failed).unwrap_err();
        assert_eq!(err, ChatlineError::invalid_response("上传失败"));
    }
}
