//! Chat session DTOs

use super::timestamp::parse_timestamp;
use chatline_core::chat::{ChatSession, Message, MessageRole};
use chatline_core::error::{ChatlineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub role: MessageRole,
    pub timestamp: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TryFrom<MessageDto> for Message {
    type Error = ChatlineError;

    fn try_from(dto: MessageDto) -> Result<Self> {
        Ok(Message {
            id: dto.id,
            content: dto.content.unwrap_or_default(),
            role: dto.role,
            timestamp: parse_timestamp(&dto.timestamp)?,
            image_url: dto.image_url,
            image_file: None,
        })
    }
}

impl TryFrom<SessionDto> for ChatSession {
    type Error = ChatlineError;

    fn try_from(dto: SessionDto) -> Result<Self> {
        let created_at = parse_timestamp(&dto.created_at)?;
        let updated_at = match dto.updated_at.as_deref() {
            Some(raw) => parse_timestamp(raw)?,
            None => created_at,
        };
        let messages = dto
            .messages
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(ChatSession {
            id: dto.id,
            title: dto.title,
            messages,
            created_at,
            updated_at,
        })
    }
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        MessageDto {
            id: message.id.clone(),
            content: Some(message.content.clone()),
            role: message.role,
            timestamp: message.timestamp.to_rfc3339(),
            image_url: message.image_url.clone(),
        }
    }
}

impl From<&ChatSession> for SessionDto {
    fn from(session: &ChatSession) -> Self {
        SessionDto {
            id: session.id.clone(),
            title: session.title.clone(),
            messages: session.messages.iter().map(MessageDto::from).collect(),
            created_at: session.created_at.to_rfc3339(),
            updated_at: Some(session.updated_at.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_core::chat::LocalImage;

    const LISTED_SESSION: &str = r#"{
        "id": "b3c1",
        "user_id": 4,
        "title": "图片里是什么",
        "created_at": "2024-05-01T10:00:00.123456",
        "updated_at": null,
        "messages": [
            {
                "id": "m1",
                "chat_session_id": "b3c1",
                "content": "图片里是什么",
                "type": "user",
                "image_url": "/uploads/cat.png",
                "image_path": "uploads/cat.png",
                "timestamp": "2024-05-01T10:00:01"
            },
            {
                "id": "m2",
                "chat_session_id": "b3c1",
                "content": null,
                "type": "bot",
                "image_url": null,
                "image_path": null,
                "timestamp": "2024-05-01T10:00:02Z"
            }
        ]
    }"#;

    #[test]
    fn test_listed_session_maps_to_domain() {
        let dto: SessionDto = serde_json::from_str(LISTED_SESSION).unwrap();
        let session = ChatSession::try_from(dto).unwrap();

        assert_eq!(session.id, "b3c1");
        assert_eq!(session.title, "图片里是什么");
        assert_eq!(session.updated_at, session.created_at);
        assert_eq!(session.messages.len(), 2);

        let user = &session.messages[0];
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.image_url.as_deref(), Some("/uploads/cat.png"));
        assert!(user.image_file.is_none());

        let bot = &session.messages[1];
        assert_eq!(bot.role, MessageRole::Bot);
        assert_eq!(bot.content, "");
    }

    #[test]
    fn test_listed_session_saves_back_unchanged() {
        let dto: SessionDto = serde_json::from_str(LISTED_SESSION).unwrap();
        let loaded = ChatSession::try_from(dto).unwrap();

        let saved = SessionDto::from(&loaded);

        assert_eq!(saved.id, "b3c1");
        assert_eq!(saved.title, "图片里是什么");
        let ids: Vec<&str> = saved.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);

        // What the backend would return after the save maps to the same session
        let body = serde_json::to_string(&saved).unwrap();
        let reloaded =
            ChatSession::try_from(serde_json::from_str::<SessionDto>(&body).unwrap()).unwrap();
        assert_eq!(reloaded, loaded);
    }

    #[test]
    fn test_bad_timestamp_fails_whole_session() {
        let dto = SessionDto {
            id: "1".to_string(),
            title: "t".to_string(),
            messages: Vec::new(),
            created_at: "not a date".to_string(),
            updated_at: None,
        };
        assert!(ChatSession::try_from(dto).is_err());
    }

    #[test]
    fn test_domain_to_wire_uses_type_and_drops_local_file() {
        let mut session = ChatSession::new();
        session.push_message(Message::new(
            "hello",
            MessageRole::User,
            Some("/uploads/a.png".to_string()),
            Some(LocalImage::new("/home/me/a.png")),
        ));

        let json = serde_json::to_value(SessionDto::from(&session)).unwrap();
        let message = &json["messages"][0];

        assert_eq!(message["type"], "user");
        assert_eq!(message["image_url"], "/uploads/a.png");
        assert!(message.get("image_file").is_none());
        assert!(message.get("role").is_none());
        assert_eq!(json["id"], "");
    }
}
