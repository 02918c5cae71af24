//! JSON codec for the message envelope.

use serde_json::Value;
use thiserror::Error;

use super::dto::{Envelope, MessageType};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("envelope must be a JSON object")]
    NotAnObject,

    #[error("missing or non-string 'type' field")]
    MissingType,

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("invalid envelope: {0}")]
    InvalidShape(String),

    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

/// Decode one inbound text frame.
///
/// The `type` literal is checked before the full shape so that an unrecognized type
/// is reported as such rather than as a generic shape error.
pub fn decode(frame: &str) -> Result<Envelope, CodecError> {
    let value: Value =
        serde_json::from_str(frame).map_err(|e| CodecError::Malformed(e.to_string()))?;

    let object = value.as_object().ok_or(CodecError::NotAnObject)?;
    let literal = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?;
    if MessageType::from_literal(literal).is_none() {
        return Err(CodecError::UnknownType(literal.to_string()));
    }

    serde_json::from_value(value).map_err(|e| CodecError::InvalidShape(e.to_string()))
}

pub fn encode(envelope: &Envelope) -> Result<String, CodecError> {
    serde_json::to_string(envelope).map_err(|e| CodecError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::UserStatus, infrastructure::dto::Content};

    const TS: &str = "2025-03-25T14:30:00";

    #[test]
    fn test_decode_register_without_optional_fields() {
        // テスト項目: register メッセージ（sender のみ）がデコードできる
        // given (前提条件):
        let frame = r#"{"type": "register", "sender": "alice"}"#;

        // when (操作):
        let envelope = decode(frame).unwrap();

        // then (期待する結果):
        assert_eq!(envelope.r#type, MessageType::Register);
        assert_eq!(envelope.sender.as_deref(), Some("alice"));
        assert_eq!(envelope.target, None);
        assert_eq!(envelope.content, None);
    }

    #[test]
    fn test_decode_private_message() {
        // テスト項目: private メッセージの各フィールドがデコードされる
        // given (前提条件):
        let frame = r#"{"type":"private","sender":"bob","target":"carol","content":"hi","timestamp":"2025-03-25T14:30:00"}"#;

        // when (操作):
        let envelope = decode(frame).unwrap();

        // then (期待する結果):
        assert_eq!(envelope.r#type, MessageType::Private);
        assert_eq!(envelope.target.as_deref(), Some("carol"));
        assert_eq!(envelope.content_text(), Some("hi"));
    }

    #[test]
    fn test_decode_registration_content_object() {
        // テスト項目: ip のみを持つオブジェクトは Registration としてデコードされる
        // given (前提条件):
        let frame = r#"{"type":"register","sender":"alice","content":{"ip":"10.0.0.1"}}"#;

        // when (操作):
        let envelope = decode(frame).unwrap();

        // then (期待する結果):
        assert_eq!(
            envelope.content,
            Some(Content::Registration {
                ip: "10.0.0.1".to_string()
            })
        );
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        // テスト項目: 不正な JSON は Malformed エラーになる
        // given (前提条件):
        let frame = "{not json";

        // when (操作):
        let result = decode(frame);

        // then (期待する結果):
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        // テスト項目: オブジェクト以外の JSON はエラーになる
        // given (前提条件):
        let frame = r#"["register"]"#;

        // when (操作):
        let result = decode(frame);

        // then (期待する結果):
        assert_eq!(result, Err(CodecError::NotAnObject));
    }

    #[test]
    fn test_decode_rejects_missing_type() {
        // テスト項目: type フィールドがない、または文字列でない場合はエラーになる
        // given (前提条件):
        let missing = r#"{"sender":"alice"}"#;
        let numeric = r#"{"type":3,"sender":"alice"}"#;

        // when (操作):
        let missing_result = decode(missing);
        let numeric_result = decode(numeric);

        // then (期待する結果):
        assert_eq!(missing_result, Err(CodecError::MissingType));
        assert_eq!(numeric_result, Err(CodecError::MissingType));
    }

    #[test]
    fn test_decode_reports_unknown_type() {
        // テスト項目: 未知の type は UnknownType エラーとして報告される
        // given (前提条件):
        let frame = r#"{"type":"chat","sender":"alice","content":"hi"}"#;

        // when (操作):
        let result = decode(frame);

        // then (期待する結果):
        assert_eq!(result, Err(CodecError::UnknownType("chat".to_string())));
    }

    #[test]
    fn test_decode_rejects_wrong_field_shape() {
        // テスト項目: フィールドの型が不正な場合は InvalidShape エラーになる
        // given (前提条件):
        let frame = r#"{"type":"broadcast","sender":"alice","content":42}"#;

        // when (操作):
        let result = decode(frame);

        // then (期待する結果):
        assert!(matches!(result, Err(CodecError::InvalidShape(_))));
    }

    #[test]
    fn test_encode_omits_absent_fields() {
        // テスト項目: 値のないフィールドはエンコード結果に含まれない
        // given (前提条件):
        let envelope = Envelope::list_users_response(
            vec!["alice".to_string(), "bob".to_string()],
            TS.to_string(),
        );

        // when (操作):
        let json = encode(&envelope).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"type":"list_users_response","sender":"server","content":["alice","bob"],"timestamp":"2025-03-25T14:30:00"}"#
        );
    }

    #[test]
    fn test_encode_status_update_shape() {
        // テスト項目: status_update の content が {user, status} の形でエンコードされる
        // given (前提条件):
        let envelope =
            Envelope::status_update("alice".to_string(), UserStatus::Inactive, TS.to_string());

        // when (操作):
        let value: Value = serde_json::from_str(&encode(&envelope).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(value["content"]["user"], "alice");
        assert_eq!(value["content"]["status"], "INACTIVE");
    }

    #[test]
    fn test_server_envelopes_survive_encode_decode() {
        // テスト項目: サーバーが送信する 9 種類のエンベロープがエンコード→デコードで同じ値に戻る
        // given (前提条件):
        let ts = || TS.to_string();
        let envelopes = vec![
            Envelope::register_success(vec!["alice".to_string()], ts()),
            Envelope::broadcast("alice".to_string(), "hello".to_string(), ts()),
            Envelope::private("bob".to_string(), "carol".to_string(), "psst".to_string(), ts()),
            Envelope::list_users_response(vec!["alice".to_string(), "bob".to_string()], ts()),
            Envelope::user_info_response(
                "bob".to_string(),
                Content::UserInfo {
                    ip: "10.0.0.2".to_string(),
                    status: UserStatus::Busy,
                },
                ts(),
            ),
            Envelope::status_update("bob".to_string(), UserStatus::Busy, ts()),
            Envelope::user_disconnected("bob".to_string(), ts()),
            Envelope::server_notice("connection established", ts()),
            Envelope::error("not registered", ts()),
        ];

        for envelope in envelopes {
            // when (操作):
            let decoded = decode(&encode(&envelope).unwrap()).unwrap();

            // then (期待する結果):
            assert_eq!(decoded, envelope);
        }
    }

    fn client_envelope(
        r#type: MessageType,
        target: Option<&str>,
        content: Option<Content>,
    ) -> Envelope {
        Envelope {
            r#type,
            sender: Some("alice".to_string()),
            target: target.map(str::to_string),
            content,
            timestamp: Some(TS.to_string()),
        }
    }

    #[test]
    fn test_client_envelopes_survive_encode_decode() {
        // テスト項目: クライアントが送信するエンベロープがエンコード→デコードで同じ値に戻る
        // given (前提条件):
        let envelopes = vec![
            client_envelope(
                MessageType::Register,
                None,
                Some(Content::Registration {
                    ip: "10.0.0.1".to_string(),
                }),
            ),
            client_envelope(MessageType::ListUsers, None, None),
            client_envelope(MessageType::UserInfo, Some("bob"), None),
            client_envelope(
                MessageType::ChangeStatus,
                None,
                Some(Content::Text("BUSY".to_string())),
            ),
            client_envelope(
                MessageType::Disconnect,
                None,
                Some(Content::Text("bye".to_string())),
            ),
        ];

        for envelope in envelopes {
            // when (操作):
            let decoded = decode(&encode(&envelope).unwrap()).unwrap();

            // then (期待する結果):
            assert_eq!(decoded, envelope);
        }
    }
}
