use chrono::{DateTime, Utc};

use super::{Chat, InlineKeyboardMarkup, User};
use crate::marshal::impl_record;

/// A message in a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub from_user: Option<User>,
    pub date: DateTime<Utc>,
    pub chat: Chat,
    pub forward_from: Option<User>,
    pub forward_date: Option<DateTime<Utc>>,
    pub reply_to_message: Option<Box<Message>>,
    pub edit_date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub entities: Option<Vec<MessageEntity>>,
    pub caption: Option<String>,
    pub caption_entities: Option<Vec<MessageEntity>>,
    pub photo: Option<Vec<PhotoSize>>,
    pub document: Option<Document>,
    pub location: Option<Location>,
    pub contact: Option<Contact>,
    pub new_chat_members: Option<Vec<User>>,
    pub left_chat_member: Option<User>,
    pub pinned_message: Option<Box<Message>>,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl_record! {
    Message {
        message_id: required "message_id" => scalar,
        from_user: optional "from" => nested(User),
        date: required "date" => timestamp,
        chat: required "chat" => nested(Chat),
        forward_from: optional "forward_from" => nested(User),
        forward_date: optional "forward_date" => timestamp,
        reply_to_message: optional "reply_to_message" => nested("Message"),
        edit_date: optional "edit_date" => timestamp,
        text: optional "text" => scalar,
        entities: optional "entities" => list(MessageEntity),
        caption: optional "caption" => scalar,
        caption_entities: optional "caption_entities" => list(MessageEntity),
        photo: optional "photo" => list(PhotoSize),
        document: optional "document" => nested(Document),
        location: optional "location" => nested(Location),
        contact: optional "contact" => nested(Contact),
        new_chat_members: optional "new_chat_members" => list(User),
        left_chat_member: optional "left_chat_member" => nested(User),
        pinned_message: optional "pinned_message" => nested("Message"),
        reply_markup: optional "reply_markup" => nested(InlineKeyboardMarkup),
    }
}

impl Message {
    /// A bare text message, mostly useful for building test fixtures.
    pub fn plain(message_id: i64, date: DateTime<Utc>, chat: Chat, text: impl Into<String>) -> Self {
        Self {
            message_id,
            from_user: None,
            date,
            chat,
            forward_from: None,
            forward_date: None,
            reply_to_message: None,
            edit_date: None,
            text: Some(text.into()),
            entities: None,
            caption: None,
            caption_entities: None,
            photo: None,
            document: None,
            location: None,
            contact: None,
            new_chat_members: None,
            left_chat_member: None,
            pinned_message: None,
            reply_markup: None,
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat.id
    }

    /// The leading `/command` of the text, without any `@botname` suffix.
    pub fn command(&self) -> Option<&str> {
        let first = self.text.as_deref()?.split_whitespace().next()?;
        if !first.starts_with('/') {
            return None;
        }
        Some(first.split('@').next().unwrap_or(first))
    }
}

/// A special entity in a message text (hashtag, command, URL, …).
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEntity {
    pub entity_type: String,
    pub offset: i64,
    pub length: i64,
    pub url: Option<String>,
    pub user: Option<User>,
}

impl_record! {
    MessageEntity {
        entity_type: required "type" => scalar,
        offset: required "offset" => scalar,
        length: required "length" => scalar,
        url: optional "url" => scalar,
        user: optional "user" => nested(User),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: Option<String>,
    pub width: i64,
    pub height: i64,
    pub file_size: Option<i64>,
}

impl_record! {
    PhotoSize {
        file_id: required "file_id" => scalar,
        file_unique_id: optional "file_unique_id" => scalar,
        width: required "width" => scalar,
        height: required "height" => scalar,
        file_size: optional "file_size" => scalar,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: Option<String>,
    pub thumb: Option<PhotoSize>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

impl_record! {
    Document {
        file_id: required "file_id" => scalar,
        file_unique_id: optional "file_unique_id" => scalar,
        thumb: optional "thumb" => nested(PhotoSize),
        file_name: optional "file_name" => scalar,
        mime_type: optional "mime_type" => scalar,
        file_size: optional "file_size" => scalar,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

impl_record! {
    Location {
        longitude: required "longitude" => scalar,
        latitude: required "latitude" => scalar,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_id: Option<i64>,
}

impl_record! {
    Contact {
        phone_number: required "phone_number" => scalar,
        first_name: required "first_name" => scalar,
        last_name: optional "last_name" => scalar,
        user_id: optional "user_id" => scalar,
    }
}
