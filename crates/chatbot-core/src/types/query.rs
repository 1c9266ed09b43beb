use super::{Location, Message, User};
use crate::marshal::impl_record;

/// A press on an inline keyboard callback button.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackQuery {
    pub id: String,
    pub from_user: User,
    pub message: Option<Box<Message>>,
    pub inline_message_id: Option<String>,
    pub chat_instance: String,
    pub data: Option<String>,
    pub game_short_name: Option<String>,
}

impl_record! {
    CallbackQuery {
        id: required "id" => scalar,
        from_user: required "from" => nested(User),
        message: optional "message" => nested("Message"),
        inline_message_id: optional "inline_message_id" => scalar,
        chat_instance: required "chat_instance" => scalar,
        data: optional "data" => scalar,
        game_short_name: optional "game_short_name" => scalar,
    }
}

/// An incoming inline query.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineQuery {
    pub id: String,
    pub from_user: User,
    pub location: Option<Location>,
    pub query: String,
    pub offset: String,
}

impl_record! {
    InlineQuery {
        id: required "id" => scalar,
        from_user: required "from" => nested(User),
        location: optional "location" => nested(Location),
        query: required "query" => scalar,
        offset: required "offset" => scalar,
    }
}

/// An inline result the user picked.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from_user: User,
    pub location: Option<Location>,
    pub inline_message_id: Option<String>,
    pub query: String,
}

impl_record! {
    ChosenInlineResult {
        result_id: required "result_id" => scalar,
        from_user: required "from" => nested(User),
        location: optional "location" => nested(Location),
        inline_message_id: optional "inline_message_id" => scalar,
        query: required "query" => scalar,
    }
}
