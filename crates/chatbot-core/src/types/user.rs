use crate::marshal::impl_record;

/// A user or bot account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: Option<bool>,
}

impl_record! {
    User {
        id: required "id" => scalar,
        is_bot: required "is_bot" => scalar,
        first_name: required "first_name" => scalar,
        last_name: optional "last_name" => scalar,
        username: optional "username" => scalar,
        language_code: optional "language_code" => scalar,
        is_premium: optional "is_premium" => scalar,
    }
}

impl User {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            is_bot: false,
            first_name: first_name.into(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: None,
        }
    }

    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// `@username` when set, otherwise the full name.
    pub fn mention(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.full_name(),
        }
    }
}

/// A private chat, group, supergroup or channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: i64,
    /// `private`, `group`, `supergroup` or `channel`.
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl_record! {
    Chat {
        id: required "id" => scalar,
        chat_type: required "type" => scalar,
        title: optional "title" => scalar,
        username: optional "username" => scalar,
        first_name: optional "first_name" => scalar,
        last_name: optional "last_name" => scalar,
    }
}

impl Chat {
    pub fn private(id: i64) -> Self {
        Self {
            id,
            chat_type: "private".to_string(),
            title: None,
            username: None,
            first_name: None,
            last_name: None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.chat_type == "private"
    }
}
