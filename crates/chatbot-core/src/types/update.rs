//! The root update envelope and its derived projections.

use std::fmt;

use super::{
    CallbackQuery, Chat, ChosenInlineResult, InlineQuery, Message, Poll, PollAnswer, User,
};
use crate::marshal::impl_record;

/// One incoming update. At most one of the optional sub-objects is set in
/// practice, but nothing here relies on that.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
    pub channel_post: Option<Message>,
    pub edited_channel_post: Option<Message>,
    pub inline_query: Option<InlineQuery>,
    pub chosen_inline_result: Option<ChosenInlineResult>,
    pub callback_query: Option<CallbackQuery>,
    pub poll: Option<Poll>,
    pub poll_answer: Option<PollAnswer>,
}

impl_record! {
    Update {
        update_id: required "update_id" => scalar,
        message: optional "message" => nested(Message),
        edited_message: optional "edited_message" => nested(Message),
        channel_post: optional "channel_post" => nested(Message),
        edited_channel_post: optional "edited_channel_post" => nested(Message),
        inline_query: optional "inline_query" => nested(InlineQuery),
        chosen_inline_result: optional "chosen_inline_result" => nested(ChosenInlineResult),
        callback_query: optional "callback_query" => nested(CallbackQuery),
        poll: optional "poll" => nested(Poll),
        poll_answer: optional "poll_answer" => nested(PollAnswer),
    }
}

/// Which sub-object an update carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    Poll,
    PollAnswer,
    /// None of the known sub-objects is present.
    Unknown,
}

impl UpdateKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::InlineQuery => "inline_query",
            Self::ChosenInlineResult => "chosen_inline_result",
            Self::CallbackQuery => "callback_query",
            Self::Poll => "poll",
            Self::PollAnswer => "poll_answer",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Update {
    pub fn new(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
            edited_message: None,
            channel_post: None,
            edited_channel_post: None,
            inline_query: None,
            chosen_inline_result: None,
            callback_query: None,
            poll: None,
            poll_answer: None,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_callback_query(mut self, query: CallbackQuery) -> Self {
        self.callback_query = Some(query);
        self
    }

    /// Message-like sub-objects in precedence order.
    fn messages(&self) -> impl Iterator<Item = &Message> {
        [
            self.message.as_ref(),
            self.edited_message.as_ref(),
            self.channel_post.as_ref(),
            self.edited_channel_post.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// The user this update originates from.
    ///
    /// Checked in order: `message`, `edited_message`, `channel_post`,
    /// `edited_channel_post`, `callback_query`, `inline_query`,
    /// `chosen_inline_result`, `poll_answer`. The first present sub-object
    /// that carries a user wins; channel posts usually carry none.
    pub fn effective_user(&self) -> Option<&User> {
        self.messages()
            .find_map(|message| message.from_user.as_ref())
            .or_else(|| self.callback_query.as_ref().map(|q| &q.from_user))
            .or_else(|| self.inline_query.as_ref().map(|q| &q.from_user))
            .or_else(|| self.chosen_inline_result.as_ref().map(|r| &r.from_user))
            .or_else(|| self.poll_answer.as_ref().map(|a| &a.user))
    }

    /// The message this update is about, including the one a callback button
    /// was attached to.
    pub fn effective_message(&self) -> Option<&Message> {
        self.messages().next().or_else(|| {
            self.callback_query
                .as_ref()
                .and_then(|query| query.message.as_deref())
        })
    }

    /// The chat of [`effective_message`](Self::effective_message).
    pub fn effective_chat(&self) -> Option<&Chat> {
        self.effective_message().map(|message| &message.chat)
    }

    /// The first present sub-object, in field order.
    pub fn kind(&self) -> UpdateKind {
        if self.message.is_some() {
            UpdateKind::Message
        } else if self.edited_message.is_some() {
            UpdateKind::EditedMessage
        } else if self.channel_post.is_some() {
            UpdateKind::ChannelPost
        } else if self.edited_channel_post.is_some() {
            UpdateKind::EditedChannelPost
        } else if self.inline_query.is_some() {
            UpdateKind::InlineQuery
        } else if self.chosen_inline_result.is_some() {
            UpdateKind::ChosenInlineResult
        } else if self.callback_query.is_some() {
            UpdateKind::CallbackQuery
        } else if self.poll.is_some() {
            UpdateKind::Poll
        } else if self.poll_answer.is_some() {
            UpdateKind::PollAnswer
        } else {
            UpdateKind::Unknown
        }
    }
}
