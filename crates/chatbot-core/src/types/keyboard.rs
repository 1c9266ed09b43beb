use crate::marshal::impl_record;

/// One button of an inline keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: Option<String>,
    pub callback_data: Option<String>,
    pub switch_inline_query: Option<String>,
}

impl_record! {
    InlineKeyboardButton {
        text: required "text" => scalar,
        url: optional "url" => scalar,
        callback_data: optional "callback_data" => scalar,
        switch_inline_query: optional "switch_inline_query" => scalar,
    }
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
            callback_data: Some(data.into()),
            switch_inline_query: None,
        }
    }
}

/// An inline keyboard: rows of buttons.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl_record! {
    InlineKeyboardMarkup {
        inline_keyboard: required "inline_keyboard" => list_of_lists(InlineKeyboardButton),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::{FieldKind, Record, TypeRef};
    use crate::types::RecordKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_grid_preserves_shape() {
        let source = json!({
            "inline_keyboard": [
                [{"text": "1", "callback_data": "one"}, {"text": "2", "callback_data": "two"}],
                [],
                [{"text": "docs", "url": "https://core.telegram.org"}],
            ]
        });
        let markup = InlineKeyboardMarkup::from_payload(&source).unwrap();

        let rows: Vec<usize> = markup.inline_keyboard.iter().map(Vec::len).collect();
        assert_eq!(rows, vec![2, 0, 1]);
        assert_eq!(markup.inline_keyboard[0][1], InlineKeyboardButton::callback("2", "two"));
        assert_eq!(markup.to_payload(), source);
    }

    #[test]
    fn test_grid_descriptor() {
        let descriptor = InlineKeyboardMarkup::descriptors()[0];
        assert_eq!(
            descriptor.kind,
            FieldKind::ListOfLists(TypeRef::Kind(RecordKind::InlineKeyboardButton))
        );
        assert_eq!(descriptor.kind.depth(), 2);
        assert!(descriptor.is_required());
    }

    #[test]
    fn test_grid_rejects_flat_list() {
        let source = json!({"inline_keyboard": [{"text": "1"}]});
        assert!(InlineKeyboardMarkup::from_payload(&source).is_err());
    }
}
