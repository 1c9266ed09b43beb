use chrono::{DateTime, Utc};

use super::User;
use crate::marshal::impl_record;

#[derive(Debug, Clone, PartialEq)]
pub struct PollOption {
    pub text: String,
    pub voter_count: i64,
}

impl_record! {
    PollOption {
        text: required "text" => scalar,
        voter_count: required "voter_count" => scalar,
    }
}

/// A native poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub total_voter_count: i64,
    pub is_closed: bool,
    pub is_anonymous: Option<bool>,
    pub poll_type: Option<String>,
    pub allows_multiple_answers: Option<bool>,
    pub close_date: Option<DateTime<Utc>>,
}

impl_record! {
    Poll {
        id: required "id" => scalar,
        question: required "question" => scalar,
        options: required "options" => list(PollOption),
        total_voter_count: required "total_voter_count" => scalar,
        is_closed: required "is_closed" => scalar,
        is_anonymous: optional "is_anonymous" => scalar,
        poll_type: optional "type" => scalar,
        allows_multiple_answers: optional "allows_multiple_answers" => scalar,
        close_date: optional "close_date" => timestamp,
    }
}

impl Poll {
    /// The option with the most votes, first one on ties.
    pub fn leading_option(&self) -> Option<&PollOption> {
        self.options
            .iter()
            .rev()
            .max_by_key(|option| option.voter_count)
    }
}

/// A user's answer in a non-anonymous poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollAnswer {
    pub poll_id: String,
    pub user: User,
    pub option_ids: Vec<i64>,
}

impl_record! {
    PollAnswer {
        poll_id: required "poll_id" => scalar,
        user: required "user" => nested(User),
        option_ids: required "option_ids" => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::Record;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_poll_round_trip() {
        let source = json!({
            "id": "p1",
            "question": "Lunch?",
            "options": [
                {"text": "pizza", "voter_count": 3},
                {"text": "salad", "voter_count": 3},
            ],
            "total_voter_count": 6,
            "is_closed": true,
            "close_date": 1441645532,
        });
        let poll = Poll::from_payload(&source).unwrap();

        assert_eq!(poll.leading_option().map(|o| o.text.as_str()), Some("pizza"));
        assert_eq!(poll.close_date.map(|d| d.timestamp()), Some(1441645532));
        assert_eq!(poll.to_payload(), source);
    }

    #[test]
    fn test_poll_answer_scalar_list() {
        let answer = PollAnswer::from_payload(&json!({
            "poll_id": "p1",
            "user": {"id": 4, "is_bot": false, "first_name": "Dee"},
            "option_ids": [0, 2],
        }))
        .unwrap();
        assert_eq!(answer.option_ids, vec![0, 2]);
        assert_eq!(answer.to_payload()["option_ids"], json!([0, 2]));
    }
}
