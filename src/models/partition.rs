use serde::Serialize;

use crate::db::models::{Question, QuestionView};

/// A user's question list split by whether they have answered.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPartition {
    pub answered_questions: Vec<QuestionView>,
    pub to_be_answered_questions: Vec<QuestionView>,
}

/// Split `questions` into those `user_id` has answered and the rest.
///
/// Every question lands in exactly one side and relative order is kept.
/// Questions with no answers are always to be answered.
pub fn partition_questions(user_id: &str, questions: Vec<Question>) -> QuestionPartition {
    let (answered, to_be_answered): (Vec<_>, Vec<_>) = questions
        .into_iter()
        .partition(|q| q.answers.iter().any(|a| a.is_by_user(user_id)));

    QuestionPartition {
        answered_questions: answered.into_iter().map(Question::into_view).collect(),
        to_be_answered_questions: to_be_answered.into_iter().map(Question::into_view).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Answer, AnswerAuthor, QuestionInput};
    use chrono::{Duration, Utc};

    fn question(title: &str, authors: &[AnswerAuthor]) -> Question {
        let mut q = Question::new(
            QuestionInput {
                title: title.to_string(),
                description: String::new(),
                category: "general".to_string(),
                anonymous: false,
                deadline: Utc::now() + Duration::days(1),
                user_access: vec![],
                role_access: vec![],
                discord_user_access: vec![],
            },
            "admin",
        );
        for author in authors {
            q.answers
                .push(Answer::new(&q.id, "answer".to_string(), author.clone()));
        }
        q
    }

    fn user(id: &str) -> AnswerAuthor {
        AnswerAuthor::User {
            user_id: id.to_string(),
        }
    }

    fn titles(questions: &[QuestionView]) -> Vec<&str> {
        questions.iter().map(|q| q.title.as_str()).collect()
    }

    #[test]
    fn test_partition_basic() {
        let questions = vec![
            question("a", &[user("me")]),
            question("b", &[user("other")]),
            question("c", &[]),
            question("d", &[user("other"), user("me")]),
        ];

        let partition = partition_questions("me", questions);
        assert_eq!(titles(&partition.answered_questions), vec!["a", "d"]);
        assert_eq!(titles(&partition.to_be_answered_questions), vec!["b", "c"]);
    }

    #[test]
    fn test_discord_answers_do_not_count_for_user() {
        let questions = vec![question(
            "a",
            &[AnswerAuthor::Discord {
                discord_user_id: "me".to_string(),
            }],
        )];
        let partition = partition_questions("me", questions);
        assert!(partition.answered_questions.is_empty());
        assert_eq!(partition.to_be_answered_questions.len(), 1);
    }

    #[test]
    fn test_every_question_in_exactly_one_side() {
        let questions: Vec<Question> = (0..20)
            .map(|i| {
                let authors: Vec<AnswerAuthor> = (0..i % 4)
                    .map(|j| user(if (i + j) % 3 == 0 { "me" } else { "x" }))
                    .collect();
                question(&format!("q{i}"), &authors)
            })
            .collect();
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();

        let partition = partition_questions("me", questions);
        assert_eq!(
            partition.answered_questions.len() + partition.to_be_answered_questions.len(),
            ids.len()
        );
        for id in &ids {
            let in_answered = partition.answered_questions.iter().any(|q| &q.id == id);
            let in_pending = partition.to_be_answered_questions.iter().any(|q| &q.id == id);
            assert!(in_answered ^ in_pending, "question {id} must be in exactly one side");
        }
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_value(partition_questions("me", vec![])).unwrap();
        assert!(json["answeredQuestions"].is_array());
        assert!(json["toBeAnsweredQuestions"].is_array());
    }
}
