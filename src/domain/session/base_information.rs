//! Base information captured once at session creation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Placeholder shown to the content generator for an unanswered question.
pub const UNKNOWN_ANSWER: &str = "unknown";

/// Free-text profile answers the user gives before the bracket starts.
///
/// Immutable after the session is created. Every answer is required at
/// creation; stored payloads that predate a field deserialize it as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseInformation {
    pub max_living_expenses_from_parents: String,
    pub enough_savings_for_college: String,
    pub pocket_money_usage: String,
    pub willing_to_repeat_high_school_for_money: String,
    pub city_tier: String,
    pub parents_in_public_sector: String,
    pub has_stable_hobby: String,
    pub self_learning_after_gaokao: String,
    pub proactive_in_competitions: String,
    pub likes_reading_extracurricular_books: String,
}

impl BaseInformation {
    /// Field names paired with their answers, in questionnaire order.
    pub fn answers(&self) -> [(&'static str, &str); 10] {
        [
            (
                "max_living_expenses_from_parents",
                &self.max_living_expenses_from_parents,
            ),
            ("enough_savings_for_college", &self.enough_savings_for_college),
            ("pocket_money_usage", &self.pocket_money_usage),
            (
                "willing_to_repeat_high_school_for_money",
                &self.willing_to_repeat_high_school_for_money,
            ),
            ("city_tier", &self.city_tier),
            ("parents_in_public_sector", &self.parents_in_public_sector),
            ("has_stable_hobby", &self.has_stable_hobby),
            ("self_learning_after_gaokao", &self.self_learning_after_gaokao),
            ("proactive_in_competitions", &self.proactive_in_competitions),
            (
                "likes_reading_extracurricular_books",
                &self.likes_reading_extracurricular_books,
            ),
        ]
    }

    /// Answer for display, with blanks rendered as [`UNKNOWN_ANSWER`].
    pub fn display_answer(answer: &str) -> &str {
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            UNKNOWN_ANSWER
        } else {
            trimmed
        }
    }

    /// Ensures every answer is present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.answers().iter().find(|(_, answer)| answer.trim().is_empty()) {
            Some((field, _)) => Err(ValidationError::empty_field(*field)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::BaseInformation;

    /// A fully answered questionnaire.
    pub fn complete_base_information() -> BaseInformation {
        BaseInformation {
            max_living_expenses_from_parents: "2000".to_string(),
            enough_savings_for_college: "yes".to_string(),
            pocket_money_usage: "books".to_string(),
            willing_to_repeat_high_school_for_money: "no".to_string(),
            city_tier: "tier 2".to_string(),
            parents_in_public_sector: "no".to_string(),
            has_stable_hobby: "chess".to_string(),
            self_learning_after_gaokao: "yes".to_string(),
            proactive_in_competitions: "sometimes".to_string(),
            likes_reading_extracurricular_books: "yes".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::complete_base_information;
    use super::*;

    #[test]
    fn complete_information_validates() {
        assert!(complete_base_information().validate().is_ok());
    }

    #[test]
    fn blank_answer_names_the_field() {
        let mut info = complete_base_information();
        info.city_tier = "  ".to_string();

        match info.validate() {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "city_tier"),
            other => panic!("Expected EmptyField error, got {:?}", other),
        }
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let info: BaseInformation = serde_json::from_str(r#"{"city_tier": "tier 1"}"#).unwrap();
        assert_eq!(info.city_tier, "tier 1");
        assert!(info.has_stable_hobby.is_empty());
        assert!(info.validate().is_err());
    }

    #[test]
    fn blank_answers_display_as_unknown() {
        assert_eq!(BaseInformation::display_answer(""), UNKNOWN_ANSWER);
        assert_eq!(BaseInformation::display_answer(" yes "), "yes");
    }

    #[test]
    fn answers_cover_every_field() {
        let info = complete_base_information();
        assert_eq!(info.answers().len(), 10);
        assert!(info.answers().iter().all(|(_, a)| !a.is_empty()));
    }
}
