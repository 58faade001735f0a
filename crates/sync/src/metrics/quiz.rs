use std::collections::HashSet;

use player_core::model::{Percentage, QuestionId};

use super::CompletionMetric;

const PRE_SUBMISSION_CAP: u8 = 99;

/// Quiz interaction state: `round(answered / total * 100)`, capped below
/// 100 until the attempt is submitted.
///
/// Full completion is driven by the explicit submission event, not by the
/// answer ratio; the cap keeps the ratio from claiming completion first.
#[derive(Debug, Clone, Default)]
pub struct QuizMetrics {
    total_questions: u32,
    answered: HashSet<QuestionId>,
    submitted: bool,
}

impl QuizMetrics {
    #[must_use]
    pub fn new(total_questions: u32) -> Self {
        Self {
            total_questions,
            answered: HashSet::new(),
            submitted: false,
        }
    }

    /// Record an answer. Re-answering a question counts once.
    pub fn answer(&mut self, question: QuestionId) {
        self.answered.insert(question);
    }

    /// The learner submitted the attempt.
    pub fn submit(&mut self) {
        self.submitted = true;
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }
}

impl CompletionMetric for QuizMetrics {
    fn completion(&self) -> Percentage {
        if self.submitted {
            return Percentage::COMPLETE;
        }
        let ratio =
            Percentage::from_ratio(self.answered.len() as u64, u64::from(self.total_questions));
        ratio.min(Percentage::clamped(i64::from(PRE_SUBMISSION_CAP)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_answered_questions() {
        let mut quiz = QuizMetrics::new(4);
        quiz.answer(QuestionId::new(1));
        assert_eq!(quiz.completion().value(), 25);

        quiz.answer(QuestionId::new(2));
        quiz.answer(QuestionId::new(2));
        assert_eq!(quiz.completion().value(), 50);
    }

    #[test]
    fn all_answers_without_submission_caps_below_complete() {
        let mut quiz = QuizMetrics::new(2);
        quiz.answer(QuestionId::new(1));
        quiz.answer(QuestionId::new(2));
        assert_eq!(quiz.completion().value(), 99);
        assert!(!quiz.is_submitted());
    }

    #[test]
    fn submission_completes_regardless_of_ratio() {
        let mut quiz = QuizMetrics::new(10);
        quiz.answer(QuestionId::new(1));
        quiz.submit();
        assert!(quiz.completion().is_complete());
    }

    #[test]
    fn empty_quiz_is_zero() {
        assert_eq!(QuizMetrics::new(0).completion(), Percentage::ZERO);
    }
}
