// src/core/scoring.rs

use std::collections::{HashMap, HashSet};

use crate::models::attempt::AnswerEntry;

/// Authoritative truth for one question of the attempt's fixed set.
#[derive(Debug, Clone, Copy)]
pub struct QuestionKey {
    pub correct_answer: i64,
    /// Resolved weight: explicit value or the difficulty tier default.
    pub xp_weight: i64,
}

/// Per-answer grading result.
#[derive(Debug, Clone)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub selected_answer: i64,
    pub is_correct: bool,
    pub xp_awarded: i64,
    pub time_spent: Option<i64>,
}

/// Aggregate grading result for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub correct_answers: i64,
    /// 0-100, rounded percentage over the attempt's fixed question count.
    pub score: i64,
    pub total_xp: i64,
}

/// Grades a submission against the attempt's answer key.
///
/// Pure and deterministic. Answers for unknown question ids are silently
/// skipped (stale or retried submissions), and only the first answer per
/// question counts. `total_questions` is the count fixed at start time, so a
/// partial submission yields a lower score rather than a division error.
pub fn grade(
    answers: &[AnswerEntry],
    key: &HashMap<i64, QuestionKey>,
    total_questions: i64,
) -> (Vec<GradedAnswer>, ScoreSummary) {
    let mut graded = Vec::with_capacity(answers.len());
    let mut seen = HashSet::new();
    let mut correct_answers = 0i64;
    let mut total_xp = 0i64;

    for answer in answers {
        let Some(truth) = key.get(&answer.question_id) else {
            continue;
        };
        if !seen.insert(answer.question_id) {
            continue;
        }

        let is_correct = answer.selected_answer == truth.correct_answer;
        let xp_awarded = if is_correct { truth.xp_weight } else { 0 };

        if is_correct {
            correct_answers += 1;
            total_xp += xp_awarded;
        }

        graded.push(GradedAnswer {
            question_id: answer.question_id,
            selected_answer: answer.selected_answer,
            is_correct,
            xp_awarded,
            time_spent: answer.time_spent,
        });
    }

    let score = if total_questions > 0 {
        (correct_answers as f64 / total_questions as f64 * 100.0).round() as i64
    } else {
        0
    };

    (
        graded,
        ScoreSummary {
            correct_answers,
            score,
            total_xp,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question_id: i64, selected_answer: i64) -> AnswerEntry {
        AnswerEntry {
            question_id,
            selected_answer,
            time_spent: None,
        }
    }

    fn key_of(pairs: &[(i64, i64, i64)]) -> HashMap<i64, QuestionKey> {
        pairs
            .iter()
            .map(|&(id, correct_answer, xp_weight)| {
                (
                    id,
                    QuestionKey {
                        correct_answer,
                        xp_weight,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn both_correct_earns_full_score_and_xp() {
        // One easy (weight 5) and one hard (weight 15) question.
        let key = key_of(&[(1, 0, 5), (2, 3, 15)]);

        let (graded, summary) = grade(&[entry(1, 0), entry(2, 3)], &key, 2);

        assert_eq!(graded.len(), 2);
        assert!(graded.iter().all(|g| g.is_correct));
        assert_eq!(summary.correct_answers, 2);
        assert_eq!(summary.score, 100);
        assert_eq!(summary.total_xp, 20);
    }

    #[test]
    fn only_easy_correct_earns_half_score() {
        let key = key_of(&[(1, 0, 5), (2, 3, 15)]);

        let (graded, summary) = grade(&[entry(1, 0), entry(2, 1)], &key, 2);

        assert_eq!(summary.correct_answers, 1);
        assert_eq!(summary.score, 50);
        assert_eq!(summary.total_xp, 5);
        assert!(graded[0].is_correct);
        assert!(!graded[1].is_correct);
        assert_eq!(graded[1].xp_awarded, 0);
    }

    #[test]
    fn unknown_question_ids_are_skipped() {
        let key = key_of(&[(1, 0, 10)]);

        let (graded, summary) = grade(&[entry(1, 0), entry(999, 0)], &key, 1);

        assert_eq!(graded.len(), 1);
        assert_eq!(summary.correct_answers, 1);
        assert_eq!(summary.score, 100);
    }

    #[test]
    fn duplicate_answers_count_once() {
        let key = key_of(&[(1, 0, 10)]);

        let (graded, summary) = grade(&[entry(1, 0), entry(1, 0), entry(1, 2)], &key, 1);

        assert_eq!(graded.len(), 1);
        assert_eq!(summary.correct_answers, 1);
        assert_eq!(summary.total_xp, 10);
    }

    #[test]
    fn partial_submission_scores_against_fixed_total() {
        let key = key_of(&[(1, 0, 10), (2, 1, 10), (3, 2, 10)]);

        // Only one of three questions answered.
        let (_, summary) = grade(&[entry(1, 0)], &key, 3);

        assert_eq!(summary.correct_answers, 1);
        assert_eq!(summary.score, 33);
        assert!(summary.correct_answers <= 3);
    }

    #[test]
    fn score_rounds_to_nearest() {
        let key = key_of(&[(1, 0, 5), (2, 0, 5), (3, 0, 5)]);

        // 2/3 = 66.67 -> 67
        let (_, summary) = grade(&[entry(1, 0), entry(2, 0), entry(3, 1)], &key, 3);
        assert_eq!(summary.score, 67);
    }

    #[test]
    fn empty_submission_scores_zero() {
        let key = key_of(&[(1, 0, 5)]);

        let (graded, summary) = grade(&[], &key, 1);

        assert!(graded.is_empty());
        assert_eq!(summary.score, 0);
        assert_eq!(summary.total_xp, 0);
    }
}
