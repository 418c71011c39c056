//! Deterministic scoring: per-answer deltas and aggregate quiz results.
//!
//! Everything here is a pure function of its inputs. Malformed input
//! degrades to defaults (unknown difficulty scores as medium) rather than
//! erroring, so the session flow never stalls on a bad bank row.

use chrono::Utc;
use uuid::Uuid;

use crate::config;
use crate::models::{
    AnswerBreakdown, AnswerRecord, AnswerScore, CompletionBonus, CompletionBonusKind, Difficulty,
    Grade, LineItemKind, Question, QuizResult, ResultBreakdown, ScoreLineItem,
};

/// Caller-supplied flags that affect one answer's score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreOptions {
    /// Set when the session is still at 100% accuracy, unlocking the
    /// perfect-accuracy bonus on this answer.
    pub perfect_accuracy: bool,
}

/// Everything `score_quiz` needs to know about the session itself.
#[derive(Debug, Clone)]
pub struct QuizInfo {
    pub session_id: Uuid,
    pub category: String,
    pub time_budget_secs: u64,
    pub elapsed_secs: u64,
}

fn floor_frac(base: i64, factor: f64) -> i64 {
    (base as f64 * factor).floor() as i64
}

/// Compute the signed point delta for one answer.
///
/// `consecutive_correct` counts prior consecutive correct answers, not
/// including this one. Correct answers never score below 1; incorrect
/// answers never cost more than half the base value.
pub fn score_answer(
    question: &Question,
    is_correct: bool,
    time_spent_secs: u64,
    consecutive_correct: u32,
    opts: ScoreOptions,
) -> AnswerScore {
    let base = question.base_points();

    if is_correct {
        let mut bonuses = Vec::new();

        if consecutive_correct >= config::STREAK_THRESHOLD {
            let points = floor_frac(base, config::STREAK_MULTIPLIER - 1.0);
            bonuses.push(ScoreLineItem {
                kind: LineItemKind::Streak,
                points,
                description: format!("{} in a row", consecutive_correct + 1),
            });
        }

        let threshold = question.difficulty.speed_threshold();
        if time_spent_secs <= threshold {
            // Multiply before dividing so the floored quotient is exact;
            // dividing first loses points to float error on thirds.
            let (numer, denom) = config::SPEED_BONUS_RATIO;
            let points =
                base * (threshold - time_spent_secs) as i64 * numer / (threshold as i64 * denom);
            if points > 0 {
                bonuses.push(ScoreLineItem {
                    kind: LineItemKind::Speed,
                    points,
                    description: format!("Answered in {}s", time_spent_secs),
                });
            }
        }

        if question.difficulty == Difficulty::Hard {
            bonuses.push(ScoreLineItem {
                kind: LineItemKind::HardMastery,
                points: floor_frac(base, config::HARD_MASTERY_FACTOR),
                description: "Hard question".to_string(),
            });
        }

        if opts.perfect_accuracy {
            bonuses.push(ScoreLineItem {
                kind: LineItemKind::PerfectAccuracy,
                points: floor_frac(base, config::PERFECT_ANSWER_FACTOR),
                description: "Perfect accuracy so far".to_string(),
            });
        }

        let bonus_total: i64 = bonuses.iter().map(|b| b.points).sum();
        let points = (base + bonus_total).max(1);

        AnswerScore {
            points,
            bonuses,
            penalties: Vec::new(),
            breakdown: AnswerBreakdown {
                base,
                bonus_total,
                penalty_total: 0,
                net: points,
            },
        }
    } else {
        let mut penalties = Vec::new();

        let base_penalty = floor_frac(base, config::PENALTY_FACTOR);
        penalties.push(ScoreLineItem {
            kind: LineItemKind::WrongAnswer,
            points: base_penalty,
            description: "Incorrect answer".to_string(),
        });

        if time_spent_secs > config::SLOW_ANSWER_SECS {
            penalties.push(ScoreLineItem {
                kind: LineItemKind::SlowAnswer,
                points: base_penalty / 2,
                description: format!("Over {}s on one question", config::SLOW_ANSWER_SECS),
            });
        }

        let penalty_total: i64 = penalties.iter().map(|p| p.points).sum();
        // Cap: losing an answer never costs more than half its base value.
        let points = (-penalty_total).max(-(base / 2));

        AnswerScore {
            points,
            bonuses: Vec::new(),
            penalties,
            breakdown: AnswerBreakdown {
                base: 0,
                bonus_total: 0,
                penalty_total,
                net: points,
            },
        }
    }
}

/// Accuracy percentage rounded to one decimal; 0.0 for an empty session.
pub fn accuracy_pct(correct: usize, answered: usize) -> f64 {
    if answered == 0 {
        return 0.0;
    }
    let raw = correct as f64 / answered as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Letter grade for an accuracy percentage.
pub fn grade_for(accuracy: f64) -> Grade {
    let (letter, description, color) = match accuracy {
        a if a >= 95.0 => ("A+", "Outstanding", "green"),
        a if a >= 90.0 => ("A", "Excellent", "green"),
        a if a >= 85.0 => ("A-", "Very good", "green"),
        a if a >= 80.0 => ("B+", "Good", "cyan"),
        a if a >= 75.0 => ("B", "Solid", "cyan"),
        a if a >= 70.0 => ("B-", "Decent", "cyan"),
        a if a >= 65.0 => ("C+", "Fair", "yellow"),
        a if a >= 60.0 => ("C", "Passing", "yellow"),
        a if a >= 50.0 => ("D", "Needs work", "yellow"),
        _ => ("F", "Keep practicing", "red"),
    };
    Grade {
        letter,
        description,
        color,
    }
}

/// Aggregate a finished session's answer records into a result.
///
/// The per-answer sum is floored at 0 before completion bonuses are added,
/// so the final total is never negative.
pub fn score_quiz(records: &[AnswerRecord], info: &QuizInfo) -> QuizResult {
    let answered = records.len();
    let correct = records.iter().filter(|r| r.is_correct).count();
    let accuracy = accuracy_pct(correct, answered);

    let raw_total: i64 = records.iter().map(|r| r.points).sum();
    let answer_total = raw_total.max(0);
    let max_possible: i64 = records.iter().map(|r| r.base_points).sum();

    let mut completion_bonuses = Vec::new();
    if answered > 0 {
        let n = answered as i64;

        if accuracy == 100.0 {
            completion_bonuses.push(CompletionBonus {
                kind: CompletionBonusKind::PerfectScore,
                points: 10 * n,
                description: "Perfect score".to_string(),
            });
        } else if accuracy >= 90.0 {
            completion_bonuses.push(CompletionBonus {
                kind: CompletionBonusKind::HighAccuracy,
                points: 5 * n,
                description: "90%+ accuracy".to_string(),
            });
        }

        if answered >= 10 {
            completion_bonuses.push(CompletionBonus {
                kind: CompletionBonusKind::FullCompletion,
                points: 2 * n,
                description: format!("{} questions completed", answered),
            });
        }

        if info.elapsed_secs * 2 < info.time_budget_secs && accuracy >= 70.0 {
            completion_bonuses.push(CompletionBonus {
                kind: CompletionBonusKind::SpeedRun,
                points: 3 * n,
                description: "Finished in under half the time".to_string(),
            });
        }

        if info.category != "all" && accuracy == 100.0 {
            completion_bonuses.push(CompletionBonus {
                kind: CompletionBonusKind::CategoryMastery,
                points: 8 * n,
                description: format!("{} mastery", info.category),
            });
        }
    }

    let completion_total: i64 = completion_bonuses.iter().map(|b| b.points).sum();

    let breakdown = ResultBreakdown {
        base: records.iter().map(|r| r.breakdown.base).sum(),
        bonus: records.iter().map(|r| r.breakdown.bonus_total).sum(),
        penalty: records.iter().map(|r| r.breakdown.penalty_total).sum(),
        completion: completion_total,
    };

    QuizResult {
        session_id: info.session_id,
        category: info.category.clone(),
        total_points: answer_total + completion_total,
        correct_count: correct,
        answered_count: answered,
        accuracy,
        max_possible,
        completion_bonuses,
        grade: grade_for(accuracy),
        breakdown,
        elapsed_secs: info.elapsed_secs,
        finished_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionKind;

    fn question(difficulty: Difficulty) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: "test".to_string(),
            kind: QuestionKind::MultipleChoice,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".to_string(),
            explanation: None,
            category: "Science".to_string(),
            difficulty,
            points: None,
        }
    }

    fn record(question: &Question, score: &AnswerScore, is_correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: question.id,
            question_text: question.text.clone(),
            selected: "a".to_string(),
            correct_answer: question.correct_answer.clone(),
            is_correct,
            points: score.points,
            bonuses: score.bonuses.clone(),
            penalties: score.penalties.clone(),
            breakdown: score.breakdown,
            time_spent_secs: 5,
            category: question.category.clone(),
            difficulty: question.difficulty,
            answered_at: Utc::now(),
            base_points: question.base_points(),
        }
    }

    fn info(category: &str, budget: u64, elapsed: u64) -> QuizInfo {
        QuizInfo {
            session_id: Uuid::new_v4(),
            category: category.to_string(),
            time_budget_secs: budget,
            elapsed_secs: elapsed,
        }
    }

    #[test]
    fn correct_answers_always_score_at_least_one() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let q = question(difficulty);
            let s = score_answer(&q, true, 25, 0, ScoreOptions::default());
            assert!(s.points >= 1, "{:?} scored {}", difficulty, s.points);
        }
    }

    #[test]
    fn medium_streak_and_speed_scenario() {
        // base 20, streak of 2 prior correct, 5s of a 15s threshold:
        // 20 + floor(20*0.5)=10 + floor(20*(10/15)*0.3)=4 -> 34
        let q = question(Difficulty::Medium);
        let s = score_answer(&q, true, 5, 2, ScoreOptions::default());

        assert_eq!(s.points, 34);
        assert_eq!(s.bonuses.len(), 2);
        assert_eq!(s.bonuses[0].kind, LineItemKind::Streak);
        assert_eq!(s.bonuses[0].points, 10);
        assert_eq!(s.bonuses[1].kind, LineItemKind::Speed);
        assert_eq!(s.bonuses[1].points, 4);
        assert_eq!(s.breakdown.net, 34);
    }

    #[test]
    fn speed_bonus_survives_thirds() {
        // 20 x (10/15) x 3/10 is exactly 4 and 20 x (5/15) x 3/10 is
        // exactly 2; neither floor may lose a point to rounding.
        let q = question(Difficulty::Medium);

        let s = score_answer(&q, true, 5, 0, ScoreOptions::default());
        assert_eq!(s.bonuses[0].kind, LineItemKind::Speed);
        assert_eq!(s.bonuses[0].points, 4);
        assert_eq!(s.points, 24);

        let s = score_answer(&q, true, 10, 0, ScoreOptions::default());
        assert_eq!(s.bonuses[0].points, 2);
        assert_eq!(s.points, 22);
    }

    #[test]
    fn hard_question_adds_mastery_bonus() {
        let q = question(Difficulty::Hard);
        // No streak, too slow for the speed bonus: 30 + floor(30*0.2)=6
        let s = score_answer(&q, true, 21, 0, ScoreOptions::default());
        assert_eq!(s.points, 36);
        assert_eq!(s.bonuses.len(), 1);
        assert_eq!(s.bonuses[0].kind, LineItemKind::HardMastery);
    }

    #[test]
    fn perfect_flag_adds_half_base() {
        let q = question(Difficulty::Easy);
        let s = score_answer(
            &q,
            true,
            11,
            0,
            ScoreOptions {
                perfect_accuracy: true,
            },
        );
        // 10 + floor(10*0.5)=5
        assert_eq!(s.points, 15);
    }

    #[test]
    fn slow_easy_miss_loses_exactly_one() {
        // base 10, 70s: penalty floor(10*0.1)=1, slow extra 1/2=0 -> -1
        let q = question(Difficulty::Easy);
        let s = score_answer(&q, false, 70, 0, ScoreOptions::default());

        assert_eq!(s.points, -1);
        assert_eq!(s.penalties.len(), 2);
        assert_eq!(s.penalties[0].kind, LineItemKind::WrongAnswer);
        assert_eq!(s.penalties[1].kind, LineItemKind::SlowAnswer);
        assert_eq!(s.penalties[1].points, 0);
    }

    #[test]
    fn miss_never_costs_more_than_half_base() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let q = question(difficulty);
            let s = score_answer(&q, false, 300, 0, ScoreOptions::default());
            let base = q.base_points();
            assert!(s.points <= 0);
            assert!(s.points >= -(base / 2), "{:?} cost {}", difficulty, s.points);
        }
    }

    #[test]
    fn accuracy_rounds_to_one_decimal() {
        assert_eq!(accuracy_pct(0, 0), 0.0);
        assert_eq!(accuracy_pct(1, 3), 33.3);
        assert_eq!(accuracy_pct(2, 3), 66.7);
        assert_eq!(accuracy_pct(7, 7), 100.0);
    }

    #[test]
    fn grades_follow_the_threshold_table() {
        assert_eq!(grade_for(100.0).letter, "A+");
        assert_eq!(grade_for(95.0).letter, "A+");
        assert_eq!(grade_for(90.0).letter, "A");
        assert_eq!(grade_for(89.9).letter, "A-");
        assert_eq!(grade_for(70.0).letter, "B-");
        assert_eq!(grade_for(60.0).letter, "C");
        assert_eq!(grade_for(50.0).letter, "D");
        assert_eq!(grade_for(49.9).letter, "F");
    }

    #[test]
    fn total_is_never_negative() {
        let q = question(Difficulty::Hard);
        let miss = score_answer(&q, false, 90, 0, ScoreOptions::default());
        let records: Vec<_> = (0..3).map(|_| record(&q, &miss, false)).collect();

        let result = score_quiz(&records, &info("all", 90, 60));
        assert_eq!(result.total_points, 0);
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.grade.letter, "F");
    }

    #[test]
    fn perfect_science_run_collects_every_completion_bonus() {
        // 10/10 correct in a named category at 40% of the budget:
        // perfect +100, completion +20, speed +30, mastery +80, grade A+.
        let q = question(Difficulty::Medium);
        let hit = score_answer(&q, true, 20, 0, ScoreOptions::default());
        let records: Vec<_> = (0..10).map(|_| record(&q, &hit, true)).collect();

        let result = score_quiz(&records, &info("Science", 300, 120));

        let points_for = |kind: CompletionBonusKind| {
            result
                .completion_bonuses
                .iter()
                .find(|b| b.kind == kind)
                .map(|b| b.points)
        };
        assert_eq!(points_for(CompletionBonusKind::PerfectScore), Some(100));
        assert_eq!(points_for(CompletionBonusKind::FullCompletion), Some(20));
        assert_eq!(points_for(CompletionBonusKind::SpeedRun), Some(30));
        assert_eq!(points_for(CompletionBonusKind::CategoryMastery), Some(80));
        assert_eq!(points_for(CompletionBonusKind::HighAccuracy), None);
        assert_eq!(result.grade.letter, "A+");
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.breakdown.completion, 230);
    }

    #[test]
    fn high_accuracy_replaces_perfect_when_not_flawless() {
        let q = question(Difficulty::Easy);
        let hit = score_answer(&q, true, 11, 0, ScoreOptions::default());
        let miss = score_answer(&q, false, 11, 0, ScoreOptions::default());

        let mut records: Vec<_> = (0..9).map(|_| record(&q, &hit, true)).collect();
        records.push(record(&q, &miss, false));

        let result = score_quiz(&records, &info("History", 300, 290));
        let kinds: Vec<_> = result.completion_bonuses.iter().map(|b| b.kind).collect();
        assert!(kinds.contains(&CompletionBonusKind::HighAccuracy));
        assert!(!kinds.contains(&CompletionBonusKind::PerfectScore));
        assert!(!kinds.contains(&CompletionBonusKind::CategoryMastery));
    }

    #[test]
    fn empty_session_scores_zero_cleanly() {
        let result = score_quiz(&[], &info("all", 0, 0));
        assert_eq!(result.total_points, 0);
        assert_eq!(result.accuracy, 0.0);
        assert!(result.completion_bonuses.is_empty());
        assert_eq!(result.max_possible, 0);
    }
}
