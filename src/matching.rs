use crate::models::{Student, Teacher};
use crate::status::StudentStatus;

/// Score for a pair with a missing side.
pub const NO_MATCH_SCORE: i32 = -2000;
/// Score for a student whose school stage the teacher does not teach.
pub const DISQUALIFIED_SCORE: i32 = -1000;
pub const PRIMARY_SUBJECT_SCORE: i32 = 2000;
pub const SECONDARY_SUBJECT_SCORE: i32 = 1000;
pub const MAX_CANDIDATES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Elementary,
    Middle,
    High,
}

impl Stage {
    /// Word a teacher's subjects text must contain to teach this stage.
    pub fn keyword(self) -> &'static str {
        match self {
            Stage::Elementary => "יסודי",
            Stage::Middle => "חטיבה",
            Stage::High => "תיכון",
        }
    }

    /// Classifies a free-text grade label such as `ח`, `י"א`, `כיתה ג'` or `post`.
    pub fn of_grade(label: &str) -> Option<Stage> {
        let lowered = label.to_lowercase();
        if lowered.contains("post") {
            return Some(Stage::High);
        }

        let stripped: String = lowered
            .chars()
            .filter(|c| !matches!(c, '"' | '\'' | '`' | '׳' | '״'))
            .collect();

        stripped
            .split(|c: char| !c.is_alphanumeric())
            .find_map(Self::of_token)
    }

    fn of_token(token: &str) -> Option<Stage> {
        match token {
            "א" | "ב" | "ג" | "ד" | "ה" | "ו" => Some(Stage::Elementary),
            "ז" | "ח" | "ט" => Some(Stage::Middle),
            "י" | "יא" | "יב" => Some(Stage::High),
            _ => match token.parse::<u8>().ok()? {
                1..=6 => Some(Stage::Elementary),
                7..=9 => Some(Stage::Middle),
                10..=12 => Some(Stage::High),
                _ => None,
            },
        }
    }
}

fn mentions(subjects: &str, subject: &str) -> bool {
    !subject.is_empty() && subjects.contains(subject)
}

/// Scores how well `student` fits `teacher`. Higher is better.
pub fn score_pair(student: Option<&Student>, teacher: Option<&Teacher>) -> i32 {
    let (Some(student), Some(teacher)) = (student, teacher) else {
        return NO_MATCH_SCORE;
    };

    if let Some(stage) = Stage::of_grade(&student.student_class) {
        if !teacher.subjects.contains(stage.keyword()) {
            return DISQUALIFIED_SCORE;
        }
    }

    let mut score = 0;
    if mentions(&teacher.subjects, &student.primary_subject) {
        score += PRIMARY_SUBJECT_SCORE;
    }
    if mentions(&teacher.subjects, &student.secondary_subject) {
        score += SECONDARY_SUBJECT_SCORE;
    }
    score
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub student: &'a Student,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates<'a> {
    /// The teacher already has this student.
    Matched(Candidate<'a>),
    /// Best unassigned students, highest score first.
    Ranked(Vec<Candidate<'a>>),
}

impl<'a> Candidates<'a> {
    pub fn as_slice(&self) -> &[Candidate<'a>] {
        match self {
            Candidates::Matched(candidate) => std::slice::from_ref(candidate),
            Candidates::Ranked(candidates) => candidates,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Candidates::Matched(_))
    }
}

/// Ranks `pool` for `teacher`.
///
/// A teacher already linked to a student in the pool gets only that student.
/// Otherwise unassigned students are scored, stably sorted by descending score
/// (ties keep pool order) and cut to [`MAX_CANDIDATES`].
pub fn rank_candidates<'a>(pool: &'a [Student], teacher: &Teacher) -> Candidates<'a> {
    if !teacher.matched_student.is_empty() {
        if let Some(student) = pool.iter().find(|s| s.name == teacher.matched_student) {
            return Candidates::Matched(Candidate {
                student,
                score: score_pair(Some(student), Some(teacher)),
            });
        }
    }

    let mut ranked: Vec<Candidate<'a>> = pool
        .iter()
        .filter(|student| !StudentStatus::of(student).is_assigned())
        .map(|student| Candidate {
            student,
            score: score_pair(Some(student), Some(teacher)),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_CANDIDATES);
    Candidates::Ranked(ranked)
}
