use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::data::Snapshot;
use crate::models::Match;
use crate::status::{PairIssue, StudentStatus, TeacherStatus, pair_issues};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub waiting: usize,
    pub available: usize,
    pub assigned: usize,
}

pub fn count_teachers(snapshot: &Snapshot) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for teacher in &snapshot.teachers {
        counts.total += 1;
        match TeacherStatus::of(teacher) {
            TeacherStatus::NotContacted => counts.waiting += 1,
            TeacherStatus::Available { .. } => counts.available += 1,
            TeacherStatus::Assigned { .. } => counts.assigned += 1,
        }
    }
    counts
}

/// Student counts per city, in city order.
pub fn count_students(snapshot: &Snapshot) -> BTreeMap<&str, StatusCounts> {
    let mut map: BTreeMap<&str, StatusCounts> = BTreeMap::new();
    for student in &snapshot.students {
        let counts = map.entry(student.city.as_str()).or_default();
        counts.total += 1;
        match StudentStatus::of(student) {
            StudentStatus::Unassigned => counts.waiting += 1,
            StudentStatus::Available => counts.available += 1,
            StudentStatus::Assigned { .. } => counts.assigned += 1,
        }
    }
    map
}

fn recent_matches(matches: &[Match]) -> Vec<&Match> {
    let mut recent: Vec<&Match> = matches.iter().collect();
    recent.sort_by(|a, b| b.coordination_date.cmp(&a.coordination_date));
    recent
}

pub fn build_report(generated_on: NaiveDate, snapshot: &Snapshot) -> String {
    let teachers = count_teachers(snapshot);
    let students = count_students(snapshot);
    let issues = pair_issues(&snapshot.teachers, &snapshot.students);

    let mut output = String::new();
    let _ = writeln!(output, "# Learning On Matching Report");
    let _ = writeln!(output, "Generated on {generated_on}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Teachers");
    let _ = writeln!(
        output,
        "- {} teachers: {} assigned, {} available, {} awaiting an opening call",
        teachers.total, teachers.assigned, teachers.available, teachers.waiting
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");
    if students.is_empty() {
        let _ = writeln!(output, "No students registered.");
    } else {
        for (city, counts) in &students {
            let _ = writeln!(
                output,
                "- {city}: {} students, {} assigned, {} available, {} without a subject",
                counts.total, counts.assigned, counts.available, counts.waiting
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Coordinators");
    if snapshot.coordinators.is_empty() {
        let _ = writeln!(output, "No coordinators listed.");
    } else {
        for coordinator in &snapshot.coordinators {
            let (owned, assigned) = snapshot
                .teachers
                .iter()
                .filter(|t| t.match_by == coordinator.name)
                .fold((0, 0), |(owned, assigned), t| {
                    let done = usize::from(TeacherStatus::of(t).is_assigned());
                    (owned + 1, assigned + done)
                });
            let _ = writeln!(
                output,
                "- {} ({}): {owned} teachers, {assigned} assigned",
                coordinator.full_name, coordinator.email
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Matches");
    let recent = recent_matches(&snapshot.matches);
    if recent.is_empty() {
        let _ = writeln!(output, "No matches recorded.");
    } else {
        for m in recent.iter().take(10) {
            let date = m
                .coordination_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "undated".to_string());
            let subject = m.subject.as_deref().unwrap_or("no subject");
            let _ = writeln!(
                output,
                "- {} with {} ({subject}) by {} on {date}",
                m.student, m.teacher, m.coordinator
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Unreciprocated Links");
    if issues.is_empty() {
        let _ = writeln!(output, "Every teacher link is confirmed on the student side.");
    } else {
        for issue in &issues {
            match issue {
                PairIssue::MissingStudent { teacher, student } => {
                    let _ = writeln!(output, "- {teacher} names {student}, who is not registered");
                }
                PairIssue::NotReciprocated {
                    teacher,
                    student,
                    student_links_to: Some(other),
                } => {
                    let _ = writeln!(output, "- {teacher} names {student}, who is linked to {other}");
                }
                PairIssue::NotReciprocated {
                    teacher,
                    student,
                    student_links_to: None,
                } => {
                    let _ = writeln!(output, "- {teacher} names {student}, who is not linked back");
                }
            }
        }
    }

    output
}
