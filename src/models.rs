use chrono::NaiveDate;
use serde::Serialize;

/// Last column read from a student sheet (`A2:U`).
pub const STUDENT_LAST_COLUMN: usize = 20;
/// Last column read from the teachers sheet (`A2:AA`).
pub const TEACHER_LAST_COLUMN: usize = 26;
/// Last column read from the coordinators sheet (`A2:D`).
pub const COORDINATOR_LAST_COLUMN: usize = 3;
/// Last column read from the matches sheet (`A2:E`).
pub const MATCH_LAST_COLUMN: usize = 4;

/// Columns of the fields this application writes back.
///
/// Their read position follows the configured layout, so a moved column is
/// read from the same cell it is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkColumns {
    /// First of the two opening-call cells (who, then insights).
    pub teacher_opening_call: usize,
    pub teacher_matched_student: usize,
    pub student_matched_teacher: usize,
}

impl Default for LinkColumns {
    fn default() -> Self {
        Self {
            teacher_opening_call: 23,
            teacher_matched_student: TEACHER_LAST_COLUMN,
            student_matched_teacher: STUDENT_LAST_COLUMN,
        }
    }
}

impl LinkColumns {
    pub fn teacher_last_column(&self) -> usize {
        TEACHER_LAST_COLUMN
            .max(self.teacher_opening_call + 1)
            .max(self.teacher_matched_student)
    }

    pub fn student_last_column(&self) -> usize {
        STUDENT_LAST_COLUMN.max(self.student_matched_teacher)
    }
}

/// Title marking a female coordinator.
const FEMALE_COORDINATOR_TITLE: &str = "מצוותת";
const MALE: &str = "זכר";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub index: usize,
    pub city: String,
    pub creation_date: String,
    pub creation_time: String,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub gender: String,
    pub student_class: String,
    pub track: String,
    pub primary_subject: String,
    pub secondary_subject: String,
    pub math_level: String,
    pub english_level: String,
    pub days: String,
    pub week_days_hours: String,
    pub weekend_hours: String,
    pub time_length: String,
    pub about_you: String,
    pub tos: String,
    pub matched_teacher: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Teacher {
    pub index: usize,
    pub creation_date: String,
    pub creation_time: String,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub gender: String,
    pub has_teaching_cert: String,
    pub teaching_experience: String,
    pub track: String,
    pub bagrut_track: String,
    pub subjects: String,
    pub math_level: String,
    pub english_level: String,
    pub days: String,
    pub week_days_hours: String,
    pub weekend_hours: String,
    pub time_length: String,
    pub has_taught: String,
    pub how_was_teaching_with_us: String,
    pub is_ok_to_make_a_call: String,
    pub about_me: String,
    pub opening_call_with: String,
    pub opening_call_insights: String,
    pub match_by: String,
    pub matched_student: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coordinator {
    pub full_name: String,
    pub name: String,
    pub email: String,
    pub title: String,
}

impl Coordinator {
    pub fn is_female(&self) -> bool {
        self.title == FEMALE_COORDINATOR_TITLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub index: usize,
    pub student: String,
    pub teacher: String,
    pub subject: Option<String>,
    pub coordinator: String,
    pub coordination_date: Option<NaiveDate>,
}

/// Sequential reader over one sheet row. Cells past the end read as empty.
struct Cells<'a> {
    row: &'a [String],
    next: usize,
}

impl<'a> Cells<'a> {
    fn new(row: &'a [String]) -> Self {
        Self { row, next: 0 }
    }

    fn take(&mut self) -> String {
        let value = self
            .row
            .get(self.next)
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default();
        self.next += 1;
        value
    }
}

fn cell(row: &[String], column: usize) -> String {
    row.get(column).map(|c| c.trim().to_string()).unwrap_or_default()
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Keeps digits, `+` and `-`, and restores the leading zero spreadsheets drop.
pub fn fix_phone(phone: &str) -> String {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+' || *c == '-')
        .collect();

    match cleaned.chars().next() {
        Some('1'..='9') => format!("0{cleaned}"),
        _ => cleaned,
    }
}

pub fn is_male(gender: &str) -> bool {
    gender == MALE
}

pub fn parse_students(rows: &[Vec<String>], city: &str, links: &LinkColumns) -> Vec<Student> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !is_blank(row))
        .map(|(index, row)| {
            let mut cells = Cells::new(row);
            let mut student = Student {
                index,
                city: city.to_string(),
                creation_date: cells.take(),
                creation_time: cells.take(),
                first_name: cells.take(),
                last_name: cells.take(),
                name: cells.take(),
                phone_number: fix_phone(&cells.take()),
                email: cells.take(),
                gender: cells.take(),
                student_class: cells.take(),
                track: cells.take(),
                primary_subject: cells.take(),
                secondary_subject: cells.take(),
                math_level: cells.take(),
                english_level: cells.take(),
                days: cells.take(),
                week_days_hours: cells.take(),
                weekend_hours: cells.take(),
                time_length: cells.take(),
                about_you: cells.take(),
                tos: cells.take(),
                matched_teacher: cells.take(),
            };
            student.matched_teacher = cell(row, links.student_matched_teacher);
            student
        })
        .collect()
}

pub fn parse_teachers(rows: &[Vec<String>], links: &LinkColumns) -> Vec<Teacher> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !is_blank(row))
        .map(|(index, row)| {
            let mut cells = Cells::new(row);
            let mut teacher = Teacher {
                index,
                creation_date: cells.take(),
                creation_time: cells.take(),
                first_name: cells.take(),
                last_name: cells.take(),
                name: cells.take(),
                phone_number: fix_phone(&cells.take()),
                email: cells.take(),
                gender: cells.take(),
                has_teaching_cert: cells.take(),
                teaching_experience: cells.take(),
                track: cells.take(),
                bagrut_track: cells.take(),
                subjects: cells.take(),
                math_level: cells.take(),
                english_level: cells.take(),
                days: cells.take(),
                week_days_hours: cells.take(),
                weekend_hours: cells.take(),
                time_length: cells.take(),
                has_taught: cells.take(),
                how_was_teaching_with_us: cells.take(),
                is_ok_to_make_a_call: cells.take(),
                about_me: cells.take(),
                opening_call_with: cells.take(),
                opening_call_insights: cells.take(),
                match_by: cells.take(),
                matched_student: cells.take(),
            };
            teacher.opening_call_with = cell(row, links.teacher_opening_call);
            teacher.opening_call_insights = cell(row, links.teacher_opening_call + 1);
            teacher.matched_student = cell(row, links.teacher_matched_student);
            teacher
        })
        .collect()
}

pub fn parse_coordinators(rows: &[Vec<String>]) -> Vec<Coordinator> {
    rows.iter()
        .filter(|row| !is_blank(row))
        .map(|row| {
            let mut cells = Cells::new(row);
            Coordinator {
                full_name: cells.take(),
                name: cells.take(),
                email: cells.take(),
                title: cells.take(),
            }
        })
        .collect()
}

pub fn parse_matches(rows: &[Vec<String>]) -> Vec<Match> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !is_blank(row))
        .map(|(index, row)| {
            let mut cells = Cells::new(row);
            let student = cells.take();
            let teacher = cells.take();
            let subject = Some(cells.take()).filter(|s| !s.is_empty());
            let coordinator = cells.take();
            let coordination_date = parse_sheet_date(&cells.take());
            Match {
                index,
                student,
                teacher,
                subject,
                coordinator,
                coordination_date,
            }
        })
        .collect()
}

/// Parses the date part of a spreadsheet timestamp (`14/10/2026 09:30:00`).
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let date = raw.split_whitespace().next()?;
    ["%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn phone_numbers_regain_leading_zero() {
        assert_eq!(fix_phone("501234567"), "0501234567");
        assert_eq!(fix_phone("050-123 4567"), "050-1234567");
        assert_eq!(fix_phone("+972 50 123 4567"), "+972501234567");
        assert_eq!(fix_phone(""), "");
    }

    #[test]
    fn short_rows_fill_missing_cells() {
        let rows = vec![row(&[
            "1/9/2026", "10:00", "דנה", "כהן", "דנה כהן", "521112222", "dana@example.com", "נקבה",
        ])];
        let teachers = parse_teachers(&rows, &LinkColumns::default());

        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].name, "דנה כהן");
        assert_eq!(teachers[0].phone_number, "0521112222");
        assert_eq!(teachers[0].subjects, "");
        assert_eq!(teachers[0].matched_student, "");
    }

    #[test]
    fn blank_rows_are_skipped_but_keep_indices() {
        let mut full = vec![String::new(); STUDENT_LAST_COLUMN + 1];
        full[4] = "נועה לוי".to_string();
        full[8] = "ח".to_string();
        full[10] = "אנגלית".to_string();
        full[20] = "דנה כהן".to_string();

        let rows = vec![row(&[]), row(&["", " "]), full];
        let students = parse_students(&rows, "כפר עזה", &LinkColumns::default());

        assert_eq!(students.len(), 1);
        let student = &students[0];
        assert_eq!(student.index, 2);
        assert_eq!(student.city, "כפר עזה");
        assert_eq!(student.student_class, "ח");
        assert_eq!(student.primary_subject, "אנגלית");
        assert_eq!(student.matched_teacher, "דנה כהן");
    }

    #[test]
    fn moved_link_columns_are_read_from_their_new_cells() {
        let mut full = vec![String::new(); 29];
        full[4] = "דנה כהן".to_string();
        full[23] = "stale".to_string();
        full[26] = "stale".to_string();
        full[27] = "רונית".to_string();
        full[28] = "זמינה בערבים".to_string();

        let links = LinkColumns {
            teacher_opening_call: 27,
            teacher_matched_student: 29,
            ..LinkColumns::default()
        };
        assert_eq!(links.teacher_last_column(), 29);

        full.push("נועה לוי".to_string());
        let teachers = parse_teachers(&[full], &links);

        assert_eq!(teachers[0].opening_call_with, "רונית");
        assert_eq!(teachers[0].opening_call_insights, "זמינה בערבים");
        assert_eq!(teachers[0].matched_student, "נועה לוי");
        assert_eq!(LinkColumns::default().teacher_last_column(), TEACHER_LAST_COLUMN);
    }

    #[test]
    fn coordinators_detect_female_title() {
        let coordinators = parse_coordinators(&[
            row(&["רונית אלון", "רונית", "ronit@example.com", "מצוותת"]),
            row(&["אבי בר", "אבי", "avi@example.com", "מצוות"]),
        ]);

        assert!(coordinators[0].is_female());
        assert!(!coordinators[1].is_female());
        assert_eq!(coordinators[1].email, "avi@example.com");
    }

    #[test]
    fn matches_parse_optional_subject_and_date() {
        let matches = parse_matches(&[
            row(&["נועה לוי", "דנה כהן", "", "רונית", "14/10/2026 09:30:00"]),
            row(&["עומר", "יוסי", "מתמטיקה", "אבי", "not a date"]),
        ]);

        assert_eq!(matches[0].subject, None);
        assert_eq!(
            matches[0].coordination_date,
            NaiveDate::from_ymd_opt(2026, 10, 14)
        );
        assert_eq!(matches[1].subject.as_deref(), Some("מתמטיקה"));
        assert_eq!(matches[1].coordination_date, None);
    }
}
