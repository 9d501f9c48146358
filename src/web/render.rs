//! Server-rendered pages.
//!
//! The whole UI is one right-to-left page. Selection and filters travel in
//! the query string and every action is a plain form post, so the page works
//! without client-side scripting.

use std::fmt::Write;

use url::form_urlencoded;

use super::format::format_hours;
use crate::data::Snapshot;
use crate::matching::{Candidates, rank_candidates};
use crate::models::{self, Coordinator, Student, Teacher};
use crate::session::{Flash, UndoAction, UserProfile};
use crate::status::{StudentStatus, TeacherStatus};

const TITLE: &str = "לומדים הלאה - שיבוץ שיעורים";
const DESCRIPTION: &str = "מערכת לשיבוץ מורים ותלמידים בפרוייקט לומדים הלאה Learning On";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 72rem; padding: 1rem; }
.swipe-list { display: flex; gap: .75rem; overflow-x: auto; padding-bottom: .5rem; }
.card { border: 1px solid #ccc; border-radius: .5rem; min-width: 18rem; padding: .75rem; }
.card.available { border-color: #2a9d8f; }
.card.assigned { background: #f1f1f1; }
.card.selected { outline: 3px solid #264653; }
.name a { font-weight: bold; }
.details, .insights, .join-date { color: #555; font-size: .9rem; }
.toast { background: #e9f5ee; border-radius: .5rem; padding: .75rem; }
.toast form { display: inline; }
.message { margin-top: 2rem; }
.warning { color: #9b2226; }
"#;

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Percent-encodes a path segment or query value.
pub fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn contact_href(name: &str, phone: &str) -> String {
    format!("/contact/{}/{}", encode_component(name), encode_component(phone))
}

fn whatsapp_href(phone: &str, message: &str) -> String {
    format!("https://wa.me/{}?text={}", encode_component(phone), encode_component(message))
}

fn teacher_whatsapp_message(teacher: &Teacher) -> String {
    format!("שלום {}, האם אפשר לשבץ אליך תלמידים לשיעורים פרטיים?", teacher.name)
}

fn student_whatsapp_message(student: &Student) -> String {
    format!("שלום {}, האם אפשר לשבץ אליך מורה לשיעורים פרטיים?", student.name)
}

/// Page filters taken from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub selected: Option<usize>,
    pub include_assigned: bool,
    pub search: String,
    pub mine: bool,
}

impl Filters {
    /// Link to the page with the same filters and `teacher` selected.
    pub fn href(&self, teacher: Option<usize>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(index) = teacher {
            query.append_pair("teacher", &index.to_string());
        }
        if self.include_assigned {
            query.append_pair("all", "1");
        }
        if self.mine {
            query.append_pair("mine", "1");
        }
        if !self.search.is_empty() {
            query.append_pair("q", &self.search);
        }

        let query = query.finish();
        if query.is_empty() {
            "/".to_string()
        } else {
            format!("/?{query}")
        }
    }

    fn matches_search(&self, teacher: &Teacher) -> bool {
        self.search
            .split(' ')
            .filter(|term| !term.is_empty())
            .all(|term| teacher.name.contains(term))
    }
}

/// Everything the main page shows for one coordinator.
pub struct MainView<'a> {
    pub user: &'a UserProfile,
    pub coordinator: &'a Coordinator,
    pub filters: &'a Filters,
    pub teachers: Vec<&'a Teacher>,
    pub selected: Option<&'a Teacher>,
    pub candidates: Option<Candidates<'a>>,
}

impl<'a> MainView<'a> {
    pub fn build(
        snapshot: &'a Snapshot,
        user: &'a UserProfile,
        coordinator: &'a Coordinator,
        filters: &'a Filters,
    ) -> Self {
        let teachers: Vec<&Teacher> = snapshot
            .teachers
            .iter()
            .filter(|t| {
                filters.include_assigned
                    || !TeacherStatus::of(t).is_assigned()
                    || Some(t.index) == filters.selected
            })
            .filter(|t| !filters.mine || t.match_by == coordinator.name)
            .filter(|t| filters.matches_search(t))
            .collect();

        let selected = filters
            .selected
            .and_then(|index| teachers.iter().find(|t| t.index == index).copied())
            .or_else(|| teachers.first().copied());

        let candidates = selected.map(|teacher| rank_candidates(&snapshot.students, teacher));

        Self {
            user,
            coordinator,
            filters,
            teachers,
            selected,
            candidates,
        }
    }
}

/// Details of the site owner shown in the about box.
#[derive(Debug, Clone, Default)]
pub struct Owner<'a> {
    pub email: &'a str,
    pub phone: &'a str,
}

fn document(body: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"he\" dir=\"rtl\">");
    let _ = writeln!(out, "<head>");
    let _ = writeln!(out, "<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    let _ = writeln!(out, "<meta name=\"description\" content=\"{}\">", escape_html(DESCRIPTION));
    let _ = writeln!(out, "<title>{}</title>", escape_html(TITLE));
    let _ = writeln!(out, "<style>{STYLE}</style>");
    let _ = writeln!(out, "</head>");
    let _ = writeln!(out, "<body>");
    let _ = writeln!(out, "<h1>לומדים הלאה - מערכת שיבוץ</h1>");
    out.push_str(body);
    let _ = writeln!(out, "</body>");
    let _ = writeln!(out, "</html>");
    out
}

fn about(out: &mut String, owner: &Owner<'_>) {
    if owner.email.is_empty() && owner.phone.is_empty() {
        return;
    }

    let _ = writeln!(out, "<footer class=\"about\">");
    let _ = write!(
        out,
        "מערכת השיבוץ של מיזם <a href=\"https://www.learningon.org/\">לומדים הלאה</a>."
    );
    if !owner.email.is_empty() {
        let _ = write!(
            out,
            " לשאלות: <a href=\"mailto:{0}\">{0}</a>",
            escape_html(owner.email)
        );
    }
    if !owner.phone.is_empty() {
        let _ = write!(
            out,
            " <a class=\"whatsapp\" href=\"{}\">WhatsApp</a>",
            escape_html(&whatsapp_href(owner.phone, "שלום, זה בקשר למערכת השיבוץ של לומדים הלאה."))
        );
    }
    let _ = writeln!(out, "\n</footer>");
}

pub fn login_page(owner: &Owner<'_>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<form method=\"post\" action=\"/auth/google\" class=\"message\">");
    let _ = writeln!(body, "<h2><div>כדי להשתמש במערכת יש להכנס.</div><button>כניסה</button></h2>");
    let _ = writeln!(body, "</form>");
    about(&mut body, owner);
    document(&body)
}

pub fn not_recognized_page(user: &UserProfile, owner: &Owner<'_>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<form method=\"post\" action=\"/logout\" class=\"message warning\">");
    let _ = writeln!(
        body,
        "<h2><div>שלום {}, אינך מוכר כמצוות במערכת.</div><button>יציאה</button></h2>",
        escape_html(&user.display_name)
    );
    let _ = writeln!(body, "</form>");
    about(&mut body, owner);
    document(&body)
}

pub fn error_page() -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<div class=\"message warning\">");
    let _ = writeln!(body, "<h2>ההתחברות נכשלה.</h2>");
    let _ = writeln!(body, "<a href=\"/\">חזרה לדף הראשי</a>");
    let _ = writeln!(body, "</div>");
    document(&body)
}

/// Page shown when a request fails, with a link back to the main page.
pub fn failure_page(message: &str) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<div class=\"message warning\">");
    let _ = writeln!(body, "<h2>הפעולה נכשלה</h2>");
    let _ = writeln!(body, "<p>{}</p>", escape_html(message));
    let _ = writeln!(body, "<a href=\"/\">חזרה לדף הראשי</a>");
    let _ = writeln!(body, "</div>");
    document(&body)
}

fn hidden(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(
        out,
        "<input type=\"hidden\" name=\"{name}\" value=\"{}\">",
        escape_html(value)
    );
}

fn toast(out: &mut String, flash: &Flash, return_teacher: Option<usize>) {
    let _ = writeln!(out, "<div class=\"toast\" role=\"status\">");
    let _ = write!(out, "{}", escape_html(&flash.message));

    if let Some(undo) = &flash.undo {
        let _ = writeln!(out, " <form method=\"post\" action=\"/action\">");
        hidden(out, "undo", "1");
        match undo {
            UndoAction::Teacher { index, value } => {
                hidden(out, "methodName", "assignTeacher");
                hidden(out, "teacherIndex", &index.to_string());
                hidden(out, "assignValue", value);
            }
            UndoAction::Student { index, city, value } => {
                hidden(out, "methodName", "assignStudent");
                hidden(out, "studentIndex", &index.to_string());
                hidden(out, "studentCity", city);
                hidden(out, "assignValue", value);
                if let Some(teacher) = return_teacher {
                    hidden(out, "teacherIndex", &teacher.to_string());
                }
            }
        }
        let _ = writeln!(out, "<button>ביטול</button></form>");
    }
    let _ = writeln!(out, "</div>");
}

fn filters_form(out: &mut String, filters: &Filters) {
    let checked = |on: bool| if on { " checked" } else { "" };

    let _ = writeln!(out, "<form method=\"get\" action=\"/\" class=\"search\">");
    if let Some(selected) = filters.selected {
        hidden(out, "teacher", &selected.to_string());
    }
    let _ = writeln!(
        out,
        "<input type=\"search\" name=\"q\" placeholder=\"חיפוש\" value=\"{}\">",
        escape_html(&filters.search)
    );
    let _ = writeln!(
        out,
        "<label><input type=\"checkbox\" name=\"all\" value=\"1\"{}> הצג גם מורים שכבר צוותו</label>",
        checked(filters.include_assigned)
    );
    let _ = writeln!(
        out,
        "<label><input type=\"checkbox\" name=\"mine\" value=\"1\"{}> רק המורים שלי</label>",
        checked(filters.mine)
    );
    let _ = writeln!(out, "<button>סינון</button>");
    let _ = writeln!(out, "</form>");
}

fn contact(out: &mut String, phone: &str, whatsapp_message: &str) {
    let _ = writeln!(
        out,
        "<div class=\"contact\"><a href=\"tel:{0}\">{0}</a> <a href=\"{1}\">WhatsApp</a></div>",
        escape_html(phone),
        escape_html(&whatsapp_href(phone, whatsapp_message))
    );
}

fn availability(out: &mut String, days: &str, week_days_hours: &str, weekend_hours: &str) {
    for line in format_hours(days, week_days_hours, weekend_hours) {
        let _ = writeln!(out, "<div>{}</div>", escape_html(&line));
    }
}

fn teacher_card(out: &mut String, view: &MainView<'_>, teacher: &Teacher) {
    let status = TeacherStatus::of(teacher);
    let is_selected = view.selected.is_some_and(|s| s.index == teacher.index);
    let class = [
        "card",
        if is_selected { "selected" } else { "" },
        status.css_class(),
    ]
    .into_iter()
    .filter(|c| !c.is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    let _ = writeln!(out, "<div class=\"{class}\" id=\"teacher-{}\">", teacher.index);
    let _ = writeln!(
        out,
        "<div class=\"name\"><a href=\"{}\">{}</a> <a href=\"{}\" title=\"שמירת איש קשר\">&#128100;</a></div>",
        escape_html(&view.filters.href(Some(teacher.index))),
        escape_html(&teacher.name),
        escape_html(&contact_href(&teacher.name, &teacher.phone_number))
    );
    let _ = writeln!(out, "<div class=\"details\"><div>{}</div>", escape_html(&teacher.subjects));
    availability(out, &teacher.days, &teacher.week_days_hours, &teacher.weekend_hours);
    let _ = writeln!(out, "</div>");
    if !teacher.opening_call_insights.is_empty() {
        let _ = writeln!(
            out,
            "<div class=\"insights\">{}</div>",
            escape_html(&teacher.opening_call_insights)
        );
    }
    contact(out, &teacher.phone_number, &teacher_whatsapp_message(teacher));
    let _ = writeln!(out, "<div class=\"join-date\">{}</div>", escape_html(&teacher.creation_date));
    let _ = writeln!(
        out,
        "<div class=\"status\">{}</div>",
        escape_html(&status.describe(models::is_male(&teacher.gender)))
    );
    let _ = writeln!(out, "</div>");
}

fn opening_call_form(out: &mut String, teacher: &Teacher) {
    let _ = writeln!(out, "<form method=\"post\" action=\"/action\" class=\"opening-call\">");
    let _ = writeln!(out, "<h3>עדכון שיחת פתיחה</h3>");
    hidden(out, "methodName", "updateOpeningCall");
    hidden(out, "teacherIndex", &teacher.index.to_string());
    let _ = writeln!(
        out,
        "<label><div>ביצעתי שיחת פתיחה עם <span class=\"name\">{}</span> ואלה התובנות:</div>",
        escape_html(&teacher.name)
    );
    let _ = writeln!(
        out,
        "<textarea name=\"openingCallInsights\">{}</textarea></label>",
        escape_html(&teacher.opening_call_insights)
    );
    let _ = writeln!(out, "<button>עדכן שיחת פתיחה</button>");
    let _ = writeln!(out, "</form>");
}

fn assign_button(
    out: &mut String,
    method: &str,
    teacher: &Teacher,
    student: Option<&Student>,
    value: &str,
    label: &str,
) {
    let _ = writeln!(out, "<form method=\"post\" action=\"/action\">");
    hidden(out, "methodName", method);
    hidden(out, "teacherIndex", &teacher.index.to_string());
    if let Some(student) = student {
        hidden(out, "studentIndex", &student.index.to_string());
        hidden(out, "studentCity", &student.city);
    }
    hidden(out, "assignValue", value);
    let _ = writeln!(out, "<button>{}</button>", escape_html(label));
    let _ = writeln!(out, "</form>");
}

fn student_card(out: &mut String, teacher: &Teacher, student: &Student, score: i32, matched: bool) {
    let status = StudentStatus::of(student);
    let _ = writeln!(
        out,
        "<div class=\"card {}\" id=\"student-{}-{}\" data-score=\"{score}\">",
        status.css_class(),
        encode_component(&student.city),
        student.index
    );
    let _ = writeln!(
        out,
        "<div class=\"name\"><a href=\"{}\">{}</a> <span class=\"grade\">({}, {})</span></div>",
        escape_html(&contact_href(&student.name, &student.phone_number)),
        escape_html(&student.name),
        escape_html(&student.city),
        escape_html(&student.student_class)
    );
    let _ = writeln!(out, "<div class=\"details\">");
    let _ = writeln!(out, "<div>{}</div>", escape_html(&student.primary_subject));
    let _ = writeln!(out, "<div>{}</div>", escape_html(&student.secondary_subject));
    availability(out, &student.days, &student.week_days_hours, &student.weekend_hours);
    let _ = writeln!(out, "</div>");
    contact(out, &student.phone_number, &student_whatsapp_message(student));
    let _ = writeln!(out, "<div class=\"join-date\">{}</div>", escape_html(&student.creation_date));

    let _ = writeln!(out, "<div class=\"actions\">");
    if matched {
        assign_button(out, "assignTeacher", teacher, None, "", "בטל שיבוץ מורה");
        if student.matched_teacher == teacher.name {
            assign_button(out, "assignStudent", teacher, Some(student), "", "בטל שיבוץ תלמיד");
        } else {
            assign_button(
                out,
                "assignStudent",
                teacher,
                Some(student),
                &teacher.name,
                "סמן תלמיד כמשובץ",
            );
        }
    } else if TeacherStatus::of(teacher) == TeacherStatus::NotContacted {
        let _ = writeln!(out, "<div class=\"hint\">יש לבצע שיחת פתיחה לפני שיבוץ</div>");
    } else {
        assign_button(out, "assignTeacher", teacher, None, &student.name, "שבץ");
    }
    let _ = writeln!(out, "</div>");
    let _ = writeln!(out, "</div>");
}

pub fn main_page(view: &MainView<'_>, flash: Option<&Flash>, owner: &Owner<'_>) -> String {
    let mut body = String::new();

    if let Some(flash) = flash {
        toast(&mut body, flash, view.selected.map(|t| t.index));
    }

    let _ = writeln!(body, "<section class=\"teachers-section\">");
    let _ = writeln!(body, "<h2>רשימת מורים</h2>");
    filters_form(&mut body, view.filters);
    if view.teachers.is_empty() {
        let _ = writeln!(body, "<p>אין מורים להצגה.</p>");
    } else {
        let _ = writeln!(body, "<div class=\"teachers swipe-list\">");
        for teacher in &view.teachers {
            teacher_card(&mut body, view, teacher);
        }
        let _ = writeln!(body, "</div>");
    }
    let _ = writeln!(body, "</section>");

    if let Some(teacher) = view.selected {
        if !TeacherStatus::of(teacher).is_assigned() {
            opening_call_form(&mut body, teacher);
        }

        if let Some(candidates) = view.candidates.as_ref().filter(|c| !c.as_slice().is_empty()) {
            let header = if candidates.is_matched() {
                "תלמידים שמשובצים ל"
            } else {
                "תלמידים שרלוונטיים לשיבוץ ל"
            };
            let _ = writeln!(body, "<section class=\"students-section\">");
            let _ = writeln!(
                body,
                "<h2>{header}<span>{}</span></h2>",
                escape_html(&teacher.name)
            );
            let _ = writeln!(body, "<div class=\"students swipe-list\">");
            for candidate in candidates.as_slice() {
                student_card(
                    &mut body,
                    teacher,
                    candidate.student,
                    candidate.score,
                    candidates.is_matched(),
                );
            }
            let _ = writeln!(body, "</div>");
            let _ = writeln!(body, "</section>");
        }
    }

    let current = if view.coordinator.is_female() {
        "המצוותת הנוכחית היא"
    } else {
        "המצוות הנוכחי הוא"
    };
    let _ = writeln!(body, "<form method=\"post\" action=\"/logout\" class=\"user\">");
    let _ = writeln!(
        body,
        "{current} <a href=\"mailto:{}\">{}</a> <button>יציאה</button>",
        escape_html(&view.user.email),
        escape_html(&view.coordinator.full_name)
    );
    let _ = writeln!(body, "</form>");
    about(&mut body, owner);

    document(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::fixtures::{student, teacher};

    fn coordinator() -> Coordinator {
        Coordinator {
            full_name: "רונית אלון".to_string(),
            name: "רונית".to_string(),
            email: "ronit@example.com".to_string(),
            title: "מצוותת".to_string(),
        }
    }

    fn user() -> UserProfile {
        UserProfile {
            display_name: "Ronit".to_string(),
            email: "ronit@example.com".to_string(),
        }
    }

    fn snapshot() -> Snapshot {
        let mut dana = teacher(0, "דנה כהן", "מתמטיקה, תיכון");
        dana.opening_call_with = "רונית".to_string();
        dana.match_by = "רונית".to_string();
        let mut yossi = teacher(1, "יוסי לוי", "אנגלית, חטיבה");
        yossi.matched_student = "עומר".to_string();
        let avi = teacher(2, "אבי <b>", "אנגלית, יסודי");

        let mut omer = student(0, "עומר", "ח", "אנגלית", "");
        omer.matched_teacher = "יוסי לוי".to_string();

        Snapshot {
            teachers: vec![dana, yossi, avi],
            students: vec![student(1, "נועה", "יא", "מתמטיקה", ""), omer],
            ..Snapshot::default()
        }
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn contact_links_encode_spaces_as_percent_twenty() {
        assert_eq!(contact_href("a b", "050/1"), "/contact/a%20b/050%2F1");
    }

    #[test]
    fn filter_links_keep_state() {
        let filters = Filters {
            selected: None,
            include_assigned: true,
            search: "דנה".to_string(),
            mine: false,
        };
        let href = filters.href(Some(3));
        assert!(href.starts_with("/?teacher=3&all=1&q="));
        assert_eq!(Filters::default().href(None), "/");
    }

    #[test]
    fn assigned_teachers_hidden_unless_requested_or_selected() {
        let snapshot = snapshot();
        let (user, coordinator) = (user(), coordinator());

        let filters = Filters::default();
        let view = MainView::build(&snapshot, &user, &coordinator, &filters);
        let names: Vec<&str> = view.teachers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["דנה כהן", "אבי <b>"]);
        assert_eq!(view.selected.map(|t| t.index), Some(0));

        let filters = Filters {
            selected: Some(1),
            ..Filters::default()
        };
        let view = MainView::build(&snapshot, &user, &coordinator, &filters);
        assert_eq!(view.teachers.len(), 3);
        assert_eq!(view.selected.map(|t| t.index), Some(1));
        assert!(view.candidates.as_ref().is_some_and(Candidates::is_matched));
    }

    #[test]
    fn mine_and_search_narrow_the_list() {
        let snapshot = snapshot();
        let (user, coordinator) = (user(), coordinator());

        let filters = Filters {
            mine: true,
            ..Filters::default()
        };
        let view = MainView::build(&snapshot, &user, &coordinator, &filters);
        assert_eq!(view.teachers.len(), 1);

        let filters = Filters {
            search: "אבי".to_string(),
            ..Filters::default()
        };
        let view = MainView::build(&snapshot, &user, &coordinator, &filters);
        assert_eq!(view.teachers.iter().map(|t| t.index).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn main_page_lists_candidates_and_escapes_names() {
        let snapshot = snapshot();
        let (user, coordinator) = (user(), coordinator());
        let filters = Filters::default();
        let view = MainView::build(&snapshot, &user, &coordinator, &filters);

        let flash = Flash {
            message: "דנה כהן שובצה לנועה".to_string(),
            undo: Some(UndoAction::Teacher {
                index: 0,
                value: String::new(),
            }),
        };
        let html = main_page(&view, Some(&flash), &Owner::default());

        assert!(html.contains("dir=\"rtl\""));
        assert!(html.contains("תלמידים שרלוונטיים לשיבוץ ל<span>דנה כהן</span>"));
        assert!(html.contains("data-score=\"2000\""));
        assert!(html.contains("אבי &lt;b&gt;"));
        assert!(!html.contains("אבי <b>"));
        assert!(html.contains("name=\"undo\" value=\"1\""));
        assert!(html.contains("המצוותת הנוכחית היא"));
        assert!(html.contains("עדכון שיחת פתיחה"));
    }

    #[test]
    fn teachers_without_an_opening_call_get_no_assign_button() {
        let snapshot = snapshot();
        let (user, coordinator) = (user(), coordinator());

        let filters = Filters {
            selected: Some(2),
            ..Filters::default()
        };
        let view = MainView::build(&snapshot, &user, &coordinator, &filters);
        assert_eq!(view.selected.map(|t| t.index), Some(2));
        let html = main_page(&view, None, &Owner::default());
        assert!(html.contains("יש לבצע שיחת פתיחה לפני שיבוץ"));
        assert!(!html.contains("<button>שבץ</button>"));
        assert!(html.contains("עדכון שיחת פתיחה"));

        let filters = Filters::default();
        let view = MainView::build(&snapshot, &user, &coordinator, &filters);
        let html = main_page(&view, None, &Owner::default());
        assert!(html.contains("<button>שבץ</button>"));
        assert!(!html.contains("יש לבצע שיחת פתיחה לפני שיבוץ"));
    }

    #[test]
    fn failures_escape_the_message() {
        let html = failure_page("<script>");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<a href=\"/\">חזרה לדף הראשי</a>"));
    }

    #[test]
    fn prompts_for_login_and_unknown_users() {
        assert!(login_page(&Owner::default()).contains("action=\"/auth/google\""));

        let html = not_recognized_page(&user(), &Owner::default());
        assert!(html.contains("שלום Ronit, אינך מוכר כמצוות במערכת."));
        assert!(html.contains("action=\"/logout\""));
    }
}
