//! Assignment status of teachers and students.
//!
//! Status is never stored. It is derived from the linked-name fields of a
//! record every time, and changes go through the transition methods below,
//! which return the status the record will have after the cell write.

use thiserror::Error;

use crate::models::{Student, Teacher};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{name} is already assigned to {current}")]
    AlreadyAssigned { name: String, current: String },

    #[error("{name} is not assigned")]
    NotAssigned { name: String },

    #[error("{name} has not completed an opening call")]
    NotEligible { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeacherStatus {
    NotContacted,
    Available { opening_call_with: String },
    Assigned { student: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentStatus {
    /// Registered without a requested subject, nothing to match on yet.
    Unassigned,
    Available,
    Assigned { teacher: String },
}

impl TeacherStatus {
    pub fn of(teacher: &Teacher) -> Self {
        if !teacher.matched_student.is_empty() {
            Self::Assigned {
                student: teacher.matched_student.clone(),
            }
        } else if !teacher.opening_call_with.is_empty() {
            Self::Available {
                opening_call_with: teacher.opening_call_with.clone(),
            }
        } else {
            Self::NotContacted
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }

    /// CSS class used by the teacher list.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::NotContacted => "",
            Self::Available { .. } => "available",
            Self::Assigned { .. } => "assigned",
        }
    }

    /// Status after linking `student`. Re-linking the same student is a no-op.
    pub fn assign(teacher: &Teacher, student: &str) -> Result<Self, TransitionError> {
        match Self::of(teacher) {
            Self::Assigned { student: current } if current == student => {
                Ok(Self::Assigned { student: current })
            }
            Self::Assigned { student: current } => Err(TransitionError::AlreadyAssigned {
                name: teacher.name.clone(),
                current,
            }),
            Self::NotContacted => Err(TransitionError::NotEligible {
                name: teacher.name.clone(),
            }),
            Self::Available { .. } => Ok(Self::Assigned {
                student: student.to_string(),
            }),
        }
    }

    /// Status after clearing the linked student.
    pub fn unassign(teacher: &Teacher) -> Result<Self, TransitionError> {
        if !Self::of(teacher).is_assigned() {
            return Err(TransitionError::NotAssigned {
                name: teacher.name.clone(),
            });
        }

        if teacher.opening_call_with.is_empty() {
            Ok(Self::NotContacted)
        } else {
            Ok(Self::Available {
                opening_call_with: teacher.opening_call_with.clone(),
            })
        }
    }

    /// Status after `coordinator` records an opening call.
    pub fn record_opening_call(teacher: &Teacher, coordinator: &str) -> Result<Self, TransitionError> {
        match Self::of(teacher) {
            Self::Assigned { student } => Err(TransitionError::AlreadyAssigned {
                name: teacher.name.clone(),
                current: student,
            }),
            _ => Ok(Self::Available {
                opening_call_with: coordinator.to_string(),
            }),
        }
    }

    /// Hebrew status line, gendered by the teacher's registration.
    pub fn describe(&self, male: bool) -> String {
        match self {
            Self::Assigned { .. } => "משובץ".to_string(),
            Self::Available { opening_call_with } => {
                format!("{} עם {opening_call_with}", if male { "שוחח" } else { "שוחחה" })
            }
            Self::NotContacted => {
                format!("לא {} שיחת פתיחה", if male { "ביצע" } else { "ביצעה" })
            }
        }
    }
}

impl StudentStatus {
    pub fn of(student: &Student) -> Self {
        if !student.matched_teacher.is_empty() {
            Self::Assigned {
                teacher: student.matched_teacher.clone(),
            }
        } else if student.primary_subject.is_empty() {
            Self::Unassigned
        } else {
            Self::Available
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Unassigned => "",
            Self::Available => "available",
            Self::Assigned { .. } => "assigned",
        }
    }

    pub fn assign(student: &Student, teacher: &str) -> Result<Self, TransitionError> {
        match Self::of(student) {
            Self::Assigned { teacher: current } if current != teacher => {
                Err(TransitionError::AlreadyAssigned {
                    name: student.name.clone(),
                    current,
                })
            }
            _ => Ok(Self::Assigned {
                teacher: teacher.to_string(),
            }),
        }
    }

    pub fn unassign(student: &Student) -> Result<Self, TransitionError> {
        if !Self::of(student).is_assigned() {
            return Err(TransitionError::NotAssigned {
                name: student.name.clone(),
            });
        }

        if student.primary_subject.is_empty() {
            Ok(Self::Unassigned)
        } else {
            Ok(Self::Available)
        }
    }
}

/// A link that is not mirrored on the other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairIssue {
    /// The teacher names a student who does not exist.
    MissingStudent { teacher: String, student: String },
    /// The teacher names a student who is linked to someone else, or to nobody.
    NotReciprocated {
        teacher: String,
        student: String,
        student_links_to: Option<String>,
    },
}

/// Lists teacher links that the student side does not confirm.
///
/// Nothing is corrected. The sheet stays authoritative and coordinators fix
/// the cells by hand.
pub fn pair_issues(teachers: &[Teacher], students: &[Student]) -> Vec<PairIssue> {
    teachers
        .iter()
        .filter(|teacher| !teacher.matched_student.is_empty())
        .filter_map(|teacher| {
            let Some(student) = students.iter().find(|s| s.name == teacher.matched_student) else {
                return Some(PairIssue::MissingStudent {
                    teacher: teacher.name.clone(),
                    student: teacher.matched_student.clone(),
                });
            };

            (student.matched_teacher != teacher.name).then(|| PairIssue::NotReciprocated {
                teacher: teacher.name.clone(),
                student: student.name.clone(),
                student_links_to: Some(student.matched_teacher.clone()).filter(|t| !t.is_empty()),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Student, Teacher};

    pub fn teacher(index: usize, name: &str, subjects: &str) -> Teacher {
        Teacher {
            index,
            creation_date: "1/9/2026".to_string(),
            creation_time: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            name: name.to_string(),
            phone_number: "0501112222".to_string(),
            email: String::new(),
            gender: "זכר".to_string(),
            has_teaching_cert: String::new(),
            teaching_experience: String::new(),
            track: String::new(),
            bagrut_track: String::new(),
            subjects: subjects.to_string(),
            math_level: String::new(),
            english_level: String::new(),
            days: String::new(),
            week_days_hours: String::new(),
            weekend_hours: String::new(),
            time_length: String::new(),
            has_taught: String::new(),
            how_was_teaching_with_us: String::new(),
            is_ok_to_make_a_call: String::new(),
            about_me: String::new(),
            opening_call_with: String::new(),
            opening_call_insights: String::new(),
            match_by: String::new(),
            matched_student: String::new(),
        }
    }

    pub fn student(index: usize, name: &str, class: &str, primary: &str, secondary: &str) -> Student {
        Student {
            index,
            city: "נתיב העשרה".to_string(),
            creation_date: "2/9/2026".to_string(),
            creation_time: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            name: name.to_string(),
            phone_number: "0523334444".to_string(),
            email: String::new(),
            gender: "נקבה".to_string(),
            student_class: class.to_string(),
            track: String::new(),
            primary_subject: primary.to_string(),
            secondary_subject: secondary.to_string(),
            math_level: String::new(),
            english_level: String::new(),
            days: String::new(),
            week_days_hours: String::new(),
            weekend_hours: String::new(),
            time_length: String::new(),
            about_you: String::new(),
            tos: String::new(),
            matched_teacher: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{student, teacher};
    use super::*;

    #[test]
    fn teacher_status_follows_fields() {
        let mut t = teacher(0, "דנה כהן", "מתמטיקה");
        assert_eq!(TeacherStatus::of(&t), TeacherStatus::NotContacted);

        t.opening_call_with = "רונית".to_string();
        assert_eq!(
            TeacherStatus::of(&t),
            TeacherStatus::Available {
                opening_call_with: "רונית".to_string()
            }
        );

        t.matched_student = "נועה".to_string();
        assert!(TeacherStatus::of(&t).is_assigned());
    }

    #[test]
    fn teachers_need_an_opening_call_before_assignment() {
        let t = teacher(0, "דנה כהן", "מתמטיקה");
        assert_eq!(
            TeacherStatus::assign(&t, "נועה"),
            Err(TransitionError::NotEligible {
                name: "דנה כהן".to_string()
            })
        );
    }

    #[test]
    fn reassigning_a_teacher_is_rejected() {
        let mut t = teacher(0, "דנה כהן", "מתמטיקה");
        t.opening_call_with = "רונית".to_string();
        t.matched_student = "נועה".to_string();

        assert!(TeacherStatus::assign(&t, "נועה").is_ok());
        assert!(matches!(
            TeacherStatus::assign(&t, "עומר"),
            Err(TransitionError::AlreadyAssigned { .. })
        ));
    }

    #[test]
    fn unassign_returns_to_previous_status() {
        let mut t = teacher(0, "דנה כהן", "מתמטיקה");
        t.opening_call_with = "רונית".to_string();
        let before = TeacherStatus::of(&t);

        assert_eq!(
            TeacherStatus::assign(&t, "נועה"),
            Ok(TeacherStatus::Assigned {
                student: "נועה".to_string()
            })
        );
        t.matched_student = "נועה".to_string();

        assert_eq!(TeacherStatus::unassign(&t), Ok(before));
        t.matched_student.clear();
        assert!(TeacherStatus::unassign(&t).is_err());
    }

    #[test]
    fn opening_call_is_blocked_while_assigned() {
        let mut t = teacher(0, "דנה כהן", "מתמטיקה");
        assert!(TeacherStatus::record_opening_call(&t, "אבי").is_ok());

        t.matched_student = "נועה".to_string();
        assert!(TeacherStatus::record_opening_call(&t, "אבי").is_err());
    }

    #[test]
    fn student_status_requires_a_subject_to_be_available() {
        let mut s = student(0, "נועה", "ח", "", "");
        assert_eq!(StudentStatus::of(&s), StudentStatus::Unassigned);

        s.primary_subject = "אנגלית".to_string();
        assert_eq!(StudentStatus::of(&s), StudentStatus::Available);

        s.matched_teacher = "דנה".to_string();
        assert_eq!(StudentStatus::unassign(&s), Ok(StudentStatus::Available));
        assert!(StudentStatus::assign(&s, "יוסי").is_err());
        assert!(StudentStatus::assign(&s, "דנה").is_ok());
    }

    #[test]
    fn status_text_is_gendered() {
        let available = TeacherStatus::Available {
            opening_call_with: "רונית".to_string(),
        };
        assert_eq!(available.describe(true), "שוחח עם רונית");
        assert_eq!(available.describe(false), "שוחחה עם רונית");
        assert_eq!(TeacherStatus::NotContacted.describe(false), "לא ביצעה שיחת פתיחה");
    }

    #[test]
    fn pair_issues_report_one_sided_links() {
        let mut dana = teacher(0, "דנה", "");
        dana.matched_student = "נועה".to_string();
        let mut yossi = teacher(1, "יוסי", "");
        yossi.matched_student = "עומר".to_string();
        let mut avi = teacher(2, "אבי", "");
        avi.matched_student = "מיכל".to_string();

        let mut noa = student(0, "נועה", "ח", "אנגלית", "");
        noa.matched_teacher = "דנה".to_string();
        let omer = student(1, "עומר", "ט", "מתמטיקה", "");

        let issues = pair_issues(&[dana, yossi, avi], &[noa, omer]);
        assert_eq!(
            issues,
            vec![
                PairIssue::NotReciprocated {
                    teacher: "יוסי".to_string(),
                    student: "עומר".to_string(),
                    student_links_to: None,
                },
                PairIssue::MissingStudent {
                    teacher: "אבי".to_string(),
                    student: "מיכל".to_string(),
                },
            ]
        );
    }
}
