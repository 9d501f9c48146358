use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{self, LOCATION, SET_COOKIE},
    },
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use super::error::AppError;
use super::render::{self, Filters, MainView, Owner};
use crate::auth::AuthError;
use crate::data::{self, Snapshot};
use crate::models::{self, Coordinator};
use crate::session::{self, Flash, RequestContext, UndoAction};
use crate::status::{StudentStatus, TeacherStatus};
use crate::vcard::{self, Contact};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub teacher: Option<usize>,
    pub all: Option<String>,
    pub q: Option<String>,
    pub mine: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value
        .as_deref()
        .is_some_and(|v| !v.is_empty() && v != "0" && v != "false")
}

impl From<PageQuery> for Filters {
    fn from(query: PageQuery) -> Self {
        Self {
            selected: query.teacher,
            include_assigned: flag(&query.all),
            mine: flag(&query.mine),
            search: query.q.unwrap_or_default().trim().to_string(),
        }
    }
}

/// Raw form fields of `POST /action`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionForm {
    #[serde(default)]
    pub method_name: String,
    #[serde(default)]
    pub teacher_index: String,
    #[serde(default)]
    pub student_index: String,
    #[serde(default)]
    pub student_city: String,
    #[serde(default)]
    pub assign_value: String,
    #[serde(default)]
    pub opening_call_insights: String,
    #[serde(default)]
    pub undo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AssignTeacher {
        teacher: usize,
        value: String,
    },
    AssignStudent {
        student: usize,
        city: String,
        value: String,
        /// Teacher card to return to.
        teacher: Option<usize>,
    },
    UpdateOpeningCall {
        teacher: usize,
        insights: String,
    },
}

fn parse_index(raw: &str, field: &'static str) -> Result<usize, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::MalformedPayload(field))
}

impl Action {
    /// The stored undo this action would replay, if it is one.
    pub fn as_undo(&self) -> Option<UndoAction> {
        match self {
            Action::AssignTeacher { teacher, value } => Some(UndoAction::Teacher {
                index: *teacher,
                value: value.clone(),
            }),
            Action::AssignStudent {
                student,
                city,
                value,
                ..
            } => Some(UndoAction::Student {
                index: *student,
                city: city.clone(),
                value: value.clone(),
            }),
            Action::UpdateOpeningCall { .. } => None,
        }
    }
}

impl ActionForm {
    pub fn is_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn action(&self) -> Result<Action, AppError> {
        match self.method_name.as_str() {
            "assignTeacher" => Ok(Action::AssignTeacher {
                teacher: parse_index(&self.teacher_index, "teacherIndex")?,
                value: self.assign_value.trim().to_string(),
            }),
            "assignStudent" => {
                if self.student_city.is_empty() {
                    return Err(AppError::MalformedPayload("studentCity"));
                }
                Ok(Action::AssignStudent {
                    student: parse_index(&self.student_index, "studentIndex")?,
                    city: self.student_city.clone(),
                    value: self.assign_value.trim().to_string(),
                    teacher: parse_index(&self.teacher_index, "teacherIndex").ok(),
                })
            }
            "updateOpeningCall" => Ok(Action::UpdateOpeningCall {
                teacher: parse_index(&self.teacher_index, "teacherIndex")?,
                insights: self.opening_call_insights.trim().to_string(),
            }),
            _ => Err(AppError::MalformedPayload("methodName")),
        }
    }
}

fn owner(state: &AppState) -> Owner<'_> {
    Owner {
        email: &state.config.owner_email,
        phone: &state.config.owner_phone,
    }
}

fn see_other(location: &str, cookie: Option<String>) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(LOCATION, value);
    }
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        headers.insert(SET_COOKIE, value);
    }
    response
}

fn with_cookie(mut response: Response, cookie: Option<String>) -> Response {
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

fn signed_in<'a>(snapshot: &'a Snapshot, context: &RequestContext) -> Result<&'a Coordinator, AppError> {
    let user = context.user().ok_or(AppError::Unauthenticated)?;
    snapshot.coordinator_by_email(&user.email).ok_or(AppError::NotCoordinator)
}

pub async fn index_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let mut context = RequestContext::load(state.sessions.as_ref(), &headers).await?;

    let Some(user) = context.data.user.clone() else {
        return Ok(Html(render::login_page(&owner(&state))).into_response());
    };

    let snapshot = data::load_snapshot(state.store.as_ref(), &state.layout).await?;
    let Some(coordinator) = snapshot.coordinator_by_email(&user.email) else {
        info!("{} is not a coordinator", user.email);
        return Ok(Html(render::not_recognized_page(&user, &owner(&state))).into_response());
    };

    let flash = context.data.flash.take();
    let cookie = if flash.is_some() {
        context.save(state.sessions.as_ref(), state.config.secure_cookies).await?
    } else {
        None
    };

    let filters = Filters::from(query);
    let view = MainView::build(&snapshot, &user, coordinator, &filters);
    let page = render::main_page(&view, flash.as_ref(), &owner(&state));

    Ok(with_cookie(Html(page).into_response(), cookie))
}

fn gendered(male: bool, masculine: &'static str, feminine: &'static str) -> &'static str {
    if male { masculine } else { feminine }
}

pub async fn action_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ActionForm>,
) -> Result<Response, AppError> {
    let action = form.action()?;
    let mut context = RequestContext::load(state.sessions.as_ref(), &headers).await?;
    if context.user().is_none() {
        return Err(AppError::Unauthenticated);
    }

    let store = state.store.as_ref();
    let layout = &state.layout;
    let snapshot = data::load_snapshot(store, layout).await?;
    let coordinator = signed_in(&snapshot, &context)?;
    let undoing = form.is_undo();

    if undoing {
        let requested = action.as_undo();
        if requested.is_none() || requested != context.data.pending_undo {
            warn!("{} sent an undo that does not match the session", coordinator.name);
            return Err(AppError::StaleUndo);
        }
    }

    let (return_to, (flash, pending_undo)) = match &action {
        Action::AssignTeacher { teacher, value } => {
            let record = snapshot
                .teacher(*teacher)
                .ok_or_else(|| AppError::NotFound(format!("teacher {teacher}")))?;
            if !undoing {
                if value.is_empty() {
                    TeacherStatus::unassign(record)?;
                } else {
                    TeacherStatus::assign(record, value)?;
                }
            }

            let address = data::assign_teacher(store, layout, *teacher, value).await?;
            info!("{} set {address} to '{value}'", coordinator.name);

            let male = models::is_male(&record.gender);
            let message = if value.is_empty() {
                format!("השיבוץ של {} בוטל", record.name)
            } else {
                format!("{} {} ל{value}", record.name, gendered(male, "שובץ", "שובצה"))
            };
            let undo = UndoAction::Teacher {
                index: *teacher,
                value: record.matched_student.clone(),
            };
            (Some(*teacher), outcome(undoing, message, undo))
        }
        Action::AssignStudent {
            student,
            city,
            value,
            teacher,
        } => {
            let record = snapshot
                .student(city, *student)
                .ok_or_else(|| AppError::NotFound(format!("student {student} in {city}")))?;
            if !undoing {
                if value.is_empty() {
                    StudentStatus::unassign(record)?;
                } else {
                    StudentStatus::assign(record, value)?;
                }
            }

            let address = data::assign_student(store, layout, *student, city, value).await?;
            info!("{} set {address} to '{value}'", coordinator.name);

            let male = models::is_male(&record.gender);
            let message = if value.is_empty() {
                format!("{} {} כלא משובץ", record.name, gendered(male, "סומן", "סומנה"))
            } else {
                format!("{} {} כמשובץ ל{value}", record.name, gendered(male, "סומן", "סומנה"))
            };
            let undo = UndoAction::Student {
                index: *student,
                city: city.clone(),
                value: record.matched_teacher.clone(),
            };
            (*teacher, outcome(undoing, message, undo))
        }
        Action::UpdateOpeningCall { teacher, insights } => {
            let record = snapshot
                .teacher(*teacher)
                .ok_or_else(|| AppError::NotFound(format!("teacher {teacher}")))?;
            TeacherStatus::record_opening_call(record, &coordinator.name)?;

            let address =
                data::update_opening_call(store, layout, *teacher, &coordinator.name, insights)
                    .await?;
            info!("{} updated the opening call at {address}", coordinator.name);

            let message = format!("שיחת הפתיחה עם {} עודכנה", record.name);
            (
                Some(*teacher),
                (
                    Flash {
                        message,
                        undo: None,
                    },
                    None,
                ),
            )
        }
    };

    context.data.flash = Some(flash);
    context.data.pending_undo = pending_undo;
    let cookie = context
        .save(state.sessions.as_ref(), state.config.secure_cookies)
        .await?;

    let location = match return_to {
        Some(index) => format!("/?teacher={index}"),
        None => "/".to_string(),
    };
    Ok(see_other(&location, cookie))
}

/// Flash to show and undo to keep after an assignment write.
fn outcome(undoing: bool, message: String, undo: UndoAction) -> (Flash, Option<UndoAction>) {
    if undoing {
        let flash = Flash {
            message: "הפעולה בוטלה".to_string(),
            undo: None,
        };
        return (flash, None);
    }

    let flash = Flash {
        message,
        undo: Some(undo.clone()),
    };
    (flash, Some(undo))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let mut context = RequestContext::load(state.sessions.as_ref(), &headers).await?;

    let oauth_state = Uuid::new_v4().to_string();
    let url = state.identity.authorize_url(&oauth_state)?;
    context.data.oauth_state = Some(oauth_state);

    let cookie = context
        .save(state.sessions.as_ref(), state.config.secure_cookies)
        .await?;
    Ok(see_other(&url, cookie))
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn callback_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let mut context = RequestContext::load(state.sessions.as_ref(), &headers).await?;
    let expected = context.data.oauth_state.take();

    let outcome = async {
        if let Some(error) = query.error {
            return Err(AuthError::Denied(error));
        }
        if expected.is_none() || query.state != expected {
            return Err(AuthError::StateMismatch);
        }
        let code = query
            .code
            .ok_or_else(|| AuthError::Denied("no authorization code".to_string()))?;
        state.identity.exchange(&code).await
    }
    .await;

    let location = match outcome {
        Ok(user) => {
            context.data.user = Some(user);
            "/"
        }
        Err(e) => {
            warn!("Sign-in failed: {e}");
            "/error"
        }
    };

    let cookie = context
        .save(state.sessions.as_ref(), state.config.secure_cookies)
        .await?;
    Ok(see_other(location, cookie))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(id) = session::session_id(&headers) {
        state.sessions.destroy(id).await?;
    }
    Ok(see_other(
        "/",
        Some(session::clear_cookie(state.config.secure_cookies)),
    ))
}

pub async fn contact_handler(Path((name, phone)): Path<(String, String)>) -> Response {
    let card = Contact::from_name(&name, &phone).to_vcard(Utc::now());
    (
        [
            (header::CONTENT_TYPE, vcard::CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, vcard::CONTENT_DISPOSITION),
        ],
        card,
    )
        .into_response()
}

pub async fn error_handler() -> Html<String> {
    Html(render::error_page())
}
