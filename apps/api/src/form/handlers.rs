use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::array::ListChange;
use crate::form::path::FieldKind;
use crate::form::suggest::{suggest_roles, RoleOption};
use crate::form::validation::{FieldError, FieldErrors};
use crate::form::{FieldPath, FormController, FormStatus, ListPath};
use crate::models::applicant::{ApplicantRecord, EducationLevel, Sex};
use crate::state::AppState;
use crate::submission::{SubmissionPayload, SubmissionReceipt};

/// Everything the rendering layer needs to draw the form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub session_id: Uuid,
    pub status: FormStatus,
    pub record: ApplicantRecord,
    pub errors: FieldErrors,
    pub experience_count: usize,
    pub detail_counts: Vec<usize>,
}

impl FormView {
    fn of(session_id: Uuid, form: &FormController) -> Self {
        let record = form.record();
        FormView {
            session_id,
            status: form.status(),
            record: record.clone(),
            errors: form.errors().clone(),
            experience_count: record.experience.len(),
            detail_counts: record.experience.iter().map(|e| e.details.len()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub path: FieldPath,
    pub value: crate::form::controller::FieldValue,
    pub error: Option<FieldError>,
}

#[derive(Deserialize)]
pub struct FieldQuery {
    pub path: String,
}

#[derive(Deserialize)]
pub struct FieldChange {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOp {
    Append,
    Remove,
}

#[derive(Deserialize)]
pub struct ListEvent {
    pub list: String,
    pub op: ListOp,
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListEventResponse {
    pub change: ListChange,
    pub len: usize,
    /// Item identities of the touched list, in display order.
    pub ids: Vec<Uuid>,
    pub form: FormView,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub payload: SubmissionPayload,
    pub receipt: SubmissionReceipt,
}

#[derive(Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    pub sex: Vec<SelectOption>,
    pub highest_education_attained: Vec<SelectOption>,
}

fn parse_path(raw: &str) -> Result<FieldPath, AppError> {
    Ok(raw.parse::<FieldPath>()?)
}

fn field_view(form: &FormController, path: FieldPath) -> Result<FieldView, AppError> {
    Ok(FieldView {
        path,
        value: form.value(path)?,
        error: form.error(path).cloned(),
    })
}

/// Decodes a selection value; `null` and `""` clear the selection.
fn parse_selection<T: serde::de::DeserializeOwned>(
    path: FieldPath,
    value: Value,
) -> Result<Option<T>, AppError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        other => serde_json::from_value(other.clone()).map(Some).map_err(|_| {
            AppError::BadRequest(format!("{other} is not a valid option for '{path}'"))
        }),
    }
}

/// Applies one field-change event to the controller.
fn apply_change(form: &mut FormController, path: FieldPath, value: Value) -> Result<(), AppError> {
    match (path.kind(), value) {
        (FieldKind::Controlled, value) => match path {
            FieldPath::Sex => form.set_sex(parse_selection::<Sex>(path, value)?)?,
            _ => form.set_education(parse_selection::<EducationLevel>(path, value)?)?,
        },
        (FieldKind::Number, Value::Null) => form.set_years(None)?,
        (FieldKind::Number, Value::Number(n)) => {
            let years = n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    AppError::BadRequest(format!("{n} is not a valid number for '{path}'"))
                })?;
            form.set_years(Some(years))?
        }
        (_, Value::String(raw)) => form.set_text(path, &raw)?,
        (FieldKind::Text, Value::Null) => form.set_text(path, "")?,
        (_, other) => {
            return Err(AppError::BadRequest(format!(
                "Unsupported value {other} for '{path}'"
            )))
        }
    };
    Ok(())
}

/// POST /api/v1/applicants
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FormView>), AppError> {
    let id = state.sessions.create()?;
    let view = state.sessions.with_session(id, |form| FormView::of(id, form))?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/applicants/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, AppError> {
    let view = state.sessions.with_session(id, |form| FormView::of(id, form))?;
    Ok(Json(view))
}

/// DELETE /api/v1/applicants/:id
pub async fn handle_discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.discard(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/applicants/:id/field?path=
pub async fn handle_get_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FieldQuery>,
) -> Result<Json<FieldView>, AppError> {
    let path = parse_path(&query.path)?;
    let view = state.sessions.with_session(id, |form| field_view(form, path))??;
    Ok(Json(view))
}

/// PATCH /api/v1/applicants/:id/field
pub async fn handle_change_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FieldChange>,
) -> Result<Json<FieldView>, AppError> {
    let path = parse_path(&req.path)?;
    let view = state.sessions.with_session(id, |form| -> Result<FieldView, AppError> {
        apply_change(form, path, req.value)?;
        field_view(form, path)
    })??;
    debug!(session_id = %id, %path, invalid = view.error.is_some(), "Field changed");
    Ok(Json(view))
}

/// POST /api/v1/applicants/:id/lists
pub async fn handle_list_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ListEvent>,
) -> Result<Json<ListEventResponse>, AppError> {
    let list: ListPath = req.list.parse()?;
    let response = state.sessions.with_session(id, |form| -> Result<_, AppError> {
        let change = match (req.op, req.index) {
            (ListOp::Append, _) => form.append(list)?,
            (ListOp::Remove, Some(index)) => form.remove(list, index)?,
            (ListOp::Remove, None) => {
                return Err(AppError::BadRequest(
                    "Removal requires an index".to_string(),
                ))
            }
        };
        Ok(ListEventResponse {
            change,
            len: form.list_len(list)?,
            ids: form.item_ids(list)?,
            form: FormView::of(id, form),
        })
    })??;
    debug!(
        session_id = %id,
        %list,
        structural = response.change.is_structural(),
        "List event applied"
    );
    Ok(Json(response))
}

/// POST /api/v1/applicants/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, AppError> {
    let payload = state.sessions.with_session(id, |form| form.submit())??;
    match state.sink.deliver(&payload).await {
        Ok(receipt) => {
            // A delivered form has nothing left to edit, so its session ends here.
            if state.sessions.discard(id).is_err() {
                debug!(session_id = %id, "Session already discarded during delivery");
            }
            info!(
                session_id = %id,
                submission_id = %receipt.submission_id,
                "Applicant form delivered"
            );
            Ok(Json(SubmitResponse { payload, receipt }))
        }
        Err(err) => {
            warn!(session_id = %id, error = %err, "Delivery failed, reopening form");
            if state.sessions.with_session(id, FormController::reopen).is_err() {
                debug!(session_id = %id, "Session discarded before it could be reopened");
            }
            Err(err)
        }
    }
}

/// GET /api/v1/roles/suggest?q=
pub async fn handle_suggest_roles(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Json<Vec<RoleOption>> {
    Json(suggest_roles(&query.q, &state.config.role_suggestions))
}

/// GET /api/v1/options
pub async fn handle_field_options() -> Json<FieldOptions> {
    let sex = [(Sex::M, "Male"), (Sex::F, "Female")]
        .into_iter()
        .map(|(value, label)| SelectOption {
            value: serde_json::to_value(value).unwrap_or(Value::Null),
            label,
        })
        .collect();
    let highest_education_attained = EducationLevel::ALL
        .into_iter()
        .map(|level| SelectOption {
            value: serde_json::to_value(level).unwrap_or(Value::Null),
            label: level.label(),
        })
        .collect();
    Json(FieldOptions {
        sex,
        highest_education_attained,
    })
}
