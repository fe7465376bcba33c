//! Row mapping between PostgreSQL and the session tree.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::foundation::{
    AppearanceId, DomainError, ErrorCode, RoundId, RoundStatus, SessionId, SessionStatus,
    Timestamp, UserId,
};
use crate::domain::session::{
    BaseInformation, Category, ChoiceAppearance, Outcome, Report, Round, Session,
};

pub(super) fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid stored value in column '{}': {}", column, detail),
    )
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| corrupt(column, e))
}

fn category(column: &str, name: String) -> Result<Category, DomainError> {
    Category::new(name).map_err(|e| corrupt(column, e))
}

fn number(column: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|e| corrupt(column, e))
}

/// Session columns selected by every session query.
pub(super) const SESSION_COLUMNS: &str = "id, user_id, base_information, status, \
     current_round_number, final_category, report, created_at, updated_at";

pub(super) fn row_to_session(row: &PgRow, rounds: Vec<Round>) -> Result<Session, DomainError> {
    let status: String = get(row, "status")?;
    let status: SessionStatus = status.parse().map_err(|e| corrupt("status", e))?;
    let user_id: String = get(row, "user_id")?;
    let Json(base_information): Json<BaseInformation> = get(row, "base_information")?;
    let report: Option<Json<Report>> = get(row, "report")?;
    let final_category = get::<Option<String>>(row, "final_category")?
        .map(|name| category("final_category", name))
        .transpose()?;
    let created_at: DateTime<Utc> = get(row, "created_at")?;
    let updated_at: DateTime<Utc> = get(row, "updated_at")?;

    Ok(Session::reconstitute(
        SessionId::from_uuid(get::<Uuid>(row, "id")?),
        UserId::new(user_id).map_err(|e| corrupt("user_id", e))?,
        base_information,
        status,
        number("current_round_number", get(row, "current_round_number")?)?,
        final_category,
        report.map(|Json(r)| r),
        rounds,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

pub(super) fn row_to_round(
    row: &PgRow,
    appearances: Vec<ChoiceAppearance>,
) -> Result<Round, DomainError> {
    let status: String = get(row, "status")?;
    let eligible = get::<Vec<String>>(row, "eligible_categories")?
        .into_iter()
        .map(|name| category("eligible_categories", name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Round::reconstitute(
        RoundId::from_uuid(get::<Uuid>(row, "id")?),
        SessionId::from_uuid(get::<Uuid>(row, "session_id")?),
        number("round_number", get(row, "round_number")?)?,
        status.parse::<RoundStatus>().map_err(|e| corrupt("status", e))?,
        eligible,
        appearances,
    ))
}

pub(super) fn row_to_appearance(row: &PgRow) -> Result<ChoiceAppearance, DomainError> {
    Ok(ChoiceAppearance::reconstitute(
        AppearanceId::from_uuid(get::<Uuid>(row, "id")?),
        RoundId::from_uuid(get::<Uuid>(row, "round_id")?),
        SessionId::from_uuid(get::<Uuid>(row, "session_id")?),
        category("category", get(row, "category")?)?,
        get(row, "description")?,
        number("appearance_index", get(row, "appearance_index")?)?,
        Outcome::from_flag(get(row, "is_winner")?),
    ))
}

pub(super) fn category_names(categories: &[Category]) -> Vec<String> {
    categories.iter().map(|c| c.as_str().to_string()).collect()
}

/// Converts a counter for an INTEGER column, refusing values it cannot hold.
pub(super) fn to_db_int(column: &str, value: u32) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Value {} does not fit column '{}'", value, column),
        )
    })
}
