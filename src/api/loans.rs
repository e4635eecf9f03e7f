//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{
        loan::{BusinessRulesReport, FineCalculation, LoanValidation},
        CreateLoan, Loan, LoanHistory, LoanStatus, UserClaims,
    },
    AppState,
};

use super::{AuthenticatedUser, BearerToken};

/// Filter for a user's loans
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserLoansQuery {
    /// Only loans in this status
    pub status: Option<LoanStatus>,
}

/// Load a loan the caller is allowed to see
async fn owned_loan(state: &AppState, claims: &UserClaims, loan_id: i64) -> AppResult<Loan> {
    let loan = state.services.loans.get_loan(loan_id).await?;
    claims.require_self_or_admin(loan.user_id)?;
    Ok(loan)
}

/// Create a new loan (borrow a book)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "A loan rule rejected the request", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Loan for another user")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    BearerToken(token): BearerToken,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    claims.require_self_or_admin(request.user_id)?;

    let loan = state.services.loans.create_loan(request, Some(&token)).await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Check the loan rules without creating a loan
#[utoipa::path(
    post,
    path = "/loans/validate",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 200, description = "Outcome of every rule", body = LoanValidation),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn validate_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    BearerToken(token): BearerToken,
    Json(request): Json<CreateLoan>,
) -> AppResult<Json<LoanValidation>> {
    claims.require_self_or_admin(request.user_id)?;

    let validation = state
        .services
        .loans
        .validate_loan_creation(request, Some(&token))
        .await?;
    Ok(Json(validation))
}

/// List overdue loans, marking them OVERDUE on the way
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue loans", body = Vec<Loan>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_overdue_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Loan>>> {
    claims.require_admin()?;

    let loans = state.services.loans.list_overdue_loans().await?;
    Ok(Json(loans))
}

/// Loan rules currently in force
#[utoipa::path(
    get,
    path = "/loans/rules",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Configured business rules", body = BusinessRulesReport)
    )
)]
pub async fn business_rules(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> Json<BusinessRulesReport> {
    Json(state.services.loans.business_rules())
}

/// Get loan details by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<Loan>> {
    let loan = owned_loan(&state, &claims, loan_id).await?;
    Ok(Json(loan))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned, fine applied if late", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already closed")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<Loan>> {
    owned_loan(&state, &claims, loan_id).await?;

    let loan = state.services.loans.return_loan(loan_id).await?;
    Ok(Json(loan))
}

/// Extend a loan by one extension period
#[utoipa::path(
    post,
    path = "/loans/{id}/extend",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan extended", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not active, overdue or already extended twice")
    )
)]
pub async fn extend_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<Loan>> {
    owned_loan(&state, &claims, loan_id).await?;

    let loan = state.services.loans.extend_loan(loan_id).await?;
    Ok(Json(loan))
}

/// Cancel an active loan
#[utoipa::path(
    post,
    path = "/loans/{id}/cancel",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan cancelled", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not active")
    )
)]
pub async fn cancel_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<Loan>> {
    owned_loan(&state, &claims, loan_id).await?;

    let loan = state.services.loans.cancel_loan(loan_id).await?;
    Ok(Json(loan))
}

/// Fine owed if the book came back today
#[utoipa::path(
    get,
    path = "/loans/{id}/fine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Fine estimate", body = FineCalculation),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn calculate_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<FineCalculation>> {
    owned_loan(&state, &claims, loan_id).await?;

    let fine = state.services.loans.calculate_fine(loan_id).await?;
    Ok(Json(fine))
}

/// Audit trail of a loan, newest first
#[utoipa::path(
    get,
    path = "/loans/{id}/history",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan history", body = Vec<LoanHistory>),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan_history(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<Vec<LoanHistory>>> {
    owned_loan(&state, &claims, loan_id).await?;

    let history = state.services.loans.get_loan_history(loan_id).await?;
    Ok(Json(history))
}

/// Get loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID"),
        UserLoansQuery
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<Loan>),
        (status = 403, description = "Loans of another user")
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i64>,
    Query(query): Query<UserLoansQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    claims.require_self_or_admin(user_id)?;

    let loans = state
        .services
        .loans
        .list_user_loans(user_id, query.status)
        .await?;
    Ok(Json(loans))
}

/// Loans a user still has out
#[utoipa::path(
    get,
    path = "/users/{id}/loans/active",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Active and overdue loans", body = Vec<Loan>),
        (status = 403, description = "Loans of another user")
    )
)]
pub async fn get_active_user_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    claims.require_self_or_admin(user_id)?;

    let loans = state.services.loans.list_open_user_loans(user_id).await?;
    Ok(Json(loans))
}

/// Every loan of a book
#[utoipa::path(
    get,
    path = "/books/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Loans of the book", body = Vec<Loan>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_book_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    claims.require_admin()?;

    let loans = state.services.loans.list_book_loans(book_id).await?;
    Ok(Json(loans))
}
