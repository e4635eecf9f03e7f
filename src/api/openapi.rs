//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Loans API",
        version = "1.0.0",
        description = "Loan lifecycle, business rules and fines for the library system",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::create_loan,
        loans::validate_loan,
        loans::list_overdue_loans,
        loans::business_rules,
        loans::get_loan,
        loans::return_loan,
        loans::extend_loan,
        loans::cancel_loan,
        loans::calculate_fine,
        loans::get_loan_history,
        // Borrowers and books
        loans::get_user_loans,
        loans::get_active_user_loans,
        loans::get_book_loans,
    ),
    components(
        schemas(
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::CreateLoan,
            crate::models::loan::LoanValidation,
            crate::models::loan::FineCalculation,
            crate::models::loan::RuleDescription,
            crate::models::loan::BusinessRulesReport,
            crate::models::history::LoanHistory,
            crate::models::history::HistoryAction,
            loans::UserLoansQuery,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Loan management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_loan_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/loans", "/loans/{id}/return", "/users/{id}/loans", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
