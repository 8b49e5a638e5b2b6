//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::placement::api::{
    BatchErrorResponse, BatchTransferRequest, BatchTransferResponse, ExitResponse,
    PromotionRecordResponse, StudentResponse, TransferRecordResponse,
};
use crate::placement::{
    ExternalTransferRequest, GraduationRequest, PromotionRequest, TransferRequest, TransferType,
    WithdrawalRequest,
};

/// Bearer JWT security scheme (HS256, `sub` + `role` claims)
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Roles admin and staff may change placement; parent is read-only",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Placement API",
        version = "1.0.0",
        description = "Grade/section transfers, promotion and graduation with append-only history.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::get_student,
        crate::gateway::handlers::get_transfer_history,
        crate::gateway::handlers::get_promotion_history,
        crate::gateway::handlers::transfer_student,
        crate::gateway::handlers::external_transfer,
        crate::gateway::handlers::promote_student,
        crate::gateway::handlers::graduate_student,
        crate::gateway::handlers::withdraw_student,
        crate::gateway::handlers::batch_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            StudentResponse,
            TransferRecordResponse,
            PromotionRecordResponse,
            ExitResponse,
            TransferRequest,
            ExternalTransferRequest,
            PromotionRequest,
            GraduationRequest,
            WithdrawalRequest,
            BatchTransferRequest,
            BatchTransferResponse,
            BatchErrorResponse,
            TransferType,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Students", description = "Student placement, history and batch transfer (auth required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
