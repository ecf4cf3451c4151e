use super::handlers::{auth, health};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// Documented routes. Register new endpoints in `paths(...)` so they show up in
/// `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(health::health, auth::login, auth::refresh, auth::me),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service and database liveness"),
        (name = "auth", description = "Login, access tokens and refresh exchange"),
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
