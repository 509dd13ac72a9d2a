//! OpenAPI document for the catalog API.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Registers the `bearer` scheme referenced by `security(("bearer" = []))` on handlers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Token returned by `POST /signin`. Send it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            A user holds at most one unexpired token; sign out before signing in again.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "filmctl",
        description = "Film catalog API: films, actors, languages, critics and user accounts."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::signin,
        api::handlers::auth::signout,
        api::handlers::users::get_user,
        api::handlers::users::update_password,
        api::handlers::films::list_films,
        api::handlers::films::get_film,
        api::handlers::films::create_film,
        api::handlers::films::update_film,
        api::handlers::films::delete_film,
        api::handlers::films::list_film_critics,
        api::handlers::films::list_film_actors,
        api::handlers::critics::create_critic,
        api::handlers::critics::get_critic,
        api::handlers::actors::list_actors,
        api::handlers::actors::get_actor,
        api::handlers::actors::list_actor_films,
        api::handlers::languages::list_languages,
        api::handlers::languages::get_language,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::TokenResponse,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::PasswordUpdate,
            api::models::films::FilmCreate,
            api::models::films::FilmUpdate,
            api::models::films::FilmResponse,
            api::models::critics::CriticCreate,
            api::models::critics::CriticResponse,
            api::models::actors::ActorResponse,
            api::models::languages::LanguageResponse,
            api::models::responses::MessageResponse,
        )
    ),
    tags(
        (name = "auth", description = "Accounts and bearer tokens"),
        (name = "users", description = "Self-service profile and password"),
        (name = "films", description = "Film catalog"),
        (name = "critics", description = "User reviews of films"),
        (name = "actors", description = "Actors and their films"),
        (name = "languages", description = "Film languages"),
    )
)]
pub struct ApiDoc;
