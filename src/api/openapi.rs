//! `OpenAPI` document for the HTTP surface.
//!
//! Routes are registered in `api::new`; this module only declares which
//! handlers and schemas show up in the generated spec served under `/docs`.

use super::handlers::{auth, health, root, users, whatsapp};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::register::register,
        auth::verification::verify_email,
        auth::session::login,
        auth::session::logout,
        auth::session::current_user,
        auth::password_reset::forgot_password,
        auth::password_reset::reset_password,
        auth::oauth::google_start,
        auth::oauth::google_callback,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        whatsapp::send_message,
    ),
    components(schemas(
        health::Health,
        auth::types::RegisterRequest,
        auth::types::LoginRequest,
        auth::types::ForgotPasswordRequest,
        auth::types::ResetPasswordRequest,
        auth::types::MessageResponse,
        auth::types::UserResponse,
        auth::types::LoginResponse,
        auth::types::CurrentUserResponse,
        users::UserUpdateRequest,
        users::UserUpdateResponse,
        whatsapp::WhatsAppSendRequest,
        whatsapp::WhatsAppSendResponse,
    )),
    tags(
        (name = "root", description = "Service banner"),
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, verification, sessions and password reset"),
        (name = "users", description = "User management"),
        (name = "whatsapp", description = "WhatsApp relay")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
