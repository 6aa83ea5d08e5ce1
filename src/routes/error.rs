use crate::models::MessageResponse;
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<MessageResponse> {
    Json(MessageResponse::new("Bad request"))
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<MessageResponse> {
    Json(MessageResponse::new("Unauthorized"))
}

#[catch(403)]
pub fn forbidden(req: &Request) -> Json<MessageResponse> {
    // A cached user means an authenticated caller failed the admin guard.
    let message = req
        .local_cache(|| None::<crate::auth::CurrentUser>)
        .as_ref()
        .map(|_| "Access denied. Admin privileges required.")
        .unwrap_or("Forbidden");
    Json(MessageResponse::new(message))
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<MessageResponse> {
    Json(MessageResponse::new("Not found"))
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<MessageResponse> {
    Json(MessageResponse::new("Conflict"))
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<MessageResponse> {
    Json(MessageResponse::new("Invalid request body"))
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<MessageResponse> {
    Json(MessageResponse::new("Internal server error"))
}
