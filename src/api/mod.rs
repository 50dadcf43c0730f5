use rocket::{
    http::Status,
    serde::json::{json, Json, Value},
    Catcher, Request, Route,
};

pub mod admin;
pub mod public;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(public::routes());
    routes.extend(admin::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![json_error]
}

/// Answer every uncaught error status with the same JSON shape the handlers use.
#[catch(default)]
fn json_error(status: Status, req: &Request<'_>) -> Json<Value> {
    let error = match status.code {
        401 => "Admin login required".to_string(),
        404 => format!("No such endpoint: {} {}", req.method(), req.uri()),
        422 => "Malformed request body".to_string(),
        _ => status.reason_lossy().to_string(),
    };
    Json(json!({
        "success": false,
        "error": error,
    }))
}
