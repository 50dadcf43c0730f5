use chrono::Utc;
use log::info;
use rocket::{
    serde::json::{json, Json, Value},
    Route, State,
};

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    api::responses::{Health, SubmitResponse, SummaryResponse},
    store::{DynStore, NominationsData},
    submission::NewSubmission,
};

pub fn routes() -> Vec<Route> {
    routes![index, health, submit_nominations, nominations, summary]
}

#[get("/")]
fn index() -> Json<Value> {
    Json(json!({
        "message": "Nominations Backend API",
        "status": "running",
        "endpoints": {
            "health": "/api/health",
            "submit": "/api/submit-nominations",
            "nominations": "/api/nominations",
            "summary": "/api/summary",
            "votingRecords": "/api/voting-records",
            "adminSummary": "/api/admin-summary",
        },
        "timestamp": Utc::now(),
    }))
}

#[get("/api/health")]
fn health() -> Json<Health> {
    Json(Health {
        status: "API is running".to_string(),
        message: "Nomination Form API is active".to_string(),
        timestamp: Utc::now(),
    })
}

#[post("/api/submit-nominations", data = "<ballot>", format = "json")]
async fn submit_nominations(
    ballot: Json<NewSubmission>,
    store: &State<DynStore>,
    config: &State<Config>,
) -> Result<Json<SubmitResponse>> {
    let ballot = ballot.into_inner();
    ballot.validate(config.limits())?;

    let accepted = store
        .append(ballot)
        .await
        .map_err(|e| e.during("Failed to process submission"))?;
    info!("Submission successful: {}", accepted.id);

    Ok(Json(accepted.into()))
}

#[get("/api/nominations")]
async fn nominations(store: &State<DynStore>) -> Result<Json<NominationsData>> {
    let data = store
        .load()
        .await
        .map_err(|e| e.during("Failed to load nominations"))?;
    Ok(Json(data))
}

#[get("/api/summary")]
async fn summary(store: &State<DynStore>) -> Result<Json<SummaryResponse>> {
    let data = store
        .load()
        .await
        .map_err(|e| e.during("Failed to load summary"))?;
    Ok(Json(SummaryResponse {
        summary: data.summary,
    }))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::model::submission::Nomination;

    use super::*;

    async fn submit(client: &Client, ballot: &NewSubmission) -> (Status, Value) {
        let response = client
            .post(uri!(submit_nominations))
            .header(ContentType::JSON)
            .body(serde_json::to_string(ballot).unwrap())
            .dispatch()
            .await;
        let status = response.status();
        let body = response.into_json::<Value>().await.unwrap();
        (status, body)
    }

    async fn stored(client: &Client) -> NominationsData {
        let response = client.get(uri!(nominations)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test]
    async fn health_check(client: Client) {
        let response = client.get(uri!(health)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let health: Health = response.into_json().await.unwrap();
        assert_eq!(health.status, "API is running");

        let response = client.get(uri!(index)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["endpoints"]["submit"], "/api/submit-nominations");
    }

    #[backend_test]
    async fn submit_then_summarise(client: Client) {
        let ballot =
            NewSubmission::example("Alice", &[("Consul", vec![Nomination::named("Bob")])]);
        let (status, body) = submit(&client, &ballot).await;
        assert_eq!(Status::Ok, status);
        assert_eq!(body["success"], true);
        assert!(body["submissionId"].is_string());
        assert!(body.get("warning").is_none());

        let response = client.get(uri!(summary)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(
            body,
            json!({"summary": {"Consul": {"Bob": {"count": 1, "reason": ""}}}})
        );
    }

    #[backend_test]
    async fn duplicate_submitter_conflicts(client: Client) {
        let first =
            NewSubmission::example("Alice", &[("Consul", vec![Nomination::named("Bob")])]);
        let (status, body) = submit(&client, &first).await;
        assert_eq!(Status::Ok, status);
        let first_id = body["submissionId"].clone();
        let before = stored(&client).await;

        let second =
            NewSubmission::example("alice ", &[("Consul", vec![Nomination::named("Carol")])]);
        let (status, body) = submit(&client, &second).await;
        assert_eq!(Status::Conflict, status);
        assert_eq!(body["success"], false);
        assert_eq!(body["existingSubmissionId"], first_id);
        assert!(body["existingSubmissionDate"].is_string());

        assert_eq!(stored(&client).await, before);
    }

    #[backend_test]
    async fn anonymous_submissions(client: Client) {
        let mut ballot = NewSubmission::example("", &[("Tribune", vec![Nomination::named("Dan")])]);
        ballot.submitter_name = None;
        ballot.signature = None;
        let (status, _) = submit(&client, &ballot).await;
        assert_eq!(Status::Ok, status);

        let data = stored(&client).await;
        assert_eq!(data.nominations[0].submitter_name, "Anonymous");
        assert_eq!(data.nominations[0].signature, "");
        assert_eq!(data.nominations[0].submitted_at, data.nominations[0].timestamp);
    }

    #[backend_test]
    async fn oversize_ballot_rejected(client: Client) {
        let crowd: Vec<Nomination> = (0..6).map(|i| Nomination::named(&format!("Candidate {i}"))).collect();
        let ballot = NewSubmission::example("Alice", &[("Consul", crowd)]);
        let (status, body) = submit(&client, &ballot).await;
        assert_eq!(Status::BadRequest, status);
        assert_eq!(body["success"], false);

        assert!(stored(&client).await.nominations.is_empty());
    }

    #[backend_test]
    async fn malformed_body_is_json_error(client: Client) {
        let response = client
            .post(uri!(submit_nominations))
            .header(ContentType::JSON)
            .body(r#"{"nominations": "not a map"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], false);
    }
}
