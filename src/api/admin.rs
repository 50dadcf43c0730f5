use log::{info, warn};
use rocket::{
    http::{ContentType, Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::{
            responses::{AdminSummary, DeleteResponse, VotingRecords},
            AdminCredentials, AdminToken, AUTH_TOKEN_COOKIE,
        },
        record::VotingRecord,
        roster::Roster,
        store::{DynStore, NominationsData},
        submission::SubmissionId,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        login,
        logout,
        delete_submission,
        voting_records,
        admin_summary,
        export_summary,
        export_submissions,
    ]
}

#[post("/api/admin/login", data = "<credentials>", format = "json")]
async fn login(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    config: &State<Config>,
) -> Result<()> {
    if !config.verify_admin_password(&credentials.password) {
        warn!("Rejected admin login attempt");
        return Err(Error::Unauthorized("Incorrect password".to_string()));
    }

    cookies.add(AdminToken::new(config).into_cookie(config));
    info!("Admin logged in");
    Ok(())
}

#[delete("/api/admin/logout")]
fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[delete("/api/nominations/<id>")]
async fn delete_submission(
    _token: AdminToken,
    id: SubmissionId,
    store: &State<DynStore>,
) -> Result<Json<DeleteResponse>> {
    let deleted = store
        .delete(&id)
        .await
        .map_err(|e| e.during("Failed to delete submission"))?;
    Ok(Json(deleted.into()))
}

#[get("/api/voting-records")]
async fn voting_records(_token: AdminToken, store: &State<DynStore>) -> Result<Json<VotingRecords>> {
    let data = load(store, "Failed to load voting records").await?;
    let records: Vec<VotingRecord> = data.nominations.iter().map(Into::into).collect();
    Ok(Json(VotingRecords {
        success: true,
        total_submissions: records.len(),
        records,
    }))
}

#[get("/api/admin-summary")]
async fn admin_summary(
    _token: AdminToken,
    store: &State<DynStore>,
    roster: &State<Roster>,
) -> Result<Json<AdminSummary>> {
    let data = load(store, "Failed to load admin summary").await?;
    Ok(Json(AdminSummary {
        success: true,
        summary: roster.complete(&data.summary),
        total_submissions: data.nominations.len(),
    }))
}

/// The "Nominations Summary" sheet: one row per position and nominee, sorted.
#[get("/api/export/summary.csv")]
async fn export_summary(
    _token: AdminToken,
    store: &State<DynStore>,
) -> Result<(ContentType, String)> {
    let data = load(store, "Failed to export summary").await?;
    let csv = summary_csv(&data).map_err(|e| e.during("Failed to export summary"))?;
    Ok((ContentType::CSV, csv))
}

/// The "Detailed Submissions" sheet: one row per nomination, in submission order.
#[get("/api/export/submissions.csv")]
async fn export_submissions(
    _token: AdminToken,
    store: &State<DynStore>,
) -> Result<(ContentType, String)> {
    let data = load(store, "Failed to export submissions").await?;
    let csv = submissions_csv(&data).map_err(|e| e.during("Failed to export submissions"))?;
    Ok((ContentType::CSV, csv))
}

async fn load(store: &DynStore, action: &'static str) -> Result<NominationsData> {
    store.load().await.map_err(|e| e.during(action))
}

fn summary_csv(data: &NominationsData) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["Officer Position", "Nominee", "Total Nominations", "Reason"])?;
    for (position, nominee, tally) in data.summary.sorted_rows() {
        let count = tally.count.to_string();
        writer.write_record([position, nominee, count.as_str(), tally.reason.as_str()])?;
    }
    finish(writer)
}

fn submissions_csv(data: &NominationsData) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "Timestamp",
        "Submitter Name",
        "Officer Position",
        "Nominee",
        "Reason",
        "Signature",
        "Submitted At",
    ])?;
    for submission in &data.nominations {
        let timestamp = submission.timestamp.to_rfc3339();
        let submitted_at = submission.submitted_at.to_rfc3339();
        for (position, nominations) in &submission.nominations {
            for nomination in nominations {
                let Some(nominee) = nomination.candidate() else {
                    continue;
                };
                writer.write_record([
                    timestamp.as_str(),
                    submission.submitter_name.as_str(),
                    position.as_str(),
                    nominee,
                    nomination.reason().unwrap_or_default(),
                    submission.signature.as_str(),
                    submitted_at.as_str(),
                ])?;
            }
        }
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    // Every field written was a `&str`, so the output is valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
