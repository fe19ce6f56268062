// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use cms_api::{ApiError, Client, is_unauthorized};
use cms_app::{
    ChatDelays, DashboardSummary, FeedbackLabel, IntakeBackend, LoginForm, PasswordResetForm,
    PriorityForm, ProfileForm, QueueBoard, QueueKind, Role, Severity, SolutionForm, StaffId,
    SubIssuePick, SubRelatedIssueId, Wizard, WizardStep,
};
use cms_testkit::{fixture_datetime, temp_session_path};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server};

struct Recorded {
    method: String,
    url: String,
    authorization: Option<String>,
    body: String,
}

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

/// Serves one canned response per entry and returns what each request looked like.
fn serve(responses: Vec<(u16, &'static str)>) -> Result<(String, thread::JoinHandle<Vec<Recorded>>)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let mut request: Request = server.recv().expect("request expected");
            let mut payload = String::new();
            request
                .as_reader()
                .read_to_string(&mut payload)
                .expect("read request body");
            seen.push(Recorded {
                method: request.method().to_string(),
                url: request.url().to_owned(),
                authorization: request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Authorization"))
                    .map(|header| header.value.as_str().to_owned()),
                body: payload,
            });
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(json_header());
            request.respond(response).expect("response should succeed");
        }
        seen
    });
    Ok((addr, handle))
}

fn client(addr: &str) -> Result<Client> {
    let mut client = Client::new(addr, Duration::from_secs(2))?;
    client.set_token(Some("secret-token".to_owned()));
    Ok(client)
}

#[test]
fn unreachable_backend_reports_connection_error() {
    let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(100))
        .expect("client should initialize");
    let error = client
        .dashboard_summary(Role::User)
        .expect_err("request should fail");

    assert!(matches!(
        error.downcast_ref::<ApiError>(),
        Some(ApiError::Connection { .. })
    ));
    assert!(error.to_string().contains("check api.base_url"));
}

#[test]
fn login_posts_credentials_without_token() -> Result<()> {
    let (addr, handle) = serve(vec![(
        200,
        r#"{"token":"jwt-123","role":"user","userId":42,"message":"Login successful"}"#,
    )])?;

    let client = Client::new(&addr, Duration::from_secs(2))?;
    let session = client.login(&LoginForm {
        staff_no: " S100 ".to_owned(),
        password: "pw".to_owned(),
    })?;
    assert_eq!(session.token, "jwt-123");
    assert_eq!(session.role, Role::User);
    assert_eq!(session.user_id.get(), 42);

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].url, "/api/auth/login");
    assert_eq!(seen[0].authorization, None);
    let body: serde_json::Value = serde_json::from_str(&seen[0].body)?;
    assert_eq!(body, serde_json::json!({"staffNo": "S100", "password": "pw"}));
    Ok(())
}

#[test]
fn failed_login_surfaces_backend_message() -> Result<()> {
    let (addr, handle) = serve(vec![(401, r#"{"message":"Invalid credentials"}"#)])?;

    let client = Client::new(&addr, Duration::from_secs(2))?;
    let error = client
        .login(&LoginForm {
            staff_no: "S100".to_owned(),
            password: "wrong".to_owned(),
        })
        .expect_err("login should fail");
    assert!(!is_unauthorized(&error));
    assert!(error.to_string().contains("Invalid credentials"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn password_reset_validates_before_sending() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(100))?;
    let error = client
        .reset_password(&PasswordResetForm {
            staff_no: "S100".to_owned(),
            new_password: "a".to_owned(),
            confirm_password: "b".to_owned(),
        })
        .expect_err("mismatch should fail locally");
    assert!(error.to_string().contains("passwords must match"));
    Ok(())
}

#[test]
fn dashboard_summaries_decode_per_role() -> Result<()> {
    let (addr, handle) = serve(vec![
        (
            200,
            r#"{"success":true,"stats":{"total":"9","resolved":4,"unresolved":5,"thisMonth":2}}"#,
        ),
        (
            200,
            r#"{"success":true,"totalComplaints":30,"pendingComplaints":7,"totalResolved":20,"aiResolved":3,
                "highPriority":4,"totalUsers":50,"totalAdmins":2,"totalSubAdmins":6,"activeThisMonth":18}"#,
        ),
    ])?;

    let client = client(&addr)?;
    let user = client.dashboard_summary(Role::User)?;
    let admin = client.dashboard_summary(Role::Admin)?;

    assert_eq!(user.role(), Role::User);
    assert_eq!(user.tiles()[0], ("Total complaints", 9));
    assert!(matches!(admin, DashboardSummary::Admin(stats) if stats.total_sub_admins == 6));

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[0].url, "/api/complaints/dashboard/summary");
    assert_eq!(seen[1].url, "/api/admin/dashboard/summary");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret-token"));
    Ok(())
}

#[test]
fn unauthorized_summary_is_detectable() -> Result<()> {
    let (addr, handle) = serve(vec![(401, r#"{"message":"jwt expired"}"#)])?;

    let client = client(&addr)?;
    let error = client
        .dashboard_summary(Role::SubAdmin)
        .expect_err("expired token");
    assert!(is_unauthorized(&error));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn success_false_becomes_rejection() -> Result<()> {
    let (addr, handle) = serve(vec![(
        200,
        r#"{"success":false,"message":"Failed to classify issue"}"#,
    )])?;

    let mut client = client(&addr)?;
    let error = client
        .classify("printer jammed")
        .expect_err("backend rejected");
    assert!(matches!(
        error.downcast_ref::<ApiError>(),
        Some(ApiError::Rejected(message)) if message == "Failed to classify issue"
    ));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn wizard_runs_against_http_backend() -> Result<()> {
    let (addr, handle) = serve(vec![
        (
            200,
            r#"{"success":true,"mainIssue":"Hardware","mainIssueId":3,"relatedIssue":"Printer","relatedIssueId":7,
                "subRelatedIssues":[{"id":21,"related_issue_id":7,"name":"Paper jam"}]}"#,
        ),
        (
            200,
            r#"{"success":true,"issueDescription":null,"solutions":[{"id":1,"step_number":1,"step_instruction":"Open the tray"}]}"#,
        ),
        (200, r#"{"success":true,"message":"Complaint submitted"}"#),
    ])?;

    let mut client = client(&addr)?;
    let mut wizard = Wizard::new(ChatDelays::default());
    wizard.analyze(&mut client, "printer jammed")?;
    wizard.confirm_issue()?;
    wizard.select_sub_issue(&mut client, SubIssuePick::Concrete(SubRelatedIssueId::new(21)))?;
    assert_eq!(wizard.step(), WizardStep::SubIssueDetail);
    assert_eq!(wizard.draft().sub_issue_description, "No description available.");
    let session = wizard.draft().session_id;

    wizard.raise_complaint()?;
    wizard.submit(
        &mut client,
        &PriorityForm {
            priority: cms_app::Priority::Low,
            contact_number: "9876543210".to_owned(),
        },
    )?;

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[0].url, "/api/complaints/classify-description");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&seen[0].body)?,
        serde_json::json!({"description": "printer jammed"})
    );
    assert_eq!(seen[1].method, "GET");
    assert_eq!(seen[1].url, "/api/complaints/solutions?subRelatedIssueId=21");
    assert_eq!(seen[2].url, "/api/complaints/submit");

    let payload: serde_json::Value = serde_json::from_str(&seen[2].body)?;
    assert_eq!(
        payload,
        serde_json::json!({
            "description": "printer jammed",
            "mainIssueId": 3,
            "relatedIssueId": 7,
            "subRelatedIssueId": 21,
            "priority": "Low",
            "isResolved": false,
            "sessionId": session.to_string(),
            "issueDescription": "Paper jam",
            "contactNumber": "9876543210",
        })
    );
    Ok(())
}

#[test]
fn resolution_log_and_manual_catalog_requests() -> Result<()> {
    let (addr, handle) = serve(vec![
        (
            200,
            r#"{"success":true,"relatedIssues":[{"id":1,"name":"Others","main_issue_id":1,"main_issue_name":"Others"},
                {"id":5,"name":"Network","main_issue_id":4,"main_issue_name":"Connectivity"}]}"#,
        ),
        (
            200,
            r#"{"success":true,"subRelatedIssues":[{"id":12,"related_issue_id":5,"name":"No internet"}]}"#,
        ),
        (200, r#"{"success":true}"#),
    ])?;

    let mut client = client(&addr)?;
    let related = client.related_issues()?;
    assert_eq!(related.len(), 2);
    assert_eq!(related[1].main_issue_name, "Connectivity");
    let subs = client.sub_related_issues(related[1].id)?;
    assert_eq!(subs[0].name, "No internet");

    let session = cms_app::SessionId::generate();
    client.log_resolution(session, true)?;

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[0].url, "/api/complaints/related-issues/all");
    assert_eq!(seen[1].url, "/api/complaints/sub-related-issues?related_issue_id=5");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&seen[2].body)?,
        serde_json::json!({"isResolved": true, "sessionId": session.to_string()})
    );
    Ok(())
}

#[test]
fn tracking_and_feedback_round_trip() -> Result<()> {
    let track_body: &'static str = Box::leak(
        format!(
            r#"{{"complaints":[{{"id":11,"description":"no wifi","mainIssue":"Connectivity","relatedIssue":"Network",
                "subRelatedIssue":"No internet","status":"Closed","assignedTo":"Ravi","assignedToId":41,
                "createdAt":"{created}","updatedAt":"2026-02-21T12:34:56Z","hasFeedback":false}}]}}"#,
            created = fixture_datetime()
        )
        .into_boxed_str(),
    );
    let (addr, handle) = serve(vec![
        (200, track_body),
        (200, r#"{"success":true,"message":"Feedback submitted"}"#),
    ])?;

    let client = client(&addr)?;
    let complaints = client.track_complaints()?;
    assert_eq!(complaints.len(), 1);
    let complaint = &complaints[0];
    assert_eq!(complaint.time_taken(), "2 days");
    assert!(complaint.can_leave_feedback());

    let feedback = complaint.feedback(
        Some(cms_app::UserId::new(3)),
        &cms_app::FeedbackForm {
            label: Some(FeedbackLabel::VeryPoor),
            comment: "took a while".to_owned(),
        },
    )?;
    client.submit_feedback(&feedback)?;

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[1].url, "/api/complaints/submit-feedback");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&seen[1].body)?,
        serde_json::json!({
            "complaint_id": 11,
            "user_id": 3,
            "subadmin_id": 41,
            "label": "Very Poor",
            "comment": "took a while",
        })
    );
    Ok(())
}

#[test]
fn staff_password_reset_targets_role_endpoint() -> Result<()> {
    let (addr, handle) = serve(vec![(
        200,
        r#"{"success":true,"message":"Password reset for S200"}"#,
    )])?;
    let client = client(&addr)?;
    let form = PasswordResetForm {
        staff_no: " S200 ".to_owned(),
        new_password: "n3w".to_owned(),
        confirm_password: "n3w".to_owned(),
    };

    assert!(client.reset_staff_password(Role::User, &form).is_err());
    let message = client.reset_staff_password(Role::SubAdmin, &form)?;
    assert_eq!(message, "Password reset for S200");

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url, "/api/auth/subadmin/reset-password");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&seen[0].body)?,
        serde_json::json!({"staffNo": "S200", "newPassword": "n3w", "confirmPassword": "n3w"})
    );
    Ok(())
}

#[test]
fn queue_take_and_solve_over_http() -> Result<()> {
    let list: &'static str = Box::leak(
        format!(
            r#"{{"complaints":[
                {{"complaint_id":7,"description":"no wifi","priority":"High","status":"Pending",
                  "created_at":"{created}","user_name":"Asha","main_issue_id":4,
                  "main_issue_name":"Connectivity","assigned_to_id":null}},
                {{"complaint_id":8,"status":"Pending","created_at":"{created}",
                  "main_issue_id":1,"main_issue_name":"Others"}}]}}"#,
            created = fixture_datetime()
        )
        .into_boxed_str(),
    );
    let (addr, handle) = serve(vec![
        (200, list),
        (200, r#"{"message":"taken","assigned_to_id":41,"assignedTo":"Ravi"}"#),
        (200, r#"{"success":true}"#),
    ])?;
    let mut client = client(&addr)?;
    let mut board = QueueBoard::new(QueueKind::General, Some(StaffId::new(41)));

    board.reload(&mut client)?;
    assert_eq!(board.complaints().len(), 1, "Others stays off the general list");
    board.take(&mut client)?;
    assert_eq!(
        board.selected_complaint().map(|complaint| complaint.assignee_label()),
        Some("Ravi")
    );
    board.solve(
        &mut client,
        &SolutionForm {
            direct_solution: "Reset the access point".to_owned(),
            severity: Severity::Major,
            ..SolutionForm::default()
        },
    )?;

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[0].url, "/api/subadmin/complaints/general");
    assert_eq!(seen[1].method, "POST");
    assert_eq!(seen[1].url, "/api/subadmin/complaints/7/take");
    assert_eq!(seen[2].url, "/api/subadmin/complaints/7/update-general-solution");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&seen[2].body)?,
        serde_json::json!({"directSolution": "Reset the access point", "severity": "Major"})
    );
    assert!(
        seen.iter()
            .all(|request| request.authorization.as_deref() == Some("Bearer secret-token"))
    );
    Ok(())
}

#[test]
fn expired_token_on_queue_is_unauthorized() -> Result<()> {
    let (addr, handle) = serve(vec![(401, r#"{"message":"jwt expired"}"#)])?;
    let mut client = client(&addr)?;
    let mut board = QueueBoard::new(QueueKind::Assigned, Some(StaffId::new(41)));

    let error = board.reload(&mut client).expect_err("token expired");
    assert!(is_unauthorized(&error));
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn profile_loads_and_saves_as_multipart() -> Result<()> {
    let (addr, handle) = serve(vec![
        (
            200,
            r#"{"staffNo":"S100","name":"Asha Rao","department":"IT","designation":"Engineer",
               "contacts":"[\"9000011111\"]","photoUrl":"https://cdn.example/p.png"}"#,
        ),
        (200, r#"{"success":true}"#),
    ])?;
    let client = client(&addr)?;
    let (_dir, session_path) = temp_session_path()?;
    let photo = session_path.with_file_name("me.png");
    std::fs::write(&photo, "not really a png")?;

    let profile = client.profile()?;
    assert_eq!(profile.contacts, vec!["9000011111".to_owned()]);
    let mut form = ProfileForm::from_profile(&profile);
    form.contacts.push_str(", 9000022222");
    form.photo = photo.display().to_string();
    let message = client.update_profile(&form.validate()?)?;
    assert_eq!(message, "Your profile has been updated successfully");

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[0].url, "/api/profile");
    assert_eq!(seen[1].url, "/api/profile/update");
    let body = &seen[1].body;
    assert!(body.contains("name=\"name\""), "multipart body: {body}");
    assert!(body.contains(r#"["9000011111","9000022222"]"#));
    assert!(body.contains("filename=\"me.png\""));
    assert!(body.contains("not really a png"));
    Ok(())
}
