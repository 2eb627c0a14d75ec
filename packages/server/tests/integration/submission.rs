use reqwest::multipart::{Form, Part};
use serde_json::json;

use crate::common::{TeamForm, TestApp, pdf_part, png_part, routes};

mod codes {
    use super::*;

    #[tokio::test]
    async fn unknown_leader_gets_404() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::SEND_PPT_OTP, &json!({"email": "nobody@college.test"}))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "No team found with this email address");
    }

    #[tokio::test]
    async fn submission_code_verifies_and_names_the_team() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;
        let leader = TeamForm::leader_email_for("alpha");
        let code = app.submission_code(&leader).await;

        let res = app
            .post_json(routes::VERIFY_PPT_OTP, &json!({"email": leader, "otp": code}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["teamName"], "Team alpha");
        assert!(res.body["teamId"].is_string());
    }

    #[tokio::test]
    async fn a_verified_code_still_opens_the_upload() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;
        let leader = TeamForm::leader_email_for("alpha");
        let code = app.submission_code(&leader).await;
        app.post_json(routes::VERIFY_PPT_OTP, &json!({"email": leader, "otp": code}))
            .await;

        let res = app
            .submit_ppt(&leader, &code, pdf_part(b"%PDF-1.4".to_vec()))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn teams_that_submitted_get_their_submission_instead_of_a_code() {
        let app = TestApp::spawn().await;
        app.team_with_submission("alpha").await;
        let mails_before = app.mailer.sent().len();

        let res = app
            .post_json(
                routes::SEND_PPT_OTP,
                &json!({"email": TeamForm::leader_email_for("alpha")}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["status"], "already_submitted");
        assert_eq!(res.body["message"], "PPT already submitted for this team");
        assert_eq!(app.mailer.sent().len(), mails_before);
    }
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn status_moves_from_not_submitted_to_already_submitted() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;
        let leader = TeamForm::leader_email_for("alpha");

        let before = app
            .post_json(routes::PPT_STATUS, &json!({"email": leader}))
            .await;
        assert_eq!(before.status, 200);
        assert_eq!(before.body["status"], "not_submitted");
        assert_eq!(before.body["paymentStatus"], "paid");

        let code = app.submission_code(&leader).await;
        let res = app
            .submit_ppt(&leader, &code, pdf_part(b"%PDF-1.4 deck".to_vec()))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "PPT submitted successfully!");
        assert_eq!(res.body["submission"]["version"], 1);
        assert_eq!(res.body["submission"]["isLateSubmission"], false);
        assert_eq!(res.body["submission"]["fileName"], "deck.pdf");

        let after = app
            .post_json(routes::PPT_STATUS, &json!({"email": leader}))
            .await;
        assert_eq!(after.body["status"], "already_submitted");
        assert_eq!(after.body["submission"]["status"], "submitted");
    }

    #[tokio::test]
    async fn status_for_unknown_team_is_404() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::PPT_STATUS, &json!({"email": "nobody@college.test"}))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Team not found");
    }

    #[tokio::test]
    async fn second_upload_returns_the_first_submission() {
        let app = TestApp::spawn().await;
        let (_, first_id) = app.team_with_submission("alpha").await;
        let leader = TeamForm::leader_email_for("alpha");
        let code = app
            .latest_code(&leader, common::OtpPurpose::PptSubmission)
            .await;

        let res = app
            .submit_ppt(&leader, &code, pdf_part(b"%PDF-1.4 second".to_vec()))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "already_submitted");
        assert_eq!(res.body["submission"]["id"], first_id);
        assert_eq!(res.body["submission"]["version"], 1);
        assert_eq!(app.submission_count().await, 1);
    }

    #[tokio::test]
    async fn wrong_file_type_is_rejected_before_the_code_is_checked() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;
        let leader = TeamForm::leader_email_for("alpha");
        let code = app.submission_code(&leader).await;
        let exe = Part::bytes(b"MZ".to_vec())
            .file_name("deck.exe")
            .mime_str("application/octet-stream")
            .unwrap();

        let res = app.submit_ppt(&leader, &code, exe).await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["message"],
            "Invalid file type. Only PPT, PPTX, and PDF files are allowed."
        );
        let submission_codes: Vec<_> = app
            .otp_records(&leader)
            .await
            .into_iter()
            .filter(|r| r.purpose == common::OtpPurpose::PptSubmission)
            .collect();
        assert_eq!(submission_codes.len(), 1);
        assert!(!submission_codes[0].is_used);
        assert_eq!(app.submission_count().await, 0);

        let retry = app
            .submit_ppt(&leader, &code, pdf_part(b"%PDF-1.4".to_vec()))
            .await;
        assert_eq!(retry.status, 201, "{}", retry.text);
    }

    #[tokio::test]
    async fn oversized_files_are_rejected() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;
        let leader = TeamForm::leader_email_for("alpha");
        let code = app.submission_code(&leader).await;

        let res = app
            .submit_ppt(&leader, &code, pdf_part(vec![b'x'; 100 * 1024]))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_with_a_bad_code_is_rejected() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;
        let leader = TeamForm::leader_email_for("alpha");
        let code = app.submission_code(&leader).await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let res = app
            .submit_ppt(&leader, wrong, pdf_part(b"%PDF-1.4".to_vec()))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "OTP_INVALID");
    }

    #[tokio::test]
    async fn upload_requires_email_and_code() {
        let app = TestApp::spawn().await;
        let form = Form::new().part("pptFile", pdf_part(b"%PDF-1.4".to_vec()));

        let res = app.post_form(routes::SUBMIT_PPT, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Email and OTP are required");
    }
}

mod payment {
    use super::*;

    #[tokio::test]
    async fn replacing_payment_evidence_marks_the_team_paid() {
        let app = TestApp::spawn().await;
        let team_id = app.register_team("alpha").await;
        let token = app.admin_token().await;
        app.patch_with_token(
            &routes::payment_status(&team_id),
            &json!({"status": "rejected"}),
            &token,
        )
        .await;

        let form = Form::new()
            .text("teamId", team_id.clone())
            .text("transactionId", "TXN-NEW")
            .part("paymentScreenshot", png_part());
        let res = app.post_form(routes::PAYMENT_SCREENSHOT, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body["message"],
            "Payment details uploaded successfully! Your payment is under review."
        );
        assert_eq!(res.body["paymentDetails"]["status"], "paid");
        assert_eq!(res.body["paymentDetails"]["transactionId"], "TXN-NEW");
        assert_eq!(res.body["paymentDetails"]["screenshot"], "receipt.png");
    }

    #[tokio::test]
    async fn payment_upload_needs_a_known_team() {
        let app = TestApp::spawn().await;

        let missing = app
            .post_form(routes::PAYMENT_SCREENSHOT, Form::new().part("paymentScreenshot", png_part()))
            .await;
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["message"], "Team ID is required");

        let unknown = app
            .post_form(
                routes::PAYMENT_SCREENSHOT,
                Form::new()
                    .text("teamId", "not-a-uuid")
                    .part("paymentScreenshot", png_part()),
            )
            .await;
        assert_eq!(unknown.status, 404);
        assert_eq!(unknown.body["message"], "Team not found");
    }
}
