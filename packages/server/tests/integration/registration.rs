use chrono::{Duration, Utc};
use common::OtpPurpose;
use portal_server::entity::otp as otp_record;
use portal_server::otp::purge_expired;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

use crate::common::{TeamForm, TestApp, routes};

mod otp {
    use super::*;

    #[tokio::test]
    async fn send_otp_mails_a_code_greeting_the_recipient() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({"action": "send_otp", "email": "Lead@College.test", "name": "Asha"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "OTP sent to lead@college.test");
        assert_eq!(res.body["expiresIn"], "10 minutes");

        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "lead@college.test");
        assert!(sent[0].text.contains("Hello Asha"));
        let code = app
            .latest_code("lead@college.test", OtpPurpose::TeamRegistration)
            .await;
        assert!(sent[0].text.contains(&code));
    }

    #[tokio::test]
    async fn send_otp_requires_email_and_name() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::REGISTER, &json!({"action": "send_otp", "email": "a@b.test"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Email and name are required");
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::REGISTER, &json!({"action": "delete_everything"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Invalid action");
    }

    #[tokio::test]
    async fn failed_delivery_leaves_no_usable_code() {
        let app = TestApp::spawn().await;
        app.mailer.fail_deliveries(true);

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({"action": "send_otp", "email": "lead@college.test", "name": "Asha"}),
            )
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "EXTERNAL_SERVICE_ERROR");
        assert_eq!(res.body["message"], "Failed to send email");
        assert!(app.otp_records("lead@college.test").await.is_empty());
    }

    #[tokio::test]
    async fn an_expired_code_is_rejected_and_swept() {
        let app = TestApp::spawn().await;
        let email = "lead@college.test";
        app.post_json(
            routes::REGISTER,
            &json!({"action": "send_otp", "email": email, "name": "Asha"}),
        )
        .await;
        let code = app.latest_code(email, OtpPurpose::TeamRegistration).await;

        let [record] = app.otp_records(email).await.try_into().unwrap();
        let mut expired: otp_record::ActiveModel = record.into();
        expired.expires_at = Set(Utc::now() - Duration::minutes(1));
        expired.update(&app.db).await.unwrap();

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({"action": "verify_otp", "email": email, "otp": code}),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "OTP_INVALID");
        assert_eq!(res.body["message"], "Invalid or expired OTP");

        let [record] = app.otp_records(email).await.try_into().unwrap();
        assert!(!record.is_used);

        let removed = purge_expired(&app.db).await.unwrap();
        assert!(removed >= 1);
        assert!(app.otp_records(email).await.is_empty());
    }

    #[tokio::test]
    async fn a_code_verifies_only_once() {
        let app = TestApp::spawn().await;
        let email = "lead@college.test";
        app.post_json(
            routes::REGISTER,
            &json!({"action": "send_otp", "email": email, "name": "Asha"}),
        )
        .await;
        let code = app.latest_code(email, OtpPurpose::TeamRegistration).await;
        let body = json!({"action": "verify_otp", "email": email, "otp": code});

        let first = app.post_json(routes::REGISTER, &body).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["message"], "Email verified successfully");

        let second = app.post_json(routes::REGISTER, &body).await;
        assert_eq!(second.status, 400);
        assert_eq!(second.body["code"], "OTP_INVALID");
    }

    #[tokio::test]
    async fn a_wrong_code_is_rejected() {
        let app = TestApp::spawn().await;
        let email = "lead@college.test";
        app.post_json(
            routes::REGISTER,
            &json!({"action": "send_otp", "email": email, "name": "Asha"}),
        )
        .await;
        let code = app.latest_code(email, OtpPurpose::TeamRegistration).await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({"action": "verify_otp", "email": email, "otp": wrong}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Invalid or expired OTP");
    }
}

mod register_team {
    use super::*;

    #[tokio::test]
    async fn verified_leader_can_register_a_full_team() {
        let app = TestApp::spawn().await;
        let form = TeamForm::new("alpha");
        app.verify_registration_email(&form.leader_email()).await;

        let res = app.submit_registration(&form, true).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["teamSize"], 6);
        assert_eq!(res.body["paymentStatus"], "paid");
        assert!(res.body["teamId"].is_string());
    }

    #[tokio::test]
    async fn registration_requires_a_verified_email() {
        let app = TestApp::spawn().await;

        let res = app.submit_registration(&TeamForm::new("alpha"), true).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Please verify your email first");
    }

    #[tokio::test]
    async fn registration_requires_a_screenshot() {
        let app = TestApp::spawn().await;
        let form = TeamForm::new("alpha");
        app.verify_registration_email(&form.leader_email()).await;

        let res = app.submit_registration(&form, false).await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["message"],
            "Payment screenshot is required for payment verification"
        );
    }

    #[tokio::test]
    async fn registration_requires_all_six_members() {
        let app = TestApp::spawn().await;
        let form = TeamForm::new("alpha").without("member6Enrollment");
        app.verify_registration_email(&form.leader_email()).await;

        let res = app.submit_registration(&form, true).await;

        assert_eq!(res.status, 400);
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .starts_with("All 6 team members are required")
        );
    }

    #[tokio::test]
    async fn malformed_member_email_is_itemized() {
        let app = TestApp::spawn().await;
        let form = TeamForm::new("alpha").set("member3Email", "not-an-email");
        app.verify_registration_email(&form.leader_email()).await;

        let res = app.submit_registration(&form, true).await;

        assert_eq!(res.status, 400);
        let errors = res.body["errors"].as_array().expect("errors list");
        assert!(errors.iter().any(|e| e.as_str().unwrap().starts_with("Member 3 email")));
    }

    #[tokio::test]
    async fn member_email_already_registered_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;

        let form = TeamForm::new("beta").set("member4Email", "m2-alpha@college.test");
        app.verify_registration_email(&form.leader_email()).await;
        let res = app.submit_registration(&form, true).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(
            res.body["message"],
            "Email m2-alpha@college.test is already registered with team \"Team alpha\""
        );
    }

    #[tokio::test]
    async fn enrollment_reused_in_a_member_slot_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;
        let teams_before = app.team_count().await;

        let form = TeamForm::new("beta").set("member3Enrollment", "alpha-E1");
        app.verify_registration_email(&form.leader_email()).await;
        let res = app.submit_registration(&form, true).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(res.body["message"], "Enrollment number alpha-E1 is already registered");
        assert_eq!(app.team_count().await, teams_before);
    }

    #[tokio::test]
    async fn team_names_are_unique_ignoring_case() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;

        let form = TeamForm::new("beta").set("teamName", "TEAM ALPHA");
        app.verify_registration_email(&form.leader_email()).await;
        let res = app.submit_registration(&form, true).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
        assert!(res.body["message"].as_str().unwrap().contains("already taken"));
    }

    #[tokio::test]
    async fn transaction_ids_are_single_use() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;

        let form = TeamForm::new("beta").set("transactionId", "TXN-alpha");
        app.verify_registration_email(&form.leader_email()).await;
        let res = app.submit_registration(&form, true).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Transaction ID TXN-alpha has already been used");
    }

    #[tokio::test]
    async fn registered_members_cannot_request_a_new_code() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({"action": "send_otp", "email": "m5-alpha@college.test", "name": "M"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["message"],
            "This email is already registered as team member"
        );
    }
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn check_email_exists_matches_leaders_only() {
        let app = TestApp::spawn().await;
        app.register_team("alpha").await;

        let leader = app
            .post_json(
                routes::CHECK_EMAIL,
                &json!({"email": TeamForm::leader_email_for("alpha")}),
            )
            .await;
        assert_eq!(leader.status, 200);
        assert_eq!(leader.body["userExists"], true);
        assert_eq!(leader.body["teamName"], "Team alpha");

        let member = app
            .post_json(routes::CHECK_EMAIL, &json!({"email": "m2-alpha@college.test"}))
            .await;
        assert_eq!(member.status, 200);
        assert_eq!(member.body["success"], false);
        assert_eq!(member.body["userExists"], false);
    }

    #[tokio::test]
    async fn check_email_exists_requires_an_email() {
        let app = TestApp::spawn().await;

        let res = app.post_json(routes::CHECK_EMAIL, &json!({})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Email is required");
    }

    #[tokio::test]
    async fn unknown_api_routes_return_json_404() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token("/api/nope").await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "API route not found");
    }
}
