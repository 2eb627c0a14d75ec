use serde_json::json;

use crate::common::{REGISTRATION_FEE, TeamForm, TestApp, routes};

mod permissions {
    use super::*;

    #[tokio::test]
    async fn admin_routes_require_a_session() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::DASHBOARD).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn missing_permission_is_403_with_its_name() {
        let app = TestApp::spawn().await;
        let team_id = app.register_team("alpha").await;
        app.create_viewer("viewer@portal.test", "viewer-password").await;
        let token = app.login("viewer@portal.test", "viewer-password").await;

        let view = app.get_with_token(&routes::team(&team_id), &token).await;
        assert_eq!(view.status, 200, "{}", view.text);

        let res = app.delete_with_token(&routes::team(&team_id), &token).await;
        assert_eq!(res.status, 403);
        assert_eq!(
            res.body["message"],
            "Permission denied. Required permission: canDeleteTeams"
        );

        let stats = app.get_with_token(routes::STATS, &token).await;
        assert_eq!(stats.status, 403);
    }
}

mod teams {
    use super::*;

    #[tokio::test]
    async fn dashboard_lists_teams_with_revenue() {
        let app = TestApp::spawn().await;
        let alpha = app.register_team("alpha").await;
        app.team_with_submission("beta").await;
        let token = app.admin_token().await;
        app.patch_with_token(
            &routes::payment_status(&alpha),
            &json!({"status": "verified"}),
            &token,
        )
        .await;

        let res = app.get_with_token(routes::DASHBOARD, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let teams = res.body["teams"].as_array().unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0]["teamName"], "Team beta");
        assert_eq!(teams[0]["hasSubmission"], true);
        assert_eq!(teams[0]["members"].as_array().unwrap().len(), 6);
        assert_eq!(teams[0]["members"][0]["role"], "Leader");
        assert_eq!(teams[0]["members"][5]["role"], "Member 6");

        let stats = &res.body["stats"];
        assert_eq!(stats["totalTeams"], 2);
        assert_eq!(stats["totalSubmissions"], 1);
        assert_eq!(stats["pendingSubmissions"], 1);
        assert_eq!(stats["paidTeams"], 1);
        assert_eq!(stats["verifiedTeams"], 1);
        assert_eq!(stats["totalRevenue"], 2 * REGISTRATION_FEE);
    }

    #[tokio::test]
    async fn unknown_team_is_404() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .get_with_token(&routes::team("0190f5c2-0000-7000-8000-000000000000"), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Team not found");
    }

    #[tokio::test]
    async fn deleting_a_team_frees_its_emails() {
        let app = TestApp::spawn().await;
        let (team_id, _) = app.team_with_submission("alpha").await;
        let token = app.admin_token().await;

        let res = app.delete_with_token(&routes::team(&team_id), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Team deleted successfully");

        let gone = app.get_with_token(&routes::team(&team_id), &token).await;
        assert_eq!(gone.status, 404);

        let again = app.register_team("alpha").await;
        assert_ne!(again, team_id);
    }

    #[tokio::test]
    async fn payment_status_accepts_any_transition() {
        let app = TestApp::spawn().await;
        let team_id = app.register_team("alpha").await;
        let token = app.admin_token().await;

        for status in ["verified", "pending", "rejected", "paid"] {
            let res = app
                .patch_with_token(
                    &routes::payment_status(&team_id),
                    &json!({"status": status}),
                    &token,
                )
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["team"]["paymentStatus"], status);
        }

        let bad = app
            .patch_with_token(
                &routes::payment_status(&team_id),
                &json!({"status": "refunded"}),
                &token,
            )
            .await;
        assert_eq!(bad.status, 400);
    }

    #[tokio::test]
    async fn verification_mail_goes_to_the_leader() {
        let app = TestApp::spawn().await;
        let team_id = app.register_team("alpha").await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::SEND_VERIFICATION, &json!({"teamId": team_id}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body["message"],
            "Verification email sent successfully to Team alpha"
        );
        let last = app.mailer.sent().pop().unwrap();
        assert_eq!(last.to, TeamForm::leader_email_for("alpha"));
        assert!(last.text.contains("Team alpha"));

        let missing = app
            .post_with_token(routes::SEND_VERIFICATION, &json!({}), &token)
            .await;
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["message"], "Team ID is required");
    }

    #[tokio::test]
    async fn files_can_be_downloaded() {
        let app = TestApp::spawn().await;
        let (team_id, _) = app.team_with_submission("alpha").await;
        let token = app.admin_token().await;

        let ppt = app.get_with_token(&routes::team_ppt(&team_id), &token).await;
        assert_eq!(ppt.status, 200);
        assert_eq!(ppt.text, "%PDF-1.4 deck");
        assert_eq!(ppt.headers["content-type"], "application/pdf");
        assert!(
            ppt.headers["content-disposition"]
                .to_str()
                .unwrap()
                .contains("deck.pdf")
        );

        let shot = app
            .get_with_token(&routes::team_screenshot(&team_id), &token)
            .await;
        assert_eq!(shot.status, 200);
        assert_eq!(shot.headers["content-type"], "image/png");
    }

    #[tokio::test]
    async fn download_without_submission_is_404() {
        let app = TestApp::spawn().await;
        let team_id = app.register_team("alpha").await;
        let token = app.admin_token().await;

        let res = app.get_with_token(&routes::team_ppt(&team_id), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "PPT submission not found");
    }
}

mod review {
    use super::*;

    #[tokio::test]
    async fn review_records_reviewer_and_score() {
        let app = TestApp::spawn().await;
        let (_, submission_id) = app.team_with_submission("alpha").await;
        let token = app.admin_token().await;

        let res = app
            .put_with_token(
                &routes::review(submission_id),
                &json!({"status": "approved", "comments": "Clear plan", "score": 88}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "PPT review updated successfully");
        let submission = &res.body["submission"];
        assert_eq!(submission["status"], "approved");
        assert_eq!(submission["score"], 88);
        assert_eq!(submission["reviewComments"], "Clear plan");
        assert!(submission["reviewedBy"].is_number());
        assert!(submission["reviewDate"].is_string());
    }

    #[tokio::test]
    async fn review_bounds_are_enforced() {
        let app = TestApp::spawn().await;
        let (_, submission_id) = app.team_with_submission("alpha").await;
        let token = app.admin_token().await;

        let score = app
            .put_with_token(
                &routes::review(submission_id),
                &json!({"status": "approved", "score": 101}),
                &token,
            )
            .await;
        assert_eq!(score.status, 400);
        assert_eq!(score.body["message"], "Score must be between 0 and 100");

        let comments = app
            .put_with_token(
                &routes::review(submission_id),
                &json!({"status": "approved", "comments": "x".repeat(1001)}),
                &token,
            )
            .await;
        assert_eq!(comments.status, 400);
        assert_eq!(
            comments.body["message"],
            "Review comments cannot exceed 1000 characters"
        );
    }

    #[tokio::test]
    async fn reviewing_an_unknown_submission_is_404() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .put_with_token(&routes::review(9999), &json!({"status": "approved"}), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "PPT submission not found");
    }

    #[tokio::test]
    async fn submissions_can_be_filtered_searched_and_paged() {
        let app = TestApp::spawn().await;
        let (_, alpha) = app.team_with_submission("alpha").await;
        app.team_with_submission("beta").await;
        app.team_with_submission("gamma").await;
        let token = app.admin_token().await;
        app.put_with_token(&routes::review(alpha), &json!({"status": "rejected"}), &token)
            .await;

        let filtered = app
            .get_with_token(&format!("{}?status=rejected", routes::SUBMISSIONS), &token)
            .await;
        assert_eq!(filtered.status, 200, "{}", filtered.text);
        assert_eq!(filtered.body["pagination"]["total"], 1);
        assert_eq!(filtered.body["submissions"][0]["teamName"], "Team alpha");

        let searched = app
            .get_with_token(&format!("{}?search=GAMMA", routes::SUBMISSIONS), &token)
            .await;
        assert_eq!(searched.body["pagination"]["total"], 1);

        let paged = app
            .get_with_token(
                &format!("{}?limit=2&page=2&sortBy=teamName&sortOrder=asc", routes::SUBMISSIONS),
                &token,
            )
            .await;
        assert_eq!(paged.body["pagination"]["total"], 3);
        assert_eq!(paged.body["pagination"]["totalPages"], 2);
        assert_eq!(paged.body["submissions"][0]["teamName"], "Team gamma");

        let bad = app
            .get_with_token(&format!("{}?limit=0", routes::SUBMISSIONS), &token)
            .await;
        assert_eq!(bad.status, 400);
    }

    #[tokio::test]
    async fn stats_aggregate_reviews_and_payments() {
        let app = TestApp::spawn().await;
        let (_, alpha) = app.team_with_submission("alpha").await;
        let (_, beta) = app.team_with_submission("beta").await;
        app.register_team("gamma").await;
        let token = app.admin_token().await;
        app.put_with_token(
            &routes::review(alpha),
            &json!({"status": "approved", "score": 90}),
            &token,
        )
        .await;
        app.put_with_token(
            &routes::review(beta),
            &json!({"status": "rejected", "score": 70}),
            &token,
        )
        .await;

        let res = app.get_with_token(routes::STATS, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let ppt = &res.body["pptSubmissions"];
        assert_eq!(ppt["total"], 2);
        assert_eq!(ppt["late"], 0);
        assert_eq!(ppt["byStatus"]["approved"], 1);
        assert_eq!(ppt["byStatus"]["rejected"], 1);
        assert_eq!(ppt["byStatus"]["submitted"], 0);
        assert_eq!(ppt["averageScore"], 80.0);

        let payments = res.body["payments"].as_array().unwrap();
        let paid = payments.iter().find(|p| p["status"] == "paid").unwrap();
        assert_eq!(paid["count"], 3);
        assert_eq!(paid["totalAmount"], 3 * REGISTRATION_FEE);
    }
}
