use common::OtpPurpose;

use super::MailMessage;

pub fn otp(
    to: &str,
    name: &str,
    code: &str,
    purpose: OtpPurpose,
    ttl_minutes: i64,
) -> MailMessage {
    let subject = format!("Your {} OTP", purpose.describe());
    let text = format!(
        "Hello {name},\n\n\
         Your verification code for {} is {code}.\n\
         It expires in {ttl_minutes} minutes. If you did not request it, ignore this email.",
        purpose.describe()
    );
    let html = format!(
        "<p>Hello {},</p>\
         <p>Your verification code for <strong>{}</strong> is:</p>\
         <h2 style=\"letter-spacing:4px\">{code}</h2>\
         <p>It expires in {ttl_minutes} minutes. If you did not request it, ignore this email.</p>",
        escape(name),
        escape(purpose.describe())
    );
    MailMessage {
        to: to.to_string(),
        subject,
        text,
        html,
    }
}

/// Sent when staff confirm a team's payment.
pub fn team_verified(to: &str, leader_name: &str, team_name: &str) -> MailMessage {
    let text = format!(
        "Hello {leader_name},\n\n\
         Your team \"{team_name}\" has been verified and your payment confirmed. \
         Watch this inbox for further updates about the event."
    );
    let html = format!(
        "<p>Hello {},</p>\
         <p>Your team <strong>{}</strong> has been verified and your payment confirmed.</p>\
         <p>Watch this inbox for further updates about the event.</p>",
        escape(leader_name),
        escape(team_name)
    );
    MailMessage {
        to: to.to_string(),
        subject: format!("Team {team_name} verified"),
        text,
        html,
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
