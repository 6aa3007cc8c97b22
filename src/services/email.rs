// src/services/email.rs
use super::mail::MailMessage;

/// Marker replaced by the action link
const URL_PLACEHOLDER: &str = "{URL}";

const EMAIL_VERIFICATION_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background-color: #4F46E5; color: white; padding: 20px; text-align: center; }
        .content { padding: 20px; background-color: #f9f9f9; }
        .footer { padding: 20px; text-align: center; font-size: 12px; color: #666; }
        .button { display: inline-block; padding: 12px 24px; background-color: #4F46E5; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Verify your email</h1>
        </div>
        <div class="content">
            <p>Thanks for signing up! Please confirm your email address to activate your account.</p>
            <p><a class="button" href="{URL}">Verify email</a></p>
            <p>This link expires in 24 hours. If you did not create an account, you can ignore this email.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#;

const PASSWORD_RESET_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background-color: #6B7280; color: white; padding: 20px; text-align: center; }
        .content { padding: 20px; background-color: #f9f9f9; }
        .footer { padding: 20px; text-align: center; font-size: 12px; color: #666; }
        .button { display: inline-block; padding: 12px 24px; background-color: #6B7280; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Reset your password</h1>
        </div>
        <div class="content">
            <p>We received a request to reset your password.</p>
            <p><a class="button" href="{URL}">Choose a new password</a></p>
            <p>This link expires in 15 minutes. Resetting your password signs you out of every device.</p>
            <p>If you did not request a reset, you can ignore this email.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#;

pub fn verification_email(to: &str, url: &str) -> MailMessage {
    MailMessage::new(
        to,
        "Email verification",
        EMAIL_VERIFICATION_TEMPLATE.replace(URL_PLACEHOLDER, url),
    )
}

pub fn password_reset_email(to: &str, url: &str) -> MailMessage {
    MailMessage::new(
        to,
        "Password reset",
        PASSWORD_RESET_TEMPLATE.replace(URL_PLACEHOLDER, url),
    )
}
