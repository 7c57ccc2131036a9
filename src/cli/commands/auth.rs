use clap::Subcommand;
use serde_json::json;

use crate::api::auth::{ChangePasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::cli::utils::{output_success, output_value, read_secret, report_failure, require_login};
use crate::cli::OutputFormat;
use crate::console::Console;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with username or email")]
    Login {
        #[arg(help = "Username or email")]
        account: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Exchange the refresh token for a new access token")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Display name")]
        nickname: Option<String>,
    },

    #[command(about = "Change the password of the signed-in user")]
    ChangePassword {
        #[arg(long, help = "Current password (read from stdin if not provided)")]
        old_password: Option<String>,
        #[arg(long, help = "New password (read from stdin if not provided)")]
        new_password: Option<String>,
    },

    #[command(about = "Reset a password by email")]
    ResetPassword {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "New password (read from stdin if not provided)")]
        new_password: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, console: &mut Console, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { account, password } => {
            let password = read_secret(password, "Password")?;
            let request = LoginRequest { account, password };
            let user = match console.login(&request).await {
                Ok(user) => user,
                Err(e) => return Err(report_failure(console, &output_format, e).await),
            };
            output_success(
                &output_format,
                &format!("Logged in as {}", user.display_name()),
                Some(json!({ "user": user })),
            )
        }
        AuthCommands::Logout => {
            console.logout().await?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let session = &console.session;
            let status = json!({
                "authenticated": session.has_stored_token(),
                "user": session.user_profile().map(|u| u.username.clone()),
                "login_at": session.login_at(),
                "has_refresh_token": !session.refresh_token().is_empty(),
            });
            output_value(&output_format, &status, || match session.user_profile() {
                Some(user) if session.has_stored_token() => match session.login_at() {
                    Some(at) => format!("Logged in as {} since {}", user.display_name(), at.to_rfc3339()),
                    None => format!("Logged in as {}", user.display_name()),
                },
                _ if session.has_stored_token() => "Logged in".to_string(),
                _ => "Not logged in".to_string(),
            })
        }
        AuthCommands::Refresh => {
            require_login(console)?;
            if let Err(e) = console.session.refresh().await {
                return Err(report_failure(console, &output_format, e).await);
            }
            output_success(&output_format, "Access token refreshed", None)
        }
        AuthCommands::Whoami => {
            require_login(console)?;
            let fetched = console.session.fetch_profile().await.cloned();
            let user = match fetched {
                Ok(user) => user,
                Err(e) => return Err(report_failure(console, &output_format, e).await),
            };
            let value = serde_json::to_value(&user)?;
            output_value(&output_format, &value, || {
                let mut lines = vec![format!("User: {} (#{})", user.display_name(), user.id)];
                if let Some(email) = &user.email {
                    lines.push(format!("Email: {}", email));
                }
                if !user.roles.is_empty() {
                    lines.push(format!("Roles: {}", user.roles.join(", ")));
                }
                lines.join("\n")
            })
        }
        AuthCommands::Register {
            username,
            email,
            password,
            nickname,
        } => {
            let password = read_secret(password, "Password")?;
            let request = RegisterRequest {
                username: username.clone(),
                email,
                confirm_password: password.clone(),
                password,
                nickname,
            };
            if let Err(e) = console.session.register(&request).await {
                return Err(report_failure(console, &output_format, e).await);
            }
            output_success(&output_format, &format!("Registered {}", username), None)
        }
        AuthCommands::ChangePassword {
            old_password,
            new_password,
        } => {
            require_login(console)?;
            let old_password = read_secret(old_password, "Current password")?;
            let new_password = read_secret(new_password, "New password")?;
            let request = ChangePasswordRequest {
                old_password,
                confirm_password: new_password.clone(),
                new_password,
            };
            if let Err(e) = console.session.change_password(&request).await {
                return Err(report_failure(console, &output_format, e).await);
            }
            output_success(&output_format, "Password changed", None)
        }
        AuthCommands::ResetPassword { email, new_password } => {
            let new_password = read_secret(new_password, "New password")?;
            let request = ResetPasswordRequest {
                email,
                confirm_password: new_password.clone(),
                new_password,
            };
            if let Err(e) = console.session.reset_password(&request).await {
                return Err(report_failure(console, &output_format, e).await);
            }
            output_success(&output_format, "Password reset", None)
        }
    }
}
