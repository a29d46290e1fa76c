use travelmapp_core::auth::SignUpOutcome;
use travelmapp_core::ClientConfig;

use crate::auth::SupabaseAuthService;
use crate::cli::AuthCommands;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let auth_service = SupabaseAuthService::from_config(&config)?;

    match command {
        AuthCommands::Signup { email, password } => {
            match auth_service.sign_up(&email, &password).await? {
                SignUpOutcome::SignedIn(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!("Account created, signed in as {email_label}");
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!("Account created. Check {email} to confirm it, then run `travelmapp auth login`.");
                }
            }
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let session = auth_service.sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in as {email_label}");
            Ok(())
        }
        AuthCommands::Status => {
            if let Some(session) = auth_service.restore_session().await? {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Signed in as {} (user_id={}, expires_at={})",
                    email_label, session.user.id, session.expires_at
                );
            } else {
                println!("Not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            if let Some(session) = auth_service.stored_session()? {
                auth_service.sign_out(&session.access_token).await?;
            } else {
                auth_service.clear_stored_session()?;
            }
            println!("Signed out");
            Ok(())
        }
    }
}
