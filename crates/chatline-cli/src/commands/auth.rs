use super::prompt;
use crate::app::App;
use anyhow::{Result, bail};
use chatline_core::auth::LoginOutcome;
use colored::Colorize;

pub async fn login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password")?,
    };

    match app.auth.login(username, &password).await {
        LoginOutcome::Success => {
            let count = app.chat.sessions().await.len();
            println!("{}", format!("Logged in as {}", username).bright_green());
            println!("{}", format!("{} session(s) loaded", count).bright_black());
            Ok(())
        }
        LoginOutcome::Failure { message } => bail!("{}", message),
    }
}

pub async fn mock_login(app: &App, username: &str) {
    match app.auth.mock_login(username).await {
        LoginOutcome::Success => {
            println!(
                "{}",
                format!("Logged in as {} (mock token, backend not contacted)", username)
                    .bright_yellow()
            );
        }
        LoginOutcome::Failure { message } => eprintln!("{}", message.red()),
    }
}

pub async fn register(
    app: &App,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password")?,
    };

    let user = app.auth.register(username, email, &password).await?;
    println!(
        "{}",
        format!("Registered {} <{}> (id {})", user.username, user.email, user.id).bright_green()
    );
    println!("{}", "Run `chatline login` to start chatting.".bright_black());
    Ok(())
}

pub async fn logout(app: &App) {
    app.auth.logout().await;
    println!("{}", "Logged out".bright_green());
}

pub async fn whoami(app: &App) {
    if !app.auth.is_authenticated().await {
        println!("{}", "Not logged in".yellow());
        return;
    }

    if app.auth.check_auth().await {
        if let Some(user) = app.auth.current_user().await {
            println!("{} <{}> (id {})", user.username.bold(), user.email, user.id);
        }
    } else {
        println!("{}", "Stored token was rejected; you have been logged out".yellow());
    }
}
