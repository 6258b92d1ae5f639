use crate::app::App;
use anyhow::Result;
use chatline_core::chat::ChatSession;
use chatline_core::routing::NavigationDecision;
use chrono::Local;
use colored::Colorize;

pub fn format_session_line(session: &ChatSession, is_current: bool) -> String {
    let marker = if is_current { "*" } else { " " };
    let id = if session.is_persisted() {
        session.id.as_str()
    } else {
        "(unsaved)"
    };
    format!(
        "{} {:<38} {:<24} {:>3} msg  {}",
        marker,
        id,
        session.title,
        session.messages.len(),
        session
            .updated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    )
}

pub async fn list(app: &App) -> Result<()> {
    let count = app.chat.load_sessions().await?;
    if count == 0 {
        println!("{}", "No sessions yet".bright_black());
        return Ok(());
    }

    for session in app.chat.sessions().await {
        println!("{}", format_session_line(&session, false));
    }
    Ok(())
}

pub async fn delete(app: &App, session_id: &str) -> Result<()> {
    app.chat.delete_session(session_id).await?;
    println!("{}", format!("Deleted session {}", session_id).bright_green());
    Ok(())
}

pub async fn open(app: &App, path: &str) {
    match app.guard.before_each(path).await {
        NavigationDecision::Proceed => println!("{}", format!("{} → proceed", path).green()),
        NavigationDecision::Redirect(route) => {
            println!("{}", format!("{} → redirect to {}", path, route).yellow())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_line_marks_current() {
        let mut session = ChatSession::new();
        session.id = "abc".to_string();

        let current = format_session_line(&session, true);
        let other = format_session_line(&session, false);

        assert!(current.starts_with("* abc"));
        assert!(other.starts_with("  abc"));
        assert!(current.contains("0 msg"));
    }

    #[test]
    fn test_session_line_labels_unsaved_session() {
        let session = ChatSession::new();

        let line = format_session_line(&session, true);

        assert!(line.starts_with("* (unsaved)"));
    }
}
