use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::time::sleep;

use super::sessions::format_session_line;
use crate::app::App;
use chatline_core::chat::{ChatService, MessageRole};
use chatline_core::routing::{NavigationDecision, Route};

const COMMANDS: [&str; 6] = ["/new", "/sessions", "/switch", "/image", "/save", "/quit"];
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Rustyline helper that completes and highlights slash commands.
#[derive(Clone)]
struct ChatHelper {
    commands: Vec<String>,
}

impl ChatHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }

        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

/// A parsed line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    New,
    Sessions,
    Switch(&'a str),
    Image(&'a str),
    Save,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Input::Message(line);
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };
    match (command, argument) {
        ("/new", _) => Input::New,
        ("/sessions", _) => Input::Sessions,
        ("/switch", id) if !id.is_empty() => Input::Switch(id),
        ("/image", path) if !path.is_empty() => Input::Image(path),
        ("/save", _) => Input::Save,
        ("/quit" | "/exit", _) => Input::Quit,
        _ => Input::Unknown(command),
    }
}

/// Runs the interactive chat until `/quit` or EOF.
pub async fn run(app: &App) -> Result<()> {
    if let NavigationDecision::Redirect(route) = app.guard.before_each(Route::Chat.path()).await {
        println!(
            "{}",
            format!("Not logged in. Go to {} first: `chatline login <username>`", route).yellow()
        );
        return Ok(());
    }

    if let Err(e) = app.chat.load_sessions().await {
        println!("{}", format!("Could not load sessions: {}", e).yellow());
    }

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper::new()));

    println!("{}", "=== Chatline ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a message, or /new /sessions /switch <id> /image <path> /save /quit".bright_black()
    );
    println!();

    let mut pending_image: Option<String> = None;

    loop {
        let prompt = if pending_image.is_some() { "[img] >> " } else { ">> " };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        let input = parse_input(&line);
        if input == Input::Message("") {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        match input {
            Input::Message(text) => {
                let image = pending_image.take();
                stream_reply(&app.chat, text, image).await;
            }
            Input::New => {
                app.chat.create_new_session().await;
                println!("{}", "Started a new session".bright_black());
            }
            Input::Sessions => print_sessions(&app.chat).await,
            Input::Switch(id) => match app.chat.switch_session(id).await {
                Some(session) => {
                    println!("{}", format!("Switched to \"{}\"", session.title).bright_black());
                    print_history(&app.chat).await;
                }
                None => println!("{}", format!("No session with id {}", id).yellow()),
            },
            Input::Image(path) => match app.chat.upload_image(Path::new(path)).await {
                Ok(url) => {
                    println!("{}", format!("Image attached: {}", url).bright_black());
                    pending_image = Some(url);
                }
                Err(e) => println!("{}", format!("Upload failed: {}", e).red()),
            },
            Input::Save => match app.chat.current_session().await {
                Some(session) => match app.chat.save_session(&session).await {
                    Ok(()) => println!("{}", "Session saved".bright_black()),
                    Err(e) => println!("{}", format!("Save failed: {}", e).red()),
                },
                None => println!("{}", "Nothing to save".yellow()),
            },
            Input::Quit => break,
            Input::Unknown(command) => {
                println!("{}", format!("Unknown command {}", command).bright_black())
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

async fn print_sessions(chat: &ChatService) {
    let sessions = chat.sessions().await;
    if sessions.is_empty() {
        println!("{}", "No sessions yet".bright_black());
        return;
    }

    let current = chat.current_index().await;
    for (index, session) in sessions.iter().enumerate() {
        println!("{}", format_session_line(session, current == Some(index)));
    }
}

async fn print_history(chat: &ChatService) {
    let Some(session) = chat.current_session().await else {
        return;
    };
    for message in &session.messages {
        match message.role {
            MessageRole::User => println!("{}", format!("> {}", message.content).green()),
            MessageRole::Bot => println!("{}", message.content.bright_blue()),
        }
    }
}

/// Sends `text` and prints the bot message as it grows.
async fn stream_reply(chat: &Arc<ChatService>, text: &str, image_url: Option<String>) {
    let task = {
        let chat = Arc::clone(chat);
        let text = text.to_string();
        tokio::spawn(async move { chat.send_message(&text, image_url).await })
    };

    let mut shown = String::new();
    loop {
        let finished = task.is_finished();
        print_growth(chat, &mut shown).await;
        if finished {
            break;
        }
        sleep(POLL_INTERVAL).await;
    }
    println!();

    match task.await {
        Ok(Ok(summary)) if summary.failed => {
            println!("{}", "The bot reported an error".yellow())
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => println!("{}", format!("Error: {}", e).red()),
        Err(e) => println!("{}", format!("Reply task failed: {}", e).red()),
    }
}

// Prints the part of the last bot message not shown yet. A replaced message
// is printed again in full.
async fn print_growth(chat: &ChatService, shown: &mut String) {
    use std::io::Write;

    let Some(session) = chat.current_session().await else {
        return;
    };
    let Some(message) = session.messages.last().filter(|m| m.role == MessageRole::Bot) else {
        return;
    };

    let content = &message.content;
    let delta = match content.strip_prefix(shown.as_str()) {
        Some(delta) => delta.to_string(),
        None => {
            println!();
            content.clone()
        }
    };
    if !delta.is_empty() {
        print!("{}", delta.bright_blue());
        let _ = std::io::stdout().flush();
        *shown = content.clone();
    }
}
