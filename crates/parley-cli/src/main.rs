use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use parley_api::HttpChatApi;
use parley_app::{
    ConversationListController, MessageExchangeController, RemovalOutcome, SendOutcome,
    SessionManager,
};
use parley_core::ParleyError;
use parley_core::config::ClientConfig;
use parley_store::{FileSessionStore, ParleyPaths};

mod logging;
mod render;

const COMMANDS: &[&str] = &[
    "/login",
    "/register",
    "/new",
    "/conversations",
    "/select",
    "/delete",
    "/attach",
    "/detach",
    "/whoami",
    "/logout",
    "/help",
    "/quit",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints
/// for slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
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

impl Hinter for CliHelper {
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

impl Validator for CliHelper {}

/// The three controllers composed the way the views nest: the session gates
/// everything, the conversation list drives the message view.
struct App {
    session: SessionManager,
    conversations: ConversationListController,
    exchange: MessageExchangeController,
    /// Display label for outgoing messages; cached so rendering stays
    /// synchronous.
    user_label: String,
}

impl App {
    fn new(api: Arc<HttpChatApi>, store: Arc<FileSessionStore>) -> Self {
        let session = SessionManager::new(api.clone(), store);
        let conversations = ConversationListController::new(api.clone(), session.handle());
        let exchange = MessageExchangeController::new(api, session.handle());
        Self {
            session,
            conversations,
            exchange,
            user_label: "you".to_string(),
        }
    }

    /// Uniform error reporting. A rejected token clears the session; the
    /// single logout policy lives here, next to the only component allowed
    /// to mutate the token. Bad credentials on login/register arrive as
    /// ordinary `Api` errors and take the plain-error path.
    async fn report(&mut self, err: ParleyError) {
        if err.is_unauthorized() {
            println!(
                "{}",
                "Session expired or not logged in. Use /login to continue.".yellow()
            );
            let _ = self.session.logout().await;
            self.reset_workspace();
        } else {
            println!("{}", format!("Error: {err}").red());
        }
    }

    fn reset_workspace(&mut self) {
        self.exchange.clear_messages();
        self.exchange.clear_attachment();
        self.user_label = "you".to_string();
    }

    /// Loads the conversation list and the selected thread's history after
    /// login or restore.
    async fn enter_workspace(&mut self) {
        if let Err(err) = self.conversations.refresh().await {
            self.report(err).await;
            return;
        }
        if let Some(id) = self.conversations.selected_id().map(str::to_string) {
            self.load_and_print_history(&id).await;
        } else {
            println!(
                "{}",
                "No conversations yet. Type a message to start one.".bright_black()
            );
        }
    }

    async fn load_and_print_history(&mut self, conversation_id: &str) {
        if let Err(err) = self.exchange.load_history(conversation_id).await {
            self.report(err).await;
            return;
        }
        self.print_messages();
    }

    fn print_messages(&self) {
        if self.exchange.messages().is_empty() {
            println!("{}", "(empty conversation)".bright_black());
            return;
        }
        for entry in self.exchange.messages() {
            render::print_entry(entry, &self.user_label);
        }
    }

    async fn login(&mut self, args: &[&str]) {
        let [email, password] = args else {
            println!("{}", "Usage: /login <email> <password>".yellow());
            return;
        };
        match self.session.login(email, password).await {
            Ok(session) => {
                println!(
                    "{}",
                    format!("Welcome back, {}!", session.user.full_name).bright_green()
                );
                self.user_label = session.user.full_name;
                self.enter_workspace().await;
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn register(&mut self, args: &[&str]) {
        if args.len() < 3 {
            println!(
                "{}",
                "Usage: /register <email> <password> <full name>".yellow()
            );
            return;
        }
        let (email, password) = (args[0], args[1]);
        let full_name = args[2..].join(" ");
        match self.session.register(email, password, &full_name).await {
            Ok(session) => {
                println!(
                    "{}",
                    format!("Account created. Welcome, {}!", session.user.full_name)
                        .bright_green()
                );
                self.user_label = session.user.full_name;
                self.enter_workspace().await;
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn logout(&mut self) {
        if let Err(err) = self.session.logout().await {
            self.report(err).await;
            return;
        }
        self.reset_workspace();
        println!("{}", "Logged out.".bright_green());
    }

    async fn whoami(&self) {
        match self.session.current().await {
            Some(session) => println!(
                "{} <{}>",
                session.user.full_name.bright_green(),
                session.user.email
            ),
            None => println!("{}", "Not logged in.".bright_black()),
        }
    }

    async fn list_conversations(&mut self) {
        if let Err(err) = self.conversations.refresh().await {
            self.report(err).await;
            return;
        }
        if self.conversations.is_empty() {
            println!("{}", "No conversations.".bright_black());
            return;
        }
        let selected = self.conversations.selected_id().map(str::to_string);
        for (index, conversation) in self.conversations.conversations().iter().enumerate() {
            let marker = if selected.as_deref() == Some(conversation.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "{} {:>2}. {}  {}",
                marker.bright_yellow(),
                index + 1,
                conversation.display_title(),
                conversation
                    .updated_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .bright_black()
            );
        }
    }

    /// Resolves a `/select` or `/delete` argument: a 1-based list index or a
    /// conversation id.
    fn resolve_conversation(&self, arg: &str) -> Option<String> {
        if let Ok(index) = arg.parse::<usize>() {
            if index >= 1 {
                return self
                    .conversations
                    .conversations()
                    .get(index - 1)
                    .map(|c| c.id.clone());
            }
        }
        self.conversations
            .conversations()
            .iter()
            .find(|c| c.id == arg)
            .map(|c| c.id.clone())
    }

    async fn select(&mut self, args: &[&str]) {
        let [arg] = args else {
            println!("{}", "Usage: /select <number|id>".yellow());
            return;
        };
        let Some(id) = self.resolve_conversation(arg) else {
            println!("{}", format!("No conversation matching '{arg}'").red());
            return;
        };
        if let Err(err) = self.conversations.select(&id) {
            self.report(err).await;
            return;
        }
        self.load_and_print_history(&id).await;
    }

    async fn create(&mut self, args: &[&str]) {
        let title = if args.is_empty() {
            None
        } else {
            Some(args.join(" "))
        };
        match self.conversations.create(title.as_deref()).await {
            Ok(conversation) => {
                self.exchange.clear_messages();
                println!(
                    "{}",
                    format!("Started '{}'", conversation.display_title()).bright_green()
                );
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn delete(&mut self, args: &[&str]) {
        let [arg] = args else {
            println!("{}", "Usage: /delete <number|id>".yellow());
            return;
        };
        let Some(id) = self.resolve_conversation(arg) else {
            println!("{}", format!("No conversation matching '{arg}'").red());
            return;
        };
        match self.conversations.remove(&id).await {
            Ok(RemovalOutcome::SelectionKept) => {
                println!("{}", "Conversation deleted.".bright_green());
            }
            Ok(RemovalOutcome::Reselected(Some(next))) => {
                println!("{}", "Conversation deleted.".bright_green());
                self.load_and_print_history(&next).await;
            }
            Ok(RemovalOutcome::Reselected(None)) => {
                self.exchange.clear_messages();
                println!("{}", "Conversation deleted. No conversations left.".bright_green());
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn attach(&mut self, args: &[&str]) {
        if args.is_empty() {
            println!("{}", "Usage: /attach <path>".yellow());
            return;
        }
        let path_text = args.join(" ");
        let path = Path::new(&path_text);
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                println!("{}", format!("Cannot read '{path_text}': {err}").red());
                return;
            }
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_text.clone());
        let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
        let size = bytes.len();

        match self.exchange.stage_attachment(file_name.clone(), mime_type.clone(), bytes) {
            Ok(()) => println!(
                "{}",
                format!("Staged {file_name} ({mime_type}, {} KB)", size / 1024).bright_green()
            ),
            Err(err) => self.report(err).await,
        }
    }

    fn detach(&mut self) {
        if self.exchange.staged_attachment().is_some() {
            self.exchange.clear_attachment();
            println!("{}", "Attachment removed.".bright_green());
        } else {
            println!("{}", "Nothing staged.".bright_black());
        }
    }

    async fn send(&mut self, text: &str) {
        if !self.session.handle().is_authenticated().await {
            println!("{}", "Log in first: /login <email> <password>".yellow());
            return;
        }
        match self.exchange.send(&mut self.conversations, text).await {
            Ok(SendOutcome::Sent) => {
                // The reply is the last confirmed entry.
                if let Some(entry) = self.exchange.messages().last() {
                    render::print_entry(entry, &self.user_label);
                }
            }
            Ok(SendOutcome::Ignored) => {}
            Err(err) => self.report(err).await,
        }
    }

    fn prompt(&self) -> String {
        match self.conversations.selected() {
            Some(conversation) => format!("{}> ", conversation.display_title()),
            None => "parley> ".to_string(),
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_magenta());
    println!("  /login <email> <password>            sign in");
    println!("  /register <email> <password> <name>  create an account");
    println!("  /conversations                       list threads (* = selected)");
    println!("  /new [title]                         start a conversation");
    println!("  /select <number|id>                  switch threads");
    println!("  /delete <number|id>                  delete a thread");
    println!("  /attach <path>                       stage a file for the next message");
    println!("  /detach                              unstage the file");
    println!("  /whoami                              show the logged-in user");
    println!("  /logout                              sign out");
    println!("  /quit                                exit");
    println!();
    println!("{}", "Anything else is sent as a message.".bright_black());
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config_path = ParleyPaths::config_file()?;
    let config = ClientConfig::load(&config_path)?;
    tracing::info!(base_url = %config.base_url, "client configured");
    let api = Arc::new(HttpChatApi::new(&config)?);
    let store = Arc::new(FileSessionStore::new()?);
    let mut app = App::new(api, store);

    println!("{}", "=== Parley ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Connected to {}", config.base_url).bright_black()
    );

    match app.session.restore().await? {
        Some(session) => {
            println!(
                "{}",
                format!("Welcome back, {}!", session.user.full_name).bright_green()
            );
            app.user_label = session.user.full_name;
            app.enter_workspace().await;
        }
        None => {
            println!(
                "{}",
                "Not logged in. /login <email> <password> or /register <email> <password> <name>."
                    .bright_black()
            );
        }
    }

    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    loop {
        let readline = rl.readline(&app.prompt());

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if let Some(rest) = trimmed.strip_prefix('/') {
                    let mut parts = rest.split_whitespace();
                    let command = parts.next().unwrap_or_default();
                    let args: Vec<&str> = parts.collect();

                    match command {
                        "login" => app.login(&args).await,
                        "register" => app.register(&args).await,
                        "logout" => app.logout().await,
                        "whoami" => app.whoami().await,
                        "conversations" => app.list_conversations().await,
                        "new" => app.create(&args).await,
                        "select" => app.select(&args).await,
                        "delete" => app.delete(&args).await,
                        "attach" => app.attach(&args).await,
                        "detach" => app.detach(),
                        "help" => print_help(),
                        "quit" | "exit" => {
                            println!("{}", "Goodbye!".bright_green());
                            break;
                        }
                        other => {
                            println!(
                                "{}",
                                format!("Unknown command '/{other}'. Try /help.").bright_black()
                            );
                        }
                    }
                } else {
                    app.send(trimmed).await;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
