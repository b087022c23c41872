//! Line-oriented front end over [`AppController`].
//!
//! Every user action is parsed into a [`Command`] and, where it touches
//! application state, forwarded as an [`Intent`]. Settings edits go into a
//! draft that only takes effect on `/save`.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use gemchat_core::{AppConfig, AppController, ChatError, Intent, Outcome, SendOutcome};

use crate::render::{render_chat_list, render_message, render_transcript};

const HELP: &str = "\
Commands:
  /new [name]          create and select a chat
  /list                list chats (* marks the selected one)
  /select <n|name>     select a chat by list number or name
  /show                print the selected chat
  /delete              delete the selected chat (asks for confirmation)
  /attach <path>       attach a file to the next message
  /detach              clear pending attachments
  /settings            show the settings draft
  /set <key> <value>   edit the draft (api_key, model, temperature, max_tokens,
                       top_p, top_k, system, filters)
  /save                save the draft and reconnect
  /reset               discard the draft and reload saved settings
  /status              show model and filter status
  /help                show this help
  /quit                exit
Anything else is sent as a message to the selected chat; start it with //
to send a message that begins with a slash.
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New(Option<String>),
    List,
    Select(String),
    Show,
    Delete,
    Attach(PathBuf),
    Detach,
    Settings,
    Set { key: String, value: String },
    Save,
    Reset,
    Status,
    Help,
    Quit,
    Message(String),
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let message = line.trim_end_matches(['\r', '\n']);
    // `//` sends a message that starts with a literal slash
    if trimmed.starts_with("//") {
        return Command::Message(message.replacen("//", "/", 1));
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Message(message.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match (name, arg) {
        ("new", "") => Command::New(None),
        ("new", name) => Command::New(Some(name.to_string())),
        ("list" | "ls", _) => Command::List,
        ("select", "") => Command::Invalid("Usage: /select <n|name>".to_string()),
        ("select", target) => Command::Select(target.to_string()),
        ("show", _) => Command::Show,
        ("delete", _) => Command::Delete,
        ("attach", "") => Command::Invalid("Usage: /attach <path>".to_string()),
        ("attach", path) => Command::Attach(PathBuf::from(path)),
        ("detach", _) => Command::Detach,
        ("settings", _) => Command::Settings,
        ("set", arg) => match arg.split_once(char::is_whitespace) {
            Some((key, value)) => Command::Set {
                key: key.to_string(),
                value: value.trim().to_string(),
            },
            None if !arg.is_empty() => Command::Set {
                key: arg.to_string(),
                value: String::new(),
            },
            None => Command::Invalid("Usage: /set <key> <value>".to_string()),
        },
        ("save", _) => Command::Save,
        ("reset", _) => Command::Reset,
        ("status", _) => Command::Status,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        (other, _) => Command::Invalid(format!(
            "Unknown command: /{} (start with // to send a message beginning with /)",
            other
        )),
    }
}

/// Apply one `/set` edit to a settings draft
pub fn apply_setting(draft: &mut AppConfig, key: &str, value: &str) -> Result<(), String> {
    fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
        value
            .parse()
            .map_err(|_| format!("Invalid value for {}: {}", key, value))
    }

    match key {
        "api_key" | "key" => draft.api_key = value.to_string(),
        "model" => draft.model_name = value.to_string(),
        "temperature" => draft.temperature = parse(key, value)?,
        "max_tokens" => draft.max_tokens = parse(key, value)?,
        "top_p" => draft.top_p = parse(key, value)?,
        "top_k" => draft.top_k = parse(key, value)?,
        "system" => draft.system_instruction = value.to_string(),
        "filters" => {
            draft.enable_safety_filters = match value {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                _ => return Err(format!("Invalid value for filters: {} (on/off)", value)),
            }
        }
        _ => return Err(format!("Unknown setting: {}", key)),
    }
    Ok(())
}

fn mask_key(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else {
        let skip = key.chars().count().saturating_sub(4);
        format!("****{}", key.chars().skip(skip).collect::<String>())
    }
}

fn describe_error(e: &ChatError) -> String {
    match e {
        ChatError::NotConfigured => {
            "No API key configured. Use /set api_key <key> and /save.".to_string()
        }
        ChatError::NoActiveConversation => {
            "No chat selected. Use /new or /select first.".to_string()
        }
        other => other.to_string(),
    }
}

pub struct Repl {
    app: AppController,
    draft: AppConfig,
    pending_attachments: Vec<PathBuf>,
    pending_delete: Option<String>,
}

impl Repl {
    pub fn new(app: AppController) -> Self {
        let draft = app.config().clone();
        Self {
            app,
            draft,
            pending_attachments: Vec::new(),
            pending_delete: None,
        }
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        writeln!(out, "gemchat | {}", self.app.status_line())?;
        if !self.app.config().has_api_key() {
            writeln!(out, "No API key configured. Use /set api_key <key> and /save.")?;
        }
        writeln!(out, "Type /help for commands.")?;

        for line in input.lines() {
            let line = line?;
            if !self.handle_line(&line, &mut out)? {
                break;
            }
            out.flush()?;
        }
        Ok(())
    }

    /// Returns `false` when the session should end
    fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<bool> {
        if let Some(id) = self.pending_delete.take() {
            if matches!(line.trim(), "y" | "Y" | "yes") {
                self.report(Intent::DeleteConversation { id }, out)?;
            } else {
                writeln!(out, "Delete cancelled.")?;
            }
            return Ok(true);
        }

        match parse_command(line) {
            Command::Quit => return Ok(false),
            Command::Help => write!(out, "{}", HELP)?,
            Command::Invalid(message) => writeln!(out, "{}", message)?,
            Command::New(name) => {
                let name = name.unwrap_or_else(|| self.app.directory().suggested_name());
                self.pending_attachments.clear();
                self.report(Intent::CreateConversation { name }, out)?;
            }
            Command::List => {
                let entries = self.app.directory().entries();
                write!(out, "{}", render_chat_list(&entries, self.app.active_id()))?;
            }
            Command::Select(target) => match self.resolve(&target) {
                Some(id) => {
                    self.pending_attachments.clear();
                    self.report(Intent::SelectConversation { id }, out)?;
                }
                None => writeln!(out, "No chat matches '{}'.", target)?,
            },
            Command::Show => match self.app.active_conversation() {
                Some(conversation) => write!(out, "{}", render_transcript(&conversation))?,
                None => writeln!(out, "No chat selected.")?,
            },
            Command::Delete => match self.app.active_conversation() {
                Some(conversation) => {
                    writeln!(out, "Delete '{}'? [y/N]", conversation.name())?;
                    self.pending_delete = Some(conversation.id().to_string());
                }
                None => writeln!(out, "No chat selected.")?,
            },
            Command::Attach(path) => {
                writeln!(out, "📎 {}", path.display())?;
                self.pending_attachments.push(path);
            }
            Command::Detach => {
                self.pending_attachments.clear();
                writeln!(out, "Attachments cleared.")?;
            }
            Command::Settings => {
                let d = &self.draft;
                writeln!(out, "api_key      {}", mask_key(&d.api_key))?;
                writeln!(out, "model        {}", d.model_name)?;
                writeln!(out, "temperature  {}", d.temperature)?;
                writeln!(out, "max_tokens   {}", d.max_tokens)?;
                writeln!(out, "top_p        {}", d.top_p)?;
                writeln!(out, "top_k        {}", d.top_k)?;
                writeln!(out, "system       {}", d.system_instruction)?;
                writeln!(
                    out,
                    "filters      {}",
                    if d.enable_safety_filters { "on" } else { "off" }
                )?;
            }
            Command::Set { key, value } => match apply_setting(&mut self.draft, &key, &value) {
                Ok(()) => writeln!(out, "{} updated (use /save to apply)", key)?,
                Err(message) => writeln!(out, "{}", message)?,
            },
            Command::Save => self.report(Intent::SaveConfig(self.draft.clone()), out)?,
            Command::Reset => {
                self.report(Intent::ResetConfig, out)?;
                self.draft = self.app.config().clone();
            }
            Command::Status => writeln!(out, "{}", self.app.status_line())?,
            Command::Message(text) => {
                let attachments = std::mem::take(&mut self.pending_attachments);
                self.report(Intent::SendMessage { text, attachments }, out)?;
            }
        }
        Ok(true)
    }

    /// List number (1-based) first, then display name
    fn resolve(&self, target: &str) -> Option<String> {
        let entries = self.app.directory().entries();
        if let Ok(n) = target.parse::<usize>()
            && let Some((id, _)) = n.checked_sub(1).and_then(|i| entries.get(i))
        {
            return Some(id.clone());
        }
        self.app.directory().resolve_name(target)
    }

    fn report<W: Write>(&mut self, intent: Intent, out: &mut W) -> Result<()> {
        match self.app.dispatch(intent) {
            Ok(outcome) => self.print_outcome(outcome, out),
            Err(e) => {
                writeln!(out, "Error: {}", describe_error(&e))?;
                Ok(())
            }
        }
    }

    fn print_outcome<W: Write>(&self, outcome: Outcome, out: &mut W) -> Result<()> {
        match outcome {
            Outcome::Created { session_error, .. } | Outcome::Selected { session_error, .. } => {
                if let Some(conversation) = self.app.active_conversation() {
                    write!(out, "{}", render_transcript(&conversation))?;
                }
                if let Some(e) = session_error {
                    writeln!(out, "Session not ready: {}", describe_error(&e))?;
                }
            }
            Outcome::Deleted { existed, .. } => {
                if existed {
                    writeln!(out, "Chat deleted.")?;
                } else {
                    writeln!(out, "Chat was already gone.")?;
                }
            }
            Outcome::Sent(SendOutcome::Ignored) => {}
            Outcome::Sent(SendOutcome::Replied { .. }) => {
                if let Some(conversation) = self.app.active_conversation() {
                    let messages = conversation.messages();
                    let start = messages.len().saturating_sub(2);
                    for message in &messages[start..] {
                        write!(out, "{}", render_message(message))?;
                    }
                }
            }
            Outcome::ConfigSaved {
                persisted,
                session_error,
            } => {
                if persisted {
                    writeln!(out, "Settings saved. {}", self.app.status_line())?;
                } else {
                    writeln!(out, "Settings applied but could not be written to disk.")?;
                }
                if let Some(e) = session_error {
                    writeln!(out, "Session not ready: {}", describe_error(&e))?;
                }
            }
            Outcome::ConfigReset => {
                writeln!(out, "Settings reloaded. {}", self.app.status_line())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gemchat_core::ConversationsStore;
    use gemchat_core::controllers::ConnectorBuilder;
    use gemchat_core::repositories::{
        ConversationJsonRepository, SettingsJsonRepository, SettingsRepository,
    };

    fn no_network() -> ConnectorBuilder {
        Box::new(|_| None)
    }

    fn app_in(dir: &std::path::Path) -> AppController {
        let settings = Arc::new(SettingsJsonRepository::with_path(dir.join("config.json")));
        settings
            .save(&AppConfig {
                api_key: String::new(),
                ..AppConfig::default()
            })
            .unwrap();
        let store = Arc::new(ConversationsStore::load(Arc::new(
            ConversationJsonRepository::with_path(dir.join("chats.json")),
        )));
        AppController::new(settings, store, no_network())
    }

    fn run_script(dir: &std::path::Path, script: &str) -> String {
        let mut out = Vec::new();
        Repl::new(app_in(dir)).run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/new"), Command::New(None));
        assert_eq!(parse_command("/new  Trip plans "), Command::New(Some("Trip plans".into())));
        assert_eq!(parse_command("/select 2"), Command::Select("2".into()));
        assert_eq!(
            parse_command("/set system Be brief."),
            Command::Set {
                key: "system".into(),
                value: "Be brief.".into()
            }
        );
        assert_eq!(parse_command("/attach ./a b.png"), Command::Attach("./a b.png".into()));
        assert_eq!(parse_command("hello there"), Command::Message("hello there".into()));
        assert!(matches!(parse_command("/bogus"), Command::Invalid(_)));
        assert_eq!(
            parse_command("//usr/bin is full?"),
            Command::Message("/usr/bin is full?".into())
        );
        assert!(matches!(parse_command("/select"), Command::Invalid(_)));
    }

    #[test]
    fn test_apply_setting() {
        let mut draft = AppConfig::default();
        apply_setting(&mut draft, "temperature", "0.2").unwrap();
        apply_setting(&mut draft, "top_k", "10").unwrap();
        apply_setting(&mut draft, "filters", "off").unwrap();
        apply_setting(&mut draft, "model", "gemini-pro").unwrap();

        assert_eq!(draft.temperature, 0.2);
        assert_eq!(draft.top_k, 10);
        assert!(!draft.enable_safety_filters);
        assert_eq!(draft.model_name, "gemini-pro");

        assert!(apply_setting(&mut draft, "top_k", "many").is_err());
        assert!(apply_setting(&mut draft, "filters", "maybe").is_err());
        assert!(apply_setting(&mut draft, "colour", "red").is_err());
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(""), "(not set)");
        assert_eq!(mask_key("abcdef123456"), "****3456");
    }

    #[test]
    fn test_send_without_key_reports_and_persists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let output = run_script(tmp.path(), "/new Notes\nhello\n/quit\n");

        assert!(output.contains("💬 Notes"));
        assert!(output.contains("No API key configured"));

        let store = ConversationsStore::load(Arc::new(ConversationJsonRepository::with_path(
            tmp.path().join("chats.json"),
        )));
        assert_eq!(store.list_names(), vec!["Notes".to_string()]);
        let id = store.entries()[0].0.clone();
        assert!(store.get_messages(&id).is_empty());
    }

    #[test]
    fn test_double_slash_is_sent_as_message() {
        let tmp = tempfile::tempdir().unwrap();
        let output = run_script(tmp.path(), "/new Ops\n//usr/bin is full?\n");

        assert!(!output.contains("Unknown command"));
        assert!(output.contains("Error: No API key configured"));
    }

    #[test]
    fn test_send_without_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let output = run_script(tmp.path(), "hello\n");
        assert!(output.contains("No chat selected"));
    }

    #[test]
    fn test_select_by_number_and_name() {
        let tmp = tempfile::tempdir().unwrap();
        let output = run_script(
            tmp.path(),
            "/new Alpha\n/new Beta\n/select 1\n/list\n/select Beta\n/list\n/select 9\n",
        );

        assert!(output.contains("*  1. Alpha\n   2. Beta\n"));
        assert!(output.contains("   1. Alpha\n*  2. Beta\n"));
        assert!(output.contains("No chat matches '9'."));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let tmp = tempfile::tempdir().unwrap();
        let output = run_script(tmp.path(), "/new Keep\n/delete\nn\n/delete\nyes\n/list\n");

        assert!(output.contains("Delete cancelled."));
        assert!(output.contains("Chat deleted."));
        assert!(output.contains("No chats yet."));
    }

    #[test]
    fn test_settings_draft_applies_on_save() {
        let tmp = tempfile::tempdir().unwrap();
        let output = run_script(tmp.path(), "/set model gemini-pro\n/status\n/save\n");

        assert!(output.contains("Model: gemini-3-flash-preview | Filters: on"));
        assert!(output.contains("Settings saved. Model: gemini-pro | Filters: on"));

        let saved = SettingsJsonRepository::with_path(tmp.path().join("config.json"))
            .load()
            .unwrap();
        assert_eq!(saved.model_name, "gemini-pro");
    }

    #[test]
    fn test_reset_discards_draft() {
        let tmp = tempfile::tempdir().unwrap();
        let output = run_script(tmp.path(), "/set filters off\n/reset\n/settings\n");

        assert!(output.contains("Settings reloaded. Model: gemini-3-flash-preview | Filters: on"));
        assert!(output.contains("filters      on"));
    }
}
