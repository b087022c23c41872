use gemchat_core::{Conversation, Message, Role};

const SEPARATOR_WIDTH: usize = 80;

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "[YOU]",
        Role::Model => "[GEMINI]",
    }
}

pub fn render_message(message: &Message) -> String {
    let attachments = if message.has_attachments() {
        format!(" 📎({})", message.attachments.len())
    } else {
        String::new()
    };

    format!(
        "{} {}{}\n{}\n\n{}\n\n",
        message.timestamp.format("%H:%M"),
        role_label(message.role),
        attachments,
        message.content,
        "=".repeat(SEPARATOR_WIDTH)
    )
}

pub fn render_transcript(conversation: &Conversation) -> String {
    let mut out = format!(
        "💬 {} (started {})\n\n",
        conversation.name(),
        conversation.created_at().format("%Y-%m-%d %H:%M")
    );
    for message in conversation.messages() {
        out.push_str(&render_message(message));
    }
    out
}

/// Numbered chat list, marking the active entry
pub fn render_chat_list(entries: &[(String, String)], active_id: Option<&str>) -> String {
    if entries.is_empty() {
        return "No chats yet. Create one with /new <name>.\n".to_string();
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, (id, name))| {
            let marker = if Some(id.as_str()) == active_id { '*' } else { ' ' };
            format!("{} {:>2}. {}\n", marker, i + 1, name)
        })
        .collect()
}
