//! Message formatting utilities for client display.

use hiroba_shared::time::iso8601_to_jst_display;

use crate::domain::{
    ChatEntry, ConnectionState, Contact, Conversation, DeliveryStatus, Inbox, Presence,
};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the connection status line
    ///
    /// # Arguments
    ///
    /// * `state` - Current connection state
    /// * `queued` - Number of chats waiting in the offline queue
    pub fn format_status(state: ConnectionState, queued: usize) -> String {
        let label = match state {
            ConnectionState::Disconnected => {
                format!("{}, reconnecting automatically", state)
            }
            _ => state.to_string(),
        };
        if queued == 0 {
            format!("[status] {}", label)
        } else {
            format!("[status] {} ({} queued)", label, queued)
        }
    }

    /// Format the identity assigned by the relay
    pub fn format_identified(me: &Contact) -> String {
        format!("\nYou are {} ({})\n", me.name, me.id)
    }

    /// Format a roster update
    pub fn format_contacts(contacts: &[Contact]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nOnline:\n", RULE));

        if contacts.is_empty() {
            output.push_str("(No one else is here)\n");
        } else {
            for contact in contacts {
                output.push_str(&format!("{} ({})\n", contact.name, contact.id));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format contacts and conversations with unread counts
    pub fn format_inbox(inbox: &Inbox) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nContacts:\n", RULE));

        let mut listed = Vec::new();
        for contact in inbox.contacts() {
            output.push_str(&Self::format_contact_line(
                contact,
                inbox.unread_count(&contact.id),
                inbox.active() == Some(contact.id.as_str()),
            ));
            listed.push(contact.id.as_str());
        }
        for conversation in inbox.conversations() {
            if !listed.contains(&conversation.contact.id.as_str()) {
                output.push_str(&Self::format_contact_line(
                    &conversation.contact,
                    conversation.unread_count,
                    inbox.active() == Some(conversation.contact.id.as_str()),
                ));
            }
        }
        if inbox.contacts().is_empty() && inbox.conversations().next().is_none() {
            output.push_str("(No contacts)\n");
        }

        output.push_str(&format!("unread: {}\n{}\n", inbox.total_unread(), RULE));
        output
    }

    fn format_contact_line(contact: &Contact, unread: usize, active: bool) -> String {
        let marker = if active { "*" } else { " " };
        let presence = match contact.presence {
            Presence::Online => "online".to_string(),
            Presence::Offline => format!(
                "last seen {}",
                iso8601_to_jst_display(&contact.last_seen)
            ),
        };
        let unread = if unread > 0 {
            format!(" [{} unread]", unread)
        } else {
            String::new()
        };
        format!(
            "{} {} ({}) - {}{}\n",
            marker, contact.name, contact.id, presence, unread
        )
    }

    /// Format the history of a conversation
    pub fn format_conversation(conversation: &Conversation) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "\n{}\nConversation with {} ({})\n",
            RULE, conversation.contact.name, conversation.contact.id
        ));

        if conversation.messages.is_empty() {
            output.push_str("(No messages)\n");
        }
        for message in &conversation.messages {
            output.push_str(&format!(
                "[{}] {}: {} ({})\n",
                iso8601_to_jst_display(&message.timestamp),
                message.sender_name,
                message.content,
                Self::status_label(message.status)
            ));
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format a received chat message
    pub fn format_chat_message(message: &ChatEntry) -> String {
        format!(
            "\n\n{}\n@{}: {}\nsent at {}\n{}\n",
            THIN_RULE,
            message.sender_name,
            message.content,
            iso8601_to_jst_display(&message.timestamp),
            THIN_RULE
        )
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(message: &ChatEntry) -> String {
        format!(
            "sent at {}\n",
            iso8601_to_jst_display(&message.timestamp)
        )
    }

    fn status_label(status: DeliveryStatus) -> &'static str {
        match status {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }
}
