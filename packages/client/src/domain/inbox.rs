//! Contacts and conversations held by the client.
//!
//! Conversations are keyed by the peer's identity id. Incoming chat is filed
//! under its sender; local echoes are filed under the conversation they were
//! sent from.

use std::collections::BTreeMap;

use hiroba_server::infrastructure::dto::websocket::{ChatEventDto, UserDto};

/// メッセージの配送状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// 自分が送信したローカルエコー
    Sent,
    /// 相手から受信した
    Delivered,
    /// 既読にした
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Online,
    Offline,
}

/// 連絡先（他のセッションの Identity）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    /// 最後にロスターで確認した時刻（ISO-8601）
    pub last_seen: String,
    pub presence: Presence,
}

impl Contact {
    fn online(user: UserDto, now: &str) -> Self {
        Self {
            id: user.id,
            name: user.name,
            last_seen: now.to_string(),
            presence: Presence::Online,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    /// ISO-8601
    pub timestamp: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub contact: Contact,
    pub messages: Vec<ChatEntry>,
    pub unread_count: usize,
}

impl Conversation {
    fn new(contact: Contact) -> Self {
        Self {
            contact,
            messages: Vec::new(),
            unread_count: 0,
        }
    }
}

/// 連絡先と会話の一覧
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    me: Option<Contact>,
    contacts: Vec<Contact>,
    conversations: BTreeMap<String, Conversation>,
    active: Option<String>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// `init` で割り当てられた自分の Identity を記録する
    pub fn identify(&mut self, user: UserDto, now: &str) -> Contact {
        let me = Contact::online(user, now);
        self.me = Some(me.clone());
        me
    }

    /// ロスターで連絡先一覧を置き換える（自分自身は除外）
    ///
    /// ロスターから消えた相手との会話は残り、相手は Offline になる。
    pub fn replace_roster(&mut self, users: Vec<UserDto>, now: &str) -> &[Contact] {
        let my_id = self.me.as_ref().map(|me| me.id.clone());
        self.contacts = users
            .into_iter()
            .filter(|user| Some(&user.id) != my_id.as_ref())
            .map(|user| Contact::online(user, now))
            .collect();

        for conversation in self.conversations.values_mut() {
            match self
                .contacts
                .iter()
                .find(|contact| contact.id == conversation.contact.id)
            {
                Some(contact) => conversation.contact = contact.clone(),
                None => conversation.contact.presence = Presence::Offline,
            }
        }

        &self.contacts
    }

    /// 受信したチャットを送信者の会話に追加する
    ///
    /// 会話がアクティブでなければ未読数を 1 増やす。
    pub fn receive_chat(&mut self, chat: ChatEventDto, now: &str) -> ChatEntry {
        let is_active = self.active.as_deref() == Some(chat.sender_id.as_str());
        let entry = ChatEntry {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: chat.sender_id,
            sender_name: chat.sender_name,
            content: chat.content,
            timestamp: chat.timestamp,
            status: if is_active {
                DeliveryStatus::Read
            } else {
                DeliveryStatus::Delivered
            },
        };

        let conversation =
            self.upsert_conversation(&entry.sender_id, &entry.sender_name, Presence::Online, now);
        conversation.messages.push(entry.clone());
        if !is_active {
            conversation.unread_count += 1;
        }

        entry
    }

    /// 送信したチャットのローカルエコーを記録する
    pub fn record_sent(&mut self, contact_id: &str, content: &str, timestamp: &str) -> ChatEntry {
        let (sender_id, sender_name) = self
            .me
            .as_ref()
            .map(|me| (me.id.clone(), me.name.clone()))
            .unwrap_or_default();
        let entry = ChatEntry {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id,
            sender_name,
            content: content.to_string(),
            timestamp: timestamp.to_string(),
            status: DeliveryStatus::Sent,
        };

        // ロスターに居ない相手: 次のロスター更新までは ID を表示名とし Offline 扱い
        let conversation =
            self.upsert_conversation(contact_id, contact_id, Presence::Offline, timestamp);
        conversation.messages.push(entry.clone());

        entry
    }

    /// アクティブな会話を切り替える
    ///
    /// 新しくアクティブになった会話は既読になり、未読数は 0 になる。
    pub fn set_active(&mut self, contact_id: Option<String>) {
        if let Some(id) = &contact_id {
            self.mark_as_read(id);
        }
        self.active = contact_id;
    }

    /// 会話を既読にする（存在しなければ `false`）
    pub fn mark_as_read(&mut self, contact_id: &str) -> bool {
        let Some(conversation) = self.conversations.get_mut(contact_id) else {
            return false;
        };
        conversation.unread_count = 0;
        for message in conversation
            .messages
            .iter_mut()
            .filter(|message| message.sender_id == contact_id)
        {
            message.status = DeliveryStatus::Read;
        }
        true
    }

    pub fn me(&self) -> Option<&Contact> {
        self.me.as_ref()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn conversation(&self, contact_id: &str) -> Option<&Conversation> {
        self.conversations.get(contact_id)
    }

    pub fn conversations(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.values()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn unread_count(&self, contact_id: &str) -> usize {
        self.conversations
            .get(contact_id)
            .map_or(0, |conversation| conversation.unread_count)
    }

    pub fn total_unread(&self) -> usize {
        self.conversations
            .values()
            .map(|conversation| conversation.unread_count)
            .sum()
    }

    fn upsert_conversation(
        &mut self,
        contact_id: &str,
        fallback_name: &str,
        fallback_presence: Presence,
        now: &str,
    ) -> &mut Conversation {
        let known = self
            .contacts
            .iter()
            .find(|contact| contact.id == contact_id)
            .cloned();
        self.conversations
            .entry(contact_id.to_string())
            .or_insert_with(|| {
                Conversation::new(known.unwrap_or_else(|| Contact {
                    id: contact_id.to_string(),
                    name: fallback_name.to_string(),
                    last_seen: now.to_string(),
                    presence: fallback_presence,
                }))
            })
    }
}
