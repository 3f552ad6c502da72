//! Direct messages between users.

use super::accounts::actor;
use super::backend::KeyValueBackend;
use super::contains_ci;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{Message, NotificationKind, Role, User};
use super::newest_first;
use super::notifications::{self, Notice};
use super::now_ts;
use super::repository::{MessageRepository, UserRepository};
use super::resolve::resolve;
use log::info;
use serde::{Deserialize, Serialize};

const REPLY_PREFIX: &str = "Re: ";
const GIF_MARKER: &str = "[GIF:";

/// Users `sender` may write to: students reach faculty, faculty reach
/// students, admins reach everyone but themselves.
pub fn can_message(sender: &User, recipient: &User) -> bool {
    match sender.role {
        Role::Student => recipient.role == Role::Faculty,
        Role::Faculty => recipient.role == Role::Student,
        Role::Admin => recipient.id != sender.id,
    }
}

pub fn recipients(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<Vec<User>> {
    let sender = actor(backend, actor_id)?;
    Ok(UserRepository::new(backend)
        .all()?
        .into_iter()
        .filter(|u| can_message(&sender, u))
        .collect())
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0x2300..=0x23FF | 0xFE0F
    )
}

/// Emoji or an embedded GIF marker.
pub fn has_rich_content(body: &str) -> bool {
    body.contains(GIF_MARKER) || body.chars().any(is_emoji)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    #[default]
    Inbox,
    Sent,
}

pub fn list(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    folder: Folder,
    search: Option<&str>,
) -> StoreResult<Vec<Message>> {
    let who = actor(backend, actor_id)?;
    let mut found: Vec<Message> = MessageRepository::new(backend)
        .all()?
        .into_iter()
        .filter(|m| match folder {
            Folder::Inbox => m.recipient_id == who.id,
            Folder::Sent => m.sender_id == who.id,
        })
        .filter(|m| match search {
            Some(q) if !q.is_empty() => {
                contains_ci(&m.subject, q)
                    || contains_ci(&m.sender_name, q)
                    || contains_ci(&m.recipient_name, q)
                    || contains_ci(&m.message, q)
            }
            _ => true,
        })
        .collect();
    found.sort_by(|a, b| newest_first(&a.timestamp, &b.timestamp));
    Ok(found)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compose {
    pub recipient_id: String,
    pub subject: String,
    pub message: String,
}

/// Stores the message and raises a notification for the recipient.
pub fn send(backend: &dyn KeyValueBackend, actor_id: &str, draft: &Compose) -> StoreResult<Message> {
    if draft.recipient_id.is_empty() || draft.subject.trim().is_empty() || draft.message.trim().is_empty() {
        return Err(StoreError::validation("recipient, subject and message are required"));
    }
    let users = UserRepository::new(backend).all()?;
    let sender = resolve(actor_id, &users)?;
    let recipient = resolve(&draft.recipient_id, &users)?;
    if !can_message(sender, recipient) {
        return Err(StoreError::forbidden(format!(
            "{} may not message {}",
            sender.role.as_str(),
            recipient.id
        )));
    }

    let repo = MessageRepository::new(backend);
    let mut all = repo.all()?;
    let msg = Message {
        id: ids::next_id("MSG", all.iter().map(|m| m.id.as_str())),
        sender_id: sender.id.clone(),
        recipient_id: recipient.id.clone(),
        subject: draft.subject.clone(),
        message: draft.message.clone(),
        timestamp: now_ts(),
        read: false,
        sender_name: sender.full_name(),
        recipient_name: recipient.full_name(),
        has_emoji: Some(has_rich_content(&draft.message)),
        extra: Default::default(),
    };
    all.push(msg.clone());
    repo.save_all(&all)?;

    notifications::push(
        backend,
        Notice {
            user_id: recipient.id.clone(),
            kind: NotificationKind::Message,
            title: format!("New Message from {}", sender.full_name()),
            message: format!("Subject: {}", draft.subject),
        },
    )?;
    info!("{} sent {} to {}", sender.id, msg.id, recipient.id);
    Ok(msg)
}

fn participant_of(who: &User, m: &Message) -> bool {
    m.sender_id == who.id || m.recipient_id == who.id
}

/// Only the recipient can mark a message read.
pub fn mark_read(backend: &dyn KeyValueBackend, actor_id: &str, message_id: &str) -> StoreResult<Message> {
    let who = actor(backend, actor_id)?;
    MessageRepository::new(backend).update(message_id, |m| {
        if m.recipient_id != who.id {
            return Err(StoreError::forbidden("only the recipient can mark a message read"));
        }
        m.read = true;
        Ok(())
    })
}

/// Removes a message. Sender and recipient may both delete it.
pub fn delete(backend: &dyn KeyValueBackend, actor_id: &str, message_id: &str) -> StoreResult<()> {
    let who = actor(backend, actor_id)?;
    let repo = MessageRepository::new(backend);
    let msg = repo.get(message_id)?;
    if !participant_of(&who, &msg) {
        return Err(StoreError::forbidden("not a participant of this message"));
    }
    repo.remove(message_id)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDraft {
    pub recipient_id: String,
    pub subject: String,
    pub message: String,
}

pub fn reply_draft(original: &Message) -> ReplyDraft {
    let subject = if original.subject.starts_with(REPLY_PREFIX) {
        original.subject.clone()
    } else {
        format!("{}{}", REPLY_PREFIX, original.subject)
    };
    ReplyDraft {
        recipient_id: original.sender_id.clone(),
        subject,
        message: format!(
            "\n\n--- Original Message ---\nFrom: {}\nSubject: {}\n\n{}",
            original.sender_name, original.subject, original.message
        ),
    }
}

/// Reply template for a message the actor received or sent.
pub fn reply_to(backend: &dyn KeyValueBackend, actor_id: &str, message_id: &str) -> StoreResult<ReplyDraft> {
    let who = actor(backend, actor_id)?;
    let msg = MessageRepository::new(backend).get(message_id)?;
    if !participant_of(&who, &msg) {
        return Err(StoreError::forbidden("not a participant of this message"));
    }
    Ok(reply_draft(&msg))
}

pub fn unread_count(backend: &dyn KeyValueBackend, user_id: &str) -> StoreResult<usize> {
    Ok(MessageRepository::new(backend)
        .all()?
        .iter()
        .filter(|m| m.recipient_id == user_id && !m.read)
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::tests::seed_user;
    use crate::store::backend::MemoryBackend;
    use crate::store::models::Notification;
    use crate::store::repository::NotificationRepository;

    fn compose(to: &str, subject: &str, body: &str) -> Compose {
        Compose {
            recipient_id: to.into(),
            subject: subject.into(),
            message: body.into(),
        }
    }

    fn school(backend: &MemoryBackend) {
        seed_user(backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(backend, "FAC001", Role::Faculty, "John", "Smith");
        seed_user(backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(backend, "STU002", Role::Student, "John", "Doe");
    }

    #[test]
    fn recipient_rules_by_role() {
        let backend = MemoryBackend::new();
        school(&backend);
        let ids = |who: &str| -> Vec<String> {
            recipients(&backend, who).expect("recipients").into_iter().map(|u| u.id).collect()
        };
        assert_eq!(ids("STU001"), vec!["FAC001"]);
        assert_eq!(ids("FAC001"), vec!["STU001", "STU002"]);
        assert_eq!(ids("ADM001"), vec!["FAC001", "STU001", "STU002"]);
    }

    #[test]
    fn send_stores_message_and_notifies() {
        let backend = MemoryBackend::new();
        school(&backend);
        let msg = send(&backend, "FAC001", &compose("STU001", "Homework", "Due Friday 📚"))
            .expect("send");
        assert_eq!(msg.id, "MSG001");
        assert_eq!(msg.sender_name, "John Smith");
        assert_eq!(msg.recipient_name, "Emily Jones");
        assert_eq!(msg.has_emoji, Some(true));

        let notes: Vec<Notification> = NotificationRepository::new(&backend).all().expect("notes");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id, "STU001");
        assert_eq!(notes[0].title, "New Message from John Smith");
        assert_eq!(notes[0].message, "Subject: Homework");
        assert_eq!(unread_count(&backend, "STU001").expect("count"), 1);
    }

    #[test]
    fn send_rejections_write_nothing() {
        let backend = MemoryBackend::new();
        school(&backend);
        let empty = send(&backend, "FAC001", &compose("STU001", "", "body"));
        assert!(matches!(empty, Err(StoreError::Validation(_))));
        let ghost = send(&backend, "FAC001", &compose("STU404", "Hi", "body"));
        assert!(matches!(ghost, Err(StoreError::ReferenceNotFound { .. })));
        let peer = send(&backend, "STU001", &compose("STU002", "Hi", "body"));
        assert!(matches!(peer, Err(StoreError::Forbidden(_))));
        assert_eq!(backend.raw("messages"), None);
        assert_eq!(backend.raw("notifications"), None);
    }

    #[test]
    fn folders_search_and_read_state() {
        let backend = MemoryBackend::new();
        school(&backend);
        send(&backend, "FAC001", &compose("STU001", "Lab safety", "Goggles on")).expect("send");
        send(&backend, "FAC001", &compose("STU002", "Grades", "Posted")).expect("send");
        send(&backend, "STU001", &compose("FAC001", "Question", "About the lab")).expect("send");

        let inbox = list(&backend, "STU001", Folder::Inbox, None).expect("inbox");
        assert_eq!(inbox.len(), 1);
        let sent = list(&backend, "FAC001", Folder::Sent, None).expect("sent");
        assert_eq!(sent.len(), 2);
        let hits = list(&backend, "FAC001", Folder::Sent, Some("GOGGLES")).expect("search");
        assert_eq!(hits.len(), 1);

        let denied = mark_read(&backend, "STU002", &inbox[0].id);
        assert!(matches!(denied, Err(StoreError::Forbidden(_))));
        mark_read(&backend, "STU001", &inbox[0].id).expect("mark");
        assert_eq!(unread_count(&backend, "STU001").expect("count"), 0);
    }

    #[test]
    fn delete_by_participant_only() {
        let backend = MemoryBackend::new();
        school(&backend);
        let msg = send(&backend, "FAC001", &compose("STU001", "Hi", "Hello")).expect("send");
        let denied = delete(&backend, "STU002", &msg.id);
        assert!(matches!(denied, Err(StoreError::Forbidden(_))));
        delete(&backend, "STU001", &msg.id).expect("delete");
        assert!(MessageRepository::new(&backend).all().expect("all").is_empty());
    }

    #[test]
    fn reply_quotes_and_prefixes_once() {
        let original = Message {
            id: "MSG001".into(),
            sender_id: "FAC001".into(),
            recipient_id: "STU001".into(),
            subject: "Homework".into(),
            message: "Due Friday".into(),
            timestamp: "2024-01-15T10:00:00.000Z".into(),
            read: false,
            sender_name: "John Smith".into(),
            recipient_name: "Emily Jones".into(),
            has_emoji: None,
            extra: Default::default(),
        };
        let draft = reply_draft(&original);
        assert_eq!(draft.recipient_id, "FAC001");
        assert_eq!(draft.subject, "Re: Homework");
        assert_eq!(
            draft.message,
            "\n\n--- Original Message ---\nFrom: John Smith\nSubject: Homework\n\nDue Friday"
        );

        let again = reply_draft(&Message {
            subject: "Re: Homework".into(),
            ..original
        });
        assert_eq!(again.subject, "Re: Homework");
    }

    #[test]
    fn rich_content_detection() {
        assert!(has_rich_content("see [GIF: https://x/y.gif]"));
        assert!(has_rich_content("nice 👍"));
        assert!(!has_rich_content("plain text 123 #1"));
    }
}
