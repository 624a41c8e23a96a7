//! WhatsApp system notices.
//!
//! Exports interleave notices (encryption banner, group events) with real
//! messages. Some of them are written with a speaker, so they pass the
//! header grammars and need to be recognized by content.

const NOTICES_EN: &[&str] = &[
    "messages and calls are end-to-end encrypted",
    "messages to this group are now secured with end-to-end encryption",
    "created group",
    "created this group",
    "changed the subject",
    "changed this group's icon",
    "changed the group description",
    "deleted this group's icon",
    "changed their phone number",
    "joined using this group's invite link",
    "security code changed",
    "your security code with",
    "you're now an admin",
    "is now an admin",
    "turned on disappearing messages",
    "turned off disappearing messages",
    "this message was deleted",
    "you deleted this message",
];

const NOTICES_RU: &[&str] = &[
    "Сообщения и звонки защищены сквозным шифрованием",
    "создал(а) группу",
    "изменил тему",
    "изменил иконку группы",
    "изменил описание группы",
    "удалил иконку группы",
    "изменил номер телефона",
    "присоединился по ссылке",
    "код безопасности изменён",
    "теперь администратор",
    "включил исчезающие сообщения",
    "выключил исчезающие сообщения",
    "Данное сообщение удалено",
];

/// Returns true if a header line carries a system notice instead of a message.
///
/// ```
/// use chatlens::parsing::is_system_message;
///
/// assert!(is_system_message("Alice", "Messages and calls are end-to-end encrypted."));
/// assert!(!is_system_message("Alice", "I left my keys at home"));
/// ```
pub fn is_system_message(user: &str, message: &str) -> bool {
    let user_lower = user.trim().to_lowercase();
    if user_lower.is_empty() || user_lower == "whatsapp" || user_lower == "system" {
        return true;
    }

    let lower = message.to_lowercase();
    if NOTICES_EN.iter().any(|notice| lower.contains(notice)) {
        return true;
    }

    // Cyrillic notices are matched case-sensitively
    NOTICES_RU.iter().any(|notice| message.contains(notice))
}
