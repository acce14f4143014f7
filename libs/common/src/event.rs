//! The chat event model shared by the relay and the worker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The unit flowing between clients, the relay, and side-channel workers.
///
/// Serialized with camelCase field names; this is the wire contract on every
/// topic and on the websocket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_mode: Option<String>,
}

impl ChatEvent {
    pub fn new(kind: EventKind, sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            sender: sender.into(),
            content: content.into(),
            session_id: None,
            translation_mode: None,
        }
    }

    pub fn with_translation_mode(mut self, mode: impl Into<String>) -> Self {
        self.translation_mode = Some(mode.into());
        self
    }

    /// Classify the raw `translationMode` field.
    pub fn side_channel_mode(&self) -> SideChannelMode {
        SideChannelMode::parse(self.translation_mode.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Event kind
// ---------------------------------------------------------------------------

/// Open tag for [`ChatEvent`]. Unrecognised tags survive a round trip as
/// [`EventKind::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    #[default]
    Chat,
    Join,
    Leave,
    GrammarResult,
    BotResult,
    TranslationResult,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Chat => "CHAT",
            EventKind::Join => "JOIN",
            EventKind::Leave => "LEAVE",
            EventKind::GrammarResult => "GRAMMAR_RESULT",
            EventKind::BotResult => "BOT_RESULT",
            EventKind::TranslationResult => "TRANSLATION_RESULT",
            EventKind::Other(tag) => tag,
        }
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "CHAT" => EventKind::Chat,
            // Legacy web client sends CONNECT/DISCONNECT.
            "JOIN" | "CONNECT" => EventKind::Join,
            "LEAVE" | "DISCONNECT" => EventKind::Leave,
            "GRAMMAR_RESULT" => EventKind::GrammarResult,
            "BOT_RESULT" | "LIGOBOT_RESULT" => EventKind::BotResult,
            "TRANSLATION_RESULT" => EventKind::TranslationResult,
            _ => EventKind::Other(tag),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Side-channel mode
// ---------------------------------------------------------------------------

/// Target language of a translation side-channel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Korean,
    English,
    Vietnamese,
}

impl Language {
    /// All supported languages with their mode codes.
    pub const ALL: [(&'static str, Language); 3] = [
        ("ko", Language::Korean),
        ("en", Language::English),
        ("vi", Language::Vietnamese),
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, lang)| *lang)
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Korean => "ko",
            Language::English => "en",
            Language::Vietnamese => "vi",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Korean => "Korean",
            Language::English => "English",
            Language::Vietnamese => "Vietnamese",
        }
    }
}

/// Classified `translationMode` of a chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideChannelMode {
    None,
    Translate(Language),
    Unknown(String),
}

impl SideChannelMode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("none") => SideChannelMode::None,
            Some(code) => match Language::from_code(code) {
                Some(lang) => SideChannelMode::Translate(lang),
                None => SideChannelMode::Unknown(code.to_string()),
            },
        }
    }
}
