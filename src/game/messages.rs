//! # Messages
//!
//! Narrative strings emitted by the core and the inline markers the display
//! layer interprets: `@` breaks a line, `#` breaks a page and `~` ends the
//! message. The core only produces marker-annotated text; the [`Typewriter`]
//! is a small helper that reveals it a few characters per tick.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Line-break marker.
pub const LINE_BREAK: char = '@';

/// Page-break marker.
pub const PAGE_BREAK: char = '#';

/// End-of-message marker.
pub const END_OF_MESSAGE: char = '~';

/// Most messages a [`MessageChannel`] holds before dropping the oldest.
pub const MESSAGE_LIMIT: usize = 100;

/// Script shown when a new game opens.
pub const WELCOME_SCRIPT: usize = 0;

/// Marker-annotated dialogue scripts, indexed by script id.
pub const SCRIPTS: [&str; 6] = [
    "Welcome to Alefgard!@Walk with W, A, S and D.#Press Enter to open the command menu.~",
    "The castle lies to the south.@Mind the sea, there are no boats here.~",
    "Monsters lurk in the caves.@Fight, or run if you must!~",
    "Step up to the counter to trade.~",
    "Brave one, a treasure rests in the deepest cave.#Return to me when you are stronger.~",
    "I have walked these plains for years.@A town lies just south of here.~",
];

/// Looks up a script, falling back to the welcome text for unknown ids.
pub fn script_text(script_id: usize) -> &'static str {
    SCRIPTS.get(script_id).copied().unwrap_or(SCRIPTS[WELCOME_SCRIPT])
}

/// Who a message comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// NPC speech and scripts
    Dialogue,
    /// Battle log lines
    Battle,
    /// Everything else
    System,
}

/// One marker-annotated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    /// Creates a message, appending the end marker if it is missing.
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if !text.ends_with(END_OF_MESSAGE) {
            text.push(END_OF_MESSAGE);
        }
        Self { kind, text }
    }

    pub fn dialogue(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Dialogue, text)
    }

    pub fn battle(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Battle, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageKind::System, text)
    }

    /// Splits the message into display pages with line breaks expanded.
    ///
    /// # Examples
    ///
    /// ```
    /// use drapon::Message;
    ///
    /// let message = Message::dialogue("Hello@there#Bye");
    /// assert_eq!(message.pages(), vec!["Hello\nthere".to_string(), "Bye".to_string()]);
    /// ```
    pub fn pages(&self) -> Vec<String> {
        self.text
            .trim_end_matches(END_OF_MESSAGE)
            .split(PAGE_BREAK)
            .map(|page| page.replace(LINE_BREAK, "\n"))
            .collect()
    }

    /// The whole message as plain text, pages separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.pages().join("\n\n")
    }
}

/// Ordered outbox of messages waiting for the display collaborator.
///
/// Holds at most [`MESSAGE_LIMIT`] messages. A consumer that stops calling
/// [`MessageChannel::drain`] loses the oldest ones first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageChannel {
    queue: VecDeque<Message>,
}

impl MessageChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message, dropping the oldest one when full.
    pub fn emit(&mut self, message: Message) {
        if self.queue.len() >= MESSAGE_LIMIT {
            self.queue.pop_front();
        }
        self.queue.push_back(message);
    }

    /// Removes and returns every queued message, oldest first.
    ///
    /// The display layer should call this once per frame; the core never
    /// drains on its own.
    pub fn drain(&mut self) -> Vec<Message> {
        self.queue.drain(..).collect()
    }

    /// Queued messages without consuming them.
    pub fn pending(&self) -> impl Iterator<Item = &Message> {
        self.queue.iter()
    }

    /// Most recently queued message.
    pub fn last(&self) -> Option<&Message> {
        self.queue.back()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Where a [`Typewriter`] is in its reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypewriterState {
    /// No message loaded
    Idle,
    /// Revealing the current page
    Typing,
    /// Current page fully shown, waiting for [`Typewriter::next_page`]
    PageWait,
    /// End marker reached
    Finished,
}

/// Reveals a marker-annotated message a few characters at a time.
///
/// # Examples
///
/// ```
/// use drapon::{Typewriter, TypewriterState};
///
/// let mut typewriter = Typewriter::new();
/// typewriter.start("Hi@you~");
/// typewriter.advance(2);
/// assert_eq!(typewriter.visible(), "Hi");
/// typewriter.advance(10);
/// assert_eq!(typewriter.visible(), "Hi\nyou");
/// assert_eq!(typewriter.state(), TypewriterState::Finished);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typewriter {
    chars: Vec<char>,
    cursor: usize,
    page: usize,
    visible: String,
    state: TypewriterState,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Typewriter {
    pub fn new() -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
            page: 0,
            visible: String::new(),
            state: TypewriterState::Idle,
        }
    }

    /// Loads a new message, discarding any message in progress.
    pub fn start(&mut self, text: &str) {
        self.chars = text.chars().collect();
        if self.chars.last() != Some(&END_OF_MESSAGE) {
            self.chars.push(END_OF_MESSAGE);
        }
        self.cursor = 0;
        self.page = 0;
        self.visible.clear();
        self.state = TypewriterState::Typing;
    }

    /// Reveals up to `count` characters. Returns `true` when the message
    /// finished during this call.
    pub fn advance(&mut self, count: usize) -> bool {
        for _ in 0..count {
            if self.state != TypewriterState::Typing {
                break;
            }
            let Some(&next) = self.chars.get(self.cursor) else {
                self.state = TypewriterState::Finished;
                return true;
            };
            self.cursor += 1;
            match next {
                LINE_BREAK => self.visible.push('\n'),
                PAGE_BREAK => self.state = TypewriterState::PageWait,
                END_OF_MESSAGE => {
                    self.state = TypewriterState::Finished;
                    return true;
                }
                other => self.visible.push(other),
            }
        }
        false
    }

    /// Clears the finished page and resumes typing. No-op unless waiting.
    pub fn next_page(&mut self) {
        if self.state == TypewriterState::PageWait {
            self.visible.clear();
            self.page += 1;
            self.state = TypewriterState::Typing;
        }
    }

    /// Drops the loaded message.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Text revealed so far on the current page.
    pub fn visible(&self) -> &str {
        &self.visible
    }

    /// Zero-based index of the page being shown.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn state(&self) -> TypewriterState {
        self.state
    }

    /// Whether a message is loaded and not yet finished.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            TypewriterState::Typing | TypewriterState::PageWait
        )
    }
}
