use farm_core::types::ChatReply;
use farm_core::FarmApi;

const GREETING: &str = "Hello! I am FarmerGPT, your farming assistant. Ask me anything about farming, crops, soil, irrigation, pest control, or weather planning!";
const FAILURE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatLine {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub struct ChatView {
    pub lines: Vec<ChatLine>,
    pub loading: bool,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            lines: vec![ChatLine::new(Speaker::Bot, GREETING)],
            loading: false,
        }
    }
}

impl ChatView {
    /// Send one message. Blank input is ignored.
    pub fn send(&mut self, api: &FarmApi, input: &str) {
        if input.trim().is_empty() || self.loading {
            return;
        }
        self.lines.push(ChatLine::new(Speaker::User, input));
        self.loading = true;

        match api.send_chat_message(input).and_then(|resp| resp.json::<ChatReply>()) {
            Ok(reply) => {
                self.lines.push(ChatLine::new(Speaker::Bot, reply.response));
                if let Some(note) = reply.note {
                    self.lines.push(ChatLine::new(Speaker::Info, note));
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "chat message failed");
                self.lines.push(ChatLine::new(Speaker::Error, FAILURE));
            }
        }
        self.loading = false;
    }

    /// Lines added since index `from`, formatted for the terminal.
    pub fn render_from(&self, from: usize) -> String {
        self.lines
            .iter()
            .skip(from)
            .map(|line| {
                let tag = match line.speaker {
                    Speaker::User => "you",
                    Speaker::Bot => "bot",
                    Speaker::Info => "note",
                    Speaker::Error => "error",
                };
                format!("[{tag}] {}\n", line.text)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        self.render_from(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::signed_in;

    #[test]
    fn starts_with_greeting() {
        let view = ChatView::default();
        assert_eq!(view.lines.len(), 1);
        assert!(view.render().starts_with("[bot] Hello! I am FarmerGPT"));
    }

    #[test]
    fn reply_and_note_are_appended() {
        let f = signed_in();
        f.transport.reply(
            200,
            r#"{"response":"Sow wheat in early November.","success":true,"note":"This is a basic response."}"#,
        );
        let mut view = ChatView::default();
        view.send(&f.api, "When to plant wheat?");

        let speakers: Vec<Speaker> = view.lines.iter().map(|l| l.speaker).collect();
        assert_eq!(speakers, vec![Speaker::Bot, Speaker::User, Speaker::Bot, Speaker::Info]);
        assert_eq!(view.lines[2].text, "Sow wheat in early November.");
        assert!(!view.loading);
    }

    #[test]
    fn blank_input_is_not_sent() {
        let f = signed_in();
        let mut view = ChatView::default();
        view.send(&f.api, "   ");
        assert!(f.transport.sent().is_empty());
        assert_eq!(view.lines.len(), 1);
    }

    #[test]
    fn failure_adds_static_error_line() {
        let f = signed_in();
        f.transport.reply(503, "");
        let mut view = ChatView::default();
        view.send(&f.api, "irrigation?");

        assert_eq!(view.lines.last().unwrap(), &ChatLine::new(Speaker::Error, FAILURE));
        assert_eq!(f.transport.sent().len(), 1);
    }
}
