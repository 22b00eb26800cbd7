//! Telegram command loop.
//!
//! One allow-listed chat; everyone else gets a rejection reply. The loop
//! is single-threaded on purpose: each long poll doubles as the
//! scheduler tick, and a scheduled cycle runs to completion before the
//! next poll starts.

use crate::forum::ForumTracker;
use crate::notify::{Message, Notifier, TelegramClient};
use crate::render;
use crate::schedule::HourTick;
use crate::status::{self, source::StatusSource};
use crate::store::BlobStore;
use chrono::{Local, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// How long each getUpdates call parks; also the tick resolution.
const POLL_SECS: u32 = 30;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Get,
    Latest(Option<usize>),
    History(String),
    Unknown,
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^/([A-Za-z_]+)(?:@\w+)?(?:\s+(.*))?$").expect("static pattern")
    })
}

/// Parse a `/command[@BotName] [args]` message. `None` for ordinary text.
pub fn parse_command(text: &str) -> Option<Command> {
    let captures = command_pattern().captures(text.trim())?;
    let arg = captures.get(2).map(|m| m.as_str().trim());

    let command = match captures[1].to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "get" => Command::Get,
        "latest" => Command::Latest(arg.and_then(|raw| raw.parse().ok())),
        "history" => Command::History(arg.unwrap_or_default().to_string()),
        _ => Command::Unknown,
    };
    Some(command)
}

pub struct Bot<S> {
    client: TelegramClient,
    tracker: ForumTracker<S>,
    status_source: Option<Box<dyn StatusSource>>,
    forum_hours: Vec<u32>,
    status_hours: Vec<u32>,
    offset: i64,
}

impl<S: BlobStore> Bot<S> {
    pub fn new(
        client: TelegramClient,
        tracker: ForumTracker<S>,
        status_source: Option<Box<dyn StatusSource>>,
        forum_hours: Vec<u32>,
        status_hours: Vec<u32>,
    ) -> Self {
        Self {
            client,
            tracker,
            status_source,
            forum_hours,
            status_hours,
            offset: 0,
        }
    }

    pub fn run(&mut self) -> ! {
        if let Err(err) = self.tracker.prime() {
            tracing::error!("initial forum fetch failed: {err}");
        }
        let mut tick = HourTick::starting_now(Local::now());

        loop {
            self.run_due_cycles(&mut tick);

            match self.client.get_updates(self.offset, POLL_SECS) {
                Ok(updates) => {
                    for update in updates {
                        self.offset = self.offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.handle_message(&message);
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!("update poll failed: {err}");
                    std::thread::sleep(std::time::Duration::from_secs(5));
                }
            }
        }
    }

    fn run_due_cycles(&mut self, tick: &mut HourTick) {
        let Some(hour) = tick.turned(Local::now()) else {
            return;
        };
        if self.forum_hours.contains(&hour) {
            self.forum_cycle();
        }
        if self.status_hours.contains(&hour) {
            self.status_cycle();
        }
    }

    /// Scheduled tracker diff. Quiet when nothing moved; a failed fetch
    /// is logged and the snapshot stays as it was.
    fn forum_cycle(&mut self) {
        match self.tracker.diff_cycle() {
            Ok(records) if records.is_empty() => {}
            Ok(records) => self.deliver(&render::diff_message(&records)),
            Err(err) => tracing::error!("forum update failed: {err}"),
        }
    }

    fn status_cycle(&mut self) {
        let Some(source) = self.status_source.as_deref() else {
            tracing::debug!("no scrape command configured, skipping status update");
            return;
        };
        match status::update(source) {
            Ok((live, stage)) => {
                self.deliver(&render::status_message(&live, &stage, Utc::now()));
            }
            Err(err) => tracing::error!("status update failed: {err}"),
        }
    }

    fn deliver(&self, text: &str) {
        if let Err(err) = self.client.send(text) {
            tracing::error!("telegram send failed: {err}");
        }
    }

    fn reply(&self, text: &str) {
        if let Err(err) = self.client.send_markdown(self.client.chat_id(), text) {
            tracing::error!("telegram reply failed: {err}");
        }
    }

    fn handle_message(&mut self, message: &Message) {
        let chat = &message.chat;
        if chat.id != self.client.chat_id() {
            tracing::warn!(chat = chat.id, "rejected message from unknown chat");
            let notice = format!(
                "\u{1f6d1} Sorry, you are not authorized to use this bot! ({})",
                chat.id
            );
            if let Err(err) = self.client.send_markdown(chat.id, &notice) {
                tracing::warn!("rejection reply failed: {err}");
            }
            return;
        }

        let Some(text) = message.text.as_deref() else {
            return;
        };
        let Some(command) = parse_command(text) else {
            return;
        };

        match command {
            Command::Start => {
                let name = if chat.kind == "private" {
                    chat.first_name.clone()
                } else {
                    chat.title.clone()
                };
                let name = name.unwrap_or_else(|| "there".to_string());
                self.reply(&format!("\u{1f44b} Hey there, {name} ({})!", chat.id));
            }
            // On-demand status check. Fetch failures stay in the log; the
            // user just sees no reply, same as a scheduled cycle.
            Command::Get => {
                if self.status_source.is_none() {
                    self.reply("No scrape command configured.");
                } else {
                    self.status_cycle();
                }
            }
            Command::Latest(limit) => self.latest_reply(limit.unwrap_or(render::LATEST_DEFAULT)),
            Command::History(name) if name.is_empty() => {
                self.reply("Usage: /history <case id>");
            }
            Command::History(name) => self.history_reply(&name),
            Command::Unknown => {}
        }
    }

    fn latest_reply(&mut self, limit: usize) {
        if self.tracker.entries().is_none() {
            if let Err(err) = self.tracker.prime() {
                tracing::error!("forum fetch failed: {err}");
                return;
            }
        }
        let entries = self.tracker.entries().unwrap_or(&[]);
        self.deliver(&render::latest_message(entries, limit));
    }

    fn history_reply(&mut self, name: &str) {
        if self.tracker.entries().is_none() {
            if let Err(err) = self.tracker.prime() {
                tracing::error!("forum fetch failed: {err}");
                return;
            }
        }
        let entries = self.tracker.entries().unwrap_or(&[]);
        match render::find_entry(entries, name) {
            Some(entry) => self.reply(&render::entry_message(entry)),
            None => self.reply(&format!("{name} is not tracked.")),
        }
    }
}
