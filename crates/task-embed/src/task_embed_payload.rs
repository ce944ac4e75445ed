//! Display payload produced by the renderer and its Discord message body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DISCORD_COMPONENT_ACTION_ROW: u8 = 1;
const DISCORD_COMPONENT_BUTTON: u8 = 2;
const DISCORD_BUTTON_STYLE_LINK: u8 = 5;

/// Embed accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedColor {
    #[default]
    Success,
    Warning,
    Danger,
    Neutral,
}

impl EmbedColor {
    /// RGB value as Discord expects it in `embed.color`.
    pub fn rgb(self) -> u32 {
        match self {
            Self::Success => 0x57F287,
            Self::Warning => 0xFEE75C,
            Self::Danger => 0xED4245,
            Self::Neutral => 0x5865F2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedAction {
    LinkButton {
        label: String,
        url: String,
        emoji: String,
    },
}

impl EmbedAction {
    fn to_discord_component(&self) -> Value {
        match self {
            Self::LinkButton { label, url, emoji } => json!({
                "type": DISCORD_COMPONENT_BUTTON,
                "style": DISCORD_BUTTON_STYLE_LINK,
                "label": label,
                "url": url,
                "emoji": { "name": emoji }
            }),
        }
    }
}

/// Everything a chat client needs to show one task embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayPayload {
    pub title: String,
    pub description: String,
    pub color: EmbedColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    pub actions: Vec<EmbedAction>,
}

impl DisplayPayload {
    /// URL of the first link button, if any.
    pub fn download_url(&self) -> Option<&str> {
        self.actions.iter().find_map(|action| match action {
            EmbedAction::LinkButton { url, .. } => Some(url.as_str()),
        })
    }

    /// Builds a Discord create/edit message body with one embed.
    ///
    /// Each action gets its own action row, matching how link buttons are sent
    /// one per row by the bot.
    pub fn to_discord_message_body(&self) -> Value {
        let mut embed = json!({
            "title": self.title,
            "description": self.description,
            "color": self.color.rgb(),
        });
        if let Some(footer) = &self.footer {
            embed["footer"] = json!({ "text": footer });
        }

        let components = self
            .actions
            .iter()
            .map(|action| {
                json!({
                    "type": DISCORD_COMPONENT_ACTION_ROW,
                    "components": [action.to_discord_component()]
                })
            })
            .collect::<Vec<_>>();

        json!({
            "embeds": [embed],
            "components": components,
        })
    }

    pub fn to_plain_text(&self) -> String {
        let mut lines = vec![
            format!("# {}", self.title),
            String::new(),
            self.description.clone(),
        ];
        if let Some(footer) = &self.footer {
            lines.push(String::new());
            lines.push(format!("-- {footer}"));
        }
        for action in &self.actions {
            match action {
                EmbedAction::LinkButton { label, url, emoji } => {
                    lines.push(format!("{emoji} [{label}] {url}"));
                }
            }
        }
        lines.join("\n")
    }
}
