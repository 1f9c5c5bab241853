//! Embeds, buttons, and slash command definitions.

use serenity::builder::{
    CreateActionRow, CreateButton, CreateCommand, CreateCommandOption, CreateEmbed,
};
use serenity::model::application::{ButtonStyle, CommandOptionType};
use serenity::model::permissions::Permissions;

/// Custom id of the panel button that opens a ticket.
pub const OPEN_BUTTON_ID: &str = "open";
/// Custom id of the pinned button that closes a ticket.
pub const CLOSE_BUTTON_ID: &str = "close";

pub const TICKET_EMBED_COLOR: u32 = 0x2F_31_36;

pub fn panel_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("Ticket System")
        .description("Click to open a ticket")
        .color(TICKET_EMBED_COLOR)
}

pub fn open_panel_row() -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(OPEN_BUTTON_ID)
            .label("Open Ticket")
            .emoji('📩')
            .style(ButtonStyle::Primary),
    ])
}

pub fn ticket_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("Ticket Chat")
        .description("Support will be with you shortly.")
        .color(TICKET_EMBED_COLOR)
}

pub fn close_control_row(disabled: bool) -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(CLOSE_BUTTON_ID)
            .emoji('🔒')
            .style(ButtonStyle::Danger)
            .disabled(disabled),
    ])
}

/// Slash commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketCommand {
    Panel,
    SetTicket,
    Add,
    Remove,
}

impl TicketCommand {
    pub const ALL: [TicketCommand; 4] = [Self::Panel, Self::SetTicket, Self::Add, Self::Remove];

    pub fn name(self) -> &'static str {
        match self {
            Self::Panel => "panel",
            Self::SetTicket => "setticket",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }

    /// Whether the invoking member must be an administrator.
    pub fn requires_admin(self) -> bool {
        matches!(self, Self::Panel | Self::SetTicket)
    }

    pub fn definition(self) -> CreateCommand {
        let command = CreateCommand::new(self.name());
        let command = if self.requires_admin() {
            command.default_member_permissions(Permissions::ADMINISTRATOR)
        } else {
            command
        };

        match self {
            Self::Panel => command.description("Create ticket panel"),
            Self::SetTicket => command
                .description("Set the number of the most recent ticket")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "number",
                        "The next ticket will use this number plus one",
                    )
                    .required(true),
                ),
            Self::Add => command
                .description("Give a member access to this ticket")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::User, "user", "Member to add")
                        .required(true),
                ),
            Self::Remove => command
                .description("Remove a member's access to this ticket")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::User, "user", "Member to remove")
                        .required(true),
                ),
        }
    }
}

pub fn slash_commands() -> Vec<CreateCommand> {
    TicketCommand::ALL
        .into_iter()
        .map(TicketCommand::definition)
        .collect()
}
