use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

use crate::trivia;

/// One numbered button per answer option.
///
/// Disabled rows replace the live ones once a round is over.
pub fn create_trivia_buttons(round_id: u64, option_count: usize, disabled: bool) -> Vec<CreateActionRow> {
    let buttons = (0..option_count)
        .map(|choice| {
            CreateButton::new(trivia::custom_id(round_id, choice))
                .label((choice + 1).to_string())
                .style(ButtonStyle::Primary)
                .disabled(disabled)
        })
        .collect();

    vec![CreateActionRow::Buttons(buttons)]
}
