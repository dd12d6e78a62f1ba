//! Credit cards, their billing cycle and credit limit.

mod cards_page;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use cards_page::get_cards_page;
pub use core::{
    Card, CardId, NewCard, available_limit, check_card, create_card, create_card_table,
    get_card, get_cards, used_limit,
};
pub use create_endpoint::create_card_endpoint;
pub use delete_endpoint::delete_card_endpoint;
pub use edit_endpoint::edit_card_endpoint;
pub use edit_page::get_edit_card_page;
