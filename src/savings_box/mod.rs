//! Savings boxes: money set aside inside an account.

mod boxes_page;
mod core;
mod endpoints;

pub use boxes_page::get_boxes_page;
pub use core::{
    BoxMovement, BoxMovementId, NewSavingsBox, SavingsBox, SavingsBoxId, SavingsBoxSummary,
    box_balance, create_savings_box, create_savings_box_tables, delete_savings_box, deposit,
    get_box_movements, get_savings_box, get_savings_boxes, withdraw,
};
pub use endpoints::{box_movement_endpoint, create_box_endpoint, delete_box_endpoint};
