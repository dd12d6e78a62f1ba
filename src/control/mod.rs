//! Financial controls: the shared books that accounts, cards and
//! transactions belong to, and the users who can see and change them.

mod controls_page;
mod core;
mod members_page;

pub use controls_page::{
    create_control_endpoint, delete_control_endpoint, get_control_page, get_controls_page,
    rename_control_endpoint,
};
pub use core::{
    Control, ControlId, Role, authorize, create_control, create_control_tables,
    list_controls_for_user,
};
#[cfg(test)]
pub(crate) use core::add_member;
pub use members_page::{
    add_member_endpoint, get_members_page, remove_member_endpoint, update_member_endpoint,
};
