use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    account::{Account, NewAccount, create_account},
    auth::{PasswordHash, User, create_user},
    card::{Card, NewCard, create_card},
    control::{Control, Role, add_member, create_control},
    db::initialize,
};

pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialise database");
    connection
}

pub(crate) fn insert_test_user(connection: &Connection) -> User {
    insert_test_user_with_email("test@example.com", connection)
}

pub(crate) fn insert_test_user_with_email(email: &str, connection: &Connection) -> User {
    create_user(
        EmailAddress::new_unchecked(email),
        "Test User",
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("could not create test user")
}

fn next_user_number(connection: &Connection) -> i64 {
    let count: i64 = connection
        .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
        .expect("could not count users");
    count + 1
}

/// Create a new owner and a control they own.
///
/// Each call creates a different user, so a test can set up several controls.
pub(crate) fn insert_test_control(connection: &Connection) -> (User, Control) {
    let email = format!("owner{}@example.com", next_user_number(connection));
    let owner = insert_test_user_with_email(&email, connection);
    let control = create_control("Household", owner.id, connection)
        .expect("could not create test control");

    (owner, control)
}

/// Create a new user and add them to the control as a viewer.
pub(crate) fn insert_test_viewer(control_id: i64, connection: &Connection) -> User {
    let email = format!("viewer{}@example.com", next_user_number(connection));
    let viewer = insert_test_user_with_email(&email, connection);
    add_member(control_id, &email, Role::Viewer, connection).expect("could not add viewer");

    viewer
}

pub(crate) fn insert_test_account(control_id: i64, connection: &Connection) -> Account {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM account WHERE control_id = ?1",
            (control_id,),
            |row| row.get(0),
        )
        .expect("could not count accounts");

    let name = if count == 0 {
        "Test Account".to_owned()
    } else {
        format!("Test Account {}", count + 1)
    };

    create_account(
        control_id,
        &NewAccount {
            name,
            opening_balance: 0.0,
        },
        connection,
    )
    .expect("could not create test account")
}

pub(crate) fn insert_test_card(
    control_id: i64,
    account_id: i64,
    closing_day: u8,
    due_day: u8,
    connection: &Connection,
) -> Card {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM card WHERE control_id = ?1",
            (control_id,),
            |row| row.get(0),
        )
        .expect("could not count cards");

    create_card(
        control_id,
        &NewCard {
            name: format!("Card {}", count + 1),
            closing_day,
            due_day,
            credit_limit: 1000.0,
            payment_account_id: account_id,
        },
        connection,
    )
    .expect("could not create test card")
}
