//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash, is_unique_violation};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The address used to log in and to be invited to financial controls.
    pub email: EmailAddress,
    /// The name shown to other members of a financial control.
    pub name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Parse and normalise an email address entered by a user.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] if `raw_email` is not a valid address.
pub fn parse_email(raw_email: &str) -> Result<EmailAddress, Error> {
    let trimmed = raw_email.trim().to_lowercase();

    EmailAddress::from_str(&trimmed).map_err(|_| Error::InvalidEmail(raw_email.to_owned()))
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::EmptyName] if `name` is blank,
/// - [Error::DuplicateEmail] if another user has the same email address,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    email: EmailAddress,
    name: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .execute(
            "INSERT INTO user (email, name, password) VALUES (?1, ?2, ?3)",
            (email.as_str(), name, password_hash.as_ref()),
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateEmail
            } else {
                error.into()
            }
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        name: name.to_owned(),
        password_hash,
    })
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_email: String = row.get(1)?;
    let name = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        email: EmailAddress::new_unchecked(raw_email),
        name,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email address.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, password FROM user WHERE email = :email")?
        .query_row(&[(":email", email.as_str())], map_user_row)
        .map_err(|error| error.into())
}

/// Replace the password of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::auth::{PasswordHash, UserID};

    use super::{
        Error, create_user, create_user_table, get_user_by_email, get_user_by_id, parse_email,
        update_password,
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();
        let password_hash = PasswordHash::new_unchecked("hunter2");
        let email = parse_email("ana@example.com").unwrap();

        let inserted_user =
            create_user(email.clone(), " Ana ", password_hash.clone(), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, email);
        assert_eq!(inserted_user.name, "Ana");
        assert_eq!(inserted_user.password_hash, password_hash);
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        let email = parse_email("ana@example.com").unwrap();
        create_user(
            email.clone(),
            "Ana",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let result = create_user(
            email,
            "Other Ana",
            PasswordHash::new_unchecked("hunter3"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn insert_user_fails_on_empty_name() {
        let db_connection = get_db_connection();

        let result = create_user(
            parse_email("ana@example.com").unwrap(),
            "   ",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::EmptyName));
    }

    #[test]
    fn parse_email_normalises_case_and_whitespace() {
        let email = parse_email("  Ana@Example.COM ").unwrap();

        assert_eq!(email.as_str(), "ana@example.com");
    }

    #[test]
    fn parse_email_rejects_invalid_address() {
        assert_eq!(
            parse_email("not an email"),
            Err(Error::InvalidEmail("not an email".to_owned()))
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_by_id_and_email() {
        let db_connection = get_db_connection();
        let test_user = create_user(
            parse_email("ana@example.com").unwrap(),
            "Ana",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        assert_eq!(get_user_by_id(test_user.id, &db_connection), Ok(test_user.clone()));
        assert_eq!(
            get_user_by_email(&test_user.email, &db_connection),
            Ok(test_user)
        );
    }

    #[test]
    fn update_password_replaces_hash() {
        let db_connection = get_db_connection();
        let user = create_user(
            parse_email("ana@example.com").unwrap(),
            "Ana",
            PasswordHash::new_unchecked("old"),
            &db_connection,
        )
        .unwrap();
        let new_hash = PasswordHash::new_unchecked("new");

        update_password(user.id, &new_hash, &db_connection).unwrap();

        let got = get_user_by_id(user.id, &db_connection).unwrap();
        assert_eq!(got.password_hash, new_hash);
    }
}
