//! Financial controls, their members and the role checks that guard every
//! route under `/controls/{control_id}`.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::Deserialize;

use crate::{
    Error,
    auth::{UserID, get_user_by_email, parse_email},
    database_id::{DatabaseId, RowsAffected},
    is_unique_violation,
};

/// Alias for the integer type used for financial control IDs.
pub type ControlId = DatabaseId;

/// What a member may do in a financial control.
///
/// Roles are ordered so that a role also grants everything a lower role can
/// do: `Viewer < Editor < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can read everything in the control.
    Viewer,
    /// Can also create, edit and delete financial data.
    Editor,
    /// Can also manage members and rename or delete the control.
    Owner,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Editor, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Owner => "owner",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Editor => "Editor",
            Role::Owner => "Owner",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "owner" => Ok(Role::Owner),
            other => Err(format!("unknown role \"{other}\"")),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A shared set of accounts, cards and transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub id: ControlId,
    pub name: String,
}

/// A control together with the role the current user has in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMembership {
    pub control: Control,
    pub role: Role,
}

/// A user that belongs to a financial control.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub user_id: UserID,
    pub name: String,
    pub email: String,
    pub role: Role,
}

pub fn create_control_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS control (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS control_member (
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            PRIMARY KEY (control_id, user_id)
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_control_member_user ON control_member(user_id)",
        (),
    )?;

    Ok(())
}

fn validate_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(name)
    }
}

/// Create a financial control and make `owner` its first [Role::Owner].
///
/// # Errors
/// Returns [Error::EmptyName] for a blank name, or an SQL error.
pub fn create_control(
    name: &str,
    owner: UserID,
    connection: &Connection,
) -> Result<Control, Error> {
    let name = validate_name(name)?;
    let transaction = connection.unchecked_transaction()?;

    transaction.execute("INSERT INTO control (name) VALUES (?1)", (name,))?;
    let id = transaction.last_insert_rowid();
    transaction.execute(
        "INSERT INTO control_member (control_id, user_id, role) VALUES (?1, ?2, ?3)",
        (id, owner.as_i64(), Role::Owner),
    )?;

    transaction.commit()?;

    Ok(Control {
        id,
        name: name.to_owned(),
    })
}

pub fn get_control(control_id: ControlId, connection: &Connection) -> Result<Control, Error> {
    connection
        .query_row(
            "SELECT id, name FROM control WHERE id = ?1",
            (control_id,),
            |row| {
                Ok(Control {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .map_err(Error::from)
}

/// Check that `user_id` has at least `required_role` in the control.
///
/// Returns the user's actual role on success.
///
/// # Errors
/// - [Error::NotFound] if the control does not exist or the user is not a
///   member, so that users cannot probe for the controls of others.
/// - [Error::Forbidden] if the user's role is lower than `required_role`.
pub fn authorize(
    control_id: ControlId,
    user_id: UserID,
    required_role: Role,
    connection: &Connection,
) -> Result<Role, Error> {
    let role: Role = connection
        .query_row(
            "SELECT role FROM control_member WHERE control_id = ?1 AND user_id = ?2",
            (control_id, user_id.as_i64()),
            |row| row.get(0),
        )
        .map_err(Error::from)?;

    if role < required_role {
        tracing::debug!(
            "user {user_id} has role {role} in control {control_id}, needs {required_role}"
        );
        return Err(Error::Forbidden);
    }

    Ok(role)
}

/// The financial controls `user_id` belongs to, ordered by name.
pub fn list_controls_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<ControlMembership>, Error> {
    connection
        .prepare(
            "SELECT control.id, control.name, control_member.role
            FROM control
            INNER JOIN control_member ON control_member.control_id = control.id
            WHERE control_member.user_id = ?1
            ORDER BY control.name COLLATE NOCASE, control.id",
        )?
        .query_map((user_id.as_i64(),), |row| {
            Ok(ControlMembership {
                control: Control {
                    id: row.get(0)?,
                    name: row.get(1)?,
                },
                role: row.get(2)?,
            })
        })?
        .map(|maybe_membership| maybe_membership.map_err(Error::from))
        .collect()
}

pub fn rename_control(
    control_id: ControlId,
    name: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let name = validate_name(name)?;
    let rows_affected: RowsAffected = connection.execute(
        "UPDATE control SET name = ?1 WHERE id = ?2",
        (name, control_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete a control together with everything recorded in it.
pub fn delete_control(control_id: ControlId, connection: &Connection) -> Result<(), Error> {
    let rows_affected: RowsAffected =
        connection.execute("DELETE FROM control WHERE id = ?1", (control_id,))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_member_row(row: &Row) -> Result<Member, rusqlite::Error> {
    Ok(Member {
        user_id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
    })
}

/// The members of a control, owners first.
pub fn get_members(control_id: ControlId, connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT user.id, user.name, user.email, control_member.role
            FROM control_member
            INNER JOIN user ON user.id = control_member.user_id
            WHERE control_member.control_id = ?1
            ORDER BY CASE control_member.role
                WHEN 'owner' THEN 0 WHEN 'editor' THEN 1 ELSE 2 END,
                user.name COLLATE NOCASE",
        )?
        .query_map((control_id,), map_member_row)?
        .map(|maybe_member| maybe_member.map_err(Error::from))
        .collect()
}

fn get_member(
    control_id: ControlId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Member, Error> {
    connection
        .query_row(
            "SELECT user.id, user.name, user.email, control_member.role
            FROM control_member
            INNER JOIN user ON user.id = control_member.user_id
            WHERE control_member.control_id = ?1 AND control_member.user_id = ?2",
            (control_id, user_id.as_i64()),
            map_member_row,
        )
        .map_err(Error::from)
}

fn count_owners(control_id: ControlId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM control_member WHERE control_id = ?1 AND role = 'owner'",
            (control_id,),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Add the registered user with the e-mail address `email` to the control.
///
/// # Errors
/// - [Error::InvalidEmail] if `email` is not an e-mail address,
/// - [Error::UnknownEmail] if no user has registered with it,
/// - [Error::AlreadyMember] if the user already belongs to the control.
pub fn add_member(
    control_id: ControlId,
    email: &str,
    role: Role,
    connection: &Connection,
) -> Result<Member, Error> {
    let email = parse_email(email)?;
    let user = get_user_by_email(&email, connection).map_err(|error| match error {
        Error::NotFound => Error::UnknownEmail(email.to_string()),
        error => error,
    })?;

    connection
        .execute(
            "INSERT INTO control_member (control_id, user_id, role) VALUES (?1, ?2, ?3)",
            (control_id, user.id.as_i64(), role),
        )
        .map_err(|error| {
            if is_unique_violation(&error) || is_primary_key_violation(&error) {
                Error::AlreadyMember
            } else {
                error.into()
            }
        })?;

    Ok(Member {
        user_id: user.id,
        name: user.name,
        email: user.email.to_string(),
        role,
    })
}

fn is_primary_key_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
            },
            _,
        )
    )
}

/// Change the role of a member.
///
/// # Errors
/// - [Error::NotFound] if the user is not a member,
/// - [Error::LastOwner] if the member is the only owner and would be demoted.
pub fn update_member_role(
    control_id: ControlId,
    user_id: UserID,
    role: Role,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;
    let member = get_member(control_id, user_id, &transaction)?;

    if member.role == Role::Owner
        && role != Role::Owner
        && count_owners(control_id, &transaction)? <= 1
    {
        return Err(Error::LastOwner);
    }

    transaction.execute(
        "UPDATE control_member SET role = ?1 WHERE control_id = ?2 AND user_id = ?3",
        (role, control_id, user_id.as_i64()),
    )?;
    transaction.commit()?;

    Ok(())
}

/// Remove a member from the control.
///
/// # Errors
/// - [Error::NotFound] if the user is not a member,
/// - [Error::LastOwner] if the member is the only owner.
pub fn remove_member(
    control_id: ControlId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;
    let member = get_member(control_id, user_id, &transaction)?;

    if member.role == Role::Owner && count_owners(control_id, &transaction)? <= 1 {
        return Err(Error::LastOwner);
    }

    transaction.execute(
        "DELETE FROM control_member WHERE control_id = ?1 AND user_id = ?2",
        (control_id, user_id.as_i64()),
    )?;
    transaction.commit()?;

    Ok(())
}
