use bcrypt::{hash, verify, BcryptError};
use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension};
use uuid::Uuid;

use crate::models::db_operations::uuid_column;
use crate::models::{Identity, Role};

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

/// Emails are stored and looked up in lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn create_user(conn: &Connection, email: &str, password: &str, cost: u32) -> Result<Identity, RusqliteError> {
    let identity = Identity {
        id: Uuid::new_v4(),
        email: normalize_email(email),
        password_hash: hash(password, cost).map_err(bcrypt_to_rusqlite_error)?,
    };
    conn.execute(
        "INSERT INTO users (id, email, password_hash) VALUES (?1, ?2, ?3)",
        params![identity.id.to_string(), identity.email, identity.password_hash],
    )?;
    Ok(identity)
}

pub fn read_user_by_email(conn: &Connection, email: &str) -> Result<Option<Identity>, RusqliteError> {
    conn.query_row(
        "SELECT id, email, password_hash FROM users WHERE email = ?1",
        [normalize_email(email)],
        |row| {
            Ok(Identity {
                id: uuid_column(row, 0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        [normalize_email(email)],
        |row| row.get(0),
    )
}

/// Returns the identity only when it exists and the password matches.
pub fn verify_credentials(conn: &Connection, email: &str, password: &str) -> Result<Option<Identity>, RusqliteError> {
    let identity = match read_user_by_email(conn, email)? {
        Some(identity) => identity,
        None => return Ok(None),
    };
    if verify(password, &identity.password_hash).unwrap_or(false) {
        Ok(Some(identity))
    } else {
        Ok(None)
    }
}

pub fn add_user_to_role(conn: &Connection, user_id: Uuid, role: Role) -> Result<(), RusqliteError> {
    conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
        params![user_id.to_string(), role.id().to_string()],
    )?;
    Ok(())
}

pub fn read_roles_for_user(conn: &Connection, user_id: Uuid) -> Result<Vec<Role>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id WHERE ur.user_id = ?1 ORDER BY r.name",
    )?;
    let names = stmt.query_map([user_id.to_string()], |row| row.get::<_, String>(0))?;

    let mut roles = Vec::new();
    for name in names {
        let name = name?;
        match Role::from_name(&name) {
            Some(role) => roles.push(role),
            None => log::warn!("Ignoring unknown role '{}' held by user {}", name, user_id),
        }
    }
    Ok(roles)
}

pub fn read_emails_with_role(conn: &Connection, role: Role) -> Result<Vec<String>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT u.email FROM users u JOIN user_roles ur ON ur.user_id = u.id WHERE ur.role_id = ?1 ORDER BY u.email",
    )?;
    let rows = stmt.query_map([role.id().to_string()], |row| row.get(0))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::create_memory_pool;

    const TEST_COST: u32 = 4;

    #[test]
    fn credentials_verify_only_with_the_right_password() {
        let pool = create_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let created = create_user(&conn, "  Writer@Example.com ", "S3cret!pw", TEST_COST).unwrap();
        assert_eq!(created.email, "writer@example.com");

        let found = verify_credentials(&conn, "WRITER@example.com", "S3cret!pw").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(verify_credentials(&conn, "writer@example.com", "wrong").unwrap().is_none());
        assert!(verify_credentials(&conn, "nobody@example.com", "S3cret!pw").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_violates_uniqueness() {
        let pool = create_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_user(&conn, "dup@example.com", "S3cret!pw", TEST_COST).unwrap();
        assert!(email_exists(&conn, "DUP@example.com").unwrap());
        assert!(create_user(&conn, "dup@example.com", "S3cret!pw", TEST_COST).is_err());
    }

    #[test]
    fn role_memberships_are_a_set() {
        let pool = create_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = create_user(&conn, "roles@example.com", "S3cret!pw", TEST_COST).unwrap();
        assert!(read_roles_for_user(&conn, user.id).unwrap().is_empty());

        add_user_to_role(&conn, user.id, Role::Writer).unwrap();
        add_user_to_role(&conn, user.id, Role::Reader).unwrap();
        add_user_to_role(&conn, user.id, Role::Writer).unwrap();

        assert_eq!(read_roles_for_user(&conn, user.id).unwrap(), vec![Role::Reader, Role::Writer]);
        assert_eq!(read_emails_with_role(&conn, Role::Writer).unwrap(), vec!["roles@example.com".to_string()]);
    }
}
