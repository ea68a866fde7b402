use crate::admin::input::{self, LineReader};
use crate::admin::{AdminError, AdminResult};
use crate::app::AppState;
use crate::auth::password;
use crate::config::{Config, RegexType};
use crate::form::{FormErrors, SignupForm};
use crate::model::user::{NewUser, User};
use crate::schema::{user, user_session};
use diesel::prelude::*;
use tracing::info;

pub fn create_user(state: &AppState, reader: &mut dyn LineReader) -> AdminResult<()> {
    println!("Please enter the name and password of the new user. Enter \"done\" when finished.");
    let name = input::read("Username: ", reader)?;
    let password = input::read("Password: ", reader)?;

    let mut conn = state.get_connection()?;
    let user = insert(&mut conn, &state.config, &name, &password)?;
    info!("Created user {}", user.name);
    println!("User created.\n");
    Ok(())
}

/// Prompts for a username and a new password for that user.
pub fn reset_password(state: &AppState, reader: &mut dyn LineReader) -> AdminResult<()> {
    println!(
        "Please enter the username of the user you would like to reset a password for. Enter \"done\" when finished."
    );
    let name = input::read("Username: ", reader)?;
    let password = input::read("New password: ", reader)?;

    let mut conn = state.get_connection()?;
    update_password(&mut conn, &state.config, &name, &password)?;
    println!("Password reset successful.\n");
    Ok(())
}

/// Creates a user under the same rules as signing up through the site.
fn insert(conn: &mut SqliteConnection, config: &Config, name: &str, password: &str) -> AdminResult<User> {
    let form = SignupForm {
        username: name.to_owned(),
        password1: password.to_owned(),
        password2: password.to_owned(),
    };
    let errors = form.validate(conn, config)?;
    if !errors.is_empty() {
        return Err(AdminError::InvalidInput(errors));
    }

    let password_hash = password::hash_password(config, password)?;
    NewUser::new(form.username.trim(), &password_hash)
        .insert_into(user::table)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(AdminError::from)
}

/// Replaces the password of user `name`. Existing sessions of the user are ended.
fn update_password(conn: &mut SqliteConnection, config: &Config, name: &str, password: &str) -> AdminResult<()> {
    let user_id: i64 = user::table
        .select(user::id)
        .filter(user::name.eq(name))
        .first(conn)
        .optional()?
        .ok_or_else(|| AdminError::MissingUser(name.to_owned()))?;
    if !config.regex(RegexType::Password).is_match(password) {
        let mut errors = FormErrors::default();
        errors.add("password", "This password is too short. It must contain at least 8 characters.");
        return Err(AdminError::InvalidInput(errors));
    }

    let password_hash = password::hash_password(config, password)?;
    conn.transaction(|conn| {
        diesel::update(user::table.find(user_id))
            .set(user::password_hash.eq(&password_hash))
            .execute(conn)?;
        let ended_sessions = diesel::delete(user_session::table.filter(user_session::user_id.eq(user_id))).execute(conn)?;
        info!("Reset password of {name} and ended {ended_sessions} sessions");
        Ok::<_, AdminError>(())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auth::session;
    use crate::test::*;

    #[test]
    fn user_creation() {
        let state = test_state();
        let mut conn = state.get_connection().unwrap();
        let config = &state.config;

        let user = insert(&mut conn, config, "new_admin", TEST_PASSWORD).unwrap();
        assert_eq!(user.name.as_str(), "new_admin");
        assert!(password::is_valid_password(config, &user.password_hash, TEST_PASSWORD).is_ok());

        let invalid = |result: AdminResult<User>| match result {
            Err(AdminError::InvalidInput(errors)) => errors,
            _ => panic!("Expected invalid input"),
        };
        assert!(invalid(insert(&mut conn, config, "new_admin", TEST_PASSWORD)).contains("username"));
        assert!(invalid(insert(&mut conn, config, "groups", TEST_PASSWORD)).contains("username"));
        assert!(invalid(insert(&mut conn, config, "other_admin", "short")).contains("password1"));
    }

    #[test]
    fn password_reset() -> QueryResult<()> {
        let state = test_state();
        let mut conn = state.get_connection().unwrap();
        let config = &state.config;
        let user = create_test_user(&mut conn, config, TEST_USERNAME)?;
        let token = session::start(&mut conn, config, user.id)?;

        assert!(matches!(
            update_password(&mut conn, config, "nobody", "new_password"),
            Err(AdminError::MissingUser(_))
        ));
        assert!(matches!(
            update_password(&mut conn, config, TEST_USERNAME, "short"),
            Err(AdminError::InvalidInput(_))
        ));
        update_password(&mut conn, config, TEST_USERNAME, "new_password").unwrap();

        let password_hash: String = user::table.find(user.id).select(user::password_hash).first(&mut conn)?;
        assert!(password::is_valid_password(config, &password_hash, "new_password").is_ok());
        assert!(password::is_valid_password(config, &password_hash, TEST_PASSWORD).is_err());
        assert!(session::resolve(&mut conn, &token)?.is_none());
        Ok(())
    }
}
