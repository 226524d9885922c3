//! Auth command handlers.

use anyhow::Result;
use khetsetu_core::api::{mask_token, Credentials, PasswordChange, Registration};
use khetsetu_core::validate;

use super::{build_session, prompt_line};
use crate::cli::FarmArgs;

pub async fn login(email: String, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_line("Password")?,
    };

    let mut session = build_session()?;
    let user = session.login(&Credentials { email, password }).await?;

    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn register(
    name: String,
    email: String,
    phone: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
    farm: FarmArgs,
) -> Result<()> {
    let (password, confirm_password) = match password {
        Some(password) => (password, confirm_password),
        None => {
            let password = prompt_line("Password")?;
            let confirm = prompt_line("Confirm password")?;
            (password, Some(confirm))
        }
    };

    // Per-field validation runs before any network call.
    let errors = validate::validate_registration(&email, &password, confirm_password.as_deref());
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("{}: {}", error.field, error.message);
        }
        anyhow::bail!("Registration input invalid");
    }

    let registration = Registration {
        name,
        email,
        phone,
        password,
        profile: farm.into_profile(),
    };

    let mut session = build_session()?;
    let user = session.register(&registration).await?;

    println!("Account created for {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn logout() -> Result<()> {
    let mut session = build_session()?;
    if !session.client().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }

    session.logout().await;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami() -> Result<()> {
    let mut session = build_session()?;
    session.check_auth().await;

    match &session.state().user {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            if let Some(role) = &user.role {
                println!("Role: {role}");
            }
            if let Some(token) = session.client().access_token() {
                println!("Session token: {}", mask_token(&token));
            }
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

pub async fn passwd(current: Option<String>, new: Option<String>) -> Result<()> {
    let current = match current {
        Some(current) => current,
        None => prompt_line("Current password")?,
    };
    let new = match new {
        Some(new) => new,
        None => prompt_line("New password")?,
    };

    let errors = validate::password_errors(&new);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("{}: {}", error.field, error.message);
        }
        anyhow::bail!("New password too weak");
    }

    let mut session = build_session()?;
    session
        .change_password(&PasswordChange {
            current_password: current,
            new_password: new,
        })
        .await?;

    println!("Password updated.");
    Ok(())
}
