//! Account commands: register, login, logout, whoami.
//!
//! # Usage
//!
//! ```bash
//! wm register -u alice -e alice@example.com -p 'correct horse'
//! wm login -e alice@example.com -p 'correct horse'
//! wm whoami
//! wm logout
//! ```
//!
//! The password may also come from `WAYMARK_PASSWORD`.

use std::error::Error;

use waymark_core::{LoginRequest, PublicUser, RegisterRequest};

use super::{Controller, login_hint};

#[allow(clippy::print_stdout)]
fn print_user(prefix: &str, user: &PublicUser) {
    println!("{prefix} {} <{}> (id {})", user.username, user.email, user.id);
}

pub async fn register(
    ctl: &mut Controller,
    username: String,
    email: String,
    password: String,
) -> Result<(), Box<dyn Error>> {
    let session = ctl
        .register(RegisterRequest {
            username,
            email,
            password,
        })
        .await?;
    print_user("Registered and signed in as", &session.user);
    Ok(())
}

pub async fn login(
    ctl: &mut Controller,
    email: String,
    password: String,
) -> Result<(), Box<dyn Error>> {
    let session = ctl.login(LoginRequest { email, password }).await?;
    print_user("Signed in as", &session.user);
    Ok(())
}

pub async fn logout(ctl: &mut Controller) -> Result<(), Box<dyn Error>> {
    ctl.logout().await?;
    #[allow(clippy::print_stdout)]
    {
        println!("Signed out");
    }
    Ok(())
}

pub async fn whoami(ctl: &mut Controller) -> Result<(), Box<dyn Error>> {
    match ctl.whoami().await {
        Ok(user) => {
            print_user("Signed in as", &user);
            Ok(())
        }
        Err(failure) => {
            login_hint(ctl);
            Err(failure.into())
        }
    }
}
