//! Account administration

use std::io::{self, BufRead};

use anyhow::{bail, Context};
use clap::Args;
use cmt_service::MaintenanceService;

use crate::context::service_context;

#[derive(Args)]
pub struct SetPasswordArgs {
    /// Member email
    pub email: String,
}

pub async fn set_password(args: SetPasswordArgs) -> anyhow::Result<()> {
    let password = read_password(io::stdin().lock())?;

    let ctx = service_context().await?;
    let member_id = MaintenanceService::new(&ctx)
        .set_password(&args.email, &password)
        .await?;
    println!("Password updated for {} ({member_id})", args.email);
    Ok(())
}

/// First line of input without its line ending
fn read_password(mut input: impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("reading password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("no password given on stdin");
    }
    Ok(password.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_newline() {
        let password = read_password("Secret123 \n".as_bytes()).unwrap();
        assert_eq!(password, "Secret123 ");
    }

    #[test]
    fn test_read_password_rejects_empty() {
        assert!(read_password("\n".as_bytes()).is_err());
        assert!(read_password("".as_bytes()).is_err());
    }
}
