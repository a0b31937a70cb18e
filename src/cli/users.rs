use clap::Subcommand;
use rand::Rng;
use sqlx::SqlitePool;

use crate::auth::{hash_password, normalize_email, validate_credentials, HashCost};
use crate::storage::{CreateUser, SqliteUserStore, UserStore};

/// User management subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Create {
        /// User's email address
        #[arg(short, long)]
        email: String,

        /// Password (if not provided, a random one will be generated)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List,

    /// Reset a user's password
    ResetPassword {
        /// User's email address
        #[arg(short, long)]
        email: String,

        /// New password (if not provided, a random one will be generated)
        #[arg(short, long)]
        password: Option<String>,
    },
}

impl UserCommands {
    /// Execute the user command
    pub async fn execute(self, pool: SqlitePool, cost: &HashCost) -> anyhow::Result<()> {
        let user_store = SqliteUserStore::new(pool);

        match self {
            UserCommands::Create { email, password } => {
                let email = normalize_email(&email);
                let password = password.unwrap_or_else(generate_secure_password);
                validate_credentials(&email, &password)?;
                let password_hash = hash_password(&password, cost)?;

                let user = user_store
                    .create_user(CreateUser {
                        email,
                        password_hash,
                    })
                    .await?;

                println!("✅ User created successfully!");
                println!();
                println!("   Email:    {}", user.email);
                println!("   Password: {}", password);
                println!();
                println!("⚠️  Please securely share these credentials with the user.");
            }

            UserCommands::List => {
                let users = user_store.list_users().await?;

                if users.is_empty() {
                    println!("No users found.");
                    return Ok(());
                }

                println!("{:<6} {:<30} {:<25}", "ID", "Email", "Created");
                println!("{}", "-".repeat(62));

                for user in users {
                    println!(
                        "{:<6} {:<30} {:<25}",
                        user.id,
                        user.email,
                        user.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }

            UserCommands::ResetPassword { email, password } => {
                let email = normalize_email(&email);
                let password = password.unwrap_or_else(generate_secure_password);
                validate_credentials(&email, &password)?;
                let password_hash = hash_password(&password, cost)?;

                user_store.update_password(&email, &password_hash).await?;

                println!("✅ Password reset successfully!");
                println!();
                println!("   Email:        {}", email);
                println!("   New Password: {}", password);
                println!();
                println!("⚠️  Please securely share the new password with the user.");
            }
        }

        Ok(())
    }
}

/// Generate a secure random password
fn generate_secure_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789!@#$%&*";
    let mut rng = rand::thread_rng();

    (0..16)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_passwords_pass_validation() {
        for _ in 0..10 {
            let password = generate_secure_password();
            assert_eq!(password.len(), 16);
            assert!(validate_credentials("a@b.com", &password).is_ok());
        }
    }
}
