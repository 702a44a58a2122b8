//! User commands - profiles, contacts and push subscriptions.

use clap::Subcommand;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;

use st_core::config::ConfigHandle;
use st_core::error::{StError, StResult};
use st_flows::accounts::{find_by_username, get_profile, register_profile};
use st_flows::contacts::{add_contact_by_username, list_contacts};
use st_flows::subscriptions::{list_subscriptions, remove_subscription, save_subscription};
use st_models::{ContactKind, PushTarget, UserProfile, WebPushKeys};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a profile and claim its username.
    Register {
        /// Auth uid of the account.
        uid: String,
        /// Username to claim (3-20 letters, digits or underscores).
        username: String,
        /// Display name (defaults to the username).
        #[arg(short, long)]
        display_name: Option<String>,
    },
    /// Look up a profile by username, or by uid with --uid.
    Lookup {
        /// Username (or uid).
        query: String,
        /// Treat the query as a uid.
        #[arg(long)]
        uid: bool,
    },
    /// List a user's contacts, most recent chat first.
    Contacts {
        uid: String,
    },
    /// Add a contact by username (both sides).
    AddContact {
        uid: String,
        username: String,
    },
    /// Register a push target for a user.
    Subscribe {
        uid: String,
        /// Mobile-push registration token.
        #[arg(long, conflicts_with = "endpoint")]
        token: Option<String>,
        /// Browser push endpoint URL.
        #[arg(long, requires_all = ["p256dh", "auth"])]
        endpoint: Option<String>,
        /// Browser subscription p256dh key.
        #[arg(long)]
        p256dh: Option<String>,
        /// Browser subscription auth secret.
        #[arg(long)]
        auth: Option<String>,
    },
    /// List a user's push subscriptions.
    Subscriptions {
        uid: String,
    },
    /// Remove a push subscription.
    Unsubscribe {
        uid: String,
        subscription_id: String,
    },
}

pub async fn run(config: ConfigHandle, action: UserAction, format: OutputFormat) -> StResult<()> {
    let ctx = super::build_context(&config).await?;

    match action {
        UserAction::Register { uid, username, display_name } => {
            let profile = register_profile(&ctx, &uid, &username, display_name.as_deref()).await?;
            match format {
                OutputFormat::Json => super::print_json(&profile),
                OutputFormat::Text => {
                    println!(
                        "{} Registered @{} as {}",
                        style("OK").green().bold(),
                        profile.username,
                        style(&profile.uid).cyan()
                    );
                    println!("  email: {}", profile.email);
                }
            }
        }

        UserAction::Lookup { query, uid } => {
            let profile = if uid {
                get_profile(&ctx, &query).await?
            } else {
                find_by_username(&ctx, &query).await?
            };
            match (format, profile) {
                (OutputFormat::Json, profile) => super::print_json(&profile),
                (OutputFormat::Text, Some(profile)) => print_profile(&profile),
                (OutputFormat::Text, None) => println!("No user found for {query}."),
            }
        }

        UserAction::Contacts { uid } => {
            let contacts = list_contacts(&ctx, &uid).await?;
            match format {
                OutputFormat::Json => super::print_json(&contacts),
                OutputFormat::Text => {
                    if contacts.is_empty() {
                        println!("No contacts for {uid}.");
                        return Ok(());
                    }
                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL)
                        .apply_modifier(UTF8_ROUND_CORNERS)
                        .set_content_arrangement(ContentArrangement::Dynamic);
                    table.set_header(vec!["Name", "Kind", "Chat", "Last message", "When"]);

                    for c in &contacts {
                        let kind = match c.kind {
                            ContactKind::User => "user",
                            ContactKind::Group => "group",
                        };
                        let when = c
                            .last_message_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "-".to_string());
                        table.add_row(vec![
                            c.display_name.clone(),
                            kind.to_string(),
                            c.chat_id.clone(),
                            super::truncate(c.last_message.as_deref().unwrap_or("-"), 40),
                            when,
                        ]);
                    }

                    println!("{table}");
                    println!("\n{} contact(s)", contacts.len());
                }
            }
        }

        UserAction::AddContact { uid, username } => {
            let contact = add_contact_by_username(&ctx, &uid, &username).await?;
            match format {
                OutputFormat::Json => super::print_json(&contact),
                OutputFormat::Text => println!(
                    "{} Added {} (chat {})",
                    style("OK").green().bold(),
                    contact.display_name,
                    style(&contact.chat_id).cyan()
                ),
            }
        }

        UserAction::Subscribe { uid, token, endpoint, p256dh, auth } => {
            let target = match (token, endpoint, p256dh, auth) {
                (Some(token), _, _, _) => PushTarget::Mobile { token },
                (None, Some(endpoint), Some(p256dh), Some(auth)) => PushTarget::Web {
                    endpoint,
                    keys: WebPushKeys { p256dh, auth },
                },
                _ => {
                    return Err(StError::InvalidInput(
                        "pass --token, or --endpoint with --p256dh and --auth".into(),
                    ))
                }
            };
            let subscription = save_subscription(&ctx, &uid, target, None).await?;
            match format {
                OutputFormat::Json => super::print_json(&subscription),
                OutputFormat::Text => println!(
                    "{} Saved {} as {}",
                    style("OK").green().bold(),
                    subscription.target.label(),
                    style(&subscription.id).cyan()
                ),
            }
        }

        UserAction::Subscriptions { uid } => {
            let subs = list_subscriptions(&ctx, &uid).await?;
            match format {
                OutputFormat::Json => super::print_json(&subs),
                OutputFormat::Text => {
                    if subs.is_empty() {
                        println!("No push subscriptions for {uid}.");
                    }
                    for s in &subs {
                        println!(
                            "  {}  {}  {}",
                            style(&s.id).cyan(),
                            s.target.label(),
                            s.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
        }

        UserAction::Unsubscribe { uid, subscription_id } => {
            let removed = remove_subscription(&ctx, &uid, &subscription_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "removed": removed })),
                OutputFormat::Text if removed => {
                    println!("{} Removed {subscription_id}", style("OK").green().bold())
                }
                OutputFormat::Text => println!("No subscription {subscription_id} for {uid}."),
            }
        }
    }

    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("{}", style(&profile.display_name).bold());
    println!("  uid:      {}", profile.uid);
    println!("  username: @{}", profile.username);
    println!("  email:    {}", profile.email);
    if let Some(about) = &profile.about {
        println!("  about:    {about}");
    }
    if let Some(lang) = &profile.language {
        println!("  language: {lang}");
    }
    println!("  joined:   {}", profile.created_at.format("%Y-%m-%d"));
}
