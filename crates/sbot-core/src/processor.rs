//! Message dispatch: admin approval commands, the user menu, and everything else.
//!
//! The processor is stateless per message. All collaborators are passed in at
//! construction so the Telegram and MongoDB adapters can be swapped for fakes.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::{
    approval::{
        command::{parse_command, FORMAT_HELP},
        AdminCommand, ApprovalStore,
    },
    audit::{AuditEvent, AuditLogger},
    config::Config,
    domain::UserId,
    formatting::{bold, titled_block},
    messaging::{
        port::{MembershipPort, MessagingPort},
        types::{IncomingMessage, ReplyKeyboard},
    },
    Result,
};

pub const MENU_MY_INFO: &str = "\u{2139}\u{fe0f} My Info";
pub const MENU_RESELLER: &str = "\u{1f4bc} ResellerShip";
pub const MENU_CONTACT_ADMIN: &str = "Contact Admin \u{2714}\u{fe0f}";

pub const WELCOME_TEXT: &str = "\u{1f680} Welcome to the Secure Bot \u{1f680}";
pub const NOT_AUTHORIZED_TEXT: &str = "You are not authorized to use this command";
pub const NO_ACCOUNT_TEXT: &str =
    "No account information found. Please contact the administrator.";
pub const RESELLER_TEXT: &str = "For Reseller Ship, Contact Admin!";
pub const CONTACT_ADMIN_TEXT: &str = "Contact Admin Selected";
pub const INVALID_OPTION_TEXT: &str = "Invalid option";
pub const FAILURE_TEXT: &str = "Something went wrong. Please try again later.";

pub struct CommandProcessor {
    cfg: Arc<Config>,
    store: Arc<dyn ApprovalStore>,
    messenger: Arc<dyn MessagingPort>,
    membership: Arc<dyn MembershipPort>,
    audit: Option<AuditLogger>,
}

impl CommandProcessor {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<dyn ApprovalStore>,
        messenger: Arc<dyn MessagingPort>,
        membership: Arc<dyn MembershipPort>,
    ) -> Self {
        Self {
            cfg,
            store,
            messenger,
            membership,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub async fn handle(&self, msg: &IncomingMessage) -> Result<()> {
        self.handle_on(msg, Local::now().date_naive()).await
    }

    /// Process one message, using `today` as the reference date for new approvals.
    ///
    /// On failure the requester gets a generic reply and the error channel gets a
    /// report before the error is returned.
    pub async fn handle_on(&self, msg: &IncomingMessage, today: NaiveDate) -> Result<()> {
        let result = self.dispatch(msg, today).await;
        if let Err(e) = &result {
            self.report_failure(msg, &e.to_string()).await;
        }
        result
    }

    async fn dispatch(&self, msg: &IncomingMessage, today: NaiveDate) -> Result<()> {
        let text = msg.text.as_deref().unwrap_or("");

        if text.starts_with('/') {
            let (cmd, args) = parse_command(text);
            return match cmd.as_str() {
                "approve" => self.admin_command(msg, true, &args, today).await,
                "disapprove" => self.admin_command(msg, false, &args, today).await,
                "start" => self.welcome(msg).await,
                _ => self.invalid_option(msg).await,
            };
        }

        match text {
            MENU_MY_INFO => self.my_info(msg).await,
            MENU_RESELLER => {
                self.messenger
                    .send_html(msg.chat_id, &bold(RESELLER_TEXT))
                    .await?;
                Ok(())
            }
            MENU_CONTACT_ADMIN => {
                self.messenger
                    .reply_html(msg.message, &bold(CONTACT_ADMIN_TEXT))
                    .await?;
                Ok(())
            }
            _ => self.invalid_option(msg).await,
        }
    }

    async fn admin_command(
        &self,
        msg: &IncomingMessage,
        approve: bool,
        args: &str,
        today: NaiveDate,
    ) -> Result<()> {
        let name = if approve { "approve" } else { "disapprove" };

        if !self.is_admin(msg.user_id).await {
            self.audit(&AuditEvent::denied(
                msg.user_id.map(|u| u.0),
                msg.username.as_deref(),
                name,
            ));
            self.messenger
                .send_html(msg.chat_id, &bold(NOT_AUTHORIZED_TEXT))
                .await?;
            return Ok(());
        }

        let parsed = AdminCommand::parse(approve, args)
            .and_then(|command| command.update_on(today).map(|update| (command, update)));
        let (command, update) = match parsed {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(command = name, error = %e, "rejected admin command");
                self.messenger
                    .send_html(msg.chat_id, &bold(FORMAT_HELP))
                    .await?;
                return Ok(());
            }
        };

        let target = command.target();
        self.store.upsert(target, update.clone()).await?;

        tracing::info!(
            admin = msg.user_id.map(|u| u.0),
            target = target.0,
            plan = update.plan,
            valid_until = %update.valid_until_str(),
            "{name} applied"
        );
        if let Some(admin) = msg.user_id {
            self.audit(&AuditEvent::approval(
                name,
                admin.0,
                msg.username.as_deref(),
                target.0,
                update.plan,
                &update.valid_until_str(),
            ));
        }

        let text = bold(&command.confirmation());
        self.messenger.send_html(msg.chat_id, &text).await?;

        // Best-effort once the store is updated.
        if let Err(e) = self
            .messenger
            .send_html(self.cfg.broadcast_channel, &text)
            .await
        {
            tracing::error!(
                target = target.0,
                channel = self.cfg.broadcast_channel.0,
                error = %e,
                "broadcast mirror failed"
            );
            self.report_to_error_channel(msg, &format!("broadcast mirror failed: {e}"))
                .await;
        }
        Ok(())
    }

    /// Live membership lookup in the broadcast channel. Lookup errors deny.
    async fn is_admin(&self, user_id: Option<UserId>) -> bool {
        let Some(user_id) = user_id else {
            return false;
        };
        match self
            .membership
            .member_status(self.cfg.broadcast_channel, user_id)
            .await
        {
            Ok(status) => status.is_privileged(),
            Err(e) => {
                tracing::warn!(user = user_id.0, error = %e, "membership lookup failed");
                false
            }
        }
    }

    async fn welcome(&self, msg: &IncomingMessage) -> Result<()> {
        let keyboard = ReplyKeyboard::grid(&[MENU_MY_INFO, MENU_RESELLER, MENU_CONTACT_ADMIN], 2)
            .resized()
            .one_time();
        self.messenger
            .send_reply_keyboard(msg.chat_id, &bold(WELCOME_TEXT), keyboard)
            .await?;
        Ok(())
    }

    async fn my_info(&self, msg: &IncomingMessage) -> Result<()> {
        let record = match msg.user_id {
            Some(user_id) => self.store.get(user_id).await?,
            None => None,
        };

        let html = match record {
            None => bold(NO_ACCOUNT_TEXT),
            Some(rec) => {
                let username = msg.username.as_deref().unwrap_or("No Username");
                titled_block(
                    "\u{1f464} User Info",
                    &[
                        format!("\u{1f516} Role: {}", rec.role_label()),
                        format!("\u{1f194} User ID: {}", rec.user_id.0),
                        format!("\u{1f464} Username: @{username}"),
                        format!("\u{23f3} Approval Expiry: {}", rec.expiry_label()),
                    ],
                )
            }
        };

        self.messenger.reply_html(msg.message, &html).await?;
        Ok(())
    }

    async fn invalid_option(&self, msg: &IncomingMessage) -> Result<()> {
        self.messenger
            .reply_html(msg.message, &bold(INVALID_OPTION_TEXT))
            .await?;
        Ok(())
    }

    async fn report_failure(&self, msg: &IncomingMessage, error: &str) {
        if let Err(e) = self
            .messenger
            .reply_html(msg.message, &bold(FAILURE_TEXT))
            .await
        {
            tracing::warn!(chat = msg.chat_id.0, error = %e, "failed to send failure reply");
        }
        self.report_to_error_channel(msg, error).await;
    }

    async fn report_to_error_channel(&self, msg: &IncomingMessage, error: &str) {
        let report = titled_block(
            "\u{26a0}\u{fe0f} Handler failure",
            &[
                format!("Chat: {}", msg.chat_id.0),
                format!(
                    "User: {}",
                    msg.user_id
                        .map(|u| u.0.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                ),
                format!("Text: {}", msg.text.as_deref().unwrap_or("")),
                format!("Error: {error}"),
            ],
        );
        if let Err(e) = self
            .messenger
            .send_html(self.cfg.error_channel, &report)
            .await
        {
            tracing::warn!(error = %e, "failed to report to error channel");
        }
    }

    fn audit(&self, event: &AuditEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Err(e) = audit.write(event) {
            tracing::warn!(path = %audit.path().display(), error = %e, "audit write failed");
        }
    }
}
