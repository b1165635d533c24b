use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use teloxide::{
    prelude::*,
    types::{AllowedUpdate, Update, UpdateKind},
};
use tokio_util::sync::CancellationToken;

use sbot_core::{
    approval::ApprovalStore,
    audit::AuditLogger,
    config::Config,
    processor::CommandProcessor,
    supervisor::{supervise, RestartPolicy},
};

use crate::handlers;
use crate::TelegramMessenger;

/// Headroom on top of the long-poll timeout before the HTTP client gives up.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Long-poll update source. The offset survives restarts of `run`.
pub struct Poller {
    bot: Bot,
    timeout: Duration,
    offset: AtomicI32,
}

impl Poller {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self {
            bot,
            timeout,
            offset: AtomicI32::new(0),
        }
    }

    /// Poll forever, handling each message of a batch in arrival order.
    ///
    /// Returns only on a transport error. Handler errors are logged and the loop
    /// moves on; the offset is advanced first so a failing message is not redelivered.
    pub async fn run(&self, processor: &CommandProcessor) -> anyhow::Result<()> {
        loop {
            let updates = self
                .bot
                .get_updates()
                .offset(self.offset.load(Ordering::SeqCst))
                .timeout(self.timeout.as_secs() as u32)
                .allowed_updates(vec![AllowedUpdate::Message])
                .await?;

            self.dispatch_batch(updates, processor).await;
        }
    }

    async fn dispatch_batch(&self, updates: Vec<Update>, processor: &CommandProcessor) {
        for update in updates {
            self.offset.store(update.id + 1, Ordering::SeqCst);

            let UpdateKind::Message(msg) = update.kind else {
                continue;
            };
            let incoming = handlers::incoming_message(&msg);
            if let Err(e) = processor.handle(&incoming).await {
                tracing::error!(
                    chat = incoming.chat_id.0,
                    user = incoming.user_id.map(|u| u.0),
                    error = %e,
                    "failed to handle message"
                );
            }
        }
    }
}

fn http_client(poll_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    teloxide::net::default_reqwest_settings()
        .timeout(poll_timeout + HTTP_TIMEOUT_SLACK)
        .build()
}

pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<dyn ApprovalStore>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let bot = Bot::with_client(cfg.telegram_bot_token.clone(), http_client(cfg.poll_timeout)?);

    match bot.get_me().await {
        Ok(me) => tracing::info!("Secure Bot is running as @{}", me.username()),
        Err(e) => tracing::warn!(error = %e, "Secure Bot is running (get_me failed)"),
    }

    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let mut processor =
        CommandProcessor::new(cfg.clone(), store, messenger.clone(), messenger);
    if let Some(path) = &cfg.audit_log_path {
        tracing::info!(path = %path.display(), "audit log enabled");
        processor = processor.with_audit(AuditLogger::new(path.clone(), cfg.audit_log_json));
    }

    let poller = Poller::new(bot, cfg.poll_timeout);
    let policy = RestartPolicy {
        restart_delay: cfg.restart_delay,
        on_failure: cfg.failure_policy,
    };

    supervise("telegram-poll", policy, shutdown, || poller.run(&processor)).await
}
