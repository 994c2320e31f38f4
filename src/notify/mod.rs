use crate::models::{PositionEvent, PositionEventKind, Side, SignalRow};
use reqwest::Client;
use std::sync::{Arc, Mutex};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Flush immediately once this many messages are buffered
const FLUSH_THRESHOLD: usize = 10;

/// Buffered Telegram notifier.
///
/// Signals are queued as pre-formatted HTML messages and delivered in one
/// batched `sendMessage` call, either when the flush loop ticks or as soon
/// as the buffer reaches the threshold. Clones share the same buffer.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
    pending: Arc<Mutex<Vec<String>>>,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self::with_base_url(TELEGRAM_API_BASE.to_string(), bot_token, chat_id)
    }

    pub fn with_base_url(base_url: String, bot_token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            bot_token,
            chat_id,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a batched alert for a symbol whose latest candle closed in an
    /// extreme state
    pub async fn queue_signal(&self, symbol: &str, row: &SignalRow) {
        let marker = match row.side {
            Side::Oversold => "🔻",
            Side::Overbought => "🔺",
            Side::Neutral => "⚪",
        };
        let dist = row.dist_pct.unwrap_or(0.0);

        let message = format!(
            "📊 <b>{symbol} ||</b> {marker} || {dist:.2}%\n\
             Time: {time}\n\
             Close: {close:.4}\n\
             <a href=\"https://www.binance.com/en/futures/{symbol}\">Open {symbol}</a>",
            time = row.time,
            close = row.close,
        );

        self.push(message).await;
    }

    /// Queue a position lifecycle event for the same channel
    pub async fn queue_position_event(&self, event: &PositionEvent) {
        let message = match event.kind {
            PositionEventKind::Opened => {
                format!("📈 <b>Position opened:</b> {}", event.symbol)
            }
            PositionEventKind::Increased => format!(
                "➕ <b>Position increased:</b> {} (+{:.4})",
                event.symbol,
                event.delta.unwrap_or(0.0)
            ),
            PositionEventKind::Closed => {
                format!("✅ <b>Position closed:</b> {}", event.symbol)
            }
        };

        self.push(message).await;
    }

    async fn push(&self, message: String) {
        let should_flush = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.push(message);
            pending.len() >= FLUSH_THRESHOLD
        };

        // If the buffer is too big, flush immediately
        if should_flush {
            self.flush().await;
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Send all buffered messages as one batch.
    ///
    /// Send errors are logged; the buffer is dropped either way so a broken
    /// delivery never wedges subsequent batches.
    pub async fn flush(&self) {
        let messages: Vec<String> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };
        if messages.is_empty() {
            return;
        }

        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": messages.join("\n\n"),
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Sent batch of {} signals", messages.len());
            }
            Ok(response) => {
                tracing::error!(
                    "Telegram send failed with status {} ({} messages dropped)",
                    response.status(),
                    messages.len()
                );
            }
            Err(e) => {
                tracing::error!("Telegram send error: {} ({} messages dropped)", e, messages.len());
            }
        }
    }
}
