// src/channels.rs - Notification channel contracts and the SMS gateway queue

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{AlarmError, Result};

// ============================================================================
// CHANNEL CONTRACTS
// ============================================================================

/// SMS transport: one message to one number, one outcome.
#[async_trait]
pub trait SmsChannel: Send + Sync {
    /// Deliver `text` to `number`.
    async fn send(&self, number: &str, text: &str) -> Result<()>;
}

/// Mail transport: one batched message to a list of addresses.
#[async_trait]
pub trait MailChannel: Send + Sync {
    /// Deliver one message to all `addresses` in a single send.
    async fn send(&self, addresses: &[String], subject: &str, text: &str) -> Result<()>;
}

/// Telephony transport: speak a text to one number.
#[async_trait]
pub trait CallChannel: Send + Sync {
    /// Place a call to `number` and speak `text`.
    async fn say(&self, number: &str, text: &str) -> Result<()>;
}

// ============================================================================
// SMS TEXT TRANSLITERATION
// ============================================================================

/// Best-effort transliteration of SMS text to the constrained GSM-style
/// character set.
///
/// Common Latin diacritics map to ASCII; if any character has no mapping
/// the original text is returned unmodified. A text transform must never
/// cost a delivery.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some(mapped) = transliterate_char(c) {
            out.push_str(mapped);
        } else {
            return text.to_string();
        }
    }
    out
}

fn transliterate_char(c: char) -> Option<&'static str> {
    let mapped = match c {
        'å' | 'à' | 'á' | 'â' | 'ã' => "a",
        'ä' | 'æ' => "ae",
        'Å' | 'À' | 'Á' | 'Â' | 'Ã' => "A",
        'Ä' | 'Æ' => "AE",
        'ö' | 'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "o",
        'Ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => "O",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ñ' => "n",
        'Ñ' => "N",
        'ç' => "c",
        'Ç' => "C",
        'ß' => "ss",
        '°' => " deg ",
        'µ' => "u",
        '–' | '—' => "-",
        '\u{2018}' | '\u{2019}' => "'",
        '\u{201c}' | '\u{201d}' => "\"",
        _ => return None,
    };
    Some(mapped)
}

// ============================================================================
// QUEUED SMS GATEWAY
// ============================================================================

struct SmsJob {
    number: String,
    text: String,
    done: oneshot::Sender<Result<()>>,
}

/// Serializing front for an SMS transport.
///
/// A physical modem holds exactly one conversation at a time, so sends go
/// through a bounded queue drained by a single consumer task. The queue
/// bound applies backpressure to dispatch rather than growing without
/// limit during an alarm flood.
pub struct QueuedSmsGateway {
    tx: mpsc::Sender<SmsJob>,
}

impl QueuedSmsGateway {
    /// Wrap `transport` behind a queue of at most `depth` pending sends.
    pub fn new(transport: std::sync::Arc<dyn SmsChannel>, depth: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<SmsJob>(depth.max(1));
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let result = transport.send(&job.number, &job.text).await;
                if let Err(ref e) = result {
                    debug!("sms transport reported failure: {}", e);
                }
                // The submitter may have given up waiting; that is fine.
                let _ = job.done.send(result);
            }
            debug!("sms gateway queue closed");
        });
        Self { tx }
    }
}

#[async_trait]
impl SmsChannel for QueuedSmsGateway {
    async fn send(&self, number: &str, text: &str) -> Result<()> {
        let (done, outcome) = oneshot::channel();
        let job = SmsJob {
            number: number.to_string(),
            text: text.to_string(),
            done,
        };
        if self.tx.send(job).await.is_err() {
            warn!("sms gateway queue is closed, dropping message to {}", number);
            return Err(AlarmError::Channel("sms gateway queue closed".into()));
        }
        outcome
            .await
            .map_err(|_| AlarmError::Channel("sms gateway dropped the job".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[test]
    fn transliterates_common_diacritics() {
        assert_eq!(transliterate("Klornivå hög"), "Klorniva hog");
        assert_eq!(transliterate("Température 40°"), "Temperature 40 deg ");
        assert_eq!(transliterate("plain ascii"), "plain ascii");
    }

    #[test]
    fn unmappable_text_falls_back_unmodified() {
        let text = "水位警报";
        assert_eq!(transliterate(text), text);
        // A single unmappable char keeps the whole text intact.
        assert_eq!(transliterate("pump 故障 stopped"), "pump 故障 stopped");
    }

    struct SlowModem {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SmsChannel for SlowModem {
        async fn send(&self, number: &str, _text: &str) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.sent.lock().await.push(number.to_string());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn gateway_holds_one_modem_conversation_at_a_time() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let gateway = Arc::new(QueuedSmsGateway::new(
            Arc::new(SlowModem {
                in_flight: in_flight.clone(),
                max_in_flight: max_in_flight.clone(),
                sent: sent.clone(),
            }),
            8,
        ));

        let mut handles = Vec::new();
        for i in 0..5 {
            let g = gateway.clone();
            handles.push(tokio::spawn(async move {
                g.send(&format!("+467000000{i}"), "hello").await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(sent.lock().await.len(), 5);
    }
}
