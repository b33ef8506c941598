//! Retrying request primitive and the four remote operations built on it.

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;
use log::{info, warn};
use serde_json::Value;

use super::{
    SyncError, Transport,
    protocol::{self, Action, ConfigUpdate},
};
use crate::{config::DeviceConfig, storage::UserId};

pub const RESPONSE_BUFFER_BYTES: usize = 1024;
const MAX_PARAMS: usize = 4;

pub struct RequestClient<T, D>
where
    T: Transport,
    D: DelayNs,
{
    transport: T,
    delay: D,
    config: DeviceConfig,
    body: [u8; RESPONSE_BUFFER_BYTES],
}

impl<T, D> RequestClient<T, D>
where
    T: Transport,
    D: DelayNs,
{
    pub fn new(transport: T, delay: D, config: DeviceConfig) -> Self {
        Self {
            transport,
            delay,
            config,
            body: [0; RESPONSE_BUFFER_BYTES],
        }
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Issue `action` with the bounded retry budget.
    ///
    /// `Ok(None)` means a response arrived but was not a structured payload.
    pub async fn call(
        &mut self,
        action: Action,
        extra: &[(&str, &str)],
    ) -> Result<Option<Value>, SyncError> {
        let mut params: Vec<(&str, &str), MAX_PARAMS> = Vec::new();
        let _ = params.push(("device", self.config.device_id));
        let _ = params.push(("action", action.tag()));
        for param in extra {
            if params.push(*param).is_err() {
                warn!("sync: dropped param key={}", param.0);
            }
        }

        let attempts = self.config.retry_attempts.max(1);
        for attempt in 1..=attempts {
            if attempt > 1 {
                warn!(
                    "sync: retrying action={} attempt={attempt}/{attempts}",
                    action.tag()
                );
                self.delay.delay_ms(self.config.retry_backoff_ms).await;
            }

            match self
                .transport
                .get(self.config.endpoint, &params, &mut self.body)
                .await
            {
                Ok(len) => {
                    let len = len.min(self.body.len());
                    let reply = protocol::parse_reply(&self.body[..len]);
                    if reply.is_none() {
                        warn!("sync: unstructured reply action={} len={len}", action.tag());
                    }
                    return Ok(reply);
                }
                Err(err) => {
                    warn!(
                        "sync: attempt {attempt}/{attempts} failed action={} err={err:?}",
                        action.tag()
                    );
                }
            }
        }

        info!("sync: giving up action={} attempts={attempts}", action.tag());
        Err(SyncError::Transport { attempts })
    }

    pub async fn bind(&mut self, code: &str) -> Result<UserId, SyncError> {
        let reply = self.call(Action::Bind, &[("code", code)]).await?;
        protocol::parse_bind(reply.as_ref())
    }

    pub async fn pull_config(&mut self, user_id: &str) -> Result<ConfigUpdate, SyncError> {
        let reply = self
            .call(Action::GetConfig, &[("userId", user_id)])
            .await?;
        protocol::parse_config(reply.as_ref())
    }

    /// Any response counts as acknowledged.
    pub async fn log_taken(&mut self, user_id: &str) -> Result<(), SyncError> {
        self.call(Action::Eat, &[("userId", user_id)])
            .await
            .map(|_| ())
    }

    pub async fn notify_alarm(&mut self, user_id: &str) -> Result<(), SyncError> {
        self.call(Action::NotifyAlarm, &[("userId", user_id)])
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::sync::fakes::{RecordingDelay, ScriptedTransport};

    fn client(
        replies: impl IntoIterator<Item = Result<&'static str, ()>>,
    ) -> RequestClient<ScriptedTransport, RecordingDelay> {
        RequestClient::new(
            ScriptedTransport::with_replies(replies),
            RecordingDelay::default(),
            DeviceConfig::default(),
        )
    }

    #[test]
    fn failing_transport_uses_whole_budget() {
        let mut client = client([]);
        let result = block_on(client.notify_alarm("U1"));

        assert_eq!(result, Err(SyncError::Transport { attempts: 3 }));
        assert_eq!(client.transport.calls.len(), 3);
        assert_eq!(client.delay.delays_ms, [2_000, 2_000]);
    }

    #[test]
    fn recovers_on_later_attempt() {
        let mut client = client([Err(()), Ok(r#"{"status":"success","userId":"U9"}"#)]);
        let user_id = block_on(client.bind("4821")).unwrap();

        assert_eq!(user_id.as_str(), "U9");
        assert_eq!(client.delay.delays_ms, [2_000]);
        assert_eq!(
            client.transport.calls[0],
            "device=esp32&action=bind&code=4821"
        );
    }

    #[test]
    fn unstructured_reply_still_acknowledges_log() {
        let mut client = client([Ok("OK")]);
        assert_eq!(block_on(client.log_taken("U1")), Ok(()));
        assert!(client.delay.delays_ms.is_empty());
    }

    #[test]
    fn unstructured_reply_fails_config_pull() {
        let mut client = client([Ok("<html></html>")]);
        assert_eq!(
            block_on(client.pull_config("U1")),
            Err(SyncError::Malformed)
        );
        assert_eq!(client.transport.calls.len(), 1);
    }
}
