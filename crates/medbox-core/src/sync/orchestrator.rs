//! Main-loop executor for the app's pending effects.
//!
//! Every operation blocks the loop while it runs and shows busy and result
//! banners on the display. No failure here leaves the app without a next
//! state.

use core::fmt::{Debug, Write};

use embedded_hal_async::delay::DelayNs;
use heapless::String;
use log::{info, warn};

use super::{Association, SyncError, Transport, request::RequestClient, scan_label};
use crate::{
    app::MedboxApp,
    config::DeviceConfig,
    input::InputProvider,
    outbox::Effect,
    render::{BannerLine, Screen, TextDisplay, draw},
    storage::{BestEffort, DeviceStore, WifiCredentials},
};

pub struct Orchestrator<A, T, D>
where
    A: Association,
    T: Transport,
    D: DelayNs,
{
    association: A,
    client: RequestClient<T, D>,
    config: DeviceConfig,
}

impl<A, T, D> Orchestrator<A, T, D>
where
    A: Association,
    T: Transport,
    D: DelayNs,
{
    pub fn new(association: A, transport: T, delay: D, config: DeviceConfig) -> Self {
        Self {
            association,
            client: RequestClient::new(transport, delay, config),
            config,
        }
    }

    pub fn now_utc(&self) -> Option<i64> {
        self.association.now_utc()
    }

    pub fn association_mut(&mut self) -> &mut A {
        &mut self.association
    }

    pub fn client_mut(&mut self) -> &mut RequestClient<T, D> {
        &mut self.client
    }

    /// Restore the saved alarm, then rejoin the saved network or fall back to
    /// network selection.
    pub async fn boot<IN, S, P>(
        &mut self,
        app: &mut MedboxApp<IN>,
        store: &mut S,
        display: &mut P,
    ) where
        IN: InputProvider,
        IN::Error: Debug,
        S: DeviceStore,
        P: TextDisplay,
        P::Error: Debug,
    {
        let mut store = BestEffort(store);
        app.apply_alarm_config(store.alarm_config());

        if let Some(credentials) = store.wifi_credentials() {
            info!("boot: rejoining ssid={}", credentials.ssid);
            if self.join(&credentials, display).await.is_ok() {
                app.finish_join(true);
                return;
            }
        } else {
            info!("boot: no saved network");
        }

        self.rescan(app, display).await;
    }

    /// Scan for networks and return to the selection screen.
    pub async fn rescan<IN, P>(&mut self, app: &mut MedboxApp<IN>, display: &mut P)
    where
        IN: InputProvider,
        IN::Error: Debug,
        P: TextDisplay,
        P::Error: Debug,
    {
        show(display, &[BannerLine::status("Scanning...")]);
        let entries = match self.association.scan_networks().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("wifi: scan failed err={err:?}");
                heapless::Vec::new()
            }
        };
        app.set_networks(entries.iter().filter_map(scan_label));
    }

    /// Run every pending effect in priority order.
    pub async fn drain<IN, S, P>(&mut self, app: &mut MedboxApp<IN>, store: &mut S, display: &mut P)
    where
        IN: InputProvider,
        IN::Error: Debug,
        S: DeviceStore,
        P: TextDisplay,
        P::Error: Debug,
    {
        while let Some(effect) = app.pending_effect() {
            info!("effect: run name={}", effect.name());
            let mut store = BestEffort(&mut *store);
            match effect {
                Effect::JoinNetwork => self.run_join(app, &mut store, display).await,
                Effect::SaveAlarm => store.save_alarm_config(&app.alarm_config()),
                Effect::BindCode => self.run_bind(app, &mut store, display).await,
                Effect::UploadLog => self.run_upload(&mut store, display).await,
                Effect::SyncConfig => self.run_sync(app, &mut store, display).await,
                Effect::NotifyAlarm => self.run_notify(&mut store).await,
            }
            app.complete_effect(effect);
        }
    }

    async fn join<P>(&mut self, credentials: &WifiCredentials, display: &mut P) -> Result<(), SyncError>
    where
        P: TextDisplay,
        P::Error: Debug,
    {
        show(display, &[BannerLine::at(0, "Connecting...")]);
        let joined = self
            .association
            .connect(
                &credentials.ssid,
                &credentials.password,
                u32::from(self.config.join_timeout_secs),
            )
            .await;
        if let Err(err) = joined {
            warn!("wifi: join failed ssid={} err={err:?}", credentials.ssid);
            return Err(SyncError::JoinTimeout);
        }

        info!("wifi: joined ssid={}", credentials.ssid);
        show(display, &[BannerLine::status("Syncing Time...")]);
        if let Err(err) = self.association.sync_wall_clock().await {
            warn!("clock: sync failed err={err:?}");
        }
        Ok(())
    }

    async fn run_join<IN, S, P>(
        &mut self,
        app: &mut MedboxApp<IN>,
        store: &mut BestEffort<'_, S>,
        display: &mut P,
    ) where
        IN: InputProvider,
        IN::Error: Debug,
        S: DeviceStore,
        P: TextDisplay,
        P::Error: Debug,
    {
        let Some(credentials) = app.take_join_request() else {
            app.finish_join(false);
            return;
        };

        let joined = self.join(&credentials, display).await.is_ok();
        if joined {
            store.save_wifi_credentials(&credentials);
        }
        app.finish_join(joined);
    }

    async fn run_bind<IN, S, P>(
        &mut self,
        app: &mut MedboxApp<IN>,
        store: &mut BestEffort<'_, S>,
        display: &mut P,
    ) where
        IN: InputProvider,
        IN::Error: Debug,
        S: DeviceStore,
        P: TextDisplay,
        P::Error: Debug,
    {
        let Some(code) = app.take_bind_code() else {
            return;
        };

        show(display, &[BannerLine::status("Binding...")]);
        let result = match self.client.bind(&code).await {
            Ok(user_id) => {
                info!("sync: bound user={user_id}");
                store.save_user_id(&user_id);
                "Bind Success!"
            }
            Err(err) => {
                warn!("sync: bind failed err={err}");
                "Bind Failed!"
            }
        };
        self.show_result(display, &[BannerLine::status(result)], self.config.banner_ms)
            .await;
    }

    async fn run_upload<S, P>(&mut self, store: &mut BestEffort<'_, S>, display: &mut P)
    where
        S: DeviceStore,
        P: TextDisplay,
        P::Error: Debug,
    {
        let Some(user_id) = store.user_id() else {
            warn!("sync: log skipped err={}", SyncError::NotBound);
            self.show_result(
                display,
                &[BannerLine::status("Please Bind 1st")],
                self.config.banner_ms,
            )
            .await;
            return;
        };

        show(display, &[BannerLine::status("Uploading...")]);
        let result = match self.client.log_taken(&user_id).await {
            Ok(()) => {
                info!("sync: log saved");
                "Log Saved!"
            }
            Err(err) => {
                warn!("sync: log failed err={err}");
                "Upload Failed"
            }
        };
        self.show_result(display, &[BannerLine::status(result)], self.config.log_banner_ms)
            .await;
    }

    async fn run_sync<IN, S, P>(
        &mut self,
        app: &mut MedboxApp<IN>,
        store: &mut BestEffort<'_, S>,
        display: &mut P,
    ) where
        IN: InputProvider,
        IN::Error: Debug,
        S: DeviceStore,
        P: TextDisplay,
        P::Error: Debug,
    {
        let Some(user_id) = store.user_id() else {
            warn!("sync: config skipped err={}", SyncError::NotBound);
            self.show_result(
                display,
                &[BannerLine::status("No User Bound")],
                self.config.banner_ms,
            )
            .await;
            return;
        };

        show(display, &[BannerLine::status("Syncing Config...")]);
        match self.client.pull_config(&user_id).await {
            Ok(update) => {
                let alarm = update.apply_to(app.alarm_config());
                app.apply_alarm_config(alarm);
                store.save_alarm_config(&alarm);
                info!(
                    "sync: config applied hour={} minute={} days={}",
                    alarm.hour(),
                    alarm.minute(),
                    alarm.active_days_label()
                );

                let mut time_line: String<24> = String::new();
                let _ = write!(time_line, "Alarm: {:02}:{:02}", alarm.hour(), alarm.minute());
                let mut days_line: String<24> = String::new();
                let _ = write!(days_line, "Days: {}", alarm.active_days_label());
                self.show_result(
                    display,
                    &[
                        BannerLine::at(10, "Sync Success!"),
                        BannerLine::at(30, &time_line),
                        BannerLine::at(50, &days_line),
                    ],
                    self.config.banner_ms,
                )
                .await;
            }
            Err(err) => {
                warn!("sync: config failed err={err}");
                let text = match err {
                    SyncError::Validation { .. } => "Data Error",
                    _ => "Sync Failed",
                };
                self.show_result(display, &[BannerLine::status(text)], self.config.banner_ms)
                    .await;
            }
        }
    }

    async fn run_notify<S>(&mut self, store: &mut BestEffort<'_, S>)
    where
        S: DeviceStore,
    {
        let Some(user_id) = store.user_id() else {
            return;
        };
        match self.client.notify_alarm(&user_id).await {
            Ok(()) => info!("sync: alarm notified"),
            Err(err) => warn!("sync: notify failed err={err}"),
        }
    }

    async fn show_result<P>(&mut self, display: &mut P, lines: &[BannerLine<'_>], hold_ms: u32)
    where
        P: TextDisplay,
        P::Error: Debug,
    {
        show(display, lines);
        self.client.delay_mut().delay_ms(hold_ms).await;
    }
}

fn show<P>(display: &mut P, lines: &[BannerLine<'_>])
where
    P: TextDisplay,
    P::Error: Debug,
{
    if let Err(err) = draw(&Screen::Banner { lines }, display) {
        warn!("display: banner failed err={err:?}");
    }
}
