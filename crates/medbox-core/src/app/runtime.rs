impl<IN> MedboxApp<IN>
where
    IN: InputProvider,
    IN::Error: Debug,
{
    fn take_redraw(&mut self) -> TickResult {
        if self.pending_redraw {
            self.pending_redraw = false;
            TickResult::RenderRequested
        } else {
            TickResult::NoRender
        }
    }

    fn tick_clock(&mut self, now_ms: u64) -> TickResult {
        if let Some(now) = self.local_time {
            let outcome = self.scheduler.observe(&now, &self.alarm);
            if outcome.day_rolled_over {
                self.pending_redraw = true;
            }
            if outcome.fire {
                self.start_ringing();
                return self.tick_ringing(now_ms);
            }
        }

        let frame_due = match self.last_clock_frame_ms {
            Some(last) => now_ms.saturating_sub(last) >= CLOCK_FRAME_MS,
            None => true,
        };
        if frame_due || self.pending_redraw {
            self.last_clock_frame_ms = Some(now_ms);
            self.pending_redraw = false;
            return TickResult::RenderRequested;
        }
        TickResult::NoRender
    }

    fn tick_ringing(&mut self, now_ms: u64) -> TickResult {
        let toggle_due = match self.last_flash_ms {
            Some(last) => now_ms.saturating_sub(last) >= RING_FLASH_MS,
            None => true,
        };
        if toggle_due {
            self.ring_flash_on = !self.ring_flash_on;
            self.last_flash_ms = Some(now_ms);
            self.pending_redraw = false;
            return TickResult::RenderRequested;
        }
        self.take_redraw()
    }

    /// Next effect to run; it stays pending until [`Self::complete_effect`].
    pub fn pending_effect(&self) -> Option<Effect> {
        self.outbox.next()
    }

    pub fn is_effect_pending(&self, effect: Effect) -> bool {
        self.outbox.is_pending(effect)
    }

    pub fn complete_effect(&mut self, effect: Effect) {
        self.outbox.complete(effect);
        if effect != Effect::NotifyAlarm {
            self.request_redraw();
        }
    }

    pub fn take_join_request(&mut self) -> Option<WifiCredentials> {
        self.join_request.take()
    }

    pub fn take_bind_code(&mut self) -> Option<String<INPUT_BUFFER_BYTES>> {
        self.bind_code.take()
    }

    /// Outcome of a Wi-Fi join: clock view plus a config pull on success,
    /// back to network selection otherwise.
    pub fn finish_join(&mut self, joined: bool) {
        if joined {
            self.outbox.raise(Effect::SyncConfig);
            self.enter_clock_view();
        } else {
            self.set_state(UiState::ScanView);
        }
    }

    /// Replace the in-memory alarm, e.g. after loading or a config pull.
    pub fn apply_alarm_config(&mut self, alarm: AlarmConfig) {
        self.alarm = alarm;
        self.request_redraw();
    }

    /// Fresh scan results; selection restarts at the first network.
    pub fn set_networks<I>(&mut self, labels: I)
    where
        I: IntoIterator<Item = NetworkLabel>,
    {
        self.networks.clear();
        for label in labels {
            if self.networks.push(label).is_err() {
                break;
            }
        }
        self.network_cursor = 0;
        debug!("wifi: networks={}", self.networks.len());
        self.set_state(UiState::ScanView);
    }
}
