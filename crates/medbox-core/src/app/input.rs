impl<IN> MedboxApp<IN>
where
    IN: InputProvider,
    IN::Error: Debug,
{
    fn process_inputs(&mut self) {
        loop {
            match self.input.poll_event() {
                Ok(Some(event)) => self.apply_input_event(event),
                Ok(None) => break,
                Err(err) => {
                    warn!("input: provider error err={err:?}");
                    break;
                }
            }
        }
    }

    pub fn apply_input_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::LidOpened => {
                self.on_lid_opened();
                return;
            }
            InputEvent::LidClosed => {
                if self.lid_latched {
                    debug!("lid: closed");
                }
                self.lid_latched = false;
                return;
            }
            InputEvent::RotateCw | InputEvent::RotateCcw | InputEvent::Press => {}
        }

        let clockwise = event == InputEvent::RotateCw;
        match self.ui {
            UiState::ScanView => self.apply_scan_input(event, clockwise),
            UiState::PasswordInput => self.apply_entry_input(EntryFlow::WifiPassword, event, clockwise),
            UiState::BindInput => self.apply_entry_input(EntryFlow::BindCode, event, clockwise),
            UiState::ClockView => {
                if event == InputEvent::Press {
                    self.enter_menu();
                }
            }
            UiState::MenuSelect => self.apply_menu_input(event, clockwise),
            UiState::SetHour => match event {
                InputEvent::Press => self.set_state(UiState::SetMinute),
                _ => {
                    self.alarm.step_hour(clockwise);
                    self.pending_redraw = true;
                }
            },
            UiState::SetMinute => match event {
                InputEvent::Press => {
                    self.alarm.set_enabled(true);
                    self.outbox.raise(Effect::SaveAlarm);
                    info!(
                        "alarm: set hour={} minute={}",
                        self.alarm.hour(),
                        self.alarm.minute()
                    );
                    self.enter_clock_view();
                }
                _ => {
                    self.alarm.step_minute(clockwise);
                    self.pending_redraw = true;
                }
            },
            UiState::SetWeekday => self.apply_weekday_input(event, clockwise),
            UiState::AlarmRinging => {
                if event == InputEvent::Press {
                    self.acknowledge(AckSource::Button);
                }
            }
        }
    }

    fn apply_scan_input(&mut self, event: InputEvent, clockwise: bool) {
        let total = self.networks.len() as u16;
        if total == 0 {
            return;
        }

        match event {
            InputEvent::Press => self.enter_entry(EntryFlow::WifiPassword),
            _ => {
                self.network_cursor = if clockwise {
                    rotate_cw(self.network_cursor, total)
                } else {
                    rotate_ccw(self.network_cursor, total)
                };
                self.pending_redraw = true;
            }
        }
    }

    fn apply_entry_input(&mut self, flow: EntryFlow, event: InputEvent, clockwise: bool) {
        let ring = flow.ring();
        if event != InputEvent::Press {
            self.char_cursor = ring.step(self.char_cursor, clockwise);
            self.pending_redraw = true;
            return;
        }

        match ring.entry_at(self.char_cursor) {
            Entry::Char(ch) => {
                if self.input_buffer.push(ch).is_err() {
                    debug!("input: buffer full");
                }
                self.char_cursor = 0;
                self.pending_redraw = true;
            }
            Entry::Control(Control::Ok) => self.commit_entry(flow),
            Entry::Control(Control::Del) => {
                self.input_buffer.pop();
                self.pending_redraw = true;
            }
            Entry::Control(Control::Back) => match flow {
                EntryFlow::WifiPassword => self.set_state(UiState::ScanView),
                EntryFlow::BindCode => self.set_state(UiState::MenuSelect),
            },
        }
    }

    fn commit_entry(&mut self, flow: EntryFlow) {
        match flow {
            EntryFlow::WifiPassword => {
                let ssid = self
                    .networks
                    .get(self.network_cursor as usize)
                    .map(|label| ssid_from_label(label));
                match ssid.and_then(|ssid| WifiCredentials::new(ssid, &self.input_buffer)) {
                    Some(credentials) => {
                        info!("wifi: join requested ssid={}", credentials.ssid);
                        self.join_request = Some(credentials);
                        self.outbox.raise(Effect::JoinNetwork);
                        self.pending_redraw = true;
                    }
                    None => {
                        warn!("wifi: credentials do not fit");
                        self.set_state(UiState::ScanView);
                    }
                }
            }
            EntryFlow::BindCode => {
                self.bind_code = Some(self.input_buffer.clone());
                self.outbox.raise(Effect::BindCode);
                self.enter_clock_view();
            }
        }
    }

    fn apply_menu_input(&mut self, event: InputEvent, clockwise: bool) {
        let total = MenuItem::ALL.len() as u16;
        if event != InputEvent::Press {
            let cursor = u16::from(self.menu_cursor);
            let next = if clockwise {
                rotate_cw(cursor, total)
            } else {
                rotate_ccw(cursor, total)
            };
            self.menu_cursor = next as u8;
            self.pending_redraw = true;
            return;
        }

        let item = MenuItem::from_index(self.menu_cursor);
        debug!("menu: selected item={item:?}");
        match item {
            MenuItem::SetTime => self.set_state(UiState::SetHour),
            MenuItem::SetDays => {
                self.weekday_cursor = 0;
                self.set_state(UiState::SetWeekday);
            }
            MenuItem::SyncCloud => {
                self.outbox.raise(Effect::SyncConfig);
                self.enter_clock_view();
            }
            MenuItem::BindUser => self.enter_entry(EntryFlow::BindCode),
            MenuItem::LogNow => {
                self.scheduler.mark_taken();
                self.outbox.raise(Effect::UploadLog);
                self.enter_clock_view();
            }
            MenuItem::Back => self.enter_clock_view(),
        }
    }

    fn apply_weekday_input(&mut self, event: InputEvent, clockwise: bool) {
        if event != InputEvent::Press {
            let cursor = u16::from(self.weekday_cursor);
            let total = u16::from(WEEKDAY_SLOTS);
            let next = if clockwise {
                rotate_cw(cursor, total)
            } else {
                rotate_ccw(cursor, total)
            };
            self.weekday_cursor = next as u8;
            self.pending_redraw = true;
            return;
        }

        if self.weekday_cursor < 7 {
            self.alarm.toggle_day(self.weekday_cursor);
            self.pending_redraw = true;
        } else {
            self.outbox.raise(Effect::SaveAlarm);
            self.enter_clock_view();
        }
    }

    fn on_lid_opened(&mut self) {
        if self.lid_latched {
            return;
        }
        self.lid_latched = true;
        info!("lid: opened state={:?}", self.ui);
        self.acknowledge(AckSource::Lid);
    }

    /// Shared end of both acknowledgment paths.
    fn acknowledge(&mut self, source: AckSource) {
        if self.ui == UiState::AlarmRinging {
            self.ring_flash_on = false;
            self.last_flash_ms = None;
            self.enter_clock_view();
        }
        self.scheduler.mark_taken();
        self.outbox.raise(Effect::UploadLog);
        self.request_redraw();
        info!("alarm: acknowledged source={source:?}");
    }
}
